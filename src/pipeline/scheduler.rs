//! Update scheduling.
//!
//! Every change to the tree runs as a *job* on one renderer: a root render, a
//! synchronous instance update, or a flush of batched state patches. Only one
//! job runs at a time.
//!
//! ```text
//! run(job) ──► in flight? ──yes──► queue job (FIFO), return Ok
//!                 │
//!                 no
//!                 ▼
//!          execute job, then drain the queue until empty
//! ```
//!
//! Batched `set_state` calls never start a pass on their own. Their patches are
//! coalesced per instance in the pending queue and rendered at the next flush
//! point: [`Renderer::flush`](crate::Renderer::flush), the end of
//! [`Renderer::batch`](crate::Renderer::batch), or automatically right after
//! the pass in which they were requested. A parent-driven render of an
//! instance applies whatever is still pending for it, so an instance renders
//! once per flush however many of its ancestors were updated too.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::component::{Instance, InstanceId, Phase};
use crate::error::ReconcileError;
use crate::types::{merge_map, object_to_map, NodeId, State};
use crate::vnode::VNode;

/// Flush rounds allowed in one drain before updates are considered looping.
pub(crate) const MAX_FLUSH_ROUNDS: usize = 100;

// =============================================================================
// Jobs
// =============================================================================

pub(crate) enum Job {
    Render {
        container: NodeId,
        vnode: Option<VNode>,
    },
    Update {
        instance: Weak<RefCell<Instance>>,
        patch: State,
        force: bool,
    },
    Flush,
}

/// A batched update waiting for the next flush.
pub(crate) struct PendingUpdate {
    pub(crate) id: InstanceId,
    pub(crate) name: &'static str,
    pub(crate) instance: Weak<RefCell<Instance>>,
    pub(crate) patch: State,
    pub(crate) force: bool,
}

/// The renderer side of scheduling. Implemented by the renderer internals so
/// updaters can reach their renderer without knowing its target type.
pub(crate) trait Driver {
    fn scheduler(&self) -> &Scheduler;

    fn execute(&self, job: Job) -> Result<(), ReconcileError>;
}

// =============================================================================
// Scheduler
// =============================================================================

#[derive(Default)]
pub(crate) struct Scheduler {
    in_flight: Cell<bool>,
    jobs: RefCell<VecDeque<Job>>,
    pending: RefCell<Vec<PendingUpdate>>,
    /// Updates of the flush in progress not yet rendered.
    flushing: RefCell<VecDeque<PendingUpdate>>,
    flush_scheduled: Cell<bool>,
}

impl Scheduler {
    pub(crate) fn is_in_flight(&self) -> bool {
        self.in_flight.get()
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.borrow().len() + self.flushing.borrow().len()
    }

    /// Add a batched update, merging it into one already pending for the
    /// same instance. During a pass a flush is scheduled behind it.
    pub(crate) fn enqueue(&self, update: PendingUpdate) {
        {
            let mut pending = self.pending.borrow_mut();
            match pending.iter_mut().find(|queued| queued.id == update.id) {
                Some(queued) => {
                    merge_map(&mut queued.patch, update.patch);
                    queued.force |= update.force;
                }
                None => pending.push(update),
            }
        }
        if self.in_flight.get() && !self.flush_scheduled.replace(true) {
            self.jobs.borrow_mut().push_back(Job::Flush);
        }
    }

    /// Start a flush with everything pending, in the order instances were
    /// first queued. Returns the number of updates it holds.
    pub(crate) fn begin_flush(&self) -> usize {
        self.flush_scheduled.set(false);
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        let mut flushing = self.flushing.borrow_mut();
        flushing.extend(pending);
        flushing.len()
    }

    /// The next update of the flush in progress.
    pub(crate) fn next_flushing(&self) -> Option<PendingUpdate> {
        self.flushing.borrow_mut().pop_front()
    }

    /// Take whatever is still owed to instance `id`, from the flush in
    /// progress and from the pending queue, merged in request order.
    pub(crate) fn absorb(&self, id: InstanceId) -> Option<PendingUpdate> {
        let mut flushing = self.flushing.borrow_mut();
        let at = flushing.iter().position(|queued| queued.id == id);
        let earlier = at.and_then(|i| flushing.remove(i));
        let mut pending = self.pending.borrow_mut();
        let at = pending.iter().position(|queued| queued.id == id);
        let later = at.map(|i| pending.remove(i));

        match (earlier, later) {
            (Some(mut earlier), Some(later)) => {
                merge_map(&mut earlier.patch, later.patch);
                earlier.force |= later.force;
                Some(earlier)
            }
            (earlier, later) => earlier.or(later),
        }
    }

    /// Drop queued jobs and pending patches after a failure.
    fn abort(&self) {
        let jobs = std::mem::take(&mut *self.jobs.borrow_mut());
        let mut pending = std::mem::take(&mut *self.pending.borrow_mut());
        pending.extend(std::mem::take(&mut *self.flushing.borrow_mut()));
        self.flush_scheduled.set(false);
        if !jobs.is_empty() || !pending.is_empty() {
            debug!(jobs = jobs.len(), pending = pending.len(), "discarding queued work");
        }
    }
}

/// Marks a pass as in flight for its lifetime.
struct PassGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> PassGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Run `job` now, or queue it behind the pass in flight.
///
/// On failure the queue and the pending patches are discarded and the error
/// is returned to whoever started the drain.
pub(crate) fn run(driver: &dyn Driver, job: Job) -> Result<(), ReconcileError> {
    let scheduler = driver.scheduler();
    if scheduler.in_flight.get() {
        trace!("pass in flight, job queued");
        scheduler.jobs.borrow_mut().push_back(job);
        return Ok(());
    }

    let _guard = PassGuard::enter(&scheduler.in_flight);
    let mut flush_rounds = 0;
    let mut next = Some(job);
    while let Some(job) = next {
        if matches!(job, Job::Flush) {
            flush_rounds += 1;
            if flush_rounds > MAX_FLUSH_ROUNDS {
                scheduler.abort();
                return Err(ReconcileError::UpdateLoop {
                    rounds: MAX_FLUSH_ROUNDS,
                });
            }
        }
        if let Err(err) = driver.execute(job) {
            scheduler.abort();
            return Err(err);
        }
        next = scheduler.jobs.borrow_mut().pop_front();
    }
    Ok(())
}

// =============================================================================
// Updater
// =============================================================================

/// Handle for requesting updates of one component instance.
///
/// Cheap to clone and safe to keep after the instance is gone: requests for
/// an unmounted instance are dropped.
#[derive(Clone)]
pub struct Updater {
    id: InstanceId,
    name: &'static str,
    instance: Weak<RefCell<Instance>>,
    phase: Rc<Cell<Phase>>,
    driver: Weak<dyn Driver>,
}

impl Updater {
    pub(crate) fn new(
        id: InstanceId,
        name: &'static str,
        instance: Weak<RefCell<Instance>>,
        phase: Rc<Cell<Phase>>,
        driver: Weak<dyn Driver>,
    ) -> Self {
        Self {
            id,
            name,
            instance,
            phase,
            driver,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn component_name(&self) -> &'static str {
        self.name
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub fn is_mounted(&self) -> bool {
        matches!(self.phase.get(), Phase::Mounted | Phase::Updating)
    }

    /// Batched state update: `patch` (a JSON object) is merged into any
    /// pending patch for this instance and rendered at the next flush point.
    pub fn set_state(&self, patch: Value) {
        if !self.phase.get().is_live() {
            trace!(component = self.name, "set_state on unmounted component dropped");
            return;
        }
        let Some(driver) = self.driver.upgrade() else {
            warn!(component = self.name, "set_state after the renderer was dropped");
            return;
        };
        driver.scheduler().enqueue(PendingUpdate {
            id: self.id,
            name: self.name,
            instance: self.instance.clone(),
            patch: object_to_map(patch),
            force: false,
        });
    }

    /// Synchronous state update: applied and rendered before returning, or
    /// queued behind the pass in flight when called from inside one.
    pub fn set_state_sync(&self, patch: Value) -> Result<(), ReconcileError> {
        self.run_update(object_to_map(patch), false)
    }

    /// Re-render now, skipping `should_component_update`.
    pub fn force_update(&self) -> Result<(), ReconcileError> {
        self.run_update(State::new(), true)
    }

    fn run_update(&self, patch: State, force: bool) -> Result<(), ReconcileError> {
        if !self.phase.get().is_live() {
            trace!(component = self.name, "update of unmounted component dropped");
            return Ok(());
        }
        let driver = self
            .driver
            .upgrade()
            .ok_or(ReconcileError::RendererDropped)?;
        run(
            &*driver,
            Job::Update {
                instance: self.instance.clone(),
                patch,
                force,
            },
        )
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater")
            .field("id", &self.id)
            .field("component", &self.name)
            .field("phase", &self.phase.get())
            .finish()
    }
}
