//! Render pipeline.
//!
//! Connects callers to the reconciler:
//!
//! ```text
//! Renderer::render / Updater::set_state_sync / Renderer::flush
//!        │
//!        ▼
//!   scheduler::run ── pass in flight? ── queue (FIFO)
//!        │
//!        ▼
//!   Reconciler (target borrowed) ──► EffectQueue::flush (refs, did-hooks)
//! ```
//!
//! - [`mount`] - the `Renderer` handle, its options and container bookkeeping
//! - [`scheduler`] - jobs, the re-entrancy guard, batched updates, `Updater`

pub mod mount;
pub mod scheduler;

pub use mount::{Renderer, RendererOptions, WeakRenderer};
pub use scheduler::Updater;

pub(crate) use scheduler::Driver;
