//! Keyed child reconciliation.
//!
//! When every child of both the mounted and the next list carries a unique
//! key, children are matched by key instead of by position:
//!
//! 1. mounted children whose key is gone are unmounted
//! 2. each next child is patched against its match, or created
//! 3. nodes are placed back to front; matched nodes that form the longest
//!    increasing run of old positions stay put, everything else is moved
//!    with `insert` before the node that follows it
//!
//! Anything else (a missing key, a duplicate) falls back to positional
//! matching.

use std::collections::{HashMap, HashSet};

use tracing::{trace, warn};

use super::mounted::Mounted;
use super::reconciler::Reconciler;
use crate::context::Context;
use crate::error::ReconcileError;
use crate::target::TargetTree;
use crate::types::{Key, NodeId};
use crate::vnode::VNode;

/// Whether both lists can be matched by key.
pub(crate) fn is_keyed(mounted: &[Mounted], next: &[VNode]) -> bool {
    if mounted.is_empty() || next.is_empty() {
        return false;
    }
    unique_keys(mounted.iter().map(Mounted::vnode)) && unique_keys(next.iter())
}

fn unique_keys<'a>(nodes: impl Iterator<Item = &'a VNode>) -> bool {
    let mut seen = HashSet::new();
    for node in nodes {
        let Some(key) = node.get_key() else {
            return false;
        };
        if !seen.insert(key) {
            warn!(%key, "duplicate key in child list, matching by position");
            return false;
        }
    }
    true
}

/// Positions (into `seq`) of one longest strictly increasing subsequence.
pub(crate) fn longest_increasing_subsequence(seq: &[usize]) -> Vec<usize> {
    // tails[k]: position of the smallest tail of an increasing run of length k + 1.
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; seq.len()];

    for (i, &value) in seq.iter().enumerate() {
        let pos = tails.partition_point(|&t| seq[t] < value);
        if pos > 0 {
            prev[i] = Some(tails[pos - 1]);
        }
        if pos == tails.len() {
            tails.push(i);
        } else {
            tails[pos] = i;
        }
    }

    let mut run = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        run.push(i);
        cursor = prev[i];
    }
    run.reverse();
    run
}

/// A child of the next list with the old position it was matched from.
struct Placed {
    mounted: Mounted,
    source: Option<usize>,
}

impl<T: TargetTree> Reconciler<'_, T> {
    pub(super) fn patch_keyed(
        &mut self,
        parent: NodeId,
        children: &mut Vec<Mounted>,
        next: &[VNode],
        context: &Context,
    ) -> Result<(), ReconcileError> {
        let mut old: Vec<Option<Mounted>> = std::mem::take(children).into_iter().map(Some).collect();
        let mut placed = Vec::with_capacity(next.len());

        match self.match_keyed(parent, &mut old, next, &mut placed, context) {
            Ok(()) => {
                self.place_keyed(parent, &placed);
                children.extend(placed.into_iter().map(|entry| entry.mounted));
                Ok(())
            }
            Err(err) => {
                // Keep the bookkeeping complete so later passes still
                // release everything. Fresh nodes are attached at the end.
                for entry in &placed {
                    if entry.source.is_none() {
                        if let Some(node) = entry.mounted.node() {
                            self.target.insert(parent, node, None);
                        }
                    }
                }
                children.extend(placed.into_iter().map(|entry| entry.mounted));
                children.extend(old.into_iter().flatten());
                Err(err)
            }
        }
    }

    fn match_keyed(
        &mut self,
        parent: NodeId,
        old: &mut [Option<Mounted>],
        next: &[VNode],
        placed: &mut Vec<Placed>,
        context: &Context,
    ) -> Result<(), ReconcileError> {
        let next_keys: HashSet<&Key> = next.iter().filter_map(VNode::get_key).collect();

        // Leavers go first so their willUnmount runs before any new mount.
        for slot in old.iter_mut() {
            let leaving = slot
                .as_ref()
                .and_then(|mounted| mounted.vnode().get_key())
                .is_some_and(|key| !next_keys.contains(key));
            if leaving {
                if let Some(mounted) = slot.take() {
                    self.unmount(mounted)?;
                }
            }
        }

        let old_index: HashMap<Key, usize> = old
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                let key = slot.as_ref()?.vnode().get_key()?;
                Some((key.clone(), i))
            })
            .collect();

        for vnode in next {
            let matched = vnode
                .get_key()
                .and_then(|key| old_index.get(key).copied())
                .and_then(|i| old[i].take().map(|mounted| (i, mounted)));
            match matched {
                Some((source, mut mounted)) => {
                    let result = self.patch(&mut mounted, vnode, parent, context);
                    placed.push(Placed {
                        mounted,
                        source: Some(source),
                    });
                    result?;
                }
                None => {
                    let mounted = self.create(vnode, parent, context)?;
                    placed.push(Placed {
                        mounted,
                        source: None,
                    });
                }
            }
        }
        Ok(())
    }

    fn place_keyed(&mut self, parent: NodeId, placed: &[Placed]) {
        let matched: Vec<usize> = placed
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| entry.source.map(|_| i))
            .collect();
        let sources: Vec<usize> = placed.iter().filter_map(|entry| entry.source).collect();

        let mut stays = vec![false; placed.len()];
        for pos in longest_increasing_subsequence(&sources) {
            stays[matched[pos]] = true;
        }

        let mut anchor: Option<NodeId> = None;
        for (i, entry) in placed.iter().enumerate().rev() {
            let Some(node) = entry.mounted.node() else {
                continue;
            };
            if !stays[i] {
                trace!(%node, before = ?anchor, "keyed move");
                self.target.insert(parent, node, anchor);
            }
            anchor = Some(node);
        }
    }
}
