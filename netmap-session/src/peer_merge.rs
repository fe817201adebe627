//! §4.1 PeerMerge: the pure reconciliation of a previous peer list and an
//! [`Update`] into the new, strictly ascending, complete peer list.
//!
//! Grounded on `CandidateSet`'s discipline of partitioning peers by state
//! before acting on them (`candidate_set.rs`), adapted here from
//! "partition by connection state" to "merge by ascending id", and on
//! `MetaAddr`'s `Ord` implementation (`meta_addr.rs`) for what "strictly
//! ascending, total order" means for a peer record.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::clock::Clock;
use crate::ids::NodeId;
use crate::node::Node;
use crate::update::Update;

/// Returns whether `nodes` is strictly ascending by id (no duplicates).
fn is_strictly_ascending(nodes: &[Node]) -> bool {
    nodes.windows(2).all(|w| w[0].id < w[1].id)
}

fn sort_by_id(nodes: &mut [Node]) {
    nodes.sort_by_key(|n| n.id);
}

/// Reconciles `prev` (assumed strictly ascending) against `update`,
/// returning the new strictly-ascending peer list and clearing the
/// update's delta fields as a side effect (§4.1 step 4).
///
/// `prev` is consumed because the three-way merge walk is most naturally
/// expressed by draining both input lists into the output.
pub fn merge_peers(prev: Vec<Node>, update: &mut Update, clock: &dyn Clock) -> Vec<Node> {
    let merged = if update.has_full_peer_list() {
        // §4.1 step 1: full-replacement shortcut. Patches and liveness
        // deltas carried alongside a full `peers` list are not applied —
        // the literal reading of the algorithm returns before step 3.
        let mut peers = std::mem::take(&mut update.peers);
        if !is_strictly_ascending(&peers) {
            warn!("update carried an out-of-order full peer list; sorting");
            sort_by_id(&mut peers);
        }
        peers
    } else {
        let mut merged = delta_merge(prev, update);
        apply_patches(&mut merged, update, clock);
        merged
    };

    update.clear_peer_deltas();
    merged
}

/// §4.1 step 2: the delta merge, reached only when the update carries no
/// full replacement list.
fn delta_merge(mut prev: Vec<Node>, update: &mut Update) -> Vec<Node> {
    let removed: HashSet<NodeId> = update.peers_removed.iter().copied().collect();

    if !is_strictly_ascending(&update.peers_changed) {
        warn!("update carried an out-of-order peers_changed list; sorting");
        sort_by_id(&mut update.peers_changed);
    }
    if !is_strictly_ascending(&prev) {
        warn!("previous peer list was not strictly ascending; sorting (internal error)");
        sort_by_id(&mut prev);
    }

    if removed.is_empty() && update.peers_changed.is_empty() {
        return prev;
    }

    let changed = std::mem::take(&mut update.peers_changed);
    let mut merged = Vec::with_capacity(prev.len() + changed.len());

    let mut prev_iter = prev.into_iter().peekable();
    let mut changed_iter = changed.into_iter().peekable();

    loop {
        match (prev_iter.peek(), changed_iter.peek()) {
            (Some(p), _) if removed.contains(&p.id) => {
                // Open Question (b): removal only ever drops entries that
                // were already present in `prev`. An id that only appears
                // in `peers_changed` is inserted regardless of `removed`.
                prev_iter.next();
            }
            (Some(p), Some(c)) => {
                if p.id < c.id {
                    merged.push(prev_iter.next().expect("peeked"));
                } else if p.id == c.id {
                    merged.push(changed_iter.next().expect("peeked"));
                    prev_iter.next();
                } else {
                    merged.push(changed_iter.next().expect("peeked"));
                }
            }
            (Some(_), None) => {
                merged.push(prev_iter.next().expect("peeked"));
            }
            (None, Some(_)) => {
                merged.push(changed_iter.next().expect("peeked"));
            }
            (None, None) => break,
        }
    }

    // Sorted by construction; a defensive final sort guards against any
    // future change to the walk above silently breaking the invariant.
    if !is_strictly_ascending(&merged) {
        sort_by_id(&mut merged);
    }
    merged
}

/// §4.1 step 3: apply liveness deltas and field-level patches, indexing the
/// merged list by position so repeated lookups don't need a full scan.
fn apply_patches(merged: &mut [Node], update: &mut Update, clock: &dyn Clock) {
    if update.peer_seen_change.is_empty()
        && update.online_change.is_empty()
        && update.peers_changed_patch.is_empty()
    {
        return;
    }

    let mut index: HashMap<NodeId, usize> = HashMap::with_capacity(merged.len());
    for (i, node) in merged.iter().enumerate() {
        index.insert(node.id, i);
    }

    for (id, seen) in update.peer_seen_change.drain() {
        match index.get(&id) {
            Some(&i) => {
                merged[i].last_seen = if seen { Some(clock.now()) } else { None };
            }
            None => warn!(?id, "peer_seen_change referenced an unknown id; ignored"),
        }
    }

    for (id, online) in update.online_change.drain() {
        match index.get(&id) {
            Some(&i) => merged[i].online = Some(online),
            None => warn!(?id, "online_change referenced an unknown id; ignored"),
        }
    }

    for patch in update.peers_changed_patch.drain(..) {
        match index.get(&patch.node_id) {
            Some(&i) => patch.apply(&mut merged[i]),
            None => warn!(
                node_id = ?patch.node_id,
                "peers_changed_patch referenced an unknown id; ignored"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::RealClock;

    fn node(id: i64) -> Node {
        Node::new(NodeId(id))
    }

    fn ids(nodes: &[Node]) -> Vec<i64> {
        nodes.iter().map(|n| n.id.0).collect()
    }

    #[test]
    fn scenario_1_first_full_update_sorts_out_of_order_input() {
        let clock = RealClock;
        let mut update = Update {
            peers: vec![node(2), node(5), node(1)],
            ..Update::new()
        };
        let merged = merge_peers(vec![], &mut update, &clock);
        assert_eq!(ids(&merged), vec![1, 2, 5]);
    }

    #[test]
    fn scenario_2_remove_and_change() {
        let clock = RealClock;
        let prev = vec![node(1), node(2), node(3)];
        let mut changed_node = node(3);
        changed_node.endpoints = vec!["X".to_string()];
        let mut update = Update {
            peers_removed: vec![NodeId(2)],
            peers_changed: vec![changed_node],
            ..Update::new()
        };
        let merged = merge_peers(prev, &mut update, &clock);
        assert_eq!(ids(&merged), vec![1, 3]);
        assert_eq!(merged[1].endpoints, vec!["X".to_string()]);
    }

    #[test]
    fn scenario_3_insertion_via_changed() {
        let clock = RealClock;
        let prev = vec![node(1), node(4)];
        let mut update = Update {
            peers_changed: vec![node(2), node(3)],
            ..Update::new()
        };
        let merged = merge_peers(prev, &mut update, &clock);
        assert_eq!(ids(&merged), vec![1, 2, 3, 4]);
    }

    #[test]
    fn scenario_4_patch_over_replacement() {
        let clock = RealClock;
        let prev = vec![{
            let mut n = node(7);
            n.online = Some(false);
            n
        }];
        let mut changed = node(7);
        changed.online = Some(false);
        let mut patch = crate::node::NodePatch::new(NodeId(7));
        patch.online = Some(Some(true));
        let mut update = Update {
            peers_changed: vec![changed],
            peers_changed_patch: vec![patch],
            ..Update::new()
        };
        let merged = merge_peers(prev, &mut update, &clock);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].online, Some(true));
    }

    #[test]
    fn open_question_b_changed_only_id_is_inserted_even_if_also_removed() {
        let clock = RealClock;
        let prev = vec![node(1)];
        let mut update = Update {
            peers_removed: vec![NodeId(5)],
            peers_changed: vec![node(5)],
            ..Update::new()
        };
        let merged = merge_peers(prev, &mut update, &clock);
        assert_eq!(ids(&merged), vec![1, 5]);
    }

    #[test]
    fn removal_drops_matching_prev_entry() {
        let clock = RealClock;
        let prev = vec![node(1), node(5)];
        let mut update = Update {
            peers_removed: vec![NodeId(5)],
            ..Update::new()
        };
        let merged = merge_peers(prev, &mut update, &clock);
        assert_eq!(ids(&merged), vec![1]);
    }

    #[test]
    fn empty_delta_returns_prev_unchanged() {
        let clock = RealClock;
        let prev = vec![node(1), node(2)];
        let mut update = Update::new();
        let merged = merge_peers(prev.clone(), &mut update, &clock);
        assert_eq!(merged, prev);
    }

    #[test]
    fn unknown_patch_ids_do_not_alter_any_node() {
        let clock = RealClock;
        let prev = vec![node(1)];
        let mut patch = crate::node::NodePatch::new(NodeId(99));
        patch.cap = Some(42);
        let mut update = Update {
            peers_changed_patch: vec![patch],
            ..Update::new()
        };
        let merged = merge_peers(prev.clone(), &mut update, &clock);
        assert_eq!(merged, prev);
    }

    #[test]
    fn delta_fields_are_cleared_after_merge() {
        let clock = RealClock;
        let prev = vec![node(1)];
        let mut update = Update {
            peers_removed: vec![NodeId(1)],
            peers_changed: vec![node(2)],
            ..Update::new()
        };
        let _ = merge_peers(prev, &mut update, &clock);
        assert!(update.peers_removed.is_empty());
        assert!(update.peers_changed.is_empty());
    }

    #[test]
    fn full_replacement_skips_patch_phase() {
        let clock = RealClock;
        let mut patch = crate::node::NodePatch::new(NodeId(1));
        patch.cap = Some(42);
        let mut update = Update {
            peers: vec![node(1)],
            peers_changed_patch: vec![patch],
            ..Update::new()
        };
        let merged = merge_peers(vec![], &mut update, &clock);
        assert_eq!(merged[0].cap, 0, "patch should not apply on the full-replacement path");
    }
}
