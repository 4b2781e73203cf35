//! Subgroup discovery below a root group.
//!
//! The tree shape is unknown up front, so traversal is an explicit work queue
//! drained by at most `limit` concurrent fetches. A visited set keeps each
//! group from being fetched twice, which also stops cycles. A failed fetch
//! contributes nothing and never affects sibling subtrees.

use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{BTreeSet, HashSet, VecDeque};
use tracing::{debug, info, warn};

use crate::contract::{GitlabApi, GroupRef};

/// Returns the ids of every group reachable below `root` (the root itself excluded).
pub async fn discover_subgroups<A>(api: &A, root: &str, limit: usize) -> BTreeSet<String>
where
    A: GitlabApi + ?Sized,
{
    let limit = limit.max(1);
    let mut visited: HashSet<String> = HashSet::from([root.to_string()]);
    let mut found = BTreeSet::new();
    let mut pending = VecDeque::from([root.to_string()]);
    let mut in_flight = FuturesUnordered::new();

    info!(root = %root, limit, "[TRAVERSE] Starting subgroup discovery");

    loop {
        while in_flight.len() < limit {
            match pending.pop_front() {
                Some(group_id) => in_flight.push(fetch_children(api, group_id)),
                None => break,
            }
        }

        let Some((parent, children)) = in_flight.next().await else {
            break;
        };

        for child in children {
            if visited.insert(child.id.clone()) {
                info!(parent = %parent, subgroup = %child.id, name = %child.name, "[TRAVERSE] Found subgroup");
                found.insert(child.id.clone());
                pending.push_back(child.id);
            } else {
                warn!(parent = %parent, subgroup = %child.id, "[TRAVERSE] Subgroup already visited, not descending again");
            }
        }
    }

    info!(root = %root, subgroups = found.len(), "[TRAVERSE] Subgroup discovery finished");
    found
}

async fn fetch_children<A>(api: &A, group_id: String) -> (String, Vec<GroupRef>)
where
    A: GitlabApi + ?Sized,
{
    match api.subgroups(&group_id).await {
        Ok(children) => {
            debug!(group_id = %group_id, children = children.len(), "[TRAVERSE] Fetched subgroups");
            (group_id, children)
        }
        Err(e) => {
            warn!(group_id = %group_id, error = %e, "[TRAVERSE] Subgroup fetch failed, skipping subtree");
            (group_id, Vec::new())
        }
    }
}
