//! Topological ordering of graph nodes.

use super::graph::NodeId;

use std::{
    cmp::Reverse,
    collections::{BTreeMap, BTreeSet, BinaryHeap},
};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Precedence constraints form a cycle: {}",
    .cycle.iter().map(ToString::to_string).collect::<Vec<String>>().join(" -> "))]
/// The constraints cannot be satisfied.
pub struct CycleError {
    /// Node ids along one cycle, each one constrained to come before the next, the last one
    /// before the first.
    pub cycle: Vec<NodeId>,
}

/// Order `ids` so that for every constraint `(a, b)`, `a` comes before `b`.
///
/// Ids taking part in a constraint are ordered first, the lowest ready id always going next.
/// The remaining ids follow in ascending order. Every id appears exactly once.
pub fn schedule(
    ids: impl IntoIterator<Item = NodeId>,
    constraints: &BTreeSet<(NodeId, NodeId)>,
) -> Result<Vec<NodeId>, CycleError> {
    let mut successors: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    let mut predecessors: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    let mut in_degree: BTreeMap<NodeId, usize> = BTreeMap::new();

    for &(before, after) in constraints {
        successors.entry(before).or_default().push(after);
        predecessors.entry(after).or_default().push(before);
        in_degree.entry(before).or_default();
        *in_degree.entry(after).or_default() += 1;
    }

    let mut ready: BinaryHeap<Reverse<NodeId>> = in_degree
        .iter()
        .filter(|(_id, degree)| **degree == 0)
        .map(|(&id, _degree)| Reverse(id))
        .collect();

    let mut order = Vec::with_capacity(in_degree.len());
    while let Some(Reverse(id)) = ready.pop() {
        order.push(id);

        for next in successors.get(&id).into_iter().flatten() {
            let Some(degree) = in_degree.get_mut(next) else { continue };
            *degree -= 1;
            if *degree == 0 {
                ready.push(Reverse(*next));
            }
        }
    }

    if order.len() < in_degree.len() {
        let remaining: BTreeSet<NodeId> = in_degree
            .into_iter()
            .filter(|(_id, degree)| *degree > 0)
            .map(|(id, _degree)| id)
            .collect();

        return Err(CycleError {
            cycle: find_cycle(&remaining, &predecessors),
        });
    }

    let scheduled: BTreeSet<NodeId> = order.iter().copied().collect();
    let mut unrelated: Vec<NodeId> = ids
        .into_iter()
        .filter(|id| !scheduled.contains(id))
        .collect();
    unrelated.sort_unstable();
    unrelated.dedup();

    log::debug!(
        "Scheduled {} constrained and {} unconstrained nodes",
        order.len(),
        unrelated.len()
    );

    order.extend(unrelated);
    Ok(order)
}

/// Every id left over by the ordering pass has a left-over predecessor, so walking
/// predecessors from any of them must revisit a node.
fn find_cycle(
    remaining: &BTreeSet<NodeId>,
    predecessors: &BTreeMap<NodeId, Vec<NodeId>>,
) -> Vec<NodeId> {
    let Some(&start) = remaining.iter().next() else { return Vec::new() };

    let mut path = vec![start];
    let mut current = start;

    loop {
        let Some(&previous) = predecessors
            .get(&current)
            .into_iter()
            .flatten()
            .filter(|id| remaining.contains(*id))
            .min()
        else {
            return path;
        };

        if let Some(position) = path.iter().position(|&id| id == previous) {
            let mut cycle = path.split_off(position);
            // Walked backwards, report in precedence order starting from the lowest id.
            cycle.reverse();
            if let Some(lowest) = (0..cycle.len()).min_by_key(|&index| cycle[index]) {
                cycle.rotate_left(lowest);
            }
            return cycle;
        }

        path.push(previous);
        current = previous;
    }
}
