use std::collections::VecDeque;

use tracing::trace;

use crate::{Map, Set, StateIndex, Transition};

/// Computes the transitions that are accessible from the seed states, i.e. all transitions `t`
/// for which there is a path of transitions that starts in a state satisfying `is_seed` and ends
/// with `t`. Seeds are the transitions leaving a seed state, every transition leaving the target
/// of an accessible transition is accessible as well.
///
/// Returns the positions of the accessible transitions in `transitions`, in ascending order.
pub fn accessible_transitions<Q, F>(transitions: &[Transition<Q>], is_seed: F) -> Vec<usize>
where
    Q: StateIndex,
    F: Fn(&Q) -> bool,
{
    let mut outgoing: Map<&Q, Vec<usize>> = Map::default();
    for (i, t) in transitions.iter().enumerate() {
        outgoing.entry(&t.source).or_default().push(i);
    }

    let mut seen: Set<usize> = Set::default();
    let mut queue: VecDeque<usize> = transitions
        .iter()
        .enumerate()
        .filter(|(_, t)| is_seed(&t.source))
        .map(|(i, _)| i)
        .collect();
    seen.extend(queue.iter().copied());
    trace!("starting reachability with {} seed transitions", queue.len());

    // a state only needs to be expanded once
    let mut expanded: Set<&Q> = Set::default();
    while let Some(i) = queue.pop_front() {
        let target = &transitions[i].target;
        if !expanded.insert(target) {
            continue;
        }
        for &j in outgoing.get(target).into_iter().flatten() {
            if seen.insert(j) {
                queue.push_back(j);
            }
        }
    }

    let mut out: Vec<_> = seen.into_iter().collect();
    out.sort_unstable();
    out
}
