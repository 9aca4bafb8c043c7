//! Display ordering: rank sort and parent/child hierarchy.

use std::cmp::Reverse;
use std::collections::HashMap;

use tracing::debug;

use crate::id::StepId;
use crate::step::Step;

/// Sort key for a step: output rows first, then deeper layers.
pub fn step_rank(step: &Step) -> (bool, u32) {
    (step.output.is_some(), step.depth.unwrap_or(0))
}

/// Stable sort by descending rank. Steps of equal rank keep their order.
pub fn sort_by_rank(steps: &mut [Step]) {
    steps.sort_by_key(|step| Reverse(step_rank(step)));
}

/// The step a row is displayed under.
///
/// Rows without parents, rows feeding the root, rows shared by several
/// consumers and self-referencing rows sit at the root. A row whose single
/// parent is not a known step has no place in the tree.
fn display_parent(step: &Step, known: &HashMap<&StepId, usize>) -> Option<StepId> {
    let Some(parents) = &step.parents else {
        return Some(StepId::root());
    };
    if parents.is_empty() || parents.contains_key(&StepId::root()) || parents.len() > 1 {
        return Some(StepId::root());
    }
    let parent_id = parents.keys().next()?;
    if !known.contains_key(parent_id) {
        return None;
    }
    if *parent_id == step.id {
        Some(StepId::root())
    } else {
        Some(parent_id.clone())
    }
}

/// Reorder steps so each follows the step it feeds, walking the tree in
/// pre-order from the root. Steps the walk never reaches (parent loops,
/// unknown parents) are appended in their incoming order.
///
/// The result is always a permutation of the input.
pub fn calculate_hierarchy(steps: Vec<Step>) -> Vec<Step> {
    let mut known: HashMap<&StepId, usize> = HashMap::with_capacity(steps.len());
    for (index, step) in steps.iter().enumerate() {
        known.entry(&step.id).or_insert(index);
    }

    let mut groups: HashMap<StepId, Vec<usize>> = HashMap::new();
    for (index, step) in steps.iter().enumerate() {
        if let Some(parent) = display_parent(step, &known) {
            groups.entry(parent).or_default().push(index);
        }
    }

    let mut visited = vec![false; steps.len()];
    let mut order: Vec<usize> = Vec::with_capacity(steps.len());
    let mut stack: Vec<usize> = groups
        .get(&StepId::root())
        .map(|children| children.iter().rev().copied().collect())
        .unwrap_or_default();
    while let Some(index) = stack.pop() {
        if visited[index] {
            continue;
        }
        visited[index] = true;
        order.push(index);
        if let Some(children) = groups.get(&steps[index].id) {
            stack.extend(children.iter().rev().copied());
        }
    }

    let unreached = steps.len() - order.len();
    if unreached > 0 {
        debug!(unreached, "steps outside the hierarchy appended in order");
        order.extend((0..steps.len()).filter(|&index| !visited[index]));
    }

    let mut slots: Vec<Option<Step>> = steps.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect()
}
