//! Flow propagation between recipe steps and item steps.
//!
//! For every running recipe step, each input item step learns how much
//! that recipe consumes (`parents`), and the recipe step learns which
//! fraction of each output item's total it supplies (`outputs`).

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, trace};

use crate::dataset::AdjustedDataset;
use crate::id::{ItemId, ObjectiveId, RecipeId};
use crate::objective::Objective;
use crate::rational::{Rational, RationalError};
use crate::settings::RecipeSettings;
use crate::step::Step;

/// Fill in each step's recipe snapshot where the solver left it unset:
/// the owning objective's recipe first, then the catalog recipe.
pub fn attach_recipes(
    steps: &mut [Step],
    objectives: &HashMap<ObjectiveId, &Objective>,
    data: &AdjustedDataset,
) {
    for step in steps.iter_mut().filter(|s| s.recipe.is_none()) {
        let Some(recipe_id) = &step.recipe_id else {
            continue;
        };
        let from_objective = step
            .recipe_objective_id
            .as_ref()
            .and_then(|id| objectives.get(id))
            .and_then(|objective| objective.recipe.as_ref());
        match from_objective.or_else(|| data.recipe(recipe_id)) {
            Some(recipe) => step.recipe = Some(recipe.clone()),
            None => debug!(step = %step.id, recipe = %recipe_id, "recipe not in dataset, skipping"),
        }
    }
}

/// Accumulate consumption into item steps and output attribution into
/// recipe steps, for every step in order.
pub fn accumulate_flow(steps: &mut [Step]) -> Result<(), RationalError> {
    // First step for each item wins, matching a linear search.
    let mut item_steps: HashMap<ItemId, usize> = HashMap::new();
    for (index, step) in steps.iter().enumerate() {
        if let Some(item_id) = &step.item_id {
            item_steps.entry(item_id.clone()).or_insert(index);
        }
    }

    for index in 0..steps.len() {
        accumulate_step(index, steps, &item_steps)?;
    }
    Ok(())
}

fn accumulate_step(
    index: usize,
    steps: &mut [Step],
    item_steps: &HashMap<ItemId, usize>,
) -> Result<(), RationalError> {
    let step = &steps[index];
    let (Some(recipe), Some(machines)) = (&step.recipe, &step.machines) else {
        return Ok(());
    };
    if !machines.nonzero() {
        return Ok(());
    }

    let quantity = machines.checked_div(&recipe.time)?;
    let per_cycle = |amounts: &BTreeMap<ItemId, Rational>| -> Vec<(ItemId, Rational)> {
        amounts
            .iter()
            .filter(|(_, amount)| amount.nonzero())
            .map(|(item_id, amount)| (item_id.clone(), amount * &quantity))
            .collect()
    };
    let consumed = per_cycle(&recipe.inputs);
    let produced = per_cycle(&recipe.outputs);
    let step_id = step.id.clone();
    trace!(step = %step_id, quantity = %quantity, "accumulating flow");

    for (item_id, amount) in consumed {
        match item_steps.get(&item_id) {
            Some(&target) => steps[target].add_parent(step_id.clone(), amount),
            None => debug!(step = %step_id, item = %item_id, "no step for input item, skipping"),
        }
    }

    let mut attributed = Vec::with_capacity(produced.len());
    for (item_id, amount) in produced {
        let total = item_steps
            .get(&item_id)
            .and_then(|&target| steps[target].items.as_ref())
            .filter(|items| items.nonzero());
        if let Some(total) = total {
            attributed.push((item_id, amount.checked_div(total)?));
        }
    }
    for (item_id, fraction) in attributed {
        steps[index].add_output(item_id, fraction);
    }
    Ok(())
}

/// Resolve a recipe step's active settings: the owning objective's when
/// the step came from a recipe objective, otherwise the per-recipe ones.
pub fn calculate_settings(
    step: &mut Step,
    objectives: &HashMap<ObjectiveId, &Objective>,
    recipe_settings: &HashMap<RecipeId, RecipeSettings>,
) {
    let Some(recipe_id) = &step.recipe_id else {
        return;
    };
    step.recipe_settings = match &step.recipe_objective_id {
        Some(objective_id) => objectives.get(objective_id).map(|o| o.settings.clone()),
        None => recipe_settings.get(recipe_id).cloned(),
    };
}
