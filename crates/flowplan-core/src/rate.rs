//! Objective rate normalization.
//!
//! Objectives arrive in the caller's units (items per display period,
//! belts, wagons, machines). The solver works in items per second, so each
//! objective value is scaled by a unit-dependent factor first.

use std::collections::HashMap;

use crate::dataset::AdjustedDataset;
use crate::error::PlanError;
use crate::id::ItemId;
use crate::objective::{Objective, ObjectiveType, ObjectiveUnit};
use crate::rational::Rational;
use crate::settings::{DisplayRateInfo, ItemSettings};

/// Convert `objective.value` into the solver's internal rate.
///
/// Machine counts and maximize targets are already in solver units and
/// pass through unchanged. For research items the factor is also scaled by
/// the producing technology recipe's productivity.
pub fn objective_normalized_rate(
    objective: &Objective,
    item_settings: &HashMap<ItemId, ItemSettings>,
    belt_speeds: &HashMap<ItemId, Rational>,
    display_rate: &DisplayRateInfo,
    data: &AdjustedDataset,
) -> Result<Rational, PlanError> {
    if objective.unit == ObjectiveUnit::Machines
        || objective.objective_type == ObjectiveType::Maximize
    {
        return Ok(objective.value.clone());
    }

    let item_id = ItemId::from(objective.target_id.as_str());
    let item = data
        .item(&item_id)
        .ok_or_else(|| PlanError::UnknownItem(item_id.clone()))?;
    let no_settings = ItemSettings::default();
    let settings = item_settings.get(&item_id).unwrap_or(&no_settings);

    let mut factor = Rational::one();
    match objective.unit {
        ObjectiveUnit::Items => {
            factor = display_rate.value.reciprocal()?;
        }
        ObjectiveUnit::Belts => {
            if let Some(belt_id) = &settings.belt_id {
                factor = belt_speeds
                    .get(belt_id)
                    .cloned()
                    .ok_or_else(|| PlanError::UnknownBelt(belt_id.clone()))?;
            }
        }
        ObjectiveUnit::Wagons => {
            if let Some(wagon_id) = &settings.wagon_id {
                match (&item.stack, data.cargo_wagon(wagon_id), data.fluid_wagon(wagon_id)) {
                    (Some(stack), Some(cargo), _) => {
                        factor = (stack * &cargo.size).checked_div(&display_rate.value)?;
                    }
                    (_, _, Some(fluid)) => {
                        factor = fluid.capacity.checked_div(&display_rate.value)?;
                    }
                    _ => {}
                }
            }
        }
        // Returned early above.
        ObjectiveUnit::Machines => {}
    }

    if let Some(recipe_id) = data.item_recipe_ids(&item_id).and_then(|ids| ids.first()) {
        let recipe = data
            .recipe(recipe_id)
            .ok_or_else(|| PlanError::UnknownRecipe(recipe_id.clone()))?;
        if recipe.is_technology {
            factor = factor * &recipe.productivity;
        }
    }

    Ok(&objective.value * &factor)
}
