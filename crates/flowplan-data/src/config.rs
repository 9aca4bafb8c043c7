//! On-disk plan configuration.
//!
//! A [`PlanConfig`] carries every per-run setting the pipeline reads. Every
//! field is optional in the file; missing fields take the defaults of an
//! empty Factorio plan shown per minute.

use std::collections::BTreeMap;

use flowplan_core::dataset::AdjustedDataset;
use flowplan_core::id::*;
use flowplan_core::objective::Objective;
use flowplan_core::pipeline::PlanContext;
use flowplan_core::rational::Rational;
use flowplan_core::settings::*;
use serde::{Deserialize, Serialize};

/// Per-run settings and objectives, as read from a RON/TOML/JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    pub display_rate: DisplayRate,
    pub game: Game,
    pub beacon_receivers: Option<Rational>,
    pub checked_items: Vec<ItemId>,
    pub checked_objectives: Vec<ObjectiveId>,
    pub checked_recipes: Vec<RecipeId>,
    /// Belt and wagon assignment per item.
    pub items: BTreeMap<ItemId, ItemSettings>,
    /// Machine and beacon configuration per recipe.
    pub recipes: BTreeMap<RecipeId, RecipeSettings>,
    /// Belt speed overrides, in items per second. Belts not listed keep the
    /// dataset speed.
    pub belt_speeds: BTreeMap<ItemId, Rational>,
    pub objectives: Vec<Objective>,
}

impl PlanConfig {
    /// Global settings carried by this config.
    pub fn settings(&self) -> SettingsComplete {
        SettingsComplete {
            game: self.game,
            beacon_receivers: self.beacon_receivers.clone(),
            checked_item_ids: self.checked_items.iter().cloned().collect(),
            checked_objective_ids: self.checked_objectives.iter().cloned().collect(),
            checked_recipe_ids: self.checked_recipes.iter().cloned().collect(),
        }
    }

    /// Bind this config to a dataset, returning the run context and the
    /// objectives to solve for.
    pub fn into_context(self, data: AdjustedDataset) -> (PlanContext, Vec<Objective>) {
        let settings = self.settings();
        let mut ctx = PlanContext::new(data)
            .with_display_rate(self.display_rate)
            .with_settings(settings);
        ctx.belt_speeds.extend(self.belt_speeds);
        ctx.item_settings = self.items.into_iter().collect();
        ctx.recipe_settings = self.recipes.into_iter().collect();
        (ctx, self.objectives)
    }
}
