//! The post-solve normalization pipeline.
//!
//! Takes the solver's raw steps and returns display-ready steps:
//!
//! 1. **Copy** -- the caller's steps are never mutated.
//! 2. **Recipes** -- attach missing recipe snapshots.
//! 3. **Flow** -- record consumption on item steps and output fractions on
//!    recipe steps.
//! 4. **Enrich** -- per step: settings, power/pollution, belts and wagons,
//!    beacons, display rate scaling, checked flag.
//! 5. **Layer** -- depth of each step in the item/recipe flow graph.
//! 6. **Order** -- rank sort, then parent/child hierarchy.
//!
//! Phases 2, 3, 5 and 6 need every step at once; phase 4 touches one step
//! at a time and runs on the rayon pool with the `parallel` feature.

use std::collections::HashMap;

use tracing::{debug, debug_span, trace};

use crate::dataset::AdjustedDataset;
use crate::enrich::{calculate_beacons, calculate_belts, calculate_checked, calculate_display_rate};
use crate::error::PlanError;
use crate::flow::{accumulate_flow, attach_recipes, calculate_settings};
use crate::hierarchy::{calculate_hierarchy, sort_by_rank};
use crate::id::{ItemId, ObjectiveId, RecipeId};
use crate::layering::assign_depths;
use crate::objective::Objective;
use crate::power::{DrainPolicy, adjust_power_pollution};
use crate::rate::objective_normalized_rate;
use crate::rational::Rational;
use crate::settings::{DisplayRate, DisplayRateInfo, ItemSettings, RecipeSettings, SettingsComplete};
use crate::step::Step;

/// Everything a planning run reads. Never mutated by the pipeline.
#[derive(Debug, Clone)]
pub struct PlanContext {
    pub item_settings: HashMap<ItemId, ItemSettings>,
    pub recipe_settings: HashMap<RecipeId, RecipeSettings>,
    /// Belt item id to items per second.
    pub belt_speeds: HashMap<ItemId, Rational>,
    pub display_rate: DisplayRateInfo,
    pub settings: SettingsComplete,
    pub data: AdjustedDataset,
}

impl PlanContext {
    /// A context with empty settings and the dataset's own belt speeds.
    pub fn new(data: AdjustedDataset) -> Self {
        Self {
            item_settings: HashMap::new(),
            recipe_settings: HashMap::new(),
            belt_speeds: data.belt_speeds(),
            display_rate: DisplayRateInfo::default(),
            settings: SettingsComplete::default(),
            data,
        }
    }

    pub fn with_display_rate(mut self, display_rate: DisplayRate) -> Self {
        self.display_rate = display_rate.info();
        self
    }

    pub fn with_settings(mut self, settings: SettingsComplete) -> Self {
        self.settings = settings;
        self
    }

    /// The solver rate for `objective`. See [`objective_normalized_rate`].
    pub fn normalized_rate(&self, objective: &Objective) -> Result<Rational, PlanError> {
        objective_normalized_rate(
            objective,
            &self.item_settings,
            &self.belt_speeds,
            &self.display_rate,
            &self.data,
        )
    }

    /// Run the pipeline. See [`normalize_steps`].
    pub fn normalize_steps(
        &self,
        steps: &[Step],
        objectives: &[Objective],
    ) -> Result<Vec<Step>, PlanError> {
        normalize_steps(steps, objectives, self)
    }
}

/// Normalize the solver's steps for display.
///
/// Returns a new, reordered list of the same steps. Fails only on
/// arithmetic errors such as a zero recipe time.
pub fn normalize_steps(
    steps: &[Step],
    objectives: &[Objective],
    ctx: &PlanContext,
) -> Result<Vec<Step>, PlanError> {
    let span = debug_span!(
        "normalize_steps",
        steps = steps.len(),
        objectives = objectives.len()
    );
    let _enter = span.enter();

    let mut steps = steps.to_vec();
    let objectives: HashMap<ObjectiveId, &Objective> =
        objectives.iter().map(|o| (o.id.clone(), o)).collect();

    attach_recipes(&mut steps, &objectives, &ctx.data);
    accumulate_flow(&mut steps)?;
    trace!("flow accumulated");

    let policy = ctx.settings.game.drain_policy();
    enrich_all(&mut steps, &objectives, ctx, policy)?;
    trace!(?policy, "steps enriched");

    assign_depths(&mut steps);
    sort_by_rank(&mut steps);
    let steps = calculate_hierarchy(steps);
    debug!(steps = steps.len(), "normalized steps");
    Ok(steps)
}

#[cfg(feature = "parallel")]
fn enrich_all(
    steps: &mut [Step],
    objectives: &HashMap<ObjectiveId, &Objective>,
    ctx: &PlanContext,
    policy: DrainPolicy,
) -> Result<(), PlanError> {
    use rayon::prelude::*;

    steps
        .par_iter_mut()
        .try_for_each(|step| enrich_step(step, objectives, ctx, policy))
}

#[cfg(not(feature = "parallel"))]
fn enrich_all(
    steps: &mut [Step],
    objectives: &HashMap<ObjectiveId, &Objective>,
    ctx: &PlanContext,
    policy: DrainPolicy,
) -> Result<(), PlanError> {
    steps
        .iter_mut()
        .try_for_each(|step| enrich_step(step, objectives, ctx, policy))
}

fn enrich_step(
    step: &mut Step,
    objectives: &HashMap<ObjectiveId, &Objective>,
    ctx: &PlanContext,
    policy: DrainPolicy,
) -> Result<(), PlanError> {
    calculate_settings(step, objectives, &ctx.recipe_settings);
    if let Some(recipe) = step.recipe.take() {
        adjust_power_pollution(step, &recipe, policy);
        step.recipe = Some(recipe);
    }
    calculate_belts(step, &ctx.item_settings, &ctx.belt_speeds, &ctx.data)?;
    calculate_beacons(step, ctx.settings.beacon_receivers.as_ref(), &ctx.data)?;
    calculate_display_rate(step, &ctx.display_rate)?;
    calculate_checked(step, &ctx.settings);
    Ok(())
}
