//! Power and pollution for recipe steps.
//!
//! Consumption and pollution scale with the exact machine count. Drain is
//! paid per whole machine, and how it accumulates depends on the game, so
//! it is delegated to a [`DrainPolicy`].

use serde::{Deserialize, Serialize};

use crate::dataset::Recipe;
use crate::rational::Rational;
use crate::step::Step;

/// How idle drain accumulates across a step's machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainPolicy {
    /// Every built machine draws its idle power.
    #[default]
    Cumulative,
    /// Drain is not cumulative: running machines already include it in
    /// their working power, so only the idle remainder draws it.
    InactiveOnly,
}

impl DrainPolicy {
    /// Number of machines that draw idle power for `machines` running.
    pub fn draining_machines(self, machines: &Rational) -> Rational {
        let built = machines.ceil();
        match self {
            DrainPolicy::Cumulative => built,
            DrainPolicy::InactiveOnly => built - machines,
        }
    }
}

/// Recompute a step's power and pollution from its machine count.
///
/// Skipped for idle steps and for launch recipes (`part` set). Power is
/// reset, not accumulated, whenever the recipe has any drain or
/// consumption.
pub fn adjust_power_pollution(step: &mut Step, recipe: &Recipe, policy: DrainPolicy) {
    let Some(machines) = step.machines.as_ref().filter(|m| m.nonzero()) else {
        return;
    };
    if recipe.part.is_some() {
        return;
    }

    let drain = recipe.drain.as_ref().filter(|d| d.nonzero());
    let consumption = recipe.consumption.as_ref().filter(|c| c.nonzero());
    if drain.is_some() || consumption.is_some() {
        let mut power = Rational::zero();
        if let Some(drain) = drain {
            power = power + policy.draining_machines(machines) * drain;
        }
        if let Some(consumption) = consumption {
            power = power + machines * consumption;
        }
        step.power = Some(power);
    }

    if let Some(pollution) = recipe.pollution.as_ref().filter(|p| p.nonzero()) {
        step.pollution = Some(machines * pollution);
    }
}
