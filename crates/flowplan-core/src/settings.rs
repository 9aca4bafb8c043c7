//! Per-item, per-recipe and global settings consumed read-only by the
//! pipeline.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::id::*;
use crate::power::DrainPolicy;
use crate::rational::Rational;

// ---------------------------------------------------------------------------
// Item and recipe settings
// ---------------------------------------------------------------------------

/// Logistics assigned to an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSettings {
    #[serde(default)]
    pub belt_id: Option<ItemId>,
    #[serde(default)]
    pub wagon_id: Option<ItemId>,
}

/// One beacon slot in a recipe configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconSettings {
    #[serde(default)]
    pub id: Option<BeaconId>,
    /// Beacons affecting each machine.
    #[serde(default)]
    pub count: Option<Rational>,
    /// Total beacons for the whole step. When unset, the pipeline estimates
    /// it from `count` and the beacon receiver setting.
    #[serde(default)]
    pub total: Option<Rational>,
}

/// Machine, module and beacon configuration for a recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSettings {
    #[serde(default)]
    pub machine_id: Option<MachineId>,
    #[serde(default)]
    pub beacons: Option<Vec<BeaconSettings>>,
}

// ---------------------------------------------------------------------------
// Game mode
// ---------------------------------------------------------------------------

/// The game a dataset describes. Selects game-specific calculation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Game {
    #[default]
    Factorio,
    DysonSphereProgram,
    Satisfactory,
    CaptainOfIndustry,
}

impl Game {
    /// How idle drain accumulates for this game.
    pub fn drain_policy(self) -> DrainPolicy {
        match self {
            Game::DysonSphereProgram => DrainPolicy::InactiveOnly,
            Game::Factorio | Game::Satisfactory | Game::CaptainOfIndustry => {
                DrainPolicy::Cumulative
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Display rate
// ---------------------------------------------------------------------------

/// Time unit used to present rates. Internal rates are per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayRate {
    PerSecond,
    #[default]
    PerMinute,
    PerHour,
}

impl DisplayRate {
    pub fn info(self) -> DisplayRateInfo {
        let (value, suffix) = match self {
            DisplayRate::PerSecond => (1, "/s"),
            DisplayRate::PerMinute => (60, "/m"),
            DisplayRate::PerHour => (3600, "/h"),
        };
        DisplayRateInfo {
            value: Rational::from_integer(value),
            suffix,
        }
    }
}

/// Scale factor from internal per-second rates to the display unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRateInfo {
    pub value: Rational,
    pub suffix: &'static str,
}

impl Default for DisplayRateInfo {
    fn default() -> Self {
        DisplayRate::default().info()
    }
}

// ---------------------------------------------------------------------------
// Global settings
// ---------------------------------------------------------------------------

/// Global toggles for one planning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsComplete {
    #[serde(default)]
    pub game: Game,
    /// Estimated machines sharing each beacon. Beacon totals are only
    /// estimated when this is set and nonzero.
    #[serde(default)]
    pub beacon_receivers: Option<Rational>,
    #[serde(default)]
    pub checked_item_ids: HashSet<ItemId>,
    #[serde(default)]
    pub checked_objective_ids: HashSet<ObjectiveId>,
    #[serde(default)]
    pub checked_recipe_ids: HashSet<RecipeId>,
}
