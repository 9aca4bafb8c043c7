use serde::{Deserialize, Serialize};

use crate::dataset::Recipe;
use crate::id::*;
use crate::rational::Rational;
use crate::settings::RecipeSettings;

/// Unit an objective's value is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveUnit {
    #[default]
    Items,
    Belts,
    Wagons,
    Machines,
}

/// How the solver treats an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveType {
    #[default]
    Output,
    Maximize,
    Limit,
}

/// A production goal for one planning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    pub id: ObjectiveId,
    /// A recipe id when `unit` is `Machines`, otherwise an item id.
    pub target_id: String,
    pub value: Rational,
    #[serde(default)]
    pub unit: ObjectiveUnit,
    #[serde(default, rename = "type")]
    pub objective_type: ObjectiveType,
    /// Machine and beacon configuration owned by a recipe objective.
    #[serde(flatten)]
    pub settings: RecipeSettings,
    /// Adjusted recipe snapshot owned by a recipe objective.
    #[serde(default)]
    pub recipe: Option<Recipe>,
}

impl Objective {
    /// An item-rate objective.
    pub fn items(id: impl Into<ObjectiveId>, item: impl Into<String>, value: Rational) -> Self {
        Self::new(id, item, value, ObjectiveUnit::Items)
    }

    pub fn new(
        id: impl Into<ObjectiveId>,
        target_id: impl Into<String>,
        value: Rational,
        unit: ObjectiveUnit,
    ) -> Self {
        Self {
            id: id.into(),
            target_id: target_id.into(),
            value,
            unit,
            objective_type: ObjectiveType::Output,
            settings: RecipeSettings::default(),
            recipe: None,
        }
    }

    pub fn with_type(mut self, objective_type: ObjectiveType) -> Self {
        self.objective_type = objective_type;
        self
    }

    /// Recipe objectives count machines rather than items.
    pub fn is_recipe_objective(&self) -> bool {
        self.unit == ObjectiveUnit::Machines
    }

    pub fn item_id(&self) -> Option<ItemId> {
        (!self.is_recipe_objective()).then(|| ItemId::from(self.target_id.as_str()))
    }

    pub fn recipe_id(&self) -> Option<RecipeId> {
        self.is_recipe_objective()
            .then(|| RecipeId::from(self.target_id.as_str()))
    }
}
