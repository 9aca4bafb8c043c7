//! One row of the resolved production plan.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};

use crate::dataset::Recipe;
use crate::id::*;
use crate::rational::Rational;
use crate::settings::RecipeSettings;

/// A node in the resolved flow graph: an item row, a recipe row, or both
/// when a recipe's output folds into its own row.
///
/// Steps come from the solver with `machines`, `items` and any
/// objective-driven `parents` entries already set; the pipeline fills in
/// everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<RecipeId>,
    /// Set when the step was created directly from a recipe objective.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_objective_id: Option<ObjectiveId>,
    /// Adjusted recipe snapshot used for flow and power calculations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<Recipe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machines: Option<Rational>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Rational>,
    /// Consuming step id to the amount it takes from this item. After
    /// display scaling, the fraction of `items` it takes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parents: Option<BTreeMap<StepId, Rational>>,
    /// Output item id to the fraction of that item's total this recipe
    /// step produces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<BTreeMap<ItemId, Rational>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub belts: Option<Rational>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wagons: Option<Rational>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<Rational>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pollution: Option<Rational>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surplus: Option<Rational>,
    /// Set on rows that satisfy a top-level output objective.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Rational>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_settings: Option<RecipeSettings>,
    #[serde(default)]
    pub checked: bool,
    /// Layering rank in the item/recipe flow graph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
}

impl Step {
    pub fn new(id: impl Into<StepId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_item(mut self, item: impl Into<ItemId>, items: Rational) -> Self {
        self.item_id = Some(item.into());
        self.items = Some(items);
        self
    }

    pub fn with_recipe(mut self, recipe: impl Into<RecipeId>, machines: Rational) -> Self {
        self.recipe_id = Some(recipe.into());
        self.machines = Some(machines);
        self
    }

    pub fn with_parent(mut self, parent: impl Into<StepId>, amount: Rational) -> Self {
        self.add_parent(parent.into(), amount);
        self
    }

    pub fn with_output(mut self, output: Rational) -> Self {
        self.output = Some(output);
        self
    }

    /// Add `amount` to the `parents` entry for `parent`, summing with any
    /// existing contribution.
    pub fn add_parent(&mut self, parent: StepId, amount: Rational) {
        add_entity_value(self.parents.get_or_insert_with(BTreeMap::new), parent, amount);
    }

    /// Add `fraction` to the `outputs` entry for `item`.
    pub fn add_output(&mut self, item: ItemId, fraction: Rational) {
        add_entity_value(self.outputs.get_or_insert_with(BTreeMap::new), item, fraction);
    }

    pub fn has_machines(&self) -> bool {
        self.machines.as_ref().is_some_and(Rational::nonzero)
    }

    pub fn has_items(&self) -> bool {
        self.items.as_ref().is_some_and(Rational::nonzero)
    }
}

fn add_entity_value<K: Ord>(map: &mut BTreeMap<K, Rational>, key: K, value: Rational) {
    match map.entry(key) {
        Entry::Occupied(mut entry) => {
            let sum = entry.get() + &value;
            entry.insert(sum);
        }
        Entry::Vacant(entry) => {
            entry.insert(value);
        }
    }
}
