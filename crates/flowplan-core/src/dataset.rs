//! Read-only catalog of items, recipes, machines, beacons and logistics
//! entities consumed by the pipeline.
//!
//! The catalog is assembled through [`DatasetBuilder`] and frozen into an
//! [`AdjustedDataset`]. Nothing in the pipeline mutates it, so one dataset
//! can back any number of planning runs.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::id::*;
use crate::rational::Rational;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// An item type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Stack size. `None` for fluids, which ride fluid wagons instead.
    #[serde(default)]
    pub stack: Option<Rational>,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, stack: Option<Rational>) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            stack,
        }
    }
}

/// Transport belt properties of a belt item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Belt {
    /// Items per second.
    pub speed: Rational,
}

/// Cargo wagon properties of a wagon item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoWagon {
    /// Number of stacks carried.
    pub size: Rational,
}

/// Fluid wagon properties of a wagon item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluidWagon {
    /// Units of fluid carried.
    pub capacity: Rational,
}

/// A crafting building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: MachineId,
    pub name: String,
    /// Rocket silos assemble launch parts in place.
    #[serde(default)]
    pub silo: bool,
}

impl Machine {
    pub fn new(id: impl Into<MachineId>) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            silo: false,
        }
    }

    pub fn as_silo(mut self) -> Self {
        self.silo = true;
        self
    }
}

/// How an entity is powered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyType {
    #[default]
    Electric,
    Burner,
}

/// A beacon that broadcasts module effects to nearby machines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beacon {
    pub id: BeaconId,
    pub name: String,
    #[serde(default)]
    pub energy_type: EnergyType,
    /// Power draw per beacon, in kW.
    #[serde(default)]
    pub usage: Option<Rational>,
}

impl Beacon {
    pub fn electric(id: impl Into<BeaconId>, usage: Rational) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            energy_type: EnergyType::Electric,
            usage: Some(usage),
        }
    }
}

/// A recipe, already adjusted for the active machine, modules and bonuses.
///
/// `inputs` and `outputs` hold per-cycle amounts. Power and pollution
/// figures are per machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    /// Seconds per cycle.
    pub time: Rational,
    #[serde(default, rename = "in")]
    pub inputs: BTreeMap<ItemId, Rational>,
    #[serde(default, rename = "out")]
    pub outputs: BTreeMap<ItemId, Rational>,
    /// Idle drain, in kW.
    #[serde(default)]
    pub drain: Option<Rational>,
    /// Working consumption, in kW.
    #[serde(default)]
    pub consumption: Option<Rational>,
    /// Pollution per minute.
    #[serde(default)]
    pub pollution: Option<Rational>,
    /// Set on launch recipes: the part item assembled inside the silo.
    #[serde(default)]
    pub part: Option<ItemId>,
    #[serde(default)]
    pub is_technology: bool,
    #[serde(default = "Rational::one")]
    pub productivity: Rational,
}

impl Recipe {
    pub fn new(id: impl Into<RecipeId>, time: Rational) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            time,
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            drain: None,
            consumption: None,
            pollution: None,
            part: None,
            is_technology: false,
            productivity: Rational::one(),
        }
    }

    pub fn with_input(mut self, item: impl Into<ItemId>, amount: Rational) -> Self {
        self.inputs.insert(item.into(), amount);
        self
    }

    pub fn with_output(mut self, item: impl Into<ItemId>, amount: Rational) -> Self {
        self.outputs.insert(item.into(), amount);
        self
    }

    pub fn with_power(mut self, drain: Option<Rational>, consumption: Option<Rational>) -> Self {
        self.drain = drain;
        self.consumption = consumption;
        self
    }

    pub fn with_pollution(mut self, pollution: Rational) -> Self {
        self.pollution = Some(pollution);
        self
    }

    pub fn with_part(mut self, part: impl Into<ItemId>) -> Self {
        self.part = Some(part.into());
        self
    }

    /// Mark as a research recipe whose output is scaled by `productivity`.
    pub fn technology(mut self, productivity: Rational) -> Self {
        self.is_technology = true;
        self.productivity = productivity;
        self
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for an immutable [`AdjustedDataset`].
/// Three-phase lifecycle: registration -> mutation -> finalization.
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    items: Vec<Item>,
    recipes: Vec<Recipe>,
    machines: Vec<Machine>,
    beacons: Vec<Beacon>,
    belts: Vec<(ItemId, Belt)>,
    cargo_wagons: Vec<(ItemId, CargoWagon)>,
    fluid_wagons: Vec<(ItemId, FluidWagon)>,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase 1: Register an item.
    pub fn register_item(&mut self, item: Item) -> &mut Self {
        self.items.push(item);
        self
    }

    /// Phase 1: Register a recipe.
    pub fn register_recipe(&mut self, recipe: Recipe) -> &mut Self {
        self.recipes.push(recipe);
        self
    }

    /// Phase 1: Register a machine.
    pub fn register_machine(&mut self, machine: Machine) -> &mut Self {
        self.machines.push(machine);
        self
    }

    /// Phase 1: Register a beacon.
    pub fn register_beacon(&mut self, beacon: Beacon) -> &mut Self {
        self.beacons.push(beacon);
        self
    }

    /// Phase 1: Attach belt properties to a registered item.
    pub fn register_belt(&mut self, item: impl Into<ItemId>, belt: Belt) -> &mut Self {
        self.belts.push((item.into(), belt));
        self
    }

    /// Phase 1: Attach cargo wagon properties to a registered item.
    pub fn register_cargo_wagon(&mut self, item: impl Into<ItemId>, wagon: CargoWagon) -> &mut Self {
        self.cargo_wagons.push((item.into(), wagon));
        self
    }

    /// Phase 1: Attach fluid wagon properties to a registered item.
    pub fn register_fluid_wagon(&mut self, item: impl Into<ItemId>, wagon: FluidWagon) -> &mut Self {
        self.fluid_wagons.push((item.into(), wagon));
        self
    }

    /// Phase 2: Mutate a registered recipe.
    pub fn mutate_recipe<F>(&mut self, id: &RecipeId, f: F) -> Result<(), DatasetError>
    where
        F: FnOnce(&mut Recipe),
    {
        let recipe = self
            .recipes
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| DatasetError::NotFound(id.to_string()))?;
        f(recipe);
        Ok(())
    }

    /// Phase 3: Validate references and freeze the catalog.
    ///
    /// `item_recipe_ids` is derived here: for each item, the recipes that
    /// output it, in registration order.
    pub fn build(self) -> Result<AdjustedDataset, DatasetError> {
        let mut items = HashMap::with_capacity(self.items.len());
        for item in self.items {
            if items.contains_key(&item.id) {
                return Err(DatasetError::Duplicate(item.id.to_string()));
            }
            items.insert(item.id.clone(), item);
        }

        let mut item_recipe_ids: HashMap<ItemId, Vec<RecipeId>> =
            items.keys().map(|id| (id.clone(), Vec::new())).collect();
        let mut recipes = HashMap::with_capacity(self.recipes.len());
        for recipe in self.recipes {
            if recipes.contains_key(&recipe.id) {
                return Err(DatasetError::Duplicate(recipe.id.to_string()));
            }
            for item in recipe.inputs.keys().chain(recipe.outputs.keys()) {
                if !items.contains_key(item) {
                    return Err(DatasetError::InvalidItemRef(item.clone()));
                }
            }
            for item in recipe.outputs.keys() {
                item_recipe_ids
                    .entry(item.clone())
                    .or_default()
                    .push(recipe.id.clone());
            }
            recipes.insert(recipe.id.clone(), recipe);
        }

        let mut machines = HashMap::with_capacity(self.machines.len());
        for machine in self.machines {
            if machines.contains_key(&machine.id) {
                return Err(DatasetError::Duplicate(machine.id.to_string()));
            }
            machines.insert(machine.id.clone(), machine);
        }

        let mut beacons = HashMap::with_capacity(self.beacons.len());
        for beacon in self.beacons {
            if beacons.contains_key(&beacon.id) {
                return Err(DatasetError::Duplicate(beacon.id.to_string()));
            }
            beacons.insert(beacon.id.clone(), beacon);
        }

        let belts = attach(&items, self.belts)?;
        let cargo_wagons = attach(&items, self.cargo_wagons)?;
        let fluid_wagons = attach(&items, self.fluid_wagons)?;

        Ok(AdjustedDataset {
            items,
            recipes,
            machines,
            beacons,
            belts,
            cargo_wagons,
            fluid_wagons,
            item_recipe_ids,
        })
    }
}

/// Key logistics properties by item, rejecting references to unknown items.
fn attach<T>(
    items: &HashMap<ItemId, Item>,
    entries: Vec<(ItemId, T)>,
) -> Result<HashMap<ItemId, T>, DatasetError> {
    let mut out = HashMap::with_capacity(entries.len());
    for (id, value) in entries {
        if !items.contains_key(&id) {
            return Err(DatasetError::InvalidItemRef(id));
        }
        out.insert(id, value);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// AdjustedDataset
// ---------------------------------------------------------------------------

/// Immutable catalog. Frozen after build(). Thread-safe to share.
#[derive(Debug, Clone)]
pub struct AdjustedDataset {
    items: HashMap<ItemId, Item>,
    recipes: HashMap<RecipeId, Recipe>,
    machines: HashMap<MachineId, Machine>,
    beacons: HashMap<BeaconId, Beacon>,
    belts: HashMap<ItemId, Belt>,
    cargo_wagons: HashMap<ItemId, CargoWagon>,
    fluid_wagons: HashMap<ItemId, FluidWagon>,
    item_recipe_ids: HashMap<ItemId, Vec<RecipeId>>,
}

impl AdjustedDataset {
    pub fn builder() -> DatasetBuilder {
        DatasetBuilder::new()
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn recipe(&self, id: &RecipeId) -> Option<&Recipe> {
        self.recipes.get(id)
    }

    pub fn machine(&self, id: &MachineId) -> Option<&Machine> {
        self.machines.get(id)
    }

    pub fn beacon(&self, id: &BeaconId) -> Option<&Beacon> {
        self.beacons.get(id)
    }

    pub fn belt(&self, id: &ItemId) -> Option<&Belt> {
        self.belts.get(id)
    }

    pub fn cargo_wagon(&self, id: &ItemId) -> Option<&CargoWagon> {
        self.cargo_wagons.get(id)
    }

    pub fn fluid_wagon(&self, id: &ItemId) -> Option<&FluidWagon> {
        self.fluid_wagons.get(id)
    }

    /// Recipes producing `item`, in registration order. `None` if the item
    /// is not in the catalog.
    pub fn item_recipe_ids(&self, item: &ItemId) -> Option<&[RecipeId]> {
        self.item_recipe_ids.get(item).map(Vec::as_slice)
    }

    /// Belt id to belt speed, as consumed by the pipeline.
    pub fn belt_speeds(&self) -> HashMap<ItemId, Rational> {
        self.belts
            .iter()
            .map(|(id, belt)| (id.clone(), belt.speed.clone()))
            .collect()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatasetError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("duplicate id: {0}")]
    Duplicate(String),
    #[error("invalid item reference: {0}")]
    InvalidItemRef(ItemId),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(n: i64) -> Rational {
        Rational::from_integer(n)
    }

    fn setup_builder() -> DatasetBuilder {
        let mut b = DatasetBuilder::new();
        b.register_item(Item::new("iron-ore", Some(r(50))))
            .register_item(Item::new("iron-plate", Some(r(100))))
            .register_item(Item::new("transport-belt", Some(r(100))))
            .register_recipe(
                Recipe::new("iron-plate", r(3))
                    .with_input("iron-ore", r(1))
                    .with_output("iron-plate", r(1)),
            )
            .register_recipe(Recipe::new("iron-ore", r(1)).with_output("iron-ore", r(1)))
            .register_belt("transport-belt", Belt { speed: r(15) });
        b
    }

    #[test]
    fn register_and_build() {
        let data = setup_builder().build().unwrap();
        assert_eq!(data.item_count(), 3);
        assert_eq!(data.recipe_count(), 2);
        assert!(data.item(&ItemId::from("iron-ore")).is_some());
        assert!(data.item(&ItemId::from("nonexistent")).is_none());
    }

    #[test]
    fn item_recipe_ids_derived_from_outputs() {
        let data = setup_builder().build().unwrap();
        assert_eq!(
            data.item_recipe_ids(&ItemId::from("iron-plate")),
            Some(&[RecipeId::from("iron-plate")][..])
        );
        // Known item with no producer.
        assert_eq!(data.item_recipe_ids(&ItemId::from("transport-belt")), Some(&[][..]));
        assert_eq!(data.item_recipe_ids(&ItemId::from("missing")), None);
    }

    #[test]
    fn belt_speeds_table() {
        let data = setup_builder().build().unwrap();
        let speeds = data.belt_speeds();
        assert_eq!(speeds[&ItemId::from("transport-belt")], r(15));
        let belt = data.belt(&ItemId::from("transport-belt")).unwrap();
        assert_eq!(speeds[&ItemId::from("transport-belt")], belt.speed);
        assert!(data.belt(&ItemId::from("iron-plate")).is_none());
    }

    #[test]
    fn mutate_recipe() {
        let mut b = setup_builder();
        b.mutate_recipe(&RecipeId::from("iron-plate"), |recipe| {
            recipe.time = r(2);
        })
        .unwrap();
        let data = b.build().unwrap();
        assert_eq!(data.recipe(&RecipeId::from("iron-plate")).unwrap().time, r(2));
    }

    #[test]
    fn mutate_nonexistent_fails() {
        let mut b = setup_builder();
        let result = b.mutate_recipe(&RecipeId::from("nonexistent"), |_| {});
        assert!(matches!(result, Err(DatasetError::NotFound(_))));
    }

    #[test]
    fn invalid_item_ref_in_recipe_fails() {
        let mut b = DatasetBuilder::new();
        b.register_recipe(Recipe::new("bad", r(1)).with_input("ghost", r(1)));
        assert_eq!(
            b.build().unwrap_err(),
            DatasetError::InvalidItemRef(ItemId::from("ghost"))
        );
    }

    #[test]
    fn duplicate_item_fails() {
        let mut b = DatasetBuilder::new();
        b.register_item(Item::new("a", None))
            .register_item(Item::new("a", None));
        assert!(matches!(b.build(), Err(DatasetError::Duplicate(_))));
    }

    #[test]
    fn belt_for_unknown_item_fails() {
        let mut b = DatasetBuilder::new();
        b.register_belt("ghost-belt", Belt { speed: r(15) });
        assert!(matches!(b.build(), Err(DatasetError::InvalidItemRef(_))));
    }
}
