//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use std::collections::HashMap;

use crate::dataset::*;
use crate::id::*;
use crate::pipeline::PlanContext;
use crate::rational::Rational;
use crate::settings::*;
use crate::step::Step;

// ===========================================================================
// Rational helpers
// ===========================================================================

pub fn r(n: i64) -> Rational {
    Rational::from_integer(n)
}

pub fn rq(numer: i64, denom: i64) -> Rational {
    Rational::from_pair(numer, denom).expect("test rational with zero denominator")
}

// ===========================================================================
// Logging
// ===========================================================================

/// Install a test-writer subscriber honoring `RUST_LOG`. Safe to call from
/// every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ===========================================================================
// Sample catalog
// ===========================================================================

/// A small Factorio-like catalog: an iron chain, research, a rocket silo,
/// belts and wagons.
pub fn sample_dataset() -> AdjustedDataset {
    let mut b = DatasetBuilder::new();

    // Items
    b.register_item(Item::new("iron-ore", Some(r(50))))
        .register_item(Item::new("iron-plate", Some(r(100))))
        .register_item(Item::new("iron-gear-wheel", Some(r(100))))
        .register_item(Item::new("water", None))
        .register_item(Item::new("transport-belt", Some(r(100))))
        .register_item(Item::new("express-belt", Some(r(100))))
        .register_item(Item::new("cargo-wagon", Some(r(5))))
        .register_item(Item::new("fluid-wagon", Some(r(5))))
        .register_item(Item::new("automation", None))
        .register_item(Item::new("rocket-part", Some(r(5))))
        .register_item(Item::new("satellite", Some(r(1))))
        .register_item(Item::new("space-science-pack", Some(r(2000))));

    // Recipes
    b.register_recipe(Recipe::new("iron-ore", r(1)).with_output("iron-ore", r(1)))
        .register_recipe(
            Recipe::new("iron-plate", r(1))
                .with_input("iron-ore", r(1))
                .with_output("iron-plate", r(1)),
        )
        .register_recipe(
            Recipe::new("iron-gear-wheel", rq(1, 2))
                .with_input("iron-plate", r(2))
                .with_output("iron-gear-wheel", r(1)),
        )
        .register_recipe(Recipe::new("water", r(1)).with_output("water", r(1200)))
        .register_recipe(
            Recipe::new("automation", r(10))
                .with_input("iron-gear-wheel", r(10))
                .with_output("automation", r(1))
                .technology(rq(3, 2)),
        )
        .register_recipe(
            Recipe::new("rocket-part", r(3))
                .with_input("iron-plate", r(10))
                .with_output("rocket-part", r(1)),
        )
        .register_recipe(
            Recipe::new("space-science-pack", r(40))
                .with_input("rocket-part", r(100))
                .with_input("satellite", r(1))
                .with_output("space-science-pack", r(1000))
                .with_part("rocket-part"),
        );

    // Machines and beacons
    b.register_machine(Machine::new("assembling-machine"))
        .register_machine(Machine::new("electric-furnace"))
        .register_machine(Machine::new("lab"))
        .register_machine(Machine::new("rocket-silo").as_silo())
        .register_beacon(Beacon::electric("beacon", r(480)));

    // Logistics
    b.register_belt("transport-belt", Belt { speed: r(15) })
        .register_belt("express-belt", Belt { speed: r(45) })
        .register_cargo_wagon("cargo-wagon", CargoWagon { size: r(40) })
        .register_fluid_wagon("fluid-wagon", FluidWagon { capacity: r(25000) });

    b.build().expect("sample dataset is consistent")
}

fn item_settings(belt: Option<&str>, wagon: Option<&str>) -> ItemSettings {
    ItemSettings {
        belt_id: belt.map(ItemId::from),
        wagon_id: wagon.map(ItemId::from),
    }
}

/// Plan context over [`sample_dataset`] with belts and wagons assigned to
/// iron plates, water and space science.
pub fn sample_context(display_rate: DisplayRate) -> PlanContext {
    let mut ctx = PlanContext::new(sample_dataset()).with_display_rate(display_rate);
    ctx.item_settings = HashMap::from([
        (
            ItemId::from("iron-plate"),
            item_settings(Some("transport-belt"), Some("cargo-wagon")),
        ),
        (ItemId::from("water"), item_settings(None, Some("fluid-wagon"))),
        (
            ItemId::from("space-science-pack"),
            item_settings(Some("transport-belt"), None),
        ),
    ]);
    ctx.recipe_settings = HashMap::from([
        (
            RecipeId::from("iron-gear-wheel"),
            RecipeSettings {
                machine_id: Some(MachineId::from("assembling-machine")),
                beacons: None,
            },
        ),
        (
            RecipeId::from("iron-plate"),
            RecipeSettings {
                machine_id: Some(MachineId::from("electric-furnace")),
                beacons: None,
            },
        ),
    ]);
    ctx
}

// ===========================================================================
// Step fixtures
// ===========================================================================

/// Solver output for 4 gears/s: ore -> plate -> gear. Recipe snapshots are
/// left for the pipeline to attach.
pub fn gear_chain_steps() -> Vec<Step> {
    vec![
        Step::new("gear")
            .with_item("iron-gear-wheel", r(4))
            .with_recipe("iron-gear-wheel", r(2))
            .with_parent(StepId::root(), r(4))
            .with_output(r(4)),
        Step::new("plate")
            .with_item("iron-plate", r(8))
            .with_recipe("iron-plate", r(8)),
        Step::new("ore")
            .with_item("iron-ore", r(8))
            .with_recipe("iron-ore", r(8)),
    ]
}

/// A linear chain of `len` one-in/one-out recipes over generated items,
/// one unit per second throughout. The last step is the output.
pub fn chain_context(len: usize) -> (PlanContext, Vec<Step>) {
    let item = |k: usize| ItemId::from(format!("item-{k}"));
    let recipe = |k: usize| RecipeId::from(format!("recipe-{k}"));

    let mut b = DatasetBuilder::new();
    for k in 0..len {
        b.register_item(Item::new(item(k), Some(r(100))));
    }
    for k in 0..len {
        let mut rec = Recipe::new(recipe(k), r(1)).with_output(item(k), r(1));
        if k > 0 {
            rec = rec.with_input(item(k - 1), r(1));
        }
        b.register_recipe(rec);
    }
    let ctx = PlanContext::new(b.build().expect("chain dataset is consistent"));

    let steps = (0..len)
        .map(|k| {
            let step = Step::new(format!("{k}"))
                .with_item(item(k), r(1))
                .with_recipe(recipe(k), r(1));
            if k + 1 == len {
                step.with_parent(StepId::root(), r(1)).with_output(r(1))
            } else {
                step
            }
        })
        .collect();
    (ctx, steps)
}
