//! End-to-end planning scenarios for the Flowplan pipeline.
//!
//! Each test feeds solver-style steps through the full pipeline, optionally
//! starting from a plan configuration file, and checks the display-ready
//! result.

use std::fs;
use std::path::PathBuf;

use flowplan_core::dataset::*;
use flowplan_core::id::*;
use flowplan_core::objective::{Objective, ObjectiveUnit};
use flowplan_core::pipeline::PlanContext;
use flowplan_core::settings::*;
use flowplan_core::step::Step;
use flowplan_core::test_utils::*;
use flowplan_data::load_plan_config;

// ============================================================================
// Fixtures
// ============================================================================

/// Circuits from plates in a powered, polluting assembler.
fn powered_dataset() -> AdjustedDataset {
    let mut b = DatasetBuilder::new();
    b.register_item(Item::new("plate", Some(r(100))))
        .register_item(Item::new("circuit", Some(r(200))))
        .register_recipe(
            Recipe::new("circuit", rq(1, 2))
                .with_input("plate", r(1))
                .with_output("circuit", r(1))
                .with_power(Some(r(5)), Some(r(3)))
                .with_pollution(r(2)),
        )
        .register_machine(Machine::new("assembler"));
    b.build().unwrap()
}

fn circuit_steps() -> Vec<Step> {
    vec![
        Step::new("circuit")
            .with_item("circuit", r(4))
            .with_recipe("circuit", r(2))
            .with_parent(StepId::root(), r(4))
            .with_output(r(4)),
        Step::new("plate").with_item("plate", r(4)),
    ]
}

fn find<'a>(steps: &'a [Step], id: &str) -> &'a Step {
    steps
        .iter()
        .find(|s| s.id.as_str() == id)
        .unwrap_or_else(|| panic!("no step {id}"))
}

fn make_test_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "flowplan_scenario_{suffix}_{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn gear_chain_from_objective_to_display() {
    init_tracing();
    let ctx = sample_context(DisplayRate::PerMinute);

    let objective = Objective::items("gears", "iron-gear-wheel", r(240));
    assert_eq!(ctx.normalized_rate(&objective).unwrap(), r(4));

    let result = ctx
        .normalize_steps(&gear_chain_steps(), &[objective])
        .unwrap();

    let order: Vec<&str> = result.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(order, ["gear", "plate", "ore"]);

    let ore = find(&result, "ore");
    assert_eq!(ore.parents.as_ref().unwrap()[&StepId::from("plate")], r(1));
    assert_eq!(ore.items, Some(r(480)));

    let smelting = find(&result, "plate");
    assert_eq!(
        smelting.recipe_settings.as_ref().unwrap().machine_id,
        Some(MachineId::from("electric-furnace"))
    );
    assert_eq!(smelting.outputs.as_ref().unwrap()[&ItemId::from("iron-plate")], r(1));
    assert_eq!(smelting.wagons, Some(rq(8, 4000) * r(60)));
}

#[test]
fn power_counts_whole_machines_for_drain() {
    init_tracing();
    let ctx = PlanContext::new(powered_dataset()).with_display_rate(DisplayRate::PerSecond);

    let result = ctx.normalize_steps(&circuit_steps(), &[]).unwrap();

    let circuit = find(&result, "circuit");
    // 2 machines * 5 drain + 2 machines * 3 consumption
    assert_eq!(circuit.power, Some(r(16)));
    assert_eq!(circuit.pollution, Some(r(4)));
    let plate = find(&result, "plate");
    assert_eq!(plate.parents.as_ref().unwrap()[&StepId::from("circuit")], r(1));
}

#[test]
fn inactive_only_drain_for_dyson_sphere_program() {
    let settings = SettingsComplete {
        game: Game::DysonSphereProgram,
        ..SettingsComplete::default()
    };
    let ctx = PlanContext::new(powered_dataset())
        .with_display_rate(DisplayRate::PerSecond)
        .with_settings(settings);

    let result = ctx.normalize_steps(&circuit_steps(), &[]).unwrap();

    // All machines run, so no idle drain remains.
    assert_eq!(find(&result, "circuit").power, Some(r(6)));
}

#[test]
fn two_item_cycle_terminates_and_keeps_every_step() {
    init_tracing();
    let mut b = DatasetBuilder::new();
    b.register_item(Item::new("a", Some(r(50))))
        .register_item(Item::new("b", Some(r(50))))
        .register_recipe(Recipe::new("ra", r(1)).with_input("b", r(1)).with_output("a", r(2)))
        .register_recipe(Recipe::new("rb", r(1)).with_input("a", r(1)).with_output("b", r(2)));
    let ctx = PlanContext::new(b.build().unwrap()).with_display_rate(DisplayRate::PerSecond);

    let steps = vec![
        Step::new("a").with_item("a", r(2)).with_recipe("ra", r(1)),
        Step::new("b").with_item("b", r(2)).with_recipe("rb", r(1)),
    ];
    let result = ctx.normalize_steps(&steps, &[]).unwrap();

    // Layering drops only the edge closing the loop (ra -> a), leaving
    // a -> rb -> b -> ra with a at depth 0 and b at depth 2.
    assert_eq!(find(&result, "a").depth, Some(0));
    assert_eq!(find(&result, "b").depth, Some(2));

    // Each step's only consumer is the other one, so neither hangs off the
    // root and both are appended in rank order, each exactly once.
    let order: Vec<&str> = result.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(order, ["b", "a"]);
    assert_eq!(
        find(&result, "a").parents.as_ref().unwrap()[&StepId::from("b")],
        rq(1, 2)
    );
    assert_eq!(
        find(&result, "b").parents.as_ref().unwrap()[&StepId::from("a")],
        rq(1, 2)
    );
}

#[test]
fn recipe_objective_owns_settings_and_snapshot() {
    let mut ctx = sample_context(DisplayRate::PerSecond);
    ctx.settings.checked_objective_ids.insert(ObjectiveId::from("obj"));

    let mut objective = Objective::new("obj", "iron-gear-wheel", r(2), ObjectiveUnit::Machines);
    objective.settings.machine_id = Some(MachineId::from("assembling-machine"));
    // Faster than the catalog recipe: 1 s per craft instead of 1/2 s.
    objective.recipe = Some(
        Recipe::new("iron-gear-wheel", r(1))
            .with_input("iron-plate", r(2))
            .with_output("iron-gear-wheel", r(1)),
    );
    assert_eq!(ctx.normalized_rate(&objective).unwrap(), r(2));

    let mut driven = Step::new("driven").with_recipe("iron-gear-wheel", r(2));
    driven.recipe_objective_id = Some(objective.id.clone());
    let steps = vec![driven, Step::new("plate").with_item("iron-plate", r(4))];

    let result = ctx.normalize_steps(&steps, &[objective]).unwrap();

    let driven = find(&result, "driven");
    assert!(driven.checked);
    assert_eq!(
        driven.recipe_settings.as_ref().unwrap().machine_id,
        Some(MachineId::from("assembling-machine"))
    );
    // 2 machines / 1 s * 2 plates = 4 plates/s, the plate row's whole total.
    let plate = find(&result, "plate");
    assert_eq!(plate.parents.as_ref().unwrap()[&StepId::from("driven")], r(1));
    assert_eq!(result[0].id.as_str(), "driven");
}

#[test]
fn config_file_drives_a_full_run() {
    init_tracing();
    let dir = make_test_dir("config_run");
    let path = dir.join("plan.toml");
    fs::write(
        &path,
        r#"
display_rate = "per_minute"
beacon_receivers = "8"
checked_items = ["iron-plate"]

[items.iron-plate]
belt_id = "express-belt"

[recipes.iron-gear-wheel]
machine_id = "assembling-machine"
beacons = [{ id = "beacon", count = "8" }]

[[objectives]]
id = "gears"
target_id = "iron-gear-wheel"
value = "240"
"#,
    )
    .unwrap();

    let config = load_plan_config(&path).unwrap();
    let (ctx, objectives) = config.into_context(sample_dataset());
    assert_eq!(ctx.normalized_rate(&objectives[0]).unwrap(), r(4));

    let result = ctx.normalize_steps(&gear_chain_steps(), &objectives).unwrap();

    let gear = find(&result, "gear");
    let beacons = gear
        .recipe_settings
        .as_ref()
        .unwrap()
        .beacons
        .as_ref()
        .unwrap();
    // ceil(2) * 8 / 8 = 2, raised to the per-machine count of 8.
    assert_eq!(beacons[0].total, Some(r(8)));
    assert_eq!(gear.power, Some(r(8) * r(480)));

    let plate = find(&result, "plate");
    assert!(plate.checked);
    assert_eq!(plate.belts, Some(rq(8, 45)));
    assert!(!find(&result, "ore").checked);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn normalized_steps_serialize_with_exact_rationals() {
    let ctx = sample_context(DisplayRate::PerHour);
    let result = ctx.normalize_steps(&gear_chain_steps(), &[]).unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json[0]["id"], "gear");
    assert_eq!(json[0]["items"], "14400");
    assert_eq!(json[1]["belts"], "8/15");

    let back: Vec<Step> = serde_json::from_value(json).unwrap();
    assert_eq!(back, result);
}
