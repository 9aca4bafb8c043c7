//! Per-step derived quantities: logistics, beacons, display scaling and
//! the checked flag.
//!
//! Each function annotates one step in place and reads only that step plus
//! the shared read-only context, so steps can be enriched independently.
//! Catalog entries missing for a step are skipped; only arithmetic errors
//! are returned.

use std::collections::HashMap;

use tracing::debug;

use crate::dataset::{AdjustedDataset, EnergyType};
use crate::id::ItemId;
use crate::rational::{Rational, RationalError};
use crate::settings::{DisplayRateInfo, ItemSettings, SettingsComplete};
use crate::step::Step;

/// Belts and wagons needed to carry an item step's rate.
///
/// Research rows and rocket part rows inside a silo carry nothing, so both
/// fields are cleared for them.
pub fn calculate_belts(
    step: &mut Step,
    item_settings: &HashMap<ItemId, ItemSettings>,
    belt_speeds: &HashMap<ItemId, Rational>,
    data: &AdjustedDataset,
) -> Result<(), RationalError> {
    if carries_no_items(step, data) {
        step.belts = None;
        step.wagons = None;
        return Ok(());
    }

    let (Some(item_id), Some(items)) = (&step.item_id, &step.items) else {
        return Ok(());
    };
    let Some(settings) = item_settings.get(item_id) else {
        return Ok(());
    };

    if let Some(belt_id) = &settings.belt_id {
        match belt_speeds.get(belt_id) {
            Some(speed) => step.belts = Some(items.checked_div(speed)?),
            None => debug!(step = %step.id, belt = %belt_id, "unknown belt speed, skipping"),
        }
    }

    if let Some(wagon_id) = &settings.wagon_id {
        let stack = data.item(item_id).and_then(|item| item.stack.as_ref());
        let per_wagon = match stack {
            Some(stack) => data.cargo_wagon(wagon_id).map(|wagon| &wagon.size * stack),
            None => data.fluid_wagon(wagon_id).map(|wagon| wagon.capacity.clone()),
        };
        match per_wagon {
            Some(per_wagon) => step.wagons = Some(items.checked_div(&per_wagon)?),
            None => debug!(step = %step.id, wagon = %wagon_id, "wagon does not fit item, skipping"),
        }
    }
    Ok(())
}

fn carries_no_items(step: &Step, data: &AdjustedDataset) -> bool {
    let (Some(recipe_id), Some(settings)) = (&step.recipe_id, &step.recipe_settings) else {
        return false;
    };
    let Some(machine_id) = &settings.machine_id else {
        return false;
    };
    match (data.machine(machine_id), data.recipe(recipe_id)) {
        (Some(machine), Some(recipe)) => {
            recipe.is_technology || (machine.silo && recipe.part.is_none())
        }
        _ => false,
    }
}

/// Estimate total beacons for a step and add their power draw.
///
/// A slot with a per-machine `count` and no `total` gets
/// `ceil(machines) * count / receivers`, never less than `count` itself.
/// The step's settings are replaced, never edited in place.
pub fn calculate_beacons(
    step: &mut Step,
    beacon_receivers: Option<&Rational>,
    data: &AdjustedDataset,
) -> Result<(), RationalError> {
    let Some(receivers) = beacon_receivers.filter(|r| r.nonzero()) else {
        return Ok(());
    };
    let Some(recipe_id) = &step.recipe_id else {
        return Ok(());
    };
    let Some(machines) = step.machines.as_ref().filter(|m| m.nonzero()) else {
        return Ok(());
    };
    if data.recipe(recipe_id).is_none_or(|recipe| recipe.part.is_some()) {
        return Ok(());
    }
    let Some(settings) = &step.recipe_settings else {
        return Ok(());
    };
    let Some(beacons) = &settings.beacons else {
        return Ok(());
    };

    let built = machines.ceil();
    let mut added_power = Rational::zero();
    let mut estimated = Vec::with_capacity(beacons.len());
    for slot in beacons {
        let mut slot = slot.clone();
        if let Some(beacon_id) = &slot.id {
            if let (Some(count), None) = (&slot.count, &slot.total) {
                let total = (&built * count).checked_div(receivers)?;
                slot.total = Some(std::cmp::max(total, count.clone()));
            }

            match data.beacon(beacon_id) {
                Some(beacon) => {
                    if let (EnergyType::Electric, Some(usage), Some(total)) =
                        (beacon.energy_type, &beacon.usage, &slot.total)
                    {
                        added_power = added_power + total * usage;
                    }
                }
                None => debug!(step = %step.id, beacon = %beacon_id, "beacon not in dataset, skipping"),
            }
        }
        estimated.push(slot);
    }

    let mut settings = settings.clone();
    settings.beacons = Some(estimated);
    step.recipe_settings = Some(settings);
    if added_power.nonzero() {
        step.power = Some(step.power.take().unwrap_or_default() + added_power);
    }
    Ok(())
}

/// Scale internal per-second quantities to the display rate.
///
/// `parents` amounts become fractions of `items` first, using the
/// unscaled total.
pub fn calculate_display_rate(
    step: &mut Step,
    display_rate: &DisplayRateInfo,
) -> Result<(), RationalError> {
    let scale = &display_rate.value;
    if let Some(items) = step.items.take() {
        if let Some(parents) = step.parents.as_mut() {
            for amount in parents.values_mut() {
                *amount = amount.checked_div(&items)?;
            }
        }
        step.items = Some(items * scale);
    }
    for quantity in [
        &mut step.surplus,
        &mut step.wagons,
        &mut step.pollution,
        &mut step.output,
    ] {
        if let Some(value) = quantity.take() {
            *quantity = Some(value * scale);
        }
    }
    Ok(())
}

/// Item overrides win, then the recipe objective, then the recipe.
pub fn calculate_checked(step: &mut Step, settings: &SettingsComplete) {
    if let Some(item_id) = &step.item_id {
        step.checked = settings.checked_item_ids.contains(item_id);
    } else if let Some(objective_id) = &step.recipe_objective_id {
        step.checked = settings.checked_objective_ids.contains(objective_id);
    } else if let Some(recipe_id) = &step.recipe_id {
        step.checked = settings.checked_recipe_ids.contains(recipe_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::*;
    use crate::settings::{BeaconSettings, DisplayRate, RecipeSettings};
    use crate::test_utils::*;

    fn beacon_settings(count: Option<Rational>, total: Option<Rational>) -> RecipeSettings {
        RecipeSettings {
            machine_id: Some(MachineId::from("assembling-machine")),
            beacons: Some(vec![BeaconSettings {
                id: Some(BeaconId::from("beacon")),
                count,
                total,
            }]),
        }
    }

    fn beacon_step(machines: Rational, settings: RecipeSettings) -> Step {
        Step {
            recipe_settings: Some(settings),
            ..Step::new("0").with_recipe("iron-gear-wheel", machines)
        }
    }

    fn first_total(step: &Step) -> Option<Rational> {
        step.recipe_settings.as_ref().unwrap().beacons.as_ref().unwrap()[0]
            .total
            .clone()
    }

    #[test]
    fn belts_from_items_and_speed() {
        let ctx = sample_context(DisplayRate::PerSecond);
        let mut step = Step::new("0").with_item("iron-plate", r(10));
        calculate_belts(&mut step, &ctx.item_settings, &ctx.belt_speeds, &ctx.data).unwrap();
        assert_eq!(step.belts, Some(rq(2, 3)));
        // 10 / (40 stacks * 100 per stack)
        assert_eq!(step.wagons, Some(rq(1, 400)));
    }

    #[test]
    fn fluids_use_fluid_wagons() {
        let ctx = sample_context(DisplayRate::PerSecond);
        let mut step = Step::new("0").with_item("water", r(1000));
        calculate_belts(&mut step, &ctx.item_settings, &ctx.belt_speeds, &ctx.data).unwrap();
        assert_eq!(step.belts, None);
        assert_eq!(step.wagons, Some(rq(1, 25)));
    }

    #[test]
    fn research_rows_carry_nothing() {
        let ctx = sample_context(DisplayRate::PerSecond);
        let mut step = Step {
            recipe_settings: Some(RecipeSettings {
                machine_id: Some(MachineId::from("lab")),
                beacons: None,
            }),
            belts: Some(r(9)),
            ..Step::new("0")
                .with_item("automation", r(1))
                .with_recipe("automation", r(1))
        };
        calculate_belts(&mut step, &ctx.item_settings, &ctx.belt_speeds, &ctx.data).unwrap();
        assert_eq!(step.belts, None);
        assert_eq!(step.wagons, None);
    }

    #[test]
    fn rocket_part_rows_in_silo_carry_nothing() {
        let ctx = sample_context(DisplayRate::PerSecond);
        let silo = RecipeSettings {
            machine_id: Some(MachineId::from("rocket-silo")),
            beacons: None,
        };
        let mut part = Step {
            recipe_settings: Some(silo.clone()),
            ..Step::new("0")
                .with_item("rocket-part", r(1))
                .with_recipe("rocket-part", r(1))
        };
        calculate_belts(&mut part, &ctx.item_settings, &ctx.belt_speeds, &ctx.data).unwrap();
        assert_eq!(part.belts, None);

        // The launch recipe's product leaves the silo and is transported.
        let mut launch = Step {
            recipe_settings: Some(silo),
            ..Step::new("1")
                .with_item("space-science-pack", r(10))
                .with_recipe("space-science-pack", r(1))
        };
        calculate_belts(&mut launch, &ctx.item_settings, &ctx.belt_speeds, &ctx.data).unwrap();
        assert_eq!(launch.belts, Some(rq(2, 3)));
    }

    #[test]
    fn beacon_total_estimated_from_receivers() {
        let ctx = sample_context(DisplayRate::PerSecond);
        let mut step = beacon_step(rq(7, 2), beacon_settings(Some(r(8)), None));
        calculate_beacons(&mut step, Some(&r(4)), &ctx.data).unwrap();
        // ceil(7/2) * 8 / 4
        assert_eq!(first_total(&step), Some(r(8)));
        assert_eq!(step.power, Some(r(8) * r(480)));
    }

    #[test]
    fn beacon_total_never_below_count() {
        let ctx = sample_context(DisplayRate::PerSecond);
        let mut step = beacon_step(r(1), beacon_settings(Some(r(8)), None));
        calculate_beacons(&mut step, Some(&r(12)), &ctx.data).unwrap();
        // 1 * 8 / 12 would be 2/3.
        assert_eq!(first_total(&step), Some(r(8)));
    }

    #[test]
    fn explicit_beacon_total_is_kept_and_powered() {
        let ctx = sample_context(DisplayRate::PerSecond);
        let mut step = beacon_step(r(3), beacon_settings(Some(r(8)), Some(r(5))));
        step.power = Some(r(100));
        calculate_beacons(&mut step, Some(&r(4)), &ctx.data).unwrap();
        assert_eq!(first_total(&step), Some(r(5)));
        assert_eq!(step.power, Some(r(100) + r(5) * r(480)));
    }

    #[test]
    fn beacons_skipped_without_receivers_or_machines() {
        let ctx = sample_context(DisplayRate::PerSecond);
        let mut no_receivers = beacon_step(r(2), beacon_settings(Some(r(8)), None));
        calculate_beacons(&mut no_receivers, None, &ctx.data).unwrap();
        assert_eq!(first_total(&no_receivers), None);

        let mut zero_receivers = beacon_step(r(2), beacon_settings(Some(r(8)), None));
        calculate_beacons(&mut zero_receivers, Some(&r(0)), &ctx.data).unwrap();
        assert_eq!(first_total(&zero_receivers), None);

        let mut idle = beacon_step(r(0), beacon_settings(Some(r(8)), None));
        calculate_beacons(&mut idle, Some(&r(4)), &ctx.data).unwrap();
        assert_eq!(first_total(&idle), None);
    }

    #[test]
    fn beacons_skipped_for_launch_recipes() {
        let ctx = sample_context(DisplayRate::PerSecond);
        let mut step = Step {
            recipe_settings: Some(beacon_settings(Some(r(8)), None)),
            ..Step::new("0").with_recipe("space-science-pack", r(1))
        };
        calculate_beacons(&mut step, Some(&r(4)), &ctx.data).unwrap();
        assert_eq!(first_total(&step), None);
        assert_eq!(step.power, None);
    }

    #[test]
    fn beacon_estimate_does_not_touch_source_settings() {
        let ctx = sample_context(DisplayRate::PerSecond);
        let original = beacon_settings(Some(r(8)), None);
        let mut step = beacon_step(r(4), original.clone());
        calculate_beacons(&mut step, Some(&r(2)), &ctx.data).unwrap();
        assert_eq!(first_total(&step), Some(r(16)));
        assert_eq!(original.beacons.unwrap()[0].total, None);
    }

    #[test]
    fn display_rate_renormalizes_parents_before_scaling() {
        let mut step = Step::new("0")
            .with_item("iron-plate", r(4))
            .with_parent("a", r(1))
            .with_parent("b", r(3));
        step.surplus = Some(r(2));
        step.wagons = Some(rq(1, 10));
        step.pollution = Some(r(1));
        step.output = Some(r(4));
        step.belts = Some(r(1));

        calculate_display_rate(&mut step, &DisplayRate::PerMinute.info()).unwrap();

        let parents = step.parents.as_ref().unwrap();
        assert_eq!(parents[&StepId::from("a")], rq(1, 4));
        assert_eq!(parents[&StepId::from("b")], rq(3, 4));
        assert_eq!(step.items, Some(r(240)));
        assert_eq!(step.surplus, Some(r(120)));
        assert_eq!(step.wagons, Some(r(6)));
        assert_eq!(step.pollution, Some(r(60)));
        assert_eq!(step.output, Some(r(240)));
        // Belts are a count, not a rate.
        assert_eq!(step.belts, Some(r(1)));
    }

    #[test]
    fn display_rate_with_zero_items_and_parents_fails() {
        let mut step = Step::new("0").with_item("x", r(0)).with_parent("a", r(1));
        assert_eq!(
            calculate_display_rate(&mut step, &DisplayRate::PerMinute.info()),
            Err(RationalError::DivisionByZero)
        );
    }

    #[test]
    fn checked_priority_item_then_objective_then_recipe() {
        let mut settings = SettingsComplete::default();
        settings.checked_item_ids.insert(ItemId::from("gear"));
        settings.checked_objective_ids.insert(ObjectiveId::from("obj"));
        settings.checked_recipe_ids.insert(RecipeId::from("gear"));

        // Item id present but not checked: the recipe entry is never consulted.
        let mut item_row = Step::new("0").with_item("plate", r(1)).with_recipe("gear", r(1));
        calculate_checked(&mut item_row, &settings);
        assert!(!item_row.checked);

        let mut objective_row = Step::new("1").with_recipe("other", r(1));
        objective_row.recipe_objective_id = Some(ObjectiveId::from("obj"));
        calculate_checked(&mut objective_row, &settings);
        assert!(objective_row.checked);

        let mut recipe_row = Step::new("2").with_recipe("gear", r(1));
        calculate_checked(&mut recipe_row, &settings);
        assert!(recipe_row.checked);
    }
}
