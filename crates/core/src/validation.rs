//! Army composition checks. Every check runs; each violation adds one
//! message in a fixed order.

use std::collections::{HashMap, HashSet};

use crate::{
    catalogue::Catalogue,
    models::{GameSystem, ListState, SelectedUnit, SystemKind, SKIRMISH_POINTS_PER_MODEL},
    unit::{calculate_unit_total, full_unit_list},
};

/// Upgrades of which an aofs army may field only one in total.
pub const COMMAND_UPGRADES: [&str; 3] = ["Sergeant", "Musician", "Battle Standard"];

/// Share of the list a mixed army's primary faction must reach, in percent.
pub const PRIMARY_FACTION_PERCENT: f64 = 60.0;

const MAX_FACTIONS: usize = 2;
const SINGLE_UNIT_SHARE: f64 = 0.3333;

/// Human-readable composition violations for `list`.
pub fn get_errors(catalogue: &Catalogue, list: &ListState) -> Vec<String> {
    let mut errors = Vec::new();

    if list.points_limit > 0 && list.points > list.points_limit {
        errors.push(format!(
            "Points limit exceeded: {}/{}",
            list.points, list.points_limit
        ));
    }

    let system = list.game_system.or(catalogue.game_system());
    let points = if list.points_limit != 0 {
        list.points_limit
    } else {
        list.points
    };
    let units = &list.units;

    if let Some(thresholds) = system.and_then(GameSystem::thresholds) {
        let hero_count = units.iter().filter(|unit| unit.is_hero()).count() as i32;
        if hero_count > points / thresholds.hero_points {
            errors.push(format!("Max 1 hero per full {}pts.", thresholds.hero_points));
        }

        let unit_count = units.iter().filter(|unit| unit.join_to_unit.is_none()).count() as i32;
        if unit_count > points / thresholds.unit_points {
            let combined_note = match system.map(GameSystem::kind) {
                Some(SystemKind::Battle) => " (combined units count as just 1 unit)",
                _ => "",
            };
            errors.push(format!(
                "Max 1 unit per full {}pts{combined_note}.",
                thresholds.unit_points
            ));
        }

        let limit = 1 + points / thresholds.duplicate_points;
        let over = over_duplicate_limit(units, limit);
        if !over.is_empty() {
            errors.push(format!(
                "Cannot have more than {limit} copies of a particular unit ({}).",
                over.join(", ")
            ));
        }
    }

    let max_single_unit = f64::from(points) * SINGLE_UNIT_SHARE;
    if full_unit_list(units, false)
        .iter()
        .any(|full| f64::from(full.unit_points_all) > max_single_unit)
    {
        errors.push("May not bring any single unit worth more than 33% of total points.".to_string());
    }

    match system.map(GameSystem::kind) {
        Some(SystemKind::Battle) => battle_errors(units, &mut errors),
        Some(SystemKind::Skirmish) => {
            let model_count: u32 = units.iter().map(|unit| unit.size).sum();
            let model_limit = points / SKIRMISH_POINTS_PER_MODEL;
            if i64::from(model_count) > i64::from(model_limit) {
                errors.push(format!(
                    "Max 1 model per full {SKIRMISH_POINTS_PER_MODEL}pts. Maximum valid number of models is {model_limit}, current total is {model_count}."
                ));
            }
        }
        _ => {}
    }

    if system == Some(GameSystem::Aofs) {
        let taken: usize = COMMAND_UPGRADES
            .iter()
            .map(|label| {
                units
                    .iter()
                    .filter(|unit| unit.has_command_upgrade(label))
                    .count()
            })
            .sum();
        if taken > 1 {
            errors.push(
                "Max 1 of the following upgrades per army (not one of each!): Sergeant, Musician or Battle Standard."
                    .to_string(),
            );
        }
    }

    let book_count = catalogue.books().len();
    if book_count > MAX_FACTIONS {
        errors.push("Players may bring units from up to two factions in the same list.".to_string());
    }

    if list.points > 0 && book_count > 1 && !has_primary_faction(units, points) {
        errors.push(
            "Mixed armies must consist of at least 60% worth of units from their primary faction."
                .to_string(),
        );
    }

    errors
}

/// Names of units fielded more than `limit` times, combined partners aside.
fn over_duplicate_limit(units: &[SelectedUnit], limit: i32) -> Vec<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, (i32, &str)> = HashMap::new();
    for unit in units
        .iter()
        .filter(|unit| !(unit.combined && unit.join_to_unit.is_some()))
    {
        let entry = counts.entry(unit.id()).or_insert_with(|| {
            order.push(unit.id());
            (0, unit.definition.name.as_str())
        });
        entry.0 += 1;
    }
    order
        .into_iter()
        .filter_map(|id| counts.get(id))
        .filter(|(count, _)| *count > limit)
        .map(|(_, name)| name.to_string())
        .collect()
}

fn battle_errors(units: &[SelectedUnit], errors: &mut Vec<String>) {
    let by_id: HashMap<&str, &SelectedUnit> = units
        .iter()
        .map(|unit| (unit.selection_id.as_str(), unit))
        .collect();
    let joined_heroes: Vec<(&SelectedUnit, &SelectedUnit)> = units
        .iter()
        .filter(|unit| unit.is_hero())
        .filter_map(|hero| {
            let host = by_id.get(hero.join_to_unit.as_deref()?)?;
            Some((hero, *host))
        })
        .collect();

    if units.iter().any(|unit| unit.combined && unit.size == 1) {
        errors.push("Cannot combine units of unit size [1].".to_string());
    }

    if joined_heroes.iter().any(|(_, host)| host.size == 1) {
        errors.push("Heroes cannot join units that only contain a single model.".to_string());
    }

    let mut hosts = HashSet::new();
    if !joined_heroes
        .iter()
        .all(|(_, host)| hosts.insert(host.selection_id.as_str()))
    {
        errors.push("A unit can only have a maximum of one Hero attached.".to_string());
    }

    if joined_heroes
        .iter()
        .any(|(hero, host)| hero.army_id != host.army_id)
    {
        errors.push("Heroes only join units from their own faction.".to_string());
    }
}

fn has_primary_faction(units: &[SelectedUnit], points: i32) -> bool {
    if points <= 0 {
        return false;
    }
    let mut by_army: HashMap<&str, i32> = HashMap::new();
    for unit in units {
        *by_army.entry(unit.army_id.as_str()).or_default() += calculate_unit_total(unit);
    }
    by_army
        .values()
        .any(|total| f64::from(*total) / f64::from(points) * 100.0 >= PRIMARY_FACTION_PERCENT)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        catalogue::Catalogue,
        fixtures,
        models::{Affects, Select, UnitDefinition, UpgradeType},
    };

    fn definition(catalogue: &Catalogue, id: &str) -> Arc<UnitDefinition> {
        catalogue.unit(None, id).cloned().expect("fixture unit")
    }

    fn list_with(catalogue: &Catalogue, system: GameSystem, limit: i32, ids: &[&str]) -> ListState {
        let mut list = ListState::new("Test", Some(system), limit);
        for id in ids {
            list.add_unit(definition(catalogue, id));
        }
        list
    }

    #[test]
    fn clean_list_has_no_errors() {
        let catalogue = fixtures::catalogue();
        let list = list_with(&catalogue, GameSystem::Gf, 1000, &["warriors", "archers", "giant"]);
        assert_eq!(get_errors(&catalogue, &list), Vec::<String>::new());
    }

    #[test]
    fn points_limit_is_reported_first() {
        let catalogue = fixtures::catalogue();
        let list = list_with(&catalogue, GameSystem::Gf, 250, &["giant", "warriors"]);
        let errors = get_errors(&catalogue, &list);
        assert_eq!(errors[0], "Points limit exceeded: 300/250");
    }

    #[test]
    fn duplicate_cap_scales_with_list_size() {
        let catalogue = fixtures::catalogue();
        let mut list = list_with(&catalogue, GameSystem::Gf, 2000, &["warriors"; 3]);
        let duplicate = "Cannot have more than 3 copies of a particular unit (Warriors).";
        assert!(!get_errors(&catalogue, &list).iter().any(|e| e == duplicate));

        list.add_unit(definition(&catalogue, "warriors"));
        assert!(get_errors(&catalogue, &list).iter().any(|e| e == duplicate));
    }

    #[test]
    fn combined_partners_are_not_duplicates() -> anyhow::Result<()> {
        let catalogue = fixtures::catalogue();
        let mut list = list_with(&catalogue, GameSystem::Gf, 1000, &["militia", "militia"]);
        let first = list.units[0].selection_id.clone();
        list.combine_unit(&first)?;
        let errors = get_errors(&catalogue, &list);
        assert!(!errors.iter().any(|e| e.starts_with("Cannot have more than")));
        Ok(())
    }

    #[test]
    fn hero_unit_and_share_limits() {
        let catalogue = fixtures::catalogue();
        let list = list_with(&catalogue, GameSystem::Gf, 400, &["champion", "champion", "giant"]);
        let errors = get_errors(&catalogue, &list);
        assert!(errors.contains(&"Max 1 hero per full 500pts.".to_string()));
        assert!(errors.contains(
            &"Max 1 unit per full 200pts (combined units count as just 1 unit).".to_string()
        ));
        assert!(errors
            .contains(&"May not bring any single unit worth more than 33% of total points.".to_string()));
    }

    #[test]
    fn battle_join_restrictions() -> anyhow::Result<()> {
        let catalogue = fixtures::mixed_catalogue();
        let mut list = list_with(&catalogue, GameSystem::Gf, 3000, &["giant", "champion", "thane"]);
        let giant = list.units[0].selection_id.clone();
        let champion = list.units[1].selection_id.clone();
        let thane = list.units[2].selection_id.clone();
        list.join_unit(&champion, &giant)?;
        list.join_unit(&thane, &giant)?;
        list.combine_unit(&giant)?;

        let errors = get_errors(&catalogue, &list);
        for expected in [
            "Cannot combine units of unit size [1].",
            "Heroes cannot join units that only contain a single model.",
            "A unit can only have a maximum of one Hero attached.",
            "Heroes only join units from their own faction.",
        ] {
            assert!(errors.iter().any(|e| e == expected), "missing {expected}");
        }
        Ok(())
    }

    #[test]
    fn skirmish_model_cap() {
        let catalogue = fixtures::catalogue();
        let list = list_with(&catalogue, GameSystem::Gff, 150, &["militia", "militia"]);
        let errors = get_errors(&catalogue, &list);
        assert!(errors.contains(
            &"Max 1 model per full 20pts. Maximum valid number of models is 7, current total is 10."
                .to_string()
        ));
        assert!(!errors.iter().any(|e| e.starts_with("Max 1 unit per full")));
    }

    #[test]
    fn aofs_command_upgrades_are_capped() -> anyhow::Result<()> {
        let catalogue = fixtures::catalogue();
        let mut list = list_with(&catalogue, GameSystem::Aofs, 300, &["warriors"]);
        let id = list.units[0].selection_id.clone();
        let (section, sergeant) = fixtures::option(&catalogue, "sergeant");
        let (_, musician) = fixtures::option(&catalogue, "musician");
        list.apply_upgrade(&id, &section, &sergeant)?;
        let message =
            "Max 1 of the following upgrades per army (not one of each!): Sergeant, Musician or Battle Standard.";
        assert!(!get_errors(&catalogue, &list).iter().any(|e| e == message));

        list.apply_upgrade(&id, &section, &musician)?;
        assert!(get_errors(&catalogue, &list).iter().any(|e| e == message));
        Ok(())
    }

    #[test]
    fn only_command_group_options_count_towards_the_cap() -> anyhow::Result<()> {
        let catalogue = fixtures::catalogue();
        let mut list = list_with(&catalogue, GameSystem::Aofs, 300, &["warriors", "warriors"]);
        let first = list.units[0].selection_id.clone();
        let second = list.units[1].selection_id.clone();
        let (section, sergeant) = fixtures::option(&catalogue, "sergeant");
        assert!(section.is_command_group);
        list.apply_upgrade(&first, &section, &sergeant)?;

        let veterans = Arc::new(fixtures::section(
            "veterans",
            UpgradeType::UpgradeRule,
            Affects::One,
            Select::One,
            &[],
            vec![fixtures::upgrade_option(
                "veteran-sergeant",
                "Sergeant",
                5,
                vec![fixtures::rule("Veteran", None)],
            )],
        ));
        let veteran = veterans.options[0].clone();
        list.apply_upgrade(&second, &veterans, &veteran)?;

        let message =
            "Max 1 of the following upgrades per army (not one of each!): Sergeant, Musician or Battle Standard.";
        assert!(!get_errors(&catalogue, &list).iter().any(|e| e == message));
        Ok(())
    }

    #[test]
    fn mixed_armies_need_a_primary_faction() {
        let catalogue = fixtures::mixed_catalogue();
        let list = list_with(&catalogue, GameSystem::Gf, 0, &["warriors", "rangers"]);
        let message = "Mixed armies must consist of at least 60% worth of units from their primary faction.";
        assert!(get_errors(&catalogue, &list).iter().any(|e| e == message));

        let list = list_with(&catalogue, GameSystem::Gf, 0, &["warriors", "warriors", "rangers"]);
        assert!(!get_errors(&catalogue, &list).iter().any(|e| e == message));
    }

    #[test]
    fn systems_without_thresholds_get_generic_checks() {
        let catalogue = fixtures::catalogue();
        let list = list_with(&catalogue, GameSystem::Gf2, 100, &["champion", "giant"]);
        let errors = get_errors(&catalogue, &list);
        assert_eq!(
            errors,
            vec![
                "Points limit exceeded: 260/100".to_string(),
                "May not bring any single unit worth more than 33% of total points.".to_string(),
            ]
        );
    }
}
