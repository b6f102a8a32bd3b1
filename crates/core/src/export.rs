//! Plain-text rendering of a list.

use crate::{
    models::{Gain, ListState, SelectedUnit, Weapon},
    rules::{display_name, group},
    unit::{all_equipment, calculate_unit_total, full_unit_list, grouped_display_units, item_rules},
};

/// Render the list the way it is shared as text.
pub fn list_as_text(list: &ListState) -> String {
    let mut lines = vec![format!("++ {} [{}pts] ++\n", list.name, list.points)];

    for group in grouped_display_units(full_unit_list(&list.units, true)) {
        let Some(first) = group.first() else {
            continue;
        };
        for hero in group.iter().flat_map(|full| full.heroes.iter()) {
            write_unit(&mut lines, hero, 1, calculate_unit_total(hero), false);
            lines.push("# Joined to:".to_string());
        }
        write_unit(&mut lines, &first.unit, group.len(), first.unit_points, true);
    }

    lines.join("\n")
}

fn write_unit(lines: &mut Vec<String>, unit: &SelectedUnit, count: usize, cost: i32, gap: bool) {
    let prefix = if count > 1 {
        format!("{count}x ")
    } else {
        String::new()
    };
    let xp = if unit.xp > 0 {
        format!(" | {}XP", unit.xp)
    } else {
        String::new()
    };
    lines.push(format!(
        "{prefix}{} [{}] Q{}+ D{}+ | {cost}pts{xp} | {}",
        unit.display_name(),
        unit.size,
        unit.definition.quality,
        unit.definition.defense,
        rules_text(unit)
    ));

    let weapons = weapons_text(unit);
    lines.push(if gap { format!("{weapons}\n") } else { weapons });
}

fn rules_text(unit: &SelectedUnit) -> String {
    let unit_rules: Vec<_> = unit
        .rules
        .iter()
        .filter(|rule| rule.name != "-")
        .cloned()
        .collect();

    let mut parts: Vec<String> = group(&unit_rules)
        .iter()
        .map(|grouped| display_name(&grouped.rule, Some(grouped.count)))
        .collect();
    parts.extend(item_rules(unit).into_iter().map(|item| {
        let count = item
            .count
            .map(|count| format!("{count}x "))
            .unwrap_or_default();
        let rules: Vec<String> = item
            .rules
            .iter()
            .map(|rule| display_name(rule, None))
            .collect();
        format!("{count}{}({})", item.name, rules.join(", "))
    }));
    parts.extend(unit.traits.iter().cloned());
    parts.join(", ")
}

/// `Name (24", A2, AP(1))`, or just the name for profiles with no stats.
pub fn weapon_label(weapon: &Weapon) -> String {
    let mut stats = Vec::new();
    if weapon.range > 0 {
        stats.push(format!("{}\"", weapon.range));
    }
    if weapon.attacks > 0 {
        stats.push(format!("A{}", weapon.attacks));
    }
    stats.extend(weapon.special_rules.iter().map(|rule| display_name(rule, None)));

    if stats.is_empty() {
        weapon.name.clone()
    } else {
        format!("{} ({})", weapon.name, stats.join(", "))
    }
}

fn weapons_text(unit: &SelectedUnit) -> String {
    let mut groups: Vec<(String, u32)> = Vec::new();
    for gain in all_equipment(unit) {
        let Gain::Weapon(weapon) = &gain else {
            continue;
        };
        let label = weapon_label(weapon);
        match groups.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, count)) => *count += gain.count(),
            None => groups.push((label, gain.count())),
        }
    }

    groups
        .into_iter()
        .map(|(label, count)| {
            if count > 1 {
                format!("{count}x {label}")
            } else {
                label
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        fixtures,
        models::{GameSystem, SpecialRule},
    };

    #[test]
    fn weapon_labels() {
        let bow = Weapon {
            id: None,
            name: "Bow".to_string(),
            label: None,
            count: Some(3),
            range: 24,
            attacks: 1,
            special_rules: vec![SpecialRule::rated("AP", 1)],
        };
        assert_eq!(weapon_label(&bow), "Bow (24\", A1, AP(1))");

        let plain = Weapon {
            range: 0,
            attacks: 0,
            special_rules: Vec::new(),
            ..bow
        };
        assert_eq!(weapon_label(&plain), "Bow");
    }

    #[test]
    fn renders_groups_heroes_and_weapons() -> anyhow::Result<()> {
        let catalogue = fixtures::catalogue();
        let unit = |id: &str| -> anyhow::Result<Arc<_>> {
            catalogue
                .unit(None, id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("missing {id}"))
        };
        let mut list = ListState::new("Vanguard", Some(GameSystem::Gf), 1000);
        let host = list.add_unit(unit("warriors")?);
        let hero = list.add_unit(unit("champion")?);
        list.add_unit(unit("militia")?);
        list.add_unit(unit("militia")?);
        list.join_unit(&hero, &host)?;
        let (section, axe) = fixtures::option(&catalogue, "axe");
        list.apply_upgrade(&host, &section, &axe)?;
        list.set_xp(&host, 2)?;

        let text = list_as_text(&list);
        let expected = [
            "++ Vanguard [175pts] ++\n",
            "Champion [1] Q4+ D4+ | 60pts | Hero, Tough(3)",
            "Sword (A1)",
            "# Joined to:",
            "Warriors [5] Q4+ D4+ | 105pts | 2XP | ",
            "4x Sword (A1), Axe (A2)\n",
            "2x Militia [5] Q4+ D4+ | 5pts | ",
            "5x Spear (A1)\n",
        ]
        .join("\n");
        assert_eq!(text, expected);
        Ok(())
    }
}
