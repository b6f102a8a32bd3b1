//! Unit assembly: derives loadout, rules, size and cost from a unit's
//! selections, and assembles joined/combined units into full units.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tracing::warn;

use crate::{
    models::{
        new_id, split_count, Affects, Gain, SelectedUnit, SelectedUpgrade, SpecialRule,
        UnitDefinition, UpgradePackage, UpgradeSection, UpgradeType,
    },
    rules,
};

/// Fresh unit instance with no upgrades applied.
pub fn create_unit_from_definition(definition: Arc<UnitDefinition>) -> SelectedUnit {
    let mut unit = SelectedUnit {
        selection_id: new_id(),
        army_id: definition.army_id.clone(),
        definition,
        custom_name: None,
        selected_upgrades: Vec::new(),
        loadout: Vec::new(),
        rules: Vec::new(),
        size: 0,
        combined: false,
        join_to_unit: None,
        xp: 0,
        traits: Vec::new(),
        notes: None,
    };
    derive(&mut unit);
    unit
}

/// State produced by folding a unit's selections over its definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    /// Weapons and items carried after every upgrade.
    pub loadout: Vec<Gain>,
    /// Base rules plus rules granted by upgrades.
    pub rules: Vec<SpecialRule>,
    /// Model count.
    pub size: u32,
    /// Point cost.
    pub cost: i32,
}

/// Fold `upgrades` over the definition's base profile, lowest section
/// priority first and in selection order within a priority.
pub fn derive_from(definition: &UnitDefinition, upgrades: &[SelectedUpgrade]) -> Derived {
    let mut derived = Derived {
        loadout: base_equipment(definition),
        rules: definition.special_rules.clone(),
        size: definition.size,
        cost: definition.cost,
    };
    let mut ordered: Vec<&SelectedUpgrade> = upgrades.iter().collect();
    ordered.sort_by_key(|upgrade| upgrade.section.priority);
    for upgrade in ordered {
        derived.apply(upgrade);
    }
    derived
}

/// Rebuild the unit's derived loadout, rules and size from its selections.
pub fn derive(unit: &mut SelectedUnit) {
    let derived = derive_from(&unit.definition, &unit.selected_upgrades);
    unit.loadout = derived.loadout;
    unit.rules = derived.rules;
    unit.size = derived.size;
}

fn base_equipment(definition: &UnitDefinition) -> Vec<Gain> {
    definition
        .equipment
        .iter()
        .map(|gain| {
            let mut gain = gain.clone();
            if !gain.has_count() {
                gain.set_count(definition.size);
            }
            gain
        })
        .collect()
}

impl Derived {
    fn apply(&mut self, upgrade: &SelectedUpgrade) {
        let section = &upgrade.section;
        let option = &upgrade.option;
        let models = match section.affects {
            Affects::All => self.size,
            Affects::One | Affects::Any => 1,
        };
        self.cost += option.cost * models as i32;

        match section.kind {
            UpgradeType::Replace => {
                let multiplier = self.replace(section);
                if multiplier == 0 {
                    return;
                }
                self.add_gains(&option.gains, multiplier);
            }
            UpgradeType::Upgrade => self.add_gains(&option.gains, models),
            UpgradeType::UpgradeRule => self.upgrade_rules(section, &option.gains),
        }

        if option.is_model || option.gains.iter().any(Gain::is_model) {
            self.size += 1;
        }
    }

    /// Remove the section's targets and return how many sets were replaced.
    /// Zero means nothing was found and the option grants nothing.
    fn replace(&mut self, section: &UpgradeSection) -> u32 {
        let targets = section.targets();
        if targets.is_empty() {
            return 1;
        }

        let sets = match section.affects {
            Affects::All => targets
                .iter()
                .map(|target| {
                    let (need, name) = split_count(target);
                    carried(&self.loadout, name) / need
                })
                .min()
                .unwrap_or(0),
            Affects::One | Affects::Any => 1,
        };
        if sets == 0 {
            warn!(
                "section {} found nothing to replace among {:?}",
                section.uid, targets
            );
            return 0;
        }

        let mut replaced_any = false;
        for target in targets {
            let (need, name) = split_count(target);
            let wanted = need * sets;
            let taken = take(&mut self.loadout, name, wanted);
            let dropped = taken < wanted && self.drop_rule(name);
            replaced_any |= taken > 0 || dropped;
            if taken < wanted && !dropped {
                warn!(
                    "section {} could only replace {taken}/{wanted} of '{name}'",
                    section.uid
                );
            }
        }
        if replaced_any {
            sets
        } else {
            0
        }
    }

    fn add_gains(&mut self, gains: &[Gain], multiplier: u32) {
        for gain in gains {
            match gain.as_rule() {
                Some(rule) => self.rules.push(rule.clone()),
                None => self.loadout.push(gain.scaled(multiplier)),
            }
        }
    }

    fn upgrade_rules(&mut self, section: &UpgradeSection, gains: &[Gain]) {
        for target in section.targets() {
            let (_, name) = split_count(target);
            if !self.drop_rule(name) {
                warn!("section {} found no rule '{name}' to replace", section.uid);
            }
        }

        for gain in gains {
            let Some(rule) = gain.as_rule() else {
                self.loadout.push(gain.clone());
                continue;
            };
            match self.rules.iter_mut().find(|existing| existing.name == rule.name) {
                Some(existing) => rules::merge_rating(existing, rule),
                None => self.rules.push(rule.clone()),
            }
        }
    }

    fn drop_rule(&mut self, name: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|rule| !rule.name.eq_ignore_ascii_case(name));
        self.rules.len() < before
    }
}

/// Number of models carrying a profile matching `name`.
pub(crate) fn carried(loadout: &[Gain], name: &str) -> u32 {
    loadout
        .iter()
        .filter(|gain| gain.as_rule().is_none() && gain.matches(name))
        .map(Gain::count)
        .sum()
}

fn take(loadout: &mut Vec<Gain>, name: &str, wanted: u32) -> u32 {
    let mut taken = 0;
    for gain in loadout
        .iter_mut()
        .filter(|gain| gain.as_rule().is_none() && gain.matches(name))
    {
        if taken == wanted {
            break;
        }
        let removed = gain.count().min(wanted - taken);
        gain.set_count(gain.count() - removed);
        taken += removed;
    }
    loadout.retain(|gain| gain.count() > 0);
    taken
}

/// Point cost of one unit, excluding anything attached to it.
///
/// Options from `affects: all` sections are charged once per model the unit
/// had when the option was taken.
pub fn calculate_unit_total(unit: &SelectedUnit) -> i32 {
    derive_from(&unit.definition, &unit.selected_upgrades).cost
}

/// Sum of every unit's own cost, joined units included.
pub fn calculate_list_total(units: &[SelectedUnit]) -> i32 {
    units.iter().map(calculate_unit_total).sum()
}

/// Loadout with item content folded in, scaled by the item's count.
pub fn all_equipment(unit: &SelectedUnit) -> Vec<Gain> {
    let mut gains = unit.loadout.clone();
    for gain in &unit.loadout {
        if let Gain::Item(item) = gain {
            flatten_content(&item.content, gain.count(), &mut gains);
        }
    }
    gains
}

fn flatten_content(content: &[Gain], multiplier: u32, out: &mut Vec<Gain>) {
    for gain in content {
        out.push(gain.scaled(multiplier));
        if let Gain::Item(item) = gain {
            flatten_content(&item.content, gain.count() * multiplier, out);
        }
    }
}

/// Every effective rule: derived unit rules plus rules carried by items
/// that do not count as models.
pub fn all_rules(unit: &SelectedUnit) -> Vec<SpecialRule> {
    let mut result = unit.rules.clone();
    for gain in &unit.loadout {
        if let Gain::Item(item) = gain {
            if !item.is_model {
                collect_item_rules(&item.content, &mut result);
            }
        }
    }
    result
}

fn collect_item_rules(content: &[Gain], out: &mut Vec<SpecialRule>) {
    for gain in content {
        match gain {
            Gain::Rule(rule) | Gain::Defense(rule) => out.push(rule.clone()),
            Gain::Item(item) => collect_item_rules(&item.content, out),
            Gain::Weapon(_) => {}
        }
    }
}

/// Rules carried by one named item, for grouped display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRules {
    /// `None` when the item covers the whole unit.
    pub count: Option<u32>,
    /// Item name.
    pub name: String,
    /// Rules the item grants.
    pub rules: Vec<SpecialRule>,
}

/// Group the unit's items by name with the rules each grants.
pub fn item_rules(unit: &SelectedUnit) -> Vec<ItemRules> {
    let mut result: Vec<ItemRules> = Vec::new();
    for gain in &unit.loadout {
        let Gain::Item(item) = gain else {
            continue;
        };
        if let Some(existing) = result.iter_mut().find(|entry| entry.name == item.name) {
            existing.count = existing.count.map(|count| count + gain.count());
            continue;
        }

        let affects_all = unit.selected_upgrades.iter().any(|upgrade| {
            upgrade.section.affects == Affects::All
                && upgrade
                    .option
                    .gains
                    .iter()
                    .any(|granted| granted.name() == item.name)
        });
        let rules = item
            .content
            .iter()
            .filter_map(Gain::as_rule)
            .cloned()
            .collect();
        result.push(ItemRules {
            count: (!affects_all).then(|| gain.count()),
            name: item.name.clone(),
            rules,
        });
    }
    result
}

/// Summed Tough rating, or 1 for units without Tough.
pub fn tough(unit: &SelectedUnit) -> i32 {
    let total: i32 = all_rules(unit)
        .iter()
        .filter(|rule| rule.name == "Tough")
        .filter_map(|rule| rule.rating)
        .sum();
    if total > 0 {
        total
    } else {
        1
    }
}

/// Display entity merging a combined partner into its root unit.
pub fn merge_combined_unit(unit: &SelectedUnit, partner: Option<&SelectedUnit>) -> SelectedUnit {
    let mut merged = unit.clone();
    if let Some(partner) = partner {
        merged.size += partner.size;
        merged.loadout.extend(partner.loadout.iter().cloned());
        merged
            .selected_upgrades
            .extend(partner.selected_upgrades.iter().cloned());
    }
    merged
}

/// A root unit with its combined partner and joined heroes.
#[derive(Debug, Clone, PartialEq)]
pub struct FullUnit {
    /// Root unit, merged with its partner when combining was requested.
    pub unit: SelectedUnit,
    /// Combined partner, if any.
    pub joined: Option<SelectedUnit>,
    /// Heroes attached to the root.
    pub heroes: Vec<SelectedUnit>,
    /// Root plus partner model count.
    pub unit_size: u32,
    /// Root cost alone.
    pub points_self: i32,
    /// Root plus partner cost.
    pub unit_points: i32,
    /// Root plus every attachment.
    pub unit_points_all: i32,
    /// Anything at all is attached to the root.
    pub has_joined: bool,
}

/// Assemble root units with their attachments, ordered by army book and
/// then by position within the book.
pub fn full_unit_list(units: &[SelectedUnit], combine: bool) -> Vec<FullUnit> {
    let mut result: Vec<FullUnit> = units
        .iter()
        .filter(|unit| unit.join_to_unit.is_none())
        .map(|unit| {
            let attached: Vec<&SelectedUnit> = units
                .iter()
                .filter(|other| other.join_to_unit.as_deref() == Some(unit.selection_id.as_str()))
                .collect();
            let (heroes, partners): (Vec<&SelectedUnit>, Vec<&SelectedUnit>) =
                attached.iter().copied().partition(|other| other.is_hero());
            let partner = partners.first().copied();

            let points_self = calculate_unit_total(unit);
            let partner_points = partner.map(calculate_unit_total).unwrap_or(0);
            let attached_points: i32 = attached
                .iter()
                .map(|other| calculate_unit_total(other))
                .sum();

            FullUnit {
                unit: if combine {
                    merge_combined_unit(unit, partner)
                } else {
                    unit.clone()
                },
                joined: partner.cloned(),
                heroes: heroes.into_iter().cloned().collect(),
                unit_size: unit.size + partner.map(|p| p.size).unwrap_or(0),
                points_self,
                unit_points: points_self + partner_points,
                unit_points_all: points_self + attached_points,
                has_joined: !attached.is_empty(),
            }
        })
        .collect();

    result.sort_by_key(|full| (full.unit.definition.book_index, full.unit.definition.sort_id));
    result
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DisplayKey {
    tie_breaker: Option<String>,
    id: String,
    army_id: String,
    custom_name: Option<String>,
    join_to_unit: Option<String>,
    upgrades: Vec<(String, String)>,
    loadout: Vec<(String, u32)>,
    traits: Vec<String>,
    xp: u32,
}

impl DisplayKey {
    fn of(full: &FullUnit) -> Self {
        let unit = &full.unit;
        let mut upgrades: Vec<(String, String)> = unit
            .selected_upgrades
            .iter()
            .map(|upgrade| (upgrade.section.uid.clone(), upgrade.option.id.clone()))
            .collect();
        upgrades.sort();
        let mut loadout: Vec<(String, u32)> = unit
            .loadout
            .iter()
            .map(|gain| (gain.label().to_string(), gain.count()))
            .collect();
        loadout.sort();

        Self {
            // Units with attachments are never merged with each other.
            tie_breaker: full.has_joined.then(|| unit.selection_id.clone()),
            id: unit.definition.id.clone(),
            army_id: unit.army_id.clone(),
            custom_name: unit.custom_name.clone(),
            join_to_unit: unit.join_to_unit.clone(),
            upgrades,
            loadout,
            traits: unit.traits.clone(),
            xp: unit.xp,
        }
    }
}

/// Collapse visually identical full units into display groups, keeping the
/// order in which each group first appears.
pub fn grouped_display_units(full_units: Vec<FullUnit>) -> Vec<Vec<FullUnit>> {
    let mut groups: Vec<Vec<FullUnit>> = Vec::new();
    let mut index: HashMap<DisplayKey, usize> = HashMap::new();
    for full in full_units {
        let key = DisplayKey::of(&full);
        match index.get(&key) {
            Some(position) => groups[*position].push(full),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![full]);
            }
        }
    }
    groups
}

/// Sections whose replace targets the unit can never have.
///
/// A section with `replaceWhat` stays enabled when at least one target is in
/// the base equipment or is granted anywhere in the unit's packages.
pub fn disabled_upgrade_sections(
    definition: &UnitDefinition,
    packages: &[UpgradePackage],
) -> Vec<String> {
    let eligible: HashSet<&str> = definition.upgrades.iter().map(String::as_str).collect();
    let sections: Vec<&UpgradeSection> = packages
        .iter()
        .filter(|package| eligible.contains(package.uid.as_str()))
        .flat_map(|package| package.sections.iter())
        .collect();

    let mut reachable: Vec<&Gain> = Vec::new();
    for gain in sections
        .iter()
        .flat_map(|section| section.options.iter())
        .flat_map(|option| option.gains.iter())
    {
        collect_reachable(gain, &mut reachable);
    }

    sections
        .iter()
        .filter(|section| !section.targets().is_empty())
        .filter(|section| {
            !section.targets().iter().any(|target| {
                definition.equipment.iter().any(|gain| gain.matches(target))
                    || reachable.iter().any(|gain| gain.matches(target))
            })
        })
        .map(|section| section.uid.clone())
        .collect()
}

fn collect_reachable<'a>(gain: &'a Gain, out: &mut Vec<&'a Gain>) {
    out.push(gain);
    if let Gain::Item(item) = gain {
        for nested in &item.content {
            collect_reachable(nested, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixtures, models::Select, upgrade};

    #[test]
    fn base_equipment_counts_default_to_size() {
        let catalogue = fixtures::catalogue();
        let unit = fixtures::selected(&catalogue, "warriors");
        assert_eq!(unit.size, 5);
        assert_eq!(unit.loadout.len(), 1);
        assert_eq!(unit.loadout[0].name(), "Sword");
        assert_eq!(unit.loadout[0].count(), 5);
        assert_eq!(calculate_unit_total(&unit), 100);
    }

    #[test]
    fn derivation_is_deterministic() -> anyhow::Result<()> {
        let catalogue = fixtures::catalogue();
        let mut unit = fixtures::selected(&catalogue, "warriors");
        let (section, axe) = fixtures::option(&catalogue, "axe");
        upgrade::apply(&mut unit, &section, &axe)?;
        upgrade::apply(&mut unit, &section, &axe)?;

        let first = derive_from(&unit.definition, &unit.selected_upgrades);
        let second = derive_from(&unit.definition, &unit.selected_upgrades);
        assert_eq!(first, second);
        assert_eq!(calculate_unit_total(&unit), calculate_unit_total(&unit));
        Ok(())
    }

    #[test]
    fn replace_swaps_and_restores_profiles() -> anyhow::Result<()> {
        let catalogue = fixtures::catalogue();
        let mut unit = fixtures::selected(&catalogue, "champion");
        let (section, axe) = fixtures::option(&catalogue, "axe");

        upgrade::apply(&mut unit, &section, &axe)?;
        let names: Vec<&str> = unit.loadout.iter().map(Gain::name).collect();
        assert_eq!(names, vec!["Axe"]);

        assert!(upgrade::remove(&mut unit, &section, &axe).is_some());
        let names: Vec<&str> = unit.loadout.iter().map(Gain::name).collect();
        assert_eq!(names, vec!["Sword"]);
        Ok(())
    }

    #[test]
    fn replace_any_takes_one_model_at_a_time() -> anyhow::Result<()> {
        let catalogue = fixtures::catalogue();
        let mut unit = fixtures::selected(&catalogue, "warriors");
        let (section, axe) = fixtures::option(&catalogue, "axe");
        upgrade::apply(&mut unit, &section, &axe)?;
        upgrade::apply(&mut unit, &section, &axe)?;

        assert_eq!(carried(&unit.loadout, "Sword"), 3);
        assert_eq!(carried(&unit.loadout, "Axe"), 2);
        assert_eq!(calculate_unit_total(&unit), 100 + 2 * 5);
        Ok(())
    }

    #[test]
    fn affects_all_is_charged_per_model() -> anyhow::Result<()> {
        let catalogue = fixtures::catalogue();
        let mut unit = fixtures::selected(&catalogue, "warriors");
        let (section, shields) = fixtures::option(&catalogue, "shields");
        upgrade::apply(&mut unit, &section, &shields)?;

        assert_eq!(calculate_unit_total(&unit), 100 + 5 * 2);
        let shield = unit
            .loadout
            .iter()
            .find(|gain| gain.name() == "Shield")
            .expect("shield in loadout");
        assert_eq!(shield.count(), 5);

        let rules: Vec<String> = all_rules(&unit).into_iter().map(|rule| rule.name).collect();
        assert!(rules.contains(&"Defense".to_string()));
        let items = item_rules(&unit);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].count, None);
        Ok(())
    }

    #[test]
    fn stacking_and_non_stacking_rule_upgrades() -> anyhow::Result<()> {
        let catalogue = fixtures::catalogue();

        let mut champion = fixtures::selected(&catalogue, "champion");
        let (section, tough) = fixtures::option(&catalogue, "tough-up");
        upgrade::apply(&mut champion, &section, &tough)?;
        assert_eq!(super::tough(&champion), 6);

        let mut giant = fixtures::selected(&catalogue, "giant");
        let (section, fear) = fixtures::option(&catalogue, "fear-3");
        upgrade::apply(&mut giant, &section, &fear)?;
        let fear = giant
            .rules
            .iter()
            .find(|rule| rule.name == "Fear")
            .and_then(|rule| rule.rating);
        assert_eq!(fear, Some(3));
        Ok(())
    }

    #[test]
    fn model_options_grow_the_unit() -> anyhow::Result<()> {
        let catalogue = fixtures::catalogue();
        let mut unit = fixtures::selected(&catalogue, "champion");
        let (section, mount) = fixtures::option(&catalogue, "mount");
        upgrade::apply(&mut unit, &section, &mount)?;
        assert_eq!(unit.size, 2);
        assert_eq!(calculate_unit_total(&unit), 60 + 20);
        Ok(())
    }

    #[test]
    fn combined_units_add_size_and_cost() {
        let catalogue = fixtures::catalogue();
        let mut root = fixtures::selected(&catalogue, "militia");
        let mut partner = fixtures::selected(&catalogue, "militia");
        root.combined = true;
        partner.combined = true;
        partner.join_to_unit = Some(root.selection_id.clone());

        let full = full_unit_list(&[root, partner], true);
        assert_eq!(full.len(), 1);
        assert_eq!(full[0].unit_size, 10);
        assert_eq!(full[0].unit_points, 10);
        assert_eq!(full[0].unit.size, 10);
        assert_eq!(carried(&full[0].unit.loadout, "Spear"), 10);
    }

    #[test]
    fn heroes_are_priced_separately() {
        let catalogue = fixtures::catalogue();
        let host = fixtures::selected(&catalogue, "warriors");
        let mut hero = fixtures::selected(&catalogue, "champion");
        hero.join_to_unit = Some(host.selection_id.clone());

        let units = vec![host, hero];
        let full = full_unit_list(&units, false);
        assert_eq!(full.len(), 1);
        assert_eq!(full[0].heroes.len(), 1);
        assert!(full[0].joined.is_none());
        assert_eq!(full[0].points_self, 100);
        assert_eq!(full[0].unit_points, 100);
        assert_eq!(full[0].unit_points_all, 160);
        assert_eq!(calculate_list_total(&units), 160);
    }

    #[test]
    fn full_units_follow_catalogue_order() {
        let catalogue = fixtures::catalogue();
        let units = vec![
            fixtures::selected(&catalogue, "giant"),
            fixtures::selected(&catalogue, "warriors"),
        ];
        let full = full_unit_list(&units, false);
        assert_eq!(full[0].unit.id(), "warriors");
        assert_eq!(full[1].unit.id(), "giant");
    }

    #[test]
    fn identical_units_share_a_display_group() {
        let catalogue = fixtures::catalogue();
        let host = fixtures::selected(&catalogue, "warriors");
        let mut hero = fixtures::selected(&catalogue, "champion");
        hero.join_to_unit = Some(host.selection_id.clone());
        let other_host = fixtures::selected(&catalogue, "warriors");
        let mut other_hero = fixtures::selected(&catalogue, "champion");
        other_hero.join_to_unit = Some(other_host.selection_id.clone());

        let units = vec![
            fixtures::selected(&catalogue, "militia"),
            fixtures::selected(&catalogue, "militia"),
            host,
            hero,
            other_host,
            other_hero,
        ];
        let groups = grouped_display_units(full_unit_list(&units, true));
        let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![1, 1, 2]);
        assert_eq!(groups[2][0].unit.id(), "militia");
    }

    #[test]
    fn replace_sections_without_targets_are_disabled() {
        let catalogue = fixtures::catalogue();
        let warriors = catalogue
            .unit(None, "warriors")
            .expect("warriors should be indexed");
        assert!(warriors
            .disabled_upgrade_sections
            .contains(&"replace-lance".to_string()));
        assert!(!warriors
            .disabled_upgrade_sections
            .contains(&"replace-shield".to_string()));
        assert!(!warriors
            .disabled_upgrade_sections
            .contains(&"replace-sword".to_string()));
    }

    fn selection(section: &Arc<UpgradeSection>, option_id: &str) -> SelectedUpgrade {
        SelectedUpgrade {
            instance_id: new_id(),
            section: Arc::clone(section),
            option: section.option(option_id).cloned().expect("option in section"),
        }
    }

    #[test]
    fn replace_with_nothing_to_replace_grants_nothing() {
        let catalogue = fixtures::catalogue();
        let unit = fixtures::selected(&catalogue, "warriors");
        let (section, _) = fixtures::option(&catalogue, "buckler");

        let derived = derive_from(&unit.definition, &[selection(&section, "buckler")]);
        let names: Vec<&str> = derived.loadout.iter().map(Gain::name).collect();
        assert_eq!(names, vec!["Sword"]);
        assert_eq!(carried(&derived.loadout, "Sword"), 5);
    }

    #[test]
    fn sections_fold_in_priority_order() {
        let catalogue = fixtures::catalogue();
        let unit = fixtures::selected(&catalogue, "champion");
        let (mount_section, _) = fixtures::option(&catalogue, "mount");
        let mut gifts = fixtures::section(
            "hero-gifts",
            UpgradeType::UpgradeRule,
            Affects::One,
            Select::One,
            &[],
            vec![fixtures::upgrade_option(
                "regen",
                "Regeneration",
                15,
                vec![fixtures::rule("Regeneration", None)],
            )],
        );
        gifts.priority = -1;
        let gifts = Arc::new(gifts);

        let mount_first = derive_from(
            &unit.definition,
            &[selection(&mount_section, "mount"), selection(&gifts, "regen")],
        );
        let gifts_first = derive_from(
            &unit.definition,
            &[selection(&gifts, "regen"), selection(&mount_section, "mount")],
        );
        assert_eq!(mount_first, gifts_first);

        let rules: Vec<&str> = mount_first.rules.iter().map(|rule| rule.name.as_str()).collect();
        assert_eq!(rules, vec!["Hero", "Tough", "Regeneration", "Fast"]);
        assert_eq!(mount_first.size, 2);
    }

    #[test]
    fn full_list_orders_by_book_then_position() {
        let catalogue = fixtures::mixed_catalogue();
        let units = vec![
            fixtures::selected(&catalogue, "rangers"),
            fixtures::selected(&catalogue, "giant"),
            fixtures::selected(&catalogue, "thane"),
            fixtures::selected(&catalogue, "warriors"),
        ];
        let full = full_unit_list(&units, true);
        let ids: Vec<&str> = full.iter().map(|full| full.unit.id()).collect();
        assert_eq!(ids, vec!["warriors", "giant", "thane", "rangers"]);
    }
}
