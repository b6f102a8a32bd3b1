//! Small hand-built army books shared by unit tests.

use std::sync::Arc;

use crate::{
    catalogue::{decorate, Catalogue},
    models::{
        Affects, ArmyBook, Gain, GameSystem, Item, RuleDefinition, Select, SelectedUnit,
        SpecialRule, UnitDefinition, UpgradeOption, UpgradePackage, UpgradeSection, UpgradeType,
        Weapon,
    },
    unit::create_unit_from_definition,
};

pub(crate) const ARMY_ID: &str = "elves";
pub(crate) const ALLY_ID: &str = "dwarves";

pub(crate) fn weapon(name: &str, range: u32, attacks: u32) -> Gain {
    Gain::Weapon(Weapon {
        id: None,
        name: name.to_string(),
        label: None,
        count: None,
        range,
        attacks,
        special_rules: Vec::new(),
    })
}

pub(crate) fn item(name: &str, content: Vec<Gain>, is_model: bool) -> Gain {
    Gain::Item(Item {
        id: None,
        name: name.to_string(),
        label: None,
        count: None,
        content,
        is_model,
    })
}

pub(crate) fn rule(name: &str, rating: Option<i32>) -> Gain {
    Gain::Rule(SpecialRule {
        name: name.to_string(),
        rating,
        ..SpecialRule::default()
    })
}

pub(crate) fn upgrade_option(id: &str, label: &str, cost: i32, gains: Vec<Gain>) -> UpgradeOption {
    UpgradeOption {
        id: id.to_string(),
        label: label.to_string(),
        cost,
        gains,
        is_model: false,
        parent_section_id: String::new(),
    }
}

pub(crate) fn section(
    uid: &str,
    kind: UpgradeType,
    affects: Affects,
    select: Select,
    replace_what: &[&str],
    options: Vec<UpgradeOption>,
) -> UpgradeSection {
    UpgradeSection {
        uid: uid.to_string(),
        label: uid.replace('-', " "),
        kind,
        affects,
        select,
        replace_what: (!replace_what.is_empty())
            .then(|| replace_what.iter().map(|target| target.to_string()).collect()),
        options,
        priority: 0,
        is_command_group: false,
    }
}

pub(crate) fn unit(
    id: &str,
    size: u32,
    cost: i32,
    special_rules: Vec<SpecialRule>,
    equipment: Vec<Gain>,
    upgrades: &[&str],
) -> UnitDefinition {
    let mut name = id.to_string();
    if let Some(first) = name.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    UnitDefinition {
        id: id.to_string(),
        army_id: String::new(),
        name,
        category: None,
        size,
        cost,
        quality: 4,
        defense: 4,
        special_rules,
        equipment,
        upgrades: upgrades.iter().map(|uid| uid.to_string()).collect(),
        sort_id: 0,
        book_index: 0,
        disabled_upgrade_sections: Vec::new(),
    }
}

/// Elven book: infantry, a hero, a cheap combinable unit and a monster.
pub(crate) fn book() -> ArmyBook {
    let mut hero_upgrades = section(
        "hero-upgrades",
        UpgradeType::UpgradeRule,
        Affects::One,
        Select::One,
        &[],
        vec![upgrade_option(
            "tough-up",
            "Tough(+3)",
            15,
            vec![rule("Tough", Some(3))],
        )],
    );
    hero_upgrades.priority = -1;

    let warriors_package = UpgradePackage {
        uid: "pkg-warriors".to_string(),
        hint: None,
        sections: vec![
            section(
                "replace-sword",
                UpgradeType::Replace,
                Affects::Any,
                Select::Any,
                &["Sword"],
                vec![upgrade_option("axe", "Axe", 5, vec![weapon("Axe", 0, 2)])],
            ),
            section(
                "upgrade-all-shields",
                UpgradeType::Upgrade,
                Affects::All,
                Select::One,
                &[],
                vec![upgrade_option(
                    "shields",
                    "Shields",
                    2,
                    vec![item(
                        "Shield",
                        vec![Gain::Defense(SpecialRule::rated("Defense", 1))],
                        false,
                    )],
                )],
            ),
            section(
                "command",
                UpgradeType::Upgrade,
                Affects::One,
                Select::Any,
                &[],
                vec![
                    upgrade_option("sergeant", "Sergeant", 10, vec![rule("Sergeant", None)]),
                    upgrade_option("musician", "Musician", 10, vec![rule("Musician", None)]),
                ],
            ),
            section(
                "replace-shield",
                UpgradeType::Replace,
                Affects::One,
                Select::One,
                &["Shield"],
                vec![upgrade_option("buckler", "Buckler", 1, vec![item("Buckler", Vec::new(), false)])],
            ),
            section(
                "replace-lance",
                UpgradeType::Replace,
                Affects::One,
                Select::One,
                &["Lance"],
                vec![upgrade_option("pike", "Pike", 3, vec![weapon("Pike", 0, 1)])],
            ),
        ],
    };

    let mut mount = upgrade_option(
        "mount",
        "Steed",
        20,
        vec![item("Steed", vec![weapon("Hooves", 0, 2)], true)],
    );
    mount.gains.push(rule("Fast", None));
    let hero_package = UpgradePackage {
        uid: "pkg-hero".to_string(),
        hint: None,
        sections: vec![
            section(
                "hero-mount",
                UpgradeType::Upgrade,
                Affects::One,
                Select::One,
                &[],
                vec![mount],
            ),
            hero_upgrades,
        ],
    };

    let militia_package = UpgradePackage {
        uid: "pkg-militia".to_string(),
        hint: None,
        sections: vec![section(
            "replace-spear",
            UpgradeType::Replace,
            Affects::All,
            Select::One,
            &["Spear"],
            vec![
                upgrade_option("pike-all", "Pikes", 1, vec![weapon("Pike", 0, 1)]),
                upgrade_option("halberd-all", "Halberds", 2, vec![weapon("Halberd", 0, 2)]),
            ],
        )],
    };

    let giant_package = UpgradePackage {
        uid: "pkg-giant".to_string(),
        hint: None,
        sections: vec![section(
            "giant-fear",
            UpgradeType::UpgradeRule,
            Affects::One,
            Select::One,
            &[],
            vec![upgrade_option("fear-3", "Fear(3)", 10, vec![rule("Fear", Some(3))])],
        )],
    };

    let mut book = ArmyBook {
        uid: ARMY_ID.to_string(),
        name: "Elves".to_string(),
        faction_name: Some("Elves".to_string()),
        units: vec![
            unit(
                "warriors",
                5,
                100,
                Vec::new(),
                vec![weapon("Sword", 0, 1)],
                &["pkg-warriors"],
            ),
            unit(
                "champion",
                1,
                60,
                vec![SpecialRule::named("Hero"), SpecialRule::rated("Tough", 3)],
                vec![weapon("Sword", 0, 1)],
                &["pkg-warriors", "pkg-hero"],
            ),
            unit(
                "militia",
                5,
                5,
                Vec::new(),
                vec![weapon("Spear", 0, 1)],
                &["pkg-militia"],
            ),
            unit(
                "giant",
                1,
                200,
                vec![SpecialRule::rated("Tough", 6), SpecialRule::rated("Fear", 2)],
                vec![weapon("Club", 0, 4)],
                &["pkg-giant"],
            ),
            unit(
                "archers",
                10,
                150,
                Vec::new(),
                vec![weapon("Bow", 24, 1)],
                &[],
            ),
        ],
        upgrade_packages: vec![warriors_package, hero_package, militia_package, giant_package],
        special_rules: vec![RuleDefinition {
            id: None,
            name: "Fear".to_string(),
            description: "Counts as extra wounds in melee.".to_string(),
            rating: None,
        }],
    };
    decorate(&mut book, ARMY_ID);
    book
}

/// Dwarven book used for multi-faction lists.
pub(crate) fn ally_book() -> ArmyBook {
    let mut book = ArmyBook {
        uid: ALLY_ID.to_string(),
        name: "Dwarves".to_string(),
        faction_name: Some("Dwarves".to_string()),
        units: vec![
            unit(
                "thane",
                1,
                70,
                vec![SpecialRule::named("Hero"), SpecialRule::rated("Tough", 3)],
                vec![weapon("Hammer", 0, 3)],
                &[],
            ),
            unit(
                "rangers",
                5,
                90,
                Vec::new(),
                vec![weapon("Crossbow", 24, 1)],
                &[],
            ),
        ],
        upgrade_packages: Vec::new(),
        special_rules: Vec::new(),
    };
    decorate(&mut book, ALLY_ID);
    book
}

pub(crate) fn catalogue() -> Catalogue {
    Catalogue::new(Some(GameSystem::Gf), vec![book()])
}

pub(crate) fn mixed_catalogue() -> Catalogue {
    Catalogue::new(Some(GameSystem::Gf), vec![book(), ally_book()])
}

/// Fresh instance of a catalogue unit.
pub(crate) fn selected(catalogue: &Catalogue, unit_id: &str) -> SelectedUnit {
    let definition = catalogue
        .unit(None, unit_id)
        .unwrap_or_else(|| panic!("fixture unit {unit_id} missing"));
    create_unit_from_definition(Arc::clone(definition))
}

/// Section and option for an option id.
pub(crate) fn option(catalogue: &Catalogue, option_id: &str) -> (Arc<UpgradeSection>, UpgradeOption) {
    let (section, option) = catalogue
        .option(option_id)
        .unwrap_or_else(|| panic!("fixture option {option_id} missing"));
    (Arc::clone(section), option.clone())
}
