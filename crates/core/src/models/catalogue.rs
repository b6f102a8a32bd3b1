#![allow(missing_docs)]

//! Army book shapes consumed from the catalogue service.

use serde::{Deserialize, Serialize};

use super::gains::{deserialize_rating, Gain, SpecialRule};

/// How a section changes the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpgradeType {
    /// Swap the `replaceWhat` profiles for the option's gains.
    Replace,
    /// Add gains without removing anything.
    Upgrade,
    /// Rewrite ratings of existing rules.
    UpgradeRule,
}

/// How broadly one choice propagates across the unit's models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Affects {
    /// Any number of models, chosen one at a time.
    Any,
    /// A single model.
    #[default]
    One,
    /// Every model at once.
    All,
}

/// Exclusivity of the options within a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Select {
    /// Options may be taken independently.
    Any,
    /// At most one option may be taken.
    #[default]
    One,
}

/// One selectable choice within a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeOption {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub cost: i32,
    #[serde(default)]
    pub gains: Vec<Gain>,
    /// Taking the option adds a model to the unit.
    #[serde(default)]
    pub is_model: bool,
    /// Uid of the owning section, filled in by normalization.
    #[serde(default)]
    pub parent_section_id: String,
}

/// One upgrade slot on a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeSection {
    pub uid: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub kind: UpgradeType,
    #[serde(default)]
    pub affects: Affects,
    #[serde(default)]
    pub select: Select,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_what: Option<Vec<String>>,
    #[serde(default)]
    pub options: Vec<UpgradeOption>,
    /// Explicit ordering among a unit's sections; lower values come first.
    #[serde(default)]
    pub priority: i32,
    /// Section offers a musician, so it is a command-group upgrade.
    #[serde(default)]
    pub is_command_group: bool,
}

impl UpgradeSection {
    /// Find an option of this section by id.
    pub fn option(&self, option_id: &str) -> Option<&UpgradeOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    /// Replace targets, empty when the section replaces nothing.
    pub fn targets(&self) -> &[String] {
        self.replace_what.as_deref().unwrap_or(&[])
    }
}

/// Named group of sections a unit may be eligible for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradePackage {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default)]
    pub sections: Vec<UpgradeSection>,
}

/// Catalogue entry for a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitDefinition {
    pub id: String,
    /// Uid of the army book the unit was loaded from.
    #[serde(default)]
    pub army_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default = "default_size")]
    pub size: u32,
    #[serde(default)]
    pub cost: i32,
    #[serde(default)]
    pub quality: u32,
    #[serde(default)]
    pub defense: u32,
    #[serde(default)]
    pub special_rules: Vec<SpecialRule>,
    #[serde(default)]
    pub equipment: Vec<Gain>,
    /// Uids of the upgrade packages this unit may use.
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Position in the army book, used for stable display ordering.
    #[serde(default)]
    pub sort_id: usize,
    /// Load position of the unit's army book within the catalogue.
    #[serde(skip)]
    pub book_index: usize,
    #[serde(default)]
    pub disabled_upgrade_sections: Vec<String>,
}

fn default_size() -> u32 {
    1
}

impl UnitDefinition {
    /// Whether the unit carries the Hero rule.
    pub fn is_hero(&self) -> bool {
        self.special_rules.iter().any(|rule| rule.name == "Hero")
    }
}

/// Game-system or faction rule definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(
        default,
        deserialize_with = "deserialize_rating",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<i32>,
}

/// Faction document: units, upgrade packages and faction rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmyBook {
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction_name: Option<String>,
    #[serde(default)]
    pub units: Vec<UnitDefinition>,
    #[serde(default)]
    pub upgrade_packages: Vec<UpgradePackage>,
    #[serde(default)]
    pub special_rules: Vec<RuleDefinition>,
}

/// Army book entry from the service's book listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmyBookSummary {
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_string: Option<String>,
}
