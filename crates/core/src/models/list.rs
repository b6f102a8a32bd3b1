//! Army list state: selected units and their applied upgrades.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::{
    catalogue::{UnitDefinition, UpgradeOption, UpgradeSection},
    gains::{Gain, SpecialRule},
    game_system::GameSystem,
};

/// Fresh identifier for selections and upgrade instances.
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// A single applied choice on a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedUpgrade {
    /// Unique per application, so the same option may be taken repeatedly.
    pub instance_id: String,
    /// Section the option was taken from.
    pub section: Arc<UpgradeSection>,
    /// The chosen option.
    pub option: UpgradeOption,
}

/// One unit instance in a list.
///
/// `loadout`, `rules` and `size` are derived from the definition and the
/// selected upgrades and are rebuilt after every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedUnit {
    /// Identity of this instance within the list.
    pub selection_id: String,
    /// Army book the definition came from.
    pub army_id: String,
    /// Shared catalogue entry.
    pub definition: Arc<UnitDefinition>,
    /// Player-provided display name.
    pub custom_name: Option<String>,
    /// Applied upgrades in application order.
    pub selected_upgrades: Vec<SelectedUpgrade>,
    /// Derived equipment after all upgrades.
    pub loadout: Vec<Gain>,
    /// Derived special rules (base rules plus upgrade rules, excluding item content).
    pub rules: Vec<SpecialRule>,
    /// Derived model count.
    pub size: u32,
    /// Part of a combined pair.
    pub combined: bool,
    /// Selection id of the unit this one is attached to.
    pub join_to_unit: Option<String>,
    /// Campaign experience.
    pub xp: u32,
    /// Campaign trait names.
    pub traits: Vec<String>,
    /// Free-text notes.
    pub notes: Option<String>,
}

impl SelectedUnit {
    /// Catalogue id of the unit.
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// Custom name when set, otherwise the catalogue name.
    pub fn display_name(&self) -> &str {
        self.custom_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.definition.name)
    }

    /// Whether the unit currently has the Hero rule.
    pub fn is_hero(&self) -> bool {
        self.rules.iter().any(|rule| rule.name == "Hero")
    }

    /// Whether an option labelled `label` was taken from a command group
    /// section.
    pub fn has_command_upgrade(&self, label: &str) -> bool {
        self.selected_upgrades
            .iter()
            .any(|upgrade| upgrade.section.is_command_group && upgrade.option.label == label)
    }
}

/// A full army list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState {
    /// List name.
    pub name: String,
    /// Points limit, 0 for unlimited.
    pub points_limit: i32,
    /// Units in list order.
    pub units: Vec<SelectedUnit>,
    /// Running point total.
    pub points: i32,
    /// Millisecond creation timestamp, doubling as the persistence key.
    pub creation_time: String,
    /// Sharing key.
    pub key: Option<String>,
    /// Game system the list is built for.
    pub game_system: Option<GameSystem>,
    /// Campaign mode enables experience and traits.
    pub campaign_mode: bool,
    /// Player opted into competitive validation.
    pub competitive: bool,
    /// Units removed by the last removal, for undo.
    pub undo_unit_remove: Option<Vec<SelectedUnit>>,
}

impl ListState {
    /// Empty list stamped with the current time.
    pub fn new(name: impl Into<String>, game_system: Option<GameSystem>, points_limit: i32) -> Self {
        Self {
            name: name.into(),
            points_limit,
            units: Vec::new(),
            points: 0,
            creation_time: Utc::now().timestamp_millis().to_string(),
            key: None,
            game_system,
            campaign_mode: false,
            competitive: false,
            undo_unit_remove: None,
        }
    }
}
