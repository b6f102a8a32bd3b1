//! Shared domain models.

mod catalogue;
mod gains;
mod game_system;
mod list;

pub use catalogue::{
    Affects, ArmyBook, ArmyBookSummary, RuleDefinition, Select, UnitDefinition, UpgradeOption,
    UpgradePackage, UpgradeSection, UpgradeType,
};
pub use gains::{split_count, Gain, Item, SpecialRule, Weapon};
pub use game_system::{GameSystem, SystemKind, Thresholds, SKIRMISH_POINTS_PER_MODEL};
pub use list::{new_id, ListState, SelectedUnit, SelectedUpgrade};
