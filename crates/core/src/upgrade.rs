//! Upgrade resolution: applying, removing and counting section options.
//!
//! Every mutation records or drops a [`SelectedUpgrade`] and then rebuilds
//! the unit's derived state from scratch with [`unit::derive`].

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    models::{
        new_id, split_count, Affects, Gain, Select, SelectedUnit, SelectedUpgrade, UpgradeOption,
        UpgradeSection, UpgradeType,
    },
    unit::{self, carried},
};

/// Input affordance a section needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlType {
    /// Independent on/off toggle per option.
    Checkbox,
    /// Mutually exclusive choice, including an implicit default.
    Radio,
    /// Up/down count of repeated instances.
    Counter,
}

/// Reasons an option cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpgradeError {
    /// Section is hidden for this unit.
    #[error("section {section} is disabled for {unit}")]
    SectionDisabled {
        /// Section uid.
        section: String,
        /// Unit id.
        unit: String,
    },
    /// Applying would exceed the section's legal count.
    #[error("option {option} of section {section} is not available")]
    Unavailable {
        /// Section uid.
        section: String,
        /// Option id.
        option: String,
    },
    /// Option does not belong to the section.
    #[error("option {option} does not belong to section {section}")]
    ForeignOption {
        /// Section uid.
        section: String,
        /// Option id.
        option: String,
    },
}

/// Instances of this exact option on the unit.
pub fn count_applied(unit: &SelectedUnit, section: &UpgradeSection, option: &UpgradeOption) -> u32 {
    unit.selected_upgrades
        .iter()
        .filter(|upgrade| upgrade.section.uid == section.uid && upgrade.option.id == option.id)
        .count() as u32
}

fn count_in_section(upgrades: &[SelectedUpgrade], section: &UpgradeSection) -> u32 {
    upgrades
        .iter()
        .filter(|upgrade| upgrade.section.uid == section.uid)
        .count() as u32
}

/// How many more options of `section` may be taken.
pub fn count_available(unit: &SelectedUnit, section: &UpgradeSection) -> u32 {
    available(
        section,
        unit.size,
        &unit.loadout,
        count_in_section(&unit.selected_upgrades, section),
    )
}

fn available(section: &UpgradeSection, size: u32, loadout: &[Gain], applied: u32) -> u32 {
    let slots = match (section.select, section.affects) {
        (Select::Any, Affects::Any) | (Select::Any, Affects::One) => size.saturating_sub(applied),
        _ => 1u32.saturating_sub(applied),
    };
    if section.kind != UpgradeType::Replace || section.targets().is_empty() {
        return slots;
    }

    let sets = section
        .targets()
        .iter()
        .map(|target| {
            let (need, name) = split_count(target);
            carried(loadout, name) / need
        })
        .min()
        .unwrap_or(0);
    slots.min(sets)
}

/// Affordance for `section` on this unit.
pub fn control_type(unit: &SelectedUnit, section: &UpgradeSection) -> ControlType {
    match (section.select, section.affects, section.kind) {
        (Select::One, _, UpgradeType::Replace) => ControlType::Radio,
        (Select::Any, Affects::Any, _) if unit.size > 1 => ControlType::Counter,
        _ => ControlType::Checkbox,
    }
}

/// Whether `option` may be applied right now.
pub fn is_valid(unit: &SelectedUnit, section: &UpgradeSection, option: &UpgradeOption) -> bool {
    check(unit, section, option).is_ok()
}

fn check(
    unit: &SelectedUnit,
    section: &UpgradeSection,
    option: &UpgradeOption,
) -> Result<(), UpgradeError> {
    if section.option(&option.id).is_none() {
        return Err(UpgradeError::ForeignOption {
            section: section.uid.clone(),
            option: option.id.clone(),
        });
    }
    if unit
        .definition
        .disabled_upgrade_sections
        .iter()
        .any(|uid| uid == &section.uid)
    {
        return Err(UpgradeError::SectionDisabled {
            section: section.uid.clone(),
            unit: unit.id().to_string(),
        });
    }

    let open = match control_type(unit, section) {
        // Picking a radio entry swaps the current one, so judge against the
        // unit without this section's selections.
        ControlType::Radio => {
            let others: Vec<SelectedUpgrade> = unit
                .selected_upgrades
                .iter()
                .filter(|upgrade| upgrade.section.uid != section.uid)
                .cloned()
                .collect();
            let derived = unit::derive_from(&unit.definition, &others);
            available(section, derived.size, &derived.loadout, 0) > 0
        }
        ControlType::Checkbox | ControlType::Counter => {
            let once_per_option = section.select == Select::Any && section.affects == Affects::One;
            count_available(unit, section) > 0
                && !(once_per_option && count_applied(unit, section, option) > 0)
        }
    };
    if open {
        Ok(())
    } else {
        Err(UpgradeError::Unavailable {
            section: section.uid.clone(),
            option: option.id.clone(),
        })
    }
}

/// Apply `option` and return the new instance id.
///
/// Radio sections swap out whatever was chosen before, keeping the
/// selection's place among the others. The unit is left untouched when the
/// option is not valid.
pub fn apply(
    unit: &mut SelectedUnit,
    section: &Arc<UpgradeSection>,
    option: &UpgradeOption,
) -> Result<String, UpgradeError> {
    apply_instance(unit, section, option, None)
}

pub(crate) fn apply_instance(
    unit: &mut SelectedUnit,
    section: &Arc<UpgradeSection>,
    option: &UpgradeOption,
    instance_id: Option<String>,
) -> Result<String, UpgradeError> {
    check(unit, section, option)?;

    let selection = SelectedUpgrade {
        instance_id: instance_id.unwrap_or_else(new_id),
        section: Arc::clone(section),
        option: option.clone(),
    };
    let instance_id = selection.instance_id.clone();
    debug!(
        "applying {}/{} to {} as {instance_id}",
        section.uid,
        option.id,
        unit.selection_id
    );

    let swaps = control_type(unit, section) == ControlType::Radio
        && count_in_section(&unit.selected_upgrades, section) > 0;
    if swaps {
        swap_into(unit, selection)?;
    } else {
        unit.selected_upgrades.push(selection);
        unit::derive(unit);
    }
    Ok(instance_id)
}

/// Put `selection` where its section's first selection was, dropping the
/// section's other selections, then replay. Selections that no longer hold
/// are pruned. Fails, leaving the unit untouched, when `selection` itself
/// does not hold at that position.
fn swap_into(
    unit: &mut SelectedUnit,
    selection: SelectedUpgrade,
) -> Result<Vec<SelectedUpgrade>, UpgradeError> {
    let uid = selection.section.uid.clone();
    let previous = unit.selected_upgrades.clone();
    let at = previous
        .iter()
        .position(|upgrade| upgrade.section.uid == uid)
        .map_or(previous.len(), |first| {
            previous[..first]
                .iter()
                .filter(|upgrade| upgrade.section.uid != uid)
                .count()
        });
    let mut upgrades: Vec<SelectedUpgrade> = previous
        .iter()
        .filter(|upgrade| upgrade.section.uid != uid)
        .cloned()
        .collect();
    let instance_id = selection.instance_id.clone();
    upgrades.insert(at, selection);

    let mut pruned = replay(unit, upgrades);
    if let Some(position) = pruned
        .iter()
        .position(|(upgrade, _)| upgrade.instance_id == instance_id)
    {
        let (_, err) = pruned.swap_remove(position);
        unit.selected_upgrades = previous;
        unit::derive(unit);
        return Err(err);
    }
    Ok(pruned.into_iter().map(|(upgrade, _)| upgrade).collect())
}

/// Rebuild the unit from `upgrades` in order, keeping only the selections
/// that are valid at their position.
fn replay(
    unit: &mut SelectedUnit,
    upgrades: Vec<SelectedUpgrade>,
) -> Vec<(SelectedUpgrade, UpgradeError)> {
    unit.selected_upgrades.clear();
    unit::derive(unit);

    let mut pruned = Vec::new();
    for upgrade in upgrades {
        match check(unit, &upgrade.section, &upgrade.option) {
            Ok(()) => {
                unit.selected_upgrades.push(upgrade);
                unit::derive(unit);
            }
            Err(err) => {
                warn!(
                    "dropping {}/{} from {}: {err}",
                    upgrade.section.uid, upgrade.option.id, unit.selection_id
                );
                pruned.push((upgrade, err));
            }
        }
    }
    pruned
}

/// Replay the unit's selections and drop those that no longer hold.
/// Returns the dropped selections.
pub fn revalidate(unit: &mut SelectedUnit) -> Vec<SelectedUpgrade> {
    let upgrades = std::mem::take(&mut unit.selected_upgrades);
    replay(unit, upgrades)
        .into_iter()
        .map(|(upgrade, _)| upgrade)
        .collect()
}

/// A removed selection and the later selections that depended on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    /// The selection that was asked for.
    pub removed: SelectedUpgrade,
    /// Selections dropped because they were no longer valid without it.
    pub pruned: Vec<SelectedUpgrade>,
}

/// Remove the most recent instance of `option`. `None` when there was
/// nothing to remove.
pub fn remove(
    unit: &mut SelectedUnit,
    section: &UpgradeSection,
    option: &UpgradeOption,
) -> Option<Removal> {
    let position = unit
        .selected_upgrades
        .iter()
        .rposition(|upgrade| upgrade.section.uid == section.uid && upgrade.option.id == option.id)?;
    Some(remove_at(unit, position))
}

/// Remove one instance by id. `None` when it is not present.
pub fn remove_instance(unit: &mut SelectedUnit, instance_id: &str) -> Option<Removal> {
    let position = unit
        .selected_upgrades
        .iter()
        .position(|upgrade| upgrade.instance_id == instance_id)?;
    Some(remove_at(unit, position))
}

fn remove_at(unit: &mut SelectedUnit, position: usize) -> Removal {
    let removed = unit.selected_upgrades.remove(position);
    let pruned = revalidate(unit);
    Removal { removed, pruned }
}

/// Clear `section` and optionally pick a single option in it.
///
/// `None` selects the implicit default entry. A chosen option takes the
/// place of the section's earlier selection. On failure the previous
/// selections are restored.
pub fn select_exclusive(
    unit: &mut SelectedUnit,
    section: &Arc<UpgradeSection>,
    option: Option<&UpgradeOption>,
) -> Result<Option<String>, UpgradeError> {
    let Some(option) = option else {
        unit.selected_upgrades
            .retain(|upgrade| upgrade.section.uid != section.uid);
        revalidate(unit);
        return Ok(None);
    };

    let mut cleared = unit.clone();
    cleared
        .selected_upgrades
        .retain(|upgrade| upgrade.section.uid != section.uid);
    unit::derive(&mut cleared);
    check(&cleared, section, option)?;

    let selection = SelectedUpgrade {
        instance_id: new_id(),
        section: Arc::clone(section),
        option: option.clone(),
    };
    let instance_id = selection.instance_id.clone();
    swap_into(unit, selection)?;
    Ok(Some(instance_id))
}
