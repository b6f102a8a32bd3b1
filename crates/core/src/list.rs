//! Player actions on a list. Each one re-derives the units it touches and
//! refreshes the list total.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    models::{new_id, Affects, ListState, SelectedUnit, UnitDefinition, UpgradeOption, UpgradeSection},
    unit::{calculate_list_total, create_unit_from_definition},
    upgrade::{self, Removal, UpgradeError},
};

/// Rejected list actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    /// No unit with that selection id.
    #[error("no unit with selection id {0}")]
    UnknownUnit(String),
    /// A unit may not join itself.
    #[error("unit {0} cannot join itself")]
    SelfJoin(String),
    /// Join targets must be root units.
    #[error("unit {0} is already attached to another unit")]
    TargetAttached(String),
    /// A root may have only one combined partner, and combined units stay
    /// with their pair.
    #[error("unit {0} is already combined")]
    AlreadyCombined(String),
    /// Only units with nothing attached to them may join another unit.
    #[error("unit {0} has units attached to it")]
    HasAttachments(String),
    /// The upgrade itself was rejected.
    #[error(transparent)]
    Upgrade(#[from] UpgradeError),
}

impl ListState {
    /// Unit by selection id.
    pub fn unit(&self, selection_id: &str) -> Option<&SelectedUnit> {
        self.units.iter().find(|unit| unit.selection_id == selection_id)
    }

    fn unit_mut(&mut self, selection_id: &str) -> Result<&mut SelectedUnit, ListError> {
        self.units
            .iter_mut()
            .find(|unit| unit.selection_id == selection_id)
            .ok_or_else(|| ListError::UnknownUnit(selection_id.to_string()))
    }

    /// Recompute the list total from every unit.
    pub fn refresh_points(&mut self) {
        self.points = calculate_list_total(&self.units);
    }

    /// Append a fresh instance of `definition` and return its selection id.
    pub fn add_unit(&mut self, definition: Arc<UnitDefinition>) -> String {
        let unit = create_unit_from_definition(definition);
        let selection_id = unit.selection_id.clone();
        debug!("adding {} as {selection_id}", unit.definition.id);
        self.units.push(unit);
        self.refresh_points();
        selection_id
    }

    /// Selection id of the other half of a combined pair.
    pub fn combined_partner(&self, selection_id: &str) -> Option<&str> {
        let unit = self.unit(selection_id)?;
        if !unit.combined {
            return None;
        }
        if let Some(root) = unit.join_to_unit.as_deref() {
            return self
                .unit(root)
                .filter(|root| root.combined)
                .map(|root| root.selection_id.as_str());
        }
        self.units
            .iter()
            .find(|other| {
                other.combined && other.join_to_unit.as_deref() == Some(selection_id)
            })
            .map(|other| other.selection_id.as_str())
    }

    /// Remove a unit together with its combined partner. Heroes joined to
    /// either are detached. The removed units can be restored with
    /// [`ListState::undo_remove`].
    pub fn remove_unit(&mut self, selection_id: &str) -> Result<(), ListError> {
        if self.unit(selection_id).is_none() {
            return Err(ListError::UnknownUnit(selection_id.to_string()));
        }
        let mut doomed = vec![selection_id.to_string()];
        if let Some(partner) = self.combined_partner(selection_id) {
            doomed.push(partner.to_string());
        }

        let (removed, kept): (Vec<SelectedUnit>, Vec<SelectedUnit>) = std::mem::take(&mut self.units)
            .into_iter()
            .partition(|unit| doomed.contains(&unit.selection_id));
        self.units = kept;
        for unit in &mut self.units {
            if unit
                .join_to_unit
                .as_ref()
                .is_some_and(|target| doomed.contains(target))
            {
                info!("detaching {} from removed unit", unit.selection_id);
                unit.join_to_unit = None;
            }
        }

        self.undo_unit_remove = Some(removed);
        self.refresh_points();
        Ok(())
    }

    /// Restore the units taken out by the last removal.
    pub fn undo_remove(&mut self) -> bool {
        let Some(removed) = self.undo_unit_remove.take() else {
            return false;
        };
        self.units.extend(removed);
        self.refresh_points();
        true
    }

    /// Set or clear a unit's custom name.
    pub fn rename_unit(&mut self, selection_id: &str, name: Option<String>) -> Result<(), ListError> {
        let unit = self.unit_mut(selection_id)?;
        unit.custom_name = name.filter(|name| !name.trim().is_empty());
        Ok(())
    }

    /// Clone a root unit into a combined partner joined to it.
    ///
    /// Size-1 units may be combined; validation reports that for battle systems.
    pub fn combine_unit(&mut self, selection_id: &str) -> Result<String, ListError> {
        let position = self
            .units
            .iter()
            .position(|unit| unit.selection_id == selection_id)
            .ok_or_else(|| ListError::UnknownUnit(selection_id.to_string()))?;
        let root = &self.units[position];
        if root.combined || root.join_to_unit.is_some() {
            return Err(ListError::AlreadyCombined(selection_id.to_string()));
        }

        let mut partner = root.clone();
        partner.selection_id = new_id();
        partner.combined = true;
        partner.join_to_unit = Some(selection_id.to_string());
        for selected in &mut partner.selected_upgrades {
            selected.instance_id = new_id();
        }
        let partner_id = partner.selection_id.clone();

        self.units[position].combined = true;
        self.units.insert(position + 1, partner);
        self.refresh_points();
        Ok(partner_id)
    }

    /// Attach a unit to a root unit. Combined units and units that carry
    /// attachments of their own cannot join.
    pub fn join_unit(&mut self, selection_id: &str, target: &str) -> Result<(), ListError> {
        if selection_id == target {
            return Err(ListError::SelfJoin(selection_id.to_string()));
        }
        let joining = self
            .unit(selection_id)
            .ok_or_else(|| ListError::UnknownUnit(selection_id.to_string()))?;
        if joining.combined {
            return Err(ListError::AlreadyCombined(selection_id.to_string()));
        }
        if self
            .units
            .iter()
            .any(|unit| unit.join_to_unit.as_deref() == Some(selection_id))
        {
            return Err(ListError::HasAttachments(selection_id.to_string()));
        }
        let target_unit = self
            .unit(target)
            .ok_or_else(|| ListError::UnknownUnit(target.to_string()))?;
        if target_unit.join_to_unit.is_some() {
            return Err(ListError::TargetAttached(target.to_string()));
        }
        let unit = self.unit_mut(selection_id)?;
        unit.join_to_unit = Some(target.to_string());
        Ok(())
    }

    /// Detach a unit from whatever it is attached to. A combined partner
    /// detached this way splits the pair.
    pub fn detach_unit(&mut self, selection_id: &str) -> Result<(), ListError> {
        let partner = self.combined_partner(selection_id).map(str::to_string);
        let unit = self.unit_mut(selection_id)?;
        if unit.join_to_unit.take().is_none() {
            return Ok(());
        }
        if unit.combined {
            unit.combined = false;
            if let Some(partner) = partner {
                self.unit_mut(&partner)?.combined = false;
            }
        }
        Ok(())
    }

    /// Apply an option to a unit. `affects: all` sections are mirrored onto
    /// the combined partner.
    pub fn apply_upgrade(
        &mut self,
        selection_id: &str,
        section: &Arc<UpgradeSection>,
        option: &UpgradeOption,
    ) -> Result<String, ListError> {
        let partner = self.combined_partner(selection_id).map(str::to_string);
        let instance_id = upgrade::apply(self.unit_mut(selection_id)?, section, option)?;

        if let (Affects::All, Some(partner)) = (section.affects, partner) {
            if let Err(err) = upgrade::apply(self.unit_mut(&partner)?, section, option) {
                warn!("could not mirror {} onto combined unit {partner}: {err}", option.id);
            }
        }
        self.refresh_points();
        Ok(instance_id)
    }

    /// Remove the most recent instance of an option from a unit, mirroring
    /// `affects: all` sections onto the combined partner. Later selections
    /// that no longer hold are dropped and reported in the [`Removal`].
    pub fn remove_upgrade(
        &mut self,
        selection_id: &str,
        section: &UpgradeSection,
        option: &UpgradeOption,
    ) -> Result<Option<Removal>, ListError> {
        let partner = self.combined_partner(selection_id).map(str::to_string);
        let removed = upgrade::remove(self.unit_mut(selection_id)?, section, option);
        if let (Affects::All, Some(partner)) = (section.affects, partner) {
            upgrade::remove(self.unit_mut(&partner)?, section, option);
        }
        self.refresh_points();
        Ok(removed)
    }

    /// Set campaign experience.
    pub fn set_xp(&mut self, selection_id: &str, xp: u32) -> Result<(), ListError> {
        self.unit_mut(selection_id)?.xp = xp;
        Ok(())
    }

    /// Replace campaign traits.
    pub fn set_traits(&mut self, selection_id: &str, traits: Vec<String>) -> Result<(), ListError> {
        self.unit_mut(selection_id)?.traits = traits;
        Ok(())
    }

    /// Set or clear notes.
    pub fn set_notes(&mut self, selection_id: &str, notes: Option<String>) -> Result<(), ListError> {
        self.unit_mut(selection_id)?.notes = notes;
        Ok(())
    }
}
