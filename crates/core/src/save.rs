//! Save records and replay.
//!
//! A save stores only unit identity, customization and the `(section,
//! option)` pairs that were chosen. Loading replays those pairs through
//! [`upgrade::apply`](crate::upgrade::apply) against the current catalogue,
//! so derived loadouts and costs are never persisted.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    catalogue::Catalogue,
    models::{new_id, GameSystem, ListState, SelectedUnit, UnitDefinition, UpgradeOption, UpgradeSection},
    unit::{calculate_list_total, create_unit_from_definition},
    upgrade::apply_instance,
};

/// Format version written by this crate.
pub const CURRENT_SAVE_VERSION: u32 = 3;

/// Root directory under the user's config dir used for save files.
pub const DEFAULT_SAVE_DIR: &str = "armyforge/saves";

/// Failures that make a save unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    /// No replay exists for this format version.
    #[error("unsupported save version {0:?}")]
    UnsupportedVersion(Option<u32>),
    /// Neither the list nor the catalogue names a game system.
    #[error("list has no game system")]
    MissingGameSystem,
    /// A save needs at least one loaded army book.
    #[error("no army book is loaded")]
    NoArmyBook,
}

/// Persisted envelope around a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecord {
    pub game_system: GameSystem,
    /// Primary army book.
    pub army_id: String,
    /// Every army book the list draws from.
    #[serde(default)]
    pub army_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub army_faction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub army_name: Option<String>,
    pub modified: DateTime<Utc>,
    #[serde(default)]
    pub save_version: Option<u32>,
    #[serde(default)]
    pub list_points: i32,
    pub list: SavedList,
    #[serde(default)]
    pub favourite: bool,
}

impl SaveRecord {
    /// Army book ids to load, falling back to the primary one for old saves.
    pub fn army_ids(&self) -> Vec<String> {
        if self.army_ids.is_empty() {
            vec![self.army_id.clone()]
        } else {
            self.army_ids.clone()
        }
    }
}

/// List metadata plus minimal units. Also the share payload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedList {
    #[serde(deserialize_with = "deserialize_creation_time")]
    pub creation_time: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub points_limit: i32,
    #[serde(default)]
    pub points: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_system: Option<GameSystem>,
    #[serde(default, alias = "campaign")]
    pub campaign_mode: bool,
    #[serde(default)]
    pub competitive: bool,
    #[serde(default)]
    pub units: Vec<SavedUnit>,
}

/// Minimal unit: identity, customization and selections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedUnit {
    /// Catalogue unit id.
    pub id: String,
    /// Army book of the unit; absent in version 2 saves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub army_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    pub selection_id: String,
    #[serde(default)]
    pub selected_upgrades: Vec<SavedUpgrade>,
    #[serde(default)]
    pub combined: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_to_unit: Option<String>,
    #[serde(default)]
    pub xp: u32,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One stored selection. Version 2 saves only carry `id`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedUpgrade {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    /// Section uid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

fn deserialize_creation_time<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(num) => Ok(num.to_string()),
        other => Err(de::Error::custom(format!("invalid creation time {other}"))),
    }
}

/// Minimal representation of `list`.
pub fn data_for_save(list: &ListState) -> SavedList {
    SavedList {
        creation_time: list.creation_time.clone(),
        name: list.name.clone(),
        points_limit: list.points_limit,
        points: list.points,
        key: list.key.clone(),
        game_system: list.game_system,
        campaign_mode: list.campaign_mode,
        competitive: list.competitive,
        units: list.units.iter().map(saved_unit).collect(),
    }
}

fn saved_unit(unit: &SelectedUnit) -> SavedUnit {
    SavedUnit {
        id: unit.definition.id.clone(),
        army_id: Some(unit.army_id.clone()),
        custom_name: unit.custom_name.clone(),
        selection_id: unit.selection_id.clone(),
        selected_upgrades: unit
            .selected_upgrades
            .iter()
            .map(|upgrade| SavedUpgrade {
                instance_id: Some(upgrade.instance_id.clone()),
                upgrade_id: Some(upgrade.section.uid.clone()),
                option_id: Some(upgrade.option.id.clone()),
                id: None,
            })
            .collect(),
        combined: unit.combined,
        join_to_unit: unit.join_to_unit.clone(),
        xp: unit.xp,
        traits: unit.traits.clone(),
        notes: unit.notes.clone(),
    }
}

/// Fresh save record stamped with a new creation time. `existing` is
/// copied when given, otherwise the list starts empty.
pub fn new_record(
    catalogue: &Catalogue,
    name: &str,
    existing: Option<&ListState>,
) -> Result<SaveRecord, SaveError> {
    let primary = catalogue.books().first().ok_or(SaveError::NoArmyBook)?;
    let mut list = match existing {
        Some(list) => list.clone(),
        None => ListState::new(name, catalogue.game_system(), 0),
    };
    list.creation_time = Utc::now().timestamp_millis().to_string();
    list.undo_unit_remove = None;
    let game_system = list
        .game_system
        .or(catalogue.game_system())
        .ok_or(SaveError::MissingGameSystem)?;

    Ok(SaveRecord {
        game_system,
        army_id: primary.uid.clone(),
        army_ids: catalogue.army_ids().map(str::to_string).collect(),
        army_faction: primary.faction_name.clone(),
        army_name: Some(primary.name.clone()),
        modified: Utc::now(),
        save_version: Some(CURRENT_SAVE_VERSION),
        list_points: 0,
        list: data_for_save(&list),
        favourite: false,
    })
}

/// Overwrite the record's list with the current state.
pub fn refresh_record(record: &mut SaveRecord, list: &ListState) {
    let mut seen = HashSet::new();
    record.army_ids = list
        .units
        .iter()
        .filter(|unit| seen.insert(unit.army_id.as_str()))
        .map(|unit| unit.army_id.clone())
        .collect();
    record.modified = Utc::now();
    record.list_points = calculate_list_total(&list.units);
    record.list = data_for_save(list);
    record.save_version = Some(CURRENT_SAVE_VERSION);
}

/// Rebuild a list by replaying the record against `catalogue`.
pub fn build_list_from_save(record: &SaveRecord, catalogue: &Catalogue) -> Result<ListState, SaveError> {
    match record.save_version {
        Some(3) => Ok(build_list_from_saved_state(&record.list, catalogue)),
        Some(2) => Ok(build_v2(&record.list, catalogue)),
        other => Err(SaveError::UnsupportedVersion(other)),
    }
}

/// Replay a multi-faction list; also used for shared lists.
pub fn build_list_from_saved_state(saved: &SavedList, catalogue: &Catalogue) -> ListState {
    rebuild(saved, |saved_unit| {
        let definition = catalogue
            .unit(saved_unit.army_id.as_deref(), &saved_unit.id)
            .or_else(|| catalogue.unit(None, &saved_unit.id))?;
        let selections = saved_unit
            .selected_upgrades
            .iter()
            .filter_map(|stored| {
                let section_id = stored.upgrade_id.as_deref()?;
                let option_id = stored.option_id.as_deref()?;
                let Some(section) = catalogue.section(section_id) else {
                    warn!("dropping selection from unknown section {section_id}");
                    return None;
                };
                let Some(option) = section.option(option_id) else {
                    warn!("dropping unknown option {option_id} of section {section_id}");
                    return None;
                };
                Some((Arc::clone(section), option.clone(), stored.instance_id.clone()))
            })
            .collect();
        Some((Arc::clone(definition), selections))
    })
}

/// Legacy single-faction replay: units come from the first book and options
/// are looked up by id alone.
fn build_v2(saved: &SavedList, catalogue: &Catalogue) -> ListState {
    let primary = catalogue.books().first().map(|book| book.uid.clone());
    rebuild(saved, |saved_unit| {
        let definition = catalogue.unit(primary.as_deref(), &saved_unit.id)?;
        let selections = saved_unit
            .selected_upgrades
            .iter()
            .filter_map(|stored| {
                let option_id = stored.id.as_deref().or(stored.option_id.as_deref())?;
                let Some((section, option)) = catalogue.option(option_id) else {
                    warn!("dropping unknown option {option_id}");
                    return None;
                };
                Some((Arc::clone(section), option.clone(), stored.instance_id.clone()))
            })
            .collect();
        Some((Arc::clone(definition), selections))
    })
}

type Selection = (Arc<UpgradeSection>, UpgradeOption, Option<String>);

fn rebuild<F>(saved: &SavedList, mut resolve: F) -> ListState
where
    F: FnMut(&SavedUnit) -> Option<(Arc<UnitDefinition>, Vec<Selection>)>,
{
    let mut units: Vec<SelectedUnit> = Vec::with_capacity(saved.units.len());
    for saved_unit in &saved.units {
        let Some((definition, selections)) = resolve(saved_unit) else {
            warn!(
                "dropping unit {} ({}): not in the loaded army books",
                saved_unit.selection_id, saved_unit.id
            );
            continue;
        };

        let mut unit = create_unit_from_definition(definition);
        unit.selection_id = saved_unit.selection_id.clone();
        unit.custom_name = saved_unit.custom_name.clone();
        unit.combined = saved_unit.combined;
        unit.join_to_unit = saved_unit.join_to_unit.clone();
        unit.xp = saved_unit.xp;
        unit.traits = saved_unit.traits.clone();
        unit.notes = saved_unit.notes.clone();

        for (section, option, instance_id) in selections {
            if let Err(err) = apply_instance(&mut unit, &section, &option, instance_id) {
                warn!("dropping selection on {}: {err}", unit.selection_id);
            }
        }
        units.push(unit);
    }

    let present: HashSet<String> = units.iter().map(|unit| unit.selection_id.clone()).collect();
    for unit in &mut units {
        if let Some(target) = unit.join_to_unit.as_ref() {
            if *target == unit.selection_id || !present.contains(target) {
                warn!("clearing dangling join on {}", unit.selection_id);
                unit.join_to_unit = None;
            }
        }
    }

    let mut list = ListState {
        name: saved.name.clone(),
        points_limit: saved.points_limit,
        units,
        points: 0,
        creation_time: saved.creation_time.clone(),
        key: saved.key.clone(),
        game_system: saved.game_system,
        campaign_mode: saved.campaign_mode,
        competitive: saved.competitive,
        undo_unit_remove: None,
    };
    list.refresh_points();
    list
}

/// Metadata describing a save file on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveEntry {
    /// Absolute path to the save file.
    pub path: PathBuf,
    /// Persistence key of the list.
    pub creation_time: String,
    /// List name.
    pub name: String,
    pub game_system: GameSystem,
    pub army_name: Option<String>,
    pub points: i32,
    pub favourite: bool,
    /// Timestamp when the save was last written.
    pub modified: DateTime<Utc>,
}

impl SaveEntry {
    fn new(path: PathBuf, record: &SaveRecord) -> Self {
        Self {
            path,
            creation_time: record.list.creation_time.clone(),
            name: record.list.name.clone(),
            game_system: record.game_system,
            army_name: record.army_name.clone(),
            points: record.list_points,
            favourite: record.favourite,
            modified: record.modified,
        }
    }
}

/// Manager responsible for loading and writing save files.
pub struct SaveManager {
    root: PathBuf,
}

impl SaveManager {
    /// Create a new manager rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location under the user's config directory.
    pub fn default_root() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_SAVE_DIR)
    }

    /// Directory the saves live in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return all readable saves, most recently modified first.
    pub fn entries(&self) -> Result<Vec<SaveEntry>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root).context("failed to read save directory")? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if entry.path().extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            match read_record(&entry.path()) {
                Ok(record) => entries.push(SaveEntry::new(entry.path(), &record)),
                Err(err) => {
                    warn!("Failed to read save {:?}: {err:#}", entry.path());
                }
            }
        }

        entries.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(entries)
    }

    /// Write a new save for `existing` (or an empty list named `name`).
    pub fn create_save(
        &self,
        catalogue: &Catalogue,
        name: &str,
        existing: Option<&ListState>,
    ) -> Result<SaveEntry> {
        let mut record = new_record(catalogue, name, existing)?;
        if let Some(list) = existing {
            let mut list = list.clone();
            list.creation_time = record.list.creation_time.clone();
            refresh_record(&mut record, &list);
        }
        let path = self.path_for(&record.list.creation_time);
        write_record(&path, &record)?;
        info!("created save {}", path.display());
        Ok(SaveEntry::new(path, &record))
    }

    /// Overwrite the save keyed by the list's creation time. Lists that were
    /// never saved are left alone.
    pub fn update_save(&self, list: &ListState) -> Result<Option<SaveEntry>> {
        let path = self.path_for(&list.creation_time);
        if !path.exists() {
            debug!("no save for {} to update", list.creation_time);
            return Ok(None);
        }
        let mut record = read_record(&path)?;
        refresh_record(&mut record, list);
        write_record(&path, &record)?;
        Ok(Some(SaveEntry::new(path, &record)))
    }

    /// Read the save keyed by `creation_time`.
    pub fn load(&self, creation_time: &str) -> Result<SaveRecord> {
        read_record(&self.path_for(creation_time))
    }

    /// Store a save file produced elsewhere, keyed by its own creation time.
    pub fn import(&self, json: &str) -> Result<SaveEntry> {
        let record: SaveRecord =
            serde_json::from_str(json).context("failed to parse imported save")?;
        let path = self.path_for(&record.list.creation_time);
        write_record(&path, &record)?;
        info!("imported save {}", path.display());
        Ok(SaveEntry::new(path, &record))
    }

    /// Mark or unmark a save as favourite.
    pub fn toggle_favourite(&self, creation_time: &str, favourite: bool) -> Result<SaveEntry> {
        let path = self.path_for(creation_time);
        let mut record = read_record(&path)?;
        record.favourite = favourite;
        write_record(&path, &record)?;
        Ok(SaveEntry::new(path, &record))
    }

    /// Duplicate a save under a new key with " - Copy" appended to its name.
    pub fn copy_list(&self, creation_time: &str) -> Result<SaveEntry> {
        let mut record = self.load(creation_time)?;
        record.list.creation_time = new_id();
        record.list.name.push_str(" - Copy");
        let path = self.path_for(&record.list.creation_time);
        write_record(&path, &record)?;
        Ok(SaveEntry::new(path, &record))
    }

    /// Delete a save. Returns `false` when there was nothing to delete.
    pub fn delete(&self, creation_time: &str) -> Result<bool> {
        let path = self.path_for(creation_time);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).with_context(|| format!("failed to delete {}", path.display()))?;
        Ok(true)
    }

    /// Whether a save exists for the key.
    pub fn exists(&self, creation_time: &str) -> bool {
        self.path_for(creation_time).exists()
    }

    fn path_for(&self, creation_time: &str) -> PathBuf {
        self.root
            .join(format!("{}.json", sanitize_component(creation_time)))
    }
}

fn write_record(path: &Path, record: &SaveRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let serialised = serde_json::to_vec_pretty(record)?;
    fs::write(path, serialised).with_context(|| format!("failed to write {}", path.display()))
}

fn read_record(path: &Path) -> Result<SaveRecord> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let record = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(record)
}

fn sanitize_component(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        "save".to_string()
    } else {
        result
    }
}
