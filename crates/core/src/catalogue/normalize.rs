//! Decorates raw army books with the fields the engine derives once per load.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{models::ArmyBook, unit::disabled_upgrade_sections};

/// Server-only bookkeeping fields removed from sections and options.
pub const TRANSIENT_FIELDS: [&str; 5] = [
    "proposedCost",
    "proposedCostHint",
    "proposedVersion",
    "parentPackageUid",
    "parentSectionUid",
];

/// Parse a raw army-book document and decorate it for `army_id`.
pub fn normalize_army_book(mut raw: Value, army_id: &str) -> Result<ArmyBook> {
    strip_transient_fields(&mut raw);
    tag_gains(&mut raw);
    let mut book: ArmyBook = serde_json::from_value(raw)
        .with_context(|| format!("failed to parse army book {army_id}"))?;
    decorate(&mut book, army_id);
    Ok(book)
}

/// Fill in derived fields: parent section ids, command-group flags, unit
/// army ids, sort ids, default equipment counts and disabled sections.
pub fn decorate(book: &mut ArmyBook, army_id: &str) {
    if book.uid.is_empty() {
        book.uid = army_id.to_string();
    }

    for package in &mut book.upgrade_packages {
        for section in &mut package.sections {
            section.is_command_group = section.options.iter().any(|option| {
                option
                    .gains
                    .iter()
                    .any(|gain| gain.name().eq_ignore_ascii_case("musician"))
            });
            let uid = section.uid.clone();
            for option in &mut section.options {
                option.parent_section_id = uid.clone();
            }
        }
    }

    let ArmyBook {
        units,
        upgrade_packages,
        ..
    } = book;
    for (index, unit) in units.iter_mut().enumerate() {
        unit.army_id = army_id.to_string();
        unit.sort_id = index;
        let size = unit.size;
        for gain in &mut unit.equipment {
            if !gain.has_count() {
                gain.set_count(size);
            }
        }
        unit.disabled_upgrade_sections = disabled_upgrade_sections(unit, upgrade_packages);
        if !unit.disabled_upgrade_sections.is_empty() {
            debug!(
                "unit {} has disabled sections {:?}",
                unit.id, unit.disabled_upgrade_sections
            );
        }
    }
}

fn strip_transient_fields(raw: &mut Value) {
    let Some(packages) = raw.get_mut("upgradePackages").and_then(Value::as_array_mut) else {
        return;
    };
    for section in packages
        .iter_mut()
        .filter_map(|package| package.get_mut("sections").and_then(Value::as_array_mut))
        .flatten()
    {
        if let Some(section) = section.as_object_mut() {
            remove_transient(section);
            if let Some(options) = section.get_mut("options").and_then(Value::as_array_mut) {
                for option in options.iter_mut().filter_map(Value::as_object_mut) {
                    remove_transient(option);
                }
            }
        }
    }
}

fn remove_transient(object: &mut Map<String, Value>) {
    for field in TRANSIENT_FIELDS {
        object.remove(field);
    }
}

/// Make the gain discriminator explicit wherever the service omitted it.
fn tag_gains(raw: &mut Value) {
    if let Some(units) = raw.get_mut("units").and_then(Value::as_array_mut) {
        for unit in units.iter_mut() {
            if let Some(equipment) = unit.get_mut("equipment").and_then(Value::as_array_mut) {
                equipment.iter_mut().for_each(tag_gain);
            }
        }
    }

    if let Some(packages) = raw.get_mut("upgradePackages").and_then(Value::as_array_mut) {
        let options = packages
            .iter_mut()
            .filter_map(|package| package.get_mut("sections").and_then(Value::as_array_mut))
            .flatten()
            .filter_map(|section| section.get_mut("options").and_then(Value::as_array_mut))
            .flatten();
        for option in options {
            if let Some(gains) = option.get_mut("gains").and_then(Value::as_array_mut) {
                gains.iter_mut().for_each(tag_gain);
            }
        }
    }
}

fn tag_gain(gain: &mut Value) {
    let Some(object) = gain.as_object_mut() else {
        return;
    };
    if !object.contains_key("type") {
        let kind = if object.contains_key("content") {
            "ArmyBookItem"
        } else if object.contains_key("attacks") || object.contains_key("range") {
            "ArmyBookWeapon"
        } else if object.get("name").and_then(Value::as_str) == Some("Defense") {
            "ArmyBookDefense"
        } else {
            "ArmyBookRule"
        };
        object.insert("type".to_string(), Value::String(kind.to_string()));
    }
    if let Some(content) = object.get_mut("content").and_then(Value::as_array_mut) {
        content.iter_mut().for_each(tag_gain);
    }
}
