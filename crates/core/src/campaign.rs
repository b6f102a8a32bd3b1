//! Campaign trait definitions and grouping.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Named campaign effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitDefinition {
    /// Trait name as stored on units.
    pub name: String,
    /// Rules text.
    #[serde(default)]
    pub description: String,
}

/// Hero skill set; only a container for traits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSet {
    /// Identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Traits in the set.
    #[serde(default)]
    pub traits: Vec<TraitDefinition>,
}

/// Campaign definitions for one game system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignData {
    /// Unit traits.
    #[serde(default)]
    pub units: Vec<TraitDefinition>,
    /// Hero skill sets.
    #[serde(default)]
    pub heroes: Vec<SkillSet>,
    /// Injuries.
    #[serde(default)]
    pub injuries: Vec<TraitDefinition>,
    /// Talents.
    #[serde(default)]
    pub talents: Vec<TraitDefinition>,
}

impl CampaignData {
    /// Read definitions from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Every definition across the sets.
    pub fn all(&self) -> impl Iterator<Item = &TraitDefinition> {
        self.units
            .iter()
            .chain(self.injuries.iter())
            .chain(self.talents.iter())
            .chain(self.heroes.iter().flat_map(|set| set.traits.iter()))
    }

    fn find(&self, name: &str) -> Option<&TraitDefinition> {
        self.all().find(|definition| definition.name == name)
    }
}

/// Trait names split into the three campaign categories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedTraits {
    /// Names found in the injury set.
    pub injuries: Vec<TraitDefinition>,
    /// Names found in the talent set.
    pub talents: Vec<TraitDefinition>,
    /// Everything else.
    pub traits: Vec<TraitDefinition>,
}

impl GroupedTraits {
    /// No traits in any category.
    pub fn is_empty(&self) -> bool {
        self.injuries.is_empty() && self.talents.is_empty() && self.traits.is_empty()
    }
}

/// Classify trait names. Membership is checked against the injury and talent
/// sets directly; anything in neither is a plain trait.
pub fn group_traits(data: &CampaignData, names: &[String]) -> GroupedTraits {
    let mut grouped = GroupedTraits::default();
    for name in names {
        let description = match data.find(name) {
            Some(definition) => definition.description.clone(),
            None => {
                warn!("no campaign definition for trait '{name}'");
                String::new()
            }
        };
        let entry = TraitDefinition {
            name: name.clone(),
            description,
        };

        if data.injuries.iter().any(|injury| injury.name == *name) {
            grouped.injuries.push(entry);
        } else if data.talents.iter().any(|talent| talent.name == *name) {
            grouped.talents.push(entry);
        } else {
            grouped.traits.push(entry);
        }
    }
    grouped
}
