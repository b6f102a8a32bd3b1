#![allow(missing_docs)]

//! Profile effects granted by base equipment and upgrade options.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// A profile effect, discriminated by the catalogue `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Gain {
    /// Ranged or melee weapon profile.
    #[serde(rename = "ArmyBookWeapon")]
    Weapon(Weapon),
    /// Bundle of nested gains, optionally counting as an extra model.
    #[serde(rename = "ArmyBookItem")]
    Item(Item),
    /// Special rule granted to the unit.
    #[serde(rename = "ArmyBookRule")]
    Rule(SpecialRule),
    /// Defense modifier.
    #[serde(rename = "ArmyBookDefense")]
    Defense(SpecialRule),
}

/// Weapon profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weapon {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Number of models carrying the weapon; `None` until normalized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default)]
    pub range: u32,
    #[serde(default)]
    pub attacks: u32,
    #[serde(default)]
    pub special_rules: Vec<SpecialRule>,
}

/// Item bundling its own rules and weapons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default)]
    pub content: Vec<Gain>,
    /// Grants an extra body rather than just equipment.
    #[serde(default)]
    pub is_model: bool,
}

/// Special rule instance, optionally rated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_rating",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<i32>,
    /// `true` when the rating is a delta applied to an existing rule.
    #[serde(default)]
    pub modify: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl SpecialRule {
    /// Unrated rule with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Rule with the given name and rating.
    pub fn rated(name: impl Into<String>, rating: i32) -> Self {
        Self {
            name: name.into(),
            rating: Some(rating),
            ..Self::default()
        }
    }
}

impl Gain {
    /// Catalogue name of the profile.
    pub fn name(&self) -> &str {
        match self {
            Gain::Weapon(weapon) => &weapon.name,
            Gain::Item(item) => &item.name,
            Gain::Rule(rule) | Gain::Defense(rule) => &rule.name,
        }
    }

    /// Display label, falling back to the name.
    pub fn label(&self) -> &str {
        let label = match self {
            Gain::Weapon(weapon) => weapon.label.as_deref(),
            Gain::Item(item) => item.label.as_deref(),
            Gain::Rule(rule) | Gain::Defense(rule) => rule.label.as_deref(),
        };
        label.filter(|value| !value.is_empty()).unwrap_or(self.name())
    }

    /// Catalogue id, if one was provided.
    pub fn id(&self) -> Option<&str> {
        match self {
            Gain::Weapon(weapon) => weapon.id.as_deref(),
            Gain::Item(item) => item.id.as_deref(),
            Gain::Rule(rule) | Gain::Defense(rule) => rule.id.as_deref(),
        }
    }

    /// How many models carry this profile. Rules always count once.
    pub fn count(&self) -> u32 {
        match self {
            Gain::Weapon(weapon) => weapon.count.unwrap_or(1),
            Gain::Item(item) => item.count.unwrap_or(1),
            Gain::Rule(_) | Gain::Defense(_) => 1,
        }
    }

    /// Whether an explicit count was provided.
    pub fn has_count(&self) -> bool {
        match self {
            Gain::Weapon(weapon) => weapon.count.is_some(),
            Gain::Item(item) => item.count.is_some(),
            Gain::Rule(_) | Gain::Defense(_) => true,
        }
    }

    /// Overwrite the carried count. No-op for rules.
    pub fn set_count(&mut self, count: u32) {
        match self {
            Gain::Weapon(weapon) => weapon.count = Some(count),
            Gain::Item(item) => item.count = Some(count),
            Gain::Rule(_) | Gain::Defense(_) => {}
        }
    }

    /// Copy of this gain carried by `multiplier` times as many models.
    pub fn scaled(&self, multiplier: u32) -> Gain {
        let mut gain = self.clone();
        gain.set_count(self.count() * multiplier);
        gain
    }

    /// Rule payload for rule and defense gains.
    pub fn as_rule(&self) -> Option<&SpecialRule> {
        match self {
            Gain::Rule(rule) | Gain::Defense(rule) => Some(rule),
            _ => None,
        }
    }

    /// `true` for item gains that add a body to the unit.
    pub fn is_model(&self) -> bool {
        matches!(self, Gain::Item(item) if item.is_model)
    }

    /// Case- and plural-insensitive comparison against a replace target.
    pub fn matches(&self, target: &str) -> bool {
        let (_, target) = split_count(target);
        let target = singular(target);
        singular(self.name()) == target || singular(self.label()) == target
    }
}

/// Split a `"2x Sword"` style target into its count and name.
pub fn split_count(target: &str) -> (u32, &str) {
    static COUNT_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^(\d+)x\s+").expect("invalid count prefix regex"));

    match COUNT_RE.captures(target) {
        Some(caps) => {
            let count = caps
                .get(1)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .unwrap_or(1);
            let end = caps.get(0).map(|m| m.end()).unwrap_or(0);
            (count.max(1), target[end..].trim())
        }
        None => (1, target.trim()),
    }
}

fn singular(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.strip_suffix('s') {
        Some(stem) if !stem.is_empty() && !stem.ends_with('s') => stem.to_string(),
        _ => lower,
    }
}

/// Ratings arrive as numbers, numeric strings, or empty strings.
pub(crate) fn deserialize_rating<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(num)) => num
            .as_i64()
            .and_then(|value| i32::try_from(value).ok())
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid rating {num}"))),
        Some(Value::String(text)) => {
            let trimmed = text.trim().trim_start_matches('+');
            if trimmed.is_empty() {
                return Ok(None);
            }
            match trimmed.parse::<i32>() {
                Ok(value) => Ok(Some(value)),
                Err(_) => {
                    warn!("ignoring non-numeric rule rating '{text}'");
                    Ok(None)
                }
            }
        }
        Some(other) => Err(de::Error::custom(format!("invalid rating {other}"))),
    }
}
