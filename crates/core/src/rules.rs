//! Special-rule aggregation and the per-game-system rules cache.

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use crate::models::{GameSystem, RuleDefinition, SpecialRule};

/// Rules whose ratings add up when taken more than once.
pub const STACKING_RULES: [&str; 2] = ["Tough", "Impact"];

/// Whether ratings of `name` sum rather than take the maximum.
pub fn is_stacking(name: &str) -> bool {
    STACKING_RULES.contains(&name)
}

/// Display-ready summary of every instance of one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedRule {
    /// Representative rule carrying the combined rating.
    pub rule: SpecialRule,
    /// Number of merged instances; 1 for stacking rules, whose count is folded into the rating.
    pub count: usize,
}

/// Merge rule instances by name, in order of first appearance.
///
/// Stacking rules sum their ratings, all others keep the highest rating.
pub fn group(rules: &[SpecialRule]) -> Vec<GroupedRule> {
    let mut order: Vec<&str> = Vec::new();
    let mut buckets: HashMap<&str, Vec<&SpecialRule>> = HashMap::new();
    for rule in rules {
        let bucket = buckets.entry(rule.name.as_str()).or_default();
        if bucket.is_empty() {
            order.push(rule.name.as_str());
        }
        bucket.push(rule);
    }

    order
        .into_iter()
        .filter_map(|name| buckets.remove(name))
        .filter_map(|bucket| {
            let first = *bucket.first()?;
            let stack = first.rating.is_some() && is_stacking(&first.name);
            let rating = first.rating.map(|_| {
                let ratings = bucket.iter().filter_map(|rule| rule.rating);
                if stack {
                    ratings.sum::<i32>()
                } else {
                    ratings.max().unwrap_or_default()
                }
            });
            Some(GroupedRule {
                rule: SpecialRule {
                    rating,
                    ..first.clone()
                },
                count: if stack { 1 } else { bucket.len() },
            })
        })
        .collect()
}

/// Fold `incoming` into an existing instance of the same rule.
///
/// Modifying rules add their delta; otherwise stacking rules sum and all
/// others keep the higher rating.
pub fn merge_rating(existing: &mut SpecialRule, incoming: &SpecialRule) {
    let Some(delta) = incoming.rating else {
        return;
    };
    existing.rating = Some(match existing.rating {
        None => delta,
        Some(current) if incoming.modify || is_stacking(&existing.name) => current + delta,
        Some(current) => current.max(delta),
    });
}

/// Human-readable rule name, e.g. `2x Fear(3)`, `Defense +1`, `AP(+1) in melee`.
pub fn display_name(rule: &SpecialRule, count: Option<usize>) -> String {
    let count = match count {
        Some(count) if count > 1 => format!("{count}x "),
        _ => String::new(),
    };
    let rating = match rule.rating {
        Some(rating) if rule.name == "Defense" => format!(" +{rating}"),
        Some(rating) if rule.modify => format!("(+{rating})"),
        Some(rating) => format!("({rating})"),
        None => String::new(),
    };
    let condition = rule
        .condition
        .as_deref()
        .filter(|condition| !condition.is_empty())
        .map(|condition| format!(" {condition}"))
        .unwrap_or_default();
    format!("{count}{}{rating}{condition}", rule.name)
}

/// Explicit cache of game-system rule definitions.
///
/// Owned by the caller; reloading a catalogue should call [`RulesCache::invalidate`].
#[derive(Debug, Clone, Default)]
pub struct RulesCache {
    inner: Arc<RwLock<HashMap<GameSystem, Arc<Vec<RuleDefinition>>>>>,
}

impl RulesCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached definitions for a system.
    pub fn get(&self, system: GameSystem) -> Option<Arc<Vec<RuleDefinition>>> {
        self.inner.read().get(&system).cloned()
    }

    /// Store definitions for a system, replacing any previous entry.
    pub fn insert(&self, system: GameSystem, rules: Vec<RuleDefinition>) -> Arc<Vec<RuleDefinition>> {
        let rules = Arc::new(rules);
        self.inner.write().insert(system, rules.clone());
        rules
    }

    /// Drop the entry for a system.
    pub fn invalidate(&self, system: GameSystem) {
        self.inner.write().remove(&system);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Look up a rule by name, preferring faction definitions over the system's.
    pub fn lookup<'a>(
        &self,
        system: GameSystem,
        faction_rules: impl IntoIterator<Item = &'a RuleDefinition>,
        name: &str,
    ) -> Option<RuleDefinition> {
        if let Some(rule) = faction_rules.into_iter().find(|rule| rule.name == name) {
            return Some(rule.clone());
        }
        self.get(system)?
            .iter()
            .find(|rule| rule.name == name)
            .cloned()
    }
}
