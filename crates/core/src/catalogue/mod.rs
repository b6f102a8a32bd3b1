//! Loaded catalogue: army books indexed for unit and upgrade lookups.

mod normalize;

use std::{collections::HashMap, sync::Arc};

use tracing::{debug, warn};

use crate::models::{
    ArmyBook, GameSystem, RuleDefinition, UnitDefinition, UpgradeOption, UpgradeSection,
};

pub use normalize::{decorate, normalize_army_book, TRANSIENT_FIELDS};

/// Book-level metadata kept after indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookInfo {
    /// Army book uid.
    pub uid: String,
    /// Army book name.
    pub name: String,
    /// Faction the book belongs to.
    pub faction_name: Option<String>,
    /// Faction-specific rule definitions.
    pub special_rules: Vec<RuleDefinition>,
}

/// Normalized army books with shared unit definitions and sections.
///
/// Definitions and sections are created once per load and shared by
/// reference with every unit instance built from them.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    game_system: Option<GameSystem>,
    books: Vec<BookInfo>,
    units: Vec<Arc<UnitDefinition>>,
    sections: Vec<Arc<UpgradeSection>>,
    section_index: HashMap<String, usize>,
    packages: HashMap<String, Vec<usize>>,
}

impl Catalogue {
    /// Index already-normalized army books.
    pub fn new(game_system: Option<GameSystem>, books: Vec<ArmyBook>) -> Self {
        let mut catalogue = Self {
            game_system,
            ..Self::default()
        };
        for book in books {
            catalogue.add_book(book);
        }
        catalogue
    }

    fn add_book(&mut self, book: ArmyBook) {
        debug!(
            "indexing army book {} ({} units, {} packages)",
            book.uid,
            book.units.len(),
            book.upgrade_packages.len()
        );
        if self.books.iter().any(|existing| existing.uid == book.uid) {
            warn!("army book {} loaded twice; keeping the first copy", book.uid);
            return;
        }

        for package in book.upgrade_packages {
            let mut members = Vec::with_capacity(package.sections.len());
            for section in package.sections {
                let index = match self.section_index.get(&section.uid) {
                    Some(index) => {
                        warn!("duplicate upgrade section {}; keeping the first", section.uid);
                        *index
                    }
                    None => {
                        let index = self.sections.len();
                        self.section_index.insert(section.uid.clone(), index);
                        self.sections.push(Arc::new(section));
                        index
                    }
                };
                members.push(index);
            }
            self.packages.insert(package.uid, members);
        }

        let book_index = self.books.len();
        self.units.extend(book.units.into_iter().map(|mut unit| {
            unit.book_index = book_index;
            Arc::new(unit)
        }));
        self.books.push(BookInfo {
            uid: book.uid,
            name: book.name,
            faction_name: book.faction_name,
            special_rules: book.special_rules,
        });
    }

    /// Game system the books were loaded for.
    pub fn game_system(&self) -> Option<GameSystem> {
        self.game_system
    }

    /// Loaded books in load order.
    pub fn books(&self) -> &[BookInfo] {
        &self.books
    }

    /// Book metadata by uid.
    pub fn book(&self, uid: &str) -> Option<&BookInfo> {
        self.books.iter().find(|book| book.uid == uid)
    }

    /// Uids of the loaded books.
    pub fn army_ids(&self) -> impl Iterator<Item = &str> {
        self.books.iter().map(|book| book.uid.as_str())
    }

    /// Every unit definition across books.
    pub fn units(&self) -> &[Arc<UnitDefinition>] {
        &self.units
    }

    /// Find a unit definition, optionally restricted to one army book.
    pub fn unit(&self, army_id: Option<&str>, unit_id: &str) -> Option<&Arc<UnitDefinition>> {
        self.units.iter().find(|unit| {
            unit.id == unit_id && army_id.map_or(true, |army_id| unit.army_id == army_id)
        })
    }

    /// Upgrade section by uid.
    pub fn section(&self, uid: &str) -> Option<&Arc<UpgradeSection>> {
        self.section_index
            .get(uid)
            .and_then(|index| self.sections.get(*index))
    }

    /// Find an option by id across every section, with the section that owns it.
    pub fn option(&self, option_id: &str) -> Option<(&Arc<UpgradeSection>, &UpgradeOption)> {
        self.sections.iter().find_map(|section| {
            section
                .option(option_id)
                .map(|option| (section, option))
        })
    }

    /// Sections offered to a unit, ordered by priority, then package order,
    /// then position within the package.
    pub fn sections_for_unit(&self, definition: &UnitDefinition) -> Vec<Arc<UpgradeSection>> {
        let mut sections: Vec<Arc<UpgradeSection>> = Vec::new();
        for uid in &definition.upgrades {
            let Some(members) = self.packages.get(uid) else {
                warn!("unit {} references unknown upgrade package {uid}", definition.id);
                continue;
            };
            sections.extend(
                members
                    .iter()
                    .filter_map(|index| self.sections.get(*index))
                    .cloned(),
            );
        }
        sections.sort_by_key(|section| section.priority);
        sections
    }

    /// Faction rule definitions of every loaded book.
    pub fn faction_rules(&self) -> impl Iterator<Item = &RuleDefinition> {
        self.books.iter().flat_map(|book| book.special_rules.iter())
    }
}

#[cfg(test)]
mod tests {
    use crate::fixtures;

    #[test]
    fn indexes_units_and_sections() {
        let catalogue = fixtures::catalogue();
        assert_eq!(catalogue.books().len(), 1);
        let warriors = catalogue
            .unit(Some(fixtures::ARMY_ID), "warriors")
            .expect("warriors should be indexed");
        assert_eq!(warriors.sort_id, 0);
        assert!(catalogue.section("replace-sword").is_some());

        let (section, option) = catalogue.option("axe").expect("axe option");
        assert_eq!(section.uid, "replace-sword");
        assert_eq!(option.parent_section_id, "replace-sword");
    }

    #[test]
    fn orders_sections_by_priority() {
        let catalogue = fixtures::catalogue();
        let champion = catalogue
            .unit(None, "champion")
            .expect("champion should be indexed");
        let order: Vec<_> = catalogue
            .sections_for_unit(champion)
            .iter()
            .map(|section| section.uid.clone())
            .collect();
        assert_eq!(order.first().map(String::as_str), Some("hero-upgrades"));
    }
}
