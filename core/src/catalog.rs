use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

pub const LEVEL_EXTENSION: &str = ".map";

/// Ordered set of level names with an optional current selection. Hosts fill
/// it from whatever storage they scan.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCatalog {
    names: Vec<String>,
    current: Option<usize>,
}

impl LevelCatalog {
    /// Keeps names ending in `.map`, sorted and without duplicates.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names
            .into_iter()
            .map(Into::into)
            .filter(|name| name.ends_with(LEVEL_EXTENSION))
            .collect();
        names.sort();
        names.dedup();
        Self {
            names,
            current: None,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn current(&self) -> Option<&str> {
        self.current.map(|index| self.names[index].as_str())
    }

    /// Selects `name`, returning whether it is part of the catalog. An unknown
    /// name clears the selection.
    pub fn select(&mut self, name: &str) -> bool {
        self.current = self.names.iter().position(|known| known == name);
        self.current.is_some()
    }

    pub fn select_first(&mut self) -> Option<&str> {
        self.current = (!self.names.is_empty()).then_some(0);
        self.current()
    }

    /// Moves to the following level. Past the end, or without a selection,
    /// the selection is cleared.
    pub fn next_level(&mut self) -> Option<&str> {
        self.current = self
            .current
            .map(|index| index + 1)
            .filter(|&index| index < self.names.len());
        self.current()
    }

    pub fn clear_selection(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> LevelCatalog {
        LevelCatalog::new(["b.map", "notes.txt", "a.map", "c.map", "a.map"])
    }

    #[test]
    fn names_are_filtered_sorted_and_unique() {
        assert_eq!(catalog().names(), ["a.map", "b.map", "c.map"]);
    }

    #[test]
    fn next_level_walks_in_order() {
        let mut catalog = catalog();
        assert!(catalog.select("b.map"));

        assert_eq!(catalog.next_level(), Some("c.map"));
        assert_eq!(catalog.next_level(), None);
        assert_eq!(catalog.current(), None);
        assert_eq!(catalog.next_level(), None);
    }

    #[test]
    fn unknown_selection_clears() {
        let mut catalog = catalog();
        catalog.select_first();
        assert_eq!(catalog.current(), Some("a.map"));

        assert!(!catalog.select("missing.map"));
        assert_eq!(catalog.current(), None);
    }

    #[test]
    fn empty_catalog_has_nothing_to_select() {
        let mut catalog = LevelCatalog::new(Vec::<String>::new());
        assert_eq!(catalog.select_first(), None);
        assert!(catalog.is_empty());
    }
}
