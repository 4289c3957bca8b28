//! Item registry: the ordered work items of a run and their per-model timing.

use crate::core::{Cycle, ItemId, Model, StageSet};
use crate::error::ValidationError;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

/// Largest run accepted when no configuration says otherwise.
pub const DEFAULT_MAX_ITEMS: usize = 20;

/// Prefix for generated identifiers (`SH-001`, `SH-002`, ...).
pub const DEFAULT_ID_PREFIX: &str = "SH";

/// Start/end cycle of one item under one model. Each field is written once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ItemTiming {
    pub start: Option<Cycle>,
    pub end: Option<Cycle>,
}

impl ItemTiming {
    /// Records the admission cycle unless one is already set.
    pub fn record_start(&mut self, cycle: Cycle) {
        if self.start.is_none() {
            self.start = Some(cycle);
        }
    }

    pub fn record_end(&mut self, cycle: Cycle) {
        debug_assert!(self.end.is_none(), "end cycle recorded twice");
        if self.end.is_none() {
            self.end = Some(cycle);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.end.is_some()
    }

    /// Inclusive cycle count from admission to completion.
    pub fn latency(&self) -> Option<Cycle> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(end - start + 1),
            _ => None,
        }
    }
}

/// A single work item (an instruction, drawn as a car on the assembly line).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorkItem {
    pub id: String,
    pub pipelined: ItemTiming,
    pub single_cycle: ItemTiming,
}

impl WorkItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pipelined: ItemTiming::default(),
            single_cycle: ItemTiming::default(),
        }
    }

    pub fn timing(&self, model: Model) -> &ItemTiming {
        match model {
            Model::Pipelined => &self.pipelined,
            Model::SingleCycle => &self.single_cycle,
        }
    }

    pub fn timing_mut(&mut self, model: Model) -> &mut ItemTiming {
        match model {
            Model::Pipelined => &mut self.pipelined,
            Model::SingleCycle => &mut self.single_cycle,
        }
    }

    fn clear_timing(&mut self) {
        self.pipelined = ItemTiming::default();
        self.single_cycle = ItemTiming::default();
    }
}

/// Insertion-ordered items of one run. Membership is fixed once built.
#[derive(Clone, Debug)]
pub struct Registry {
    items: Vec<WorkItem>,
    stages: StageSet,
}

impl Registry {
    /// Builds one item per identifier, in order, with no timing recorded.
    pub fn initialize(
        identifiers: Vec<String>,
        stages: StageSet,
        max_items: usize,
    ) -> Result<Self, ValidationError> {
        if identifiers.is_empty() {
            return Err(ValidationError::NoItems);
        }
        if identifiers.len() > max_items {
            return Err(ValidationError::TooManyItems {
                count: identifiers.len(),
                max: max_items,
            });
        }
        if stages.is_empty() {
            return Err(ValidationError::InvalidStageCount(0));
        }

        let mut seen = HashSet::with_capacity(identifiers.len());
        for (position, id) in identifiers.iter().enumerate() {
            if id.trim().is_empty() {
                return Err(ValidationError::EmptyIdentifier { position });
            }
            if !seen.insert(id.as_str()) {
                return Err(ValidationError::DuplicateIdentifier(id.clone()));
            }
        }

        let items = identifiers.into_iter().map(WorkItem::new).collect();
        Ok(Self { items, stages })
    }

    /// A fresh backlog holding every item in admission order.
    pub fn backlog(&self) -> VecDeque<ItemId> {
        (0..self.items.len()).map(ItemId).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn stages(&self) -> &StageSet {
        &self.stages
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this registry.
    pub fn get(&self, id: ItemId) -> &WorkItem {
        &self.items[id.0]
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this registry.
    pub fn get_mut(&mut self, id: ItemId) -> &mut WorkItem {
        &mut self.items[id.0]
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    /// Looks an item up by its identifier string.
    pub fn find(&self, id: &str) -> Option<ItemId> {
        self.items.iter().position(|item| item.id == id).map(ItemId)
    }

    /// Forgets all recorded timing; membership and order are unchanged.
    pub(crate) fn clear_timing(&mut self) {
        for item in &mut self.items {
            item.clear_timing();
        }
    }
}

/// `prefix-001 .. prefix-NNN`.
pub fn generate_identifiers(prefix: &str, count: usize) -> Vec<String> {
    (1..=count).map(|n| format!("{prefix}-{n:03}")).collect()
}

/// Chooses the identifiers for a run of `desired_count` items.
///
/// No identifiers means generated ones. Fewer than `desired_count` is an
/// error; surplus identifiers past `desired_count` are ignored.
pub fn select_identifiers(
    identifiers: Vec<String>,
    desired_count: usize,
    prefix: &str,
) -> Result<Vec<String>, ValidationError> {
    if identifiers.is_empty() {
        return Ok(generate_identifiers(prefix, desired_count));
    }
    if identifiers.len() < desired_count {
        return Err(ValidationError::InsufficientIdentifiers {
            needed: desired_count,
            supplied: identifiers.len(),
        });
    }
    let mut identifiers = identifiers;
    identifiers.truncate(desired_count);
    Ok(identifiers)
}

/// Splits `"A, B,,C"` into `["A", "B", "C"]`.
pub fn parse_identifier_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn initialize_preserves_order_and_leaves_timing_unset() {
        let r = Registry::initialize(ids(&["A", "B", "C"]), StageSet::default(), 20).unwrap();
        assert_eq!(r.len(), 3);
        assert_eq!(r.stage_count(), 5);
        assert_eq!(r.get(ItemId(1)).id, "B");
        assert!(r.items().iter().all(|i| i.pipelined == ItemTiming::default()));
        assert_eq!(r.backlog(), VecDeque::from(vec![ItemId(0), ItemId(1), ItemId(2)]));
        assert_eq!(r.find("C"), Some(ItemId(2)));
        assert_eq!(r.find("Z"), None);
    }

    #[test]
    fn initialize_rejects_bad_cardinality() {
        assert_eq!(
            Registry::initialize(Vec::new(), StageSet::default(), 20).unwrap_err(),
            ValidationError::NoItems
        );
        let many = generate_identifiers("X", 21);
        assert_eq!(
            Registry::initialize(many, StageSet::default(), 20).unwrap_err(),
            ValidationError::TooManyItems { count: 21, max: 20 }
        );
    }

    #[test]
    fn initialize_rejects_duplicates_and_blanks() {
        assert_eq!(
            Registry::initialize(ids(&["A", "B", "A"]), StageSet::default(), 20).unwrap_err(),
            ValidationError::DuplicateIdentifier("A".into())
        );
        assert_eq!(
            Registry::initialize(ids(&["A", " "]), StageSet::default(), 20).unwrap_err(),
            ValidationError::EmptyIdentifier { position: 1 }
        );
    }

    #[test]
    fn timing_start_is_never_overwritten() {
        let mut t = ItemTiming::default();
        t.record_start(3);
        t.record_start(7);
        assert_eq!(t.start, Some(3));
        assert_eq!(t.latency(), None);
        t.record_end(8);
        assert_eq!(t.latency(), Some(6));
    }

    #[test]
    fn generated_identifiers_are_zero_padded() {
        assert_eq!(generate_identifiers("SH", 3), ids(&["SH-001", "SH-002", "SH-003"]));
    }

    #[test]
    fn select_identifiers_rules() {
        assert_eq!(select_identifiers(Vec::new(), 2, "SH").unwrap(), ids(&["SH-001", "SH-002"]));
        assert_eq!(
            select_identifiers(ids(&["X", "Y"]), 5, "SH").unwrap_err(),
            ValidationError::InsufficientIdentifiers { needed: 5, supplied: 2 }
        );
        assert_eq!(select_identifiers(ids(&["X", "Y", "Z"]), 2, "SH").unwrap(), ids(&["X", "Y"]));
    }

    #[test]
    fn parse_identifier_list_trims_and_drops_blanks() {
        assert_eq!(parse_identifier_list(" A, B,, C ,"), ids(&["A", "B", "C"]));
        assert!(parse_identifier_list("  ").is_empty());
    }
}
