//! Pipelined advancer: a shift register with one slot per stage.

use crate::core::{Cycle, ItemId, Model};
use crate::registry::Registry;
use std::collections::VecDeque;

/// Slot contents, index 0 = entry stage, last index = exit stage.
pub type PipelineSlots = Vec<Option<ItemId>>;

/// What one pipelined step did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStep {
    /// Item removed from the exit slot this cycle.
    pub exited: Option<ItemId>,
    /// Item placed into the entry slot this cycle.
    pub admitted: Option<ItemId>,
}

/// Pipelined model state: slot array, own backlog copy, exit-ordered completions.
#[derive(Clone, Debug)]
pub struct PipelinedAdvancer {
    slots: PipelineSlots,
    backlog: VecDeque<ItemId>,
    completed: Vec<ItemId>,
}

impl PipelinedAdvancer {
    pub fn new(stage_count: usize, backlog: VecDeque<ItemId>) -> Self {
        Self {
            slots: vec![None; stage_count],
            backlog,
            completed: Vec::new(),
        }
    }

    /// One cycle: retire the exit slot, shift toward the exit, admit into slot 0.
    pub fn step(&mut self, cycle: Cycle, registry: &mut Registry) -> PipelineStep {
        let mut outcome = PipelineStep::default();
        let exit = self.slots.len() - 1;

        // 1) Exit stage: record completion before the shift.
        if let Some(id) = self.slots[exit].take() {
            registry.get_mut(id).timing_mut(Model::Pipelined).record_end(cycle);
            self.completed.push(id);
            outcome.exited = Some(id);
            log::debug!("cycle {cycle}: {} left the pipeline", registry.get(id).id);
        }

        // 2) Shift every slot one stage toward the exit, empties included.
        for i in (1..=exit).rev() {
            self.slots[i] = self.slots[i - 1];
        }

        // 3) Entry stage: admit the backlog head, or leave a bubble.
        self.slots[0] = self.backlog.pop_front();
        if let Some(id) = self.slots[0] {
            registry.get_mut(id).timing_mut(Model::Pipelined).record_start(cycle);
            outcome.admitted = Some(id);
            log::debug!("cycle {cycle}: {} entered the pipeline", registry.get(id).id);
        }

        outcome
    }

    /// No backlog and every slot empty.
    pub fn is_drained(&self) -> bool {
        self.backlog.is_empty() && self.slots.iter().all(Option::is_none)
    }

    pub fn slots(&self) -> &[Option<ItemId>] {
        &self.slots
    }

    /// Stage currently holding `id`, if any.
    pub fn stage_of(&self, id: ItemId) -> Option<usize> {
        self.slots.iter().position(|slot| *slot == Some(id))
    }

    pub fn backlog(&self) -> &VecDeque<ItemId> {
        &self.backlog
    }

    /// Items in exit order.
    pub fn completed(&self) -> &[ItemId] {
        &self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageSet;

    fn registry(n: usize, stages: usize) -> Registry {
        let ids = crate::registry::generate_identifiers("T", n);
        Registry::initialize(ids, StageSet::with_count(stages).unwrap(), 20).unwrap()
    }

    #[test]
    fn shift_register_fills_then_drains() {
        let mut reg = registry(2, 3);
        let mut p = PipelinedAdvancer::new(3, reg.backlog());

        let s = p.step(1, &mut reg);
        assert_eq!(s.admitted, Some(ItemId(0)));
        assert_eq!(p.slots(), &[Some(ItemId(0)), None, None]);

        p.step(2, &mut reg);
        assert_eq!(p.slots(), &[Some(ItemId(1)), Some(ItemId(0)), None]);

        p.step(3, &mut reg);
        assert_eq!(p.slots(), &[None, Some(ItemId(1)), Some(ItemId(0))]);
        assert_eq!(p.stage_of(ItemId(0)), Some(2));

        let s = p.step(4, &mut reg);
        assert_eq!(s.exited, Some(ItemId(0)));
        assert_eq!(p.slots(), &[None, None, Some(ItemId(1))]);
        assert!(!p.is_drained());

        let s = p.step(5, &mut reg);
        assert_eq!(s.exited, Some(ItemId(1)));
        assert!(p.is_drained());
        assert_eq!(p.completed(), &[ItemId(0), ItemId(1)]);

        let t = reg.get(ItemId(1)).pipelined;
        assert_eq!((t.start, t.end), (Some(2), Some(5)));
    }

    #[test]
    fn single_stage_pipeline_exits_next_cycle() {
        let mut reg = registry(2, 1);
        let mut p = PipelinedAdvancer::new(1, reg.backlog());
        p.step(1, &mut reg);
        let s = p.step(2, &mut reg);
        assert_eq!(s.exited, Some(ItemId(0)));
        assert_eq!(s.admitted, Some(ItemId(1)));
        p.step(3, &mut reg);
        assert!(p.is_drained());
        assert_eq!(reg.get(ItemId(1)).pipelined.end, Some(3));
    }

    #[test]
    fn each_item_occupies_at_most_one_slot() {
        let mut reg = registry(6, 4);
        let mut p = PipelinedAdvancer::new(4, reg.backlog());
        for cycle in 1..=12 {
            p.step(cycle, &mut reg);
            let mut occupied: Vec<_> = p.slots().iter().flatten().collect();
            let before = occupied.len();
            occupied.sort();
            occupied.dedup();
            assert_eq!(before, occupied.len());
        }
    }
}
