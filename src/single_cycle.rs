//! Single-cycle advancer: one item owns the processor until its last stage.

use crate::core::{Cycle, ItemId, Model};
use crate::registry::Registry;
use serde::Serialize;
use std::collections::VecDeque;

/// The item holding the processor and the stage it is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SingleCycleCursor {
    pub item: ItemId,
    pub stage: usize,
}

/// What one single-cycle step did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SingleCycleStep {
    /// Item that held the processor during this cycle.
    pub occupant: Option<SingleCycleCursor>,
    pub admitted: Option<ItemId>,
    /// Item that finished its last stage this cycle.
    pub completed: Option<ItemId>,
}

#[derive(Clone, Debug)]
pub struct SingleCycleAdvancer {
    stage_count: usize,
    cursor: Option<SingleCycleCursor>,
    backlog: VecDeque<ItemId>,
    completed: Vec<ItemId>,
}

impl SingleCycleAdvancer {
    pub fn new(stage_count: usize, backlog: VecDeque<ItemId>) -> Self {
        Self {
            stage_count,
            cursor: None,
            backlog,
            completed: Vec::new(),
        }
    }

    /// One cycle. The current item moves to its next stage; an idle
    /// processor admits the backlog head at stage 0. An item occupying the
    /// last stage completes on this cycle and frees the processor for the
    /// next one.
    pub fn step(&mut self, cycle: Cycle, registry: &mut Registry) -> SingleCycleStep {
        let mut outcome = SingleCycleStep::default();

        if let Some(cursor) = self.cursor.as_mut() {
            cursor.stage += 1;
        }

        if self.cursor.is_none() {
            if let Some(item) = self.backlog.pop_front() {
                registry.get_mut(item).timing_mut(Model::SingleCycle).record_start(cycle);
                self.cursor = Some(SingleCycleCursor { item, stage: 0 });
                outcome.admitted = Some(item);
                log::debug!("cycle {cycle}: {} took the processor", registry.get(item).id);
            }
        }

        outcome.occupant = self.cursor;

        if let Some(cursor) = self.cursor {
            if cursor.stage + 1 >= self.stage_count {
                registry
                    .get_mut(cursor.item)
                    .timing_mut(Model::SingleCycle)
                    .record_end(cycle);
                self.completed.push(cursor.item);
                self.cursor = None;
                outcome.completed = Some(cursor.item);
                log::debug!("cycle {cycle}: {} finished all stages", registry.get(cursor.item).id);
            }
        }

        outcome
    }

    /// No backlog and no item holding the processor.
    pub fn is_drained(&self) -> bool {
        self.backlog.is_empty() && self.cursor.is_none()
    }

    pub fn cursor(&self) -> Option<SingleCycleCursor> {
        self.cursor
    }

    pub fn backlog(&self) -> &VecDeque<ItemId> {
        &self.backlog
    }

    /// Items in completion order (equal to admission order).
    pub fn completed(&self) -> &[ItemId] {
        &self.completed
    }
}
