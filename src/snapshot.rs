//! Per-cycle snapshots handed to the presentation layer.

use crate::core::{Cycle, ItemId, Model};
use crate::single_cycle::SingleCycleCursor;
use serde::Serialize;
use std::fmt;

/// Where an item stands in one model at the end of a cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ItemStatus {
    /// Still in the backlog.
    Waiting,
    /// Occupying the given stage index.
    InStage(usize),
    Completed,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::Waiting => write!(f, "waiting"),
            ItemStatus::InStage(stage) => write!(f, "stage {stage}"),
            ItemStatus::Completed => write!(f, "done"),
        }
    }
}

/// One row of the cycle-by-item table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StatusRow {
    pub item: ItemId,
    pub pipelined: ItemStatus,
    pub single_cycle: ItemStatus,
}

/// State of both models during one cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CycleSnapshot {
    pub cycle: Cycle,
    /// Pipeline slot contents after the shift, index 0 = entry stage.
    pub pipeline: Vec<Option<ItemId>>,
    /// Item that held the single-cycle processor during this cycle.
    pub single_cycle: Option<SingleCycleCursor>,
    pub pipelined_exited: Option<ItemId>,
    pub single_cycle_completed: Option<ItemId>,
    /// Status of every item in admission order.
    pub rows: Vec<StatusRow>,
}

impl CycleSnapshot {
    pub fn status(&self, item: ItemId, model: Model) -> Option<ItemStatus> {
        let row = self.rows.get(item.0)?;
        Some(match model {
            Model::Pipelined => row.pipelined,
            Model::SingleCycle => row.single_cycle,
        })
    }

    /// Number of items inside the pipeline this cycle.
    pub fn pipeline_occupancy(&self) -> usize {
        self.pipeline.iter().flatten().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lookup_by_model() {
        let snap = CycleSnapshot {
            cycle: 2,
            pipeline: vec![Some(ItemId(1)), Some(ItemId(0)), None],
            single_cycle: Some(SingleCycleCursor { item: ItemId(0), stage: 1 }),
            pipelined_exited: None,
            single_cycle_completed: None,
            rows: vec![
                StatusRow {
                    item: ItemId(0),
                    pipelined: ItemStatus::InStage(1),
                    single_cycle: ItemStatus::InStage(1),
                },
                StatusRow {
                    item: ItemId(1),
                    pipelined: ItemStatus::InStage(0),
                    single_cycle: ItemStatus::Waiting,
                },
            ],
        };
        assert_eq!(snap.status(ItemId(1), Model::SingleCycle), Some(ItemStatus::Waiting));
        assert_eq!(snap.status(ItemId(1), Model::Pipelined), Some(ItemStatus::InStage(0)));
        assert_eq!(snap.status(ItemId(5), Model::Pipelined), None);
        assert_eq!(snap.pipeline_occupancy(), 2);
        assert_eq!(ItemStatus::Completed.to_string(), "done");
    }
}
