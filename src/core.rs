//! Core model: cycles, item handles, execution models, and stage descriptors.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Global simulation cycle counter (discrete time, starts at 1).
pub type Cycle = u64;

/// Identifies a work item by its admission position within a run (0..N).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub usize);

/// Scheduling discipline an item flows through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    /// Every stage holds a different item; the stage array shifts once per cycle.
    Pipelined,
    /// One item owns the processor until it has passed every stage.
    SingleCycle,
}

impl Model {
    pub const ALL: [Model; 2] = [Model::Pipelined, Model::SingleCycle];
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Pipelined => write!(f, "Pipelined"),
            Model::SingleCycle => write!(f, "Single-cycle"),
        }
    }
}

/// One processing stage: short label for tables, long name for legends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub label: String,
    pub name: String,
}

impl Stage {
    pub fn new(label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            name: name.into(),
        }
    }
}

/// Ordered stages of a run; index 0 is the entry stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSet {
    stages: Vec<Stage>,
}

impl Default for StageSet {
    /// Classic five-stage RISC pipeline.
    fn default() -> Self {
        Self {
            stages: vec![
                Stage::new("IF", "Instruction Fetch"),
                Stage::new("ID", "Instruction Decode"),
                Stage::new("EX", "Execute"),
                Stage::new("MEM", "Memory Access"),
                Stage::new("WB", "Write Back"),
            ],
        }
    }
}

impl StageSet {
    pub fn new(stages: Vec<Stage>) -> Result<Self, ValidationError> {
        if stages.is_empty() {
            return Err(ValidationError::InvalidStageCount(0));
        }
        Ok(Self { stages })
    }

    /// `count` stages: the default set when it has that many, otherwise `S1..Sn`.
    pub fn with_count(count: usize) -> Result<Self, ValidationError> {
        if count == 0 {
            return Err(ValidationError::InvalidStageCount(0));
        }
        let default = Self::default();
        if default.len() == count {
            return Ok(default);
        }
        let stages = (1..=count)
            .map(|n| Stage::new(format!("S{n}"), format!("Stage {n}")))
            .collect();
        Ok(Self { stages })
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Index of the exit stage.
    pub fn last(&self) -> usize {
        self.stages.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    pub fn label(&self, index: usize) -> &str {
        self.stages.get(index).map_or("?", |s| s.label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }
}
