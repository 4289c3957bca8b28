//! Pipelining by analogy: work items flow through a fixed sequence of stages
//! under a pipelined model and a single-cycle model, stepped one cycle at a
//! time, with comparative latency, throughput, and speedup metrics.

pub mod config;
pub mod core;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod registry;
pub mod simulator;
pub mod single_cycle;
pub mod snapshot;

pub use crate::core::{Cycle, ItemId, Model, Stage, StageSet};
pub use error::{Error, ErrorKind, IllegalStateError, Result, ValidationError};
pub use metrics::Metrics;
pub use simulator::{advance_cycle, compute_metrics, is_run_complete, start_run, Run, RunOptions};
pub use snapshot::{CycleSnapshot, ItemStatus};
