//! Cycle-stepped run: both models share one cycle counter and one item order.

use crate::config::SimConfig;
use crate::core::{Cycle, ItemId, Model, StageSet};
use crate::error::{IllegalStateError, Result, ValidationError};
use crate::metrics::Metrics;
use crate::pipeline::PipelinedAdvancer;
use crate::registry::{select_identifiers, Registry, WorkItem, DEFAULT_ID_PREFIX, DEFAULT_MAX_ITEMS};
use crate::single_cycle::SingleCycleAdvancer;
use crate::snapshot::{CycleSnapshot, ItemStatus, StatusRow};

/// Knobs that shape a run but not its scheduling rules.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub max_items: usize,
    pub id_prefix: String,
    pub record_history: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            record_history: true,
        }
    }
}

impl From<&SimConfig> for RunOptions {
    fn from(config: &SimConfig) -> Self {
        Self {
            max_items: config.max_items,
            id_prefix: config.id_prefix.clone(),
            record_history: config.record_history,
        }
    }
}

/// One simulation: registry, both advancers, the cycle counter, and history.
///
/// Every `advance_cycle` call commits fully before returning. Callers that
/// share a run across threads must serialize access themselves.
#[derive(Clone, Debug)]
pub struct Run {
    registry: Registry,
    pipeline: PipelinedAdvancer,
    single_cycle: SingleCycleAdvancer,
    /// Number of the next cycle to execute.
    cycle: Cycle,
    record_history: bool,
    history: Vec<CycleSnapshot>,
}

impl Run {
    /// Builds a run over exactly these identifiers.
    pub fn initialize(identifiers: Vec<String>, stage_count: usize) -> Result<Self> {
        let stages = StageSet::with_count(stage_count)?;
        Self::with_options(identifiers, stages, &RunOptions::default())
    }

    pub fn with_options(
        identifiers: Vec<String>,
        stages: StageSet,
        options: &RunOptions,
    ) -> Result<Self> {
        let registry = Registry::initialize(identifiers, stages, options.max_items)?;
        let stage_count = registry.stage_count();
        let run = Self {
            pipeline: PipelinedAdvancer::new(stage_count, registry.backlog()),
            single_cycle: SingleCycleAdvancer::new(stage_count, registry.backlog()),
            registry,
            cycle: 1,
            record_history: options.record_history,
            history: Vec::new(),
        };
        log::info!(
            "Starting run: {} items through {} stages",
            run.registry.len(),
            stage_count
        );
        Ok(run)
    }

    /// Picks `desired_count` identifiers (generating them when none are
    /// given) and builds the run.
    pub fn start(
        identifiers: Vec<String>,
        desired_count: usize,
        stages: StageSet,
        options: &RunOptions,
    ) -> Result<Self> {
        if desired_count == 0 {
            return Err(ValidationError::NoItems.into());
        }
        if desired_count > options.max_items {
            return Err(ValidationError::TooManyItems {
                count: desired_count,
                max: options.max_items,
            }
            .into());
        }
        let identifiers = select_identifiers(identifiers, desired_count, &options.id_prefix)?;
        Self::with_options(identifiers, stages, options)
    }

    /// Advances both models by one cycle and returns what they held.
    pub fn advance_cycle(&mut self) -> Result<CycleSnapshot> {
        if self.is_complete() {
            return Err(IllegalStateError::RunComplete {
                cycle: self.cycles_elapsed(),
            }
            .into());
        }

        let cycle = self.cycle;
        let p = self.pipeline.step(cycle, &mut self.registry);
        let s = self.single_cycle.step(cycle, &mut self.registry);

        let snapshot = CycleSnapshot {
            cycle,
            pipeline: self.pipeline.slots().to_vec(),
            single_cycle: s.occupant,
            pipelined_exited: p.exited,
            single_cycle_completed: s.completed,
            rows: self.status_rows(s.occupant.map(|c| (c.item, c.stage))),
        };
        log::trace!("{:?}", snapshot);

        self.cycle += 1;
        if self.record_history {
            self.history.push(snapshot.clone());
        }
        if self.is_complete() {
            log::info!("Run complete after {} cycles", self.cycles_elapsed());
        }
        Ok(snapshot)
    }

    fn status_rows(&self, occupant: Option<(ItemId, usize)>) -> Vec<StatusRow> {
        self.registry
            .items()
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let id = ItemId(i);
                let pipelined = match self.pipeline.stage_of(id) {
                    Some(stage) => ItemStatus::InStage(stage),
                    None => Self::idle_status(item, Model::Pipelined),
                };
                let single_cycle = match occupant {
                    Some((current, stage)) if current == id => ItemStatus::InStage(stage),
                    _ => Self::idle_status(item, Model::SingleCycle),
                };
                StatusRow {
                    item: id,
                    pipelined,
                    single_cycle,
                }
            })
            .collect()
    }

    fn idle_status(item: &WorkItem, model: Model) -> ItemStatus {
        if item.timing(model).is_finished() {
            ItemStatus::Completed
        } else {
            ItemStatus::Waiting
        }
    }

    pub fn is_drained(&self, model: Model) -> bool {
        match model {
            Model::Pipelined => self.pipeline.is_drained(),
            Model::SingleCycle => self.single_cycle.is_drained(),
        }
    }

    /// Both models have no work left.
    pub fn is_complete(&self) -> bool {
        self.pipeline.is_drained() && self.single_cycle.is_drained()
    }

    /// Advance until complete; returns the snapshots produced.
    pub fn run_to_completion(&mut self) -> Vec<CycleSnapshot> {
        let mut snapshots = Vec::new();
        while let Ok(snapshot) = self.advance_cycle() {
            snapshots.push(snapshot);
        }
        snapshots
    }

    pub fn metrics(&self) -> Result<Metrics> {
        if !self.is_complete() {
            return Err(IllegalStateError::RunNotComplete.into());
        }
        Ok(Metrics::compute(self.registry.items(), self.registry.stage_count())?)
    }

    /// Back to the freshly-initialized state: same items, no history.
    pub fn reset(&mut self) {
        self.registry.clear_timing();
        let stage_count = self.registry.stage_count();
        self.pipeline = PipelinedAdvancer::new(stage_count, self.registry.backlog());
        self.single_cycle = SingleCycleAdvancer::new(stage_count, self.registry.backlog());
        self.cycle = 1;
        self.history.clear();
        log::debug!("Run reset");
    }

    /// Number of the next cycle to execute.
    pub fn current_cycle(&self) -> Cycle {
        self.cycle
    }

    pub fn cycles_elapsed(&self) -> Cycle {
        self.cycle - 1
    }

    pub fn items(&self) -> &[WorkItem] {
        self.registry.items()
    }

    /// `None` for an id that does not belong to this run.
    pub fn item(&self, id: ItemId) -> Option<&WorkItem> {
        self.registry.items().get(id.0)
    }

    pub fn find(&self, id: &str) -> Option<ItemId> {
        self.registry.find(id)
    }

    pub fn stages(&self) -> &StageSet {
        self.registry.stages()
    }

    pub fn stage_count(&self) -> usize {
        self.registry.stage_count()
    }

    /// Items in completion order for `model`.
    pub fn completed(&self, model: Model) -> &[ItemId] {
        match model {
            Model::Pipelined => self.pipeline.completed(),
            Model::SingleCycle => self.single_cycle.completed(),
        }
    }

    pub fn history(&self) -> &[CycleSnapshot] {
        &self.history
    }
}

/// Validates inputs and builds a fresh run with default options.
pub fn start_run(identifiers: Vec<String>, desired_count: usize, stage_count: usize) -> Result<Run> {
    let stages = StageSet::with_count(stage_count)?;
    Run::start(identifiers, desired_count, stages, &RunOptions::default())
}

pub fn advance_cycle(run: &mut Run) -> Result<CycleSnapshot> {
    run.advance_cycle()
}

pub fn is_run_complete(run: &Run) -> bool {
    run.is_complete()
}

pub fn compute_metrics(run: &Run) -> Result<Metrics> {
    run.metrics()
}
