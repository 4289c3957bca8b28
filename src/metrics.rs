//! Metrics: per-item latency and speedup, per-model makespan and throughput.

use crate::core::{Cycle, Model};
use crate::error::IllegalStateError;
use crate::registry::{ItemTiming, WorkItem};
use serde::Serialize;
use std::fmt;

/// Timing and derived figures for one item.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ItemMetrics {
    pub id: String,
    pub pipelined_start: Cycle,
    pub pipelined_end: Cycle,
    pub single_cycle_start: Cycle,
    pub single_cycle_end: Cycle,
    pub pipelined_latency: Cycle,
    pub single_cycle_latency: Cycle,
    /// single-cycle end / pipelined end.
    pub speedup: f64,
}

/// Aggregates for one model.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelMetrics {
    pub average_latency: f64,
    /// End cycle of the last admitted item.
    pub makespan: Cycle,
    /// Items per cycle.
    pub throughput: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Metrics {
    pub item_count: usize,
    pub stage_count: usize,
    pub items: Vec<ItemMetrics>,
    pub pipelined: ModelMetrics,
    pub single_cycle: ModelMetrics,
    /// single-cycle makespan / pipelined makespan.
    pub overall_speedup: f64,
}

fn finished(item: &WorkItem, timing: &ItemTiming) -> Result<(Cycle, Cycle), IllegalStateError> {
    match (timing.start, timing.end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(IllegalStateError::MissingTiming(item.id.clone())),
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}

impl Metrics {
    /// Derives all figures from fully-timed items in admission order.
    pub fn compute(items: &[WorkItem], stage_count: usize) -> Result<Self, IllegalStateError> {
        if items.is_empty() {
            return Err(IllegalStateError::RunNotComplete);
        }

        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let (p_start, p_end) = finished(item, &item.pipelined)?;
            let (s_start, s_end) = finished(item, &item.single_cycle)?;
            rows.push(ItemMetrics {
                id: item.id.clone(),
                pipelined_start: p_start,
                pipelined_end: p_end,
                single_cycle_start: s_start,
                single_cycle_end: s_end,
                pipelined_latency: p_end - p_start + 1,
                single_cycle_latency: s_end - s_start + 1,
                speedup: ratio(s_end as f64, p_end as f64),
            });
        }

        let pipelined = Self::aggregate(&rows, Model::Pipelined);
        let single_cycle = Self::aggregate(&rows, Model::SingleCycle);
        let overall_speedup = ratio(single_cycle.makespan as f64, pipelined.makespan as f64);

        Ok(Self {
            item_count: rows.len(),
            stage_count,
            items: rows,
            pipelined,
            single_cycle,
            overall_speedup,
        })
    }

    fn aggregate(rows: &[ItemMetrics], model: Model) -> ModelMetrics {
        let span = |r: &ItemMetrics| match model {
            Model::Pipelined => (r.pipelined_latency, r.pipelined_end),
            Model::SingleCycle => (r.single_cycle_latency, r.single_cycle_end),
        };
        let total: Cycle = rows.iter().map(|r| span(r).0).sum();
        // Last admitted, not last completed.
        let makespan = rows.last().map_or(0, |r| span(r).1);
        ModelMetrics {
            average_latency: ratio(total as f64, rows.len() as f64),
            makespan,
            throughput: ratio(rows.len() as f64, makespan as f64),
        }
    }

    pub fn model(&self, model: Model) -> &ModelMetrics {
        match model {
            Model::Pipelined => &self.pipelined,
            Model::SingleCycle => &self.single_cycle,
        }
    }

    pub fn item(&self, id: &str) -> Option<&ItemMetrics> {
        self.items.iter().find(|m| m.id == id)
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<10} {:>7} {:>7} {:>7} {:>7} {:>8}",
            "item", "p.start", "p.end", "s.start", "s.end", "speedup"
        )?;
        for r in &self.items {
            writeln!(
                f,
                "{:<10} {:>7} {:>7} {:>7} {:>7} {:>8.2}",
                r.id, r.pipelined_start, r.pipelined_end, r.single_cycle_start, r.single_cycle_end, r.speedup
            )?;
        }
        for model in Model::ALL {
            let m = self.model(model);
            writeln!(
                f,
                "{:<13} avg latency {:>6.2}  makespan {:>4}  throughput {:.2} items/cycle",
                model.to_string(),
                m.average_latency,
                m.makespan,
                m.throughput
            )?;
        }
        write!(f, "Overall speedup: {:.2}x", self.overall_speedup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, p: (Cycle, Cycle), s: (Cycle, Cycle)) -> WorkItem {
        let mut w = WorkItem::new(id);
        w.pipelined = ItemTiming { start: Some(p.0), end: Some(p.1) };
        w.single_cycle = ItemTiming { start: Some(s.0), end: Some(s.1) };
        w
    }

    #[test]
    fn metrics_five_stage_three_items() {
        let items = vec![
            item("A", (1, 6), (1, 5)),
            item("B", (2, 7), (6, 10)),
            item("C", (3, 8), (11, 15)),
        ];
        let m = Metrics::compute(&items, 5).unwrap();
        assert!((m.item("C").unwrap().speedup - 1.875).abs() < 1e-9);
        assert_eq!(m.items[0].pipelined_latency, 6);
        assert_eq!(m.items[0].single_cycle_latency, 5);
        assert_eq!(m.pipelined.makespan, 8);
        assert_eq!(m.single_cycle.makespan, 15);
        assert!((m.pipelined.average_latency - 6.0).abs() < 1e-9);
        assert!((m.single_cycle.throughput - 0.2).abs() < 1e-9);
        assert!((m.pipelined.throughput - 3.0 / 8.0).abs() < 1e-9);
        assert!((m.overall_speedup - 15.0 / 8.0).abs() < 1e-9);
    }

    #[test]
    fn makespan_uses_last_admitted_item() {
        let items = vec![item("A", (1, 9), (1, 4)), item("B", (2, 5), (5, 8))];
        let m = Metrics::compute(&items, 4).unwrap();
        assert_eq!(m.pipelined.makespan, 5);
    }

    #[test]
    fn missing_timing_is_rejected() {
        let mut items = vec![item("A", (1, 6), (1, 5))];
        items.push(WorkItem::new("B"));
        assert_eq!(
            Metrics::compute(&items, 5),
            Err(IllegalStateError::MissingTiming("B".into()))
        );
        assert_eq!(Metrics::compute(&[], 5), Err(IllegalStateError::RunNotComplete));
    }

    #[test]
    fn display_lists_every_item() {
        let items = vec![item("A", (1, 2), (1, 1))];
        let text = Metrics::compute(&items, 1).unwrap().to_string();
        assert!(text.contains("A"));
        assert!(text.contains("Overall speedup: 0.50x"));
    }
}
