use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{ModelOutcome, SolveStatus};
use crate::pattern::CuttingPattern;
use crate::types::{Material, Piece};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub id: String,
    pub status: SolveStatus,
    /// Total wasted area of the chosen plan; `None` when no plan was found.
    pub waste: Option<f64>,
    /// Seconds spent generating, modelling and solving.
    pub time: f64,
    pub patterns_used: u64,
    pub instructions: Vec<String>,
    pub summary: Summary,
    pub unmet_demand: Vec<UnmetDemand>,
    pub error: Option<String>,
}

impl OptimizationResult {
    pub fn is_success(&self) -> bool {
        self.status.has_solution() && self.unmet_demand.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub total_material_area: f64,
    pub total_pieces_area: f64,
    pub material_utilization_pct: f64,
    pub waste_pct: f64,
    pub used_patterns: Vec<UsedPattern>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsedPattern {
    pub pattern_id: usize,
    pub count: u64,
    pub material_name: String,
    pub waste_per_unit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmetDemand {
    pub piece_id: u32,
    pub name: String,
    pub demand: u32,
    pub supplied: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_optimizations: u64,
    pub avg_waste: f64,
    pub avg_time: f64,
}

/// Process-wide running means over every reported solve.
///
/// Created once and shared through `Arc`; updates are serialized by the lock.
#[derive(Debug, Default)]
pub struct RunningStats {
    inner: Mutex<StatsSnapshot>,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, waste: f64, time: f64) -> StatsSnapshot {
        let mut stats = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        stats.total_optimizations += 1;
        let n = stats.total_optimizations as f64;
        stats.avg_waste = (stats.avg_waste * (n - 1.0) + waste) / n;
        stats.avg_time = (stats.avg_time * (n - 1.0) + time) / n;
        *stats
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Everything the reporter needs from one solve.
pub struct SolvedPlan<'a> {
    pub patterns: &'a [CuttingPattern],
    pub pieces: &'a [Arc<Piece>],
    pub materials: &'a [Arc<Material>],
    pub outcome: &'a ModelOutcome,
    /// Status reported to the caller; differs from `outcome.status` when the
    /// plan comes from the shortfall model.
    pub status: SolveStatus,
    pub error: Option<String>,
    pub elapsed: Duration,
}

pub struct SolutionReporter {
    stats: Arc<RunningStats>,
}

impl SolutionReporter {
    pub fn new(stats: Arc<RunningStats>) -> Self {
        Self { stats }
    }

    pub fn report(&self, plan: SolvedPlan<'_>) -> OptimizationResult {
        let mut patterns_used = 0;
        let mut used_patterns = Vec::new();
        let mut instructions = Vec::new();

        for (idx, pattern) in plan.patterns.iter().enumerate() {
            let count = plan.outcome.rounded_usage(idx);
            if count == 0 {
                continue;
            }
            patterns_used += count;
            used_patterns.push(UsedPattern {
                pattern_id: pattern.id,
                count,
                material_name: pattern.material.name.clone(),
                waste_per_unit: pattern.waste,
            });
            // Listed once per pattern, not once per cut unit.
            instructions.extend(pattern.placements.iter().map(|p| {
                let mut line = format!("Cut {} at ({:.1}, {:.1})", p.piece.name, p.x, p.y);
                if p.rotated {
                    line.push_str(" (rotated)");
                }
                line
            }));
        }

        let unmet_demand = unmet_demand(plan.patterns, plan.pieces, plan.outcome);
        let result = OptimizationResult {
            id: new_result_id(),
            status: plan.status,
            waste: plan.outcome.objective,
            time: plan.elapsed.as_secs_f64(),
            patterns_used,
            instructions,
            summary: summarize(plan.materials, plan.pieces, used_patterns),
            unmet_demand,
            error: plan.error.or_else(|| plan.outcome.message.clone()),
        };
        self.record(&result);
        result
    }

    /// Result for a problem without materials or without pieces. The solver
    /// is not invoked.
    pub fn report_empty(
        &self,
        pieces: &[Arc<Piece>],
        materials: &[Arc<Material>],
        elapsed: Duration,
    ) -> OptimizationResult {
        let unmet_demand: Vec<UnmetDemand> = pieces
            .iter()
            .filter(|p| p.demand > 0)
            .map(|p| UnmetDemand {
                piece_id: p.id,
                name: p.name.clone(),
                demand: p.demand,
                supplied: 0,
            })
            .collect();
        let (status, error) = if unmet_demand.is_empty() {
            (SolveStatus::Optimal, None)
        } else {
            (
                SolveStatus::Infeasible,
                Some("no materials to cut pieces from".to_string()),
            )
        };

        let result = OptimizationResult {
            id: new_result_id(),
            status,
            waste: Some(0.0),
            time: elapsed.as_secs_f64(),
            patterns_used: 0,
            instructions: Vec::new(),
            summary: summarize(materials, pieces, Vec::new()),
            unmet_demand,
            error,
        };
        self.record(&result);
        result
    }

    fn record(&self, result: &OptimizationResult) {
        let Some(waste) = result.waste else {
            return;
        };
        let stats = self.stats.record(waste, result.time);
        tracing::debug!(
            total = stats.total_optimizations,
            avg_waste = stats.avg_waste,
            avg_time = stats.avg_time,
            "updated running stats"
        );
    }
}

fn new_result_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn unmet_demand(
    patterns: &[CuttingPattern],
    pieces: &[Arc<Piece>],
    outcome: &ModelOutcome,
) -> Vec<UnmetDemand> {
    pieces
        .iter()
        .filter_map(|piece| {
            let supplied: u64 = patterns
                .iter()
                .enumerate()
                .map(|(idx, p)| outcome.rounded_usage(idx) * u64::from(p.count_of(piece.id)))
                .sum();
            (supplied < u64::from(piece.demand)).then(|| UnmetDemand {
                piece_id: piece.id,
                name: piece.name.clone(),
                demand: piece.demand,
                supplied,
            })
        })
        .collect()
}

fn summarize(
    materials: &[Arc<Material>],
    pieces: &[Arc<Piece>],
    used_patterns: Vec<UsedPattern>,
) -> Summary {
    let total_material_area: f64 = materials
        .iter()
        .map(|m| m.area() * f64::from(m.quantity))
        .sum();
    let total_pieces_area: f64 = pieces
        .iter()
        .map(|p| p.area() * f64::from(p.demand))
        .sum();
    let utilization = if total_material_area > 0.0 {
        (total_pieces_area / total_material_area * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    Summary {
        total_material_area,
        total_pieces_area,
        material_utilization_pct: utilization,
        waste_pct: 100.0 - utilization,
        used_patterns,
        timestamp: Utc::now(),
    }
}
