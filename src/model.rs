//! Integer program over the generated patterns.
//!
//! One non-negative integer usage variable per pattern, minimising the total
//! wasted area, with a covering row per demanded piece and a supply row per
//! material. Solved with HiGHS through `good_lp`.

use std::sync::Arc;
use std::time::Duration;

use good_lp::solvers::highs::highs;
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolutionStatus, SolverModel,
    Variable, WithTimeLimit, constraint, variable,
};
use serde::{Deserialize, Serialize};

use crate::pattern::CuttingPattern;
use crate::types::{Material, Piece};

/// Values below this are treated as an unused pattern.
pub const USED_THRESHOLD: f64 = 0.5;

const INFEASIBLE: &str = "demand cannot be met with the available supply";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    /// An incumbent exists but optimality was not proven (time or gap limit).
    Feasible,
    Infeasible,
    Unbounded,
    NotSolved,
}

/// Why the solver returned an incumbent without proving optimality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    TimeLimit,
    GapLimit,
}

impl SolveStatus {
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Feasible => "feasible",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::NotSolved => "not solved",
        };
        f.write_str(s)
    }
}

/// Raw solver output. `usage` is indexed like the pattern slice.
#[derive(Debug, Clone)]
pub struct ModelOutcome {
    pub status: SolveStatus,
    pub objective: Option<f64>,
    pub usage: Option<Vec<f64>>,
    pub stop: Option<StopReason>,
    pub message: Option<String>,
}

impl ModelOutcome {
    fn failed(status: SolveStatus, message: String) -> Self {
        Self {
            status,
            objective: None,
            usage: None,
            stop: None,
            message: Some(message),
        }
    }

    /// Rounded usage of pattern `idx`, zero unless the value is above the threshold.
    pub fn rounded_usage(&self, idx: usize) -> u64 {
        match self.usage.as_ref().and_then(|u| u.get(idx)) {
            Some(&v) if v > USED_THRESHOLD => v.round() as u64,
            _ => 0,
        }
    }
}

pub struct CuttingModel<'a> {
    patterns: &'a [CuttingPattern],
    pieces: &'a [Arc<Piece>],
    materials: &'a [Arc<Material>],
}

impl<'a> CuttingModel<'a> {
    pub fn new(
        patterns: &'a [CuttingPattern],
        pieces: &'a [Arc<Piece>],
        materials: &'a [Arc<Material>],
    ) -> Self {
        Self {
            patterns,
            pieces,
            materials,
        }
    }

    /// Solves the model with hard demand rows.
    pub fn solve(&self, time_limit: Duration) -> ModelOutcome {
        self.run(time_limit, false)
    }

    /// Solves the model with a penalised shortfall variable on every demand
    /// row. The model is always feasible; it yields the best plan the
    /// available supply and patterns allow when the hard model does not.
    pub fn solve_with_shortfall(&self, time_limit: Duration) -> ModelOutcome {
        self.run(time_limit, true)
    }

    fn shortfall_penalty(&self) -> f64 {
        // Exceeds the waste of any single pattern, so covering a unit of
        // demand is always cheaper than leaving it short.
        1.0 + self
            .materials
            .iter()
            .map(|m| m.area())
            .fold(0.0_f64, f64::max)
    }

    /// Checks usage values (and shortfall values, when present) against the
    /// demand and supply rows.
    fn satisfies(&self, covered: &[&Arc<Piece>], usage: &[f64], shortfall: &[f64]) -> bool {
        const TOLERANCE: f64 = 1e-6;

        if usage.iter().chain(shortfall).any(|&v| !v.is_finite() || v < -TOLERANCE) {
            return false;
        }
        let demand_met = covered.iter().enumerate().all(|(row, piece)| {
            let supplied: f64 = self
                .patterns
                .iter()
                .zip(usage)
                .map(|(p, u)| f64::from(p.count_of(piece.id)) * u)
                .sum();
            let short = shortfall.get(row).copied().unwrap_or(0.0);
            supplied + short >= f64::from(piece.demand) - TOLERANCE
        });
        let supply_kept = self.materials.iter().all(|m| {
            let cut: f64 = self
                .patterns
                .iter()
                .zip(usage)
                .filter(|(p, _)| p.material.id == m.id)
                .map(|(_, u)| u)
                .sum();
            cut <= f64::from(m.quantity) + TOLERANCE
        });
        demand_met && supply_kept
    }

    fn run(&self, time_limit: Duration, with_shortfall: bool) -> ModelOutcome {
        if self.patterns.is_empty() {
            return ModelOutcome::failed(
                SolveStatus::NotSolved,
                "no patterns to choose from".to_string(),
            );
        }

        let mut vars = ProblemVariables::new();
        let usage: Vec<Variable> = self
            .patterns
            .iter()
            .map(|p| vars.add(variable().integer().min(0).name(format!("pattern_{}", p.id))))
            .collect();

        let covered_pieces: Vec<&Arc<Piece>> = self
            .pieces
            .iter()
            .filter(|p| p.demand > 0)
            .filter(|p| self.patterns.iter().any(|pattern| pattern.count_of(p.id) > 0))
            .collect();

        let shortfall: Vec<Variable> = if with_shortfall {
            covered_pieces
                .iter()
                .map(|p| vars.add(variable().min(0).name(format!("shortfall_{}", p.id))))
                .collect()
        } else {
            Vec::new()
        };

        let mut objective: Expression = self
            .patterns
            .iter()
            .zip(&usage)
            .map(|(p, &u)| p.waste * u)
            .sum();
        if with_shortfall {
            let penalty = self.shortfall_penalty();
            objective += shortfall.iter().map(|&s| penalty * s).sum::<Expression>();
        }

        let mut problem = vars
            .minimise(objective)
            .using(highs)
            .with_time_limit(time_limit.as_secs_f64());

        for (row, piece) in covered_pieces.iter().enumerate() {
            let mut supplied: Expression = self
                .patterns
                .iter()
                .zip(&usage)
                .filter(|(p, _)| p.count_of(piece.id) > 0)
                .map(|(p, &u)| f64::from(p.count_of(piece.id)) * u)
                .sum();
            if let Some(&short) = shortfall.get(row) {
                supplied += short;
            }
            let demand = f64::from(piece.demand);
            problem = problem.with(constraint!(supplied >= demand));
        }

        for material in self.materials {
            let cut: Vec<Variable> = self
                .patterns
                .iter()
                .zip(&usage)
                .filter(|(p, _)| p.material.id == material.id)
                .map(|(_, &u)| u)
                .collect();
            if cut.is_empty() {
                continue;
            }
            let cut: Expression = cut.into_iter().map(Expression::from).sum();
            let quantity = f64::from(material.quantity);
            problem = problem.with(constraint!(cut <= quantity));
        }

        tracing::debug!(
            variables = usage.len() + shortfall.len(),
            demand_rows = covered_pieces.len(),
            with_shortfall,
            "solving cutting model"
        );

        match problem.solve() {
            Ok(solution) => {
                let stop = match solution.status() {
                    SolutionStatus::Optimal => None,
                    SolutionStatus::GapLimit => Some(StopReason::GapLimit),
                    _ => Some(StopReason::TimeLimit),
                };
                let values: Vec<f64> = usage.iter().map(|&u| solution.value(u)).collect();
                let short: Vec<f64> = shortfall.iter().map(|&s| solution.value(s)).collect();

                // A solve cut short may hand back values without an incumbent.
                if stop.is_some() && !self.satisfies(&covered_pieces, &values, &short) {
                    tracing::warn!(?stop, "solver stopped without a feasible solution");
                    return ModelOutcome::failed(
                        SolveStatus::NotSolved,
                        "solver stopped before finding a feasible solution".to_string(),
                    );
                }

                let objective = self
                    .patterns
                    .iter()
                    .zip(&values)
                    .map(|(p, v)| p.waste * v)
                    .sum();
                ModelOutcome {
                    status: if stop.is_some() {
                        SolveStatus::Feasible
                    } else {
                        SolveStatus::Optimal
                    },
                    objective: Some(objective),
                    usage: Some(values),
                    stop,
                    message: None,
                }
            }
            Err(ResolutionError::Infeasible) => {
                ModelOutcome::failed(SolveStatus::Infeasible, INFEASIBLE.to_string())
            }
            // HiGHS reports "unbounded or infeasible" as unbounded. With
            // non-negative waste the objective is bounded below, so only
            // infeasibility is left.
            Err(ResolutionError::Unbounded) if self.patterns.iter().all(|p| p.waste >= 0.0) => {
                ModelOutcome::failed(SolveStatus::Infeasible, INFEASIBLE.to_string())
            }
            Err(ResolutionError::Unbounded) => {
                ModelOutcome::failed(SolveStatus::Unbounded, "model is unbounded".to_string())
            }
            Err(e) => {
                tracing::warn!(error = %e, "solver failed");
                ModelOutcome::failed(SolveStatus::NotSolved, format!("solver failed: {e}"))
            }
        }
    }
}
