use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::OptimizerConfig;
use crate::error::{CutError, Result};
use crate::generator::{PatternGenerator, uncovered_pieces};
use crate::layout::PatternLayout;
use crate::model::{CuttingModel, ModelOutcome, SolveStatus, StopReason};
use crate::pattern::CuttingPattern;
use crate::problem::Problem;
use crate::report::{
    OptimizationResult, RunningStats, SolutionReporter, SolvedPlan, StatsSnapshot,
};
use crate::types::{Material, Piece};

/// One optimization session. Build a fresh one per request; only the shared
/// [`RunningStats`] outlives it.
pub struct Solver {
    materials: Vec<Arc<Material>>,
    pieces: Vec<Arc<Piece>>,
    patterns: Vec<CuttingPattern>,
    config: OptimizerConfig,
    last_result: Option<OptimizationResult>,
    stats: Arc<RunningStats>,
    reporter: SolutionReporter,
}

impl Solver {
    pub fn new(stats: Arc<RunningStats>) -> Self {
        Self {
            materials: Vec::new(),
            pieces: Vec::new(),
            patterns: Vec::new(),
            config: OptimizerConfig::default(),
            last_result: None,
            reporter: SolutionReporter::new(stats.clone()),
            stats,
        }
    }

    /// Builds a session from a problem document. Pieces without an id get
    /// their 1-based position.
    pub fn from_problem(problem: &Problem, stats: Arc<RunningStats>) -> Result<Self> {
        let mut solver = Self::new(stats);
        if let Some(config) = &problem.config {
            config.validate()?;
            solver.config = config.clone();
        }
        for m in &problem.materials {
            let name = m.name.as_deref().unwrap_or_default();
            solver.add_material(m.width, m.height, m.quantity, name)?;
        }
        for (i, p) in problem.pieces.iter().enumerate() {
            let id = p.id.unwrap_or(i as u32 + 1);
            let name = p.name.as_deref().unwrap_or_default();
            solver.add_piece(id, p.width, p.height, p.demand, name)?;
        }
        Ok(solver)
    }

    pub fn add_material(
        &mut self,
        width: f64,
        height: f64,
        quantity: u32,
        name: &str,
    ) -> Result<u32> {
        check_dimension("material width", width)?;
        check_dimension("material height", height)?;
        if quantity == 0 {
            return Err(CutError::InvalidInput(
                "material quantity must be positive".to_string(),
            ));
        }

        let id = self.materials.len() as u32 + 1;
        self.materials
            .push(Arc::new(Material::new(id, width, height, quantity, name)));
        Ok(id)
    }

    pub fn add_piece(
        &mut self,
        id: u32,
        width: f64,
        height: f64,
        demand: u32,
        name: &str,
    ) -> Result<Arc<Piece>> {
        check_dimension("piece width", width)?;
        check_dimension("piece height", height)?;
        if demand == 0 {
            return Err(CutError::InvalidInput(
                "piece demand must be positive".to_string(),
            ));
        }
        if self.pieces.iter().any(|p| p.id == id) {
            return Err(CutError::DuplicatePiece(id));
        }

        let piece = Arc::new(Piece::new(id, width, height, demand, name));
        self.pieces.push(piece.clone());
        Ok(piece)
    }

    /// `use_substitution` is stored for a future substitution strategy and
    /// has no effect on generation.
    pub fn set_config(
        &mut self,
        use_substitution: bool,
        max_patterns: usize,
        time_limit: u64,
    ) -> Result<()> {
        let config = OptimizerConfig {
            use_substitution,
            max_patterns,
            time_limit,
        };
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Resets the problem and the last solution. Running stats are kept.
    pub fn clear(&mut self) {
        self.materials.clear();
        self.pieces.clear();
        self.patterns.clear();
        self.last_result = None;
    }

    pub fn solve(&mut self) -> OptimizationResult {
        let start = Instant::now();
        tracing::info!(
            materials = self.materials.len(),
            pieces = self.pieces.len(),
            max_patterns = self.config.max_patterns,
            time_limit = self.config.time_limit,
            "starting optimization"
        );

        let result = if self.materials.is_empty() || self.pieces.is_empty() {
            self.patterns.clear();
            self.reporter
                .report_empty(&self.pieces, &self.materials, start.elapsed())
        } else {
            self.patterns = PatternGenerator::new(self.config.max_patterns)
                .generate(&self.materials, &self.pieces);
            self.solve_patterns(start)
        };

        tracing::info!(
            id = %result.id,
            status = %result.status,
            waste = ?result.waste,
            patterns_used = result.patterns_used,
            unmet = result.unmet_demand.len(),
            time = result.time,
            "optimization finished"
        );
        self.last_result = Some(result.clone());
        result
    }

    fn solve_patterns(&self, start: Instant) -> OptimizationResult {
        let model = CuttingModel::new(&self.patterns, &self.pieces, &self.materials);
        let limit = Duration::from_secs(self.config.time_limit);

        let uncovered = uncovered_pieces(&self.patterns, &self.pieces);
        let (outcome, status, error) = if !uncovered.is_empty() {
            tracing::warn!(pieces = ?uncovered, "pieces fit in no generated pattern");
            let ids: Vec<String> = uncovered.iter().map(u32::to_string).collect();
            let reason = format!("pieces {} fit in no generated pattern", ids.join(", "));
            let plan = model.solve_with_shortfall(remaining_budget(limit, start.elapsed()));
            let error = infeasible_note(Some(reason), &plan);
            (plan, SolveStatus::Infeasible, error)
        } else {
            let outcome = model.solve(remaining_budget(limit, start.elapsed()));
            match outcome.status {
                SolveStatus::Infeasible => {
                    tracing::warn!(
                        "demand exceeds what patterns and supply allow, cutting a partial plan"
                    );
                    // The partial plan shares the budget with the strict solve.
                    let plan = model.solve_with_shortfall(remaining_budget(limit, start.elapsed()));
                    let error = infeasible_note(outcome.message, &plan);
                    (plan, SolveStatus::Infeasible, error)
                }
                SolveStatus::Feasible => {
                    let error = stop_note(outcome.stop);
                    (outcome, SolveStatus::Feasible, error)
                }
                status => (outcome, status, None),
            }
        };

        self.reporter.report(SolvedPlan {
            patterns: &self.patterns,
            pieces: &self.pieces,
            materials: &self.materials,
            outcome: &outcome,
            status,
            error,
            elapsed: start.elapsed(),
        })
    }

    pub fn get_stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn materials(&self) -> &[Arc<Material>] {
        &self.materials
    }

    pub fn pieces(&self) -> &[Arc<Piece>] {
        &self.pieces
    }

    /// Patterns generated by the last `solve`.
    pub fn patterns(&self) -> &[CuttingPattern] {
        &self.patterns
    }

    pub fn last_result(&self) -> Option<&OptimizationResult> {
        self.last_result.as_ref()
    }

    pub fn layout(&self, pattern_id: usize) -> Option<PatternLayout> {
        self.patterns
            .iter()
            .find(|p| p.id == pattern_id)
            .map(PatternLayout::from)
    }

    /// Layouts of every pattern the last solution cuts.
    pub fn used_layouts(&self) -> Vec<PatternLayout> {
        self.last_result
            .iter()
            .flat_map(|r| &r.summary.used_patterns)
            .filter_map(|u| self.layout(u.pattern_id))
            .collect()
    }
}

fn check_dimension(what: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CutError::InvalidInput(format!(
            "{what} must be a positive number, got {value}"
        )))
    }
}

/// Time left for a solve when `elapsed` of the call's `limit` is spent.
fn remaining_budget(limit: Duration, elapsed: Duration) -> Duration {
    limit.saturating_sub(elapsed)
}

/// Explains an incumbent that was not proven optimal.
fn stop_note(stop: Option<StopReason>) -> Option<String> {
    let note = match stop? {
        StopReason::TimeLimit => "time limit reached before optimality was proven",
        StopReason::GapLimit => "solver stopped within its relative gap tolerance",
    };
    Some(note.to_string())
}

/// Reason for an infeasible result, extended with the partial plan's failure
/// when that solve found nothing either.
fn infeasible_note(reason: Option<String>, plan: &ModelOutcome) -> Option<String> {
    if plan.status.has_solution() {
        return reason;
    }
    let failure = plan.message.as_deref().unwrap_or("no solution");
    Some(match reason {
        Some(reason) => format!("{reason}; partial plan failed: {failure}"),
        None => format!("partial plan failed: {failure}"),
    })
}
