//! Candidate strategy generator
//!
//! Enumerates every (duration, UMA level, mode) combination allowed by the
//! request and configuration, evaluates each one independently and keeps
//! per-scenario failures in the result set:
//! - Duration: `min_duration..=max_duration` months
//! - UMA level: `uma_min..=uma_max`, capped by each year's legal ceiling
//! - Mode: fixed and progressive

use crate::assumptions::{
    JanuaryUmaPolicy, ReferenceTables, DEFAULT_UMA_CEILING, MINIMUM_WEEKS,
};
use crate::error::{M40Error, M40Result, ScenarioError};
use crate::projection::{
    compute_isr, IsrBreakdown, PensionEngine, SdiSimulator, SimulationResult,
    DEFAULT_PENSION_HORIZON_MONTHS,
};
use crate::strategy::{
    daily_sdi_from_centavos, first_of_month, salary_centavos, CivilStatus, Strategy,
    StrategyMode, StrategyToken, UserPreferences, WorkerProfile,
};
use chrono::{Datelike, Months, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Parameters controlling the size of the strategy space and the metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Shortest strategy generated, in months
    #[serde(default = "default_min_duration")]
    pub min_duration: u32,

    /// Longest strategy generated, in months
    /// Default: 58 (the averaging window; longer stretches do not raise the average)
    #[serde(default = "default_max_duration")]
    pub max_duration: u32,

    /// UMA applied to January contributions
    #[serde(default)]
    pub january_policy: JanuaryUmaPolicy,

    /// Months of pension income counted in ROI
    #[serde(default = "default_horizon")]
    pub pension_horizon_months: u32,

    /// Measure ROI and payback on pension net of ISR
    #[serde(default)]
    pub apply_isr: bool,

    /// Maximum scenarios returned by the preference filter
    #[serde(default = "default_shortlist_size")]
    pub shortlist_size: usize,

    /// Evaluate scenarios on the rayon thread pool
    #[serde(default = "default_true")]
    pub parallel: bool,
}

fn default_min_duration() -> u32 { 1 }
fn default_max_duration() -> u32 { 58 }
fn default_horizon() -> u32 { DEFAULT_PENSION_HORIZON_MONTHS }
fn default_shortlist_size() -> usize { 5 }
fn default_true() -> bool { true }

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_duration: 1,
            max_duration: 58,
            january_policy: JanuaryUmaPolicy::PriorYear,
            pension_horizon_months: DEFAULT_PENSION_HORIZON_MONTHS,
            apply_isr: false,
            shortlist_size: 5,
            parallel: true,
        }
    }
}

/// Structured request handed over by the web layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub birth_date: NaiveDate,
    pub retirement_age: u8,
    /// Weeks contributed before M40
    pub prior_weeks: u32,
    /// Last registered monthly salary (MXN)
    pub historical_monthly_salary: f64,
    pub civil_status: CivilStatus,
    #[serde(default)]
    pub target_pension: Option<f64>,
    #[serde(default)]
    pub preferences: Option<UserPreferences>,
    pub uma_min: u32,
    pub uma_max: u32,
    /// First M40 month; when absent each strategy ends at retirement
    #[serde(default)]
    pub m40_start: Option<NaiveDate>,
    /// Calculation date
    pub as_of: NaiveDate,
}

impl PlanRequest {
    /// Daily SDI the historical salary corresponds to, computed from the
    /// salary in centavos exactly as a replay token does
    pub fn historical_daily_sdi(&self) -> f64 {
        daily_sdi_from_centavos(salary_centavos(self.historical_monthly_salary))
    }

    pub fn profile(&self) -> WorkerProfile {
        WorkerProfile {
            birth_date: self.birth_date,
            retirement_age: self.retirement_age,
            prior_weeks: self.prior_weeks,
            historical_daily_sdi: self.historical_daily_sdi(),
            dependents: self.civil_status.dependents(),
        }
    }
}

/// Metrics of a successfully evaluated strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMetrics {
    pub average_sdi: f64,
    pub total_weeks: u32,
    pub age_at_pension: u8,
    pub pension_start: NaiveDate,
    pub gross_pension: f64,
    pub pension_with_bonus: f64,
    pub factor_edad: f64,
    pub ley_fox_factor: f64,
    pub bracket_percent: f64,
    pub effective_percent: f64,
    pub edge_guard_applied: bool,
    pub floor_applied: bool,
    pub investment_total: f64,
    pub monthly_contribution_first: f64,
    pub monthly_contribution_max: f64,
    pub roi: f64,
    pub payback_months: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isr: Option<IsrBreakdown>,
}

/// Either the metrics of a strategy or why it could not be evaluated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScenarioOutcome {
    Evaluated(ScenarioMetrics),
    Failed { error: ScenarioError, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub strategy: Strategy,
    /// Replay token for this strategy and worker
    pub token: String,
    #[serde(flatten)]
    pub outcome: ScenarioOutcome,
}

impl ScenarioResult {
    pub fn metrics(&self) -> Option<&ScenarioMetrics> {
        match &self.outcome {
            ScenarioOutcome::Evaluated(metrics) => Some(metrics),
            ScenarioOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ScenarioError> {
        match &self.outcome {
            ScenarioOutcome::Evaluated(_) => None,
            ScenarioOutcome::Failed { error, .. } => Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub total_generated: usize,
    pub total_failed: usize,
    /// Combinations dropped because the level exceeds a year's ceiling
    pub skipped_over_ceiling: usize,
    pub historical_daily_sdi: f64,
    /// Pension with no M40 at all, when the prior weeks qualify
    pub baseline_pension: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub results: Vec<ScenarioResult>,
    pub metadata: GenerationMetadata,
}

impl GenerationOutput {
    pub fn evaluated(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.results.iter().filter(|r| r.metrics().is_some())
    }
}

pub struct ScenarioGenerator<'a> {
    tables: &'a ReferenceTables,
    config: GeneratorConfig,
}

impl<'a> ScenarioGenerator<'a> {
    pub fn new(tables: &'a ReferenceTables, config: GeneratorConfig) -> Self {
        Self { tables, config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Reject malformed or out-of-policy input before anything is simulated
    pub fn validate(&self, request: &PlanRequest) -> M40Result<()> {
        let config = &self.config;
        if config.min_duration == 0 {
            return Err(M40Error::validation("min_duration", "must be at least 1 month"));
        }
        if config.max_duration < config.min_duration {
            return Err(M40Error::validation("max_duration", "must be >= min_duration"));
        }
        if config.pension_horizon_months == 0 {
            return Err(M40Error::validation("pension_horizon_months", "must be > 0"));
        }
        if request.uma_min == 0 {
            return Err(M40Error::validation("uma_min", "UMA level must be at least 1"));
        }
        if request.uma_max < request.uma_min {
            return Err(M40Error::validation("uma_max", "must be >= uma_min"));
        }
        if request.uma_max > DEFAULT_UMA_CEILING {
            return Err(M40Error::validation(
                "uma_max",
                format!("must be <= {}", DEFAULT_UMA_CEILING),
            ));
        }
        if !request.historical_monthly_salary.is_finite() || request.historical_monthly_salary <= 0.0 {
            return Err(M40Error::validation("historical_monthly_salary", "must be > 0"));
        }
        if request.birth_date >= request.as_of {
            return Err(M40Error::validation("birth_date", "must be before as_of"));
        }
        if !(50..=80).contains(&request.retirement_age) {
            return Err(M40Error::validation("retirement_age", "must be between 50 and 80"));
        }
        if request.profile().retirement_date().is_none() {
            return Err(M40Error::validation("birth_date", "retirement date out of range"));
        }
        if let Some(target) = request.target_pension {
            if !target.is_finite() || target <= 0.0 {
                return Err(M40Error::validation("target_pension", "must be > 0"));
            }
        }
        if let Some(budget) = request.preferences.as_ref().and_then(|p| p.budget_ceiling) {
            if !budget.is_finite() || budget < 0.0 {
                return Err(M40Error::validation("budget_ceiling", "must be >= 0"));
            }
        }
        Ok(())
    }

    /// Strategies to evaluate, in deterministic order (duration, level,
    /// fixed before progressive), plus the count skipped for exceeding
    /// a year's ceiling
    pub fn enumerate(&self, request: &PlanRequest) -> (Vec<Strategy>, usize) {
        let profile = request.profile();
        let mut strategies = Vec::new();
        let mut skipped = 0;

        for duration in self.config.min_duration..=self.config.max_duration {
            let start = self.start_for(request, &profile, duration);
            let ceiling = start
                .checked_add_months(Months::new(duration.saturating_sub(1)))
                .map(|last| self.tables.uma_ceilings.max_level_between(start.year(), last.year()));

            for uma_level in request.uma_min..=request.uma_max {
                if let Some(ceiling) = ceiling {
                    if uma_level > ceiling {
                        skipped += StrategyMode::ALL.len();
                        continue;
                    }
                }
                for mode in StrategyMode::ALL {
                    strategies.push(Strategy::new(duration, mode, uma_level, start));
                }
            }
        }

        (strategies, skipped)
    }

    /// Start month: the requested one, or the month that makes the
    /// strategy end at retirement (never before `as_of`)
    fn start_for(&self, request: &PlanRequest, profile: &WorkerProfile, duration: u32) -> NaiveDate {
        let earliest = first_of_month(request.as_of);
        if let Some(start) = request.m40_start {
            return first_of_month(start);
        }
        profile
            .retirement_date()
            .map(first_of_month)
            .and_then(|retirement| retirement.checked_sub_months(Months::new(duration)))
            .map(|start| start.max(earliest))
            .unwrap_or(earliest)
    }

    /// Run the whole strategy space
    pub fn generate_all(&self, request: &PlanRequest) -> M40Result<GenerationOutput> {
        self.validate(request)?;

        let start = Instant::now();
        let profile = request.profile();
        let (strategies, skipped_over_ceiling) = self.enumerate(request);

        log::debug!(
            "Evaluating {} strategies (durations {}..={}, UMA {}..={})",
            strategies.len(),
            self.config.min_duration,
            self.config.max_duration,
            request.uma_min,
            request.uma_max
        );

        let results: Vec<ScenarioResult> = if self.config.parallel {
            strategies
                .par_iter()
                .map(|strategy| self.evaluate(strategy, &profile))
                .collect()
        } else {
            strategies
                .iter()
                .map(|strategy| self.evaluate(strategy, &profile))
                .collect()
        };

        let total_failed = results.iter().filter(|r| r.error().is_some()).count();
        let baseline_pension = self.baseline_pension(&profile);

        log::info!(
            "Generated {} scenarios ({} failed, {} over ceiling) in {:?}",
            results.len(),
            total_failed,
            skipped_over_ceiling,
            start.elapsed()
        );

        Ok(GenerationOutput {
            metadata: GenerationMetadata {
                total_generated: results.len(),
                total_failed,
                skipped_over_ceiling,
                historical_daily_sdi: profile.historical_daily_sdi,
                baseline_pension,
            },
            results,
        })
    }

    /// Evaluate one strategy; failures are captured, never propagated
    pub fn evaluate(&self, strategy: &Strategy, profile: &WorkerProfile) -> ScenarioResult {
        let token = StrategyToken::new(strategy, profile).to_string();
        let outcome = match self.run(strategy, profile) {
            Ok((metrics, _)) => ScenarioOutcome::Evaluated(metrics),
            Err(error) => {
                log::debug!("Strategy {} failed: {}", token, error);
                ScenarioOutcome::Failed {
                    message: error.to_string(),
                    error,
                }
            }
        };
        ScenarioResult {
            strategy: *strategy,
            token,
            outcome,
        }
    }

    /// Evaluate one strategy keeping the contribution ledger
    pub fn run(
        &self,
        strategy: &Strategy,
        profile: &WorkerProfile,
    ) -> Result<(ScenarioMetrics, SimulationResult), ScenarioError> {
        let simulation = SdiSimulator::new(self.tables, self.config.january_policy)
            .simulate(strategy, profile.historical_daily_sdi)?;

        let total_weeks = profile.prior_weeks + simulation.weeks_accrued;
        if total_weeks < MINIMUM_WEEKS {
            return Err(ScenarioError::InsufficientWeeks {
                weeks: total_weeks,
                required: MINIMUM_WEEKS,
            });
        }

        let retirement = profile
            .retirement_date()
            .ok_or_else(|| ScenarioError::DateArithmetic {
                detail: format!("no retirement date for {}", profile.birth_date),
            })?;
        let pension_start = simulation.end_month.max(retirement);
        let age_at_pension = profile.age_at(pension_start);

        let pension = PensionEngine::new(self.tables).compute(
            simulation.average_sdi,
            total_weeks,
            age_at_pension,
            profile.dependents,
            pension_start.year(),
        )?;

        let isr = self
            .config
            .apply_isr
            .then(|| compute_isr(&self.tables.isr, pension.gross_monthly));
        let monthly_income = match &isr {
            Some(isr) => isr.net * 13.0 / 12.0,
            None => pension.with_year_end_bonus,
        };

        let investment_total = simulation.total_investment;
        let horizon_income = monthly_income * self.config.pension_horizon_months as f64;
        let roi = (horizon_income - investment_total) / investment_total;

        let metrics = ScenarioMetrics {
            average_sdi: simulation.average_sdi,
            total_weeks,
            age_at_pension,
            pension_start,
            gross_pension: pension.gross_monthly,
            pension_with_bonus: pension.with_year_end_bonus,
            factor_edad: pension.factor_edad,
            ley_fox_factor: pension.ley_fox_factor,
            bracket_percent: pension.bracket_percent,
            effective_percent: pension.effective_percent,
            edge_guard_applied: pension.edge_guard_applied,
            floor_applied: pension.floor_applied,
            investment_total,
            monthly_contribution_first: simulation.first_monthly_contribution(),
            monthly_contribution_max: simulation.max_monthly_contribution(),
            roi,
            payback_months: payback_months(investment_total, monthly_income),
            isr,
        };

        Ok((metrics, simulation))
    }

    /// Pension the worker would get on prior weeks and salary alone
    fn baseline_pension(&self, profile: &WorkerProfile) -> Option<f64> {
        if profile.prior_weeks < MINIMUM_WEEKS {
            return None;
        }
        let retirement = profile.retirement_date()?;
        PensionEngine::new(self.tables)
            .compute(
                profile.historical_daily_sdi,
                profile.prior_weeks,
                profile.age_at(retirement),
                profile.dependents,
                retirement.year(),
            )
            .map(|p| p.gross_monthly)
            .ok()
    }
}

/// First month in which cumulative income exceeds the investment
pub fn payback_months(investment: f64, monthly_income: f64) -> u32 {
    if investment <= 0.0 {
        return 0;
    }
    if monthly_income <= 0.0 {
        return u32::MAX;
    }
    let months = (investment / monthly_income).floor() + 1.0;
    months.min(u32::MAX as f64) as u32
}
