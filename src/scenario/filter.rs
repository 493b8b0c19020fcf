//! Preference filter and ranking
//!
//! Turns the full scenario set into a short, ordered list:
//! 1. drop failed scenarios
//! 2. hard eligibility (budget, legal minimum level, target pension)
//! 3. narrow by risk tolerance (mode and UMA band)
//! 4. sort by the priority metric, shorter strategies first on ties
//! 5. cap to the shortlist size

use super::generator::{GenerationMetadata, GenerationOutput, PlanRequest, ScenarioMetrics, ScenarioResult};
use crate::assumptions::{ReferenceTables, DEFAULT_UMA_CEILING};
use crate::strategy::{Priority, RiskTolerance, StrategyMode, UserPreferences};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// UMA bands associated with each risk tolerance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskBands {
    /// Highest level a conservative profile is offered
    #[serde(default = "default_band_edge")]
    pub conservative_max_uma: u32,
    /// Lowest level an aggressive profile is offered
    #[serde(default = "default_band_edge")]
    pub aggressive_min_uma: u32,
}

fn default_band_edge() -> u32 { 15 }

impl Default for RiskBands {
    fn default() -> Self {
        Self {
            conservative_max_uma: 15,
            aggressive_min_uma: 15,
        }
    }
}

/// Everything the filter needs besides the scenarios
#[derive(Debug, Clone)]
pub struct FilterContext {
    pub preferences: UserPreferences,
    pub target_pension: Option<f64>,
    /// Lowest level the worker may register (their real salary bracket)
    pub min_uma_level: u32,
    pub shortlist_size: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PreferenceFilter {
    pub bands: RiskBands,
}

impl PreferenceFilter {
    pub fn new(bands: RiskBands) -> Self {
        Self { bands }
    }

    pub fn filter<'r>(
        &self,
        results: &'r [ScenarioResult],
        context: &FilterContext,
    ) -> Vec<&'r ScenarioResult> {
        let preferences = &context.preferences;

        let candidates: Vec<(&'r ScenarioResult, &'r ScenarioMetrics)> = results
            .iter()
            .filter_map(|r| r.metrics().map(|m| (r, m)))
            .filter(|(r, m)| self.is_eligible(r, m, context))
            .filter(|(r, _)| self.matches_risk(r, preferences.risk_tolerance))
            .collect();

        log::debug!(
            "{} of {} scenarios eligible for {:?}/{:?}",
            candidates.len(),
            results.len(),
            preferences.risk_tolerance,
            preferences.priority
        );

        let scores = match preferences.priority {
            Priority::Balance => Some(balance_scores(&candidates)),
            _ => None,
        };

        let mut indexed: Vec<usize> = (0..candidates.len()).collect();
        indexed.sort_by(|&a, &b| {
            let (ra, ma) = candidates[a];
            let (rb, mb) = candidates[b];
            let primary = match preferences.priority {
                Priority::PensionMaxima => mb.gross_pension.total_cmp(&ma.gross_pension),
                Priority::InversionMinima => ma.investment_total.total_cmp(&mb.investment_total),
                Priority::RecuperacionRapida => ma.payback_months.cmp(&mb.payback_months),
                Priority::Balance => match &scores {
                    Some(scores) => scores[b].total_cmp(&scores[a]),
                    None => Ordering::Equal,
                },
            };
            primary
                .then(ra.strategy.duration_months.cmp(&rb.strategy.duration_months))
                .then(ra.strategy.uma_level.cmp(&rb.strategy.uma_level))
                .then(ra.strategy.mode.cmp(&rb.strategy.mode))
        });

        indexed.truncate(context.shortlist_size);
        indexed.into_iter().map(|i| candidates[i].0).collect()
    }

    fn is_eligible(&self, result: &ScenarioResult, metrics: &ScenarioMetrics, context: &FilterContext) -> bool {
        if let Some(budget) = context.preferences.budget_ceiling {
            if metrics.monthly_contribution_max > budget {
                return false;
            }
        }
        if result.strategy.uma_level < context.min_uma_level {
            return false;
        }
        if let Some(target) = context.target_pension {
            if metrics.gross_pension < target {
                return false;
            }
        }
        true
    }

    fn matches_risk(&self, result: &ScenarioResult, tolerance: RiskTolerance) -> bool {
        let level = result.strategy.uma_level;
        match tolerance {
            RiskTolerance::Conservador => {
                result.strategy.mode == StrategyMode::Fixed && level <= self.bands.conservative_max_uma
            }
            RiskTolerance::Agresivo => {
                result.strategy.mode == StrategyMode::Progressive && level >= self.bands.aggressive_min_uma
            }
            RiskTolerance::Moderado => true,
        }
    }
}

/// 0.5 x normalized pension + 0.5 x (1 - normalized investment)
fn balance_scores(candidates: &[(&ScenarioResult, &ScenarioMetrics)]) -> Vec<f64> {
    let (min_p, max_p) = min_max(candidates.iter().map(|(_, m)| m.gross_pension));
    let (min_i, max_i) = min_max(candidates.iter().map(|(_, m)| m.investment_total));

    candidates
        .iter()
        .map(|(_, m)| {
            let pension = normalize(m.gross_pension, min_p, max_p);
            let investment = normalize(m.investment_total, min_i, max_i);
            0.5 * pension + 0.5 * (1.0 - investment)
        })
        .collect()
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

fn normalize(value: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if range > 0.0 {
        (value - min) / range
    } else {
        0.0
    }
}

/// Lowest UMA level the worker may register: their salary expressed in
/// UMA of the calculation year, rounded up, within 1..=25
pub fn minimum_uma_level(tables: &ReferenceTables, historical_daily_sdi: f64, year: i32) -> u32 {
    match tables.uma.daily_value(year) {
        Ok(uma) => ((historical_daily_sdi / uma).ceil() as u32).clamp(1, DEFAULT_UMA_CEILING),
        Err(_) => {
            log::debug!("no UMA for {}, not enforcing a minimum level", year);
            1
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub total_generated: usize,
    pub total_failed: usize,
    pub skipped_over_ceiling: usize,
    pub filter_applied: bool,
    pub applied_preferences: Option<UserPreferences>,
    pub target_pension: Option<f64>,
    pub min_uma_level: u32,
    pub baseline_pension: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub results: Vec<ScenarioResult>,
    pub metadata: ResponseMetadata,
}

/// Build the response for a request from its generated scenarios.
///
/// Without preferences or a target the full, unranked set is returned.
/// A target alone ranks by lowest investment among the scenarios that
/// reach it.
pub fn rank(
    output: GenerationOutput,
    request: &PlanRequest,
    tables: &ReferenceTables,
    filter: &PreferenceFilter,
    shortlist_size: usize,
) -> PlanResponse {
    let GenerationOutput { results, metadata } = output;
    let min_uma_level =
        minimum_uma_level(tables, metadata.historical_daily_sdi, request.as_of.year());

    let preferences = match (&request.preferences, request.target_pension) {
        (Some(preferences), _) => preferences.clone(),
        (None, Some(_)) => UserPreferences {
            budget_ceiling: None,
            risk_tolerance: RiskTolerance::Moderado,
            priority: Priority::InversionMinima,
        },
        (None, None) => {
            return PlanResponse {
                metadata: response_metadata(&metadata, false, None, None, min_uma_level, None),
                results,
            };
        }
    };

    let context = FilterContext {
        preferences: preferences.clone(),
        target_pension: request.target_pension,
        min_uma_level,
        shortlist_size,
    };
    let shortlist: Vec<ScenarioResult> = filter
        .filter(&results, &context)
        .into_iter()
        .cloned()
        .collect();

    let note = if shortlist.is_empty() {
        Some(format!(
            "No scenario matches the preferences: {} evaluated, {} failed, minimum UMA level {}",
            metadata.total_generated - metadata.total_failed,
            metadata.total_failed,
            min_uma_level
        ))
    } else {
        None
    };

    PlanResponse {
        metadata: response_metadata(
            &metadata,
            true,
            Some(preferences),
            request.target_pension,
            min_uma_level,
            note,
        ),
        results: shortlist,
    }
}

fn response_metadata(
    metadata: &GenerationMetadata,
    filter_applied: bool,
    applied_preferences: Option<UserPreferences>,
    target_pension: Option<f64>,
    min_uma_level: u32,
    note: Option<String>,
) -> ResponseMetadata {
    ResponseMetadata {
        total_generated: metadata.total_generated,
        total_failed: metadata.total_failed,
        skipped_over_ceiling: metadata.skipped_over_ceiling,
        filter_applied,
        applied_preferences,
        target_pension,
        min_uma_level,
        baseline_pension: metadata.baseline_pension,
        note,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::generator::{GeneratorConfig, ScenarioGenerator};
    use crate::strategy::CivilStatus;
    use chrono::NaiveDate;

    fn request(preferences: Option<UserPreferences>) -> PlanRequest {
        PlanRequest {
            birth_date: NaiveDate::from_ymd_opt(1966, 3, 15).unwrap(),
            retirement_age: 65,
            prior_weeks: 1200,
            historical_monthly_salary: 15_200.0,
            civil_status: CivilStatus::Soltero,
            target_pension: None,
            preferences,
            uma_min: 1,
            uma_max: 25,
            m40_start: Some(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()),
            as_of: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
        }
    }

    fn prefs(risk_tolerance: RiskTolerance, priority: Priority) -> Option<UserPreferences> {
        Some(UserPreferences {
            budget_ceiling: None,
            risk_tolerance,
            priority,
        })
    }

    fn plan(request: &PlanRequest) -> PlanResponse {
        let tables = ReferenceTables::default();
        let config = GeneratorConfig {
            max_duration: 24,
            ..Default::default()
        };
        let output = ScenarioGenerator::new(&tables, config)
            .generate_all(request)
            .unwrap();
        rank(output, request, &tables, &PreferenceFilter::default(), 5)
    }

    #[test]
    fn test_no_preferences_returns_everything() {
        let response = plan(&request(None));
        assert!(!response.metadata.filter_applied);
        assert_eq!(response.results.len(), 24 * 25 * 2);
        assert_eq!(response.metadata.total_generated, response.results.len());
        assert!(response.metadata.note.is_none());
    }

    #[test]
    fn test_conservative_excludes_progressive() {
        let response = plan(&request(prefs(RiskTolerance::Conservador, Priority::PensionMaxima)));
        assert!(response.metadata.filter_applied);
        assert_eq!(response.results.len(), 5);
        for result in &response.results {
            assert_eq!(result.strategy.mode, StrategyMode::Fixed);
            assert!(result.strategy.uma_level <= 15);
        }
    }

    #[test]
    fn test_aggressive_band() {
        let response = plan(&request(prefs(RiskTolerance::Agresivo, Priority::InversionMinima)));
        for result in &response.results {
            assert_eq!(result.strategy.mode, StrategyMode::Progressive);
            assert!(result.strategy.uma_level >= 15);
        }
    }

    #[test]
    fn test_pension_maxima_order() {
        let response = plan(&request(prefs(RiskTolerance::Moderado, Priority::PensionMaxima)));
        let pensions: Vec<f64> = response
            .results
            .iter()
            .map(|r| r.metrics().unwrap().gross_pension)
            .collect();
        assert!(pensions.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_inversion_minima_respects_minimum_level() {
        let response = plan(&request(prefs(RiskTolerance::Moderado, Priority::InversionMinima)));

        // 500 daily SDI / 117.31 UMA rounds up to level 5
        assert_eq!(response.metadata.min_uma_level, 5);
        let investments: Vec<f64> = response
            .results
            .iter()
            .map(|r| r.metrics().unwrap().investment_total)
            .collect();
        assert!(investments.windows(2).all(|w| w[0] <= w[1]));
        assert!(response.results.iter().all(|r| r.strategy.uma_level >= 5));

        // Cheapest strategy: shortest, lowest allowed level
        let first = &response.results[0].strategy;
        assert_eq!((first.duration_months, first.uma_level), (1, 5));
    }

    #[test]
    fn test_recuperacion_rapida_order() {
        let response = plan(&request(prefs(RiskTolerance::Moderado, Priority::RecuperacionRapida)));
        let paybacks: Vec<u32> = response
            .results
            .iter()
            .map(|r| r.metrics().unwrap().payback_months)
            .collect();
        assert!(paybacks.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_balance_picks_best_score() {
        let req = request(prefs(RiskTolerance::Moderado, Priority::Balance));
        let tables = ReferenceTables::default();
        let config = GeneratorConfig {
            max_duration: 12,
            ..Default::default()
        };
        let output = ScenarioGenerator::new(&tables, config)
            .generate_all(&req)
            .unwrap();
        let context = FilterContext {
            preferences: req.preferences.clone().unwrap(),
            target_pension: None,
            min_uma_level: 1,
            shortlist_size: usize::MAX,
        };
        let filter = PreferenceFilter::default();
        let ranked = filter.filter(&output.results, &context);
        assert_eq!(ranked.len(), output.results.len());

        let pairs: Vec<(&ScenarioResult, &ScenarioMetrics)> =
            ranked.iter().map(|r| (*r, r.metrics().unwrap())).collect();
        let scores = balance_scores(&pairs);
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_budget_below_cheapest_is_empty_with_note() {
        let mut req = request(prefs(RiskTolerance::Moderado, Priority::PensionMaxima));
        if let Some(p) = req.preferences.as_mut() {
            p.budget_ceiling = Some(100.0);
        }
        let response = plan(&req);
        assert!(response.results.is_empty());
        assert!(response.metadata.filter_applied);
        assert!(response.metadata.note.is_some());
    }

    #[test]
    fn test_budget_caps_monthly_contribution() {
        let mut req = request(prefs(RiskTolerance::Moderado, Priority::PensionMaxima));
        if let Some(p) = req.preferences.as_mut() {
            p.budget_ceiling = Some(5_000.0);
        }
        let response = plan(&req);
        assert!(!response.results.is_empty());
        assert!(response
            .results
            .iter()
            .all(|r| r.metrics().unwrap().monthly_contribution_max <= 5_000.0));
    }

    #[test]
    fn test_target_only_ranks_cheapest_reaching_target() {
        let target = 20_000.0;
        let req = PlanRequest {
            target_pension: Some(target),
            ..request(None)
        };
        let response = plan(&req);

        assert!(response.metadata.filter_applied);
        assert_eq!(response.metadata.target_pension, Some(target));
        let applied = response.metadata.applied_preferences.as_ref().unwrap();
        assert_eq!(applied.priority, Priority::InversionMinima);
        for result in &response.results {
            assert!(result.metrics().unwrap().gross_pension >= target);
        }
    }

    #[test]
    fn test_failed_scenarios_excluded() {
        let req = PlanRequest {
            prior_weeks: 300,
            ..request(prefs(RiskTolerance::Moderado, Priority::InversionMinima))
        };
        let tables = ReferenceTables::default();
        let output = ScenarioGenerator::new(&tables, GeneratorConfig::default())
            .generate_all(&req)
            .unwrap();
        assert!(output.metadata.total_failed > 0);

        let response = rank(output, &req, &tables, &PreferenceFilter::default(), 5);
        assert!(!response.results.is_empty());
        assert!(response.results.iter().all(|r| r.error().is_none()));
    }

    #[test]
    fn test_minimum_level_bounds() {
        let tables = ReferenceTables::default();
        assert_eq!(minimum_uma_level(&tables, 10.0, 2026), 1);
        assert_eq!(minimum_uma_level(&tables, 117.31 * 40.0, 2026), 25);
        assert_eq!(minimum_uma_level(&tables, 500.0, 1990), 1);
    }

    #[test]
    fn test_normalize_flat_range() {
        assert_eq!(normalize(3.0, 3.0, 3.0), 0.0);
        assert_eq!(normalize(5.0, 0.0, 10.0), 0.5);
    }
}
