//! Month-by-month M40 contribution ledger and averaged SDI

use crate::assumptions::{JanuaryUmaPolicy, ReferenceTables, AVERAGING_WINDOW_MONTHS, DAYS_PER_MONTH};
use crate::error::ScenarioError;
use crate::strategy::{Strategy, StrategyMode};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// One simulated contribution month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContributionRecord {
    pub year: i32,
    pub month: u32,
    pub daily_uma: f64,
    pub daily_sdi: f64,
    pub rate: f64,
    pub monthly_contribution: f64,
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub records: Vec<ContributionRecord>,
    /// Average daily SDI over the 58-month window
    pub average_sdi: f64,
    pub total_investment: f64,
    /// Whole weeks credited by the M40 months
    pub weeks_accrued: u32,
    /// First month after the last contribution
    pub end_month: NaiveDate,
}

impl SimulationResult {
    pub fn max_monthly_contribution(&self) -> f64 {
        self.records
            .iter()
            .map(|r| r.monthly_contribution)
            .fold(0.0, f64::max)
    }

    pub fn first_monthly_contribution(&self) -> f64 {
        self.records.first().map(|r| r.monthly_contribution).unwrap_or(0.0)
    }
}

/// Weeks credited for a number of contribution months (30.4 / 7 per month)
pub fn weeks_for_months(months: u32) -> u32 {
    // Small epsilon so exact multiples of 7 days are not lost to rounding
    (months as f64 * DAYS_PER_MONTH / 7.0 + 1e-9).floor() as u32
}

pub struct SdiSimulator<'a> {
    tables: &'a ReferenceTables,
    january_policy: JanuaryUmaPolicy,
}

impl<'a> SdiSimulator<'a> {
    pub fn new(tables: &'a ReferenceTables, january_policy: JanuaryUmaPolicy) -> Self {
        Self {
            tables,
            january_policy,
        }
    }

    /// Run the contribution ledger for `strategy`.
    ///
    /// `historical_daily_sdi` fills the averaging window when the strategy
    /// is shorter than 58 months; simulated months count as the most recent.
    pub fn simulate(
        &self,
        strategy: &Strategy,
        historical_daily_sdi: f64,
    ) -> Result<SimulationResult, ScenarioError> {
        if strategy.duration_months == 0 {
            return Err(ScenarioError::InvalidStrategy {
                detail: "duration must be at least one month".into(),
            });
        }
        if strategy.uma_level == 0 {
            return Err(ScenarioError::InvalidStrategy {
                detail: "UMA level must be at least 1".into(),
            });
        }

        let uma_table = &self.tables.uma;
        let level = strategy.uma_level as f64;

        // Fixed mode pins the salary to the UMA of the start month, resolved
        // with the same January rule as every other month
        let pinned_uma = uma_table.for_month(
            strategy.start.year(),
            strategy.start.month(),
            self.january_policy,
        )?;

        let mut records = Vec::with_capacity(strategy.duration_months as usize);
        for offset in 0..strategy.duration_months {
            let date = add_months(strategy.start, offset)?;
            let (year, month) = (date.year(), date.month());

            let daily_uma = uma_table.for_month(year, month, self.january_policy)?;
            let daily_sdi = match strategy.mode {
                StrategyMode::Progressive => daily_uma * level,
                StrategyMode::Fixed => pinned_uma * level,
            };
            let rate = self.tables.contribution_rates.rate_for(year);

            records.push(ContributionRecord {
                year,
                month,
                daily_uma,
                daily_sdi,
                rate,
                monthly_contribution: daily_sdi * DAYS_PER_MONTH * rate,
            });
        }

        let average_sdi = average_with_history(&records, historical_daily_sdi);
        let total_investment = records.iter().map(|r| r.monthly_contribution).sum();
        let end_month = add_months(strategy.start, strategy.duration_months)?;

        Ok(SimulationResult {
            records,
            average_sdi,
            total_investment,
            weeks_accrued: weeks_for_months(strategy.duration_months),
            end_month,
        })
    }
}

fn add_months(start: NaiveDate, months: u32) -> Result<NaiveDate, ScenarioError> {
    start
        .checked_add_months(Months::new(months))
        .ok_or_else(|| ScenarioError::DateArithmetic {
            detail: format!("{} + {} months is out of range", start, months),
        })
}

/// Average over the last 58 months, topping up with the historical SDI
/// when fewer months were simulated
fn average_with_history(records: &[ContributionRecord], historical_daily_sdi: f64) -> f64 {
    let window = AVERAGING_WINDOW_MONTHS as usize;
    let simulated = records.len().min(window);
    let recent_sum: f64 = records[records.len() - simulated..]
        .iter()
        .map(|r| r.daily_sdi)
        .sum();
    let filler = (window - simulated) as f64 * historical_daily_sdi;
    (recent_sum + filler) / window as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ymd(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn test_fixed_full_window() {
        let tables = ReferenceTables::default();
        let sim = SdiSimulator::new(&tables, JanuaryUmaPolicy::PriorYear);
        let strategy = Strategy::new(58, StrategyMode::Fixed, 10, ymd(2026, 2));

        let result = sim.simulate(&strategy, 100.0).unwrap();

        assert_eq!(result.records.len(), 58);
        // Pinned to the 2026 UMA for every month, no historical blending
        assert_relative_eq!(result.average_sdi, 10.0 * 117.31, epsilon = 1e-9);
        assert!(result.records.iter().all(|r| (r.daily_sdi - 1173.1).abs() < 1e-9));
        assert_eq!(result.end_month, ymd(2030, 12));
        assert_eq!(result.weeks_accrued, 251);
    }

    #[test]
    fn test_full_window_is_plain_mean() {
        let tables = ReferenceTables::default();
        let sim = SdiSimulator::new(&tables, JanuaryUmaPolicy::PriorYear);
        let strategy = Strategy::new(58, StrategyMode::Progressive, 7, ymd(2025, 3));

        let result = sim.simulate(&strategy, 9_999.0).unwrap();
        let mean = result.records.iter().map(|r| r.daily_sdi).sum::<f64>() / 58.0;
        assert_relative_eq!(result.average_sdi, mean, epsilon = 1e-9);
    }

    #[test]
    fn test_short_duration_blends_history() {
        let tables = ReferenceTables::default();
        let sim = SdiSimulator::new(&tables, JanuaryUmaPolicy::PriorYear);
        let strategy = Strategy::new(12, StrategyMode::Progressive, 20, ymd(2026, 2));

        let result = sim.simulate(&strategy, 300.0).unwrap();
        let simulated: f64 = result.records.iter().map(|r| r.daily_sdi).sum();
        let expected = (simulated + 46.0 * 300.0) / 58.0;
        assert_relative_eq!(result.average_sdi, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_long_duration_uses_latest_months() {
        let tables = ReferenceTables::default();
        let sim = SdiSimulator::new(&tables, JanuaryUmaPolicy::PriorYear);
        let strategy = Strategy::new(70, StrategyMode::Progressive, 5, ymd(2024, 2));

        let result = sim.simulate(&strategy, 0.0).unwrap();
        let latest: f64 = result.records[12..].iter().map(|r| r.daily_sdi).sum();
        assert_relative_eq!(result.average_sdi, latest / 58.0, epsilon = 1e-9);
    }

    #[test]
    fn test_progressive_follows_uma() {
        let tables = ReferenceTables::default();
        let sim = SdiSimulator::new(&tables, JanuaryUmaPolicy::PriorYear);
        let strategy = Strategy::new(14, StrategyMode::Progressive, 10, ymd(2025, 12));

        let result = sim.simulate(&strategy, 0.0).unwrap();
        // Dec 2025 and Jan 2026 on the 2025 UMA, Feb 2026 onwards on 2026
        assert_relative_eq!(result.records[0].daily_sdi, 1131.4, epsilon = 1e-9);
        assert_relative_eq!(result.records[1].daily_sdi, 1131.4, epsilon = 1e-9);
        assert_relative_eq!(result.records[2].daily_sdi, 1173.1, epsilon = 1e-9);
        // Contribution rate follows the calendar year
        assert_eq!(result.records[0].rate, 0.13347);
        assert_eq!(result.records[1].rate, 0.14438);
    }

    #[test]
    fn test_january_policy_applies_to_fixed_start() {
        let tables = ReferenceTables::default();
        let strategy = Strategy::new(6, StrategyMode::Fixed, 10, ymd(2026, 1));

        let prior = SdiSimulator::new(&tables, JanuaryUmaPolicy::PriorYear)
            .simulate(&strategy, 0.0)
            .unwrap();
        let current = SdiSimulator::new(&tables, JanuaryUmaPolicy::CurrentYear)
            .simulate(&strategy, 0.0)
            .unwrap();

        assert_relative_eq!(prior.records[0].daily_sdi, 1131.4, epsilon = 1e-9);
        assert_relative_eq!(current.records[0].daily_sdi, 1173.1, epsilon = 1e-9);
    }

    #[test]
    fn test_contribution_amount() {
        let tables = ReferenceTables::default();
        let sim = SdiSimulator::new(&tables, JanuaryUmaPolicy::PriorYear);
        let strategy = Strategy::new(1, StrategyMode::Fixed, 25, ymd(2025, 6));

        let result = sim.simulate(&strategy, 0.0).unwrap();
        let expected = 25.0 * 113.14 * 30.4 * 0.13347;
        assert_relative_eq!(result.records[0].monthly_contribution, expected, epsilon = 1e-6);
        assert_relative_eq!(result.total_investment, expected, epsilon = 1e-6);
        assert_relative_eq!(result.max_monthly_contribution(), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_invalid_strategies() {
        let tables = ReferenceTables::default();
        let sim = SdiSimulator::new(&tables, JanuaryUmaPolicy::PriorYear);

        let zero = Strategy::new(0, StrategyMode::Fixed, 10, ymd(2026, 2));
        assert!(matches!(
            sim.simulate(&zero, 100.0),
            Err(ScenarioError::InvalidStrategy { .. })
        ));

        let no_level = Strategy::new(12, StrategyMode::Fixed, 0, ymd(2026, 2));
        assert!(sim.simulate(&no_level, 100.0).is_err());

        // Before the first published UMA
        let early = Strategy::new(12, StrategyMode::Progressive, 10, ymd(2015, 2));
        assert_eq!(
            sim.simulate(&early, 100.0).unwrap_err(),
            ScenarioError::MissingUma { year: 2015 }
        );
    }

    #[test]
    fn test_weeks_per_month() {
        assert_eq!(weeks_for_months(0), 0);
        assert_eq!(weeks_for_months(1), 4);
        assert_eq!(weeks_for_months(35), 152);
        assert_eq!(weeks_for_months(58), 251);
    }
}
