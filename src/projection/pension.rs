//! Ley 73 pension formula

use crate::assumptions::{ReferenceTables, DAYS_PER_MONTH, LEY_FOX_FACTOR};
use crate::error::ScenarioError;
use crate::strategy::Dependents;
use serde::{Deserialize, Serialize};

/// Result of the pension formula for one averaged salary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PensionBreakdown {
    /// Monthly pension after every adjustment and the PMG floor
    pub gross_monthly: f64,
    /// Monthly equivalent including the year-end bonus (13 payments a year)
    pub with_year_end_bonus: f64,
    pub factor_edad: f64,
    pub ley_fox_factor: f64,
    /// Article-167 percentage (basic plus annual increments)
    pub bracket_percent: f64,
    /// Percentage of the average SDI actually paid before the age factor,
    /// Ley Fox and surcharge. Differs from `bracket_percent` only when the
    /// edge guard raised the base.
    pub effective_percent: f64,
    pub edge_guard_applied: bool,
    pub uma_multiple: f64,
    /// True when the PMG floor replaced the computed amount
    pub floor_applied: bool,
}

pub struct PensionEngine<'a> {
    tables: &'a ReferenceTables,
}

impl<'a> PensionEngine<'a> {
    pub fn new(tables: &'a ReferenceTables) -> Self {
        Self { tables }
    }

    /// Monthly pension for an average daily SDI.
    ///
    /// `reference_year` selects the UMA used to express the salary as a
    /// multiple (the year the pension starts).
    pub fn compute(
        &self,
        average_sdi: f64,
        total_weeks: u32,
        age_at_pension: u8,
        dependents: Dependents,
        reference_year: i32,
    ) -> Result<PensionBreakdown, ScenarioError> {
        let tables = self.tables;
        let uma = tables.uma.daily_value(reference_year)?;
        let uma_multiple = average_sdi / uma;

        let (index, bracket) = tables.law167.lookup(uma_multiple);
        let bracket_percent = bracket.percent_for(total_weeks);

        // Never pay less than the bracket below does at its upper edge,
        // so a raise cannot lower the pension
        let nominal_daily = bracket_percent / 100.0 * average_sdi;
        let edge_daily = tables.law167.edge_amount_below(index, total_weeks) * uma;
        let edge_guard_applied = edge_daily > nominal_daily;
        let base_daily = if edge_guard_applied { edge_daily } else { nominal_daily };
        let effective_percent = if edge_guard_applied && average_sdi > 0.0 {
            base_daily / average_sdi * 100.0
        } else {
            bracket_percent
        };
        let base_monthly = base_daily * DAYS_PER_MONTH;

        let factor_edad = tables.age_factors.get_factor(age_at_pension);
        let surcharge = tables.dependent_surcharge.rate_for(dependents);
        let computed = base_monthly * factor_edad * LEY_FOX_FACTOR * (1.0 + surcharge);

        // Floor goes last, after every other adjustment
        let floor = tables.pmg.monthly_floor();
        let (gross_monthly, floor_applied) = if computed < floor {
            (floor, true)
        } else {
            (computed, false)
        };

        Ok(PensionBreakdown {
            gross_monthly,
            with_year_end_bonus: gross_monthly * 13.0 / 12.0,
            factor_edad,
            ley_fox_factor: LEY_FOX_FACTOR,
            bracket_percent,
            effective_percent,
            edge_guard_applied,
            uma_multiple,
            floor_applied,
        })
    }
}
