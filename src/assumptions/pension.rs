//! Ley 73 pension tables: article-167 brackets, cesantia age factors,
//! family surcharges and the minimum guaranteed pension

use super::DAYS_PER_MONTH;
use crate::error::{M40Error, M40Result};
use crate::strategy::Dependents;

/// Weeks required to qualify for a pension, and the point from which
/// annual increments start accruing
pub const MINIMUM_WEEKS: u32 = 500;

/// Weeks that make up one year of annual increments
pub const WEEKS_PER_INCREMENT: u32 = 52;

/// Statutory uplift granted by the 2004 decree ("Ley Fox")
pub const LEY_FOX_FACTOR: f64 = 1.11;

/// One row of the article-167 table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Law167Bracket {
    /// Upper bound of the bracket, in UMA multiples (inclusive)
    pub upper_bound: f64,
    /// Basic amount, percent of the average salary
    pub basic_pct: f64,
    /// Increment per year contributed beyond 500 weeks, percent
    pub annual_increment_pct: f64,
}

impl Law167Bracket {
    /// Total percentage for a worker with `total_weeks`, capped at 100%
    pub fn percent_for(&self, total_weeks: u32) -> f64 {
        let increments = total_weeks.saturating_sub(MINIMUM_WEEKS) / WEEKS_PER_INCREMENT;
        (self.basic_pct + self.annual_increment_pct * increments as f64).min(100.0)
    }
}

/// Article-167 table, monotonic in UMA multiples
#[derive(Debug, Clone)]
pub struct Law167Table {
    brackets: Vec<Law167Bracket>,
}

impl Default for Law167Table {
    fn default() -> Self {
        // (upper bound in UMA, basic %, annual increment %)
        let rows: &[(f64, f64, f64)] = &[
            (1.00, 80.00, 0.563),
            (1.25, 77.11, 0.814),
            (1.50, 58.18, 1.178),
            (1.75, 49.23, 1.430),
            (2.00, 42.67, 1.615),
            (2.25, 37.65, 1.756),
            (2.50, 33.68, 1.868),
            (2.75, 30.48, 1.958),
            (3.00, 27.83, 2.033),
            (3.25, 25.60, 2.096),
            (3.50, 23.70, 2.149),
            (3.75, 22.07, 2.195),
            (4.00, 20.65, 2.235),
            (4.25, 19.39, 2.271),
            (4.50, 18.29, 2.302),
            (4.75, 17.30, 2.330),
            (5.00, 16.41, 2.355),
            (5.25, 15.61, 2.377),
            (5.50, 14.88, 2.398),
            (5.75, 14.22, 2.416),
            (6.00, 13.62, 2.433),
            (25.00, 13.00, 2.450),
        ];
        Self {
            brackets: brackets_from_rows(rows),
        }
    }
}

fn brackets_from_rows(rows: &[(f64, f64, f64)]) -> Vec<Law167Bracket> {
    rows.iter()
        .map(|&(upper_bound, basic_pct, annual_increment_pct)| Law167Bracket {
            upper_bound,
            basic_pct,
            annual_increment_pct,
        })
        .collect()
}

impl Law167Table {
    /// Build from `(upper bound, basic %, increment %)` rows. The table must
    /// be non-empty with strictly increasing upper bounds.
    pub fn from_rows(rows: &[(f64, f64, f64)]) -> M40Result<Self> {
        if rows.is_empty() {
            return Err(M40Error::TableLoad("article-167 table has no brackets".into()));
        }
        if rows.windows(2).any(|pair| pair[1].0 <= pair[0].0) {
            return Err(M40Error::TableLoad(
                "article-167 upper bounds must be strictly increasing".into(),
            ));
        }
        Ok(Self {
            brackets: brackets_from_rows(rows),
        })
    }

    /// Bracket for a salary expressed in UMA multiples.
    ///
    /// Lowest upper bound >= multiple; anything past the table lands in
    /// the top bracket.
    pub fn lookup(&self, uma_multiple: f64) -> (usize, Law167Bracket) {
        let last = self.brackets.len().saturating_sub(1);
        let index = self
            .brackets
            .iter()
            .position(|b| b.upper_bound >= uma_multiple)
            .unwrap_or(last);
        (index, self.brackets[index])
    }

    /// Largest amount (percent x UMA multiple / 100) any bracket below
    /// `index` pays at its own upper edge. Zero for the first bracket.
    pub fn edge_amount_below(&self, index: usize, total_weeks: u32) -> f64 {
        self.brackets[..index]
            .iter()
            .map(|b| b.percent_for(total_weeks) / 100.0 * b.upper_bound)
            .fold(0.0, f64::max)
    }
}

/// Cesantia en edad avanzada factors by age at pension start
#[derive(Debug, Clone)]
pub struct AgeFactorTable {
    factors: Vec<(u8, f64)>,
}

impl Default for AgeFactorTable {
    fn default() -> Self {
        Self {
            factors: vec![
                (60, 0.75),
                (61, 0.80),
                (62, 0.85),
                (63, 0.90),
                (64, 0.95),
                (65, 1.00),
            ],
        }
    }
}

impl AgeFactorTable {
    pub fn from_loaded(factors: &[(u8, f64)]) -> Self {
        Self {
            factors: factors.to_vec(),
        }
    }

    /// Factor for an age; ages outside the table get 1.0
    pub fn get_factor(&self, age: u8) -> f64 {
        self.factors
            .iter()
            .find(|(a, _)| *a == age)
            .map(|(_, f)| *f)
            .unwrap_or(1.0)
    }
}

/// Family allowance added on top of the pension
#[derive(Debug, Clone)]
pub struct DependentSurcharge {
    pub conyuge: f64,
    pub ninguno: f64,
}

impl Default for DependentSurcharge {
    fn default() -> Self {
        Self {
            conyuge: 0.15, // asignacion por esposa o concubina
            ninguno: 0.0,
        }
    }
}

impl DependentSurcharge {
    pub fn rate_for(&self, dependents: Dependents) -> f64 {
        match dependents {
            Dependents::Conyuge => self.conyuge,
            Dependents::Ninguno => self.ninguno,
        }
    }
}

/// Pension Minima Garantizada
#[derive(Debug, Clone)]
pub struct PmgParams {
    /// General minimum daily wage (MXN)
    pub minimum_daily_wage: f64,
    pub factor: f64,
}

impl Default for PmgParams {
    fn default() -> Self {
        Self {
            minimum_daily_wage: 278.0,
            factor: 1.15,
        }
    }
}

impl PmgParams {
    /// Monthly floor no Ley 73 pension may fall below
    pub fn monthly_floor(&self) -> f64 {
        self.minimum_daily_wage * self.factor * DAYS_PER_MONTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bracket_lookup() {
        let table = Law167Table::default();

        assert_eq!(table.lookup(0.5).0, 0);
        assert_eq!(table.lookup(1.0).1.basic_pct, 80.00);
        assert_eq!(table.lookup(1.01).1.basic_pct, 77.11);
        assert_eq!(table.lookup(6.0).1.basic_pct, 13.62);
        assert_eq!(table.lookup(10.0).1.basic_pct, 13.00);
        // Past the table: top bracket, no error
        assert_eq!(table.lookup(400.0).1.basic_pct, 13.00);
    }

    #[test]
    fn test_bracket_percent_increments() {
        let top = Law167Table::default().lookup(10.0).1;

        // Under 500 weeks: basic only
        assert_eq!(top.percent_for(400), 13.0);
        // 1540 weeks: (1540 - 500) / 52 = 20 increments
        assert_relative_eq!(top.percent_for(1540), 13.0 + 2.45 * 20.0, epsilon = 1e-9);
        // Capped at 100%
        assert_eq!(top.percent_for(5000), 100.0);
    }

    #[test]
    fn test_edge_amount_below() {
        let table = Law167Table::default();
        assert_eq!(table.edge_amount_below(0, 1000), 0.0);

        let (index, _) = table.lookup(1.1);
        // Only the first bracket (up to 1.00) lies below
        let expected = (80.0 + 0.563 * 9.0) / 100.0 * 1.0;
        assert_relative_eq!(table.edge_amount_below(index, 1000), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_from_rows_validation() {
        let table = Law167Table::from_rows(&[(2.0, 50.0, 1.0), (25.0, 13.0, 2.45)]).unwrap();
        assert_eq!(table.lookup(1.5).1.basic_pct, 50.0);
        assert_eq!(table.lookup(30.0).1.basic_pct, 13.0);

        assert!(matches!(Law167Table::from_rows(&[]), Err(M40Error::TableLoad(_))));
        assert!(Law167Table::from_rows(&[(6.0, 13.62, 2.433), (1.0, 80.0, 0.563)]).is_err());
    }

    #[test]
    fn test_age_factors() {
        let ages = AgeFactorTable::default();
        assert_eq!(ages.get_factor(60), 0.75);
        assert_eq!(ages.get_factor(63), 0.90);
        assert_eq!(ages.get_factor(65), 1.00);
        // Outside the table
        assert_eq!(ages.get_factor(58), 1.0);
        assert_eq!(ages.get_factor(70), 1.0);
    }

    #[test]
    fn test_pmg_floor() {
        let pmg = PmgParams::default();
        // 278 x 1.15 x 30.4
        assert_relative_eq!(pmg.monthly_floor(), 9_718.88, epsilon = 1e-9);
    }

    #[test]
    fn test_dependent_surcharge() {
        let surcharge = DependentSurcharge::default();
        assert_eq!(surcharge.rate_for(Dependents::Conyuge), 0.15);
        assert_eq!(surcharge.rate_for(Dependents::Ninguno), 0.0);
    }
}
