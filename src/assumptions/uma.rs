//! Year-indexed tables: UMA values, M40 contribution rates and the
//! legal ceiling on the UMA multiple a worker may register

use crate::error::ScenarioError;
use serde::{Deserialize, Serialize};

/// Contribution rate used for any year missing from the rate table
/// (the rate the 2020 reform schedule settles on)
pub const DEFAULT_CONTRIBUTION_RATE: f64 = 0.188;

/// Legal ceiling on the registered salary, in UMA multiples
pub const DEFAULT_UMA_CEILING: u32 = 25;

/// Which UMA applies to January contributions.
///
/// The new UMA is published in early January and takes effect February 1st,
/// so January payments are normally settled against the prior year's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JanuaryUmaPolicy {
    /// January of year Y uses year Y-1's UMA
    #[default]
    PriorYear,
    /// January uses its own calendar year's UMA
    CurrentYear,
}

/// Daily UMA value by calendar year
#[derive(Debug, Clone)]
pub struct UmaTable {
    /// (year, daily value in MXN), sorted by year
    values: Vec<(i32, f64)>,
    /// Annual growth used past the last published year
    projected_growth: f64,
}

impl Default for UmaTable {
    fn default() -> Self {
        // Published by INEGI
        Self {
            values: vec![
                (2017, 75.49),
                (2018, 80.60),
                (2019, 84.49),
                (2020, 86.88),
                (2021, 89.62),
                (2022, 96.22),
                (2023, 103.74),
                (2024, 108.57),
                (2025, 113.14),
                (2026, 117.31),
            ],
            projected_growth: 0.04,
        }
    }
}

impl UmaTable {
    /// Create from loaded CSV data
    pub fn from_loaded(values: &[(i32, f64)], projected_growth: f64) -> Self {
        let mut values = values.to_vec();
        values.sort_by_key(|(year, _)| *year);
        Self {
            values,
            projected_growth,
        }
    }

    pub fn projected_growth(&self) -> f64 {
        self.projected_growth
    }

    /// Daily UMA for a calendar year.
    ///
    /// Years after the last entry are extrapolated with `projected_growth`;
    /// years before the first entry cannot be defaulted.
    pub fn daily_value(&self, year: i32) -> Result<f64, ScenarioError> {
        if let Some((_, value)) = self.values.iter().find(|(y, _)| *y == year) {
            return Ok(*value);
        }

        match (self.values.first(), self.values.last()) {
            (Some(&(first_year, _)), Some(&(last_year, last_value))) => {
                if year < first_year {
                    Err(ScenarioError::MissingUma { year })
                } else if year > last_year {
                    let years_out = year - last_year;
                    log::trace!("UMA {} projected {} years past {}", year, years_out, last_year);
                    Ok(last_value * (1.0 + self.projected_growth).powi(years_out))
                } else {
                    // Gap inside the table
                    Err(ScenarioError::MissingUma { year })
                }
            }
            _ => Err(ScenarioError::MissingUma { year }),
        }
    }

    /// UMA governing contributions paid for a given month
    pub fn for_month(
        &self,
        year: i32,
        month: u32,
        policy: JanuaryUmaPolicy,
    ) -> Result<f64, ScenarioError> {
        match policy {
            JanuaryUmaPolicy::PriorYear if month == 1 => self.daily_value(year - 1),
            JanuaryUmaPolicy::PriorYear | JanuaryUmaPolicy::CurrentYear => self.daily_value(year),
        }
    }
}

/// M40 contribution rate (fraction of the registered salary) by year
#[derive(Debug, Clone)]
pub struct ContributionRateTable {
    rates: Vec<(i32, f64)>,
}

impl Default for ContributionRateTable {
    fn default() -> Self {
        // Gradual increase set by the 2020 pension reform
        Self {
            rates: vec![
                (2017, 0.10075),
                (2018, 0.10075),
                (2019, 0.10075),
                (2020, 0.10075),
                (2021, 0.10075),
                (2022, 0.10075),
                (2023, 0.11166),
                (2024, 0.12256),
                (2025, 0.13347),
                (2026, 0.14438),
                (2027, 0.15528),
                (2028, 0.16619),
                (2029, 0.17709),
                (2030, 0.18800),
            ],
        }
    }
}

impl ContributionRateTable {
    /// Create from loaded CSV data
    pub fn from_loaded(rates: &[(i32, f64)]) -> Self {
        Self {
            rates: rates.to_vec(),
        }
    }

    /// Rate for a year, `DEFAULT_CONTRIBUTION_RATE` when the year is absent
    pub fn rate_for(&self, year: i32) -> f64 {
        for (y, rate) in &self.rates {
            if *y == year {
                return *rate;
            }
        }
        log::trace!("no contribution rate for {}, using default", year);
        DEFAULT_CONTRIBUTION_RATE
    }
}

/// Maximum UMA multiple that may be registered in each year
#[derive(Debug, Clone)]
pub struct UmaCeilingTable {
    ceilings: Vec<(i32, u32)>,
    default_ceiling: u32,
}

impl Default for UmaCeilingTable {
    fn default() -> Self {
        Self {
            ceilings: (2017..=2030).map(|year| (year, DEFAULT_UMA_CEILING)).collect(),
            default_ceiling: DEFAULT_UMA_CEILING,
        }
    }
}

impl UmaCeilingTable {
    pub fn from_loaded(ceilings: &[(i32, u32)], default_ceiling: u32) -> Self {
        Self {
            ceilings: ceilings.to_vec(),
            default_ceiling,
        }
    }

    pub fn max_level(&self, year: i32) -> u32 {
        self.ceilings
            .iter()
            .find(|(y, _)| *y == year)
            .map(|(_, c)| *c)
            .unwrap_or(self.default_ceiling)
    }

    /// Lowest ceiling across an inclusive range of years
    pub fn max_level_between(&self, first_year: i32, last_year: i32) -> u32 {
        (first_year..=last_year)
            .map(|year| self.max_level(year))
            .min()
            .unwrap_or(self.default_ceiling)
    }
}
