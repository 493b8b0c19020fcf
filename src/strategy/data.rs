use crate::assumptions::DAYS_PER_MONTH;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the registered salary evolves over the contribution period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StrategyMode {
    /// Pinned to the UMA in effect at the start date
    #[serde(rename = "fijo", alias = "fixed")]
    Fixed,
    /// Follows each year's UMA times the chosen level
    #[serde(rename = "progresivo", alias = "progressive")]
    Progressive,
}

impl StrategyMode {
    pub const ALL: [StrategyMode; 2] = [StrategyMode::Fixed, StrategyMode::Progressive];

    pub fn code(self) -> &'static str {
        match self {
            StrategyMode::Fixed => "fijo",
            StrategyMode::Progressive => "progresivo",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "fijo" => Some(StrategyMode::Fixed),
            "progresivo" => Some(StrategyMode::Progressive),
            _ => None,
        }
    }
}

impl fmt::Display for StrategyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One candidate contribution strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    pub duration_months: u32,
    pub mode: StrategyMode,
    /// Registered salary in UMA multiples (1..=25)
    pub uma_level: u32,
    /// First contribution month (always the 1st of the month)
    pub start: NaiveDate,
}

impl Strategy {
    pub fn new(duration_months: u32, mode: StrategyMode, uma_level: u32, start: NaiveDate) -> Self {
        Self {
            duration_months,
            mode,
            uma_level,
            start: first_of_month(start),
        }
    }
}

/// Normalize a date to the first day of its month
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Monthly salary rounded to whole centavos
pub fn salary_centavos(monthly_salary: f64) -> u64 {
    (monthly_salary * 100.0).round().max(0.0) as u64
}

/// Daily SDI for a monthly salary given in centavos. Every daily SDI the
/// engine uses goes through here, so a token replays bit-for-bit.
pub fn daily_sdi_from_centavos(salary_centavos: u64) -> f64 {
    salary_centavos as f64 / 100.0 / DAYS_PER_MONTH
}

/// Family status relevant to the pension surcharge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dependents {
    Conyuge,
    #[default]
    Ninguno,
}

impl Dependents {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "conyuge" => Some(Dependents::Conyuge),
            "ninguno" => Some(Dependents::Ninguno),
            _ => None,
        }
    }
}

/// Civil status as captured from the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CivilStatus {
    Casado,
    UnionLibre,
    Soltero,
    Divorciado,
    Viudo,
}

impl CivilStatus {
    pub fn dependents(self) -> Dependents {
        match self {
            CivilStatus::Casado | CivilStatus::UnionLibre => Dependents::Conyuge,
            CivilStatus::Soltero | CivilStatus::Divorciado | CivilStatus::Viudo => {
                Dependents::Ninguno
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Conservador,
    Moderado,
    Agresivo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    PensionMaxima,
    InversionMinima,
    Balance,
    RecuperacionRapida,
}

/// What the user asked the shortlist to favour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Maximum monthly contribution the user can afford (MXN)
    #[serde(default)]
    pub budget_ceiling: Option<f64>,
    pub risk_tolerance: RiskTolerance,
    pub priority: Priority,
}

/// Worker data every scenario shares
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerProfile {
    pub birth_date: NaiveDate,
    pub retirement_age: u8,
    /// Weeks contributed before starting M40
    pub prior_weeks: u32,
    /// Pre-M40 daily SDI (monthly salary in centavos / 100 / 30.4)
    pub historical_daily_sdi: f64,
    pub dependents: Dependents,
}

impl WorkerProfile {
    /// Date the worker reaches `retirement_age`. Feb 29 birthdays fall
    /// back to Feb 28 in non-leap years.
    pub fn retirement_date(&self) -> Option<NaiveDate> {
        let year = self.birth_date.year() + self.retirement_age as i32;
        NaiveDate::from_ymd_opt(year, self.birth_date.month(), self.birth_date.day())
            .or_else(|| NaiveDate::from_ymd_opt(year, self.birth_date.month(), 28))
    }

    /// Whole years of age on `date`
    pub fn age_at(&self, date: NaiveDate) -> u8 {
        let mut age = date.year() - self.birth_date.year();
        if (date.month(), date.day()) < (self.birth_date.month(), self.birth_date.day()) {
            age -= 1;
        }
        age.clamp(0, u8::MAX as i32) as u8
    }
}
