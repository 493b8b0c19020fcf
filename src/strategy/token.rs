//! Strategy token used by the replay interface
//!
//! Eight fields joined by `|`, in this order:
//!
//! `uma_level|duration_months|mode|YYYY-MM|YYYY-MM-DD|retirement_age|prior_weeks|salary_centavos`
//!
//! e.g. `15|58|progresivo|2026-02|1966-03-15|60|1200|1520000`.
//! The last field is the historical monthly salary in centavos; the daily
//! SDI is derived from it the same way the generator derives it.
//! Tokens are stored by callers, so the layout must not change and
//! `parse(s).to_string() == s` must hold for every accepted token.

use super::{daily_sdi_from_centavos, first_of_month, salary_centavos, Dependents, Strategy, StrategyMode, WorkerProfile};
use crate::assumptions::DAYS_PER_MONTH;
use crate::error::{M40Error, M40Result};
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

pub const TOKEN_SEPARATOR: char = '|';
pub const TOKEN_FIELDS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyToken {
    pub uma_level: u32,
    pub duration_months: u32,
    pub mode: StrategyMode,
    pub start: NaiveDate,
    pub birth_date: NaiveDate,
    pub retirement_age: u8,
    pub prior_weeks: u32,
    pub salary_centavos: u64,
}

impl StrategyToken {
    pub fn new(strategy: &Strategy, profile: &WorkerProfile) -> Self {
        Self {
            uma_level: strategy.uma_level,
            duration_months: strategy.duration_months,
            mode: strategy.mode,
            start: first_of_month(strategy.start),
            birth_date: profile.birth_date,
            retirement_age: profile.retirement_age,
            prior_weeks: profile.prior_weeks,
            salary_centavos: salary_centavos(profile.historical_daily_sdi * DAYS_PER_MONTH),
        }
    }

    pub fn strategy(&self) -> Strategy {
        Strategy::new(self.duration_months, self.mode, self.uma_level, self.start)
    }

    /// The token does not carry dependents; the caller supplies them
    pub fn profile(&self, dependents: Dependents) -> WorkerProfile {
        WorkerProfile {
            birth_date: self.birth_date,
            retirement_age: self.retirement_age,
            prior_weeks: self.prior_weeks,
            historical_daily_sdi: daily_sdi_from_centavos(self.salary_centavos),
            dependents,
        }
    }

    pub fn parse(token: &str) -> M40Result<Self> {
        let fields: Vec<&str> = token.split(TOKEN_SEPARATOR).collect();
        if fields.len() != TOKEN_FIELDS {
            return Err(M40Error::Token(format!(
                "expected {} fields, found {}",
                TOKEN_FIELDS,
                fields.len()
            )));
        }

        let parsed = Self {
            uma_level: parse_number(fields[0], "uma_level")?,
            duration_months: parse_number(fields[1], "duration_months")?,
            mode: StrategyMode::from_code(fields[2])
                .ok_or_else(|| M40Error::Token(format!("unknown mode '{}'", fields[2])))?,
            start: parse_date(&format!("{}-01", fields[3]), "start")?,
            birth_date: parse_date(fields[4], "birth_date")?,
            retirement_age: parse_number(fields[5], "retirement_age")?,
            prior_weeks: parse_number(fields[6], "prior_weeks")?,
            salary_centavos: parse_number(fields[7], "salary_centavos")?,
        };

        // Leading zeros and the like would not survive a round trip
        if parsed.to_string() != token {
            return Err(M40Error::Token(format!("non-canonical token '{}'", token)));
        }

        Ok(parsed)
    }
}

fn parse_number<T: FromStr>(field: &str, name: &str) -> M40Result<T> {
    field
        .parse()
        .map_err(|_| M40Error::Token(format!("{} is not a number: '{}'", name, field)))
}

fn parse_date(field: &str, name: &str) -> M40Result<NaiveDate> {
    NaiveDate::parse_from_str(field, "%Y-%m-%d")
        .map_err(|e| M40Error::Token(format!("{} '{}': {}", name, field, e)))
}

impl fmt::Display for StrategyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = TOKEN_SEPARATOR;
        write!(
            f,
            "{}{sep}{}{sep}{}{sep}{:04}-{:02}{sep}{}{sep}{}{sep}{}{sep}{}",
            self.uma_level,
            self.duration_months,
            self.mode.code(),
            self.start.year(),
            self.start.month(),
            self.birth_date.format("%Y-%m-%d"),
            self.retirement_age,
            self.prior_weeks,
            self.salary_centavos,
        )
    }
}

impl FromStr for StrategyToken {
    type Err = M40Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE: &str = "15|58|progresivo|2026-02|1966-03-15|60|1200|1520000";

    #[test]
    fn test_parse_sample() {
        let token = StrategyToken::parse(SAMPLE).expect("valid token");
        assert_eq!(token.uma_level, 15);
        assert_eq!(token.duration_months, 58);
        assert_eq!(token.mode, StrategyMode::Progressive);
        assert_eq!(token.start, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(token.birth_date, NaiveDate::from_ymd_opt(1966, 3, 15).unwrap());
        assert_eq!(token.retirement_age, 60);
        assert_eq!(token.prior_weeks, 1200);
        assert_eq!(token.salary_centavos, 1_520_000);
        assert_relative_eq!(
            token.profile(Dependents::Ninguno).historical_daily_sdi,
            500.0,
            epsilon = 1e-9
        );
        assert_eq!(token.to_string(), SAMPLE);
    }

    #[test]
    fn test_built_from_strategy() {
        let strategy = Strategy::new(
            24,
            StrategyMode::Fixed,
            25,
            NaiveDate::from_ymd_opt(2027, 11, 9).unwrap(),
        );
        let profile = WorkerProfile {
            birth_date: NaiveDate::from_ymd_opt(1968, 1, 5).unwrap(),
            retirement_age: 65,
            prior_weeks: 900,
            historical_daily_sdi: 12_535.44 / DAYS_PER_MONTH,
            dependents: Dependents::Conyuge,
        };
        let token = StrategyToken::new(&strategy, &profile);
        assert_eq!(token.to_string(), "25|24|fijo|2027-11|1968-01-05|65|900|1253544");

        let reparsed: StrategyToken = token.to_string().parse().unwrap();
        assert_eq!(reparsed, token);
        assert_eq!(reparsed.strategy(), strategy);
    }

    #[test]
    fn test_rejects_malformed() {
        // Wrong field count
        assert!(StrategyToken::parse("15|58|progresivo|2026-02|1966-03-15|60|1200").is_err());
        // Unknown mode
        assert!(StrategyToken::parse("15|58|mixto|2026-02|1966-03-15|60|1200|50000").is_err());
        // Bad month
        assert!(StrategyToken::parse("15|58|fijo|2026-13|1966-03-15|60|1200|50000").is_err());
        // Non-numeric level
        assert!(StrategyToken::parse("x|58|fijo|2026-02|1966-03-15|60|1200|50000").is_err());
        // Non-canonical forms
        assert!(StrategyToken::parse("015|58|fijo|2026-02|1966-03-15|60|1200|50000").is_err());
        assert!(StrategyToken::parse("15|58|fijo|2026-2|1966-03-15|60|1200|50000").is_err());
    }

    #[test]
    fn test_profile_sdi_survives_round_trip() {
        // 15 000 / 30.4 is not a whole number of centavos per day
        for salary in [15_000.0, 9_876.54, 33_333.33, 151_200.07] {
            let daily = daily_sdi_from_centavos(salary_centavos(salary));
            let profile = WorkerProfile {
                birth_date: NaiveDate::from_ymd_opt(1966, 3, 15).unwrap(),
                retirement_age: 65,
                prior_weeks: 1200,
                historical_daily_sdi: daily,
                dependents: Dependents::Ninguno,
            };
            let strategy = Strategy::new(
                12,
                StrategyMode::Fixed,
                3,
                NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            );

            let token = StrategyToken::new(&strategy, &profile);
            let reparsed = StrategyToken::parse(&token.to_string()).unwrap();
            assert_eq!(reparsed.profile(Dependents::Ninguno), profile);
        }
    }
}
