//! Load substitute reference tables from CSV
//!
//! Expected files in the table directory (all optional):
//! - `uma.csv`: `year,daily_value`
//! - `contribution_rates.csv`: `year,rate`
//! - `uma_ceilings.csv`: `year,max_level`
//! - `age_factors.csv`: `age,factor`
//!
//! A missing file keeps the built-in table.

use super::DEFAULT_UMA_CEILING;
use crate::error::{M40Error, M40Result};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct UmaRow {
    year: i32,
    daily_value: f64,
}

#[derive(Debug, Deserialize)]
struct RateRow {
    year: i32,
    rate: f64,
}

#[derive(Debug, Deserialize)]
struct CeilingRow {
    year: i32,
    max_level: u32,
}

#[derive(Debug, Deserialize)]
struct AgeFactorRow {
    age: u8,
    factor: f64,
}

/// Raw tables read from disk, before being merged over the defaults
#[derive(Debug, Clone, Default)]
pub struct LoadedTables {
    pub uma: Option<Vec<(i32, f64)>>,
    pub uma_projected_growth: Option<f64>,
    pub contribution_rates: Option<Vec<(i32, f64)>>,
    pub uma_ceilings: Option<Vec<(i32, u32)>>,
    pub age_factors: Option<Vec<(u8, f64)>>,
}

/// Load every table present in `dir`
pub fn load_tables(dir: &Path) -> M40Result<LoadedTables> {
    if !dir.is_dir() {
        return Err(M40Error::TableLoad(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut loaded = LoadedTables::default();

    if let Some(file) = open_optional(&dir.join("uma.csv"))? {
        loaded.uma = Some(load_uma_from_reader(file)?);
    }
    if let Some(file) = open_optional(&dir.join("contribution_rates.csv"))? {
        loaded.contribution_rates = Some(load_rates_from_reader(file)?);
    }
    if let Some(file) = open_optional(&dir.join("uma_ceilings.csv"))? {
        loaded.uma_ceilings = Some(load_ceilings_from_reader(file)?);
    }
    if let Some(file) = open_optional(&dir.join("age_factors.csv"))? {
        loaded.age_factors = Some(load_age_factors_from_reader(file)?);
    }

    log::info!(
        "Loaded tables from {}: uma={} rates={} ceilings={} age_factors={}",
        dir.display(),
        loaded.uma.is_some(),
        loaded.contribution_rates.is_some(),
        loaded.uma_ceilings.is_some(),
        loaded.age_factors.is_some(),
    );

    Ok(loaded)
}

fn open_optional(path: &Path) -> M40Result<Option<File>> {
    if path.exists() {
        Ok(Some(File::open(path)?))
    } else {
        Ok(None)
    }
}

/// Parse `year,daily_value` rows
pub fn load_uma_from_reader<R: Read>(reader: R) -> M40Result<Vec<(i32, f64)>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: UmaRow = record?;
        if row.daily_value <= 0.0 {
            return Err(M40Error::TableLoad(format!(
                "UMA for {} must be positive, got {}",
                row.year, row.daily_value
            )));
        }
        rows.push((row.year, row.daily_value));
    }
    if rows.is_empty() {
        return Err(M40Error::TableLoad("uma.csv has no rows".into()));
    }
    Ok(rows)
}

/// Parse `year,rate` rows
pub fn load_rates_from_reader<R: Read>(reader: R) -> M40Result<Vec<(i32, f64)>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: RateRow = record?;
        if !(0.0..1.0).contains(&row.rate) {
            return Err(M40Error::TableLoad(format!(
                "contribution rate for {} out of range: {}",
                row.year, row.rate
            )));
        }
        rows.push((row.year, row.rate));
    }
    Ok(rows)
}

/// Parse `year,max_level` rows; levels must lie in 1..=25
pub fn load_ceilings_from_reader<R: Read>(reader: R) -> M40Result<Vec<(i32, u32)>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: CeilingRow = record?;
        if !(1..=DEFAULT_UMA_CEILING).contains(&row.max_level) {
            return Err(M40Error::TableLoad(format!(
                "UMA ceiling for {} must be between 1 and {}, got {}",
                row.year, DEFAULT_UMA_CEILING, row.max_level
            )));
        }
        rows.push((row.year, row.max_level));
    }
    Ok(rows)
}

/// Parse `age,factor` rows; factors must be positive
pub fn load_age_factors_from_reader<R: Read>(reader: R) -> M40Result<Vec<(u8, f64)>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: AgeFactorRow = record?;
        if !row.factor.is_finite() || row.factor <= 0.0 {
            return Err(M40Error::TableLoad(format!(
                "age factor for {} must be positive, got {}",
                row.age, row.factor
            )));
        }
        rows.push((row.age, row.factor));
    }
    Ok(rows)
}
