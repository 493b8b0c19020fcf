//! Reference tables: UMA values, contribution rates, pension and tax tables
//!
//! Everything here is plain data. A `ReferenceTables` value is built once
//! (defaults or CSV) and shared read-only by every scenario evaluation.

pub mod uma;
pub mod pension;
pub mod tax;
pub mod loader;

pub use uma::{
    ContributionRateTable, JanuaryUmaPolicy, UmaCeilingTable, UmaTable,
    DEFAULT_CONTRIBUTION_RATE, DEFAULT_UMA_CEILING,
};
pub use pension::{
    AgeFactorTable, DependentSurcharge, Law167Bracket, Law167Table, PmgParams,
    LEY_FOX_FACTOR, MINIMUM_WEEKS,
};
pub use tax::{IsrTable, IsrTier};
pub use loader::{load_tables, LoadedTables};

/// Days per month in every IMSS computation. Weeks per month follow from
/// it (30.4 / 7) so there is a single calendar model.
pub const DAYS_PER_MONTH: f64 = 30.4;

/// Months in the salary averaging window (the last 250 weeks)
pub const AVERAGING_WINDOW_MONTHS: u32 = 58;

/// All tables the engine reads
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub uma: UmaTable,
    pub contribution_rates: ContributionRateTable,
    pub uma_ceilings: UmaCeilingTable,
    pub law167: Law167Table,
    pub age_factors: AgeFactorTable,
    pub dependent_surcharge: DependentSurcharge,
    pub pmg: PmgParams,
    pub isr: IsrTable,
}

impl ReferenceTables {
    /// Defaults with any loaded tables substituted in
    pub fn from_loaded(loaded: &LoadedTables) -> Self {
        let mut tables = Self::default();
        if let Some(uma) = &loaded.uma {
            let growth = loaded
                .uma_projected_growth
                .unwrap_or_else(|| tables.uma.projected_growth());
            tables.uma = UmaTable::from_loaded(uma, growth);
        }
        if let Some(rates) = &loaded.contribution_rates {
            tables.contribution_rates = ContributionRateTable::from_loaded(rates);
        }
        if let Some(ceilings) = &loaded.uma_ceilings {
            tables.uma_ceilings = UmaCeilingTable::from_loaded(ceilings, DEFAULT_UMA_CEILING);
        }
        if let Some(factors) = &loaded.age_factors {
            tables.age_factors = AgeFactorTable::from_loaded(factors);
        }
        tables
    }
}
