//! Strategy generation and pension projection engine for IMSS Modalidad 40
//!
//! Given a worker's history and preferences the engine enumerates every
//! voluntary-contribution strategy (duration, UMA level, fixed or
//! progressive), simulates each one month by month, applies the Ley 73
//! pension formula and ISR, then ranks the results.
//!
//! ```no_run
//! use m40_advisor::{plan, GeneratorConfig, PlanRequest, PreferenceFilter, ReferenceTables};
//!
//! # fn run(request: PlanRequest) -> m40_advisor::M40Result<()> {
//! let tables = ReferenceTables::default();
//! let response = plan(&request, &tables, GeneratorConfig::default(), &PreferenceFilter::default())?;
//! println!("{} scenarios", response.results.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod assumptions;
pub mod strategy;
pub mod projection;
pub mod scenario;

pub use assumptions::{load_tables, JanuaryUmaPolicy, ReferenceTables};
pub use error::{M40Error, M40Result, ScenarioError};
pub use scenario::{
    plan, rank, replay, GeneratorConfig, PlanRequest, PlanResponse, PreferenceFilter,
    ReplayReport, ScenarioGenerator, ScenarioResult,
};
pub use strategy::{Dependents, Strategy, StrategyMode, StrategyToken, UserPreferences};
