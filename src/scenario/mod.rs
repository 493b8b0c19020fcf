//! Scenario generation, preference ranking and replay

pub mod generator;
pub mod filter;
pub mod replay;

pub use generator::{
    payback_months, GenerationMetadata, GenerationOutput, GeneratorConfig, PlanRequest,
    ScenarioGenerator, ScenarioMetrics, ScenarioOutcome, ScenarioResult,
};
pub use filter::{
    minimum_uma_level, rank, FilterContext, PlanResponse, PreferenceFilter, ResponseMetadata,
    RiskBands,
};
pub use replay::{replay, ReplayReport, NET_PROJECTION_YEARS};

use crate::assumptions::ReferenceTables;
use crate::error::M40Result;

/// Generate every scenario for `request` and rank them
pub fn plan(
    request: &PlanRequest,
    tables: &ReferenceTables,
    config: GeneratorConfig,
    filter: &PreferenceFilter,
) -> M40Result<PlanResponse> {
    let shortlist_size = config.shortlist_size;
    let output = ScenarioGenerator::new(tables, config).generate_all(request)?;
    Ok(rank(output, request, tables, filter, shortlist_size))
}
