//! Debug replay of a single strategy from its token

use super::generator::{GeneratorConfig, ScenarioGenerator, ScenarioOutcome, ScenarioResult};
use crate::assumptions::ReferenceTables;
use crate::error::M40Result;
use crate::projection::{project_net, ContributionRecord, NetProjectionYear, DEFAULT_PENSION_GROWTH};
use crate::strategy::{Dependents, StrategyToken};
use serde::Serialize;

/// Years covered by the net-of-tax projection in a replay
pub const NET_PROJECTION_YEARS: u32 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub token: String,
    pub scenario: ScenarioResult,
    /// Month-by-month contributions (empty when the scenario failed)
    pub ledger: Vec<ContributionRecord>,
    pub net_projection: Vec<NetProjectionYear>,
}

/// Re-run the strategy a token describes with the full ledger.
///
/// Only a malformed token is an error; a strategy that cannot be
/// evaluated comes back as a failed scenario.
pub fn replay(
    token: &str,
    dependents: Dependents,
    tables: &ReferenceTables,
    config: GeneratorConfig,
) -> M40Result<ReplayReport> {
    let parsed = StrategyToken::parse(token)?;
    let strategy = parsed.strategy();
    let profile = parsed.profile(dependents);
    let generator = ScenarioGenerator::new(tables, config);

    let (outcome, ledger, net_projection) = match generator.run(&strategy, &profile) {
        Ok((metrics, simulation)) => {
            let projection = project_net(
                &tables.isr,
                metrics.gross_pension,
                DEFAULT_PENSION_GROWTH,
                NET_PROJECTION_YEARS,
            );
            (ScenarioOutcome::Evaluated(metrics), simulation.records, projection)
        }
        Err(error) => {
            log::warn!("Replay of {} failed: {}", token, error);
            let message = error.to_string();
            (ScenarioOutcome::Failed { error, message }, Vec::new(), Vec::new())
        }
    };

    Ok(ReplayReport {
        token: token.to_string(),
        scenario: ScenarioResult {
            strategy,
            token: token.to_string(),
            outcome,
        },
        ledger,
        net_projection,
    })
}
