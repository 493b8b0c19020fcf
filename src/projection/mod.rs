//! Per-strategy projection: contribution ledger, pension formula and tax

pub mod sdi;
pub mod pension;
pub mod isr;

pub use sdi::{weeks_for_months, ContributionRecord, SdiSimulator, SimulationResult};
pub use pension::{PensionBreakdown, PensionEngine};
pub use isr::{compute_isr, project_net, IsrBreakdown, NetProjectionYear};

// ============================================================================
// Default Projection Assumptions
// ============================================================================
// - ROI and payback are measured over a fixed pension horizon
// - Net projections grow the pension with the UMA projection rate

/// Months of pension income counted for ROI (20 years)
pub const DEFAULT_PENSION_HORIZON_MONTHS: u32 = 240;

/// Annual pension growth used by multi-year net projections (4%)
pub const DEFAULT_PENSION_GROWTH: f64 = 0.04;
