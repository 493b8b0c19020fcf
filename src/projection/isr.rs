//! Income tax (ISR) on pension income

use crate::assumptions::IsrTable;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsrBreakdown {
    pub gross: f64,
    pub net: f64,
    pub isr_monthly: f64,
    /// Tax as a percentage of gross, 2 decimals
    pub effective_rate: f64,
}

/// One year of a multi-year net pension projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetProjectionYear {
    /// 0 for the first pension year
    pub year_index: u32,
    pub gross_monthly: f64,
    pub isr_monthly: f64,
    pub net_monthly: f64,
    pub effective_rate: f64,
}

/// Monthly ISR for a gross monthly pension
pub fn compute_isr(table: &IsrTable, monthly_pension: f64) -> IsrBreakdown {
    let excess = monthly_pension - table.exempt_threshold;

    let isr_monthly = if excess <= 0.0 {
        0.0
    } else {
        table
            .tier_for(excess)
            .map(|tier| tier.base + tier.rate * (excess - tier.lower))
            .unwrap_or(0.0)
    };

    let effective_rate = if monthly_pension > 0.0 {
        round2(isr_monthly / monthly_pension * 100.0)
    } else {
        0.0
    };

    IsrBreakdown {
        gross: monthly_pension,
        net: monthly_pension - isr_monthly,
        isr_monthly,
        effective_rate,
    }
}

/// Grow the gross pension by `annual_growth` each year and recompute the
/// tax for every year (brackets are not indexed, so the effective rate
/// creeps up)
pub fn project_net(
    table: &IsrTable,
    monthly_pension: f64,
    annual_growth: f64,
    years: u32,
) -> Vec<NetProjectionYear> {
    let mut gross = monthly_pension;
    let mut projection = Vec::with_capacity(years as usize);

    for year_index in 0..years {
        let isr = compute_isr(table, gross);
        projection.push(NetProjectionYear {
            year_index,
            gross_monthly: gross,
            isr_monthly: isr.isr_monthly,
            net_monthly: isr.net,
            effective_rate: isr.effective_rate,
        });
        gross *= 1.0 + annual_growth;
    }

    projection
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_exempt_pension() {
        let table = IsrTable::default();
        let isr = compute_isr(&table, 30_000.0);
        assert_eq!(isr.isr_monthly, 0.0);
        assert_eq!(isr.net, 30_000.0);
        assert_eq!(isr.effective_rate, 0.0);

        let at_threshold = compute_isr(&table, table.exempt_threshold);
        assert_eq!(at_threshold.isr_monthly, 0.0);
    }

    #[test]
    fn test_taxed_pension() {
        let table = IsrTable::default();
        let gross = table.exempt_threshold + 30_000.0;
        let isr = compute_isr(&table, gross);

        // Third tier: 3488 + 21.36% of (30000 - 25000)
        let expected = 3_488.0 + 0.2136 * 5_000.0;
        assert_relative_eq!(isr.isr_monthly, expected, epsilon = 1e-6);
        assert_relative_eq!(isr.net, gross - expected, epsilon = 1e-6);
        assert_eq!(isr.effective_rate, round2(expected / gross * 100.0));
    }

    #[test]
    fn test_continuous_at_tier_edges() {
        let table = IsrTable::default();
        for tier in table.tiers().iter().skip(1) {
            let edge = table.exempt_threshold + tier.lower;
            let below = compute_isr(&table, edge - 0.01).isr_monthly;
            let above = compute_isr(&table, edge + 0.01).isr_monthly;
            assert!(above > below);
            assert!(above - below < 0.01);
        }
    }

    #[test]
    fn test_projection_recomputes_brackets() {
        let table = IsrTable::default();
        let start = table.exempt_threshold + 5_000.0;
        let projection = project_net(&table, start, 0.10, 5);

        assert_eq!(projection.len(), 5);
        assert_eq!(projection[0].gross_monthly, start);
        assert_relative_eq!(projection[4].gross_monthly, start * 1.1f64.powi(4), epsilon = 1e-6);

        // Taxed each year on that year's gross, not on an inflated net
        for year in &projection {
            let isr = compute_isr(&table, year.gross_monthly);
            assert_relative_eq!(year.net_monthly, isr.net, epsilon = 1e-9);
        }
        assert!(projection[4].effective_rate > projection[0].effective_rate);
    }

    proptest! {
        #[test]
        fn prop_tax_positive_above_threshold(excess in 0.01f64..500_000.0) {
            let table = IsrTable::default();
            let isr = compute_isr(&table, table.exempt_threshold + excess);
            prop_assert!(isr.isr_monthly > 0.0);
            prop_assert!(isr.net > 0.0);
        }

        #[test]
        fn prop_tax_zero_up_to_threshold(fraction in 0.0f64..=1.0) {
            let table = IsrTable::default();
            let isr = compute_isr(&table, table.exempt_threshold * fraction);
            prop_assert_eq!(isr.isr_monthly, 0.0);
        }
    }
}
