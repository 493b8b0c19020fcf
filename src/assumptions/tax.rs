//! ISR table applied to pension income

use super::DAYS_PER_MONTH;
use crate::error::{M40Error, M40Result};

/// Pensions are exempt up to 15 UMA per month (LISR art. 93)
pub const EXEMPT_UMA_MULTIPLE: f64 = 15.0;

/// One progressive tier, measured on the excess over the exemption
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsrTier {
    /// Lower bound of the excess this tier applies to
    pub lower: f64,
    /// Tax owed at `lower`
    pub base: f64,
    /// Marginal rate over `lower`
    pub rate: f64,
}

#[derive(Debug, Clone)]
pub struct IsrTable {
    /// Monthly exempt amount (MXN)
    pub exempt_threshold: f64,
    tiers: Vec<IsrTier>,
}

impl Default for IsrTable {
    fn default() -> Self {
        // Exemption at the 2025 UMA; each base equals the previous tier's
        // tax at this tier's lower bound
        Self {
            exempt_threshold: EXEMPT_UMA_MULTIPLE * 113.14 * DAYS_PER_MONTH,
            tiers: vec![
                IsrTier { lower: 0.0, base: 0.0, rate: 0.1088 },
                IsrTier { lower: 10_000.0, base: 1_088.0, rate: 0.16 },
                IsrTier { lower: 25_000.0, base: 3_488.0, rate: 0.2136 },
                IsrTier { lower: 50_000.0, base: 8_828.0, rate: 0.2352 },
                IsrTier { lower: 100_000.0, base: 20_588.0, rate: 0.30 },
                IsrTier { lower: 200_000.0, base: 50_588.0, rate: 0.32 },
            ],
        }
    }
}

impl IsrTable {
    /// Tiers must be non-empty, start at zero excess and rise strictly
    pub fn new(exempt_threshold: f64, tiers: Vec<IsrTier>) -> M40Result<Self> {
        if !exempt_threshold.is_finite() || exempt_threshold < 0.0 {
            return Err(M40Error::TableLoad(format!(
                "ISR exemption must be >= 0, got {}",
                exempt_threshold
            )));
        }
        match tiers.first() {
            None => return Err(M40Error::TableLoad("ISR table has no tiers".into())),
            Some(first) if first.lower != 0.0 => {
                return Err(M40Error::TableLoad(format!(
                    "first ISR tier must start at 0, starts at {}",
                    first.lower
                )));
            }
            Some(_) => {}
        }
        if tiers.windows(2).any(|pair| pair[1].lower <= pair[0].lower) {
            return Err(M40Error::TableLoad(
                "ISR tier bounds must be strictly increasing".into(),
            ));
        }
        Ok(Self {
            exempt_threshold,
            tiers,
        })
    }

    /// Tier whose lower bound is the highest one not above `excess`
    pub fn tier_for(&self, excess: f64) -> Option<&IsrTier> {
        self.tiers.iter().rev().find(|t| excess >= t.lower)
    }

    pub fn tiers(&self) -> &[IsrTier] {
        &self.tiers
    }
}
