//! Gas Price Policy
//!
//! The node-reported gas price is scaled by the network's configured
//! gas-fee multiplier before a transaction is submitted. Some chains also
//! enforce a minimum price that nodes under-report.

use tracing::trace;

use crate::config::NetworkConfig;

// ============================================
// CONSTANTS
// ============================================

pub const POLYGON_NETWORK_ID: u64 = 137;
pub const MUMBAI_NETWORK_ID: u64 = 80001;
pub const SEPOLIA_NETWORK_ID: u64 = 11155111;

/// Minimum recommended gas price on polygon and mumbai (30 gwei)
pub const MIN_GAS_FEE_POLYGON: u128 = 30_000_000_000;

/// Minimum recommended gas price on sepolia (4 gwei)
pub const MIN_GAS_FEE_SEPOLIA: u128 = 4_000_000_000;

/// Multipliers are resolved to 1/10000ths so the product stays integral
const MULTIPLIER_SCALE: u128 = 10_000;

const WEI_PER_GWEI: f64 = 1e9;

// ============================================
// MULTIPLIER
// ============================================

/// `price * multiplier`, or `price` unchanged when no usable multiplier is set.
pub fn apply_gas_fee_multiplier(price: u128, multiplier: Option<f64>) -> u128 {
    match multiplier {
        Some(m) if m.is_finite() && m > 0.0 => {
            let scaled = (m * MULTIPLIER_SCALE as f64).round() as u128;
            price.saturating_mul(scaled) / MULTIPLIER_SCALE
        }
        _ => price,
    }
}

/// Chain-specific floor for the submitted gas price
pub fn min_gas_price(chain_id: u64) -> Option<u128> {
    match chain_id {
        POLYGON_NETWORK_ID | MUMBAI_NETWORK_ID => Some(MIN_GAS_FEE_POLYGON),
        SEPOLIA_NETWORK_ID => Some(MIN_GAS_FEE_SEPOLIA),
        _ => None,
    }
}

// ============================================
// GAS POLICY
// ============================================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GasPolicy {
    /// Scalar applied to the node-reported price
    pub multiplier: Option<f64>,

    /// Floor applied after the multiplier
    pub min_gas_price: Option<u128>,
}

impl GasPolicy {
    pub fn new(multiplier: Option<f64>) -> Self {
        Self { multiplier, min_gas_price: None }
    }

    pub fn for_network(config: &NetworkConfig) -> Self {
        Self {
            multiplier: config.gas_fee_multiplier,
            min_gas_price: min_gas_price(config.chain_id),
        }
    }

    /// Price to submit given the price the node reported
    pub fn gas_price(&self, reported: u128) -> u128 {
        let price = apply_gas_fee_multiplier(reported, self.multiplier);
        let price = match self.min_gas_price {
            Some(floor) if price < floor => floor,
            _ => price,
        };
        trace!("gas price: reported {} wei, submitting {} wei", reported, price);
        price
    }
}

/// Total fee in wei for `gas_units` at `gas_price`
pub fn estimate_fee_wei(gas_units: u64, gas_price: u128) -> u128 {
    (gas_units as u128).saturating_mul(gas_price)
}

pub fn wei_to_gwei(wei: u128) -> f64 {
    wei as f64 / WEI_PER_GWEI
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_applied() {
        assert_eq!(apply_gas_fee_multiplier(20_000_000_000, Some(1.05)), 21_000_000_000);
        assert_eq!(apply_gas_fee_multiplier(1_000, Some(1.6)), 1_600);
        assert_eq!(apply_gas_fee_multiplier(1_000, Some(1.0)), 1_000);
    }

    #[test]
    fn test_multiplier_unset_keeps_price() {
        assert_eq!(apply_gas_fee_multiplier(12_345, None), 12_345);
        assert_eq!(apply_gas_fee_multiplier(12_345, Some(0.0)), 12_345);
        assert_eq!(apply_gas_fee_multiplier(12_345, Some(f64::NAN)), 12_345);
    }

    #[test]
    fn test_polygon_floor() {
        let policy = GasPolicy { multiplier: Some(1.6), min_gas_price: min_gas_price(137) };
        assert_eq!(policy.gas_price(1_000_000_000), MIN_GAS_FEE_POLYGON);
        assert_eq!(policy.gas_price(100_000_000_000), 160_000_000_000);
    }

    #[test]
    fn test_no_floor_on_mainnet() {
        assert_eq!(min_gas_price(1), None);
        let policy = GasPolicy::new(Some(1.05));
        assert_eq!(policy.gas_price(100), 105);
    }

    #[test]
    fn test_fee_estimate() {
        // 200,000 gas at 20 gwei = 0.004 ETH
        let fee = estimate_fee_wei(200_000, 20_000_000_000);
        assert_eq!(fee, 4_000_000_000_000_000);
        assert!((wei_to_gwei(20_000_000_000) - 20.0).abs() < f64::EPSILON);
    }
}
