//! # Funding Scanner Common Crate
//!
//! This crate provides the data types, symbol normalization and error
//! definitions shared across the funding-scanner workspace.

/// Module for common error types.
pub mod errors;

/// Canonical symbol keys.
pub mod symbol;

/// Module for common data structures and types.
pub mod types;

// Re-export key items for easier access.
pub use errors::FundingError;
pub use symbol::normalize_symbol;
pub use types::{
    CombinedFundingRate, Exchange, ExchangePair, FundingSnapshot, Opportunity, OpportunityStats,
    OpportunityType, Price,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_re_exports_exist() {
        // If this compiles, the re-exports are working.
        let _price = Price(rust_decimal_macros::dec!(1.0));
        let _pair = ExchangePair::new(Exchange::Binance, Exchange::Bybit);
        let _combined = CombinedFundingRate::new(normalize_symbol("ETHUSDT"), chrono::Utc::now());
        let _kind = OpportunityType::RateArbitrage;
        let _err = FundingError::Internal("test".to_string());
    }
}
