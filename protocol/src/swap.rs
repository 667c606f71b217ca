//! # Swap Subsystem
//!
//! The Hub normalizes assets across chains (the USDC that arrived from one
//! chain into the representation a vault on another chain expects) and
//! buys destination gas out of principal. Both go through a [`SwapRouter`].
//!
//! [`FixedRateRouter`] is the local implementation: a constant-rate
//! market-maker that trades against reserves it holds in the chain's
//! [`TokenLedger`]. Outputs round down, required inputs round up, so the
//! router never hands out value it did not receive.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::ledger::{LedgerError, TokenLedger};
use crate::types::{Address, AssetId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SwapError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: AssetId, to: AssetId },

    /// Output fell below the caller's minimum.
    #[error("slippage exceeded: would receive {amount_out}, minimum {min_out}")]
    SlippageExceeded { amount_out: u64, min_out: u64 },

    /// Buying the requested output would cost more than the caller allowed.
    #[error("excessive input: need {required}, maximum {max_in}")]
    ExcessiveInput { required: u64, max_in: u64 },

    #[error("swap amount rounds to zero")]
    ZeroAmount,

    #[error("swap arithmetic overflow")]
    Overflow,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// An exchange that settles against a chain's token ledger.
pub trait SwapRouter {
    /// Sells exactly `amount_in` of `asset_in`. Returns the amount received.
    fn swap_exact_in(
        &self,
        tokens: &mut TokenLedger,
        trader: &Address,
        asset_in: &AssetId,
        amount_in: u64,
        asset_out: &AssetId,
        min_out: u64,
    ) -> Result<u64, SwapError>;

    /// Buys exactly `amount_out` of `asset_out`, spending at most `max_in`.
    /// Returns the amount actually spent.
    fn swap_exact_out(
        &self,
        tokens: &mut TokenLedger,
        trader: &Address,
        asset_in: &AssetId,
        max_in: u64,
        asset_out: &AssetId,
        amount_out: u64,
    ) -> Result<u64, SwapError>;
}

// ---------------------------------------------------------------------------
// FixedRateRouter
// ---------------------------------------------------------------------------

/// `amount_out = amount_in * numerator / denominator`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    pub numerator: u64,
    pub denominator: u64,
}

impl Rate {
    pub const PAR: Rate = Rate {
        numerator: 1,
        denominator: 1,
    };

    pub fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    fn inverse(self) -> Self {
        Self {
            numerator: self.denominator,
            denominator: self.numerator,
        }
    }

    fn output_for(self, amount_in: u64) -> Result<u64, SwapError> {
        if self.denominator == 0 {
            return Err(SwapError::Overflow);
        }
        let out = amount_in as u128 * self.numerator as u128 / self.denominator as u128;
        u64::try_from(out).map_err(|_| SwapError::Overflow)
    }

    fn input_for(self, amount_out: u64) -> Result<u64, SwapError> {
        if self.numerator == 0 {
            return Err(SwapError::Overflow);
        }
        let num = amount_out as u128 * self.denominator as u128;
        let den = self.numerator as u128;
        let required = num.div_ceil(den);
        u64::try_from(required).map_err(|_| SwapError::Overflow)
    }
}

/// Constant-rate router holding its own reserves.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FixedRateRouter {
    address: Address,
    rates: BTreeMap<(AssetId, AssetId), Rate>,
}

impl FixedRateRouter {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            rates: BTreeMap::new(),
        }
    }

    /// The account that holds the router's reserves.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Lists a pair in both directions.
    pub fn with_pair(mut self, a: AssetId, b: AssetId, rate: Rate) -> Self {
        self.set_pair(a, b, rate);
        self
    }

    pub fn set_pair(&mut self, a: AssetId, b: AssetId, rate: Rate) {
        self.rates.insert((a, b), rate);
        self.rates.insert((b, a), rate.inverse());
    }

    fn rate(&self, from: &AssetId, to: &AssetId) -> Result<Rate, SwapError> {
        if from == to {
            return Ok(Rate::PAR);
        }
        self.rates
            .get(&(*from, *to))
            .copied()
            .ok_or(SwapError::NoRoute {
                from: *from,
                to: *to,
            })
    }

    fn settle(
        &self,
        tokens: &mut TokenLedger,
        trader: &Address,
        asset_in: &AssetId,
        amount_in: u64,
        asset_out: &AssetId,
        amount_out: u64,
    ) -> Result<(), SwapError> {
        if asset_in == asset_out {
            return Ok(());
        }
        tokens.transfer(asset_in, trader, &self.address, amount_in)?;
        tokens.transfer(asset_out, &self.address, trader, amount_out)?;
        Ok(())
    }
}

impl SwapRouter for FixedRateRouter {
    fn swap_exact_in(
        &self,
        tokens: &mut TokenLedger,
        trader: &Address,
        asset_in: &AssetId,
        amount_in: u64,
        asset_out: &AssetId,
        min_out: u64,
    ) -> Result<u64, SwapError> {
        let amount_out = self.rate(asset_in, asset_out)?.output_for(amount_in)?;
        if amount_out < min_out {
            return Err(SwapError::SlippageExceeded {
                amount_out,
                min_out,
            });
        }
        if amount_out == 0 && amount_in > 0 {
            return Err(SwapError::ZeroAmount);
        }
        self.settle(tokens, trader, asset_in, amount_in, asset_out, amount_out)?;
        debug!(%asset_in, %asset_out, amount_in, amount_out, "swap exact in");
        Ok(amount_out)
    }

    fn swap_exact_out(
        &self,
        tokens: &mut TokenLedger,
        trader: &Address,
        asset_in: &AssetId,
        max_in: u64,
        asset_out: &AssetId,
        amount_out: u64,
    ) -> Result<u64, SwapError> {
        if amount_out == 0 {
            return Ok(0);
        }
        let required = self.rate(asset_in, asset_out)?.input_for(amount_out)?;
        if required > max_in {
            return Err(SwapError::ExcessiveInput { required, max_in });
        }
        self.settle(tokens, trader, asset_in, required, asset_out, amount_out)?;
        debug!(%asset_in, %asset_out, amount_in = required, amount_out, "swap exact out");
        Ok(required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        tokens: TokenLedger,
        router: FixedRateRouter,
        trader: Address,
        usdc: AssetId,
        gas: AssetId,
    }

    fn fixture() -> Fixture {
        let usdc = Address::derive("usdc");
        let gas = Address::derive("gas");
        // 1 gas unit costs 3 usdc.
        let router = FixedRateRouter::new(Address::derive("router")).with_pair(usdc, gas, Rate::new(1, 3));
        let mut tokens = TokenLedger::new();
        let trader = Address::derive("trader");
        tokens.mint(&usdc, &trader, 1_000).unwrap();
        tokens.mint(&usdc, &router.address(), 1_000_000).unwrap();
        tokens.mint(&gas, &router.address(), 1_000_000).unwrap();
        Fixture {
            tokens,
            router,
            trader,
            usdc,
            gas,
        }
    }

    #[test]
    fn exact_in_rounds_output_down() {
        let mut f = fixture();
        let out = f
            .router
            .swap_exact_in(&mut f.tokens, &f.trader, &f.usdc, 10, &f.gas, 0)
            .unwrap();
        assert_eq!(out, 3);
        assert_eq!(f.tokens.balance_of(&f.usdc, &f.trader), 990);
        assert_eq!(f.tokens.balance_of(&f.gas, &f.trader), 3);
    }

    #[test]
    fn exact_out_rounds_input_up() {
        let mut f = fixture();
        // 3 gas at 3 usdc each, exactly 9.
        let spent = f
            .router
            .swap_exact_out(&mut f.tokens, &f.trader, &f.usdc, 100, &f.gas, 3)
            .unwrap();
        assert_eq!(spent, 9);

        let router = FixedRateRouter::new(Address::derive("r2")).with_pair(f.usdc, f.gas, Rate::new(2, 3));
        f.tokens.mint(&f.gas, &router.address(), 10).unwrap();
        // 1 gas costs 1.5 usdc, charged as 2.
        let spent = router
            .swap_exact_out(&mut f.tokens, &f.trader, &f.usdc, 100, &f.gas, 1)
            .unwrap();
        assert_eq!(spent, 2);
    }

    #[test]
    fn slippage_and_max_in_enforced() {
        let mut f = fixture();
        assert!(matches!(
            f.router
                .swap_exact_in(&mut f.tokens, &f.trader, &f.usdc, 10, &f.gas, 4),
            Err(SwapError::SlippageExceeded { amount_out: 3, min_out: 4 })
        ));
        assert!(matches!(
            f.router
                .swap_exact_out(&mut f.tokens, &f.trader, &f.usdc, 8, &f.gas, 3),
            Err(SwapError::ExcessiveInput { required: 9, max_in: 8 })
        ));
        assert_eq!(f.tokens.balance_of(&f.usdc, &f.trader), 1_000);
    }

    #[test]
    fn same_asset_is_identity() {
        let mut f = fixture();
        let out = f
            .router
            .swap_exact_in(&mut f.tokens, &f.trader, &f.usdc, 50, &f.usdc, 50)
            .unwrap();
        assert_eq!(out, 50);
        assert_eq!(f.tokens.balance_of(&f.usdc, &f.trader), 1_000);
    }

    #[test]
    fn unknown_pair_has_no_route() {
        let mut f = fixture();
        let other = Address::derive("other");
        assert!(matches!(
            f.router
                .swap_exact_in(&mut f.tokens, &f.trader, &f.usdc, 1, &other, 0),
            Err(SwapError::NoRoute { .. })
        ));
    }
}
