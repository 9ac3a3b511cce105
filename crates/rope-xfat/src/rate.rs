//! # Rate Engine
//!
//! Self-adjusting exit rate for xFAT → FAT redemptions.
//!
//! A redemption to the base asset runs three phases, always in this order:
//!
//! ```text
//! 1. recovery   base_rate climbs back toward max_rate over idle epochs,
//!               cumulative_impact decays
//! 2. quote      effective_rate = base_rate
//!                              - cumulative_impact / PRECISION
//!                              - size term (amount / supply / beta)
//!               clamped to [min_rate, max_rate]
//! 3. impact     fraction = amount / (supply + amount), impact = fraction / beta,
//!               cumulative_impact += impact, base_rate -= impact in basis points
//! ```
//!
//! Phase 3 runs after the payout is computed so a redemption never penalizes
//! itself. Phases 1 and 2 are also available read-only for previews.
//!
//! The cumulative-impact term of phase 2 is rescaled from 1e18 fixed point by
//! dividing by `PRECISION` directly, so impacts below 100% contribute nothing.

use serde::{Deserialize, Serialize};

use crate::config::RateParameters;
use crate::error::Result;
use crate::math::{
    apply_rate, checked_add, fraction, mul_div_floor_saturating, to_basis_points, PRECISION,
};
use crate::types::{Amount, Epoch, Rate, Timestamp};

/// Persisted rate state
///
/// `min_rate <= base_rate == current_rate <= max_rate` after every call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateState {
    /// Rate that recovery and impact operate on (basis points)
    pub base_rate: Rate,
    /// Rate reported to callers; kept equal to `base_rate`
    pub current_rate: Rate,
    /// Accumulated redemption impact, 1e18 fixed point
    pub cumulative_impact: u128,
    /// Time of the last redemption to the base asset
    pub last_redemption_time: Timestamp,
    /// Time the rate was last recomputed
    pub last_rate_update_time: Timestamp,
    /// Epoch of the last redemption to the base asset
    pub last_epoch_with_redemption: Epoch,
}

/// Read-only price of a base-asset redemption
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionQuote {
    /// xFAT redeemed
    pub amount: Amount,
    /// FAT paid out
    pub output: Amount,
    /// xFAT value withheld for the rebase pool
    pub penalty: Amount,
    /// Rate applied, basis points
    pub effective_rate: Rate,
}

/// Outcome of applying a redemption's impact
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImpactOutcome {
    pub impact: u128,
    pub rate_before: Rate,
    pub rate_after: Rate,
}

/// Rate state plus the parameters that drive it
#[derive(Clone, Debug)]
pub struct RateEngine {
    params: RateParameters,
    state: RateState,
}

impl RateEngine {
    /// Start at `max_rate` with no accumulated impact
    pub fn new(params: RateParameters, now: Timestamp, epoch: Epoch) -> Self {
        let state = RateState {
            base_rate: params.max_rate,
            current_rate: params.max_rate,
            cumulative_impact: 0,
            last_redemption_time: 0,
            last_rate_update_time: now,
            last_epoch_with_redemption: epoch,
        };
        Self { params, state }
    }

    pub fn params(&self) -> &RateParameters {
        &self.params
    }

    pub fn state(&self) -> &RateState {
        &self.state
    }

    pub fn current_rate(&self) -> Rate {
        self.state.current_rate
    }

    /// Phase 1 without side effects: the state recovery would produce at `current_epoch`
    pub fn recovered(&self, current_epoch: Epoch) -> Result<RateState> {
        let mut next = self.state.clone();
        let elapsed = current_epoch.saturating_sub(self.state.last_epoch_with_redemption);
        if elapsed == 0 {
            return Ok(next);
        }

        let recovery_epochs = self.params.recovery_epochs;
        let max_rate = self.params.max_rate;
        let steps = elapsed.min(recovery_epochs);
        let gap = max_rate.saturating_sub(next.base_rate);
        let recovery = gap * steps / recovery_epochs;
        next.base_rate = (next.base_rate + recovery).min(max_rate);
        next.current_rate = next.base_rate;

        let decay = mul_div_floor_saturating(
            next.cumulative_impact,
            elapsed as u128,
            recovery_epochs as u128 * 2,
        )?;
        next.cumulative_impact = next.cumulative_impact.saturating_sub(decay);
        Ok(next)
    }

    /// Phase 1, persisted
    ///
    /// Idempotent within an epoch window: `last_epoch_with_redemption` is only
    /// moved by [`RateEngine::apply_redemption_impact`], which always follows.
    pub fn update_conversion_rate(&mut self, current_epoch: Epoch, now: Timestamp) -> Result<bool> {
        let next = self.recovered(current_epoch)?;
        if next == self.state {
            return Ok(false);
        }
        tracing::debug!(
            epoch = current_epoch,
            from = self.state.base_rate,
            to = next.base_rate,
            impact = %next.cumulative_impact,
            "Conversion rate recovered"
        );
        self.state = next;
        self.state.last_rate_update_time = now;
        Ok(true)
    }

    /// Phase 2: effective rate for redeeming `amount` against `total_supply`
    ///
    /// A zero supply skips the size term.
    pub fn effective_rate(
        params: &RateParameters,
        state: &RateState,
        amount: Amount,
        total_supply: Amount,
    ) -> Result<Rate> {
        let min_rate = params.min_rate as u128;
        let max_rate = params.max_rate as u128;
        let mut rate = state.base_rate as u128;

        let impact_reduction = state.cumulative_impact / PRECISION;
        rate = rate.saturating_sub(impact_reduction).max(min_rate);

        if total_supply > 0 {
            let size_fraction = mul_div_floor_saturating(amount, PRECISION, total_supply)?;
            let size_impact = size_fraction / params.penalty_impact_beta as u128;
            let size_reduction = to_basis_points(size_impact)?;
            rate = rate.saturating_sub(size_reduction).max(min_rate);
        }

        Ok(rate.clamp(min_rate, max_rate) as Rate)
    }

    /// Price `amount` against the stored state after pending recovery
    ///
    /// `total_supply` is the supply the redemption will see, i.e. after its burn.
    pub fn quote(&self, amount: Amount, total_supply: Amount, current_epoch: Epoch) -> Result<RedemptionQuote> {
        let state = self.recovered(current_epoch)?;
        Self::price(&self.params, &state, amount, total_supply)
    }

    /// Price `amount` against the stored state as-is (phase 1 already applied)
    pub fn quote_current(&self, amount: Amount, total_supply: Amount) -> Result<RedemptionQuote> {
        Self::price(&self.params, &self.state, amount, total_supply)
    }

    fn price(
        params: &RateParameters,
        state: &RateState,
        amount: Amount,
        total_supply: Amount,
    ) -> Result<RedemptionQuote> {
        let effective_rate = Self::effective_rate(params, state, amount, total_supply)?;
        let output = apply_rate(amount, effective_rate as u128)?;
        Ok(RedemptionQuote {
            amount,
            output,
            penalty: amount - output,
            effective_rate,
        })
    }

    /// Phase 3: fold this redemption into future rates
    ///
    /// `total_supply` is the post-burn supply; the fraction uses
    /// `supply + amount` as its denominator.
    pub fn apply_redemption_impact(
        &mut self,
        amount: Amount,
        total_supply: Amount,
        now: Timestamp,
        current_epoch: Epoch,
    ) -> Result<ImpactOutcome> {
        let rate_before = self.state.base_rate;
        let mut impact = 0;

        if total_supply > 0 {
            let denominator = checked_add(total_supply, amount)?;
            impact = fraction(amount, denominator)? / self.params.penalty_impact_beta as u128;
            self.state.cumulative_impact = checked_add(self.state.cumulative_impact, impact)?;

            let impact_bp = to_basis_points(impact)?;
            let min_rate = self.params.min_rate as u128;
            let lowered = (self.state.base_rate as u128).saturating_sub(impact_bp).max(min_rate);
            self.state.base_rate = lowered as Rate;
        }

        self.state.current_rate = self.state.base_rate;
        self.state.last_redemption_time = now;
        self.state.last_rate_update_time = now;
        self.state.last_epoch_with_redemption = current_epoch;

        Ok(ImpactOutcome {
            impact,
            rate_before,
            rate_after: self.state.base_rate,
        })
    }

    /// Replace the bounds and re-clamp the stored rates into them
    pub fn set_bounds(&mut self, min_rate: Rate, max_rate: Rate) {
        self.params.min_rate = min_rate;
        self.params.max_rate = max_rate;
        self.state.base_rate = self.state.base_rate.clamp(min_rate, max_rate);
        self.state.current_rate = self.state.base_rate;
    }

    pub fn set_recovery(&mut self, recovery_epochs: u64, penalty_impact_beta: u64, decay_half_life_secs: u64) {
        self.params.recovery_epochs = recovery_epochs;
        self.params.penalty_impact_beta = penalty_impact_beta;
        self.params.decay_half_life_secs = decay_half_life_secs;
    }

    pub(crate) fn restore(&mut self, state: RateState) {
        self.state = state;
    }
}
