//! # xFAT Engine
//!
//! One [`XFat`] instance owns the ledger, the rate engine, the epoch clock,
//! the exemption sets and the rebase pool. External collaborators are held as
//! trait objects and are only ever called with no internal lock held.
//!
//! ## Redemption flow
//!
//! ```text
//! redeem(caller, amount, mode)
//!   ├─ reject: nested call, paused, zero amount, short balance
//!   ├─ advance epoch clock
//!   ├─ burn amount
//!   ├─ ToBaseAsset       recovery → quote → impact, penalty → rebase pool
//!   │                    then pay `output` FAT to caller
//!   ├─ ToLockedPosition  approve + create_lock_for(amount) 1:1
//!   └─ ToStakedPosition  approve + deposit(amount) 1:1
//! ```
//!
//! Any failure, including a collaborator rejecting the payout, restores the
//! caller balance, supply, rate state, epoch, rebase pool and event journal.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::{Clock, EpochClock, SystemClock};
use crate::collaborators::{FungibleAsset, GaugeRegistry, RewardsDistributor, StakingVault, VoteEscrow};
use crate::config::{RateParameters, XFatConfig};
use crate::error::{Result, XFatError};
use crate::events::XFatEvent;
use crate::guard::{ExemptionGuard, ExemptionKind, ReentrancyGuard, TransferClearance};
use crate::ledger::Ledger;
use crate::math::checked_add;
use crate::rate::{RateEngine, RateState, RedemptionQuote};
use crate::redeem::{Payout, RedeemType, RedemptionReceipt};
use crate::types::{Address, Amount, Epoch, Rate, Timestamp};

/// Mutable engine state, guarded as one unit
pub(crate) struct XFatState {
    pub(crate) ledger: Ledger,
    pub(crate) rate: RateEngine,
    pub(crate) epochs: EpochClock,
    pub(crate) exemptions: ExemptionGuard,
    pub(crate) pending_rebase: Amount,
    pub(crate) last_rebase_epoch: Option<Epoch>,
    pub(crate) lock_duration_secs: u64,
    pub(crate) paused: bool,
    pub(crate) owner: Address,
    pub(crate) minter: Address,
    pub(crate) events: Vec<XFatEvent>,
}

impl XFatState {
    pub(crate) fn emit(&mut self, event: XFatEvent) {
        tracing::trace!(event = event.name(), "xFAT event");
        self.events.push(event);
    }

    fn advance_epoch(&mut self, now: Timestamp) {
        if let Some(epoch) = self.epochs.advance(now) {
            tracing::info!(epoch, "New xFAT epoch");
            self.emit(XFatEvent::NewEpoch { epoch, timestamp: now });
        }
    }

    pub(crate) fn ensure_owner(&self, caller: &Address) -> Result<()> {
        if *caller != self.owner {
            return Err(XFatError::NotAuthorized);
        }
        Ok(())
    }

    fn checkpoint(&self, account: Option<&Address>) -> Checkpoint {
        Checkpoint {
            account: account.map(|a| (*a, self.ledger.balance_of(a))),
            total_supply: self.ledger.total_supply(),
            rate: self.rate.state().clone(),
            epochs: self.epochs.clone(),
            pending_rebase: self.pending_rebase,
            last_rebase_epoch: self.last_rebase_epoch,
            events_len: self.events.len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        if let Some((account, balance)) = checkpoint.account {
            self.ledger.restore(&account, balance, checkpoint.total_supply);
        }
        self.rate.restore(checkpoint.rate);
        self.epochs = checkpoint.epochs;
        self.pending_rebase = checkpoint.pending_rebase;
        self.last_rebase_epoch = checkpoint.last_rebase_epoch;
        self.events.truncate(checkpoint.events_len);
    }
}

/// Values a redemption or rebase may touch, captured before it mutates
struct Checkpoint {
    account: Option<(Address, Amount)>,
    total_supply: Amount,
    rate: RateState,
    epochs: EpochClock,
    pending_rebase: Amount,
    last_rebase_epoch: Option<Epoch>,
    events_len: usize,
}

/// External collaborator handles
#[derive(Clone)]
pub(crate) struct Collaborators {
    pub(crate) base_asset: Arc<dyn FungibleAsset>,
    pub(crate) vote_escrow: Option<Arc<dyn VoteEscrow>>,
    pub(crate) staking_vault: Option<Arc<dyn StakingVault>>,
    pub(crate) gauge_registry: Option<Arc<dyn GaugeRegistry>>,
    pub(crate) rewards_distributor: Option<Arc<dyn RewardsDistributor>>,
}

/// Collaborator call prepared under the state lock, executed after it is released
enum PayoutPlan {
    BaseAsset(RedemptionQuote),
    Lock { escrow: Arc<dyn VoteEscrow>, duration_secs: u64 },
    Stake { vault: Arc<dyn StakingVault> },
}

/// Serializable view of the engine
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct XFatSnapshot {
    pub address: Address,
    pub owner: Address,
    pub minter: Address,
    pub total_supply: Amount,
    pub holders: usize,
    pub rate: RateState,
    pub parameters: RateParameters,
    pub current_epoch: Epoch,
    pub epoch_duration_secs: u64,
    /// Earliest time at which the next epoch can begin
    pub next_epoch_start: Timestamp,
    pub lock_duration_secs: u64,
    pub pending_rebase: Amount,
    pub last_rebase_epoch: Option<Epoch>,
    pub paused: bool,
    pub exempt_senders: Vec<Address>,
    pub exempt_receivers: Vec<Address>,
}

/// The xFAT conversion engine
pub struct XFat {
    /// Identity of the engine in collaborator ledgers
    address: Address,
    clock: Arc<dyn Clock>,
    pub(crate) state: RwLock<XFatState>,
    pub(crate) collaborators: RwLock<Collaborators>,
    pub(crate) reentrancy: ReentrancyGuard,
}

/// Builder for [`XFat`]
pub struct XFatBuilder {
    address: Address,
    owner: Address,
    minter: Option<Address>,
    config: XFatConfig,
    clock: Option<Arc<dyn Clock>>,
    collaborators: Collaborators,
}

impl XFatBuilder {
    pub fn config(mut self, config: XFatConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Identity allowed to call `rebase`; defaults to the owner
    pub fn minter(mut self, minter: Address) -> Self {
        self.minter = Some(minter);
        self
    }

    pub fn vote_escrow(mut self, escrow: Arc<dyn VoteEscrow>) -> Self {
        self.collaborators.vote_escrow = Some(escrow);
        self
    }

    pub fn staking_vault(mut self, vault: Arc<dyn StakingVault>) -> Self {
        self.collaborators.staking_vault = Some(vault);
        self
    }

    pub fn gauge_registry(mut self, registry: Arc<dyn GaugeRegistry>) -> Self {
        self.collaborators.gauge_registry = Some(registry);
        self
    }

    pub fn rewards_distributor(mut self, distributor: Arc<dyn RewardsDistributor>) -> Self {
        self.collaborators.rewards_distributor = Some(distributor);
        self
    }

    pub fn build(self) -> Result<XFat> {
        self.config.validate()?;
        let minter = self.minter.unwrap_or(self.owner);
        if self.address.is_zero() || self.owner.is_zero() || minter.is_zero() {
            return Err(XFatError::InvalidAddress);
        }

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let now = clock.now();
        let epochs = EpochClock::new(self.config.epoch.duration_secs, now);
        let rate = RateEngine::new(self.config.rate.clone(), now, epochs.current());

        tracing::info!(
            address = %self.address,
            owner = %self.owner,
            epoch = epochs.current(),
            max_rate = self.config.rate.max_rate,
            min_rate = self.config.rate.min_rate,
            "xFAT engine initialized"
        );

        Ok(XFat {
            address: self.address,
            clock,
            state: RwLock::new(XFatState {
                ledger: Ledger::new(),
                rate,
                epochs,
                exemptions: ExemptionGuard::new(),
                pending_rebase: 0,
                last_rebase_epoch: None,
                lock_duration_secs: self.config.lock.duration_secs,
                paused: false,
                owner: self.owner,
                minter,
                events: Vec::new(),
            }),
            collaborators: RwLock::new(self.collaborators),
            reentrancy: ReentrancyGuard::new(),
        })
    }
}

impl XFat {
    /// Start building an engine identified by `address`, administered by `owner`
    pub fn builder(address: Address, owner: Address, base_asset: Arc<dyn FungibleAsset>) -> XFatBuilder {
        XFatBuilder {
            address,
            owner,
            minter: None,
            config: XFatConfig::default(),
            clock: None,
            collaborators: Collaborators {
                base_asset,
                vote_escrow: None,
                staking_vault: None,
                gauge_registry: None,
                rewards_distributor: None,
            },
        }
    }

    pub(crate) fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // === Queries ===

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.state.read().ledger.balance_of(account)
    }

    pub fn total_supply(&self) -> Amount {
        self.state.read().ledger.total_supply()
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.state.read().ledger.allowance(owner, spender)
    }

    /// Stored conversion rate (recovery not yet applied)
    pub fn conversion_rate(&self) -> Rate {
        self.state.read().rate.current_rate()
    }

    pub fn rate_state(&self) -> RateState {
        self.state.read().rate.state().clone()
    }

    pub fn parameters(&self) -> RateParameters {
        self.state.read().rate.params().clone()
    }

    pub fn current_epoch(&self) -> Epoch {
        self.state.read().epochs.current()
    }

    pub fn epoch_duration_secs(&self) -> u64 {
        self.state.read().epochs.duration_secs()
    }

    pub fn lock_duration_secs(&self) -> u64 {
        self.state.read().lock_duration_secs
    }

    pub fn pending_rebase(&self) -> Amount {
        self.state.read().pending_rebase
    }

    pub fn is_paused(&self) -> bool {
        self.state.read().paused
    }

    pub fn owner(&self) -> Address {
        self.state.read().owner
    }

    pub fn minter(&self) -> Address {
        self.state.read().minter
    }

    pub fn is_exempt(&self, kind: ExemptionKind, account: &Address) -> bool {
        self.state.read().exemptions.is_exempt(kind, account)
    }

    /// Base asset held by the engine
    pub fn base_asset_reserves(&self) -> Amount {
        let base_asset = self.collaborators.read().base_asset.clone();
        base_asset.balance_of(&self.address)
    }

    pub fn events(&self) -> Vec<XFatEvent> {
        self.state.read().events.clone()
    }

    pub fn drain_events(&self) -> Vec<XFatEvent> {
        std::mem::take(&mut self.state.write().events)
    }

    /// Price a base-asset redemption of `amount` right now, without side effects
    ///
    /// Applies pending recovery and the post-burn supply exactly as
    /// [`XFat::redeem`] would.
    pub fn quote_redemption(&self, amount: Amount) -> Result<RedemptionQuote> {
        let now = self.now();
        let state = self.state.read();
        let epoch = state.epochs.peek(now);
        let supply_after = state.ledger.total_supply().saturating_sub(amount);
        let quote = state.rate.quote(amount, supply_after, epoch)?;
        tracing::debug!(
            amount = %amount,
            output = %quote.output,
            rate = quote.effective_rate,
            "Quoted redemption"
        );
        Ok(quote)
    }

    pub fn snapshot(&self) -> XFatSnapshot {
        let state = self.state.read();
        let mut exempt_senders: Vec<Address> = state.exemptions.senders().copied().collect();
        let mut exempt_receivers: Vec<Address> = state.exemptions.receivers().copied().collect();
        exempt_senders.sort();
        exempt_receivers.sort();
        XFatSnapshot {
            address: self.address,
            owner: state.owner,
            minter: state.minter,
            total_supply: state.ledger.total_supply(),
            holders: state.ledger.holder_count(),
            rate: state.rate.state().clone(),
            parameters: state.rate.params().clone(),
            current_epoch: state.epochs.current(),
            epoch_duration_secs: state.epochs.duration_secs(),
            next_epoch_start: state.epochs.next_epoch_start(),
            lock_duration_secs: state.lock_duration_secs,
            pending_rebase: state.pending_rebase,
            last_rebase_epoch: state.last_rebase_epoch,
            paused: state.paused,
            exempt_senders,
            exempt_receivers,
        }
    }

    // === Deposit ===

    /// Convert `amount` of the caller's FAT into xFAT 1:1
    ///
    /// The engine must hold an allowance from `caller` on the base asset.
    pub fn deposit(&self, caller: &Address, amount: Amount) -> Result<()> {
        let _entered = self.reentrancy.enter()?;
        if amount == 0 {
            return Err(XFatError::ZeroAmount);
        }
        if caller.is_zero() {
            return Err(XFatError::InvalidAddress);
        }
        if self.state.read().paused {
            return Err(XFatError::Paused);
        }

        let base_asset = self.collaborators.read().base_asset.clone();
        if !base_asset.transfer_from(&self.address, caller, &self.address, amount) {
            return Err(XFatError::CollaboratorFailed("base asset transfer_from rejected".into()));
        }

        let now = self.now();
        let mut state = self.state.write();
        if let Err(e) = state.ledger.mint(caller, amount) {
            drop(state);
            if base_asset.transfer(&self.address, caller, amount) {
                return Err(e);
            }
            tracing::warn!(account = %caller, amount = %amount, error = %e, "Deposit refund rejected");
            return Err(XFatError::CollaboratorFailed(format!(
                "mint failed ({e}) and refund of {amount} was rejected"
            )));
        }
        state.advance_epoch(now);
        state.emit(XFatEvent::Transfer { from: Address::ZERO, to: *caller, amount });
        state.emit(XFatEvent::Deposited { account: *caller, amount });
        tracing::info!(account = %caller, amount = %amount, "Deposited FAT for xFAT");
        Ok(())
    }

    // === Transfers ===

    /// Move xFAT from `caller` to `to`, subject to the transfer guard
    pub fn transfer(&self, caller: &Address, to: &Address, amount: Amount) -> Result<()> {
        let _entered = self.reentrancy.enter()?;
        self.move_tokens(None, caller, to, amount)
    }

    /// Move xFAT from `from` to `to` on `spender`'s allowance, subject to the transfer guard
    pub fn transfer_from(&self, spender: &Address, from: &Address, to: &Address, amount: Amount) -> Result<()> {
        let _entered = self.reentrancy.enter()?;
        self.move_tokens(Some(spender), from, to, amount)
    }

    pub fn approve(&self, owner: &Address, spender: &Address, amount: Amount) -> Result<()> {
        let _entered = self.reentrancy.enter()?;
        let mut state = self.state.write();
        state.ledger.approve(owner, spender, amount)?;
        state.emit(XFatEvent::Approval { owner: *owner, spender: *spender, amount });
        Ok(())
    }

    fn move_tokens(&self, spender: Option<&Address>, from: &Address, to: &Address, amount: Amount) -> Result<()> {
        if from.is_zero() || to.is_zero() {
            return Err(XFatError::InvalidAddress);
        }

        // every check before the guard so an auto-allow-listing never outlives a failed call
        let cleared = {
            let state = self.state.read();
            Self::check_spendable(&state, spender, from, amount)?;
            state.exemptions.clearance(from, to)
        };

        // registry is consulted with no lock held
        let recognized_source = cleared.is_none() && {
            let registry = self.collaborators.read().gauge_registry.clone();
            registry.is_some_and(|r| r.is_recognized_source(from))
        };

        let mut state = self.state.write();
        Self::check_spendable(&state, spender, from, amount)?;
        let clearance = match state.exemptions.authorize_transfer(from, to, recognized_source) {
            Ok(clearance) => clearance,
            Err(e) => {
                tracing::warn!(from = %from, to = %to, amount = %amount, "xFAT transfer rejected");
                return Err(e);
            }
        };
        if clearance == TransferClearance::NewlyRecognized {
            tracing::info!(account = %from, "Recognized reward source allow-listed");
            state.emit(XFatEvent::ExemptionUpdated {
                kind: ExemptionKind::Sender,
                account: *from,
                exempt: true,
            });
        }

        if let Some(spender) = spender {
            state.ledger.spend_allowance(from, spender, amount)?;
        }
        state.ledger.move_balance(from, to, amount)?;
        state.emit(XFatEvent::Transfer { from: *from, to: *to, amount });
        tracing::debug!(from = %from, to = %to, amount = %amount, "xFAT transferred");
        Ok(())
    }

    fn check_spendable(state: &XFatState, spender: Option<&Address>, from: &Address, amount: Amount) -> Result<()> {
        let available = state.ledger.balance_of(from);
        if available < amount {
            return Err(XFatError::InsufficientBalance { required: amount, available });
        }
        if let Some(spender) = spender {
            let allowed = state.ledger.allowance(from, spender);
            if allowed < amount {
                return Err(XFatError::InsufficientAllowance { required: amount, available: allowed });
            }
        }
        Ok(())
    }

    // === Redemption ===

    /// Redeem by legacy integer mode code (0 base asset, 1 lock, 2 stake)
    pub fn redeem_with_code(&self, caller: &Address, amount: Amount, code: u8) -> Result<RedemptionReceipt> {
        let mode = RedeemType::from_code(code)?;
        self.redeem(caller, amount, mode)
    }

    /// Burn `amount` of the caller's xFAT and pay it out through `mode`
    pub fn redeem(&self, caller: &Address, amount: Amount, mode: RedeemType) -> Result<RedemptionReceipt> {
        let _entered = self.reentrancy.enter()?;
        let now = self.now();
        let collaborators = self.collaborators.read().clone();

        let mut state = self.state.write();
        if state.paused {
            return Err(XFatError::Paused);
        }
        if amount == 0 {
            return Err(XFatError::ZeroAmount);
        }
        if caller.is_zero() {
            return Err(XFatError::InvalidAddress);
        }
        let available = state.ledger.balance_of(caller);
        if available < amount {
            return Err(XFatError::InsufficientBalance { required: amount, available });
        }

        let checkpoint = state.checkpoint(Some(caller));
        let plan = match Self::stage_redemption(&mut state, &collaborators, caller, amount, mode, now) {
            Ok(plan) => plan,
            Err(e) => {
                state.restore(checkpoint);
                tracing::warn!(account = %caller, amount = %amount, error = %e, "Redemption aborted");
                return Err(e);
            }
        };
        let epoch = state.epochs.current();
        drop(state);

        match self.execute_payout(&collaborators, caller, amount, plan) {
            Ok(payout) => {
                let mut state = self.state.write();
                match &payout {
                    Payout::BaseAsset { .. } => {}
                    Payout::LockedPosition { lock_id } => state.emit(XFatEvent::ConvertedToLock {
                        account: *caller,
                        amount,
                        lock_id: *lock_id,
                    }),
                    Payout::StakedPosition => state.emit(XFatEvent::ConvertedToStake { account: *caller, amount }),
                }
                tracing::info!(account = %caller, amount = %amount, mode = ?mode, epoch, "xFAT redeemed");
                Ok(RedemptionReceipt {
                    account: *caller,
                    amount,
                    epoch,
                    payout,
                })
            }
            Err(e) => {
                self.state.write().restore(checkpoint);
                tracing::warn!(account = %caller, amount = %amount, error = %e, "Redemption rolled back");
                Err(e)
            }
        }
    }

    /// Epoch advance, burn and rate phases; everything that happens under the lock
    fn stage_redemption(
        state: &mut XFatState,
        collaborators: &Collaborators,
        caller: &Address,
        amount: Amount,
        mode: RedeemType,
        now: Timestamp,
    ) -> Result<PayoutPlan> {
        state.advance_epoch(now);
        state.ledger.burn(caller, amount)?;
        state.emit(XFatEvent::Transfer { from: *caller, to: Address::ZERO, amount });
        let epoch = state.epochs.current();

        match mode {
            RedeemType::ToBaseAsset => {
                state.rate.update_conversion_rate(epoch, now)?;
                let supply = state.ledger.total_supply();
                let quote = state.rate.quote_current(amount, supply)?;
                let outcome = state.rate.apply_redemption_impact(amount, supply, now, epoch)?;
                state.pending_rebase = checked_add(state.pending_rebase, quote.penalty)?;

                let cumulative_impact = state.rate.state().cumulative_impact;
                state.emit(XFatEvent::RateUpdated {
                    previous: outcome.rate_before,
                    current: outcome.rate_after,
                    cumulative_impact,
                });
                state.emit(XFatEvent::Redeemed {
                    account: *caller,
                    amount,
                    output: quote.output,
                    penalty: quote.penalty,
                    effective_rate: quote.effective_rate,
                });
                tracing::debug!(
                    effective_rate = quote.effective_rate,
                    rate_after = outcome.rate_after,
                    penalty = %quote.penalty,
                    "Redemption priced"
                );
                Ok(PayoutPlan::BaseAsset(quote))
            }
            RedeemType::ToLockedPosition => {
                let escrow = collaborators
                    .vote_escrow
                    .clone()
                    .ok_or(XFatError::CollaboratorNotSet("vote escrow"))?;
                Ok(PayoutPlan::Lock {
                    escrow,
                    duration_secs: state.lock_duration_secs,
                })
            }
            RedeemType::ToStakedPosition => {
                let vault = collaborators
                    .staking_vault
                    .clone()
                    .ok_or(XFatError::CollaboratorNotSet("staking vault"))?;
                Ok(PayoutPlan::Stake { vault })
            }
        }
    }

    /// Collaborator calls of a staged redemption; runs with no lock held
    fn execute_payout(
        &self,
        collaborators: &Collaborators,
        caller: &Address,
        amount: Amount,
        plan: PayoutPlan,
    ) -> Result<Payout> {
        let base_asset = &collaborators.base_asset;
        match plan {
            PayoutPlan::BaseAsset(quote) => {
                if quote.output > 0 && !base_asset.transfer(&self.address, caller, quote.output) {
                    return Err(XFatError::CollaboratorFailed("base asset payout rejected".into()));
                }
                Ok(Payout::BaseAsset {
                    output: quote.output,
                    penalty: quote.penalty,
                    effective_rate: quote.effective_rate,
                })
            }
            PayoutPlan::Lock { escrow, duration_secs } => {
                let spender = escrow.address();
                if !base_asset.approve(&self.address, &spender, amount) {
                    return Err(XFatError::CollaboratorFailed("base asset approve rejected".into()));
                }
                match escrow.create_lock_for(&self.address, amount, duration_secs, caller) {
                    Ok(lock_id) => Ok(Payout::LockedPosition { lock_id }),
                    Err(e) => {
                        base_asset.approve(&self.address, &spender, 0);
                        Err(e)
                    }
                }
            }
            PayoutPlan::Stake { vault } => {
                let spender = vault.address();
                if !base_asset.approve(&self.address, &spender, amount) {
                    return Err(XFatError::CollaboratorFailed("base asset approve rejected".into()));
                }
                if let Err(e) = vault.deposit(&self.address, amount, caller) {
                    base_asset.approve(&self.address, &spender, 0);
                    return Err(e);
                }
                Ok(Payout::StakedPosition)
            }
        }
    }

    // === Rebase ===

    /// Flush the rebase pool to the rewards distributor
    ///
    /// Minter only. At most one flush per epoch; an already-flushed epoch or an
    /// empty pool is a silent no-op returning `None`.
    pub fn rebase(&self, caller: &Address) -> Result<Option<Amount>> {
        let _entered = self.reentrancy.enter()?;
        let now = self.now();
        let base_asset = self.collaborators.read().base_asset.clone();
        let distributor = self.collaborators.read().rewards_distributor.clone();

        let mut state = self.state.write();
        if *caller != state.minter {
            return Err(XFatError::NotAuthorized);
        }
        let checkpoint = state.checkpoint(None);
        state.advance_epoch(now);
        let epoch = state.epochs.current();
        if state.last_rebase_epoch == Some(epoch) || state.pending_rebase == 0 {
            return Ok(None);
        }
        let Some(distributor) = distributor else {
            state.restore(checkpoint);
            return Err(XFatError::CollaboratorNotSet("rewards distributor"));
        };

        let amount = state.pending_rebase;
        state.pending_rebase = 0;
        state.last_rebase_epoch = Some(epoch);
        state.emit(XFatEvent::Rebased { epoch, amount });
        drop(state);

        let spender = distributor.address();
        let flushed = if base_asset.approve(&self.address, &spender, amount) {
            distributor.notify_reward_amount(&self.address, amount)
        } else {
            Err(XFatError::CollaboratorFailed("base asset approve rejected".into()))
        };

        match flushed {
            Ok(()) => {
                tracing::info!(epoch, amount = %amount, "Rebase pool flushed");
                Ok(Some(amount))
            }
            Err(e) => {
                base_asset.approve(&self.address, &spender, 0);
                self.state.write().restore(checkpoint);
                tracing::warn!(epoch, error = %e, "Rebase rolled back");
                Err(e)
            }
        }
    }
}
