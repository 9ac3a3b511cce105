//! # External Collaborators
//!
//! Interfaces the engine consumes, plus in-memory implementations used by the
//! simulator and the test-suite.
//!
//! There is no ambient message sender in-process, so every call carries the
//! identity of the invoking account explicitly as `caller`.
//!
//! | Collaborator | Role |
//! |--------------|------|
//! | [`FungibleAsset`] | FAT base asset (and any token held by the engine) |
//! | [`VoteEscrow`] | Locked-governance positions (veFAT) |
//! | [`StakingVault`] | Auto-compounding FAT vault |
//! | [`GaugeRegistry`] | Recognizes reward-distribution sources |
//! | [`RewardsDistributor`] | Receives flushed penalties on rebase |

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{Result, XFatError};
use crate::types::{Address, Amount, LockId};

/// Fungible token interface (ERC-20 shaped)
pub trait FungibleAsset: Send + Sync {
    /// Move `amount` from `caller` to `to`
    fn transfer(&self, caller: &Address, to: &Address, amount: Amount) -> bool;

    /// Move `amount` from `from` to `to`, spending `caller`'s allowance
    fn transfer_from(&self, caller: &Address, from: &Address, to: &Address, amount: Amount) -> bool;

    /// Set the allowance `caller` grants `spender`
    fn approve(&self, caller: &Address, spender: &Address, amount: Amount) -> bool;

    fn balance_of(&self, account: &Address) -> Amount;
}

/// Locked-governance position issuer
pub trait VoteEscrow: Send + Sync {
    /// Account the engine grants its base-asset allowance to
    fn address(&self) -> Address;

    /// Pull `amount` of base asset from `caller` and lock it for `beneficiary`
    fn create_lock_for(
        &self,
        caller: &Address,
        amount: Amount,
        duration_secs: u64,
        beneficiary: &Address,
    ) -> Result<LockId>;
}

/// Auto-compounding staking vault
pub trait StakingVault: Send + Sync {
    fn address(&self) -> Address;

    /// Pull `amount` of base asset from `caller` and credit `recipient`
    fn deposit(&self, caller: &Address, amount: Amount, recipient: &Address) -> Result<()>;
}

/// Read-only registry of reward-emission sources (gauges, fee distributors)
pub trait GaugeRegistry: Send + Sync {
    fn is_recognized_source(&self, account: &Address) -> bool;
}

/// Destination of the flushed rebase pool
pub trait RewardsDistributor: Send + Sync {
    fn address(&self) -> Address;

    /// Pull `amount` of base asset from `caller` and schedule it as rewards
    fn notify_reward_amount(&self, caller: &Address, amount: Amount) -> Result<()>;
}

/// In-memory fungible token with allowances
#[derive(Debug, Default)]
pub struct InMemoryAsset {
    symbol: String,
    balances: RwLock<HashMap<Address, Amount>>,
    allowances: RwLock<HashMap<(Address, Address), Amount>>,
    total_supply: RwLock<Amount>,
}

impl InMemoryAsset {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Issue new units to `to` (fixture funding)
    pub fn mint(&self, to: &Address, amount: Amount) {
        *self.balances.write().entry(*to).or_insert(0) += amount;
        *self.total_supply.write() += amount;
    }

    pub fn total_supply(&self) -> Amount {
        *self.total_supply.read()
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances.read().get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    fn move_units(&self, from: &Address, to: &Address, amount: Amount) -> bool {
        let mut balances = self.balances.write();
        let available = balances.get(from).copied().unwrap_or(0);
        if available < amount || to.is_zero() {
            tracing::debug!(asset = %self.symbol, from = %from, amount = %amount, "Asset transfer rejected");
            return false;
        }
        balances.insert(*from, available - amount);
        *balances.entry(*to).or_insert(0) += amount;
        true
    }
}

impl FungibleAsset for InMemoryAsset {
    fn transfer(&self, caller: &Address, to: &Address, amount: Amount) -> bool {
        self.move_units(caller, to, amount)
    }

    fn transfer_from(&self, caller: &Address, from: &Address, to: &Address, amount: Amount) -> bool {
        let mut allowances = self.allowances.write();
        let allowed = allowances.get(&(*from, *caller)).copied().unwrap_or(0);
        if allowed < amount {
            return false;
        }
        if !self.move_units(from, to, amount) {
            return false;
        }
        if allowed != Amount::MAX {
            allowances.insert((*from, *caller), allowed - amount);
        }
        true
    }

    fn approve(&self, caller: &Address, spender: &Address, amount: Amount) -> bool {
        self.allowances.write().insert((*caller, *spender), amount);
        true
    }

    fn balance_of(&self, account: &Address) -> Amount {
        self.balances.read().get(account).copied().unwrap_or(0)
    }
}

/// Lock created by [`InMemoryVoteEscrow`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockPosition {
    pub id: LockId,
    pub beneficiary: Address,
    pub amount: Amount,
    pub duration_secs: u64,
}

/// In-memory vote-escrow holding locked base asset
pub struct InMemoryVoteEscrow {
    address: Address,
    asset: Arc<dyn FungibleAsset>,
    locks: RwLock<Vec<LockPosition>>,
}

impl InMemoryVoteEscrow {
    pub fn new(address: Address, asset: Arc<dyn FungibleAsset>) -> Self {
        Self {
            address,
            asset,
            locks: RwLock::new(Vec::new()),
        }
    }

    pub fn locks(&self) -> Vec<LockPosition> {
        self.locks.read().clone()
    }
}

impl VoteEscrow for InMemoryVoteEscrow {
    fn address(&self) -> Address {
        self.address
    }

    fn create_lock_for(
        &self,
        caller: &Address,
        amount: Amount,
        duration_secs: u64,
        beneficiary: &Address,
    ) -> Result<LockId> {
        if amount == 0 {
            return Err(XFatError::ZeroAmount);
        }
        if !self.asset.transfer_from(&self.address, caller, &self.address, amount) {
            return Err(XFatError::CollaboratorFailed("vote-escrow could not pull base asset".into()));
        }
        let mut locks = self.locks.write();
        let id = locks.len() as LockId + 1;
        locks.push(LockPosition {
            id,
            beneficiary: *beneficiary,
            amount,
            duration_secs,
        });
        Ok(id)
    }
}

/// In-memory staking vault crediting shares 1:1
pub struct InMemoryStakingVault {
    address: Address,
    asset: Arc<dyn FungibleAsset>,
    shares: RwLock<HashMap<Address, Amount>>,
}

impl InMemoryStakingVault {
    pub fn new(address: Address, asset: Arc<dyn FungibleAsset>) -> Self {
        Self {
            address,
            asset,
            shares: RwLock::new(HashMap::new()),
        }
    }

    pub fn shares_of(&self, account: &Address) -> Amount {
        self.shares.read().get(account).copied().unwrap_or(0)
    }
}

impl StakingVault for InMemoryStakingVault {
    fn address(&self) -> Address {
        self.address
    }

    fn deposit(&self, caller: &Address, amount: Amount, recipient: &Address) -> Result<()> {
        if !self.asset.transfer_from(&self.address, caller, &self.address, amount) {
            return Err(XFatError::CollaboratorFailed("vault could not pull base asset".into()));
        }
        *self.shares.write().entry(*recipient).or_insert(0) += amount;
        Ok(())
    }
}

/// Registry with a fixed, explicitly registered set of sources
#[derive(Debug, Default)]
pub struct StaticGaugeRegistry {
    sources: RwLock<HashSet<Address>>,
}

impl StaticGaugeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, source: Address) {
        self.sources.write().insert(source);
    }
}

impl GaugeRegistry for StaticGaugeRegistry {
    fn is_recognized_source(&self, account: &Address) -> bool {
        self.sources.read().contains(account)
    }
}

/// In-memory distributor recording every notified amount
pub struct InMemoryDistributor {
    address: Address,
    asset: Arc<dyn FungibleAsset>,
    notified: RwLock<Vec<Amount>>,
}

impl InMemoryDistributor {
    pub fn new(address: Address, asset: Arc<dyn FungibleAsset>) -> Self {
        Self {
            address,
            asset,
            notified: RwLock::new(Vec::new()),
        }
    }

    pub fn notified(&self) -> Vec<Amount> {
        self.notified.read().clone()
    }

    pub fn total_notified(&self) -> Amount {
        self.notified.read().iter().sum()
    }
}

impl RewardsDistributor for InMemoryDistributor {
    fn address(&self) -> Address {
        self.address
    }

    fn notify_reward_amount(&self, caller: &Address, amount: Amount) -> Result<()> {
        if !self.asset.transfer_from(&self.address, caller, &self.address, amount) {
            return Err(XFatError::CollaboratorFailed("distributor could not pull rewards".into()));
        }
        self.notified.write().push(amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    #[test]
    fn test_asset_transfer_and_allowance() {
        let fat = InMemoryAsset::new("FAT");
        fat.mint(&addr("alice"), 100);
        assert!(fat.transfer(&addr("alice"), &addr("bob"), 40));
        assert!(!fat.transfer(&addr("alice"), &addr("bob"), 61));

        assert!(!fat.transfer_from(&addr("carol"), &addr("alice"), &addr("carol"), 10));
        fat.approve(&addr("alice"), &addr("carol"), 10);
        assert!(fat.transfer_from(&addr("carol"), &addr("alice"), &addr("carol"), 10));
        assert_eq!(fat.allowance(&addr("alice"), &addr("carol")), 0);
        assert_eq!(fat.balance_of(&addr("alice")), 50);
        assert_eq!(fat.balance_of(&addr("carol")), 10);
        assert_eq!(fat.total_supply(), 100);
    }

    #[test]
    fn test_vote_escrow_pulls_funds() {
        let fat = Arc::new(InMemoryAsset::new("FAT"));
        let escrow = InMemoryVoteEscrow::new(addr("ve"), fat.clone());
        fat.mint(&addr("engine"), 50);

        let denied = escrow.create_lock_for(&addr("engine"), 50, 100, &addr("alice"));
        assert!(matches!(denied, Err(XFatError::CollaboratorFailed(_))));

        fat.approve(&addr("engine"), &addr("ve"), 50);
        let id = escrow.create_lock_for(&addr("engine"), 50, 100, &addr("alice")).unwrap();
        assert_eq!(id, 1);
        assert_eq!(fat.balance_of(&addr("ve")), 50);
        assert_eq!(escrow.locks()[0].beneficiary, addr("alice"));
    }

    #[test]
    fn test_vault_credits_recipient() {
        let fat = Arc::new(InMemoryAsset::new("FAT"));
        let vault = InMemoryStakingVault::new(addr("vault"), fat.clone());
        fat.mint(&addr("engine"), 20);
        fat.approve(&addr("engine"), &addr("vault"), 20);
        vault.deposit(&addr("engine"), 20, &addr("bob")).unwrap();
        assert_eq!(vault.shares_of(&addr("bob")), 20);
        assert_eq!(fat.balance_of(&addr("vault")), 20);
    }

    #[test]
    fn test_registry() {
        let registry = StaticGaugeRegistry::new();
        registry.register(addr("gauge"));
        assert!(registry.is_recognized_source(&addr("gauge")));
        assert!(!registry.is_recognized_source(&addr("alice")));
    }
}
