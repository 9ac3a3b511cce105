//! # Admin Surface
//!
//! Owner-only operations. Every setter validates its input before touching
//! state and emits an event when it commits.
//!
//! | Operation | Validation |
//! |-----------|------------|
//! | `set_rate_bounds` | `0 < min < max <= 10_000` |
//! | `set_recovery_parameters` | recovery 1-52 epochs, beta 1-100, half-life > 0 |
//! | `set_epoch_duration` | 30 minutes to 4 weeks |
//! | `set_lock_duration` | non-zero |
//! | `set_minter`, `transfer_ownership`, `set_exemption` | non-null account |
//! | `emergency_withdraw` | non-zero amount, non-null recipient |

use std::sync::Arc;

use crate::collaborators::{FungibleAsset, GaugeRegistry, RewardsDistributor, StakingVault, VoteEscrow};
use crate::config::{validate_bounds, validate_epoch_duration, validate_recovery};
use crate::engine::{Collaborators, XFat};
use crate::error::{Result, XFatError};
use crate::events::XFatEvent;
use crate::guard::ExemptionKind;
use crate::types::{Address, Amount, Rate};

impl XFat {
    /// Replace the rate bounds; stored rates are re-clamped into them
    pub fn set_rate_bounds(&self, caller: &Address, min_rate: Rate, max_rate: Rate) -> Result<()> {
        let _entered = self.reentrancy.enter()?;
        let mut state = self.state.write();
        state.ensure_owner(caller)?;
        validate_bounds(min_rate, max_rate)?;

        let previous = state.rate.current_rate();
        state.rate.set_bounds(min_rate, max_rate);
        let current = state.rate.current_rate();
        state.emit(XFatEvent::ParametersUpdated { parameter: "rate_bounds".into() });
        if previous != current {
            let cumulative_impact = state.rate.state().cumulative_impact;
            state.emit(XFatEvent::RateUpdated { previous, current, cumulative_impact });
        }
        tracing::info!(min_rate, max_rate, "Rate bounds updated");
        Ok(())
    }

    pub fn set_recovery_parameters(
        &self,
        caller: &Address,
        recovery_epochs: u64,
        penalty_impact_beta: u64,
        decay_half_life_secs: u64,
    ) -> Result<()> {
        let _entered = self.reentrancy.enter()?;
        let mut state = self.state.write();
        state.ensure_owner(caller)?;
        validate_recovery(recovery_epochs, penalty_impact_beta, decay_half_life_secs)?;

        state.rate.set_recovery(recovery_epochs, penalty_impact_beta, decay_half_life_secs);
        state.emit(XFatEvent::ParametersUpdated { parameter: "recovery".into() });
        tracing::info!(recovery_epochs, penalty_impact_beta, decay_half_life_secs, "Recovery parameters updated");
        Ok(())
    }

    /// Change the epoch length; the current epoch index is kept
    pub fn set_epoch_duration(&self, caller: &Address, duration_secs: u64) -> Result<()> {
        let _entered = self.reentrancy.enter()?;
        let mut state = self.state.write();
        state.ensure_owner(caller)?;
        validate_epoch_duration(duration_secs)?;

        state.epochs.set_duration(duration_secs);
        state.emit(XFatEvent::ParametersUpdated { parameter: "epoch_duration".into() });
        tracing::info!(duration_secs, "Epoch duration updated");
        Ok(())
    }

    /// Duration of locks created by `ToLockedPosition` redemptions
    pub fn set_lock_duration(&self, caller: &Address, duration_secs: u64) -> Result<()> {
        let _entered = self.reentrancy.enter()?;
        let mut state = self.state.write();
        state.ensure_owner(caller)?;
        if duration_secs == 0 {
            return Err(XFatError::InvalidParameter("lock duration must be non-zero".into()));
        }

        state.lock_duration_secs = duration_secs;
        state.emit(XFatEvent::ParametersUpdated { parameter: "lock_duration".into() });
        tracing::info!(duration_secs, "Lock duration updated");
        Ok(())
    }

    pub fn set_base_asset(&self, caller: &Address, asset: Arc<dyn FungibleAsset>) -> Result<()> {
        self.replace_collaborator(caller, "base_asset", |c| c.base_asset = asset)
    }

    pub fn set_vote_escrow(&self, caller: &Address, escrow: Arc<dyn VoteEscrow>) -> Result<()> {
        self.replace_collaborator(caller, "vote_escrow", |c| c.vote_escrow = Some(escrow))
    }

    pub fn set_staking_vault(&self, caller: &Address, vault: Arc<dyn StakingVault>) -> Result<()> {
        self.replace_collaborator(caller, "staking_vault", |c| c.staking_vault = Some(vault))
    }

    pub fn set_gauge_registry(&self, caller: &Address, registry: Arc<dyn GaugeRegistry>) -> Result<()> {
        self.replace_collaborator(caller, "gauge_registry", |c| c.gauge_registry = Some(registry))
    }

    pub fn set_rewards_distributor(&self, caller: &Address, distributor: Arc<dyn RewardsDistributor>) -> Result<()> {
        self.replace_collaborator(caller, "rewards_distributor", |c| {
            c.rewards_distributor = Some(distributor)
        })
    }

    fn replace_collaborator(
        &self,
        caller: &Address,
        name: &'static str,
        apply: impl FnOnce(&mut Collaborators),
    ) -> Result<()> {
        let _entered = self.reentrancy.enter()?;
        let mut state = self.state.write();
        state.ensure_owner(caller)?;
        let mut collaborators = self.collaborators.write();
        apply(&mut *collaborators);
        drop(collaborators);
        state.emit(XFatEvent::CollaboratorUpdated { collaborator: name.into() });
        tracing::info!(collaborator = name, "Collaborator replaced");
        Ok(())
    }

    /// Identity allowed to trigger `rebase`
    pub fn set_minter(&self, caller: &Address, minter: Address) -> Result<()> {
        let _entered = self.reentrancy.enter()?;
        let mut state = self.state.write();
        state.ensure_owner(caller)?;
        if minter.is_zero() {
            return Err(XFatError::InvalidAddress);
        }

        state.minter = minter;
        state.emit(XFatEvent::MinterUpdated { minter });
        tracing::info!(minter = %minter, "Minter updated");
        Ok(())
    }

    pub fn transfer_ownership(&self, caller: &Address, new_owner: Address) -> Result<()> {
        let _entered = self.reentrancy.enter()?;
        let mut state = self.state.write();
        state.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(XFatError::InvalidAddress);
        }

        let previous = state.owner;
        state.owner = new_owner;
        state.emit(XFatEvent::OwnershipTransferred { previous, owner: new_owner });
        tracing::info!(previous = %previous, owner = %new_owner, "Ownership transferred");
        Ok(())
    }

    /// Add or remove `account` from an exemption set
    ///
    /// Emits only when the set actually changes.
    pub fn set_exemption(&self, caller: &Address, kind: ExemptionKind, account: Address, exempt: bool) -> Result<()> {
        let _entered = self.reentrancy.enter()?;
        let mut state = self.state.write();
        state.ensure_owner(caller)?;
        if account.is_zero() {
            return Err(XFatError::InvalidAddress);
        }

        if state.exemptions.set(kind, account, exempt) {
            state.emit(XFatEvent::ExemptionUpdated { kind, account, exempt });
            tracing::info!(kind = ?kind, account = %account, exempt, "Exemption updated");
        }
        Ok(())
    }

    /// Halt deposits and redemptions
    pub fn pause(&self, caller: &Address) -> Result<()> {
        self.set_paused(caller, true)
    }

    pub fn unpause(&self, caller: &Address) -> Result<()> {
        self.set_paused(caller, false)
    }

    fn set_paused(&self, caller: &Address, paused: bool) -> Result<()> {
        let _entered = self.reentrancy.enter()?;
        let mut state = self.state.write();
        state.ensure_owner(caller)?;
        if state.paused == paused {
            return Ok(());
        }

        state.paused = paused;
        state.emit(if paused { XFatEvent::Paused } else { XFatEvent::Unpaused });
        tracing::warn!(paused, "xFAT pause state changed");
        Ok(())
    }

    /// Move `amount` of any token held by the engine to `to`
    ///
    /// Ledger and rebase pool are left untouched.
    pub fn emergency_withdraw(
        &self,
        caller: &Address,
        token: &dyn FungibleAsset,
        to: &Address,
        amount: Amount,
    ) -> Result<()> {
        let _entered = self.reentrancy.enter()?;
        self.state.read().ensure_owner(caller)?;
        if amount == 0 {
            return Err(XFatError::ZeroAmount);
        }
        if to.is_zero() {
            return Err(XFatError::InvalidAddress);
        }

        if !token.transfer(&self.address(), to, amount) {
            return Err(XFatError::CollaboratorFailed("emergency transfer rejected".into()));
        }
        self.state.write().emit(XFatEvent::EmergencyWithdrawn { to: *to, amount });
        tracing::warn!(to = %to, amount = %amount, "Emergency withdrawal");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::collaborators::{InMemoryAsset, InMemoryDistributor};

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    fn engine() -> (XFat, Arc<InMemoryAsset>) {
        let fat = Arc::new(InMemoryAsset::new("FAT"));
        let xfat = XFat::builder(addr("xfat"), addr("owner"), fat.clone())
            .clock(Arc::new(ManualClock::new(1_000_000)))
            .build()
            .unwrap();
        (xfat, fat)
    }

    #[test]
    fn test_admin_requires_owner() {
        let (xfat, _) = engine();
        let stranger = addr("stranger");
        assert_eq!(xfat.set_rate_bounds(&stranger, 6_000, 9_000), Err(XFatError::NotAuthorized));
        assert_eq!(xfat.pause(&stranger), Err(XFatError::NotAuthorized));
        assert_eq!(xfat.set_minter(&stranger, stranger), Err(XFatError::NotAuthorized));
        assert_eq!(
            xfat.set_exemption(&stranger, ExemptionKind::Sender, stranger, true),
            Err(XFatError::NotAuthorized)
        );
        assert!(xfat.events().is_empty());
    }

    #[test]
    fn test_rate_bounds_validation_and_reclamp() {
        let (xfat, _) = engine();
        let owner = addr("owner");
        assert!(matches!(
            xfat.set_rate_bounds(&owner, 9_500, 9_000),
            Err(XFatError::InvalidParameter(_))
        ));
        assert!(matches!(
            xfat.set_rate_bounds(&owner, 0, 9_000),
            Err(XFatError::InvalidParameter(_))
        ));
        assert!(matches!(
            xfat.set_rate_bounds(&owner, 5_000, 10_001),
            Err(XFatError::InvalidParameter(_))
        ));

        xfat.set_rate_bounds(&owner, 6_000, 8_000).unwrap();
        assert_eq!(xfat.conversion_rate(), 8_000);
        assert_eq!(xfat.parameters().min_rate, 6_000);
        assert!(xfat
            .events()
            .iter()
            .any(|e| matches!(e, XFatEvent::RateUpdated { previous: 9_000, current: 8_000, .. })));
    }

    #[test]
    fn test_recovery_and_durations() {
        let (xfat, _) = engine();
        let owner = addr("owner");
        assert!(xfat.set_recovery_parameters(&owner, 0, 10, 60).is_err());
        assert!(xfat.set_recovery_parameters(&owner, 4, 101, 60).is_err());
        xfat.set_recovery_parameters(&owner, 8, 2, 3_600).unwrap();
        assert_eq!(xfat.parameters().recovery_epochs, 8);
        assert_eq!(xfat.parameters().penalty_impact_beta, 2);

        assert!(xfat.set_epoch_duration(&owner, 60).is_err());
        xfat.set_epoch_duration(&owner, 3_600).unwrap();
        assert_eq!(xfat.epoch_duration_secs(), 3_600);

        assert!(xfat.set_lock_duration(&owner, 0).is_err());
        xfat.set_lock_duration(&owner, 86_400).unwrap();
        assert_eq!(xfat.lock_duration_secs(), 86_400);
    }

    #[test]
    fn test_ownership_and_minter() {
        let (xfat, _) = engine();
        let owner = addr("owner");
        assert_eq!(xfat.transfer_ownership(&owner, Address::ZERO), Err(XFatError::InvalidAddress));
        xfat.transfer_ownership(&owner, addr("dao")).unwrap();
        assert_eq!(xfat.owner(), addr("dao"));
        assert_eq!(xfat.pause(&owner), Err(XFatError::NotAuthorized));

        xfat.set_minter(&addr("dao"), addr("minter")).unwrap();
        assert_eq!(xfat.minter(), addr("minter"));
    }

    #[test]
    fn test_exemption_events_only_on_change() {
        let (xfat, _) = engine();
        let owner = addr("owner");
        xfat.set_exemption(&owner, ExemptionKind::Receiver, addr("pool"), true).unwrap();
        xfat.set_exemption(&owner, ExemptionKind::Receiver, addr("pool"), true).unwrap();
        assert!(xfat.is_exempt(ExemptionKind::Receiver, &addr("pool")));
        assert_eq!(xfat.drain_events().len(), 1);
        assert_eq!(
            xfat.set_exemption(&owner, ExemptionKind::Sender, Address::ZERO, true),
            Err(XFatError::InvalidAddress)
        );
    }

    #[test]
    fn test_pause_blocks_deposit() {
        let (xfat, fat) = engine();
        let owner = addr("owner");
        fat.mint(&addr("alice"), 10);
        fat.approve(&addr("alice"), &addr("xfat"), 10);

        xfat.pause(&owner).unwrap();
        assert!(xfat.is_paused());
        assert_eq!(xfat.deposit(&addr("alice"), 10), Err(XFatError::Paused));
        xfat.unpause(&owner).unwrap();
        xfat.deposit(&addr("alice"), 10).unwrap();
        assert_eq!(xfat.balance_of(&addr("alice")), 10);
    }

    #[test]
    fn test_emergency_withdraw() {
        let (xfat, fat) = engine();
        let owner = addr("owner");
        let stray = InMemoryAsset::new("STRAY");
        stray.mint(&addr("xfat"), 500);

        assert_eq!(
            xfat.emergency_withdraw(&addr("alice"), &stray, &addr("alice"), 500),
            Err(XFatError::NotAuthorized)
        );
        xfat.emergency_withdraw(&owner, &stray, &owner, 500).unwrap();
        assert_eq!(stray.balance_of(&owner), 500);
        assert!(matches!(
            xfat.emergency_withdraw(&owner, fat.as_ref(), &owner, 1),
            Err(XFatError::CollaboratorFailed(_))
        ));
    }

    #[test]
    fn test_collaborator_replacement() {
        let (xfat, fat) = engine();
        let distributor = Arc::new(InMemoryDistributor::new(addr("distributor"), fat));
        assert_eq!(
            xfat.set_rewards_distributor(&addr("stranger"), distributor.clone()),
            Err(XFatError::NotAuthorized)
        );
        xfat.set_rewards_distributor(&addr("owner"), distributor).unwrap();
        assert!(matches!(
            xfat.events().last(),
            Some(XFatEvent::CollaboratorUpdated { collaborator }) if collaborator == "rewards_distributor"
        ));
    }
}
