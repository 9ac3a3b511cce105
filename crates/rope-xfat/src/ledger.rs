//! # xFAT Ledger
//!
//! Per-account balances, total supply and spending allowances. The ledger
//! itself is unguarded: the engine runs the transfer guard before calling
//! [`Ledger::move_balance`].
//!
//! Invariant: `total_supply == sum(balances)` after every call. Only
//! [`Ledger::mint`] and [`Ledger::burn`] change the supply.

use std::collections::HashMap;

use crate::error::{Result, XFatError};
use crate::types::{Address, Amount};

/// Balance table of the xFAT token
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    total_supply: Amount,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Number of accounts with an entry (possibly zero)
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Credit `amount` to `account` and grow the supply
    pub fn mint(&mut self, account: &Address, amount: Amount) -> Result<()> {
        if account.is_zero() {
            return Err(XFatError::InvalidAddress);
        }
        let supply = self.total_supply.checked_add(amount).ok_or(XFatError::ArithmeticOverflow)?;
        let balance = self.balances.entry(*account).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(XFatError::ArithmeticOverflow)?;
        self.total_supply = supply;
        Ok(())
    }

    /// Debit `amount` from `account` and shrink the supply
    pub fn burn(&mut self, account: &Address, amount: Amount) -> Result<()> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(XFatError::InsufficientBalance { required: amount, available });
        }
        if let Some(balance) = self.balances.get_mut(account) {
            *balance -= amount;
        }
        self.total_supply -= amount;
        Ok(())
    }

    /// Move `amount` between two non-null accounts; supply is unchanged
    pub fn move_balance(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<()> {
        if from.is_zero() || to.is_zero() {
            return Err(XFatError::InvalidAddress);
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(XFatError::InsufficientBalance { required: amount, available });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(XFatError::ArithmeticOverflow)?;
        self.balances.insert(*from, available - amount);
        self.balances.insert(*to, credited);
        Ok(())
    }

    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) -> Result<()> {
        if owner.is_zero() || spender.is_zero() {
            return Err(XFatError::InvalidAddress);
        }
        self.allowances.insert((*owner, *spender), amount);
        Ok(())
    }

    /// Consume `amount` of the allowance `owner` granted `spender`
    pub fn spend_allowance(&mut self, owner: &Address, spender: &Address, amount: Amount) -> Result<()> {
        let available = self.allowance(owner, spender);
        if available == Amount::MAX {
            return Ok(());
        }
        if available < amount {
            return Err(XFatError::InsufficientAllowance { required: amount, available });
        }
        self.allowances.insert((*owner, *spender), available - amount);
        Ok(())
    }

    /// Put an account balance and the supply back to checkpointed values
    pub(crate) fn restore(&mut self, account: &Address, balance: Amount, total_supply: Amount) {
        self.balances.insert(*account, balance);
        self.total_supply = total_supply;
    }

    /// Sum of all balances; equals `total_supply` when the invariant holds
    pub fn sum_of_balances(&self) -> Amount {
        self.balances.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::from_label("alice")
    }

    fn bob() -> Address {
        Address::from_label("bob")
    }

    #[test]
    fn test_mint_and_burn() {
        let mut ledger = Ledger::new();
        ledger.mint(&alice(), 1_000).unwrap();
        assert_eq!(ledger.balance_of(&alice()), 1_000);
        assert_eq!(ledger.total_supply(), 1_000);

        ledger.burn(&alice(), 400).unwrap();
        assert_eq!(ledger.balance_of(&alice()), 600);
        assert_eq!(ledger.total_supply(), 600);
        assert_eq!(ledger.sum_of_balances(), ledger.total_supply());
    }

    #[test]
    fn test_burn_insufficient() {
        let mut ledger = Ledger::new();
        ledger.mint(&alice(), 10).unwrap();
        let result = ledger.burn(&alice(), 11);
        assert_eq!(result, Err(XFatError::InsufficientBalance { required: 11, available: 10 }));
        assert_eq!(ledger.total_supply(), 10);
    }

    #[test]
    fn test_burn_to_zero_keeps_entry() {
        let mut ledger = Ledger::new();
        ledger.mint(&alice(), 10).unwrap();
        ledger.burn(&alice(), 10).unwrap();
        assert_eq!(ledger.holder_count(), 1);
        assert_eq!(ledger.balance_of(&alice()), 0);
    }

    #[test]
    fn test_move_balance() {
        let mut ledger = Ledger::new();
        ledger.mint(&alice(), 100).unwrap();
        ledger.move_balance(&alice(), &bob(), 30).unwrap();
        assert_eq!(ledger.balance_of(&alice()), 70);
        assert_eq!(ledger.balance_of(&bob()), 30);
        assert_eq!(ledger.total_supply(), 100);

        ledger.move_balance(&alice(), &alice(), 70).unwrap();
        assert_eq!(ledger.balance_of(&alice()), 70);

        assert!(ledger.move_balance(&bob(), &alice(), 31).is_err());
        assert_eq!(ledger.move_balance(&bob(), &Address::ZERO, 1), Err(XFatError::InvalidAddress));
    }

    #[test]
    fn test_allowance() {
        let mut ledger = Ledger::new();
        ledger.approve(&alice(), &bob(), 50).unwrap();
        ledger.spend_allowance(&alice(), &bob(), 20).unwrap();
        assert_eq!(ledger.allowance(&alice(), &bob()), 30);
        assert_eq!(
            ledger.spend_allowance(&alice(), &bob(), 31),
            Err(XFatError::InsufficientAllowance { required: 31, available: 30 })
        );

        ledger.approve(&alice(), &bob(), Amount::MAX).unwrap();
        ledger.spend_allowance(&alice(), &bob(), 1_000).unwrap();
        assert_eq!(ledger.allowance(&alice(), &bob()), Amount::MAX);
    }

    #[test]
    fn test_mint_to_null_rejected() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.mint(&Address::ZERO, 1), Err(XFatError::InvalidAddress));
    }
}
