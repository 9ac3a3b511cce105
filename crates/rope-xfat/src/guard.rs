//! # Transfer and Re-entrancy Guards
//!
//! xFAT is non-transferable by default. A transfer `(from, to)` passes when:
//!
//! 1. `from` or `to` is the null account (mint/burn path), or
//! 2. `from` is an exempt sender, or
//! 3. `to` is an exempt receiver, or
//! 4. the gauge registry recognizes `from` as a reward source.
//!
//! Rule 4 is not a pure predicate: a recognized source is written into the
//! sender set on the spot. The check is split so the registry can be asked
//! with no engine lock held: [`ExemptionGuard::clearance`] answers rules 1-3,
//! the caller consults the registry only when that comes back empty, and
//! [`ExemptionGuard::authorize_transfer`] commits the verdict.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Result, XFatError};
use crate::types::Address;

/// Which exemption set an entry belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExemptionKind {
    /// May originate transfers
    Sender,
    /// May receive transfers
    Receiver,
}

/// Verdict of a successful transfer check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferClearance {
    /// Mint or burn, guard bypassed
    MintOrBurn,
    /// Sender already exempt
    ExemptSender,
    /// Receiver exempt
    ExemptReceiver,
    /// Sender recognized by the registry and allow-listed by this check
    NewlyRecognized,
}

/// Sender and receiver exemption sets
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExemptionGuard {
    senders: HashSet<Address>,
    receivers: HashSet<Address>,
}

impl ExemptionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_exempt(&self, kind: ExemptionKind, account: &Address) -> bool {
        match kind {
            ExemptionKind::Sender => self.senders.contains(account),
            ExemptionKind::Receiver => self.receivers.contains(account),
        }
    }

    /// Add or remove an entry; returns whether the set changed
    pub fn set(&mut self, kind: ExemptionKind, account: Address, exempt: bool) -> bool {
        let set = match kind {
            ExemptionKind::Sender => &mut self.senders,
            ExemptionKind::Receiver => &mut self.receivers,
        };
        if exempt {
            set.insert(account)
        } else {
            set.remove(&account)
        }
    }

    pub fn senders(&self) -> impl Iterator<Item = &Address> {
        self.senders.iter()
    }

    pub fn receivers(&self) -> impl Iterator<Item = &Address> {
        self.receivers.iter()
    }

    /// Rules 1-3 only; `None` means the registry has to decide
    pub fn clearance(&self, from: &Address, to: &Address) -> Option<TransferClearance> {
        if from.is_zero() || to.is_zero() {
            Some(TransferClearance::MintOrBurn)
        } else if self.senders.contains(from) {
            Some(TransferClearance::ExemptSender)
        } else if self.receivers.contains(to) {
            Some(TransferClearance::ExemptReceiver)
        } else {
            None
        }
    }

    /// Decide whether `from → to` may move xFAT, given the registry's answer for `from`
    ///
    /// A recognized sender is allow-listed by this call.
    pub fn authorize_transfer(
        &mut self,
        from: &Address,
        to: &Address,
        recognized_source: bool,
    ) -> Result<TransferClearance> {
        if let Some(clearance) = self.clearance(from, to) {
            return Ok(clearance);
        }
        if recognized_source {
            self.senders.insert(*from);
            return Ok(TransferClearance::NewlyRecognized);
        }
        Err(XFatError::TransferNotAllowed)
    }
}

/// Call-depth flag rejecting nested entry into mutating operations
///
/// [`ReentrancyGuard::enter`] hands out a scope token; the flag is cleared
/// when the token drops, on success and on every error path.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: AtomicBool,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> Result<Entered<'_>> {
        if self
            .entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(XFatError::ReentrantCall);
        }
        Ok(Entered { guard: self })
    }

    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// Scope token of an in-flight call
#[derive(Debug)]
pub struct Entered<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        self.guard.entered.store(false, Ordering::Release);
    }
}
