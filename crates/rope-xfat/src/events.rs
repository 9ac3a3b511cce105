//! Events emitted by the engine
//!
//! Committed calls append to the journal; a failed call leaves it as it was.

use serde::{Deserialize, Serialize};

use crate::guard::ExemptionKind;
use crate::types::{Address, Amount, Epoch, LockId, Rate, Timestamp};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum XFatEvent {
    /// Ledger movement; null `from` is a mint, null `to` a burn
    Transfer { from: Address, to: Address, amount: Amount },
    Approval { owner: Address, spender: Address, amount: Amount },
    NewEpoch { epoch: Epoch, timestamp: Timestamp },
    Deposited { account: Address, amount: Amount },
    Redeemed {
        account: Address,
        amount: Amount,
        output: Amount,
        penalty: Amount,
        effective_rate: Rate,
    },
    ConvertedToLock { account: Address, amount: Amount, lock_id: LockId },
    ConvertedToStake { account: Address, amount: Amount },
    RateUpdated { previous: Rate, current: Rate, cumulative_impact: u128 },
    Rebased { epoch: Epoch, amount: Amount },
    ExemptionUpdated { kind: ExemptionKind, account: Address, exempt: bool },
    ParametersUpdated { parameter: String },
    CollaboratorUpdated { collaborator: String },
    MinterUpdated { minter: Address },
    OwnershipTransferred { previous: Address, owner: Address },
    Paused,
    Unpaused,
    EmergencyWithdrawn { to: Address, amount: Amount },
}

impl XFatEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => "transfer",
            Self::Approval { .. } => "approval",
            Self::NewEpoch { .. } => "new_epoch",
            Self::Deposited { .. } => "deposited",
            Self::Redeemed { .. } => "redeemed",
            Self::ConvertedToLock { .. } => "converted_to_lock",
            Self::ConvertedToStake { .. } => "converted_to_stake",
            Self::RateUpdated { .. } => "rate_updated",
            Self::Rebased { .. } => "rebased",
            Self::ExemptionUpdated { .. } => "exemption_updated",
            Self::ParametersUpdated { .. } => "parameters_updated",
            Self::CollaboratorUpdated { .. } => "collaborator_updated",
            Self::MinterUpdated { .. } => "minter_updated",
            Self::OwnershipTransferred { .. } => "ownership_transferred",
            Self::Paused => "paused",
            Self::Unpaused => "unpaused",
            Self::EmergencyWithdrawn { .. } => "emergency_withdrawn",
        }
    }
}
