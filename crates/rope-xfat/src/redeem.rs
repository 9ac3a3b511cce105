//! Redemption modes and receipts

use serde::{Deserialize, Serialize};

use crate::error::{Result, XFatError};
use crate::types::{Address, Amount, Epoch, LockId, Rate};

/// Payout path of a redemption
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedeemType {
    /// FAT at the self-adjusting exit rate; the penalty feeds the rebase pool
    ToBaseAsset,
    /// 1:1 into a vote-escrow lock for the caller
    ToLockedPosition,
    /// 1:1 into the auto-compounding vault for the caller
    ToStakedPosition,
}

impl RedeemType {
    /// Map the legacy integer code (0, 1, 2)
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::ToBaseAsset),
            1 => Ok(Self::ToLockedPosition),
            2 => Ok(Self::ToStakedPosition),
            other => Err(XFatError::InvalidRedeemType(other)),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::ToBaseAsset => 0,
            Self::ToLockedPosition => 1,
            Self::ToStakedPosition => 2,
        }
    }
}

/// What a committed redemption paid out
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Payout {
    BaseAsset {
        output: Amount,
        penalty: Amount,
        effective_rate: Rate,
    },
    LockedPosition { lock_id: LockId },
    StakedPosition,
}

/// Receipt of a committed redemption
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionReceipt {
    pub account: Address,
    /// xFAT burned
    pub amount: Amount,
    pub epoch: Epoch,
    pub payout: Payout,
}

impl RedemptionReceipt {
    /// Base asset received directly (zero for lock/stake payouts)
    pub fn output(&self) -> Amount {
        match self.payout {
            Payout::BaseAsset { output, .. } => output,
            Payout::LockedPosition { .. } | Payout::StakedPosition => 0,
        }
    }

    pub fn penalty(&self) -> Amount {
        match self.payout {
            Payout::BaseAsset { penalty, .. } => penalty,
            Payout::LockedPosition { .. } | Payout::StakedPosition => 0,
        }
    }
}
