//! # Rope xFAT - Reward Conversion Token
//!
//! xFAT is the non-transferable receipt issued against FAT rewards. Holders
//! leave it through one of three exits:
//!
//! - **Base asset**: FAT at a self-adjusting exit rate; the withheld penalty
//!   is pooled and rebased to stakers once per epoch
//! - **Locked position**: 1:1 into a vote-escrow lock (veFAT)
//! - **Staked position**: 1:1 into the auto-compounding FAT vault
//!
//! ## Exit Rate
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        xFAT → FAT EXIT RATE                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │  Start:        max_rate                                                 │
//! │  Redemption:   rate drops by (amount / supply) / beta                   │
//! │  Idle epochs:  rate climbs back linearly, full after recovery_epochs    │
//! │  Always:       min_rate ≤ rate ≤ max_rate                               │
//! │  Penalty:      amount - amount × rate / 10,000  → rebase pool           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Default Parameters
//!
//! | Parameter | Default | Range |
//! |-----------|---------|-------|
//! | `max_rate` | 9,000 bp (90%) | `min_rate` < x ≤ 10,000 |
//! | `min_rate` | 5,000 bp (50%) | 0 < x < `max_rate` |
//! | `recovery_epochs` | 4 | 1-52 |
//! | `penalty_impact_beta` | 10 | 1-100 |
//! | epoch duration | 1 week | 30 min - 4 weeks |
//! | lock duration | 4 years | > 0 |
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use rope_xfat::prelude::*;
//!
//! let fat = Arc::new(InMemoryAsset::new("FAT"));
//! let engine = Address::from_label("xfat");
//! let owner = Address::from_label("owner");
//! let alice = Address::from_label("alice");
//!
//! let xfat = XFat::builder(engine, owner, fat.clone())
//!     .clock(Arc::new(ManualClock::new(1_700_000_000)))
//!     .build()?;
//!
//! fat.mint(&alice, 1_000);
//! fat.approve(&alice, &engine, 1_000);
//! xfat.deposit(&alice, 1_000)?;
//!
//! let receipt = xfat.redeem(&alice, 100, RedeemType::ToBaseAsset)?;
//! assert!(receipt.output() <= 90);
//! assert_eq!(xfat.pending_rebase(), receipt.penalty());
//! # Ok::<(), rope_xfat::XFatError>(())
//! ```

pub mod admin;
pub mod clock;
pub mod collaborators;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod guard;
pub mod ledger;
pub mod math;
pub mod rate;
pub mod redeem;
pub mod types;

// Re-exports
pub use clock::{Clock, EpochClock, ManualClock, SystemClock};
pub use collaborators::{
    FungibleAsset, GaugeRegistry, InMemoryAsset, InMemoryDistributor, InMemoryStakingVault,
    InMemoryVoteEscrow, LockPosition, RewardsDistributor, StakingVault, StaticGaugeRegistry, VoteEscrow,
};
pub use config::{EpochConfig, LockConfig, RateParameters, XFatConfig};
pub use engine::{XFat, XFatBuilder, XFatSnapshot};
pub use error::{Result, XFatError};
pub use events::XFatEvent;
pub use guard::{ExemptionGuard, ExemptionKind, ReentrancyGuard, TransferClearance};
pub use ledger::Ledger;
pub use rate::{RateEngine, RateState, RedemptionQuote};
pub use redeem::{Payout, RedeemType, RedemptionReceipt};
pub use types::{Address, Amount, Epoch, LockId, Rate, Timestamp};

/// xFAT token constants
pub mod constants {
    pub const SYMBOL: &str = "xFAT";

    pub const NAME: &str = "DATACHAIN Future Access Token Rewards";

    /// Same decimals as FAT; deposits convert 1:1
    pub const DECIMALS: u8 = 18;

    /// One xFAT in smallest unit
    pub const ONE_XFAT: u128 = 1_000_000_000_000_000_000;
}

/// Common imports
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::collaborators::*;
    pub use crate::config::XFatConfig;
    pub use crate::engine::XFat;
    pub use crate::error::{Result, XFatError};
    pub use crate::guard::ExemptionKind;
    pub use crate::redeem::{RedeemType, RedemptionReceipt};
    pub use crate::types::{Address, Amount};
}
