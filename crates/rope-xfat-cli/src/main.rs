//! xFAT CLI
//!
//! Quote redemptions and replay scripted scenarios against an in-memory engine.

use anyhow::Context;
use clap::{Parser, Subcommand};
use rope_xfat::prelude::*;
use rope_xfat::{InMemoryDistributor, XFatEvent};
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Simulation start: an epoch boundary well clear of zero
const GENESIS_TIME: i64 = 1_767_225_600;

#[derive(Parser)]
#[command(name = "xfat")]
#[command(author = "Datachain Foundation")]
#[command(version = "0.1.0")]
#[command(about = "xFAT reward-conversion engine - quotes and scenario simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote a base-asset redemption
    Quote {
        /// Configuration file (defaults when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// xFAT supply before the redemption
        #[arg(short, long)]
        supply: u64,

        /// xFAT to redeem
        #[arg(short, long)]
        amount: u64,

        /// Earlier redemption that depressed the rate
        #[arg(long, default_value = "0")]
        prior: u64,

        /// Idle epochs between the earlier redemption and this quote
        #[arg(short, long, default_value = "0")]
        epochs_idle: u64,
    },

    /// Replay a TOML scenario and print receipts plus the final snapshot
    Simulate {
        /// Configuration file (defaults when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Scenario file
        #[arg(long)]
        scenario: PathBuf,
    },

    /// Print the default configuration
    Defaults,
}

/// Scenario file: an ordered list of steps
#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Step {
    Deposit {
        account: String,
        amount: u64,
    },
    Redeem {
        account: String,
        amount: u64,
        #[serde(default = "default_redeem_type")]
        mode: RedeemType,
    },
    AdvanceEpochs {
        epochs: u64,
    },
    Rebase,
    Transfer {
        from: String,
        to: String,
        amount: u64,
    },
    Exempt {
        kind: ExemptionKind,
        account: String,
    },
}

fn default_redeem_type() -> RedeemType {
    RedeemType::ToBaseAsset
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<XFatConfig> {
    match path {
        Some(path) => XFatConfig::load(path).with_context(|| format!("loading config {}", path.display())),
        None => Ok(XFatConfig::default()),
    }
}

fn account(label: &str) -> Address {
    Address::from_label(label)
}

/// Engine wired to in-memory collaborators, driven by a manual clock
struct Simulation {
    xfat: XFat,
    fat: Arc<InMemoryAsset>,
    clock: Arc<ManualClock>,
    owner: Address,
}

impl Simulation {
    fn new(config: XFatConfig) -> anyhow::Result<Self> {
        let fat = Arc::new(InMemoryAsset::new("FAT"));
        let clock = Arc::new(ManualClock::new(GENESIS_TIME));
        let owner = account("owner");
        let registry = Arc::new(StaticGaugeRegistry::new());
        registry.register(account("gauge"));

        let xfat = XFat::builder(account("xfat"), owner, fat.clone())
            .config(config)
            .clock(clock.clone())
            .vote_escrow(Arc::new(InMemoryVoteEscrow::new(account("ve"), fat.clone())))
            .staking_vault(Arc::new(InMemoryStakingVault::new(account("vault"), fat.clone())))
            .gauge_registry(registry)
            .rewards_distributor(Arc::new(InMemoryDistributor::new(account("distributor"), fat.clone())))
            .build()?;

        Ok(Self { xfat, fat, clock, owner })
    }

    fn deposit(&self, holder: &Address, amount: Amount) -> rope_xfat::Result<()> {
        self.fat.mint(holder, amount);
        self.fat.approve(holder, &self.xfat.address(), amount);
        self.xfat.deposit(holder, amount)
    }

    fn advance_epochs(&self, epochs: u64) {
        let secs = epochs.saturating_mul(self.xfat.epoch_duration_secs());
        self.clock.advance(i64::try_from(secs).unwrap_or(i64::MAX));
    }

    fn run(&self, step: &Step) -> rope_xfat::Result<serde_json::Value> {
        match step {
            Step::Deposit { account: label, amount } => {
                self.deposit(&account(label), *amount as Amount)?;
                Ok(json!({ "balance": self.xfat.balance_of(&account(label)).to_string() }))
            }
            Step::Redeem { account: label, amount, mode } => {
                let receipt = self.xfat.redeem(&account(label), *amount as Amount, *mode)?;
                Ok(json!({
                    "output": receipt.output().to_string(),
                    "penalty": receipt.penalty().to_string(),
                    "rate_after": self.xfat.conversion_rate(),
                    "receipt": receipt,
                }))
            }
            Step::AdvanceEpochs { epochs } => {
                self.advance_epochs(*epochs);
                Ok(json!({ "epochs": epochs, "now": self.clock.now() }))
            }
            Step::Rebase => {
                let flushed = self.xfat.rebase(&self.owner)?;
                Ok(json!({ "flushed": flushed.map(|a| a.to_string()) }))
            }
            Step::Transfer { from, to, amount } => {
                self.xfat.transfer(&account(from), &account(to), *amount as Amount)?;
                Ok(json!({ "to_balance": self.xfat.balance_of(&account(to)).to_string() }))
            }
            Step::Exempt { kind, account: label } => {
                self.xfat.set_exemption(&self.owner, *kind, account(label), true)?;
                Ok(json!({ "exempt": true }))
            }
        }
    }
}

fn quote(config: XFatConfig, supply: u64, amount: u64, prior: u64, epochs_idle: u64) -> anyhow::Result<()> {
    let sim = Simulation::new(config)?;
    let holder = account("holder");
    let total = (supply as Amount).saturating_add(prior as Amount);
    if total > 0 {
        sim.deposit(&holder, total)?;
    }
    if prior > 0 {
        sim.xfat.redeem(&holder, prior as Amount, RedeemType::ToBaseAsset)?;
    }
    sim.advance_epochs(epochs_idle);

    let quote = sim.xfat.quote_redemption(amount as Amount)?;
    let rate = sim.xfat.rate_state();
    let out = json!({
        "amount": quote.amount.to_string(),
        "output": quote.output.to_string(),
        "penalty": quote.penalty.to_string(),
        "effective_rate": quote.effective_rate,
        "stored_rate": rate.current_rate,
        "supply": sim.xfat.total_supply().to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn simulate(config: XFatConfig, scenario_path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(scenario_path)
        .with_context(|| format!("reading scenario {}", scenario_path.display()))?;
    let scenario: Scenario = toml::from_str(&content)?;
    let sim = Simulation::new(config)?;

    tracing::info!(steps = scenario.steps.len(), "Running scenario");
    for (index, step) in scenario.steps.iter().enumerate() {
        let line = match sim.run(step) {
            Ok(result) => json!({ "step": index, "ok": true, "result": result }),
            Err(e) => {
                tracing::warn!(step = index, error = %e, "Step failed");
                json!({ "step": index, "ok": false, "error": e.to_string(), "code": e.code() })
            }
        };
        println!("{}", serde_json::to_string(&line)?);
    }

    let rebased: usize = sim
        .xfat
        .events()
        .iter()
        .filter(|e| matches!(e, XFatEvent::Rebased { .. }))
        .count();
    println!("{}", serde_json::to_string_pretty(&sim.xfat.snapshot())?);
    tracing::info!(events = sim.xfat.events().len(), rebased, "Scenario complete");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Quote {
            config,
            supply,
            amount,
            prior,
            epochs_idle,
        } => {
            let config = load_config(config.as_deref())?;
            quote(config, supply, amount, prior, epochs_idle)?;
        }

        Commands::Simulate { config, scenario } => {
            let config = load_config(config.as_deref())?;
            simulate(config, &scenario)?;
        }

        Commands::Defaults => {
            print!("{}", XFatConfig::default().to_toml_string()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_parsing() {
        let scenario: Scenario = toml::from_str(
            r#"
            [[steps]]
            action = "deposit"
            account = "alice"
            amount = 1000

            [[steps]]
            action = "redeem"
            account = "alice"
            amount = 100
            mode = "to_staked_position"

            [[steps]]
            action = "advance_epochs"
            epochs = 2

            [[steps]]
            action = "rebase"
            "#,
        )
        .unwrap();
        assert_eq!(scenario.steps.len(), 4);
        assert!(matches!(
            scenario.steps[1],
            Step::Redeem { mode: RedeemType::ToStakedPosition, .. }
        ));
    }

    #[test]
    fn test_simulation_steps() {
        let sim = Simulation::new(XFatConfig::default()).unwrap();
        sim.run(&Step::Deposit { account: "alice".into(), amount: 1_000 }).unwrap();
        let redeemed = sim
            .run(&Step::Redeem {
                account: "alice".into(),
                amount: 100,
                mode: RedeemType::ToBaseAsset,
            })
            .unwrap();
        assert_eq!(redeemed["output"], "88");

        let blocked = sim.run(&Step::Transfer {
            from: "alice".into(),
            to: "bob".into(),
            amount: 1,
        });
        assert_eq!(blocked.unwrap_err(), XFatError::TransferNotAllowed);

        let flushed = sim.run(&Step::Rebase).unwrap();
        assert_eq!(flushed["flushed"], "12");
    }
}
