//! Bazaar treasury operator
//!
//! Loads the treasury from the configured repository (seeding it from the
//! configuration when empty), runs one command and saves the result.

use anyhow::Result;
use bazaar_storage::{MemoryRepository, SledRepository, TreasuryRepository};
use bazaar_treasury::{Treasury, TreasuryError};
use bazaar_types::{Amount, InvestorId};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod version;

use config::{AppConfig, StorageBackend};
use version::{git_commit_hash, BAZAAR_VERSION};

#[derive(Parser)]
#[command(name = "bazaar-node")]
#[command(about = "Bazaar fee & dividend treasury", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ledger aggregates
    Stats,
    /// List all investors
    Investors,
    /// Show one investor
    Investor {
        /// Investor ID
        id: String,
    },
    /// Show fee settings
    Settings,
    /// Replace both fee percentages
    UpdateSettings {
        /// Platform fee percentage (0-100)
        #[arg(long, allow_hyphen_values = true)]
        platform_fee: Decimal,
        /// Investor dividend percentage of the platform fee (0-100)
        #[arg(long, allow_hyphen_values = true)]
        investor_dividend: Decimal,
    },
    /// Replace the terms and conditions text
    UpdateTerms {
        text: String,
    },
    /// Show how collected revenue splits under the current settings
    SplitRevenue {
        #[arg(allow_hyphen_values = true)]
        amount: Amount,
    },
    /// Distribute a pool across all investors by shares
    Distribute {
        #[arg(allow_hyphen_values = true)]
        amount: Amount,
    },
    /// Split collected revenue and distribute the investor pool
    DistributeRevenue {
        #[arg(allow_hyphen_values = true)]
        amount: Amount,
    },
    /// Credit a project dividend to one investor
    PayDividend {
        id: String,
        #[arg(allow_hyphen_values = true)]
        amount: Amount,
    },
    /// Debit an investor's balance for reinvestment
    Invest {
        id: String,
        #[arg(allow_hyphen_values = true)]
        amount: Amount,
    },
}

impl Commands {
    fn mutates(&self) -> bool {
        matches!(
            self,
            Commands::UpdateSettings { .. }
                | Commands::UpdateTerms { .. }
                | Commands::Distribute { .. }
                | Commands::DistributeRevenue { .. }
                | Commands::PayDividend { .. }
                | Commands::Invest { .. }
        )
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging(&config)?;

    info!(
        version = BAZAAR_VERSION,
        commit = git_commit_hash(),
        backend = ?config.storage.backend,
        "Starting bazaar treasury"
    );

    let repository = open_repository(&config)?;
    let treasury = load_treasury(repository.as_ref(), &config)?;

    let mutates = cli.command.mutates();
    let output = run_command(&treasury, cli.command)?;

    if mutates {
        repository.save(&treasury.state())?;
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // stdout carries command output
    if config.log_format == "compact" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn open_repository(config: &AppConfig) -> Result<Box<dyn TreasuryRepository>> {
    let repository: Box<dyn TreasuryRepository> = match config.storage.backend {
        StorageBackend::Memory => Box::new(MemoryRepository::new()),
        StorageBackend::Sled => {
            if let Some(parent) = config.storage.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Box::new(SledRepository::open(&config.storage.path)?)
        }
    };
    Ok(repository)
}

/// Load persisted state, seeding the repository from configuration when it
/// is empty.
fn load_treasury(repository: &dyn TreasuryRepository, config: &AppConfig) -> Result<Treasury> {
    match repository.load()? {
        Some(state) => {
            if state.ledger.total_shares != config.total_shares {
                warn!(
                    stored = state.ledger.total_shares,
                    configured = config.total_shares,
                    "Stored total shares differ from configuration; keeping stored value"
                );
            }
            Ok(Treasury::from_state(state)?)
        }
        None => {
            let state = config.seed_state();
            let treasury = Treasury::from_state(state)?;
            repository.save(&treasury.state())?;
            info!(
                investors = config.investors.len(),
                "Seeded empty repository from configuration"
            );
            Ok(treasury)
        }
    }
}

fn run_command(treasury: &Treasury, command: Commands) -> Result<Value> {
    let ledger = treasury.ledger();
    let settings = treasury.settings();

    let value = match command {
        Commands::Stats => serde_json::to_value(ledger.get_stats()?)?,
        Commands::Investors => serde_json::to_value(ledger.find_all())?,
        Commands::Investor { id } => {
            let id = InvestorId::from(id);
            let investor = ledger
                .find_one(&id)
                .ok_or(TreasuryError::NotFound(id))?;
            serde_json::to_value(investor)?
        }
        Commands::Settings => {
            let current = settings.get_settings();
            serde_json::json!({
                "settings": current,
                "platform_fee_rate": current.platform_fee_rate(),
                "investor_dividend_rate": current.investor_dividend_rate(),
            })
        }
        Commands::UpdateSettings {
            platform_fee,
            investor_dividend,
        } => serde_json::to_value(settings.update_settings(platform_fee, investor_dividend)?)?,
        Commands::UpdateTerms { text } => serde_json::to_value(settings.update_terms(text))?,
        Commands::SplitRevenue { amount } => serde_json::to_value(settings.split_revenue(amount)?)?,
        Commands::Distribute { amount } => serde_json::to_value(ledger.distribute_pool(amount)?)?,
        Commands::DistributeRevenue { amount } => {
            serde_json::to_value(treasury.distribute_revenue(amount)?)?
        }
        Commands::PayDividend { id, amount } => {
            serde_json::to_value(ledger.pay_dividend(&InvestorId::from(id), amount)?)?
        }
        Commands::Invest { id, amount } => {
            serde_json::to_value(ledger.invest_funds(&InvestorId::from(id), amount)?)?
        }
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_types::{Investor, LedgerSnapshot, SystemSettings, TreasuryState};
    use rust_decimal_macros::dec;

    fn treasury() -> Treasury {
        Treasury::from_state(TreasuryState {
            settings: SystemSettings::default(),
            ledger: LedgerSnapshot::new(
                10_000,
                vec![
                    Investor::new("inv-1", "Alice", 500, dec!(5000)),
                    Investor::new("inv-2", "Bob", 2000, dec!(15000)),
                ],
            ),
        })
        .unwrap()
    }

    #[test]
    fn test_cli_parses_commands() {
        let cli = Cli::try_parse_from(["bazaar-node", "invest", "inv-1", "12.75"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Invest { ref id, amount } if id == "inv-1" && amount == dec!(12.75)
        ));
        assert!(cli.command.mutates());

        let cli = Cli::try_parse_from(["bazaar-node", "--config", "x.toml", "stats"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(!cli.command.mutates());
    }

    #[test]
    fn test_negative_amount_reaches_validation() {
        let cli = Cli::try_parse_from(["bazaar-node", "distribute", "-5"]).unwrap();
        let err = run_command(&treasury(), cli.command).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TreasuryError>(),
            Some(TreasuryError::Validation(_))
        ));
    }

    #[test]
    fn test_run_distribute() {
        let treasury = treasury();
        let value = run_command(&treasury, Commands::Distribute { amount: dec!(1000) }).unwrap();
        let total: Decimal = value["total_distributed"].as_str().unwrap().parse().unwrap();
        assert_eq!(total, dec!(250));
    }

    #[test]
    fn test_run_invest_insufficient() {
        let treasury = treasury();
        let value = run_command(
            &treasury,
            Commands::Invest {
                id: "inv-1".into(),
                amount: dec!(6000),
            },
        )
        .unwrap();
        assert_eq!(value["outcome"], "insufficient_funds");
    }

    #[test]
    fn test_unknown_investor() {
        let err = run_command(&treasury(), Commands::Investor { id: "ghost".into() }).unwrap_err();
        assert_eq!(
            err.downcast_ref::<TreasuryError>(),
            Some(&TreasuryError::NotFound("ghost".into()))
        );
    }

    #[test]
    fn test_load_treasury_seeds_and_reloads() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        std::fs::write(
            file.path(),
            "[[investors]]\nid = \"inv-1\"\nname = \"Alice\"\nshares = 100\nbalance = \"10\"\n",
        )
        .unwrap();
        let config = AppConfig::load(Some(file.path())).unwrap();
        let repository = MemoryRepository::new();

        let treasury = load_treasury(&repository, &config).unwrap();
        treasury
            .ledger()
            .pay_dividend(&"inv-1".into(), dec!(5))
            .unwrap();
        repository.save(&treasury.state()).unwrap();

        let reloaded = load_treasury(&repository, &config).unwrap();
        let alice = reloaded.ledger().find_one(&"inv-1".into()).unwrap();
        assert_eq!(alice.balance, dec!(15));
    }

    #[test]
    fn test_stored_state_wins_over_configuration() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        std::fs::write(
            file.path(),
            "total_shares = 10000\nplatform_fee_percentage = 25\n",
        )
        .unwrap();
        let config = AppConfig::load(Some(file.path())).unwrap();
        let repository = MemoryRepository::with_state(TreasuryState {
            settings: SystemSettings::default(),
            ledger: LedgerSnapshot::new(
                4_000,
                vec![Investor::new("inv-9", "Ivy", 1_000, dec!(42))],
            ),
        });

        let treasury = load_treasury(&repository, &config).unwrap();
        assert_eq!(treasury.ledger().total_shares(), 4_000);
        assert_eq!(treasury.settings().get_settings(), SystemSettings::default());
        assert_eq!(treasury.ledger().find_all().len(), 1);

        let stats = run_command(&treasury, Commands::Stats).unwrap();
        assert_eq!(stats["unallocated_shares"], 3_000);
    }
}
