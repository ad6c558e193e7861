//! DINSY CLI - Command-line interface for DINSY membership payments
//!
//! Lists tiers, quotes sponsor splits, submits membership payments and plan
//! purchases through a JSON-RPC wallet and talks to the membership backend.

#![forbid(unsafe_code)]

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use dinsy_cli::commands::{self, pay::CoincidentMode, pay::PayRequest, register::RegisterRequest};
use dinsy_cli::config::DinsyCliConfig;
use dinsy_cli::utils::{parse_output_format, OutputFormat};
use dinsy_sdk::{JsonRpcWallet, PaymentConfig, RegistryClient};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "dinsy-cli",
    version,
    about = "Command-line interface for DINSY membership payments",
    author = "DINSY Team"
)]
struct Cli {
    /// Wallet JSON-RPC endpoint URL
    #[arg(long)]
    rpc_url: Option<String>,

    /// Membership backend base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Output format
    #[arg(long, value_enum)]
    output: Option<OutputFormat>,

    /// Payment configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List membership tiers and their prices
    Tiers,

    /// Compute the sponsor split for a level without contacting the wallet
    Quote {
        /// Membership level (0 = custom amount)
        #[arg(long)]
        level: u32,

        /// Custom amount in USD, required for level 0
        #[arg(long)]
        amount: Option<String>,
    },

    /// Pay for a membership level through the connected wallet
    Pay {
        /// Membership level (0 = custom amount)
        #[arg(long)]
        level: u32,

        /// Custom amount in USD, required for level 0
        #[arg(long)]
        amount: Option<String>,

        /// Sponsor username; the default sponsor is paid when omitted
        #[arg(long)]
        sponsor: Option<String>,

        /// Behaviour when the sponsor wallet is the treasury
        #[arg(long, value_enum)]
        coincident: Option<CoincidentMode>,

        /// Submit even if the balance does not cover amount plus gas
        #[arg(long)]
        force: bool,
    },

    /// Buy a plan: one full-price transfer at the current gas price
    PayPlan {
        /// Plan level (1-7)
        #[arg(long)]
        level: u32,

        /// Submit even if the balance does not cover price plus gas
        #[arg(long)]
        force: bool,
    },

    /// Show the plan held by a wallet's member
    CurrentPlan {
        /// Wallet address
        #[arg(long)]
        wallet: String,
    },

    /// Look up a sponsor's wallet address
    SponsorWallet {
        /// Sponsor username
        #[arg(long)]
        username: String,
    },

    /// Show a user's referral link
    RefLink {
        /// Username
        #[arg(long)]
        username: String,

        /// Build the link locally instead of asking the backend
        #[arg(long)]
        local: bool,
    },

    /// Check whether a wallet is registered
    CheckWallet {
        /// Wallet address
        #[arg(long)]
        wallet: String,
    },

    /// Register a new member
    Register {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        username: String,

        /// Sponsor username (defaults to "Master")
        #[arg(long)]
        sponsor: Option<String>,

        /// Membership level
        #[arg(long)]
        level: u32,

        /// Wallet address
        #[arg(long)]
        wallet: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = DinsyCliConfig::new()?;

    // Use configuration with CLI overrides
    let default_output_format = parse_output_format(&config.default_output_format)?;
    let output_format = cli.output.unwrap_or(default_output_format);

    // Execute command
    let result = execute_command(&cli, &config, output_format).await;

    // Handle output formatting
    match result {
        Ok(output) => match output_format {
            OutputFormat::Human => println!("{output}"),
            OutputFormat::Json => {
                let data = serde_json::from_str::<serde_json::Value>(&output)
                    .unwrap_or(serde_json::Value::String(output));
                let json_output = serde_json::json!({
                    "success": true,
                    "data": data
                });
                println!("{}", serde_json::to_string_pretty(&json_output)?);
            }
        },
        Err(e) => {
            match output_format {
                OutputFormat::Human => eprintln!("Error: {e}"),
                OutputFormat::Json => {
                    let json_output = serde_json::json!({
                        "success": false,
                        "error": e.to_string()
                    });
                    println!("{}", serde_json::to_string_pretty(&json_output)?);
                }
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

fn load_payment_config(path: Option<&Path>) -> Result<PaymentConfig> {
    PaymentConfig::resolve(path).map_err(|e| anyhow!("Failed to load payment configuration: {e}"))
}

fn registry_client(cli: &Cli, config: &DinsyCliConfig) -> Result<RegistryClient> {
    let api_url = cli.api_url.as_deref().unwrap_or(&config.api_base_url);
    RegistryClient::new(api_url, config.http_timeout())
        .map_err(|e| anyhow!("Invalid API URL '{api_url}': {e}"))
}

fn json_rpc_wallet(cli: &Cli, config: &DinsyCliConfig) -> Result<JsonRpcWallet> {
    let rpc_url = cli.rpc_url.as_deref().unwrap_or(&config.rpc_url);
    JsonRpcWallet::new(rpc_url, config.http_timeout())
        .map_err(|e| anyhow!("Invalid RPC URL '{rpc_url}': {e}"))
}

async fn execute_command(
    cli: &Cli,
    config: &DinsyCliConfig,
    output_format: OutputFormat,
) -> Result<String> {
    match &cli.command {
        Commands::Tiers => {
            let payment_config = load_payment_config(cli.config.as_deref())?;
            commands::execute_tiers(&payment_config, config, output_format)
        }

        Commands::Quote { level, amount } => {
            let payment_config = load_payment_config(cli.config.as_deref())?;
            commands::execute_quote(
                &payment_config,
                config,
                *level,
                amount.as_deref(),
                output_format,
            )
        }

        Commands::Pay {
            level,
            amount,
            sponsor,
            coincident,
            force,
        } => {
            let payment_config = load_payment_config(cli.config.as_deref())?;
            let wallet = json_rpc_wallet(cli, config)?;
            let registry = registry_client(cli, config)?;

            let request = PayRequest {
                level: *level,
                custom_amount_usd: amount.as_deref(),
                sponsor: sponsor.as_deref(),
                coincident: *coincident,
                force: *force,
            };
            commands::execute_pay(
                &wallet,
                &registry,
                &payment_config,
                config,
                &request,
                output_format,
            )
            .await
        }

        Commands::PayPlan { level, force } => {
            let payment_config = load_payment_config(cli.config.as_deref())?;
            let wallet = json_rpc_wallet(cli, config)?;
            commands::execute_pay_plan(
                &wallet,
                &payment_config,
                config,
                *level,
                *force,
                output_format,
            )
            .await
        }

        Commands::CurrentPlan { wallet } => {
            let registry = registry_client(cli, config)?;
            commands::execute_current_plan(&registry, wallet, output_format).await
        }

        Commands::SponsorWallet { username } => {
            let registry = registry_client(cli, config)?;
            commands::execute_sponsor_wallet(&registry, username, output_format).await
        }

        Commands::RefLink { username, local } => {
            let registry = registry_client(cli, config)?;
            commands::execute_ref_link(&registry, username, *local, output_format).await
        }

        Commands::CheckWallet { wallet } => {
            let registry = registry_client(cli, config)?;
            commands::execute_check_wallet(&registry, wallet, output_format).await
        }

        Commands::Register {
            first_name,
            last_name,
            username,
            sponsor,
            level,
            wallet,
        } => {
            let registry = registry_client(cli, config)?;
            let request = RegisterRequest {
                first_name,
                last_name,
                username,
                sponsor: sponsor.as_deref(),
                level: *level,
                wallet,
            };
            commands::execute_register(&registry, &request, output_format).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pay_command() {
        let cli = Cli::try_parse_from([
            "dinsy-cli",
            "--output",
            "json",
            "pay",
            "--level",
            "0",
            "--amount",
            "250",
            "--sponsor",
            "alice",
            "--coincident",
            "combined",
            "--force",
        ])
        .unwrap();

        assert_eq!(cli.output, Some(OutputFormat::Json));
        match cli.command {
            Commands::Pay {
                level,
                amount,
                sponsor,
                coincident,
                force,
            } => {
                assert_eq!(level, 0);
                assert_eq!(amount.as_deref(), Some("250"));
                assert_eq!(sponsor.as_deref(), Some("alice"));
                assert_eq!(coincident, Some(CoincidentMode::Combined));
                assert!(force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_plan_commands() {
        let cli = Cli::try_parse_from(["dinsy-cli", "pay-plan", "--level", "3", "--force"]).unwrap();
        match cli.command {
            Commands::PayPlan { level, force } => {
                assert_eq!(level, 3);
                assert!(force);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["dinsy-cli", "current-plan", "--wallet", "0xabc"]).unwrap();
        assert!(matches!(cli.command, Commands::CurrentPlan { wallet } if wallet == "0xabc"));

        assert!(Cli::try_parse_from(["dinsy-cli", "pay-plan"]).is_err());
    }

    #[test]
    fn test_parse_register_requires_wallet() {
        let result = Cli::try_parse_from([
            "dinsy-cli",
            "register",
            "--first-name",
            "Ana",
            "--last-name",
            "Ruiz",
            "--username",
            "ana",
            "--level",
            "1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand_are_rejected() {
        // Global flags belong before the subcommand
        assert!(Cli::try_parse_from(["dinsy-cli", "tiers", "--output", "json"]).is_err());
        assert!(Cli::try_parse_from(["dinsy-cli", "--config", "cfg.json", "tiers"]).is_ok());
    }
}
