use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};

use stockbook::api::PriceResolver;
use stockbook::db;
use stockbook::services::PortfolioService;

#[derive(Parser)]
#[command(name = "stockbook", version, about)]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, env = "STOCKBOOK_DB", default_value = "~/.stockbook/portfolio.db")]
    database: String,

    /// Account whose ledger the command operates on
    #[arg(long, env = "STOCKBOOK_ACCOUNT", default_value = "default")]
    account: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import ledger rows from a CSV file (date,type,label,quantity,amount,notes)
    Import { path: String },
    /// Rebuild the cached holdings from the transaction ledger
    Rebuild,
    /// Print valued holdings and the portfolio summary
    Summary,
    /// Backfill stored daily price history for all open holdings
    UpdatePrices,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let database_path = shellexpand::tilde(&cli.database).into_owned();
    if let Some(parent) = std::path::Path::new(&database_path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {:?}", parent))?;
    }

    let connect_options = SqliteConnectOptions::new()
        .filename(&database_path)
        .create_if_missing(true);
    let connection = SqlitePool::connect_with(connect_options)
        .await
        .with_context(|| format!("Failed to open database at '{}'", database_path))?;

    db::init::create_all(&connection).await?;

    let resolver = PriceResolver::with_default_providers(connection.clone())?;
    let service = PortfolioService::new(connection, resolver);

    match cli.command {
        Command::Import { path } => {
            let report = service.import_csv(&cli.account, &path).await?;
            println!(
                "Imported {} transactions ({} skipped)",
                report.imported(),
                report.skipped()
            );
        }
        Command::Rebuild => {
            let report = service.rebuild(&cli.account).await?;
            println!(
                "Rebuilt holdings cache: {} positions",
                report.holdings_migrated()
            );
        }
        Command::Summary => {
            let dashboard = service.dashboard(&cli.account).await?;

            println!(
                "{:<8} {:>12} {:>12} {:>14} {:>14} {:>10}",
                "Symbol", "Quantity", "Avg Cost", "Market Value", "Gain/Loss", "Source"
            );
            for holding in dashboard.holdings() {
                println!(
                    "{:<8} {:>12.4} {:>12.2} {:>14.2} {:>14.2} {:>10}",
                    holding.symbol(),
                    holding.quantity(),
                    holding.average_cost(),
                    holding.market_value(),
                    holding.unrealized_gain_loss(),
                    holding.price_source().to_str()
                );
            }

            let summary = dashboard.summary();
            println!();
            println!("Invested:        {:>14.2}", summary.total_invested());
            println!("Current value:   {:>14.2}", summary.current_value());
            println!("Unrealized P/L:  {:>14.2}", summary.unrealized_gain_loss());
            println!("Realized P/L:    {:>14.2}", summary.realized_gain_loss());
            println!("Total P/L:       {:>14.2}", summary.total_gain_loss());
            println!("Return:          {:>13.2}%", summary.return_percentage());
            println!("Cash balance:    {:>14.2}", summary.cash_balance());
            println!("Dividends:       {:>14.2}", summary.total_dividends());

            if !dashboard.recent_transactions().is_empty() {
                println!();
                println!("Recent transactions:");
                for entry in dashboard.recent_transactions() {
                    println!(
                        "  {} {:<12} {:<8} {:>12.2}",
                        entry.date(),
                        entry.transaction_type().to_str(),
                        entry.symbol().as_deref().unwrap_or("-"),
                        entry.display_amount()
                    );
                }
            }

            if !dashboard.anomalies().is_empty() {
                println!();
                println!("Anomalies:");
                for anomaly in dashboard.anomalies() {
                    println!("  - {}", anomaly);
                }
            }
        }
        Command::UpdatePrices => {
            let refreshes = service.update_prices(&cli.account).await?;
            for refresh in &refreshes {
                match refresh.provider() {
                    Some(provider) => println!(
                        "{}: {} records inserted via {}",
                        refresh.symbol(),
                        refresh.records_inserted(),
                        provider
                    ),
                    None if *refresh.api_call_made() => {
                        println!("{}: all providers failed", refresh.symbol())
                    }
                    None => println!("{}: history already complete", refresh.symbol()),
                }
            }
        }
    }

    Ok(())
}
