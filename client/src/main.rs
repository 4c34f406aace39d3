use std::sync::Arc;

use anyhow::{Context, Result};
use candymint_client::{
    config::{MintConfig, Settings},
    machine_reader::MachineReader,
    metadata::OnChainMetadataResolver,
    orchestrator::Orchestrator,
    price::display_price,
    rpc_gateway::{HttpGateway, SharedLedgerRpc},
    wallet_session::LocalKeypairSession,
};
use candymint_common::{
    config::VERSION, machine::MachineSnapshot, time::get_current_time_in_seconds,
};
use clap::{Parser, Subcommand};
use fern::colors::{Color, ColoredLevelConfig};
use log::{info, LevelFilter};

#[derive(Parser)]
#[clap(version = VERSION, about = "Minting client for a fixed-supply candy machine")]
struct Cli {
    #[clap(flatten)]
    config: MintConfig,
    /// Log level
    #[clap(long, default_value = "info")]
    log_level: LevelFilter,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch and display the current machine state
    Status,
    /// Connect and keep printing the machine state as it refreshes
    Watch,
    /// Connect an ephemeral local wallet and mint one item
    Mint,
}

fn setup_logger(level: LevelFilter) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::Red)
        .debug(Color::Magenta)
        .trace(Color::BrightBlue);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .apply()
        .context("Failed to initialize logger")?;
    Ok(())
}

fn print_snapshot(snapshot: &MachineSnapshot) {
    println!("Items remaining: {}", snapshot.items_remaining());
    println!(
        "Price:           {}",
        display_price(snapshot).unwrap_or_else(|e| e.to_string())
    );
    println!(
        "Live:            {}",
        snapshot.is_active(get_current_time_in_seconds())
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logger(cli.log_level)?;

    // configuration must be valid before anything network-facing is built
    let settings = Settings::load(&cli.config)?;
    info!(
        "Machine {} on {} via {}",
        settings.machine_address, settings.network, settings.rpc_url
    );

    let ledger: SharedLedgerRpc =
        Arc::new(HttpGateway::new(&settings.rpc_url, settings.rpc_timeout)?);

    match cli.command {
        Command::Status => {
            let reader = MachineReader::new(ledger, settings.machine_address);
            let snapshot = reader.fetch().await?;
            print_snapshot(&snapshot);
        }
        Command::Watch => {
            let wallet = Arc::new(LocalKeypairSession::generate());
            let resolver = Arc::new(OnChainMetadataResolver::new(Arc::clone(&ledger)));
            let orchestrator = Orchestrator::new(ledger, wallet, resolver, settings);

            orchestrator.request_connect().await?;
            let mut view = orchestrator.view();
            loop {
                tokio::select! {
                    changed = view.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let current = view.borrow().clone();
                        if let Some(snapshot) = &current.snapshot {
                            print_snapshot(snapshot);
                        }
                        if let Some(error) = &current.session.last_error {
                            println!("Error ({}): {}", error.kind, error.message);
                        }
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            orchestrator.disconnect().await;
        }
        Command::Mint => {
            let wallet = Arc::new(LocalKeypairSession::generate());
            info!("Using ephemeral wallet {}", wallet.address());
            let resolver = Arc::new(OnChainMetadataResolver::new(Arc::clone(&ledger)));
            let orchestrator = Orchestrator::new(ledger, wallet, resolver, settings);

            orchestrator.request_connect().await?;
            let mut view = orchestrator.view();
            view.wait_for(|current| current.snapshot.is_some())
                .await
                .context("View channel closed before the first snapshot")?;
            if let Some(snapshot) = view.borrow().snapshot.as_ref() {
                print_snapshot(snapshot);
            }

            orchestrator.request_mint().await?;

            let current = orchestrator.current_view();
            if let Some(minted) = &current.minted {
                println!("Minted item:     {}", minted.mint_address);
                if let Some(image_uri) = &minted.image_uri {
                    println!("Image:           {}", image_uri);
                }
            }
            if let Some(error) = &current.session.last_error {
                println!("Warning ({}): {}", error.kind, error.message);
            }
            if let Some(snapshot) = &current.snapshot {
                println!("Items remaining: {}", snapshot.items_remaining());
            }
            orchestrator.disconnect().await;
        }
    }

    Ok(())
}
