use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

use onchain_proof_service::services::LOCAL_DEMO_PASSPHRASE;
use onchain_proof_service::{Config, ServiceContainer, ServiceFactory};
use onchain_proof_types::{Address, Network, ProviderId};
use onchain_proof_wallet::{KeypairSigner, TransactionSigner};

#[derive(Parser)]
#[command(name = "onchain-proof")]
#[command(about = "Create, update and browse on-chain proof records")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "onchain-proof.toml")]
    config: String,

    /// Gateway type override: "http" or "local"
    #[arg(long)]
    gateway: Option<String>,

    /// Hex secret key file backing the wallet providers
    #[arg(long, env = "PROOF_KEY_FILE")]
    key_file: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Connect a wallet provider (extension, webwallet, walletconnect, ledger)
    Connect { provider: String },
    /// Log out and clear the persisted session
    Disconnect,
    /// Show the current session and the last transaction state
    Status,
    /// Certify a new proof
    Create {
        text: String,
        id: String,
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Update the text (and optionally metadata) of an owned proof
    Update {
        id: String,
        text: String,
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Fetch one proof of a user
    Get { user: String, id: String },
    /// List the proofs of a user (defaults to the connected account)
    List { user: Option<String> },
    /// List the proof ids of a user
    Ids { user: Option<String> },
    /// Check whether a proof id is taken
    Exists { id: String },
    /// Show the owner of a proof
    Owner { id: String },
    /// Number of proofs of a user
    Count { user: Option<String> },
    /// Number of proofs across all users
    Total,
    /// Wait for a transaction to reach a final status
    Wait {
        hash: String,
        #[arg(long, default_value_t = 10)]
        retries: u32,
    },
    /// Run a full create/update/read flow against the in-process ledger
    Demo,
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level)).init();

    // These run without a configuration file
    match args.command {
        Command::Version => {
            print_version();
            return Ok(());
        }
        Command::Demo => return run_demo().await,
        _ => {}
    }

    // Load configuration
    let mut config = Config::load(&args.config)?;
    config.apply_env()?;
    if let Some(gateway) = &args.gateway {
        config.network.gateway_type = gateway.clone();
    }
    if args.key_file.is_some() {
        config.wallet.key_file = args.key_file.clone();
    }
    info!("Configuration loaded from: {}", args.config);

    let services = ServiceFactory::create_services(&config)?;
    run_command(&services, args.command).await
}

async fn run_command(services: &ServiceContainer, command: Command) -> Result<()> {
    let contract = &services.contract;

    match command {
        Command::Connect { provider } => {
            let session = services.wallet.connect(&provider).await;
            print_json(&session)?;
            if let Some(error) = session.error {
                bail!(error);
            }
        }
        Command::Disconnect => print_json(&services.wallet.disconnect().await)?,
        Command::Status => {
            let session = services.proof_service.current_session().await;
            print_json(&session)?;
            print_json(&services.proof_service.transaction_state().await)?;
        }
        Command::Create { text, id, metadata } => {
            reconnect(services).await?;
            let result = services
                .proof_service
                .create_proof(&text, &id, metadata.as_deref())
                .await;
            report(services, result.map_err(anyhow::Error::from)).await?;
        }
        Command::Update { id, text, metadata } => {
            reconnect(services).await?;
            let result = services
                .proof_service
                .update_proof(&id, &text, metadata.as_deref())
                .await;
            report(services, result.map_err(anyhow::Error::from)).await?;
        }
        Command::Get { user, id } => {
            let user = parse_address(&user)?;
            match contract.get_proof(&user, &id).await {
                Some(record) => print_json(&record)?,
                None => println!("Proof {} not found for {}", id, user),
            }
        }
        Command::List { user } => {
            let user = resolve_user(services, user)?;
            print_json(&contract.get_user_proofs(&user).await)?;
        }
        Command::Ids { user } => {
            let user = resolve_user(services, user)?;
            print_json(&contract.get_user_proof_ids(&user).await)?;
        }
        Command::Exists { id } => println!("{}", contract.proof_exists(&id).await),
        Command::Owner { id } => match contract.get_proof_owner(&id).await {
            Some(owner) => println!("{}", owner),
            None => println!("Proof {} has no owner", id),
        },
        Command::Count { user } => {
            let user = resolve_user(services, user)?;
            println!("{}", contract.get_user_proof_count(&user).await);
        }
        Command::Total => println!("{}", contract.get_total_proofs().await),
        Command::Wait { hash, retries } => {
            let status = contract.wait_for_transaction(&hash, retries).await?;
            println!("{}: {}", hash, status);
        }
        Command::Demo => run_demo().await?,
        Command::Version => print_version(),
    }

    Ok(())
}

/// Restore the persisted session so this process can sign
async fn reconnect(services: &ServiceContainer) -> Result<()> {
    if services.wallet.is_connected().await {
        return Ok(());
    }
    let session = services.wallet.auto_reconnect().await;
    if !session.is_connected {
        bail!("Wallet not connected (run `onchain-proof connect <provider>` first)");
    }
    Ok(())
}

async fn report(services: &ServiceContainer, result: Result<String>) -> Result<()> {
    print_json(&services.proof_service.transaction_state().await)?;
    let hash = result?;
    info!("Transaction {} confirmed", hash);
    Ok(())
}

fn resolve_user(services: &ServiceContainer, user: Option<String>) -> Result<Address> {
    match user {
        Some(user) => parse_address(&user),
        None => {
            let session = services.wallet.current_session();
            let address = session
                .address
                .context("No user given and no wallet connected")?;
            parse_address(&address)
        }
    }
}

fn parse_address(address: &str) -> Result<Address> {
    Address::from_bech32(address).with_context(|| format!("Invalid address {}", address))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_version() {
    println!("onchain-proof {}", env!("CARGO_PKG_VERSION"));
    println!("built:  {}", env!("BUILD_TIME"));
    println!("commit: {}", option_env!("GIT_COMMIT").unwrap_or("unknown"));
}

async fn run_demo() -> Result<()> {
    info!("Starting demo against the in-process ledger");

    let signer: Arc<dyn TransactionSigner> = Arc::new(KeypairSigner::from_passphrase(LOCAL_DEMO_PASSPHRASE)?);
    let services = ServiceFactory::create_test_services(signer)?;
    let proofs = &services.proof_service;

    let session = services.wallet.connect(ProviderId::Extension.as_str()).await;
    println!("Connected: {}", session.address.as_deref().unwrap_or("-"));
    println!("Network:   {} (local ledger)", Network::Devnet);

    let hash = proofs
        .create_proof("HACKATHON_2025_WINNER", "hackathon_001", Some(r#"{"event":"demo"}"#))
        .await?;
    println!("Created hackathon_001 in {}", hash);

    let hash = proofs.create_proof("COURSE_RUST", "course_001", None).await?;
    println!("Created course_001 in {}", hash);

    let hash = proofs
        .update_proof("course_001", "COURSE_RUST_ADVANCED", Some(r#"{"level":2}"#))
        .await?;
    println!("Updated course_001 in {}", hash);

    if let Err(e) = proofs.create_proof("DUPLICATE", "course_001", None).await {
        warn!("Expected failure: {}", e);
        println!("Duplicate id rejected: {}", e);
    }

    print_json(&proofs.my_dashboard().await?)?;
    services.wallet.disconnect().await;
    Ok(())
}
