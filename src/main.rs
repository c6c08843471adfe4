//! claimsweep CLI
//!
//! Run modes:
//!   claimsweep account <KEY>                      - Show an account and its claimable balances
//!   claimsweep claim --destination <G...> ...     - Claim everything and forward it
//!   claimsweep classify <KEY>                     - Print whether a key is private or public
//!
//! Settings come from `CLAIMSWEEP_*` environment variables (a `.env` file is
//! loaded first); command line flags override them.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use claimsweep::common::{
    init_from_config, log_error_event, log_system_event, ClaimsweepConfig, ClaimsweepError,
    Result,
};
use claimsweep::keys::{account_id_for, classify_key};
use claimsweep::page::cancellable;
use claimsweep::{
    BalanceDiscoverer, ClaimFlow, ComposePolicy, Ed25519Signer, HorizonClient, LedgerApi,
    RoundingPolicy, SubmissionResult, TimeoutPolicy,
};

#[derive(Parser)]
#[command(name = "claimsweep")]
#[command(about = "Claim pending Stellar claimable balances and forward them in one transaction")]
struct Cli {
    /// Print the effective configuration before running
    #[arg(long, global = true)]
    show_config: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show an account's balances, data, signers and claimable balances
    Account {
        /// Account id (G...) or secret seed (S...)
        key: String,
    },

    /// Claim every claimable balance of the native asset and forward the total
    Claim {
        /// Account receiving the payment
        #[arg(short, long)]
        destination: String,

        /// Secret seed of the claiming account (or set CLAIMSWEEP_SECRET_KEY)
        #[arg(short, long)]
        secret: Option<String>,

        /// Amount paid on top of the claimed balances
        #[arg(long)]
        base_amount: Option<Decimal>,

        /// Fee per operation in stroops
        #[arg(long)]
        fee: Option<u32>,

        /// Seconds the transaction stays valid
        #[arg(long, conflicts_with = "no_expiry", required_unless_present = "no_expiry")]
        timeout_secs: Option<u64>,

        /// Leave the transaction valid until its sequence number is used
        #[arg(long)]
        no_expiry: bool,

        /// How the payment is reduced to whole units: floor or nearest
        #[arg(long, default_value = "floor")]
        round: RoundingPolicy,

        /// Compose and sign, print the envelope, do not submit
        #[arg(long)]
        dry_run: bool,
    },

    /// Print whether a key string is a private or a public key
    Classify {
        key: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenv::dotenv();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            log_error_event(e.error_code(), &e.to_string(), None);
            eprintln!("Error [{}]: {}", e.error_code(), e);
            if let ClaimsweepError::Submit(submit) = &e {
                if let Some(envelope) = submit.envelope() {
                    eprintln!("Envelope (may have been applied): {}", envelope);
                }
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if let Commands::Classify { key } = &cli.command {
        println!("{}", classify_key(key)?);
        return Ok(ExitCode::SUCCESS);
    }

    let config = ClaimsweepConfig::from_env()?;
    init_from_config(&config)?;
    if cli.show_config {
        config.print_summary();
    }
    log_system_event(
        "claimsweep started",
        serde_json::json!({
            "network": format!("{:?}", config.network),
            "horizon_url": config.horizon_url,
            "page_limit": config.page_limit,
        }),
    );

    let client = Arc::new(HorizonClient::new(&config.horizon_url).with_page_limit(config.page_limit));

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(target: "claimsweep::system", "interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Account { key } => show_account(client, &key, &cancel).await,
        Commands::Claim {
            destination,
            secret,
            base_amount,
            fee,
            timeout_secs,
            no_expiry,
            round,
            dry_run,
        } => {
            let timeout = match (timeout_secs, no_expiry) {
                (_, true) => TimeoutPolicy::Infinite,
                (Some(secs), false) => TimeoutPolicy::After(Duration::from_secs(secs)),
                (None, false) => {
                    return Err(ClaimsweepError::validation(
                        "choose --timeout-secs or --no-expiry",
                    ))
                }
            };
            let policy = ComposePolicy::native(
                base_amount.unwrap_or(config.base_amount),
                fee.unwrap_or(config.base_fee),
                timeout,
            )
            .with_rounding(round);

            let secret = match secret {
                Some(secret) => secret,
                None => config.require_secret_key()?.to_string(),
            };
            let signer = Ed25519Signer::from_secret(&secret)?;
            let flow = ClaimFlow::new(client, config.network.passphrase());

            if dry_run {
                let (prepared, signed) = flow
                    .dry_run(&[&signer], &destination, &policy, &cancel)
                    .await?;
                print_balances(&prepared.balances);
                println!("Transaction hash: {}", signed.hash());
                println!("Envelope: {}", signed.envelope_base64());
                return Ok(ExitCode::SUCCESS);
            }

            let report = flow.run(&[&signer], &destination, &policy, &cancel).await?;
            print_balances(&report.balances);
            println!("Claimed {} balance(s) from {}", report.claimed, report.account_id);
            println!("Envelope: {}", report.outcome.envelope);

            match report.outcome.result {
                SubmissionResult::Accepted { hash, ledger, .. } => {
                    println!("Success! Transaction {} included in ledger {}", hash, ledger);
                    Ok(ExitCode::SUCCESS)
                }
                SubmissionResult::Rejected {
                    transaction_code,
                    operation_codes,
                    result_xdr,
                } => {
                    println!("Transaction rejected: {}", transaction_code);
                    for code in operation_codes {
                        println!("  operation: {}", code);
                    }
                    println!("Result XDR: {}", result_xdr);
                    Ok(ExitCode::from(2))
                }
            }
        }
        Commands::Classify { .. } => Ok(ExitCode::SUCCESS),
    }
}

async fn show_account(
    client: Arc<HorizonClient>,
    key: &str,
    cancel: &CancellationToken,
) -> Result<ExitCode> {
    let account_id = account_id_for(key)?;
    let snapshot = cancellable(cancel, client.account(&account_id)).await?;

    println!("{}", snapshot.summary());

    let balances = BalanceDiscoverer::new(client)
        .discover_for(&snapshot, cancel)
        .await?;
    print_balances(&balances);

    Ok(ExitCode::SUCCESS)
}

fn print_balances(balances: &[claimsweep::ClaimableBalance]) {
    println!("Claimable balances: {}", balances.len());
    for balance in balances {
        for line in balance.display_lines() {
            println!("{}", line);
        }
    }
}
