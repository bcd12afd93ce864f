//! multisafe CLI
//!
//! `search` mines a salt nonce for a vanity Safe address and prints the deep
//! link; `status` and `deploy` take that link to other chains.

use std::process;
use std::time::Duration;

use clap::Parser;
use eyre::{eyre, Result, WrapErr};
use tracing_subscriber::EnvFilter;

use multisafe::config::{ChainArgs, Command, DeployArgs, SearchArgs};
use multisafe::rpc::{self, ChainClient, HttpClient};
use multisafe::search::SearchMatch;
use multisafe::verifier::BroadcastOutcome;
use multisafe::{
    CancelToken, Config, DeploymentLink, DeploymentTarget, FallbackHandler, InitParams,
    SafeDeployments, SaltNonce, SaltSearch, Verifier, WorkerPool,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("multisafe=info")),
        )
        .init();

    let config = Config::parse();

    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {e}");
        process::exit(1);
    }

    let deployments = SafeDeployments::canonical();
    match config.command {
        Command::Search(args) => search(&args, &deployments).await,
        Command::Status(args) => status(&args, deployments).await,
        Command::Deploy(args) => deploy(&args, deployments).await,
    }
}

async fn search(args: &SearchArgs, deployments: &SafeDeployments) -> Result<()> {
    let singleton = deployments.resolve_singleton(args.singleton_address()?);
    let params = InitParams::with_deployments(
        deployments,
        args.owner_addresses()?,
        args.threshold,
        singleton,
        FallbackHandler::Primary,
    )?;
    let search = args.salt_search(deployments)?;
    let initializer = params.encode();

    println!("Safe Vanity Address Search");
    println!("==========================");
    println!("Owners:     {} (threshold {})", params.owners().len(), params.threshold());
    println!("Singleton:  {singleton}");
    println!("Factory:    {}", search.factory());
    println!("Init code:  0x{}", hex::encode(search.init_code_hash()));
    println!("Pattern:    {}", search.pattern());
    println!("Difficulty: {}", search.pattern().difficulty_description());
    println!();

    let found = if let Some(salt) = args.pinned_salt()? {
        Some(search.pinned(&initializer, salt))
    } else {
        let interrupt = CancelToken::new();
        {
            let interrupt = interrupt.clone();
            ctrlc::set_handler(move || interrupt.cancel()).wrap_err("set Ctrl-C handler")?;
        }
        println!("Searching... (Press Ctrl+C to stop)\n");

        if args.worker_count() > 1 {
            search_parallel(args, search, &initializer, &interrupt)?
        } else {
            search
                .find_address(&initializer, SaltNonce::random_seed(), &interrupt)
                .await
                .found()
                .copied()
        }
    };

    let Some(found) = found else {
        println!("\nStopped by user.");
        return Ok(());
    };

    let link = DeploymentLink {
        owners: params.owners().to_vec(),
        threshold: params.threshold(),
        singleton,
        salt: found.salt,
        address: found.address,
    };
    println!("=== Match ===");
    println!("Address:      {}", found.address);
    println!("Salt (hex):   0x{}", found.salt.to_hex());
    println!("Salt (dec):   {}", found.salt);
    println!("Attempts:     {}", format_number(found.attempts));
    println!("Link query:   {}", link.to_query());
    Ok(())
}

fn search_parallel(
    args: &SearchArgs,
    search: SaltSearch,
    initializer: &[u8],
    interrupt: &CancelToken,
) -> Result<Option<SearchMatch>> {
    let pool = WorkerPool::new(args.worker_count(), search, initializer)
        .wrap_err("spawn search workers")?;
    println!("Workers:    {}\n", pool.num_workers());

    let report_interval = Duration::from_secs(args.report_interval.max(1));
    let poll = Duration::from_millis(200);
    let mut since_report = Duration::ZERO;

    let found = loop {
        if let Some(result) = pool.wait_for_result(poll) {
            tracing::debug!(worker = result.worker_id, "worker found match");
            break Some(result.found);
        }
        if interrupt.is_cancelled() {
            break None;
        }
        since_report += poll;
        if since_report >= report_interval {
            since_report = Duration::ZERO;
            print_progress(&pool);
        }
    };

    println!("\n--- Final Statistics ---");
    println!("Total salts tried:  {}", format_number(pool.total_salts()));
    println!("Matches found:      {}", pool.total_matches());
    println!("Time elapsed:       {:.2}s", pool.elapsed().as_secs_f64());
    println!(
        "Average speed:      {}/s",
        format_number(pool.salts_per_second() as u64)
    );
    pool.join();
    Ok(found)
}

async fn targets(
    args: &ChainArgs,
    deployments: &SafeDeployments,
) -> Result<(DeploymentLink, Vec<HttpClient>, Vec<DeploymentTarget>)> {
    let link = args.deployment_link()?;
    match link.verify(deployments) {
        Ok(true) => {}
        Ok(false) => {
            return Err(eyre!(
                "link parameters do not derive {}",
                link.address
            ))
        }
        Err(err) => tracing::warn!(%err, "cannot re-derive link address, checking chains anyway"),
    }

    let original_tx = match (args.original_tx_hash()?, args.source_endpoint()?) {
        (Some(hash), Some(url)) => {
            let source = HttpClient::connect(url)
                .await
                .wrap_err("connect to source chain")?;
            let tx = rpc::original_transaction(&source, hash)
                .await
                .wrap_err("fetch original transaction")?;
            tracing::debug!(chain_id = source.chain_id(), %hash, "fetched original transaction");
            Some(tx)
        }
        _ => None,
    };

    let mut clients = Vec::new();
    let mut targets = Vec::new();
    for (chain_id, url) in args.endpoints()? {
        clients.push(HttpClient::new(chain_id, url));
        let mut target = link.target(chain_id);
        target.original_tx = original_tx.clone();
        targets.push(target);
    }
    Ok((link, clients, targets))
}

async fn status(args: &ChainArgs, deployments: SafeDeployments) -> Result<()> {
    let (link, clients, targets) = targets(args, &deployments).await?;
    let verifier = Verifier::new(deployments);

    println!("Safe {}", link.address);
    let statuses = verifier.status_all(clients.iter().zip(targets.iter())).await;
    for (client, status) in clients.iter().zip(statuses) {
        let view = status.view();
        println!(
            "chain {:>8}  {:<24} can_deploy={} method={}",
            client.chain_id(),
            status.to_string(),
            view.can_deploy,
            view.method
        );
    }
    Ok(())
}

async fn deploy(args: &DeployArgs, deployments: SafeDeployments) -> Result<()> {
    let (link, clients, targets) = targets(&args.chains, &deployments).await?;
    let verifier = Verifier::new(deployments);

    let (client, target) = clients
        .iter()
        .zip(targets.iter())
        .find(|(client, _)| client.chain_id() == args.chain)
        .ok_or_else(|| eyre!("no --rpc entry for chain {}", args.chain))?;

    let fee = args.fee()?;
    let report = verifier
        .deploy(client, target, fee.as_ref(), args.sender()?)
        .await?;

    match &report.outcome {
        BroadcastOutcome::Confirmed(hash) => println!("Deployed {} in {hash}", link.address),
        BroadcastOutcome::Reverted(hash) => println!("Transaction {hash} reverted"),
        BroadcastOutcome::Pending(hash) => println!("Transaction {hash} still pending"),
        BroadcastOutcome::Failed(err) => println!("Broadcast failed: {err}"),
    }
    println!("Status on chain {}: {}", args.chain, report.status);
    Ok(())
}

fn print_progress(pool: &WorkerPool) {
    let salts = pool.total_salts();
    let rate = pool.salts_per_second();
    let elapsed = pool.elapsed().as_secs();
    println!(
        "[{:>4}s] Tried {} salts ({}/s)",
        elapsed,
        format_number(salts),
        format_number(rate as u64)
    );
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1e9)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1e6)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1e3)
    } else {
        n.to_string()
    }
}
