use anyhow::{bail, Context, Result};
use clap::{Arg, Command};
use commonware_cryptography::Signer;
use commonware_runtime::{tokio, Metrics, Runner};
use tracing::info;
use wheel_execution::HashChainSource;
use wheel_relay::{coordinator, ledger, session::Session, Config};
use wheel_types::NAMESPACE;

fn main() {
    if let Err(err) = main_result() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn main_result() -> Result<()> {
    // Parse arguments
    let matches = Command::new("wheel-relay")
        .about("Run a local wheel pool session against an in-process randomness coordinator.")
        .arg(Arg::new("config").long("config").required(true))
        .get_matches();

    // Load config
    let config_file = matches
        .get_one::<String>("config")
        .context("missing --config")?;
    let config_file = std::fs::read_to_string(config_file)
        .with_context(|| format!("Could not read config file {config_file}"))?;
    let config: Config =
        serde_yaml::from_str(&config_file).context("Could not parse config file")?;
    let raw = format!("{config:?}");
    let config = config.validate().context("Invalid config")?;

    // Initialize runtime
    let cfg = tokio::Config::default()
        .with_worker_threads(config.worker_threads)
        .with_catch_panics(true);
    let executor = tokio::Runner::new(cfg);

    // Start runtime
    executor.start(|context| async move {
        tokio::telemetry::init(
            context.with_label("telemetry"),
            tokio::telemetry::Logging {
                level: config.log_level,
                json: config.json_logs,
            },
            None,
            None,
        );
        info!(config = %raw, "loaded config file");

        let source = HashChainSource::from_secret(config.randomness_secret);
        info!(commitment = ?source.commitment(), "randomness committed");

        // Start actors
        let (ledger, ledger_mailbox) = ledger::Actor::new(
            context.with_label("ledger"),
            ledger::Config {
                namespace: NAMESPACE.to_vec(),
                mailbox_size: config.mailbox_size,
            },
        );
        let coordinator_public = config.coordinator.public_key();
        let (coordinator, coordinator_mailbox) = coordinator::Actor::new(
            context.with_label("coordinator"),
            coordinator::Config {
                signer: config.coordinator,
                source,
                delay: config.fulfillment_delay,
                jitter: config.fulfillment_jitter,
                mailbox_size: config.mailbox_size,
            },
        );
        let ledger_handle = ledger.start(coordinator_mailbox);
        let coordinator_handle = coordinator.start(ledger_mailbox.clone());

        // Run session
        let report = Session::new(
            context.with_label("session"),
            config.session,
            ledger_mailbox,
            config.operator,
            coordinator_public,
            config.players,
        )
        .run()
        .await;
        coordinator_handle.abort();
        ledger_handle.abort();
        let report = report?;

        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Could not encode report")?
        );
        if !report.pool.balanced {
            bail!("pool ledger does not balance");
        }
        Ok::<(), anyhow::Error>(())
    })
}
