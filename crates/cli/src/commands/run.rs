//! `run` command implementation.

use anyhow::Result;
use contracts::{nanos_to_millis, StreamBlueprint};
use std::time::Duration;
use tracing::info;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::session::{Session, SessionConfig};

/// Execute the `run` command
pub async fn run_session(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let mut blueprint = super::load_blueprint(&args.config)?;
    apply_overrides(&mut blueprint, args)?;

    let control = blueprint.control.to_tracking_control();
    info!(
        headset = %blueprint.headset.name,
        refresh_hz = blueprint.display.refresh_rate_hz,
        offset_ms = nanos_to_millis(control.offset),
        enabled = ?control.enabled_bits().collect::<Vec<_>>(),
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let session = Session::new(SessionConfig {
        blueprint,
        duration: (args.duration > 0).then(|| Duration::from_secs(args.duration)),
        buffer_size: args.buffer_size,
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    });

    info!("Starting session...");
    let stats = session.run(shutdown_signal()).await?;

    if let Some(run) = &stats.run {
        info!(
            samples = run.report.samples,
            packets = run.report.packets,
            duration_secs = stats.duration.as_secs_f64(),
            rate = format!("{:.1}", stats.sample_rate()),
            "Session completed"
        );
    }
    stats.print_summary();

    info!("Headset telemetry finished");
    Ok(())
}

/// Apply CLI overrides, then re-validate
fn apply_overrides(blueprint: &mut StreamBlueprint, args: &RunArgs) -> Result<()> {
    if let Some(addr) = &args.control_addr {
        info!(addr = %addr, "Overriding control address from CLI");
        blueprint.session.control_addr = Some(addr.clone());
    }
    if let Some(offset_ms) = args.offset_ms {
        info!(offset_ms, "Overriding prediction offset from CLI");
        blueprint.control.offset_ms = offset_ms;
    }
    config_loader::ConfigLoader::validate(blueprint)
        .map_err(|e| CliError::config_validation(e.to_string()))?;
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &StreamBlueprint) {
    let control = blueprint.control.to_tracking_control();

    println!("\n=== Configuration Summary ===\n");
    println!("Headset: {}", blueprint.headset.name);
    println!("  Refresh rate: {} Hz", blueprint.display.refresh_rate_hz);
    println!("  Prediction offset: {:.2} ms", nanos_to_millis(control.offset));
    let enabled: Vec<_> = control.enabled_bits().map(|b| b.as_str()).collect();
    println!("  Enabled: {}", enabled.join(", "));
    println!(
        "  Control address: {}",
        blueprint.session.control_addr.as_deref().unwrap_or("(none)")
    );

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }
    println!();
}
