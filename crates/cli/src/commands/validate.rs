//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{nanos_to_millis, Capability, ControlBit, StreamBlueprint};
use serde::Serialize;
use tracing::info;
use tracking_engine::MAX_PREDICTION;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    headset: String,
    refresh_rate_hz: f64,
    offset_ms: f64,
    enabled: Vec<ControlBit>,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{json}");
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    match super::load_blueprint(&args.config) {
        Ok(blueprint) => {
            let control = blueprint.control.to_tracking_control();
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: collect_warnings(&blueprint),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    headset: blueprint.headset.name.clone(),
                    refresh_rate_hz: blueprint.display.refresh_rate_hz,
                    offset_ms: nanos_to_millis(control.offset),
                    enabled: control.enabled_bits().collect(),
                    sink_count: blueprint.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("{e:#}")),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

/// Non-fatal issues
fn collect_warnings(blueprint: &StreamBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let control = blueprint.control.to_tracking_control();

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - packets will be discarded".to_string());
    }

    if control.offset < 0 || control.offset > MAX_PREDICTION {
        warnings.push(format!(
            "control.offset_ms {} will be clamped to [0, {}]",
            blueprint.control.offset_ms,
            nanos_to_millis(MAX_PREDICTION)
        ));
    }

    // 开启了但硬件不支持的位不会产生数据包
    for (bit, capability) in [
        (ControlBit::LeftHand, Capability::HandTracking),
        (ControlBit::RightHand, Capability::HandTracking),
        (ControlBit::Face, Capability::FaceTracking),
        (ControlBit::Battery, Capability::Battery),
    ] {
        if control.is_enabled(bit) && !blueprint.headset.supports(capability) {
            warnings.push(format!(
                "'{bit}' is enabled but the headset lacks {capability} support"
            ));
        }
    }

    if blueprint.session.control_addr.is_none() {
        warnings.push("session.control_addr not set - control stays fixed".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Headset: {}", summary.headset);
            println!("  Refresh rate: {} Hz", summary.refresh_rate_hz);
            println!("  Prediction offset: {:.2} ms", summary.offset_ms);
            println!("  Enabled bits: {}", summary.enabled.len());
            println!("  Sinks: {}", summary.sink_count);
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {error}");
        }
    }
}
