//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{nanos_to_millis, Capability, ControlBit, StreamBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    headset: HeadsetInfo,
    tracking: TrackingInfo,
    control: ControlInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct HeadsetInfo {
    name: String,
    capabilities: Vec<String>,
    refresh_rate_hz: f64,
}

#[derive(Serialize)]
struct TrackingInfo {
    initial_period_ms: f64,
    wake_lead_us: u64,
    battery_interval_s: f64,
}

#[derive(Serialize)]
struct ControlInfo {
    enabled: Vec<ControlBit>,
    offset_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    listen_addr: Option<String>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = super::load_blueprint(&args.config)?;
    let info = build_config_info(&blueprint, args);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{json}");
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn capabilities(blueprint: &StreamBlueprint) -> Vec<String> {
    [
        Capability::EyeGaze,
        Capability::HandTracking,
        Capability::FaceTracking,
        Capability::Battery,
    ]
    .into_iter()
    .filter(|c| blueprint.headset.supports(*c))
    .map(|c| c.to_string())
    .collect()
}

fn build_config_info(blueprint: &StreamBlueprint, args: &InfoArgs) -> ConfigInfo {
    let control = blueprint.control.to_tracking_control();
    let tracking = &blueprint.tracking;

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        headset: HeadsetInfo {
            name: blueprint.headset.name.clone(),
            capabilities: capabilities(blueprint),
            refresh_rate_hz: blueprint.display.refresh_rate_hz,
        },
        tracking: TrackingInfo {
            initial_period_ms: tracking.initial_period_ms,
            wake_lead_us: tracking.wake_lead_us,
            battery_interval_s: tracking.battery_interval_s,
        },
        control: ControlInfo {
            enabled: control.enabled_bits().collect(),
            offset_ms: nanos_to_millis(control.offset),
            listen_addr: blueprint.session.control_addr.clone(),
        },
        sinks,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Headset Telemetry Configuration                ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🥽 Headset");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Name: {}", info.headset.name);
    println!("   ├─ Refresh rate: {} Hz", info.headset.refresh_rate_hz);
    if info.headset.capabilities.is_empty() {
        println!("   └─ Capabilities: (none)");
    } else {
        println!("   └─ Capabilities: {}", info.headset.capabilities.join(", "));
    }

    println!("\n⏱️  Tracking");
    println!("   ├─ Initial period: {} ms", info.tracking.initial_period_ms);
    println!("   ├─ Wake lead: {} µs", info.tracking.wake_lead_us);
    println!("   └─ Battery interval: {} s", info.tracking.battery_interval_s);

    println!("\n🎛️  Control");
    let enabled: Vec<&str> = info.control.enabled.iter().map(|b| b.as_str()).collect();
    println!("   ├─ Enabled: {}", enabled.join(", "));
    println!("   ├─ Prediction offset: {:.2} ms", info.control.offset_ms);
    match &info.control.listen_addr {
        Some(addr) => println!("   └─ Listening on: {addr}"),
        None => println!("   └─ Listening on: (disabled)"),
    }

    if !info.sinks.is_empty() {
        println!("\n📤 Sinks ({})", info.sinks.len());
        for (i, sink) in info.sinks.iter().enumerate() {
            let prefix = if i == info.sinks.len() - 1 { "└─" } else { "├─" };
            println!(
                "   {} {} ({}, queue {})",
                prefix, sink.name, sink.sink_type, sink.queue_capacity
            );
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::HeadsetConfig;
    use std::path::PathBuf;

    #[test]
    fn test_build_config_info() {
        let mut bp = StreamBlueprint::with_headset(HeadsetConfig {
            name: "sim".into(),
            eye_gaze: true,
            hand_tracking: false,
            face_tracking: false,
            battery: true,
        });
        bp.control.offset_ms = 25.0;

        let info = build_config_info(
            &bp,
            &InfoArgs {
                config: PathBuf::from("x.toml"),
                json: true,
                sinks: true,
            },
        );
        assert_eq!(info.headset.capabilities, vec!["eye_gaze", "battery"]);
        assert_eq!(info.control.offset_ms, 25.0);
        assert_eq!(info.control.enabled.len(), 4);

        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("sinks").is_none());
        assert!(json["control"].get("listen_addr").is_none());
    }
}
