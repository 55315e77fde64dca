//! 配置校验模块
//!
//! 校验规则：
//! - headset.name 非空
//! - 初始采样周期在 [1ms, 5ms] 内
//! - 唤醒提前量小于最小采样周期
//! - battery_interval_s > 0, refresh_rate_hz > 0
//! - 模拟窗口非负
//! - session.control_addr 为合法 socket 地址
//! - sink 名称唯一且非空，network sink 需要合法 addr

use std::collections::HashSet;
use std::net::SocketAddr;

use contracts::{ContractError, SinkType, StreamBlueprint, NANOS_PER_MILLI};

const MIN_PERIOD_MS: f64 = 1.0;
const MAX_PERIOD_MS: f64 = 5.0;

/// 校验 StreamBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &StreamBlueprint) -> Result<(), ContractError> {
    validate_headset(blueprint)?;
    validate_tracking(blueprint)?;
    validate_control(blueprint)?;
    validate_display(blueprint)?;
    validate_simulation(blueprint)?;
    validate_session(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

fn validate_headset(blueprint: &StreamBlueprint) -> Result<(), ContractError> {
    if blueprint.headset.name.trim().is_empty() {
        return Err(ContractError::config_validation(
            "headset.name",
            "headset name cannot be empty",
        ));
    }
    Ok(())
}

/// 校验调度器参数
fn validate_tracking(blueprint: &StreamBlueprint) -> Result<(), ContractError> {
    let tracking = &blueprint.tracking;

    if !(MIN_PERIOD_MS..=MAX_PERIOD_MS).contains(&tracking.initial_period_ms) {
        return Err(ContractError::config_validation(
            "tracking.initial_period_ms",
            format!(
                "initial_period_ms must be within [{MIN_PERIOD_MS}, {MAX_PERIOD_MS}], got {}",
                tracking.initial_period_ms
            ),
        ));
    }

    // 提前唤醒量必须小于最短周期
    if tracking.wake_lead() >= NANOS_PER_MILLI {
        return Err(ContractError::config_validation(
            "tracking.wake_lead_us",
            format!(
                "wake_lead_us must be < 1000, got {}",
                tracking.wake_lead_us
            ),
        ));
    }

    if !(tracking.battery_interval_s.is_finite() && tracking.battery_interval_s > 0.0) {
        return Err(ContractError::config_validation(
            "tracking.battery_interval_s",
            format!(
                "battery_interval_s must be > 0, got {}",
                tracking.battery_interval_s
            ),
        ));
    }

    Ok(())
}

fn validate_control(blueprint: &StreamBlueprint) -> Result<(), ContractError> {
    // 超出 [0, 80ms] 的偏移在使用时截断，这里只拒绝非数值
    if !blueprint.control.offset_ms.is_finite() {
        return Err(ContractError::config_validation(
            "control.offset_ms",
            "offset_ms must be a finite number",
        ));
    }
    Ok(())
}

fn validate_display(blueprint: &StreamBlueprint) -> Result<(), ContractError> {
    let hz = blueprint.display.refresh_rate_hz;
    if !(hz.is_finite() && hz > 0.0) {
        return Err(ContractError::config_validation(
            "display.refresh_rate_hz",
            format!("refresh_rate_hz must be > 0, got {hz}"),
        ));
    }
    Ok(())
}

/// 校验模拟硬件参数
fn validate_simulation(blueprint: &StreamBlueprint) -> Result<(), ContractError> {
    let sim = &blueprint.simulation;

    for (field, value) in [
        ("simulation.lookahead_ms", sim.lookahead_ms),
        ("simulation.lookbehind_ms", sim.lookbehind_ms),
        ("simulation.recenter_interval_s", sim.recenter_interval_s),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(ContractError::config_validation(
                field,
                format!("must be >= 0, got {value}"),
            ));
        }
    }

    if !(0.0..=1.0).contains(&sim.battery_drain_per_poll) {
        return Err(ContractError::config_validation(
            "simulation.battery_drain_per_poll",
            format!(
                "battery_drain_per_poll must be within [0, 1], got {}",
                sim.battery_drain_per_poll
            ),
        ));
    }

    Ok(())
}

fn validate_session(blueprint: &StreamBlueprint) -> Result<(), ContractError> {
    if let Some(addr) = &blueprint.session.control_addr {
        addr.parse::<SocketAddr>().map_err(|e| {
            ContractError::config_validation(
                "session.control_addr",
                format!("invalid address '{addr}': {e}"),
            )
        })?;
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sinks(blueprint: &StreamBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be > 0",
            ));
        }
        if sink.sink_type == SinkType::Network {
            let addr = sink.params.get("addr").ok_or_else(|| {
                ContractError::config_validation(
                    format!("sinks[{}].params.addr", sink.name),
                    "network sink requires 'addr'",
                )
            })?;
            addr.parse::<SocketAddr>().map_err(|e| {
                ContractError::config_validation(
                    format!("sinks[{}].params.addr", sink.name),
                    format!("invalid address '{addr}': {e}"),
                )
            })?;
        }
    }
    Ok(())
}
