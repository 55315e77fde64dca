//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, ControlBit, StreamBlueprint};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<StreamBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<StreamBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置，并规整控制位
pub fn parse(content: &str, format: ConfigFormat) -> Result<StreamBlueprint, ContractError> {
    let mut blueprint = match format {
        ConfigFormat::Toml => parse_toml(content)?,
        ConfigFormat::Json => parse_json(content)?,
    };
    normalize(&mut blueprint);
    Ok(blueprint)
}

/// Canonical form of a parsed blueprint.
///
/// - `control.enabled` in wire order without duplicates
/// - `display.refresh_rate_hz` derived from `frame_period_ms` when only the
///   period was given
pub fn normalize(blueprint: &mut StreamBlueprint) {
    let enabled = &blueprint.control.enabled;
    blueprint.control.enabled = ControlBit::ALL
        .into_iter()
        .filter(|bit| enabled.contains(bit))
        .collect();

    let display = &mut blueprint.display;
    if let Some(period_ms) = display.frame_period_ms.take() {
        if period_ms > 0.0 {
            display.refresh_rate_hz = 1000.0 / period_ms;
        } else {
            // 非正周期交给校验报错
            display.refresh_rate_hz = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[headset]
name = "sim-quest"
hand_tracking = true

[[sinks]]
name = "log_sink"
sink_type = "log"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.headset.name, "sim-quest");
        assert!(bp.headset.hand_tracking);
        assert!(!bp.headset.eye_gaze);
        assert_eq!(bp.tracking.wake_lead_us, 100);
        assert_eq!(bp.sinks.len(), 1);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "headset": { "name": "sim", "eye_gaze": true },
            "control": { "enabled": ["left_aim", "face"], "offset_ms": 20.0 },
            "display": { "refresh_rate_hz": 120.0 },
            "sinks": [{ "name": "log", "sink_type": "log" }]
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.control.enabled.len(), 2);
        assert_eq!(bp.display.refresh_rate_hz, 120.0);
    }

    #[test]
    fn test_enabled_bits_in_wire_order() {
        let content = r#"
[headset]
name = "sim"

[control]
enabled = ["battery", "left_aim", "face", "left_aim"]
"#;
        let bp = parse(content, ConfigFormat::Toml).unwrap();
        assert_eq!(
            bp.control.enabled,
            vec![ControlBit::LeftAim, ControlBit::Face, ControlBit::Battery]
        );
    }

    #[test]
    fn test_display_from_frame_period() {
        let content = r#"
[headset]
name = "sim"

[display]
frame_period_ms = 8.0
"#;
        let bp = parse(content, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.display.refresh_rate_hz, 125.0);
        assert_eq!(bp.display.frame_period_ms, None);
        assert_eq!(bp.display.period(), 8_000_000);

        let zero = parse(
            "[headset]\nname = \"sim\"\n[display]\nframe_period_ms = 0.0\n",
            ConfigFormat::Toml,
        )
        .unwrap();
        assert_eq!(zero.display.refresh_rate_hz, 0.0);
    }

    #[test]
    fn test_parse_unknown_control_bit() {
        let content = r#"
[headset]
name = "sim"

[control]
enabled = ["left_aim", "tail"]
"#;
        assert!(matches!(
            parse_toml(content),
            Err(ContractError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
