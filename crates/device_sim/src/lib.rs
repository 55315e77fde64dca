//! # Device Sim
//!
//! 模拟头显硬件，供 CLI 会话和集成测试使用。
//!
//! - `clock`: 单调时钟与手动时钟
//! - `headset`: 头部/控制器/眼动/手部/面部姿态
//! - `battery`: 电池与能力开关
//! - `periodic`: 显示刷新与周期性 recenter 线程

mod battery;
mod clock;
mod headset;
pub mod periodic;

pub use battery::{SimulatedBattery, SimulatedCapabilities};
pub use clock::{ManualClock, MonotonicClock};
pub use headset::{SimulatedHeadset, SimulatedHeadsetConfig, FACE_WEIGHT_COUNT};
pub use periodic::{next_vsync, spawn_display, spawn_recenter, PeriodicTask};
