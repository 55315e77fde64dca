//! # Tracking Engine
//!
//! Adaptive pose sampling for a streaming headset.
//!
//! 负责：
//! - 按自适应周期唤醒并采样预测窗口
//! - 按对端控制与平台能力筛选设备
//! - 将采样对齐到显示相位
//! - 输出 tracking / hand / face / battery 数据包
//!
//! ## 使用示例
//!
//! ```ignore
//! use tracking_engine::{Hardware, SamplingScheduler, StreamShared};
//!
//! let shared = StreamShared::new(control, DisplayTiming::from_refresh_rate(90.0));
//! let scheduler = SamplingScheduler::new(&config, clock, hardware, transport, shared.clone());
//!
//! let handle = std::thread::spawn(move || scheduler.run());
//! // ...
//! shared.lifecycle.request_exit();
//! ```

mod control;
mod encode;
mod error;
mod flags;
pub mod gating;
mod lifecycle;
pub mod rate;
mod recenter;
mod scheduler;
mod stopwatch;
pub mod window;

pub use control::SharedControlState;
pub use encode::{hand_joint, hand_joints, pose_sample};
pub use error::SchedulerError;
pub use flags::derive_pose_flags;
pub use lifecycle::StreamLifecycle;
pub use recenter::RecenterLatch;
pub use scheduler::{Hardware, SamplingScheduler, SchedulerRun, StreamShared};
pub use stopwatch::BusyTimer;
pub use window::{clamp_prediction, PredictionWindow, MAX_PREDICTION};
