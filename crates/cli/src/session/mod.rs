//! Session orchestration module.

mod control;
mod orchestrator;
mod stats;

pub use control::{parse_control, ControlListener};
pub use orchestrator::{Session, SessionConfig};
pub use stats::SessionStats;
