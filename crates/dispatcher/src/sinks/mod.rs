//! Sink implementations
//!
//! - `LogSink`: tracing 输出，调试用
//! - `FileSink`: JSON lines 文件
//! - `NetworkSink`: UDP 数据报

mod file;
mod log;
mod network;

pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;
pub use self::network::{NetworkFormat, NetworkSink, NetworkSinkConfig};
