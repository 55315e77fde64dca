//! # Dispatcher
//!
//! 遥测数据包分发模块。
//!
//! 负责：
//! - `ChannelTransport`: 调度线程到异步分发器的非阻塞桥接
//! - 消费 `TelemetryPacket`，Fan-out 到多个 sinks
//! - 隔离慢 sink，不阻塞采样线程

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;
pub mod transport;

pub use contracts::{PacketSink, TelemetryPacket};
pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, LogSink, NetworkSink};
pub use transport::ChannelTransport;
