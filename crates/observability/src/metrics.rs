//! Sampling scheduler 指标收集模块
//!
//! 基于 BurstReport 收集和统计调度器的运行指标。

use contracts::{nanos_to_millis, BatteryPacket, BurstReport, Nanos, PacketKind, TrackingControl};
use metrics::{counter, gauge, histogram};

/// 从 BurstReport 记录指标
///
/// 每个调度迭代结束时调用。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_burst_metrics;
///
/// let burst = scheduler.step()?;
/// record_burst_metrics(&burst);
/// ```
pub fn record_burst_metrics(burst: &BurstReport) {
    counter!("headset_telemetry_bursts_total").increment(1);

    counter!("headset_telemetry_samples_total").increment(burst.samples as u64);
    histogram!("headset_telemetry_samples_per_burst").record(burst.samples as f64);

    // 运行时拒绝的预测时刻
    if burst.out_of_window > 0 {
        counter!("headset_telemetry_samples_out_of_window_total")
            .increment(burst.out_of_window as u64);
    }

    // 忙碌时间 (ns -> ms)
    histogram!("headset_telemetry_busy_ms").record(nanos_to_millis(burst.busy));

    gauge!("headset_telemetry_prediction_ms").set(nanos_to_millis(burst.prediction));
    gauge!("headset_telemetry_sampling_period_ms").set(nanos_to_millis(burst.next_period));
    gauge!("headset_telemetry_skip_samples").set(burst.skip_samples as f64);

    if burst.recentered {
        counter!("headset_telemetry_recenters_total").increment(1);
    }
}

/// 记录发送到传输层的数据包
pub fn record_packet_sent(kind: PacketKind) {
    counter!("headset_telemetry_packets_sent_total", "kind" => kind.as_str()).increment(1);
}

/// 记录因队列满而丢弃的数据包
pub fn record_packet_dropped(kind: PacketKind) {
    counter!("headset_telemetry_packets_dropped_total", "kind" => kind.as_str()).increment(1);
}

/// 记录电池轮询
pub fn record_battery_poll(battery: &BatteryPacket, took: Nanos) {
    counter!("headset_telemetry_battery_polls_total").increment(1);
    histogram!("headset_telemetry_battery_poll_ms").record(nanos_to_millis(took));
    if battery.present {
        gauge!("headset_telemetry_battery_charge").set(battery.charge as f64);
    }
    gauge!("headset_telemetry_battery_charging").set(if battery.charging { 1.0 } else { 0.0 });
}

/// 记录对端控制消息
pub fn record_control_update(control: &TrackingControl) {
    counter!("headset_telemetry_control_updates_total").increment(1);
    gauge!("headset_telemetry_control_offset_ms").set(nanos_to_millis(control.offset));
    gauge!("headset_telemetry_control_enabled_bits").set(control.enabled_bits().count() as f64);
}

/// 记录数据包分发
pub fn record_packet_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "headset_telemetry_packets_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 调度指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct TelemetryAggregator {
    /// 总迭代数
    pub total_bursts: u64,

    /// 总采样数
    pub total_samples: u64,

    /// 被运行时拒绝的采样数
    pub total_out_of_window: u64,

    /// 发送的数据包数
    pub total_packets: u64,

    /// 重定中心次数
    pub recenters: u64,

    /// 每次迭代的采样数
    pub samples_stats: RunningStats,

    /// 忙碌时间统计 (ms)
    pub busy_stats: RunningStats,

    /// 采样周期统计 (ms)
    pub period_stats: RunningStats,
}

impl TelemetryAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, burst: &BurstReport) {
        self.total_bursts += 1;
        self.total_samples += burst.samples as u64;
        self.total_out_of_window += burst.out_of_window as u64;
        self.total_packets += burst.packets as u64;
        if burst.recentered {
            self.recenters += 1;
        }

        self.samples_stats.push(burst.samples as f64);
        self.busy_stats.push(nanos_to_millis(burst.busy));
        self.period_stats.push(nanos_to_millis(burst.next_period));
    }

    /// 生成摘要报告
    pub fn summary(&self) -> TelemetrySummary {
        TelemetrySummary {
            total_bursts: self.total_bursts,
            total_samples: self.total_samples,
            total_out_of_window: self.total_out_of_window,
            total_packets: self.total_packets,
            recenters: self.recenters,
            out_of_window_rate: if self.total_samples > 0 {
                self.total_out_of_window as f64 / self.total_samples as f64 * 100.0
            } else {
                0.0
            },
            samples_per_burst: StatsSummary::from(&self.samples_stats),
            busy_ms: StatsSummary::from(&self.busy_stats),
            period_ms: StatsSummary::from(&self.period_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct TelemetrySummary {
    pub total_bursts: u64,
    pub total_samples: u64,
    pub total_out_of_window: u64,
    pub total_packets: u64,
    pub recenters: u64,
    pub out_of_window_rate: f64,
    pub samples_per_burst: StatsSummary,
    pub busy_ms: StatsSummary,
    pub period_ms: StatsSummary,
}

impl std::fmt::Display for TelemetrySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Telemetry Summary ===")?;
        writeln!(f, "Bursts: {}", self.total_bursts)?;
        writeln!(f, "Samples: {}", self.total_samples)?;
        writeln!(
            f,
            "Out of window: {} ({:.2}%)",
            self.total_out_of_window, self.out_of_window_rate
        )?;
        writeln!(f, "Packets sent: {}", self.total_packets)?;
        writeln!(f, "Recenters: {}", self.recenters)?;
        writeln!(f, "Samples per burst: {}", self.samples_per_burst)?;
        writeln!(f, "Busy (ms): {}", self.busy_ms)?;
        writeln!(f, "Sampling period (ms): {}", self.period_ms)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
