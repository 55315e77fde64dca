//! Session statistics.

use std::time::Duration;

use contracts::nanos_to_millis;
use dispatcher::MetricsSnapshot;
use tracking_engine::SchedulerRun;

/// What a finished session reports
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub duration: Duration,
    /// `None` when the sampling loop failed
    pub run: Option<SchedulerRun>,
    /// Packets the transport dropped because the dispatcher lagged
    pub transport_dropped: u64,
    pub sinks: Vec<(String, MetricsSnapshot)>,
    pub teardown_reason: Option<String>,
}

impl SessionStats {
    /// Samples per second over the whole session
    pub fn sample_rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        match &self.run {
            Some(run) if secs > 0.0 => run.report.samples as f64 / secs,
            _ => 0.0,
        }
    }

    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                   Telemetry Session                          ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Sample rate: {:.1}/s", self.sample_rate());
        println!("   └─ Transport drops: {}", self.transport_dropped);

        if let Some(run) = &self.run {
            let report = &run.report;
            println!("\n📈 Scheduler");
            println!("   ├─ Iterations: {}", report.iterations);
            println!("   ├─ Samples: {} (emitted {})", report.samples, report.emitted);
            println!("   ├─ Out of window: {}", report.out_of_window);
            println!("   ├─ Packets: {}", report.packets);
            println!("   ├─ Recenters: {}", report.recenters);
            println!("   ├─ Battery polls: {}", report.battery_polls);
            println!(
                "   └─ Final period: {:.3} ms",
                nanos_to_millis(report.final_period)
            );

            println!("\n{}", run.summary);
        }

        if !self.sinks.is_empty() {
            println!("📤 Sinks ({})", self.sinks.len());
            for (i, (name, snap)) in self.sinks.iter().enumerate() {
                let prefix = if i == self.sinks.len() - 1 { "└─" } else { "├─" };
                println!("   {prefix} {name}: {snap}");
            }
        }

        if let Some(reason) = &self.teardown_reason {
            println!("\n⚠️  Torn down: {reason}");
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SchedulerReport;
    use observability::TelemetrySummary;

    #[test]
    fn test_sample_rate() {
        let mut stats = SessionStats {
            duration: Duration::from_secs(2),
            ..Default::default()
        };
        assert_eq!(stats.sample_rate(), 0.0);

        stats.run = Some(SchedulerRun {
            report: SchedulerReport {
                samples: 1000,
                ..Default::default()
            },
            summary: TelemetrySummary::default(),
        });
        assert_eq!(stats.sample_rate(), 500.0);
    }
}
