//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 调度器 + 模拟头显的端到端采样场景（手动时钟，无真实等待）
//! - 配置文件 -> 调度器的装配
//! - 调度器 -> ChannelTransport -> Dispatcher -> FileSink 全链路

#[cfg(test)]
mod fixtures;

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }
}

#[cfg(test)]
mod sampling_tests {
    use contracts::{
        Capability, ControlBit, DeviceId, HandSide, PacketKind, StateFlags, TelemetryPacket,
        TrackingControl, ViewFlags,
    };
    use device_sim::SimulatedHeadsetConfig;
    use tracking_engine::SchedulerError;

    use crate::fixtures::{Rig, RigOptions, MS, START};

    fn tracking(packet: &TelemetryPacket) -> &contracts::TrackingPacket {
        match packet {
            TelemetryPacket::Tracking(t) => t,
            other => panic!("expected tracking packet, got {:?}", other.kind()),
        }
    }

    /// 全部设备开启、零预测：每次迭代一个采样，发送顺序固定
    #[test]
    fn test_full_headset_zero_offset() {
        let mut rig = Rig::new(RigOptions {
            control: TrackingControl::all_enabled(0),
            ..Default::default()
        });

        let first = rig.scheduler.step().unwrap().unwrap();
        assert_eq!(first.t0, START);
        assert_eq!(first.samples, 1);
        assert_eq!(first.emitted, 1);
        // battery 在 burst 之外发送
        assert_eq!(first.packets, 4);
        assert_eq!(
            rig.recorded.kinds(),
            vec![
                PacketKind::Tracking,
                PacketKind::Hand,
                PacketKind::Hand,
                PacketKind::Face,
                PacketKind::Battery,
            ]
        );

        let packets = rig.recorded.packets();
        let head = tracking(&packets[0]);
        assert_eq!(head.timestamp, START);
        assert_eq!(head.production_timestamp, START);
        assert!(head.view_flags.contains(ViewFlags::POSITION_TRACKED));
        let devices: Vec<_> = head.device_poses.iter().map(|p| p.device).collect();
        assert_eq!(
            devices,
            vec![
                DeviceId::Head,
                DeviceId::LeftAim,
                DeviceId::LeftGrip,
                DeviceId::RightAim,
                DeviceId::RightGrip,
                DeviceId::EyeGaze,
            ]
        );
        match (&packets[1], &packets[2]) {
            (TelemetryPacket::Hand(l), TelemetryPacket::Hand(r)) => {
                assert_eq!(l.hand, HandSide::Left);
                assert_eq!(r.hand, HandSide::Right);
                assert!(l.joints.is_some());
            }
            other => panic!("unexpected packets {other:?}"),
        }
        if let TelemetryPacket::Face(face) = &packets[3] {
            assert_eq!(face.weights.weights.len(), device_sim::FACE_WEIGHT_COUNT);
        }

        rig.recorded.clear();
        let second = rig.scheduler.step().unwrap().unwrap();
        assert_eq!(second.t0, START + MS);
        assert_eq!(rig.recorded.count(PacketKind::Battery), 0);
        assert_eq!(rig.recorded.count(PacketKind::Tracking), 1);
    }

    /// 预测窗口在首个采样后对齐到显示相位
    #[test]
    fn test_offset_window_aligns_to_display_phase() {
        let mut rig = Rig::new(RigOptions {
            control: TrackingControl::with_enabled(&[], 50 * MS),
            ..Default::default()
        });
        rig.shared.display.observe(START + 3 * MS, 10 * MS);

        let burst = rig.scheduler.step().unwrap().unwrap();
        assert_eq!(burst.prediction, 50 * MS);
        assert_eq!(burst.samples, 6);
        assert_eq!(
            rig.recorded.tracking_offsets(START),
            vec![0, 13 * MS, 23 * MS, 33 * MS, 43 * MS, 53 * MS]
        );

        // 下一轮 t0 不在显示网格上，移位量随之变化
        let next = rig.scheduler.step().unwrap().unwrap();
        assert_eq!(next.t0, START + MS);
        let offsets = rig.recorded.tracking_offsets(next.t0);
        assert_eq!(offsets, vec![0, 12 * MS, 22 * MS, 32 * MS, 42 * MS, 52 * MS]);
        for dt in &offsets[1..] {
            assert_eq!((next.t0 + dt - 3 * MS).rem_euclid(10 * MS), 0);
        }
    }

    /// 超出运行时预测范围的采样被跳过，不终止会话
    #[test]
    fn test_out_of_window_samples_are_skipped() {
        let mut rig = Rig::new(RigOptions {
            control: TrackingControl::with_enabled(&[], 50 * MS),
            headset: SimulatedHeadsetConfig {
                lookahead: 20 * MS,
                ..Default::default()
            },
            ..Default::default()
        });

        let burst = rig.scheduler.step().unwrap().unwrap();
        assert_eq!(burst.samples, 6);
        assert_eq!(burst.emitted, 3);
        assert_eq!(burst.out_of_window, 3);
        assert_eq!(rig.recorded.tracking_offsets(START), vec![0, 10 * MS, 20 * MS]);

        // 远端预测仍有位姿但不再是 tracked
        let packets = rig.recorded.packets();
        assert!(!tracking(&packets[2])
            .view_flags
            .contains(ViewFlags::POSITION_TRACKED));
        assert_eq!(rig.scheduler.report().out_of_window, 3);
    }

    /// 多次触发只产生一个 RECENTERED 标记
    #[test]
    fn test_recenter_triggers_coalesce() {
        let mut rig = Rig::new(RigOptions {
            control: TrackingControl::with_enabled(&[], 20 * MS),
            ..Default::default()
        });
        for _ in 0..3 {
            rig.shared.recenter.trigger();
        }

        let burst = rig.scheduler.step().unwrap().unwrap();
        assert!(burst.recentered);
        let flags: Vec<_> = rig
            .recorded
            .packets()
            .iter()
            .map(|p| tracking(p).state_flags)
            .collect();
        assert_eq!(flags.len(), 3);
        assert_eq!(flags[0], StateFlags::RECENTERED);
        assert!(flags[1..].iter().all(|f| f.is_empty()));

        rig.recorded.clear();
        let burst = rig.scheduler.step().unwrap().unwrap();
        assert!(!burst.recentered);
        assert!(!rig.shared.recenter.is_pending());
        assert_eq!(rig.scheduler.report().recenters, 1);
    }

    /// 运行中修改对端控制与平台能力，下一次迭代即生效
    #[test]
    fn test_gating_follows_control_and_capabilities() {
        let mut rig = Rig::new(RigOptions {
            control: TrackingControl::with_enabled(
                &[ControlBit::LeftHand, ControlBit::RightHand, ControlBit::Face],
                0,
            ),
            ..Default::default()
        });

        rig.scheduler.step().unwrap();
        assert_eq!(
            rig.recorded.kinds(),
            vec![
                PacketKind::Tracking,
                PacketKind::Hand,
                PacketKind::Hand,
                PacketKind::Face
            ]
        );
        // 未开启控制器位时只有头部与眼动
        let packets = rig.recorded.packets();
        let devices: Vec<_> = tracking(&packets[0])
            .device_poses
            .iter()
            .map(|p| p.device)
            .collect();
        assert_eq!(devices, vec![DeviceId::Head, DeviceId::EyeGaze]);

        rig.recorded.clear();
        rig.shared
            .control
            .update(TrackingControl::with_enabled(&[ControlBit::RightHand], 0));
        rig.headset.set_hand_visible(HandSide::Right, false);
        rig.scheduler.step().unwrap();
        let packets = rig.recorded.packets();
        assert_eq!(packets.len(), 2);
        match &packets[1] {
            TelemetryPacket::Hand(hand) => {
                assert_eq!(hand.hand, HandSide::Right);
                assert!(hand.joints.is_none());
            }
            other => panic!("expected hand packet, got {:?}", other.kind()),
        }

        rig.recorded.clear();
        rig.capabilities.set(Capability::HandTracking, false);
        rig.capabilities.set(Capability::EyeGaze, false);
        rig.scheduler.step().unwrap();
        let packets = rig.recorded.packets();
        assert_eq!(rig.recorded.kinds(), vec![PacketKind::Tracking]);
        assert_eq!(tracking(&packets[0]).device_poses.len(), 1);
    }

    /// 时钟跳变：向前跳时 t0 追上当前时间；回退时 t0 不回退
    #[test]
    fn test_clock_jumps_keep_t0_monotonic() {
        let mut rig = Rig::new(RigOptions::default());
        rig.scheduler.step().unwrap();

        rig.clock.advance(500 * MS);
        let jumped = rig.scheduler.step().unwrap().unwrap();
        assert_eq!(jumped.t0, START + 500 * MS);
        assert_eq!(rig.clock.total_slept(), 0);

        rig.clock.set(START + 200 * MS);
        let regressed = rig.scheduler.step().unwrap().unwrap();
        assert_eq!(regressed.t0, START + 501 * MS);
        // 睡到 t0 前 100µs
        assert_eq!(rig.clock.total_slept(), 501 * MS - 200 * MS - 100_000);

        let produced: Vec<_> = rig
            .recorded
            .packets()
            .iter()
            .map(|p| tracking(p).production_timestamp)
            .collect();
        assert!(produced.windows(2).all(|w| w[0] < w[1]));
    }

    /// 电池按间隔轮询，且不计入忙碌时间
    #[test]
    fn test_battery_polled_on_interval() {
        let mut rig = Rig::new(RigOptions {
            control: TrackingControl::with_enabled(&[ControlBit::Battery], 0),
            send_cost: 200_000,
            ..Default::default()
        });

        let first = rig.scheduler.step().unwrap().unwrap();
        assert_eq!(first.busy, 200_000);
        rig.scheduler.step().unwrap();
        assert_eq!(rig.recorded.count(PacketKind::Battery), 1);

        rig.clock.advance(31_000 * MS);
        rig.scheduler.step().unwrap();

        let charges: Vec<_> = rig
            .recorded
            .packets()
            .into_iter()
            .filter_map(|p| match p {
                TelemetryPacket::Battery(b) => Some(b.charge),
                _ => None,
            })
            .collect();
        assert_eq!(charges.len(), 2);
        assert!((charges[0] - 0.9).abs() < 1e-6);
        assert!((charges[1] - 0.8).abs() < 1e-6);
        assert_eq!(rig.scheduler.report().battery_polls, 2);
    }

    /// 过载时下一轮窗口对齐额外跳过若干显示周期
    #[test]
    fn test_overload_skip_shifts_next_window() {
        let mut rig = Rig::new(RigOptions {
            control: TrackingControl::with_enabled(&[], 50 * MS),
            send_cost: 5 * MS,
            ..Default::default()
        });

        let first = rig.scheduler.step().unwrap().unwrap();
        assert_eq!(first.samples, 6);
        assert_eq!(first.busy, 30 * MS);
        assert_eq!(first.skip_samples, 2);
        assert_eq!(rig.scheduler.skip_samples(), 2);

        // 忙碌 30ms 后 t0 被钳到当前时间
        let second = rig.scheduler.step().unwrap().unwrap();
        assert_eq!(second.t0, START + 30 * MS);
        assert_eq!(
            rig.recorded.tracking_offsets(second.t0),
            vec![0, 30 * MS, 40 * MS, 50 * MS]
        );
        assert_eq!(second.samples, 4);
    }

    /// 发送耗时推高采样周期
    #[test]
    fn test_send_cost_slows_sampling() {
        let mut rig = Rig::new(RigOptions {
            send_cost: 600_000,
            ..Default::default()
        });

        let mut last = 0;
        for _ in 0..50 {
            last = rig.scheduler.step().unwrap().unwrap().next_period;
        }
        // 收敛到 5 × busy = 3ms
        assert!((last - 3 * MS).abs() < 50_000, "period {last}");
        assert_eq!(rig.scheduler.period(), last);
    }

    /// run() 在退出请求后返回完整报告
    #[test]
    fn test_run_until_exit() {
        let rig = Rig::new(RigOptions {
            exit_after: Some(10),
            ..Default::default()
        });
        let Rig {
            scheduler, shared, ..
        } = rig;

        let run = scheduler.run().unwrap();
        assert_eq!(run.report.iterations, 10);
        assert_eq!(run.report.packets, 10);
        assert_eq!(run.report.emitted, 10);
        assert_eq!(run.summary.total_bursts, 10);
        assert!(shared.lifecycle.teardown_reason().is_none());
    }

    /// 硬件致命错误：run() 返回错误并请求拆除会话
    #[test]
    fn test_fatal_error_tears_down_session() {
        let rig = Rig::new(RigOptions {
            fail_views_on: Some(3),
            ..Default::default()
        });
        let Rig {
            scheduler,
            shared,
            recorded,
            ..
        } = rig;

        let err = scheduler.run().unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::Hardware {
                source: contracts::HardwareError::SessionLost,
                ..
            }
        ));
        assert!(shared.lifecycle.is_exiting());
        let reason = shared.lifecycle.teardown_reason().unwrap();
        assert!(reason.contains("runtime session lost"), "{reason}");
        assert_eq!(recorded.count(PacketKind::Tracking), 2);
    }
}

#[cfg(test)]
mod config_tests {
    use std::sync::Arc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{Capabilities, Clock, DeviceId, DisplayTiming, PacketKind, TelemetryPacket};
    use device_sim::{ManualClock, SimulatedCapabilities, SimulatedHeadset, SimulatedHeadsetConfig};
    use tracking_engine::{Hardware, SamplingScheduler, StreamShared};

    use crate::fixtures::{Recorded, RecordingTransport, START};

    const HEADSET_TOML: &str = r#"
[headset]
name = "sim-quest"
eye_gaze = true
hand_tracking = true

[control]
enabled = ["left_aim", "right_grip", "left_hand"]
offset_ms = 0.0

[display]
refresh_rate_hz = 90.0

[simulation]
lookahead_ms = 100.0
"#;

    /// 配置 -> 蓝图 -> 调度器：设备集合由配置与能力共同决定
    #[test]
    fn test_blueprint_drives_scheduler() {
        let blueprint = ConfigLoader::load_from_str(HEADSET_TOML, ConfigFormat::Toml).unwrap();
        let clock = Arc::new(ManualClock::new(START));
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let headset = SimulatedHeadset::new(
            Arc::clone(&dyn_clock),
            SimulatedHeadsetConfig::from(&blueprint.simulation),
        );
        let shared = StreamShared::new(
            blueprint.control.to_tracking_control(),
            DisplayTiming::from_refresh_rate(blueprint.display.refresh_rate_hz),
        );
        let recorded = Recorded::default();
        let capabilities = SimulatedCapabilities::from_headset(&blueprint.headset);
        let hardware = Hardware {
            poses: Box::new(headset.clone()),
            hands: blueprint
                .headset
                .hand_tracking
                .then(|| Box::new(headset.clone()) as Box<dyn contracts::HandTracker>),
            face: None,
            battery: None,
            capabilities: Arc::new(capabilities) as Arc<dyn Capabilities>,
        };
        let transport = RecordingTransport {
            clock: Arc::clone(&clock),
            recorded: recorded.clone(),
            cost: 0,
            exit_after: Some((8, Arc::clone(&shared.lifecycle))),
        };

        let scheduler = SamplingScheduler::new(
            &blueprint.tracking,
            dyn_clock,
            hardware,
            Box::new(transport),
            shared,
        );
        let run = scheduler.run().unwrap();

        assert_eq!(run.report.iterations, 4);
        assert_eq!(recorded.count(PacketKind::Tracking), 4);
        assert_eq!(recorded.count(PacketKind::Hand), 4);
        let packets = recorded.packets();
        let TelemetryPacket::Tracking(first) = &packets[0] else {
            panic!("first packet must be tracking");
        };
        let devices: Vec<_> = first.device_poses.iter().map(|p| p.device).collect();
        assert_eq!(
            devices,
            vec![
                DeviceId::Head,
                DeviceId::LeftAim,
                DeviceId::RightGrip,
                DeviceId::EyeGaze
            ]
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use contracts::{
        Clock, DisplayTiming, PacketKind, SchedulerConfig, SinkConfig, SinkType, TelemetryPacket,
        TrackingControl,
    };
    use device_sim::{
        ManualClock, SimulatedBattery, SimulatedCapabilities, SimulatedHeadset,
        SimulatedHeadsetConfig,
    };
    use dispatcher::{create_dispatcher, ChannelTransport};
    use tracking_engine::{Hardware, SamplingScheduler, StreamShared};

    use crate::fixtures::{full_headset, START};

    /// End-to-end: SamplingScheduler -> ChannelTransport -> Dispatcher -> FileSink
    ///
    /// 调度器释放后 transport 关闭，分发器排空并关闭 sink。
    #[tokio::test]
    async fn test_e2e_scheduler_to_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let mut params = HashMap::new();
        params.insert("base_path".to_string(), dir.path().display().to_string());
        params.insert("file_name".to_string(), "session.jsonl".to_string());
        let sinks = vec![
            SinkConfig {
                name: "file".to_string(),
                sink_type: SinkType::File,
                queue_capacity: 256,
                params,
            },
            SinkConfig {
                name: "log".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 256,
                params: HashMap::new(),
            },
        ];

        let (transport, rx) = ChannelTransport::channel(256);
        let dropped = transport.dropped_counter();
        let dispatcher = create_dispatcher(sinks, rx).await.unwrap().spawn();

        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(START));
        let headset = SimulatedHeadset::new(Arc::clone(&clock), SimulatedHeadsetConfig::default());
        let hardware = Hardware {
            poses: Box::new(headset.clone()),
            hands: Some(Box::new(headset.clone())),
            face: Some(Box::new(headset)),
            battery: Some(Box::new(SimulatedBattery::new(1.0, 0.01))),
            capabilities: Arc::new(SimulatedCapabilities::from_headset(&full_headset())),
        };
        let shared = StreamShared::new(TrackingControl::all_enabled(0), DisplayTiming::new(11_111_111));
        let mut scheduler = SamplingScheduler::new(
            &SchedulerConfig::default(),
            clock,
            hardware,
            Box::new(transport),
            shared,
        );

        for _ in 0..5 {
            scheduler.step().unwrap();
        }
        let sent = scheduler.report().packets + scheduler.report().battery_polls;
        assert_eq!(sent, 21);
        drop(scheduler);

        let report = dispatcher.await.unwrap();
        assert_eq!(dropped.load(Ordering::Relaxed), 0);
        assert_eq!(report.len(), 2);
        for (name, metrics) in &report {
            assert_eq!(metrics.written, 21, "sink {name}");
            assert_eq!(metrics.failed, 0);
            assert_eq!(metrics.dropped, 0);
        }

        let content = std::fs::read_to_string(dir.path().join("session.jsonl")).unwrap();
        let packets: Vec<TelemetryPacket> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(packets.len(), 21);
        assert_eq!(packets[0].kind(), PacketKind::Tracking);
        assert_eq!(packets[4].kind(), PacketKind::Battery);
        assert_eq!(
            packets
                .iter()
                .filter(|p| p.kind() == PacketKind::Tracking)
                .count(),
            5
        );
    }
}
