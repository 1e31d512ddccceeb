//! Device lifecycle: configure, capture, suspend/resume, power-off, teardown.
//!
//! All timing is driven explicitly through `on_interrupt(now)` and
//! `on_flush_timer(now)`, so these tests never sleep.

#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

mod common;

use common::{at, config_words, Access, Rig};
use ir_receiver::registers::{REG1_ENABLE, REG1_POL};
use ir_receiver::{
    DeviceState, Error, HardwareVariant, RateDivisor, RawEvent, ReceiverConfig, Register,
    TimeoutUs,
};

#[test]
fn variant_a_configures_raw_capture_in_reg1() {
    let rig = Rig::configured("variant-A", 125_000);

    assert_eq!(rig.device.state(), DeviceState::Armed);
    assert_eq!(rig.device.variant(), Some(HardwareVariant::ModeFieldInRegister1));
    // mode RAW in bits 8:7, rise+fall irq select, decoder enabled
    assert_eq!(rig.regs.word(Register::Reg1), 0x8104);
    assert_eq!(rig.regs.word(Register::Reg0), 9);
    assert!(!rig.regs.touched(Register::Reg2));
    assert!(rig.irq.is_enabled());
    assert!(rig.sink.events().is_empty(), "configure emits nothing");
}

#[test]
fn gxbb_configures_mode_in_reg2() {
    let rig = Rig::configured("amlogic,meson-gxbb-ir", 125_000);
    assert_eq!(rig.device.variant(), Some(HardwareVariant::ModeFieldInRegister2));
    assert_eq!(rig.regs.word(Register::Reg2) & 0xF, 0x2);
    assert_eq!(rig.regs.word(Register::Reg1), 0x8004);
}

#[test]
fn configure_applies_polarity_rate_and_timeout() {
    let rig = Rig::new();
    let config = ReceiverConfig::new("amlogic,meson8b-ir")
        .with_pulse_inverted(true)
        .with_rate(RateDivisor::new(19).unwrap())
        .with_timeout(TimeoutUs::new(90_000).unwrap());
    rig.device.configure(&config).unwrap();

    assert_eq!(rig.regs.word(Register::Reg1) & REG1_POL, REG1_POL);
    assert_eq!(rig.regs.word(Register::Reg0), 19);
    assert_eq!(rig.device.timeout().get(), 90_000);
}

#[test]
fn configure_clears_latched_status_and_frame_after_programming() {
    let rig = Rig::configured("variant-B", 125_000);
    let log = rig.regs.accesses();
    let frame = log
        .iter()
        .rposition(|access| *access == Access::Read(Register::Frame))
        .unwrap();
    assert_eq!(log[frame - 1], Access::Read(Register::Status));
    assert!(
        log[frame..].iter().all(|access| matches!(access, Access::Read(_))),
        "no register written after the latches are cleared"
    );
    // Arming drains STATUS once more, without emitting.
    assert_eq!(log.last(), Some(&Access::Read(Register::Status)));
    assert!(rig.sink.events().is_empty());
}

#[test]
fn unknown_identity_touches_no_register() {
    let rig = Rig::new();
    let err = rig
        .device
        .configure(&ReceiverConfig::new("unknown-device"))
        .unwrap_err();

    assert_eq!(err, Error::UnsupportedVariant);
    assert!(rig.regs.accesses().is_empty());
    assert_eq!(rig.device.state(), DeviceState::Unconfigured);
    assert_eq!(rig.irq.enables(), 0);
}

#[test]
fn stuck_enable_bit_fails_configure_without_arming() {
    let rig = Rig::new();
    rig.regs.set_stuck(Register::Reg1, REG1_ENABLE);

    let err = rig
        .device
        .configure(&ReceiverConfig::new("variant-A"))
        .unwrap_err();

    assert_eq!(
        err,
        Error::RegisterVerifyFailed {
            register: Register::Reg1,
            expected: REG1_ENABLE,
            actual: 0,
        }
    );
    assert_eq!(rig.device.state(), DeviceState::Unconfigured);
    assert!(!rig.irq.is_enabled());
    assert_eq!(rig.device.snapshot(), None);

    rig.edge(0, true);
    assert!(rig.sink.events().is_empty());
}

#[test]
fn two_edges_then_quiet_line_closes_the_frame() {
    let rig = Rig::configured("variant-A", 125_000);

    rig.edge(0, true);
    rig.edge(50, false);

    // The timer scheduled by the first edge is stale by now.
    assert_eq!(rig.device.on_flush_timer(at(125_000)), Some(at(125_050)));
    assert_eq!(rig.sink.timeouts(), 0);

    assert_eq!(rig.device.on_flush_timer(at(125_050)), None);
    assert_eq!(
        rig.sink.events(),
        [
            RawEvent::Edge { level: true },
            RawEvent::Edge { level: false },
            RawEvent::Timeout,
        ]
    );

    // Nothing pending: further expiries are silent.
    assert_eq!(rig.device.on_flush_timer(at(500_000)), None);
    assert_eq!(rig.sink.timeouts(), 1);
}

#[test]
fn repeated_level_is_still_an_edge() {
    let rig = Rig::configured("variant-B", 1_000);
    rig.edge(0, false);
    rig.edge(10, false);
    assert_eq!(
        rig.sink.events(),
        [RawEvent::Edge { level: false }, RawEvent::Edge { level: false }]
    );
}

#[test]
fn set_timeout_applies_from_next_edge() {
    let rig = Rig::configured("variant-A", 125_000);
    rig.edge(0, true);
    rig.device.set_timeout(TimeoutUs::new(1_000).unwrap()).unwrap();
    rig.edge(10, false);

    assert_eq!(rig.device.on_flush_timer(at(1_009)), Some(at(1_010)));
    assert_eq!(rig.device.on_flush_timer(at(1_010)), None);
    assert_eq!(rig.sink.timeouts(), 1);
}

#[test]
fn snapshot_records_configured_registers() {
    let rig = Rig::new();
    rig.regs.preload(Register::LdrActive, 0x01F4_0190);
    rig.regs.preload(Register::Bit0, 0x0032_0028);
    rig.device
        .configure(&ReceiverConfig::new("variant-A"))
        .unwrap();

    let snap = rig.device.snapshot().unwrap();
    assert_eq!(snap.reg1, 0x8104);
    assert_eq!(snap.leader_active, 0x01F4_0190);
    assert_eq!(snap.bit0, 0x0032_0028);
}

#[test]
fn suspend_hands_line_to_nec_decoder() {
    let rig = Rig::configured("variant-A", 125_000);
    rig.device.suspend().unwrap();

    assert_eq!(rig.device.state(), DeviceState::Suspended);
    let reg1 = rig.regs.word(Register::Reg1);
    assert_eq!(reg1 & 0x0180, 0, "mode field back to NEC");
    assert_eq!(reg1 & REG1_ENABLE, REG1_ENABLE, "decoder stays enabled for wake");
    assert_eq!(rig.regs.word(Register::Reg0), 0x13);
    assert!(!rig.irq.is_enabled());
}

/// Suspending right after an edge must not cut the quiet window short.
#[test]
fn suspend_right_after_an_edge_emits_no_timeout() {
    let rig = Rig::configured("variant-B", 125_000);
    rig.edge(0, true);
    rig.device.suspend().unwrap();
    assert_eq!(rig.sink.events(), [RawEvent::Edge { level: true }]);
}

#[test]
fn open_frame_closes_on_schedule_while_suspended() {
    let rig = Rig::configured("variant-B", 125_000);
    rig.edge(0, true);
    rig.device.suspend().unwrap();

    // Masked line: anything reported now is ignored.
    rig.edge(10, false);
    assert_eq!(rig.device.on_flush_timer(at(124_999)), Some(at(125_000)));
    assert_eq!(rig.sink.timeouts(), 0);

    assert_eq!(rig.device.on_flush_timer(at(125_000)), None);
    assert_eq!(
        rig.sink.events(),
        [RawEvent::Edge { level: true }, RawEvent::Timeout]
    );
    assert_eq!(rig.device.on_flush_timer(at(1_000_000)), None);
    assert_eq!(rig.sink.timeouts(), 1);
}

#[test]
fn frame_left_open_across_resume_still_closes_once() {
    let rig = Rig::configured("variant-A", 125_000);
    rig.edge(0, false);
    rig.device.suspend().unwrap();
    rig.device.resume().unwrap();

    assert_eq!(rig.device.on_flush_timer(at(125_000)), None);
    assert_eq!(rig.sink.timeouts(), 1);
    rig.edge(200_000, true);
    assert_eq!(rig.device.on_flush_timer(at(325_000)), None);
    assert_eq!(
        rig.sink.events(),
        [
            RawEvent::Edge { level: false },
            RawEvent::Timeout,
            RawEvent::Edge { level: true },
            RawEvent::Timeout,
        ]
    );
}

#[test]
fn suspend_resume_is_bit_identical() {
    let rig = Rig::new();
    rig.regs.preload(Register::LdrActive, 0x0123_4567);
    rig.regs.preload(Register::LdrIdle, 0x0089_ABCD);
    rig.regs.preload(Register::LdrRepeat, 0x0044_0022);
    rig.regs.preload(Register::Bit0, 0x0011_0033);
    rig.device
        .configure(&ReceiverConfig::new("amlogic,meson-gxbb-ir").with_pulse_inverted(true))
        .unwrap();
    let before = config_words(&rig.regs);

    rig.device.suspend().unwrap();
    // Firmware reuses the timing registers while the system sleeps.
    rig.regs.preload(Register::LdrIdle, 0xDEAD_BEEF);
    rig.regs.preload(Register::Bit0, 0);
    rig.device.resume().unwrap();

    assert_eq!(config_words(&rig.regs), before);
    assert_eq!(rig.regs.word(Register::Reg2) & 0xF, 0x2, "raw mode restored");
    assert_eq!(rig.device.state(), DeviceState::Armed);
    assert!(rig.irq.is_enabled());

    rig.edge(5, true);
    assert_eq!(rig.sink.events(), [RawEvent::Edge { level: true }]);
}

#[test]
fn lifecycle_calls_in_the_wrong_state_are_rejected() {
    let rig = Rig::new();
    assert_eq!(
        rig.device.suspend(),
        Err(Error::InvalidState(DeviceState::Unconfigured))
    );
    assert_eq!(
        rig.device.resume(),
        Err(Error::InvalidState(DeviceState::Unconfigured))
    );

    rig.device
        .configure(&ReceiverConfig::new("variant-A"))
        .unwrap();
    assert_eq!(
        rig.device.configure(&ReceiverConfig::new("variant-A")),
        Err(Error::InvalidState(DeviceState::Armed))
    );
    assert_eq!(
        rig.device.resume(),
        Err(Error::InvalidState(DeviceState::Armed))
    );

    rig.device.suspend().unwrap();
    assert_eq!(
        rig.device.suspend(),
        Err(Error::InvalidState(DeviceState::Suspended))
    );
}

#[test]
fn power_off_programs_wake_decode_from_armed_or_suspended() {
    let rig = Rig::configured("amlogic,meson8b-ir", 125_000);
    rig.edge(0, false);
    rig.device.prepare_power_off().unwrap();

    assert_eq!(rig.regs.word(Register::Reg2) & 0xF, 0x0);
    assert_eq!(rig.regs.word(Register::Reg0), 0x13);
    assert_eq!(rig.sink.timeouts(), 0);
    assert_eq!(rig.device.state(), DeviceState::Suspended);

    // Again from Suspended: reapplied, the open frame untouched.
    rig.regs.preload(Register::Reg0, 0);
    rig.device.prepare_power_off().unwrap();
    assert_eq!(rig.regs.word(Register::Reg0), 0x13);
    assert_eq!(rig.sink.timeouts(), 0);
    assert_eq!(rig.device.on_flush_timer(at(125_000)), None);
    assert_eq!(rig.sink.timeouts(), 1);
}

#[test]
fn resume_verify_failure_stays_suspended_and_masked() {
    let rig = Rig::configured("variant-A", 125_000);
    rig.device.suspend().unwrap();
    let enables = rig.irq.enables();

    // The enable bit drops and stops accepting writes while asleep.
    rig.regs.preload(Register::Reg1, rig.regs.word(Register::Reg1) & !REG1_ENABLE);
    rig.regs.set_stuck(Register::Reg1, REG1_ENABLE);

    assert_eq!(
        rig.device.resume(),
        Err(Error::RegisterVerifyFailed {
            register: Register::Reg1,
            expected: REG1_ENABLE,
            actual: 0,
        })
    );
    assert_eq!(rig.device.state(), DeviceState::Suspended);
    assert!(!rig.irq.is_enabled());
    assert_eq!(rig.irq.enables(), enables);

    rig.edge(10, true);
    assert!(rig.sink.events().is_empty());
}

#[test]
fn set_timeout_before_configure_is_rejected() {
    let rig = Rig::new();
    assert_eq!(
        rig.device.set_timeout(TimeoutUs::new(1_000).unwrap()),
        Err(Error::InvalidState(DeviceState::Unconfigured))
    );
    rig.device
        .configure(&ReceiverConfig::new("variant-A"))
        .unwrap();
    assert_eq!(rig.device.timeout(), TimeoutUs::DEFAULT);
}

#[tokio::test]
async fn teardown_disables_decoder_and_stops_events() {
    let rig = Rig::configured("variant-A", 125_000);
    rig.edge(0, true);

    rig.device
        .teardown(embassy_time::Duration::from_millis(10))
        .await
        .unwrap();

    assert_eq!(rig.device.state(), DeviceState::Removed);
    assert_eq!(rig.regs.word(Register::Reg1) & REG1_ENABLE, 0);
    assert!(!rig.irq.is_enabled());

    rig.edge(10, false);
    assert_eq!(rig.device.on_flush_timer(at(125_000)), None);
    assert_eq!(rig.sink.events(), [RawEvent::Edge { level: true }]);

    // Terminal state.
    assert_eq!(
        rig.device.configure(&ReceiverConfig::new("variant-A")),
        Err(Error::InvalidState(DeviceState::Removed))
    );
    assert_eq!(
        rig.device.prepare_power_off(),
        Err(Error::InvalidState(DeviceState::Removed))
    );
    assert_eq!(
        rig.device.set_timeout(TimeoutUs::DEFAULT),
        Err(Error::InvalidState(DeviceState::Removed))
    );
}

#[tokio::test]
async fn teardown_twice_is_a_no_op() {
    let rig = Rig::configured("variant-B", 125_000);
    let bound = embassy_time::Duration::from_millis(10);
    rig.device.teardown(bound).await.unwrap();
    rig.regs.clear_log();

    rig.device.teardown(bound).await.unwrap();
    assert!(rig.regs.accesses().is_empty());
    assert_eq!(rig.irq.disables(), 1);
}

#[tokio::test]
async fn teardown_before_configure_leaves_registers_alone() {
    let rig = Rig::new();
    rig.device
        .teardown(embassy_time::Duration::from_millis(10))
        .await
        .unwrap();
    assert!(rig.regs.accesses().is_empty());
    assert_eq!(rig.device.state(), DeviceState::Removed);
}

#[tokio::test]
async fn into_parts_only_after_teardown() {
    let rig = Rig::configured("variant-A", 125_000);
    let device = match rig.device.into_parts() {
        Ok(_) => panic!("parts released while armed"),
        Err(device) => device,
    };

    device
        .teardown(embassy_time::Duration::from_millis(10))
        .await
        .unwrap();
    let (regs, irq, sink) = device.into_parts().ok().unwrap();
    assert_eq!(regs.word(Register::Reg1) & REG1_ENABLE, 0);
    assert!(!irq.is_enabled());
    assert!(sink.events().is_empty());
}

#[test]
fn with_registers_and_with_sink_run_under_the_lock() {
    let rig = Rig::configured("variant-A", 125_000);
    let reg0 = rig.device.with_registers(|regs| regs.read(Register::Reg0));
    assert_eq!(reg0, 9);

    rig.edge(0, true);
    let seen = rig.device.with_sink(|sink| sink.events().len());
    assert_eq!(seen, 1);
}
