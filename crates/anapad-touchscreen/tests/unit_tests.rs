//! Touchscreen controller against a simulated GT9110.

use std::io::Write as _;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anapad_errors::{AnapadError, ErrorSeverity, ProtocolError};
use anapad_polling::{LifecycleState, TouchPresence};
use anapad_test_helpers::prelude::*;
use anapad_touchscreen::prelude::*;
use anapad_touchscreen::{CONFIGURATION_LEN, TOUCH_ADDRESS};

const BUS: u8 = 1;
const RES_X: u16 = 1920;
const RES_Y: u16 = 515;

struct Rig {
    bus: SimulatedBus,
    chip: Gt9110Sim,
    provider: Arc<SimulatedBusProvider>,
}

fn rig() -> Rig {
    rig_with_resolution(RES_X, RES_Y)
}

fn rig_with_resolution(x: u16, y: u16) -> Rig {
    let bus = SimulatedBus::new();
    let chip = Gt9110Sim::new(x, y);
    bus.add_device(TOUCH_ADDRESS, chip.clone());
    let provider = Arc::new(SimulatedBusProvider::new().with_bus(BUS, bus.clone()));
    Rig {
        bus,
        chip,
        provider,
    }
}

fn config() -> TouchscreenConfig {
    must(
        TouchscreenConfig::builder()
            .bus_index(BUS)
            .idle_poll_interval_ms(1)
            .build(),
    )
}

fn record(id: u8, x: u16, y: u16, size: u16) -> [u8; 8] {
    let [x_lo, x_hi] = x.to_le_bytes();
    let [y_lo, y_hi] = y.to_le_bytes();
    let [s_lo, s_hi] = size.to_le_bytes();
    [id, x_lo, x_hi, y_lo, y_hi, s_lo, s_hi, 0]
}

fn block(version: u8) -> TouchscreenConfiguration {
    let mut bytes = vec![version; 4];
    bytes.resize(CONFIGURATION_LEN, 0x11);
    must(TouchscreenConfiguration::from_bytes(&bytes))
}

fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

#[test]
fn start_reads_and_announces_resolution() {
    let rig = rig();
    let mut controller = TouchscreenController::new(config(), rig.provider.clone());
    let resolutions = controller.subscribe_resolution();
    assert_eq!(controller.resolution(), None);

    must(controller.start());
    assert_eq!(controller.state(), LifecycleState::Running);
    assert_eq!(controller.resolution(), Some(Resolution::new(RES_X, RES_Y)));
    assert_eq!(
        must(resolutions.recv_timeout(Duration::from_secs(1))),
        Resolution::new(RES_X, RES_Y)
    );
    must(controller.stop());
}

#[test]
fn frames_are_decoded_and_published() {
    let rig = rig();
    let mut controller = TouchscreenController::new(config(), rig.provider.clone());
    let touches = controller.subscribe_touches();
    let signal = controller.touch_signal();
    must(controller.start());

    rig.chip.push_frame(vec![record(3, 0x10, 0x20, 44), record(4, 1000, 500, 12)]);
    let frame = must(touches.recv_timeout(Duration::from_secs(2)));
    assert_eq!(
        frame.as_slice(),
        [
            Touch {
                id: 3,
                x: 1920 - 0x10,
                y: 515 - 0x20,
                size: 44
            },
            Touch {
                id: 4,
                x: 920,
                y: 15,
                size: 12
            },
        ]
    );
    assert!(signal.touch_present());
    assert_eq!(controller.latest_touches().map(|t| t.len()), Some(2));

    // All fingers lifted.
    rig.chip.push_frame(Vec::new());
    let frame = must(touches.recv_timeout(Duration::from_secs(2)));
    assert!(frame.is_empty());
    assert!(wait_for(|| !signal.touch_present()));

    must(controller.stop());
}

#[test]
fn lift_reaches_a_backed_up_subscriber() {
    let rig = rig();
    let config = must(
        TouchscreenConfig::builder()
            .bus_index(BUS)
            .idle_poll_interval_ms(1)
            .listener_capacity(1)
            .build(),
    );
    let mut controller = TouchscreenController::new(config, rig.provider.clone());
    let touches = controller.subscribe_touches();
    must(controller.start());

    rig.chip.push_frame(vec![record(0, 10, 10, 5)]);
    rig.chip.push_frame(vec![record(0, 20, 20, 5)]);
    rig.chip.push_frame(Vec::new());
    thread::sleep(Duration::from_millis(20));

    let mut lifted = false;
    while let Ok(frame) = touches.recv_timeout(Duration::from_secs(2)) {
        if frame.is_empty() {
            lifted = true;
            break;
        }
    }
    assert!(lifted);
    must(controller.stop());
}

#[test]
fn not_ready_reads_are_not_failures() {
    let rig = rig();
    let mut controller = TouchscreenController::new(
        must(TouchscreenConfig::builder().bus_index(BUS).failure_threshold(1).build()),
        rig.provider.clone(),
    );
    let failures = controller.subscribe_failures();
    let touches = controller.subscribe_touches();
    must(controller.start());

    thread::sleep(Duration::from_millis(20));
    assert!(failures.try_recv().is_err());
    assert!(touches.try_recv().is_err());
    assert_eq!(controller.state(), LifecycleState::Running);
    // Only the initial trigger; nothing was ready to acknowledge.
    assert_eq!(rig.chip.triggers(), 1);
    must(controller.stop());
}

#[test]
fn each_ready_frame_is_acknowledged() {
    let rig = rig();
    let mut controller = TouchscreenController::new(config(), rig.provider.clone());
    let touches = controller.subscribe_touches();
    must(controller.start());

    for id in 0..3 {
        rig.chip.push_frame(vec![record(id, 1, 1, 1)]);
        let frame = must(touches.recv_timeout(Duration::from_secs(2)));
        assert_eq!(frame.first().map(|t| t.id), Some(id));
    }
    assert_eq!(rig.chip.triggers(), 4);
    must(controller.stop());
}

#[test]
fn differing_configuration_is_programmed_with_checksum() {
    let rig = rig();
    let desired = block(0x42);
    let mut controller = TouchscreenController::new(config(), rig.provider.clone());
    controller.set_desired_configuration(Some(desired.clone()));
    let changes = controller.subscribe_configuration_changes();
    must(controller.start());

    assert_eq!(rig.chip.registers(0x8047, 184), desired.as_bytes());
    assert_eq!(rig.chip.registers(0x80FF, 2), [desired.checksum(), 0x01]);
    assert_eq!(must(changes.recv_timeout(Duration::from_secs(1))), desired);
    must(controller.stop());
}

#[test]
fn matching_configuration_is_left_alone() {
    let rig = rig();
    let desired = block(0x42);
    rig.chip.set_configuration(desired.as_bytes());
    let mut controller = TouchscreenController::new(config(), rig.provider.clone());
    controller.set_desired_configuration(Some(desired));
    let changes = controller.subscribe_configuration_changes();
    must(controller.start());

    assert!(changes.try_recv().is_err());
    assert!(
        rig.bus
            .writes_to(TOUCH_ADDRESS)
            .iter()
            .all(|write| write.len() <= 3)
    );
    must(controller.stop());
}

#[test]
fn configuration_loads_from_file() {
    let rig = rig();
    let desired = block(0x7A);
    let mut file = must(tempfile::NamedTempFile::new());
    must(file.write_all(desired.as_bytes()));

    let config = must(
        TouchscreenConfig::builder()
            .bus_index(BUS)
            .idle_poll_interval_ms(1)
            .configuration_path(file.path())
            .build(),
    );
    let mut controller = TouchscreenController::new(config, rig.provider.clone());
    must(controller.start());
    assert_eq!(rig.chip.registers(0x8047, 4), [0x7A; 4]);
    must(controller.stop());
}

#[test]
fn truncated_configuration_file_fails_before_opening_the_bus() {
    let rig = rig();
    let mut file = must(tempfile::NamedTempFile::new());
    must(file.write_all(&[0u8; 100]));

    let config = must(
        TouchscreenConfig::builder()
            .bus_index(BUS)
            .configuration_path(file.path())
            .build(),
    );
    let mut controller = TouchscreenController::new(config, rig.provider.clone());
    assert!(matches!(
        controller.start(),
        Err(AnapadError::Protocol(ProtocolError::ConfigurationLength {
            expected: 184,
            actual: 100
        }))
    ));
    assert_eq!(rig.provider.open_count(), 0);
    assert_eq!(controller.state(), LifecycleState::Stopped);
}

#[test]
fn zero_resolution_fails_start_and_closes_bus() {
    let rig = rig_with_resolution(0, 515);
    let mut controller = TouchscreenController::new(config(), rig.provider.clone());
    assert!(matches!(
        controller.start(),
        Err(AnapadError::Protocol(ProtocolError::InvalidResolution { x: 0, y: 515 }))
    ));
    assert_eq!(rig.bus.close_count(), 1);
    assert!(!controller.is_running());
}

#[test]
fn start_twice_and_stop_twice() {
    let rig = rig();
    let mut controller = TouchscreenController::new(config(), rig.provider.clone());
    must(controller.start());
    assert!(matches!(
        controller.start(),
        Err(AnapadError::AlreadyRunning(_))
    ));
    must(controller.stop());
    must(controller.stop());
    assert_eq!(rig.bus.close_count(), 1);
    assert_eq!(controller.state(), LifecycleState::Stopped);
}

#[test]
fn stop_clears_the_touch_signal() {
    let rig = rig();
    let mut controller = TouchscreenController::new(config(), rig.provider.clone());
    let touches = controller.subscribe_touches();
    let signal = controller.touch_signal();
    must(controller.start());
    rig.chip.push_frame(vec![record(1, 5, 5, 5)]);
    must(touches.recv_timeout(Duration::from_secs(2)));
    assert!(signal.touch_present());

    must(controller.stop());
    assert!(!signal.touch_present());
}

#[test]
fn sustained_failure_notifies_once_and_stops_polling() {
    let rig = rig();
    let mut controller = TouchscreenController::new(
        must(TouchscreenConfig::builder().bus_index(BUS).failure_threshold(5).build()),
        rig.provider.clone(),
    );
    let failures = controller.subscribe_failures();
    must(controller.start());

    rig.bus.set_failing(true);
    let failure = must(failures.recv_timeout(Duration::from_secs(2)));
    assert_eq!(failure.subsystem, "touchscreen");
    assert_eq!(failure.consecutive_failures, 6);
    assert_eq!(failure.severity, ErrorSeverity::Error);
    assert!(wait_for(|| controller.state() == LifecycleState::Failed));

    let attempts = rig.bus.transaction_count();
    thread::sleep(Duration::from_millis(30));
    assert_eq!(rig.bus.transaction_count(), attempts);
    assert!(failures.try_recv().is_err());
    assert!(!controller.touch_signal().touch_present());

    must(controller.stop());
    assert_eq!(controller.state(), LifecycleState::Stopped);
}

#[test]
fn a_success_resets_the_failure_count() {
    let rig = rig();
    let mut controller = TouchscreenController::new(
        must(
            TouchscreenConfig::builder()
                .bus_index(BUS)
                .idle_poll_interval_ms(1)
                .failure_threshold(5)
                .build(),
        ),
        rig.provider.clone(),
    );
    let failures = controller.subscribe_failures();
    must(controller.start());

    rig.bus.fail_next(5);
    thread::sleep(Duration::from_millis(30));
    rig.bus.fail_next(5);
    thread::sleep(Duration::from_millis(30));
    assert!(failures.try_recv().is_err());
    assert_eq!(controller.state(), LifecycleState::Running);

    rig.bus.set_failing(true);
    let failure = must(failures.recv_timeout(Duration::from_secs(2)));
    assert_eq!(failure.consecutive_failures, 6);
    must(controller.stop());
}

#[test]
fn missing_bus_fails_start() {
    let provider = Arc::new(SimulatedBusProvider::new());
    let mut controller = TouchscreenController::new(config(), provider);
    assert!(matches!(controller.start(), Err(AnapadError::Bus(_))));
    assert_eq!(controller.state(), LifecycleState::Stopped);
}

#[test]
fn config_deserializes_with_defaults() {
    let config: TouchscreenConfig =
        must(serde_json::from_str(r#"{ "bus_index": 2, "idle_poll_interval_ms": 3 }"#));
    assert_eq!(config.bus_index, 2);
    assert_eq!(config.address, TOUCH_ADDRESS);
    assert_eq!(config.configuration_path, None);
    assert_eq!(config.idle_poll_interval_ms, 3);
}
