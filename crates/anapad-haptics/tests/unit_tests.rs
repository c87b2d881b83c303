//! Haptics board controller against a simulated bus.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anapad_errors::AnapadError;
use anapad_haptics::prelude::*;
use anapad_haptics::{DRIVER_ADDRESS, EXPANDER_ADDRESSES};
use anapad_i2c::RegisterWidth;
use anapad_polling::LifecycleState;
use anapad_test_helpers::prelude::*;

const BUS: u8 = 3;

const MODE: u16 = 0x01;
const RTP_INPUT: u16 = 0x02;
const OUTPUT: u16 = 0x01;
const CONFIGURATION: u16 = 0x03;

struct Rig {
    bus: SimulatedBus,
    expanders: Vec<RegisterFile>,
    driver: RegisterFile,
    provider: Arc<SimulatedBusProvider>,
}

impl Rig {
    fn outputs(&self) -> Vec<u8> {
        self.expanders.iter().map(|e| e.get(OUTPUT)).collect()
    }
}

fn rig() -> Rig {
    let bus = SimulatedBus::new();
    let expanders: Vec<RegisterFile> = EXPANDER_ADDRESSES
        .iter()
        .map(|&address| {
            let file = RegisterFile::new(RegisterWidth::Bits8);
            // Power-on state: all inputs.
            file.set(CONFIGURATION, 0xFF);
            bus.add_device(address, file.clone());
            file
        })
        .collect();
    let driver = RegisterFile::new(RegisterWidth::Bits8);
    bus.add_device(DRIVER_ADDRESS, driver.clone());
    let provider = Arc::new(SimulatedBusProvider::new().with_bus(BUS, bus.clone()));
    Rig {
        bus,
        expanders,
        driver,
        provider,
    }
}

fn started(rig: &Rig) -> HapticsBoardController {
    let config = must(HapticsConfig::builder().bus_index(BUS).build());
    let mut controller = HapticsBoardController::new(config, rig.provider.clone());
    must(controller.start());
    controller
}

fn reference(text: &str) -> Reference {
    must(text.parse())
}

#[test]
fn start_configures_expanders_and_driver() {
    let rig = rig();
    let mut controller = started(&rig);
    assert_eq!(controller.state(), LifecycleState::Running);

    for expander in &rig.expanders {
        assert_eq!(expander.get(CONFIGURATION), 0x00);
        assert_eq!(expander.get(OUTPUT), 0x00);
    }
    assert_eq!(rig.driver.get(MODE), 0x05);
    assert_eq!(rig.driver.get(RTP_INPUT), 0x00);
    assert_eq!(rig.driver.get(0x17), 0xFF);
    assert_eq!(rig.driver.get(0x1A) & 0x80, 0x80);
    assert_eq!(rig.driver.get(0x1D) & 0x01, 0x01);

    must(controller.stop());
}

#[test]
fn actuates_exactly_the_actuators_in_range() {
    let rig = rig();
    let mut controller = started(&rig);

    // C3 sits at (380, 258); its diagonal neighbours are 175.6 px away and
    // A3, E3, C1, C5 are 198 px or more.
    let on = must(controller.set_lras_within(Location::new(380.0, 258.0), 180.0, 100));
    let refs: HashSet<String> = on.iter().map(|a| a.reference.to_string()).collect();
    let expected: HashSet<String> = ["C3", "B2", "D2", "B4", "D4"]
        .iter()
        .map(|s| (*s).to_string())
        .collect();
    assert_eq!(refs, expected);
    assert!(refs.contains("C3"));

    for actuator in must(controller.actuators()) {
        assert_eq!(actuator.enabled, refs.contains(&actuator.reference.to_string()));
        let output = rig.outputs().get(actuator.expander).copied().unwrap_or(0);
        assert_eq!(output & (1 << actuator.port) != 0, actuator.enabled);
    }
    assert_eq!(rig.driver.get(RTP_INPUT), 100);
    assert_eq!(rig.driver.get(MODE), 0x05);

    must(controller.stop());
}

#[test]
fn boundary_is_inclusive() {
    let rig = rig();
    let mut controller = started(&rig);
    // A1 (90, 60) and C1 (380, 60) are exactly 290 apart.
    let on = must(controller.set_lras_within(Location::new(90.0, 60.0), 290.0, 50));
    let refs: Vec<String> = on.iter().map(|a| a.reference.to_string()).collect();
    assert!(refs.contains(&"C1".to_string()));
    must(controller.stop());
}

#[test]
fn unchanged_expanders_are_not_rewritten() {
    let rig = rig();
    let mut controller = started(&rig);
    let here = Location::new(90.0, 60.0);
    must(controller.set_lras_within(here, 1.0, 80));

    rig.bus.clear_log();
    must(controller.set_lras_within(here, 1.0, 90));
    for &address in &EXPANDER_ADDRESSES {
        assert!(rig.bus.writes_to(address).is_empty());
    }
    assert_eq!(rig.driver.get(RTP_INPUT), 90);
    must(controller.stop());
}

#[test]
fn moving_the_region_clears_the_old_one() {
    let rig = rig();
    let mut controller = started(&rig);
    must(controller.set_lras_within(Location::new(90.0, 60.0), 1.0, 80));
    let on = must(controller.set_lras_within(Location::new(1830.0, 456.0), 1.0, 80));
    let refs: Vec<String> = on.iter().map(|a| a.reference.to_string()).collect();
    assert_eq!(refs, ["M5"]);
    let a1 = must_some(must(controller.actuator(reference("A1"))), "A1");
    assert!(!a1.enabled);
    must(controller.stop());
}

#[test]
fn stop_all_silences_everything() {
    let rig = rig();
    let mut controller = started(&rig);
    must(controller.set_lras_within(Location::new(960.0, 258.0), 2000.0, 127));
    assert!(rig.outputs().iter().any(|&o| o != 0));

    must(controller.stop_all_lras());
    assert!(rig.outputs().iter().all(|&o| o == 0));
    assert_eq!(rig.driver.get(MODE), 0x00);
    assert_eq!(rig.driver.get(RTP_INPUT), 0x00);
    assert!(must(controller.actuators()).iter().all(|a| !a.enabled));

    // Idempotent, and RTP comes back on with the next actuation.
    must(controller.stop_all_lras());
    must(controller.set_lras_within(Location::new(90.0, 60.0), 1.0, 60));
    assert_eq!(rig.driver.get(MODE), 0x05);
    must(controller.stop());
}

#[test]
fn impulse_turns_on_now_and_off_after_duration() {
    let rig = rig();
    let mut controller = started(&rig);
    let scheduled = Instant::now();
    must(controller.schedule_lra_impulse(
        Location::new(90.0, 60.0),
        1.0,
        127,
        Duration::ZERO,
        Duration::from_millis(30),
    ));

    let deadline = scheduled + Duration::from_secs(1);
    while rig.outputs().first().copied() != Some(0x01) && Instant::now() < deadline {
        thread::sleep(Duration::from_micros(200));
    }
    assert_eq!(rig.outputs().first().copied(), Some(0x01));

    while rig.outputs().first().copied() != Some(0x00) && Instant::now() < deadline {
        thread::sleep(Duration::from_micros(200));
    }
    assert_eq!(rig.outputs().first().copied(), Some(0x00));
    assert!(scheduled.elapsed() >= Duration::from_millis(30));
    assert_eq!(rig.driver.get(MODE), 0x00);

    must(controller.stop());
}

#[test]
fn stop_cancels_pending_impulses_and_silences() {
    let rig = rig();
    let mut controller = started(&rig);
    must(controller.set_lras_within(Location::new(90.0, 60.0), 1.0, 127));
    must(controller.schedule_lra_impulse(
        Location::new(1830.0, 456.0),
        1.0,
        127,
        Duration::from_secs(30),
        Duration::from_millis(30),
    ));

    must(controller.stop());
    assert!(rig.outputs().iter().all(|&o| o == 0));
    assert_eq!(rig.driver.get(MODE), 0x00);
    assert_eq!(rig.bus.close_count(), 1);
    assert_eq!(controller.state(), LifecycleState::Stopped);

    // Stopping again does nothing.
    must(controller.stop());
    assert_eq!(rig.bus.close_count(), 1);
}

#[test]
fn calls_fail_when_stopped() {
    let rig = rig();
    let config = must(HapticsConfig::builder().bus_index(BUS).build());
    let controller = HapticsBoardController::new(config, rig.provider.clone());
    assert!(matches!(
        controller.set_lras_within(Location::default(), 1.0, 1),
        Err(AnapadError::NotRunning(_))
    ));
    assert!(controller.stop_all_lras().is_err());
    assert!(controller
        .schedule_lra_impulse(Location::default(), 1.0, 1, Duration::ZERO, Duration::ZERO)
        .is_err());
    assert!(controller.actuators().is_err());
}

#[test]
fn missing_expander_fails_start_and_closes_bus() {
    let bus = SimulatedBus::new();
    for &address in EXPANDER_ADDRESSES.iter().take(4) {
        bus.add_device(address, RegisterFile::new(RegisterWidth::Bits8));
    }
    bus.add_device(DRIVER_ADDRESS, RegisterFile::new(RegisterWidth::Bits8));
    let provider = Arc::new(SimulatedBusProvider::new().with_bus(BUS, bus.clone()));
    let config = must(HapticsConfig::builder().bus_index(BUS).build());
    let mut controller = HapticsBoardController::new(config, provider);

    assert!(matches!(controller.start(), Err(AnapadError::Bus(_))));
    assert_eq!(controller.state(), LifecycleState::Stopped);
    assert_eq!(bus.close_count(), 1);
}

#[test]
fn failed_scheduled_pulse_does_not_break_later_pulses() {
    let rig = rig();
    let mut controller = started(&rig);
    rig.bus.fail_next(1);
    must(controller.schedule_lra_impulse(
        Location::new(90.0, 60.0),
        1.0,
        127,
        Duration::ZERO,
        Duration::from_secs(10),
    ));
    thread::sleep(Duration::from_millis(20));

    must(controller.schedule_lra_impulse(
        Location::new(90.0, 60.0),
        1.0,
        127,
        Duration::ZERO,
        Duration::from_secs(10),
    ));
    let deadline = Instant::now() + Duration::from_secs(1);
    while rig.outputs().first().copied() != Some(0x01) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(rig.outputs().first().copied(), Some(0x01));
    must(controller.stop());
}
