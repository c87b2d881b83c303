//! Whole-device lifecycle against simulated buses.

use std::io::Write as _;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anapad_core::prelude::*;
use anapad_haptics::{DRIVER_ADDRESS, EXPANDER_ADDRESSES};
use anapad_i2c::RegisterWidth;
use anapad_loadsurface::{ADC_ADDRESS, MULTIPLEXER_ADDRESS};
use anapad_test_helpers::prelude::*;
use anapad_touchscreen::{TOUCH_ADDRESS, Touch};

struct Rig {
    touch_bus: SimulatedBus,
    haptics_bus: SimulatedBus,
    load_bus: SimulatedBus,
    chip: Gt9110Sim,
    adcs: Vec<Nau7802Sim>,
}

impl Rig {
    fn new() -> Self {
        let touch_bus = SimulatedBus::new();
        let chip = Gt9110Sim::new(1920, 515);
        touch_bus.add_device(TOUCH_ADDRESS, chip.clone());

        let haptics_bus = SimulatedBus::new();
        for &address in &EXPANDER_ADDRESSES {
            haptics_bus.add_device(address, RegisterFile::new(RegisterWidth::Bits8));
        }
        haptics_bus.add_device(DRIVER_ADDRESS, RegisterFile::new(RegisterWidth::Bits8));

        let load_bus = SimulatedBus::new();
        load_bus.add_multiplexer(MULTIPLEXER_ADDRESS);
        let adcs: Vec<Nau7802Sim> = (0..4).map(|_| Nau7802Sim::new()).collect();
        for (channel, adc) in (0u8..).zip(&adcs) {
            load_bus.add_downstream_device(channel, ADC_ADDRESS, adc.clone());
        }

        Self {
            touch_bus,
            haptics_bus,
            load_bus,
            chip,
            adcs,
        }
    }

    fn provider(&self) -> Arc<SimulatedBusProvider> {
        Arc::new(
            SimulatedBusProvider::new()
                .with_bus(1, self.touch_bus.clone())
                .with_bus(3, self.haptics_bus.clone())
                .with_bus(4, self.load_bus.clone()),
        )
    }
}

fn config() -> AnapadConfig {
    let mut config = AnapadConfig::default();
    config.touchscreen.idle_poll_interval_ms = 1;
    config.load_surface.ready_timeout_ms = 20;
    config
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

fn record(x: u16, y: u16) -> [u8; 8] {
    let [x_lo, x_hi] = x.to_le_bytes();
    let [y_lo, y_hi] = y.to_le_bytes();
    [0, x_lo, x_hi, y_lo, y_hi, 20, 0, 0]
}

#[test]
fn starts_everything_and_stops_everything() {
    let rig = Rig::new();
    let mut anapad = Anapad::new(config(), rig.provider());
    must(anapad.start());
    assert!(anapad.is_running());
    assert_eq!(anapad.touchscreen().state(), LifecycleState::Running);
    assert_eq!(anapad.haptics().state(), LifecycleState::Running);
    assert_eq!(anapad.load_surface().state(), LifecycleState::Running);

    must(anapad.stop());
    assert!(!anapad.is_running());
    assert_eq!(rig.touch_bus.close_count(), 1);
    assert_eq!(rig.haptics_bus.close_count(), 1);
    assert_eq!(rig.load_bus.close_count(), 1);
}

#[test]
fn load_surface_failure_rolls_back_the_others() {
    let rig = Rig::new();
    let provider = Arc::new(
        SimulatedBusProvider::new()
            .with_bus(1, rig.touch_bus.clone())
            .with_bus(3, rig.haptics_bus.clone()),
    );
    let mut anapad = Anapad::new(config(), provider);

    assert!(matches!(anapad.start(), Err(AnapadError::Bus(_))));
    assert!(!anapad.touchscreen().is_running());
    assert!(!anapad.haptics().is_running());
    assert_eq!(rig.touch_bus.close_count(), 1);
    assert_eq!(rig.haptics_bus.close_count(), 1);
}

#[test]
fn haptics_failure_skips_the_load_surface() {
    let rig = Rig::new();
    let provider = Arc::new(
        SimulatedBusProvider::new()
            .with_bus(1, rig.touch_bus.clone())
            .with_bus(4, rig.load_bus.clone()),
    );
    let mut anapad = Anapad::new(config(), Arc::clone(&provider) as _);

    assert!(anapad.start().is_err());
    assert_eq!(provider.open_count(), 1);
    assert_eq!(rig.touch_bus.close_count(), 1);
    assert_eq!(anapad.load_surface().state(), LifecycleState::Stopped);
}

#[test]
fn touches_freeze_the_baseline_and_a_press_clicks() {
    let rig = Rig::new();
    for adc in &rig.adcs {
        adc.set_idle_sample(0);
    }
    let mut anapad = Anapad::new(config(), rig.provider());
    let touches = anapad.touchscreen().subscribe_touches();
    must(anapad.start());
    assert!(wait_for(|| anapad.load_surface().latest_result().is_some()));

    // Finger down at the centre, then press.
    rig.chip.push_frame(vec![record(960, 257)]);
    let frame = must(touches.recv_timeout(Duration::from_secs(2)));
    for adc in &rig.adcs {
        adc.set_idle_sample(2_000_000);
    }
    let centre = Location::new(960.0, 258.0);
    assert!(wait_for(|| {
        anapad
            .load_surface()
            .latest_result()
            .is_some_and(|r| r.weighted_percent_offset(centre) > 0.05)
    }));

    let mut feedback = anapad.force_feedback();
    let action = must(anapad.feed(&frame, &mut feedback));
    assert_eq!(action, FeedbackAction::Impulse(centre));
    // Held: no second click.
    assert_eq!(must(anapad.feed(&frame, &mut feedback)), FeedbackAction::Idle);

    must(anapad.stop());
}

#[test]
fn feed_without_resolution_is_idle() {
    let rig = Rig::new();
    let anapad = Anapad::new(config(), rig.provider());
    let mut feedback = anapad.force_feedback();
    let touch = Touch {
        id: 0,
        x: 1,
        y: 1,
        size: 1,
    };
    assert_eq!(
        must(anapad.feed(&[touch], &mut feedback)),
        FeedbackAction::Idle
    );
}

#[test]
fn polling_failures_are_surfaced() {
    let rig = Rig::new();
    let mut config = config();
    config.touchscreen.failure_threshold = 3;
    let mut anapad = Anapad::new(config, rig.provider());
    let [touch_failures, _load_failures] = anapad.subscribe_failures();
    must(anapad.start());

    rig.touch_bus.set_failing(true);
    let failure = must(touch_failures.recv_timeout(Duration::from_secs(2)));
    assert_eq!(failure.subsystem, "touchscreen");
    assert_eq!(failure.consecutive_failures, 4);
    assert!(!anapad.is_running());
    must(anapad.stop());
}

#[test]
fn loads_yaml_and_json_files() {
    let mut yaml = must(tempfile::Builder::new().suffix(".yaml").tempfile());
    must(yaml.write_all(b"feedback:\n  mode: continuous\nhaptics:\n  bus_index: 5\n"));
    let config = must(AnapadConfig::load(yaml.path()));
    assert_eq!(config.feedback.mode, FeedbackMode::Continuous);
    assert_eq!(config.haptics.bus_index, 5);

    let mut json = must(tempfile::Builder::new().suffix(".json").tempfile());
    must(json.write_all(br#"{ "load_surface": { "bus_index": 6 } }"#));
    let config = must(AnapadConfig::load(json.path()));
    assert_eq!(config.load_surface.bus_index, 6);
    assert_eq!(config.feedback, FeedbackConfig::default());

    let toml = must(tempfile::Builder::new().suffix(".toml").tempfile());
    assert!(matches!(
        AnapadConfig::load(toml.path()),
        Err(AnapadError::Config(_))
    ));
    assert!(matches!(
        AnapadConfig::load("/nonexistent/anapad.yaml"),
        Err(AnapadError::Io(_))
    ));
}
