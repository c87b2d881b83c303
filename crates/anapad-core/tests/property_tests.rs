//! Property-based tests for force feedback.

use anapad_core::{FeedbackConfig, ForceFeedback, PressDetector, TouchTransform};
use anapad_touchscreen::{Resolution, Touch};
use proptest::prelude::*;

proptest! {
    #[test]
    fn presses_are_separated_by_a_release(offsets in proptest::collection::vec(-0.01f64..0.02, 1..200)) {
        let mut press = PressDetector::new(0.006, 0.004);
        let mut released_since_press = true;
        for offset in offsets {
            let fired = press.update(offset);
            if fired {
                prop_assert!(released_since_press);
                prop_assert!(offset > 0.006);
                released_since_press = false;
            } else if offset < 0.004 {
                released_since_press = true;
            }
        }
    }

    #[test]
    fn amplitude_is_bounded_and_monotonic(a in -1.0f64..1.0, b in -1.0f64..1.0) {
        let feedback = ForceFeedback::new(FeedbackConfig::default());
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(feedback.amplitude_for(low) <= feedback.amplitude_for(high));
        prop_assert!(feedback.amplitude_for(high) <= 127);
    }

    #[test]
    fn transform_maps_the_panel_onto_the_view(
        res_x in 1u16..4096,
        res_y in 1u16..4096,
        fx in 0.0f64..=1.0,
        fy in 0.0f64..=1.0,
    ) {
        let transform = TouchTransform::new(Resolution::new(res_x, res_y), 1920.0, 515.0);
        let touch = Touch {
            id: 0,
            x: (fx * f64::from(res_x)).round() as i32,
            y: (fy * f64::from(res_y)).round() as i32,
            size: 0,
        };
        let location = transform.apply(&touch);
        prop_assert!((-1e-9..=1920.0 + 1e-9).contains(&location.x));
        prop_assert!((-1e-9..=515.0 + 1e-9).contains(&location.y));
    }
}
