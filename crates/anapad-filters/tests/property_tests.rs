//! Property-based tests for the low-pass filter.

use std::time::Duration;

use anapad_filters::prelude::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn zero_elapsed_is_idempotent(
        seed in -8_388_608.0f64..8_388_608.0,
        input in -8_388_608.0f64..8_388_608.0,
        repeats in 1usize..50,
    ) {
        let mut filter = LowPassFilter::new(25.0);
        filter.filter_elapsed(seed, Duration::ZERO);
        for _ in 0..repeats {
            let out = filter.filter_elapsed(input, Duration::ZERO);
            prop_assert!((out - seed).abs() < 1e-9);
        }
    }

    #[test]
    fn approaches_constant_input_monotonically(
        seed in -1.0e6f64..1.0e6,
        target in -1.0e6f64..1.0e6,
        step_ms in 1u64..20,
        smoothing in 25.0f64..500.0,
    ) {
        let mut filter = LowPassFilter::new(smoothing);
        filter.filter_elapsed(seed, Duration::ZERO);
        let mut distance = (target - seed).abs();
        for _ in 0..200 {
            let out = filter.filter_elapsed(target, Duration::from_millis(step_ms));
            let next = (target - out).abs();
            prop_assert!(next <= distance + 1e-9);
            distance = next;
        }
    }

    #[test]
    fn output_stays_between_value_and_input(
        seed in -1.0e6f64..1.0e6,
        input in -1.0e6f64..1.0e6,
        elapsed_ms in 0u64..10_000,
    ) {
        let mut filter = LowPassFilter::new(100.0);
        filter.filter_elapsed(seed, Duration::ZERO);
        let out = filter.filter_elapsed(input, Duration::from_millis(elapsed_ms));
        let (lo, hi) = if seed <= input { (seed, input) } else { (input, seed) };
        prop_assert!(out >= lo - 1e-9 && out <= hi + 1e-9);
    }

    #[test]
    fn reset_reseeds(first in -100.0f64..100.0, second in -100.0f64..100.0) {
        let mut filter = LowPassFilter::all_samples();
        filter.filter_elapsed(first, Duration::ZERO);
        filter.clear();
        prop_assert_eq!(filter.value(), None);
        let out = filter.filter_elapsed(second, Duration::from_millis(3));
        prop_assert!((out - second).abs() < f64::EPSILON);
    }
}
