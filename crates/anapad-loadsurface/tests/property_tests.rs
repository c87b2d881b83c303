//! Property-based tests for sample aggregation and channel filtering.

use std::time::{Duration, Instant};

use anapad_loadsurface::adc::{decode_sample, percent_offset};
use anapad_loadsurface::prelude::*;
use anapad_loadsurface::FULL_SCALE;
use proptest::prelude::*;

fn corners() -> [Location; 4] {
    [
        Location::new(40.0, 40.0),
        Location::new(1880.0, 40.0),
        Location::new(40.0, 475.0),
        Location::new(1880.0, 475.0),
    ]
}

fn result_with(offsets: [f64; 4]) -> SampleResult {
    let samples = corners()
        .into_iter()
        .zip(offsets)
        .zip(MuxChannel::ALL)
        .enumerate()
        .map(|(index, ((location, percent_offset), channel))| Sample {
            index,
            channel,
            location,
            raw_sample: 0,
            filtered_sample: 0.0,
            filtered_baseline_sample: 0.0,
            percent_offset,
        })
        .collect();
    SampleResult::new(samples)
}

proptest! {
    #[test]
    fn weighted_offset_is_bounded_by_channels(
        offsets in prop::array::uniform4(0.0f64..0.1),
        x in 0.0f64..1920.0,
        y in 0.0f64..515.0,
    ) {
        let result = result_with(offsets);
        let min = offsets.iter().copied().fold(f64::INFINITY, f64::min);
        let max = offsets.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let value = result.weighted_percent_offset(Location::new(x, y));
        prop_assert!(value >= min - 1e-12 && value <= max + 1e-12);
    }

    #[test]
    fn weighted_offset_on_a_load_cell_reads_that_cell(
        offsets in prop::array::uniform4(0.0f64..0.1),
        cell in 0usize..4,
    ) {
        let result = result_with(offsets);
        let location = corners().into_iter().nth(cell).unwrap_or_default();
        let expected = offsets.into_iter().nth(cell).unwrap_or_default();
        let value = result.weighted_percent_offset(location);
        prop_assert!((value - expected).abs() < 1e-12);
    }

    #[test]
    fn average_lies_between_extremes(offsets in prop::array::uniform4(0.0f64..0.1)) {
        let result = result_with(offsets);
        let min = offsets.iter().copied().fold(f64::INFINITY, f64::min);
        let max = offsets.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let average = result.percent_offset_average();
        prop_assert!(average >= min - 1e-12 && average <= max + 1e-12);
    }

    #[test]
    fn decoded_samples_stay_in_24_bit_range(bytes in prop::array::uniform3(any::<u8>())) {
        let value = decode_sample(bytes);
        prop_assert!((-8_388_608..=8_388_607).contains(&value));
        let [_, b2, b1, b0] = value.to_be_bytes();
        prop_assert_eq!([b2, b1, b0], bytes);
    }

    #[test]
    fn percent_offset_is_symmetric(a in -8.0e6f64..8.0e6, b in -8.0e6f64..8.0e6) {
        prop_assert!((percent_offset(a, b) - percent_offset(b, a)).abs() < 1e-15);
        prop_assert!(percent_offset(a, b) <= 2.0 * 8.0e6 / FULL_SCALE);
    }

    #[test]
    fn frozen_baseline_ignores_touched_samples(
        seed in -100_000i32..100_000,
        touched in prop::collection::vec(-8_000_000i32..8_000_000, 1..20),
    ) {
        let mut channel = ForceChannel::new(0, MuxChannel::Ch0, Location::default());
        let start = Instant::now();
        channel.apply_sample(seed, true, start);
        for (step, raw) in (1u64..).zip(&touched) {
            channel.apply_sample(*raw, false, start + Duration::from_millis(step));
        }
        prop_assert!((channel.last_baseline() - f64::from(seed)).abs() < f64::EPSILON);
    }
}
