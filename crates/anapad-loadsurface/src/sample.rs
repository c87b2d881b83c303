//! Per-tick sample aggregation.

use anapad_geometry::{Location, inverse_distance_weighted};
use serde::Serialize;

use crate::multiplexer::MuxChannel;

/// One channel's reading within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    /// Position in the controller's channel list
    pub index: usize,
    /// Multiplexer channel
    pub channel: MuxChannel,
    /// Load cell position
    pub location: Location,
    /// Raw signed 24-bit conversion
    pub raw_sample: i32,
    /// All-samples filter output
    pub filtered_sample: f64,
    /// Baseline filter output
    pub filtered_baseline_sample: f64,
    /// `|filtered - baseline| / full scale`
    pub percent_offset: f64,
}

/// All channels' readings for one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleResult {
    samples: Vec<Sample>,
    percent_offset_average: f64,
}

impl SampleResult {
    /// Aggregate one tick's samples.
    pub fn new(samples: Vec<Sample>) -> Self {
        let percent_offset_average = if samples.is_empty() {
            0.0
        } else {
            let sum: f64 = samples.iter().map(|s| s.percent_offset).sum();
            #[expect(clippy::cast_precision_loss, reason = "channel count is tiny")]
            let count = samples.len() as f64;
            sum / count
        };
        Self {
            samples,
            percent_offset_average,
        }
    }

    /// Mean percent offset across channels.
    pub fn percent_offset_average(&self) -> f64 {
        self.percent_offset_average
    }

    /// Samples in channel order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Sample at `index`, if present.
    pub fn sample(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// Percent offset interpolated at `location` by inverse distance
    /// weighting over the load cell positions.
    ///
    /// A location on top of a load cell reads that cell's value. An empty
    /// result reads zero.
    pub fn weighted_percent_offset(&self, location: Location) -> f64 {
        inverse_distance_weighted(
            location,
            self.samples.iter().map(|s| (s.location, s.percent_offset)),
        )
        .unwrap_or(0.0)
    }
}
