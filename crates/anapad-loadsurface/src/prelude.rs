//! Convenience re-exports.

pub use crate::{
    ChannelConfig, ForceChannel, Gain, LoadSurfaceConfig, LoadSurfaceController, MuxChannel,
    Sample, SampleResult, SampleRate,
};
pub use anapad_geometry::Location;
