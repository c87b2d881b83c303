//! Planar geometry shared by the load surface and the haptics board.
//!
//! All locations in one subsystem use a single unit. The default layouts use
//! view pixels on a 1920 x 515 surface.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs)]

mod location;
mod weighting;

pub use location::Location;
pub use weighting::{COINCIDENT_DISTANCE, inverse_distance_weighted};
