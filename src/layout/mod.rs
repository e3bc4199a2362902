mod conflict;
mod error;
mod geometry;
mod lanes;
mod parse;
mod projection;

pub use conflict::{Conflict, find_conflicts, is_available, merge_overlapping, occupied_ms};
pub use error::LayoutError;
pub use geometry::{PlacedBar, interval_bars, place_interval, place_ratio, ratio_bars};
pub use lanes::{
    Allocation, Placeable, Rejected, allocate_interval_records, allocate_lanes, allocate_ratio_records,
};
pub use parse::parse_timestamp;
pub use projection::{project_all, project_onto};
