use std::cmp::Ordering;

use tracing::warn;

use crate::model::*;

use super::LayoutError;

/// Anything that occupies a `[start, end)` stretch on a single axis.
pub trait Placeable: Clone {
    type Pos: PartialOrd + Copy;

    fn start(&self) -> Self::Pos;
    fn end(&self) -> Self::Pos;
}

impl Placeable for Interval {
    type Pos = Ms;

    fn start(&self) -> Ms {
        self.span.start
    }

    fn end(&self) -> Ms {
        self.span.end
    }
}

impl Placeable for RatioInterval {
    type Pos = f64;

    fn start(&self) -> f64 {
        self.start_ratio
    }

    fn end(&self) -> f64 {
        self.end_ratio()
    }
}

/// First-fit-by-start-time lane packing.
///
/// Items are stably sorted by start, then each goes into the first lane (in
/// creation order) whose last item ends at or before its start. Callers must
/// not rely on the lane count being minimal.
pub fn allocate_lanes<T: Placeable>(items: &[T]) -> Vec<Lane<T>> {
    let mut sorted: Vec<&T> = items.iter().collect();
    // Validated inputs never compare as unordered; Equal keeps input order.
    sorted.sort_by(|a, b| a.start().partial_cmp(&b.start()).unwrap_or(Ordering::Equal));

    let mut lanes: Vec<Lane<T>> = Vec::new();
    for item in sorted {
        let fit = lanes.iter_mut().find(|lane| {
            lane.items
                .last()
                .is_some_and(|last| last.end() <= item.start())
        });
        match fit {
            Some(lane) => lane.items.push(item.clone()),
            None => lanes.push(Lane {
                items: vec![item.clone()],
            }),
        }
    }
    lanes
}

/// A record that failed validation and was kept out of the lanes.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    pub id: EntityId,
    pub error: LayoutError,
}

/// Lanes for the valid records plus every record that was excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation<T> {
    pub lanes: Vec<Lane<T>>,
    pub rejected: Vec<Rejected>,
}

impl<T> Allocation<T> {
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }
}

fn validate_all<'a, R, T>(records: &'a [R]) -> (Vec<T>, Vec<Rejected>)
where
    T: TryFrom<&'a R, Error = LayoutError>,
{
    let mut valid = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();
    for rec in records {
        match T::try_from(rec) {
            Ok(item) => valid.push(item),
            Err(error) => {
                warn!("excluding record from lanes: {error}");
                metrics::counter!(crate::observability::LAYOUT_REJECTED_TOTAL).increment(1);
                rejected.push(Rejected {
                    id: error.id(),
                    error,
                });
            }
        }
    }
    (valid, rejected)
}

/// Validate absolute-time records and lane the valid ones.
pub fn allocate_interval_records(records: &[IntervalRecord]) -> Allocation<Interval> {
    let (valid, rejected): (Vec<Interval>, _) = validate_all(records);
    Allocation {
        lanes: allocate_lanes(&valid),
        rejected,
    }
}

/// Validate ratio records and lane the valid ones.
pub fn allocate_ratio_records(records: &[RatioRecord]) -> Allocation<RatioInterval> {
    let (valid, rejected): (Vec<RatioInterval>, _) = validate_all(records);
    Allocation {
        lanes: allocate_lanes(&valid),
        rejected,
    }
}
