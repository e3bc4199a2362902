use crate::model::*;

/// Pixel geometry of an absolute-time span inside `range`, scaled by the unit length.
///
/// A zero or negative range yields a zero placement.
pub fn place_interval(span: &Span, range: &Span, unit_px: f64) -> Placement {
    let total = range.duration_ms();
    if total <= 0 {
        return Placement {
            offset_px: 0.0,
            width_px: 0.0,
        };
    }
    let total = total as f64;
    Placement {
        offset_px: span.start.saturating_sub(range.start) as f64 / total * unit_px,
        width_px: span.duration_ms() as f64 / total * unit_px,
    }
}

/// Pixel geometry of a ratio interval. The end is clamped to the reference range here.
pub fn place_ratio(interval: &RatioInterval, unit_px: f64) -> Placement {
    let start = interval.start_ratio;
    let width = (interval.render_end() - start).max(0.0);
    Placement {
        offset_px: start * unit_px,
        width_px: width * unit_px,
    }
}

/// A laned bar ready to draw: the lane index is the vertical rank.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBar {
    pub lane: usize,
    pub id: EntityId,
    pub label: String,
    pub placement: Placement,
}

pub fn interval_bars(lanes: &[Lane<Interval>], range: &Span, unit_px: f64) -> Vec<PlacedBar> {
    lanes
        .iter()
        .enumerate()
        .flat_map(|(lane, l)| {
            l.items.iter().map(move |iv| PlacedBar {
                lane,
                id: iv.id,
                label: iv.label.clone(),
                placement: place_interval(&iv.span, range, unit_px),
            })
        })
        .collect()
}

pub fn ratio_bars(lanes: &[Lane<RatioInterval>], unit_px: f64) -> Vec<PlacedBar> {
    lanes
        .iter()
        .enumerate()
        .flat_map(|(lane, l)| {
            l.items.iter().map(move |r| PlacedBar {
                lane,
                id: r.id,
                label: r.label.clone(),
                placement: place_ratio(r, unit_px),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::layout::allocate_lanes;

    #[test]
    fn interval_geometry_scales_with_unit() {
        let range = Span::new(0, 100);
        let p = place_interval(&Span::new(25, 75), &range, 800.0);
        assert_relative_eq!(p.offset_px, 200.0);
        assert_relative_eq!(p.width_px, 400.0);
    }

    #[test]
    fn degenerate_range_places_nothing() {
        let p = place_interval(&Span::new(5, 5), &Span::new(5, 5), 800.0);
        assert_eq!(p.offset_px, 0.0);
        assert_eq!(p.width_px, 0.0);
    }

    #[test]
    fn ratio_geometry_clamps_overflow() {
        let r = RatioInterval {
            id: 1,
            label: "late".into(),
            start_ratio: 0.75,
            span: 0.5,
        };
        let p = place_ratio(&r, 400.0);
        assert_relative_eq!(p.offset_px, 300.0);
        assert_relative_eq!(p.width_px, 100.0);
    }

    #[test]
    fn bars_carry_lane_rank() {
        let items = vec![
            Interval {
                id: 1,
                label: "A".into(),
                span: Span::new(0, 5),
            },
            Interval {
                id: 2,
                label: "B".into(),
                span: Span::new(2, 7),
            },
            Interval {
                id: 3,
                label: "C".into(),
                span: Span::new(6, 9),
            },
        ];
        let lanes = allocate_lanes(&items);
        let bars = interval_bars(&lanes, &Span::new(0, 10), 100.0);
        let ranks: Vec<(EntityId, usize)> = bars.iter().map(|b| (b.id, b.lane)).collect();
        assert_eq!(ranks, vec![(1, 0), (3, 0), (2, 1)]);
        assert_relative_eq!(bars[1].placement.offset_px, 60.0);
    }
}
