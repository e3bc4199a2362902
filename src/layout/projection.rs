use crate::model::*;

/// Express `other` as a ratio interval on the `main` timeline.
///
/// The start point is clamped to the beginning of `main`; the span is the
/// overlap length over the length of `main`, so an interval entirely outside
/// `main` projects to a zero span. Returns `None` when `main` is empty.
pub fn project_onto(main: &Span, id: EntityId, label: &str, other: &Span) -> Option<RatioInterval> {
    if main.is_empty() {
        return None;
    }
    let len = main.duration_ms() as f64;
    let start = other.start.max(main.start);
    let overlap = main.intersection(other).map_or(0, |s| s.duration_ms());
    Some(RatioInterval {
        id,
        label: label.to_string(),
        start_ratio: (start - main.start) as f64 / len,
        span: overlap as f64 / len,
    })
}

/// Project every interval onto `main`, in input order.
pub fn project_all(main: &Span, intervals: &[Interval]) -> Vec<RatioInterval> {
    intervals
        .iter()
        .filter_map(|iv| project_onto(main, iv.id, &iv.label, &iv.span))
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const D: Ms = 86_400_000;

    #[test]
    fn inner_interval() {
        let main = Span::new(0, 10 * D);
        let r = project_onto(&main, 1, "a", &Span::new(2 * D, 5 * D)).unwrap();
        assert_relative_eq!(r.start_ratio, 0.2);
        assert_relative_eq!(r.span, 0.3);
    }

    #[test]
    fn starts_before_main() {
        let main = Span::new(10 * D, 20 * D);
        let r = project_onto(&main, 1, "a", &Span::new(5 * D, 15 * D)).unwrap();
        assert_relative_eq!(r.start_ratio, 0.0);
        assert_relative_eq!(r.span, 0.5);
    }

    #[test]
    fn disjoint_projects_to_zero_span() {
        let main = Span::new(0, 10 * D);
        let r = project_onto(&main, 1, "a", &Span::new(12 * D, 15 * D)).unwrap();
        assert_relative_eq!(r.span, 0.0);
    }

    #[test]
    fn empty_main_projects_nothing() {
        let main = Span::new(D, D);
        assert!(project_onto(&main, 1, "a", &Span::new(0, 2 * D)).is_none());
    }

    #[test]
    fn projected_lanes() {
        let main = Span::new(0, 10 * D);
        let items = vec![
            Interval {
                id: 1,
                label: "A".into(),
                span: Span::new(0, 5 * D),
            },
            Interval {
                id: 2,
                label: "B".into(),
                span: Span::new(5 * D, 10 * D),
            },
        ];
        let projected = project_all(&main, &items);
        let lanes = crate::layout::allocate_lanes(&projected);
        assert_eq!(lanes.len(), 1);
    }
}
