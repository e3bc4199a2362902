use crate::model::*;

/// An existing interval that overlaps a candidate, with the shared window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub id: EntityId,
    pub window: Span,
}

/// Every interval in `existing` that shares time with `candidate`.
pub fn find_conflicts(candidate: &Span, existing: &[Interval]) -> Vec<Conflict> {
    existing
        .iter()
        .filter_map(|iv| {
            iv.span
                .intersection(candidate)
                .map(|window| Conflict { id: iv.id, window })
        })
        .collect()
}

/// Merge sorted overlapping/adjacent spans into disjoint spans.
pub fn merge_overlapping(sorted: &[Span]) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::new();
    for &span in sorted {
        if let Some(last) = merged.last_mut()
            && span.start <= last.end {
                last.end = last.end.max(span.end);
                continue;
            }
        merged.push(span);
    }
    merged
}

/// Time inside `window` covered by at least one of `spans`.
pub fn occupied_ms(spans: &[Span], window: &Span) -> Ms {
    let mut clipped: Vec<Span> = spans.iter().filter_map(|s| s.intersection(window)).collect();
    clipped.sort_by_key(|s| s.start);
    merge_overlapping(&clipped)
        .iter()
        .map(Span::duration_ms)
        .sum()
}

/// Whether some part of `window` is left free by `assignments`.
pub fn is_available(assignments: &[Span], window: &Span) -> bool {
    occupied_ms(assignments, window) < window.duration_ms()
}
