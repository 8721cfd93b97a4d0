use super::{Expression, ExpressionError};

/// The value of a piecewise expression for progress in `[from, to)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub from: f64,
    pub to: f64,
    pub value: Expression,
}

impl Segment {
    pub fn new(from: f64, to: f64, value: Expression) -> Self {
        Self { from, to, value }
    }
}

/// Builds an expression that selects a segment's value by `progress`.
///
/// The segments, ordered by `from`, must be contiguous and must cover both
/// progress 0 and progress 1. Segments entirely outside `[0, 1]` are left
/// out. The result is a balanced tree of `progress < pivot ? a : b`
/// choices.
pub fn progress_expression(
    progress: &Expression,
    segments: &[Segment],
) -> Result<Expression, ExpressionError> {
    let mut ordered = segments.to_vec();
    ordered.sort_by(|a, b| a.from.total_cmp(&b.from));

    let Some(first) = ordered.first() else {
        return Err(ExpressionError::Empty);
    };

    let mut previous_to = first.from;
    let mut first_index = None;
    let mut last_index = None;
    for (i, segment) in ordered.iter().enumerate() {
        if segment.from != previous_to {
            return Err(ExpressionError::NotContiguous);
        }
        previous_to = segment.to;

        if first_index.is_none() && segment.from <= 0.0 && segment.to > 0.0 {
            first_index = Some(i);
        }
        if segment.to >= 1.0 {
            last_index = Some(i);
            break;
        }
    }

    match (first_index, last_index) {
        (Some(first), Some(last)) => Ok(bisect(progress, &ordered[first..=last])),
        _ => Err(ExpressionError::NotFullyDefined),
    }
}

fn bisect(progress: &Expression, segments: &[Segment]) -> Expression {
    if let [only] = segments {
        return only.value.clone();
    }

    let pivot = segments.len() / 2;
    let (low, high) = segments.split_at(pivot);
    Expression::ternary(
        Expression::less_than(progress.clone(), Expression::number(low[pivot - 1].to)),
        bisect(progress, low),
        bisect(progress, high),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress() -> Expression {
        Expression::name("_.Progress")
    }

    fn evaluate_at(e: &Expression, p: f64) -> Option<f64> {
        e.evaluate(&move |name: &str| (name == "_.Progress").then_some(p))
    }

    #[test]
    fn test_two_segments_select_by_progress() {
        let e = progress_expression(
            &progress(),
            &[
                Segment::new(0.5, 1.0, Expression::number(2.0)),
                Segment::new(0.0, 0.5, Expression::number(1.0)),
            ],
        )
        .unwrap();
        assert_eq!(e.to_string(), "(_.Progress < 0.5) ? 1 : 2");
        assert_eq!(evaluate_at(&e, 0.3), Some(1.0));
        assert_eq!(evaluate_at(&e, 0.7), Some(2.0));
    }

    #[test]
    fn test_not_covering_one_is_an_error() {
        let result = progress_expression(
            &progress(),
            &[Segment::new(0.0, 0.5, Expression::number(1.0))],
        );
        assert_eq!(result, Err(ExpressionError::NotFullyDefined));
    }

    #[test]
    fn test_gap_is_an_error() {
        let result = progress_expression(
            &progress(),
            &[
                Segment::new(0.0, 0.4, Expression::number(1.0)),
                Segment::new(0.5, 1.0, Expression::number(2.0)),
            ],
        );
        assert_eq!(result, Err(ExpressionError::NotContiguous));
        assert_eq!(
            progress_expression(&progress(), &[]),
            Err(ExpressionError::Empty)
        );
    }

    #[test]
    fn test_visibility_window_keeps_segments_in_range() {
        let e = progress_expression(
            &progress(),
            &[
                Segment::new(f64::MIN, 0.25, Expression::number(0.0)),
                Segment::new(0.25, 0.75, Expression::number(1.0)),
                Segment::new(0.75, f64::MAX, Expression::number(0.0)),
            ],
        )
        .unwrap();
        assert_eq!(evaluate_at(&e, 0.0), Some(0.0));
        assert_eq!(evaluate_at(&e, 0.5), Some(1.0));
        assert_eq!(evaluate_at(&e, 0.75), Some(0.0));

        // Only the visible segment remains when it spans the whole range.
        let e = progress_expression(
            &progress(),
            &[
                Segment::new(f64::MIN, -1.0, Expression::number(0.0)),
                Segment::new(-1.0, 2.0, Expression::number(1.0)),
                Segment::new(2.0, f64::MAX, Expression::number(0.0)),
            ],
        )
        .unwrap();
        assert_eq!(e, Expression::number(1.0));
    }

    #[test]
    fn test_tree_is_balanced() {
        let segments: Vec<_> = (0..8)
            .map(|i| Segment::new(i as f64 / 8.0, (i + 1) as f64 / 8.0, Expression::number(i as f64)))
            .collect();
        let e = progress_expression(&progress(), &segments).unwrap();

        fn depth(e: &Expression) -> usize {
            match e {
                Expression::Ternary {
                    true_value,
                    false_value,
                    ..
                } => 1 + depth(true_value).max(depth(false_value)),
                _ => 0,
            }
        }
        assert_eq!(depth(&e), 3);
        for i in 0..8 {
            let p = (i as f64 + 0.5) / 8.0;
            assert_eq!(evaluate_at(&e, p), Some(i as f64));
        }
    }
}
