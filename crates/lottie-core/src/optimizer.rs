//! Keyframe reduction and trimming applied before animations are bound.

use crate::animatable::{Animatable, Easing, KeyFrame};

/// Returns `value` with redundant keyframes removed. A result with no
/// keyframes is a static value.
pub fn optimized<T: Clone + PartialEq>(value: &Animatable<T>) -> Animatable<T> {
    if !value.is_animated() {
        return value.clone();
    }

    let keyframes = optimize_keyframes(&value.initial_value, &value.keyframes);
    if keyframes == value.keyframes {
        value.clone()
    } else {
        Animatable::with_keyframes(value.initial_value.clone(), keyframes, None)
    }
}

fn optimize_keyframes<T: Clone + PartialEq>(
    initial_value: &T,
    keyframes: &[KeyFrame<T>],
) -> Vec<KeyFrame<T>> {
    let mut result = Vec::new();
    let Some((first, rest)) = keyframes.split_first() else {
        return result;
    };

    let mut previous_value = initial_value.clone();
    let mut current = first.clone();
    for next in rest {
        if current.value != previous_value {
            result.push(current.clone());
        } else if current.value != next.value {
            // Holding a value before a ramp; the easing is irrelevant.
            current.easing = Easing::Linear;
            result.push(current.clone());
        }
        previous_value = current.value.clone();
        current = next.clone();
    }

    if !result.is_empty() && current.value != previous_value {
        result.push(current);
    }
    result
}

/// Returns at most one keyframe at or before `start_frame` followed by the
/// keyframes after it, ending with the first keyframe at or after
/// `end_frame`.
pub fn trimmed<T: Clone>(
    keyframes: &[KeyFrame<T>],
    start_frame: f64,
    end_frame: f64,
) -> Vec<KeyFrame<T>> {
    let mut result = Vec::new();
    let mut first_returned = false;
    let mut candidate: Option<&KeyFrame<T>> = None;

    for keyframe in keyframes {
        if keyframe.frame <= start_frame {
            candidate = Some(keyframe);
        } else if keyframe.frame == 0.0 {
            candidate = None;
            result.push(keyframe.clone());
            first_returned = true;
        } else {
            if !first_returned {
                if let Some(c) = candidate.take() {
                    result.push(c.clone());
                    first_returned = true;
                }
            }
            result.push(keyframe.clone());
            if keyframe.frame >= end_frame {
                return result;
            }
        }
    }

    // Every keyframe precedes the window; the last one holds for all of it.
    if !first_returned {
        if let Some(c) = candidate {
            result.push(c.clone());
        }
    }
    result
}

/// How two animated values relate over their whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatableOrder {
    Before,
    After,
    Equal,
    BeforeAndAfter,
}

pub fn value_order(a: f64, b: f64) -> AnimatableOrder {
    if a == b {
        AnimatableOrder::Equal
    } else if a < b {
        AnimatableOrder::Before
    } else {
        AnimatableOrder::After
    }
}

pub fn animatable_order(a: &Animatable<f64>, b: &Animatable<f64>) -> AnimatableOrder {
    let initial_a = a.initial_value;
    let initial_b = b.initial_value;
    let initial_order = value_order(initial_a, initial_b);
    if !a.is_animated() && !b.is_animated() {
        return initial_order;
    }

    let (a_min, a_max) = value_range(a);
    let (b_min, b_max) = value_range(b);

    match initial_order {
        AnimatableOrder::Before if a_max <= b_min => AnimatableOrder::Before,
        AnimatableOrder::After if a_min >= b_max => AnimatableOrder::After,
        AnimatableOrder::Before | AnimatableOrder::After => AnimatableOrder::BeforeAndAfter,
        AnimatableOrder::Equal => {
            if a_min == a_max && b_min == b_max && a_min == b_max {
                AnimatableOrder::Equal
            } else if a_min < b_max {
                if b_min < initial_a || a_max > initial_a {
                    AnimatableOrder::BeforeAndAfter
                } else {
                    AnimatableOrder::Before
                }
            } else if b_min > a_max {
                AnimatableOrder::BeforeAndAfter
            } else {
                AnimatableOrder::After
            }
        }
        AnimatableOrder::BeforeAndAfter => AnimatableOrder::BeforeAndAfter,
    }
}

fn value_range(value: &Animatable<f64>) -> (f64, f64) {
    value
        .keyframes
        .iter()
        .fold((value.initial_value, value.initial_value), |(min, max), k| {
            (min.min(k.value), max.max(k.value))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kf(frame: f64, value: f64) -> KeyFrame<f64> {
        KeyFrame::new(frame, value, Easing::Hold)
    }

    fn animated(values: &[(f64, f64)]) -> Animatable<f64> {
        let keyframes: Vec<_> = values.iter().map(|(f, v)| kf(*f, *v)).collect();
        Animatable::with_keyframes(keyframes[0].value, keyframes, None)
    }

    #[test]
    fn test_constant_keyframes_collapse() {
        let value = animated(&[(0.0, 5.0), (10.0, 5.0), (20.0, 5.0)]);
        let result = optimized(&value);
        assert!(!result.is_animated());
        assert_eq!(result.initial_value, 5.0);
    }

    #[test]
    fn test_ramp_start_is_kept_with_linear_easing() {
        let value = animated(&[(0.0, 0.0), (10.0, 0.0), (20.0, 1.0), (30.0, 1.0)]);
        let result = optimized(&value);
        let frames: Vec<_> = result.keyframes.iter().map(|k| (k.frame, k.value)).collect();
        assert_eq!(frames, vec![(10.0, 0.0), (20.0, 1.0)]);
        assert_eq!(result.keyframes[0].easing, Easing::Linear);
        assert_eq!(result.keyframes[1].easing, Easing::Hold);
    }

    #[test]
    fn test_ramp_from_initial_value_keeps_both_ends() {
        let value = animated(&[(0.0, 0.0), (10.0, 1.0)]);
        let result = optimized(&value);
        assert_eq!(result.keyframes.len(), 2);
        assert_eq!(result.keyframes[0].easing, Easing::Linear);
        assert_eq!(result.keyframes[1].value, 1.0);
        assert_eq!(result.property_index, None);
    }

    #[test]
    fn test_trimmed_keeps_one_frame_each_side() {
        let keyframes: Vec<_> = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0]
            .iter()
            .map(|f| kf(*f, *f))
            .collect();
        let frames: Vec<_> = trimmed(&keyframes, 15.0, 35.0)
            .iter()
            .map(|k| k.frame)
            .collect();
        assert_eq!(frames, vec![10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_trimmed_before_window_holds_last_value() {
        let keyframes = vec![kf(0.0, 1.0), kf(10.0, 2.0)];
        let frames: Vec<_> = trimmed(&keyframes, 50.0, 100.0)
            .iter()
            .map(|k| k.frame)
            .collect();
        assert_eq!(frames, vec![10.0]);
    }

    #[test]
    fn test_animatable_order() {
        let start = Animatable::new(0.0);
        let end = animated(&[(0.0, 50.0), (10.0, 100.0)]);
        assert_eq!(animatable_order(&start, &end), AnimatableOrder::Before);

        let crossing = animated(&[(0.0, 10.0), (10.0, 80.0)]);
        let fixed = Animatable::new(50.0);
        assert_eq!(
            animatable_order(&crossing, &fixed),
            AnimatableOrder::BeforeAndAfter
        );

        assert_eq!(
            animatable_order(&Animatable::new(100.0), &Animatable::new(0.0)),
            AnimatableOrder::After
        );
        assert_eq!(
            animatable_order(&Animatable::new(3.0), &Animatable::new(3.0)),
            AnimatableOrder::Equal
        );
    }
}
