//! Binds time-varying values to keyframe animations driven by the root
//! progress property.

use glam::{DVec2, DVec3, Vec2};
use lottie_data::model::FillRule;
use tracing::trace;

use super::context::TranslationContext;
use super::{Translator, EPSILON, ROOT_NAME};
use crate::animatable::{Animatable, Color, Easing, PathGeometry};
use crate::expressions::{CubicBezierFunction, Expression};
use crate::graph::{CompositionObject, ExpressionAnimation, KeyFrameAnimation, NodeId};
use crate::optimizer;

enum BoundValue<T> {
    Value(T),
    Expression(Expression),
}

struct BoundKeyFrame<T> {
    progress: f64,
    value: BoundValue<T>,
    easing: NodeId,
}

/// Keyframes placed on the animation's own 0..1 timeline, and how that
/// timeline maps onto the root progress.
struct BoundAnimation<T> {
    keyframes: Vec<BoundKeyFrame<T>>,
    scale: f64,
    offset: f64,
    references_root: bool,
    progress_mapping: Option<(String, KeyFrameAnimation<f32>)>,
}

impl<'a> Translator<'a> {
    pub(super) fn apply_scalar(
        &mut self,
        context: &TranslationContext,
        value: &Animatable<f64>,
        target: NodeId,
        property: &str,
    ) {
        self.apply_scaled_scalar(context, value, 1.0, target, property);
    }

    pub(super) fn apply_scaled_scalar(
        &mut self,
        context: &TranslationContext,
        value: &Animatable<f64>,
        scale: f64,
        target: NodeId,
        property: &str,
    ) {
        let value = optimizer::optimized(value);
        let Some(bound) = self.bind_keyframes(context, &value, None) else {
            return;
        };
        let animation = self.keyframe_animation(&bound, scale, |v: &f64| (v * scale) as f32);
        let animation = self.graph.add(CompositionObject::ScalarKeyFrameAnimation(animation));
        self.start_bound_animation(target, property, animation, bound);
    }

    pub(super) fn apply_color(
        &mut self,
        context: &TranslationContext,
        value: &Animatable<Color>,
        target: NodeId,
        property: &str,
    ) {
        let value = optimizer::optimized(value);
        let Some(bound) = self.bind_keyframes(context, &value, None) else {
            return;
        };
        let animation = self.keyframe_animation(&bound, 1.0, Color::to_color8);
        let animation = self.graph.add(CompositionObject::ColorKeyFrameAnimation(animation));
        self.start_bound_animation(target, property, animation, bound);
    }

    pub(super) fn apply_path(
        &mut self,
        context: &TranslationContext,
        value: &Animatable<PathGeometry>,
        fill_rule: FillRule,
        target: NodeId,
        property: &str,
    ) {
        let value = optimizer::optimized(value);
        let Some(bound) = self.bind_keyframes(context, &value, None) else {
            return;
        };

        // Every keyframe value is its own path object.
        let mut animation = KeyFrameAnimation::new(self.duration);
        for keyframe in &bound.keyframes {
            if let BoundValue::Value(geometry) = &keyframe.value {
                let path = self.composition_path(geometry, fill_rule);
                animation.insert_key_frame(keyframe.progress as f32, path, keyframe.easing);
            }
        }
        let animation = self.graph.add(CompositionObject::PathKeyFrameAnimation(animation));
        self.start_bound_animation(target, property, animation, bound);
    }

    pub(super) fn apply_vector2(
        &mut self,
        context: &TranslationContext,
        value: &Animatable<DVec3>,
        target: NodeId,
        property: &str,
    ) {
        self.apply_scaled_vector2(context, value, 1.0, target, property);
    }

    pub(super) fn apply_scaled_vector2(
        &mut self,
        context: &TranslationContext,
        value: &Animatable<DVec3>,
        scale: f64,
        target: NodeId,
        property: &str,
    ) {
        let Some(bound) = self.bind_keyframes(context, value, Some(DVec3::truncate)) else {
            return;
        };
        let animation = self.keyframe_animation(&bound, scale, |v: &DVec3| {
            Vec2::new((v.x * scale) as f32, (v.y * scale) as f32)
        });
        let animation = self.graph.add(CompositionObject::Vector2KeyFrameAnimation(animation));
        self.start_bound_animation(target, property, animation, bound);
    }

    pub(super) fn apply_scaled_vector3(
        &mut self,
        context: &TranslationContext,
        value: &Animatable<DVec3>,
        scale: f64,
        target: NodeId,
        property: &str,
    ) {
        let Some(bound) = self.bind_keyframes(context, value, Some(DVec3::truncate)) else {
            return;
        };
        let animation =
            self.keyframe_animation(&bound, scale, |v: &DVec3| (*v * scale).as_vec3());
        let animation = self.graph.add(CompositionObject::Vector3KeyFrameAnimation(animation));
        self.start_bound_animation(target, property, animation, bound);
    }

    /// Places the keyframes of `value` that fall in the context's window on
    /// a 0..1 timeline. Returns `None` when nothing is animated in the
    /// window.
    ///
    /// When `position_of` is given, keyframes with spatial tangents follow
    /// their bezier through an expression of a per-keyframe `t` property on
    /// the root, unless the bezier is a straight line.
    fn bind_keyframes<T: Clone + PartialEq>(
        &mut self,
        context: &TranslationContext,
        value: &Animatable<T>,
        position_of: Option<fn(DVec3) -> DVec2>,
    ) -> Option<BoundAnimation<T>>
    where
        T: SpatialValue,
    {
        if !value.is_animated() {
            return None;
        }

        let keyframes = optimizer::trimmed(&value.keyframes, context.start_time, context.end_time());
        let (first, last) = (keyframes.first()?, keyframes.last()?);

        let mut bound = Vec::with_capacity(keyframes.len() + 2);
        let mut animation_start = first.frame;
        let mut animation_end = last.frame;

        // Hold the first value until the first keyframe.
        if first.frame > context.start_time {
            bound.push(BoundKeyFrame {
                progress: 0.0,
                value: BoundValue::Value(first.value.clone()),
                easing: self.linear_easing(),
            });
            animation_start = context.start_time;
        }
        if last.frame < context.end_time() {
            animation_end = context.end_time();
        }

        let animation_duration = animation_end - animation_start;
        if animation_duration <= 0.0 {
            return None;
        }
        let scale = context.duration_in_frames / animation_duration;
        let offset = (context.start_time - animation_start) / animation_duration;

        let mut previous_value = value.initial_value.clone();
        let mut previous_progress = -EPSILON;
        let mut previous_was_expression = false;
        let mut references_root = false;
        let mut progress_mapping: Option<(String, KeyFrameAnimation<f32>)> = None;

        for keyframe in &keyframes {
            let mut progress = (keyframe.frame - animation_start) / animation_duration;

            let spatial = match position_of {
                Some(position_of) if keyframe.is_spatial() => {
                    let cp0 = position_of(previous_value.as_dvec3());
                    let cp3 = position_of(keyframe.value.as_dvec3());
                    let cp1 = cp0 + keyframe.spatial_cp1.truncate();
                    let cp2 = cp3 + keyframe.spatial_cp2.truncate();
                    let curved = keyframe.easing != Easing::Hold
                        && !CubicBezierFunction::new(cp0, cp1, cp2, cp3, Expression::name("t"))
                            .is_colinear();
                    curved.then_some((cp0, cp1, cp2, cp3))
                }
                _ => None,
            };

            match spatial {
                Some((cp0, cp1, cp2, cp3)) => {
                    // Leave room for a jump keyframe right after this one so the
                    // expression is not evaluated in the next segment.
                    if progress > 0.0 {
                        progress -= EPSILON;
                    }

                    let jump = self.jump_easing();
                    let easing = self.easing(keyframe.easing);
                    let (name, mapping) =
                        progress_mapping.get_or_insert_with(|| self.create_progress_mapping());
                    if previous_progress > 0.0 {
                        mapping.insert_key_frame((previous_progress + EPSILON) as f32, 0.0, jump);
                    }
                    mapping.insert_key_frame(progress as f32, 1.0, easing);

                    let t = Expression::name(format!("{ROOT_NAME}.{name}"));
                    let bezier = CubicBezierFunction::new(cp0, cp1, cp2, cp3, t);
                    bound.push(BoundKeyFrame {
                        progress,
                        value: BoundValue::Expression(bezier.into()),
                        easing: jump,
                    });
                    references_root = true;
                    previous_was_expression = true;
                }
                None => {
                    if previous_was_expression {
                        bound.push(BoundKeyFrame {
                            progress: previous_progress + EPSILON,
                            value: BoundValue::Value(previous_value.clone()),
                            easing: self.jump_easing(),
                        });
                    }
                    bound.push(BoundKeyFrame {
                        progress,
                        value: BoundValue::Value(keyframe.value.clone()),
                        easing: self.easing(keyframe.easing),
                    });
                    previous_was_expression = false;
                }
            }

            previous_value = keyframe.value.clone();
            previous_progress = progress;
        }

        // Hold the final value once the last expression's span is over.
        if previous_was_expression && previous_progress < 1.0 {
            bound.push(BoundKeyFrame {
                progress: previous_progress + EPSILON,
                value: BoundValue::Value(previous_value),
                easing: self.jump_easing(),
            });
        }

        trace!(
            keyframes = bound.len(),
            scale,
            offset,
            spatial = references_root,
            "bound keyframes"
        );

        Some(BoundAnimation {
            keyframes: bound,
            scale,
            offset,
            references_root,
            progress_mapping,
        })
    }

    fn create_progress_mapping(&mut self) -> (String, KeyFrameAnimation<f32>) {
        let name = format!("t{}", self.t_counter);
        self.t_counter += 1;
        self.graph.insert_scalar(self.root, &name, 0.0);
        (name, KeyFrameAnimation::new(self.duration))
    }

    fn keyframe_animation<T, U>(
        &self,
        bound: &BoundAnimation<T>,
        scale: f64,
        value_of: impl Fn(&T) -> U,
    ) -> KeyFrameAnimation<U> {
        let mut animation = KeyFrameAnimation::new(self.duration);
        for keyframe in &bound.keyframes {
            let progress = keyframe.progress as f32;
            match &keyframe.value {
                BoundValue::Value(v) => animation.insert_key_frame(progress, value_of(v), keyframe.easing),
                BoundValue::Expression(e) => {
                    let text = if scale == 1.0 {
                        e.to_string()
                    } else {
                        Expression::multiply(Expression::number(scale), e.clone()).to_string()
                    };
                    animation.insert_expression_key_frame(progress, text, keyframe.easing);
                }
            }
        }
        if bound.references_root {
            animation.set_reference_parameter(ROOT_NAME, self.root);
        }
        animation
    }

    fn start_bound_animation<T>(
        &mut self,
        target: NodeId,
        property: &str,
        animation: NodeId,
        bound: BoundAnimation<T>,
    ) {
        self.start_keyframe_animation(target, property, animation, bound.scale, bound.offset);

        if let Some((name, mapping)) = bound.progress_mapping {
            let mapping = self.graph.add(CompositionObject::ScalarKeyFrameAnimation(mapping));
            let root_properties = self.graph.properties(self.root);
            self.start_keyframe_animation(root_properties, &name, mapping, 1.0, 0.0);
        }
    }

    /// Starts a keyframe animation with its controller paused and its
    /// progress bound to `_.Progress * scale + offset`.
    pub(super) fn start_keyframe_animation(
        &mut self,
        target: NodeId,
        property: &str,
        animation: NodeId,
        scale: f64,
        offset: f64,
    ) {
        let Some(controller) = self.graph.start_animation(target, property, animation) else {
            return;
        };

        let key = (scale.to_bits(), offset.to_bits());
        let binding = match self.progress_bindings.get(&key) {
            Some(binding) => *binding,
            None => {
                let mut expression = self.root_progress();
                if scale != 1.0 {
                    expression = Expression::multiply(expression, Expression::number(scale));
                }
                if offset != 0.0 {
                    expression = Expression::sum(expression, Expression::number(offset));
                }
                let mut binding = ExpressionAnimation::new(expression.to_string());
                binding.set_reference_parameter(ROOT_NAME, self.root);
                let binding = self.graph.add(CompositionObject::ExpressionAnimation(binding));
                self.progress_bindings.insert(key, binding);
                binding
            }
        };
        self.graph.start_animation(controller, "Progress", binding);
    }

    /// An expression animation with `my` referring to `target`, started on
    /// `property` of `target`.
    pub(super) fn start_expression_on(
        &mut self,
        target: NodeId,
        property: &str,
        expression: impl Into<String>,
        my: NodeId,
    ) {
        let mut animation = ExpressionAnimation::new(expression);
        animation.set_reference_parameter("my", my);
        let animation = self.graph.add(CompositionObject::ExpressionAnimation(animation));
        self.graph.start_animation(target, property, animation);
    }

    pub(super) fn easing(&mut self, easing: Easing) -> NodeId {
        match easing {
            Easing::Linear => self.linear_easing(),
            Easing::CubicBezier { cp1, cp2 } => self.cubic_bezier_easing(cp1, cp2),
            Easing::Hold => self.hold_easing(),
        }
    }

    pub(super) fn linear_easing(&mut self) -> NodeId {
        if let Some(easing) = self.linear_easing {
            return easing;
        }
        let easing = self.graph.add(CompositionObject::LinearEasing);
        self.linear_easing = Some(easing);
        easing
    }

    fn cubic_bezier_easing(&mut self, cp1: DVec2, cp2: DVec2) -> NodeId {
        // Control points outside 0..1 cannot be represented.
        let clamp = |p: DVec2| p.clamp(DVec2::ZERO, DVec2::ONE).as_vec2();
        let (control_point1, control_point2) = (clamp(cp1), clamp(cp2));
        let key = [control_point1, control_point2].map(|p| (p.x.to_bits(), p.y.to_bits()));
        if let Some(easing) = self.cubic_easings.get(&key) {
            return *easing;
        }
        let easing = self.graph.add(CompositionObject::CubicBezierEasing {
            control_point1,
            control_point2,
        });
        self.cubic_easings.insert(key, easing);
        easing
    }

    /// Holds the start value until the end of the step.
    fn hold_easing(&mut self) -> NodeId {
        if let Some(easing) = self.hold_easing {
            return easing;
        }
        let easing = self.graph.add(CompositionObject::step_easing(1, false, true));
        self.hold_easing = Some(easing);
        easing
    }

    /// Jumps to the end value at the start of the step.
    pub(super) fn jump_easing(&mut self) -> NodeId {
        if let Some(easing) = self.jump_easing {
            return easing;
        }
        let easing = self.graph.add(CompositionObject::step_easing(1, true, false));
        self.jump_easing = Some(easing);
        easing
    }
}

/// Values that may follow a spatial bezier.
pub(super) trait SpatialValue {
    fn as_dvec3(&self) -> DVec3;
}

impl SpatialValue for DVec3 {
    fn as_dvec3(&self) -> DVec3 {
        *self
    }
}

macro_rules! non_spatial {
    ($($ty:ty),*) => {
        $(impl SpatialValue for $ty {
            fn as_dvec3(&self) -> DVec3 {
                DVec3::ZERO
            }
        })*
    };
}

non_spatial!(f64, Color, PathGeometry);
