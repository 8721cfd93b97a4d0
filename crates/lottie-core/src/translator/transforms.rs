//! Layer and group transforms applied to container shapes and visuals.

use glam::{DVec3, Vec2, Vec3};
use lottie_data::model::Transform;

use super::context::TranslationContext;
use super::Translator;
use crate::animatable::{self, Animatable, AnimatableVector3};
use crate::error::TranslateError;
use crate::graph::NodeId;
use crate::issues::Issues;

/// A document transform with every property converted.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerTransform {
    pub anchor: AnimatableVector3,
    pub position: AnimatableVector3,
    pub scale_percent: Animatable<DVec3>,
    pub rotation_degrees: Animatable<f64>,
    pub opacity_percent: Animatable<f64>,
}

impl LayerTransform {
    pub fn read(transform: &Transform, issues: &mut Issues) -> Result<Self, TranslateError> {
        Ok(Self {
            anchor: animatable::vector3(&transform.a, issues)?,
            position: animatable::vector3(&transform.p, issues)?,
            scale_percent: animatable::scale(&transform.s, issues)?,
            rotation_degrees: animatable::scalar(&transform.rz, 0.0, issues)?,
            opacity_percent: animatable::scalar(&transform.o, 100.0, issues)?,
        })
    }

    /// Anchor and position live in a property set when either one moves.
    fn needs_property_set(&self) -> bool {
        self.anchor.is_animated()
            || self.position.is_animated()
            || self.anchor.is_split()
            || self.position.is_split()
    }

    fn offset_is_animated(&self) -> bool {
        self.anchor.is_animated() || self.position.is_animated()
    }
}

fn xy(v: DVec3) -> Vec2 {
    Vec2::new(v.x as f32, v.y as f32)
}

fn non_zero<T: PartialEq + Default>(v: T) -> Option<T> {
    (v != T::default()).then_some(v)
}

impl<'a> Translator<'a> {
    pub(super) fn apply_transform_to_shape(
        &mut self,
        context: &TranslationContext,
        transform: &LayerTransform,
        container: NodeId,
    ) {
        let anchor = xy(transform.anchor.initial_value());
        let position = xy(transform.position.initial_value());
        let scale = xy(transform.scale_percent.initial_value * 0.01);
        let rotation = transform.rotation_degrees.initial_value as f32;

        if transform.needs_property_set() {
            self.graph.insert_vector2(container, "Anchor", anchor);
            self.graph.insert_vector2(container, "Position", position);
        }

        if transform.anchor.is_animated() {
            self.start_expression_on(container, "CenterPoint", "my.Anchor", container);
        }
        if transform.offset_is_animated() {
            self.start_expression_on(container, "Offset", "my.Position-my.Anchor", container);
        }
        if let Some(shape) = self.graph.shape_mut(container) {
            if !transform.anchor.is_animated() {
                shape.center_point = non_zero(anchor);
            }
            if !transform.offset_is_animated() {
                shape.offset = non_zero(position - anchor);
            }
            shape.scale = (scale != Vec2::ONE).then_some(scale);
            shape.rotation_angle_in_degrees = non_zero(rotation);
        }

        self.apply_point(context, &transform.anchor, container, "Anchor");
        self.apply_point(context, &transform.position, container, "Position");
        self.apply_scaled_vector2(context, &transform.scale_percent, 0.01, container, "Scale");
        self.apply_scalar(
            context,
            &transform.rotation_degrees,
            container,
            "RotationAngleInDegrees",
        );
    }

    pub(super) fn apply_transform_to_visual(
        &mut self,
        context: &TranslationContext,
        transform: &LayerTransform,
        container: NodeId,
    ) {
        let anchor = xy(transform.anchor.initial_value());
        let position = xy(transform.position.initial_value());
        let scale = (transform.scale_percent.initial_value * 0.01).as_vec3();
        let rotation = transform.rotation_degrees.initial_value as f32;

        if transform.needs_property_set() {
            self.graph.insert_vector2(container, "Anchor", anchor);
            self.graph.insert_vector2(container, "Position", position);
        }

        if transform.anchor.is_animated() {
            self.start_expression_on(
                container,
                "CenterPoint",
                "Vector3(my.Anchor.X,my.Anchor.Y,0)",
                container,
            );
        }
        if transform.offset_is_animated() {
            self.start_expression_on(
                container,
                "Offset",
                "Vector3(my.Position.X-my.Anchor.X,my.Position.Y-my.Anchor.Y,0)",
                container,
            );
        }
        if let Some(visual) = self.graph.visual_mut(container) {
            if !transform.anchor.is_animated() {
                visual.center_point = non_zero(anchor.extend(0.0));
            }
            if !transform.offset_is_animated() {
                visual.offset = non_zero((position - anchor).extend(0.0));
            }
            visual.scale = (scale != Vec3::ONE).then_some(scale);
            visual.rotation_angle_in_degrees = non_zero(rotation);
        }

        self.apply_point(context, &transform.anchor, container, "Anchor");
        self.apply_point(context, &transform.position, container, "Position");
        self.apply_scaled_vector3(context, &transform.scale_percent, 0.01, container, "Scale");
        self.apply_scalar(
            context,
            &transform.rotation_degrees,
            container,
            "RotationAngleInDegrees",
        );
    }

    /// Layer opacity on a visual. Ancestors in a transform chain do not pass
    /// their opacity on, so this is applied to the layer's own node only.
    pub(super) fn apply_opacity_to_visual(
        &mut self,
        context: &TranslationContext,
        opacity_percent: &Animatable<f64>,
        visual: NodeId,
    ) {
        if !opacity_percent.is_animated() {
            let opacity = (opacity_percent.initial_value / 100.0) as f32;
            if let Some(props) = self.graph.visual_mut(visual) {
                props.opacity = (opacity != 1.0).then_some(opacity);
            }
            return;
        }
        if let Some(props) = self.graph.visual_mut(visual) {
            props.opacity = Some((opacity_percent.initial_value / 100.0) as f32);
        }
        self.apply_scaled_scalar(context, opacity_percent, 0.01, visual, "Opacity");
    }

    /// Animates an anchor or position property in the property set of
    /// `container`, per dimension when the document splits it.
    fn apply_point(
        &mut self,
        context: &TranslationContext,
        value: &AnimatableVector3,
        container: NodeId,
        property: &str,
    ) {
        if !value.is_animated() {
            return;
        }
        let properties = self.graph.properties(container);
        match value {
            AnimatableVector3::Unified(v) => self.apply_vector2(context, v, properties, property),
            AnimatableVector3::Split { x, y, .. } => {
                self.apply_scalar(context, x, properties, &format!("{property}.X"));
                self.apply_scalar(context, y, properties, &format!("{property}.Y"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_zero_filters_defaults() {
        assert_eq!(non_zero(0.0_f32), None);
        assert_eq!(non_zero(Vec2::new(1.0, 0.0)), Some(Vec2::new(1.0, 0.0)));
        assert_eq!(non_zero(Vec3::ZERO), None);
    }

    #[test]
    fn test_static_transform_needs_no_property_set() {
        let mut issues = Issues::new(false);
        let transform = LayerTransform::read(&Transform::default(), &mut issues).unwrap();
        assert!(!transform.needs_property_set());
        assert_eq!(transform.scale_percent.initial_value, DVec3::splat(100.0));
        assert_eq!(transform.opacity_percent.initial_value, 100.0);
    }
}
