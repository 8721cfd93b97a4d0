//! Color brushes and stroke properties for sprite shapes.

use lottie_data::model::{LineCap, LineJoin};

use super::context::{SolidFill, SolidStroke, TranslationContext};
use super::Translator;
use crate::animatable::{Animatable, Color};
use crate::error::TranslateError;
use crate::graph::{CompositionObject, NodeId, StrokeCap, StrokeLineJoin};
use crate::issues::Issues;

impl<'a> Translator<'a> {
    pub(super) fn fill_brush(
        &mut self,
        context: &TranslationContext,
        fill: Option<&SolidFill>,
        opacity_percent: &Animatable<f64>,
    ) -> Result<Option<NodeId>, TranslateError> {
        let Some(fill) = fill else {
            return Ok(None);
        };
        let color =
            multiply_color_by_opacity_percent(&fill.color, &fill.opacity_percent, &mut self.issues)?;
        self.animated_color_brush(context, &color, opacity_percent).map(Some)
    }

    pub(super) fn apply_stroke(
        &mut self,
        context: &TranslationContext,
        stroke: Option<&SolidStroke>,
        sprite: NodeId,
        opacity_percent: &Animatable<f64>,
    ) -> Result<(), TranslateError> {
        let Some(stroke) = stroke else {
            return Ok(());
        };
        if stroke.thickness.always_equals(&0.0) {
            return Ok(());
        }

        let color = multiply_color_by_opacity_percent(
            &stroke.color,
            &stroke.opacity_percent,
            &mut self.issues,
        )?;
        let brush = self.animated_color_brush(context, &color, opacity_percent)?;

        if let Some(shape) = self.graph.sprite_mut(sprite) {
            let cap = stroke_cap(stroke.line_cap);
            shape.stroke_brush = Some(brush);
            shape.stroke_thickness = stroke.thickness.initial_value as f32;
            shape.stroke_start_cap = cap;
            shape.stroke_end_cap = cap;
            shape.stroke_dash_cap = cap;
            shape.stroke_line_join = stroke_line_join(stroke.line_join);
            shape.stroke_miter_limit = stroke.miter_limit as f32;
            // Dash lengths cannot be animated.
            shape.stroke_dash_array = stroke.dash_pattern.iter().map(|d| *d as f32).collect();
            shape.stroke_dash_offset = stroke.dash_offset.initial_value as f32;
        }
        self.apply_scalar(context, &stroke.thickness, sprite, "StrokeThickness");
        self.apply_scalar(context, &stroke.dash_offset, sprite, "StrokeDashOffset");
        Ok(())
    }

    /// A brush of `color` scaled by `opacity_percent`. Animated results get
    /// their own brush; static ones share a brush per color.
    pub(super) fn animated_color_brush(
        &mut self,
        context: &TranslationContext,
        color: &Animatable<Color>,
        opacity_percent: &Animatable<f64>,
    ) -> Result<NodeId, TranslateError> {
        let color = multiply_color_by_opacity_percent(color, opacity_percent, &mut self.issues)?;
        if !color.is_animated() {
            return Ok(self.static_color_brush(color.initial_value));
        }

        let brush = self.graph.add(CompositionObject::ColorBrush {
            color: color.initial_value.to_color8(),
        });
        self.apply_color(context, &color, brush, "Color");
        Ok(brush)
    }

    pub(super) fn static_color_brush(&mut self, color: Color) -> NodeId {
        let color = color.to_color8();
        if let Some(brush) = self.color_brushes.get(&color) {
            return *brush;
        }
        let brush = self.graph.add(CompositionObject::ColorBrush { color });
        self.color_brushes.insert(color, brush);
        brush
    }
}

/// Folds an opacity percentage into a color's alpha. Only one of the two
/// may be animated.
pub fn multiply_color_by_opacity_percent(
    color: &Animatable<Color>,
    opacity_percent: &Animatable<f64>,
    issues: &mut Issues,
) -> Result<Animatable<Color>, TranslateError> {
    match (color.is_animated(), opacity_percent.is_animated()) {
        (false, false) => Ok(Animatable::new(
            color.initial_value.with_opacity_percent(opacity_percent.initial_value),
        )),
        (true, true) => {
            issues.unsupported("Opacity and color animated at the same time")?;
            Ok(color.clone())
        }
        (true, false) => {
            let opacity = opacity_percent.initial_value;
            let mut result = color.map(|c| c.with_opacity_percent(opacity));
            result.property_index = None;
            Ok(result)
        }
        (false, true) => {
            let base = color.initial_value;
            let mut result = opacity_percent.map(|o| base.with_opacity_percent(*o));
            result.property_index = None;
            Ok(result)
        }
    }
}

fn stroke_cap(cap: LineCap) -> StrokeCap {
    match cap {
        LineCap::Butt => StrokeCap::Flat,
        LineCap::Round => StrokeCap::Round,
        LineCap::Projected => StrokeCap::Square,
    }
}

fn stroke_line_join(join: LineJoin) -> StrokeLineJoin {
    match join {
        LineJoin::Bevel => StrokeLineJoin::Bevel,
        LineJoin::Miter => StrokeLineJoin::Miter,
        LineJoin::Round => StrokeLineJoin::Round,
    }
}
