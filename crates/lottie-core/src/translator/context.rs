//! Scoping state threaded through layer and shape translation.

use lottie_data::model::{
    self as data, FillRule, Layer, LineCap, LineJoin, LottieJson, RoundCornersShape,
};

use crate::animatable::{self, Animatable, Color};
use crate::error::TranslateError;
use crate::issues::Issues;

/// The layer collection being translated and its window onto the shared
/// progress axis. Each precomp gets its own context.
#[derive(Debug, Clone, Copy)]
pub struct TranslationContext<'a> {
    pub layers: &'a [Layer],
    pub width: f64,
    pub height: f64,
    pub start_time: f64,
    pub duration_in_frames: f64,
}

impl<'a> TranslationContext<'a> {
    pub fn root(document: &'a LottieJson) -> Self {
        Self {
            layers: &document.layers,
            width: document.w as f64,
            height: document.h as f64,
            start_time: document.ip as f64,
            duration_in_frames: document.duration_in_frames() as f64,
        }
    }

    /// Context for the layers referenced by a precomp layer. The window is
    /// shifted by the layer's start time but keeps the same duration, so all
    /// nested content shares one progress axis.
    pub fn for_precomp(&self, layer: &Layer, layers: &'a [Layer]) -> Self {
        Self {
            layers,
            width: layer.w.map(f64::from).unwrap_or(self.width),
            height: layer.h.map(f64::from).unwrap_or(self.height),
            start_time: self.start_time - layer.st as f64,
            duration_in_frames: self.duration_in_frames,
        }
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration_in_frames
    }

    /// Maps a frame in this context onto the progress axis.
    pub fn progress_of(&self, frame: f64) -> f64 {
        (frame - self.start_time) / self.duration_in_frames
    }

    pub fn layer_by_index(&self, ind: u32) -> Option<&'a Layer> {
        self.layers.iter().find(|l| l.ind == Some(ind))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolidFill {
    pub color: Animatable<Color>,
    pub opacity_percent: Animatable<f64>,
    pub fill_rule: FillRule,
}

impl SolidFill {
    pub fn read(shape: &data::FillShape, issues: &mut Issues) -> Result<Self, TranslateError> {
        Ok(Self {
            color: animatable::color(&shape.c, issues)?,
            opacity_percent: animatable::scalar(&shape.o, 100.0, issues)?,
            fill_rule: shape.fill_rule(),
        })
    }

    fn is_opaque(&self) -> bool {
        !self.opacity_percent.is_animated()
            && self.opacity_percent.initial_value == 100.0
            && !self.color.is_animated()
            && self.color.initial_value.a == 1.0
    }

    fn is_transparent(&self) -> bool {
        self.opacity_percent.always_equals(&0.0)
            || (!self.color.is_animated() && self.color.initial_value.a == 0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolidStroke {
    pub color: Animatable<Color>,
    pub opacity_percent: Animatable<f64>,
    pub thickness: Animatable<f64>,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f64,
    pub dash_pattern: Vec<f64>,
    pub dash_offset: Animatable<f64>,
}

impl SolidStroke {
    pub fn read(shape: &data::StrokeShape, issues: &mut Issues) -> Result<Self, TranslateError> {
        let mut dash_pattern = Vec::new();
        let mut dash_offset = Animatable::new(0.0);
        for dash in &shape.d {
            match dash.n.as_deref() {
                Some("o") => dash_offset = animatable::scalar(&dash.v, 0.0, issues)?,
                Some("d") | Some("g") => {
                    dash_pattern.push(animatable::scalar(&dash.v, 0.0, issues)?.initial_value)
                }
                _ => {}
            }
        }

        Ok(Self {
            color: animatable::color(&shape.c, issues)?,
            opacity_percent: animatable::scalar(&shape.o, 100.0, issues)?,
            thickness: animatable::scalar(&shape.w, 1.0, issues)?,
            line_cap: shape.line_cap(),
            line_join: shape.line_join(),
            // After Effects defaults the miter limit to 4.
            miter_limit: shape.ml.map(f64::from).unwrap_or(4.0),
            dash_pattern,
            dash_offset,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrimPath {
    pub start_percent: Animatable<f64>,
    pub end_percent: Animatable<f64>,
    pub offset_degrees: Animatable<f64>,
}

impl TrimPath {
    pub fn read(shape: &data::TrimShape, issues: &mut Issues) -> Result<Self, TranslateError> {
        Ok(Self {
            start_percent: animatable::scalar(&shape.s, 0.0, issues)?,
            end_percent: animatable::scalar(&shape.e, 100.0, issues)?,
            offset_degrees: animatable::scalar(&shape.o, 0.0, issues)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundedCorner {
    pub radius: Animatable<f64>,
}

impl RoundedCorner {
    pub fn read(shape: &RoundCornersShape, issues: &mut Issues) -> Result<Self, TranslateError> {
        Ok(Self {
            radius: animatable::scalar(&shape.r, 0.0, issues)?,
        })
    }

    pub fn is_static(&self) -> bool {
        !self.radius.is_animated()
    }
}

/// Fill, stroke, trim and rounding in effect for shape content, plus the
/// opacity inherited from enclosing transforms.
///
/// Groups translate with a clone so that siblings never observe each
/// other's updates.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeContentContext {
    pub fill: Option<SolidFill>,
    pub stroke: Option<SolidStroke>,
    pub trim: Option<TrimPath>,
    pub rounded_corner: Option<RoundedCorner>,
    pub opacity_percent: Animatable<f64>,
}

impl Default for ShapeContentContext {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            trim: None,
            rounded_corner: None,
            opacity_percent: Animatable::new(100.0),
        }
    }
}

impl ShapeContentContext {
    pub fn with_opacity(opacity_percent: Animatable<f64>) -> Self {
        Self {
            opacity_percent,
            ..Self::default()
        }
    }

    pub fn update_fill(&mut self, fill: SolidFill, issues: &mut Issues) -> Result<(), TranslateError> {
        self.fill = Some(match self.fill.take() {
            None => fill,
            Some(_) if fill.is_opaque() => fill,
            Some(existing) if fill.is_transparent() => existing,
            Some(_) => {
                issues.unsupported("Multiple fills")?;
                fill
            }
        });
        Ok(())
    }

    pub fn update_stroke(
        &mut self,
        stroke: SolidStroke,
        issues: &mut Issues,
    ) -> Result<(), TranslateError> {
        self.stroke = Some(match self.stroke.take() {
            None => stroke,
            Some(existing) => {
                let covers = !existing.thickness.is_animated()
                    && !stroke.thickness.is_animated()
                    && existing.dash_pattern.is_empty()
                    && stroke.dash_pattern.is_empty()
                    && existing.opacity_percent.always_equals(&100.0)
                    && stroke.opacity_percent.always_equals(&100.0)
                    && existing.thickness.initial_value >= stroke.thickness.initial_value;
                if covers {
                    // The wider opaque stroke on top hides the other one.
                    existing
                } else {
                    issues.unsupported("Multiple strokes")?;
                    stroke
                }
            }
        });
        Ok(())
    }

    pub fn update_trim(&mut self, trim: TrimPath, issues: &mut Issues) -> Result<(), TranslateError> {
        if self.trim.is_some() {
            issues.unsupported("Multiple trim paths")?;
        }
        self.trim = Some(trim);
        Ok(())
    }

    pub fn update_rounded_corner(
        &mut self,
        rounded_corner: RoundedCorner,
        issues: &mut Issues,
    ) -> Result<(), TranslateError> {
        if self.rounded_corner.is_some() && !rounded_corner.is_static() {
            issues.unsupported("Multiple animated rounded corners")?;
        }
        self.rounded_corner = Some(rounded_corner);
        Ok(())
    }

    /// Folds a transform's opacity into the inherited opacity.
    pub fn update_opacity(
        &mut self,
        opacity_percent: &Animatable<f64>,
        issues: &mut Issues,
    ) -> Result<(), TranslateError> {
        self.opacity_percent = compose_opacity_percents(&self.opacity_percent, opacity_percent, issues)?;
        Ok(())
    }
}

/// Multiplies two opacity percentages. Only one side may be animated.
pub fn compose_opacity_percents(
    a: &Animatable<f64>,
    b: &Animatable<f64>,
    issues: &mut Issues,
) -> Result<Animatable<f64>, TranslateError> {
    match (a.is_animated(), b.is_animated()) {
        (false, false) => Ok(Animatable::new(a.initial_value * b.initial_value / 100.0)),
        (true, true) => {
            issues.unsupported("Animation multiplication.")?;
            Ok(a.clone())
        }
        (true, false) => Ok(scale_percent(a, b.initial_value)),
        (false, true) => Ok(scale_percent(b, a.initial_value)),
    }
}

fn scale_percent(value: &Animatable<f64>, percent: f64) -> Animatable<f64> {
    if percent == 100.0 {
        value.clone()
    } else {
        value.map(|v| v * percent / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animatable::{Easing, KeyFrame};

    fn fill(alpha: f64, opacity: f64) -> SolidFill {
        SolidFill {
            color: Animatable::new(Color::from_argb(alpha, 1.0, 0.0, 0.0)),
            opacity_percent: Animatable::new(opacity),
            fill_rule: FillRule::NonZero,
        }
    }

    fn ramp(from: f64, to: f64) -> Animatable<f64> {
        Animatable::with_keyframes(
            from,
            vec![
                KeyFrame::new(0.0, from, Easing::Linear),
                KeyFrame::new(10.0, to, Easing::Linear),
            ],
            None,
        )
    }

    #[test]
    fn test_opaque_fill_replaces_existing() {
        let mut issues = Issues::new(false);
        let mut context = ShapeContentContext::default();
        context.update_fill(fill(1.0, 50.0), &mut issues).unwrap();
        context.update_fill(fill(1.0, 100.0), &mut issues).unwrap();
        assert_eq!(context.fill.unwrap().opacity_percent.initial_value, 100.0);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_transparent_fill_keeps_existing() {
        let mut issues = Issues::new(false);
        let mut context = ShapeContentContext::default();
        context.update_fill(fill(1.0, 50.0), &mut issues).unwrap();
        context.update_fill(fill(0.0, 100.0), &mut issues).unwrap();
        assert_eq!(context.fill.unwrap().opacity_percent.initial_value, 50.0);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_translucent_fills_are_reported() {
        let mut issues = Issues::new(false);
        let mut context = ShapeContentContext::default();
        context.update_fill(fill(1.0, 50.0), &mut issues).unwrap();
        context.update_fill(fill(1.0, 40.0), &mut issues).unwrap();
        assert_eq!(context.fill.unwrap().opacity_percent.initial_value, 40.0);
        assert_eq!(issues.into_vec(), vec!["Multiple fills"]);
    }

    #[test]
    fn test_clone_does_not_alias() {
        let mut issues = Issues::new(false);
        let parent = ShapeContentContext::default();
        let mut child = parent.clone();
        child.update_fill(fill(1.0, 100.0), &mut issues).unwrap();
        assert!(parent.fill.is_none());
        assert!(child.fill.is_some());
    }

    #[test]
    fn test_static_opacities_multiply() {
        let mut issues = Issues::new(false);
        let composed =
            compose_opacity_percents(&Animatable::new(50.0), &Animatable::new(50.0), &mut issues)
                .unwrap();
        assert_eq!(composed.initial_value, 25.0);
    }

    #[test]
    fn test_animated_opacity_is_scaled_by_static() {
        let mut issues = Issues::new(false);
        let composed =
            compose_opacity_percents(&Animatable::new(50.0), &ramp(0.0, 100.0), &mut issues)
                .unwrap();
        let values: Vec<_> = composed.keyframes.iter().map(|k| k.value).collect();
        assert_eq!(values, vec![0.0, 50.0]);

        compose_opacity_percents(&ramp(0.0, 100.0), &ramp(100.0, 0.0), &mut issues).unwrap();
        assert_eq!(issues.into_vec(), vec!["Animation multiplication."]);
    }
}
