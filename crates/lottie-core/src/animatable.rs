use glam::{DVec2, DVec3};
use lottie_data::model::{
    BezierPath, BezierTangent, ColorRgba, Keyframe, PositionProperty, Property, Value,
    Vec3DefaultZero, Vec3Scale,
};

use crate::error::TranslateError;
use crate::graph::Color8;
use crate::issues::Issues;

/// Color with components in the 0..1 range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub a: f64,
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const fn from_argb(a: f64, r: f64, g: f64, b: f64) -> Self {
        Self { a, r, g, b }
    }

    pub fn to_color8(&self) -> Color8 {
        let c = |v: f64| (255.0 * v) as u8;
        Color8::from_argb(c(self.a), c(self.r), c(self.g), c(self.b))
    }

    /// Scales alpha by an opacity percentage.
    pub fn with_opacity_percent(&self, opacity: f64) -> Self {
        if opacity == 100.0 {
            *self
        } else {
            Self {
                a: self.a * opacity / 100.0,
                ..*self
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierSegment {
    pub cp1: DVec2,
    pub cp2: DVec2,
    pub vertex: DVec2,
}

/// A single figure of cubic bezier segments.
#[derive(Debug, Clone, PartialEq)]
pub struct PathGeometry {
    pub start: DVec2,
    pub beziers: Vec<BezierSegment>,
    pub closed: bool,
}

impl PathGeometry {
    pub fn from_bezier_path(path: &BezierPath) -> Self {
        let point = |p: &[f32; 2]| DVec2::new(p[0] as f64, p[1] as f64);
        let at = |list: &[[f32; 2]], i: usize| list.get(i).map(point).unwrap_or(DVec2::ZERO);

        let n = path.v.len();
        if n == 0 {
            return Self {
                start: DVec2::ZERO,
                beziers: Vec::new(),
                closed: path.c,
            };
        }

        let mut beziers = Vec::with_capacity(n);
        for i in 1..n {
            beziers.push(BezierSegment {
                cp1: at(&path.v, i - 1) + at(&path.o, i - 1),
                cp2: at(&path.v, i) + at(&path.i, i),
                vertex: at(&path.v, i),
            });
        }
        if path.c {
            beziers.push(BezierSegment {
                cp1: at(&path.v, n - 1) + at(&path.o, n - 1),
                cp2: at(&path.v, 0) + at(&path.i, 0),
                vertex: at(&path.v, 0),
            });
        }

        Self {
            start: at(&path.v, 0),
            beziers,
            closed: path.c,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    CubicBezier { cp1: DVec2, cp2: DVec2 },
    Hold,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyFrame<T> {
    pub frame: f64,
    pub value: T,
    pub spatial_cp1: DVec3,
    pub spatial_cp2: DVec3,
    pub easing: Easing,
}

impl<T> KeyFrame<T> {
    pub fn new(frame: f64, value: T, easing: Easing) -> Self {
        Self {
            frame,
            value,
            spatial_cp1: DVec3::ZERO,
            spatial_cp2: DVec3::ZERO,
            easing,
        }
    }

    pub fn with_value<U>(&self, value: U) -> KeyFrame<U> {
        KeyFrame {
            frame: self.frame,
            value,
            spatial_cp1: self.spatial_cp1,
            spatial_cp2: self.spatial_cp2,
            easing: self.easing,
        }
    }

    pub fn is_spatial(&self) -> bool {
        self.spatial_cp1 != DVec3::ZERO || self.spatial_cp2 != DVec3::ZERO
    }
}

/// A value that may vary over time.
#[derive(Debug, Clone, PartialEq)]
pub struct Animatable<T> {
    pub initial_value: T,
    pub keyframes: Vec<KeyFrame<T>>,
    pub property_index: Option<u32>,
}

impl<T: Clone + PartialEq> Animatable<T> {
    pub fn new(initial_value: T) -> Self {
        Self {
            initial_value,
            keyframes: Vec::new(),
            property_index: None,
        }
    }

    pub fn with_keyframes(
        initial_value: T,
        keyframes: Vec<KeyFrame<T>>,
        property_index: Option<u32>,
    ) -> Self {
        Self {
            initial_value,
            keyframes,
            property_index,
        }
    }

    pub fn is_animated(&self) -> bool {
        !self.keyframes.is_empty()
    }

    /// True if the value is `value` at every point in time.
    pub fn always_equals(&self, value: &T) -> bool {
        self.initial_value == *value && self.keyframes.iter().all(|k| k.value == *value)
    }

    pub fn map<U: Clone + PartialEq>(&self, f: impl Fn(&T) -> U) -> Animatable<U> {
        Animatable {
            initial_value: f(&self.initial_value),
            keyframes: self
                .keyframes
                .iter()
                .map(|k| k.with_value(f(&k.value)))
                .collect(),
            property_index: self.property_index,
        }
    }
}

/// A point property, animated either as one vector or per dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimatableVector3 {
    Unified(Animatable<DVec3>),
    Split {
        x: Animatable<f64>,
        y: Animatable<f64>,
        z: Animatable<f64>,
    },
}

impl AnimatableVector3 {
    pub fn initial_value(&self) -> DVec3 {
        match self {
            AnimatableVector3::Unified(v) => v.initial_value,
            AnimatableVector3::Split { x, y, z } => {
                DVec3::new(x.initial_value, y.initial_value, z.initial_value)
            }
        }
    }

    pub fn is_animated(&self) -> bool {
        match self {
            AnimatableVector3::Unified(v) => v.is_animated(),
            AnimatableVector3::Split { x, y, z } => {
                x.is_animated() || y.is_animated() || z.is_animated()
            }
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(self, AnimatableVector3::Split { .. })
    }
}

/// Converts a document property into an [`Animatable`].
///
/// Keyframe `i` in the result carries the easing and spatial tangents that
/// the document declares on entry `i - 1`. A terminal entry without a value
/// takes the preceding entry's end value.
fn convert<T, U>(
    prop: &Property<T>,
    default: U,
    value_of: impl Fn(&T) -> U,
    issues: &mut Issues,
) -> Result<Animatable<U>, TranslateError>
where
    U: Clone + PartialEq,
{
    if prop.has_expression() {
        issues.unsupported("Expressions are not supported.")?;
    }

    let keyframes = match &prop.k {
        Value::Default => return Ok(Animatable::new(default)),
        Value::Static(v) => return Ok(Animatable::new(value_of(v))),
        Value::Animated(keyframes) => read_keyframes(keyframes, &value_of),
    };

    Ok(match keyframes.len() {
        0 => Animatable::new(default),
        1 => Animatable::new(keyframes[0].value.clone()),
        _ => Animatable::with_keyframes(keyframes[0].value.clone(), keyframes, prop.ix),
    })
}

fn read_keyframes<T, U: Clone>(
    keyframes: &[Keyframe<T>],
    value_of: impl Fn(&T) -> U,
) -> Vec<KeyFrame<U>> {
    let mut result = Vec::with_capacity(keyframes.len());
    let mut easing = Easing::Linear;
    let mut end_value: Option<U> = None;
    let mut to = DVec3::ZERO;
    let mut ti = DVec3::ZERO;

    for (i, kf) in keyframes.iter().enumerate() {
        let frame = kf.t as f64;
        let is_final = i + 1 == keyframes.len();

        let start_value = match &kf.s {
            Some(s) => value_of(s),
            None if is_final => {
                if let Some(end) = end_value.take() {
                    result.push(KeyFrame {
                        frame,
                        value: end,
                        spatial_cp1: to,
                        spatial_cp2: ti,
                        easing,
                    });
                }
                break;
            }
            None => match &end_value {
                Some(end) => end.clone(),
                None => continue,
            },
        };

        result.push(KeyFrame {
            frame,
            value: start_value.clone(),
            spatial_cp1: to,
            spatial_cp2: ti,
            easing,
        });

        if let Some(tangent_in) = &kf.ti {
            ti = tangent_vector(tangent_in);
            to = kf.to.as_deref().map(tangent_vector).unwrap_or(DVec3::ZERO);
        }

        if kf.h == Some(1) {
            easing = Easing::Hold;
            end_value = Some(start_value);
        } else {
            easing = match (&kf.o, &kf.i) {
                (Some(o), Some(i)) => Easing::CubicBezier {
                    cp1: tangent_point(o),
                    cp2: tangent_point(i),
                },
                _ => Easing::Linear,
            };
            end_value = Some(kf.e.as_ref().map(&value_of).unwrap_or(start_value));
        }
    }

    result
}

fn tangent_vector(v: &[f32]) -> DVec3 {
    let at = |i: usize| v.get(i).copied().unwrap_or(0.0) as f64;
    DVec3::new(at(0), at(1), at(2))
}

fn tangent_point(t: &BezierTangent) -> DVec2 {
    DVec2::new(
        t.x.first().copied().unwrap_or(0.0) as f64,
        t.y.first().copied().unwrap_or(0.0) as f64,
    )
}

pub fn scalar(
    prop: &Property<f32>,
    default: f64,
    issues: &mut Issues,
) -> Result<Animatable<f64>, TranslateError> {
    convert(prop, default, |v| *v as f64, issues)
}

/// A 2D document value, as a vector with a zero `z`.
pub fn vector2(
    prop: &Property<[f32; 2]>,
    issues: &mut Issues,
) -> Result<Animatable<DVec3>, TranslateError> {
    convert(
        prop,
        DVec3::ZERO,
        |v| DVec3::new(v[0] as f64, v[1] as f64, 0.0),
        issues,
    )
}

pub fn vector3(
    prop: &PositionProperty,
    issues: &mut Issues,
) -> Result<AnimatableVector3, TranslateError> {
    match prop {
        PositionProperty::Unified(p) => Ok(AnimatableVector3::Unified(convert(
            p,
            DVec3::ZERO,
            |v: &Vec3DefaultZero| DVec3::new(v.0[0] as f64, v.0[1] as f64, v.0[2] as f64),
            issues,
        )?)),
        PositionProperty::Split { x, y, z } => Ok(AnimatableVector3::Split {
            x: scalar(x, 0.0, issues)?,
            y: scalar(y, 0.0, issues)?,
            z: match z {
                Some(z) => scalar(z, 0.0, issues)?,
                None => Animatable::new(0.0),
            },
        }),
    }
}

/// Scale as a percentage per axis.
pub fn scale(
    prop: &Property<Vec3Scale>,
    issues: &mut Issues,
) -> Result<Animatable<DVec3>, TranslateError> {
    convert(
        prop,
        DVec3::splat(100.0),
        |v| DVec3::new(v.0[0] as f64, v.0[1] as f64, v.0[2] as f64),
        issues,
    )
}

pub fn color(
    prop: &Property<ColorRgba>,
    issues: &mut Issues,
) -> Result<Animatable<Color>, TranslateError> {
    convert(
        prop,
        Color::from_argb(1.0, 0.0, 0.0, 0.0),
        |c| {
            let [r, g, b, a] = c.0.map(|v| v as f64);
            if [r, g, b, a].iter().any(|v| *v > 1.0) {
                Color::from_argb(a / 255.0, r / 255.0, g / 255.0, b / 255.0)
            } else {
                Color::from_argb(a, r, g, b)
            }
        },
        issues,
    )
}

pub fn path(
    prop: &Property<BezierPath>,
    issues: &mut Issues,
) -> Result<Animatable<PathGeometry>, TranslateError> {
    convert(
        prop,
        PathGeometry::from_bezier_path(&BezierPath::default()),
        PathGeometry::from_bezier_path,
        issues,
    )
}
