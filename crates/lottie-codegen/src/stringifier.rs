//! Literal formatting for the target languages.
//!
//! The generator never formats a value itself. Everything that ends up in
//! the output as a literal or a language keyword goes through a
//! [`Stringifier`], so one walk of the graph can be rendered in any target.

use std::time::Duration;

use glam::{Vec2, Vec3};
use lottie_core::graph::{
    Color8, FigureLoop, FilledRegionDetermination, GeometryCombine, Matrix3x2, StrokeCap,
    StrokeLineJoin,
};

/// Most decimals a non-integral float is written with.
const MAX_DECIMALS: usize = 9;

pub trait Stringifier {
    /// Member access through an object reference (`.` or `->`).
    fn deref(&self) -> &'static str;
    fn new_keyword(&self) -> &'static str;
    fn null(&self) -> &'static str;
    /// Enum member and static member access (`.` or `::`).
    fn scope_resolve(&self) -> &'static str;
    /// Type-inferred local declaration.
    fn var(&self) -> &'static str;
    /// Method appending to a collection property.
    fn list_add(&self) -> &'static str;

    fn color(&self, value: Color8) -> String;
    fn float(&self, value: f32) -> String;
    fn matrix3x2(&self, value: &Matrix3x2) -> String;
    fn string(&self, value: &str) -> String;
    fn time_span(&self, value: Duration) -> String;
    fn vector2(&self, value: Vec2) -> String;
    fn vector3(&self, value: Vec3) -> String;
    fn figure_loop(&self, value: FigureLoop) -> &'static str;
    fn filled_region_determination(&self, value: FilledRegionDetermination) -> &'static str;

    fn bool(&self, value: bool) -> &'static str {
        if value {
            "true"
        } else {
            "false"
        }
    }

    fn int(&self, value: i32) -> String {
        value.to_string()
    }

    fn geometry_combine(&self, value: GeometryCombine) -> String {
        let member = match value {
            GeometryCombine::Union => "Union",
            GeometryCombine::Exclude => "Exclude",
            GeometryCombine::Intersect => "Intersect",
            GeometryCombine::Xor => "Xor",
        };
        format!("CanvasGeometryCombine{}{member}", self.scope_resolve())
    }

    fn stroke_cap(&self, value: StrokeCap) -> String {
        let member = match value {
            StrokeCap::Flat => "Flat",
            StrokeCap::Square => "Square",
            StrokeCap::Round => "Round",
            StrokeCap::Triangle => "Triangle",
        };
        format!("CompositionStrokeCap{}{member}", self.scope_resolve())
    }

    fn stroke_line_join(&self, value: StrokeLineJoin) -> String {
        let member = match value {
            StrokeLineJoin::Miter => "Miter",
            StrokeLineJoin::Bevel => "Bevel",
            StrokeLineJoin::Round => "Round",
            StrokeLineJoin::MiterOrBevel => "MiterOrBevel",
        };
        format!("CompositionStrokeLineJoin{}{member}", self.scope_resolve())
    }
}

/// Formats a float literal. Integral values are written without decimals or
/// suffix; other values with at most nine decimals followed by `suffix`.
pub fn format_float(value: f32, suffix: &str) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 {
        return value.to_string();
    }

    let mut text = value.to_string();
    let decimals = text.find('.').map(|dot| text.len() - dot - 1).unwrap_or(0);
    if decimals > MAX_DECIMALS {
        text = format!("{value:.prec$}", prec = MAX_DECIMALS);
        text = text.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    if text == "0" || text == "-0" {
        return "0".to_string();
    }
    format!("{text}{suffix}")
}

/// Number of 100ns ticks in `value`.
pub fn ticks(value: Duration) -> u128 {
    value.as_nanos() / 100
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn hex(value: u8) -> String {
    format!("0x{value:02X}")
}

/// C# literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct CSharpStringifier;

impl Stringifier for CSharpStringifier {
    fn deref(&self) -> &'static str {
        "."
    }

    fn new_keyword(&self) -> &'static str {
        "new"
    }

    fn null(&self) -> &'static str {
        "null"
    }

    fn scope_resolve(&self) -> &'static str {
        "."
    }

    fn var(&self) -> &'static str {
        "var"
    }

    fn list_add(&self) -> &'static str {
        "Add"
    }

    fn color(&self, value: Color8) -> String {
        format!(
            "Color.FromArgb({}, {}, {}, {})",
            hex(value.a),
            hex(value.r),
            hex(value.g),
            hex(value.b)
        )
    }

    fn float(&self, value: f32) -> String {
        format_float(value, "F")
    }

    fn matrix3x2(&self, value: &Matrix3x2) -> String {
        format!(
            "new Matrix3x2({}, {}, {}, {}, {}, {})",
            self.float(value.m11),
            self.float(value.m12),
            self.float(value.m21),
            self.float(value.m22),
            self.float(value.m31),
            self.float(value.m32)
        )
    }

    fn string(&self, value: &str) -> String {
        quoted(value)
    }

    fn time_span(&self, value: Duration) -> String {
        format!("TimeSpan.FromTicks({})", ticks(value))
    }

    fn vector2(&self, value: Vec2) -> String {
        format!("new Vector2({}, {})", self.float(value.x), self.float(value.y))
    }

    fn vector3(&self, value: Vec3) -> String {
        format!(
            "new Vector3({}, {}, {})",
            self.float(value.x),
            self.float(value.y),
            self.float(value.z)
        )
    }

    fn figure_loop(&self, value: FigureLoop) -> &'static str {
        match value {
            FigureLoop::Open => "CanvasFigureLoop.Open",
            FigureLoop::Closed => "CanvasFigureLoop.Closed",
        }
    }

    fn filled_region_determination(&self, value: FilledRegionDetermination) -> &'static str {
        match value {
            FilledRegionDetermination::Alternate => "CanvasFilledRegionDetermination.Alternate",
            FilledRegionDetermination::Winding => "CanvasFilledRegionDetermination.Winding",
        }
    }
}

/// C++/CX literals. Path figures are written for a Direct2D geometry sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct CppStringifier;

impl CppStringifier {
    /// A point as a brace initializer, for Direct2D structs.
    pub fn vector2_raw(&self, value: Vec2) -> String {
        format!("{{{}, {}}}", self.float(value.x), self.float(value.y))
    }

    pub fn combine_mode(&self, value: GeometryCombine) -> &'static str {
        match value {
            GeometryCombine::Union => "D2D1_COMBINE_MODE_UNION",
            GeometryCombine::Exclude => "D2D1_COMBINE_MODE_EXCLUDE",
            GeometryCombine::Intersect => "D2D1_COMBINE_MODE_INTERSECT",
            GeometryCombine::Xor => "D2D1_COMBINE_MODE_XOR",
        }
    }

    /// A Direct2D transform, which is a different type from `float3x2`.
    pub fn d2d_matrix(&self, value: &Matrix3x2) -> String {
        if value.is_identity() {
            return "D2D1::Matrix3x2F::Identity()".to_string();
        }
        format!(
            "D2D1::Matrix3x2F({}, {}, {}, {}, {}, {})",
            self.float(value.m11),
            self.float(value.m12),
            self.float(value.m21),
            self.float(value.m22),
            self.float(value.m31),
            self.float(value.m32)
        )
    }
}

impl Stringifier for CppStringifier {
    fn deref(&self) -> &'static str {
        "->"
    }

    fn new_keyword(&self) -> &'static str {
        "ref new"
    }

    fn null(&self) -> &'static str {
        "nullptr"
    }

    fn scope_resolve(&self) -> &'static str {
        "::"
    }

    fn var(&self) -> &'static str {
        "auto"
    }

    fn list_add(&self) -> &'static str {
        "Append"
    }

    fn color(&self, value: Color8) -> String {
        format!(
            "ColorHelper::FromArgb({}, {}, {}, {})",
            hex(value.a),
            hex(value.r),
            hex(value.g),
            hex(value.b)
        )
    }

    fn float(&self, value: f32) -> String {
        format_float(value, "F")
    }

    fn matrix3x2(&self, value: &Matrix3x2) -> String {
        format!(
            "float3x2({}, {}, {}, {}, {}, {})",
            self.float(value.m11),
            self.float(value.m12),
            self.float(value.m21),
            self.float(value.m22),
            self.float(value.m31),
            self.float(value.m32)
        )
    }

    fn string(&self, value: &str) -> String {
        format!("L{}", quoted(value))
    }

    fn time_span(&self, value: Duration) -> String {
        format!("TimeSpan{{{}L}}", ticks(value))
    }

    fn vector2(&self, value: Vec2) -> String {
        format!("float2({}, {})", self.float(value.x), self.float(value.y))
    }

    fn vector3(&self, value: Vec3) -> String {
        format!(
            "float3({}, {}, {})",
            self.float(value.x),
            self.float(value.y),
            self.float(value.z)
        )
    }

    fn figure_loop(&self, value: FigureLoop) -> &'static str {
        match value {
            FigureLoop::Open => "D2D1_FIGURE_END_OPEN",
            FigureLoop::Closed => "D2D1_FIGURE_END_CLOSED",
        }
    }

    fn filled_region_determination(&self, value: FilledRegionDetermination) -> &'static str {
        match value {
            FilledRegionDetermination::Alternate => "D2D1_FILL_MODE_ALTERNATE",
            FilledRegionDetermination::Winding => "D2D1_FILL_MODE_WINDING",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_formatting() {
        assert_eq!(format_float(0.0, "F"), "0");
        assert_eq!(format_float(-0.0, "F"), "0");
        assert_eq!(format_float(100.0, "F"), "100");
        assert_eq!(format_float(-3.0, "F"), "-3");
        assert_eq!(format_float(0.5, "F"), "0.5F");
        assert_eq!(format_float(-0.25, "F"), "-0.25F");
        assert_eq!(format_float(0.1, ""), "0.1");
        assert_eq!(format_float(1e-12, "F"), "0");
    }

    #[test]
    fn test_csharp_literals() {
        let s = CSharpStringifier;
        assert_eq!(
            s.color(Color8::from_argb(255, 255, 0, 16)),
            "Color.FromArgb(0xFF, 0xFF, 0x00, 0x10)"
        );
        assert_eq!(s.vector2(Vec2::new(1.5, 2.0)), "new Vector2(1.5F, 2)");
        assert_eq!(s.time_span(Duration::from_secs(2)), "TimeSpan.FromTicks(20000000)");
        assert_eq!(s.string("'a'.Contents"), "\"'a'.Contents\"");
        assert_eq!(s.stroke_cap(StrokeCap::Round), "CompositionStrokeCap.Round");
        assert_eq!(
            s.matrix3x2(&Matrix3x2::IDENTITY),
            "new Matrix3x2(1, 0, 0, 1, 0, 0)"
        );
    }

    #[test]
    fn test_cpp_literals() {
        let s = CppStringifier;
        assert_eq!(s.vector3(Vec3::new(0.0, 1.0, 0.5)), "float3(0, 1, 0.5F)");
        assert_eq!(s.vector2_raw(Vec2::new(3.0, 4.0)), "{3, 4}");
        assert_eq!(s.string("Progress"), "L\"Progress\"");
        assert_eq!(s.time_span(Duration::from_millis(1)), "TimeSpan{10000L}");
        assert_eq!(
            s.geometry_combine(GeometryCombine::Xor),
            "CanvasGeometryCombine::Xor"
        );
        assert_eq!(s.stroke_line_join(StrokeLineJoin::Bevel), "CompositionStrokeLineJoin::Bevel");
    }

    #[test]
    fn test_direct2d_literals() {
        let s = CppStringifier;
        assert_eq!(s.combine_mode(GeometryCombine::Exclude), "D2D1_COMBINE_MODE_EXCLUDE");
        assert_eq!(s.d2d_matrix(&Matrix3x2::IDENTITY), "D2D1::Matrix3x2F::Identity()");

        let shifted = Matrix3x2 {
            m31: 10.0,
            m32: -2.5,
            ..Matrix3x2::IDENTITY
        };
        assert_eq!(s.d2d_matrix(&shifted), "D2D1::Matrix3x2F(1, 0, 0, 1, 10, -2.5F)");
    }
}
