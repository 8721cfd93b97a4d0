use serde::{de::DeserializeOwned, de::SeqAccess, Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LottieJson {
    #[serde(default)]
    pub v: Option<String>,
    #[serde(default)]
    pub nm: Option<String>,
    pub ip: f32,
    pub op: f32,
    pub fr: f32,
    pub w: u32,
    pub h: u32,
    #[serde(default)]
    pub ddd: Option<u8>,
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub markers: Vec<Marker>,
}

impl LottieJson {
    pub fn is_3d(&self) -> bool {
        self.ddd == Some(1)
    }

    pub fn duration_in_frames(&self) -> f32 {
        self.op - self.ip
    }

    /// Looks up an asset by its `id`, as referenced from a layer's `refId`.
    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Layer {
    #[serde(default)]
    pub ty: u8, // 0..5
    #[serde(default)]
    pub ind: Option<u32>,
    #[serde(default)]
    pub parent: Option<u32>,
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub ip: f32,
    #[serde(default)]
    pub op: f32,
    #[serde(default)]
    pub st: f32, // Start time - defaults to 0 per Lottie spec
    #[serde(default = "default_one")]
    pub sr: f32, // Time stretch (1.0 = normal)
    #[serde(default)]
    pub ks: Transform,
    #[serde(default)]
    pub ao: Option<u8>, // Auto-orient
    #[serde(default)]
    pub tm: Option<Property<f32>>, // Time remap
    #[serde(default)]
    pub ddd: Option<u8>, // 3D Layer Flag (0=2D, 1=3D)
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub hd: bool, // Hidden
    #[serde(default)]
    pub bm: Option<u8>, // Blend mode
    #[serde(default)]
    pub tt: Option<u8>, // Matte mode
    #[serde(default, rename = "hasMask")]
    pub has_mask: Option<bool>,
    #[serde(default, rename = "masksProperties")]
    pub masks_properties: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub ef: Option<Vec<serde_json::Value>>, // Effects

    // Type specific
    #[serde(default, rename = "refId")]
    pub ref_id: Option<String>, // PreComp, Image
    #[serde(default)]
    pub w: Option<f32>, // PreComp
    #[serde(default)]
    pub h: Option<f32>, // PreComp
    #[serde(default, rename = "sc")]
    pub color: Option<String>, // Solid color, "#RRGGBB" or "#AARRGGBB"
    #[serde(default)]
    pub sw: Option<u32>, // Solid width
    #[serde(default)]
    pub sh: Option<u32>, // Solid height
    #[serde(default)]
    pub shapes: Option<Vec<Shape>>, // Shape Layer
}

fn default_one() -> f32 {
    1.0
}

/// Accepts `true`/`false` as well as the numeric `1`/`0` some exporters write.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    Ok(match v {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64() == Some(1.0),
        _ => false,
    })
}

impl Layer {
    pub fn kind(&self) -> Option<LayerKind> {
        LayerKind::from_ty(self.ty)
    }

    pub fn name(&self) -> &str {
        self.nm.as_deref().unwrap_or("")
    }

    pub fn is_3d(&self) -> bool {
        self.ddd == Some(1)
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.bm.map(BlendMode::from_bm).unwrap_or(BlendMode::Normal)
    }

    pub fn has_masks(&self) -> bool {
        self.has_mask == Some(true)
            || self.masks_properties.as_ref().is_some_and(|m| !m.is_empty())
    }

    /// Parses the solid color string into `[a, r, g, b]` in the 0..1 range.
    pub fn solid_color(&self) -> Option<[f32; 4]> {
        let hex = self.color.as_deref()?.trim_start_matches('#');
        let byte = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .map(|b| b as f32 / 255.0)
        };
        match hex.len() {
            8 => Some([byte(0)?, byte(2)?, byte(4)?, byte(6)?]),
            6 => Some([1.0, byte(0)?, byte(2)?, byte(4)?]),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    PreComp,
    Solid,
    Image,
    Null,
    Shape,
    Text,
}

impl LayerKind {
    pub fn from_ty(ty: u8) -> Option<Self> {
        match ty {
            0 => Some(LayerKind::PreComp),
            1 => Some(LayerKind::Solid),
            2 => Some(LayerKind::Image),
            3 => Some(LayerKind::Null),
            4 => Some(LayerKind::Shape),
            5 => Some(LayerKind::Text),
            _ => None,
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerKind::PreComp => "PreComp",
            LayerKind::Solid => "Solid",
            LayerKind::Image => "Image",
            LayerKind::Null => "Null",
            LayerKind::Shape => "Shape",
            LayerKind::Text => "Text",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
    Unknown(u8),
}

impl BlendMode {
    pub fn from_bm(bm: u8) -> Self {
        match bm {
            0 => BlendMode::Normal,
            1 => BlendMode::Multiply,
            2 => BlendMode::Screen,
            3 => BlendMode::Overlay,
            4 => BlendMode::Darken,
            5 => BlendMode::Lighten,
            6 => BlendMode::ColorDodge,
            7 => BlendMode::ColorBurn,
            8 => BlendMode::HardLight,
            9 => BlendMode::SoftLight,
            10 => BlendMode::Difference,
            11 => BlendMode::Exclusion,
            12 => BlendMode::Hue,
            13 => BlendMode::Saturation,
            14 => BlendMode::Color,
            15 => BlendMode::Luminosity,
            other => BlendMode::Unknown(other),
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlendMode::Unknown(v) => write!(f, "Unknown({v})"),
            other => write!(f, "{other:?}"),
        }
    }
}

// Shapes

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "ty")]
pub enum Shape {
    #[serde(rename = "gr")]
    Group(GroupShape),
    #[serde(rename = "rc")]
    Rect(RectShape),
    #[serde(rename = "el")]
    Ellipse(EllipseShape),
    #[serde(rename = "fl")]
    Fill(FillShape),
    #[serde(rename = "st")]
    Stroke(StrokeShape),
    #[serde(rename = "gf")]
    GradientFill(GradientShape),
    #[serde(rename = "gs")]
    GradientStroke(GradientShape),
    #[serde(rename = "tr")]
    Transform(TransformShape),
    #[serde(rename = "sh")]
    Path(PathShape),
    #[serde(rename = "tm")]
    Trim(TrimShape),
    #[serde(rename = "sr")]
    Polystar(NamedShape),
    #[serde(rename = "rp")]
    Repeater(NamedShape),
    #[serde(rename = "rd")]
    RoundCorners(RoundCornersShape),
    #[serde(rename = "mm")]
    MergePaths(MergePathsShape),
    #[serde(other)]
    Unknown,
}

impl Shape {
    pub fn name(&self) -> Option<&str> {
        match self {
            Shape::Group(s) => s.nm.as_deref(),
            Shape::Rect(s) => s.nm.as_deref(),
            Shape::Ellipse(s) => s.nm.as_deref(),
            Shape::Fill(s) => s.nm.as_deref(),
            Shape::Stroke(s) => s.nm.as_deref(),
            Shape::GradientFill(s) | Shape::GradientStroke(s) => s.nm.as_deref(),
            Shape::Transform(s) => s.nm.as_deref(),
            Shape::Path(s) => s.nm.as_deref(),
            Shape::Trim(s) => s.nm.as_deref(),
            Shape::Polystar(s) | Shape::Repeater(s) => s.nm.as_deref(),
            Shape::RoundCorners(s) => s.nm.as_deref(),
            Shape::MergePaths(s) => s.nm.as_deref(),
            Shape::Unknown => None,
        }
    }

    /// Hidden content is dropped before translation.
    pub fn is_hidden(&self) -> bool {
        match self {
            Shape::Group(s) => s.hd,
            Shape::Rect(s) => s.hd,
            Shape::Ellipse(s) => s.hd,
            Shape::Fill(s) => s.hd,
            Shape::Stroke(s) => s.hd,
            Shape::Path(s) => s.hd,
            _ => false,
        }
    }
}

/// Content the translator only needs to recognize, not read.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct NamedShape {
    #[serde(default)]
    pub nm: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MergePathsShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default = "default_merge_mode")]
    pub mm: u8,
}

fn default_merge_mode() -> u8 {
    1
}

impl MergePathsShape {
    pub fn mode(&self) -> Option<MergeMode> {
        MergeMode::from_mm(self.mm)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeMode {
    Merge,
    Add,
    Subtract,
    Intersect,
    ExcludeIntersections,
}

impl MergeMode {
    pub fn from_mm(mm: u8) -> Option<Self> {
        match mm {
            1 => Some(MergeMode::Merge),
            2 => Some(MergeMode::Add),
            3 => Some(MergeMode::Subtract),
            4 => Some(MergeMode::Intersect),
            5 => Some(MergeMode::ExcludeIntersections),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoundCornersShape {
    #[serde(default)]
    pub nm: Option<String>,
    pub r: Property<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GroupShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub hd: bool,
    #[serde(default)]
    pub it: Vec<Shape>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RectShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub hd: bool,
    pub s: Property<Vec2>,
    pub p: Property<Vec2>,
    #[serde(default)]
    pub r: Property<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EllipseShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub hd: bool,
    pub s: Property<Vec2>,
    pub p: Property<Vec2>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FillShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub hd: bool,
    #[serde(default)]
    pub c: Property<ColorRgba>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub r: Option<u8>,
}

impl FillShape {
    pub fn fill_rule(&self) -> FillRule {
        match self.r {
            Some(2) => FillRule::EvenOdd,
            _ => FillRule::NonZero,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StrokeShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub hd: bool,
    #[serde(default)]
    pub c: Property<ColorRgba>,
    #[serde(default)]
    pub w: Property<f32>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default = "default_line_style")]
    pub lc: u8,
    #[serde(default = "default_line_style")]
    pub lj: u8,
    #[serde(default)]
    pub ml: Option<f32>,
    #[serde(default)]
    pub d: Vec<DashProperty>,
}

fn default_line_style() -> u8 {
    1
}

impl StrokeShape {
    pub fn line_cap(&self) -> LineCap {
        match self.lc {
            2 => LineCap::Round,
            3 => LineCap::Projected,
            _ => LineCap::Butt,
        }
    }

    pub fn line_join(&self) -> LineJoin {
        match self.lj {
            2 => LineJoin::Round,
            3 => LineJoin::Bevel,
            _ => LineJoin::Miter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineCap {
    Butt,
    Round,
    Projected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DashProperty {
    #[serde(default)]
    pub n: Option<String>, // "d" dash, "g" gap, "o" offset
    pub v: Property<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GradientShape {
    #[serde(default)]
    pub nm: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PathShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub hd: bool,
    pub ks: Property<BezierPath>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TrimShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub s: Property<f32>,
    #[serde(default)]
    pub e: Property<f32>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub m: u8,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransformShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(flatten)]
    pub t: Transform,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Transform {
    #[serde(default)]
    pub a: PositionProperty, // Anchor: Vec3, default z=0
    #[serde(default)]
    pub p: PositionProperty, // Position: Vec3, default z=0
    #[serde(default)]
    pub s: Property<Vec3Scale>, // Scale in percent
    #[serde(default, alias = "r")]
    pub rz: Property<f32>, // Rotation Z in degrees
    #[serde(default)]
    pub o: Property<f32>, // Opacity in percent
}

/// A 2D/3D point property, either as one vector or as separately animated
/// dimensions (`"s": true` with `x`/`y`/`z`).
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum PositionProperty {
    Split {
        x: Property<f32>,
        y: Property<f32>,
        #[serde(default)]
        z: Option<Property<f32>>,
    },
    Unified(Property<Vec3DefaultZero>),
}

impl Default for PositionProperty {
    fn default() -> Self {
        PositionProperty::Unified(Property::default())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Property<T> {
    #[serde(default)]
    pub a: u8,
    #[serde(default)]
    #[serde(bound(deserialize = "T: DeserializeOwned"))]
    pub k: Value<T>,
    #[serde(default)]
    pub ix: Option<u32>,
    #[serde(default)]
    pub x: Option<String>, // Expression source
}

impl<T> Default for Property<T> {
    fn default() -> Self {
        Property {
            a: 0,
            k: Value::Default,
            ix: None,
            x: None,
        }
    }
}

impl<T> Property<T> {
    pub fn has_expression(&self) -> bool {
        self.x.as_deref().is_some_and(|x| !x.is_empty())
    }
}

#[derive(Debug, Serialize, Clone)]
pub enum Value<T> {
    Default,
    Static(T),
    Animated(Vec<Keyframe<T>>),
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Value<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = serde_json::Value::deserialize(deserializer)?;

        if v.is_null() {
            return Ok(Value::Default);
        }

        // Keyframe lists are arrays of objects carrying a "t".
        let looks_keyframed = v
            .as_array()
            .and_then(|a| a.first())
            .is_some_and(|first| first.get("t").is_some());
        if looks_keyframed {
            if let Ok(keyframes) = serde_json::from_value::<Vec<Keyframe<T>>>(v.clone()) {
                return Ok(Value::Animated(keyframes));
            }
        }

        if let Ok(val) = serde_json::from_value::<T>(v.clone()) {
            return Ok(Value::Static(val));
        }

        if let Ok(vec) = serde_json::from_value::<Vec<T>>(v) {
            if let Some(first) = vec.into_iter().next() {
                return Ok(Value::Static(first));
            }
        }

        Ok(Value::Default)
    }
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Value::Default
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Keyframe<T> {
    pub t: f32,
    #[serde(default, deserialize_with = "deserialize_keyframe_value")]
    pub s: Option<T>,
    #[serde(default, deserialize_with = "deserialize_keyframe_value")]
    pub e: Option<T>,
    #[serde(default)]
    pub i: Option<BezierTangent>,
    #[serde(default)]
    pub o: Option<BezierTangent>,
    #[serde(default)]
    pub to: Option<Vec<f32>>,
    #[serde(default)]
    pub ti: Option<Vec<f32>>,
    #[serde(default)]
    pub h: Option<u8>,
}

fn deserialize_keyframe_value<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    if v.is_null() {
        return Ok(None);
    }

    if let Ok(val) = serde_json::from_value(v.clone()) {
        return Ok(Some(val));
    }

    // Scalars and paths are wrapped in a one-element array in keyframes.
    if let Ok(vec) = serde_json::from_value::<Vec<T>>(v) {
        if let Some(first) = vec.into_iter().next() {
            return Ok(Some(first));
        }
    }

    Ok(None)
}

pub type Vec2 = [f32; 2];
pub type Vec3 = [f32; 3];

/// Bezier tangent control points for keyframe easing.
/// Matches both `{"x": [0.48], "y": [1]}` and `{"x": 0.48, "y": 1}`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BezierTangent {
    #[serde(deserialize_with = "deserialize_number_or_seq")]
    pub x: Vec<f32>,
    #[serde(deserialize_with = "deserialize_number_or_seq")]
    pub y: Vec<f32>,
}

fn deserialize_number_or_seq<'de, D>(deserializer: D) -> Result<Vec<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrSeq {
        Number(f32),
        Seq(Vec<f32>),
    }
    Ok(match NumberOrSeq::deserialize(deserializer)? {
        NumberOrSeq::Number(n) => vec![n],
        NumberOrSeq::Seq(v) => v,
    })
}

/// `[r, g, b]` or `[r, g, b, a]`. Alpha defaults to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorRgba(pub [f32; 4]);

impl Default for ColorRgba {
    fn default() -> Self {
        ColorRgba([0.0, 0.0, 0.0, 1.0])
    }
}

impl<'de> Deserialize<'de> for ColorRgba {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ColorVisitor;
        impl<'de> serde::de::Visitor<'de> for ColorVisitor {
            type Value = ColorRgba;
            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a sequence of 3 or 4 floats")
            }
            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let r: f32 = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(0, &self))?;
                let g: f32 = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(1, &self))?;
                let b: f32 = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(2, &self))?;
                let a = seq.next_element()?.unwrap_or(1.0);
                while seq.next_element::<f32>()?.is_some() {}
                Ok(ColorRgba([r, g, b, a]))
            }
        }
        deserializer.deserialize_seq(ColorVisitor)
    }
}

// Wrapper for Vec3 with Z defaulting to 0.0
#[derive(Debug, Clone, Serialize)]
pub struct Vec3DefaultZero(pub Vec3);

impl Default for Vec3DefaultZero {
    fn default() -> Self {
        Vec3DefaultZero([0.0, 0.0, 0.0])
    }
}

impl<'de> Deserialize<'de> for Vec3DefaultZero {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Vec3Visitor;
        impl<'de> serde::de::Visitor<'de> for Vec3Visitor {
            type Value = Vec3DefaultZero;
            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a sequence of 2 or 3 floats")
            }
            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let x = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(0, &self))?;
                let y = seq.next_element()?.unwrap_or(0.0);
                let z = seq.next_element()?.unwrap_or(0.0);
                while seq.next_element::<f32>()?.is_some() {}
                Ok(Vec3DefaultZero([x, y, z]))
            }
        }
        deserializer.deserialize_seq(Vec3Visitor)
    }
}

// Wrapper for Vec3 with Z defaulting to 100.0 (for Scale)
#[derive(Debug, Clone, Serialize)]
pub struct Vec3Scale(pub Vec3);

impl Default for Vec3Scale {
    fn default() -> Self {
        Vec3Scale([100.0, 100.0, 100.0])
    }
}

impl<'de> Deserialize<'de> for Vec3Scale {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Vec3ScaleVisitor;
        impl<'de> serde::de::Visitor<'de> for Vec3ScaleVisitor {
            type Value = Vec3Scale;
            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a sequence of 2 or 3 floats")
            }
            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let x = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(0, &self))?;
                let y = seq.next_element()?.unwrap_or(100.0);
                let z = seq.next_element()?.unwrap_or(100.0);
                while seq.next_element::<f32>()?.is_some() {}
                Ok(Vec3Scale([x, y, z]))
            }
        }
        deserializer.deserialize_seq(Vec3ScaleVisitor)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct BezierPath {
    #[serde(default)]
    pub c: bool,
    #[serde(default)]
    pub i: Vec<Vec2>,
    #[serde(default)]
    pub o: Vec<Vec2>,
    #[serde(default)]
    pub v: Vec<Vec2>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Asset {
    #[serde(deserialize_with = "deserialize_asset_id")]
    pub id: String,
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub layers: Option<Vec<Layer>>,
    #[serde(default)]
    pub w: Option<f32>,
    #[serde(default)]
    pub h: Option<f32>,
    #[serde(default)]
    pub u: Option<String>,
    #[serde(default)]
    pub p: Option<String>,
}

impl Asset {
    pub fn is_image(&self) -> bool {
        self.layers.is_none() && self.p.is_some()
    }
}

/// Older exporters write string ids, newer ones numbers.
fn deserialize_asset_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    match v {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "unexpected asset id: {other}"
        ))),
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Marker {
    #[serde(default)]
    pub cm: Option<String>,
    #[serde(default)]
    pub tm: Option<f32>,
    #[serde(default)]
    pub dr: Option<f32>,
}
