//! Merges equivalent objects so each is generated once.
//!
//! Objects are grouped by a key describing everything a factory would write
//! for them. Keys of objects that refer to other objects (keyframe easings,
//! expression parameters, path sources) use the canonical form of those
//! objects, so the kinds are processed in dependency order. The first object
//! of each group in walk order becomes its canonical representative.

use std::collections::HashMap;
use std::time::Duration;

use lottie_core::graph::{
    CanvasGeometry, Color8, CompositionGraph, CompositionObject, FigureLoop,
    FilledRegionDetermination, GeometryProps, KeyFrameAnimation, KeyFrameValue, NodeId, PathCommand,
};
use tracing::debug;

use crate::object_graph::ObjectGraph;

/// Result of canonicalizing the objects of an [`ObjectGraph`].
#[derive(Debug, Clone, Default)]
pub struct Canonicalization {
    canonical: HashMap<NodeId, NodeId>,
    groups: HashMap<NodeId, Vec<NodeId>>,
}

impl Canonicalization {
    /// The representative of the group `id` belongs to.
    pub fn canonical(&self, id: NodeId) -> NodeId {
        self.canonical.get(&id).copied().unwrap_or(id)
    }

    pub fn is_canonical(&self, id: NodeId) -> bool {
        self.canonical(id) == id
    }

    /// Every object merged into the group of `id`, the representative first.
    pub fn group(&self, id: NodeId) -> &[NodeId] {
        self.groups
            .get(&self.canonical(id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct groups.
    pub fn canonical_count(&self) -> usize {
        self.canonical
            .iter()
            .filter(|(id, canonical)| id == canonical)
            .count()
    }
}

/// Groups the objects of `objects` into equivalence classes.
///
/// Objects carrying animations or property values are never merged. Comments
/// prevent merging unless `ignore_comments` is set.
pub fn canonicalize(
    graph: &CompositionGraph,
    objects: &ObjectGraph,
    ignore_comments: bool,
) -> Canonicalization {
    let mut result = Canonicalization::default();
    for &id in objects.nodes() {
        result.canonical.insert(id, id);
    }

    for kind in Kind::ORDER {
        let mut representatives: HashMap<Key, NodeId> = HashMap::new();
        for &id in objects.nodes() {
            if Kind::of(graph.object(id)) != Some(kind) || !is_mergeable(graph, id, ignore_comments) {
                continue;
            }
            let Some(key) = key(graph, &result, id) else {
                continue;
            };
            let representative = *representatives.entry(key).or_insert(id);
            result.canonical.insert(id, representative);
        }
    }

    for &id in objects.nodes() {
        let canonical = result.canonical(id);
        result.groups.entry(canonical).or_default().push(id);
    }

    debug!(
        objects = objects.len(),
        canonical = result.canonical_count(),
        "canonicalized object graph"
    );
    result
}

fn is_mergeable(graph: &CompositionGraph, id: NodeId, ignore_comments: bool) -> bool {
    let node = graph.node(id);
    let property_animators = node
        .properties
        .map(|set| !graph.node(set).animators.is_empty())
        .unwrap_or(false);
    (ignore_comments || node.comment.is_none())
        && node.animators.is_empty()
        && graph.property_values(id).is_none()
        && !property_animators
}

/// Object kinds in the order they are canonicalized. Easings come before the
/// animations that use them and canvas geometries before the paths wrapping
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    InsetClip,
    Geometry,
    CanvasGeometry,
    Path,
    Easing,
    ExpressionAnimation,
    KeyFrameAnimation,
    ColorBrush,
}

impl Kind {
    const ORDER: [Kind; 8] = [
        Kind::InsetClip,
        Kind::Geometry,
        Kind::CanvasGeometry,
        Kind::Path,
        Kind::Easing,
        Kind::ExpressionAnimation,
        Kind::KeyFrameAnimation,
        Kind::ColorBrush,
    ];

    fn of(object: &CompositionObject) -> Option<Kind> {
        match object {
            CompositionObject::InsetClip { .. } => Some(Kind::InsetClip),
            CompositionObject::EllipseGeometry { .. }
            | CompositionObject::RectangleGeometry { .. }
            | CompositionObject::RoundedRectangleGeometry { .. } => Some(Kind::Geometry),
            CompositionObject::CanvasGeometry(_) => Some(Kind::CanvasGeometry),
            CompositionObject::Path { .. } => Some(Kind::Path),
            CompositionObject::LinearEasing
            | CompositionObject::CubicBezierEasing { .. }
            | CompositionObject::StepEasing { .. } => Some(Kind::Easing),
            CompositionObject::ExpressionAnimation(_) => Some(Kind::ExpressionAnimation),
            CompositionObject::ScalarKeyFrameAnimation(_)
            | CompositionObject::Vector2KeyFrameAnimation(_)
            | CompositionObject::Vector3KeyFrameAnimation(_)
            | CompositionObject::ColorKeyFrameAnimation(_)
            | CompositionObject::PathKeyFrameAnimation(_) => Some(Kind::KeyFrameAnimation),
            CompositionObject::ColorBrush { .. } => Some(Kind::ColorBrush),
            _ => None,
        }
    }
}

/// Equality key of a mergeable object. Floats are compared by bit pattern
/// with negative zero folded into zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    InsetClip([u32; 4]),
    Ellipse {
        center: [u32; 2],
        radius: [u32; 2],
        trim: [u32; 3],
    },
    Rectangle {
        offset: Option<[u32; 2]>,
        size: [u32; 2],
        trim: [u32; 3],
    },
    RoundedRectangle {
        corner_radius: [u32; 2],
        offset: Option<[u32; 2]>,
        size: [u32; 2],
        trim: [u32; 3],
    },
    CanvasPath(Vec<CommandKey>),
    CanvasEllipse([u32; 4]),
    CanvasRoundedRectangle([u32; 6]),
    Path(NodeId),
    LinearEasing,
    CubicBezierEasing([u32; 4]),
    StepEasing {
        steps: [i32; 3],
        single_frame: [bool; 2],
    },
    Expression {
        expression: String,
        parameters: Vec<(String, NodeId)>,
    },
    KeyFrames {
        kind: &'static str,
        duration: Duration,
        parameters: Vec<(String, NodeId)>,
        frames: Vec<FrameKey>,
    },
    ColorBrush(Color8),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CommandKey {
    FilledRegion(FilledRegionDetermination),
    Begin([u32; 2]),
    Cubic([u32; 6]),
    End(FigureLoop),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FrameKey {
    progress: u32,
    value: ValueKey,
    easing: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ValueKey {
    Scalar(u32),
    Vector2([u32; 2]),
    Vector3([u32; 3]),
    Color(Color8),
    Path(NodeId),
    Expression(String),
}

fn bits(value: f32) -> u32 {
    if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}

fn vec2_bits(value: glam::Vec2) -> [u32; 2] {
    [bits(value.x), bits(value.y)]
}

fn trim_bits(geometry: &GeometryProps) -> [u32; 3] {
    [
        bits(geometry.trim_start),
        bits(geometry.trim_end),
        bits(geometry.trim_offset),
    ]
}

fn key(graph: &CompositionGraph, canonical: &Canonicalization, id: NodeId) -> Option<Key> {
    let key = match graph.object(id) {
        CompositionObject::InsetClip {
            left,
            top,
            right,
            bottom,
        } => Key::InsetClip([bits(*left), bits(*top), bits(*right), bits(*bottom)]),
        CompositionObject::EllipseGeometry {
            geometry,
            center,
            radius,
        } => Key::Ellipse {
            center: vec2_bits(*center),
            radius: vec2_bits(*radius),
            trim: trim_bits(geometry),
        },
        CompositionObject::RectangleGeometry {
            geometry,
            offset,
            size,
        } => Key::Rectangle {
            offset: offset.map(vec2_bits),
            size: vec2_bits(*size),
            trim: trim_bits(geometry),
        },
        CompositionObject::RoundedRectangleGeometry {
            geometry,
            corner_radius,
            offset,
            size,
        } => Key::RoundedRectangle {
            corner_radius: vec2_bits(*corner_radius),
            offset: offset.map(vec2_bits),
            size: vec2_bits(*size),
            trim: trim_bits(geometry),
        },
        CompositionObject::CanvasGeometry(CanvasGeometry::Path(commands)) => {
            Key::CanvasPath(commands.iter().map(command_key).collect())
        }
        CompositionObject::CanvasGeometry(CanvasGeometry::Ellipse {
            x,
            y,
            radius_x,
            radius_y,
        }) => Key::CanvasEllipse([bits(*x), bits(*y), bits(*radius_x), bits(*radius_y)]),
        CompositionObject::CanvasGeometry(CanvasGeometry::RoundedRectangle {
            x,
            y,
            w,
            h,
            radius_x,
            radius_y,
        }) => Key::CanvasRoundedRectangle([
            bits(*x),
            bits(*y),
            bits(*w),
            bits(*h),
            bits(*radius_x),
            bits(*radius_y),
        ]),
        CompositionObject::CanvasGeometry(CanvasGeometry::Combination { .. }) => return None,
        CompositionObject::Path { source } => Key::Path(canonical.canonical(*source)),
        CompositionObject::LinearEasing => Key::LinearEasing,
        CompositionObject::CubicBezierEasing {
            control_point1,
            control_point2,
        } => {
            let [a, b] = vec2_bits(*control_point1);
            let [c, d] = vec2_bits(*control_point2);
            Key::CubicBezierEasing([a, b, c, d])
        }
        CompositionObject::StepEasing {
            step_count,
            final_step,
            initial_step,
            is_final_step_single_frame,
            is_initial_step_single_frame,
        } => Key::StepEasing {
            steps: [*step_count, *final_step, *initial_step],
            single_frame: [*is_final_step_single_frame, *is_initial_step_single_frame],
        },
        CompositionObject::ExpressionAnimation(animation) => Key::Expression {
            expression: animation.expression.clone(),
            parameters: parameters(canonical, &animation.reference_parameters),
        },
        CompositionObject::ScalarKeyFrameAnimation(animation) => {
            keyframes_key("Scalar", canonical, animation, |v| ValueKey::Scalar(bits(*v)))
        }
        CompositionObject::Vector2KeyFrameAnimation(animation) => {
            keyframes_key("Vector2", canonical, animation, |v| ValueKey::Vector2(vec2_bits(*v)))
        }
        CompositionObject::Vector3KeyFrameAnimation(animation) => {
            keyframes_key("Vector3", canonical, animation, |v| {
                ValueKey::Vector3([bits(v.x), bits(v.y), bits(v.z)])
            })
        }
        CompositionObject::ColorKeyFrameAnimation(animation) => {
            keyframes_key("Color", canonical, animation, |v| ValueKey::Color(*v))
        }
        CompositionObject::PathKeyFrameAnimation(animation) => {
            keyframes_key("Path", canonical, animation, |v| {
                ValueKey::Path(canonical.canonical(*v))
            })
        }
        CompositionObject::ColorBrush { color } => Key::ColorBrush(*color),
        _ => return None,
    };
    Some(key)
}

fn command_key(command: &PathCommand) -> CommandKey {
    match command {
        PathCommand::SetFilledRegionDetermination(fill) => CommandKey::FilledRegion(*fill),
        PathCommand::BeginFigure(point) => CommandKey::Begin(vec2_bits(*point)),
        PathCommand::AddCubicBezier(cp1, cp2, end) => {
            let [a, b] = vec2_bits(*cp1);
            let [c, d] = vec2_bits(*cp2);
            let [e, f] = vec2_bits(*end);
            CommandKey::Cubic([a, b, c, d, e, f])
        }
        PathCommand::EndFigure(figure_loop) => CommandKey::End(*figure_loop),
    }
}

fn parameters(
    canonical: &Canonicalization,
    reference_parameters: &[(String, NodeId)],
) -> Vec<(String, NodeId)> {
    reference_parameters
        .iter()
        .map(|(name, value)| (name.clone(), canonical.canonical(*value)))
        .collect()
}

fn keyframes_key<T>(
    kind: &'static str,
    canonical: &Canonicalization,
    animation: &KeyFrameAnimation<T>,
    value_key: impl Fn(&T) -> ValueKey,
) -> Key {
    let frames = animation
        .keyframes
        .iter()
        .map(|keyframe| FrameKey {
            progress: bits(keyframe.progress),
            value: match &keyframe.value {
                KeyFrameValue::Value(value) => value_key(value),
                KeyFrameValue::Expression(expression) => ValueKey::Expression(expression.clone()),
            },
            easing: canonical.canonical(keyframe.easing),
        })
        .collect();
    Key::KeyFrames {
        kind,
        duration: animation.duration,
        parameters: parameters(canonical, &animation.reference_parameters),
        frames,
    }
}
