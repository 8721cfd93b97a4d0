//! Arena of retained composition objects produced by the translator.
//!
//! Every object lives in a [`CompositionGraph`] and is addressed by a
//! [`NodeId`]. Cross references (children, brushes, easing functions,
//! expression reference parameters) are ids into the same arena, so the
//! graph can be walked, deduplicated and serialized without aliasing.

use glam::{Vec2, Vec3};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 8-bit ARGB color as consumed by color brushes and color animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color8 {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color8 {
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3x2 {
    pub m11: f32,
    pub m12: f32,
    pub m21: f32,
    pub m22: f32,
    pub m31: f32,
    pub m32: f32,
}

impl Matrix3x2 {
    pub const IDENTITY: Matrix3x2 = Matrix3x2 {
        m11: 1.0,
        m12: 0.0,
        m21: 0.0,
        m22: 1.0,
        m31: 0.0,
        m32: 0.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StrokeCap {
    #[default]
    Flat,
    Square,
    Round,
    Triangle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StrokeLineJoin {
    #[default]
    Miter,
    Bevel,
    Round,
    MiterOrBevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilledRegionDetermination {
    Alternate,
    Winding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FigureLoop {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryCombine {
    Union,
    Exclude,
    Intersect,
    Xor,
}

/// One recorded call on a path builder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    SetFilledRegionDetermination(FilledRegionDetermination),
    BeginFigure(Vec2),
    AddCubicBezier(Vec2, Vec2, Vec2),
    EndFigure(FigureLoop),
}

/// Device-independent geometry used as the source of a [`CompositionObject::Path`].
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasGeometry {
    Path(Vec<PathCommand>),
    Ellipse {
        x: f32,
        y: f32,
        radius_x: f32,
        radius_y: f32,
    },
    RoundedRectangle {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        radius_x: f32,
        radius_y: f32,
    },
    Combination {
        a: NodeId,
        b: NodeId,
        matrix: Matrix3x2,
        combine: GeometryCombine,
    },
}

/// Properties shared by every visual.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualProps {
    pub center_point: Option<Vec3>,
    pub clip: Option<NodeId>,
    pub offset: Option<Vec3>,
    pub opacity: Option<f32>,
    pub rotation_angle_in_degrees: Option<f32>,
    pub scale: Option<Vec3>,
    pub size: Option<Vec2>,
}

/// Properties shared by every shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeProps {
    pub center_point: Option<Vec2>,
    pub offset: Option<Vec2>,
    pub rotation_angle_in_degrees: Option<f32>,
    pub scale: Option<Vec2>,
    pub transform_matrix: Option<Matrix3x2>,
}

/// Trim properties shared by every geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryProps {
    pub trim_start: f32,
    pub trim_end: f32,
    pub trim_offset: f32,
}

impl Default for GeometryProps {
    fn default() -> Self {
        Self {
            trim_start: 0.0,
            trim_end: 1.0,
            trim_offset: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpriteShape {
    pub shape: ShapeProps,
    pub fill_brush: Option<NodeId>,
    pub geometry: Option<NodeId>,
    pub stroke_brush: Option<NodeId>,
    pub stroke_dash_cap: StrokeCap,
    pub stroke_dash_offset: f32,
    pub stroke_dash_array: Vec<f32>,
    pub stroke_end_cap: StrokeCap,
    pub stroke_line_join: StrokeLineJoin,
    pub stroke_start_cap: StrokeCap,
    pub stroke_miter_limit: f32,
    pub stroke_thickness: f32,
}

impl Default for SpriteShape {
    fn default() -> Self {
        Self {
            shape: ShapeProps::default(),
            fill_brush: None,
            geometry: None,
            stroke_brush: None,
            stroke_dash_cap: StrokeCap::Flat,
            stroke_dash_offset: 0.0,
            stroke_dash_array: Vec::new(),
            stroke_end_cap: StrokeCap::Flat,
            stroke_line_join: StrokeLineJoin::Miter,
            stroke_start_cap: StrokeCap::Flat,
            stroke_miter_limit: 1.0,
            stroke_thickness: 1.0,
        }
    }
}

/// Value of one keyframe in a keyframe animation.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyFrameValue<T> {
    Value(T),
    Expression(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationKeyFrame<T> {
    pub progress: f32,
    pub value: KeyFrameValue<T>,
    pub easing: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyFrameAnimation<T> {
    pub duration: Duration,
    pub reference_parameters: Vec<(String, NodeId)>,
    pub keyframes: Vec<AnimationKeyFrame<T>>,
}

impl<T> KeyFrameAnimation<T> {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            reference_parameters: Vec::new(),
            keyframes: Vec::new(),
        }
    }

    pub fn insert_key_frame(&mut self, progress: f32, value: T, easing: NodeId) {
        self.keyframes.push(AnimationKeyFrame {
            progress,
            value: KeyFrameValue::Value(value),
            easing,
        });
    }

    pub fn insert_expression_key_frame(
        &mut self,
        progress: f32,
        expression: impl Into<String>,
        easing: NodeId,
    ) {
        self.keyframes.push(AnimationKeyFrame {
            progress,
            value: KeyFrameValue::Expression(expression.into()),
            easing,
        });
    }

    pub fn set_reference_parameter(&mut self, key: impl Into<String>, node: NodeId) {
        let key = key.into();
        match self.reference_parameters.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = node,
            None => self.reference_parameters.push((key, node)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionAnimation {
    pub expression: String,
    pub reference_parameters: Vec<(String, NodeId)>,
}

impl ExpressionAnimation {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            reference_parameters: Vec::new(),
        }
    }

    pub fn set_reference_parameter(&mut self, key: impl Into<String>, node: NodeId) {
        let key = key.into();
        match self.reference_parameters.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = node,
            None => self.reference_parameters.push((key, node)),
        }
    }
}

/// Named scalar and vector values attached to another object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySet {
    pub scalars: Vec<(String, f32)>,
    pub vector2s: Vec<(String, Vec2)>,
}

impl PropertySet {
    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty() && self.vector2s.is_empty()
    }

    fn insert_scalar(&mut self, name: &str, value: f32) {
        match self.scalars.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value,
            None => self.scalars.push((name.to_string(), value)),
        }
    }

    fn insert_vector2(&mut self, name: &str, value: Vec2) {
        match self.vector2s.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value,
            None => self.vector2s.push((name.to_string(), value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompositionObject {
    ContainerVisual {
        visual: VisualProps,
        children: Vec<NodeId>,
    },
    ShapeVisual {
        visual: VisualProps,
        shapes: Vec<NodeId>,
    },
    ContainerShape {
        shape: ShapeProps,
        shapes: Vec<NodeId>,
    },
    SpriteShape(SpriteShape),
    EllipseGeometry {
        geometry: GeometryProps,
        center: Vec2,
        radius: Vec2,
    },
    PathGeometry {
        geometry: GeometryProps,
        path: Option<NodeId>,
    },
    RectangleGeometry {
        geometry: GeometryProps,
        offset: Option<Vec2>,
        size: Vec2,
    },
    RoundedRectangleGeometry {
        geometry: GeometryProps,
        corner_radius: Vec2,
        offset: Option<Vec2>,
        size: Vec2,
    },
    ColorBrush {
        color: Color8,
    },
    InsetClip {
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
    },
    ExpressionAnimation(ExpressionAnimation),
    ScalarKeyFrameAnimation(KeyFrameAnimation<f32>),
    Vector2KeyFrameAnimation(KeyFrameAnimation<Vec2>),
    Vector3KeyFrameAnimation(KeyFrameAnimation<Vec3>),
    ColorKeyFrameAnimation(KeyFrameAnimation<Color8>),
    PathKeyFrameAnimation(KeyFrameAnimation<NodeId>),
    LinearEasing,
    CubicBezierEasing {
        control_point1: Vec2,
        control_point2: Vec2,
    },
    StepEasing {
        step_count: i32,
        final_step: i32,
        initial_step: i32,
        is_final_step_single_frame: bool,
        is_initial_step_single_frame: bool,
    },
    PropertySet(PropertySet),
    AnimationController,
    /// Wraps a [`CompositionObject::CanvasGeometry`] node.
    Path {
        source: NodeId,
    },
    CanvasGeometry(CanvasGeometry),
}

impl CompositionObject {
    pub fn container_visual() -> Self {
        CompositionObject::ContainerVisual {
            visual: VisualProps::default(),
            children: Vec::new(),
        }
    }

    pub fn shape_visual() -> Self {
        CompositionObject::ShapeVisual {
            visual: VisualProps::default(),
            shapes: Vec::new(),
        }
    }

    pub fn container_shape() -> Self {
        CompositionObject::ContainerShape {
            shape: ShapeProps::default(),
            shapes: Vec::new(),
        }
    }

    pub fn step_easing(
        step_count: i32,
        is_initial_step_single_frame: bool,
        is_final_step_single_frame: bool,
    ) -> Self {
        CompositionObject::StepEasing {
            step_count,
            final_step: step_count,
            initial_step: 0,
            is_final_step_single_frame,
            is_initial_step_single_frame,
        }
    }

    /// The composition API type this object corresponds to. Used for naming
    /// generated factories and their return types.
    pub fn type_name(&self) -> &'static str {
        match self {
            CompositionObject::ContainerVisual { .. } => "ContainerVisual",
            CompositionObject::ShapeVisual { .. } => "ShapeVisual",
            CompositionObject::ContainerShape { .. } => "CompositionContainerShape",
            CompositionObject::SpriteShape(_) => "CompositionSpriteShape",
            CompositionObject::EllipseGeometry { .. } => "CompositionEllipseGeometry",
            CompositionObject::PathGeometry { .. } => "CompositionPathGeometry",
            CompositionObject::RectangleGeometry { .. } => "CompositionRectangleGeometry",
            CompositionObject::RoundedRectangleGeometry { .. } => {
                "CompositionRoundedRectangleGeometry"
            }
            CompositionObject::ColorBrush { .. } => "CompositionColorBrush",
            CompositionObject::InsetClip { .. } => "InsetClip",
            CompositionObject::ExpressionAnimation(_) => "ExpressionAnimation",
            CompositionObject::ScalarKeyFrameAnimation(_) => "ScalarKeyFrameAnimation",
            CompositionObject::Vector2KeyFrameAnimation(_) => "Vector2KeyFrameAnimation",
            CompositionObject::Vector3KeyFrameAnimation(_) => "Vector3KeyFrameAnimation",
            CompositionObject::ColorKeyFrameAnimation(_) => "ColorKeyFrameAnimation",
            CompositionObject::PathKeyFrameAnimation(_) => "PathKeyFrameAnimation",
            CompositionObject::LinearEasing => "LinearEasingFunction",
            CompositionObject::CubicBezierEasing { .. } => "CubicBezierEasingFunction",
            CompositionObject::StepEasing { .. } => "StepEasingFunction",
            CompositionObject::PropertySet(_) => "CompositionPropertySet",
            CompositionObject::AnimationController => "AnimationController",
            CompositionObject::Path { .. } => "CompositionPath",
            CompositionObject::CanvasGeometry(_) => "CanvasGeometry",
        }
    }

    pub fn is_keyframe_animation(&self) -> bool {
        matches!(
            self,
            CompositionObject::ScalarKeyFrameAnimation(_)
                | CompositionObject::Vector2KeyFrameAnimation(_)
                | CompositionObject::Vector3KeyFrameAnimation(_)
                | CompositionObject::ColorKeyFrameAnimation(_)
                | CompositionObject::PathKeyFrameAnimation(_)
        )
    }

    pub fn visual_mut(&mut self) -> Option<&mut VisualProps> {
        match self {
            CompositionObject::ContainerVisual { visual, .. }
            | CompositionObject::ShapeVisual { visual, .. } => Some(visual),
            _ => None,
        }
    }

    pub fn shape_mut(&mut self) -> Option<&mut ShapeProps> {
        match self {
            CompositionObject::ContainerShape { shape, .. } => Some(shape),
            CompositionObject::SpriteShape(sprite) => Some(&mut sprite.shape),
            _ => None,
        }
    }

    pub fn geometry_mut(&mut self) -> Option<&mut GeometryProps> {
        match self {
            CompositionObject::EllipseGeometry { geometry, .. }
            | CompositionObject::PathGeometry { geometry, .. }
            | CompositionObject::RectangleGeometry { geometry, .. }
            | CompositionObject::RoundedRectangleGeometry { geometry, .. } => Some(geometry),
            _ => None,
        }
    }
}

/// A running animation on one property of an object.
#[derive(Debug, Clone, PartialEq)]
pub struct Animator {
    pub property: String,
    pub animation: NodeId,
    /// Present for keyframe animations; the controller's own `Progress`
    /// is bound to the root progress by an expression.
    pub controller: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub object: CompositionObject,
    pub comment: Option<String>,
    pub properties: Option<NodeId>,
    pub animators: Vec<Animator>,
}

#[derive(Debug, Clone, Default)]
pub struct CompositionGraph {
    nodes: Vec<Node>,
}

impl CompositionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, object: CompositionObject) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            object,
            comment: None,
            properties: None,
            animators: Vec::new(),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn object(&self, id: NodeId) -> &CompositionObject {
        &self.nodes[id.index()].object
    }

    pub fn object_mut(&mut self, id: NodeId) -> &mut CompositionObject {
        &mut self.nodes[id.index()].object
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    pub fn set_comment(&mut self, id: NodeId, comment: impl Into<String>) {
        self.nodes[id.index()].comment = Some(comment.into());
    }

    pub fn comment(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.index()].comment.as_deref()
    }

    /// Returns the property set of `id`, creating it on first use.
    pub fn properties(&mut self, id: NodeId) -> NodeId {
        if let Some(existing) = self.nodes[id.index()].properties {
            return existing;
        }
        let set = self.add(CompositionObject::PropertySet(PropertySet::default()));
        self.nodes[id.index()].properties = Some(set);
        set
    }

    /// The property set values of `id`, if any were inserted.
    pub fn property_values(&self, id: NodeId) -> Option<&PropertySet> {
        let set = self.nodes[id.index()].properties?;
        match &self.nodes[set.index()].object {
            CompositionObject::PropertySet(values) if !values.is_empty() => Some(values),
            _ => None,
        }
    }

    pub fn insert_scalar(&mut self, id: NodeId, name: &str, value: f32) {
        let set = self.property_set_for(id);
        if let CompositionObject::PropertySet(values) = &mut self.nodes[set.index()].object {
            values.insert_scalar(name, value);
        }
    }

    pub fn insert_vector2(&mut self, id: NodeId, name: &str, value: Vec2) {
        let set = self.property_set_for(id);
        if let CompositionObject::PropertySet(values) = &mut self.nodes[set.index()].object {
            values.insert_vector2(name, value);
        }
    }

    // A property set holds its own values.
    fn property_set_for(&mut self, id: NodeId) -> NodeId {
        match self.nodes[id.index()].object {
            CompositionObject::PropertySet(_) => id,
            _ => self.properties(id),
        }
    }

    /// Starts `animation` on `property` of `target`. Keyframe animations get
    /// an animation controller, which is returned.
    pub fn start_animation(
        &mut self,
        target: NodeId,
        property: impl Into<String>,
        animation: NodeId,
    ) -> Option<NodeId> {
        let controller = if self.object(animation).is_keyframe_animation() {
            Some(self.add(CompositionObject::AnimationController))
        } else {
            None
        };
        self.nodes[target.index()].animators.push(Animator {
            property: property.into(),
            animation,
            controller,
        });
        controller
    }

    pub fn push_child(&mut self, container: NodeId, child: NodeId) {
        match &mut self.nodes[container.index()].object {
            CompositionObject::ContainerVisual { children, .. } => children.push(child),
            CompositionObject::ShapeVisual { shapes, .. }
            | CompositionObject::ContainerShape { shapes, .. } => shapes.push(child),
            _ => {}
        }
    }

    pub fn visual_mut(&mut self, id: NodeId) -> Option<&mut VisualProps> {
        self.nodes[id.index()].object.visual_mut()
    }

    pub fn shape_mut(&mut self, id: NodeId) -> Option<&mut ShapeProps> {
        self.nodes[id.index()].object.shape_mut()
    }

    pub fn geometry_mut(&mut self, id: NodeId) -> Option<&mut GeometryProps> {
        self.nodes[id.index()].object.geometry_mut()
    }

    pub fn sprite_mut(&mut self, id: NodeId) -> Option<&mut SpriteShape> {
        match &mut self.nodes[id.index()].object {
            CompositionObject::SpriteShape(sprite) => Some(sprite),
            _ => None,
        }
    }

    /// Children of a container visual, or shapes of a shape container.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.index()].object {
            CompositionObject::ContainerVisual { children, .. } => children,
            CompositionObject::ShapeVisual { shapes, .. }
            | CompositionObject::ContainerShape { shapes, .. } => shapes,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_set_created_once() {
        let mut graph = CompositionGraph::new();
        let shape = graph.add(CompositionObject::container_shape());
        graph.insert_vector2(shape, "Position", Vec2::new(1.0, 2.0));
        graph.insert_vector2(shape, "Position", Vec2::new(3.0, 4.0));
        graph.insert_scalar(shape, "TStart", 0.5);

        let set = graph.properties(shape);
        assert_eq!(graph.properties(shape), set);
        let values = graph.property_values(shape).unwrap();
        assert_eq!(values.vector2s, vec![("Position".to_string(), Vec2::new(3.0, 4.0))]);
        assert_eq!(values.scalars, vec![("TStart".to_string(), 0.5)]);
    }

    #[test]
    fn test_keyframe_animation_gets_controller() {
        let mut graph = CompositionGraph::new();
        let target = graph.add(CompositionObject::container_visual());
        let linear = graph.add(CompositionObject::LinearEasing);
        let mut anim = KeyFrameAnimation::new(Duration::from_secs(1));
        anim.insert_key_frame(0.0, 1.0_f32, linear);
        let anim = graph.add(CompositionObject::ScalarKeyFrameAnimation(anim));
        let expr = graph.add(CompositionObject::ExpressionAnimation(ExpressionAnimation::new(
            "my.Opacity",
        )));

        assert!(graph.start_animation(target, "Opacity", anim).is_some());
        assert!(graph.start_animation(target, "Offset", expr).is_none());
        assert_eq!(graph.node(target).animators.len(), 2);
    }

    #[test]
    fn test_push_child_routes_by_kind() {
        let mut graph = CompositionGraph::new();
        let visual = graph.add(CompositionObject::container_visual());
        let shape_visual = graph.add(CompositionObject::shape_visual());
        let sprite = graph.add(CompositionObject::SpriteShape(SpriteShape::default()));
        graph.push_child(visual, shape_visual);
        graph.push_child(shape_visual, sprite);
        assert_eq!(graph.children(visual), &[shape_visual]);
        assert_eq!(graph.children(shape_visual), &[sprite]);
        assert_eq!(graph.object(sprite).type_name(), "CompositionSpriteShape");
    }
}
