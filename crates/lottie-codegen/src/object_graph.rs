//! The set of objects reachable from a root, with their inbound references.

use std::collections::{HashMap, HashSet};

use lottie_core::graph::{CanvasGeometry, CompositionGraph, CompositionObject, KeyFrameValue, NodeId};

/// Objects reachable from a root visual, in depth-first visit order.
///
/// Every reference between two reachable objects is recorded as an inbound
/// reference on its target, once per occurrence.
#[derive(Debug, Clone)]
pub struct ObjectGraph {
    order: Vec<NodeId>,
    in_refs: HashMap<NodeId, Vec<NodeId>>,
}

impl ObjectGraph {
    pub fn walk(graph: &CompositionGraph, root: NodeId) -> Self {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut in_refs: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut stack: Vec<(Option<NodeId>, NodeId)> = vec![(None, root)];

        while let Some((from, id)) = stack.pop() {
            if let Some(from) = from {
                in_refs.entry(id).or_default().push(from);
            }
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            // Reversed so references are visited in declaration order.
            for next in references(graph, id).into_iter().rev() {
                stack.push((Some(id), next));
            }
        }

        Self { order, in_refs }
    }

    /// Reachable objects, root first.
    pub fn nodes(&self) -> &[NodeId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Objects referring to `id`, in the order the references were found.
    pub fn in_refs(&self, id: NodeId) -> &[NodeId] {
        self.in_refs.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Objects `id` refers to directly, in the order a factory would use them.
pub fn references(graph: &CompositionGraph, id: NodeId) -> Vec<NodeId> {
    let node = graph.node(id);
    let mut refs = Vec::new();

    // A property set is its own property set.
    if !matches!(node.object, CompositionObject::PropertySet(_)) {
        refs.extend(node.properties);
    }
    for animator in &node.animators {
        refs.push(animator.animation);
        refs.extend(animator.controller);
    }

    match &node.object {
        CompositionObject::ContainerVisual { visual, children } => {
            refs.extend(visual.clip);
            refs.extend(children);
        }
        CompositionObject::ShapeVisual { visual, shapes } => {
            refs.extend(visual.clip);
            refs.extend(shapes);
        }
        CompositionObject::ContainerShape { shapes, .. } => refs.extend(shapes),
        CompositionObject::SpriteShape(sprite) => {
            refs.extend(sprite.fill_brush);
            refs.extend(sprite.geometry);
            refs.extend(sprite.stroke_brush);
        }
        CompositionObject::PathGeometry { path, .. } => refs.extend(*path),
        CompositionObject::ExpressionAnimation(animation) => {
            refs.extend(animation.reference_parameters.iter().map(|(_, value)| *value));
        }
        CompositionObject::ScalarKeyFrameAnimation(animation) => {
            refs.extend(animation.reference_parameters.iter().map(|(_, value)| *value));
            refs.extend(animation.keyframes.iter().map(|kf| kf.easing));
        }
        CompositionObject::Vector2KeyFrameAnimation(animation) => {
            refs.extend(animation.reference_parameters.iter().map(|(_, value)| *value));
            refs.extend(animation.keyframes.iter().map(|kf| kf.easing));
        }
        CompositionObject::Vector3KeyFrameAnimation(animation) => {
            refs.extend(animation.reference_parameters.iter().map(|(_, value)| *value));
            refs.extend(animation.keyframes.iter().map(|kf| kf.easing));
        }
        CompositionObject::ColorKeyFrameAnimation(animation) => {
            refs.extend(animation.reference_parameters.iter().map(|(_, value)| *value));
            refs.extend(animation.keyframes.iter().map(|kf| kf.easing));
        }
        CompositionObject::PathKeyFrameAnimation(animation) => {
            refs.extend(animation.reference_parameters.iter().map(|(_, value)| *value));
            for keyframe in &animation.keyframes {
                refs.push(keyframe.easing);
                if let KeyFrameValue::Value(path) = keyframe.value {
                    refs.push(path);
                }
            }
        }
        CompositionObject::Path { source } => refs.push(*source),
        CompositionObject::CanvasGeometry(CanvasGeometry::Combination { a, b, .. }) => {
            refs.push(*a);
            refs.push(*b);
        }
        CompositionObject::EllipseGeometry { .. }
        | CompositionObject::RectangleGeometry { .. }
        | CompositionObject::RoundedRectangleGeometry { .. }
        | CompositionObject::ColorBrush { .. }
        | CompositionObject::InsetClip { .. }
        | CompositionObject::LinearEasing
        | CompositionObject::CubicBezierEasing { .. }
        | CompositionObject::StepEasing { .. }
        | CompositionObject::PropertySet(_)
        | CompositionObject::AnimationController
        | CompositionObject::CanvasGeometry(_) => {}
    }

    refs
}
