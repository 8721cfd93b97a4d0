//! Layers, their transform chains and visibility windows.

use lottie_data::model::{BlendMode, Layer, LayerKind};
use tracing::debug;

use super::context::{ShapeContentContext, TranslationContext};
use super::transforms::LayerTransform;
use super::{Translator, ROOT_NAME};
use crate::animatable::{self, Color};
use crate::error::TranslateError;
use crate::expressions::{progress_expression, Expression, Segment};
use crate::graph::{CompositionObject, ExpressionAnimation, GeometryProps, NodeId, SpriteShape};

/// What a translated layer contributes to its container.
enum LayerContent {
    Shape(NodeId),
    Visual(NodeId),
}

/// Whether a transform chain is built from container shapes or container
/// visuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainKind {
    Shapes,
    Visuals,
}

impl ChainKind {
    fn container(self) -> CompositionObject {
        match self {
            ChainKind::Shapes => CompositionObject::container_shape(),
            ChainKind::Visuals => CompositionObject::container_visual(),
        }
    }

    /// The property that hides the contents, and its hidden and shown values.
    fn visibility(self) -> (&'static str, Expression, Expression) {
        match self {
            ChainKind::Shapes => (
                "TransformMatrix",
                Expression::untyped("Matrix3x2(0,0,0,0,0,0)"),
                Expression::untyped("Matrix3x2(1,0,0,1,0,0)"),
            ),
            ChainKind::Visuals => ("Opacity", Expression::number(0.0), Expression::number(1.0)),
        }
    }
}

/// The nodes created for a layer. Content goes into `contents`; `root` is
/// what the layer adds to its container. `leaf` holds the layer's own
/// transform.
#[derive(Debug, Clone, Copy)]
struct TransformChain {
    root: NodeId,
    leaf: NodeId,
    contents: NodeId,
}

impl<'a> Translator<'a> {
    /// Translates the layers of `context` into `container`, bottom layer
    /// first. Runs of consecutive shape layers share a shape visual.
    pub(super) fn translate_layers(
        &mut self,
        context: &TranslationContext<'a>,
        container: NodeId,
    ) -> Result<(), TranslateError> {
        let mut shape_visual = None;
        for layer in context.layers.iter().rev() {
            match self.translate_layer(context, layer)? {
                None => {}
                Some(LayerContent::Shape(shape)) => {
                    let visual = match shape_visual {
                        Some(visual) => visual,
                        None => {
                            let mut visual = CompositionObject::shape_visual();
                            if let Some(props) = visual.visual_mut() {
                                // Shape visuals clip to their size.
                                props.size =
                                    Some(glam::Vec2::new(context.width as f32, context.height as f32));
                            }
                            let visual = self.graph.add(visual);
                            self.graph.push_child(container, visual);
                            shape_visual = Some(visual);
                            visual
                        }
                    };
                    self.graph.push_child(visual, shape);
                }
                Some(LayerContent::Visual(visual)) => {
                    shape_visual = None;
                    self.graph.push_child(container, visual);
                }
            }
        }
        Ok(())
    }

    fn translate_layer(
        &mut self,
        context: &TranslationContext<'a>,
        layer: &'a Layer,
    ) -> Result<Option<LayerContent>, TranslateError> {
        self.record_layer_issues(layer)?;
        if layer.hd {
            return Ok(None);
        }

        let kind = layer
            .kind()
            .ok_or_else(|| TranslateError::Invariant(format!("unknown layer type {}", layer.ty)))?;
        debug!(layer = layer.name(), kind = %kind, "translating layer");

        match kind {
            LayerKind::Image => {
                self.issues.unsupported("Image layer")?;
                Ok(None)
            }
            // Null layers only hold transforms for their children.
            LayerKind::Null => Ok(None),
            LayerKind::PreComp => Ok(self
                .translate_precomp_layer(context, layer)?
                .map(LayerContent::Visual)),
            LayerKind::Shape => Ok(self
                .translate_shape_layer(context, layer)?
                .map(LayerContent::Shape)),
            LayerKind::Solid => Ok(self
                .translate_solid_layer(context, layer)?
                .map(LayerContent::Shape)),
            LayerKind::Text => {
                self.issues.unsupported("Text layer")?;
                Ok(None)
            }
        }
    }

    fn record_layer_issues(&mut self, layer: &Layer) -> Result<(), TranslateError> {
        if layer.ef.as_ref().is_some_and(|effects| !effects.is_empty()) {
            self.issues.unsupported(
                "Layer effects are not supported. If you are using them for fills, strokes, \
                 trim paths etc. then try adding them directly as contents in your shape layer.",
            )?;
        }
        if layer.tt.is_some_and(|matte| matte != 0) {
            self.issues.unsupported("Mattes are not supported.")?;
        }
        if layer.has_masks() {
            self.issues.unsupported("Masks are not supported.")?;
        }
        if layer.is_3d() {
            self.issues.unsupported("3d layer")?;
        }
        let blend_mode = layer.blend_mode();
        if blend_mode != BlendMode::Normal {
            self.issues.unsupported(format!("Blend mode: {blend_mode}"))?;
        }
        if layer.sr != 1.0 {
            self.issues.unsupported("Time stretch")?;
        }
        Ok(())
    }

    fn translate_shape_layer(
        &mut self,
        context: &TranslationContext<'a>,
        layer: &'a Layer,
    ) -> Result<Option<NodeId>, TranslateError> {
        let Some(chain) = self.transform_chain(context, layer, ChainKind::Shapes)? else {
            return Ok(None);
        };

        let opacity = animatable::scalar(&layer.ks.o, 100.0, &mut self.issues)?;
        let shape_context = ShapeContentContext::with_opacity(opacity);
        let contents = layer.shapes.as_deref().unwrap_or(&[]);
        let shapes =
            self.translate_shape_contents(context, shape_context, contents, chain.contents)?;
        if shapes.is_empty() {
            return Ok(None);
        }

        for shape in shapes {
            self.graph.push_child(chain.contents, shape);
        }
        self.describe(chain.root, || layer_label(layer));
        Ok(Some(chain.root))
    }

    fn translate_solid_layer(
        &mut self,
        context: &TranslationContext<'a>,
        layer: &'a Layer,
    ) -> Result<Option<NodeId>, TranslateError> {
        let opacity = animatable::scalar(&layer.ks.o, 100.0, &mut self.issues)?;
        if opacity.always_equals(&0.0) {
            // A fully transparent solid is being used like a null layer.
            return Ok(None);
        }

        let Some(chain) = self.transform_chain(context, layer, ChainKind::Shapes)? else {
            return Ok(None);
        };

        let [a, r, g, b] = layer.solid_color().unwrap_or([1.0, 0.0, 0.0, 0.0]);
        let color = animatable::Animatable::new(Color::from_argb(
            a as f64, r as f64, g as f64, b as f64,
        ));
        let brush = self.animated_color_brush(context, &color, &opacity)?;

        let geometry = self.graph.add(CompositionObject::RectangleGeometry {
            geometry: GeometryProps::default(),
            offset: None,
            size: glam::Vec2::new(
                layer.sw.unwrap_or(0) as f32,
                layer.sh.unwrap_or(0) as f32,
            ),
        });
        let rectangle = self.graph.add(CompositionObject::SpriteShape(SpriteShape {
            geometry: Some(geometry),
            fill_brush: Some(brush),
            ..SpriteShape::default()
        }));
        self.graph.push_child(chain.contents, rectangle);

        self.describe(rectangle, || "SolidLayerRectangle".to_string());
        self.describe(geometry, || "SolidLayerRectangle.RectangleGeometry".to_string());
        self.describe(chain.root, || layer_label(layer));
        Ok(Some(chain.root))
    }

    fn translate_precomp_layer(
        &mut self,
        context: &TranslationContext<'a>,
        layer: &'a Layer,
    ) -> Result<Option<NodeId>, TranslateError> {
        if layer.tm.is_some() {
            self.issues
                .unsupported("Time remapping of PreComps is not supported.")?;
        }

        let Some(chain) = self.transform_chain(context, layer, ChainKind::Visuals)? else {
            return Ok(None);
        };
        let opacity = animatable::scalar(&layer.ks.o, 100.0, &mut self.issues)?;
        self.apply_opacity_to_visual(context, &opacity, chain.leaf);

        let ref_id = layer.ref_id.as_deref().unwrap_or("");
        let result = self.graph.add(CompositionObject::container_visual());
        self.describe(result, || format!("{}->'{ref_id}'", layer_label(layer)));
        self.graph.push_child(result, chain.root);
        if let Some(props) = self.graph.visual_mut(result) {
            // Precomps clip to their size.
            props.size = Some(glam::Vec2::new(context.width as f32, context.height as f32));
        }
        let clip = self.graph.add(CompositionObject::InsetClip {
            left: 0.0,
            top: 0.0,
            right: 0.0,
            bottom: 0.0,
        });
        if let Some(props) = self.graph.visual_mut(result) {
            props.clip = Some(clip);
        }

        let document = self.document;
        let asset = document.asset(ref_id).ok_or_else(|| {
            TranslateError::Invariant(format!("precomp layer references missing asset '{ref_id}'"))
        })?;
        match &asset.layers {
            Some(layers) => {
                let precomp_context = context.for_precomp(layer, layers);
                self.translate_layers(&precomp_context, chain.contents)?;
            }
            None => self.issues.unsupported("Image assets.")?,
        }

        self.describe(chain.root, || layer_label(layer));
        Ok(Some(result))
    }

    /// Builds the transform chain of `layer`, with a visibility node when the
    /// layer is not shown for the whole window. Returns `None` when the layer
    /// is never shown.
    fn transform_chain(
        &mut self,
        context: &TranslationContext<'a>,
        layer: &'a Layer,
        kind: ChainKind,
    ) -> Result<Option<TransformChain>, TranslateError> {
        let in_progress = context.progress_of(layer.ip as f64);
        let out_progress = context.progress_of(layer.op as f64);
        if in_progress > 1.0 || out_progress <= 0.0 {
            debug!(layer = layer.name(), "layer is never visible");
            return Ok(None);
        }

        let (root, leaf) = self.transform_nodes(context, layer, kind, 0)?;
        let mut contents = leaf;

        if in_progress > 0.0 || out_progress < 1.0 {
            contents = self.graph.add(kind.container());
            self.graph.push_child(leaf, contents);

            let (property, invisible, visible) = kind.visibility();
            let expression = progress_expression(
                &self.root_progress(),
                &[
                    Segment::new(f64::MIN, in_progress, invisible.clone()),
                    Segment::new(in_progress, out_progress, visible),
                    Segment::new(out_progress, f64::MAX, invisible),
                ],
            )?;
            let mut animation = ExpressionAnimation::new(expression.to_string());
            animation.set_reference_parameter(ROOT_NAME, self.root);
            let animation = self.graph.add(CompositionObject::ExpressionAnimation(animation));
            self.graph.start_animation(contents, property, animation);
        }

        let name = layer.name();
        self.describe_appended(contents, || format!("'{name}'.Contents"));
        if self.annotate {
            let label = match self.graph.comment(root) {
                Some(existing) => format!("{} {existing}", layer_label(layer)),
                None => layer_label(layer),
            };
            self.graph.set_comment(root, label);
        }

        Ok(Some(TransformChain {
            root,
            leaf,
            contents,
        }))
    }

    /// Creates the node holding the transform of `layer` and, above it, the
    /// chains of its ancestors. Returns the top and bottom of the chain.
    fn transform_nodes(
        &mut self,
        context: &TranslationContext<'a>,
        layer: &'a Layer,
        kind: ChainKind,
        depth: usize,
    ) -> Result<(NodeId, NodeId), TranslateError> {
        if depth > context.layers.len() {
            return Err(TranslateError::Invariant(format!(
                "layer '{}' has a cyclic parent chain",
                layer.name()
            )));
        }

        let leaf = self.graph.add(kind.container());
        let transform = LayerTransform::read(&layer.ks, &mut self.issues)?;
        match kind {
            ChainKind::Shapes => self.apply_transform_to_shape(context, &transform, leaf),
            ChainKind::Visuals => self.apply_transform_to_visual(context, &transform, leaf),
        }
        let name = layer.name();
        self.describe(leaf, || format!("'{name}'.Transforms"));

        let Some(parent_index) = layer.parent else {
            return Ok((leaf, leaf));
        };
        let parent = context.layer_by_index(parent_index).ok_or_else(|| {
            TranslateError::Invariant(format!(
                "layer '{name}' has parent {parent_index} which is not in its collection"
            ))
        })?;
        let (root, parent_leaf) = self.transform_nodes(context, parent, kind, depth + 1)?;
        let parent_name = parent.name();
        self.describe(root, || format!("'{name}'.AncestorTransformFrom_{parent_name}"));
        self.graph.push_child(parent_leaf, leaf);
        Ok((root, leaf))
    }
}

fn layer_label(layer: &Layer) -> String {
    match layer.kind() {
        Some(kind) => format!("{kind}Layer:'{}'", layer.name()),
        None => format!("Layer:'{}'", layer.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_values_per_chain_kind() {
        let (property, hidden, shown) = ChainKind::Visuals.visibility();
        assert_eq!(property, "Opacity");
        assert_eq!(hidden.to_string(), "0");
        assert_eq!(shown.to_string(), "1");

        let (property, hidden, _) = ChainKind::Shapes.visibility();
        assert_eq!(property, "TransformMatrix");
        assert_eq!(hidden.to_string(), "Matrix3x2(0,0,0,0,0,0)");
    }
}
