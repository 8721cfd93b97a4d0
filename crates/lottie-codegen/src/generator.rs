//! Instantiator generation shared by every target language.
//!
//! The generator emits one factory method per canonical object. Objects
//! referenced from more than one emitted factory get a storage field and a
//! cache check, so they are created once. Property sets and animation
//! controllers have no factory of their own: they are initialized inside the
//! factory of the object that owns them. Expression animations used in a
//! single place are written through one reusable instance instead of a
//! factory, and path wrappers are always created inline.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use glam::Vec2;
use lottie_core::graph::{
    CanvasGeometry, CompositionGraph, CompositionObject, GeometryCombine, GeometryProps,
    KeyFrameAnimation, KeyFrameValue, Matrix3x2, NodeId, PathCommand, ShapeProps, SpriteShape,
    StrokeCap, StrokeLineJoin, VisualProps,
};
use lottie_core::Translation;
use tracing::debug;

use crate::canonicalizer::{canonicalize, Canonicalization};
use crate::code_builder::CodeBuilder;
use crate::error::CodegenError;
use crate::object_graph::ObjectGraph;
use crate::stringifier::Stringifier;

/// Field holding the reusable expression animation.
pub(crate) const SINGLETON_EXPRESSION: &str = "_expressionAnimation";

/// What the class around the factories is written from.
pub(crate) struct ClassInfo<'a> {
    pub class_name: &'a str,
    pub size: Vec2,
    pub duration: Duration,
    pub root_call: &'a str,
}

/// Signature of one factory method.
pub(crate) struct FactoryHeader<'a> {
    pub type_name: &'static str,
    pub name: &'a str,
    /// Storage field, when the object is cached.
    pub field: Option<String>,
}

/// The parts of the output that differ in structure between languages.
/// Literal formatting comes from the [`Stringifier`] supertrait.
pub(crate) trait Language: Stringifier {
    fn extension(&self) -> &'static str;

    fn write_preamble(&self, builder: &mut CodeBuilder, requires_geometry: bool);

    fn write_class_start(&self, builder: &mut CodeBuilder, class: &ClassInfo<'_>);

    fn write_field(&self, builder: &mut CodeBuilder, type_name: &str, field_name: &str);

    fn write_class_end(&self, builder: &mut CodeBuilder, class: &ClassInfo<'_>);

    fn write_factory_start(&self, builder: &mut CodeBuilder, header: &FactoryHeader<'_>) {
        builder.write_line(format!("{} {}()", header.type_name, header.name));
        builder.open_scope();
    }

    fn write_factory_end(&self, builder: &mut CodeBuilder) {
        builder.write_line("return result;");
        builder.close_scope();
        builder.blank_line();
    }

    fn write_cache_handler(&self, builder: &mut CodeBuilder, field: &str) {
        builder.write_line(format!("if ({field} != {})", self.null()));
        builder.open_scope();
        builder.write_line(format!("return {field};"));
        builder.close_scope();
    }

    /// Declares `result`, storing it in the factory's field when cached.
    fn write_create_assignment(
        &self,
        builder: &mut CodeBuilder,
        header: &FactoryHeader<'_>,
        create_call: &str,
    ) {
        match &header.field {
            Some(field) => {
                self.write_cache_handler(builder, field);
                builder.write_line(format!("{} result = {field} = {create_call};", self.var()));
            }
            None => builder.write_line(format!("{} result = {create_call};", self.var())),
        }
    }

    fn write_canvas_path(
        &self,
        builder: &mut CodeBuilder,
        header: &FactoryHeader<'_>,
        commands: &[PathCommand],
    ) -> Result<(), CodegenError> {
        let d = self.deref();
        self.write_factory_start(builder, header);
        if let Some(field) = &header.field {
            self.write_cache_handler(builder, field);
        }
        builder.write_line(format!(
            "using (var builder = {} CanvasPathBuilder({}))",
            self.new_keyword(),
            self.null()
        ));
        builder.open_scope();
        for command in commands {
            match command {
                PathCommand::SetFilledRegionDetermination(fill) => builder.write_line(format!(
                    "builder{d}SetFilledRegionDetermination({});",
                    self.filled_region_determination(*fill)
                )),
                PathCommand::BeginFigure(point) => {
                    builder.write_line(format!("builder{d}BeginFigure({});", self.vector2(*point)))
                }
                PathCommand::AddCubicBezier(cp1, cp2, end) => builder.write_line(format!(
                    "builder{d}AddCubicBezier({}, {}, {});",
                    self.vector2(*cp1),
                    self.vector2(*cp2),
                    self.vector2(*end)
                )),
                PathCommand::EndFigure(figure_loop) => builder.write_line(format!(
                    "builder{d}EndFigure({});",
                    self.figure_loop(*figure_loop)
                )),
            }
        }
        builder.write_line(format!(
            "return {}CanvasGeometry{}CreatePath(builder);",
            store_prefix(header),
            self.scope_resolve()
        ));
        builder.close_scope();
        builder.close_scope();
        builder.blank_line();
        Ok(())
    }

    fn write_canvas_ellipse(
        &self,
        builder: &mut CodeBuilder,
        header: &FactoryHeader<'_>,
        center: Vec2,
        radius: Vec2,
    ) -> Result<(), CodegenError> {
        self.write_factory_start(builder, header);
        if let Some(field) = &header.field {
            self.write_cache_handler(builder, field);
        }
        builder.write_line(format!(
            "{} result = {}CanvasGeometry{}CreateEllipse(",
            self.var(),
            store_prefix(header),
            self.scope_resolve()
        ));
        builder.indent();
        builder.write_line(format!("{},", self.null()));
        builder.write_line(format!("{},", self.float(center.x)));
        builder.write_line(format!("{},", self.float(center.y)));
        builder.write_line(format!("{},", self.float(radius.x)));
        builder.write_line(format!("{});", self.float(radius.y)));
        builder.unindent();
        self.write_factory_end(builder);
        Ok(())
    }

    fn write_canvas_rounded_rectangle(
        &self,
        builder: &mut CodeBuilder,
        header: &FactoryHeader<'_>,
        origin: Vec2,
        size: Vec2,
        radius: Vec2,
    ) -> Result<(), CodegenError> {
        self.write_factory_start(builder, header);
        if let Some(field) = &header.field {
            self.write_cache_handler(builder, field);
        }
        builder.write_line(format!(
            "{} result = {}CanvasGeometry{}CreateRoundedRectangle(",
            self.var(),
            store_prefix(header),
            self.scope_resolve()
        ));
        builder.indent();
        builder.write_line(format!("{},", self.null()));
        for value in [origin.x, origin.y, size.x, size.y, radius.x] {
            builder.write_line(format!("{},", self.float(value)));
        }
        builder.write_line(format!("{});", self.float(radius.y)));
        builder.unindent();
        self.write_factory_end(builder);
        Ok(())
    }

    fn write_canvas_combination(
        &self,
        builder: &mut CodeBuilder,
        header: &FactoryHeader<'_>,
        a_call: &str,
        b_call: &str,
        matrix: &Matrix3x2,
        combine: GeometryCombine,
    ) -> Result<(), CodegenError> {
        self.write_factory_start(builder, header);
        if let Some(field) = &header.field {
            self.write_cache_handler(builder, field);
        }
        builder.write_line(format!(
            "{} result = {}{a_call}{}",
            self.var(),
            store_prefix(header),
            self.deref()
        ));
        builder.indent();
        builder.write_line(format!("CombineWith({b_call},"));
        if matrix.is_identity() {
            builder.write_line(format!("Matrix3x2{}Identity,", self.scope_resolve()));
        } else {
            builder.write_line(format!("{},", self.matrix3x2(matrix)));
        }
        builder.write_line(format!("{});", self.geometry_combine(combine)));
        builder.unindent();
        self.write_factory_end(builder);
        Ok(())
    }
}

/// `field = ` for cached factories.
pub(crate) fn store_prefix(header: &FactoryHeader<'_>) -> String {
    header
        .field
        .as_ref()
        .map(|field| format!("{field} = "))
        .unwrap_or_default()
}

/// Generation data for one emitted object.
#[derive(Debug, Clone)]
struct NodeData {
    name: String,
    type_name: &'static str,
    requires_storage: bool,
    /// Replaces the factory call when the object is created inline.
    inline_call: Option<String>,
}

impl NodeData {
    /// `_` followed by the name with a lower-case first letter.
    fn field_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => format!("_{}{}", first.to_ascii_lowercase(), chars.as_str()),
            None => "_".to_string(),
        }
    }
}

pub(crate) struct InstantiatorGenerator<'a, L> {
    language: L,
    translation: &'a Translation,
    annotate: bool,
    objects: ObjectGraph,
    canonical: Canonicalization,
    /// Expression animations written through the reusable instance.
    singletons: HashSet<NodeId>,
    nodes: HashMap<NodeId, NodeData>,
    /// Emitted objects ordered by name.
    ordered: Vec<NodeId>,
}

/// Fails unless `root` is a visual of `graph`.
pub(crate) fn check_root(graph: &CompositionGraph, root: NodeId) -> Result<(), CodegenError> {
    if root.index() >= graph.len() {
        return Err(CodegenError::MissingRoot);
    }
    match graph.object(root) {
        CompositionObject::ContainerVisual { .. } | CompositionObject::ShapeVisual { .. } => Ok(()),
        _ => Err(CodegenError::MissingRoot),
    }
}

impl<'a, L: Language> InstantiatorGenerator<'a, L> {
    pub(crate) fn new(
        language: L,
        translation: &'a Translation,
        annotate: bool,
    ) -> Result<Self, CodegenError> {
        let graph = &translation.graph;
        check_root(graph, translation.root)?;

        let objects = ObjectGraph::walk(graph, translation.root);
        let canonical = canonicalize(graph, &objects, !annotate);

        let singletons = objects
            .nodes()
            .iter()
            .copied()
            .filter(|&id| {
                canonical.is_canonical(id)
                    && matches!(graph.object(id), CompositionObject::ExpressionAnimation(_))
                    && canonical
                        .group(id)
                        .iter()
                        .map(|&member| objects.in_refs(member).len())
                        .sum::<usize>()
                        <= 1
            })
            .collect();

        let mut generator = Self {
            language,
            translation,
            annotate,
            objects,
            canonical,
            singletons,
            nodes: HashMap::new(),
            ordered: Vec::new(),
        };
        generator.assign_names();
        generator.assign_storage()?;

        debug!(
            objects = generator.objects.len(),
            factories = generator.ordered.len(),
            stored = generator
                .nodes
                .values()
                .filter(|data| data.requires_storage)
                .count(),
            "planned instantiator"
        );
        Ok(generator)
    }

    fn graph(&self) -> &'a CompositionGraph {
        &self.translation.graph
    }

    /// Canonical objects that get a factory or an inline creation.
    fn is_emitted(&self, id: NodeId) -> bool {
        self.canonical.is_canonical(id)
            && !self.singletons.contains(&id)
            && !matches!(
                self.graph().object(id),
                CompositionObject::PropertySet(_) | CompositionObject::AnimationController
            )
    }

    /// Names are `Type_0000`, counted per type in walk order.
    fn assign_names(&mut self) {
        let mut counters: HashMap<&'static str, usize> = HashMap::new();
        for &id in self.objects.nodes() {
            if !self.is_emitted(id) {
                continue;
            }
            let type_name = self.graph().object(id).type_name();
            let counter = counters.entry(type_name).or_insert(0);
            let name = format!("{type_name}_{counter:04}");
            *counter += 1;
            self.nodes.insert(
                id,
                NodeData {
                    name,
                    type_name,
                    requires_storage: false,
                    inline_call: None,
                },
            );
        }

        let mut ordered: Vec<NodeId> = self.nodes.keys().copied().collect();
        ordered.sort_by(|a, b| self.nodes[a].name.cmp(&self.nodes[b].name));
        self.ordered = ordered;
    }

    fn assign_storage(&mut self) -> Result<(), CodegenError> {
        // Path wrappers are cheap to create, so they are always inlined.
        let mut inlined = Vec::new();
        for &id in &self.ordered {
            if let CompositionObject::Path { source } = self.graph().object(id) {
                let call = format!(
                    "{} CompositionPath({})",
                    self.language.new_keyword(),
                    self.factory_call(*source)?
                );
                inlined.push((id, call));
            }
        }
        for (id, call) in inlined {
            if let Some(data) = self.nodes.get_mut(&id) {
                data.inline_call = Some(call);
            }
        }

        // Inlined paths move their references into the caller.
        let counts = self.canonical_in_refs();
        let root = self.translation.root;
        for (id, data) in self.nodes.iter_mut() {
            let count = counts.get(id).copied().unwrap_or(0);
            data.requires_storage = data.inline_call.is_none()
                && (count > 1 || (*id == root && count > 0));
        }
        Ok(())
    }

    /// Factory that writes the code using `id`, if that code is generated.
    fn emitter(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        for _ in 0..=self.objects.len() {
            if !self.canonical.is_canonical(current) {
                return None;
            }
            match self.nodes.get(&current) {
                Some(data) if data.inline_call.is_none() => return Some(current),
                _ => current = *self.objects.in_refs(current).first()?,
            }
        }
        None
    }

    /// The object an animation is started on. Animations of a property set
    /// are started through its owner.
    fn animated_object(&self, animation: NodeId) -> Option<NodeId> {
        let target = *self.objects.in_refs(animation).first()?;
        match self.graph().object(target) {
            CompositionObject::PropertySet(_) => self.objects.in_refs(target).first().copied(),
            _ => Some(target),
        }
    }

    /// References to each canonical object from generated code. A reusable
    /// expression referring to the object it animates is not counted: the
    /// object is in a local there.
    fn canonical_in_refs(&self) -> HashMap<NodeId, usize> {
        let mut counts = HashMap::new();
        for &to in self.objects.nodes() {
            for &from in self.objects.in_refs(to) {
                if self.emitter(from).is_none() {
                    continue;
                }
                if self.singletons.contains(&from) && self.animated_object(from) == Some(to) {
                    continue;
                }
                *counts.entry(self.canonical.canonical(to)).or_insert(0) += 1;
            }
        }
        counts
    }

    fn factory_call(&self, id: NodeId) -> Result<String, CodegenError> {
        let canonical = self.canonical.canonical(id);
        let data = self.nodes.get(&canonical).ok_or_else(|| {
            CodegenError::UnsupportedNode(self.graph().object(id).type_name().to_string())
        })?;
        Ok(data
            .inline_call
            .clone()
            .unwrap_or_else(|| format!("{}()", data.name)))
    }

    fn header(&self, id: NodeId) -> FactoryHeader<'_> {
        let data = &self.nodes[&id];
        FactoryHeader {
            type_name: data.type_name,
            name: &data.name,
            field: data.requires_storage.then(|| data.field_name()),
        }
    }

    /// Canvas geometries need the geometry library of the target.
    fn requires_geometry(&self) -> bool {
        self.ordered
            .iter()
            .any(|&id| matches!(self.graph().object(id), CompositionObject::CanvasGeometry(_)))
    }

    /// Number of objects that get a factory or inline creation.
    pub(crate) fn factory_count(&self) -> usize {
        self.ordered.len()
    }

    pub(crate) fn generate(&self, class_name: &str) -> Result<String, CodegenError> {
        let mut builder = CodeBuilder::new();
        let root_call = self.factory_call(self.translation.root)?;
        let class = ClassInfo {
            class_name,
            size: Vec2::new(self.translation.width, self.translation.height),
            duration: self.translation.duration,
            root_call: &root_call,
        };

        self.language.write_preamble(&mut builder, self.requires_geometry());
        self.language.write_class_start(&mut builder, &class);

        for &id in &self.ordered {
            let data = &self.nodes[&id];
            if data.requires_storage {
                self.language
                    .write_field(&mut builder, data.type_name, &data.field_name());
            }
        }
        builder.blank_line();

        for &id in &self.ordered {
            if self.nodes[&id].inline_call.is_none() {
                self.write_factory(&mut builder, id)?;
            }
        }

        self.language.write_class_end(&mut builder, &class);
        Ok(builder.to_string())
    }

    fn write_factory(&self, b: &mut CodeBuilder, id: NodeId) -> Result<(), CodegenError> {
        let header = self.header(id);
        let d = self.language.deref();
        match self.graph().object(id) {
            CompositionObject::ContainerVisual { visual, children } => {
                self.start(b, &header, &format!("_c{d}CreateContainerVisual()"));
                self.initialize_visual(b, id, visual)?;
                self.write_collection(b, "children", "Children", "InsertAtTop", children)?;
                self.finish(b, id)
            }
            CompositionObject::ShapeVisual { visual, shapes } => {
                self.start(b, &header, &format!("_c{d}CreateShapeVisual()"));
                self.initialize_visual(b, id, visual)?;
                self.write_collection(b, "shapes", "Shapes", self.language.list_add(), shapes)?;
                self.finish(b, id)
            }
            CompositionObject::ContainerShape { shape, shapes } => {
                self.start(b, &header, &format!("_c{d}CreateContainerShape()"));
                self.initialize_shape(b, id, shape)?;
                self.write_collection(b, "shapes", "Shapes", self.language.list_add(), shapes)?;
                self.finish(b, id)
            }
            CompositionObject::SpriteShape(sprite) => {
                self.start(b, &header, &format!("_c{d}CreateSpriteShape()"));
                self.initialize_shape(b, id, &sprite.shape)?;
                self.write_sprite(b, sprite)?;
                self.finish(b, id)
            }
            CompositionObject::EllipseGeometry {
                geometry,
                center,
                radius,
            } => {
                self.start(b, &header, &format!("_c{d}CreateEllipseGeometry()"));
                self.initialize_geometry(b, id, geometry);
                if *center != Vec2::ZERO {
                    self.set(b, "Center", self.language.vector2(*center));
                }
                self.set(b, "Radius", self.language.vector2(*radius));
                self.finish(b, id)
            }
            CompositionObject::PathGeometry { geometry, path } => {
                let path = path.map(|path| self.factory_call(path)).transpose()?;
                let create = format!(
                    "_c{d}CreatePathGeometry({})",
                    path.as_deref().unwrap_or_default()
                );
                self.start(b, &header, &create);
                self.initialize_geometry(b, id, geometry);
                self.finish(b, id)
            }
            CompositionObject::RectangleGeometry {
                geometry,
                offset,
                size,
            } => {
                self.start(b, &header, &format!("_c{d}CreateRectangleGeometry()"));
                self.initialize_geometry(b, id, geometry);
                if let Some(offset) = offset {
                    self.set(b, "Offset", self.language.vector2(*offset));
                }
                self.set(b, "Size", self.language.vector2(*size));
                self.finish(b, id)
            }
            CompositionObject::RoundedRectangleGeometry {
                geometry,
                corner_radius,
                offset,
                size,
            } => {
                self.start(b, &header, &format!("_c{d}CreateRoundedRectangleGeometry()"));
                self.initialize_geometry(b, id, geometry);
                self.set(b, "CornerRadius", self.language.vector2(*corner_radius));
                if let Some(offset) = offset {
                    self.set(b, "Offset", self.language.vector2(*offset));
                }
                self.set(b, "Size", self.language.vector2(*size));
                self.finish(b, id)
            }
            CompositionObject::ColorBrush { color } => {
                let create = format!("_c{d}CreateColorBrush({})", self.language.color(*color));
                if self.needs_initialization(id) {
                    self.start(b, &header, &create);
                    self.initialize_object(b, id);
                    self.finish(b, id)
                } else {
                    self.write_simple_factory(b, &header, &create);
                    Ok(())
                }
            }
            CompositionObject::InsetClip {
                left,
                top,
                right,
                bottom,
            } => {
                self.start(b, &header, &format!("_c{d}CreateInsetClip()"));
                self.initialize_object(b, id);
                for (property, value) in [
                    ("LeftInset", left),
                    ("TopInset", top),
                    ("RightInset", right),
                    ("BottomInset", bottom),
                ] {
                    if *value != 0.0 {
                        self.set(b, property, self.language.float(*value));
                    }
                }
                self.finish(b, id)
            }
            CompositionObject::ExpressionAnimation(animation) => {
                self.start(b, &header, &format!("_c{d}CreateExpressionAnimation()"));
                self.initialize_animation(b, id, &animation.reference_parameters)?;
                self.set(b, "Expression", self.language.string(&animation.expression));
                self.finish(b, id)
            }
            CompositionObject::ScalarKeyFrameAnimation(animation) => {
                self.write_keyframe_animation(b, &header, id, "Scalar", animation, |v| {
                    Ok(self.language.float(*v))
                })
            }
            CompositionObject::Vector2KeyFrameAnimation(animation) => {
                self.write_keyframe_animation(b, &header, id, "Vector2", animation, |v| {
                    Ok(self.language.vector2(*v))
                })
            }
            CompositionObject::Vector3KeyFrameAnimation(animation) => {
                self.write_keyframe_animation(b, &header, id, "Vector3", animation, |v| {
                    Ok(self.language.vector3(*v))
                })
            }
            CompositionObject::ColorKeyFrameAnimation(animation) => {
                self.write_keyframe_animation(b, &header, id, "Color", animation, |v| {
                    Ok(self.language.color(*v))
                })
            }
            CompositionObject::PathKeyFrameAnimation(animation) => {
                self.write_keyframe_animation(b, &header, id, "Path", animation, |path| {
                    self.factory_call(*path)
                })
            }
            CompositionObject::LinearEasing => {
                self.write_simple_factory(b, &header, &format!("_c{d}CreateLinearEasingFunction()"));
                Ok(())
            }
            CompositionObject::CubicBezierEasing {
                control_point1,
                control_point2,
            } => {
                let create = format!(
                    "_c{d}CreateCubicBezierEasingFunction({}, {})",
                    self.language.vector2(*control_point1),
                    self.language.vector2(*control_point2)
                );
                self.write_simple_factory(b, &header, &create);
                Ok(())
            }
            CompositionObject::StepEasing {
                step_count,
                final_step,
                initial_step,
                is_final_step_single_frame,
                is_initial_step_single_frame,
            } => {
                self.start(b, &header, &format!("_c{d}CreateStepEasingFunction()"));
                if *final_step != 1 {
                    self.set(b, "FinalStep", self.language.int(*final_step));
                }
                if *initial_step != 0 {
                    self.set(b, "InitialStep", self.language.int(*initial_step));
                }
                if *is_final_step_single_frame {
                    self.set(b, "IsFinalStepSingleFrame", self.language.bool(true));
                }
                if *is_initial_step_single_frame {
                    self.set(b, "IsInitialStepSingleFrame", self.language.bool(true));
                }
                if *step_count != 1 {
                    self.set(b, "StepCount", self.language.int(*step_count));
                }
                self.language.write_factory_end(b);
                Ok(())
            }
            CompositionObject::Path { source } => {
                let create = format!(
                    "{} CompositionPath({})",
                    self.language.new_keyword(),
                    self.factory_call(*source)?
                );
                self.start(b, &header, &create);
                self.language.write_factory_end(b);
                Ok(())
            }
            CompositionObject::CanvasGeometry(geometry) => match geometry {
                CanvasGeometry::Path(commands) => {
                    self.language.write_canvas_path(b, &header, commands)
                }
                CanvasGeometry::Ellipse {
                    x,
                    y,
                    radius_x,
                    radius_y,
                } => self.language.write_canvas_ellipse(
                    b,
                    &header,
                    Vec2::new(*x, *y),
                    Vec2::new(*radius_x, *radius_y),
                ),
                CanvasGeometry::RoundedRectangle {
                    x,
                    y,
                    w,
                    h,
                    radius_x,
                    radius_y,
                } => self.language.write_canvas_rounded_rectangle(
                    b,
                    &header,
                    Vec2::new(*x, *y),
                    Vec2::new(*w, *h),
                    Vec2::new(*radius_x, *radius_y),
                ),
                CanvasGeometry::Combination {
                    a,
                    b: other,
                    matrix,
                    combine,
                } => {
                    let a = self.factory_call(*a)?;
                    let other = self.factory_call(*other)?;
                    self.language
                        .write_canvas_combination(b, &header, &a, &other, matrix, *combine)
                }
            },
            object @ (CompositionObject::PropertySet(_) | CompositionObject::AnimationController) => {
                Err(CodegenError::UnsupportedNode(object.type_name().to_string()))
            }
        }
    }

    fn start(&self, b: &mut CodeBuilder, header: &FactoryHeader<'_>, create_call: &str) {
        self.language.write_factory_start(b, header);
        self.language.write_create_assignment(b, header, create_call);
    }

    fn finish(&self, b: &mut CodeBuilder, id: NodeId) -> Result<(), CodegenError> {
        self.start_animations(b, id, "result")?;
        self.language.write_factory_end(b);
        Ok(())
    }

    fn set(&self, b: &mut CodeBuilder, property: &str, value: impl AsRef<str>) {
        b.write_line(format!(
            "result{}{property} = {};",
            self.language.deref(),
            value.as_ref()
        ));
    }

    /// A factory that only returns the result of one create call.
    fn write_simple_factory(&self, b: &mut CodeBuilder, header: &FactoryHeader<'_>, create_call: &str) {
        self.language.write_factory_start(b, header);
        match &header.field {
            Some(field) => {
                self.language.write_cache_handler(b, field);
                b.write_line(format!("return {field} = {create_call};"));
            }
            None => b.write_line(format!("return {create_call};")),
        }
        b.close_scope();
        b.blank_line();
    }

    fn needs_initialization(&self, id: NodeId) -> bool {
        let node = self.graph().node(id);
        !node.animators.is_empty()
            || self.graph().property_values(id).is_some()
            || (self.annotate && node.comment.is_some())
    }

    fn write_collection(
        &self,
        b: &mut CodeBuilder,
        local: &str,
        property: &str,
        method: &str,
        items: &[NodeId],
    ) -> Result<(), CodegenError> {
        if items.is_empty() {
            return Ok(());
        }
        let d = self.language.deref();
        b.write_line(format!("{} {local} = result{d}{property};", self.language.var()));
        for &item in items {
            b.write_line(format!("{local}{d}{method}({});", self.factory_call(item)?));
        }
        Ok(())
    }

    fn initialize_object(&self, b: &mut CodeBuilder, id: NodeId) {
        let d = self.language.deref();
        if self.annotate {
            if let Some(comment) = self.graph().comment(id).filter(|c| !c.trim().is_empty()) {
                self.set(b, "Comment", self.language.string(comment));
            }
        }

        if let Some(values) = self.graph().property_values(id) {
            b.write_line(format!("{} propertySet = result{d}Properties;", self.language.var()));
            for (name, value) in &values.scalars {
                b.write_line(format!(
                    "propertySet{d}InsertScalar({}, {});",
                    self.language.string(name),
                    self.language.float(*value)
                ));
            }
            for (name, value) in &values.vector2s {
                b.write_line(format!(
                    "propertySet{d}InsertVector2({}, {});",
                    self.language.string(name),
                    self.language.vector2(*value)
                ));
            }
        }
    }

    fn initialize_visual(
        &self,
        b: &mut CodeBuilder,
        id: NodeId,
        visual: &VisualProps,
    ) -> Result<(), CodegenError> {
        self.initialize_object(b, id);
        if let Some(center_point) = visual.center_point {
            self.set(b, "CenterPoint", self.language.vector3(center_point));
        }
        if let Some(clip) = visual.clip {
            self.set(b, "Clip", self.factory_call(clip)?);
        }
        if let Some(offset) = visual.offset {
            self.set(b, "Offset", self.language.vector3(offset));
        }
        if let Some(opacity) = visual.opacity {
            self.set(b, "Opacity", self.language.float(opacity));
        }
        if let Some(rotation) = visual.rotation_angle_in_degrees {
            self.set(b, "RotationAngleInDegrees", self.language.float(rotation));
        }
        if let Some(scale) = visual.scale {
            self.set(b, "Scale", self.language.vector3(scale));
        }
        if let Some(size) = visual.size {
            self.set(b, "Size", self.language.vector2(size));
        }
        Ok(())
    }

    fn initialize_shape(
        &self,
        b: &mut CodeBuilder,
        id: NodeId,
        shape: &ShapeProps,
    ) -> Result<(), CodegenError> {
        self.initialize_object(b, id);
        if let Some(center_point) = shape.center_point {
            self.set(b, "CenterPoint", self.language.vector2(center_point));
        }
        if let Some(offset) = shape.offset {
            self.set(b, "Offset", self.language.vector2(offset));
        }
        if let Some(rotation) = shape.rotation_angle_in_degrees {
            self.set(b, "RotationAngleInDegrees", self.language.float(rotation));
        }
        if let Some(scale) = shape.scale {
            self.set(b, "Scale", self.language.vector2(scale));
        }
        if let Some(matrix) = shape.transform_matrix {
            self.set(b, "TransformMatrix", self.language.matrix3x2(&matrix));
        }
        Ok(())
    }

    fn initialize_geometry(&self, b: &mut CodeBuilder, id: NodeId, geometry: &GeometryProps) {
        self.initialize_object(b, id);
        if geometry.trim_end != 1.0 {
            self.set(b, "TrimEnd", self.language.float(geometry.trim_end));
        }
        if geometry.trim_offset != 0.0 {
            self.set(b, "TrimOffset", self.language.float(geometry.trim_offset));
        }
        if geometry.trim_start != 0.0 {
            self.set(b, "TrimStart", self.language.float(geometry.trim_start));
        }
    }

    fn initialize_animation(
        &self,
        b: &mut CodeBuilder,
        id: NodeId,
        reference_parameters: &[(String, NodeId)],
    ) -> Result<(), CodegenError> {
        self.initialize_object(b, id);
        for (key, value) in reference_parameters {
            b.write_line(format!(
                "result{}SetReferenceParameter({}, {});",
                self.language.deref(),
                self.language.string(key),
                self.factory_call(*value)?
            ));
        }
        Ok(())
    }

    fn write_sprite(&self, b: &mut CodeBuilder, sprite: &SpriteShape) -> Result<(), CodegenError> {
        let d = self.language.deref();
        if let Some(fill) = sprite.fill_brush {
            self.set(b, "FillBrush", self.factory_call(fill)?);
        }
        if let Some(geometry) = sprite.geometry {
            self.set(b, "Geometry", self.factory_call(geometry)?);
        }
        if let Some(stroke) = sprite.stroke_brush {
            self.set(b, "StrokeBrush", self.factory_call(stroke)?);
        }
        if sprite.stroke_dash_cap != StrokeCap::Flat {
            self.set(b, "StrokeDashCap", self.language.stroke_cap(sprite.stroke_dash_cap));
        }
        if sprite.stroke_dash_offset != 0.0 {
            self.set(b, "StrokeDashOffset", self.language.float(sprite.stroke_dash_offset));
        }
        if !sprite.stroke_dash_array.is_empty() {
            b.write_line(format!(
                "{} strokeDashArray = result{d}StrokeDashArray;",
                self.language.var()
            ));
            for dash in &sprite.stroke_dash_array {
                b.write_line(format!(
                    "strokeDashArray{d}{}({});",
                    self.language.list_add(),
                    self.language.float(*dash)
                ));
            }
        }
        if sprite.stroke_end_cap != StrokeCap::Flat {
            self.set(b, "StrokeEndCap", self.language.stroke_cap(sprite.stroke_end_cap));
        }
        if sprite.stroke_line_join != StrokeLineJoin::Miter {
            self.set(b, "StrokeLineJoin", self.language.stroke_line_join(sprite.stroke_line_join));
        }
        if sprite.stroke_start_cap != StrokeCap::Flat {
            self.set(b, "StrokeStartCap", self.language.stroke_cap(sprite.stroke_start_cap));
        }
        if sprite.stroke_miter_limit != 1.0 {
            self.set(b, "StrokeMiterLimit", self.language.float(sprite.stroke_miter_limit));
        }
        if sprite.stroke_thickness != 1.0 {
            self.set(b, "StrokeThickness", self.language.float(sprite.stroke_thickness));
        }
        Ok(())
    }

    fn write_keyframe_animation<T>(
        &self,
        b: &mut CodeBuilder,
        header: &FactoryHeader<'_>,
        id: NodeId,
        kind: &str,
        animation: &KeyFrameAnimation<T>,
        value: impl Fn(&T) -> Result<String, CodegenError>,
    ) -> Result<(), CodegenError> {
        let d = self.language.deref();
        self.start(b, header, &format!("_c{d}Create{kind}KeyFrameAnimation()"));
        self.initialize_animation(b, id, &animation.reference_parameters)?;
        self.set(b, "Duration", self.language.time_span(animation.duration));
        for keyframe in &animation.keyframes {
            let progress = self.language.float(keyframe.progress);
            let easing = self.factory_call(keyframe.easing)?;
            match &keyframe.value {
                KeyFrameValue::Value(v) => b.write_line(format!(
                    "result{d}InsertKeyFrame({progress}, {}, {easing});",
                    value(v)?
                )),
                KeyFrameValue::Expression(expression) => b.write_line(format!(
                    "result{d}InsertExpressionKeyFrame({progress}, {}, {easing});",
                    self.language.string(expression)
                )),
            }
        }
        self.finish(b, id)
    }

    /// Starts the animations of `id` and of its property set on `local`.
    /// Controllers are paused and get their own animations started.
    fn start_animations(&self, b: &mut CodeBuilder, id: NodeId, local: &str) -> Result<(), CodegenError> {
        let graph = self.graph();
        let node = graph.node(id);
        let property_animators = node
            .properties
            .map(|set| graph.node(set).animators.as_slice())
            .unwrap_or(&[]);
        let d = self.language.deref();
        let mut controller_declared = false;

        for animator in property_animators.iter().chain(&node.animators) {
            let animation = self.canonical.canonical(animator.animation);
            let property = self.language.string(&animator.property);
            match graph.object(animation) {
                CompositionObject::ExpressionAnimation(expression)
                    if self.singletons.contains(&animation) =>
                {
                    b.write_line(format!("{SINGLETON_EXPRESSION}{d}ClearAllParameters();"));
                    b.write_line(format!(
                        "{SINGLETON_EXPRESSION}{d}Expression = {};",
                        self.language.string(&expression.expression)
                    ));
                    for (key, value) in &expression.reference_parameters {
                        let value = if *value == id {
                            local.to_string()
                        } else {
                            self.factory_call(*value)?
                        };
                        b.write_line(format!(
                            "{SINGLETON_EXPRESSION}{d}SetReferenceParameter({}, {value});",
                            self.language.string(key)
                        ));
                    }
                    b.write_line(format!(
                        "{local}{d}StartAnimation({property}, {SINGLETON_EXPRESSION});"
                    ));
                }
                _ => b.write_line(format!(
                    "{local}{d}StartAnimation({property}, {});",
                    self.factory_call(animation)?
                )),
            }

            if let Some(controller) = animator.controller {
                let lookup = format!("{local}{d}TryGetAnimationController({property})");
                if controller_declared {
                    b.write_line(format!("controller = {lookup};"));
                } else {
                    b.write_line(format!("{} controller = {lookup};", self.language.var()));
                    controller_declared = true;
                }
                b.write_line(format!("controller{d}Pause();"));
                self.start_animations(b, controller, "controller")?;
            }
        }
        Ok(())
    }
}
