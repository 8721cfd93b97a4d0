//! Shape layer content.
//!
//! A content list is evaluated as a stack popped from its end. Fills,
//! strokes, trims and rounded corners on top of the stack update the
//! [`ShapeContentContext`]; geometries below them consume it.

use glam::{DVec2, Vec2};
use lottie_data::model::{
    EllipseShape, FillRule, GroupShape, MergeMode, PathShape, RectShape, Shape,
};

use super::context::{
    RoundedCorner, ShapeContentContext, SolidFill, SolidStroke, TranslationContext, TrimPath,
};
use super::transforms::LayerTransform;
use super::Translator;
use crate::animatable::{self, PathGeometry};
use crate::error::TranslateError;
use crate::graph::{
    CanvasGeometry, CompositionObject, FigureLoop, FilledRegionDetermination, GeometryCombine,
    GeometryProps, Matrix3x2, NodeId, PathCommand, SpriteShape,
};
use crate::optimizer::{self, AnimatableOrder};

impl<'a> Translator<'a> {
    /// Translates `contents` into shapes. A transform item in the list is
    /// applied to `container`.
    pub(super) fn translate_shape_contents(
        &mut self,
        context: &TranslationContext,
        mut shape_context: ShapeContentContext,
        contents: &'a [Shape],
        container: NodeId,
    ) -> Result<Vec<NodeId>, TranslateError> {
        let mut stack: Vec<&'a Shape> = contents.iter().filter(|s| !s.is_hidden()).collect();
        let mut shapes = Vec::new();

        loop {
            self.fold_context_items(&mut stack, &mut shape_context)?;
            let Some(content) = stack.pop() else {
                break;
            };

            match content {
                Shape::Transform(transform) => {
                    let transform = LayerTransform::read(&transform.t, &mut self.issues)?;
                    shape_context.update_opacity(&transform.opacity_percent, &mut self.issues)?;
                    self.apply_transform_to_shape(context, &transform, container);
                }
                Shape::Group(group) => {
                    if let Some(group) = self.translate_group(context, shape_context.clone(), group)? {
                        shapes.push(group);
                    }
                }
                Shape::Path(path) => shapes.push(self.translate_path(context, &shape_context, path)?),
                Shape::Ellipse(ellipse) => {
                    shapes.push(self.translate_ellipse(context, &shape_context, ellipse)?)
                }
                Shape::Rect(rect) => {
                    shapes.push(self.translate_rectangle(context, &shape_context, rect)?)
                }
                Shape::Polystar(_) => self.issues.unsupported("Polystar")?,
                Shape::Repeater(_) => self.issues.unsupported("Repeater")?,
                Shape::MergePaths(merge) => {
                    let mode = merge.mode().ok_or_else(|| {
                        TranslateError::Invariant(format!("unknown merge mode {}", merge.mm))
                    })?;
                    if let Some(merged) =
                        self.translate_merge_paths(context, &shape_context, &mut stack, mode)?
                    {
                        shapes.push(merged);
                    }
                }
                Shape::Unknown => self.issues.unsupported("Unknown shape content")?,
                Shape::Fill(_)
                | Shape::Stroke(_)
                | Shape::GradientFill(_)
                | Shape::GradientStroke(_)
                | Shape::Trim(_)
                | Shape::RoundCorners(_) => {
                    return Err(TranslateError::Invariant(
                        "context content left on the shape stack".into(),
                    ))
                }
            }
        }

        Ok(shapes)
    }

    /// Pops the context-setting items on top of the stack into `shape_context`.
    fn fold_context_items(
        &mut self,
        stack: &mut Vec<&'a Shape>,
        shape_context: &mut ShapeContentContext,
    ) -> Result<(), TranslateError> {
        while let Some(top) = stack.last() {
            let issues = &mut self.issues;
            match top {
                Shape::Fill(fill) => shape_context.update_fill(SolidFill::read(fill, issues)?, issues)?,
                Shape::Stroke(stroke) => {
                    shape_context.update_stroke(SolidStroke::read(stroke, issues)?, issues)?
                }
                Shape::Trim(trim) => shape_context.update_trim(TrimPath::read(trim, issues)?, issues)?,
                Shape::RoundCorners(rounded) => shape_context
                    .update_rounded_corner(RoundedCorner::read(rounded, issues)?, issues)?,
                Shape::GradientFill(_) => issues.unsupported("Gradient fill")?,
                Shape::GradientStroke(_) => issues.unsupported("Gradient stroke")?,
                _ => break,
            }
            stack.pop();
        }
        Ok(())
    }

    fn translate_group(
        &mut self,
        context: &TranslationContext,
        shape_context: ShapeContentContext,
        group: &'a GroupShape,
    ) -> Result<Option<NodeId>, TranslateError> {
        let container = self.graph.add(CompositionObject::container_shape());
        let contents = self.translate_shape_contents(context, shape_context, &group.it, container)?;
        if contents.is_empty() {
            return Ok(None);
        }

        if let Some(name) = &group.nm {
            self.describe(container, || name.clone());
        }
        for shape in contents {
            self.graph.push_child(container, shape);
        }
        Ok(Some(container))
    }

    fn translate_ellipse(
        &mut self,
        context: &TranslationContext,
        shape_context: &ShapeContentContext,
        ellipse: &EllipseShape,
    ) -> Result<NodeId, TranslateError> {
        let position = animatable::vector2(&ellipse.p, &mut self.issues)?;
        let diameter = animatable::vector2(&ellipse.s, &mut self.issues)?;

        let geometry = self.graph.add(CompositionObject::EllipseGeometry {
            geometry: GeometryProps::default(),
            center: position.initial_value.truncate().as_vec2(),
            radius: (diameter.initial_value.truncate() * 0.5).as_vec2(),
        });
        self.apply_vector2(context, &position, geometry, "Center");
        self.apply_scaled_vector2(context, &diameter, 0.5, geometry, "Radius");

        let sprite = self.sprite_shape(geometry);
        let name = ellipse.nm.as_deref().unwrap_or("");
        self.describe(sprite, || name.to_string());
        self.describe(geometry, || format!("{name}.EllipseGeometry"));

        self.apply_shape_content_context(context, shape_context, sprite, geometry, 0.0)?;
        Ok(sprite)
    }

    fn translate_rectangle(
        &mut self,
        context: &TranslationContext,
        shape_context: &ShapeContentContext,
        rect: &RectShape,
    ) -> Result<NodeId, TranslateError> {
        let position = animatable::vector2(&rect.p, &mut self.issues)?;
        let size = animatable::vector2(&rect.s, &mut self.issues)?;
        let own_radius = animatable::scalar(&rect.r, 0.0, &mut self.issues)?;
        let initial_size = size.initial_value.truncate().as_vec2();

        let geometry = if own_radius.always_equals(&0.0) && shape_context.rounded_corner.is_none() {
            self.graph.add(CompositionObject::RectangleGeometry {
                geometry: GeometryProps::default(),
                offset: None,
                size: initial_size,
            })
        } else {
            // A rounded corner in the context overrides the rectangle's own radius.
            let radius = match &shape_context.rounded_corner {
                Some(rounded) => rounded.radius.clone(),
                None => own_radius,
            };
            let corner_radius = if radius.is_animated() || radius.initial_value != 0.0 {
                Vec2::splat(radius.initial_value as f32)
            } else {
                Vec2::ZERO
            };
            let geometry = self.graph.add(CompositionObject::RoundedRectangleGeometry {
                geometry: GeometryProps::default(),
                corner_radius,
                offset: None,
                size: initial_size,
            });
            self.apply_scalar(context, &radius, geometry, "CornerRadius.X");
            self.apply_scalar(context, &radius, geometry, "CornerRadius.Y");
            geometry
        };

        // The document positions rectangles by their center; geometries by
        // their top left corner.
        let initial_position = position.initial_value.truncate().as_vec2();
        if position.is_animated() || size.is_animated() {
            self.graph.insert_vector2(geometry, "Position", initial_position);
            self.start_expression_on(
                geometry,
                "Offset",
                "Vector2(my.Position.X-(my.Size.X/2),my.Position.Y-(my.Size.Y/2))",
                geometry,
            );
            if position.is_animated() {
                let properties = self.graph.properties(geometry);
                self.apply_vector2(context, &position, properties, "Position");
            }
            self.apply_vector2(context, &size, geometry, "Size");
        } else {
            let offset = initial_position - initial_size / 2.0;
            set_rectangle_offset(self.graph.object_mut(geometry), offset);
        }

        let partial_trim = shape_context.trim.as_ref().is_some_and(|trim| {
            trim.start_percent.is_animated()
                || trim.end_percent.is_animated()
                || trim.offset_degrees.is_animated()
                || trim.start_percent.initial_value != 0.0
                || trim.end_percent.initial_value != 100.0
        });
        if size.is_animated() && partial_trim {
            self.issues
                .unsupported("Rectangle with animated size or TrimPath may produce incorrect result.")?;
        }

        // Trim paths start at the top right corner of a document rectangle
        // and at the top left of a geometry.
        let width = size.initial_value.x;
        let height = size.initial_value.y;
        let trim_offset_degrees = if width + height == 0.0 {
            0.0
        } else {
            width / (2.0 * (width + height)) * 360.0
        };

        let sprite = self.sprite_shape(geometry);
        self.apply_shape_content_context(
            context,
            shape_context,
            sprite,
            geometry,
            trim_offset_degrees,
        )?;

        let name = rect.nm.as_deref().unwrap_or("");
        self.describe(sprite, || name.to_string());
        self.describe(geometry, || format!("{name}.RectangleGeometry"));
        Ok(sprite)
    }

    fn translate_path(
        &mut self,
        context: &TranslationContext,
        shape_context: &ShapeContentContext,
        path: &PathShape,
    ) -> Result<NodeId, TranslateError> {
        if let Some(rounded) = &shape_context.rounded_corner {
            if rounded.radius.is_animated() || rounded.radius.initial_value != 0.0 {
                self.issues.unsupported("Rounded corners on path")?;
            }
        }

        let geometry = animatable::path(&path.ks, &mut self.issues)?;
        let fill_rule = path_fill_rule(shape_context);
        let initial_path = self.composition_path(&geometry.initial_value, fill_rule);
        let path_geometry = self.graph.add(CompositionObject::PathGeometry {
            geometry: GeometryProps::default(),
            path: Some(initial_path),
        });
        self.apply_path(context, &geometry, fill_rule, path_geometry, "Path");

        let sprite = self.sprite_shape(path_geometry);
        let name = path.nm.as_deref().unwrap_or("");
        self.describe(sprite, || name.to_string());
        self.describe(path_geometry, || format!("{name}.PathGeometry"));

        self.apply_shape_content_context(context, shape_context, sprite, path_geometry, 0.0)?;
        Ok(sprite)
    }

    /// Combines every geometry remaining on the stack into one path.
    fn translate_merge_paths(
        &mut self,
        context: &TranslationContext,
        shape_context: &ShapeContentContext,
        stack: &mut Vec<&'a Shape>,
        mode: MergeMode,
    ) -> Result<Option<NodeId>, TranslateError> {
        let Some(merged) = self.merge_shape_contents(shape_context, stack, mode)? else {
            return Ok(None);
        };

        let path = self.graph.add(CompositionObject::Path { source: merged });
        let geometry = self.graph.add(CompositionObject::PathGeometry {
            geometry: GeometryProps::default(),
            path: Some(path),
        });
        let sprite = self.sprite_shape(geometry);
        self.apply_shape_content_context(context, shape_context, sprite, geometry, 0.0)?;
        Ok(Some(sprite))
    }

    fn merge_shape_contents(
        &mut self,
        shape_context: &ShapeContentContext,
        stack: &mut Vec<&'a Shape>,
        mode: MergeMode,
    ) -> Result<Option<NodeId>, TranslateError> {
        let combine = geometry_combine(mode);
        let fill_rule = match &shape_context.fill {
            Some(fill) => fill.fill_rule,
            None => FillRule::EvenOdd,
        };

        let geometries = self.canvas_geometries(shape_context, stack, fill_rule)?;
        let mut geometries = geometries.into_iter();
        let Some(first) = geometries.next() else {
            return Ok(None);
        };
        let merged = geometries.fold(first, |a, b| {
            self.graph.add(CompositionObject::CanvasGeometry(CanvasGeometry::Combination {
                a,
                b,
                matrix: Matrix3x2::IDENTITY,
                combine,
            }))
        });
        Ok(Some(merged))
    }

    /// Pops the whole stack, returning its geometries. Context items and
    /// transforms are skipped.
    fn canvas_geometries(
        &mut self,
        shape_context: &ShapeContentContext,
        stack: &mut Vec<&'a Shape>,
        fill_rule: FillRule,
    ) -> Result<Vec<NodeId>, TranslateError> {
        let mut result = Vec::new();
        while let Some(content) = stack.pop() {
            match content {
                Shape::Group(group) => {
                    let mut group_stack: Vec<&'a Shape> =
                        group.it.iter().filter(|s| !s.is_hidden()).collect();
                    let group_context = shape_context.clone();
                    result.extend(self.canvas_geometries(&group_context, &mut group_stack, fill_rule)?);
                }
                Shape::MergePaths(merge) => {
                    let mode = merge.mode().ok_or_else(|| {
                        TranslateError::Invariant(format!("unknown merge mode {}", merge.mm))
                    })?;
                    if let Some(merged) = self.merge_shape_contents(shape_context, stack, mode)? {
                        result.push(merged);
                    }
                }
                Shape::Repeater(_) => self.issues.unsupported("Repeater")?,
                Shape::Polystar(_) => self.issues.unsupported("Polystar")?,
                Shape::Path(path) => result.push(self.path_canvas_geometry(path, fill_rule)?),
                Shape::Ellipse(ellipse) => result.push(self.ellipse_canvas_geometry(ellipse)?),
                Shape::Rect(rect) => result.push(self.rectangle_canvas_geometry(shape_context, rect)?),
                Shape::Unknown => self.issues.unsupported("Unknown shape content")?,
                Shape::Transform(_)
                | Shape::Fill(_)
                | Shape::Stroke(_)
                | Shape::GradientFill(_)
                | Shape::GradientStroke(_)
                | Shape::Trim(_)
                | Shape::RoundCorners(_) => {}
            }
        }
        Ok(result)
    }

    fn path_canvas_geometry(
        &mut self,
        path: &PathShape,
        fill_rule: FillRule,
    ) -> Result<NodeId, TranslateError> {
        let geometry = animatable::path(&path.ks, &mut self.issues)?;
        if geometry.is_animated() {
            self.issues.unsupported("Combining of shapes that are animated")?;
        }
        Ok(self.canvas_path(&geometry.initial_value, fill_rule))
    }

    fn ellipse_canvas_geometry(&mut self, ellipse: &EllipseShape) -> Result<NodeId, TranslateError> {
        let position = animatable::vector2(&ellipse.p, &mut self.issues)?;
        let diameter = animatable::vector2(&ellipse.s, &mut self.issues)?;
        if position.is_animated() || diameter.is_animated() {
            self.issues.unsupported("Combining of shapes that are animated")?;
        }

        let center = position.initial_value;
        let radius = diameter.initial_value * 0.5;
        Ok(self.graph.add(CompositionObject::CanvasGeometry(CanvasGeometry::Ellipse {
            x: center.x as f32,
            y: center.y as f32,
            radius_x: radius.x as f32,
            radius_y: radius.y as f32,
        })))
    }

    fn rectangle_canvas_geometry(
        &mut self,
        shape_context: &ShapeContentContext,
        rect: &RectShape,
    ) -> Result<NodeId, TranslateError> {
        let position = animatable::vector2(&rect.p, &mut self.issues)?;
        let size = animatable::vector2(&rect.s, &mut self.issues)?;
        let radius = match &shape_context.rounded_corner {
            Some(rounded) => rounded.radius.clone(),
            None => animatable::scalar(&rect.r, 0.0, &mut self.issues)?,
        };
        if position.is_animated() || size.is_animated() || radius.is_animated() {
            self.issues.unsupported("Combining of shapes that are animated")?;
        }

        let (width, height) = (size.initial_value.x, size.initial_value.y);
        let radius = radius.initial_value as f32;
        Ok(self.graph.add(CompositionObject::CanvasGeometry(CanvasGeometry::RoundedRectangle {
            x: (position.initial_value.x - width / 2.0) as f32,
            y: (position.initial_value.y - height / 2.0) as f32,
            w: width as f32,
            h: height as f32,
            radius_x: radius,
            radius_y: radius,
        })))
    }

    /// A composition path wrapping a canvas path of `geometry`.
    pub(super) fn composition_path(&mut self, geometry: &PathGeometry, fill_rule: FillRule) -> NodeId {
        let source = self.canvas_path(geometry, fill_rule);
        self.graph.add(CompositionObject::Path { source })
    }

    fn canvas_path(&mut self, geometry: &PathGeometry, fill_rule: FillRule) -> NodeId {
        let point = |p: DVec2| p.as_vec2();
        let mut commands = vec![PathCommand::SetFilledRegionDetermination(
            filled_region_determination(fill_rule),
        )];
        if geometry.beziers.is_empty() {
            commands.push(PathCommand::BeginFigure(Vec2::ZERO));
            commands.push(PathCommand::EndFigure(FigureLoop::Closed));
        } else {
            commands.push(PathCommand::BeginFigure(point(geometry.start)));
            commands.extend(geometry.beziers.iter().map(|segment| {
                PathCommand::AddCubicBezier(
                    point(segment.cp1),
                    point(segment.cp2),
                    point(segment.vertex),
                )
            }));
            commands.push(PathCommand::EndFigure(if geometry.closed {
                FigureLoop::Closed
            } else {
                FigureLoop::Open
            }));
        }
        self.graph
            .add(CompositionObject::CanvasGeometry(CanvasGeometry::Path(commands)))
    }

    fn sprite_shape(&mut self, geometry: NodeId) -> NodeId {
        self.graph.add(CompositionObject::SpriteShape(SpriteShape {
            geometry: Some(geometry),
            ..SpriteShape::default()
        }))
    }

    /// Applies the fill, stroke and trim in effect to a sprite and its
    /// geometry.
    fn apply_shape_content_context(
        &mut self,
        context: &TranslationContext,
        shape_context: &ShapeContentContext,
        sprite: NodeId,
        geometry: NodeId,
        trim_offset_degrees: f64,
    ) -> Result<(), TranslateError> {
        let opacity = &shape_context.opacity_percent;
        let fill = self.fill_brush(context, shape_context.fill.as_ref(), opacity)?;
        if let Some(shape) = self.graph.sprite_mut(sprite) {
            shape.fill_brush = fill;
        }
        self.apply_stroke(context, shape_context.stroke.as_ref(), sprite, opacity)?;
        if let Some(trim) = &shape_context.trim {
            self.apply_trim_path(context, trim, geometry, trim_offset_degrees)?;
        }
        Ok(())
    }

    fn apply_trim_path(
        &mut self,
        context: &TranslationContext,
        trim: &TrimPath,
        geometry: NodeId,
        trim_offset_degrees: f64,
    ) -> Result<(), TranslateError> {
        let mut start = optimizer::optimized(&trim.start_percent);
        let mut end = optimizer::optimized(&trim.end_percent);

        let order = optimizer::animatable_order(&start, &end);
        if order == AnimatableOrder::After {
            // Trim start must not exceed trim end.
            std::mem::swap(&mut start, &mut end);
        }

        if order == AnimatableOrder::BeforeAndAfter {
            // The two values cross, so order them with an expression.
            self.graph
                .insert_scalar(geometry, "TStart", (start.initial_value / 100.0) as f32);
            self.graph
                .insert_scalar(geometry, "TEnd", (end.initial_value / 100.0) as f32);
            let properties = self.graph.properties(geometry);
            self.apply_scaled_scalar(context, &start, 0.01, properties, "TStart");
            self.apply_scaled_scalar(context, &end, 0.01, properties, "TEnd");
            self.start_expression_on(geometry, "TrimStart", "Min(my.TStart,my.TEnd)", geometry);
            self.start_expression_on(geometry, "TrimEnd", "Max(my.TStart,my.TEnd)", geometry);
        } else {
            if let Some(props) = self.graph.geometry_mut(geometry) {
                props.trim_start = (start.initial_value / 100.0) as f32;
                props.trim_end = (end.initial_value / 100.0) as f32;
            }
            self.apply_scaled_scalar(context, &start, 0.01, geometry, "TrimStart");
            self.apply_scaled_scalar(context, &end, 0.01, geometry, "TrimEnd");
        }

        let offset = &trim.offset_degrees;
        if trim_offset_degrees != 0.0 && !offset.is_animated() {
            if let Some(props) = self.graph.geometry_mut(geometry) {
                props.trim_offset = ((offset.initial_value + trim_offset_degrees) / 360.0) as f32;
            }
        } else {
            if trim_offset_degrees != 0.0 {
                self.issues
                    .unsupported("Animated trim offset with static trim offset.")?;
            }
            if let Some(props) = self.graph.geometry_mut(geometry) {
                props.trim_offset = (offset.initial_value / 360.0) as f32;
            }
            self.apply_scaled_scalar(context, offset, 1.0 / 360.0, geometry, "TrimOffset");
        }
        Ok(())
    }
}

fn set_rectangle_offset(object: &mut CompositionObject, value: Vec2) {
    if let CompositionObject::RectangleGeometry { offset, .. }
    | CompositionObject::RoundedRectangleGeometry { offset, .. } = object
    {
        *offset = (value != Vec2::ZERO).then_some(value);
    }
}

fn path_fill_rule(shape_context: &ShapeContentContext) -> FillRule {
    match &shape_context.fill {
        Some(fill) => fill.fill_rule,
        None => FillRule::EvenOdd,
    }
}

fn filled_region_determination(fill_rule: FillRule) -> FilledRegionDetermination {
    match fill_rule {
        FillRule::EvenOdd => FilledRegionDetermination::Alternate,
        FillRule::NonZero => FilledRegionDetermination::Winding,
    }
}

fn geometry_combine(mode: MergeMode) -> GeometryCombine {
    match mode {
        MergeMode::Add => GeometryCombine::Union,
        MergeMode::Subtract => GeometryCombine::Exclude,
        MergeMode::Intersect => GeometryCombine::Intersect,
        MergeMode::Merge | MergeMode::ExcludeIntersections => GeometryCombine::Xor,
    }
}
