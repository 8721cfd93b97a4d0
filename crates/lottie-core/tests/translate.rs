//! End-to-end translation tests.
//!
//! Run with: cargo test -p lottie-core --test translate

use lottie_core::graph::{CompositionObject, KeyFrameValue, NodeId};
use lottie_core::{translate, TranslateError, TranslateOptions, Translation};
use lottie_data::model::LottieJson;
use serde_json::json;

fn static_transform() -> serde_json::Value {
    json!({
        "o": { "a": 0, "k": 100 },
        "r": { "a": 0, "k": 0 },
        "p": { "a": 0, "k": [250, 250, 0] },
        "a": { "a": 0, "k": [0, 0, 0] },
        "s": { "a": 0, "k": [100, 100, 100] }
    })
}

fn shape_layer(ind: u32, ip: f32, op: f32, shapes: serde_json::Value) -> serde_json::Value {
    json!({
        "ty": 4,
        "ind": ind,
        "ip": ip,
        "op": op,
        "st": 0,
        "nm": "Shape Layer",
        "ks": static_transform(),
        "shapes": shapes
    })
}

fn filled_rectangle() -> serde_json::Value {
    json!([
        {
            "ty": "rc",
            "nm": "Rectangle",
            "p": { "a": 0, "k": [0, 0] },
            "s": { "a": 0, "k": [100, 50] },
            "r": { "a": 0, "k": 0 }
        },
        {
            "ty": "fl",
            "nm": "Fill",
            "c": { "a": 0, "k": [1, 0, 0, 1] },
            "o": { "a": 0, "k": 100 }
        }
    ])
}

fn document(layers: serde_json::Value, assets: serde_json::Value) -> LottieJson {
    let json = json!({
        "v": "5.5.0",
        "fr": 60,
        "ip": 0,
        "op": 60,
        "w": 500,
        "h": 500,
        "nm": "Test",
        "ddd": 0,
        "layers": layers,
        "assets": assets
    });

    serde_json::from_value(json).expect("Failed to parse test lottie")
}

/// Test helper to create a minimal lottie with a single shape layer
fn create_test_lottie(ip: f32, op: f32, shapes: serde_json::Value) -> LottieJson {
    document(json!([shape_layer(1, ip, op, shapes)]), json!([]))
}

fn translate_default(doc: &LottieJson) -> Translation {
    translate(doc, &TranslateOptions::default()).expect("translation failed")
}

fn annotated(doc: &LottieJson) -> Translation {
    let options = TranslateOptions {
        annotate: true,
        ..TranslateOptions::default()
    };
    translate(doc, &options).expect("translation failed")
}

fn only_child(t: &Translation, id: NodeId) -> NodeId {
    let children = t.graph.children(id);
    assert_eq!(children.len(), 1, "expected one child of {id:?}");
    children[0]
}

fn count_objects(t: &Translation, pred: impl Fn(&CompositionObject) -> bool) -> usize {
    t.graph.iter().filter(|(_, node)| pred(&node.object)).count()
}

fn expression_of(t: &Translation, animation: NodeId) -> &str {
    match t.graph.object(animation) {
        CompositionObject::ExpressionAnimation(e) => &e.expression,
        other => panic!("expected an expression animation, found {}", other.type_name()),
    }
}

mod layers {
    use super::*;

    #[test]
    fn test_static_rectangle_layer() {
        let t = translate_default(&create_test_lottie(0.0, 60.0, filled_rectangle()));

        assert!(t.issues.is_empty(), "unexpected issues: {:?}", t.issues);
        assert_eq!((t.width, t.height), (500.0, 500.0));
        assert_eq!(t.duration.as_secs_f64(), 1.0);
        assert_eq!(t.progress_property, "Progress");

        let shape_visual = only_child(&t, t.root);
        assert!(matches!(
            t.graph.object(shape_visual),
            CompositionObject::ShapeVisual { .. }
        ));
        let transform = only_child(&t, shape_visual);
        let sprite = only_child(&t, transform);

        let CompositionObject::SpriteShape(sprite) = t.graph.object(sprite) else {
            panic!("expected a sprite shape");
        };
        let geometry = sprite.geometry.expect("sprite has no geometry");
        match t.graph.object(geometry) {
            CompositionObject::RectangleGeometry { size, offset, .. } => {
                assert_eq!(size.to_array(), [100.0, 50.0]);
                assert_eq!(offset.map(|o| o.to_array()), Some([-50.0, -25.0]));
            }
            other => panic!("expected a rectangle geometry, found {}", other.type_name()),
        }
        let brush = sprite.fill_brush.expect("sprite has no fill");
        match t.graph.object(brush) {
            CompositionObject::ColorBrush { color } => {
                assert_eq!((color.a, color.r, color.g, color.b), (255, 255, 0, 0));
            }
            other => panic!("expected a color brush, found {}", other.type_name()),
        }

        // Nothing moves, so nothing is animated.
        assert!(t.graph.iter().all(|(_, node)| node.animators.is_empty()));
        assert_eq!(count_objects(&t, |o| matches!(o, CompositionObject::ExpressionAnimation(_))), 0);
    }

    #[test]
    fn test_layer_out_at_half_duration_gets_visibility_node() {
        let t = translate_default(&create_test_lottie(0.0, 30.0, filled_rectangle()));

        let shape_visual = only_child(&t, t.root);
        let transform = only_child(&t, shape_visual);
        let visibility = only_child(&t, transform);

        let animators = &t.graph.node(visibility).animators;
        assert_eq!(animators.len(), 1);
        assert_eq!(animators[0].property, "TransformMatrix");
        assert_eq!(
            expression_of(&t, animators[0].animation),
            "(_.Progress < 0.5) ? (Matrix3x2(1,0,0,1,0,0)) : (Matrix3x2(0,0,0,0,0,0))"
        );
        let CompositionObject::ExpressionAnimation(animation) =
            t.graph.object(animators[0].animation)
        else {
            unreachable!();
        };
        assert_eq!(animation.reference_parameters, vec![("_".to_string(), t.root)]);
    }

    #[test]
    fn test_layer_outside_window_is_pruned_without_issues() {
        let shapes = json!([
            { "ty": "sr", "nm": "Star" },
            { "ty": "fl", "c": { "a": 0, "k": [1, 0, 0, 1] }, "o": { "a": 0, "k": 100 } }
        ]);
        let t = translate_default(&create_test_lottie(70.0, 90.0, shapes));

        assert!(t.graph.children(t.root).is_empty());
        assert!(t.issues.is_empty());
    }

    #[test]
    fn test_hidden_and_null_layers_produce_nothing() {
        let mut hidden = shape_layer(1, 0.0, 60.0, filled_rectangle());
        hidden["hd"] = json!(true);
        let null_layer = json!({ "ty": 3, "ind": 2, "ip": 0, "op": 60, "nm": "Null", "ks": static_transform() });
        let t = translate_default(&document(json!([hidden, null_layer]), json!([])));

        assert!(t.graph.children(t.root).is_empty());
    }

    #[test]
    fn test_parent_transform_is_prepended() {
        let null_layer = json!({ "ty": 3, "ind": 1, "ip": 0, "op": 60, "nm": "Null", "ks": static_transform() });
        let mut child = shape_layer(2, 0.0, 60.0, filled_rectangle());
        child["parent"] = json!(1);
        let t = annotated(&document(json!([child, null_layer]), json!([])));

        let shape_visual = only_child(&t, t.root);
        let parent_transform = only_child(&t, shape_visual);
        let own_transform = only_child(&t, parent_transform);

        assert_eq!(
            t.graph.comment(parent_transform),
            Some("ShapeLayer:'Shape Layer'")
        );
        assert_eq!(
            t.graph.comment(own_transform),
            Some("'Shape Layer'.Transforms & 'Shape Layer'.Contents")
        );
        assert_eq!(t.graph.comment(t.root), Some("Lottie"));
    }

    #[test]
    fn test_missing_parent_is_an_invariant_violation() {
        let mut child = shape_layer(2, 0.0, 60.0, filled_rectangle());
        child["parent"] = json!(7);
        let result = translate(&document(json!([child]), json!([])), &TranslateOptions::default());

        assert!(matches!(result, Err(TranslateError::Invariant(_))));
    }

    #[test]
    fn test_parent_cycle_is_an_invariant_violation() {
        let mut a = shape_layer(1, 0.0, 60.0, filled_rectangle());
        a["parent"] = json!(2);
        let mut b = shape_layer(2, 0.0, 60.0, filled_rectangle());
        b["parent"] = json!(1);
        let result = translate(&document(json!([a, b]), json!([])), &TranslateOptions::default());

        assert!(matches!(result, Err(TranslateError::Invariant(_))));
    }

    #[test]
    fn test_consecutive_shape_layers_share_a_shape_visual() {
        let layers = json!([
            shape_layer(1, 0.0, 60.0, filled_rectangle()),
            shape_layer(2, 0.0, 60.0, filled_rectangle())
        ]);
        let t = translate_default(&document(layers, json!([])));

        let shape_visual = only_child(&t, t.root);
        assert_eq!(t.graph.children(shape_visual).len(), 2);
        // The two identical fills share one brush.
        assert_eq!(count_objects(&t, |o| matches!(o, CompositionObject::ColorBrush { .. })), 1);
    }

    #[test]
    fn test_precomp_layer_translates_asset_layers() {
        let precomp = json!({
            "ty": 0,
            "ind": 1,
            "ip": 0,
            "op": 60,
            "st": 0,
            "nm": "Inner",
            "refId": "comp_0",
            "w": 200,
            "h": 100,
            "ks": static_transform()
        });
        let assets = json!([
            { "id": "comp_0", "layers": [shape_layer(1, 0.0, 60.0, filled_rectangle())] }
        ]);
        let t = annotated(&document(json!([precomp]), assets));

        let result = only_child(&t, t.root);
        assert_eq!(t.graph.comment(result), Some("PreCompLayer:'Inner'->'comp_0'"));
        match t.graph.object(result) {
            CompositionObject::ContainerVisual { visual, .. } => {
                assert!(visual.clip.is_some());
                assert_eq!(visual.size.map(|s| s.to_array()), Some([500.0, 500.0]));
            }
            other => panic!("expected a container visual, found {}", other.type_name()),
        }

        let transform = only_child(&t, result);
        let inner_visual = only_child(&t, transform);
        match t.graph.object(inner_visual) {
            CompositionObject::ShapeVisual { visual, .. } => {
                assert_eq!(visual.size.map(|s| s.to_array()), Some([200.0, 100.0]));
            }
            other => panic!("expected a shape visual, found {}", other.type_name()),
        }
    }

    #[test]
    fn test_missing_precomp_asset_is_an_invariant_violation() {
        let precomp = json!({
            "ty": 0, "ind": 1, "ip": 0, "op": 60, "refId": "nowhere", "ks": static_transform()
        });
        let result = translate(&document(json!([precomp]), json!([])), &TranslateOptions::default());

        assert!(matches!(result, Err(TranslateError::Invariant(_))));
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        let mut doc = create_test_lottie(0.0, 60.0, filled_rectangle());
        doc.op = doc.ip;

        assert!(matches!(
            translate(&doc, &TranslateOptions::default()),
            Err(TranslateError::Invariant(_))
        ));
    }
}

mod issues {
    use super::*;

    fn star_lottie() -> LottieJson {
        create_test_lottie(
            0.0,
            60.0,
            json!([
                { "ty": "sr", "nm": "Star" },
                { "ty": "gf", "nm": "Gradient" }
            ]),
        )
    }

    #[test]
    fn test_unsupported_content_is_recorded_once_in_order() {
        let mut doc = star_lottie();
        doc.layers.push(doc.layers[0].clone());
        let t = translate_default(&doc);

        assert_eq!(t.issues, vec!["Gradient fill", "Polystar"]);
    }

    #[test]
    fn test_strict_mode_fails_on_first_issue() {
        let options = TranslateOptions {
            strict: true,
            ..TranslateOptions::default()
        };
        let result = translate(&star_lottie(), &options);

        assert_eq!(
            result.err(),
            Some(TranslateError::Unsupported("Gradient fill".to_string()))
        );
    }

    #[test]
    fn test_layer_level_features_are_reported() {
        let mut layer = shape_layer(1, 0.0, 60.0, filled_rectangle());
        layer["bm"] = json!(3);
        layer["sr"] = json!(2);
        layer["ddd"] = json!(1);
        let t = translate_default(&document(json!([layer]), json!([])));

        assert_eq!(t.issues, vec!["3d layer", "Blend mode: Overlay", "Time stretch"]);
    }
}

mod animation {
    use super::*;

    #[test]
    fn test_translation_is_deterministic() {
        let shapes = json!([
            {
                "ty": "el",
                "p": { "a": 0, "k": [0, 0] },
                "s": { "a": 1, "k": [
                    { "t": 0, "s": [10, 10], "o": { "x": [0.3], "y": [0] }, "i": { "x": [0.7], "y": [1] } },
                    { "t": 60, "s": [80, 80] }
                ] }
            },
            { "ty": "st", "c": { "a": 0, "k": [0, 0, 1, 1] }, "w": { "a": 0, "k": 4 }, "o": { "a": 0, "k": 100 } }
        ]);
        let doc = create_test_lottie(0.0, 60.0, shapes);

        let a = annotated(&doc);
        let b = annotated(&doc);
        assert_eq!(format!("{:?}", a.graph), format!("{:?}", b.graph));
    }

    #[test]
    fn test_animated_radius_is_bound_to_progress() {
        let shapes = json!([
            {
                "ty": "el",
                "p": { "a": 0, "k": [0, 0] },
                "s": { "a": 1, "k": [
                    { "t": 0, "s": [10, 10] },
                    { "t": 60, "s": [80, 80] }
                ] }
            },
            { "ty": "fl", "c": { "a": 0, "k": [0, 0, 1, 1] }, "o": { "a": 0, "k": 100 } }
        ]);
        let t = translate_default(&create_test_lottie(0.0, 60.0, shapes));

        let (geometry, node) = t
            .graph
            .iter()
            .find(|(_, node)| matches!(node.object, CompositionObject::EllipseGeometry { .. }))
            .expect("no ellipse geometry");
        assert_eq!(node.animators.len(), 1, "{geometry:?}");
        let animator = &node.animators[0];
        assert_eq!(animator.property, "Radius");

        let CompositionObject::Vector2KeyFrameAnimation(animation) =
            t.graph.object(animator.animation)
        else {
            panic!("expected a vector2 keyframe animation");
        };
        let values: Vec<_> = animation
            .keyframes
            .iter()
            .map(|k| match &k.value {
                KeyFrameValue::Value(v) => v.to_array(),
                KeyFrameValue::Expression(e) => panic!("unexpected expression {e}"),
            })
            .collect();
        assert_eq!(values, vec![[5.0, 5.0], [40.0, 40.0]]);

        // The controller follows the root progress unscaled.
        let controller = animator.controller.expect("keyframe animation without controller");
        let progress = &t.graph.node(controller).animators[0];
        assert_eq!(progress.property, "Progress");
        assert_eq!(expression_of(&t, progress.animation), "_.Progress");
    }

    #[test]
    fn test_curved_position_uses_progress_mapping() {
        let mut layer = shape_layer(1, 0.0, 60.0, filled_rectangle());
        layer["ks"]["p"] = json!({ "a": 1, "k": [
            { "t": 0, "s": [0, 0, 0], "to": [50, 0, 0], "ti": [0, 50, 0] },
            { "t": 60, "s": [100, 100, 0] }
        ] });
        let t = translate_default(&document(json!([layer]), json!([])));

        let root_properties = t.graph.property_values(t.root).expect("root has no properties");
        assert!(root_properties.scalars.iter().any(|(name, _)| name == "t0"));

        let has_bezier_keyframe = t.graph.iter().any(|(_, node)| match &node.object {
            CompositionObject::Vector2KeyFrameAnimation(animation) => animation
                .keyframes
                .iter()
                .any(|k| matches!(&k.value, KeyFrameValue::Expression(e) if e.contains("_.t0"))),
            _ => false,
        });
        assert!(has_bezier_keyframe);
    }

    #[test]
    fn test_crossing_trim_values_are_ordered_by_expression() {
        let shapes = json!([
            { "ty": "sh", "ks": { "a": 0, "k": { "c": false, "v": [[0, 0], [100, 0]], "i": [[0, 0], [0, 0]], "o": [[0, 0], [0, 0]] } } },
            { "ty": "st", "c": { "a": 0, "k": [0, 0, 0, 1] }, "w": { "a": 0, "k": 2 }, "o": { "a": 0, "k": 100 } },
            {
                "ty": "tm",
                "s": { "a": 1, "k": [{ "t": 0, "s": [0] }, { "t": 60, "s": [100] }] },
                "e": { "a": 0, "k": 50 },
                "o": { "a": 0, "k": 0 }
            }
        ]);
        let t = translate_default(&create_test_lottie(0.0, 60.0, shapes));

        let (_, geometry) = t
            .graph
            .iter()
            .find(|(_, node)| matches!(node.object, CompositionObject::PathGeometry { .. }))
            .expect("no path geometry");
        let expressions: Vec<_> = geometry
            .animators
            .iter()
            .map(|a| (a.property.as_str(), expression_of(&t, a.animation)))
            .collect();
        assert_eq!(
            expressions,
            vec![
                ("TrimStart", "Min(my.TStart,my.TEnd)"),
                ("TrimEnd", "Max(my.TStart,my.TEnd)")
            ]
        );
    }
}

mod merge_paths {
    use super::*;
    use lottie_core::graph::{CanvasGeometry, GeometryCombine};

    fn rectangle() -> serde_json::Value {
        json!({
            "ty": "rc",
            "p": { "a": 0, "k": [0, 0] },
            "s": { "a": 0, "k": [100, 50] },
            "r": { "a": 0, "k": 0 }
        })
    }

    fn ellipse() -> serde_json::Value {
        json!({ "ty": "el", "p": { "a": 0, "k": [10, 0] }, "s": { "a": 0, "k": [40, 40] } })
    }

    fn fill() -> serde_json::Value {
        json!({ "ty": "fl", "c": { "a": 0, "k": [0, 0, 0, 1] }, "o": { "a": 0, "k": 100 } })
    }

    /// The canvas geometry at the end of the sprite's geometry chain.
    fn merged_source(t: &Translation) -> NodeId {
        let shape_visual = only_child(t, t.root);
        let container = only_child(t, shape_visual);
        let sprite = only_child(t, container);
        let CompositionObject::SpriteShape(sprite) = t.graph.object(sprite) else {
            panic!("expected a sprite shape");
        };
        let geometry = sprite.geometry.expect("sprite has no geometry");
        let CompositionObject::PathGeometry { path: Some(path), .. } = t.graph.object(geometry) else {
            panic!("expected a path geometry");
        };
        let CompositionObject::Path { source } = t.graph.object(*path) else {
            panic!("expected a composition path");
        };
        *source
    }

    fn combination(t: &Translation, id: NodeId) -> (NodeId, NodeId, GeometryCombine) {
        match t.graph.object(id) {
            CompositionObject::CanvasGeometry(CanvasGeometry::Combination {
                a,
                b,
                matrix,
                combine,
            }) => {
                assert!(matrix.is_identity());
                (*a, *b, *combine)
            }
            other => panic!("expected a combination, found {}", other.type_name()),
        }
    }

    #[test]
    fn test_merge_combines_geometries_into_one_sprite() {
        let shapes = json!([rectangle(), ellipse(), { "ty": "mm", "mm": 3 }, fill()]);
        let t = translate_default(&create_test_lottie(0.0, 60.0, shapes));

        assert!(t.issues.is_empty(), "unexpected issues: {:?}", t.issues);
        let (a, b, combine) = combination(&t, merged_source(&t));
        assert_eq!(combine, GeometryCombine::Exclude);

        // Operands are taken from the top of the content stack down.
        assert!(matches!(
            t.graph.object(a),
            CompositionObject::CanvasGeometry(CanvasGeometry::Ellipse { x, radius_x, .. })
                if *x == 10.0 && *radius_x == 20.0
        ));
        assert!(matches!(
            t.graph.object(b),
            CompositionObject::CanvasGeometry(CanvasGeometry::RoundedRectangle { x, y, w, h, .. })
                if (*x, *y, *w, *h) == (-50.0, -25.0, 100.0, 50.0)
        ));
    }

    #[test]
    fn test_groups_inside_a_merge_contribute_their_geometries() {
        let shapes = json!([
            { "ty": "gr", "nm": "Pair", "it": [rectangle(), ellipse()] },
            {
                "ty": "sh",
                "ks": { "a": 0, "k": {
                    "c": true,
                    "v": [[0, 0], [10, 0], [5, 8]],
                    "i": [[0, 0], [0, 0], [0, 0]],
                    "o": [[0, 0], [0, 0], [0, 0]]
                } }
            },
            { "ty": "mm", "mm": 2 },
            fill()
        ]);
        let t = translate_default(&create_test_lottie(0.0, 60.0, shapes));

        assert_eq!(
            count_objects(&t, |o| matches!(o, CompositionObject::SpriteShape(_))),
            1
        );
        let (inner, rectangle, outer_combine) = combination(&t, merged_source(&t));
        let (path, ellipse, inner_combine) = combination(&t, inner);
        assert_eq!(outer_combine, GeometryCombine::Union);
        assert_eq!(inner_combine, GeometryCombine::Union);
        assert!(matches!(
            t.graph.object(path),
            CompositionObject::CanvasGeometry(CanvasGeometry::Path(_))
        ));
        assert!(matches!(
            t.graph.object(ellipse),
            CompositionObject::CanvasGeometry(CanvasGeometry::Ellipse { .. })
        ));
        assert!(matches!(
            t.graph.object(rectangle),
            CompositionObject::CanvasGeometry(CanvasGeometry::RoundedRectangle { .. })
        ));
    }

    #[test]
    fn test_animated_operands_are_reported() {
        let growing = json!({
            "ty": "el",
            "p": { "a": 0, "k": [0, 0] },
            "s": { "a": 1, "k": [
                { "t": 0, "s": [10, 10] },
                { "t": 60, "s": [80, 80] }
            ] }
        });
        let shapes = json!([rectangle(), growing, { "ty": "mm", "mm": 1 }, fill()]);
        let t = translate_default(&create_test_lottie(0.0, 60.0, shapes));

        assert_eq!(t.issues, vec!["Combining of shapes that are animated"]);
        // The initial size stands in for the animation.
        let (ellipse, _, combine) = combination(&t, merged_source(&t));
        assert_eq!(combine, GeometryCombine::Xor);
        assert!(matches!(
            t.graph.object(ellipse),
            CompositionObject::CanvasGeometry(CanvasGeometry::Ellipse { radius_x, .. })
                if *radius_x == 5.0
        ));
    }
}

mod annotation {
    use super::*;

    #[test]
    fn test_annotate_only_changes_comments() {
        let mut layer = shape_layer(
            1,
            0.0,
            60.0,
            json!([
                {
                    "ty": "gr",
                    "nm": "Group",
                    "it": [
                        {
                            "ty": "el",
                            "p": { "a": 0, "k": [0, 0] },
                            "s": { "a": 1, "k": [
                                { "t": 0, "s": [10, 10] },
                                { "t": 60, "s": [80, 80] }
                            ] }
                        },
                        { "ty": "st", "c": { "a": 0, "k": [0, 0, 1, 1] }, "w": { "a": 0, "k": 4 }, "o": { "a": 0, "k": 100 } }
                    ]
                },
                {
                    "ty": "rc",
                    "p": { "a": 0, "k": [0, 0] },
                    "s": { "a": 0, "k": [100, 50] },
                    "r": { "a": 0, "k": 0 }
                },
                { "ty": "fl", "c": { "a": 0, "k": [1, 0, 0, 1] }, "o": { "a": 0, "k": 100 } }
            ]),
        );
        layer["op"] = json!(30);
        layer["ks"]["p"] = json!({ "a": 1, "k": [
            { "t": 0, "s": [0, 0, 0] },
            { "t": 60, "s": [100, 100, 0] }
        ] });
        let doc = document(
            json!([layer, shape_layer(2, 0.0, 60.0, filled_rectangle())]),
            json!([]),
        );

        let plain = translate_default(&doc);
        let described = annotated(&doc);

        assert_eq!(plain.graph.len(), described.graph.len());
        assert_eq!(plain.root, described.root);
        assert!(plain.graph.iter().all(|(_, node)| node.comment.is_none()));
        assert!(described.graph.iter().any(|(_, node)| node.comment.is_some()));
        for ((id, a), (_, b)) in plain.graph.iter().zip(described.graph.iter()) {
            assert_eq!(a.object, b.object, "{id:?}");
            assert_eq!(a.animators, b.animators, "{id:?}");
            assert_eq!(a.properties, b.properties, "{id:?}");
        }
    }
}
