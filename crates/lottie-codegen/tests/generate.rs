//! Code generation over translated documents.
//!
//! Run with: cargo test -p lottie-codegen --test generate

use lottie_codegen::{generate, summarize, CodegenError, GeneratedCode, Target};
use lottie_core::graph::CompositionObject;
use lottie_core::{translate, TranslateOptions, Translation};
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

fn shape_layer(ind: u32, name: &str, shapes: serde_json::Value) -> serde_json::Value {
    json!({
        "ty": 4,
        "ind": ind,
        "ip": 0,
        "op": 60,
        "st": 0,
        "nm": name,
        "ks": static_transform(),
        "shapes": shapes
    })
}

fn red_rectangle() -> serde_json::Value {
    json!([
        {
            "ty": "rc",
            "nm": "Rectangle",
            "p": { "a": 0, "k": [0, 0] },
            "s": { "a": 0, "k": [100, 50] },
            "r": { "a": 0, "k": 0 }
        },
        { "ty": "fl", "c": { "a": 0, "k": [1, 0, 0, 1] }, "o": { "a": 0, "k": 100 } }
    ])
}

fn growing_ellipse() -> serde_json::Value {
    json!([
        {
            "ty": "el",
            "p": { "a": 0, "k": [0, 0] },
            "s": { "a": 1, "k": [
                { "t": 0, "s": [10, 10] },
                { "t": 60, "s": [80, 80] }
            ] }
        },
        { "ty": "fl", "c": { "a": 0, "k": [0, 0, 1, 1] }, "o": { "a": 0, "k": 100 } }
    ])
}

fn triangle() -> serde_json::Value {
    json!([
        {
            "ty": "sh",
            "nm": "Triangle",
            "ks": { "a": 0, "k": {
                "c": true,
                "v": [[0, 0], [100, 0], [50, 80]],
                "i": [[0, 0], [0, 0], [0, 0]],
                "o": [[0, 0], [0, 0], [0, 0]]
            } }
        },
        { "ty": "fl", "c": { "a": 0, "k": [0, 1, 0, 1] }, "o": { "a": 0, "k": 100 } }
    ])
}

/// A rectangle with an ellipse cut out of it.
fn merged_shapes() -> serde_json::Value {
    json!([
        {
            "ty": "rc",
            "p": { "a": 0, "k": [0, 0] },
            "s": { "a": 0, "k": [100, 50] },
            "r": { "a": 0, "k": 0 }
        },
        { "ty": "el", "p": { "a": 0, "k": [0, 0] }, "s": { "a": 0, "k": [40, 40] } },
        { "ty": "mm", "mm": 3 },
        { "ty": "st", "c": { "a": 0, "k": [0, 0, 0, 1] }, "w": { "a": 0, "k": 2 }, "o": { "a": 0, "k": 100 } }
    ])
}

fn document(layers: serde_json::Value) -> LottieJson {
    serde_json::from_value(json!({
        "v": "5.5.0",
        "fr": 60,
        "ip": 0,
        "op": 60,
        "w": 500,
        "h": 500,
        "nm": "Test",
        "ddd": 0,
        "layers": layers,
        "assets": []
    }))
    .expect("Failed to parse test lottie")
}

fn translated(layers: serde_json::Value, annotate: bool) -> Translation {
    let options = TranslateOptions {
        annotate,
        ..TranslateOptions::default()
    };
    translate(&document(layers), &options).expect("translation failed")
}

fn csharp(translation: &Translation) -> GeneratedCode {
    generate(translation, Target::CSharp, "Test", false).expect("generation failed")
}

mod csharp {
    use super::*;

    #[test]
    fn test_static_rectangle_class() {
        let t = translated(json!([shape_layer(1, "Box", red_rectangle())]), false);
        let code = csharp(&t);

        assert_eq!(code.file_name, "Test.cs");
        let text = &code.text;
        assert!(text.starts_with("using Host = Lottie;\n"));
        assert!(!text.contains("Microsoft.Graphics.Canvas.Geometry"));
        assert!(text.contains("    sealed class Test : Host.ICompositionSource\n"));
        assert!(text.contains("size = new Vector2(500, 500);"));
        assert!(text.contains("duration = TimeSpan.FromTicks(10000000);"));
        assert!(text.contains("ContainerVisual ContainerVisual_0000()"));
        assert!(text.contains("propertySet.InsertScalar(\"Progress\", 0);"));
        assert!(text.contains("children.InsertAtTop(ShapeVisual_0000());"));
        assert!(text.contains("result.Offset = new Vector2(-50, -25);"));
        assert!(text.contains("result.Size = new Vector2(100, 50);"));
        assert!(text.contains(
            "return _c.CreateColorBrush(Color.FromArgb(0xFF, 0xFF, 0x00, 0x00));"
        ));
        assert!(text.contains("=> new Instantiator(compositor).ContainerVisual_0000();"));

        // Nothing refers back to the root, so it is not cached.
        assert!(!text.contains("_containerVisual_0000"));
        assert!(!text.contains("StartAnimation"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let layers = json!([
            shape_layer(1, "Box", red_rectangle()),
            shape_layer(2, "Ball", growing_ellipse())
        ]);
        let first = csharp(&translated(layers.clone(), false));
        let second = csharp(&translated(layers, false));
        assert_eq!(first, second);
    }

    #[test]
    fn test_keyframe_animation_is_bound_to_progress() {
        let t = translated(json!([shape_layer(1, "Ball", growing_ellipse())]), false);
        let text = csharp(&t).text;

        assert!(text.contains("Vector2KeyFrameAnimation Vector2KeyFrameAnimation_0000()"));
        assert!(text.contains("result.Duration = TimeSpan.FromTicks(10000000);"));
        assert!(text.contains("result.InsertKeyFrame(0, new Vector2(5, 5), "));
        assert!(text.contains("result.InsertKeyFrame(1, new Vector2(40, 40), "));
        assert!(text.contains(
            "result.StartAnimation(\"Radius\", Vector2KeyFrameAnimation_0000());"
        ));
        assert!(text.contains("var controller = result.TryGetAnimationController(\"Radius\");"));
        assert!(text.contains("controller.Pause();"));

        // The controller binding is used once, so it goes through the
        // reusable expression animation and refers to the cached root.
        assert!(text.contains("_expressionAnimation.Expression = \"_.Progress\";"));
        assert!(text.contains(
            "_expressionAnimation.SetReferenceParameter(\"_\", ContainerVisual_0000());"
        ));
        assert!(text.contains("controller.StartAnimation(\"Progress\", _expressionAnimation);"));
        assert!(text.contains("ContainerVisual _containerVisual_0000;"));
        assert!(text.contains("var result = _containerVisual_0000 = _c.CreateContainerVisual();"));
    }

    #[test]
    fn test_shared_brush_is_cached() {
        let t = translated(
            json!([
                shape_layer(1, "Top", red_rectangle()),
                shape_layer(2, "Bottom", red_rectangle())
            ]),
            false,
        );
        let text = csharp(&t).text;

        assert!(text.contains("CompositionColorBrush _compositionColorBrush_0000;"));
        assert!(text.contains("if (_compositionColorBrush_0000 != null)"));
        assert!(text.contains("return _compositionColorBrush_0000 = _c.CreateColorBrush("));
        assert!(!text.contains("CompositionColorBrush_0001"));
    }

    #[test]
    fn test_path_wrapper_is_inlined() {
        let t = translated(json!([shape_layer(1, "Shape", triangle())]), false);
        let text = csharp(&t).text;

        assert!(text.contains("using Microsoft.Graphics.Canvas.Geometry;"));
        assert!(text.contains("_c.CreatePathGeometry(new CompositionPath(CanvasGeometry_0000()))"));
        assert!(text.contains("using (var builder = new CanvasPathBuilder(null))"));
        assert!(text.contains("builder.BeginFigure(new Vector2(0, 0));"));
        assert!(text.contains("builder.EndFigure(CanvasFigureLoop.Closed);"));
        assert!(text.contains("return CanvasGeometry.CreatePath(builder);"));
        assert!(!text.contains("CompositionPath CompositionPath_0000()"));
    }

    #[test]
    fn test_comments_follow_annotate() {
        let t = translated(json!([shape_layer(1, "Box", red_rectangle())]), true);

        let plain = generate(&t, Target::CSharp, "Test", false).unwrap().text;
        assert!(!plain.contains(".Comment = "));

        let annotated = generate(&t, Target::CSharp, "Test", true).unwrap().text;
        assert!(annotated.contains("result.Comment = \"Lottie\";"));
        assert!(annotated.contains("result.Comment = \"ShapeLayer:'Box'\";"));
    }

    #[test]
    fn test_merge_paths_combine_canvas_geometries() {
        let t = translated(json!([shape_layer(1, "Cutout", merged_shapes())]), false);
        let text = csharp(&t).text;

        assert!(text.contains("using Microsoft.Graphics.Canvas.Geometry;"));
        assert!(text.contains("_c.CreatePathGeometry(new CompositionPath(CanvasGeometry_"));
        assert!(text.contains("    CombineWith(CanvasGeometry_"));
        assert!(text.contains("    Matrix3x2.Identity,"));
        assert!(text.contains("    CanvasGeometryCombine.Exclude);"));
        assert!(text.contains("CanvasGeometry.CreateEllipse("));
        assert!(text.contains("CanvasGeometry.CreateRoundedRectangle("));
    }
}

mod cx {
    use super::*;

    #[test]
    fn test_static_rectangle_class() {
        let t = translated(json!([shape_layer(1, "Box", red_rectangle())]), false);
        let code = generate(&t, Target::Cx, "Test", false).unwrap();

        assert_eq!(code.file_name, "Test.cpp");
        let text = &code.text;
        assert!(!text.contains("#include \"d2d1.h\""));
        assert!(text.contains("class Test sealed"));
        assert!(text.contains("size = {500, 500};"));
        assert!(text.contains("duration = TimeSpan{10000000L};"));
        assert!(text.contains("return ContainerVisual_0000();"));
        assert!(text.contains("ContainerVisual^ ContainerVisual_0000()"));
        assert!(text.contains("auto result = _c->CreateContainerVisual();"));
        assert!(text.contains("propertySet->InsertScalar(L\"Progress\", 0);"));
        assert!(text.contains("shapes->Append("));
        assert!(text.contains("ColorHelper::FromArgb(0xFF, 0xFF, 0x00, 0x00)"));
        assert!(text.ends_with("        };\n    };\n}\n"));
    }

    #[test]
    fn test_path_uses_direct2d_sink() {
        let t = translated(json!([shape_layer(1, "Shape", triangle())]), false);
        let text = generate(&t, Target::Cx, "Test", false).unwrap().text;

        assert!(text.contains("#include \"d2d1.h\""));
        assert!(text.contains("IGeometrySource2D^ CanvasGeometry_0000()"));
        assert!(text.contains("sink->BeginFigure({0, 0}, D2D1_FIGURE_BEGIN_FILLED);"));
        assert!(text.contains("sink->EndFigure(D2D1_FIGURE_END_CLOSED);"));
        assert!(text.contains("return D2DGeometryToIGeometrySource2D(path);"));
        assert!(text.contains("ref new CompositionPath(CanvasGeometry_0000())"));
    }

    #[test]
    fn test_merge_paths_use_direct2d_combination() {
        let t = translated(json!([shape_layer(1, "Cutout", merged_shapes())]), false);
        let first = generate(&t, Target::Cx, "Test", false).expect("generation failed");
        let second = generate(&t, Target::Cx, "Test", false).expect("generation failed");
        assert_eq!(first, second);

        let text = &first.text;
        assert!(text.contains("#include \"d2d1.h\""));
        assert!(text.contains("IGeometrySource2DToD2DGeometry(CanvasGeometry_"));
        assert!(text.contains(")->CombineWithGeometry(\n"));
        assert!(text.contains("    D2D1_COMBINE_MODE_EXCLUDE,\n"));
        assert!(text.contains("    D2D1::Matrix3x2F::Identity(),\n"));
        assert!(text.contains("    sink.Get());\n"));
        assert!(text.contains("_d2dFactory->CreateEllipseGeometry("));
        assert!(text.contains("_d2dFactory->CreateRoundedRectangleGeometry("));
        assert!(text.contains(
            "static ComPtr<ID2D1Geometry> IGeometrySource2DToD2DGeometry(IGeometrySource2D^ source)"
        ));
        assert!(!text.contains("CanvasGeometryCombine"));
    }
}

mod canonical {
    use super::*;

    #[test]
    fn test_canonical_count_never_exceeds_raw() {
        let t = translated(
            json!([
                shape_layer(1, "Top", red_rectangle()),
                shape_layer(2, "Middle", growing_ellipse()),
                shape_layer(3, "Bottom", red_rectangle())
            ]),
            false,
        );
        let summary = summarize(&t, false).unwrap();
        assert!(summary.canonical_nodes <= summary.raw_nodes);
        // The two rectangle geometries merge.
        assert!(summary.canonical_nodes < summary.raw_nodes);
    }

    #[test]
    fn test_root_must_be_a_visual() {
        let mut t = translated(json!([shape_layer(1, "Box", red_rectangle())]), false);
        let (brush, _) = t
            .graph
            .iter()
            .find(|(_, node)| matches!(node.object, CompositionObject::ColorBrush { .. }))
            .expect("no brush");
        t.root = brush;
        assert_eq!(
            generate(&t, Target::CSharp, "Test", false).unwrap_err(),
            CodegenError::MissingRoot
        );
    }
}
