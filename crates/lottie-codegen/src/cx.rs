//! C++/CX instantiators. Canvas geometries are built with Direct2D and
//! handed to the compositor as `IGeometrySource2D`.

use glam::Vec2;
use lottie_core::graph::{GeometryCombine, Matrix3x2, PathCommand};

use crate::code_builder::CodeBuilder;
use crate::error::CodegenError;
use crate::generator::{store_prefix, ClassInfo, FactoryHeader, Language, SINGLETON_EXPRESSION};
use crate::stringifier::{CppStringifier, Stringifier};

const GEOMETRY_SOURCE: &str = "IGeometrySource2D";

/// Converts a Direct2D geometry for the compositor.
const GEOMETRY_CONVERSION: &str = "D2DGeometryToIGeometrySource2D";

/// Recovers the Direct2D geometry behind a geometry source so it can be combined.
const GEOMETRY_UNWRAP: &str = "IGeometrySource2DToD2DGeometry";

fn cx_type(type_name: &str) -> &str {
    match type_name {
        "CanvasGeometry" => GEOMETRY_SOURCE,
        other => other,
    }
}

impl CppStringifier {
    fn write_geometry_start(&self, builder: &mut CodeBuilder, header: &FactoryHeader<'_>) {
        self.write_factory_start(builder, header);
        if let Some(field) = &header.field {
            self.write_cache_handler(builder, field);
        }
    }

    fn write_geometry_end(&self, builder: &mut CodeBuilder, header: &FactoryHeader<'_>, local: &str) {
        builder.write_line(format!(
            "return {}{GEOMETRY_CONVERSION}({local});",
            store_prefix(header)
        ));
        builder.close_scope();
        builder.blank_line();
    }
}

impl Language for CppStringifier {
    fn extension(&self) -> &'static str {
        "cpp"
    }

    fn write_preamble(&self, builder: &mut CodeBuilder, requires_geometry: bool) {
        if requires_geometry {
            builder.write_line("#include \"d2d1.h\"");
            builder.write_line("#include <d2d1_1.h>");
            builder.write_line("#include <d2d1helper.h>");
            builder.write_line("#include \"WindowsNumerics.h\"");
            builder.write_line("#include <Windows.Graphics.Interop.h>");
            builder.write_line("#include <windows.ui.composition.interop.h>");
            builder.write_line("#include \"GeoSource.h\"");
            builder.write_line("#include <wrl.h>");
        }
        builder.blank_line();
        builder.write_line("using namespace Windows::Foundation;");
        builder.write_line("using namespace Windows::Foundation::Numerics;");
        builder.write_line("using namespace Windows::UI;");
        builder.write_line("using namespace Windows::UI::Composition;");
        builder.write_line("using namespace Windows::Graphics;");
        builder.write_line("using namespace Microsoft::WRL;");
    }

    fn write_class_start(&self, builder: &mut CodeBuilder, class: &ClassInfo<'_>) {
        builder.blank_line();
        builder.write_line("namespace Compositions");
        builder.open_scope();
        builder.write_line(format!("class {} sealed", class.class_name));
        builder.open_scope();

        builder.write_line("public:");
        builder.write_line("bool TryCreateInstance(");
        builder.indent();
        builder.write_line("Compositor^ const compositor,");
        builder.write_line("Visual^& rootVisual,");
        builder.write_line("float2& size,");
        builder.write_line("CompositionPropertySet^& progressPropertySet,");
        builder.write_line("TimeSpan& duration)");
        builder.unindent();
        builder.open_scope();
        builder.write_line("Instantiator comp(compositor);");
        builder.write_line("rootVisual = comp.GetRootContainerVisual();");
        builder.write_line(format!("size = {};", self.vector2_raw(class.size)));
        builder.write_line("progressPropertySet = rootVisual->Properties;");
        builder.write_line(format!("duration = {};", self.time_span(class.duration)));
        builder.write_line("return true;");
        builder.close_scope();
        builder.blank_line();

        builder.write_line("private:");
        builder.write_line("class Instantiator sealed");
        builder.open_scope();
        builder.write_line("public:");
        builder.write_line("Instantiator(Compositor^ compositor)");
        builder.open_scope();
        builder.write_line("_c = compositor;");
        builder.write_line(format!(
            "{SINGLETON_EXPRESSION} = compositor->CreateExpressionAnimation();"
        ));
        builder.write_line(
            "HRESULT hr = D2D1CreateFactory(D2D1_FACTORY_TYPE_SINGLE_THREADED, _d2dFactory.GetAddressOf());",
        );
        builder.write_line("if (hr != S_OK)");
        builder.open_scope();
        builder.write_line("throw ref new Platform::Exception(hr);");
        builder.close_scope();
        builder.close_scope();
        builder.blank_line();

        builder.write_line("Visual^ GetRootContainerVisual()");
        builder.open_scope();
        builder.write_line(format!("return {};", class.root_call));
        builder.close_scope();
        builder.blank_line();

        builder.write_line("private:");
        builder.write_line("Compositor^ _c;");
        builder.write_line("ComPtr<ID2D1Factory> _d2dFactory;");
        builder.write_line(format!("ExpressionAnimation^ {SINGLETON_EXPRESSION};"));
    }

    fn write_field(&self, builder: &mut CodeBuilder, type_name: &str, field_name: &str) {
        builder.write_line(format!("{}^ {field_name};", cx_type(type_name)));
    }

    fn write_class_end(&self, builder: &mut CodeBuilder, _class: &ClassInfo<'_>) {
        builder.write_line(format!(
            "static {GEOMETRY_SOURCE}^ {GEOMETRY_CONVERSION}(ComPtr<ID2D1Geometry> geometry)"
        ));
        builder.open_scope();
        builder.write_line("ComPtr<GeoSource> geoSource = new GeoSource(geometry.Get());");
        builder.write_line(
            "ComPtr<ABI::Windows::Graphics::IGeometrySource2D> interop = geoSource.Detach();",
        );
        builder.write_line(format!(
            "return reinterpret_cast<{GEOMETRY_SOURCE}^>(interop.Get());"
        ));
        builder.close_scope();
        builder.blank_line();

        builder.write_line(format!(
            "static ComPtr<ID2D1Geometry> {GEOMETRY_UNWRAP}({GEOMETRY_SOURCE}^ source)"
        ));
        builder.open_scope();
        builder.write_line("ComPtr<ABI::Windows::Graphics::IGeometrySource2DInterop> interop;");
        builder.write_line(
            "reinterpret_cast<IInspectable*>(source)->QueryInterface(IID_PPV_ARGS(&interop));",
        );
        builder.write_line("ComPtr<ID2D1Geometry> geometry;");
        builder.write_line("interop->GetGeometry(&geometry);");
        builder.write_line("return geometry;");
        builder.close_scope();
        builder.blank_line();

        builder.close_class_scope();
        builder.close_class_scope();
        builder.close_scope();
    }

    fn write_factory_start(&self, builder: &mut CodeBuilder, header: &FactoryHeader<'_>) {
        builder.write_line(format!("{}^ {}()", cx_type(header.type_name), header.name));
        builder.open_scope();
    }

    fn write_canvas_path(
        &self,
        builder: &mut CodeBuilder,
        header: &FactoryHeader<'_>,
        commands: &[PathCommand],
    ) -> Result<(), CodegenError> {
        self.write_geometry_start(builder, header);
        builder.write_line("ComPtr<ID2D1PathGeometry> path;");
        builder.write_line("_d2dFactory->CreatePathGeometry(&path);");
        builder.write_line("ComPtr<ID2D1GeometrySink> sink;");
        builder.write_line("path->Open(&sink);");
        for command in commands {
            match command {
                PathCommand::SetFilledRegionDetermination(fill) => builder.write_line(format!(
                    "sink->SetFillMode({});",
                    self.filled_region_determination(*fill)
                )),
                PathCommand::BeginFigure(point) => builder.write_line(format!(
                    "sink->BeginFigure({}, D2D1_FIGURE_BEGIN_FILLED);",
                    self.vector2_raw(*point)
                )),
                PathCommand::AddCubicBezier(cp1, cp2, end) => builder.write_line(format!(
                    "sink->AddBezier({{{}, {}, {}}});",
                    self.vector2_raw(*cp1),
                    self.vector2_raw(*cp2),
                    self.vector2_raw(*end)
                )),
                PathCommand::EndFigure(figure_loop) => builder.write_line(format!(
                    "sink->EndFigure({});",
                    self.figure_loop(*figure_loop)
                )),
            }
        }
        builder.write_line("sink->Close();");
        self.write_geometry_end(builder, header, "path");
        Ok(())
    }

    fn write_canvas_ellipse(
        &self,
        builder: &mut CodeBuilder,
        header: &FactoryHeader<'_>,
        center: Vec2,
        radius: Vec2,
    ) -> Result<(), CodegenError> {
        self.write_geometry_start(builder, header);
        builder.write_line("ComPtr<ID2D1EllipseGeometry> ellipse;");
        builder.write_line(format!(
            "_d2dFactory->CreateEllipseGeometry(D2D1::Ellipse({}, {}, {}), &ellipse);",
            self.vector2_raw(center),
            self.float(radius.x),
            self.float(radius.y)
        ));
        self.write_geometry_end(builder, header, "ellipse");
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
        self.write_geometry_start(builder, header);
        builder.write_line("ComPtr<ID2D1RoundedRectangleGeometry> rectangle;");
        builder.write_line(format!(
            "_d2dFactory->CreateRoundedRectangleGeometry(D2D1::RoundedRect({{{}, {}, {}, {}}}, {}, {}), &rectangle);",
            self.float(origin.x),
            self.float(origin.y),
            self.float(origin.x + size.x),
            self.float(origin.y + size.y),
            self.float(radius.x),
            self.float(radius.y)
        ));
        self.write_geometry_end(builder, header, "rectangle");
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
        self.write_geometry_start(builder, header);
        builder.write_line("ComPtr<ID2D1PathGeometry> path;");
        builder.write_line("_d2dFactory->CreatePathGeometry(&path);");
        builder.write_line("ComPtr<ID2D1GeometrySink> sink;");
        builder.write_line("path->Open(&sink);");
        builder.write_line(format!("{GEOMETRY_UNWRAP}({a_call})->CombineWithGeometry("));
        builder.indent();
        builder.write_line(format!("{GEOMETRY_UNWRAP}({b_call}).Get(),"));
        builder.write_line(format!("{},", self.combine_mode(combine)));
        builder.write_line(format!("{},", self.d2d_matrix(matrix)));
        builder.write_line("sink.Get());");
        builder.unindent();
        builder.write_line("sink->Close();");
        self.write_geometry_end(builder, header, "path");
        Ok(())
    }
}
