//! C# instantiators: a `Host.ICompositionSource` with a nested factory class.

use crate::code_builder::CodeBuilder;
use crate::generator::{ClassInfo, Language, SINGLETON_EXPRESSION};
use crate::stringifier::{CSharpStringifier, Stringifier};

impl Language for CSharpStringifier {
    fn extension(&self) -> &'static str {
        "cs"
    }

    fn write_preamble(&self, builder: &mut CodeBuilder, requires_geometry: bool) {
        builder.write_line("using Host = Lottie;");
        if requires_geometry {
            builder.write_line("using Microsoft.Graphics.Canvas.Geometry;");
        }
        builder.write_line("using System;");
        builder.write_line("using System.Numerics;");
        builder.write_line("using Windows.UI;");
        builder.write_line("using Windows.UI.Composition;");
    }

    fn write_class_start(&self, builder: &mut CodeBuilder, class: &ClassInfo<'_>) {
        builder.blank_line();
        builder.write_line("namespace Compositions");
        builder.open_scope();
        builder.write_line(format!(
            "sealed class {} : Host.ICompositionSource",
            class.class_name
        ));
        builder.open_scope();

        builder.write_line("public bool TryCreateInstance(");
        builder.indent();
        builder.write_line("Compositor compositor,");
        builder.write_line("out Visual rootVisual,");
        builder.write_line("out Vector2 size,");
        builder.write_line("out CompositionPropertySet progressPropertySet,");
        builder.write_line("out TimeSpan duration,");
        builder.write_line("out object diagnostics)");
        builder.unindent();
        builder.open_scope();
        builder.write_line("rootVisual = Instantiator.InstantiateComposition(compositor);");
        builder.write_line(format!("size = {};", self.vector2(class.size)));
        builder.write_line("progressPropertySet = rootVisual.Properties;");
        builder.write_line(format!("duration = {};", self.time_span(class.duration)));
        builder.write_line("diagnostics = null;");
        builder.write_line("return true;");
        builder.close_scope();
        builder.blank_line();

        builder.write_line("sealed class Instantiator");
        builder.open_scope();
        builder.write_line("readonly Compositor _c;");
        builder.write_line(format!("readonly ExpressionAnimation {SINGLETON_EXPRESSION};"));
    }

    fn write_field(&self, builder: &mut CodeBuilder, type_name: &str, field_name: &str) {
        builder.write_line(format!("{type_name} {field_name};"));
    }

    fn write_class_end(&self, builder: &mut CodeBuilder, class: &ClassInfo<'_>) {
        builder.write_line("internal static Visual InstantiateComposition(Compositor compositor)");
        builder.indent();
        builder.write_line(format!("=> new Instantiator(compositor).{};", class.root_call));
        builder.unindent();

        builder.blank_line();
        builder.write_line("Instantiator(Compositor compositor)");
        builder.open_scope();
        builder.write_line("_c = compositor;");
        builder.write_line(format!(
            "{SINGLETON_EXPRESSION} = compositor.CreateExpressionAnimation();"
        ));
        builder.close_scope();

        builder.close_scope();
        builder.close_scope();
        builder.close_scope();
    }
}
