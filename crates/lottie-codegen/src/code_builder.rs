use std::fmt;

const INDENT_SIZE: usize = 4;

/// Accumulates lines of source text with brace-scoped indentation.
#[derive(Debug, Clone, Default)]
pub struct CodeBuilder {
    lines: Vec<(usize, String)>,
    indent: usize,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_line(&mut self, line: impl Into<String>) {
        self.lines.push((self.indent, line.into()));
    }

    pub fn blank_line(&mut self) {
        self.lines.push((0, String::new()));
    }

    pub fn open_scope(&mut self) {
        self.write_line("{");
        self.indent();
    }

    pub fn close_scope(&mut self) {
        self.unindent();
        self.write_line("}");
    }

    /// Closes a C++ class body.
    pub fn close_class_scope(&mut self) {
        self.unindent();
        self.write_line("};");
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn unindent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for CodeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (indent, line) in &self.lines {
            if line.is_empty() {
                writeln!(f)?;
            } else {
                writeln!(f, "{:width$}{line}", "", width = indent * INDENT_SIZE)?;
            }
        }
        Ok(())
    }
}
