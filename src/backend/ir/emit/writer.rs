//! Indentation-aware source buffer.

use std::fmt::Write;

/// A buffer for building source text with tab indentation.
#[derive(Debug)]
pub struct SourceWriter {
    buffer: String,
    indent_level: usize,
    indent_str: &'static str,
}

impl Default for SourceWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceWriter {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            indent_level: 0,
            indent_str: "\t",
        }
    }

    /// Get the generated code
    pub fn finish(self) -> String {
        self.buffer
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Write a line with current indentation
    pub fn line(&mut self, s: &str) {
        self.write_indent();
        self.buffer.push_str(s);
        self.buffer.push('\n');
    }

    /// Write a formatted line with current indentation
    pub fn linef(&mut self, args: std::fmt::Arguments<'_>) {
        self.write_indent();
        let _ = self.buffer.write_fmt(args);
        self.buffer.push('\n');
    }

    pub fn blank_line(&mut self) {
        self.buffer.push('\n');
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.buffer.push_str(self.indent_str);
        }
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    /// Write `header {`, the body at one deeper level, then `}`.
    pub fn block<F, E>(&mut self, header: &str, f: F) -> Result<(), E>
    where
        F: FnOnce(&mut Self) -> Result<(), E>,
    {
        self.line(&format!("{} {{", header));
        self.indent();
        let result = f(self);
        self.dedent();
        self.line("}");
        result
    }

    pub fn comment(&mut self, text: &str) {
        self.line(&format!("// {}", text));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_blocks_indent_with_tabs() {
        let mut w = SourceWriter::new();
        let result: Result<(), ()> = w.block("func f()", |w| {
            w.line("x := 1");
            w.block("if x != 0", |w| {
                w.line("return");
                Ok(())
            })
        });
        assert!(result.is_ok());
        assert_eq!(w.finish(), "func f() {\n\tx := 1\n\tif x != 0 {\n\t\treturn\n\t}\n}\n");
    }

    #[test]
    fn test_dedent_saturates() {
        let mut w = SourceWriter::new();
        w.dedent();
        w.line("a");
        assert_eq!(w.as_str(), "a\n");
    }
}
