//! Indented Java text buffer.

const INDENT: &str = "    ";

/// Line-oriented writer with Allman braces.
#[derive(Debug, Default)]
pub(super) struct JavaWriter {
    out: String,
    depth: usize,
}

impl JavaWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    /// Separator line. Collapses with other blanks and never follows an opening brace.
    pub fn blank(&mut self) {
        if self.out.is_empty() || self.out.ends_with("\n\n") || self.out.ends_with("{\n") {
            return;
        }
        self.out.push('\n');
    }

    pub fn open(&mut self) {
        self.line("{");
        self.depth += 1;
    }

    /// `header` on its own line followed by an opening brace.
    pub fn block(&mut self, header: impl AsRef<str>) {
        self.line(header);
        self.open();
    }

    pub fn close(&mut self) {
        self.close_with("");
    }

    pub fn close_with(&mut self, suffix: &str) {
        while self.out.ends_with("\n\n") {
            self.out.pop();
        }
        self.depth = self.depth.saturating_sub(1);
        self.line(format!("}}{suffix}"));
    }

    /// Indent continuation lines of a wrapped statement.
    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn finish(mut self) -> String {
        while self.out.ends_with("\n\n") {
            self.out.pop();
        }
        self.out
    }
}
