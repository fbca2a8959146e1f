/// Cumulative source of every snippet that evaluated successfully in this session.
#[derive(Debug, Default, Clone)]
pub struct CodeBuffer {
    code: String,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snippet unless it is already part of the buffer (a re-execution).
    ///
    /// Returns whether the snippet was appended.
    pub fn append(&mut self, code: &str) -> bool {
        if self.code.contains(code) {
            return false;
        }
        self.code.push('\n');
        self.code.push_str(code);
        true
    }

    pub fn as_str(&self) -> &str {
        &self.code
    }
}
