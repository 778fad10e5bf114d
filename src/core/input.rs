use regex::Regex;

use crate::core::error::ShellError;

pub const CHAR_LIMIT: usize = 150;
const VALIDATION_PATTERN: &str = r"^[a-zA-Z\.]+$";

/// The controller's text prompt: a bounded line buffer plus its validator.
pub struct InputBuffer {
    value: String,
    limit: usize,
    validator: Regex,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self {
            value: String::new(),
            limit: CHAR_LIMIT,
            // the pattern is a constant and known to compile
            validator: Regex::new(VALIDATION_PATTERN).expect("validation pattern compiles"),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Characters past the limit are dropped.
    pub fn push(&mut self, c: char) {
        if self.value.chars().count() < self.limit {
            self.value.push(c);
        }
    }

    pub fn pop(&mut self) {
        self.value.pop();
    }

    pub fn set(&mut self, text: &str) {
        self.value = text.chars().take(self.limit).collect();
    }

    pub fn reset(&mut self) {
        self.value.clear();
    }

    pub fn validate(&self, line: &str) -> Result<(), ShellError> {
        if self.validator.is_match(line) {
            Ok(())
        } else {
            Err(ShellError::InvalidInput {
                input: line.to_string(),
            })
        }
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new()
    }
}
