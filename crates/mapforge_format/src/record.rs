//! Tokenizer and builder for one tab-separated record line

use crate::FormatError;

/// Reads the tokens of one record, reporting missing or malformed tokens
/// with the 1-based line number
pub struct RecordReader<'a> {
    tokens: std::str::Split<'a, char>,
    line: usize,
}

impl<'a> RecordReader<'a> {
    pub fn new(text: &'a str, line: usize) -> Self {
        Self {
            tokens: text.split('\t'),
            line,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn next_str(&mut self) -> Result<&'a str, FormatError> {
        self.tokens
            .next()
            .ok_or_else(|| FormatError::parse(self.line, "a value is missing"))
    }

    pub fn next_i32(&mut self) -> Result<i32, FormatError> {
        let token = self.next_str()?;
        token
            .parse()
            .map_err(|_| FormatError::parse(self.line, format!("integer expected, got '{token}'")))
    }

    pub fn next_u32(&mut self) -> Result<u32, FormatError> {
        let token = self.next_str()?;
        token.parse().map_err(|_| {
            FormatError::parse(
                self.line,
                format!("positive integer expected, got '{token}'"),
            )
        })
    }
}

/// Builds one tab-separated record line
#[derive(Default)]
pub struct RecordWriter {
    buf: String,
}

impl RecordWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(&mut self, token: &str) {
        if !self.buf.is_empty() {
            self.buf.push('\t');
        }
        self.buf.push_str(token);
    }

    pub fn push_i32(&mut self, value: i32) {
        self.push_str(&value.to_string());
    }

    pub fn push_u32(&mut self, value: u32) {
        self.push_str(&value.to_string());
    }

    pub fn finish(self) -> String {
        self.buf
    }
}
