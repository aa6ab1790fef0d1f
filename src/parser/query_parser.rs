use crate::parser::{ParseError, QueryComparers, WordComparer};

#[derive(Debug, Default)]
pub struct QueryParser {
    pub position: usize,
    pub length: usize,
    pub text_v: Vec<char>,
    pub text: String,

    pub comparers: QueryComparers,
}

impl QueryParser {
    pub fn new(query: &str) -> Self {
        let text_v: Vec<char> = query.chars().collect();
        Self {
            position: 0,
            length: text_v.len(),
            text_v,
            text: query.to_string(),
            comparers: QueryComparers::new(),
        }
    }

    pub fn eof(&self) -> bool {
        self.position >= self.length
    }

    pub fn current(&self) -> char {
        self.peek(0)
    }

    /// Character `ahead` positions after the cursor, `'\0'` past the end.
    pub fn peek(&self, ahead: usize) -> char {
        self.text_v.get(self.position + ahead).copied().unwrap_or('\0')
    }

    pub fn next(&mut self) {
        if self.position < self.length {
            self.position += 1;
        }
    }

    pub fn next_non_whitespace(&mut self) {
        while !self.eof() && self.current().is_whitespace() {
            self.next();
        }
    }

    pub fn jump(&mut self, ahead: usize) {
        self.position = (self.position + ahead).min(self.length);
    }

    pub fn text_from_range(&self, start: usize, end: usize) -> String {
        let end = end.min(self.length);
        let start = start.min(end);
        self.text_v[start..end].iter().collect()
    }

    pub fn text_from_pivot(&self, pivot: usize) -> String {
        self.text_from_range(pivot, self.position)
    }

    /// Consumes the keyword picked from the comparers table, plus any trailing whitespace.
    pub fn consume_word(&mut self, pick: impl Fn(&QueryComparers) -> &WordComparer) -> bool {
        let comparer = pick(&self.comparers);
        if !comparer.compare(self) {
            return false;
        }

        let length = comparer.length;
        self.jump(length);
        self.next_non_whitespace();
        true
    }

    pub fn expect_word(
        &mut self,
        pick: impl Fn(&QueryComparers) -> &WordComparer,
        message: &str,
    ) -> Result<(), ParseError> {
        if self.consume_word(pick) {
            return Ok(());
        }
        ParseError::new(message, self.position, self).err()
    }

    pub fn is_word(&self, pick: impl Fn(&QueryComparers) -> &WordComparer) -> bool {
        pick(&self.comparers).compare(self)
    }

    pub fn consume_char(&mut self, expected: char) -> bool {
        if self.current() != expected {
            return false;
        }

        self.next();
        self.next_non_whitespace();
        true
    }

    pub fn expect_char(&mut self, expected: char, message: &str) -> Result<(), ParseError> {
        if self.consume_char(expected) {
            return Ok(());
        }
        ParseError::new(message, self.position, self).err()
    }
}
