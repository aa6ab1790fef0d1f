use crate::parser::QueryParser;

/// Case-insensitive keyword matcher anchored at the parser cursor.
#[derive(Debug, Default)]
pub struct WordComparer {
    pub length: usize,
    pub word: Vec<char>,
    any_delimiter_postfix: bool,
    eof: bool,
}

impl WordComparer {
    pub fn new(word: &str) -> Self {
        let word: Vec<char> = word.to_uppercase().chars().collect();
        Self {
            length: word.len(),
            word,
            any_delimiter_postfix: false,
            eof: false,
        }
    }

    pub fn is_block_delimiter(ch: char) -> bool {
        ch.is_whitespace()
    }

    pub fn is_any_delimiter(ch: char) -> bool {
        matches!(ch, ',' | '(' | ')' | ';' | '=' | '<' | '>' | '!' | '\'' | '"') || Self::is_block_delimiter(ch)
    }

    pub fn reach_eof(&self, parser: &QueryParser) -> bool {
        parser.position + self.length >= parser.length
    }

    pub fn compare(&self, parser: &QueryParser) -> bool {
        for (offset, expected) in self.word.iter().enumerate() {
            if parser.peek(offset).to_ascii_uppercase() != *expected {
                return false;
            }
        }

        if self.reach_eof(parser) {
            return self.eof;
        }

        if !self.any_delimiter_postfix {
            return true;
        }

        Self::is_any_delimiter(parser.peek(self.length))
    }

    pub fn with_eof(mut self) -> Self { self.eof = true; self }
    pub fn with_any_delimiter_postfix(mut self) -> Self { self.any_delimiter_postfix = true; self }
}

#[cfg(test)]
mod tests {
    use crate::parser::{QueryParser, WordComparer};

    #[test]
    pub fn test_compare_case_insensitive() {
        let parser = QueryParser::new("wHeRe a = 1");
        let comparer = WordComparer::new("WHERE").with_any_delimiter_postfix();

        assert!(comparer.compare(&parser));
    }

    #[test]
    pub fn test_compare_rejects_prefix_of_identifier() {
        let parser = QueryParser::new("android = 1");
        let comparer = WordComparer::new("AND").with_any_delimiter_postfix().with_eof();

        assert!(!comparer.compare(&parser));
    }

    #[test]
    pub fn test_compare_eof() {
        let parser = QueryParser::new("desc");

        assert!(WordComparer::new("DESC").with_any_delimiter_postfix().with_eof().compare(&parser));
        assert!(!WordComparer::new("DESC").with_any_delimiter_postfix().compare(&parser));
    }

    #[test]
    pub fn test_compare_followed_by_parenthesis() {
        let parser = QueryParser::new("in(1, 2)");

        assert!(WordComparer::new("IN").with_any_delimiter_postfix().compare(&parser));
    }
}
