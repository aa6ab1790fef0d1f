use crate::parser::{ParseError, QueryComparers, QueryParser};

pub struct TextCollector;

impl TextCollector {
    pub fn is_identifier_char(ch: char) -> bool {
        ch.is_alphanumeric() || ch == '_' || ch == '$'
    }

    pub fn is_identifier_start(ch: char) -> bool {
        ch.is_alphabetic() || ch == '_' || ch == '$'
    }

    /// Collects a single identifier segment, without dots.
    pub fn collect(parser: &mut QueryParser) -> Result<String, ParseError> {
        let pivot = parser.position;
        if !Self::is_identifier_start(parser.current()) {
            return ParseError::new("Invalid identifier", pivot, parser).err();
        }

        while !parser.eof() && Self::is_identifier_char(parser.current()) {
            parser.next();
        }

        Ok(parser.text_from_pivot(pivot))
    }

    /// Collects a dotted identifier such as `t.address.city`.
    pub fn collect_path(parser: &mut QueryParser) -> Result<Vec<String>, ParseError> {
        let mut segments = vec![Self::collect(parser)?];
        while parser.current() == '.' && Self::is_identifier_start(parser.peek(1)) {
            parser.next();
            segments.push(Self::collect(parser)?);
        }
        Ok(segments)
    }

    /// Reads an optional alias, either `AS name` or a bare non reserved word.
    pub fn collect_alias(parser: &mut QueryParser) -> Result<Option<String>, ParseError> {
        if parser.consume_word(|c| &c.alias) {
            let alias = Self::collect(parser)?;
            parser.next_non_whitespace();
            return Ok(Some(alias));
        }

        if !Self::is_identifier_start(parser.current()) {
            return Ok(None);
        }

        let pivot = parser.position;
        let alias = Self::collect(parser)?;
        if QueryComparers::is_reserved(&alias) {
            parser.position = pivot;
            return Ok(None);
        }

        parser.next_non_whitespace();
        Ok(Some(alias))
    }
}
