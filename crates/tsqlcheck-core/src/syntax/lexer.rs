//! Token stream with line numbers, built on the sqlparser tokenizer

use sqlparser::tokenizer::{Token, TokenWithSpan, Tokenizer};

use crate::dialect::SqlVersion;
use crate::error::SyntaxError;

/// A significant (non-whitespace) token
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    /// Line number (1-indexed)
    pub line: u64,
    /// No other significant token precedes this one on its line
    pub first_on_line: bool,
}

impl Lexeme {
    /// Unquoted word, e.g. a keyword or a plain identifier
    pub fn word(&self) -> Option<&str> {
        match &self.token {
            Token::Word(w) if w.quote_style.is_none() => Some(&w.value),
            _ => None,
        }
    }

    /// Word of any quoting style
    pub fn any_word(&self) -> Option<&str> {
        match &self.token {
            Token::Word(w) => Some(&w.value),
            _ => None,
        }
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.word().is_some_and(|w| w.eq_ignore_ascii_case(keyword))
    }

    /// `@local` or `@@global`
    pub fn variable(&self) -> Option<&str> {
        self.word().filter(|w| w.starts_with('@') && w.len() > 1)
    }
}

/// Tokenize `sql`, dropping whitespace and comments
pub fn tokenize(sql: &str, version: SqlVersion) -> Result<Vec<Lexeme>, SyntaxError> {
    let dialect = version.tokenizer_dialect();
    let tokens = Tokenizer::new(&dialect, sql)
        .tokenize_with_location()
        .map_err(|e| SyntaxError::Tokenize {
            line: e.location.line,
            message: e.message,
        })?;

    let mut lexemes = Vec::with_capacity(tokens.len());
    // Line on which the previous significant token ended
    let mut last_line = None;
    for TokenWithSpan { token, span } in tokens {
        if matches!(token, Token::EOF | Token::Whitespace(_)) {
            continue;
        }
        // Multi-line literals are reported at their first line
        let line = span.start.line;
        lexemes.push(Lexeme {
            token,
            line,
            first_on_line: last_line != Some(line),
        });
        last_line = Some(span.end.line);
    }

    Ok(lexemes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(sql: &str) -> Vec<(String, u64)> {
        tokenize(sql, SqlVersion::default())
            .unwrap()
            .into_iter()
            .map(|l| (l.token.to_string(), l.line))
            .collect()
    }

    #[test]
    fn test_variables_are_words() {
        let lexemes = tokenize("set @a = @@rowcount", SqlVersion::default()).unwrap();
        assert_eq!(lexemes[1].variable(), Some("@a"));
        assert_eq!(lexemes[3].variable(), Some("@@rowcount"));
        assert!(lexemes[0].is_keyword("SET"));
    }

    #[test]
    fn test_line_numbers() {
        assert_eq!(
            lines("select 1\n-- comment\n/* a\nb */ select\n'x\ny' go"),
            vec![
                ("select".to_string(), 1),
                ("1".to_string(), 1),
                ("select".to_string(), 4),
                ("'x\ny'".to_string(), 5),
                ("go".to_string(), 6),
            ]
        );
    }

    #[test]
    fn test_first_on_line() {
        let lexemes = tokenize("select 1\n  go\n/* c */ go", SqlVersion::default()).unwrap();
        let flags: Vec<bool> = lexemes.iter().map(|l| l.first_on_line).collect();
        assert_eq!(flags, vec![true, false, true, true]);
    }

    #[test]
    fn test_token_after_multiline_literal() {
        let lexemes = tokenize("print 'a\nb' go
select", SqlVersion::default()).unwrap();
        let found: Vec<(u64, bool)> = lexemes.iter().map(|l| (l.line, l.first_on_line)).collect();
        assert_eq!(found, vec![(1, true), (1, false), (2, false), (3, true)]);
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let err = tokenize("select 'abc", SqlVersion::default()).unwrap_err();
        assert!(matches!(err, SyntaxError::Tokenize { .. }));
    }
}
