//! T-SQL front end: tokens, batches and the syntax tree

pub mod ast;
mod lexer;
mod parser;

use sqlparser::tokenizer::Token;

use crate::dialect::SqlVersion;
use crate::error::SyntaxError;

pub use ast::Script;
pub use lexer::{tokenize, Lexeme};
pub use parser::{ParseResult, Parser};

/// Syntax tree plus every syntax error met on the way
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseOutput {
    pub script: Script,
    pub errors: Vec<SyntaxError>,
}

/// Parse a whole script. A tokenizer failure yields an empty script.
pub fn parse(sql: &str, version: SqlVersion) -> ParseOutput {
    let lexemes = match tokenize(sql, version) {
        Ok(lexemes) => lexemes,
        Err(error) => {
            return ParseOutput {
                script: Script::default(),
                errors: vec![error],
            }
        }
    };

    let mut output = ParseOutput::default();
    for batch in split_batches(&lexemes) {
        let Some(first) = batch.first() else {
            continue;
        };
        let (statements, errors) = Parser::new(batch, version).parse_batch();
        tracing::trace!(
            line = first.line,
            statements = statements.len(),
            errors = errors.len(),
            "parsed batch"
        );
        output.script.batches.push(ast::Batch {
            line: first.line,
            statements,
        });
        output.errors.extend(errors);
    }
    output
}

/// Split on `GO` lines. The separator may carry a repeat count (`GO 5`).
pub fn split_batches(lexemes: &[Lexeme]) -> Vec<&[Lexeme]> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < lexemes.len() {
        if let Some(width) = separator_width(lexemes, i) {
            batches.push(&lexemes[start..i]);
            i += width;
            start = i;
        } else {
            i += 1;
        }
    }
    batches.push(&lexemes[start..]);
    batches
}

fn separator_width(lexemes: &[Lexeme], i: usize) -> Option<usize> {
    let go = &lexemes[i];
    if !go.first_on_line || !go.is_keyword("GO") {
        return None;
    }
    let ends_line = |j: usize| lexemes.get(j).map_or(true, |next| next.line != go.line);

    if ends_line(i + 1) {
        return Some(1);
    }
    match &lexemes[i + 1].token {
        Token::Number(_, _) if ends_line(i + 2) => Some(2),
        _ => None,
    }
}
