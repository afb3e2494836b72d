//! Statement and expression parser
//!
//! Statements the analyzer cares about (declarations, assignments, procedure
//! definitions, EXEC calls, control flow) are parsed properly. Everything else is
//! scanned up to the next statement keyword and kept as the variables and casts
//! it contains.
//!
//! Expressions are parsed in Pratt's top-down operator precedence style.

use sqlparser::tokenizer::Token;

use super::ast::*;
use super::lexer::Lexeme;
use crate::dialect::SqlVersion;
use crate::error::SyntaxError;

pub type ParseResult<T> = Result<T, SyntaxError>;

/// Keywords that start a statement; outside parentheses they end the previous one
const STATEMENT_KEYWORDS: &[&str] = &[
    "ALTER", "BEGIN", "BREAK", "CLOSE", "COMMIT", "CONTINUE", "CREATE", "DEALLOCATE", "DECLARE",
    "DELETE", "DENY", "DROP", "ELSE", "END", "EXEC", "EXECUTE", "FETCH", "GOTO", "GRANT", "IF",
    "INSERT", "MERGE", "OPEN", "PRINT", "RAISERROR", "RETURN", "REVOKE", "ROLLBACK", "SAVE",
    "SELECT", "SET", "THROW", "TRUNCATE", "UPDATE", "USE", "WAITFOR", "WHILE",
];

const CAST_KEYWORDS: &[(&str, CastKind)] = &[
    ("CAST", CastKind::Cast),
    ("CONVERT", CastKind::Convert),
    ("TRY_CAST", CastKind::TryCast),
    ("TRY_CONVERT", CastKind::TryConvert),
];

/// Deepest nesting of statements and expressions accepted in one batch
const MAX_DEPTH: usize = 128;

/// Parser over the lexemes of one batch
pub struct Parser<'a> {
    tokens: &'a [Lexeme],
    index: usize,
    version: SqlVersion,
    errors: Vec<SyntaxError>,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Lexeme], version: SqlVersion) -> Self {
        Self {
            tokens,
            index: 0,
            version,
            errors: Vec::new(),
            depth: 0,
        }
    }

    /// Parse every statement of the batch, recovering after each syntax error
    pub fn parse_batch(mut self) -> (Vec<Statement>, Vec<SyntaxError>) {
        let statements = self.parse_statement_list(|_| false);
        (statements, self.errors)
    }

    // ---------------------------------------------------------------------
    // Token helpers
    // ---------------------------------------------------------------------

    fn peek(&self) -> Option<&'a Lexeme> {
        self.tokens.get(self.index)
    }

    fn peek_nth(&self, n: usize) -> Option<&'a Lexeme> {
        self.tokens.get(self.index + n)
    }

    fn next(&mut self) -> Option<&'a Lexeme> {
        let lexeme = self.tokens.get(self.index);
        if lexeme.is_some() {
            self.index += 1;
        }
        lexeme
    }

    fn at_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn line(&self) -> u64 {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|l| l.line)
            .unwrap_or(1)
    }

    fn peek_token(&self) -> Option<&'a Token> {
        self.peek().map(|l| &l.token)
    }

    fn peek_is(&self, token: &Token) -> bool {
        self.peek_token() == Some(token)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|l| l.is_keyword(keyword))
    }

    fn peek_nth_keyword(&self, n: usize, keyword: &str) -> bool {
        self.peek_nth(n).is_some_and(|l| l.is_keyword(keyword))
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek_is(token) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> ParseResult<()> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(self.expected(&format!("'{}'", token)))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> ParseResult<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.expected(keyword))
        }
    }

    fn expected(&self, expected: &str) -> SyntaxError {
        SyntaxError::Expected {
            line: self.line(),
            expected: expected.to_string(),
            found: self
                .peek()
                .map(|l| l.token.to_string())
                .unwrap_or_else(|| "end of batch".to_string()),
        }
    }

    fn unexpected(&self) -> SyntaxError {
        match self.peek() {
            Some(lexeme) => SyntaxError::Unexpected {
                line: lexeme.line,
                near: lexeme.token.to_string(),
            },
            None => self.expected("an expression"),
        }
    }

    fn require(&self, supported: bool, feature: &str, required: SqlVersion) -> ParseResult<()> {
        if supported {
            Ok(())
        } else {
            Err(SyntaxError::Unsupported {
                line: self.line(),
                feature: feature.to_string(),
                required,
                target: self.version,
            })
        }
    }

    /// Run `parse` one nesting level deeper, failing once `MAX_DEPTH` is reached
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_DEPTH {
            return Err(SyntaxError::TooDeeplyNested { line: self.line() });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn at_statement_keyword(&self) -> bool {
        self.peek().is_some_and(is_statement_keyword)
    }

    /// End of the current statement: end of batch, `;` or the next statement keyword
    fn at_statement_end(&self) -> bool {
        self.at_end() || self.peek_is(&Token::SemiColon) || self.at_statement_keyword()
    }

    fn peek_variable(&self) -> Option<VariableName> {
        self.peek()
            .and_then(|l| l.variable().map(|v| VariableName::new(v, l.line)))
    }

    fn parse_variable(&mut self) -> ParseResult<VariableName> {
        let variable = self
            .peek_variable()
            .ok_or_else(|| self.expected("a variable"))?;
        self.index += 1;
        Ok(variable)
    }

    /// Possibly qualified name such as `[dbo].[Orders]`
    fn parse_object_name(&mut self) -> ParseResult<Vec<String>> {
        let mut parts = Vec::new();
        loop {
            let part = self
                .peek()
                .and_then(name_part)
                .ok_or_else(|| self.expected("a name"))?;
            parts.push(part.to_string());
            self.index += 1;

            let continues = self.peek_is(&Token::Period)
                && self.peek_nth(1).and_then(name_part).is_some();
            if !continues {
                return Ok(parts);
            }
            self.index += 1;
        }
    }

    // ---------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------

    /// Parse statements until `stop` holds or the batch ends
    fn parse_statement_list(&mut self, stop: impl Fn(&Self) -> bool) -> Vec<Statement> {
        let mut statements = Vec::new();
        while !self.at_end() && !stop(self) {
            if self.eat(&Token::SemiColon) {
                continue;
            }
            let start = self.index;
            match self.parse_statement() {
                Ok(statement) => statements.push(statement),
                Err(error) => {
                    tracing::debug!(line = error.line(), "{}", error);
                    self.errors.push(error);
                    self.recover(start);
                }
            }
        }
        statements
    }

    /// Skip to the start of the next statement
    fn recover(&mut self, start: usize) {
        self.index = self.index.max(start + 1);
        let mut depth = 0usize;
        while let Some(lexeme) = self.peek() {
            match lexeme.token {
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                Token::SemiColon if depth == 0 => return,
                _ if depth == 0 && is_statement_keyword(lexeme) => return,
                _ => {}
            }
            self.index += 1;
        }
    }

    pub fn parse_statement(&mut self) -> ParseResult<Statement> {
        self.nested(Self::parse_statement_kind)
    }

    fn parse_statement_kind(&mut self) -> ParseResult<Statement> {
        let Some(keyword) = self.peek().and_then(|l| l.word()) else {
            return Ok(Statement::Other(self.parse_fragment()));
        };

        match keyword.to_uppercase().as_str() {
            "DECLARE" => self.parse_declare(),
            "SET" => self.parse_set(),
            "EXEC" | "EXECUTE" => self.parse_execute(),
            "CREATE" | "ALTER" => self.parse_create(),
            "BEGIN" => self.parse_begin(),
            "IF" => self.parse_if(),
            "WHILE" => self.parse_while(),
            "RETURN" => self.parse_return(),
            "SELECT" => self.parse_select(),
            "ELSE" | "END" => Err(self.unexpected()),
            _ => Ok(Statement::Other(self.parse_fragment())),
        }
    }

    /// SELECT is kept as a fragment once its column list is seen to start
    /// with something that can begin an expression
    fn parse_select(&mut self) -> ParseResult<Statement> {
        let starts_list = self.peek_nth(1).is_some_and(|l| {
            matches!(
                l.token,
                Token::Word(_)
                    | Token::Number(_, _)
                    | Token::SingleQuotedString(_)
                    | Token::NationalStringLiteral(_)
                    | Token::HexStringLiteral(_)
                    | Token::LParen
                    | Token::Mul
                    | Token::Minus
                    | Token::Plus
                    | Token::Tilde
            )
        });
        if !starts_list {
            self.index += 1;
            return Err(self.unexpected());
        }
        Ok(Statement::Other(self.parse_fragment()))
    }

    fn parse_declare(&mut self) -> ParseResult<Statement> {
        if self.peek_nth(1).and_then(|l| l.variable()).is_none() {
            // DECLARE cursor_name CURSOR FOR ...
            return Ok(Statement::Other(self.parse_fragment()));
        }
        self.expect_keyword("DECLARE")?;

        let mut declarations = Vec::new();
        loop {
            declarations.push(self.parse_declaration()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(Statement::Declare(declarations))
    }

    fn parse_declaration(&mut self) -> ParseResult<Declaration> {
        let name = self.parse_variable()?;
        self.eat_keyword("AS");

        if self.eat_keyword("TABLE") {
            self.expect(Token::LParen)?;
            self.parse_parenthesized_fragment();
            return Ok(Declaration::Table { name });
        }
        if self.eat_keyword("CURSOR") {
            return Ok(Declaration::Table { name });
        }

        let data_type = self.parse_data_type()?;
        let value = if self.peek_is(&Token::Eq) {
            self.require(
                self.version.supports_declare_initializer(),
                "DECLARE with an initial value",
                SqlVersion::Sql2008,
            )?;
            self.index += 1;
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(Declaration::Variable {
            name,
            data_type,
            value,
        })
    }

    /// `type[(n[, m] | max)]`, possibly schema-qualified
    fn parse_data_type(&mut self) -> ParseResult<DataTypeRef> {
        let line = self.line();
        let mut parts = self
            .parse_object_name()
            .map_err(|_| self.expected("a data type"))?;
        let mut name = parts.pop().unwrap_or_default();

        if name.eq_ignore_ascii_case("double") && self.eat_keyword("PRECISION") {
            name = "double precision".to_string();
        }
        if (name.eq_ignore_ascii_case("char") || name.eq_ignore_ascii_case("character"))
            && self.eat_keyword("VARYING")
        {
            name = "varchar".to_string();
        }

        let mut params = Vec::new();
        if self.eat(&Token::LParen) {
            loop {
                let param = match self.peek_token() {
                    Some(Token::Number(n, _)) => n
                        .parse::<u64>()
                        .map(TypeParam::Integer)
                        .map_err(|_| self.expected("a length"))?,
                    Some(Token::Word(w)) if w.value.eq_ignore_ascii_case("max") => TypeParam::Max,
                    _ => return Err(self.expected("a length")),
                };
                self.index += 1;
                params.push(param);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RParen)?;
        }

        Ok(DataTypeRef { name, params, line })
    }

    fn parse_set(&mut self) -> ParseResult<Statement> {
        let Some(target) = self.peek_nth(1).and_then(|l| {
            l.variable()
                .map(|v| VariableName::new(v, l.line))
        }) else {
            return self.parse_set_option();
        };
        self.index += 2;

        let operator = match self.peek_token() {
            Some(Token::Eq) => None,
            Some(token) => match compound_operator(token) {
                Some(op) if self.peek_nth(1).map(|l| &l.token) == Some(&Token::Eq) => {
                    self.require(
                        self.version.supports_compound_assignment(),
                        "Compound assignment",
                        SqlVersion::Sql2008,
                    )?;
                    self.index += 1;
                    Some(op)
                }
                _ => return Err(self.expected("'='")),
            },
            None => return Err(self.expected("'='")),
        };
        self.expect(Token::Eq)?;

        let value = if self.peek_keyword("CURSOR") {
            Expr::Opaque(self.parse_fragment())
        } else {
            self.parse_expr()?
        };

        Ok(Statement::SetVariable(SetVariable {
            target,
            operator,
            value,
        }))
    }

    /// `SET NOCOUNT ON`, `SET ANSI_NULLS, QUOTED_IDENTIFIER OFF`; anything else
    /// (`SET ROWCOUNT @n`, `SET TRANSACTION ISOLATION LEVEL ...`) is kept as a fragment
    fn parse_set_option(&mut self) -> ParseResult<Statement> {
        let start = self.index;
        let line = self.line();
        self.expect_keyword("SET")?;

        let mut options = Vec::new();
        loop {
            match self.peek().and_then(|l| l.word()) {
                Some(word) if !is_on_off(word) => {
                    options.push(word.to_uppercase());
                    self.index += 1;
                }
                _ => break,
            }
            if !self.eat(&Token::Comma) {
                break;
            }
        }

        let on = if self.eat_keyword("ON") {
            Some(true)
        } else if self.eat_keyword("OFF") {
            Some(false)
        } else {
            None
        };

        match on {
            Some(on) if !options.is_empty() => Ok(Statement::SetOption(SetOption {
                line,
                options,
                on,
            })),
            _ => {
                self.index = start;
                Ok(Statement::Other(self.parse_fragment()))
            }
        }
    }

    fn parse_execute(&mut self) -> ParseResult<Statement> {
        let line = self.line();
        self.index += 1;

        // EXEC ('dynamic ' + @sql)
        if self.eat(&Token::LParen) {
            let mut exprs = self.parse_parenthesized_fragment();
            exprs.extend(self.parse_fragment_tail());
            return Ok(Statement::Other(exprs));
        }

        let return_status = match (self.peek_variable(), self.peek_nth(1)) {
            (Some(status), Some(next)) if next.token == Token::Eq => {
                self.index += 2;
                Some(status)
            }
            _ => None,
        };

        let procedure = match self.peek_variable() {
            Some(variable) => {
                self.index += 1;
                Expr::Variable(variable)
            }
            None => Expr::Identifier(self.parse_object_name()?),
        };
        // procedure;number
        if self.peek_is(&Token::SemiColon)
            && matches!(self.peek_nth(1).map(|l| &l.token), Some(Token::Number(..)))
        {
            self.index += 2;
        }

        let mut parameters = Vec::new();
        if !self.at_statement_end() && !self.peek_keyword("WITH") {
            loop {
                parameters.push(self.parse_execute_parameter()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        if self.peek_keyword("WITH") {
            self.parse_fragment();
        }

        Ok(Statement::Execute(Execute {
            line,
            return_status,
            procedure,
            parameters,
        }))
    }

    fn parse_execute_parameter(&mut self) -> ParseResult<ExecuteParameter> {
        let name = match (self.peek_variable(), self.peek_nth(1)) {
            (Some(name), Some(next)) if next.token == Token::Eq => {
                self.index += 2;
                Some(name)
            }
            _ => None,
        };

        let value = if self.eat_keyword("DEFAULT") {
            None
        } else {
            Some(self.parse_expr()?)
        };
        let output = self.eat_keyword("OUTPUT") || self.eat_keyword("OUT");

        Ok(ExecuteParameter {
            name,
            value,
            output,
        })
    }

    fn parse_create(&mut self) -> ParseResult<Statement> {
        let line = self.line();
        let is_alter = self.peek_keyword("ALTER");
        let mut offset = 1;
        let or_alter = !is_alter
            && self.peek_nth_keyword(1, "OR")
            && self.peek_nth_keyword(2, "ALTER");
        if or_alter {
            offset = 3;
        }

        let is_procedure = self.peek_nth_keyword(offset, "PROC") || self.peek_nth_keyword(offset, "PROCEDURE");
        let is_function = self.peek_nth_keyword(offset, "FUNCTION");
        if !is_procedure && !is_function {
            return Ok(Statement::Other(self.parse_fragment()));
        }

        if or_alter {
            self.require(
                self.version.supports_create_or_alter(),
                "CREATE OR ALTER",
                SqlVersion::Sql2016,
            )?;
        }
        self.index += offset + 1;

        if is_function {
            return self.parse_function(line);
        }
        self.parse_procedure(line)
    }

    /// Procedure after `CREATE PROCEDURE`; `line` is that of CREATE or ALTER
    fn parse_procedure(&mut self, line: u64) -> ParseResult<Statement> {
        let name = self.parse_object_name()?;
        if self.peek_is(&Token::SemiColon)
            && matches!(self.peek_nth(1).map(|l| &l.token), Some(Token::Number(..)))
        {
            self.index += 2;
        }

        let parenthesized = self.eat(&Token::LParen);
        let mut parameters = Vec::new();
        if self.peek_variable().is_some() {
            loop {
                parameters.push(self.parse_parameter()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        if parenthesized {
            self.expect(Token::RParen)?;
        }

        if self.eat_keyword("WITH") {
            self.skip_routine_options()?;
        }
        if self.eat_keyword("FOR") {
            self.expect_keyword("REPLICATION")?;
        }
        self.expect_keyword("AS")?;

        let body = self.parse_statement_list(|_| false);

        Ok(Statement::CreateProcedure(Procedure {
            name,
            line,
            parameters,
            body,
        }))
    }

    /// `CREATE FUNCTION name (@p type, ...) RETURNS ... AS body`
    fn parse_function(&mut self, line: u64) -> ParseResult<Statement> {
        let name = self.parse_object_name()?;

        self.expect(Token::LParen)?;
        let mut parameters = Vec::new();
        if self.peek_variable().is_some() {
            loop {
                parameters.push(self.parse_parameter()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RParen)?;

        self.expect_keyword("RETURNS")?;
        let returns = match self.peek_variable() {
            Some(variable) => {
                self.index += 1;
                self.expect_keyword("TABLE")?;
                self.expect(Token::LParen)?;
                self.parse_parenthesized_fragment();
                Some(variable)
            }
            None if self.eat_keyword("TABLE") => None,
            None => {
                self.parse_data_type()?;
                None
            }
        };

        if self.eat_keyword("WITH") {
            self.skip_routine_options()?;
        }
        self.eat_keyword("AS");

        let body = self.parse_statement_list(|_| false);

        Ok(Statement::CreateFunction(Function {
            name,
            line,
            parameters,
            returns,
            body,
        }))
    }

    /// `RECOMPILE, ENCRYPTION, EXECUTE AS OWNER, ...`
    fn skip_routine_options(&mut self) -> ParseResult<()> {
        loop {
            if self.eat_keyword("EXECUTE") || self.eat_keyword("EXEC") {
                self.expect_keyword("AS")?;
                self.next().ok_or_else(|| self.expected("a principal"))?;
            } else if self.peek().and_then(|l| l.word()).is_some() {
                self.index += 1;
            } else {
                return Err(self.expected("a procedure option"));
            }
            if !self.eat(&Token::Comma) {
                return Ok(());
            }
        }
    }

    fn parse_parameter(&mut self) -> ParseResult<Parameter> {
        let name = self.parse_variable()?;
        self.eat_keyword("AS");
        let data_type = self.parse_data_type()?;
        self.eat_keyword("VARYING");

        let default = if self.eat(&Token::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let mut output = false;
        loop {
            if self.eat_keyword("OUT") || self.eat_keyword("OUTPUT") {
                output = true;
            } else if !self.eat_keyword("READONLY") {
                break;
            }
        }

        Ok(Parameter {
            name,
            data_type,
            default,
            output,
        })
    }

    fn parse_begin(&mut self) -> ParseResult<Statement> {
        const NOT_BLOCKS: [&str; 5] = ["TRAN", "TRANSACTION", "DISTRIBUTED", "DIALOG", "CONVERSATION"];
        if NOT_BLOCKS.iter().any(|kw| self.peek_nth_keyword(1, kw)) {
            return Ok(Statement::Other(self.parse_fragment()));
        }

        self.expect_keyword("BEGIN")?;
        let label = ["TRY", "CATCH"].into_iter().find(|kw| self.eat_keyword(kw));

        let body = self.parse_statement_list(|p| p.peek_keyword("END"));
        self.expect_keyword("END")?;
        if let Some(label) = label {
            self.expect_keyword(label)?;
        }

        Ok(Statement::Block(body))
    }

    fn parse_if(&mut self) -> ParseResult<Statement> {
        self.expect_keyword("IF")?;
        let condition = self.parse_expr()?;
        let body = Box::new(self.parse_body()?);

        // IF ... SELECT 1; ELSE ...
        let mut lookahead = 0;
        while self.peek_nth(lookahead).is_some_and(|l| l.token == Token::SemiColon) {
            lookahead += 1;
        }
        let otherwise = if self.peek_nth_keyword(lookahead, "ELSE") {
            self.index += lookahead + 1;
            Some(Box::new(self.parse_body()?))
        } else {
            None
        };

        Ok(Statement::Conditional {
            condition,
            body,
            otherwise,
        })
    }

    fn parse_while(&mut self) -> ParseResult<Statement> {
        self.expect_keyword("WHILE")?;
        let condition = self.parse_expr()?;
        let body = Box::new(self.parse_body()?);
        Ok(Statement::Conditional {
            condition,
            body,
            otherwise: None,
        })
    }

    /// Single statement controlled by IF, ELSE or WHILE
    fn parse_body(&mut self) -> ParseResult<Statement> {
        while self.eat(&Token::SemiColon) {}
        if self.at_end() {
            return Err(self.expected("a statement"));
        }
        self.parse_statement()
    }

    fn parse_return(&mut self) -> ParseResult<Statement> {
        self.expect_keyword("RETURN")?;
        if self.at_statement_end() {
            return Ok(Statement::Return(None));
        }
        Ok(Statement::Return(Some(self.parse_expr()?)))
    }

    // ---------------------------------------------------------------------
    // Fragments
    // ---------------------------------------------------------------------

    /// Scan an unmodeled statement up to the next statement keyword outside
    /// parentheses, keeping the variables and casts it contains
    fn parse_fragment(&mut self) -> Vec<Expr> {
        let in_update = self.peek_keyword("UPDATE");
        let mut exprs = Vec::new();
        if let Some(first) = self.peek() {
            if let Some(variable) = first.variable() {
                exprs.push(Expr::Variable(VariableName::new(variable, first.line)));
            }
            self.index += 1;
        }
        self.scan_fragment(&mut exprs, in_update);
        exprs
    }

    /// Continue a fragment whose first token was already consumed
    fn parse_fragment_tail(&mut self) -> Vec<Expr> {
        let mut exprs = Vec::new();
        self.scan_fragment(&mut exprs, false);
        exprs
    }

    fn scan_fragment(&mut self, exprs: &mut Vec<Expr>, in_update: bool) {
        let mut depth = 0usize;
        let mut case_depth = 0usize;
        let mut set_seen = false;

        while let Some(lexeme) = self.peek() {
            if depth == 0 {
                if lexeme.token == Token::SemiColon {
                    break;
                }
                if is_statement_keyword(lexeme) {
                    let closes_case = (lexeme.is_keyword("END") || lexeme.is_keyword("ELSE"))
                        && case_depth > 0;
                    let update_set = lexeme.is_keyword("SET") && in_update && !set_seen;
                    let continues = closes_case || update_set;
                    if !continues {
                        break;
                    }
                    set_seen |= lexeme.is_keyword("SET");
                }
            }

            match &lexeme.token {
                Token::LParen => depth += 1,
                Token::RParen => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                _ if lexeme.is_keyword("CASE") => case_depth += 1,
                _ if lexeme.is_keyword("END") && case_depth > 0 => case_depth -= 1,
                _ => {
                    if self.scan_expression_item(exprs) {
                        continue;
                    }
                }
            }
            self.index += 1;
        }
    }

    /// Contents of a parenthesized fragment, the opening parenthesis already
    /// consumed; consumes the matching close
    fn parse_parenthesized_fragment(&mut self) -> Vec<Expr> {
        let mut exprs = Vec::new();
        let mut depth = 0usize;
        while let Some(lexeme) = self.peek() {
            match lexeme.token {
                Token::LParen => depth += 1,
                Token::RParen => {
                    if depth == 0 {
                        self.index += 1;
                        break;
                    }
                    depth -= 1;
                }
                _ => {
                    if self.scan_expression_item(&mut exprs) {
                        continue;
                    }
                }
            }
            self.index += 1;
        }
        exprs
    }

    /// Collect a variable or a cast at the current position. Returns true if
    /// tokens were consumed.
    fn scan_expression_item(&mut self, exprs: &mut Vec<Expr>) -> bool {
        let Some(lexeme) = self.peek() else {
            return false;
        };

        if let Some(variable) = lexeme.variable() {
            exprs.push(Expr::Variable(VariableName::new(variable, lexeme.line)));
            self.index += 1;
            return true;
        }

        let followed_by_paren = self.peek_nth(1).is_some_and(|l| l.token == Token::LParen);
        if lexeme.is_keyword("IIF") && followed_by_paren {
            // Record the error and keep scanning the statement
            if let Err(error) = self.require(
                self.version.supports_2012_functions(),
                "IIF",
                SqlVersion::Sql2012,
            ) {
                self.errors.push(error);
            }
            return false;
        }

        if cast_kind(lexeme).is_some() && followed_by_paren {
            let start = self.index;
            match self.parse_cast() {
                Ok(cast) => {
                    exprs.push(cast);
                    return true;
                }
                Err(error @ SyntaxError::Unsupported { .. }) => {
                    self.errors.push(error);
                    self.index = start;
                }
                Err(error) => {
                    tracing::trace!(line = error.line(), "not a cast: {}", error);
                    self.index = start;
                }
            }
        }

        false
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    /// Parse an expression, starting with the next token.
    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_expr_with_min_bp(0)
    }

    /// Parse an expression, stopping at an operator that binds less tightly
    /// than `min_bp`.
    fn parse_expr_with_min_bp(&mut self, min_bp: u8) -> ParseResult<Expr> {
        self.nested(|parser| parser.parse_infix_chain(min_bp))
    }

    fn parse_infix_chain(&mut self, min_bp: u8) -> ParseResult<Expr> {
        let mut lhs = self.parse_expr_head()?;

        loop {
            if self.eat_keyword("COLLATE") {
                self.next().ok_or_else(|| self.expected("a collation"))?;
                continue;
            }

            let Some((op, width)) = self.peek_infix() else {
                break;
            };
            let (lbp, rbp) = infix_binding_power(op);
            if lbp < min_bp {
                break;
            }
            self.index += width;

            let rhs = match op {
                BinaryOperator::Is => {
                    self.eat_keyword("NOT");
                    self.expect_keyword("NULL")?;
                    Expr::Null
                }
                BinaryOperator::In => {
                    self.expect(Token::LParen)?;
                    Expr::Opaque(self.parse_list_or_subquery()?)
                }
                BinaryOperator::Between => {
                    let low = self.parse_expr_with_min_bp(rbp)?;
                    self.expect_keyword("AND")?;
                    let high = self.parse_expr_with_min_bp(rbp)?;
                    Expr::Opaque(vec![low, high])
                }
                BinaryOperator::Like => {
                    let pattern = self.parse_expr_with_min_bp(rbp)?;
                    if self.eat_keyword("ESCAPE") {
                        Expr::Opaque(vec![pattern, self.parse_expr_with_min_bp(rbp)?])
                    } else {
                        pattern
                    }
                }
                _ => self.parse_expr_with_min_bp(rbp)?,
            };

            lhs = Expr::Binary {
                left: Box::new(lhs),
                op,
                right: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    /// Infix operator at the current position and the number of tokens it spans
    fn peek_infix(&self) -> Option<(BinaryOperator, usize)> {
        let lexeme = self.peek()?;
        let op = match &lexeme.token {
            Token::Plus => BinaryOperator::Plus,
            Token::Minus => BinaryOperator::Minus,
            Token::Mul => BinaryOperator::Multiply,
            Token::Div => BinaryOperator::Divide,
            Token::Mod => BinaryOperator::Modulo,
            Token::Ampersand => BinaryOperator::BitwiseAnd,
            Token::Pipe => BinaryOperator::BitwiseOr,
            Token::Caret => BinaryOperator::BitwiseXor,
            Token::Eq => BinaryOperator::Eq,
            Token::Neq => BinaryOperator::NotEq,
            Token::Lt => BinaryOperator::Lt,
            Token::LtEq => BinaryOperator::LtEq,
            Token::Gt => BinaryOperator::Gt,
            Token::GtEq => BinaryOperator::GtEq,
            Token::Word(_) => {
                let word = lexeme.word()?.to_uppercase();
                if word == "NOT" {
                    let next = self.peek_nth(1)?.word()?.to_uppercase();
                    return keyword_operator(&next).map(|op| (op, 2));
                }
                return keyword_operator(&word).map(|op| (op, 1));
            }
            _ => return None,
        };
        Some((op, 1))
    }

    fn parse_expr_head(&mut self) -> ParseResult<Expr> {
        let Some(lexeme) = self.peek() else {
            return Err(self.expected("an expression"));
        };
        let line = lexeme.line;

        match &lexeme.token {
            Token::Number(n, _) => {
                self.index += 1;
                Ok(Expr::NumberLiteral(n.clone()))
            }
            Token::HexStringLiteral(n) => {
                self.index += 1;
                Ok(Expr::NumberLiteral(n.clone()))
            }
            Token::SingleQuotedString(s) => {
                self.index += 1;
                Ok(Expr::StringLiteral {
                    value: s.clone(),
                    national: false,
                })
            }
            Token::NationalStringLiteral(s) => {
                self.index += 1;
                Ok(Expr::StringLiteral {
                    value: s.clone(),
                    national: true,
                })
            }
            Token::Minus | Token::Plus | Token::Tilde => {
                let op = match lexeme.token {
                    Token::Minus => UnaryOperator::Minus,
                    Token::Plus => UnaryOperator::Plus,
                    _ => UnaryOperator::BitwiseNot,
                };
                self.index += 1;
                let expr = self.parse_expr_with_min_bp(prefix_binding_power(op))?;
                Ok(Expr::Unary {
                    op,
                    expr: Box::new(expr),
                })
            }
            Token::Mul => {
                self.index += 1;
                Ok(Expr::Identifier(vec!["*".to_string()]))
            }
            Token::LParen => {
                self.index += 1;
                if self.peek_keyword("SELECT") || self.peek_keyword("WITH") {
                    return Ok(Expr::Opaque(self.parse_parenthesized_fragment()));
                }
                let inner = self.parse_expr()?;
                if self.eat(&Token::Comma) {
                    let mut items = vec![inner];
                    items.extend(self.parse_list_or_subquery()?);
                    return Ok(Expr::Opaque(items));
                }
                self.expect(Token::RParen)?;
                Ok(Expr::Nested(Box::new(inner)))
            }
            Token::Word(_) => self.parse_word_expr(lexeme, line),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_word_expr(&mut self, lexeme: &'a Lexeme, line: u64) -> ParseResult<Expr> {
        if let Some(variable) = lexeme.variable() {
            self.index += 1;
            return Ok(Expr::Variable(VariableName::new(variable, line)));
        }

        let keyword = lexeme.word().map(str::to_uppercase).unwrap_or_default();
        let followed_by_paren = self.peek_nth(1).is_some_and(|l| l.token == Token::LParen);

        match keyword.as_str() {
            "NULL" => {
                self.index += 1;
                return Ok(Expr::Null);
            }
            "NOT" | "EXISTS" => {
                let op = if keyword == "NOT" {
                    UnaryOperator::Not
                } else {
                    UnaryOperator::Exists
                };
                self.index += 1;
                let expr = self.parse_expr_with_min_bp(prefix_binding_power(op))?;
                return Ok(Expr::Unary {
                    op,
                    expr: Box::new(expr),
                });
            }
            "CASE" => return self.parse_case(),
            "IIF" if followed_by_paren => {
                self.require(
                    self.version.supports_2012_functions(),
                    "IIF",
                    SqlVersion::Sql2012,
                )?;
            }
            _ if cast_kind(lexeme).is_some() && followed_by_paren => return self.parse_cast(),
            _ if is_statement_keyword(lexeme) => return Err(self.unexpected()),
            _ => {}
        }

        let name = self.parse_object_name()?;
        if self.peek_is(&Token::Period) && self.peek_nth(1).is_some_and(|l| l.token == Token::Mul) {
            self.index += 2;
        }
        if !self.eat(&Token::LParen) {
            return Ok(Expr::Identifier(name));
        }

        let args = self.parse_function_args();
        // ROW_NUMBER() OVER (...), STRING_AGG(...) WITHIN GROUP (...)
        let mut args = args;
        if self.eat_keyword("WITHIN") {
            self.expect_keyword("GROUP")?;
            self.expect(Token::LParen)?;
            args.extend(self.parse_parenthesized_fragment());
        }
        if self.eat_keyword("OVER") {
            self.expect(Token::LParen)?;
            args.extend(self.parse_parenthesized_fragment());
        }

        Ok(Expr::Function { name, args })
    }

    /// Arguments after the opening parenthesis. Argument lists that are not plain
    /// expressions (`COUNT(DISTINCT x)`, `DATEADD(day, ...)`) are scanned instead.
    fn parse_function_args(&mut self) -> Vec<Expr> {
        if self.eat(&Token::RParen) {
            return Vec::new();
        }

        let start = self.index;
        match self.parse_list_or_subquery() {
            Ok(args) => args,
            Err(error) => {
                tracing::trace!(line = error.line(), "scanning arguments: {}", error);
                self.index = start;
                self.parse_parenthesized_fragment()
            }
        }
    }

    /// Items of `IN (...)`, opening parenthesis already consumed
    fn parse_list_or_subquery(&mut self) -> ParseResult<Vec<Expr>> {
        if self.peek_keyword("SELECT") || self.peek_keyword("WITH") {
            return Ok(self.parse_parenthesized_fragment());
        }
        let mut items = Vec::new();
        loop {
            items.push(self.parse_expr()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(Token::RParen)?;
        Ok(items)
    }

    /// `CAST(expr AS type)`, `CONVERT(type, expr[, style])` and their TRY_ forms
    fn parse_cast(&mut self) -> ParseResult<Expr> {
        let kind = self
            .peek()
            .and_then(cast_kind)
            .ok_or_else(|| self.expected("CAST or CONVERT"))?;
        if matches!(kind, CastKind::TryCast | CastKind::TryConvert) {
            self.require(
                self.version.supports_2012_functions(),
                kind.keyword(),
                SqlVersion::Sql2012,
            )?;
        }
        self.index += 1;
        self.expect(Token::LParen)?;

        let (expr, data_type, style) = match kind {
            CastKind::Cast | CastKind::TryCast => {
                let expr = self.parse_expr()?;
                self.expect_keyword("AS")?;
                (expr, self.parse_data_type()?, None)
            }
            CastKind::Convert | CastKind::TryConvert => {
                let data_type = self.parse_data_type()?;
                self.expect(Token::Comma)?;
                let expr = self.parse_expr()?;
                let style = if self.eat(&Token::Comma) {
                    Some(Box::new(self.parse_expr()?))
                } else {
                    None
                };
                (expr, data_type, style)
            }
        };
        self.expect(Token::RParen)?;

        Ok(Expr::Cast {
            kind,
            expr: Box::new(expr),
            data_type,
            style,
        })
    }

    /// `CASE [input] WHEN .. THEN .. [ELSE ..] END`
    fn parse_case(&mut self) -> ParseResult<Expr> {
        self.expect_keyword("CASE")?;
        let mut parts = Vec::new();
        if !self.peek_keyword("WHEN") {
            parts.push(self.parse_expr()?);
        }
        while self.eat_keyword("WHEN") {
            parts.push(self.parse_expr()?);
            self.expect_keyword("THEN")?;
            parts.push(self.parse_expr()?);
        }
        if self.eat_keyword("ELSE") {
            parts.push(self.parse_expr()?);
        }
        self.expect_keyword("END")?;
        Ok(Expr::Opaque(parts))
    }
}

fn is_statement_keyword(lexeme: &Lexeme) -> bool {
    lexeme
        .word()
        .is_some_and(|w| STATEMENT_KEYWORDS.iter().any(|kw| kw.eq_ignore_ascii_case(w)))
}

/// Identifier part of a qualified name; variables are not names
fn name_part(lexeme: &Lexeme) -> Option<&str> {
    lexeme.any_word().filter(|_| lexeme.variable().is_none())
}

fn is_on_off(word: &str) -> bool {
    word.eq_ignore_ascii_case("ON") || word.eq_ignore_ascii_case("OFF")
}

fn cast_kind(lexeme: &Lexeme) -> Option<CastKind> {
    let word = lexeme.word()?;
    CAST_KEYWORDS
        .iter()
        .find(|(kw, _)| kw.eq_ignore_ascii_case(word))
        .map(|(_, kind)| *kind)
}

fn compound_operator(token: &Token) -> Option<BinaryOperator> {
    Some(match token {
        Token::Plus => BinaryOperator::Plus,
        Token::Minus => BinaryOperator::Minus,
        Token::Mul => BinaryOperator::Multiply,
        Token::Div => BinaryOperator::Divide,
        Token::Mod => BinaryOperator::Modulo,
        Token::Ampersand => BinaryOperator::BitwiseAnd,
        Token::Pipe => BinaryOperator::BitwiseOr,
        Token::Caret => BinaryOperator::BitwiseXor,
        _ => return None,
    })
}

fn keyword_operator(word: &str) -> Option<BinaryOperator> {
    Some(match word {
        "AND" => BinaryOperator::And,
        "OR" => BinaryOperator::Or,
        "LIKE" => BinaryOperator::Like,
        "IN" => BinaryOperator::In,
        "BETWEEN" => BinaryOperator::Between,
        "IS" => BinaryOperator::Is,
        _ => return None,
    })
}

fn infix_binding_power(op: BinaryOperator) -> (u8, u8) {
    use BinaryOperator::*;
    match op {
        Or => (1, 2),
        And => (3, 4),
        Eq | NotEq | Lt | LtEq | Gt | GtEq | Like | In | Between | Is => (7, 8),
        Plus | Minus | BitwiseAnd | BitwiseOr | BitwiseXor => (9, 10),
        Multiply | Divide | Modulo => (11, 12),
    }
}

fn prefix_binding_power(op: UnaryOperator) -> u8 {
    match op {
        UnaryOperator::Not => 5,
        UnaryOperator::Exists => 13,
        UnaryOperator::Plus | UnaryOperator::Minus | UnaryOperator::BitwiseNot => 13,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::tokenize;
    use pretty_assertions::assert_eq;

    fn parse(sql: &str) -> (Vec<Statement>, Vec<SyntaxError>) {
        parse_with(sql, SqlVersion::default())
    }

    fn parse_with(sql: &str, version: SqlVersion) -> (Vec<Statement>, Vec<SyntaxError>) {
        let tokens = tokenize(sql, version).unwrap();
        Parser::new(&tokens, version).parse_batch()
    }

    fn parse_one(sql: &str) -> Statement {
        let (mut statements, errors) = parse(sql);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        assert_eq!(statements.len(), 1, "{:?}", statements);
        statements.remove(0)
    }

    fn var(name: &str, line: u64) -> VariableName {
        VariableName::new(name, line)
    }

    #[test]
    fn test_declare_list() {
        let Statement::Declare(decls) = parse_one("declare @a as int, @b nvarchar(10) = N'x'") else {
            panic!("expected DECLARE");
        };
        assert_eq!(decls.len(), 2);
        assert_eq!(
            decls[1],
            Declaration::Variable {
                name: var("@b", 1),
                data_type: DataTypeRef {
                    name: "nvarchar".to_string(),
                    params: vec![TypeParam::Integer(10)],
                    line: 1,
                },
                value: Some(Expr::StringLiteral {
                    value: "x".to_string(),
                    national: true,
                }),
            }
        );
    }

    #[test]
    fn test_declare_table_variable() {
        let statement = parse_one("declare @t table (id int primary key, name varchar(20))");
        assert_eq!(
            statement,
            Statement::Declare(vec![Declaration::Table { name: var("@t", 1) }])
        );
    }

    #[test]
    fn test_set_variable_and_compound() {
        let (statements, errors) = parse("set @a = @b + 1\nset @a += 2");
        assert!(errors.is_empty());
        assert_eq!(statements.len(), 2);
        let Statement::SetVariable(set) = &statements[1] else {
            panic!("expected SET");
        };
        assert_eq!(set.target, var("@a", 2));
        assert_eq!(set.operator, Some(BinaryOperator::Plus));
    }

    #[test]
    fn test_set_options() {
        assert_eq!(
            parse_one("SET ANSI_NULLS, NOCOUNT ON"),
            Statement::SetOption(SetOption {
                line: 1,
                options: vec!["ANSI_NULLS".to_string(), "NOCOUNT".to_string()],
                on: true,
            })
        );
        assert_eq!(
            parse_one("set rowcount @n"),
            Statement::Other(vec![Expr::Variable(var("@n", 1))])
        );
    }

    #[test]
    fn test_procedure() {
        let sql = "create procedure dbo.usp_get (@id int, @name varchar(10) = null output)\nwith recompile\nas\nbegin\n set nocount on\n select @id\nend";
        let Statement::CreateProcedure(proc) = parse_one(sql) else {
            panic!("expected procedure");
        };
        assert_eq!(proc.name, vec!["dbo".to_string(), "usp_get".to_string()]);
        assert_eq!(proc.base_name(), "usp_get");
        assert_eq!(proc.parameters.len(), 2);
        assert!(proc.parameters[1].output);
        assert_eq!(proc.parameters[1].default, Some(Expr::Null));
        assert_eq!(proc.body.len(), 1);
    }

    #[test]
    fn test_execute_parameters() {
        let Statement::Execute(exec) = parse_one("exec @rc = dbo.p @a = 1, @out output, default") else {
            panic!("expected EXEC");
        };
        assert_eq!(exec.return_status, Some(var("@rc", 1)));
        assert_eq!(exec.parameters.len(), 3);
        assert_eq!(exec.parameters[0].name, Some(var("@a", 1)));
        assert!(exec.parameters[1].output);
        assert_eq!(exec.parameters[2].value, None);
    }

    #[test]
    fn test_casts_found_in_fragments() {
        let statement = parse_one("select cast(@x as varchar), name from t where id = @id");
        let Statement::Other(exprs) = statement else {
            panic!("expected fragment");
        };
        assert_eq!(exprs.len(), 2);
        assert!(matches!(
            &exprs[0],
            Expr::Cast { kind: CastKind::Cast, data_type, .. } if data_type.name == "varchar"
        ));
        assert_eq!(exprs[1], Expr::Variable(var("@id", 1)));
    }

    #[test]
    fn test_update_set_is_one_statement() {
        let (statements, _) = parse("update t set a = @a, b = @b where c = @c");
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_if_else_with_blocks() {
        let sql = "if @a is not null and @b in (1, 2)\nbegin\n set @c = 1;\nend\nelse set @c = 2";
        let Statement::Conditional { body, otherwise, .. } = parse_one(sql) else {
            panic!("expected IF");
        };
        assert!(matches!(*body, Statement::Block(ref s) if s.len() == 1));
        assert!(otherwise.is_some());
    }

    #[test]
    fn test_try_catch_block() {
        let (statements, errors) = parse("begin try select 1 end try begin catch select 2 end catch");
        assert!(errors.is_empty());
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_case_inside_select_does_not_end_statement() {
        let (statements, errors) =
            parse("select case when @a = 1 then 'x' else 'y' end from t\nset @b = 1");
        assert!(errors.is_empty());
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_recovers_after_error() {
        let (statements, errors) = parse("set @a = \nset @b = 1");
        assert_eq!(errors.len(), 1);
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_version_gates() {
        let (_, errors) = parse_with("declare @a int = 1", SqlVersion::Sql2005);
        assert!(matches!(
            errors.as_slice(),
            [SyntaxError::Unsupported { required: SqlVersion::Sql2008, .. }]
        ));

        let (statements, errors) = parse_with("select try_cast(@a as int)", SqlVersion::Sql2008);
        assert_eq!(errors.len(), 1);
        assert_eq!(statements.len(), 1, "the statement itself is kept");

        let (_, errors) = parse_with("select iif (1 > 0, 1, 2) from foo", SqlVersion::Sql2008);
        assert!(matches!(
            errors.as_slice(),
            [SyntaxError::Unsupported { required: SqlVersion::Sql2012, .. }]
        ));
        let (_, errors) = parse_with("select iif (1 > 0, 1, 2) from foo", SqlVersion::Sql2012);
        assert!(errors.is_empty());

        let (_, errors) = parse_with("set @a = try_cast(@b as int)", SqlVersion::Sql2008);
        assert_eq!(errors.len(), 1);

        let (_, errors) = parse_with("create or alter procedure p as select 1", SqlVersion::Sql2014);
        assert_eq!(errors.len(), 1);
        let (statements, errors) =
            parse_with("create or alter procedure p as select 1", SqlVersion::Sql2016);
        assert!(errors.is_empty());
        assert!(matches!(statements[0], Statement::CreateProcedure(_)));
    }

    #[test]
    fn test_select_needs_a_column_list() {
        let (statements, errors) = parse("select >>>");
        assert!(statements.is_empty());
        assert!(matches!(errors.as_slice(), [SyntaxError::Unexpected { line: 1, .. }]));

        let (_, errors) = parse("select\n");
        assert_eq!(errors.len(), 1);

        assert!(matches!(parse_one("select * from foo"), Statement::Other(_)));
        assert!(matches!(parse_one("select -1"), Statement::Other(_)));
    }

    #[test]
    fn test_operator_precedence() {
        let Statement::SetVariable(set) = parse_one("set @a = 1 + 2 * 3") else {
            panic!("expected SET");
        };
        let Expr::Binary { op, right, .. } = set.value else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOperator::Plus);
        assert!(matches!(*right, Expr::Binary { op: BinaryOperator::Multiply, .. }));
    }

    #[test]
    fn test_function() {
        let Statement::CreateFunction(function) =
            parse_one("create function dbo.f (@a int) returns int as begin return @a + 1 end")
        else {
            panic!("expected function");
        };
        assert_eq!(function.parameters.len(), 1);
        assert_eq!(function.body.len(), 1);
    }

    #[test]
    fn test_routine_line_is_create_line() {
        let Statement::CreateProcedure(procedure) = parse_one("create procedure\n  foo\nas return 1")
        else {
            panic!("expected procedure");
        };
        assert_eq!(procedure.line, 1);

        let Statement::CreateFunction(function) =
            parse_one("\nalter function\n dbo.f () returns int as begin return 1 end")
        else {
            panic!("expected function");
        };
        assert_eq!(function.line, 2);
    }

    #[test]
    fn test_deep_parentheses_are_an_error() {
        let sql = format!("declare @a int = {}1{}\nset @b = 1", "(".repeat(300), ")".repeat(300));
        let (statements, errors) = parse(&sql);
        assert!(matches!(errors.as_slice(), [SyntaxError::TooDeeplyNested { line: 1 }]));
        assert_eq!(statements.len(), 1, "parsing resumes after the nested statement");

        let sql = format!("declare @a int = {}1{}", "(".repeat(100), ")".repeat(100));
        assert!(parse(&sql).1.is_empty());
    }

    #[test]
    fn test_deep_blocks_are_an_error() {
        let sql = format!("{}set @a = 1{}", "begin ".repeat(300), " end".repeat(300));
        let (_, errors) = parse(&sql);
        assert!(!errors.is_empty());
        assert!(errors
            .iter()
            .any(|e| matches!(e, SyntaxError::TooDeeplyNested { .. })));
    }
}
