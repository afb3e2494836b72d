//! Walks the syntax tree and collects diagnostics

use crate::error::Diagnostic;
use crate::syntax::ast::*;
use crate::types::{check_assignment, BaseType, Length, SqlType, IMPLICIT_CAST_LENGTH};

use super::symbols::SymbolTable;

/// Single-pass checker over one script
///
/// Owns the symbol table of the batch being visited. The two pieces of walk
/// context, the named EXEC parameter and the "SET NOCOUNT ON seen" flag of the
/// enclosing procedure, are passed down explicitly.
#[derive(Debug, Default)]
pub struct CheckVisitor {
    symbols: SymbolTable,
    diagnostics: Vec<Diagnostic>,
}

impl CheckVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn visit_script(&mut self, script: &Script) {
        for batch in &script.batches {
            self.visit_batch(batch);
        }
    }

    pub fn visit_batch(&mut self, batch: &Batch) {
        tracing::debug!(line = batch.line, statements = batch.statements.len(), "checking batch");
        self.symbols.clear();

        let mut nocount = false;
        for statement in &batch.statements {
            self.visit_statement(statement, &mut nocount);
        }

        let unused: Vec<Diagnostic> = self
            .symbols
            .unreferenced()
            .map(|symbol| Diagnostic::unused_variable(symbol.line, &symbol.name))
            .collect();
        self.diagnostics.extend(unused);
        self.symbols.clear();
    }

    fn visit_statements(&mut self, statements: &[Statement], nocount: &mut bool) {
        for statement in statements {
            self.visit_statement(statement, nocount);
        }
    }

    pub fn visit_statement(&mut self, statement: &Statement, nocount: &mut bool) {
        match statement {
            Statement::Declare(declarations) => {
                for declaration in declarations {
                    self.visit_declaration(declaration);
                }
            }
            Statement::SetVariable(set) => self.visit_set_variable(set),
            Statement::SetOption(option) => {
                if option.on && option.options.iter().any(|o| o == "NOCOUNT") {
                    *nocount = true;
                }
            }
            Statement::CreateProcedure(procedure) => self.visit_procedure(procedure),
            Statement::CreateFunction(function) => {
                for parameter in &function.parameters {
                    self.visit_parameter(parameter);
                }
                if let Some(returns) = &function.returns {
                    self.symbols.declare(&returns.name, SqlType::unknown(), returns.line);
                }
                let mut unused_flag = false;
                self.visit_statements(&function.body, &mut unused_flag);
            }
            Statement::Execute(execute) => self.visit_execute(execute),
            Statement::Block(statements) => self.visit_statements(statements, nocount),
            Statement::Conditional {
                condition,
                body,
                otherwise,
            } => {
                self.visit_expr(condition, None);
                self.visit_statement(body, nocount);
                if let Some(otherwise) = otherwise {
                    self.visit_statement(otherwise, nocount);
                }
            }
            Statement::Return(value) => {
                if let Some(value) = value {
                    self.visit_expr(value, None);
                }
            }
            Statement::Other(exprs) => {
                for expr in exprs {
                    self.visit_expr(expr, None);
                }
            }
        }
    }

    fn visit_declaration(&mut self, declaration: &Declaration) {
        match declaration {
            Declaration::Variable {
                name,
                data_type,
                value,
            } => {
                let declared = SqlType::from_declaration(data_type);
                if declared.is_implicit_length_string() {
                    self.diagnostics
                        .push(Diagnostic::implicit_length(name.line, &name.name));
                }
                self.symbols.declare(&name.name, declared.clone(), name.line);

                if let Some(value) = value {
                    self.visit_expr(value, None);
                    let source = self.resolve_type(value);
                    let result = check_assignment(data_type.line, &name.name, &declared, &source);
                    self.diagnostics.extend(result.diagnostics);
                }
            }
            Declaration::Table { name } => {
                self.symbols.declare(&name.name, SqlType::unknown(), name.line);
            }
        }
    }

    fn visit_parameter(&mut self, parameter: &Parameter) {
        let declared = SqlType::from_declaration(&parameter.data_type);
        if declared.is_implicit_length_string() {
            self.diagnostics.push(Diagnostic::implicit_length(
                parameter.name.line,
                &parameter.name.name,
            ));
        }
        self.symbols
            .declare(&parameter.name.name, declared, parameter.name.line);
        if let Some(default) = &parameter.default {
            self.visit_expr(default, None);
        }
    }

    fn visit_set_variable(&mut self, set: &SetVariable) {
        self.visit_variable(&set.target, None);
        self.visit_expr(&set.value, None);

        // Undeclared targets were already reported above
        let Some(target) = self.symbols.type_of(&set.target.name).cloned() else {
            return;
        };

        let value = self.resolve_type(&set.value);
        let source = match set.operator {
            None => value,
            Some(op) if op.is_arithmetic() => target.higher_precedence(&value),
            Some(_) => SqlType::unknown(),
        };

        let result = check_assignment(set.target.line, &set.target.name, &target, &source);
        self.diagnostics.extend(result.diagnostics);
    }

    fn visit_procedure(&mut self, procedure: &Procedure) {
        let name = procedure.base_name();
        tracing::debug!(line = procedure.line, procedure = name, "checking procedure");

        if name.to_lowercase().starts_with("sp_") {
            self.diagnostics
                .push(Diagnostic::procedure_with_sp_prefix(procedure.line, name));
        }

        for parameter in &procedure.parameters {
            self.visit_parameter(parameter);
        }

        let mut nocount = false;
        self.visit_statements(&procedure.body, &mut nocount);
        if !nocount {
            self.diagnostics
                .push(Diagnostic::procedure_without_nocount(procedure.line, name));
        }
    }

    fn visit_execute(&mut self, execute: &Execute) {
        if let Some(status) = &execute.return_status {
            self.visit_variable(status, None);
        }
        self.visit_expr(&execute.procedure, None);

        for parameter in &execute.parameters {
            let Some(value) = &parameter.value else {
                continue;
            };
            // In `EXEC p @param = value`, @param names a parameter of p
            let parameter_name = parameter.name.as_ref().map(|n| n.name.as_str());
            self.visit_expr(value, parameter_name);
        }
    }

    fn visit_variable(&mut self, variable: &VariableName, execute_parameter: Option<&str>) {
        if variable.is_global() {
            return;
        }
        if execute_parameter.is_some_and(|p| p.eq_ignore_ascii_case(&variable.name)) {
            return;
        }
        if !self.symbols.try_reference(&variable.name) {
            self.diagnostics
                .push(Diagnostic::undeclared_variable(variable.line, &variable.name));
        }
    }

    fn visit_expr(&mut self, expr: &Expr, execute_parameter: Option<&str>) {
        match expr {
            Expr::Variable(variable) => self.visit_variable(variable, execute_parameter),
            Expr::StringLiteral { .. }
            | Expr::NumberLiteral(_)
            | Expr::Null
            | Expr::Identifier(_) => {}
            Expr::Cast {
                kind,
                expr,
                data_type,
                style,
            } => {
                let target = SqlType::from_declaration(data_type);
                if target.is_implicit_length_string() {
                    self.diagnostics.push(Diagnostic::convert_without_length(
                        data_type.line,
                        kind.keyword(),
                        &data_type.name,
                    ));
                }
                self.visit_expr(expr, execute_parameter);
                if let Some(style) = style {
                    self.visit_expr(style, execute_parameter);
                }
            }
            Expr::Binary { left, right, .. } => {
                self.visit_expr(left, execute_parameter);
                self.visit_expr(right, execute_parameter);
            }
            Expr::Unary { expr, .. } | Expr::Nested(expr) => {
                self.visit_expr(expr, execute_parameter)
            }
            Expr::Function { args: exprs, .. } | Expr::Opaque(exprs) => {
                for expr in exprs {
                    self.visit_expr(expr, execute_parameter);
                }
            }
        }
    }

    /// Type of an expression, from literals, declared variables, casts and
    /// arithmetic. Everything else is unknown.
    pub fn resolve_type(&self, expr: &Expr) -> SqlType {
        match expr {
            Expr::StringLiteral { value, national } => {
                let base = if *national {
                    BaseType::NVarChar
                } else {
                    BaseType::VarChar
                };
                SqlType::known(base, Length::Explicit(value.chars().count() as u64))
            }
            Expr::Variable(variable) => self
                .symbols
                .type_of(&variable.name)
                .cloned()
                .unwrap_or_else(SqlType::unknown),
            Expr::Cast { data_type, .. } => {
                SqlType::from_declaration(data_type).with_default_length(IMPLICIT_CAST_LENGTH)
            }
            Expr::Binary { left, op, right } if op.is_arithmetic() => {
                let left = self.resolve_type(left);
                let right = self.resolve_type(right);
                left.higher_precedence(&right)
            }
            Expr::Nested(inner) => self.resolve_type(inner),
            _ => SqlType::unknown(),
        }
    }
}
