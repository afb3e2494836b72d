//! Syntax tree for the subset of T-SQL the analyzer understands
//!
//! Statements the parser does not model are kept as [`Statement::Other`] holding
//! the expressions found inside them, so variable references and casts in an
//! arbitrary `SELECT` or `UPDATE` are still checked.

/// A whole source file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    pub batches: Vec<Batch>,
}

/// Statements between two `GO` separators
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Line of the first token in the batch
    pub line: u64,
    pub statements: Vec<Statement>,
}

/// `@name` or `@@name`, as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableName {
    pub name: String,
    pub line: u64,
}

impl VariableName {
    pub fn new(name: impl Into<String>, line: u64) -> Self {
        Self {
            name: name.into(),
            line,
        }
    }

    /// System variables such as `@@ROWCOUNT`
    pub fn is_global(&self) -> bool {
        self.name.starts_with("@@")
    }
}

/// A type reference such as `nvarchar(max)` or `decimal(10, 2)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTypeRef {
    /// Last part of the name, without brackets
    pub name: String,
    pub params: Vec<TypeParam>,
    pub line: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeParam {
    Integer(u64),
    Max,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// `@name [AS] type [= value]`
    Variable {
        name: VariableName,
        data_type: DataTypeRef,
        value: Option<Expr>,
    },
    /// `@name [AS] TABLE (...)` or `@name CURSOR`
    Table { name: VariableName },
}

/// Procedure parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: VariableName,
    pub data_type: DataTypeRef,
    pub default: Option<Expr>,
    pub output: bool,
}

/// `CREATE PROCEDURE` / `ALTER PROCEDURE`
#[derive(Debug, Clone, PartialEq)]
pub struct Procedure {
    /// Name parts, e.g. `["dbo", "sp_foo"]`
    pub name: Vec<String>,
    pub line: u64,
    pub parameters: Vec<Parameter>,
    pub body: Vec<Statement>,
}

impl Procedure {
    /// Unqualified procedure name
    pub fn base_name(&self) -> &str {
        self.name.last().map(String::as_str).unwrap_or_default()
    }

    pub fn full_name(&self) -> String {
        self.name.join(".")
    }
}

/// `CREATE FUNCTION` / `ALTER FUNCTION`
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Vec<String>,
    pub line: u64,
    pub parameters: Vec<Parameter>,
    /// Table variable of a multi-statement table-valued function
    pub returns: Option<VariableName>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteParameter {
    /// `@name` in `@name = value`
    pub name: Option<VariableName>,
    /// `None` for `DEFAULT`
    pub value: Option<Expr>,
    pub output: bool,
}

/// `EXEC [@status =] procedure args`
#[derive(Debug, Clone, PartialEq)]
pub struct Execute {
    pub line: u64,
    pub return_status: Option<VariableName>,
    pub procedure: Expr,
    pub parameters: Vec<ExecuteParameter>,
}

/// `SET @v = e` or `SET @v += e`
#[derive(Debug, Clone, PartialEq)]
pub struct SetVariable {
    pub target: VariableName,
    /// Operator of a compound assignment
    pub operator: Option<BinaryOperator>,
    pub value: Expr,
}

/// `SET NOCOUNT ON`, `SET ANSI_NULLS, QUOTED_IDENTIFIER OFF`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetOption {
    pub line: u64,
    /// Option names, upper-cased
    pub options: Vec<String>,
    pub on: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Declare(Vec<Declaration>),
    SetVariable(SetVariable),
    SetOption(SetOption),
    CreateProcedure(Procedure),
    CreateFunction(Function),
    Execute(Execute),
    /// `BEGIN ... END` and `BEGIN TRY ... END CATCH`
    Block(Vec<Statement>),
    /// `IF` and `WHILE`
    Conditional {
        condition: Expr,
        body: Box<Statement>,
        otherwise: Option<Box<Statement>>,
    },
    Return(Option<Expr>),
    /// Any other statement, reduced to the expressions it contains
    Other(Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    Cast,
    Convert,
    TryCast,
    TryConvert,
}

impl CastKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            CastKind::Cast => "CAST",
            CastKind::Convert => "CONVERT",
            CastKind::TryCast => "TRY_CAST",
            CastKind::TryConvert => "TRY_CONVERT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Like,
    In,
    Between,
    Is,
}

impl BinaryOperator {
    /// `+ - * /`, the operators whose result type is modeled
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Plus
                | BinaryOperator::Minus
                | BinaryOperator::Multiply
                | BinaryOperator::Divide
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
    BitwiseNot,
    Exists,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Variable(VariableName),
    StringLiteral {
        value: String,
        national: bool,
    },
    NumberLiteral(String),
    Null,
    /// Column, table or function name parts
    Identifier(Vec<String>),
    Cast {
        kind: CastKind,
        expr: Box<Expr>,
        data_type: DataTypeRef,
        style: Option<Box<Expr>>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOperator,
        expr: Box<Expr>,
    },
    /// Parenthesized expression
    Nested(Box<Expr>),
    Function {
        name: Vec<String>,
        args: Vec<Expr>,
    },
    /// Anything else (subqueries, CASE, ...), reduced to its sub-expressions
    Opaque(Vec<Expr>),
}
