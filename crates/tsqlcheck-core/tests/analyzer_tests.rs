// Integration tests for the T-SQL checker
use pretty_assertions::assert_eq;
use tsqlcheck_core::analyzer::{Analyzer, CheckResults};
use tsqlcheck_core::dialect::SqlVersion;
use tsqlcheck_core::error::{Diagnostic, DiagnosticKind, Severity, SyntaxError};

fn check(sql: &str) -> CheckResults {
    Analyzer::new().analyze(sql)
}

fn check_all(sql: &str) -> CheckResults {
    Analyzer::new().with_threshold(Severity::ALL).analyze(sql)
}

fn count(results: &CheckResults, kind: DiagnosticKind) -> usize {
    results.diagnostics.iter().filter(|d| d.kind == kind).count()
}

fn assert_clean(results: &CheckResults) {
    assert!(results.is_clean(), "Expected nothing: {:?}", results);
}

/// Exactly one diagnostic of `kind` and no syntax errors
fn one_of(results: &CheckResults, kind: DiagnosticKind) -> Diagnostic {
    assert!(results.errors.is_empty(), "Unexpected errors: {:?}", results.errors);
    assert_eq!(count(results, kind), 1, "{:?}", results.diagnostics);
    results
        .diagnostics
        .iter()
        .find(|d| d.kind == kind)
        .cloned()
        .unwrap()
}

fn none_of(results: &CheckResults, kind: DiagnosticKind) {
    assert!(results.errors.is_empty(), "Unexpected errors: {:?}", results.errors);
    assert_eq!(count(results, kind), 0, "{:?}", results.diagnostics);
}

// Parsing and versions

#[test]
fn test_simple_select_is_clean() {
    assert_clean(&check("select * from foo"));
}

#[test]
fn test_invalid_sql_produces_errors() {
    let results = check("select >>>");
    assert!(results.has_errors());
}

#[test]
fn test_deeply_nested_expression_is_an_error() {
    let sql = format!("declare @a int = {}1{}", "(".repeat(500), ")".repeat(500));
    let results = check(&sql);
    assert_eq!(results.errors.len(), 1);
    assert_eq!(results.errors[0].code(), 191);
}

#[test]
fn test_syntax_error_line() {
    let results = check("\nselect >>>");
    assert_eq!(results.errors[0].line(), 2);
    assert!(matches!(results.errors[0], SyntaxError::Unexpected { .. }));
}

#[test]
fn test_too_recent_syntax() {
    let sql = "select iif (1 > 0, 1, 2) from foo";
    assert!(Analyzer::with_version(SqlVersion::Sql2008)
        .analyze(sql)
        .has_errors());
    assert!(!Analyzer::with_version(SqlVersion::Sql2012)
        .analyze(sql)
        .has_errors());
}

// Reporting levels

#[test]
fn test_warning_message_and_line() {
    let results = check("\nset @undeclared = 7");
    let warning = one_of(&results, DiagnosticKind::UndeclaredVariableUsed);
    assert_eq!(warning.line, 2);
    assert_eq!(warning.message, "Variable @undeclared used before being declared");
    assert_eq!(warning.code(), 1);
}

#[test]
fn test_level_zero_hides_warnings_but_not_errors() {
    let quiet = Analyzer::new().with_threshold(Severity::None);
    assert_clean(&quiet.analyze("\nset @undeclared = 7"));
    assert!(quiet.analyze("select >>>").has_errors());
}

#[test]
fn test_critical_level_hides_minor_warnings() {
    let results = Analyzer::new()
        .with_threshold(Severity::Critical)
        .analyze("\nset @undeclared = 7\ndeclare @unused as int");
    one_of(&results, DiagnosticKind::UndeclaredVariableUsed);
    none_of(&results, DiagnosticKind::UnusedVariableDeclared);
}

#[test]
fn test_unused_variable_is_minor() {
    let sql = "declare @foo as int";
    let warning = one_of(&check_all(sql), DiagnosticKind::UnusedVariableDeclared);
    assert_eq!(warning.severity, Severity::Minor);
    assert_eq!(warning.message, "Variable @foo declared but never used");
    none_of(&check(sql), DiagnosticKind::UnusedVariableDeclared);
}

// Undeclared variables

#[test]
fn test_set_undeclared_variable() {
    let results = check("set @undeclared = 1");
    let warning = one_of(&results, DiagnosticKind::UndeclaredVariableUsed);
    assert_eq!(warning.line, 1);
}

#[test]
fn test_declared_variable() {
    assert_clean(&check("declare @declared as int; set @declared = 1"));
}

#[test]
fn test_declarations_are_case_insensitive() {
    assert_clean(&check("declare @DECLARED as int; set @declared = 1"));
    let results = check("declare @DECLARED as nvarchar(128); select @declared = Name from sys.Columns");
    none_of(&results, DiagnosticKind::UndeclaredVariableUsed);
}

#[test]
fn test_declarations_are_per_batch() {
    let results = check("\ndeclare @declared as int;\nGO\nset @declared = 1");
    let warning = one_of(&results, DiagnosticKind::UndeclaredVariableUsed);
    assert_eq!(warning.line, 4);
}

#[test]
fn test_multiple_declarations() {
    let results = check_all("declare @a as int, @b as nvarchar; set @b = 'x'; set @a = 3");
    none_of(&results, DiagnosticKind::UndeclaredVariableUsed);
    none_of(&results, DiagnosticKind::UnusedVariableDeclared);
    none_of(&results, DiagnosticKind::StringTruncated);
    none_of(&results, DiagnosticKind::ImplicitConversion);
}

#[test]
fn test_select_undeclared_variable() {
    one_of(
        &check("select X from Y where X = @foo"),
        DiagnosticKind::UndeclaredVariableUsed,
    );
}

#[test]
fn test_global_variables_need_no_declaration() {
    assert_clean(&check("select X from Y where X = @@cpu_busy"));
}

#[test]
fn test_procedure_parameters_are_declared() {
    let results = check("\ncreate procedure foo @x INT\nas\n    set @x = 2\ngo");
    none_of(&results, DiagnosticKind::UndeclaredVariableUsed);

    let results = check("\ncreate procedure foo @x INT\nas\n    set @y = 2\ngo");
    let warning = one_of(&results, DiagnosticKind::UndeclaredVariableUsed);
    assert_eq!(warning.line, 4);
}

#[test]
fn test_table_variable_declaration() {
    assert_clean(&check("\ndeclare @t table(Value int)\ninsert @t (Value)values(1)"));
}

#[test]
fn test_execute_parameter_names_need_no_declaration() {
    assert_clean(&check("\nexec foo @a = 1\n"));
    one_of(&check("\nexec foo @b\n"), DiagnosticKind::UndeclaredVariableUsed);
    one_of(
        &check("\nexec foo @a = @b\n"),
        DiagnosticKind::UndeclaredVariableUsed,
    );
    assert_clean(&check("exec foo @out = @out output"));
    assert_clean(&check("exec foo @Out = @OUT output"));
}

#[test]
fn test_variables_inside_control_flow() {
    let sql = "
declare @i as int = 0
while @i < 10
begin
    if @i % 2 = 0
        print @j
    set @i += 1
end";
    let warning = one_of(&check_all(sql), DiagnosticKind::UndeclaredVariableUsed);
    assert_eq!(warning.line, 6);
}

// Procedures

#[test]
fn test_procedure_without_nocount() {
    let sql = "
                create procedure foo as
return 1
go
create procedure bar as
set nocount on
return 1
go
                ";
    let warning = one_of(&check_all(sql), DiagnosticKind::ProcedureWithoutNoCount);
    assert_eq!(warning.line, 2);
    assert_eq!(warning.message, "Procedure foo does not SET NOCOUNT ON");
}

#[test]
fn test_procedure_with_sp_prefix() {
    let results = check("\ncreate procedure sp_foo as \nreturn 1\ngo");
    let warning = one_of(&results, DiagnosticKind::ProcedureWithSPPrefix);
    assert!(warning.message.contains("sp_foo"));
    one_of(
        &check("create procedure dbo.SP_Bar as set nocount on"),
        DiagnosticKind::ProcedureWithSPPrefix,
    );
}

#[test]
fn test_procedure_warnings_use_create_line() {
    let results = check_all("\ncreate procedure\n  sp_foo\nas\nreturn 1");
    assert_eq!(one_of(&results, DiagnosticKind::ProcedureWithSPPrefix).line, 2);
    assert_eq!(one_of(&results, DiagnosticKind::ProcedureWithoutNoCount).line, 2);
}

// Implicit lengths

#[test]
fn test_variable_without_length() {
    for type_name in ["char", "varchar", "nchar", "nvarchar"] {
        let sql = format!(
            "declare @explicit_length as {0}(1); declare @implicit_length as {0}",
            type_name
        );
        let warning = one_of(&check(&sql), DiagnosticKind::CharVariableWithImplicitLength);
        assert!(warning.message.contains("@implicit_length"), "{}", type_name);
    }
}

#[test]
fn test_parameter_without_length() {
    for type_name in ["char", "varchar", "nchar", "nvarchar"] {
        let sql = format!(
            "create procedure myproc(@myparam as {}) as return @myparam",
            type_name
        );
        let warning = one_of(&check(&sql), DiagnosticKind::CharVariableWithImplicitLength);
        assert!(warning.message.contains("@myparam"), "{}", type_name);
    }
}

#[test]
fn test_cast_without_length() {
    let results = check("declare @a as int = 1\nselect cast(@a as varchar), convert(nvarchar(10), @a)");
    let warning = one_of(&results, DiagnosticKind::ConvertToVarCharOfUnspecifiedLength);
    assert_eq!(warning.line, 2);
    assert_eq!(warning.message, "CAST to varchar without specifying a length");
}

// Assignments

#[test]
fn test_declare_without_value() {
    none_of(&check("declare @fine as char(1)"), DiagnosticKind::StringTruncated);
}

#[test]
fn test_declare_with_longer_literal() {
    let warning = one_of(
        &check("declare @tooshort as char(1) = 'hello'"),
        DiagnosticKind::StringTruncated,
    );
    assert!(warning.message.contains(
        "Variable @tooshort has length 1 and is assigned a value with length up to 5"
    ));
}

#[test]
fn test_declare_with_same_length_literal() {
    none_of(&check("declare @fine as char(5) = 'hello'"), DiagnosticKind::StringTruncated);
}

#[test]
fn test_implicit_length_truncates() {
    for type_name in ["char", "varchar"] {
        let sql = format!("declare @tooshort as {} = 'hello'", type_name);
        let warning = one_of(&check(&sql), DiagnosticKind::StringTruncated);
        assert!(warning.message.contains("has length 1"), "{}", type_name);
    }
}

#[test]
fn test_max_length_holds_anything() {
    none_of(
        &check("declare @fine as varchar(max) = 'hello'"),
        DiagnosticKind::StringTruncated,
    );
}

#[test]
fn test_set_after_declare_truncates() {
    let warning = one_of(
        &check("declare @tooshort as varchar; set @tooshort = 'hello'"),
        DiagnosticKind::StringTruncated,
    );
    assert!(warning.message.contains("has length 1"));
    assert!(warning.message.contains("length up to 5"));
}

#[test]
fn test_unicode_into_narrow_string() {
    let results = check("declare @wide as nchar; declare @narrow as char; set @narrow = @wide");
    one_of(&results, DiagnosticKind::StringConverted);
    none_of(&results, DiagnosticKind::StringTruncated);

    let results = check("declare @narrow as varchar(2) = N'hello'");
    one_of(&results, DiagnosticKind::StringConverted);
    one_of(&results, DiagnosticKind::StringTruncated);
}

#[test]
fn test_number_into_short_string() {
    let results = check("DECLARE @x as char(2); declare @y as int; set @x = @y");
    let warning = one_of(&results, DiagnosticKind::ConvertToTooShortString);
    assert!(warning.message.contains("length up to 11"));

    none_of(
        &check("declare @x as char(11); declare @y as int; set @x = @y"),
        DiagnosticKind::ConvertToTooShortString,
    );
}

#[test]
fn test_numeric_overflow() {
    let results = check("declare @big as bigint = 1; declare @small as smallint; set @small = @big");
    let warning = one_of(&results, DiagnosticKind::NumericOverflow);
    assert_eq!(
        warning.message,
        "Variable @small has type smallint and is assigned a value of type bigint, which might overflow"
    );
    none_of(
        &check("declare @small as smallint = 1; declare @big as bigint; set @big = @small"),
        DiagnosticKind::NumericOverflow,
    );
}

#[test]
fn test_unicode_string_into_integer() {
    let results = check("declare @text as nvarchar(10) = N'1'; declare @n as int; set @n = @text");
    one_of(&results, DiagnosticKind::ImplicitConversion);
}

#[test]
fn test_compound_assignment_uses_result_type() {
    // varchar(10) + nvarchar(4) is nvarchar(4), narrowed back into varchar(10)
    let results = check("declare @s as varchar(10) = 'abc'; set @s += N'defg'");
    one_of(&results, DiagnosticKind::StringConverted);
    none_of(&results, DiagnosticKind::StringTruncated);
}

#[test]
fn test_unknown_types_never_warn() {
    let results = check("declare @s as char(1); set @s = (select top 1 name from sys.objects)");
    none_of(&results, DiagnosticKind::StringTruncated);
    none_of(&results, DiagnosticKind::ImplicitConversion);
}

// Whole scripts

#[test]
fn test_errors_do_not_hide_warnings() {
    let results = check("set @a = \nset @b = 1");
    assert!(results.has_errors());
    assert_eq!(count(&results, DiagnosticKind::UndeclaredVariableUsed), 1);
}

#[test]
fn test_disabled_kinds_are_not_reported() {
    let results = Analyzer::new()
        .disable(DiagnosticKind::UndeclaredVariableUsed)
        .analyze("set @undeclared = 1");
    assert_clean(&results);
}

#[test]
fn test_realistic_procedure() {
    let sql = "
CREATE PROCEDURE dbo.GetOrders
    @CustomerId INT,
    @Status VARCHAR(20) = 'open',
    @Total MONEY OUTPUT
AS
BEGIN
    SET NOCOUNT ON;

    DECLARE @Count INT = 0;

    SELECT @Count = COUNT(*)
    FROM Orders o
    WHERE o.CustomerId = @CustomerId
      AND o.Status = @Status;

    IF @Count = 0
    BEGIN
        SET @Total = 0;
        RETURN 0;
    END

    SELECT @Total = SUM(o.Amount)
    FROM Orders o
    WHERE o.CustomerId = @CustomerId;

    RETURN @Count;
END
GO

EXEC dbo.GetOrders @CustomerId = 1, @Status = 'closed', @Total = @Result OUTPUT;
";
    let results = check_all(sql);
    assert!(results.errors.is_empty(), "{:?}", results.errors);
    let warning = one_of(&results, DiagnosticKind::UndeclaredVariableUsed);
    assert!(warning.message.contains("@Result"));
    assert_eq!(warning.line, 31);
    none_of(&results, DiagnosticKind::ProcedureWithoutNoCount);
    none_of(&results, DiagnosticKind::UnusedVariableDeclared);
}
