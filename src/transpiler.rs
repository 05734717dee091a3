use crate::{
    ast::{AssignmentOperator, BinaryOperator, Radix, UnaryOperator, UpdateOperator},
    checked::{
        CheckedBlock, CheckedExpr, CheckedExprKind, CheckedForKind, CheckedFunction,
        CheckedProgram, CheckedStmt, CheckedStmtKind,
    },
    error::{Error, Result},
    token::Span,
    types::{TypeId, TypeKind},
};

/// The runtime floor emitted before any translated function: fixed-width
/// aliases, user-defined literal operators for suffixed integer literals, the
/// range type backing for-in loops, the generic `print`, and the entry-point
/// shim that forwards `main` to the translated `mica_main`.
pub const PRELUDE: &str = r#"#include <array>
#include <cstdint>
#include <iostream>
#include <span>
#include <type_traits>

using u8 = std::uint8_t;
using u16 = std::uint16_t;
using u32 = std::uint32_t;
using u64 = std::uint64_t;
using usize = std::uint64_t;
using i8 = std::int8_t;
using i16 = std::int16_t;
using i32 = std::int32_t;
using i64 = std::int64_t;
using isize = std::int64_t;

constexpr u8 operator""_u8(unsigned long long value) { return static_cast<u8>(value); }
constexpr u16 operator""_u16(unsigned long long value) { return static_cast<u16>(value); }
constexpr u32 operator""_u32(unsigned long long value) { return static_cast<u32>(value); }
constexpr u64 operator""_u64(unsigned long long value) { return static_cast<u64>(value); }
constexpr usize operator""_usize(unsigned long long value) { return static_cast<usize>(value); }
constexpr i8 operator""_i8(unsigned long long value) { return static_cast<i8>(value); }
constexpr i16 operator""_i16(unsigned long long value) { return static_cast<i16>(value); }
constexpr i32 operator""_i32(unsigned long long value) { return static_cast<i32>(value); }
constexpr i64 operator""_i64(unsigned long long value) { return static_cast<i64>(value); }
constexpr isize operator""_isize(unsigned long long value) { return static_cast<isize>(value); }

template<typename ElementType, bool is_inclusive>
class mica_range {
public:
    struct iterator {
        ElementType value;
        constexpr iterator(ElementType value_)
          : value(value_) {}

        constexpr ElementType operator*() const { return value; }
        constexpr bool operator==(iterator const& other) const { return value == other.value; }
        constexpr bool operator!=(iterator const& other) const { return !(*this == other); }
        constexpr void operator++() { ++value; }
    };

    constexpr mica_range(ElementType start, ElementType end)
      : m_start(start), m_end(end) {}

    constexpr iterator begin() const { return m_start; }
    constexpr iterator end() const {
        if constexpr (is_inclusive) {
            return m_end + 1;
        } else {
            return m_end;
        }
    }

private:
    ElementType m_start;
    ElementType m_end;
};

template<typename T>
void print(T value) {
    if constexpr (std::is_same_v<T, bool>) {
        std::cout << (value ? "true" : "false");
    } else if constexpr (std::is_integral_v<T> && sizeof(T) == 1 && !std::is_same_v<T, char>) {
        std::cout << static_cast<int>(value);
    } else {
        std::cout << value;
    }
}

void mica_main();
int main(int argc, char** argv) {
    (void) argc;
    (void) argv;
    mica_main();
}

"#;

/// Lowers a checked program into a single C++ source string.
pub fn transpile(program: &CheckedProgram<'_>) -> Result<String> {
    Transpiler::new(program).transpile()
}

/// How the last statement of a block is rendered.
#[derive(Copy, Clone, PartialEq, Eq)]
enum LastStatementTreatment {
    /// Plain statement list; the block yields no value.
    Ignore,
    /// GCC statement expression: the last statement's value is the block's.
    AsExpression,
    /// Function body: a trailing value expression becomes `return <expr>;`.
    AsReturnStatement,
    /// Value-if branch: the trailing expression is stored in the current
    /// `__mica_ret_N` temporary.
    StoreInVariable,
}

pub struct Transpiler<'p, 'src> {
    program: &'p CheckedProgram<'src>,
    code: String,
    indent_level: usize,
    temp_variable_counter: usize,
}

impl<'p, 'src> Transpiler<'p, 'src> {
    pub fn new(program: &'p CheckedProgram<'src>) -> Transpiler<'p, 'src> {
        Transpiler {
            program,
            code: String::with_capacity(PRELUDE.len() + 4 * 1024),
            indent_level: 0,
            temp_variable_counter: 0,
        }
    }

    pub fn transpile(mut self) -> Result<String> {
        self.code.push_str(PRELUDE);
        for function in self.program.functions() {
            if !function.is_builtin() {
                self.transpile_function(function)?;
            }
        }
        Ok(self.code)
    }

    fn add_new_line(&mut self) {
        self.code.push('\n');
        for _ in 0..self.indent_level {
            self.code.push_str("    ");
        }
    }

    fn transpile_function(&mut self, function: &CheckedFunction<'src>) -> Result<()> {
        let body = function
            .body
            .as_ref()
            .expect("builtins are filtered out before emission");

        if function.name == "main" {
            let returns_void =
                self.program.get_type(function.return_type_id).kind == TypeKind::Void;
            if !returns_void || !function.parameters.is_empty() {
                return Err(Error::new(
                    "Main function must have no parameters and return void",
                    function.span,
                ));
            }
            self.code.push_str("void mica_main()");
            self.add_new_line();
            self.transpile_block(body, LastStatementTreatment::AsReturnStatement)?;
            self.add_new_line();
            return Ok(());
        }

        self.transpile_type(function.return_type_id, true)?;
        self.code.push(' ');
        self.code.push_str(function.name);
        self.code.push('(');
        for (index, parameter) in function.parameters.iter().enumerate() {
            if index > 0 {
                self.code.push_str(", ");
            }
            let variable = self.program.get_variable(parameter.variable_id);
            self.transpile_type(variable.type_id, false)?;
            self.code.push(' ');
            self.code.push_str(variable.name);
        }
        self.code.push(')');
        self.add_new_line();
        self.transpile_block(body, LastStatementTreatment::AsReturnStatement)?;
        self.add_new_line();
        Ok(())
    }

    fn transpile_type(&mut self, id: TypeId, suppress_first_qualifier: bool) -> Result<()> {
        let ty = *self.program.get_type(id);
        match ty.kind {
            TypeKind::Unknown => {
                return Err(Error::new("Cannot transpile unknown type", Span::new(0, 0)));
            }
            TypeKind::Pointer { inner, .. } => {
                // Both pointer kinds lower to a raw pointer.
                self.transpile_type(inner, false)?;
                self.code.push('*');
            }
            TypeKind::Array { size, inner } => {
                self.code.push_str("std::array<");
                self.transpile_type(inner, false)?;
                self.code.push_str(", ");
                self.code.push_str(&size.to_string());
                self.code.push('>');
            }
            TypeKind::Slice { inner } => {
                self.code.push_str("std::span<");
                self.transpile_type(inner, false)?;
                self.code.push('>');
            }
            TypeKind::Range {
                element,
                is_inclusive,
            } => {
                // The range template owns and increments its element, so the
                // element type must stay unqualified.
                self.code.push_str("mica_range<");
                self.transpile_type(element, true)?;
                self.code.push_str(", ");
                self.code
                    .push_str(if is_inclusive { "true" } else { "false" });
                self.code.push('>');
            }
            _ => {
                let name = ty
                    .builtin_name()
                    .expect("non-compound types are builtins");
                self.code.push_str(name);
            }
        }

        if !suppress_first_qualifier && !ty.is_mutable {
            self.code.push_str(" const");
        }
        Ok(())
    }

    fn transpile_block(
        &mut self,
        block: &CheckedBlock<'src>,
        treatment: LastStatementTreatment,
    ) -> Result<()> {
        // A void block never yields a value: no statement expression to wrap,
        // no trailing statement to rewrite into a return.
        let is_void = self.program.get_type(block.type_id).kind == TypeKind::Void;
        let treatment = if is_void
            && matches!(
                treatment,
                LastStatementTreatment::AsExpression | LastStatementTreatment::AsReturnStatement
            ) {
            LastStatementTreatment::Ignore
        } else {
            treatment
        };

        let wrap_as_statement_expression = treatment == LastStatementTreatment::AsExpression;
        if wrap_as_statement_expression {
            self.code.push('(');
        }
        self.code.push('{');

        if block.statements.is_empty() {
            self.add_new_line();
            self.code.push('}');
            if wrap_as_statement_expression {
                self.code.push(')');
            }
            return Ok(());
        }

        self.indent_level += 1;
        self.add_new_line();

        let (leading, last) = block
            .statements
            .split_at(block.statements.len() - 1);
        for statement in leading {
            self.transpile_statement(statement)?;
            self.add_new_line();
        }
        self.transpile_last_statement(&last[0], treatment)?;

        self.indent_level -= 1;
        self.add_new_line();
        self.code.push('}');
        if wrap_as_statement_expression {
            self.code.push(')');
        }
        Ok(())
    }

    /// A trailing semicolonless expression is the block's value; rewrite it
    /// according to the treatment. Any other trailing statement (a `for`, a
    /// declaration) is emitted unchanged, which is only reachable for void
    /// blocks.
    fn transpile_last_statement(
        &mut self,
        statement: &CheckedStmt<'src>,
        treatment: LastStatementTreatment,
    ) -> Result<()> {
        let value_expr = match &statement.kind {
            CheckedStmtKind::Expression {
                expr,
                ends_with_semicolon: false,
            } => Some(expr),
            _ => None,
        };

        match (treatment, value_expr) {
            (LastStatementTreatment::AsReturnStatement, Some(expr)) => {
                self.code.push_str("return ");
                self.transpile_expression(expr)?;
                self.code.push(';');
                Ok(())
            }
            (LastStatementTreatment::StoreInVariable, Some(expr)) => {
                self.code.push_str("__mica_ret_");
                self.code.push_str(&self.temp_variable_counter.to_string());
                self.code.push_str(" = ");
                self.transpile_expression(expr)?;
                self.code.push(';');
                Ok(())
            }
            _ => self.transpile_statement(statement),
        }
    }

    fn transpile_statement(&mut self, statement: &CheckedStmt<'src>) -> Result<()> {
        match &statement.kind {
            CheckedStmtKind::Expression { expr, .. } => {
                self.transpile_expression(expr)?;
                self.code.push(';');
                Ok(())
            }
            CheckedStmtKind::VariableDeclaration {
                variable_id,
                initializer,
            } => {
                let variable = self.program.get_variable(*variable_id);
                let (type_id, name) = (variable.type_id, variable.name);
                self.transpile_type(type_id, false)?;
                self.code.push(' ');
                self.code.push_str(name);
                if let Some(initializer) = initializer {
                    self.code.push_str(" = ");
                    self.transpile_expression(initializer)?;
                }
                self.code.push(';');
                Ok(())
            }
            CheckedStmtKind::Return(expr) => {
                match expr {
                    Some(expr) => {
                        self.code.push_str("return ");
                        self.transpile_expression(expr)?;
                        self.code.push(';');
                    }
                    None => self.code.push_str("return;"),
                }
                Ok(())
            }
            CheckedStmtKind::For(kind) => self.transpile_for_statement(kind),
        }
    }

    fn transpile_for_statement(&mut self, kind: &CheckedForKind<'src>) -> Result<()> {
        match kind {
            CheckedForKind::Infinite { body } => {
                self.code.push_str("for (;;)");
                self.add_new_line();
                self.transpile_block(body, LastStatementTreatment::Ignore)
            }
            CheckedForKind::WithCondition { condition, body } => {
                self.code.push_str("for (;");
                self.transpile_expression(condition)?;
                self.code.push_str(";)");
                self.add_new_line();
                self.transpile_block(body, LastStatementTreatment::Ignore)
            }
            CheckedForKind::WithRange {
                variable_id,
                iterable,
                body,
            } => {
                let variable = self.program.get_variable(*variable_id);
                let (type_id, name) = (variable.type_id, variable.name);
                self.code.push_str("for (");
                self.transpile_type(type_id, false)?;
                self.code.push(' ');
                self.code.push_str(name);
                self.code.push_str(" : ");
                self.transpile_expression(iterable)?;
                self.code.push(')');
                self.add_new_line();
                self.transpile_block(body, LastStatementTreatment::Ignore)
            }
        }
    }

    fn transpile_expression(&mut self, expr: &CheckedExpr<'src>) -> Result<()> {
        match &expr.kind {
            CheckedExprKind::Parenthesized(inner) => {
                self.code.push('(');
                self.transpile_expression(inner)?;
                self.code.push(')');
                Ok(())
            }
            CheckedExprKind::IntegerLiteral(literal) => {
                if literal.suffix.is_empty() {
                    self.code.push_str("static_cast<");
                    self.transpile_type(expr.type_id, true)?;
                    self.code.push_str(">(");
                    push_cpp_integer(&mut self.code, literal.radix, literal.digits);
                    self.code.push(')');
                } else {
                    push_cpp_integer(&mut self.code, literal.radix, literal.digits);
                    self.code.push('_');
                    self.code.push_str(literal.suffix);
                }
                Ok(())
            }
            CheckedExprKind::CharLiteral(lexeme) => {
                // The escape grammar is a subset of C++'s, so the lexeme is
                // emitted verbatim.
                self.code.push_str(lexeme);
                Ok(())
            }
            CheckedExprKind::BooleanLiteral(value) => {
                self.code.push_str(if *value { "true" } else { "false" });
                Ok(())
            }
            CheckedExprKind::Variable(variable_id) => {
                let name = self.program.get_variable(*variable_id).name;
                self.code.push_str(name);
                Ok(())
            }
            CheckedExprKind::Binary { op, lhs, rhs } => {
                self.code.push_str("static_cast<");
                self.transpile_type(expr.type_id, true)?;
                self.code.push_str(">(");
                self.code.push('(');
                self.transpile_expression(lhs)?;
                self.code.push(')');
                self.code.push_str(binary_operator_symbol(*op));
                self.code.push('(');
                self.transpile_expression(rhs)?;
                self.code.push(')');
                self.code.push(')');
                Ok(())
            }
            CheckedExprKind::Unary { op, operand } => {
                self.code.push_str("static_cast<");
                self.transpile_type(expr.type_id, true)?;
                self.code.push_str(">(");
                self.code.push_str(unary_operator_symbol(*op));
                self.code.push('(');
                self.transpile_expression(operand)?;
                self.code.push(')');
                self.code.push(')');
                Ok(())
            }
            CheckedExprKind::Assignment { op, lhs, rhs } => {
                self.transpile_assignment_expression(expr.type_id, *op, lhs, rhs)
            }
            CheckedExprKind::Update {
                op,
                operand,
                is_prefix,
            } => {
                self.code.push_str("static_cast<");
                self.transpile_type(expr.type_id, true)?;
                self.code.push_str(">(");
                if *is_prefix {
                    self.code.push_str(update_operator_symbol(*op));
                    self.code.push('(');
                    self.transpile_expression(operand)?;
                    self.code.push(')');
                } else {
                    self.code.push('(');
                    self.transpile_expression(operand)?;
                    self.code.push(')');
                    self.code.push_str(update_operator_symbol(*op));
                }
                self.code.push(')');
                Ok(())
            }
            CheckedExprKind::PointerDereference(operand) => {
                self.code.push_str("*(");
                self.transpile_expression(operand)?;
                self.code.push(')');
                Ok(())
            }
            CheckedExprKind::AddressOf(operand) => {
                self.code.push_str("&(");
                self.transpile_expression(operand)?;
                self.code.push(')');
                Ok(())
            }
            CheckedExprKind::Range { start, end, .. } => {
                self.transpile_type(expr.type_id, true)?;
                self.code.push('(');
                self.transpile_expression(start)?;
                self.code.push_str(", ");
                self.transpile_expression(end)?;
                self.code.push(')');
                Ok(())
            }
            CheckedExprKind::Block(block) => {
                self.transpile_block(block, LastStatementTreatment::AsExpression)
            }
            CheckedExprKind::If {
                condition,
                then_block,
                else_branch,
            } => self.transpile_if_expression(expr.type_id, condition, then_block, else_branch),
            CheckedExprKind::Call {
                function_id,
                arguments,
            } => {
                let name = self.program.get_function(*function_id).name;
                self.code.push_str(name);
                self.code.push('(');
                for (index, argument) in arguments.iter().enumerate() {
                    if index > 0 {
                        self.code.push_str(", ");
                    }
                    self.transpile_expression(&argument.value)?;
                }
                self.code.push(')');
                Ok(())
            }
            CheckedExprKind::ArrayLiteral(elements) => {
                self.code.push('(');
                self.transpile_type(expr.type_id, true)?;
                self.code.push('{');
                for (index, element) in elements.iter().enumerate() {
                    if index > 0 {
                        self.code.push_str(", ");
                    }
                    self.transpile_expression(element)?;
                }
                self.code.push_str("})");
                Ok(())
            }
            CheckedExprKind::ArraySubscript { array, index } => {
                self.code.push('(');
                self.transpile_expression(array)?;
                self.code.push_str(")[");
                self.transpile_expression(index)?;
                self.code.push(']');
                Ok(())
            }
        }
    }

    fn transpile_assignment_expression(
        &mut self,
        type_id: TypeId,
        op: AssignmentOperator,
        lhs: &CheckedExpr<'src>,
        rhs: &CheckedExpr<'src>,
    ) -> Result<()> {
        self.code.push_str("static_cast<");
        self.transpile_type(type_id, true)?;
        self.code.push_str(">(");
        self.code.push('(');
        self.transpile_expression(lhs)?;
        self.code.push(')');

        // `&&=` and `||=` have no C++ counterpart; lower to a plain
        // assignment whose right side re-reads the target, keeping the
        // short-circuit.
        match op {
            AssignmentOperator::LogicalAndAssignment => {
                self.code.push_str(" = ");
                self.code.push('(');
                self.transpile_expression(lhs)?;
                self.code.push(')');
                self.code
                    .push_str(binary_operator_symbol(BinaryOperator::LogicalAnd));
            }
            AssignmentOperator::LogicalOrAssignment => {
                self.code.push_str(" = ");
                self.code.push('(');
                self.transpile_expression(lhs)?;
                self.code.push(')');
                self.code
                    .push_str(binary_operator_symbol(BinaryOperator::LogicalOr));
            }
            _ => self.code.push_str(assignment_operator_symbol(op)),
        }

        self.code.push('(');
        self.transpile_expression(rhs)?;
        self.code.push(')');
        self.code.push(')');
        Ok(())
    }

    fn transpile_if_expression(
        &mut self,
        type_id: TypeId,
        condition: &CheckedExpr<'src>,
        then_block: &CheckedBlock<'src>,
        else_branch: &Option<Box<CheckedExpr<'src>>>,
    ) -> Result<()> {
        if self.program.get_type(type_id).kind == TypeKind::Void {
            self.code.push_str("if (");
            self.transpile_expression(condition)?;
            self.code.push(')');
            self.add_new_line();
            self.transpile_block(then_block, LastStatementTreatment::Ignore)?;

            if let Some(else_branch) = else_branch {
                self.add_new_line();
                self.code.push_str("else");
                self.add_new_line();
                match &else_branch.kind {
                    CheckedExprKind::Block(block) => {
                        self.transpile_block(block, LastStatementTreatment::Ignore)?;
                    }
                    _ => self.transpile_expression(else_branch)?,
                }
            }
            return Ok(());
        }

        let else_branch = else_branch
            .as_ref()
            .expect("the checker types else-less ifs as void");

        // The temporary counter nests: siblings reuse a number, nested value
        // ifs get fresh ones.
        self.temp_variable_counter += 1;
        let temp = format!("__mica_ret_{}", self.temp_variable_counter);

        self.code.push_str("({");
        self.indent_level += 1;
        self.add_new_line();

        self.transpile_type(type_id, true)?;
        self.code.push(' ');
        self.code.push_str(&temp);
        self.code.push_str(" {};");
        self.add_new_line();

        self.code.push_str("if (");
        self.transpile_expression(condition)?;
        self.code.push(')');
        self.add_new_line();
        self.transpile_block(then_block, LastStatementTreatment::StoreInVariable)?;
        self.add_new_line();

        self.code.push_str("else");
        self.add_new_line();
        self.code.push('{');
        self.indent_level += 1;
        self.add_new_line();
        self.code.push_str(&temp);
        self.code.push_str(" = ");
        self.transpile_expression(else_branch)?;
        self.code.push(';');
        self.indent_level -= 1;
        self.add_new_line();
        self.code.push('}');

        self.add_new_line();
        self.code.push_str(&temp);
        self.code.push(';');

        self.indent_level -= 1;
        self.add_new_line();
        self.code.push_str("})");

        self.temp_variable_counter -= 1;
        Ok(())
    }
}

/// Integer literals keep their written radix, re-spelled with the C++ prefix
/// (`0o17` becomes `017`).
fn push_cpp_integer(code: &mut String, radix: Radix, digits: &str) {
    let prefix = match radix {
        Radix::Decimal => "",
        Radix::Binary => "0b",
        Radix::Octal => "0",
        Radix::Hexadecimal => "0x",
    };
    code.push_str(prefix);
    code.push_str(digits);
}

fn binary_operator_symbol(op: BinaryOperator) -> &'static str {
    use BinaryOperator::*;
    match op {
        Addition => "+",
        Subtraction => "-",
        Multiplication => "*",
        Division => "/",
        Modulo => "%",
        BitwiseLeftShift => "<<",
        BitwiseRightShift => ">>",
        LessThan => "<",
        GreaterThan => ">",
        LessThanOrEqualTo => "<=",
        GreaterThanOrEqualTo => ">=",
        EqualTo => "==",
        NotEqualTo => "!=",
        BitwiseAnd => "&",
        BitwiseXor => "^",
        BitwiseOr => "|",
        LogicalAnd => "&&",
        LogicalOr => "||",
    }
}

fn unary_operator_symbol(op: UnaryOperator) -> &'static str {
    use UnaryOperator::*;
    match op {
        Positive => "+",
        Negative => "-",
        LogicalNot => "!",
        BitwiseNot => "~",
    }
}

fn update_operator_symbol(op: UpdateOperator) -> &'static str {
    use UpdateOperator::*;
    match op {
        Increment => "++",
        Decrement => "--",
    }
}

fn assignment_operator_symbol(op: AssignmentOperator) -> &'static str {
    use AssignmentOperator::*;
    match op {
        Assignment => "=",
        AdditionAssignment => "+=",
        SubtractionAssignment => "-=",
        MultiplicationAssignment => "*=",
        DivisionAssignment => "/=",
        ModuloAssignment => "%=",
        BitwiseLeftShiftAssignment => "<<=",
        BitwiseRightShiftAssignment => ">>=",
        BitwiseAndAssignment => "&=",
        BitwiseXorAssignment => "^=",
        BitwiseOrAssignment => "|=",
        LogicalAndAssignment | LogicalOrAssignment => {
            unreachable!("logical assignments are lowered before reaching symbol emission")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser, type_checker};
    use crate::util::test_utils::pipeline_tests;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    /// Transpiles and strips the prelude, leaving the translated functions.
    fn transpile_body(src: &str) -> String {
        let program = parser::parse_program(src).unwrap();
        let checked = type_checker::check(&program).unwrap();
        let code = transpile(&checked).unwrap();
        code.strip_prefix(PRELUDE).unwrap().to_string()
    }

    fn transpile_error(src: &str) -> Error {
        let program = parser::parse_program(src).unwrap();
        let checked = type_checker::check(&program).unwrap();
        transpile(&checked).unwrap_err()
    }

    #[test]
    fn main_is_renamed_and_shimmed() {
        let body = transpile_body("fn main(): void { }");
        assert_eq!(
            body,
            indoc! {"
                void mica_main()
                {
                }
            "}
        );
    }

    #[test]
    fn value_function_returns_its_trailing_expression() {
        let body = transpile_body("fn add(anon a: i32, b: i32): i32 { a + b }");
        assert_eq!(
            body,
            indoc! {"
                i32 add(i32 const a, i32 const b)
                {
                    return static_cast<i32>((a)+(b));
                }
            "}
        );
    }

    #[test]
    fn for_in_over_a_range_lowers_to_ranged_for() {
        let body = transpile_body("fn main(): void { for (i in 0..<3_i32) { print(i); } }");
        assert_eq!(
            body,
            indoc! {"
                void mica_main()
                {
                    for (i32 const i : mica_range<i32, false>(static_cast<i32>(0), 3_i32))
                    {
                        print(i);
                    }
                }
            "}
        );
    }

    #[test]
    fn variable_declarations_carry_constness() {
        let body = transpile_body(
            "fn main(): void { var x: u8 = 0xff_u8; mut y: i32 = 0o17; }",
        );
        assert_eq!(
            body,
            indoc! {"
                void mica_main()
                {
                    u8 const x = 0xff_u8;
                    i32 y = static_cast<i32>(017);
                }
            "}
        );
    }

    #[test]
    fn value_if_uses_a_nesting_temporary() {
        let body = transpile_body("fn pick(): i32 { if (true) { 1 } else { 2 } }");
        assert_eq!(
            body,
            indoc! {"
                i32 pick()
                {
                    return ({
                        i32 __mica_ret_1 {};
                        if (true)
                        {
                            __mica_ret_1 = static_cast<i32>(1);
                        }
                        else
                        {
                            __mica_ret_1 = ({
                                static_cast<i32>(2);
                            });
                        }
                        __mica_ret_1;
                    });
                }
            "}
        );
    }

    #[test]
    fn void_if_is_a_plain_statement() {
        let body = transpile_body(
            "fn main(): void { if (true) { print(1); } else { print(2); } }",
        );
        assert_eq!(
            body,
            indoc! {"
                void mica_main()
                {
                    if (true)
                    {
                        print(static_cast<i32>(1));
                    }
                    else
                    {
                        print(static_cast<i32>(2));
                    };
                }
            "}
        );
    }

    #[test]
    fn logical_assignment_preserves_short_circuit() {
        let body = transpile_body("fn main(): void { mut b: bool = true; b &&= false; }");
        assert_eq!(
            body,
            indoc! {"
                void mica_main()
                {
                    bool b = true;
                    static_cast<bool>((b) = (b)&&(false));
                }
            "}
        );
    }

    #[test]
    fn infinite_and_conditional_loops() {
        let body = transpile_body(
            "fn main(): void { mut n: i32 = 0; for (n < 3) { n += 1; } }",
        );
        assert_eq!(
            body,
            indoc! {"
                void mica_main()
                {
                    i32 n = static_cast<i32>(0);
                    for (;static_cast<bool>((n)<(static_cast<i32>(3)));)
                    {
                        static_cast<i32>((n)+=(static_cast<i32>(1)));
                    }
                }
            "}
        );
    }

    #[test]
    fn arrays_and_slices_lower_to_std_types() {
        let body = transpile_body(
            "fn first(values: []i32): i32 { values[0] }\n\
             fn main(): void { var a: [2]i32 = [1, 2]; first(values: a); }",
        );
        assert_eq!(
            body,
            indoc! {"
                i32 first(std::span<i32 const> const values)
                {
                    return (values)[static_cast<i32>(0)];
                }
                void mica_main()
                {
                    std::array<i32 const, 2> const a = (std::array<i32 const, 2>{static_cast<i32>(1), static_cast<i32>(2)});
                    first(a);
                }
            "}
        );
    }

    #[test]
    fn pointers_lower_to_raw_pointers() {
        let body = transpile_body(
            "fn main(): void { mut x: i32 = 1; var p: ^i32 = &x; var y: i32 = @p; }",
        );
        assert_eq!(
            body,
            indoc! {"
                void mica_main()
                {
                    i32 x = static_cast<i32>(1);
                    i32 const* const p = &(x);
                    i32 const y = *(p);
                }
            "}
        );
    }

    #[test]
    fn main_signature_is_enforced() {
        let error = transpile_error("fn main(): i32 { 0 }");
        assert_eq!(
            error.message,
            "Main function must have no parameters and return void"
        );

        let error = transpile_error("fn main(anon x: i32): void { }");
        assert_eq!(
            error.message,
            "Main function must have no parameters and return void"
        );
    }

    #[test]
    fn update_and_unary_expressions() {
        let body = transpile_body(
            "fn main(): void { mut x: i32 = 0; x++; --x; var y: i32 = -x; }",
        );
        assert_eq!(
            body,
            indoc! {"
                void mica_main()
                {
                    i32 x = static_cast<i32>(0);
                    static_cast<i32>((x)++);
                    static_cast<i32>(--(x));
                    i32 const y = static_cast<i32>(-(x));
                }
            "}
        );
    }

    #[test]
    fn char_literals_pass_through() {
        let body = transpile_body(r"fn main(): void { var c: char = '\n'; print(c); }");
        assert_eq!(
            body,
            indoc! {r"
                void mica_main()
                {
                    char const c = '\n';
                    print(c);
                }
            "}
        );
    }

    pipeline_tests!(
        use transpiler;

        fn suffixed_literals_use_user_defined_literals() {
            let source = "fn shift(): u32 { 1_u32 << 3_u32 }";
            let cpp_ok = "
                u32 shift()
                {
                    return static_cast<u32>((1_u32)<<(3_u32));
                }
            ";
        }

        fn transpiling_stops_on_earlier_pipeline_errors() {
            let source = "fn main(): void { x; }";
            let expected_error = "Unknown identifier";
        }
    );

    #[test]
    fn block_expressions_become_statement_expressions() {
        let body = transpile_body("fn f(): i32 { var x: i32 = { 1 }; x }");
        assert_eq!(
            body,
            indoc! {"
                i32 f()
                {
                    i32 const x = ({
                        static_cast<i32>(1);
                    });
                    return x;
                }
            "}
        );
    }
}
