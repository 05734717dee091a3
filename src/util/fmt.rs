//! JSON dumps of the untyped and checked trees, for tests, debugging, and
//! the driver's `--dump-ast` flags.
//!
//! Every node renders as `{"node": <kind>, "span": [start, end], ...}` on a
//! single line. Checked nodes add a `"type"` reference: a bare string for an
//! immutable builtin, an object otherwise. Variable references render as
//! `{"name", "type", "declaration_span"}`.

use std::io::{self, Write};

use crate::{
    ast::{
        Argument, Block, Expr, ExprKind, ForKind, FunctionDeclaration, Program, Radix, Stmt,
        StmtKind, TypeExpr, TypeExprKind,
    },
    checked::{
        CheckedArgument, CheckedBlock, CheckedExpr, CheckedExprKind, CheckedForKind,
        CheckedProgram, CheckedStmt, CheckedStmtKind, VariableId,
    },
    token::Span,
    types::{PointerKind, TypeId, TypeKind},
};

pub fn dump_program_string(program: &Program<'_>) -> String {
    let mut buf = Vec::with_capacity(1024);
    dump_program(&mut buf, program).expect("writing to a Vec cannot fail");
    String::from_utf8(buf).expect("dumps are ASCII")
}

pub fn dump_checked_program_string(program: &CheckedProgram<'_>) -> String {
    let mut buf = Vec::with_capacity(1024);
    dump_checked_program(&mut buf, program).expect("writing to a Vec cannot fail");
    String::from_utf8(buf).expect("dumps are ASCII")
}

fn write_span(w: &mut impl Write, span: Span) -> io::Result<()> {
    write!(w, "\"span\":[{},{}]", span.start, span.end)
}

fn write_json_string(w: &mut impl Write, value: &str) -> io::Result<()> {
    w.write_all(b"\"")?;
    for byte in value.bytes() {
        match byte {
            b'"' => w.write_all(b"\\\"")?,
            b'\\' => w.write_all(b"\\\\")?,
            b'\n' => w.write_all(b"\\n")?,
            b'\r' => w.write_all(b"\\r")?,
            b'\t' => w.write_all(b"\\t")?,
            0x00..=0x1f => write!(w, "\\u{byte:04x}")?,
            _ => w.write_all(&[byte])?,
        }
    }
    w.write_all(b"\"")
}

// --- Untyped tree ---

pub fn dump_program(w: &mut impl Write, program: &Program<'_>) -> io::Result<()> {
    write!(w, "{{\"node\":\"Program\",")?;
    write_span(w, program.span)?;
    write!(w, ",\"functions\":[")?;
    for (index, function) in program.functions.iter().enumerate() {
        if index > 0 {
            write!(w, ",")?;
        }
        dump_function(w, function)?;
    }
    write!(w, "]}}")
}

fn dump_function(w: &mut impl Write, function: &FunctionDeclaration<'_>) -> io::Result<()> {
    write!(w, "{{\"node\":\"FunctionDeclaration\",")?;
    write_span(w, function.span)?;
    write!(w, ",\"name\":")?;
    write_json_string(w, function.name.name)?;
    write!(w, ",\"parameters\":[")?;
    for (index, parameter) in function.parameters.iter().enumerate() {
        if index > 0 {
            write!(w, ",")?;
        }
        write!(w, "{{\"name\":")?;
        write_json_string(w, parameter.name.name)?;
        write!(w, ",\"anonymous\":{},\"type\":", parameter.is_anonymous)?;
        dump_type_expr(w, &parameter.ty)?;
        write!(w, "}}")?;
    }
    write!(w, "],\"return_type\":")?;
    dump_type_expr(w, &function.return_type)?;
    write!(w, ",\"body\":")?;
    dump_block(w, &function.body)?;
    write!(w, "}}")
}

fn dump_type_expr(w: &mut impl Write, ty: &TypeExpr<'_>) -> io::Result<()> {
    match &ty.kind {
        TypeExprKind::Named(name) => {
            write!(w, "{{\"name\":")?;
            write_json_string(w, name)?;
        }
        TypeExprKind::Pointer { kind, inner } => {
            let kind = match kind {
                PointerKind::Weak => "weak",
                PointerKind::Strong => "strong",
            };
            write!(w, "{{\"name\":\"pointer\",\"kind\":\"{kind}\",\"inner\":")?;
            dump_type_expr(w, inner)?;
        }
        TypeExprKind::Array { size, inner } => {
            write!(w, "{{\"name\":\"array\",\"size\":")?;
            write_json_string(w, size.literal.digits)?;
            write!(w, ",\"inner\":")?;
            dump_type_expr(w, inner)?;
        }
        TypeExprKind::Slice { inner } => {
            write!(w, "{{\"name\":\"slice\",\"inner\":")?;
            dump_type_expr(w, inner)?;
        }
    }
    write!(w, ",\"mutable\":{}}}", ty.is_mutable)
}

fn dump_block(w: &mut impl Write, block: &Block<'_>) -> io::Result<()> {
    write!(w, "{{\"node\":\"BlockExpression\",")?;
    write_span(w, block.span)?;
    write!(w, ",\"statements\":[")?;
    for (index, statement) in block.statements.iter().enumerate() {
        if index > 0 {
            write!(w, ",")?;
        }
        dump_statement(w, statement)?;
    }
    write!(w, "]}}")
}

fn dump_statement(w: &mut impl Write, statement: &Stmt<'_>) -> io::Result<()> {
    match &statement.kind {
        StmtKind::Expression {
            expr,
            ends_with_semicolon,
        } => {
            write!(w, "{{\"node\":\"ExpressionStatement\",")?;
            write_span(w, statement.span)?;
            write!(
                w,
                ",\"ends_with_semicolon\":{ends_with_semicolon},\"expression\":"
            )?;
            dump_expression(w, expr)?;
            write!(w, "}}")
        }
        StmtKind::VariableDeclaration {
            is_mutable,
            name,
            ty,
            initializer,
        } => {
            write!(w, "{{\"node\":\"VariableDeclarationStatement\",")?;
            write_span(w, statement.span)?;
            write!(w, ",\"mutable\":{is_mutable},\"name\":")?;
            write_json_string(w, name.name)?;
            write!(w, ",\"type\":")?;
            match ty {
                Some(ty) => dump_type_expr(w, ty)?,
                None => write!(w, "null")?,
            }
            write!(w, ",\"initializer\":")?;
            match initializer {
                Some(initializer) => dump_expression(w, initializer)?,
                None => write!(w, "null")?,
            }
            write!(w, "}}")
        }
        StmtKind::Return(expr) => {
            write!(w, "{{\"node\":\"ReturnStatement\",")?;
            write_span(w, statement.span)?;
            write!(w, ",\"expression\":")?;
            match expr {
                Some(expr) => dump_expression(w, expr)?,
                None => write!(w, "null")?,
            }
            write!(w, "}}")
        }
        StmtKind::For(kind) => dump_for_statement(w, statement.span, kind),
    }
}

fn dump_for_statement(
    w: &mut impl Write,
    span: Span,
    kind: &ForKind<'_>,
) -> io::Result<()> {
    match kind {
        ForKind::Infinite { body } => {
            write!(w, "{{\"node\":\"InfiniteForStatement\",")?;
            write_span(w, span)?;
            write!(w, ",\"body\":")?;
            dump_block(w, body)?;
            write!(w, "}}")
        }
        ForKind::WithCondition { condition, body } => {
            write!(w, "{{\"node\":\"ForWithConditionStatement\",")?;
            write_span(w, span)?;
            write!(w, ",\"condition\":")?;
            dump_expression(w, condition)?;
            write!(w, ",\"body\":")?;
            dump_block(w, body)?;
            write!(w, "}}")
        }
        ForKind::WithRange {
            variable,
            iterable,
            body,
        } => {
            write!(w, "{{\"node\":\"ForWithRangeStatement\",")?;
            write_span(w, span)?;
            write!(w, ",\"variable\":")?;
            write_json_string(w, variable.name)?;
            write!(w, ",\"iterable\":")?;
            dump_expression(w, iterable)?;
            write!(w, ",\"body\":")?;
            dump_block(w, body)?;
            write!(w, "}}")
        }
    }
}

fn radix_name(radix: Radix) -> &'static str {
    match radix {
        Radix::Decimal => "decimal",
        Radix::Binary => "binary",
        Radix::Octal => "octal",
        Radix::Hexadecimal => "hexadecimal",
    }
}

fn dump_expression(w: &mut impl Write, expr: &Expr<'_>) -> io::Result<()> {
    match &expr.kind {
        ExprKind::IntegerLiteral(literal) => {
            write!(w, "{{\"node\":\"IntegerLiteral\",")?;
            write_span(w, expr.span)?;
            write!(w, ",\"value\":")?;
            write_json_string(w, literal.digits)?;
            write!(w, ",\"radix\":\"{}\",\"suffix\":", radix_name(literal.radix))?;
            write_json_string(w, literal.suffix)?;
            write!(w, "}}")
        }
        ExprKind::CharLiteral(lexeme) => {
            write!(w, "{{\"node\":\"CharLiteral\",")?;
            write_span(w, expr.span)?;
            write!(w, ",\"value\":")?;
            write_json_string(w, lexeme)?;
            write!(w, "}}")
        }
        ExprKind::BooleanLiteral(value) => {
            write!(w, "{{\"node\":\"BooleanLiteral\",")?;
            write_span(w, expr.span)?;
            write!(w, ",\"value\":{value}}}")
        }
        ExprKind::Identifier(name) => {
            write!(w, "{{\"node\":\"Identifier\",")?;
            write_span(w, expr.span)?;
            write!(w, ",\"name\":")?;
            write_json_string(w, name)?;
            write!(w, "}}")
        }
        ExprKind::Parenthesized(inner) => {
            write!(w, "{{\"node\":\"ParenthesizedExpression\",")?;
            write_span(w, expr.span)?;
            write!(w, ",\"expression\":")?;
            dump_expression(w, inner)?;
            write!(w, "}}")
        }
        ExprKind::Binary { op, lhs, rhs } => {
            write!(w, "{{\"node\":\"BinaryExpression\",")?;
            write_span(w, expr.span)?;
            write!(w, ",\"operator\":\"{op:?}\",\"lhs\":")?;
            dump_expression(w, lhs)?;
            write!(w, ",\"rhs\":")?;
            dump_expression(w, rhs)?;
            write!(w, "}}")
        }
        ExprKind::Unary { op, operand } => {
            write!(w, "{{\"node\":\"UnaryExpression\",")?;
            write_span(w, expr.span)?;
            write!(w, ",\"operator\":\"{op:?}\",\"operand\":")?;
            dump_expression(w, operand)?;
            write!(w, "}}")
        }
        ExprKind::Assignment { op, lhs, rhs } => {
            write!(w, "{{\"node\":\"AssignmentExpression\",")?;
            write_span(w, expr.span)?;
            write!(w, ",\"operator\":\"{op:?}\",\"lhs\":")?;
            dump_expression(w, lhs)?;
            write!(w, ",\"rhs\":")?;
            dump_expression(w, rhs)?;
            write!(w, "}}")
        }
        ExprKind::Update {
            op,
            operand,
            is_prefix,
        } => {
            write!(w, "{{\"node\":\"UpdateExpression\",")?;
            write_span(w, expr.span)?;
            write!(
                w,
                ",\"operator\":\"{op:?}\",\"is_prefixed\":{is_prefix},\"operand\":"
            )?;
            dump_expression(w, operand)?;
            write!(w, "}}")
        }
        ExprKind::PointerDereference(operand) => {
            write!(w, "{{\"node\":\"PointerDereferenceExpression\",")?;
            write_span(w, expr.span)?;
            write!(w, ",\"operand\":")?;
            dump_expression(w, operand)?;
            write!(w, "}}")
        }
        ExprKind::AddressOf(operand) => {
            write!(w, "{{\"node\":\"AddressOfExpression\",")?;
            write_span(w, expr.span)?;
            write!(w, ",\"operand\":")?;
            dump_expression(w, operand)?;
            write!(w, "}}")
        }
        ExprKind::Range {
            start,
            end,
            is_inclusive,
        } => {
            write!(w, "{{\"node\":\"RangeExpression\",")?;
            write_span(w, expr.span)?;
            write!(w, ",\"inclusive\":{is_inclusive},\"start\":")?;
            dump_expression(w, start)?;
            write!(w, ",\"end\":")?;
            dump_expression(w, end)?;
            write!(w, "}}")
        }
        ExprKind::Block(block) => dump_block(w, block),
        ExprKind::If {
            condition,
            then_block,
            else_branch,
        } => {
            write!(w, "{{\"node\":\"IfExpression\",")?;
            write_span(w, expr.span)?;
            write!(w, ",\"condition\":")?;
            dump_expression(w, condition)?;
            write!(w, ",\"then\":")?;
            dump_block(w, then_block)?;
            write!(w, ",\"else\":")?;
            match else_branch {
                Some(branch) => dump_expression(w, branch)?,
                None => write!(w, "null")?,
            }
            write!(w, "}}")
        }
        ExprKind::Call { callee, arguments } => {
            write!(w, "{{\"node\":\"FunctionCallExpression\",")?;
            write_span(w, expr.span)?;
            write!(w, ",\"name\":")?;
            write_json_string(w, callee.name)?;
            write!(w, ",\"arguments\":[")?;
            for (index, argument) in arguments.iter().enumerate() {
                if index > 0 {
                    write!(w, ",")?;
                }
                dump_argument(w, argument)?;
            }
            write!(w, "]}}")
        }
        ExprKind::ArrayLiteral(elements) => {
            write!(w, "{{\"node\":\"ArrayExpression\",")?;
            write_span(w, expr.span)?;
            write!(w, ",\"elements\":[")?;
            for (index, element) in elements.iter().enumerate() {
                if index > 0 {
                    write!(w, ",")?;
                }
                dump_expression(w, element)?;
            }
            write!(w, "]}}")
        }
        ExprKind::ArraySubscript { array, index } => {
            write!(w, "{{\"node\":\"ArraySubscriptExpression\",")?;
            write_span(w, expr.span)?;
            write!(w, ",\"array\":")?;
            dump_expression(w, array)?;
            write!(w, ",\"index\":")?;
            dump_expression(w, index)?;
            write!(w, "}}")
        }
    }
}

fn dump_argument(w: &mut impl Write, argument: &Argument<'_>) -> io::Result<()> {
    write!(w, "{{\"name\":")?;
    match argument.name {
        Some(name) => write_json_string(w, name.name)?,
        None => write!(w, "null")?,
    }
    write!(w, ",\"value\":")?;
    dump_expression(w, &argument.value)?;
    write!(w, "}}")
}

// --- Checked tree ---

pub fn dump_checked_program(
    w: &mut impl Write,
    program: &CheckedProgram<'_>,
) -> io::Result<()> {
    write!(w, "{{\"node\":\"Program\",")?;
    write_span(w, program.span)?;
    write!(w, ",\"functions\":[")?;
    let mut first = true;
    for function in program.functions() {
        let Some(body) = &function.body else {
            continue;
        };
        if !first {
            write!(w, ",")?;
        }
        first = false;

        write!(w, "{{\"node\":\"Function\",")?;
        write_span(w, function.span)?;
        write!(w, ",\"name\":")?;
        write_json_string(w, function.name)?;
        write!(w, ",\"parameters\":[")?;
        for (index, parameter) in function.parameters.iter().enumerate() {
            if index > 0 {
                write!(w, ",")?;
            }
            write!(
                w,
                "{{\"anonymous\":{},\"variable\":",
                parameter.is_anonymous
            )?;
            dump_variable(w, program, parameter.variable_id)?;
            write!(w, "}}")?;
        }
        write!(w, "],\"return_type\":")?;
        dump_type(w, program, function.return_type_id)?;
        write!(w, ",\"body\":")?;
        dump_checked_block(w, program, body)?;
        write!(w, "}}")?;
    }
    write!(w, "]}}")
}

pub fn dump_type(
    w: &mut impl Write,
    program: &CheckedProgram<'_>,
    id: TypeId,
) -> io::Result<()> {
    let ty = program.get_type(id);
    if let Some(name) = ty.builtin_name() {
        if !ty.is_mutable {
            return write_json_string(w, name);
        }
        write!(w, "{{\"name\":")?;
        write_json_string(w, name)?;
        return write!(w, ",\"mutable\":true}}");
    }

    match ty.kind {
        TypeKind::Pointer { kind, inner } => {
            let kind = match kind {
                PointerKind::Weak => "weak",
                PointerKind::Strong => "strong",
            };
            write!(w, "{{\"name\":\"pointer\",\"kind\":\"{kind}\",\"inner\":")?;
            dump_type(w, program, inner)?;
        }
        TypeKind::Array { size, inner } => {
            write!(w, "{{\"name\":\"array\",\"size\":{size},\"inner\":")?;
            dump_type(w, program, inner)?;
        }
        TypeKind::Slice { inner } => {
            write!(w, "{{\"name\":\"slice\",\"inner\":")?;
            dump_type(w, program, inner)?;
        }
        TypeKind::Range {
            element,
            is_inclusive,
        } => {
            write!(
                w,
                "{{\"name\":\"range\",\"inclusive\":{is_inclusive},\"element\":"
            )?;
            dump_type(w, program, element)?;
        }
        _ => unreachable!("builtins are handled above"),
    }
    write!(w, ",\"mutable\":{}}}", ty.is_mutable)
}

fn dump_variable(
    w: &mut impl Write,
    program: &CheckedProgram<'_>,
    id: VariableId,
) -> io::Result<()> {
    let variable = program.get_variable(id);
    write!(w, "{{\"name\":")?;
    write_json_string(w, variable.name)?;
    write!(w, ",\"type\":")?;
    dump_type(w, program, variable.type_id)?;
    write!(
        w,
        ",\"declaration_span\":[{},{}]}}",
        variable.declaration_span.start, variable.declaration_span.end
    )
}

fn dump_checked_block(
    w: &mut impl Write,
    program: &CheckedProgram<'_>,
    block: &CheckedBlock<'_>,
) -> io::Result<()> {
    write!(w, "{{\"node\":\"BlockExpression\",\"type\":")?;
    dump_type(w, program, block.type_id)?;
    write!(w, ",")?;
    write_span(w, block.span)?;
    write!(
        w,
        ",\"contains_return_statement\":{},\"statements\":[",
        block.contains_return_statement
    )?;
    for (index, statement) in block.statements.iter().enumerate() {
        if index > 0 {
            write!(w, ",")?;
        }
        dump_checked_statement(w, program, statement)?;
    }
    write!(w, "]}}")
}

fn dump_checked_statement(
    w: &mut impl Write,
    program: &CheckedProgram<'_>,
    statement: &CheckedStmt<'_>,
) -> io::Result<()> {
    match &statement.kind {
        CheckedStmtKind::Expression {
            expr,
            ends_with_semicolon,
        } => {
            write!(w, "{{\"node\":\"ExpressionStatement\",\"type\":")?;
            dump_type(w, program, statement.type_id)?;
            write!(w, ",")?;
            write_span(w, statement.span)?;
            write!(
                w,
                ",\"ends_with_semicolon\":{ends_with_semicolon},\"expression\":"
            )?;
            dump_checked_expression(w, program, expr)?;
            write!(w, "}}")
        }
        CheckedStmtKind::VariableDeclaration {
            variable_id,
            initializer,
        } => {
            write!(w, "{{\"node\":\"VariableDeclarationStatement\",")?;
            write_span(w, statement.span)?;
            write!(w, ",\"variable\":")?;
            dump_variable(w, program, *variable_id)?;
            write!(w, ",\"initializer\":")?;
            match initializer {
                Some(initializer) => dump_checked_expression(w, program, initializer)?,
                None => write!(w, "null")?,
            }
            write!(w, "}}")
        }
        CheckedStmtKind::Return(expr) => {
            write!(w, "{{\"node\":\"ReturnStatement\",")?;
            write_span(w, statement.span)?;
            write!(w, ",\"expression\":")?;
            match expr {
                Some(expr) => dump_checked_expression(w, program, expr)?,
                None => write!(w, "null")?,
            }
            write!(w, "}}")
        }
        CheckedStmtKind::For(kind) => match kind {
            CheckedForKind::Infinite { body } => {
                write!(w, "{{\"node\":\"InfiniteForStatement\",")?;
                write_span(w, statement.span)?;
                write!(w, ",\"body\":")?;
                dump_checked_block(w, program, body)?;
                write!(w, "}}")
            }
            CheckedForKind::WithCondition { condition, body } => {
                write!(w, "{{\"node\":\"ForWithConditionStatement\",")?;
                write_span(w, statement.span)?;
                write!(w, ",\"condition\":")?;
                dump_checked_expression(w, program, condition)?;
                write!(w, ",\"body\":")?;
                dump_checked_block(w, program, body)?;
                write!(w, "}}")
            }
            CheckedForKind::WithRange {
                variable_id,
                iterable,
                body,
            } => {
                write!(w, "{{\"node\":\"ForWithRangeStatement\",")?;
                write_span(w, statement.span)?;
                write!(w, ",\"variable\":")?;
                dump_variable(w, program, *variable_id)?;
                write!(w, ",\"iterable\":")?;
                dump_checked_expression(w, program, iterable)?;
                write!(w, ",\"body\":")?;
                dump_checked_block(w, program, body)?;
                write!(w, "}}")
            }
        },
    }
}

fn dump_checked_expression(
    w: &mut impl Write,
    program: &CheckedProgram<'_>,
    expr: &CheckedExpr<'_>,
) -> io::Result<()> {
    macro_rules! head {
        ($node:literal) => {{
            write!(w, concat!("{{\"node\":\"", $node, "\",\"type\":"))?;
            dump_type(w, program, expr.type_id)?;
            write!(w, ",")?;
            write_span(w, expr.span)?;
        }};
    }

    match &expr.kind {
        CheckedExprKind::IntegerLiteral(literal) => {
            head!("IntegerLiteral");
            write!(w, ",\"value\":")?;
            write_json_string(w, literal.digits)?;
            write!(w, ",\"suffix\":")?;
            write_json_string(w, literal.suffix)?;
            write!(w, "}}")
        }
        CheckedExprKind::CharLiteral(lexeme) => {
            head!("CharLiteral");
            write!(w, ",\"value\":")?;
            write_json_string(w, lexeme)?;
            write!(w, "}}")
        }
        CheckedExprKind::BooleanLiteral(value) => {
            head!("BooleanLiteral");
            write!(w, ",\"value\":{value}}}")
        }
        CheckedExprKind::Variable(variable_id) => {
            head!("Identifier");
            write!(w, ",\"variable\":")?;
            dump_variable(w, program, *variable_id)?;
            write!(w, "}}")
        }
        CheckedExprKind::Parenthesized(inner) => {
            head!("ParenthesizedExpression");
            write!(w, ",\"expression\":")?;
            dump_checked_expression(w, program, inner)?;
            write!(w, "}}")
        }
        CheckedExprKind::Binary { op, lhs, rhs } => {
            head!("BinaryExpression");
            write!(w, ",\"operator\":\"{op:?}\",\"lhs\":")?;
            dump_checked_expression(w, program, lhs)?;
            write!(w, ",\"rhs\":")?;
            dump_checked_expression(w, program, rhs)?;
            write!(w, "}}")
        }
        CheckedExprKind::Unary { op, operand } => {
            head!("UnaryExpression");
            write!(w, ",\"operator\":\"{op:?}\",\"operand\":")?;
            dump_checked_expression(w, program, operand)?;
            write!(w, "}}")
        }
        CheckedExprKind::Assignment { op, lhs, rhs } => {
            head!("AssignmentExpression");
            write!(w, ",\"operator\":\"{op:?}\",\"lhs\":")?;
            dump_checked_expression(w, program, lhs)?;
            write!(w, ",\"rhs\":")?;
            dump_checked_expression(w, program, rhs)?;
            write!(w, "}}")
        }
        CheckedExprKind::Update {
            op,
            operand,
            is_prefix,
        } => {
            head!("UpdateExpression");
            write!(
                w,
                ",\"operator\":\"{op:?}\",\"is_prefixed\":{is_prefix},\"operand\":"
            )?;
            dump_checked_expression(w, program, operand)?;
            write!(w, "}}")
        }
        CheckedExprKind::PointerDereference(operand) => {
            head!("PointerDereferenceExpression");
            write!(w, ",\"operand\":")?;
            dump_checked_expression(w, program, operand)?;
            write!(w, "}}")
        }
        CheckedExprKind::AddressOf(operand) => {
            head!("AddressOfExpression");
            write!(w, ",\"operand\":")?;
            dump_checked_expression(w, program, operand)?;
            write!(w, "}}")
        }
        CheckedExprKind::Range {
            start,
            end,
            is_inclusive,
        } => {
            head!("RangeExpression");
            write!(w, ",\"inclusive\":{is_inclusive},\"start\":")?;
            dump_checked_expression(w, program, start)?;
            write!(w, ",\"end\":")?;
            dump_checked_expression(w, program, end)?;
            write!(w, "}}")
        }
        CheckedExprKind::Block(block) => dump_checked_block(w, program, block),
        CheckedExprKind::If {
            condition,
            then_block,
            else_branch,
        } => {
            head!("IfExpression");
            write!(w, ",\"condition\":")?;
            dump_checked_expression(w, program, condition)?;
            write!(w, ",\"then\":")?;
            dump_checked_block(w, program, then_block)?;
            write!(w, ",\"else\":")?;
            match else_branch {
                Some(branch) => dump_checked_expression(w, program, branch)?,
                None => write!(w, "null")?,
            }
            write!(w, "}}")
        }
        CheckedExprKind::Call {
            function_id,
            arguments,
        } => {
            head!("FunctionCallExpression");
            write!(w, ",\"function\":")?;
            write_json_string(w, program.get_function(*function_id).name)?;
            write!(w, ",\"arguments\":[")?;
            for (index, argument) in arguments.iter().enumerate() {
                if index > 0 {
                    write!(w, ",")?;
                }
                dump_checked_argument(w, program, argument)?;
            }
            write!(w, "]}}")
        }
        CheckedExprKind::ArrayLiteral(elements) => {
            head!("ArrayExpression");
            write!(w, ",\"elements\":[")?;
            for (index, element) in elements.iter().enumerate() {
                if index > 0 {
                    write!(w, ",")?;
                }
                dump_checked_expression(w, program, element)?;
            }
            write!(w, "]}}")
        }
        CheckedExprKind::ArraySubscript { array, index } => {
            head!("ArraySubscriptExpression");
            write!(w, ",\"array\":")?;
            dump_checked_expression(w, program, array)?;
            write!(w, ",\"index\":")?;
            dump_checked_expression(w, program, index)?;
            write!(w, "}}")
        }
    }
}

fn dump_checked_argument(
    w: &mut impl Write,
    program: &CheckedProgram<'_>,
    argument: &CheckedArgument<'_>,
) -> io::Result<()> {
    write!(w, "{{\"name\":")?;
    match argument.name {
        Some(name) => write_json_string(w, name)?,
        None => write!(w, "null")?,
    }
    write!(w, ",\"value\":")?;
    dump_checked_expression(w, program, &argument.value)?;
    write!(w, "}}")
}

#[cfg(test)]
mod tests {
    use crate::util::test_utils::pipeline_tests;

    pipeline_tests!(
        use parser;

        fn parser_dumps_a_minimal_function() {
            let source = "fn f(): i32 { 1 }";
            let json_ok = r#"{"node":"Program","span":[0,17],"functions":[{"node":"FunctionDeclaration","span":[0,17],"name":"f","parameters":[],"return_type":{"name":"i32","mutable":false},"body":{"node":"BlockExpression","span":[12,17],"statements":[{"node":"ExpressionStatement","span":[14,15],"ends_with_semicolon":false,"expression":{"node":"IntegerLiteral","span":[14,15],"value":"1","radix":"decimal","suffix":""}}]}}]}"#;
        }

        fn parser_dump_keeps_precedence_shape() {
            let source = "fn f(): i32 { 1 + 2 * 3 }";
            let json_ok = r#"{"node":"Program","span":[0,25],"functions":[{"node":"FunctionDeclaration","span":[0,25],"name":"f","parameters":[],"return_type":{"name":"i32","mutable":false},"body":{"node":"BlockExpression","span":[12,25],"statements":[{"node":"ExpressionStatement","span":[14,23],"ends_with_semicolon":false,"expression":{"node":"BinaryExpression","span":[14,23],"operator":"Addition","lhs":{"node":"IntegerLiteral","span":[14,15],"value":"1","radix":"decimal","suffix":""},"rhs":{"node":"BinaryExpression","span":[18,23],"operator":"Multiplication","lhs":{"node":"IntegerLiteral","span":[18,19],"value":"2","radix":"decimal","suffix":""},"rhs":{"node":"IntegerLiteral","span":[22,23],"value":"3","radix":"decimal","suffix":""}}}}]}}]}"#;
        }

        fn parser_reports_missing_semicolons() {
            let source = "fn f(): void { 1 2 }";
            let expected_error = "Expected ';', got integer literal!";
        }
    );

    pipeline_tests!(
        use checker;

        fn checker_dump_annotates_types_and_variables() {
            let source = "fn f(): i32 { var x: i32 = 1; x }";
            let json_ok = r#"{"node":"Program","span":[0,33],"functions":[{"node":"Function","span":[0,33],"name":"f","parameters":[],"return_type":"i32","body":{"node":"BlockExpression","type":"i32","span":[12,33],"contains_return_statement":false,"statements":[{"node":"VariableDeclarationStatement","span":[14,29],"variable":{"name":"x","type":"i32","declaration_span":[18,19]},"initializer":{"node":"IntegerLiteral","type":"i32","span":[27,28],"value":"1","suffix":""}},{"node":"ExpressionStatement","type":"i32","span":[30,31],"ends_with_semicolon":false,"expression":{"node":"Identifier","type":"i32","span":[30,31],"variable":{"name":"x","type":"i32","declaration_span":[18,19]}}}]}}]}"#;
        }

        fn checker_reports_signedness_mismatches() {
            let source = "fn f(): void { var x: u32 = 1; }";
            let expected_error = "Variable type doesn't match expression type";
        }
    );
}
