use std::mem;

use crate::{
    ast::{
        self, ArraySize, AssignmentOperator, BinaryOperator, Block, Expr, ExprKind, ForKind,
        Stmt, StmtKind, TypeExpr, TypeExprKind, UnaryOperator,
    },
    checked::{
        CheckedArgument, CheckedBlock, CheckedExpr, CheckedExprKind, CheckedForKind,
        CheckedFunction, CheckedParameter, CheckedProgram, CheckedStmt, CheckedStmtKind,
        ScopeId, Variable, VariableId,
    },
    error::{Error, Result},
    token::Span,
    types::{PointerKind, Type, TypeId, TypeKind},
};

/// Checks an untyped program, producing the checked program or the first
/// error encountered.
pub fn check<'src>(program: &ast::Program<'src>) -> Result<CheckedProgram<'src>> {
    Checker::new().check(program)
}

/// The Mica type checker.
///
/// Functions are checked in source order; each becomes visible to the
/// functions after it, so forward references (and self references) resolve
/// to "Unknown function".
pub struct Checker<'src> {
    program: CheckedProgram<'src>,
    /// Conservative contains-return flag per scope, parallel to the scope
    /// table. Set along the whole chain whenever a return is checked.
    scope_return_flags: Vec<bool>,
    current_scope: Option<ScopeId>,
    expected_return_type_id: TypeId,
}

impl<'src> Checker<'src> {
    pub fn new() -> Checker<'src> {
        Checker {
            program: CheckedProgram::new(),
            scope_return_flags: Vec::new(),
            current_scope: None,
            expected_return_type_id: TypeId::VOID,
        }
    }

    pub fn check(mut self, program: &ast::Program<'src>) -> Result<CheckedProgram<'src>> {
        for function in &program.functions {
            let checked = self.check_function_declaration(function)?;
            self.program.add_function(checked);
        }
        self.program.span = program.span;
        Ok(self.program)
    }

    fn check_function_declaration(
        &mut self,
        function: &ast::FunctionDeclaration<'src>,
    ) -> Result<CheckedFunction<'src>> {
        if self.program.find_function(function.name.name).is_some() {
            return Err(Error::new("Function already declared", function.name.span));
        }

        let return_type_id = self.check_type(&function.return_type)?;

        let scope = self.create_scope(None);
        let old_scope = mem::replace(&mut self.current_scope, Some(scope));
        let old_expected = mem::replace(&mut self.expected_return_type_id, return_type_id);

        let result = self.check_function_body(function, scope, return_type_id);

        self.current_scope = old_scope;
        self.expected_return_type_id = old_expected;
        result
    }

    fn check_function_body(
        &mut self,
        function: &ast::FunctionDeclaration<'src>,
        scope: ScopeId,
        return_type_id: TypeId,
    ) -> Result<CheckedFunction<'src>> {
        let mut parameters = Vec::with_capacity(function.parameters.len());
        for parameter in &function.parameters {
            let type_id = self.check_type(&parameter.ty)?;
            if self.program.get_type(type_id).kind == TypeKind::Void {
                return Err(Error::new(
                    "Function parameter cannot have void type",
                    parameter.ty.span,
                ));
            }
            let variable_id = self.define_variable(Variable {
                type_id,
                name: parameter.name.name,
                declaration_span: parameter.name.span,
                owner_scope_id: scope,
            })?;
            parameters.push(CheckedParameter {
                variable_id,
                is_anonymous: parameter.is_anonymous,
            });
        }

        let body = self.check_block_with_scope(&function.body, scope)?;

        if !body.contains_return_statement
            && !self.are_types_compatible_for_assignment(return_type_id, body.type_id)
        {
            return Err(Error::new(
                "Incompatible return types",
                function.return_type.span,
            ));
        }

        Ok(CheckedFunction {
            name: function.name.name,
            parameters,
            return_type_id,
            body: Some(body),
            span: function.span,
        })
    }

    fn check_type(&mut self, type_expr: &TypeExpr<'src>) -> Result<TypeId> {
        let kind = match &type_expr.kind {
            TypeExprKind::Named(name) => match builtin_type_kind(name) {
                Some(kind) => kind,
                None => return Err(Error::new("Unknown type", type_expr.span)),
            },
            TypeExprKind::Pointer { kind, inner } => {
                let inner = self.check_type(inner)?;
                TypeKind::Pointer { kind: *kind, inner }
            }
            TypeExprKind::Array { size, inner } => {
                let size = check_array_size(size)?;
                let inner = self.check_type(inner)?;
                TypeKind::Array { size, inner }
            }
            TypeExprKind::Slice { inner } => {
                let inner = self.check_type(inner)?;
                TypeKind::Slice { inner }
            }
        };
        Ok(self
            .program
            .find_or_add_type(Type::new(kind).with_mutability(type_expr.is_mutable)))
    }

    fn check_statement(&mut self, statement: &Stmt<'src>) -> Result<CheckedStmt<'src>> {
        match &statement.kind {
            StmtKind::Expression {
                expr,
                ends_with_semicolon,
            } => {
                let expr = self.check_expression(expr, None)?;
                let type_id = if *ends_with_semicolon {
                    TypeId::VOID
                } else {
                    expr.type_id
                };
                Ok(CheckedStmt {
                    kind: CheckedStmtKind::Expression {
                        expr,
                        ends_with_semicolon: *ends_with_semicolon,
                    },
                    type_id,
                    span: statement.span,
                })
            }
            StmtKind::VariableDeclaration {
                is_mutable,
                name,
                ty,
                initializer,
            } => self.check_variable_declaration(
                statement.span,
                *is_mutable,
                name,
                ty.as_ref(),
                initializer.as_ref(),
            ),
            StmtKind::Return(expr) => {
                let expr = match expr {
                    Some(expr) => Some(self.check_expression(expr, None)?),
                    None => None,
                };
                let returned_type_id = expr.as_ref().map_or(TypeId::VOID, |expr| expr.type_id);
                if !self.are_types_compatible_for_assignment(
                    self.expected_return_type_id,
                    returned_type_id,
                ) {
                    return Err(Error::new("Incompatible return types", statement.span));
                }
                self.mark_return_in_scope_chain();
                Ok(CheckedStmt {
                    kind: CheckedStmtKind::Return(expr),
                    type_id: TypeId::VOID,
                    span: statement.span,
                })
            }
            StmtKind::For(kind) => {
                let kind = self.check_for_statement(kind)?;
                Ok(CheckedStmt {
                    kind: CheckedStmtKind::For(kind),
                    type_id: TypeId::VOID,
                    span: statement.span,
                })
            }
        }
    }

    fn check_variable_declaration(
        &mut self,
        span: Span,
        is_mutable: bool,
        name: &ast::Ident<'src>,
        ty: Option<&TypeExpr<'src>>,
        initializer: Option<&Expr<'src>>,
    ) -> Result<CheckedStmt<'src>> {
        let declared_type_id = match ty {
            Some(type_expr) => {
                let mut type_id = self.check_type(type_expr)?;
                if self.program.get_type(type_id).kind == TypeKind::Void {
                    return Err(Error::new("Variable type cannot be void", type_expr.span));
                }
                if is_mutable {
                    type_id = self.program.apply_mutability(type_id, true);
                }
                Some(type_id)
            }
            None => None,
        };

        let initializer = match initializer {
            Some(expr) => Some(self.check_expression(expr, declared_type_id)?),
            None => None,
        };

        let variable_type_id = match (declared_type_id, &initializer) {
            (Some(declared), Some(init)) => {
                if !self.are_types_compatible_for_assignment(declared, init.type_id) {
                    return Err(Error::new(
                        "Variable type doesn't match expression type",
                        span,
                    ));
                }
                declared
            }
            (Some(declared), None) => declared,
            (None, Some(init)) => {
                if self.program.get_type(init.type_id).kind == TypeKind::Void {
                    return Err(Error::new("Variable type cannot be void", init.span));
                }
                self.program.apply_mutability(init.type_id, is_mutable)
            }
            (None, None) => {
                unreachable!("parser requires a type or an initializer")
            }
        };

        let variable_id = self.define_variable(Variable {
            type_id: variable_type_id,
            name: name.name,
            declaration_span: name.span,
            owner_scope_id: self.scope(),
        })?;

        Ok(CheckedStmt {
            kind: CheckedStmtKind::VariableDeclaration {
                variable_id,
                initializer,
            },
            type_id: TypeId::VOID,
            span,
        })
    }

    fn check_for_statement(&mut self, kind: &ForKind<'src>) -> Result<CheckedForKind<'src>> {
        match kind {
            ForKind::Infinite { body } => {
                let body = self.check_block_in_child_scope(body)?;
                Ok(CheckedForKind::Infinite { body })
            }
            ForKind::WithCondition { condition, body } => {
                let condition = self.check_expression(condition, None)?;
                if self.program.get_type(condition.type_id).kind != TypeKind::Bool {
                    return Err(Error::new(
                        "For condition must be a boolean expression",
                        condition.span,
                    ));
                }
                let body = self.check_block_in_child_scope(body)?;
                Ok(CheckedForKind::WithCondition { condition, body })
            }
            ForKind::WithRange {
                variable,
                iterable,
                body,
            } => {
                let iterable = self.check_expression(iterable, None)?;
                let element_type_id = match self.program.get_type(iterable.type_id).kind {
                    TypeKind::Range { element, .. } => element,
                    TypeKind::Array { inner, .. } => inner,
                    TypeKind::Slice { inner } => inner,
                    _ => {
                        return Err(Error::new(
                            "For range must be a range, array or slice",
                            iterable.span,
                        ));
                    }
                };

                let scope = self.create_scope(self.current_scope);
                let variable_id = self.define_variable_in(
                    Variable {
                        type_id: element_type_id,
                        name: variable.name,
                        declaration_span: variable.span,
                        owner_scope_id: scope,
                    },
                    scope,
                )?;
                let body = self.check_block_with_scope(body, scope)?;
                Ok(CheckedForKind::WithRange {
                    variable_id,
                    iterable,
                    body,
                })
            }
        }
    }

    fn check_block_in_child_scope(
        &mut self,
        block: &Block<'src>,
    ) -> Result<CheckedBlock<'src>> {
        let scope = self.create_scope(self.current_scope);
        self.check_block_with_scope(block, scope)
    }

    fn check_block_with_scope(
        &mut self,
        block: &Block<'src>,
        scope: ScopeId,
    ) -> Result<CheckedBlock<'src>> {
        let old_scope = mem::replace(&mut self.current_scope, Some(scope));
        let result = self.check_block_statements(block, scope);
        self.current_scope = old_scope;
        result
    }

    fn check_block_statements(
        &mut self,
        block: &Block<'src>,
        scope: ScopeId,
    ) -> Result<CheckedBlock<'src>> {
        let mut statements = Vec::with_capacity(block.statements.len());
        for statement in &block.statements {
            statements.push(self.check_statement(statement)?);
        }
        let type_id = statements
            .last()
            .map_or(TypeId::VOID, |statement| statement.type_id);
        Ok(CheckedBlock {
            statements,
            scope_id: scope,
            contains_return_statement: self.scope_return_flags[scope.index()],
            type_id,
            span: block.span,
        })
    }

    fn check_expression(
        &mut self,
        expr: &Expr<'src>,
        type_hint: Option<TypeId>,
    ) -> Result<CheckedExpr<'src>> {
        let span = expr.span;
        let (kind, type_id) = match &expr.kind {
            ExprKind::IntegerLiteral(literal) => {
                let type_id = integer_literal_type(literal.suffix, span)?;
                (CheckedExprKind::IntegerLiteral(*literal), type_id)
            }
            ExprKind::CharLiteral(lexeme) => {
                (CheckedExprKind::CharLiteral(*lexeme), TypeId::CHAR)
            }
            ExprKind::BooleanLiteral(value) => {
                (CheckedExprKind::BooleanLiteral(*value), TypeId::BOOL)
            }
            ExprKind::Identifier(name) => {
                let Some(variable_id) = self.program.find_variable(name, self.scope()) else {
                    return Err(Error::new("Unknown identifier", span));
                };
                let type_id = self.program.get_variable(variable_id).type_id;
                (CheckedExprKind::Variable(variable_id), type_id)
            }
            ExprKind::Parenthesized(inner) => {
                let inner = self.check_expression(inner, type_hint)?;
                let type_id = inner.type_id;
                (CheckedExprKind::Parenthesized(Box::new(inner)), type_id)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.check_expression(lhs, None)?;
                let rhs = self.check_expression(rhs, None)?;
                let type_id = self.check_binary_operator(*op, &lhs, &rhs, span)?;
                (
                    CheckedExprKind::Binary {
                        op: *op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    type_id,
                )
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.check_expression(operand, None)?;
                let type_id = match op {
                    UnaryOperator::Positive
                    | UnaryOperator::Negative
                    | UnaryOperator::BitwiseNot => {
                        if !self.program.get_type(operand.type_id).is_integer() {
                            return Err(Error::new(
                                "Unary operator requires integer type",
                                operand.span,
                            ));
                        }
                        operand.type_id
                    }
                    UnaryOperator::LogicalNot => {
                        if self.program.get_type(operand.type_id).kind != TypeKind::Bool {
                            return Err(Error::new(
                                "Unary operator requires boolean type",
                                operand.span,
                            ));
                        }
                        TypeId::BOOL
                    }
                };
                (
                    CheckedExprKind::Unary {
                        op: *op,
                        operand: Box::new(operand),
                    },
                    type_id,
                )
            }
            ExprKind::Assignment { op, lhs, rhs } => {
                let lhs = self.check_expression(lhs, None)?;
                let rhs = self.check_expression(rhs, None)?;
                let type_id = self.check_assignment_operator(*op, &lhs, &rhs, span)?;
                (
                    CheckedExprKind::Assignment {
                        op: *op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    type_id,
                )
            }
            ExprKind::Update {
                op,
                operand,
                is_prefix,
            } => {
                let operand = self.check_expression(operand, None)?;
                let operand_type = self.program.get_type(operand.type_id);
                if !operand_type.is_integer() {
                    return Err(Error::new(
                        "Update operator requires integer type",
                        operand.span,
                    ));
                }
                if !operand_type.is_mutable {
                    return Err(Error::new(
                        "Update operator requires mutable type",
                        operand.span,
                    ));
                }
                let type_id = operand.type_id;
                (
                    CheckedExprKind::Update {
                        op: *op,
                        operand: Box::new(operand),
                        is_prefix: *is_prefix,
                    },
                    type_id,
                )
            }
            ExprKind::PointerDereference(operand) => {
                let operand = self.check_expression(operand, None)?;
                let TypeKind::Pointer { inner, .. } =
                    self.program.get_type(operand.type_id).kind
                else {
                    return Err(Error::new(
                        "Pointer dereference requires pointer type",
                        operand.span,
                    ));
                };
                (
                    CheckedExprKind::PointerDereference(Box::new(operand)),
                    inner,
                )
            }
            ExprKind::AddressOf(operand) => {
                let operand = self.check_expression(operand, None)?;
                let type_id = self.program.find_or_add_type(Type::new(TypeKind::Pointer {
                    kind: PointerKind::Strong,
                    inner: operand.type_id,
                }));
                (CheckedExprKind::AddressOf(Box::new(operand)), type_id)
            }
            ExprKind::Range {
                start,
                end,
                is_inclusive,
            } => {
                let start = self.check_expression(start, None)?;
                let end = self.check_expression(end, None)?;
                if !self.program.get_type(start.type_id).is_integer()
                    || !self.program.get_type(end.type_id).is_integer()
                {
                    return Err(Error::new(
                        "Range start and end types must be integers",
                        span,
                    ));
                }
                let element = self.program.apply_mutability(start.type_id, false);
                let type_id = self.program.find_or_add_type(Type::new(TypeKind::Range {
                    element,
                    is_inclusive: *is_inclusive,
                }));
                (
                    CheckedExprKind::Range {
                        start: Box::new(start),
                        end: Box::new(end),
                        is_inclusive: *is_inclusive,
                    },
                    type_id,
                )
            }
            ExprKind::Block(block) => {
                let block = self.check_block_in_child_scope(block)?;
                let type_id = block.type_id;
                (CheckedExprKind::Block(block), type_id)
            }
            ExprKind::If {
                condition,
                then_block,
                else_branch,
            } => {
                let condition = self.check_expression(condition, None)?;
                if self.program.get_type(condition.type_id).kind != TypeKind::Bool {
                    return Err(Error::new(
                        "If condition must be a boolean expression",
                        condition.span,
                    ));
                }
                let then_block = self.check_block_in_child_scope(then_block)?;
                let else_branch = match else_branch {
                    Some(branch) => {
                        let branch = self.check_expression(branch, None)?;
                        if then_block.type_id != branch.type_id {
                            return Err(Error::new(
                                "If branches must have the same type",
                                span,
                            ));
                        }
                        Some(Box::new(branch))
                    }
                    None => None,
                };
                let type_id = if else_branch.is_some() {
                    then_block.type_id
                } else {
                    TypeId::VOID
                };
                (
                    CheckedExprKind::If {
                        condition: Box::new(condition),
                        then_block,
                        else_branch,
                    },
                    type_id,
                )
            }
            ExprKind::Call { callee, arguments } => {
                return self.check_function_call(callee, arguments, span);
            }
            ExprKind::ArrayLiteral(elements) => {
                return self.check_array_literal(elements, type_hint, span);
            }
            ExprKind::ArraySubscript { array, index } => {
                let array = self.check_expression(array, None)?;
                let index = self.check_expression(index, None)?;
                let element = match self.program.get_type(array.type_id).kind {
                    TypeKind::Array { inner, .. } => inner,
                    TypeKind::Slice { inner } => inner,
                    _ => {
                        return Err(Error::new(
                            "Array subscript requires array or slice type",
                            array.span,
                        ));
                    }
                };
                if !self.program.get_type(index.type_id).is_integer() {
                    return Err(Error::new(
                        "Array subscript requires integer type",
                        index.span,
                    ));
                }
                (
                    CheckedExprKind::ArraySubscript {
                        array: Box::new(array),
                        index: Box::new(index),
                    },
                    element,
                )
            }
        };

        Ok(CheckedExpr {
            kind,
            type_id,
            span,
        })
    }

    fn check_binary_operator(
        &mut self,
        op: BinaryOperator,
        lhs: &CheckedExpr<'src>,
        rhs: &CheckedExpr<'src>,
        span: Span,
    ) -> Result<TypeId> {
        use BinaryOperator::*;
        let lhs_type = *self.program.get_type(lhs.type_id);
        let rhs_type = *self.program.get_type(rhs.type_id);

        match op {
            LogicalAnd | LogicalOr => {
                if lhs_type.kind != TypeKind::Bool {
                    return Err(Error::new(
                        "Logical operator requires boolean type",
                        lhs.span,
                    ));
                }
                if rhs_type.kind != TypeKind::Bool {
                    return Err(Error::new(
                        "Logical operator requires boolean type",
                        rhs.span,
                    ));
                }
                Ok(TypeId::BOOL)
            }
            BitwiseLeftShift | BitwiseRightShift => {
                if !lhs_type.is_integer() || !rhs_type.is_integer() {
                    return Err(Error::new(
                        "Incompatible types for binary operation",
                        span,
                    ));
                }
                Ok(self.program.apply_mutability(lhs.type_id, false))
            }
            Addition | Subtraction | Multiplication | Division | Modulo | BitwiseAnd
            | BitwiseXor | BitwiseOr => {
                // No implicit widening: both operands must already agree.
                if !lhs_type.is_integer()
                    || !rhs_type.is_integer()
                    || lhs_type.is_signed() != rhs_type.is_signed()
                    || lhs_type.width() != rhs_type.width()
                {
                    return Err(Error::new(
                        "Incompatible types for binary operation",
                        span,
                    ));
                }
                Ok(self.program.apply_mutability(lhs.type_id, false))
            }
            LessThan | GreaterThan | LessThanOrEqualTo | GreaterThanOrEqualTo => {
                if lhs_type.is_integer() && rhs_type.is_integer() {
                    if lhs_type.is_signed() != rhs_type.is_signed() {
                        return Err(Error::new(
                            "Comparison between types of different signedness",
                            span,
                        ));
                    }
                    return Ok(TypeId::BOOL);
                }
                if lhs_type.kind == TypeKind::Char && rhs_type.kind == TypeKind::Char {
                    return Ok(TypeId::BOOL);
                }
                Err(Error::new("Incompatible types for binary operation", span))
            }
            EqualTo | NotEqualTo => {
                if lhs_type.is_integer() && rhs_type.is_integer() {
                    if lhs_type.is_signed() != rhs_type.is_signed() {
                        return Err(Error::new(
                            "Comparison between types of different signedness",
                            span,
                        ));
                    }
                    return Ok(TypeId::BOOL);
                }
                if lhs_type.kind == rhs_type.kind {
                    return Ok(TypeId::BOOL);
                }
                Err(Error::new("Incompatible types for binary operation", span))
            }
        }
    }

    fn check_assignment_operator(
        &mut self,
        op: AssignmentOperator,
        lhs: &CheckedExpr<'src>,
        rhs: &CheckedExpr<'src>,
        span: Span,
    ) -> Result<TypeId> {
        use AssignmentOperator::*;
        if !self.program.get_type(lhs.type_id).is_mutable {
            return Err(Error::new("Cannot assign to immutable value", lhs.span));
        }

        let lhs_type = *self.program.get_type(lhs.type_id);
        let rhs_type = *self.program.get_type(rhs.type_id);
        match op {
            Assignment => {
                if !self.are_types_compatible_for_assignment(lhs.type_id, rhs.type_id) {
                    return Err(Error::new("Incompatible types for assignment", span));
                }
            }
            AdditionAssignment | SubtractionAssignment | MultiplicationAssignment
            | DivisionAssignment | ModuloAssignment | BitwiseAndAssignment
            | BitwiseXorAssignment | BitwiseOrAssignment => {
                if !lhs_type.is_integer()
                    || !rhs_type.is_integer()
                    || lhs_type.is_signed() != rhs_type.is_signed()
                    || lhs_type.width() != rhs_type.width()
                {
                    return Err(Error::new("Incompatible types for assignment", span));
                }
            }
            BitwiseLeftShiftAssignment | BitwiseRightShiftAssignment => {
                if !lhs_type.is_integer() || !rhs_type.is_integer() {
                    return Err(Error::new(
                        "Incompatible types for binary operation",
                        span,
                    ));
                }
            }
            LogicalAndAssignment | LogicalOrAssignment => {
                if lhs_type.kind != TypeKind::Bool || rhs_type.kind != TypeKind::Bool {
                    return Err(Error::new(
                        "Incompatible types for binary operation",
                        span,
                    ));
                }
            }
        }
        Ok(lhs.type_id)
    }

    fn check_function_call(
        &mut self,
        callee: &ast::Ident<'src>,
        arguments: &[ast::Argument<'src>],
        span: Span,
    ) -> Result<CheckedExpr<'src>> {
        let Some(function_id) = self.program.find_function(callee.name) else {
            return Err(Error::new("Unknown function", callee.span));
        };

        let function = self.program.get_function(function_id);
        let is_builtin = function.is_builtin();
        let return_type_id = function.return_type_id;
        let parameters: Vec<(TypeId, &'src str, bool)> = function
            .parameters
            .iter()
            .map(|parameter| {
                let variable = self.program.get_variable(parameter.variable_id);
                (variable.type_id, variable.name, parameter.is_anonymous)
            })
            .collect();

        let mut checked_arguments = Vec::with_capacity(arguments.len());

        if is_builtin {
            // The prelude's print is generic over its single anon parameter.
            if arguments.len() != 1 {
                return Err(Error::new(
                    "Function call has wrong number of parameters",
                    span,
                ));
            }
            let value = self.check_expression(&arguments[0].value, None)?;
            if self.program.get_type(value.type_id).kind == TypeKind::Void {
                return Err(Error::new(
                    "Function call has wrong parameter type",
                    value.span,
                ));
            }
            checked_arguments.push(CheckedArgument {
                name: arguments[0].name.map(|ident| ident.name),
                value,
            });
        } else {
            if parameters.len() != arguments.len() {
                return Err(Error::new(
                    "Function call has wrong number of parameters",
                    span,
                ));
            }

            for (argument, (parameter_type_id, parameter_name, is_anonymous)) in
                arguments.iter().zip(&parameters)
            {
                let value = self.check_expression(&argument.value, None)?;
                if !self.are_types_compatible_for_assignment(*parameter_type_id, value.type_id)
                {
                    return Err(Error::new(
                        "Function call has wrong parameter type",
                        value.span,
                    ));
                }
                if !is_anonymous
                    && argument.name.map(|ident| ident.name) != Some(*parameter_name)
                {
                    let error_span = argument.name.map_or(value.span, |ident| ident.span);
                    return Err(Error::new(
                        "Function call has wrong parameter name",
                        error_span,
                    ));
                }
                checked_arguments.push(CheckedArgument {
                    name: argument.name.map(|ident| ident.name),
                    value,
                });
            }
        }

        Ok(CheckedExpr {
            kind: CheckedExprKind::Call {
                function_id,
                arguments: checked_arguments,
            },
            type_id: return_type_id,
            span,
        })
    }

    fn check_array_literal(
        &mut self,
        elements: &[Expr<'src>],
        type_hint: Option<TypeId>,
        span: Span,
    ) -> Result<CheckedExpr<'src>> {
        let hint_element = type_hint.and_then(|id| match self.program.get_type(id).kind {
            TypeKind::Array { inner, .. } => Some(inner),
            _ => None,
        });

        let mut checked_elements = Vec::with_capacity(elements.len());
        let element_type_id = if elements.is_empty() {
            let Some(element) = hint_element else {
                return Err(Error::new(
                    "Cannot infer type of empty array literal",
                    span,
                ));
            };
            element
        } else {
            let first = self.check_expression(&elements[0], hint_element)?;
            let element_type_id = first.type_id;
            checked_elements.push(first);
            for element in &elements[1..] {
                let element = self.check_expression(element, hint_element)?;
                if element.type_id != element_type_id {
                    return Err(Error::new(
                        "Array elements must have the same type",
                        span,
                    ));
                }
                checked_elements.push(element);
            }
            element_type_id
        };

        let type_id = self.program.find_or_add_type(Type::new(TypeKind::Array {
            size: checked_elements.len(),
            inner: element_type_id,
        }));
        Ok(CheckedExpr {
            kind: CheckedExprKind::ArrayLiteral(checked_elements),
            type_id,
            span,
        })
    }

    /// "A value of type `rhs` may be stored into a location of type `lhs`."
    pub(crate) fn are_types_compatible_for_assignment(
        &self,
        lhs: TypeId,
        rhs: TypeId,
    ) -> bool {
        let lhs_type = self.program.get_type(lhs);
        let rhs_type = self.program.get_type(rhs);

        if lhs_type.is_integer() && rhs_type.is_integer() {
            return if lhs_type.is_signed() == rhs_type.is_signed() {
                lhs_type.width() >= rhs_type.width()
            } else {
                // Signed can absorb a strictly narrower unsigned value.
                lhs_type.is_signed() && lhs_type.width() > rhs_type.width()
            };
        }

        match (lhs_type.kind, rhs_type.kind) {
            (TypeKind::Void, TypeKind::Void) => true,
            (TypeKind::Char, TypeKind::Char) => true,
            (TypeKind::Bool, TypeKind::Bool) => true,
            (
                TypeKind::Pointer {
                    kind: lhs_kind,
                    inner: lhs_inner,
                },
                TypeKind::Pointer {
                    kind: rhs_kind,
                    inner: rhs_inner,
                },
            ) => {
                if lhs_kind == PointerKind::Strong && rhs_kind != PointerKind::Strong {
                    return false;
                }
                self.are_types_compatible_for_assignment(lhs_inner, rhs_inner)
            }
            (
                TypeKind::Array {
                    size: lhs_size,
                    inner: lhs_inner,
                },
                TypeKind::Array {
                    size: rhs_size,
                    inner: rhs_inner,
                },
            ) => lhs_size == rhs_size && lhs_inner == rhs_inner,
            // Slicing an array is implicit.
            (
                TypeKind::Slice { inner: lhs_inner },
                TypeKind::Array {
                    inner: rhs_inner, ..
                }
                | TypeKind::Slice { inner: rhs_inner },
            ) => lhs_inner == rhs_inner,
            _ => false,
        }
    }

    fn create_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let scope = self.program.create_scope(parent);
        self.scope_return_flags.push(false);
        scope
    }

    fn scope(&self) -> ScopeId {
        self.current_scope
            .expect("the checker is always inside a function scope")
    }

    fn define_variable(&mut self, variable: Variable<'src>) -> Result<VariableId> {
        self.define_variable_in(variable, self.scope())
    }

    /// Defines a variable, rejecting both duplicates and shadowing: the name
    /// must be unbound along the whole scope chain.
    fn define_variable_in(
        &mut self,
        variable: Variable<'src>,
        scope: ScopeId,
    ) -> Result<VariableId> {
        if self
            .program
            .find_variable(variable.name, scope)
            .is_some()
        {
            return Err(Error::new(
                "Variable already declared",
                variable.declaration_span,
            ));
        }
        Ok(self.program.define_variable(variable))
    }

    fn mark_return_in_scope_chain(&mut self) {
        let mut current = self.current_scope;
        while let Some(scope) = current {
            self.scope_return_flags[scope.index()] = true;
            current = self.program.get_scope(scope).parent;
        }
    }
}

impl Default for Checker<'_> {
    fn default() -> Self {
        Checker::new()
    }
}

fn builtin_type_kind(name: &str) -> Option<TypeKind> {
    Some(match name {
        "void" => TypeKind::Void,
        "u8" => TypeKind::U8,
        "u16" => TypeKind::U16,
        "u32" => TypeKind::U32,
        "u64" => TypeKind::U64,
        "usize" => TypeKind::Usize,
        "i8" => TypeKind::I8,
        "i16" => TypeKind::I16,
        "i32" => TypeKind::I32,
        "i64" => TypeKind::I64,
        "isize" => TypeKind::Isize,
        "bool" => TypeKind::Bool,
        "char" => TypeKind::Char,
        _ => return None,
    })
}

fn check_array_size(size: &ArraySize<'_>) -> Result<usize> {
    usize::from_str_radix(size.literal.digits, size.literal.radix.base())
        .map_err(|_| Error::new("Invalid array size", size.span))
}

fn integer_literal_type(suffix: &str, span: Span) -> Result<TypeId> {
    Ok(match suffix {
        "" => TypeId::I32,
        "u8" => TypeId::U8,
        "u16" => TypeId::U16,
        "u32" => TypeId::U32,
        "u64" => TypeId::U64,
        "usize" => TypeId::USIZE,
        "i8" => TypeId::I8,
        "i16" => TypeId::I16,
        "i32" => TypeId::I32,
        "i64" => TypeId::I64,
        "isize" => TypeId::ISIZE,
        _ => return Err(Error::new("Invalid suffix for integer literal", span)),
    })
}
