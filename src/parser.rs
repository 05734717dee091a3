use std::mem;

use crate::{
    ast::{
        Argument, ArraySize, AssignmentOperator, BinaryOperator, Block, Expr, ExprKind,
        ForKind, FunctionDeclaration, Ident, IntegerLiteral, Parameter, Program, Radix, Stmt,
        StmtKind, TypeExpr, TypeExprKind, UnaryOperator, UpdateOperator,
    },
    error::{Error, Result},
    lexer::Lexer,
    token::{Span, Token, TokenKind},
    types::PointerKind,
};

/// Context-sensitive parsing restrictions, carried as a bitset.
pub mod restrictions {
    pub const NONE: u8 = 0;

    /// Set in statement position: a primary that carries its own braces
    /// (block, if) terminates the precedence climb instead of binding to a
    /// following binary operator, so `if (c) { .. } -x;` cannot silently
    /// parse as a subtraction.
    pub const NO_EXPRESSIONS_WITH_BLOCKS: u8 = 1 << 0;
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Associativity {
    Left,
    Right,
}

/// Binding strength of prefix operators; postfix call/index/update bind
/// tighter, every secondary operator binds looser.
const PREFIX_PRECEDENCE: u8 = 13;

/// Parses a whole compilation unit.
pub fn parse_program(src: &str) -> Result<Program<'_>> {
    Parser::new(src)?.parse_program()
}

/// Parses a single expression spanning the whole input. Test convenience.
pub fn parse_expression(src: &str) -> Result<Expr<'_>> {
    let mut parser = Parser::new(src)?;
    let expr = parser.parse_expression()?;
    parser.consume(TokenKind::Eof)?;
    Ok(expr)
}

/// The Mica parser: recursive descent for statements and declarations,
/// precedence climbing for expressions, one token of lookahead over the
/// streaming lexer.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token<'src>,
    restrictions: u8,
}

impl<'src> Parser<'src> {
    pub fn new(src: &'src str) -> Result<Parser<'src>> {
        let mut lexer = Lexer::new(src);
        let current = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current,
            restrictions: restrictions::NONE,
        })
    }

    pub fn parse_program(&mut self) -> Result<Program<'src>> {
        let mut functions = Vec::with_capacity(4);
        let mut span = Span::new(0, 0);
        while self.current.kind != TokenKind::Eof {
            let function = self.parse_function_declaration()?;
            span = Span::merge(span, function.span);
            functions.push(function);
        }
        Ok(Program { functions, span })
    }

    fn parse_function_declaration(&mut self) -> Result<FunctionDeclaration<'src>> {
        let start = self.consume(TokenKind::Fn)?.span();
        let name = self.parse_identifier()?;
        let parameters = self.parse_function_parameters()?;
        self.consume(TokenKind::Colon)?;
        let return_type = self.parse_type(false)?;
        let body = self.parse_block()?;
        let span = Span::merge(start, body.span);
        Ok(FunctionDeclaration {
            name,
            parameters,
            return_type,
            body,
            span,
        })
    }

    fn parse_function_parameters(&mut self) -> Result<Vec<Parameter<'src>>> {
        self.consume(TokenKind::LParen)?;
        let mut parameters = Vec::new();
        if self.current.kind != TokenKind::RParen {
            loop {
                let is_anonymous = if self.current.kind == TokenKind::Anon {
                    self.advance()?;
                    true
                } else {
                    false
                };
                let name = self.parse_identifier()?;
                self.consume(TokenKind::Colon)?;
                let ty = self.parse_type(false)?;
                parameters.push(Parameter {
                    name,
                    ty,
                    is_anonymous,
                });
                if self.current.kind != TokenKind::Comma {
                    break;
                }
                self.advance()?;
            }
        }
        self.consume(TokenKind::RParen)?;
        Ok(parameters)
    }

    /// `allow_top_level_mut` is false on function return and parameter types;
    /// inner positions (`*mut i32`) always accept `mut`.
    fn parse_type(&mut self, allow_top_level_mut: bool) -> Result<TypeExpr<'src>> {
        let start = self.current.span();
        let is_mutable = if self.current.kind == TokenKind::Mut {
            if !allow_top_level_mut {
                return Err(Error::new("mut is not allowed here", self.current.span()));
            }
            self.advance()?;
            true
        } else {
            false
        };

        let (kind, end) = match self.current.kind {
            TokenKind::Star => {
                self.advance()?;
                let inner = self.parse_type(true)?;
                let end = inner.span;
                (
                    TypeExprKind::Pointer {
                        kind: PointerKind::Weak,
                        inner: Box::new(inner),
                    },
                    end,
                )
            }
            TokenKind::Caret => {
                self.advance()?;
                let inner = self.parse_type(true)?;
                let end = inner.span;
                (
                    TypeExprKind::Pointer {
                        kind: PointerKind::Strong,
                        inner: Box::new(inner),
                    },
                    end,
                )
            }
            TokenKind::LBracket => {
                self.advance()?;
                if self.current.kind == TokenKind::RBracket {
                    self.advance()?;
                    let inner = self.parse_type(true)?;
                    let end = inner.span;
                    (
                        TypeExprKind::Slice {
                            inner: Box::new(inner),
                        },
                        end,
                    )
                } else if self.current.kind.is_integer_literal() {
                    let token = self.advance()?;
                    let size = ArraySize {
                        literal: split_integer_literal(&token),
                        span: token.span(),
                    };
                    self.consume(TokenKind::RBracket)?;
                    let inner = self.parse_type(true)?;
                    let end = inner.span;
                    (
                        TypeExprKind::Array {
                            size,
                            inner: Box::new(inner),
                        },
                        end,
                    )
                } else {
                    return Err(self.unexpected("integer literal or ']'"));
                }
            }
            kind if kind.is_type_keyword() || kind == TokenKind::Identifier => {
                let token = self.advance()?;
                (TypeExprKind::Named(token.lexeme), token.span())
            }
            _ => return Err(self.unexpected("type")),
        };

        Ok(TypeExpr {
            kind,
            is_mutable,
            span: Span::merge(start, end),
        })
    }

    fn parse_block(&mut self) -> Result<Block<'src>> {
        let start = self.consume(TokenKind::LBrace)?.span();
        let mut statements = Vec::new();
        while self.current.kind != TokenKind::RBrace {
            if self.current.kind == TokenKind::Eof {
                return Err(self.unexpected("'}'"));
            }
            statements.push(self.parse_statement()?);
        }
        let end = self.consume(TokenKind::RBrace)?.span();
        Ok(Block {
            statements,
            span: Span::merge(start, end),
        })
    }

    fn parse_statement(&mut self) -> Result<Stmt<'src>> {
        match self.current.kind {
            TokenKind::Var => self.parse_variable_declaration(false),
            TokenKind::Mut => self.parse_variable_declaration(true),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt<'src>> {
        let expr = self.parse_restricted_expression(restrictions::NO_EXPRESSIONS_WITH_BLOCKS)?;
        if self.current.kind == TokenKind::Semicolon {
            let end = self.advance()?.span();
            let span = Span::merge(expr.span, end);
            return Ok(Stmt {
                kind: StmtKind::Expression {
                    expr,
                    ends_with_semicolon: true,
                },
                span,
            });
        }
        if expr.has_block() || self.current.kind == TokenKind::RBrace {
            let span = expr.span;
            return Ok(Stmt {
                kind: StmtKind::Expression {
                    expr,
                    ends_with_semicolon: false,
                },
                span,
            });
        }
        Err(self.unexpected("';'"))
    }

    fn parse_variable_declaration(&mut self, is_mutable: bool) -> Result<Stmt<'src>> {
        let start = self.advance()?.span();
        let name = self.parse_identifier()?;

        let mut ty = None;
        let mut initializer = None;
        match self.current.kind {
            TokenKind::Eq => {
                self.advance()?;
                initializer = Some(self.parse_expression()?);
            }
            TokenKind::Colon => {
                self.advance()?;
                ty = Some(self.parse_type(true)?);
                if self.current.kind == TokenKind::Eq {
                    self.advance()?;
                    initializer = Some(self.parse_expression()?);
                }
            }
            _ => return Err(self.unexpected("':' or '='")),
        }

        let end = self.consume(TokenKind::Semicolon)?.span();
        Ok(Stmt {
            kind: StmtKind::VariableDeclaration {
                is_mutable,
                name,
                ty,
                initializer,
            },
            span: Span::merge(start, end),
        })
    }

    fn parse_return_statement(&mut self) -> Result<Stmt<'src>> {
        let start = self.consume(TokenKind::Return)?.span();
        let expr = if self.current.kind == TokenKind::Semicolon {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let end = self.consume(TokenKind::Semicolon)?.span();
        Ok(Stmt {
            kind: StmtKind::Return(expr),
            span: Span::merge(start, end),
        })
    }

    fn parse_for_statement(&mut self) -> Result<Stmt<'src>> {
        let start = self.consume(TokenKind::For)?.span();

        if self.current.kind == TokenKind::LBrace {
            let body = self.parse_block()?;
            let span = Span::merge(start, body.span);
            return Ok(Stmt {
                kind: StmtKind::For(ForKind::Infinite { body }),
                span,
            });
        }

        self.consume(TokenKind::LParen)?;

        // With one token of lookahead, an identifier may open either a
        // for-in loop or an ordinary condition. Consume it, then decide.
        if self.current.kind == TokenKind::Identifier {
            let token = self.advance()?;
            let ident = Ident {
                name: token.lexeme,
                span: token.span(),
            };
            if self.current.kind == TokenKind::In {
                self.advance()?;
                let iterable = self.parse_expression()?;
                self.consume(TokenKind::RParen)?;
                let body = self.parse_block()?;
                let span = Span::merge(start, body.span);
                return Ok(Stmt {
                    kind: StmtKind::For(ForKind::WithRange {
                        variable: ident,
                        iterable,
                        body,
                    }),
                    span,
                });
            }
            let lhs = Expr {
                kind: ExprKind::Identifier(ident.name),
                span: ident.span,
            };
            let condition = self.continue_expression(lhs)?;
            return self.finish_for_with_condition(start, condition);
        }

        let condition = self.parse_expression()?;
        self.finish_for_with_condition(start, condition)
    }

    fn finish_for_with_condition(
        &mut self,
        start: Span,
        condition: Expr<'src>,
    ) -> Result<Stmt<'src>> {
        if self.current.kind == TokenKind::In {
            return Err(Error::new(
                "Expected identifier in for-in loop",
                condition.span,
            ));
        }
        self.consume(TokenKind::RParen)?;
        let body = self.parse_block()?;
        let span = Span::merge(start, body.span);
        Ok(Stmt {
            kind: StmtKind::For(ForKind::WithCondition { condition, body }),
            span,
        })
    }

    pub fn parse_expression(&mut self) -> Result<Expr<'src>> {
        self.parse_restricted_expression(restrictions::NONE)
    }

    fn parse_restricted_expression(&mut self, restrictions: u8) -> Result<Expr<'src>> {
        let saved = mem::replace(&mut self.restrictions, restrictions);
        let result = self.parse_expression_inner(0);
        self.restrictions = saved;
        result
    }

    fn parse_expression_inner(&mut self, minimum_precedence: u8) -> Result<Expr<'src>> {
        let primary = self.parse_primary_expression()?;
        self.climb(primary, minimum_precedence)
    }

    /// Resumes expression parsing from an already-parsed primary. Used by the
    /// for statement after its identifier lookahead, and by call arguments.
    fn continue_expression(&mut self, lhs: Expr<'src>) -> Result<Expr<'src>> {
        let saved = mem::replace(&mut self.restrictions, restrictions::NONE);
        let result = match self.parse_postfix_operators(lhs) {
            Ok(lhs) => self.climb(lhs, 0),
            Err(error) => Err(error),
        };
        self.restrictions = saved;
        result
    }

    fn climb(&mut self, mut result: Expr<'src>, minimum_precedence: u8) -> Result<Expr<'src>> {
        if self.restrictions & restrictions::NO_EXPRESSIONS_WITH_BLOCKS != 0
            && result.has_block()
        {
            return Ok(result);
        }

        while let Some((precedence, associativity)) = secondary_precedence(self.current.kind) {
            if precedence < minimum_precedence {
                break;
            }
            let operator = self.advance()?.kind;
            let next_minimum = if associativity == Associativity::Left {
                precedence + 1
            } else {
                precedence
            };
            let rhs = self.parse_expression_inner(next_minimum)?;
            result = combine_secondary(result, rhs, operator);
        }
        Ok(result)
    }

    fn parse_primary_expression(&mut self) -> Result<Expr<'src>> {
        if self.match_prefix_operator() {
            return self.parse_prefix_expression();
        }

        let expr = match self.current.kind {
            TokenKind::Identifier => {
                let token = self.advance()?;
                Expr {
                    kind: ExprKind::Identifier(token.lexeme),
                    span: token.span(),
                }
            }
            kind if kind.is_integer_literal() => {
                let token = self.advance()?;
                Expr {
                    kind: ExprKind::IntegerLiteral(split_integer_literal(&token)),
                    span: token.span(),
                }
            }
            TokenKind::CharLiteral => {
                let token = self.advance()?;
                Expr {
                    kind: ExprKind::CharLiteral(token.lexeme),
                    span: token.span(),
                }
            }
            TokenKind::True | TokenKind::False => {
                let token = self.advance()?;
                Expr {
                    kind: ExprKind::BooleanLiteral(token.kind == TokenKind::True),
                    span: token.span(),
                }
            }
            TokenKind::LParen => {
                let start = self.advance()?.span();
                let inner = self.parse_expression()?;
                let end = self.consume(TokenKind::RParen)?.span();
                Expr {
                    kind: ExprKind::Parenthesized(Box::new(inner)),
                    span: Span::merge(start, end),
                }
            }
            TokenKind::LBracket => self.parse_array_literal()?,
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                Expr {
                    span: block.span,
                    kind: ExprKind::Block(block),
                }
            }
            TokenKind::If => self.parse_if_expression()?,
            _ => return Err(self.unexpected("expression")),
        };

        self.parse_postfix_operators(expr)
    }

    fn match_prefix_operator(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Bang
                | TokenKind::Tilde
                | TokenKind::At
                | TokenKind::Amp
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
        )
    }

    fn parse_prefix_expression(&mut self) -> Result<Expr<'src>> {
        let token = self.advance()?;
        let start = token.span();
        let operand = self.parse_expression_inner(PREFIX_PRECEDENCE)?;
        let span = Span::merge(start, operand.span);
        let operand = Box::new(operand);

        let kind = match token.kind {
            TokenKind::Plus => ExprKind::Unary {
                op: UnaryOperator::Positive,
                operand,
            },
            TokenKind::Minus => ExprKind::Unary {
                op: UnaryOperator::Negative,
                operand,
            },
            TokenKind::Bang => ExprKind::Unary {
                op: UnaryOperator::LogicalNot,
                operand,
            },
            TokenKind::Tilde => ExprKind::Unary {
                op: UnaryOperator::BitwiseNot,
                operand,
            },
            TokenKind::At => ExprKind::PointerDereference(operand),
            TokenKind::Amp => ExprKind::AddressOf(operand),
            TokenKind::PlusPlus => ExprKind::Update {
                op: UpdateOperator::Increment,
                operand,
                is_prefix: true,
            },
            TokenKind::MinusMinus => ExprKind::Update {
                op: UpdateOperator::Decrement,
                operand,
                is_prefix: true,
            },
            _ => unreachable!("match_prefix_operator covers every prefix token"),
        };
        Ok(Expr { kind, span })
    }

    fn parse_postfix_operators(&mut self, mut expr: Expr<'src>) -> Result<Expr<'src>> {
        loop {
            match self.current.kind {
                TokenKind::LParen => {
                    let ExprKind::Identifier(name) = expr.kind else {
                        return Err(Error::new(
                            "Expected identifier before function call",
                            self.current.span(),
                        ));
                    };
                    let callee = Ident {
                        name,
                        span: expr.span,
                    };
                    expr = self.parse_function_call(callee)?;
                }
                TokenKind::LBracket => {
                    self.advance()?;
                    let index = self.parse_expression()?;
                    let end = self.consume(TokenKind::RBracket)?.span();
                    let span = Span::merge(expr.span, end);
                    expr = Expr {
                        kind: ExprKind::ArraySubscript {
                            array: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    };
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let token = self.advance()?;
                    let op = if token.kind == TokenKind::PlusPlus {
                        UpdateOperator::Increment
                    } else {
                        UpdateOperator::Decrement
                    };
                    let span = Span::merge(expr.span, token.span());
                    expr = Expr {
                        kind: ExprKind::Update {
                            op,
                            operand: Box::new(expr),
                            is_prefix: false,
                        },
                        span,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_function_call(&mut self, callee: Ident<'src>) -> Result<Expr<'src>> {
        self.consume(TokenKind::LParen)?;
        let mut arguments = Vec::new();
        if self.current.kind != TokenKind::RParen {
            loop {
                arguments.push(self.parse_argument()?);
                if self.current.kind != TokenKind::Comma {
                    break;
                }
                self.advance()?;
            }
        }
        let end = self.consume(TokenKind::RParen)?.span();
        Ok(Expr {
            kind: ExprKind::Call { callee, arguments },
            span: Span::merge(callee.span, end),
        })
    }

    fn parse_argument(&mut self) -> Result<Argument<'src>> {
        if self.current.kind == TokenKind::Identifier {
            let token = self.advance()?;
            let ident = Ident {
                name: token.lexeme,
                span: token.span(),
            };
            if self.current.kind == TokenKind::Colon {
                self.advance()?;
                let value = self.parse_expression()?;
                return Ok(Argument {
                    name: Some(ident),
                    value,
                });
            }
            let lhs = Expr {
                kind: ExprKind::Identifier(ident.name),
                span: ident.span,
            };
            let value = self.continue_expression(lhs)?;
            // A bare identifier doubles as the argument name.
            let name = match &value.kind {
                ExprKind::Identifier(_) if value.span == ident.span => Some(ident),
                _ => None,
            };
            return Ok(Argument { name, value });
        }

        let value = self.parse_expression()?;
        Ok(Argument { name: None, value })
    }

    fn parse_array_literal(&mut self) -> Result<Expr<'src>> {
        let start = self.consume(TokenKind::LBracket)?.span();
        let mut elements = Vec::new();
        if self.current.kind != TokenKind::RBracket {
            loop {
                elements.push(self.parse_expression()?);
                if self.current.kind != TokenKind::Comma {
                    break;
                }
                self.advance()?;
            }
        }
        let end = self.consume(TokenKind::RBracket)?.span();
        Ok(Expr {
            kind: ExprKind::ArrayLiteral(elements),
            span: Span::merge(start, end),
        })
    }

    fn parse_if_expression(&mut self) -> Result<Expr<'src>> {
        let start = self.consume(TokenKind::If)?.span();
        self.consume(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RParen)?;
        let then_block = self.parse_block()?;
        let mut span = Span::merge(start, then_block.span);

        let else_branch = if self.current.kind == TokenKind::Else {
            self.advance()?;
            let branch = match self.current.kind {
                TokenKind::If => self.parse_if_expression()?,
                TokenKind::LBrace => {
                    let block = self.parse_block()?;
                    Expr {
                        span: block.span,
                        kind: ExprKind::Block(block),
                    }
                }
                _ => return Err(self.unexpected("'if' or '{'")),
            };
            span = Span::merge(span, branch.span);
            Some(Box::new(branch))
        } else {
            None
        };

        Ok(Expr {
            kind: ExprKind::If {
                condition: Box::new(condition),
                then_block,
                else_branch,
            },
            span,
        })
    }

    fn parse_identifier(&mut self) -> Result<Ident<'src>> {
        if self.current.kind != TokenKind::Identifier {
            return Err(self.unexpected("identifier"));
        }
        let token = self.advance()?;
        Ok(Ident {
            name: token.lexeme,
            span: token.span(),
        })
    }
}

impl<'src> Parser<'src> {
    /// Returns the current token and pulls the next one from the lexer,
    /// propagating lexer errors.
    fn advance(&mut self) -> Result<Token<'src>> {
        let current = self.current;
        self.current = self.lexer.next_token()?;
        Ok(current)
    }

    fn consume(&mut self, expected: TokenKind) -> Result<Token<'src>> {
        if self.current.kind != expected {
            return Err(self.unexpected(expected.name()));
        }
        self.advance()
    }

    fn unexpected(&self, expected: &str) -> Error {
        Error::new(
            format!("Expected {}, got {}!", expected, self.current.kind.name()),
            self.current.span(),
        )
    }
}

fn secondary_precedence(kind: TokenKind) -> Option<(u8, Associativity)> {
    use Associativity::*;
    use TokenKind::*;
    Some(match kind {
        Eq | PlusEq | MinusEq | StarEq | SlashEq | PercentEq | ShlEq | ShrEq | AmpEq
        | CaretEq | PipeEq | AmpAmpEq | PipePipeEq => (1, Right),
        DotDotEq | DotDotLess => (2, Right),
        PipePipe => (3, Left),
        AmpAmp => (4, Left),
        EqEq | BangEq => (5, Left),
        Less | Greater | LessEq | GreaterEq => (6, Left),
        Pipe => (7, Left),
        Caret => (8, Left),
        Amp => (9, Left),
        Shl | Shr => (10, Left),
        Plus | Minus => (11, Left),
        Star | Slash | Percent => (12, Left),
        _ => return None,
    })
}

fn combine_secondary<'src>(
    lhs: Expr<'src>,
    rhs: Expr<'src>,
    operator: TokenKind,
) -> Expr<'src> {
    use TokenKind::*;
    let span = Span::merge(lhs.span, rhs.span);
    let lhs = Box::new(lhs);
    let rhs = Box::new(rhs);

    let kind = if let Some(op) = assignment_operator(operator) {
        ExprKind::Assignment { op, lhs, rhs }
    } else if operator == DotDotEq || operator == DotDotLess {
        ExprKind::Range {
            start: lhs,
            end: rhs,
            is_inclusive: operator == DotDotEq,
        }
    } else {
        let op = match operator {
            PipePipe => BinaryOperator::LogicalOr,
            AmpAmp => BinaryOperator::LogicalAnd,
            EqEq => BinaryOperator::EqualTo,
            BangEq => BinaryOperator::NotEqualTo,
            Less => BinaryOperator::LessThan,
            Greater => BinaryOperator::GreaterThan,
            LessEq => BinaryOperator::LessThanOrEqualTo,
            GreaterEq => BinaryOperator::GreaterThanOrEqualTo,
            Pipe => BinaryOperator::BitwiseOr,
            Caret => BinaryOperator::BitwiseXor,
            Amp => BinaryOperator::BitwiseAnd,
            Shl => BinaryOperator::BitwiseLeftShift,
            Shr => BinaryOperator::BitwiseRightShift,
            Plus => BinaryOperator::Addition,
            Minus => BinaryOperator::Subtraction,
            Star => BinaryOperator::Multiplication,
            Slash => BinaryOperator::Division,
            Percent => BinaryOperator::Modulo,
            _ => unreachable!("secondary_precedence covers every operator"),
        };
        ExprKind::Binary { op, lhs, rhs }
    };
    Expr { kind, span }
}

fn assignment_operator(kind: TokenKind) -> Option<AssignmentOperator> {
    use TokenKind::*;
    Some(match kind {
        Eq => AssignmentOperator::Assignment,
        PlusEq => AssignmentOperator::AdditionAssignment,
        MinusEq => AssignmentOperator::SubtractionAssignment,
        StarEq => AssignmentOperator::MultiplicationAssignment,
        SlashEq => AssignmentOperator::DivisionAssignment,
        PercentEq => AssignmentOperator::ModuloAssignment,
        ShlEq => AssignmentOperator::BitwiseLeftShiftAssignment,
        ShrEq => AssignmentOperator::BitwiseRightShiftAssignment,
        AmpEq => AssignmentOperator::BitwiseAndAssignment,
        CaretEq => AssignmentOperator::BitwiseXorAssignment,
        PipeEq => AssignmentOperator::BitwiseOrAssignment,
        AmpAmpEq => AssignmentOperator::LogicalAndAssignment,
        PipePipeEq => AssignmentOperator::LogicalOrAssignment,
        _ => return None,
    })
}

/// Splits an integer literal token into digits, radix, and suffix. The radix
/// prefix (`0b`, `0o`, `0x`) and the suffix underscore are dropped.
fn split_integer_literal<'src>(token: &Token<'src>) -> IntegerLiteral<'src> {
    let radix = match token.kind {
        TokenKind::DecimalLiteral => Radix::Decimal,
        TokenKind::BinaryLiteral => Radix::Binary,
        TokenKind::OctalLiteral => Radix::Octal,
        TokenKind::HexadecimalLiteral => Radix::Hexadecimal,
        _ => unreachable!("not an integer literal token"),
    };
    let body = match radix {
        Radix::Decimal => token.lexeme,
        _ => &token.lexeme[2..],
    };
    let (digits, suffix) = match body.find('_') {
        Some(underscore) => (&body[..underscore], &body[underscore + 1..]),
        None => (body, ""),
    };
    IntegerLiteral {
        digits,
        radix,
        suffix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_error(src: &str) -> Error {
        parse_program(src).unwrap_err()
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        let ExprKind::Binary { op, lhs, rhs } = expr.kind else {
            panic!("expected binary expression");
        };
        assert_eq!(op, BinaryOperator::Addition);
        assert!(matches!(lhs.kind, ExprKind::IntegerLiteral(_)));
        assert!(matches!(
            rhs.kind,
            ExprKind::Binary {
                op: BinaryOperator::Multiplication,
                ..
            }
        ));
        assert_eq!(expr.span, Span::new(0, 9));
    }

    #[test]
    fn left_associative_operators_lean_left() {
        let expr = parse_expression("1 - 2 - 3").unwrap();
        let ExprKind::Binary { op, lhs, .. } = expr.kind else {
            panic!("expected binary expression");
        };
        assert_eq!(op, BinaryOperator::Subtraction);
        assert!(matches!(
            lhs.kind,
            ExprKind::Binary {
                op: BinaryOperator::Subtraction,
                ..
            }
        ));
    }

    #[test]
    fn assignment_is_right_associative() {
        let expr = parse_expression("a = b = c").unwrap();
        let ExprKind::Assignment { op, lhs, rhs } = expr.kind else {
            panic!("expected assignment");
        };
        assert_eq!(op, AssignmentOperator::Assignment);
        assert!(matches!(lhs.kind, ExprKind::Identifier("a")));
        assert!(matches!(
            rhs.kind,
            ExprKind::Assignment {
                op: AssignmentOperator::Assignment,
                ..
            }
        ));
    }

    #[test]
    fn every_precedence_level_orders_correctly() {
        // One probe per adjacent level pair: the looser operator must end up
        // at the root.
        let cases: &[(&str, fn(&ExprKind) -> bool)] = &[
            ("a ..< b || c", |kind| {
                matches!(kind, ExprKind::Range { .. })
            }),
            ("a || b && c", |kind| {
                matches!(
                    kind,
                    ExprKind::Binary {
                        op: BinaryOperator::LogicalOr,
                        ..
                    }
                )
            }),
            ("a && b == c", |kind| {
                matches!(
                    kind,
                    ExprKind::Binary {
                        op: BinaryOperator::LogicalAnd,
                        ..
                    }
                )
            }),
            ("a == b < c", |kind| {
                matches!(
                    kind,
                    ExprKind::Binary {
                        op: BinaryOperator::EqualTo,
                        ..
                    }
                )
            }),
            ("a < b | c", |kind| {
                matches!(
                    kind,
                    ExprKind::Binary {
                        op: BinaryOperator::LessThan,
                        ..
                    }
                )
            }),
            ("a | b ^ c", |kind| {
                matches!(
                    kind,
                    ExprKind::Binary {
                        op: BinaryOperator::BitwiseOr,
                        ..
                    }
                )
            }),
            ("a ^ b & c", |kind| {
                matches!(
                    kind,
                    ExprKind::Binary {
                        op: BinaryOperator::BitwiseXor,
                        ..
                    }
                )
            }),
            ("a & b << c", |kind| {
                matches!(
                    kind,
                    ExprKind::Binary {
                        op: BinaryOperator::BitwiseAnd,
                        ..
                    }
                )
            }),
            ("a << b + c", |kind| {
                matches!(
                    kind,
                    ExprKind::Binary {
                        op: BinaryOperator::BitwiseLeftShift,
                        ..
                    }
                )
            }),
            ("a + b * c", |kind| {
                matches!(
                    kind,
                    ExprKind::Binary {
                        op: BinaryOperator::Addition,
                        ..
                    }
                )
            }),
        ];
        for (src, is_expected_root) in cases {
            let expr = parse_expression(src).unwrap();
            assert!(is_expected_root(&expr.kind), "wrong root for {src:?}");
        }
    }

    #[test]
    fn ranges_parse_with_inclusivity() {
        let expr = parse_expression("0..<10").unwrap();
        assert!(matches!(
            expr.kind,
            ExprKind::Range {
                is_inclusive: false,
                ..
            }
        ));
        let expr = parse_expression("0..=10").unwrap();
        assert!(matches!(
            expr.kind,
            ExprKind::Range {
                is_inclusive: true,
                ..
            }
        ));
    }

    #[test]
    fn prefix_operators_bind_looser_than_postfix() {
        let expr = parse_expression("-x[1]").unwrap();
        let ExprKind::Unary { op, operand } = expr.kind else {
            panic!("expected unary expression");
        };
        assert_eq!(op, UnaryOperator::Negative);
        assert!(matches!(operand.kind, ExprKind::ArraySubscript { .. }));

        let expr = parse_expression("@p[0]").unwrap();
        let ExprKind::PointerDereference(operand) = expr.kind else {
            panic!("expected dereference");
        };
        assert!(matches!(operand.kind, ExprKind::ArraySubscript { .. }));
    }

    #[test]
    fn update_expressions_both_ways() {
        let expr = parse_expression("++x").unwrap();
        assert!(matches!(
            expr.kind,
            ExprKind::Update {
                op: UpdateOperator::Increment,
                is_prefix: true,
                ..
            }
        ));
        let expr = parse_expression("x--").unwrap();
        assert!(matches!(
            expr.kind,
            ExprKind::Update {
                op: UpdateOperator::Decrement,
                is_prefix: false,
                ..
            }
        ));
    }

    #[test]
    fn integer_literals_split_into_parts() {
        let expr = parse_expression("0x2A_u8").unwrap();
        let ExprKind::IntegerLiteral(literal) = expr.kind else {
            panic!("expected integer literal");
        };
        assert_eq!(literal.digits, "2A");
        assert_eq!(literal.radix, Radix::Hexadecimal);
        assert_eq!(literal.suffix, "u8");

        let expr = parse_expression("42").unwrap();
        let ExprKind::IntegerLiteral(literal) = expr.kind else {
            panic!("expected integer literal");
        };
        assert_eq!(literal.digits, "42");
        assert_eq!(literal.radix, Radix::Decimal);
        assert_eq!(literal.suffix, "");
    }

    #[test]
    fn call_arguments_carry_names() {
        let expr = parse_expression("f(x, y: 1, 2)").unwrap();
        let ExprKind::Call { callee, arguments } = expr.kind else {
            panic!("expected call");
        };
        assert_eq!(callee.name, "f");
        assert_eq!(arguments.len(), 3);
        assert_eq!(arguments[0].name.unwrap().name, "x");
        assert!(matches!(arguments[0].value.kind, ExprKind::Identifier("x")));
        assert_eq!(arguments[1].name.unwrap().name, "y");
        assert!(matches!(
            arguments[1].value.kind,
            ExprKind::IntegerLiteral(_)
        ));
        assert_eq!(arguments[2].name, None);
    }

    #[test]
    fn complex_bare_argument_is_unnamed() {
        let expr = parse_expression("f(x + 1)").unwrap();
        let ExprKind::Call { arguments, .. } = expr.kind else {
            panic!("expected call");
        };
        assert_eq!(arguments[0].name, None);
        assert!(matches!(arguments[0].value.kind, ExprKind::Binary { .. }));
    }

    #[test]
    fn calls_require_an_identifier_callee() {
        let error = parse_expression("(f)(1)").unwrap_err();
        assert_eq!(error.message, "Expected identifier before function call");
    }

    #[test]
    fn block_expression_in_statement_position_does_not_absorb_operators() {
        // The block ends the statement; `+ 2;` is a fresh unary statement.
        let program = parse_program("fn main(): void { {1} + 2; }").unwrap();
        let body = &program.functions[0].body;
        assert_eq!(body.statements.len(), 2);
        assert!(matches!(
            &body.statements[0].kind,
            StmtKind::Expression {
                expr,
                ends_with_semicolon: false,
            } if matches!(expr.kind, ExprKind::Block(_))
        ));
        assert!(matches!(
            &body.statements[1].kind,
            StmtKind::Expression {
                expr,
                ends_with_semicolon: true,
            } if matches!(
                expr.kind,
                ExprKind::Unary {
                    op: UnaryOperator::Positive,
                    ..
                }
            )
        ));
    }

    #[test]
    fn if_without_semicolon_is_a_valid_statement() {
        let program = parse_program(
            "fn main(): void { if (true) { 1; } 2; }",
        )
        .unwrap();
        let body = &program.functions[0].body;
        assert_eq!(body.statements.len(), 2);
        assert!(matches!(
            body.statements[0].kind,
            StmtKind::Expression {
                ends_with_semicolon: false,
                ..
            }
        ));
    }

    #[test]
    fn trailing_expression_before_brace_needs_no_semicolon() {
        let program = parse_program("fn f(): i32 { 1 + 2 }").unwrap();
        let body = &program.functions[0].body;
        assert!(matches!(
            body.statements[0].kind,
            StmtKind::Expression {
                ends_with_semicolon: false,
                ..
            }
        ));
    }

    #[test]
    fn variable_declarations() {
        let program = parse_program(
            "fn main(): void { var x: i32 = 1; mut y = 2; var z: u8; }",
        )
        .unwrap();
        let body = &program.functions[0].body;
        let StmtKind::VariableDeclaration {
            is_mutable,
            name,
            ty,
            initializer,
        } = &body.statements[0].kind
        else {
            panic!("expected variable declaration");
        };
        assert!(!is_mutable);
        assert_eq!(name.name, "x");
        assert!(ty.is_some());
        assert!(initializer.is_some());

        let StmtKind::VariableDeclaration {
            is_mutable, ty, ..
        } = &body.statements[1].kind
        else {
            panic!("expected variable declaration");
        };
        assert!(*is_mutable);
        assert!(ty.is_none());

        let StmtKind::VariableDeclaration { initializer, .. } = &body.statements[2].kind
        else {
            panic!("expected variable declaration");
        };
        assert!(initializer.is_none());
    }

    #[test]
    fn variable_declaration_requires_type_or_initializer() {
        let error = parse_error("fn main(): void { var x; }");
        assert_eq!(error.message, "Expected ':' or '=', got ';'!");
    }

    #[test]
    fn for_statement_forms() {
        let program = parse_program(
            "fn main(): void { for { 1; } for (x < 3) { 1; } for (i in 0..<3) { 1; } }",
        )
        .unwrap();
        let body = &program.functions[0].body;
        assert!(matches!(
            body.statements[0].kind,
            StmtKind::For(ForKind::Infinite { .. })
        ));
        assert!(matches!(
            body.statements[1].kind,
            StmtKind::For(ForKind::WithCondition { .. })
        ));
        let StmtKind::For(ForKind::WithRange {
            variable, iterable, ..
        }) = &body.statements[2].kind
        else {
            panic!("expected for-in");
        };
        assert_eq!(variable.name, "i");
        assert!(matches!(iterable.kind, ExprKind::Range { .. }));
    }

    #[test]
    fn for_in_needs_an_identifier() {
        let error = parse_error("fn main(): void { for (1 in x) { } }");
        assert_eq!(error.message, "Expected identifier in for-in loop");
    }

    #[test]
    fn mut_is_rejected_on_return_and_parameter_types() {
        let error = parse_error("fn f(): mut i32 { 0 }");
        assert_eq!(error.message, "mut is not allowed here");

        let error = parse_error("fn f(a: mut i32): void { }");
        assert_eq!(error.message, "mut is not allowed here");
    }

    #[test]
    fn nested_mut_in_pointer_types_is_allowed() {
        let program = parse_program("fn f(p: *mut i32): void { }").unwrap();
        let param = &program.functions[0].parameters[0];
        let TypeExprKind::Pointer { kind, inner } = &param.ty.kind else {
            panic!("expected pointer type");
        };
        assert_eq!(*kind, PointerKind::Weak);
        assert!(inner.is_mutable);
        assert!(!param.ty.is_mutable);
    }

    #[test]
    fn type_syntax_nests() {
        let program = parse_program("fn main(): void { var x: ^[3]u8; }").unwrap();
        let StmtKind::VariableDeclaration { ty: Some(ty), .. } =
            &program.functions[0].body.statements[0].kind
        else {
            panic!("expected variable declaration");
        };
        let TypeExprKind::Pointer { kind, inner } = &ty.kind else {
            panic!("expected pointer");
        };
        assert_eq!(*kind, PointerKind::Strong);
        let TypeExprKind::Array { size, inner } = &inner.kind else {
            panic!("expected array");
        };
        assert_eq!(size.literal.digits, "3");
        assert!(matches!(inner.kind, TypeExprKind::Named("u8")));
    }

    #[test]
    fn slice_type_syntax() {
        let program = parse_program("fn f(s: []i32): void { }").unwrap();
        let TypeExprKind::Slice { inner } = &program.functions[0].parameters[0].ty.kind
        else {
            panic!("expected slice");
        };
        assert!(matches!(inner.kind, TypeExprKind::Named("i32")));
    }

    #[test]
    fn anonymous_parameters() {
        let program = parse_program("fn add(anon a: i32, b: i32): i32 { a + b }").unwrap();
        let parameters = &program.functions[0].parameters;
        assert!(parameters[0].is_anonymous);
        assert!(!parameters[1].is_anonymous);
    }

    #[test]
    fn trailing_comma_in_parameters_is_rejected() {
        let error = parse_error("fn f(a: i32,): void { }");
        assert_eq!(error.message, "Expected identifier, got ')'!");
    }

    #[test]
    fn missing_semicolon_is_reported() {
        let error = parse_error("fn main(): void { 1 + 2 var x = 1; }");
        assert_eq!(error.message, "Expected ';', got 'var'!");
    }

    #[test]
    fn expected_token_errors_carry_the_offending_span() {
        let error = parse_error("fn main() void { }");
        assert_eq!(error.message, "Expected ':', got 'void'!");
        assert_eq!(error.span, Span::new(10, 14));
    }

    #[test]
    fn lexer_errors_propagate_through_the_parser() {
        let error = parse_error("fn main(): void { var x = 1_; }");
        assert_eq!(error.message, "Invalid integer literal suffix");
    }

    #[test]
    fn else_accepts_only_if_or_block() {
        let error = parse_error("fn main(): void { if (true) { 1; } else 2; }");
        assert_eq!(error.message, "Expected 'if' or '{', got integer literal!");
    }

    #[test]
    fn parenthesized_spans_include_the_parens() {
        let expr = parse_expression("(1 + 2)").unwrap();
        assert!(matches!(expr.kind, ExprKind::Parenthesized(_)));
        assert_eq!(expr.span, Span::new(0, 7));
    }
}
