//! The main parser implementation.

use crate::ast::*;
use crate::error::{line_column, Error, Result};
use crate::lexer::{Scanner, Span, Token, TokenKind};

/// A recursive descent parser for module source.
pub struct Parser<'a> {
    source: &'a str,
    scanner: Scanner<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given source code.
    pub fn new(source: &'a str) -> Self {
        let mut scanner = Scanner::new(source);
        let current = scanner.next_token();
        Self {
            source,
            scanner,
            current,
        }
    }

    /// Parses the source code into a Program AST node.
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut body = Vec::new();

        while !self.is_at_end() {
            body.push(self.parse_statement()?);
        }

        Ok(Program { body })
    }

    /// Parses a single statement.
    pub fn parse_statement(&mut self) -> Result<Statement> {
        match &self.current.kind {
            TokenKind::Var | TokenKind::Let | TokenKind::Const => self.parse_variable_declaration(),
            TokenKind::Semicolon => {
                self.advance();
                Ok(Statement::Empty)
            }
            _ => {
                let expression = self.parse_expression()?;
                self.consume_terminator()?;
                Ok(Statement::Expression(expression))
            }
        }
    }

    fn parse_variable_declaration(&mut self) -> Result<Statement> {
        let kind = match &self.current.kind {
            TokenKind::Var => VariableKind::Var,
            TokenKind::Let => VariableKind::Let,
            _ => VariableKind::Const,
        };
        self.advance();

        let mut declarations = Vec::new();

        loop {
            let name = self.expect_identifier()?;
            let init = if self.check(&TokenKind::Equal) {
                self.advance();
                Some(self.parse_assignment()?)
            } else {
                None
            };

            if init.is_none() && kind == VariableKind::Const {
                return Err(self.error_here(format!("Missing initializer in const declaration of '{}'", name)));
            }

            declarations.push(VariableDeclarator { name, init });

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        self.consume_terminator()?;

        Ok(Statement::VariableDeclaration(VariableDeclaration {
            kind,
            declarations,
        }))
    }

    /// Parses a full expression.
    pub fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expression> {
        let start = self.current.span;
        let target = self.parse_logical_or()?;

        if !self.check(&TokenKind::Equal) {
            return Ok(target);
        }

        if !matches!(target, Expression::Identifier(_) | Expression::Member(_)) {
            return Err(self.error_at(start, "Invalid left-hand side in assignment"));
        }

        self.advance();
        let value = self.parse_assignment()?;

        Ok(Expression::Assign(AssignExpression {
            target: Box::new(target),
            value: Box::new(value),
        }))
    }

    fn parse_logical_or(&mut self) -> Result<Expression> {
        let mut left = self.parse_logical_and()?;

        while self.check(&TokenKind::PipePipe) {
            self.advance();
            let right = self.parse_logical_and()?;
            left = Expression::Logical(LogicalExpression {
                operator: LogicalOperator::Or,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_equality()?;

        while self.check(&TokenKind::AmpersandAmpersand) {
            self.advance();
            let right = self.parse_equality()?;
            left = Expression::Logical(LogicalExpression {
                operator: LogicalOperator::And,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression> {
        let mut left = self.parse_additive()?;

        loop {
            let operator = match self.current.kind {
                TokenKind::EqualEqual => BinaryOperator::Equal,
                TokenKind::BangEqual => BinaryOperator::NotEqual,
                TokenKind::EqualEqualEqual => BinaryOperator::StrictEqual,
                TokenKind::BangEqualEqual => BinaryOperator::StrictNotEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(operator, left, right);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let operator = match self.current.kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(operator, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let operator = match self.current.kind {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(operator, left, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let operator = match self.current.kind {
            TokenKind::Bang => UnaryOperator::Not,
            TokenKind::Minus => UnaryOperator::Negate,
            TokenKind::Typeof => UnaryOperator::Typeof,
            _ => return self.parse_call(),
        };
        self.advance();
        let argument = self.parse_unary()?;

        Ok(Expression::Unary(UnaryExpression {
            operator,
            argument: Box::new(argument),
        }))
    }

    fn parse_call(&mut self) -> Result<Expression> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_property_name()?;
                    expr = Expression::Member(MemberExpression {
                        object: Box::new(expr),
                        property: MemberProperty::Static(name),
                    });
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let property = self.parse_expression()?;
                    self.expect(&TokenKind::RightBracket)?;
                    expr = Expression::Member(MemberExpression {
                        object: Box::new(expr),
                        property: MemberProperty::Computed(Box::new(property)),
                    });
                }
                TokenKind::LeftParen => {
                    self.advance();
                    let arguments = self.parse_list(&TokenKind::RightParen, |p| p.parse_assignment())?;
                    expr = Expression::Call(CallExpression {
                        callee: Box::new(expr),
                        arguments,
                    });
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let expr = match &self.current.kind {
            TokenKind::Number(n) => Expression::Number(*n),
            TokenKind::String(s) => Expression::String(s.clone()),
            TokenKind::True => Expression::Boolean(true),
            TokenKind::False => Expression::Boolean(false),
            TokenKind::Null => Expression::Null,
            TokenKind::This => Expression::This,
            TokenKind::Identifier(name) => Expression::Identifier(name.clone()),
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RightParen)?;
                return Ok(inner);
            }
            TokenKind::LeftBracket => {
                self.advance();
                let elements = self.parse_list(&TokenKind::RightBracket, |p| p.parse_assignment())?;
                return Ok(Expression::Array(elements));
            }
            TokenKind::LeftBrace => {
                self.advance();
                let properties = self.parse_list(&TokenKind::RightBrace, |p| p.parse_property())?;
                return Ok(Expression::Object(properties));
            }
            other => {
                let message = format!("Unexpected {}", other.describe());
                return Err(self.error_here(message));
            }
        };

        self.advance();
        Ok(expr)
    }

    fn parse_property(&mut self) -> Result<Property> {
        let key = match &self.current.kind {
            TokenKind::String(s) => {
                let key = s.clone();
                self.advance();
                key
            }
            TokenKind::Number(n) => {
                let key = n.to_string();
                self.advance();
                key
            }
            _ => self.expect_property_name()?,
        };
        self.expect(&TokenKind::Colon)?;
        let value = self.parse_assignment()?;
        Ok(Property { key, value })
    }

    /// Parses a comma-separated list up to `close`, allowing a trailing comma.
    fn parse_list<T>(
        &mut self,
        close: &TokenKind,
        mut item: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();

        while !self.check(close) {
            items.push(item(self)?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        self.expect(close)?;
        Ok(items)
    }

    /// Accepts `;`, or an implicit terminator (line break, `}` or end of input).
    fn consume_terminator(&mut self) -> Result<()> {
        if self.check(&TokenKind::Semicolon) {
            self.advance();
            return Ok(());
        }
        if self.current.newline_before || self.is_at_end() || self.check(&TokenKind::RightBrace) {
            return Ok(());
        }
        let message = format!("Unexpected {}", self.current.kind.describe());
        Err(self.error_here(message))
    }

    fn advance(&mut self) {
        self.current = self.scanner.next_token();
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            let message = format!(
                "Expected {}, found {}",
                kind.describe(),
                self.current.kind.describe()
            );
            Err(self.error_here(message))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        if let TokenKind::Identifier(name) = &self.current.kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            let message = format!("Expected identifier, found {}", self.current.kind.describe());
            Err(self.error_here(message))
        }
    }

    /// Property names may be keywords (`a.this`, `{ null: 1 }`).
    fn expect_property_name(&mut self) -> Result<String> {
        let name = match &self.current.kind {
            TokenKind::Identifier(name) => name.clone(),
            TokenKind::Var => "var".into(),
            TokenKind::Let => "let".into(),
            TokenKind::Const => "const".into(),
            TokenKind::True => "true".into(),
            TokenKind::False => "false".into(),
            TokenKind::Null => "null".into(),
            TokenKind::This => "this".into(),
            TokenKind::Typeof => "typeof".into(),
            _ => {
                let message = format!("Expected property name, found {}", self.current.kind.describe());
                return Err(self.error_here(message));
            }
        };
        self.advance();
        Ok(name)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        self.error_at(self.current.span, message)
    }

    fn error_at(&self, span: Span, message: impl Into<String>) -> Error {
        let (line, column) = line_column(self.source, span.start);
        Error::Syntax {
            message: message.into(),
            line,
            column,
        }
    }
}

fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
    Expression::Binary(BinaryExpression {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    })
}
