//! Recursive descent parser producing a [ParsedConfig]
//!
//! Operator precedence, lowest first:
//!
//! | operators                    | associativity      |
//! |------------------------------|--------------------|
//! | `or`                         | left               |
//! | `and`                        | left               |
//! | `not` (prefix)               |                    |
//! | `==` `!=` `<` `<=` `>` `>=`  | none (no chaining) |
//! | `in`                         | none (no chaining) |
//! | `+` `-`                      | left               |
//! | `*`                          | left               |
//! | `-` (prefix)                 |                    |
use crate::ast::{
    AssignmentStatement, BinaryOperator, Expression, ParsedConfig, Section, UnaryOperator,
};
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Lexer, LineKind, Newlines};
use crate::token::{Position, Token, TokenKind, VariableToken};
use crate::value::Value;

/// Deepest accepted expression nesting
const MAX_DEPTH: usize = 100;

pub fn parse(input: &str) -> Result<ParsedConfig, ParseError> {
    Parser::new(input).parse()
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    newlines: Newlines,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input),
            current: Token::new(TokenKind::Eof, Position::new(1, 1)),
            newlines: Newlines::Skip,
            depth: 0,
        }
    }

    pub fn parse(mut self) -> Result<ParsedConfig, ParseError> {
        let assignments = if self.lexer.starts_with_block() {
            self.parse_assignment_block()?
        } else {
            vec![]
        };

        let default_lines = self.raw_lines();

        let mut sections = vec![];
        while self.lexer.line_kind() == LineKind::Header {
            sections.push(self.parse_section()?);
        }

        Ok(ParsedConfig {
            assignments,
            default_lines,
            sections,
        })
    }

    fn parse_assignment_block(&mut self) -> Result<Vec<AssignmentStatement>, ParseError> {
        self.newlines = Newlines::Skip;
        self.advance()?;
        self.expect(&TokenKind::LBrace, "`{`")?;

        let mut assignments = vec![];
        while self.current.kind != TokenKind::RBrace {
            assignments.push(self.parse_assignment()?);
            if self.current.kind == TokenKind::Semicolon {
                self.advance()?;
            }
        }

        // the rest of the line after `}` must be empty
        self.newlines = Newlines::Significant;
        self.advance()?;
        self.expect_end_of_line()?;

        Ok(assignments)
    }

    fn parse_assignment(&mut self) -> Result<AssignmentStatement, ParseError> {
        let target = self.expect_variable("variable name or `}`")?;
        self.expect(&TokenKind::Assign, "`=`")?;
        let expression = self.parse_expression()?;
        Ok(AssignmentStatement::new(target, expression))
    }

    fn parse_section(&mut self) -> Result<Section, ParseError> {
        self.newlines = Newlines::Significant;
        self.advance()?;
        let start = self.current.position;
        self.expect(&TokenKind::LBracket, "`[`")?;
        let predicate = self.parse_expression()?;
        self.expect(&TokenKind::RBracket, "`]`")?;
        self.expect_end_of_line()?;

        Ok(Section::new(start, predicate, self.raw_lines()))
    }

    fn raw_lines(&mut self) -> Vec<String> {
        let mut lines = vec![];
        while self.lexer.line_kind() == LineKind::Raw {
            lines.push(self.lexer.raw_line().to_owned());
        }
        lines
    }

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.nested(Self::parse_or)
    }

    fn parse_or(&mut self) -> Result<Expression, ParseError> {
        self.left_associative(Self::parse_and, |kind| match kind {
            TokenKind::Or => Some(BinaryOperator::Or),
            _ => None,
        })
    }

    fn parse_and(&mut self) -> Result<Expression, ParseError> {
        self.left_associative(Self::parse_not, |kind| match kind {
            TokenKind::And => Some(BinaryOperator::And),
            _ => None,
        })
    }

    fn parse_not(&mut self) -> Result<Expression, ParseError> {
        if self.current.kind != TokenKind::Not {
            return self.parse_comparison();
        }

        let position = self.advance()?.position;
        let operand = self.nested(Self::parse_not)?;
        Ok(Expression::Unary {
            op: UnaryOperator::Not,
            operand: Box::new(operand),
            position,
        })
    }

    fn parse_comparison(&mut self) -> Result<Expression, ParseError> {
        let left = self.parse_in()?;
        let Some(op) = comparison_operator(&self.current.kind) else {
            return Ok(left);
        };

        let position = self.advance()?.position;
        let right = self.parse_in()?;

        if comparison_operator(&self.current.kind).is_some() {
            return Err(self.error(ParseErrorKind::Chained("comparison operators")));
        }

        Ok(binary(op, left, right, position))
    }

    fn parse_in(&mut self) -> Result<Expression, ParseError> {
        let left = self.parse_additive()?;
        if self.current.kind != TokenKind::In {
            return Ok(left);
        }

        let position = self.advance()?.position;
        let right = self.parse_additive()?;

        if self.current.kind == TokenKind::In {
            return Err(self.error(ParseErrorKind::Chained("`in` tests")));
        }

        Ok(binary(BinaryOperator::In, left, right, position))
    }

    fn parse_additive(&mut self) -> Result<Expression, ParseError> {
        self.left_associative(Self::parse_multiplicative, |kind| match kind {
            TokenKind::Plus => Some(BinaryOperator::Add),
            TokenKind::Minus => Some(BinaryOperator::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ParseError> {
        self.left_associative(Self::parse_unary, |kind| match kind {
            TokenKind::Star => Some(BinaryOperator::Mul),
            _ => None,
        })
    }

    /// `operand (op operand)*`, folded to the left
    ///
    /// Every fold makes the tree one level deeper and counts against the nesting limit.
    fn left_associative(
        &mut self,
        operand: fn(&mut Self) -> Result<Expression, ParseError>,
        operator: fn(&TokenKind) -> Option<BinaryOperator>,
    ) -> Result<Expression, ParseError> {
        let outer = self.depth;
        let result = self.fold(operand, operator);
        self.depth = outer;
        result
    }

    fn fold(
        &mut self,
        operand: fn(&mut Self) -> Result<Expression, ParseError>,
        operator: fn(&TokenKind) -> Option<BinaryOperator>,
    ) -> Result<Expression, ParseError> {
        let mut expr = operand(self)?;
        while let Some(op) = operator(&self.current.kind) {
            if self.depth >= MAX_DEPTH {
                return Err(self.error(ParseErrorKind::TooDeep));
            }
            self.depth += 1;

            let position = self.advance()?.position;
            let right = operand(self)?;
            expr = binary(op, expr, right, position);
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        if self.current.kind != TokenKind::Minus {
            return self.parse_atom();
        }

        let position = self.advance()?.position;
        let operand = self.nested(Self::parse_unary)?;
        Ok(Expression::Unary {
            op: UnaryOperator::Neg,
            operand: Box::new(operand),
            position,
        })
    }

    fn parse_atom(&mut self) -> Result<Expression, ParseError> {
        let literal = match &self.current.kind {
            TokenKind::Integer(value) => Value::Integer(*value),
            TokenKind::Decimal(value) => Value::Decimal(*value),
            TokenKind::String(value) => Value::String(value.clone()),
            TokenKind::Boolean(value) => Value::Boolean(*value),
            TokenKind::Identifier(_) => {
                let variable = self.expect_variable("variable name")?;
                return Ok(Expression::Variable(variable));
            }
            TokenKind::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RParen, "`)`")?;
                return Ok(expr);
            }
            TokenKind::LBracket => return self.parse_list(),
            _ => return Err(self.unexpected("an expression")),
        };

        self.advance()?;
        Ok(Expression::Literal(literal))
    }

    fn parse_list(&mut self) -> Result<Expression, ParseError> {
        self.expect(&TokenKind::LBracket, "`[`")?;

        let mut elements = vec![];
        while self.current.kind != TokenKind::RBracket {
            elements.push(self.parse_expression()?);
            if self.current.kind != TokenKind::Comma {
                break;
            }
            self.advance()?;
        }

        self.expect(&TokenKind::RBracket, "`,` or `]`")?;
        Ok(Expression::List(elements))
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(ParseErrorKind::TooDeep));
        }

        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn expect_variable(&mut self, expected: &'static str) -> Result<VariableToken, ParseError> {
        let TokenKind::Identifier(name) = &self.current.kind else {
            return Err(self.unexpected(expected));
        };

        let variable = VariableToken::new(name.clone(), self.current.position);
        self.advance()?;
        Ok(variable)
    }

    fn expect(&mut self, kind: &TokenKind, expected: &'static str) -> Result<Token, ParseError> {
        if &self.current.kind == kind {
            self.advance()
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// The token after a header or a block must end the line
    ///
    /// Does not advance, the lexer is already positioned at the start of the next line.
    fn expect_end_of_line(&self) -> Result<(), ParseError> {
        match self.current.kind {
            TokenKind::EndOfLine | TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("end of line")),
        }
    }

    /// Move to the next token and return the previous one
    fn advance(&mut self) -> Result<Token, ParseError> {
        let next = self.lexer.next_token(self.newlines)?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        self.error(ParseErrorKind::UnexpectedToken {
            expected,
            found: self.current.kind.to_string(),
        })
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.current.position, kind)
    }
}

fn binary(op: BinaryOperator, left: Expression, right: Expression, position: Position) -> Expression {
    Expression::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        position,
    }
}

fn comparison_operator(kind: &TokenKind) -> Option<BinaryOperator> {
    match kind {
        TokenKind::Eq => Some(BinaryOperator::Eq),
        TokenKind::Ne => Some(BinaryOperator::Ne),
        TokenKind::Lt => Some(BinaryOperator::Lt),
        TokenKind::Le => Some(BinaryOperator::Le),
        TokenKind::Gt => Some(BinaryOperator::Gt),
        TokenKind::Ge => Some(BinaryOperator::Ge),
        _ => None,
    }
}
