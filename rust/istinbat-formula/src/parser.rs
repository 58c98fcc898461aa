//! Recursive-descent parser for formulas.
//!
//! Precedence follows the usual arithmetic conventions, with `**` binding
//! tighter than a unary sign on its left and associating to the right:
//!
//! ```text
//! formula   = sum EOF
//! sum       = product (('+' | '-') product)*
//! product   = unary (('*' | '/') unary)*
//! unary     = ('+' | '-') unary | power
//! power     = primary ('**' unary)?
//! primary   = Number
//!           | Name '(' arguments? ')'
//!           | Name
//!           | '(' sum ')'
//! arguments = sum (',' sum)*
//! ```
//!
//! So `-2 ** 2` is `-(2 ** 2)`, `2 ** -1` is `0.5` and `2 ** 3 ** 2` is
//! `2 ** 9`.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{Token, tokenize};

/// A token-stream parser.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_sum(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_product()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Subtract,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_product()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_product(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Multiply,
                Some(Token::Slash) => BinaryOp::Divide,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek() {
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Minus) => UnaryOp::Minus,
            _ => return self.parse_power(),
        };
        self.pos += 1;
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_power(&mut self) -> ParseResult<Expr> {
        let base = self.parse_primary()?;
        if self.eat(&Token::Power) {
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Power,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Name(name)) => {
                if self.eat(&Token::LeftParen) {
                    let arguments = self.parse_arguments()?;
                    Ok(Expr::Call {
                        function: name,
                        arguments,
                    })
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Some(Token::LeftParen) => {
                let inner = self.parse_sum()?;
                match self.advance() {
                    Some(Token::RightParen) => Ok(inner),
                    None => Err(ParseError::UnterminatedGroup),
                    Some(other) => Err(ParseError::UnexpectedToken {
                        expected: "')'".into(),
                        found: other.to_string(),
                    }),
                }
            }
            Some(other) => Err(ParseError::UnexpectedToken {
                expected: "a number, name or '('".into(),
                found: other.to_string(),
            }),
            None => Err(ParseError::UnexpectedEnd {
                expected: "a number, name or '('".into(),
            }),
        }
    }

    /// Arguments after the opening parenthesis, through the closing one
    fn parse_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut arguments = Vec::new();
        if self.eat(&Token::RightParen) {
            return Ok(arguments);
        }
        loop {
            arguments.push(self.parse_sum()?);
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(Token::RightParen) => return Ok(arguments),
                None => return Err(ParseError::UnterminatedGroup),
                Some(other) => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "',' or ')'".into(),
                        found: other.to_string(),
                    });
                }
            }
        }
    }
}

/// Parse formula source into an expression tree.
pub fn parse(input: &str) -> ParseResult<Expr> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_sum()?;
    match parser.advance() {
        None => Ok(expr),
        Some(Token::RightParen) => Err(ParseError::UnexpectedToken {
            expected: "an operator".into(),
            found: "')'".into(),
        }),
        Some(token) => Err(ParseError::TrailingInput {
            found: token.to_string(),
        }),
    }
}
