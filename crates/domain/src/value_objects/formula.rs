//! Restricted arithmetic evaluation for cost formulas.
//!
//! Cost formulas are authored as free text on items, e.g.
//! `"max(1, 3 - @str)"`. The evaluator is a small recursive-descent
//! parser over `+ - * / ( )`, numeric literals, `@attribute` references,
//! and exactly two named functions (`max`, `min`). Nothing else is
//! accepted - formulas are data, never executable code.

use thiserror::Error;

/// Error when parsing or evaluating a cost formula.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// The formula string is empty
    #[error("Empty formula")]
    Empty,
    /// A character or token outside the allowed grammar
    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),
    /// The formula ended mid-expression
    #[error("Unexpected end of formula")]
    UnexpectedEnd,
    /// Only `max` and `min` are callable
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Attr(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
}

/// Evaluate a cost formula, resolving `@name` references through the
/// supplied resolver (unresolved names are the resolver's concern - the
/// attribute resolver is total and returns 0 for unknowns).
pub fn eval_formula(
    src: &str,
    resolver: impl Fn(&str) -> i32,
) -> Result<f64, FormulaError> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err(FormulaError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        resolver: &resolver,
    };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(FormulaError::UnexpectedToken(parser.describe_current()));
    }
    Ok(value)
}

fn tokenize(src: &str) -> Result<Vec<Token>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '+' => tokens.push(Token::Plus),
            '-' => tokens.push(Token::Minus),
            '*' => tokens.push(Token::Star),
            '/' => tokens.push(Token::Slash),
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            ',' => tokens.push(Token::Comma),
            '@' => {
                let mut name = String::new();
                while let Some((_, next)) = chars.peek() {
                    if next.is_ascii_alphanumeric() || *next == '_' {
                        name.push(*next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    return Err(FormulaError::UnexpectedToken("@".to_string()));
                }
                tokens.push(Token::Attr(name));
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut literal = c.to_string();
                while let Some((_, next)) = chars.peek() {
                    if next.is_ascii_digit() || *next == '.' {
                        literal.push(*next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value: f64 = literal
                    .parse()
                    .map_err(|_| FormulaError::UnexpectedToken(literal.clone()))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut ident = c.to_string();
                while let Some((_, next)) = chars.peek() {
                    if next.is_ascii_alphanumeric() || *next == '_' {
                        ident.push(*next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident.to_lowercase()));
            }
            other => return Err(FormulaError::UnexpectedToken(other.to_string())),
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    resolver: &'a dyn Fn(&str) -> i32,
}

impl Parser<'_> {
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

    fn describe_current(&self) -> String {
        match self.peek() {
            Some(Token::Number(n)) => n.to_string(),
            Some(Token::Attr(name)) => format!("@{}", name),
            Some(Token::Ident(name)) => name.clone(),
            Some(Token::Plus) => "+".to_string(),
            Some(Token::Minus) => "-".to_string(),
            Some(Token::Star) => "*".to_string(),
            Some(Token::Slash) => "/".to_string(),
            Some(Token::LParen) => "(".to_string(),
            Some(Token::RParen) => ")".to_string(),
            Some(Token::Comma) => ",".to_string(),
            None => "end of formula".to_string(),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), FormulaError> {
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            Some(_) => {
                self.pos -= 1;
                Err(FormulaError::UnexpectedToken(self.describe_current()))
            }
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn expr(&mut self) -> Result<f64, FormulaError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, FormulaError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err(FormulaError::DivisionByZero);
                    }
                    value /= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<f64, FormulaError> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.advance();
            return Ok(-self.unary()?);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<f64, FormulaError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Attr(name)) => Ok((self.resolver)(&name) as f64),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if name != "max" && name != "min" {
                    return Err(FormulaError::UnknownFunction(name));
                }
                self.expect(Token::LParen)?;
                let mut args = vec![self.expr()?];
                while matches!(self.peek(), Some(Token::Comma)) {
                    self.advance();
                    args.push(self.expr()?);
                }
                self.expect(Token::RParen)?;
                let folded = if name == "max" {
                    args.into_iter().fold(f64::NEG_INFINITY, f64::max)
                } else {
                    args.into_iter().fold(f64::INFINITY, f64::min)
                };
                Ok(folded)
            }
            Some(_) => {
                self.pos -= 1;
                Err(FormulaError::UnexpectedToken(self.describe_current()))
            }
            None => Err(FormulaError::UnexpectedEnd),
        }
    }
}
