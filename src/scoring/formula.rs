use std::fmt;

use super::errors::{FormulaError, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Subtract => '-',
            BinaryOp::Multiply => '*',
            BinaryOp::Divide => '/',
        }
    }
}

/// Parsed form of a calculated column's formula, e.g. `({kills} + 2) * {rounds}`
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Column(String),
    Negate(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn parse(source: &str) -> Result<Expr, ParseError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens,
            position: 0,
            end: source.len(),
        };

        let expr = parser.expression()?;
        match parser.peek() {
            None => Ok(expr),
            Some((offset, token)) => Err(ParseError::new(
                *offset,
                format!("unexpected {token} after expression"),
            )),
        }
    }

    /// Column ids referenced by this expression, first occurrence order, no repeats
    pub fn references(&self) -> Vec<&str> {
        let mut found = Vec::new();
        self.collect_references(&mut found);
        found
    }

    fn collect_references<'a>(&'a self, found: &mut Vec<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Column(id) => {
                if !found.contains(&id.as_str()) {
                    found.push(id);
                }
            }
            Expr::Negate(inner) => inner.collect_references(found),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_references(found);
                rhs.collect_references(found);
            }
        }
    }

    /// Evaluates the expression for `column`, resolving references through `lookup`.
    pub fn evaluate<F>(&self, column: &str, lookup: &F) -> Result<f64, FormulaError>
    where
        F: Fn(&str) -> Result<f64, FormulaError>,
    {
        let value = match self {
            Expr::Number(value) => *value,
            Expr::Column(reference) => lookup(reference)?,
            Expr::Negate(inner) => -inner.evaluate(column, lookup)?,
            Expr::Binary { op, lhs, rhs } => {
                let left = lhs.evaluate(column, lookup)?;
                let right = rhs.evaluate(column, lookup)?;
                match op {
                    BinaryOp::Add => left + right,
                    BinaryOp::Subtract => left - right,
                    BinaryOp::Multiply => left * right,
                    BinaryOp::Divide => {
                        if right == 0.0 {
                            return Err(FormulaError::DivisionByZero {
                                column: column.to_string(),
                            });
                        }
                        left / right
                    }
                }
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(FormulaError::NonFinite {
                column: column.to_string(),
            })
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Number(value) => write!(f, "{value}"),
            Expr::Column(id) => write!(f, "{{{id}}}"),
            Expr::Negate(inner) => write!(f, "-({inner})"),
            Expr::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Column(String),
    Op(BinaryOp),
    OpenParen,
    CloseParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Number(value) => write!(f, "number {value}"),
            Token::Column(id) => write!(f, "column {{{id}}}"),
            Token::Op(op) => write!(f, "'{}'", op.symbol()),
            Token::OpenParen => write!(f, "'('"),
            Token::CloseParen => write!(f, "')'"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        literal.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| ParseError::new(offset, format!("invalid number '{literal}'")))?;
                tokens.push((offset, Token::Number(value)));
            }
            '{' => {
                chars.next();
                let mut id = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    id.push(c);
                }
                if !closed {
                    return Err(ParseError::new(offset, "unterminated column reference"));
                }
                let id = id.trim();
                if id.is_empty() {
                    return Err(ParseError::new(offset, "empty column reference"));
                }
                tokens.push((offset, Token::Column(id.to_string())));
            }
            '+' | '-' | '*' | '/' | '(' | ')' => {
                chars.next();
                let token = match ch {
                    '+' => Token::Op(BinaryOp::Add),
                    '-' => Token::Op(BinaryOp::Subtract),
                    '*' => Token::Op(BinaryOp::Multiply),
                    '/' => Token::Op(BinaryOp::Divide),
                    '(' => Token::OpenParen,
                    _ => Token::CloseParen,
                };
                tokens.push((offset, token));
            }
            other => {
                return Err(ParseError::new(
                    offset,
                    format!("unexpected character '{other}'"),
                ))
            }
        }
    }

    Ok(tokens)
}

/// Recursive descent over `expr := term (('+'|'-') term)*`,
/// `term := unary (('*'|'/') unary)*`, `unary := ('-'|'+') unary | primary`.
struct Parser {
    tokens: Vec<(usize, Token)>,
    position: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&(usize, Token)> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<(usize, Token)> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.term()?;
        while let Some((_, Token::Op(op @ (BinaryOp::Add | BinaryOp::Subtract)))) = self.peek() {
            let op = *op;
            self.position += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.unary()?;
        while let Some((_, Token::Op(op @ (BinaryOp::Multiply | BinaryOp::Divide)))) = self.peek()
        {
            let op = *op;
            self.position += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Some((_, Token::Op(BinaryOp::Subtract))) => {
                self.position += 1;
                Ok(Expr::Negate(Box::new(self.unary()?)))
            }
            Some((_, Token::Op(BinaryOp::Add))) => {
                self.position += 1;
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.next() {
            Some((_, Token::Number(value))) => Ok(Expr::Number(value)),
            Some((_, Token::Column(id))) => Ok(Expr::Column(id)),
            Some((offset, Token::OpenParen)) => {
                let inner = self.expression()?;
                match self.next() {
                    Some((_, Token::CloseParen)) => Ok(inner),
                    _ => Err(ParseError::new(offset, "unclosed parenthesis")),
                }
            }
            Some((offset, token)) => Err(ParseError::new(
                offset,
                format!("expected a value, found {token}"),
            )),
            None => Err(ParseError::new(self.end, "unexpected end of formula")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn eval_with(source: &str, values: &[(&str, f64)]) -> Result<f64, FormulaError> {
        let values: HashMap<String, f64> = values
            .iter()
            .map(|(id, value)| (id.to_string(), *value))
            .collect();
        let expr = Expr::parse(source).unwrap();
        expr.evaluate("result", &|id: &str| {
            values
                .get(id)
                .copied()
                .ok_or_else(|| FormulaError::UnknownColumn {
                    column: "result".into(),
                    reference: id.into(),
                })
        })
    }

    #[rstest]
    #[case("1 + 2 * 3", 7.0)]
    #[case("(1 + 2) * 3", 9.0)]
    #[case("10 - 4 - 3", 3.0)]
    #[case("12 / 4 / 3", 1.0)]
    #[case("-{a} + 10", 8.0)]
    #[case("{a} * {b}", 10.0)]
    #[case("{ a } * 1.5", 3.0)]
    #[case("--{b}", 5.0)]
    fn evaluates_with_standard_precedence(#[case] source: &str, #[case] expected: f64) {
        let value = eval_with(source, &[("a", 2.0), ("b", 5.0)]).unwrap();
        assert_eq!(value, expected);
    }

    #[rstest]
    #[case("", "unexpected end of formula")]
    #[case("1 +", "unexpected end of formula")]
    #[case("{a", "unterminated column reference")]
    #[case("{} + 1", "empty column reference")]
    #[case("(1 + 2", "unclosed parenthesis")]
    #[case("1 2", "unexpected number 2 after expression")]
    #[case("2 ^ 3", "unexpected character '^'")]
    #[case("1..2", "invalid number '1..2'")]
    fn reports_syntax_errors(#[case] source: &str, #[case] message: &str) {
        let err = Expr::parse(source).unwrap_err();
        assert_eq!(err.message, message);
    }

    #[test]
    fn collects_unique_references_in_order() {
        let expr = Expr::parse("{b} + {a} * {b} - ({c} / {a})").unwrap();
        assert_eq!(expr.references(), vec!["b", "a", "c"]);
    }

    #[test]
    fn division_by_zero_is_an_error_not_infinity() {
        let err = eval_with("{a} / {z}", &[("a", 1.0), ("z", 0.0)]).unwrap_err();
        assert_eq!(
            err,
            FormulaError::DivisionByZero {
                column: "result".into()
            }
        );
    }

    #[test]
    fn overflow_is_reported_as_non_finite() {
        let err = eval_with("{a} * {a}", &[("a", f64::MAX)]).unwrap_err();
        assert!(matches!(err, FormulaError::NonFinite { .. }));
    }

    #[test]
    fn display_round_trips_through_parse() {
        let expr = Expr::parse("-{a} + 2 * ({b} - 1)").unwrap();
        let reparsed = Expr::parse(&expr.to_string()).unwrap();
        assert_eq!(expr, reparsed);
    }
}
