//! A small expression language evaluated against a row.
//!
//! Supports number, string, `true`/`false`/`None` literals, field names,
//! `+ - * /`, comparisons, `and`/`or`/`not` and parentheses.

use tables_core::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unexpected token {0}")]
    UnexpectedToken(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("name \"{0}\" is not defined")]
    UnknownName(String),

    #[error("unsupported operand types for {0}")]
    InvalidOperands(&'static str),

    #[error("division by zero")]
    DivisionByZero,
}

/// Runtime value of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalValue {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
}

impl EvalValue {
    pub fn truthy(&self) -> bool {
        match self {
            EvalValue::Null => false,
            EvalValue::Bool(b) => *b,
            EvalValue::Num(n) => *n != 0.0,
            EvalValue::Str(s) => !s.is_empty(),
        }
    }
}

impl From<Option<&Value>> for EvalValue {
    fn from(value: Option<&Value>) -> Self {
        match value {
            None => EvalValue::Null,
            Some(Value::Boolean(b)) => EvalValue::Bool(*b),
            Some(Value::String(s)) => EvalValue::Str(s.clone()),
            Some(other) => match other.as_f64() {
                Some(n) if other.is_numeric() => EvalValue::Num(n),
                _ => EvalValue::Str(other.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Str(String),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
}

fn tokenize(source: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let number = text
                .parse()
                .map_err(|_| EvalError::UnexpectedToken(text.clone()))?;
            tokens.push(Token::Num(number));
        } else if c == '"' || c == '\'' {
            let start = i + 1;
            i = start;
            while i < chars.len() && chars[i] != c {
                i += 1;
            }
            if i >= chars.len() {
                return Err(EvalError::UnterminatedString);
            }
            tokens.push(Token::Str(chars[start..i].iter().collect()));
            i += 1;
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
        } else if c == '(' {
            tokens.push(Token::LParen);
            i += 1;
        } else if c == ')' {
            tokens.push(Token::RParen);
            i += 1;
        } else {
            let pair: String = chars[i..chars.len().min(i + 2)].iter().collect();
            let op = match pair.as_str() {
                "==" => "==",
                "!=" => "!=",
                "<=" => "<=",
                ">=" => ">=",
                _ => match c {
                    '<' => "<",
                    '>' => ">",
                    '+' => "+",
                    '-' => "-",
                    '*' => "*",
                    '/' => "/",
                    other => return Err(EvalError::UnexpectedChar(other)),
                },
            };
            i += op.len();
            tokens.push(Token::Op(op));
        }
    }
    Ok(tokens)
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Literal(EvalValue),
    Name(String),
    Not(Box<Node>),
    Neg(Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Binary(&'static str, Box<Node>, Box<Node>),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(word)) if word == keyword) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn eat_op(&mut self, ops: &[&'static str]) -> Option<&'static str> {
        if let Some(Token::Op(op)) = self.peek() {
            if let Some(found) = ops.iter().find(|candidate| *candidate == op) {
                self.pos += 1;
                return Some(*found);
            }
        }
        None
    }

    fn or(&mut self) -> Result<Node, EvalError> {
        let mut node = self.and()?;
        while self.eat_keyword("or") {
            node = Node::Or(Box::new(node), Box::new(self.and()?));
        }
        Ok(node)
    }

    fn and(&mut self) -> Result<Node, EvalError> {
        let mut node = self.not()?;
        while self.eat_keyword("and") {
            node = Node::And(Box::new(node), Box::new(self.not()?));
        }
        Ok(node)
    }

    fn not(&mut self) -> Result<Node, EvalError> {
        if self.eat_keyword("not") {
            return Ok(Node::Not(Box::new(self.not()?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Node, EvalError> {
        let mut node = self.additive()?;
        while let Some(op) = self.eat_op(&["==", "!=", "<", "<=", ">", ">="]) {
            node = Node::Binary(op, Box::new(node), Box::new(self.additive()?));
        }
        Ok(node)
    }

    fn additive(&mut self) -> Result<Node, EvalError> {
        let mut node = self.multiplicative()?;
        while let Some(op) = self.eat_op(&["+", "-"]) {
            node = Node::Binary(op, Box::new(node), Box::new(self.multiplicative()?));
        }
        Ok(node)
    }

    fn multiplicative(&mut self) -> Result<Node, EvalError> {
        let mut node = self.unary()?;
        while let Some(op) = self.eat_op(&["*", "/"]) {
            node = Node::Binary(op, Box::new(node), Box::new(self.unary()?));
        }
        Ok(node)
    }

    fn unary(&mut self) -> Result<Node, EvalError> {
        if self.eat_op(&["-"]).is_some() {
            return Ok(Node::Neg(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Node, EvalError> {
        match self.next() {
            Some(Token::Num(n)) => Ok(Node::Literal(EvalValue::Num(n))),
            Some(Token::Str(s)) => Ok(Node::Literal(EvalValue::Str(s))),
            Some(Token::Ident(word)) => Ok(match word.as_str() {
                "true" | "True" => Node::Literal(EvalValue::Bool(true)),
                "false" | "False" => Node::Literal(EvalValue::Bool(false)),
                "None" | "null" => Node::Literal(EvalValue::Null),
                _ => Node::Name(word),
            }),
            Some(Token::LParen) => {
                let node = self.or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(node),
                    Some(other) => Err(EvalError::UnexpectedToken(format!("{other:?}"))),
                    None => Err(EvalError::UnexpectedEnd),
                }
            }
            Some(other) => Err(EvalError::UnexpectedToken(format!("{other:?}"))),
            None => Err(EvalError::UnexpectedEnd),
        }
    }
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    root: Node,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, EvalError> {
        let mut parser = Parser {
            tokens: tokenize(source)?,
            pos: 0,
        };
        let root = parser.or()?;
        match parser.next() {
            None => Ok(Self { root }),
            Some(token) => Err(EvalError::UnexpectedToken(format!("{token:?}"))),
        }
    }

    /// Evaluates with names resolved through `lookup`.
    pub fn eval<F>(&self, lookup: &F) -> Result<EvalValue, EvalError>
    where
        F: Fn(&str) -> Option<EvalValue>,
    {
        eval(&self.root, lookup)
    }
}

fn eval<F>(node: &Node, lookup: &F) -> Result<EvalValue, EvalError>
where
    F: Fn(&str) -> Option<EvalValue>,
{
    match node {
        Node::Literal(value) => Ok(value.clone()),
        Node::Name(name) => lookup(name).ok_or_else(|| EvalError::UnknownName(name.clone())),
        Node::Not(inner) => Ok(EvalValue::Bool(!eval(inner, lookup)?.truthy())),
        Node::Neg(inner) => match eval(inner, lookup)? {
            EvalValue::Num(n) => Ok(EvalValue::Num(-n)),
            _ => Err(EvalError::InvalidOperands("-")),
        },
        Node::And(left, right) => {
            let left = eval(left, lookup)?;
            if !left.truthy() {
                return Ok(left);
            }
            eval(right, lookup)
        }
        Node::Or(left, right) => {
            let left = eval(left, lookup)?;
            if left.truthy() {
                return Ok(left);
            }
            eval(right, lookup)
        }
        Node::Binary(op, left, right) => binary(*op, eval(left, lookup)?, eval(right, lookup)?),
    }
}

fn binary(op: &'static str, left: EvalValue, right: EvalValue) -> Result<EvalValue, EvalError> {
    use EvalValue::{Bool, Num, Str};
    match (op, left, right) {
        ("==", l, r) => Ok(Bool(l == r)),
        ("!=", l, r) => Ok(Bool(l != r)),
        ("+", Num(l), Num(r)) => Ok(Num(l + r)),
        ("+", Str(l), Str(r)) => Ok(Str(l + &r)),
        ("-", Num(l), Num(r)) => Ok(Num(l - r)),
        ("*", Num(l), Num(r)) => Ok(Num(l * r)),
        ("/", Num(_), Num(r)) if r == 0.0 => Err(EvalError::DivisionByZero),
        ("/", Num(l), Num(r)) => Ok(Num(l / r)),
        (op @ ("<" | "<=" | ">" | ">="), l, r) => {
            let ordering = match (&l, &r) {
                (Num(l), Num(r)) => l.partial_cmp(r),
                (Str(l), Str(r)) => Some(l.cmp(r)),
                _ => None,
            }
            .ok_or(EvalError::InvalidOperands(op))?;
            Ok(Bool(match op {
                "<" => ordering.is_lt(),
                "<=" => ordering.is_le(),
                ">" => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        (op, _, _) => Err(EvalError::InvalidOperands(op)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> Result<EvalValue, EvalError> {
        let lookup = |name: &str| match name {
            "salary" => Some(EvalValue::Num(100.0)),
            "bonus" => Some(EvalValue::Num(20.0)),
            "name" => Some(EvalValue::Str("ann".to_string())),
            "manager" => Some(EvalValue::Null),
            _ => None,
        };
        Expression::parse(source)?.eval(&lookup)
    }

    #[test]
    fn test_arithmetic_and_comparison() {
        assert_eq!(run("salary + bonus * 2 == 140"), Ok(EvalValue::Bool(true)));
        assert_eq!(run("(salary + bonus) / 2"), Ok(EvalValue::Num(60.0)));
        assert_eq!(run("salary > bonus and bonus >= 20"), Ok(EvalValue::Bool(true)));
        assert_eq!(run("-bonus < 0"), Ok(EvalValue::Bool(true)));
    }

    #[test]
    fn test_logic_and_literals() {
        assert_eq!(run("not manager"), Ok(EvalValue::Bool(true)));
        assert_eq!(run("manager == None"), Ok(EvalValue::Bool(true)));
        assert_eq!(run("name == 'ann' or false"), Ok(EvalValue::Bool(true)));
        assert_eq!(run("name + \"!\""), Ok(EvalValue::Str("ann!".to_string())));
    }

    #[test]
    fn test_errors() {
        assert_eq!(run("unknown > 1"), Err(EvalError::UnknownName("unknown".to_string())));
        assert_eq!(run("salary / 0"), Err(EvalError::DivisionByZero));
        assert_eq!(run("name > 1"), Err(EvalError::InvalidOperands(">")));
        assert_eq!(run("salary >"), Err(EvalError::UnexpectedEnd));
        assert_eq!(run("'open"), Err(EvalError::UnterminatedString));
        assert!(matches!(run("salary $ 1"), Err(EvalError::UnexpectedChar('$'))));
    }
}
