//! The small expression language used by `{#if}` and `class:name={…}`.
//!
//! ```text
//! or      = and ("||" and)*
//! and     = unary ("&&" unary)*
//! unary   = "!" unary | compare
//! compare = primary (("==" | "!=" | "<=" | ">=" | "<" | ">") primary)?
//! primary = "(" or ")" | "len(" name ")" | literal | name
//! ```

use std::cmp::Ordering;
use std::fmt;

use tandem_core::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid condition `{source_text}`: {reason}")]
pub struct ConditionError {
    pub source_text: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn as_str(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Name(String),
    Literal(Value),
    Len(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Or(Box<Condition>, Box<Condition>),
    And(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
    Compare(Operand, CmpOp, Operand),
    Operand(Operand),
}

/// Name resolution for condition evaluation: component fields plus loop locals.
pub trait Lookup {
    fn lookup(&self, name: &str) -> Option<Value>;
}

impl<F> Lookup for F
where
    F: Fn(&str) -> Option<Value>,
{
    fn lookup(&self, name: &str) -> Option<Value> {
        self(name)
    }
}

impl Condition {
    pub fn parse(src: &str) -> Result<Condition, ConditionError> {
        let tokens = tokenize(src).map_err(|reason| ConditionError {
            source_text: src.to_string(),
            reason,
        })?;
        let mut p = CondParser { tokens, pos: 0 };
        let fail = |reason: String| ConditionError {
            source_text: src.to_string(),
            reason,
        };
        if p.tokens.is_empty() {
            return Err(fail("empty condition".into()));
        }
        let cond = p.or().map_err(fail)?;
        if let Some(tok) = p.peek() {
            return Err(fail(format!("unexpected `{tok}`")));
        }
        Ok(cond)
    }

    pub fn eval(&self, env: &dyn Lookup) -> bool {
        match self {
            Condition::Or(a, b) => a.eval(env) || b.eval(env),
            Condition::And(a, b) => a.eval(env) && b.eval(env),
            Condition::Not(c) => !c.eval(env),
            Condition::Operand(o) => o.value(env).is_some_and(|v| v.truthy()),
            Condition::Compare(a, op, b) => {
                let (Some(a), Some(b)) = (a.value(env), b.value(env)) else {
                    return false;
                };
                match (compare(&a, &b), op) {
                    (Some(ord), op) => match op {
                        CmpOp::Eq => ord == Ordering::Equal,
                        CmpOp::Ne => ord != Ordering::Equal,
                        CmpOp::Lt => ord == Ordering::Less,
                        CmpOp::Le => ord != Ordering::Greater,
                        CmpOp::Gt => ord == Ordering::Greater,
                        CmpOp::Ge => ord != Ordering::Less,
                    },
                    (None, CmpOp::Ne) => true,
                    (None, _) => false,
                }
            }
        }
    }

    /// Every name the condition reads, in source order. `len(X)` reports `X`.
    pub fn names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Condition::Or(a, b) | Condition::And(a, b) => {
                a.collect_names(out);
                b.collect_names(out);
            }
            Condition::Not(c) => c.collect_names(out),
            Condition::Operand(o) => o.collect_name(out),
            Condition::Compare(a, _, b) => {
                a.collect_name(out);
                b.collect_name(out);
            }
        }
    }
}

impl Operand {
    fn value(&self, env: &dyn Lookup) -> Option<Value> {
        match self {
            Operand::Name(n) => env.lookup(n),
            Operand::Literal(v) => Some(v.clone()),
            Operand::Len(n) => env
                .lookup(n)
                .map(|v| Value::Int(v.len().unwrap_or(0) as i64)),
        }
    }

    fn collect_name<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Operand::Name(n) | Operand::Len(n) => out.push(n),
            Operand::Literal(_) => {}
        }
    }
}

/// Component refs compare equal to strings naming them, so `Page == 'Home'` works.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Component(c), Value::Str(s)) => Some(c.name().cmp(s.as_str())),
        (Value::Str(s), Value::Component(c)) => Some(s.as_str().cmp(c.name())),
        _ => a.compare(b),
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Name(n) => f.write_str(n),
            Operand::Len(n) => write!(f, "len({n})"),
            Operand::Literal(Value::Str(s)) => write!(f, "'{s}'"),
            Operand::Literal(v) => write!(f, "{v}"),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Or(a, b) => write!(f, "({a} || {b})"),
            Condition::And(a, b) => write!(f, "({a} && {b})"),
            Condition::Not(c) => write!(f, "!{c}"),
            Condition::Compare(a, op, b) => write!(f, "{a} {} {b}", op.as_str()),
            Condition::Operand(o) => write!(f, "{o}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Lit(Value),
    Op(&'static str),
    LParen,
    RParen,
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tok::Ident(s) => f.write_str(s),
            Tok::Lit(v) => write!(f, "{v}"),
            Tok::Op(o) => f.write_str(o),
            Tok::LParen => f.write_str("("),
            Tok::RParen => f.write_str(")"),
        }
    }
}

const OPERATORS: &[&str] = &["||", "&&", "==", "!=", "<=", ">=", "<", ">", "!"];

fn tokenize(src: &str) -> Result<Vec<Tok>, String> {
    let mut out = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '(' {
            out.push(Tok::LParen);
            i += 1;
            continue;
        }
        if c == ')' {
            out.push(Tok::RParen);
            i += 1;
            continue;
        }
        if c == '\'' || c == '"' {
            let start = i + 1;
            let mut j = start;
            while j < chars.len() && chars[j] != c {
                j += 1;
            }
            if j >= chars.len() {
                return Err("unterminated string literal".into());
            }
            out.push(Tok::Lit(Value::Str(chars[start..j].iter().collect())));
            i = j + 1;
            continue;
        }
        if c.is_ascii_digit() || (c == '-' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()))
        {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            out.push(Tok::Lit(parse_number(&text)?));
            continue;
        }
        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            out.push(match word.as_str() {
                "true" => Tok::Lit(Value::Bool(true)),
                "false" => Tok::Lit(Value::Bool(false)),
                _ => Tok::Ident(word),
            });
            continue;
        }
        let rest: String = chars[i..chars.len().min(i + 2)].iter().collect();
        match OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            Some(op) => {
                out.push(Tok::Op(op));
                i += op.len();
            }
            None => return Err(format!("unexpected character `{c}`")),
        }
    }
    Ok(out)
}

fn parse_number(text: &str) -> Result<Value, String> {
    if text.contains('.') {
        text.parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("bad number `{text}`"))
    } else {
        text.parse::<i64>()
            .map(Value::Int)
            .map_err(|_| format!("bad number `{text}`"))
    }
}

struct CondParser {
    tokens: Vec<Tok>,
    pos: usize,
}

impl CondParser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Tok> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if matches!(self.peek(), Some(Tok::Op(o)) if *o == op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Result<Condition, String> {
        let mut lhs = self.and()?;
        while self.eat_op("||") {
            let rhs = self.and()?;
            lhs = Condition::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Condition, String> {
        let mut lhs = self.unary()?;
        while self.eat_op("&&") {
            let rhs = self.unary()?;
            lhs = Condition::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Condition, String> {
        if self.eat_op("!") {
            return Ok(Condition::Not(Box::new(self.unary()?)));
        }
        self.compare()
    }

    fn compare(&mut self) -> Result<Condition, String> {
        if matches!(self.peek(), Some(Tok::LParen)) {
            self.pos += 1;
            let inner = self.or()?;
            return match self.bump() {
                Some(Tok::RParen) => Ok(inner),
                _ => Err("missing `)`".into()),
            };
        }
        let lhs = self.operand()?;
        let op = match self.peek() {
            Some(Tok::Op("==")) => CmpOp::Eq,
            Some(Tok::Op("!=")) => CmpOp::Ne,
            Some(Tok::Op("<")) => CmpOp::Lt,
            Some(Tok::Op("<=")) => CmpOp::Le,
            Some(Tok::Op(">")) => CmpOp::Gt,
            Some(Tok::Op(">=")) => CmpOp::Ge,
            _ => return Ok(Condition::Operand(lhs)),
        };
        self.pos += 1;
        let rhs = self.operand()?;
        Ok(Condition::Compare(lhs, op, rhs))
    }

    fn operand(&mut self) -> Result<Operand, String> {
        match self.bump() {
            Some(Tok::Lit(v)) => Ok(Operand::Literal(v)),
            Some(Tok::Ident(name)) if name == "len" && self.peek() == Some(&Tok::LParen) => {
                self.pos += 1;
                let inner = match self.bump() {
                    Some(Tok::Ident(n)) => n,
                    _ => return Err("`len` takes a name".into()),
                };
                match self.bump() {
                    Some(Tok::RParen) => Ok(Operand::Len(inner)),
                    _ => Err("missing `)` after len".into()),
                }
            }
            Some(Tok::Ident(name)) => Ok(Operand::Name(name)),
            Some(tok) => Err(format!("unexpected `{tok}`")),
            None => Err("unexpected end of condition".into()),
        }
    }
}
