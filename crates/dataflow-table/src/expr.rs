//! Row-wise scalar expression dialect shared by `transform`'s filter and
//! computed-column config.
//!
//! Operand set: column references, `@name` ambient scalars, numeric and
//! quoted text literals, `+ - * / % ( )`, comparisons, and `&`/`|` for
//! boolean combination. The filter-only Excel-style equality shortcut is
//! layered on top by [`parse_filter`].

use crate::value::Value;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Column(String),
    Ambient(String),
    Num(f64),
    Str(String),
    Bool(bool),
    Null,
    Neg(Box<Expr>),
    BinOp(Box<Expr>, Op, Box<Expr>),
}

#[derive(Debug, thiserror::Error)]
pub enum ExprError {
    #[error("expression parse error: {0}")]
    Parse(String),
}

type PResult<T> = Result<T, ExprError>;

/// Tokens: identifiers/words (any run of non-operator, non-space,
/// non-quote characters — covers CJK store names etc.), numbers, quoted
/// strings, and the fixed operator/paren set.
#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Word(String),
    Num(f64),
    Str(String),
    Op(String),
    LParen,
    RParen,
    Eof,
}

fn is_op_char(c: char) -> bool {
    matches!(
        c,
        '(' | ')' | '&' | '|' | '=' | '!' | '<' | '>' | '+' | '-' | '*' | '/' | '%'
    )
}

fn tokenize(src: &str) -> PResult<Vec<Tok>> {
    let mut toks = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '(' {
            toks.push(Tok::LParen);
            i += 1;
            continue;
        }
        if c == ')' {
            toks.push(Tok::RParen);
            i += 1;
            continue;
        }
        if c == '\'' || c == '"' {
            let quote = c;
            let mut s = String::new();
            i += 1;
            while i < chars.len() && chars[i] != quote {
                s.push(chars[i]);
                i += 1;
            }
            if i >= chars.len() {
                return Err(ExprError::Parse("unterminated string literal".into()));
            }
            i += 1;
            toks.push(Tok::Str(s));
            continue;
        }
        if c == '@' {
            i += 1;
            let start = i;
            while i < chars.len() && !is_op_char(chars[i]) && !chars[i].is_whitespace() {
                i += 1;
            }
            toks.push(Tok::Word(format!("@{}", chars[start..i].iter().collect::<String>())));
            continue;
        }
        if is_op_char(c) {
            // two-char operators
            let two: String = chars[i..(i + 2).min(chars.len())].iter().collect();
            if ["==", "!=", "<=", ">="].contains(&two.as_str()) {
                toks.push(Tok::Op(two));
                i += 2;
                continue;
            }
            toks.push(Tok::Op(c.to_string()));
            i += 1;
            continue;
        }
        // word: identifier, possibly a number
        let start = i;
        while i < chars.len() && !is_op_char(chars[i]) && !chars[i].is_whitespace() && chars[i] != '\'' && chars[i] != '"' {
            i += 1;
        }
        let word: String = chars[start..i].iter().collect();
        if let Ok(n) = word.parse::<f64>() {
            toks.push(Tok::Num(n));
        } else {
            toks.push(Tok::Word(word));
        }
    }
    toks.push(Tok::Eof);
    Ok(toks)
}

struct Parser {
    toks: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Tok {
        &self.toks[self.pos]
    }

    fn advance(&mut self) -> Tok {
        let t = self.toks[self.pos].clone();
        if self.pos + 1 < self.toks.len() {
            self.pos += 1;
        }
        t
    }

    fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_and()?;
        loop {
            if matches!(self.peek(), Tok::Op(o) if o == "|") {
                self.advance();
                let rhs = self.parse_and()?;
                lhs = Expr::BinOp(Box::new(lhs), Op::Or, Box::new(rhs));
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_cmp()?;
        loop {
            if matches!(self.peek(), Tok::Op(o) if o == "&") {
                self.advance();
                let rhs = self.parse_cmp()?;
                lhs = Expr::BinOp(Box::new(lhs), Op::And, Box::new(rhs));
            } else {
                break;
            }
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> PResult<Expr> {
        let lhs = self.parse_add()?;
        let op = match self.peek() {
            Tok::Op(o) if o == "==" => Some(Op::Eq),
            Tok::Op(o) if o == "!=" => Some(Op::Ne),
            Tok::Op(o) if o == "<=" => Some(Op::Le),
            Tok::Op(o) if o == ">=" => Some(Op::Ge),
            Tok::Op(o) if o == "<" => Some(Op::Lt),
            Tok::Op(o) if o == ">" => Some(Op::Gt),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let rhs = self.parse_add()?;
            return Ok(Expr::BinOp(Box::new(lhs), op, Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn parse_add(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Tok::Op(o) if o == "+" => Some(Op::Add),
                Tok::Op(o) if o == "-" => Some(Op::Sub),
                _ => None,
            };
            match op {
                Some(op) => {
                    self.advance();
                    let rhs = self.parse_mul()?;
                    lhs = Expr::BinOp(Box::new(lhs), op, Box::new(rhs));
                }
                None => break,
            }
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Tok::Op(o) if o == "*" => Some(Op::Mul),
                Tok::Op(o) if o == "/" => Some(Op::Div),
                Tok::Op(o) if o == "%" => Some(Op::Mod),
                _ => None,
            };
            match op {
                Some(op) => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::BinOp(Box::new(lhs), op, Box::new(rhs));
                }
                None => break,
            }
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        if matches!(self.peek(), Tok::Op(o) if o == "-") {
            self.advance();
            let e = self.parse_unary()?;
            return Ok(Expr::Neg(Box::new(e)));
        }
        if matches!(self.peek(), Tok::Op(o) if o == "!") {
            self.advance();
            let e = self.parse_unary()?;
            // `!x` modeled as `x == false`
            return Ok(Expr::BinOp(Box::new(e), Op::Eq, Box::new(Expr::Bool(false))));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> PResult<Expr> {
        match self.advance() {
            Tok::LParen => {
                let e = self.parse_expr()?;
                match self.advance() {
                    Tok::RParen => Ok(e),
                    other => Err(ExprError::Parse(format!("expected ')', found {:?}", other))),
                }
            }
            Tok::Num(n) => Ok(Expr::Num(n)),
            Tok::Str(s) => Ok(Expr::Str(s)),
            Tok::Word(w) => {
                if let Some(rest) = w.strip_prefix('@') {
                    return Ok(Expr::Ambient(rest.to_string()));
                }
                match w.as_str() {
                    "True" | "true" => Ok(Expr::Bool(true)),
                    "False" | "false" => Ok(Expr::Bool(false)),
                    "None" | "null" => Ok(Expr::Null),
                    _ => Ok(Expr::Column(w)),
                }
            }
            other => Err(ExprError::Parse(format!("unexpected token {:?}", other))),
        }
    }
}

/// Parses the generic expression dialect (used for computed columns).
pub fn parse_expr(src: &str) -> PResult<Expr> {
    let toks = tokenize(src)?;
    let mut p = Parser { toks, pos: 0 };
    let e = p.parse_expr()?;
    if !matches!(p.peek(), Tok::Eof) {
        return Err(ExprError::Parse(format!(
            "trailing tokens after expression: {:?}",
            p.peek()
        )));
    }
    Ok(e)
}

/// Parses `transform.filter_code`, applying the Excel-style equality
/// shortcut: a bare `=` (including full-width `＝`) outside of
/// `== != <= >= < >` means equality, and a right-hand operand of `==`/`!=`
/// that is not numeric, not an existing column name, and not
/// `True|False|None` is auto-quoted as a text literal.
pub fn parse_filter(src: &str, column_names: &[String]) -> PResult<Expr> {
    let normalized = normalize_filter_source(src);
    let toks = tokenize(&normalized)?;
    let toks = requote_bare_rhs(toks, column_names);
    let mut p = Parser { toks, pos: 0 };
    let e = p.parse_expr()?;
    if !matches!(p.peek(), Tok::Eof) {
        return Err(ExprError::Parse(format!(
            "trailing tokens after filter expression: {:?}",
            p.peek()
        )));
    }
    Ok(e)
}

/// Replaces full-width `＝` with ascii `=`, then rewrites bare `=` (not
/// part of `==`, `!=`, `<=`, `>=`) into `==`.
fn normalize_filter_source(src: &str) -> String {
    let src: String = src.chars().map(|c| if c == '＝' { '=' } else { c }).collect();
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::new();
    let mut i = 0usize;
    while i < chars.len() {
        let c = chars[i];
        if c == '=' {
            let prev = if i > 0 { Some(chars[i - 1]) } else { None };
            let next = chars.get(i + 1).copied();
            if next == Some('=') {
                out.push('=');
                out.push('=');
                i += 2;
                continue;
            }
            if matches!(prev, Some('!') | Some('<') | Some('>')) {
                out.push('=');
                i += 1;
                continue;
            }
            out.push_str("==");
            i += 1;
            continue;
        }
        out.push(c);
        i += 1;
    }
    out
}

/// After tokenizing, walk `== !=` pairs and re-wrap a bare `Word` RHS that
/// isn't a known column / reserved literal as a `Str` token.
fn requote_bare_rhs(toks: Vec<Tok>, column_names: &[String]) -> Vec<Tok> {
    let mut out = toks.clone();
    for i in 0..out.len() {
        let is_eq_ne = matches!(&out[i], Tok::Op(o) if o == "==" || o == "!=");
        if !is_eq_ne {
            continue;
        }
        if let Some(rhs_idx) = i.checked_add(1) {
            if let Some(Tok::Word(w)) = out.get(rhs_idx).cloned() {
                let reserved = matches!(w.as_str(), "True" | "False" | "None" | "true" | "false" | "null");
                let is_num = w.parse::<f64>().is_ok();
                let is_column = column_names.iter().any(|c| c == &w);
                let is_ambient = w.starts_with('@');
                if !reserved && !is_num && !is_column && !is_ambient {
                    out[rhs_idx] = Tok::Str(w);
                }
            }
        }
    }
    out
}

/// Row evaluation context: column values by name, plus ambient scalars
/// referenced via `@name`.
pub struct EvalCtx<'a> {
    pub row: &'a HashMap<String, Value>,
    pub ambient: &'a HashMap<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("unknown column '{0}' referenced in expression")]
    UnknownColumn(String),
    #[error("unknown ambient scalar '{0}' referenced in expression")]
    UnknownAmbient(String),
    #[error("cannot apply operator to non-numeric operands")]
    NotNumeric,
}

pub fn eval(expr: &Expr, ctx: &EvalCtx) -> Result<Value, EvalError> {
    match expr {
        Expr::Num(n) => Ok(Value::Real(*n)),
        Expr::Str(s) => Ok(Value::Text(s.clone())),
        Expr::Bool(b) => Ok(Value::Boolean(*b)),
        Expr::Null => Ok(Value::Absent),
        Expr::Column(name) => ctx
            .row
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownColumn(name.clone())),
        Expr::Ambient(name) => ctx
            .ambient
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownAmbient(name.clone())),
        Expr::Neg(inner) => {
            let v = eval(inner, ctx)?;
            let n = v.as_f64().ok_or(EvalError::NotNumeric)?;
            Ok(Value::Real(-n))
        }
        Expr::BinOp(lhs, op, rhs) => {
            let l = eval(lhs, ctx)?;
            let r = eval(rhs, ctx)?;
            eval_binop(&l, op, &r)
        }
    }
}

fn eval_binop(l: &Value, op: &Op, r: &Value) -> Result<Value, EvalError> {
    match op {
        Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Mod => {
            let a = l.as_f64().ok_or(EvalError::NotNumeric)?;
            let b = r.as_f64().ok_or(EvalError::NotNumeric)?;
            let v = match op {
                Op::Add => a + b,
                Op::Sub => a - b,
                Op::Mul => a * b,
                Op::Div => {
                    if b == 0.0 {
                        f64::NAN
                    } else {
                        a / b
                    }
                }
                Op::Mod => {
                    if b == 0.0 {
                        f64::NAN
                    } else {
                        a % b
                    }
                }
                _ => unreachable!(),
            };
            Ok(Value::Real(v))
        }
        Op::Eq => Ok(Value::Boolean(l == r)),
        Op::Ne => Ok(Value::Boolean(l != r)),
        Op::Lt | Op::Le | Op::Gt | Op::Ge => {
            let ord = l.partial_cmp_value(r).ok_or(EvalError::NotNumeric)?;
            let b = match op {
                Op::Lt => ord == std::cmp::Ordering::Less,
                Op::Le => ord != std::cmp::Ordering::Greater,
                Op::Gt => ord == std::cmp::Ordering::Greater,
                Op::Ge => ord != std::cmp::Ordering::Less,
                _ => unreachable!(),
            };
            Ok(Value::Boolean(b))
        }
        Op::And => Ok(Value::Boolean(
            l.as_bool().unwrap_or(false) && r.as_bool().unwrap_or(false),
        )),
        Op::Or => Ok(Value::Boolean(
            l.as_bool().unwrap_or(false) || r.as_bool().unwrap_or(false),
        )),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn parses_arithmetic_and_evaluates() {
        let e = parse_expr("a + b * 2").unwrap();
        let r = row(&[("a", Value::Integer(1)), ("b", Value::Integer(3))]);
        let ambient = HashMap::new();
        let ctx = EvalCtx { row: &r, ambient: &ambient };
        let v = eval(&e, &ctx).unwrap();
        assert_eq!(v.as_f64(), Some(7.0));
    }

    #[test]
    fn excel_shortcut_equality_auto_quotes_rhs() {
        let cols = vec!["办公室团队".to_string()];
        let e = parse_filter("办公室团队=邯郸刘洋", &cols).unwrap();
        let r = row(&[("办公室团队", Value::Text("邯郸刘洋".to_string()))]);
        let ambient = HashMap::new();
        let ctx = EvalCtx { row: &r, ambient: &ambient };
        let v = eval(&e, &ctx).unwrap();
        assert_eq!(v.as_bool(), Some(true));

        let r2 = row(&[("办公室团队", Value::Text("石家庄张三".to_string()))]);
        let ctx2 = EvalCtx { row: &r2, ambient: &ambient };
        let v2 = eval(&e, &ctx2).unwrap();
        assert_eq!(v2.as_bool(), Some(false));
    }

    #[test]
    fn rhs_column_reference_not_requoted() {
        let cols = vec!["a".to_string(), "b".to_string()];
        let e = parse_filter("a == b", &cols).unwrap();
        let r = row(&[("a", Value::Integer(5)), ("b", Value::Integer(5))]);
        let ambient = HashMap::new();
        let ctx = EvalCtx { row: &r, ambient: &ambient };
        assert_eq!(eval(&e, &ctx).unwrap().as_bool(), Some(true));
    }

    #[test]
    fn numeric_vs_text_join_key_equality() {
        assert_eq!(Value::Integer(42), Value::Text("42".to_string()));
    }
}
