//! Recursive-descent parser for the USDA text grammar.
//!
//! Covers the subset scene descriptions use: layer metadata, nested prims
//! (`def`/`over`/`class`) with optional metadata, typed attributes,
//! relationships, and values made of numbers, strings, asset paths, scene
//! paths, tuples, arrays and identifiers. Dictionary values
//! (`customData`, `timeSamples`) are skipped as opaque.

use super::lexer::{tokenize, Spanned, Token};
use crate::BundleError;

// ---------------------------------------------------------------------------
// Syntax tree
// ---------------------------------------------------------------------------

/// A parsed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
    String(String),
    Asset(String),
    Path(String),
    Ident(String),
    Tuple(Vec<Value>),
    Array(Vec<Value>),
    /// A dictionary or other block the parser does not interpret.
    Opaque,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Interpret as a boolean: `true`/`false` or a number (non-zero is true).
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => Some(*n != 0.0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Ident(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret as a fixed-size tuple of numbers.
    pub fn as_numbers<const N: usize>(&self) -> Option<[f64; N]> {
        let Value::Tuple(items) = self else {
            return None;
        };
        if items.len() != N {
            return None;
        }
        let mut out = [0.0; N];
        for (slot, item) in out.iter_mut().zip(items) {
            *slot = item.as_f64()?;
        }
        Some(out)
    }

    /// The first asset path found in this value (directly or in an array).
    pub fn first_asset(&self) -> Option<&str> {
        match self {
            Value::Asset(a) => Some(a),
            Value::Array(items) | Value::Tuple(items) => items.iter().find_map(Value::first_asset),
            _ => None,
        }
    }
}

/// `[op] key = value` inside a metadata block.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    /// List edit operation (`prepend`, `append`, `delete`, `add`, `reorder`).
    pub op: Option<String>,
    pub key: String,
    pub value: Value,
}

/// An attribute or relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Type name (`double3`, `token[]`, or `rel` for relationships).
    pub type_name: String,
    pub name: String,
    pub uniform: bool,
    pub value: Option<Value>,
}

/// A prim and everything nested in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Prim {
    pub specifier: String,
    pub type_name: Option<String>,
    pub name: String,
    pub metadata: Vec<MetadataEntry>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Prim>,
}

impl Prim {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.iter().find(|m| m.key == key).map(|m| &m.value)
    }
}

/// A whole document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    pub metadata: Vec<MetadataEntry>,
    pub prims: Vec<Prim>,
}

impl Layer {
    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.iter().find(|m| m.key == key).map(|m| &m.value)
    }

    /// Every prim in depth-first document order, with its nesting depth
    /// (0 for root prims).
    pub fn walk(&self) -> Vec<(usize, &Prim)> {
        fn visit<'a>(prim: &'a Prim, depth: usize, out: &mut Vec<(usize, &'a Prim)>) {
            out.push((depth, prim));
            for child in &prim.children {
                visit(child, depth + 1, out);
            }
        }
        let mut out = Vec::new();
        for prim in &self.prims {
            visit(prim, 0, &mut out);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

const LIST_OPS: [&str; 5] = ["prepend", "append", "delete", "add", "reorder"];
const SPECIFIERS: [&str; 3] = ["def", "over", "class"];

/// Parse a USDA document.
pub fn parse_layer(src: &str) -> Result<Layer, BundleError> {
    let tokens = tokenize(src)?;
    Parser { tokens, pos: 0 }.layer()
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, details: impl Into<String>) -> BundleError {
        let (line, column) = match self.tokens.get(self.pos).or(self.tokens.last()) {
            Some(s) => (s.line, s.column),
            None => (1, 1),
        };
        BundleError::MalformedDescription {
            line,
            column,
            details: details.into(),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), BundleError> {
        match self.peek() {
            Some(t) if *t == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(t) => Err(self.error(format!("expected {expected:?}, found {t:?}"))),
            None => Err(self.error(format!("expected {expected:?}, found end of input"))),
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Result<String, BundleError> {
        match self.next() {
            Some(Token::Ident(s)) => Ok(s),
            Some(other) => {
                self.pos -= 1;
                Err(self.error(format!("expected identifier, found {other:?}")))
            }
            None => Err(self.error("expected identifier, found end of input")),
        }
    }

    // -- layer / prims ------------------------------------------------------

    fn layer(mut self) -> Result<Layer, BundleError> {
        let mut layer = Layer::default();
        if self.peek() == Some(&Token::LParen) {
            layer.metadata = self.metadata_block()?;
        }
        while let Some(token) = self.peek() {
            match token {
                Token::Ident(word) if SPECIFIERS.contains(&word.as_str()) => {
                    let prim = self.prim()?;
                    layer.prims.push(prim);
                }
                other => {
                    return Err(self.error(format!("expected prim definition, found {other:?}")))
                }
            }
        }
        Ok(layer)
    }

    fn prim(&mut self) -> Result<Prim, BundleError> {
        let specifier = self.ident()?;
        let type_name = match self.peek() {
            Some(Token::Ident(_)) => Some(self.ident()?),
            _ => None,
        };
        let name = match self.next() {
            Some(Token::Str(s)) => s,
            _ => {
                self.pos = self.pos.saturating_sub(1);
                return Err(self.error("expected quoted prim name"));
            }
        };

        let metadata = if self.peek() == Some(&Token::LParen) {
            self.metadata_block()?
        } else {
            Vec::new()
        };

        let mut prim = Prim {
            specifier,
            type_name,
            name,
            metadata,
            attributes: Vec::new(),
            children: Vec::new(),
        };

        self.expect(Token::LBrace)?;
        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    self.pos += 1;
                    break;
                }
                Some(Token::Ident(word)) if SPECIFIERS.contains(&word.as_str()) => {
                    let child = self.prim()?;
                    prim.children.push(child);
                }
                Some(Token::Ident(word)) if word == "variantSet" => {
                    self.skip_variant_set()?;
                }
                Some(Token::Ident(_)) => {
                    let attribute = self.property()?;
                    prim.attributes.push(attribute);
                }
                Some(Token::Semicolon) => {
                    self.pos += 1;
                }
                Some(other) => {
                    return Err(self.error(format!("unexpected {other:?} in prim body")));
                }
                None => return Err(self.error(format!("unclosed prim \"{}\"", prim.name))),
            }
        }
        Ok(prim)
    }

    fn skip_variant_set(&mut self) -> Result<(), BundleError> {
        self.ident()?;
        if let Some(Token::Str(_)) = self.peek() {
            self.pos += 1;
        }
        self.expect(Token::Equals)?;
        self.skip_balanced(Token::LBrace, Token::RBrace)
    }

    /// Attribute or relationship declaration.
    fn property(&mut self) -> Result<Attribute, BundleError> {
        let mut uniform = false;
        let mut word = self.ident()?;
        loop {
            match word.as_str() {
                "custom" | "varying" => word = self.ident()?,
                "uniform" => {
                    uniform = true;
                    word = self.ident()?;
                }
                _ => break,
            }
        }
        if LIST_OPS.contains(&word.as_str()) {
            word = self.ident()?;
        }

        let mut type_name = word;
        if type_name != "rel" && self.peek() == Some(&Token::LBracket) {
            self.expect(Token::LBracket)?;
            self.expect(Token::RBracket)?;
            type_name.push_str("[]");
        }
        let name = self.ident()?;

        let value = if self.eat(&Token::Equals) {
            Some(self.value()?)
        } else {
            None
        };
        if self.peek() == Some(&Token::LParen) {
            // Attribute metadata is accepted but not kept.
            self.metadata_block()?;
        }

        Ok(Attribute {
            type_name,
            name,
            uniform,
            value,
        })
    }

    /// `( entry* )` where an entry is a bare doc string or `[op] key = value`.
    fn metadata_block(&mut self) -> Result<Vec<MetadataEntry>, BundleError> {
        self.expect(Token::LParen)?;
        let mut entries = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RParen) => {
                    self.pos += 1;
                    break;
                }
                Some(Token::Str(_)) | Some(Token::Semicolon) => {
                    self.pos += 1;
                }
                Some(Token::Ident(_)) => {
                    let mut key = self.ident()?;
                    let mut op = None;
                    if LIST_OPS.contains(&key.as_str())
                        && matches!(self.peek(), Some(Token::Ident(_)))
                    {
                        op = Some(key);
                        key = self.ident()?;
                    }
                    let value = if self.eat(&Token::Equals) {
                        self.value()?
                    } else {
                        Value::Opaque
                    };
                    entries.push(MetadataEntry { op, key, value });
                }
                Some(other) => {
                    return Err(self.error(format!("unexpected {other:?} in metadata")));
                }
                None => return Err(self.error("unclosed metadata block")),
            }
        }
        Ok(entries)
    }

    fn value(&mut self) -> Result<Value, BundleError> {
        let Some(token) = self.next() else {
            return Err(self.error("expected value, found end of input"));
        };
        let value = match token {
            Token::Number(text) => Value::Number(self.number(&text)?),
            Token::Str(s) => Value::String(s),
            Token::Asset(a) => {
                // `@file@</Prim>` targets a prim inside the asset; only the
                // file matters here.
                if let Some(Token::Path(_)) = self.peek() {
                    self.pos += 1;
                }
                Value::Asset(a)
            }
            Token::Path(p) => Value::Path(p),
            Token::Ident(word) => match word.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => match word.parse::<f64>() {
                    Ok(n) => Value::Number(n),
                    Err(_) => Value::Ident(word),
                },
            },
            Token::LParen => Value::Tuple(self.sequence(Token::RParen)?),
            Token::LBracket => Value::Array(self.sequence(Token::RBracket)?),
            Token::LBrace => {
                self.pos -= 1;
                self.skip_balanced(Token::LBrace, Token::RBrace)?;
                Value::Opaque
            }
            other => {
                self.pos -= 1;
                return Err(self.error(format!("expected value, found {other:?}")));
            }
        };
        Ok(value)
    }

    fn number(&self, text: &str) -> Result<f64, BundleError> {
        text.parse::<f64>()
            .map_err(|_| self.error(format!("invalid number '{text}'")))
    }

    /// Comma-separated values up to `close` (trailing comma allowed).
    fn sequence(&mut self, close: Token) -> Result<Vec<Value>, BundleError> {
        let mut items = Vec::new();
        loop {
            if self.eat(&close) {
                return Ok(items);
            }
            items.push(self.value()?);
            if !self.eat(&Token::Comma) {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn skip_balanced(&mut self, open: Token, close: Token) -> Result<(), BundleError> {
        self.expect(open.clone())?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.next() {
                Some(t) if t == open => depth += 1,
                Some(t) if t == close => depth -= 1,
                Some(_) => {}
                None => return Err(self.error("unbalanced block")),
            }
        }
        Ok(())
    }
}
