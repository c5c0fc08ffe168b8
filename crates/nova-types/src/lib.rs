//! Java type signatures as written in source.
//!
//! Nova does not type-check bodies; it only needs enough structure to compare
//! generic instantiations (search accuracy), render JVM-style signatures for
//! completion proposals and erase types for overload matching.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "double", "float", "int", "long", "short", "void",
];

/// A (possibly parameterized, possibly array) type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeSig {
    /// Simple or dotted name as written (`List`, `java.util.List`, `int`).
    pub name: String,
    /// Type arguments; empty for raw and non-generic references.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<TypeArg>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub array_dims: u8,
}

fn is_zero(dims: &u8) -> bool {
    *dims == 0
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeArg {
    Type(TypeSig),
    /// `?`
    Wildcard,
    /// `? extends T`
    Extends(TypeSig),
    /// `? super T`
    Super(TypeSig),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {position} in `{input}`")]
pub struct TypeSigParseError {
    message: &'static str,
    position: usize,
    input: String,
}

impl TypeSig {
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            array_dims: 0,
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeArg>) -> Self {
        Self {
            name: name.into(),
            args,
            array_dims: 0,
        }
    }

    pub fn parse(text: &str) -> Result<Self, TypeSigParseError> {
        let mut parser = SigParser {
            input: text,
            bytes: text.as_bytes(),
            pos: 0,
        };
        let sig = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != parser.bytes.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(sig)
    }

    pub fn is_primitive(&self) -> bool {
        self.array_dims == 0 && PRIMITIVES.contains(&self.name.as_str())
    }

    pub fn is_void(&self) -> bool {
        self.array_dims == 0 && self.name == "void"
    }

    pub fn is_parameterized(&self) -> bool {
        !self.args.is_empty()
    }

    pub fn simple_name(&self) -> &str {
        self.name.rsplit_once('.').map(|(_, s)| s).unwrap_or(&self.name)
    }

    #[must_use]
    pub fn erasure(&self) -> TypeSig {
        TypeSig {
            name: self.name.clone(),
            args: Vec::new(),
            array_dims: self.array_dims,
        }
    }

    /// JVM-style signature with dotted names (`Ljava.util.List<Ljava.lang.String;>;`).
    pub fn signature(&self) -> String {
        let mut out = String::new();
        self.write_signature(&mut out);
        out
    }

    fn write_signature(&self, out: &mut String) {
        for _ in 0..self.array_dims {
            out.push('[');
        }
        let primitive = match self.name.as_str() {
            "boolean" => Some('Z'),
            "byte" => Some('B'),
            "char" => Some('C'),
            "double" => Some('D'),
            "float" => Some('F'),
            "int" => Some('I'),
            "long" => Some('J'),
            "short" => Some('S'),
            "void" => Some('V'),
            _ => None,
        };
        if let Some(code) = primitive {
            out.push(code);
            return;
        }
        out.push('L');
        out.push_str(&self.name);
        if !self.args.is_empty() {
            out.push('<');
            for arg in &self.args {
                match arg {
                    TypeArg::Type(ty) => ty.write_signature(out),
                    TypeArg::Wildcard => out.push('*'),
                    TypeArg::Extends(ty) => {
                        out.push('+');
                        ty.write_signature(out);
                    }
                    TypeArg::Super(ty) => {
                        out.push('-');
                        ty.write_signature(out);
                    }
                }
            }
            out.push('>');
        }
        out.push(';');
    }
}

/// `true` if two written names can denote the same type: equal, or one is the
/// simple-name tail of the other (`List` vs `java.util.List`).
pub fn names_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let tail_of = |short: &str, long: &str| {
        long.len() > short.len()
            && long.ends_with(short)
            && long.as_bytes()[long.len() - short.len() - 1] == b'.'
    };
    tail_of(a, b) || tail_of(b, a)
}

impl fmt::Display for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        for _ in 0..self.array_dims {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeArg::Type(ty) => write!(f, "{ty}"),
            TypeArg::Wildcard => f.write_str("?"),
            TypeArg::Extends(ty) => write!(f, "? extends {ty}"),
            TypeArg::Super(ty) => write!(f, "? super {ty}"),
        }
    }
}

struct SigParser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SigParser<'a> {
    fn error(&self, message: &'static str) -> TypeSigParseError {
        TypeSigParseError {
            message,
            position: self.pos,
            input: self.input.to_string(),
        }
    }

    fn skip_ws(&mut self) {
        while self.bytes.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, b: u8) -> bool {
        self.skip_ws();
        if self.bytes.get(self.pos) == Some(&b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Option<&'a str> {
        let input: &'a str = self.input;
        self.skip_ws();
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|&b| b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80)
        {
            self.pos += 1;
        }
        (self.pos > start).then(|| &input[start..self.pos])
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let save = self.pos;
        match self.ident() {
            Some(word) if word == keyword => true,
            _ => {
                self.pos = save;
                false
            }
        }
    }

    fn parse_type(&mut self) -> Result<TypeSig, TypeSigParseError> {
        let mut name = self
            .ident()
            .ok_or_else(|| self.error("expected type name"))?
            .to_string();
        loop {
            let save = self.pos;
            if !self.eat(b'.') {
                break;
            }
            match self.ident() {
                Some(seg) => {
                    name.push('.');
                    name.push_str(seg);
                }
                None => {
                    self.pos = save;
                    break;
                }
            }
        }

        let mut args = Vec::new();
        if self.eat(b'<') {
            if !self.eat(b'>') {
                loop {
                    args.push(self.parse_arg()?);
                    if self.eat(b',') {
                        continue;
                    }
                    if self.eat(b'>') {
                        break;
                    }
                    return Err(self.error("expected `,` or `>`"));
                }
            }
        }

        let mut array_dims = 0u8;
        while self.eat(b'[') {
            if !self.eat(b']') {
                return Err(self.error("expected `]`"));
            }
            array_dims = array_dims.saturating_add(1);
        }

        Ok(TypeSig {
            name,
            args,
            array_dims,
        })
    }

    fn parse_arg(&mut self) -> Result<TypeArg, TypeSigParseError> {
        if self.eat(b'?') {
            if self.eat_keyword("extends") {
                return Ok(TypeArg::Extends(self.parse_type()?));
            }
            if self.eat_keyword("super") {
                return Ok(TypeArg::Super(self.parse_type()?));
            }
            return Ok(TypeArg::Wildcard);
        }
        Ok(TypeArg::Type(self.parse_type()?))
    }
}
