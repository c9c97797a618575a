//! Syntactic type references.
//!
//! Type references arrive as strings (`"int"`, `"Ns.List<T>"`, `"S[]"`) and
//! are parsed once at load time. Resolution to semantic types happens later,
//! in the scope of the declaration that wrote them.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Builtin types with keyword spellings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Void,
    Bool,
    Char,
    Sbyte,
    Byte,
    Short,
    Ushort,
    Int,
    Uint,
    Long,
    Ulong,
    Float,
    Double,
    Decimal,
    String,
    Object,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 16] = [
        Self::Void,
        Self::Bool,
        Self::Char,
        Self::Sbyte,
        Self::Byte,
        Self::Short,
        Self::Ushort,
        Self::Int,
        Self::Uint,
        Self::Long,
        Self::Ulong,
        Self::Float,
        Self::Double,
        Self::Decimal,
        Self::String,
        Self::Object,
    ];

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.keyword() == keyword)
    }

    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Bool => "bool",
            Self::Char => "char",
            Self::Sbyte => "sbyte",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Ushort => "ushort",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Long => "long",
            Self::Ulong => "ulong",
            Self::Float => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::String => "string",
            Self::Object => "object",
        }
    }

    /// Value types are laid out inline, so they participate in struct layout.
    pub const fn is_value_type(self) -> bool {
        !matches!(self, Self::Void | Self::String | Self::Object)
    }

    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            Self::Sbyte
                | Self::Byte
                | Self::Short
                | Self::Ushort
                | Self::Int
                | Self::Uint
                | Self::Long
                | Self::Ulong
                | Self::Char
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A type reference as written in source.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    Primitive(PrimitiveKind),
    /// A possibly-qualified name with type arguments: `Ns.Outer.Inner<A, B>`.
    Named { name: String, args: Vec<TypeRef> },
    Array(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self::Named {
            name: name.into(),
            args,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Primitive(PrimitiveKind::Void))
    }

    /// Parse a type reference string.
    pub fn parse(text: &str) -> Result<Self, TypeRefParseError> {
        let mut parser = Parser { text, pos: 0 };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != text.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(ty)
    }

    /// Number of type arguments written on the outermost name.
    pub fn arity(&self) -> usize {
        match self {
            Self::Named { args, .. } => args.len(),
            _ => 0,
        }
    }
}

impl FromStr for TypeRef {
    type Err = TypeRefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = TypeRefParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => write!(f, "{p}"),
            Self::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            Self::Array(elem) => write!(f, "{elem}[]"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid type reference '{text}' at offset {offset}: {reason}")]
pub struct TypeRefParseError {
    pub text: String,
    pub offset: usize,
    pub reason: &'static str,
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, reason: &'static str) -> TypeRefParseError {
        TypeRefParseError {
            text: self.text.to_string(),
            offset: self.pos,
            reason,
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn parse_type(&mut self) -> Result<TypeRef, TypeRefParseError> {
        let mut ty = self.parse_atom()?;
        while self.eat('[') {
            if !self.eat(']') {
                return Err(self.error("expected ']'"));
            }
            ty = TypeRef::Array(Box::new(ty));
        }
        Ok(ty)
    }

    fn parse_atom(&mut self) -> Result<TypeRef, TypeRefParseError> {
        let mut segments: SmallVec<[&'a str; 4]> = SmallVec::new();
        segments.push(self.parse_identifier()?);
        while self.eat('.') {
            segments.push(self.parse_identifier()?);
        }

        if segments.len() == 1 {
            if let Some(p) = PrimitiveKind::from_keyword(segments[0]) {
                return Ok(TypeRef::Primitive(p));
            }
        }

        let mut args = Vec::new();
        if self.eat('<') {
            loop {
                args.push(self.parse_type()?);
                if self.eat(',') {
                    continue;
                }
                if self.eat('>') {
                    break;
                }
                return Err(self.error("expected ',' or '>'"));
            }
        }
        Ok(TypeRef::Named {
            name: segments.join("."),
            args,
        })
    }

    fn parse_identifier(&mut self) -> Result<&'a str, TypeRefParseError> {
        self.skip_ws();
        let start = self.pos;
        let text = self.text;
        for (offset, c) in text[start..].char_indices() {
            let valid = if offset == 0 {
                c.is_alphabetic() || c == '_'
            } else {
                c.is_alphanumeric() || c == '_'
            };
            if !valid {
                break;
            }
            self.pos = start + offset + c.len_utf8();
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(&text[start..self.pos])
    }
}

/// Returns `true` if `name` is a valid simple identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}

#[cfg(test)]
#[path = "../tests/type_ref_tests.rs"]
mod tests;
