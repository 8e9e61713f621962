//! C type name → Fortran type mapping
//!
//! A single-token lookup: the C type words of a declaration are parsed into
//! a [`CType`], which maps one-to-one onto a [`FortranType`].

use std::fmt;

/// Primitive C types understood by the translator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CType {
    Int,
    Short,
    Long,
    LongLong,
    Float,
    Double,
    Char,
    CharPointer,
    Bool,
    Void,
}

/// Fortran declaration types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FortranType {
    Integer,
    IntegerKind2,
    IntegerKind8,
    Real,
    DoublePrecision,
    Character,
    CharacterLen100,
    Logical,
    /// No Fortran type; void functions become subroutines
    None,
}

/// Qualifiers that carry no meaning in Fortran
const IGNORED_QUALIFIERS: &[&str] = &["const", "static", "volatile", "register", "extern", "inline"];

impl CType {
    /// Parse C type words such as `unsigned long long` or `char *`.
    ///
    /// Returns `None` for anything outside the primitive subset.
    pub fn parse(type_words: &str) -> Option<CType> {
        let pointer = type_words.contains('*');
        let cleaned = type_words.replace('*', " ");
        let words: Vec<&str> = cleaned
            .split_whitespace()
            .filter(|w| !IGNORED_QUALIFIERS.contains(w))
            .collect();

        if words.is_empty() {
            return None;
        }

        let longs = words.iter().filter(|w| **w == "long").count();
        let has = |name: &str| words.contains(&name);

        let ty = if has("char") {
            if pointer {
                CType::CharPointer
            } else {
                CType::Char
            }
        } else if has("float") {
            CType::Float
        } else if has("double") {
            CType::Double
        } else if has("bool") || has("_Bool") {
            CType::Bool
        } else if has("void") {
            CType::Void
        } else if has("short") {
            CType::Short
        } else if longs >= 2 {
            CType::LongLong
        } else if longs == 1 {
            CType::Long
        } else if has("int") || has("unsigned") || has("signed") || has("size_t") {
            CType::Int
        } else {
            return None;
        };

        Some(ty)
    }

    pub fn to_fortran(self) -> FortranType {
        match self {
            CType::Int => FortranType::Integer,
            CType::Short => FortranType::IntegerKind2,
            CType::Long | CType::LongLong => FortranType::IntegerKind8,
            CType::Float => FortranType::Real,
            CType::Double => FortranType::DoublePrecision,
            CType::Char => FortranType::Character,
            CType::CharPointer => FortranType::CharacterLen100,
            CType::Bool => FortranType::Logical,
            CType::Void => FortranType::None,
        }
    }

    /// Storage size in bytes, used for `sizeof(type)`
    pub fn byte_size(self) -> Option<u32> {
        match self {
            CType::Char | CType::Bool => Some(1),
            CType::Short => Some(2),
            CType::Int | CType::Float => Some(4),
            CType::Long | CType::LongLong | CType::Double | CType::CharPointer => Some(8),
            CType::Void => None,
        }
    }
}

impl fmt::Display for FortranType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FortranType::Integer => write!(f, "integer"),
            FortranType::IntegerKind2 => write!(f, "integer(kind=2)"),
            FortranType::IntegerKind8 => write!(f, "integer(kind=8)"),
            FortranType::Real => write!(f, "real"),
            FortranType::DoublePrecision => write!(f, "double precision"),
            FortranType::Character => write!(f, "character"),
            FortranType::CharacterLen100 => write!(f, "character(len=100)"),
            FortranType::Logical => write!(f, "logical"),
            FortranType::None => write!(f, "void"),
        }
    }
}

/// Map C type words to a Fortran type name.
///
/// Unknown types yield a `! Unknown type: ...` comment so the gap stays visible.
pub fn map_type(c_type: &str) -> String {
    match CType::parse(c_type) {
        Some(ty) => ty.to_fortran().to_string(),
        None => format!("! Unknown type: {}", c_type.trim()),
    }
}
