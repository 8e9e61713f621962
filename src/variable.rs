//! Declaration collection
//!
//! Scans the logical lines of one function body for C declarations and
//! builds an ordered [`DeclarationSet`]. The same [`is_declaration`]
//! predicate is used by the body translator to skip these lines, so both
//! passes always agree on which variables exist.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::expression_translate::rewrite_expression;
use crate::helpers::{find_matching_delimiter, is_string_literal, is_valid_identifier, split_top_level, starts_with_keyword};
use crate::type_resolution::{map_type, CType};

/// Type keywords a declaration line may start with
pub const TYPE_KEYWORDS: &[&str] = &["int", "short", "long", "unsigned", "signed", "float", "double", "char"];

/// Leading qualifiers skipped before the type keyword
const QUALIFIERS: &[&str] = &["const", "static", "register", "volatile"];

static TYPE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^((?:(?:const|static|register|volatile|unsigned|signed|short|long|int|float|double|char)\b\s*)+)(.*)$",
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    /// C type words, with ` *` appended for pointers
    pub base_type: String,
    pub is_array: bool,
    /// Initializer text as written in C
    pub initializer: Option<String>,
    /// Bracket sizes, outermost first; empty for `a[]`
    pub dimensions: Vec<String>,
}

impl Declaration {
    fn c_type(&self) -> Option<CType> {
        CType::parse(&self.base_type)
    }

    fn is_char_array(&self) -> bool {
        self.is_array && self.c_type() == Some(CType::Char)
    }

    fn is_pointer(&self) -> bool {
        self.base_type.contains('*')
    }

    /// Number of elements given by a brace initializer list
    pub fn element_count(&self) -> Option<usize> {
        let init = self.initializer.as_deref()?.trim();
        let inner = init.strip_prefix('{')?.strip_suffix('}')?;
        Some(split_top_level(inner, ',').iter().filter(|e| !e.is_empty()).count())
    }

    /// Declared length of a char array (`char s[20]`, `char s[] = "abc"`)
    fn char_length(&self) -> String {
        if let Some(dim) = self.dimensions.first().filter(|d| !d.is_empty()) {
            return rewrite_expression(dim);
        }
        match self.initializer.as_deref() {
            Some(init) if is_string_literal(init) => literal_length(init).to_string(),
            _ => "*".to_string(),
        }
    }

    /// True if the initializer becomes an assignment statement in the body
    pub fn has_statement_initializer(&self) -> bool {
        self.initializer.is_some() && (!self.is_array || self.is_char_array())
    }

    /// `name = value` for initializers emitted in place
    pub fn initial_assignment<F>(&self, rewrite: F) -> Option<String>
    where
        F: Fn(&str) -> String,
    {
        if !self.has_statement_initializer() {
            return None;
        }
        let init = self.initializer.as_deref()?;
        Some(format!("{} = {}", self.name, rewrite(init)))
    }

    /// Fortran declaration line for a procedure or program body
    pub fn to_fortran(&self) -> String {
        self.render(false)
    }

    /// Fortran declaration line for module scope, keeping scalar initializers
    pub fn to_module_fortran(&self) -> String {
        self.render(true)
    }

    fn render(&self, with_scalar_init: bool) -> String {
        let ty = map_type(&self.base_type);
        if ty.starts_with('!') {
            return format!("{} :: {}", ty, self.name);
        }

        if self.is_char_array() {
            let mut line = format!("character(len={}) :: {}", self.char_length(), self.name);
            if with_scalar_init {
                if let Some(init) = &self.initializer {
                    line.push_str(&format!(" = {}", init));
                }
            }
            return line;
        }

        if !self.is_array {
            let attr = if self.is_pointer() && self.c_type() != Some(CType::CharPointer) {
                ", pointer"
            } else {
                ""
            };
            let mut line = format!("{}{} :: {}", ty, attr, self.name);
            if with_scalar_init {
                if let Some(init) = &self.initializer {
                    line.push_str(&format!(" = {}", rewrite_expression(init)));
                }
            }
            return line;
        }

        match (self.element_count(), self.initializer.as_deref()) {
            (Some(count), Some(init)) => {
                let declared = self.dimensions.first().and_then(|d| d.trim().parse::<usize>().ok());
                let size = declared.map(|d| d.max(count)).unwrap_or(count);
                let mut values = rewrite_expression(init);
                if size > count {
                    // C zero-fills the tail of a partially initialized array
                    let padding = vec!["0"; size - count].join(", ");
                    values = if count == 0 {
                        format!("[{}]", padding)
                    } else {
                        format!("{}, {}]", values.trim_end_matches(']'), padding)
                    };
                }
                format!("{}, dimension({}) :: {} = {}", ty, size, self.name, values)
            }
            _ if self.dimensions.iter().all(|d| !d.trim().is_empty()) && !self.dimensions.is_empty() => {
                let dims: Vec<String> = self.dimensions.iter().map(|d| rewrite_expression(d)).collect();
                format!("{}, dimension({}) :: {}", ty, dims.join(", "), self.name)
            }
            _ => format!("{}, dimension(:), allocatable :: {}", ty, self.name),
        }
    }
}

/// Character count of a C string literal, escapes counted once
fn literal_length(lit: &str) -> usize {
    let inner = &lit.trim()[1..lit.trim().len() - 1];
    let mut count = 0;
    let mut escaped = false;
    for c in inner.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        }
        count += 1;
    }
    count
}

// ============================================================================
// DECLARATION SET
// ============================================================================

/// Ordered name → declaration mapping; a later name overwrites in place
#[derive(Debug, Clone, Default)]
pub struct DeclarationSet {
    entries: Vec<Declaration>,
    index: HashMap<String, usize>,
}

impl DeclarationSet {
    pub fn new() -> Self {
        DeclarationSet {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn insert(&mut self, decl: Declaration) {
        match self.index.get(&decl.name) {
            Some(&pos) => self.entries[pos] = decl,
            None => {
                self.index.insert(decl.name.clone(), self.entries.len());
                self.entries.push(decl);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.index.get(name).map(|&pos| &self.entries[pos])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// VARIABLE TYPE SIDE-TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableType {
    pub c_type: String,
    pub is_array: bool,
}

/// Variable name → C type, accumulated across every body of one run
#[derive(Debug, Clone, Default)]
pub struct VariableTypes {
    types: HashMap<String, VariableType>,
}

impl VariableTypes {
    pub fn new() -> Self {
        VariableTypes { types: HashMap::new() }
    }

    pub fn record(&mut self, decls: &DeclarationSet) {
        for decl in decls.iter() {
            self.types.insert(
                decl.name.clone(),
                VariableType {
                    c_type: decl.base_type.clone(),
                    is_array: decl.is_array,
                },
            );
        }
    }

    pub fn get(&self, name: &str) -> Option<&VariableType> {
        self.types.get(name)
    }

    pub fn is_array(&self, name: &str) -> bool {
        self.types.get(name).map(|t| t.is_array).unwrap_or(false)
    }
}

// ============================================================================
// PARSING
// ============================================================================

fn strip_qualifiers(line: &str) -> &str {
    let mut rest = line.trim_start();
    loop {
        let next = QUALIFIERS
            .iter()
            .find(|q| starts_with_keyword(rest, q))
            .map(|q| rest[q.len()..].trim_start());
        match next {
            Some(r) => rest = r,
            None => return rest,
        }
    }
}

/// Check if a logical line is a variable declaration.
///
/// The line must end with `;`, start with a primitive type keyword, and
/// not be a function prototype.
pub fn is_declaration(line: &str) -> bool {
    starts_with_type(line) && parse_declaration(line).is_some()
}

/// A `;`-terminated line led by a type keyword, whether or not it parses
pub fn starts_with_type(line: &str) -> bool {
    let line = line.trim();
    line.ends_with(';') && TYPE_KEYWORDS.iter().any(|kw| starts_with_keyword(strip_qualifiers(line), kw))
}

/// Split a declaration statement into its declarators.
///
/// Returns `None` for prototypes and anything that does not parse.
pub fn parse_declaration(line: &str) -> Option<Vec<Declaration>> {
    let stmt = line.trim().trim_end_matches(';').trim();
    let caps = TYPE_PREFIX.captures(stmt)?;

    let type_words: Vec<&str> = caps[1]
        .split_whitespace()
        .filter(|w| !QUALIFIERS.contains(w))
        .collect();
    if type_words.is_empty() {
        return None;
    }
    let base = type_words.join(" ");
    let rest = caps[2].trim();
    if rest.is_empty() {
        return None;
    }

    let mut decls = Vec::new();
    for declarator in split_top_level(rest, ',') {
        decls.push(parse_declarator(&base, &declarator)?);
    }
    Some(decls)
}

fn parse_declarator(base: &str, declarator: &str) -> Option<Declaration> {
    let (target, initializer) = match crate::helpers::find_assignment_eq(declarator) {
        Some(eq) => (
            declarator[..eq].trim(),
            Some(declarator[eq + 1..].trim().to_string()),
        ),
        None => (declarator.trim(), None),
    };

    let pointer_depth = target.chars().take_while(|c| *c == '*' || c.is_whitespace()).filter(|c| *c == '*').count();
    let target = target.trim_start_matches(|c: char| c == '*' || c.is_whitespace());

    let name_end = target
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(target.len());
    let name = &target[..name_end];
    if !is_valid_identifier(name) {
        return None;
    }

    let mut suffix = target[name_end..].trim();
    if suffix.starts_with('(') {
        // Prototype
        return None;
    }

    let mut dimensions = Vec::new();
    while suffix.starts_with('[') {
        let close = find_matching_delimiter(suffix, 0)?;
        dimensions.push(suffix[1..close].trim().to_string());
        suffix = suffix[close + 1..].trim();
    }
    if !suffix.is_empty() {
        return None;
    }

    let brace_init = initializer.as_deref().map(|i| i.starts_with('{')).unwrap_or(false);
    let base_type = if pointer_depth > 0 {
        format!("{} *", base)
    } else {
        base.to_string()
    };

    Some(Declaration {
        name: name.to_string(),
        base_type,
        is_array: !dimensions.is_empty() || brace_init,
        initializer,
        dimensions,
    })
}

/// The `init` clause of a `for (...)` header, if the line is a for loop
fn for_init_clause(line: &str) -> Option<String> {
    if !starts_with_keyword(line, "for") {
        return None;
    }
    let open = line.find('(')?;
    let close = find_matching_delimiter(line, open)?;
    let clauses = split_top_level(&line[open + 1..close], ';');
    clauses.first().cloned()
}

/// Collect the declarations of one function body.
///
/// Typed `for` init clauses (`for (int i = 0; ...)`) contribute their loop
/// variable without an initializer; the loop supplies the start value.
pub fn collect_declarations(lines: &[String]) -> DeclarationSet {
    let mut decls = DeclarationSet::new();

    for line in lines {
        let trimmed = line.trim();
        if is_declaration(trimmed) {
            if let Some(found) = parse_declaration(trimmed) {
                for decl in found {
                    decls.insert(decl);
                }
            }
            continue;
        }

        if let Some(init) = for_init_clause(trimmed) {
            let body = strip_qualifiers(&init);
            if TYPE_KEYWORDS.iter().any(|kw| starts_with_keyword(body, kw)) {
                if let Some(found) = parse_declaration(&init) {
                    for mut decl in found {
                        decl.initializer = None;
                        decls.insert(decl);
                    }
                }
            }
        }
    }

    decls
}
