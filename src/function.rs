//! Function signatures and the per-run function registry
//!
//! C signatures map onto Fortran procedures:
//! - `int f(int n)` → `function f(n) result(f_result)`
//! - `void g(int *p)` → `subroutine g(p)`
//! - `int main(void)` → the `program` unit
//!
//! Parameters:
//! - scalar `int n` → `integer, intent(in) :: n` (`value` when the body assigns it)
//! - pointer `int *p` → `integer, intent(inout) :: p`
//! - array `int a[]` → `integer, dimension(:), intent(inout) :: a`
//! - string `char *s` → `character(len=*), intent(in) :: s`

use std::collections::HashMap;

use crate::helpers::is_valid_identifier;
use crate::type_resolution::{map_type, CType};

/// Name of the C entry point, translated as the program body
pub const ENTRY_POINT: &str = "main";

/// A parsed function parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    /// C type words without `*`
    pub c_type: String,
    pub is_pointer: bool,
    pub is_array: bool,
}

impl Parameter {
    /// Parse one C parameter (`const char *s`, `int a[]`, `double x`)
    pub fn parse(param: &str) -> Option<Parameter> {
        let param = param.trim();
        let mut is_array = false;
        let mut text = param.to_string();
        if let Some(open) = text.find('[') {
            is_array = true;
            text.truncate(open);
        }

        let is_pointer = text.contains('*');
        let cleaned = text.replace(['*', '&'], " ");
        let mut words: Vec<&str> = cleaned.split_whitespace().collect();
        let name = words.pop()?;
        if !is_valid_identifier(name) || words.is_empty() {
            return None;
        }

        Some(Parameter {
            name: name.to_string(),
            c_type: words.join(" "),
            is_pointer,
            is_array,
        })
    }

    fn ctype(&self) -> Option<CType> {
        if self.is_pointer {
            CType::parse(&format!("{} *", self.c_type))
        } else {
            CType::parse(&self.c_type)
        }
    }

    fn is_string(&self) -> bool {
        matches!(self.ctype(), Some(CType::CharPointer)) || (self.is_array && self.ctype() == Some(CType::Char))
    }

    /// Fortran declaration; `assigned` marks scalars the body writes to
    pub fn to_fortran(&self, assigned: bool) -> String {
        if self.is_string() {
            return format!("character(len=*), intent(in) :: {}", self.name);
        }

        let ty = map_type(&self.c_type);
        if ty.starts_with('!') {
            return format!("{} :: {}", ty, self.name);
        }

        if self.is_array {
            format!("{}, dimension(:), intent(inout) :: {}", ty, self.name)
        } else if self.is_pointer {
            format!("{}, intent(inout) :: {}", ty, self.name)
        } else if assigned {
            format!("{}, value :: {}", ty, self.name)
        } else {
            format!("{}, intent(in) :: {}", ty, self.name)
        }
    }
}

/// A parsed function signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub return_type: String,
    pub parameters: Vec<Parameter>,
}

impl FunctionSignature {
    /// Build from the pieces of a C function header
    pub fn parse(return_type: &str, name: &str, params: &str) -> FunctionSignature {
        let params = params.trim();
        let parameters = if params.is_empty() || params == "void" {
            Vec::new()
        } else {
            params.split(',').filter_map(Parameter::parse).collect()
        };

        FunctionSignature {
            name: name.to_string(),
            return_type: return_type.split_whitespace().collect::<Vec<_>>().join(" "),
            parameters,
        }
    }

    pub fn is_entry(&self) -> bool {
        self.name == ENTRY_POINT
    }

    pub fn is_void(&self) -> bool {
        CType::parse(&self.return_type) == Some(CType::Void)
    }

    /// The Fortran result variable of a non-void function
    pub fn result_variable(&self) -> String {
        format!("{}_result", self.name)
    }

    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }
}

// ============================================================================
// FUNCTION REGISTRY
// ============================================================================

/// Registry of every function signature in the source, in definition order
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionSignature>,
    order: Vec<String>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        FunctionRegistry {
            functions: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn register(&mut self, sig: FunctionSignature) {
        if !self.functions.contains_key(&sig.name) {
            self.order.push(sig.name.clone());
        }
        self.functions.insert(sig.name.clone(), sig);
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// True for known functions that return a value
    pub fn returns_value(&self, name: &str) -> bool {
        self.get(name).map(|s| !s.is_void()).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionSignature> {
        self.order.iter().filter_map(|n| self.functions.get(n))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Read-only context shared by every body translation of one run
#[derive(Debug, Clone, Default)]
pub struct SourceContext {
    pub registry: FunctionRegistry,
}

impl SourceContext {
    pub fn new(registry: FunctionRegistry) -> Self {
        SourceContext { registry }
    }
}

/// Context of the function body currently being translated
#[derive(Debug, Clone)]
pub struct CurrentFunctionContext {
    pub name: String,
    pub is_entry: bool,
    pub is_void: bool,
    pub result_variable: Option<String>,
}

impl CurrentFunctionContext {
    pub fn for_signature(sig: &FunctionSignature) -> Self {
        CurrentFunctionContext {
            name: sig.name.clone(),
            is_entry: sig.is_entry(),
            is_void: sig.is_void(),
            result_variable: if sig.is_entry() || sig.is_void() {
                None
            } else {
                Some(sig.result_variable())
            },
        }
    }

    /// Context for the program body
    pub fn entry() -> Self {
        CurrentFunctionContext {
            name: ENTRY_POINT.to_string(),
            is_entry: true,
            is_void: false,
            result_variable: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parameters() {
        let sig = FunctionSignature::parse("int", "sum", "int arr[], int n");
        assert_eq!(sig.parameter_names(), vec!["arr", "n"]);
        assert!(sig.parameters[0].is_array);
        assert_eq!(sig.result_variable(), "sum_result");
    }

    #[test]
    fn test_void_params_and_return() {
        let sig = FunctionSignature::parse("void", "show", "void");
        assert!(sig.parameters.is_empty());
        assert!(sig.is_void());
    }

    #[test]
    fn test_parameter_declarations() {
        let n = Parameter::parse("int n").unwrap();
        assert_eq!(n.to_fortran(false), "integer, intent(in) :: n");
        assert_eq!(n.to_fortran(true), "integer, value :: n");

        let s = Parameter::parse("const char *msg").unwrap();
        assert_eq!(s.to_fortran(false), "character(len=*), intent(in) :: msg");

        let p = Parameter::parse("double *out").unwrap();
        assert_eq!(p.to_fortran(false), "double precision, intent(inout) :: out");

        let a = Parameter::parse("float values[]").unwrap();
        assert_eq!(a.to_fortran(false), "real, dimension(:), intent(inout) :: values");
    }

    #[test]
    fn test_registry_keeps_definition_order() {
        let mut reg = FunctionRegistry::new();
        reg.register(FunctionSignature::parse("int", "b", ""));
        reg.register(FunctionSignature::parse("void", "a", ""));
        let names: Vec<&str> = reg.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(reg.returns_value("b"));
        assert!(!reg.returns_value("a"));
    }
}
