//! Internal type representation and the type-compatibility lattice

use std::fmt;

/// Builtin basic type names. Any other basic name is a user enumeration.
pub const BUILTIN_TYPES: [&str; 7] = ["int", "float", "double", "bool", "string", "char", "void"];

/// Identity of an array-size expression node in the syntax tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(pub usize);

impl ExprId {
    pub fn of<T>(node: &T) -> Self {
        ExprId(node as *const T as usize)
    }
}

/// Declared size of an array type
#[derive(Debug, Clone, PartialEq)]
pub enum ArraySize {
    /// Integer literal size (`int[4]`)
    Literal(i64),
    /// Any other size expression, compared by node identity
    Expr(ExprId),
}

/// Internal type representation used by the checker
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// Named scalar type: a builtin or an enumeration
    Basic(String),

    /// Pointer; `None` is the opaque pointer produced by `alloc` and `null`
    Pointer(Option<Box<Type>>),

    /// Array type
    Array {
        elem: Box<Type>,
        size: Option<ArraySize>,
    },

    /// Record type (nominal)
    Record {
        name: String,
        fields: Vec<(String, Type)>,
    },

    /// Function type
    Function {
        params: Vec<Type>,
        return_type: Box<Type>,
    },

    /// Sentinel for expressions that failed to check
    Error,
}

/// Result of comparing two types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeMatch {
    /// Same type
    Exact,
    /// Implicit coercion permitted
    Compatible,
    /// No relation
    Incompatible,
}

impl TypeMatch {
    pub fn is_match(self) -> bool {
        !matches!(self, TypeMatch::Incompatible)
    }
}

impl Type {
    /// Builtin or user type referred to by name
    pub fn basic(name: impl Into<String>) -> Self {
        Type::Basic(name.into())
    }

    /// Builtin `int`
    pub fn int() -> Self {
        Type::basic("int")
    }

    /// Builtin `float`
    pub fn float() -> Self {
        Type::basic("float")
    }

    /// Builtin `double`
    pub fn double() -> Self {
        Type::basic("double")
    }

    /// Builtin `bool`
    pub fn bool() -> Self {
        Type::basic("bool")
    }

    /// Builtin `string`
    pub fn string() -> Self {
        Type::basic("string")
    }

    /// Builtin `char`
    pub fn char() -> Self {
        Type::basic("char")
    }

    /// Builtin `void`
    pub fn void() -> Self {
        Type::basic("void")
    }

    /// `T*`
    pub fn pointer_to(pointee: Type) -> Self {
        Type::Pointer(Some(Box::new(pointee)))
    }

    /// Pointer of unknown pointee, as produced by `alloc`
    pub fn opaque_pointer() -> Self {
        Type::Pointer(None)
    }

    pub fn is_basic_named(&self, name: &str) -> bool {
        matches!(self, Type::Basic(n) if n == name)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Basic(n) if n == "int" || n == "float" || n == "double")
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }
}

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_TYPES.contains(&name)
}

/// Compare two types.
///
/// Records compare by name only. Basic types allow `int` to stand in for any
/// enumeration (and back), and `int`/`float` to coerce into each other.
/// Pointer and array results propagate the weaker pointee/element result.
pub fn match_types(a: &Type, b: &Type) -> TypeMatch {
    if a.is_error() || b.is_error() {
        return TypeMatch::Incompatible;
    }
    if a == b {
        return TypeMatch::Exact;
    }

    match (a, b) {
        (Type::Record { name: x, .. }, Type::Record { name: y, .. }) => {
            if x == y {
                TypeMatch::Exact
            } else {
                TypeMatch::Incompatible
            }
        }
        (Type::Basic(x), Type::Basic(y)) => match_basic(x, y),
        (Type::Basic(s), Type::Pointer(Some(p))) | (Type::Pointer(Some(p)), Type::Basic(s))
            if s == "string" && p.is_basic_named("char") =>
        {
            TypeMatch::Compatible
        }
        (Type::Pointer(x), Type::Pointer(y)) => match (x, y) {
            (Some(x), Some(y)) => match_types(x, y),
            (None, None) => TypeMatch::Exact,
            // an opaque pointer converts to and from any pointer
            _ => TypeMatch::Compatible,
        },
        (
            Type::Array { elem: ea, size: sa },
            Type::Array { elem: eb, size: sb },
        ) => {
            let elem = match_types(ea, eb);
            if !elem.is_match() {
                return TypeMatch::Incompatible;
            }
            match (sa, sb) {
                (Some(ArraySize::Literal(x)), Some(ArraySize::Literal(y))) => {
                    if x == y {
                        elem
                    } else {
                        TypeMatch::Incompatible
                    }
                }
                (Some(ArraySize::Expr(x)), Some(ArraySize::Expr(y))) => {
                    if x == y {
                        elem
                    } else {
                        TypeMatch::Incompatible
                    }
                }
                (Some(_), Some(_)) => TypeMatch::Incompatible,
                _ => elem,
            }
        }
        (Type::Array { elem, .. }, Type::Pointer(p)) | (Type::Pointer(p), Type::Array { elem, .. }) => {
            match p {
                Some(p) => match_types(elem, p),
                None => TypeMatch::Compatible,
            }
        }
        _ => TypeMatch::Incompatible,
    }
}

fn match_basic(x: &str, y: &str) -> TypeMatch {
    if x == y {
        return TypeMatch::Exact;
    }
    // enumerations are interchangeable with int
    if (!is_builtin(x) && y == "int") || (!is_builtin(y) && x == "int") {
        return TypeMatch::Compatible;
    }
    match (x, y) {
        ("int", "float") | ("float", "int") => TypeMatch::Compatible,
        _ => TypeMatch::Incompatible,
    }
}

/// Result type of an arithmetic operation on two numeric operands
pub fn arithmetic_result(left: &Type, right: &Type) -> Type {
    if left.is_basic_named("float") || right.is_basic_named("float") {
        Type::float()
    } else if left.is_basic_named("double") || right.is_basic_named("double") {
        Type::double()
    } else {
        Type::int()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Basic(name) => write!(f, "{}", name),
            Type::Pointer(Some(pointee)) => write!(f, "{}*", pointee),
            Type::Pointer(None) => write!(f, "void*"),
            Type::Array { elem, .. } => write!(f, "{}[]", elem),
            Type::Record { name, .. } => write!(f, "record {}", name),
            Type::Function { params, return_type } => {
                write!(f, "fn({} params) -> {}", params.len(), return_type)
            }
            Type::Error => write!(f, "<error>"),
        }
    }
}
