//! Type annotations as written in source

use super::*;
use crate::expr::Expr;

/// Type expression in the AST
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExpr {
    /// Builtin or user-declared type name (`int`, `Color`, `Point`)
    Named(String),

    /// Type declared in an imported module (`geo::Point`)
    Qualified {
        module: Node<Ident>,
        name: Node<Ident>,
    },

    /// Pointer type (`T*`)
    Pointer(Box<Node<TypeExpr>>),

    /// Array type (`T[N]` or `T[]`)
    Array {
        elem: Box<Node<TypeExpr>>,
        #[serde(default)]
        size: Option<Box<Node<Expr>>>,
    },

    /// Function type (`fn(T, U) -> R`)
    Function {
        params: Vec<Node<TypeExpr>>,
        return_type: Box<Node<TypeExpr>>,
    },
}
