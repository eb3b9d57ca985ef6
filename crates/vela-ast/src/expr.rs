//! Expression AST nodes

use super::*;
use crate::types::TypeExpr;

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Literal value
    Literal(Literal),

    /// Variable or function reference
    Ident(Ident),

    /// Binary operation
    Binary {
        left: Box<Node<Expr>>,
        op: BinaryOp,
        right: Box<Node<Expr>>,
    },

    /// Unary operation
    Unary {
        op: UnaryOp,
        expr: Box<Node<Expr>>,
    },

    /// Function call
    Call {
        callee: Box<Node<Expr>>,
        args: Vec<Node<Expr>>,
    },

    /// Member access (`obj.member`, `Enum.Variant`, `alias.name`)
    Member {
        object: Box<Node<Expr>>,
        member: Node<Ident>,
    },

    /// Module-qualified access (`alias::name`)
    ModuleAccess {
        module: Node<Ident>,
        name: Node<Ident>,
    },

    /// Index access (`arr[i]`)
    Index {
        object: Box<Node<Expr>>,
        index: Box<Node<Expr>>,
    },

    /// Pointer dereference (`*p`)
    Deref(Box<Node<Expr>>),

    /// Address-of (`&x`)
    AddrOf(Box<Node<Expr>>),

    /// Heap allocation of `size` bytes
    Alloc(Box<Node<Expr>>),

    /// Release of a heap allocation
    Free(Box<Node<Expr>>),

    /// Unchecked conversion (`expr as T`)
    Cast {
        expr: Box<Node<Expr>>,
        ty: Node<TypeExpr>,
    },

    /// Size of a type in bytes
    SizeOf(Box<Node<TypeExpr>>),

    /// Record construction (`Point { x: 1, y: 2 }`)
    RecordLit {
        name: Node<Ident>,
        fields: Vec<FieldInit>,
    },
}

/// Field initializer inside a record literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInit {
    pub name: Node<Ident>,
    pub value: Node<Expr>,
}

/// Literal values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Char(char),
    Null,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        };
        write!(f, "{}", s)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}
