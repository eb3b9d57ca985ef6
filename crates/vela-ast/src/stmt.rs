//! Statement and declaration AST nodes

use super::*;
use crate::expr::Expr;
use crate::types::TypeExpr;

fn default_true() -> bool {
    true
}

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `use geo;` or `use geo as g;`
    Use {
        module: Node<Ident>,
        #[serde(default)]
        alias: Option<Node<Ident>>,
    },

    /// Variable declaration
    VarDecl(VarDecl),

    /// Function declaration
    FnDecl(FnDecl),

    /// Record type declaration
    RecordDecl(RecordDecl),

    /// Enumeration declaration
    EnumDecl(EnumDecl),

    /// Assignment to an existing place
    Assign {
        target: Node<Expr>,
        value: Node<Expr>,
    },

    /// Expression statement
    Expr(Node<Expr>),

    /// If statement
    If {
        condition: Node<Expr>,
        then_branch: Vec<Node<Stmt>>,
        #[serde(default)]
        else_branch: Option<Vec<Node<Stmt>>>,
    },

    /// While loop
    While {
        condition: Node<Expr>,
        body: Vec<Node<Stmt>>,
    },

    /// Return statement
    Return(Option<Node<Expr>>),

    /// Nested block
    Block(Vec<Node<Stmt>>),
}

/// Variable declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: Node<Ident>,
    #[serde(default)]
    pub ty: Option<Node<TypeExpr>>,
    #[serde(default)]
    pub init: Option<Node<Expr>>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default = "default_true")]
    pub is_mutable: bool,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Node<Ident>,
    pub ty: Node<TypeExpr>,
}

/// Function declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FnDecl {
    pub name: Node<Ident>,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub return_type: Option<Node<TypeExpr>>,
    /// `None` for functions defined outside the unit (extern)
    #[serde(default)]
    pub body: Option<Vec<Node<Stmt>>>,
    #[serde(default)]
    pub is_public: bool,
    /// The returned pointer is a fresh allocation the caller must release
    #[serde(default)]
    pub returns_ownership: bool,
    /// The function releases the pointer it is handed
    #[serde(default)]
    pub takes_ownership: bool,
}

/// Record field declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: Node<Ident>,
    pub ty: Node<TypeExpr>,
}

/// Record declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDecl {
    pub name: Node<Ident>,
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub is_public: bool,
}

/// Enumeration declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub name: Node<Ident>,
    pub variants: Vec<Node<Ident>>,
    #[serde(default)]
    pub is_public: bool,
}
