//! The AST node model: a closed set of statement and expression variants, each
//! carrying its originating token for line diagnostics and a `to_string` rendering
//! used by the parser round-trip property.

use crate::token::Token;
use std::fmt::{self, Display, Formatter};

#[derive(Clone, Debug, PartialEq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

impl Display for AssignOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
        };
        write!(f, "{}", s)
    }
}

/// An assignment target: either a bare identifier or a single-level index expression.
#[derive(Clone, Debug, PartialEq)]
pub enum AssignTarget {
    Identifier(String),
    Index { name: String, index: Box<Expr> },
}

impl Display for AssignTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AssignTarget::Identifier(name) => write!(f, "{}", name),
            AssignTarget::Index { name, index } => write!(f, "{}[{}]", name, index),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ForClause {
    pub index: String,
    pub source: Box<Expr>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Let {
        token: Token,
        name: String,
        value: Expr,
    },
    Assign {
        token: Token,
        target: AssignTarget,
        op: AssignOp,
        value: Expr,
    },
    Return {
        token: Token,
        value: Option<Expr>,
    },
    Break {
        token: Token,
    },
    Expression {
        token: Token,
        expr: Expr,
    },
    Block {
        token: Token,
        statements: Vec<Stmt>,
    },
    FunctionDecl {
        token: Token,
        name: String,
        params: Vec<String>,
        body: Box<Stmt>,
    },
}

impl Stmt {
    pub fn token(&self) -> &Token {
        match self {
            Stmt::Let { token, .. }
            | Stmt::Assign { token, .. }
            | Stmt::Return { token, .. }
            | Stmt::Break { token }
            | Stmt::Expression { token, .. }
            | Stmt::Block { token, .. }
            | Stmt::FunctionDecl { token, .. } => token,
        }
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Let { name, value, .. } => write!(f, "let {} = {};", name, value),
            Stmt::Assign {
                target, op, value, ..
            } => write!(f, "{} {} {};", target, op, value),
            Stmt::Return { value: Some(v), .. } => write!(f, "return {};", v),
            Stmt::Return { value: None, .. } => write!(f, "return;"),
            Stmt::Break { .. } => write!(f, "break;"),
            Stmt::Expression { expr, .. } => write!(f, "{}", expr),
            Stmt::Block { statements, .. } => {
                write!(f, "{{ ")?;
                for s in statements {
                    write!(f, "{} ", s)?;
                }
                write!(f, "}}")
            }
            Stmt::FunctionDecl {
                name, params, body, ..
            } => write!(f, "function {}({}) {}", name, params.join(", "), body),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Identifier {
        token: Token,
        name: String,
    },
    IntegerLit {
        token: Token,
        value: i64,
    },
    BooleanLit {
        token: Token,
        value: bool,
    },
    StringLit {
        token: Token,
        value: String,
    },
    ArrayLit {
        token: Token,
        elements: Vec<Expr>,
    },
    HashLit {
        token: Token,
        pairs: Vec<(Expr, Expr)>,
    },
    Prefix {
        token: Token,
        op: String,
        right: Box<Expr>,
    },
    Infix {
        token: Token,
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Index {
        token: Token,
        left: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        token: Token,
        function: Box<Expr>,
        args: Vec<Expr>,
    },
    If {
        token: Token,
        condition: Box<Expr>,
        consequence: Box<Stmt>,
        alternative: Option<Box<Stmt>>,
    },
    For {
        token: Token,
        clause: ForClause,
        body: Box<Stmt>,
    },
    Access {
        token: Token,
        parent: Box<Expr>,
        child: Box<Stmt>,
    },
}

impl Expr {
    pub fn token(&self) -> &Token {
        match self {
            Expr::Identifier { token, .. }
            | Expr::IntegerLit { token, .. }
            | Expr::BooleanLit { token, .. }
            | Expr::StringLit { token, .. }
            | Expr::ArrayLit { token, .. }
            | Expr::HashLit { token, .. }
            | Expr::Prefix { token, .. }
            | Expr::Infix { token, .. }
            | Expr::Index { token, .. }
            | Expr::Call { token, .. }
            | Expr::If { token, .. }
            | Expr::For { token, .. }
            | Expr::Access { token, .. } => token,
        }
    }

    pub fn line(&self) -> usize {
        self.token().line
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identifier { name, .. } => write!(f, "{}", name),
            Expr::IntegerLit { value, .. } => write!(f, "{}", value),
            Expr::BooleanLit { value, .. } => write!(f, "{}", value),
            Expr::StringLit { value, .. } => write!(f, "\"{}\"", value),
            Expr::ArrayLit { elements, .. } => {
                let items: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Expr::HashLit { pairs, .. } => {
                let items: Vec<String> =
                    pairs.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            Expr::Prefix { op, right, .. } => write!(f, "({}{})", op, right),
            Expr::Infix {
                op, left, right, ..
            } => write!(f, "({} {} {})", left, op, right),
            Expr::Index { left, index, .. } => write!(f, "({}[{}])", left, index),
            Expr::Call {
                function, args, ..
            } => {
                let items: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", function, items.join(", "))
            }
            Expr::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                write!(f, "if ({}) {}", condition, consequence)?;
                if let Some(alt) = alternative {
                    write!(f, " else {}", alt)?;
                }
                Ok(())
            }
            Expr::For { clause, body, .. } => {
                write!(f, "for ({} in {}) {}", clause.index, clause.source, body)
            }
            Expr::Access { parent, child, .. } => write!(f, "({} -> {})", parent, child),
        }
    }
}
