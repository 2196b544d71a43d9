//! AST node data as seen by the runtime.
//!
//! The parser and evaluator live outside this crate. Nodes here are plain,
//! deep-clonable data: scripts read and rewrite them through `stmtnode` and
//! `exprnode` objects, and the [`crate::Evaluator`] executes them.

/// Source position of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Loc {
    pub line: i64,
    pub col: i64,
}

/// Display names of statement kinds, indexed by discriminant.
pub const STMT_NAMES: [&str; 5] = ["EXPR", "LIST", "RET", "CONT", "BREAK"];

/// Display names of expression kinds, indexed by discriminant.
pub const EXPR_NAMES: [&str; 14] = [
    "LIT", "LISTGEN", "MAPGEN", "BINOP", "UNOP", "INDEX", "SETINDEX", "ASSIGN", "REF", "CALL",
    "FUNCDECL", "IFELSE", "LOOP", "ITER",
];

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub loc: Loc,
    pub kind: StmtKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    Expr { expr: Option<Box<Expr>> },
    List { stmts: Vec<Stmt> },
    Ret { ret: Option<Box<Expr>> },
    Cont { val: Option<Box<Expr>> },
    Break { val: Option<Box<Expr>> },
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Stmt {
        Stmt {
            loc: Loc::default(),
            kind,
        }
    }

    /// An expression statement.
    pub fn expr(expr: Expr) -> Stmt {
        Stmt::new(StmtKind::Expr {
            expr: Some(Box::new(expr)),
        })
    }

    /// A `return` of `expr`.
    pub fn ret(expr: Expr) -> Stmt {
        Stmt::new(StmtKind::Ret {
            ret: Some(Box::new(expr)),
        })
    }
}

impl StmtKind {
    pub fn discriminant(&self) -> i64 {
        match self {
            StmtKind::Expr { .. } => 0,
            StmtKind::List { .. } => 1,
            StmtKind::Ret { .. } => 2,
            StmtKind::Cont { .. } => 3,
            StmtKind::Break { .. } => 4,
        }
    }

    /// An empty statement of the given kind. `None` for unknown kinds.
    pub fn empty(discriminant: i64) -> Option<StmtKind> {
        let kind = match discriminant {
            0 => StmtKind::Expr { expr: None },
            1 => StmtKind::List { stmts: Vec::new() },
            2 => StmtKind::Ret { ret: None },
            3 => StmtKind::Cont { val: None },
            4 => StmtKind::Break { val: None },
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(&self) -> &'static str {
        match self {
            StmtKind::Expr { .. } => STMT_NAMES[0],
            StmtKind::List { .. } => STMT_NAMES[1],
            StmtKind::Ret { .. } => STMT_NAMES[2],
            StmtKind::Cont { .. } => STMT_NAMES[3],
            StmtKind::Break { .. } => STMT_NAMES[4],
        }
    }
}

/// Literal payload. All fields exist on every literal; `littype` says which
/// one the evaluator reads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Lit {
    pub littype: i64,
    pub ival: i64,
    pub fval: f64,
    pub str: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub loc: Loc,
    pub kind: ExprKind,
}

type Node<T> = Option<Box<T>>;

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Lit(Lit),
    ListGen {
        list: Vec<Expr>,
    },
    MapGen {
        map: Vec<(Expr, Expr)>,
    },
    BinOp {
        op: i64,
        left: Node<Expr>,
        right: Node<Expr>,
    },
    UnOp {
        op: i64,
        expr: Node<Expr>,
    },
    Index {
        expr: Node<Expr>,
        index: Node<Expr>,
    },
    SetIndex {
        expr: Node<Expr>,
        index: Node<Expr>,
        value: Node<Expr>,
    },
    Assign {
        ident: String,
        value: Node<Expr>,
    },
    Ref {
        ident: String,
    },
    Call {
        expr: Node<Expr>,
        args: Vec<Expr>,
    },
    FuncDecl {
        name: Option<String>,
        args: Vec<String>,
        body: Node<Stmt>,
    },
    IfElse {
        cond: Node<Expr>,
        iftrue: Node<Stmt>,
        iffalse: Node<Stmt>,
    },
    Loop {
        cond: Node<Expr>,
        body: Node<Stmt>,
    },
    Iter {
        var: String,
        iter: Node<Expr>,
        body: Node<Stmt>,
    },
}

impl Expr {
    pub fn new(kind: ExprKind) -> Expr {
        Expr {
            loc: Loc::default(),
            kind,
        }
    }

    /// An integer literal.
    pub fn int(value: i64) -> Expr {
        Expr::new(ExprKind::Lit(Lit {
            ival: value,
            ..Lit::default()
        }))
    }

    /// A variable reference.
    pub fn ident(name: impl Into<String>) -> Expr {
        Expr::new(ExprKind::Ref { ident: name.into() })
    }
}

impl ExprKind {
    pub fn discriminant(&self) -> i64 {
        match self {
            ExprKind::Lit(_) => 0,
            ExprKind::ListGen { .. } => 1,
            ExprKind::MapGen { .. } => 2,
            ExprKind::BinOp { .. } => 3,
            ExprKind::UnOp { .. } => 4,
            ExprKind::Index { .. } => 5,
            ExprKind::SetIndex { .. } => 6,
            ExprKind::Assign { .. } => 7,
            ExprKind::Ref { .. } => 8,
            ExprKind::Call { .. } => 9,
            ExprKind::FuncDecl { .. } => 10,
            ExprKind::IfElse { .. } => 11,
            ExprKind::Loop { .. } => 12,
            ExprKind::Iter { .. } => 13,
        }
    }

    /// An empty expression of the given kind. `None` for unknown kinds.
    pub fn empty(discriminant: i64) -> Option<ExprKind> {
        let kind = match discriminant {
            0 => ExprKind::Lit(Lit::default()),
            1 => ExprKind::ListGen { list: Vec::new() },
            2 => ExprKind::MapGen { map: Vec::new() },
            3 => ExprKind::BinOp {
                op: 0,
                left: None,
                right: None,
            },
            4 => ExprKind::UnOp { op: 0, expr: None },
            5 => ExprKind::Index {
                expr: None,
                index: None,
            },
            6 => ExprKind::SetIndex {
                expr: None,
                index: None,
                value: None,
            },
            7 => ExprKind::Assign {
                ident: String::new(),
                value: None,
            },
            8 => ExprKind::Ref {
                ident: String::new(),
            },
            9 => ExprKind::Call {
                expr: None,
                args: Vec::new(),
            },
            10 => ExprKind::FuncDecl {
                name: None,
                args: Vec::new(),
                body: None,
            },
            11 => ExprKind::IfElse {
                cond: None,
                iftrue: None,
                iffalse: None,
            },
            12 => ExprKind::Loop {
                cond: None,
                body: None,
            },
            13 => ExprKind::Iter {
                var: String::new(),
                iter: None,
                body: None,
            },
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(&self) -> &'static str {
        usize::try_from(self.discriminant())
            .ok()
            .and_then(|index| EXPR_NAMES.get(index))
            .copied()
            .unwrap_or("?")
    }
}
