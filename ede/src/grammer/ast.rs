use std::fmt;

use itertools::Itertools;
use once_cell::unsync::OnceCell;
use strum::Display;

use super::token::Pos;
use crate::types::EdeType;

/// Write-once slot holding the type the checker assigned to a node.
#[derive(Debug, Clone, Default)]
pub struct TypeCell(OnceCell<EdeType>);

impl TypeCell {
    pub fn get(&self) -> Option<&EdeType> {
        self.0.get()
    }

    /// Panics if the node was already checked.
    pub fn set(&self, ty: EdeType) -> EdeType {
        if self.0.set(ty.clone()).is_err() {
            panic!("node type assigned twice");
        }
        ty
    }

    /// Panics if the node has not been checked yet.
    pub fn ty(&self) -> &EdeType {
        match self.0.get() {
            Some(ty) => ty,
            None => panic!("node has not been type checked"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub defs: Vec<Def>, // { def }
    pub stmts: Vec<Stmt>, // { stmt }
    pub ty: TypeCell,
}

#[derive(Debug, Clone)]
pub struct Def {
    pub pos: Pos,
    pub kind: DefKind,
    pub ty: TypeCell,
}

#[derive(Debug, Clone)]
pub enum DefKind {
    Object(String, Vec<Item>), // "def" "object" ident "{" [ item { "," item } ] "}"
    Func(Func),                // "def" "func" ident "(" [ item { "," item } ] ")" [ ":" type ] block
}

#[derive(Debug, Clone)]
pub struct Func {
    pub name: String,
    pub params: Vec<Item>,
    pub ret: TypeSymbol,
    pub body: Box<Stmt>, // always a Block
}

/// `ident ":" type`
#[derive(Debug, Clone)]
pub struct Item {
    pub pos: Pos,
    pub name: String,
    pub ty: TypeSymbol,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub pos: Pos,
    pub kind: StmtKind,
    pub ty: TypeCell,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    VarDecl(String, Option<TypeSymbol>, Option<Expr>), // "let" ident [ ":" type ] [ "=" expr ] ";"
    Expr(Expr),                                        // expr ";"
    Block(Vec<Stmt>),                                  // "{" { stmt } "}"
    IfElse(Expr, Box<Stmt>, Option<Box<Stmt>>),        // "if" "(" expr ")" stmt [ "else" stmt ]
    While(Expr, Box<Stmt>),                            // "while" "(" expr ")" stmt
    Return(Option<Expr>),                              // "return" [ expr ] ";"
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub pos: Pos,
    pub kind: ExprKind,
    pub ty: TypeCell,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    Ident(String),                         // ident
    Binop(Binop, Box<Expr>, Box<Expr>),    // expr binop expr
    Assign(String, Box<Expr>),             // ident "=" expr
    Array(Vec<Expr>),                      // "[" [ expr { "," expr } ] "]"
    Tuple(Vec<Expr>),                      // "(" expr "," expr { "," expr } ")"
    Object(String, Vec<(String, Expr)>),   // ident "{" [ ident "=" expr { "," ... } ] "}"
    Call(String, Vec<Expr>),               // ident "(" [ expr { "," expr } ] ")"
    Default(TypeSymbol),                   // "default" "(" type ")"
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Unit,         // "(" ")"
    Int(i64),     // INTEGER
    Str(String),  // STRING
    Char(char),   // CHAR
    Bool(bool),   // "true" | "false"
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Binop {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
}

#[derive(Debug, Clone)]
pub struct TypeSymbol {
    pub pos: Pos,
    pub kind: TypeSymbolKind,
    pub ty: TypeCell,
}

#[derive(Debug, Clone)]
pub enum TypeSymbolKind {
    Name(String),         // ident
    Array(Box<TypeSymbol>), // "[" type "]"
    Tuple(Vec<TypeSymbol>), // "(" type "," type { "," type } ")"
    Record(Vec<Item>),    // "{" item { "," item } "}"
}

// ----------------------------------------------------------------------------
// Constructors
// ----------------------------------------------------------------------------

impl Expr {
    pub fn new(pos: Pos, kind: ExprKind) -> Self {
        Expr {
            pos,
            kind,
            ty: TypeCell::default(),
        }
    }
}

impl Stmt {
    pub fn new(pos: Pos, kind: StmtKind) -> Self {
        Stmt {
            pos,
            kind,
            ty: TypeCell::default(),
        }
    }
}

impl TypeSymbol {
    pub fn new(pos: Pos, kind: TypeSymbolKind) -> Self {
        TypeSymbol {
            pos,
            kind,
            ty: TypeCell::default(),
        }
    }
}

impl Def {
    pub fn new(pos: Pos, kind: DefKind) -> Self {
        Def {
            pos,
            kind,
            ty: TypeCell::default(),
        }
    }
}

// ----------------------------------------------------------------------------
// Display
// ----------------------------------------------------------------------------

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Unit => write!(f, "()"),
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Str(s) => write!(f, "{:?}", s),
            Literal::Char(c) => write!(f, "{:?}", c),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Literal(lit) => write!(f, "{}", lit),
            ExprKind::Ident(name) => write!(f, "{}", name),
            ExprKind::Binop(op, l, r) => write!(f, "Binop({}, {}, {})", op, l, r),
            ExprKind::Assign(name, e) => write!(f, "Assign({}, {})", name, e),
            ExprKind::Array(es) => write!(f, "[{}]", es.iter().join(", ")),
            ExprKind::Tuple(es) => write!(f, "({})", es.iter().join(", ")),
            ExprKind::Object(name, inits) => write!(
                f,
                "{}{{{}}}",
                name,
                inits.iter().map(|(n, e)| format!("{} = {}", n, e)).join(", ")
            ),
            ExprKind::Call(name, args) => write!(f, "{}({})", name, args.iter().join(", ")),
            ExprKind::Default(ty) => write!(f, "default({})", ty),
        }
    }
}

impl fmt::Display for TypeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeSymbolKind::Name(name) => write!(f, "{}", name),
            TypeSymbolKind::Array(inner) => write!(f, "[{}]", inner),
            TypeSymbolKind::Tuple(inner) => write!(f, "({})", inner.iter().join(", ")),
            TypeSymbolKind::Record(items) => write!(f, "{{{}}}", items.iter().join(", ")),
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}

impl Stmt {
    fn fmt_indent(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        match &self.kind {
            StmtKind::VarDecl(name, ty, init) => {
                write!(f, "{}let {}", pad, name)?;
                if let Some(ty) = ty {
                    write!(f, ": {}", ty)?;
                }
                if let Some(init) = init {
                    write!(f, " = {}", init)?;
                }
                writeln!(f, ";")
            }
            StmtKind::Expr(e) => writeln!(f, "{}{};", pad, e),
            StmtKind::Block(stmts) => {
                writeln!(f, "{}{{", pad)?;
                for s in stmts {
                    s.fmt_indent(f, depth + 1)?;
                }
                writeln!(f, "{}}}", pad)
            }
            StmtKind::IfElse(cond, then, els) => {
                writeln!(f, "{}if ({})", pad, cond)?;
                then.fmt_indent(f, depth + 1)?;
                if let Some(els) = els {
                    writeln!(f, "{}else", pad)?;
                    els.fmt_indent(f, depth + 1)?;
                }
                Ok(())
            }
            StmtKind::While(cond, body) => {
                writeln!(f, "{}while ({})", pad, cond)?;
                body.fmt_indent(f, depth + 1)
            }
            StmtKind::Return(Some(e)) => writeln!(f, "{}return {};", pad, e),
            StmtKind::Return(None) => writeln!(f, "{}return;", pad),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indent(f, 0)
    }
}

impl fmt::Display for Def {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DefKind::Object(name, fields) => {
                writeln!(f, "def object {} {{{}}}", name, fields.iter().join(", "))
            }
            DefKind::Func(func) => {
                writeln!(
                    f,
                    "def func {}({}): {}",
                    func.name,
                    func.params.iter().join(", "),
                    func.ret
                )?;
                func.body.fmt_indent(f, 0)
            }
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "module {}", self.name)?;
        for def in &self.defs {
            write!(f, "{}", def)?;
        }
        for stmt in &self.stmts {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}
