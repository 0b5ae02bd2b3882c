//! Lowering of a checked module to the symbolic IR.
//!
//! Every expression leaves exactly one word on the stack and every statement
//! leaves the stack as it found it, except `let`, which leaves its value in
//! the next frame slot until the enclosing scope closes.

use std::collections::HashSet;

use arch::{OpCode, SyscallCode};
use asm::{Code, Inst};

use crate::grammer::ast::{
    Binop, DefKind, Expr, ExprKind, Func, Literal, Module, Stmt, StmtKind,
};
use crate::types::{EdeType, Primitive};

pub const START: &str = "__start";
pub const MAIN: &str = "__main";

pub fn func_label(name: &str) -> String {
    format!("func.{}", name)
}

/// Build the IR of a type-checked module.
/// Panics if the module has not been checked.
pub fn compile(module: &Module) -> Code {
    let mut b = Builder::default();

    b.label(START);
    b.emit(Inst::jumpl(MAIN));

    for def in &module.defs {
        if let DefKind::Func(func) = &def.kind {
            b.func(func);
        }
    }

    b.label(MAIN);
    b.frame = Frame::default();
    b.frame.open();

    let (last, init) = match module.stmts.split_last() {
        Some((last, init)) => (Some(last), init),
        None => (None, &module.stmts[..]),
    };
    for stmt in init {
        b.stmt(stmt);
    }
    match last {
        // A scalar result becomes the exit status
        Some(Stmt {
            kind: StmtKind::Expr(e),
            ..
        }) if e.ty.ty().is_scalar() => b.expr(e),
        Some(stmt) => {
            b.stmt(stmt);
            b.emit(Inst::pushi(0));
        }
        None => b.emit(Inst::pushi(0)),
    }
    b.emit(Inst::syscall(SyscallCode::EXIT));

    b.code
}

/// Names of the live frame slots, innermost last.
#[derive(Debug, Default)]
struct Frame {
    names: Vec<String>,
    // Start of each open scope in `names`
    marks: Vec<usize>,
}

impl Frame {
    fn open(&mut self) {
        self.marks.push(self.names.len());
    }

    /// Close the innermost scope, returning how many slots it held.
    fn close(&mut self) -> usize {
        let mark = self.marks.pop().unwrap_or(0);
        let n = self.names.len() - mark;
        self.names.truncate(mark);
        n
    }

    fn bind(&mut self, name: &str) {
        self.names.push(name.to_string());
    }

    fn slot(&self, name: &str) -> usize {
        match self.names.iter().rposition(|n| n == name) {
            Some(slot) => slot,
            None => panic!("unbound variable `{}`", name),
        }
    }
}

#[derive(Debug, Default)]
struct Builder {
    code: Code,
    labels: HashSet<String>,
    frame: Frame,
    next_id: usize,
}

impl Builder {
    fn emit(&mut self, inst: Inst) {
        self.code.inst(inst);
    }

    fn op(&mut self, op: OpCode) {
        self.emit(Inst::nullary(op));
    }

    fn label(&mut self, name: &str) {
        assert!(self.labels.insert(name.to_string()), "duplicate label `{}`", name);
        self.code.label(name);
    }

    fn fresh(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    fn func(&mut self, func: &Func) {
        self.label(&func_label(&func.name));
        self.frame = Frame::default();
        self.frame.open();
        for param in &func.params {
            self.frame.bind(&param.name);
        }
        self.stmt(&func.body);
        self.emit(Inst::pushi(0));
        self.op(OpCode::RET);
    }

    /// Lower `stmt` in a scope of its own.
    fn scoped(&mut self, stmt: &Stmt) {
        self.frame.open();
        self.stmt(stmt);
        self.close();
    }

    fn close(&mut self) {
        for _ in 0..self.frame.close() {
            self.op(OpCode::POP);
        }
    }
}

// ----------------------------------------------------------------------------
// Statements
// ----------------------------------------------------------------------------

impl Builder {
    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::VarDecl(name, sym, init) => {
                match (init, sym) {
                    (Some(init), _) => self.expr(init),
                    (None, Some(sym)) => self.push_default(sym.ty.ty()),
                    (None, None) => panic!("declaration of `{}` without type", name),
                }
                self.frame.bind(name);
            }
            StmtKind::Expr(e) => {
                self.expr(e);
                self.op(OpCode::POP);
            }
            StmtKind::Block(stmts) => {
                self.frame.open();
                for stmt in stmts {
                    self.stmt(stmt);
                }
                self.close();
            }
            StmtKind::IfElse(cond, then, els) => {
                let id = self.fresh();
                let else_label = format!("if.{}.else", id);
                let end_label = format!("if.{}.end", id);

                self.expr(cond);
                self.emit(Inst::jumpzl(&else_label));
                self.scoped(then);
                self.emit(Inst::jumpl(&end_label));
                self.label(&else_label);
                if let Some(els) = els {
                    self.scoped(els);
                }
                self.label(&end_label);
            }
            StmtKind::While(cond, body) => {
                let id = self.fresh();
                let cond_label = format!("while.{}.cond", id);
                let end_label = format!("while.{}.end", id);

                self.label(&cond_label);
                self.expr(cond);
                self.emit(Inst::jumpzl(&end_label));
                self.scoped(body);
                self.emit(Inst::jumpl(&cond_label));
                self.label(&end_label);
            }
            StmtKind::Return(value) => {
                match value {
                    Some(e) => self.expr(e),
                    None => self.emit(Inst::pushi(0)),
                }
                self.op(OpCode::RET);
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Expressions
// ----------------------------------------------------------------------------

impl Builder {
    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(lit) => match lit {
                Literal::Unit => self.emit(Inst::pushi(0)),
                Literal::Int(v) => self.emit(Inst::pushi(*v)),
                Literal::Char(c) => self.emit(Inst::pushi(*c as i64)),
                Literal::Bool(b) => self.emit(Inst::pushi(*b as i64)),
                Literal::Str(s) => {
                    for c in s.chars() {
                        self.emit(Inst::pushi(c as i64));
                    }
                    self.emit(Inst::pack(s.chars().count()));
                }
            },

            ExprKind::Ident(name) => {
                let slot = self.frame.slot(name);
                self.emit(Inst::sload(slot));
            }

            // right; left; SWAP; op
            ExprKind::Binop(op, left, right) => {
                self.expr(right);
                self.expr(left);
                self.op(OpCode::SWAP);
                let string = *left.ty.ty() == EdeType::STRING;
                self.op(match (op, string) {
                    (Binop::Add, true) => OpCode::SCAT,
                    (Binop::Add, false) => OpCode::IADD,
                    (Binop::Sub, _) => OpCode::ISUB,
                    (Binop::Mul, _) => OpCode::IMUL,
                    (Binop::Div, _) => OpCode::IDIV,
                });
            }

            ExprKind::Assign(name, value) => {
                self.expr(value);
                let slot = self.frame.slot(name);
                self.emit(Inst::sstore(slot));
                self.emit(Inst::sload(slot));
            }

            ExprKind::Array(elems) | ExprKind::Tuple(elems) => {
                for e in elems {
                    self.expr(e);
                }
                self.emit(Inst::pack(elems.len()));
            }

            // Fields go in declaration order, missing ones defaulted
            ExprKind::Object(_, inits) => {
                let fields = match expr.ty.ty() {
                    EdeType::Object(_, fields) => fields,
                    ty => panic!("object initializer of type `{}`", ty),
                };
                for (name, ty) in fields {
                    match inits.iter().find(|(n, _)| n == name) {
                        Some((_, value)) => self.expr(value),
                        None => self.push_default(ty),
                    }
                }
                self.emit(Inst::pack(fields.len()));
            }

            ExprKind::Call(name, args) => {
                for arg in args {
                    self.expr(arg);
                }
                self.emit(Inst::calll(&func_label(name), args.len()));
            }

            ExprKind::Default(_) => self.push_default(expr.ty.ty()),
        }
    }

    fn push_default(&mut self, ty: &EdeType) {
        match ty {
            EdeType::Prim(Primitive::Str) | EdeType::Array(_) => self.emit(Inst::pack(0)),
            EdeType::Prim(_) | EdeType::Func(..) => self.emit(Inst::pushi(0)),
            EdeType::Tuple(elems) => {
                for ty in elems {
                    self.push_default(ty);
                }
                self.emit(Inst::pack(elems.len()));
            }
            EdeType::Object(_, fields) => {
                for (_, ty) in fields {
                    self.push_default(ty);
                }
                self.emit(Inst::pack(fields.len()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asm::Element;

    fn ir(src: &str) -> Vec<String> {
        let module = crate::frontend(src, "test").unwrap();
        compile(&module)
            .elements()
            .iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn binop_order() {
        let code = ir("1 - 2;");
        assert_eq!(
            code,
            [
                "__start:",
                "    JUMPL __main",
                "__main:",
                "    PUSHI 2",
                "    PUSHI 1",
                "    SWAP",
                "    ISUB",
                "    SYSCALL EXIT",
            ]
        );
    }

    #[test]
    fn locals_and_halt() {
        let code = ir("let a = 10; { let b = a; b = 3; } \"hi\";");
        assert_eq!(
            code[3..],
            [
                "    PUSHI 10",
                "    SLOAD 0",
                "    PUSHI 3",
                "    SSTORE 1",
                "    SLOAD 1",
                "    POP",
                "    POP",
                "    PUSHI 104",
                "    PUSHI 105",
                "    PACK 2",
                "    POP",
                "    PUSHI 0",
                "    SYSCALL EXIT",
            ]
        );
    }

    #[test]
    fn functions_come_first() {
        let code = compile(
            &crate::frontend("def func id(x: int): int { return x; } id(4);", "test").unwrap(),
        );
        let labels: Vec<_> = code
            .elements()
            .iter()
            .filter_map(|e| match e {
                Element::Label(l) => Some(l.as_str()),
                Element::Inst(_) => None,
            })
            .collect();
        assert_eq!(labels, ["__start", "func.id", "__main"]);
        assert!(code.to_string().contains("CALLL func.id 1"));
    }

    #[test]
    fn object_defaults() {
        let code = ir("def object P { x: int, s: string, t: (int, bool) } P { x = 1 };");
        assert_eq!(
            code[3..9],
            [
                "    PUSHI 1",
                "    PACK 0",
                "    PUSHI 0",
                "    PUSHI 0",
                "    PACK 2",
                "    PACK 3",
            ]
        );
    }
}
