//! Direct interpretation of a checked module.
//!
//! Used as a reference for the bytecode path: a program's VM exit status
//! should equal `evaluate(..)?.exit_code()`.

mod value;

use std::collections::HashMap;

use thiserror::Error;

use crate::grammer::ast::{
    Binop, DefKind, Expr, ExprKind, Func, Literal, Module, Stmt, StmtKind,
};
use crate::grammer::token::Pos;
use crate::types::EdeType;

pub use value::Value;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Exception {
    #[error("{0} division by zero")]
    DivisionByZero(Pos),
}

/// Run a checked module. Its value is the value of the last top-level
/// statement when that is an expression statement, else unit.
pub fn evaluate(module: &Module) -> Result<Value, Exception> {
    let funcs = module
        .defs
        .iter()
        .filter_map(|def| match &def.kind {
            DefKind::Func(func) => Some((func.name.as_str(), func)),
            DefKind::Object(..) => None,
        })
        .collect();
    let mut eval = Evaluator {
        funcs,
        env: Env::default(),
    };

    eval.env.open();
    let mut last = Value::Unit;
    for stmt in &module.stmts {
        last = match eval.stmt(stmt)? {
            Flow::Normal(v) if matches!(stmt.kind, StmtKind::Expr(_)) => v,
            _ => Value::Unit,
        };
    }
    Ok(last)
}

enum Flow {
    Normal(Value),
    Return(Value),
}

/// Variable bindings, one list per open scope.
#[derive(Debug, Default)]
struct Env {
    scopes: Vec<Vec<(String, Value)>>,
}

impl Env {
    fn open(&mut self) {
        self.scopes.push(vec![]);
    }

    fn close(&mut self) {
        self.scopes.pop();
    }

    fn bind(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.push((name.to_string(), value));
        }
    }

    fn slot(&mut self, name: &str) -> &mut Value {
        let found = self
            .scopes
            .iter_mut()
            .rev()
            .flat_map(|scope| scope.iter_mut().rev())
            .find(|(n, _)| n == name);
        match found {
            Some((_, v)) => v,
            None => panic!("unbound variable `{}`", name),
        }
    }
}

struct Evaluator<'a> {
    funcs: HashMap<&'a str, &'a Func>,
    env: Env,
}

impl<'a> Evaluator<'a> {
    fn scoped(&mut self, stmt: &Stmt) -> Result<Flow, Exception> {
        self.env.open();
        let flow = self.stmt(stmt);
        self.env.close();
        flow
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<Flow, Exception> {
        let value = match &stmt.kind {
            StmtKind::VarDecl(name, sym, init) => {
                let value = match (init, sym) {
                    (Some(init), _) => self.expr(init)?,
                    (None, Some(sym)) => Value::default_of(sym.ty.ty()),
                    (None, None) => panic!("declaration of `{}` without type", name),
                };
                self.env.bind(name, value);
                Value::Unit
            }
            StmtKind::Expr(e) => self.expr(e)?,
            StmtKind::Block(stmts) => {
                self.env.open();
                let mut last = Value::Unit;
                for stmt in stmts {
                    match self.stmt(stmt) {
                        Ok(Flow::Normal(v)) => last = v,
                        other => {
                            self.env.close();
                            return other;
                        }
                    }
                }
                self.env.close();
                last
            }
            StmtKind::IfElse(cond, then, els) => match (self.condition(cond)?, els) {
                (true, _) => return self.scoped(then),
                (false, Some(els)) => return self.scoped(els),
                (false, None) => Value::Unit,
            },
            StmtKind::While(cond, body) => {
                while self.condition(cond)? {
                    if let Flow::Return(v) = self.scoped(body)? {
                        return Ok(Flow::Return(v));
                    }
                }
                Value::Unit
            }
            StmtKind::Return(value) => {
                let v = match value {
                    Some(e) => self.expr(e)?,
                    None => Value::Unit,
                };
                return Ok(Flow::Return(v));
            }
        };
        Ok(Flow::Normal(value))
    }

    fn condition(&mut self, cond: &Expr) -> Result<bool, Exception> {
        Ok(matches!(self.expr(cond)?, Value::Bool(true)))
    }

    fn expr(&mut self, expr: &Expr) -> Result<Value, Exception> {
        let value = match &expr.kind {
            ExprKind::Literal(lit) => match lit {
                Literal::Unit => Value::Unit,
                Literal::Int(v) => Value::Int(*v),
                Literal::Str(s) => Value::Str(s.clone()),
                Literal::Char(c) => Value::Char(*c),
                Literal::Bool(b) => Value::Bool(*b),
            },
            ExprKind::Ident(name) => self.env.slot(name).clone(),

            // Right operand first, as on the VM
            ExprKind::Binop(op, left, right) => {
                let r = self.expr(right)?;
                let l = self.expr(left)?;
                binop(*op, l, r, expr.pos)?
            }

            ExprKind::Assign(name, value) => {
                let v = self.expr(value)?;
                *self.env.slot(name) = v.clone();
                v
            }
            ExprKind::Array(elems) => Value::Array(self.exprs(elems)?),
            ExprKind::Tuple(elems) => Value::Tuple(self.exprs(elems)?),

            ExprKind::Object(name, inits) => {
                let fields = match expr.ty.ty() {
                    EdeType::Object(_, fields) => fields,
                    ty => panic!("object initializer of type `{}`", ty),
                };
                let mut values = Vec::with_capacity(fields.len());
                for (field, ty) in fields {
                    let v = match inits.iter().find(|(n, _)| n == field) {
                        Some((_, value)) => self.expr(value)?,
                        None => Value::default_of(ty),
                    };
                    values.push((field.clone(), v));
                }
                Value::Object(name.clone(), values)
            }

            ExprKind::Call(name, args) => {
                let args = self.exprs(args)?;
                self.call(name, args)?
            }
            ExprKind::Default(_) => Value::default_of(expr.ty.ty()),
        };
        Ok(value)
    }

    fn exprs(&mut self, exprs: &[Expr]) -> Result<Vec<Value>, Exception> {
        exprs.iter().map(|e| self.expr(e)).collect()
    }

    fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, Exception> {
        let func = match self.funcs.get(name) {
            Some(func) => *func,
            None => panic!("undefined function `{}`", name),
        };

        let mut env = Env::default();
        env.open();
        for (param, arg) in func.params.iter().zip(args) {
            env.bind(&param.name, arg);
        }

        let caller = std::mem::replace(&mut self.env, env);
        let flow = self.stmt(&func.body);
        self.env = caller;

        Ok(match flow? {
            Flow::Return(v) => v,
            Flow::Normal(_) => Value::Unit,
        })
    }
}

fn binop(op: Binop, l: Value, r: Value, pos: Pos) -> Result<Value, Exception> {
    let value = match (op, l, r) {
        (Binop::Add, Value::Str(l), Value::Str(r)) => Value::Str(l + &r),
        (Binop::Add, Value::Int(l), Value::Int(r)) => Value::Int(l.wrapping_add(r)),
        (Binop::Sub, Value::Int(l), Value::Int(r)) => Value::Int(l.wrapping_sub(r)),
        (Binop::Mul, Value::Int(l), Value::Int(r)) => Value::Int(l.wrapping_mul(r)),
        (Binop::Div, Value::Int(_), Value::Int(0)) => return Err(Exception::DivisionByZero(pos)),
        (Binop::Div, Value::Int(l), Value::Int(r)) => Value::Int(l.wrapping_div(r)),
        (op, l, r) => panic!("no operator `{}` for {} and {}", op, l, r),
    };
    Ok(value)
}
