use crate::cfg;
use crate::error::{Diagnostic, TypeError};
use crate::grammer::ast::{
    Binop, Def, DefKind, Expr, ExprKind, Func, Item, Literal, Module, Stmt, StmtKind,
    TypeSymbol, TypeSymbolKind,
};
use crate::grammer::token::Pos;
use crate::scope::{Entry, EntryKind, ScopeId, Scopes};
use crate::types::EdeType;

/// Check a parsed module, assigning a type to every node.
/// Definitions are checked first, then the top-level statements.
pub fn typecheck(module: &Module) -> Result<EdeType, Diagnostic> {
    let mut checker = Checker {
        scopes: Scopes::new(),
    };
    let scope = checker.scopes.child(Scopes::PRELUDE);

    for def in &module.defs {
        checker.def(def, scope)?;
    }
    for stmt in &module.stmts {
        checker.stmt(stmt, scope)?;
    }
    Ok(module.ty.set(EdeType::UNIT))
}

/// Result type of a binary operator, if it is defined for the operands.
pub fn binop_type(op: Binop, left: &EdeType, right: &EdeType) -> Option<EdeType> {
    use Binop::*;
    match (left, right, op) {
        (l, r, Add | Sub | Mul | Div) if *l == EdeType::INT && *r == EdeType::INT => {
            Some(EdeType::INT)
        }
        (l, r, Add) if *l == EdeType::STRING && *r == EdeType::STRING => Some(EdeType::STRING),
        _ => None,
    }
}

struct Checker {
    scopes: Scopes,
}

// ----------------------------------------------------------------------------
// Definitions
// ----------------------------------------------------------------------------

impl Checker {
    fn def(&mut self, def: &Def, scope: ScopeId) -> Result<EdeType, Diagnostic> {
        let ty = match &def.kind {
            DefKind::Object(name, fields) => {
                self.no_conflict(name, def, scope)?;
                let ty = EdeType::Object(name.clone(), self.items(fields, scope)?);
                let entry = Entry::new(EntryKind::Typename, ty.clone(), def.pos);
                self.add(scope, name, entry, def.pos)?;
                ty
            }
            DefKind::Func(func) => self.func(func, def, scope)?,
        };
        Ok(def.ty.set(ty))
    }

    fn func(&mut self, func: &Func, def: &Def, scope: ScopeId) -> Result<EdeType, Diagnostic> {
        self.no_conflict(&func.name, def, scope)?;

        let params = self.items(&func.params, scope)?;
        let ret = self.resolve(&func.ret, scope)?;
        let ty = EdeType::Func(params.clone(), Box::new(ret.clone()));

        // The body sees the function itself and its parameters
        let inner = self.scopes.function(scope, ret.clone());
        let entry = Entry::new(EntryKind::Function, ty.clone(), def.pos);
        self.add(inner, &func.name, entry, def.pos)?;
        for (item, (name, ty)) in func.params.iter().zip(params) {
            let entry = Entry::new(EntryKind::Variable, ty, item.pos);
            self.add(inner, &name, entry, item.pos)?;
        }

        self.stmt(&func.body, inner)?;

        if ret != EdeType::UNIT {
            cfg::check_returns(&func.body)
                .map_err(|pos| TypeError::MissingReturn(func.name.clone()).at(pos))?;
        }

        let entry = Entry::new(EntryKind::Function, ty.clone(), def.pos);
        self.add(scope, &func.name, entry, def.pos)?;
        Ok(ty)
    }

    /// Definitions may not reuse any visible name.
    fn no_conflict(&self, name: &str, def: &Def, scope: ScopeId) -> Result<(), Diagnostic> {
        match self.scopes.find(scope, name) {
            Some(prev) => Err(TypeError::IdConflict(name.to_string(), prev.pos).at(def.pos)),
            None => Ok(()),
        }
    }

    fn add(&mut self, scope: ScopeId, name: &str, entry: Entry, pos: Pos) -> Result<(), Diagnostic> {
        self.scopes
            .add(scope, name, entry)
            .map_err(|prev| TypeError::IdConflict(name.to_string(), prev).at(pos))
    }
}

// ----------------------------------------------------------------------------
// Type symbols
// ----------------------------------------------------------------------------

impl Checker {
    fn resolve(&self, sym: &TypeSymbol, scope: ScopeId) -> Result<EdeType, Diagnostic> {
        let ty = match &sym.kind {
            TypeSymbolKind::Name(name) => match self.scopes.find(scope, name) {
                None => return Err(TypeError::UnknownId(name.clone()).at(sym.pos)),
                Some(entry) if entry.kind != EntryKind::Typename => {
                    return Err(TypeError::UnresolvableTypeName(name.clone()).at(sym.pos))
                }
                Some(entry) => entry.ty.clone(),
            },
            TypeSymbolKind::Array(inner) => EdeType::Array(Box::new(self.resolve(inner, scope)?)),
            TypeSymbolKind::Tuple(inner) => EdeType::Tuple(
                inner
                    .iter()
                    .map(|sym| self.resolve(sym, scope))
                    .collect::<Result<_, _>>()?,
            ),
            // Records are anonymous objects
            TypeSymbolKind::Record(items) => EdeType::Object(String::new(), self.items(items, scope)?),
        };
        Ok(sym.ty.set(ty))
    }

    fn items(&self, items: &[Item], scope: ScopeId) -> Result<Vec<(String, EdeType)>, Diagnostic> {
        items
            .iter()
            .map(|item| Ok((item.name.clone(), self.resolve(&item.ty, scope)?)))
            .collect()
    }
}

// ----------------------------------------------------------------------------
// Statements
// ----------------------------------------------------------------------------

impl Checker {
    fn stmt(&mut self, stmt: &Stmt, scope: ScopeId) -> Result<EdeType, Diagnostic> {
        let ty = match &stmt.kind {
            StmtKind::VarDecl(name, sym, init) => {
                let declared = sym.as_ref().map(|s| self.resolve(s, scope)).transpose()?;
                let found = init.as_ref().map(|e| self.expr(e, scope)).transpose()?;
                let ty = match (declared, found) {
                    (Some(expected), Some(found)) if expected != found => {
                        return Err(TypeError::InvalidAssignment { expected, found }.at(stmt.pos))
                    }
                    (Some(ty), _) | (None, Some(ty)) => ty,
                    (None, None) => return Err(TypeError::CannotDeduceExprType.at(stmt.pos)),
                };
                let entry = Entry::new(EntryKind::Variable, ty, stmt.pos);
                self.add(scope, name, entry, stmt.pos)?;
                EdeType::UNIT
            }

            StmtKind::Expr(expr) => self.expr(expr, scope)?,

            StmtKind::Block(stmts) => {
                let inner = self.scopes.child(scope);
                let mut last = EdeType::UNIT;
                for stmt in stmts {
                    last = self.stmt(stmt, inner)?;
                }
                last
            }

            StmtKind::IfElse(cond, then, els) => {
                self.condition(cond, scope)?;
                let inner = self.scopes.child(scope);
                let then_ty = self.stmt(then, inner)?;
                if let Some(els) = els {
                    let inner = self.scopes.child(scope);
                    let else_ty = self.stmt(els, inner)?;
                    if then_ty != else_ty {
                        return Err(
                            TypeError::IncompatibleIfElseClauses(then_ty, else_ty).at(els.pos)
                        );
                    }
                }
                then_ty
            }

            StmtKind::While(cond, body) => {
                self.condition(cond, scope)?;
                let inner = self.scopes.child(scope);
                self.stmt(body, inner)?;
                EdeType::UNIT
            }

            StmtKind::Return(value) => {
                let expected = match self.scopes.return_type(scope) {
                    Some(ty) => ty.clone(),
                    None => return Err(TypeError::ReturnOutsideFunction.at(stmt.pos)),
                };
                let (found, pos) = match value {
                    Some(e) => (self.expr(e, scope)?, e.pos),
                    None => (EdeType::UNIT, stmt.pos),
                };
                if found != expected {
                    return Err(TypeError::UnexpectedType { expected, found }.at(pos));
                }
                EdeType::UNIT
            }
        };
        Ok(stmt.ty.set(ty))
    }

    fn condition(&mut self, cond: &Expr, scope: ScopeId) -> Result<(), Diagnostic> {
        let found = self.expr(cond, scope)?;
        if found != EdeType::BOOL {
            return Err(TypeError::UnexpectedType {
                expected: EdeType::BOOL,
                found,
            }
            .at(cond.pos));
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Expressions
// ----------------------------------------------------------------------------

impl Checker {
    fn expr(&mut self, expr: &Expr, scope: ScopeId) -> Result<EdeType, Diagnostic> {
        let ty = match &expr.kind {
            ExprKind::Literal(lit) => match lit {
                Literal::Unit => EdeType::UNIT,
                Literal::Int(_) => EdeType::INT,
                Literal::Str(_) => EdeType::STRING,
                Literal::Char(_) => EdeType::CHAR,
                Literal::Bool(_) => EdeType::BOOL,
            },

            ExprKind::Ident(name) => self.variable(name, expr, scope)?,

            ExprKind::Binop(op, left, right) => {
                let l = self.expr(left, scope)?;
                let r = self.expr(right, scope)?;
                match binop_type(*op, &l, &r) {
                    Some(ty) => ty,
                    None => {
                        return Err(TypeError::InvalidBinop {
                            op: *op,
                            left: l,
                            right: r,
                        }
                        .at(expr.pos))
                    }
                }
            }

            ExprKind::Assign(name, value) => {
                let expected = self.variable(name, expr, scope)?;
                let found = self.expr(value, scope)?;
                if expected != found {
                    return Err(TypeError::InvalidAssignment { expected, found }.at(expr.pos));
                }
                expected
            }

            ExprKind::Array(elems) => {
                let mut elem_ty: Option<EdeType> = None;
                for elem in elems {
                    let found = self.expr(elem, scope)?;
                    match &elem_ty {
                        None => elem_ty = Some(found),
                        Some(expected) if *expected != found => {
                            return Err(TypeError::UnexpectedType {
                                expected: expected.clone(),
                                found,
                            }
                            .at(elem.pos))
                        }
                        Some(_) => {}
                    }
                }
                match elem_ty {
                    Some(ty) => EdeType::Array(Box::new(ty)),
                    None => return Err(TypeError::CannotDeduceExprType.at(expr.pos)),
                }
            }

            ExprKind::Tuple(elems) => EdeType::Tuple(
                elems
                    .iter()
                    .map(|e| self.expr(e, scope))
                    .collect::<Result<_, _>>()?,
            ),

            ExprKind::Object(name, inits) => self.object(name, inits, expr, scope)?,

            ExprKind::Call(name, args) => {
                let (params, ret) = match self.scopes.find(scope, name) {
                    Some(Entry {
                        kind: EntryKind::Function,
                        ty: EdeType::Func(params, ret),
                        ..
                    }) => (params.clone(), (**ret).clone()),
                    _ => return Err(TypeError::UndefinedFunction(name.clone()).at(expr.pos)),
                };
                if params.len() != args.len() {
                    return Err(TypeError::InvalidArity {
                        name: name.clone(),
                        expected: params.len(),
                        found: args.len(),
                    }
                    .at(expr.pos));
                }
                for (arg, (_, expected)) in args.iter().zip(params) {
                    let found = self.expr(arg, scope)?;
                    if found != expected {
                        return Err(TypeError::UnexpectedType { expected, found }.at(arg.pos));
                    }
                }
                ret
            }

            ExprKind::Default(sym) => self.resolve(sym, scope)?,
        };
        Ok(expr.ty.set(ty))
    }

    fn variable(&self, name: &str, expr: &Expr, scope: ScopeId) -> Result<EdeType, Diagnostic> {
        match self.scopes.find(scope, name) {
            None => Err(TypeError::UnknownId(name.to_string()).at(expr.pos)),
            Some(entry) if entry.kind != EntryKind::Variable => {
                Err(TypeError::UnknownVariable(name.to_string()).at(expr.pos))
            }
            Some(entry) => Ok(entry.ty.clone()),
        }
    }

    fn object(
        &mut self,
        name: &str,
        inits: &[(String, Expr)],
        expr: &Expr,
        scope: ScopeId,
    ) -> Result<EdeType, Diagnostic> {
        let ty = match self.scopes.find(scope, name) {
            Some(Entry {
                kind: EntryKind::Typename,
                ty: ty @ EdeType::Object(..),
                ..
            }) => ty.clone(),
            _ => return Err(TypeError::UndefinedObject(name.to_string()).at(expr.pos)),
        };

        let mut seen: Vec<&str> = Vec::new();
        for (field, value) in inits {
            if seen.contains(&field.as_str()) {
                return Err(TypeError::Reinitialization(field.clone()).at(value.pos));
            }
            let expected = match ty.field(field) {
                Some(expected) => expected.clone(),
                None => return Err(TypeError::UnexpectedInitialization(field.clone()).at(value.pos)),
            };
            let found = self.expr(value, scope)?;
            if found != expected {
                return Err(TypeError::UnexpectedType { expected, found }.at(value.pos));
            }
            seen.push(field.as_str());
        }
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binop_table() {
        use Binop::*;
        for op in [Add, Sub, Mul, Div] {
            assert_eq!(binop_type(op, &EdeType::INT, &EdeType::INT), Some(EdeType::INT));
            assert_eq!(binop_type(op, &EdeType::INT, &EdeType::CHAR), None);
            assert_eq!(binop_type(op, &EdeType::BOOL, &EdeType::BOOL), None);
        }
        assert_eq!(
            binop_type(Add, &EdeType::STRING, &EdeType::STRING),
            Some(EdeType::STRING)
        );
        assert_eq!(binop_type(Sub, &EdeType::STRING, &EdeType::STRING), None);
        assert_eq!(binop_type(Add, &EdeType::STRING, &EdeType::CHAR), None);

        let ints = EdeType::Array(Box::new(EdeType::INT));
        assert_eq!(binop_type(Add, &ints, &ints), None);
    }
}
