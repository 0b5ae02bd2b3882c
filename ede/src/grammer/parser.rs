use std::collections::HashSet;

use super::ast::{
    Binop, Def, DefKind, Expr, ExprKind, Func, Item, Literal, Module, Stmt, StmtKind, TypeCell,
    TypeSymbol, TypeSymbolKind,
};
use super::parsercore::Parser;
use super::token::{Pos, TokenKind};
use crate::error::{Diagnostic, ParseError};
use crate::{check, expect, optional, repeat};

/// Binary operator as seen by precedence climbing. `=` is kept apart from
/// the arithmetic operators since its left side is a name, not an expression.
#[derive(Debug, Clone, Copy)]
enum Op {
    Assign,
    Bin(Binop),
}

impl Op {
    fn prec(&self) -> u8 {
        match self {
            Op::Assign => 0,
            Op::Bin(Binop::Add | Binop::Sub) => 1,
            Op::Bin(Binop::Mul | Binop::Div) => 2,
        }
    }

    fn right_assoc(&self) -> bool {
        matches!(self, Op::Assign)
    }
}

impl Parser {
    /// module = { def | stmt } EOF
    pub fn parse_module(mut self, name: &str) -> Result<Module, Diagnostic> {
        let mut defs = Vec::new();
        let mut stmts = Vec::new();
        while !check!(self, Eof) {
            if check!(self, KwDef) {
                defs.push(self.parse_def()?);
            } else {
                stmts.push(self.parse_stmt()?);
            }
        }
        expect!(self, Eof)?;
        Ok(Module {
            name: name.to_string(),
            defs,
            stmts,
            ty: TypeCell::default(),
        })
    }
}

impl Parser {
    fn parse_ident(&mut self) -> Result<(String, Pos), Diagnostic> {
        let token = expect!(self, Ident)?;
        match token.kind {
            TokenKind::Ident(name) => Ok((name, token.pos)),
            _ => Err(self.unexpected()),
        }
    }

    /// item = ident ":" type
    fn parse_item(&mut self) -> Result<Item, Diagnostic> {
        let (name, pos) = self.parse_ident()?;
        expect!(self, Colon)?;
        let ty = self.parse_type()?;
        Ok(Item { pos, name, ty })
    }

    /// type = ident | "[" type "]" | "(" type "," type { "," type } ")" | "{" item { "," item } "}"
    fn parse_type(&mut self) -> Result<TypeSymbol, Diagnostic> {
        let pos = self.peek().pos;

        // Named type: ident
        if check!(self, Ident) {
            let (name, _) = self.parse_ident()?;
            return Ok(TypeSymbol::new(pos, TypeSymbolKind::Name(name)));
        }

        // Array type: "[" type "]"
        if check!(self, LBracket) {
            expect!(self, LBracket)?;
            let inner = self.parse_type()?;
            expect!(self, RBracket)?;
            return Ok(TypeSymbol::new(pos, TypeSymbolKind::Array(Box::new(inner))));
        }

        // Tuple type: at least two elements
        if check!(self, LParen) {
            expect!(self, LParen)?;
            let mut inner = vec![self.parse_type()?];
            expect!(self, Comma)?;
            inner.push(self.parse_type()?);
            while optional!(self, Comma).is_some() {
                inner.push(self.parse_type()?);
            }
            expect!(self, RParen)?;
            return Ok(TypeSymbol::new(pos, TypeSymbolKind::Tuple(inner)));
        }

        // Record type: never empty
        if check!(self, LCurly) {
            expect!(self, LCurly)?;
            let mut items = vec![self.parse_item()?];
            while optional!(self, Comma).is_some() {
                items.push(self.parse_item()?);
            }
            expect!(self, RCurly)?;
            check_dup(&items)?;
            return Ok(TypeSymbol::new(pos, TypeSymbolKind::Record(items)));
        }

        Err(self.unexpected())
    }

    /// def = "def" ( obj-def | func-def )
    fn parse_def(&mut self) -> Result<Def, Diagnostic> {
        let pos = expect!(self, KwDef)?.pos;

        // obj-def = "object" ident "{" [ item { "," item } ] "}"
        if optional!(self, KwObject).is_some() {
            let (name, _) = self.parse_ident()?;
            expect!(self, LCurly)?;
            let fields = repeat!(self, self.parse_item(), Comma, RCurly);
            expect!(self, RCurly)?;
            check_dup(&fields)?;
            return Ok(Def::new(pos, DefKind::Object(name, fields)));
        }

        // func-def = "func" ident "(" [ item { "," item } ] ")" [ ":" type ] block
        if optional!(self, KwFunc).is_some() {
            let (name, name_pos) = self.parse_ident()?;
            expect!(self, LParen)?;
            let params = repeat!(self, self.parse_item(), Comma, RParen);
            expect!(self, RParen)?;
            check_dup(&params)?;
            let ret = optional!(self, Colon, self.parse_type()?).unwrap_or_else(|| {
                TypeSymbol::new(name_pos, TypeSymbolKind::Name("unit".to_string()))
            });
            let body = self.parse_block()?;
            return Ok(Def::new(
                pos,
                DefKind::Func(Func {
                    name,
                    params,
                    ret,
                    body: Box::new(body),
                }),
            ));
        }

        Err(self.unexpected())
    }

    /// block = "{" { stmt } "}"
    fn parse_block(&mut self) -> Result<Stmt, Diagnostic> {
        let pos = expect!(self, LCurly)?.pos;
        let stmts = repeat!(self, self.parse_stmt(), RCurly);
        expect!(self, RCurly)?;
        Ok(Stmt::new(pos, StmtKind::Block(stmts)))
    }

    /// stmt = let-stmt | if-stmt | while-stmt | block | return-stmt | expr ";"
    fn parse_stmt(&mut self) -> Result<Stmt, Diagnostic> {
        let pos = self.peek().pos;

        // Declaration: "let" ident ( ":" type [ "=" expr ] | "=" expr ) ";"
        if check!(self, KwLet) {
            expect!(self, KwLet)?;
            let (name, _) = self.parse_ident()?;
            let ty = optional!(self, Colon, self.parse_type()?);
            let init = match ty {
                Some(_) => optional!(self, Equal, self.parse_expr()?),
                None => {
                    expect!(self, Equal)?;
                    Some(self.parse_expr()?)
                }
            };
            expect!(self, Semicolon)?;
            return Ok(Stmt::new(pos, StmtKind::VarDecl(name, ty, init)));
        }

        // Conditional: "if" "(" expr ")" stmt [ "else" stmt ]
        if check!(self, KwIf) {
            expect!(self, KwIf)?;
            expect!(self, LParen)?;
            let cond = self.parse_expr()?;
            expect!(self, RParen)?;
            let then = Box::new(self.parse_stmt()?);
            let els = optional!(self, KwElse, Box::new(self.parse_stmt()?));
            return Ok(Stmt::new(pos, StmtKind::IfElse(cond, then, els)));
        }

        // Loop: "while" "(" expr ")" stmt
        if check!(self, KwWhile) {
            expect!(self, KwWhile)?;
            expect!(self, LParen)?;
            let cond = self.parse_expr()?;
            expect!(self, RParen)?;
            let body = Box::new(self.parse_stmt()?);
            return Ok(Stmt::new(pos, StmtKind::While(cond, body)));
        }

        // Block
        if check!(self, LCurly) {
            return self.parse_block();
        }

        // Return: "return" [ expr ] ";"
        if check!(self, KwReturn) {
            expect!(self, KwReturn)?;
            let expr = match check!(self, Semicolon) {
                true => None,
                false => Some(self.parse_expr()?),
            };
            expect!(self, Semicolon)?;
            return Ok(Stmt::new(pos, StmtKind::Return(expr)));
        }

        // Expression statement: expr ";"
        let expr = self.parse_expr()?;
        expect!(self, Semicolon)?;
        Ok(Stmt::new(pos, StmtKind::Expr(expr)))
    }

    pub fn parse_expr(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_binop(0)
    }

    fn peek_op(&mut self) -> Option<Op> {
        if check!(self, Equal) {
            Some(Op::Assign)
        } else if check!(self, Plus) {
            Some(Op::Bin(Binop::Add))
        } else if check!(self, Minus) {
            Some(Op::Bin(Binop::Sub))
        } else if check!(self, Star) {
            Some(Op::Bin(Binop::Mul))
        } else if check!(self, Slash) {
            Some(Op::Bin(Binop::Div))
        } else {
            None
        }
    }

    /// expr = atom { binop expr }, climbing from precedence `min`
    fn parse_binop(&mut self, min: u8) -> Result<Expr, Diagnostic> {
        let mut lhs = self.parse_atom()?;
        while let Some(op) = self.peek_op() {
            if op.prec() < min {
                break;
            }
            let token = self.next();
            let next_min = match op.right_assoc() {
                true => op.prec(),
                false => op.prec() + 1,
            };
            let rhs = Box::new(self.parse_binop(next_min)?);
            lhs = match op {
                Op::Assign => match lhs.kind {
                    ExprKind::Ident(name) => Expr::new(lhs.pos, ExprKind::Assign(name, rhs)),
                    _ => return Err(ParseError::InvalidOperator.at(token.pos)),
                },
                Op::Bin(binop) => Expr::new(lhs.pos, ExprKind::Binop(binop, Box::new(lhs), rhs)),
            };
        }
        Ok(lhs)
    }

    /// atom = literal | "(" [ expr { "," expr } ] ")" | "[" [ expr { "," expr } ] "]"
    ///      | "default" "(" type ")" | ident [ call-args | object-inits ]
    fn parse_atom(&mut self) -> Result<Expr, Diagnostic> {
        let pos = self.peek().pos;

        // Literals
        if check!(self, Integer)
            || check!(self, Text)
            || check!(self, Char)
            || check!(self, KwTrue)
            || check!(self, KwFalse)
        {
            let lit = match self.next().kind {
                TokenKind::Integer(v) => Literal::Int(v),
                TokenKind::Text(s) => Literal::Str(s),
                TokenKind::Char(c) => Literal::Char(c),
                TokenKind::KwTrue => Literal::Bool(true),
                TokenKind::KwFalse => Literal::Bool(false),
                _ => return Err(self.unexpected()),
            };
            return Ok(Expr::new(pos, ExprKind::Literal(lit)));
        }

        // Unit, parenthesized expression or tuple
        if check!(self, LParen) {
            expect!(self, LParen)?;
            if optional!(self, RParen).is_some() {
                return Ok(Expr::new(pos, ExprKind::Literal(Literal::Unit)));
            }
            let first = self.parse_expr()?;
            if optional!(self, RParen).is_some() {
                return Ok(first);
            }
            let mut items = vec![first];
            while optional!(self, Comma).is_some() {
                items.push(self.parse_expr()?);
            }
            expect!(self, RParen)?;
            return Ok(Expr::new(pos, ExprKind::Tuple(items)));
        }

        // Array: "[" [ expr { "," expr } ] "]"
        if check!(self, LBracket) {
            expect!(self, LBracket)?;
            let items = repeat!(self, self.parse_expr(), Comma, RBracket);
            expect!(self, RBracket)?;
            return Ok(Expr::new(pos, ExprKind::Array(items)));
        }

        // Default value: "default" "(" type ")"
        if check!(self, KwDefault) {
            expect!(self, KwDefault)?;
            expect!(self, LParen)?;
            let ty = self.parse_type()?;
            expect!(self, RParen)?;
            return Ok(Expr::new(pos, ExprKind::Default(ty)));
        }

        if check!(self, Ident) {
            let (name, _) = self.parse_ident()?;

            // Function call: ident "(" [ expr { "," expr } ] ")"
            if check!(self, LParen) {
                expect!(self, LParen)?;
                let args = repeat!(self, self.parse_expr(), Comma, RParen);
                expect!(self, RParen)?;
                return Ok(Expr::new(pos, ExprKind::Call(name, args)));
            }

            // Object initializer: ident "{" [ ident "=" expr { "," ident "=" expr } ] "}"
            if check!(self, LCurly) {
                expect!(self, LCurly)?;
                let inits = repeat!(self, self.parse_init(), Comma, RCurly);
                expect!(self, RCurly)?;
                return Ok(Expr::new(pos, ExprKind::Object(name, inits)));
            }

            return Ok(Expr::new(pos, ExprKind::Ident(name)));
        }

        Err(self.unexpected())
    }

    fn parse_init(&mut self) -> Result<(String, Expr), Diagnostic> {
        let (name, _) = self.parse_ident()?;
        expect!(self, Equal)?;
        let expr = self.parse_expr()?;
        Ok((name, expr))
    }
}

fn check_dup(items: &[Item]) -> Result<(), Diagnostic> {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.name.as_str()) {
            return Err(ParseError::DupRecordItemName(item.name.clone()).at(item.pos));
        }
    }
    Ok(())
}
