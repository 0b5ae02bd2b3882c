use std::collections::{BTreeSet, VecDeque};
use std::fmt::Write;

use crate::grammer::ast::{Stmt, StmtKind};
use crate::grammer::token::Pos;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Node(usize),
    Exit,
}

#[derive(Debug)]
pub struct Node<'a> {
    pub stmt: &'a Stmt,
    pub succ: Vec<Edge>,
}

/// Successor graph over the statements of one function body.
/// Blocks only sequence their statements and are not nodes themselves.
#[derive(Debug)]
pub struct Cfg<'a> {
    pub nodes: Vec<Node<'a>>,
    pub entry: Edge,
}

impl<'a> Cfg<'a> {
    pub fn build(body: &'a Stmt) -> Self {
        let mut cfg = Cfg {
            nodes: Vec::new(),
            entry: Edge::Exit,
        };
        cfg.entry = cfg.link(body, Edge::Exit);
        cfg
    }

    // Built back to front: `next` is where control goes after `stmt`.
    fn link(&mut self, stmt: &'a Stmt, next: Edge) -> Edge {
        match &stmt.kind {
            StmtKind::Block(stmts) => stmts
                .iter()
                .rev()
                .fold(next, |next, stmt| self.link(stmt, next)),
            StmtKind::IfElse(_, then, els) => {
                let idx = self.push(stmt);
                let then_entry = self.link(then, next);
                let else_entry = match els {
                    Some(els) => self.link(els, next),
                    None => next,
                };
                self.nodes[idx].succ = vec![then_entry, else_entry];
                Edge::Node(idx)
            }
            StmtKind::While(_, body) => {
                let idx = self.push(stmt);
                let body_entry = self.link(body, Edge::Node(idx));
                self.nodes[idx].succ = vec![body_entry, next];
                Edge::Node(idx)
            }
            StmtKind::Return(_) => {
                let idx = self.push(stmt);
                self.nodes[idx].succ = vec![Edge::Exit];
                Edge::Node(idx)
            }
            StmtKind::VarDecl(..) | StmtKind::Expr(_) => {
                let idx = self.push(stmt);
                self.nodes[idx].succ = vec![next];
                Edge::Node(idx)
            }
        }
    }

    fn push(&mut self, stmt: &'a Stmt) -> usize {
        self.nodes.push(Node {
            stmt,
            succ: Vec::new(),
        });
        self.nodes.len() - 1
    }

    /// Nodes reachable from the entry, in breadth-first order.
    pub fn reachable(&self) -> Vec<usize> {
        let mut seen = BTreeSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();
        if let Edge::Node(idx) = self.entry {
            queue.push_back(idx);
        }
        while let Some(idx) = queue.pop_front() {
            if !seen.insert(idx) {
                continue;
            }
            order.push(idx);
            for edge in &self.nodes[idx].succ {
                if let Edge::Node(next) = edge {
                    queue.push_back(*next);
                }
            }
        }
        order
    }

    /// Position of the first reachable statement that leaves the body
    /// without being a `return`.
    pub fn falls_off(&self, body: &Stmt) -> Option<Pos> {
        if self.entry == Edge::Exit {
            return Some(body.pos);
        }
        self.reachable().into_iter().find_map(|idx| {
            let node = &self.nodes[idx];
            let exits = node.succ.contains(&Edge::Exit);
            let is_return = matches!(node.stmt.kind, StmtKind::Return(_));
            (exits && !is_return).then_some(node.stmt.pos)
        })
    }

    pub fn to_dot(&self, name: &str) -> String {
        let edge = |e: &Edge| match e {
            Edge::Node(idx) => format!("n{}", idx),
            Edge::Exit => "exit".to_string(),
        };

        let mut dot = String::new();
        let _ = writeln!(dot, "digraph \"{}\" {{", name);
        let _ = writeln!(dot, "  entry [shape=point];");
        let _ = writeln!(dot, "  exit [shape=doublecircle];");
        for (idx, node) in self.nodes.iter().enumerate() {
            let _ = writeln!(
                dot,
                "  n{} [shape=box, label=\"{}: {}\"];",
                idx,
                node.stmt.pos,
                label(node.stmt)
            );
        }
        let _ = writeln!(dot, "  entry -> {};", edge(&self.entry));
        for (idx, node) in self.nodes.iter().enumerate() {
            for succ in &node.succ {
                let _ = writeln!(dot, "  n{} -> {};", idx, edge(succ));
            }
        }
        dot.push_str("}\n");
        dot
    }
}

/// First line of the statement, escaped for a DOT string.
fn label(stmt: &Stmt) -> String {
    let text = stmt.to_string();
    text.lines()
        .next()
        .unwrap_or("")
        .trim()
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
}

/// Every reachable exit of `body` must be a `return`.
pub fn check_returns(body: &Stmt) -> Result<(), Pos> {
    match Cfg::build(body).falls_off(body) {
        Some(pos) => Err(pos),
        None => Ok(()),
    }
}
