//! Symbolic intermediate form: a flat list of labels and pseudo-instructions.
//!
//! On the wire the IR is a JSON array whose elements are either a label
//! string or `["OPNAME", operand, ...]`.

use std::fmt;

use arch::{Arg, OpCode, SyscallCode};
use color_print::cformat;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Int(i64),
    Double(f64),
    Label(String),
    Syscall(SyscallCode),
}

impl Operand {
    fn fits(&self, arg: Arg) -> bool {
        match (arg, self) {
            (Arg::Word, Operand::Int(_) | Operand::Double(_)) => true,
            (Arg::Int, Operand::Int(_)) => true,
            (Arg::Double, Operand::Int(_) | Operand::Double(_)) => true,
            (Arg::Slot | Arg::Count | Arg::Offset, Operand::Int(v)) => *v >= 0,
            (Arg::Label, Operand::Label(_)) => true,
            (Arg::Syscall, Operand::Syscall(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Int(v) => write!(f, "{}", v),
            Operand::Double(v) => write!(f, "{:?}", v),
            Operand::Label(l) => write!(f, "{}", l),
            Operand::Syscall(s) => write!(f, "{}", s),
        }
    }
}

/// A pseudo-instruction. The operand list always matches `op.arg_field()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Inst {
    op: OpCode,
    args: Vec<Operand>,
}

impl Inst {
    pub fn new(op: OpCode, args: Vec<Operand>) -> Result<Self, Error> {
        let sig = op.arg_field();
        if sig.len() != args.len() || !args.iter().zip(&sig).all(|(a, s)| a.fits(*s)) {
            return Err(Error::SignatureMismatch(op, sig));
        }
        Ok(Inst { op, args })
    }

    pub fn op(&self) -> OpCode {
        self.op
    }

    pub fn args(&self) -> &[Operand] {
        &self.args
    }

    pub fn size(&self) -> usize {
        self.op.size()
    }

    fn raw(op: OpCode, args: Vec<Operand>) -> Self {
        Inst { op, args }
    }

    /// Instruction without operands. Panics on an opcode that takes some.
    pub fn nullary(op: OpCode) -> Self {
        assert!(op.arg_field().is_empty(), "`{op}` takes operands");
        Inst::raw(op, vec![])
    }

    pub fn pushi(v: i64) -> Self {
        Inst::raw(OpCode::PUSHI, vec![Operand::Int(v)])
    }

    pub fn pushd(v: f64) -> Self {
        Inst::raw(OpCode::PUSHD, vec![Operand::Double(v)])
    }

    pub fn sload(slot: usize) -> Self {
        Inst::raw(OpCode::SLOAD, vec![Operand::Int(slot as i64)])
    }

    pub fn sstore(slot: usize) -> Self {
        Inst::raw(OpCode::SSTORE, vec![Operand::Int(slot as i64)])
    }

    pub fn pack(count: usize) -> Self {
        Inst::raw(OpCode::PACK, vec![Operand::Int(count as i64)])
    }

    pub fn jumpl(label: &str) -> Self {
        Inst::raw(OpCode::JUMPL, vec![Operand::Label(label.to_string())])
    }

    pub fn jumpzl(label: &str) -> Self {
        Inst::raw(OpCode::JUMPZL, vec![Operand::Label(label.to_string())])
    }

    pub fn jumpnzl(label: &str) -> Self {
        Inst::raw(OpCode::JUMPNZL, vec![Operand::Label(label.to_string())])
    }

    pub fn calll(label: &str, argc: usize) -> Self {
        Inst::raw(
            OpCode::CALLL,
            vec![Operand::Label(label.to_string()), Operand::Int(argc as i64)],
        )
    }

    pub fn syscall(code: SyscallCode) -> Self {
        Inst::raw(OpCode::SYSCALL, vec![Operand::Syscall(code)])
    }

    pub fn cformat(&self) -> String {
        let args = self
            .args
            .iter()
            .map(|a| match a {
                Operand::Label(l) => cformat!("<g>{}</>", l),
                a => cformat!("<y>{}</>", a),
            })
            .collect::<Vec<_>>()
            .join(" ");
        cformat!("<r>{:<8}</>{}", self.op.to_string().to_lowercase(), args)
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op)?;
        for a in &self.args {
            write!(f, " {}", a)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawElement", into = "RawElement")]
pub enum Element {
    Label(String),
    Inst(Inst),
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Label(l) => write!(f, "{}:", l),
            Element::Inst(i) => write!(f, "    {}", i),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawOperand {
    Int(i64),
    Double(f64),
    Str(String),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawElement {
    Label(String),
    Inst(Vec<RawOperand>),
}

impl TryFrom<RawElement> for Element {
    type Error = String;
    fn try_from(raw: RawElement) -> Result<Self, String> {
        let parts = match raw {
            RawElement::Label(l) => return Ok(Element::Label(l)),
            RawElement::Inst(parts) => parts,
        };
        let mut parts = parts.into_iter();
        let op = match parts.next() {
            Some(RawOperand::Str(name)) => OpCode::parse(&name)
                .map_err(|_| Error::UnknownOperation(name).to_string())?,
            _ => {
                return Err(Error::Malformed("instruction must start with an opcode name".to_string())
                    .to_string())
            }
        };
        let rest: Vec<RawOperand> = parts.collect();
        let sig = op.arg_field();
        if rest.len() != sig.len() {
            return Err(Error::SignatureMismatch(op, sig).to_string());
        }
        let args = rest
            .into_iter()
            .zip(sig)
            .map(|(part, arg)| match (part, arg) {
                (RawOperand::Int(v), _) => Ok(Operand::Int(v)),
                (RawOperand::Double(v), _) => Ok(Operand::Double(v)),
                (RawOperand::Str(s), Arg::Syscall) => SyscallCode::parse(&s).map(Operand::Syscall),
                (RawOperand::Str(s), _) => Ok(Operand::Label(s)),
            })
            .collect::<Result<Vec<_>, String>>()?;
        Inst::new(op, args)
            .map(Element::Inst)
            .map_err(|e| e.to_string())
    }
}

impl From<Element> for RawElement {
    fn from(e: Element) -> Self {
        match e {
            Element::Label(l) => RawElement::Label(l),
            Element::Inst(inst) => {
                let mut parts = vec![RawOperand::Str(inst.op.to_string())];
                parts.extend(inst.args.into_iter().map(|a| match a {
                    Operand::Int(v) => RawOperand::Int(v),
                    Operand::Double(v) => RawOperand::Double(v),
                    Operand::Label(l) => RawOperand::Str(l),
                    Operand::Syscall(s) => RawOperand::Str(s.to_string()),
                }));
                RawElement::Inst(parts)
            }
        }
    }
}

/// A whole IR program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code(pub Vec<Element>);

impl Code {
    pub fn new() -> Self {
        Code(vec![])
    }

    pub fn label(&mut self, name: &str) {
        self.0.push(Element::Label(name.to_string()));
    }

    pub fn inst(&mut self, inst: Inst) {
        self.0.push(Element::Inst(inst));
    }

    pub fn elements(&self) -> &[Element] {
        &self.0
    }

    pub fn from_json(text: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.0 {
            writeln!(f, "{}", e)?;
        }
        Ok(())
    }
}
