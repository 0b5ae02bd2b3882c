use arch::{OpCode, Word};

use crate::{
    error::Error,
    ir::{Code, Element, Inst, Operand},
    label::Labels,
};

/// Encoded program together with the label table used to build it.
#[derive(Debug, Clone, PartialEq)]
pub struct Binary {
    pub bytes: Vec<u8>,
    pub labels: Labels,
}

/// 1st pass: every label gets the byte offset of the next instruction.
pub fn layout(code: &Code) -> Result<Labels, Error> {
    let mut labels = Labels::new();
    let mut offset = 0;
    for element in code.elements() {
        match element {
            Element::Label(name) => labels.insert(name, offset)?,
            Element::Inst(inst) => offset += inst.size(),
        }
    }
    Ok(labels)
}

/// 2nd pass for a single instruction: rewrite placeholders into concrete form.
pub fn resolve(inst: &Inst, labels: &Labels) -> Result<arch::Inst, Error> {
    let op = inst.op();
    let mismatch = || Error::SignatureMismatch(op, op.arg_field());
    let args = inst.args();

    let word = |i: usize| -> Result<Word, Error> {
        match args.get(i) {
            Some(Operand::Int(v)) => Ok(Word::from_int(*v)),
            Some(Operand::Double(v)) => Ok(Word::from_double(*v)),
            Some(Operand::Label(l)) => Ok(Word::from_int(labels.get(l)? as i64)),
            _ => Err(mismatch()),
        }
    };
    let uint = |i: usize| word(i).map(|w| w.as_uint());

    let resolved = match op {
        OpCode::NOOP => arch::Inst::NOOP,
        OpCode::PUSH | OpCode::PUSHI => arch::Inst::PUSH(word(0)?),
        OpCode::PUSHD => match args.first() {
            Some(Operand::Int(v)) => arch::Inst::PUSH(Word::from_double(*v as f64)),
            _ => arch::Inst::PUSH(word(0)?),
        },
        OpCode::POP => arch::Inst::POP,
        OpCode::IADD => arch::Inst::IADD,
        OpCode::ISUB => arch::Inst::ISUB,
        OpCode::IMUL => arch::Inst::IMUL,
        OpCode::IDIV => arch::Inst::IDIV,
        OpCode::DADD => arch::Inst::DADD,
        OpCode::DSUB => arch::Inst::DSUB,
        OpCode::DMUL => arch::Inst::DMUL,
        OpCode::DDIV => arch::Inst::DDIV,
        OpCode::SLOAD => arch::Inst::SLOAD(uint(0)?),
        OpCode::SSTORE => arch::Inst::SSTORE(uint(0)?),
        OpCode::EQ => arch::Inst::EQ,
        OpCode::NEQ => arch::Inst::NEQ,
        OpCode::JUMP | OpCode::JUMPL => arch::Inst::JUMP(uint(0)?),
        OpCode::JUMPZ | OpCode::JUMPZL => arch::Inst::JUMPZ(uint(0)?),
        OpCode::JUMPNZ | OpCode::JUMPNZL => arch::Inst::JUMPNZ(uint(0)?),
        OpCode::SYSCALL => match args.first() {
            Some(Operand::Syscall(code)) => arch::Inst::SYSCALL(*code),
            _ => return Err(mismatch()),
        },
        OpCode::SWAP => arch::Inst::SWAP,
        OpCode::CALL | OpCode::CALLL => arch::Inst::CALL(uint(0)?, uint(1)?),
        OpCode::RET => arch::Inst::RET,
        OpCode::PACK => arch::Inst::PACK(uint(0)?),
        OpCode::SCAT => arch::Inst::SCAT,
        OpCode::HLOAD => arch::Inst::HLOAD,
        OpCode::HSTORE => arch::Inst::HSTORE,
    };
    Ok(resolved)
}

pub fn assemble(code: &Code) -> Result<Binary, Error> {
    assemble_located(code).map_err(|(_, e)| e)
}

/// Like [`assemble`], but also reports the index of the element that failed.
pub fn assemble_located(code: &Code) -> Result<Binary, (Option<usize>, Error)> {
    let labels = layout(code).map_err(|e| (None, e))?;
    let mut bytes = vec![];
    for (idx, element) in code.elements().iter().enumerate() {
        if let Element::Inst(inst) = element {
            resolve(inst, &labels)
                .map_err(|e| (Some(idx), e))?
                .encode(&mut bytes);
        }
    }
    Ok(Binary { bytes, labels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch::SyscallCode;

    fn sample() -> Code {
        let mut code = Code::new();
        code.label("__start");
        code.inst(Inst::jumpl("__main"));
        code.label("func.f");
        code.inst(Inst::pushi(1));
        code.inst(Inst::nullary(OpCode::RET));
        code.label("__main");
        code.inst(Inst::calll("func.f", 0));
        code.inst(Inst::syscall(SyscallCode::EXIT));
        code
    }

    #[test]
    fn label_offsets() {
        let labels = layout(&sample()).unwrap();
        assert_eq!(labels.get("__start").unwrap(), 0);
        assert_eq!(labels.get("func.f").unwrap(), 9);
        assert_eq!(labels.get("__main").unwrap(), 9 + 9 + 1);
    }

    #[test]
    fn jumps_carry_label_offsets() {
        let bin = assemble(&sample()).unwrap();
        let insts = arch::Inst::decode_all(&bin.bytes).unwrap();
        assert_eq!(insts[0], (0, arch::Inst::JUMP(19)));
        assert_eq!(insts[3], (19, arch::Inst::CALL(9, 0)));
        for (name, offset) in bin.labels.iter() {
            assert!(insts.iter().any(|(at, _)| *at == offset), "{name}");
        }
    }

    #[test]
    fn undefined_label() {
        let mut code = Code::new();
        code.inst(Inst::jumpl("nowhere"));
        assert!(matches!(assemble(&code), Err(Error::UndefinedLabel(l)) if l == "nowhere"));
    }

    #[test]
    fn redefined_label() {
        let mut code = Code::new();
        code.label("a");
        code.label("a");
        assert!(matches!(layout(&code), Err(Error::RedefinedLabel(_))));
    }
}
