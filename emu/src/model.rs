use arch::{Inst, SyscallCode, Word};

use crate::{
    error::{LoadError, VmError},
    heap::Heap,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum operand stack depth in words.
    pub stack: usize,
    /// Maximum call depth.
    pub frames: usize,
    /// Maximum live heap size in words.
    pub heap: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            stack: 1 << 16,
            frames: 1 << 12,
            heap: 1 << 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub ret: usize,
    pub fp: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The step budget ran out before the program halted.
    Running,
    Exited(i64),
}

#[derive(Debug, Clone)]
pub struct State {
    program: Vec<u8>,
    ip: usize,
    fp: usize,
    stack: Vec<Word>,
    frames: Vec<Frame>,
    heap: Heap,
    tx: String,
    exit: Option<i64>,
    limits: Limits,
}

impl State {
    pub fn new(program: Vec<u8>, limits: Limits) -> Self {
        let mut state = State {
            program,
            ip: 0,
            fp: 0,
            stack: vec![],
            frames: vec![],
            heap: Heap::new(limits.heap),
            tx: String::new(),
            exit: None,
            limits,
        };
        state.settle();
        state
    }

    pub fn load_file(path: &str, limits: Limits) -> Result<Self, LoadError> {
        let program =
            std::fs::read(path).map_err(|e| LoadError::FileOpen(path.to_string(), e))?;
        Ok(State::new(program, limits))
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn fp(&self) -> usize {
        self.fp
    }

    pub fn stack(&self) -> &[Word] {
        &self.stack
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn program(&self) -> &[u8] {
        &self.program
    }

    /// Output written by PRINTC/PRINTS and not yet taken.
    pub fn output(&self) -> &str {
        &self.tx
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.tx)
    }

    pub fn is_terminated(&self) -> bool {
        self.exit.is_some()
    }

    pub fn status(&self) -> Status {
        match self.exit {
            Some(code) => Status::Exited(code),
            None => Status::Running,
        }
    }

    /// Landing exactly on the end of the program is a normal halt.
    fn settle(&mut self) {
        if self.exit.is_none() && self.ip == self.program.len() {
            self.exit = Some(0);
        }
    }

    /// Execute one instruction and return it with the offset it was fetched from.
    pub fn step(&mut self) -> Result<(usize, Inst), VmError> {
        let at = self.ip;
        let inst = Inst::decode(&self.program, at)?;
        self.ip = at + inst.size();
        self.exec(inst)?;
        self.settle();
        Ok((at, inst))
    }

    /// Run for at most `tmax` instructions.
    pub fn run(&mut self, tmax: u64) -> Result<Status, VmError> {
        for _ in 0..tmax {
            if self.is_terminated() {
                break;
            }
            self.step()?;
        }
        Ok(self.status())
    }
}

// ----------------------------------------------------------------------------
// Stack primitives

impl State {
    fn push(&mut self, w: Word) -> Result<(), VmError> {
        if self.stack.len() >= self.limits.stack {
            return Err(VmError::StackOverflow(self.limits.stack));
        }
        self.stack.push(w);
        Ok(())
    }

    fn pop(&mut self) -> Result<Word, VmError> {
        self.stack.pop().ok_or(VmError::StackUnderflow)
    }

    fn pop_int(&mut self) -> Result<i64, VmError> {
        self.pop().map(|w| w.as_int())
    }

    fn slot(&self, k: u64) -> Result<usize, VmError> {
        usize::try_from(k)
            .ok()
            .and_then(|k| self.fp.checked_add(k))
            .filter(|&i| i < self.stack.len())
            .ok_or(VmError::SlotOutOfBounds(k))
    }

    fn int_binop(&mut self, f: impl Fn(i64, i64) -> Result<i64, VmError>) -> Result<(), VmError> {
        let r = self.pop_int()?;
        let l = self.pop_int()?;
        self.push(Word::from_int(f(l, r)?))
    }

    fn double_binop(
        &mut self,
        f: impl Fn(f64, f64) -> Result<f64, VmError>,
    ) -> Result<(), VmError> {
        let r = self.pop()?.as_double();
        let l = self.pop()?.as_double();
        self.push(Word::from_double(f(l, r)?))
    }
}

// ----------------------------------------------------------------------------
// Execution

impl State {
    fn exec(&mut self, inst: Inst) -> Result<(), VmError> {
        match inst {
            Inst::NOOP => {}
            Inst::PUSH(w) => self.push(w)?,
            Inst::POP => {
                self.pop()?;
            }

            Inst::IADD => self.int_binop(|l, r| Ok(l.wrapping_add(r)))?,
            Inst::ISUB => self.int_binop(|l, r| Ok(l.wrapping_sub(r)))?,
            Inst::IMUL => self.int_binop(|l, r| Ok(l.wrapping_mul(r)))?,
            Inst::IDIV => self.int_binop(|l, r| match r {
                0 => Err(VmError::DivisionByZero),
                r => Ok(l.wrapping_div(r)),
            })?,
            Inst::DADD => self.double_binop(|l, r| Ok(l + r))?,
            Inst::DSUB => self.double_binop(|l, r| Ok(l - r))?,
            Inst::DMUL => self.double_binop(|l, r| Ok(l * r))?,
            Inst::DDIV => self.double_binop(|l, r| match r == 0.0 {
                true => Err(VmError::DivisionByZero),
                false => Ok(l / r),
            })?,

            Inst::SLOAD(k) => {
                let i = self.slot(k)?;
                self.push(self.stack[i])?;
            }
            Inst::SSTORE(k) => {
                let v = self.pop()?;
                let i = self.slot(k)?;
                self.stack[i] = v;
            }

            Inst::EQ => {
                let r = self.pop()?;
                let l = self.pop()?;
                self.push(Word::from_bool(l == r))?;
            }
            Inst::NEQ => {
                let r = self.pop()?;
                let l = self.pop()?;
                self.push(Word::from_bool(l != r))?;
            }

            Inst::JUMP(addr) => self.ip = addr as usize,
            Inst::JUMPZ(addr) => {
                if !self.pop()?.as_bool() {
                    self.ip = addr as usize;
                }
            }
            Inst::JUMPNZ(addr) => {
                if self.pop()?.as_bool() {
                    self.ip = addr as usize;
                }
            }
            Inst::SYSCALL(code) => self.syscall(code)?,
            Inst::SWAP => {
                let r = self.pop()?;
                let l = self.pop()?;
                self.push(r)?;
                self.push(l)?;
            }
            Inst::CALL(addr, count) => {
                if self.frames.len() >= self.limits.frames {
                    return Err(VmError::StackOverflow(self.limits.frames));
                }
                let count = count as usize;
                if count > self.stack.len() - self.fp.min(self.stack.len()) {
                    return Err(VmError::StackUnderflow);
                }
                self.frames.push(Frame {
                    ret: self.ip,
                    fp: self.fp,
                });
                self.fp = self.stack.len() - count;
                self.ip = addr as usize;
            }
            Inst::RET => {
                let v = self.pop()?;
                let frame = self.frames.pop().ok_or(VmError::ReturnWithoutCall)?;
                self.stack.truncate(self.fp);
                self.fp = frame.fp;
                self.ip = frame.ret;
                self.push(v)?;
            }

            Inst::PACK(count) => {
                let count = count as usize;
                if count > self.stack.len() {
                    return Err(VmError::StackUnderflow);
                }
                let block = self.stack.split_off(self.stack.len() - count);
                let handle = self.heap.alloc(block)?;
                self.push(Word::from_int(handle))?;
            }
            Inst::SCAT => {
                let r = self.pop_int()?;
                let l = self.pop_int()?;
                let mut block = self.heap.get(l)?.to_vec();
                block.extend_from_slice(self.heap.get(r)?);
                let handle = self.heap.alloc(block)?;
                self.push(Word::from_int(handle))?;
            }
            Inst::HLOAD => {
                let index = self.pop_int()?;
                let handle = self.pop_int()?;
                let w = self.heap.load(handle, index)?;
                self.push(w)?;
            }
            Inst::HSTORE => {
                let value = self.pop()?;
                let index = self.pop_int()?;
                let handle = self.pop_int()?;
                self.heap.store(handle, index, value)?;
            }
        }
        Ok(())
    }

    fn syscall(&mut self, code: SyscallCode) -> Result<(), VmError> {
        match code {
            SyscallCode::EXIT => self.exit = Some(self.pop_int()?),
            SyscallCode::PRINTC => {
                let c = self.pop_int()?;
                self.tx.push(to_char(c));
            }
            SyscallCode::PRINTS => {
                let handle = self.pop_int()?;
                let text: String = self
                    .heap
                    .get(handle)?
                    .iter()
                    .map(|w| to_char(w.as_int()))
                    .collect();
                self.tx.push_str(&text);
            }
            SyscallCode::MALLOC => {
                let count = usize::try_from(self.pop_int()?.max(0))
                    .map_err(|_| VmError::HeapExhausted(self.limits.heap))?;
                let handle = self.heap.alloc_zeroed(count)?;
                self.push(Word::from_int(handle))?;
            }
            SyscallCode::FREE => {
                let handle = self.pop_int()?;
                self.heap.free(handle)?;
            }
        }
        Ok(())
    }
}

fn to_char(c: i64) -> char {
    u32::try_from(c)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch::DecodeError;

    fn program(insts: &[Inst]) -> Vec<u8> {
        let mut bin = vec![];
        for inst in insts {
            inst.encode(&mut bin);
        }
        bin
    }

    fn run(insts: &[Inst]) -> (State, Result<Status, VmError>) {
        let mut state = State::new(program(insts), Limits::default());
        let res = state.run(10_000);
        (state, res)
    }

    fn int(v: i64) -> Inst {
        Inst::PUSH(Word::from_int(v))
    }

    #[test]
    fn add_and_exit() {
        let (_, res) = run(&[int(5), int(7), Inst::IADD, Inst::SYSCALL(SyscallCode::EXIT)]);
        assert_eq!(res, Ok(Status::Exited(12)));
    }

    #[test]
    fn right_operand_on_top() {
        let (_, res) = run(&[int(7), int(2), Inst::ISUB, Inst::SYSCALL(SyscallCode::EXIT)]);
        assert_eq!(res, Ok(Status::Exited(5)));
        let (_, res) = run(&[int(2), int(7), Inst::SWAP, Inst::IDIV, Inst::SYSCALL(SyscallCode::EXIT)]);
        assert_eq!(res, Ok(Status::Exited(3)));
    }

    #[test]
    fn division_by_zero() {
        let (_, res) = run(&[int(5), int(0), Inst::IDIV]);
        assert_eq!(res, Err(VmError::DivisionByZero));
        assert!(VmError::DivisionByZero.is_exception());

        let (_, res) = run(&[
            Inst::PUSH(Word::from_double(1.0)),
            Inst::PUSH(Word::from_double(0.0)),
            Inst::DDIV,
        ]);
        assert_eq!(res, Err(VmError::DivisionByZero));
    }

    #[test]
    fn double_arithmetic() {
        let mut state = State::new(
            program(&[
                Inst::PUSH(Word::from_double(1.5)),
                Inst::PUSH(Word::from_double(2.0)),
                Inst::DMUL,
            ]),
            Limits::default(),
        );
        assert_eq!(state.run(100), Ok(Status::Exited(0)));
        assert_eq!(state.stack()[0].as_double(), 3.0);
    }

    #[test]
    fn end_of_program_halts() {
        let (state, res) = run(&[int(1), Inst::POP]);
        assert_eq!(res, Ok(Status::Exited(0)));
        assert!(state.stack().is_empty());
        assert_eq!(State::new(vec![], Limits::default()).status(), Status::Exited(0));
    }

    #[test]
    fn budget_exhausted() {
        // 0: JUMP 0
        let mut state = State::new(program(&[Inst::JUMP(0)]), Limits::default());
        assert_eq!(state.run(50), Ok(Status::Running));
        assert_eq!(state.ip(), 0);
    }

    #[test]
    fn conditional_jump() {
        // 0: PUSH 0  9: JUMPZ 28  18: PUSH 1  27: NOOP  28: PUSH 2  37: EXIT
        let (_, res) = run(&[
            int(0),
            Inst::JUMPZ(28),
            int(1),
            Inst::NOOP,
            int(2),
            Inst::SYSCALL(SyscallCode::EXIT),
        ]);
        assert_eq!(res, Ok(Status::Exited(2)));
    }

    #[test]
    fn call_and_return() {
        // 0: PUSH 20  9: PUSH 22  18: CALL 37 2  35: EXIT
        // 37: SLOAD 0  46: SLOAD 1  55: IADD  56: RET
        let (state, res) = run(&[
            int(20),
            int(22),
            Inst::CALL(37, 2),
            Inst::SYSCALL(SyscallCode::EXIT),
            Inst::SLOAD(0),
            Inst::SLOAD(1),
            Inst::IADD,
            Inst::RET,
        ]);
        assert_eq!(res, Ok(Status::Exited(42)));
        assert!(state.frames().is_empty());
        assert_eq!(state.fp(), 0);
    }

    #[test]
    fn slots() {
        let (_, res) = run(&[
            int(1),
            int(9),
            Inst::SSTORE(0),
            Inst::SLOAD(0),
            Inst::SYSCALL(SyscallCode::EXIT),
        ]);
        assert_eq!(res, Ok(Status::Exited(9)));
        let (_, res) = run(&[Inst::SLOAD(3)]);
        assert_eq!(res, Err(VmError::SlotOutOfBounds(3)));
    }

    #[test]
    fn heap_blocks() {
        let (state, res) = run(&[
            int('h' as i64),
            int('i' as i64),
            Inst::PACK(2),
            int('!' as i64),
            Inst::PACK(1),
            Inst::SCAT,
            Inst::SYSCALL(SyscallCode::PRINTS),
            int('\n' as i64),
            Inst::SYSCALL(SyscallCode::PRINTC),
        ]);
        assert_eq!(res, Ok(Status::Exited(0)));
        assert_eq!(state.output(), "hi!\n");

        let (_, res) = run(&[
            int(3),
            Inst::SYSCALL(SyscallCode::MALLOC),
            int(2),
            int(5),
            Inst::HSTORE,
            int(1),
            int(2),
            Inst::HLOAD,
            Inst::SYSCALL(SyscallCode::EXIT),
        ]);
        assert_eq!(res, Ok(Status::Exited(5)));
    }

    #[test]
    fn faults() {
        assert_eq!(run(&[Inst::POP]).1, Err(VmError::StackUnderflow));
        assert_eq!(run(&[Inst::RET]).1, Err(VmError::StackUnderflow));
        assert_eq!(run(&[int(0), Inst::RET]).1, Err(VmError::ReturnWithoutCall));
        assert_eq!(
            run(&[int(7), Inst::HLOAD]).1,
            Err(VmError::StackUnderflow)
        );
        assert_eq!(
            run(&[Inst::JUMP(100)]).1,
            Err(VmError::Decode(DecodeError::IpOutOfBounds(100)))
        );

        let mut state = State::new(program(&[int(1), int(2)]), Limits { stack: 1, ..Limits::default() });
        assert_eq!(state.run(10), Err(VmError::StackOverflow(1)));
    }

    #[test]
    fn hostile_handles_and_sizes() {
        assert_eq!(
            run(&[int(i64::MIN), Inst::SYSCALL(SyscallCode::PRINTS)]).1,
            Err(VmError::InvalidHandle(i64::MIN))
        );
        assert_eq!(
            run(&[int(i64::MIN), Inst::SYSCALL(SyscallCode::FREE)]).1,
            Err(VmError::InvalidHandle(i64::MIN))
        );
        assert_eq!(
            run(&[int(i64::MIN), int(0), Inst::HLOAD]).1,
            Err(VmError::InvalidHandle(i64::MIN))
        );
        assert_eq!(
            run(&[int(i64::MAX), Inst::SYSCALL(SyscallCode::MALLOC)]).1,
            Err(VmError::HeapExhausted(Limits::default().heap))
        );

        // 0: PUSH 4  9: MALLOC  11: PUSH 1  20: MALLOC
        let limits = Limits { heap: 4, ..Limits::default() };
        let mut state = State::new(
            program(&[
                int(4),
                Inst::SYSCALL(SyscallCode::MALLOC),
                int(1),
                Inst::SYSCALL(SyscallCode::MALLOC),
            ]),
            limits,
        );
        assert_eq!(state.run(10), Err(VmError::HeapExhausted(4)));
        assert_eq!(state.heap().used(), 4);
    }
}
