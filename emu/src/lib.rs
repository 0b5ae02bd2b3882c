pub mod error;
pub mod heap;
pub mod hooks;
pub mod model;

pub use error::{LoadError, VmError};
pub use hooks::Hook;
pub use model::{Limits, State, Status};

/// Main loop: step the machine and fold every hook over the new state.
/// Stops at the first halt, fault, or after `tmax` instructions, then
/// gives every hook its `fini`.
pub fn execute(
    state: State,
    tmax: Option<u64>,
    hooks: &mut [Box<dyn Hook>],
) -> (State, Result<Status, VmError>) {
    let mut state = hooks.iter_mut().fold(state, |state, hook| hook.init(state));

    for time in 0..tmax.unwrap_or(u64::MAX) {
        if state.is_terminated() {
            break;
        }
        let (addr, inst) = match state.step() {
            Ok(step) => step,
            Err(e) => return (fini(state, hooks), Err(e)),
        };
        state = hooks
            .iter_mut()
            .fold(state, |state, hook| hook.exec(time, addr, &inst, state));
    }

    let state = fini(state, hooks);
    let status = state.status();
    (state, Ok(status))
}

fn fini(state: State, hooks: &mut [Box<dyn Hook>]) -> State {
    hooks.iter_mut().fold(state, |state, hook| hook.fini(state))
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use arch::{Inst, SyscallCode, Word};

    use super::*;

    struct Trace(Rc<RefCell<Vec<String>>>);

    impl Hook for Trace {
        fn init(&mut self, state: State) -> State {
            self.0.borrow_mut().push("init".to_string());
            state
        }

        fn exec(&mut self, time: u64, addr: usize, _inst: &Inst, state: State) -> State {
            self.0.borrow_mut().push(format!("{time}@{addr}"));
            state
        }

        fn fini(&mut self, mut state: State) -> State {
            let out = state.take_output();
            self.0.borrow_mut().push(format!("fini {out:?}"));
            state
        }
    }

    fn program(insts: &[Inst]) -> Vec<u8> {
        let mut bin = vec![];
        for inst in insts {
            inst.encode(&mut bin);
        }
        bin
    }

    fn trace(insts: &[Inst], tmax: Option<u64>) -> (Result<Status, VmError>, Vec<String>) {
        let log = Rc::new(RefCell::new(vec![]));
        let mut hooks: Vec<Box<dyn Hook>> = vec![Box::new(Trace(log.clone()))];
        let state = State::new(program(insts), Limits::default());
        let (_, result) = execute(state, tmax, &mut hooks);
        let log = log.borrow().clone();
        (result, log)
    }

    #[test]
    fn fini_after_halt() {
        // 0: PUSH 'a'  9: PRINTC  11: PUSH 3  20: EXIT
        let (result, log) = trace(
            &[
                Inst::PUSH(Word::from_int('a' as i64)),
                Inst::SYSCALL(SyscallCode::PRINTC),
                Inst::PUSH(Word::from_int(3)),
                Inst::SYSCALL(SyscallCode::EXIT),
            ],
            None,
        );
        assert_eq!(result, Ok(Status::Exited(3)));
        assert_eq!(log, ["init", "0@0", "1@9", "2@11", "3@20", "fini \"a\""]);
    }

    #[test]
    fn fini_after_fault() {
        let (result, log) = trace(&[Inst::PUSH(Word::from_int(1)), Inst::POP, Inst::POP], None);
        assert_eq!(result, Err(VmError::StackUnderflow));
        assert_eq!(log, ["init", "0@0", "1@9", "fini \"\""]);
    }

    #[test]
    fn fini_after_budget() {
        let (result, log) = trace(&[Inst::JUMP(0)], Some(2));
        assert_eq!(result, Ok(Status::Running));
        assert_eq!(log, ["init", "0@0", "1@0", "fini \"\""]);
    }
}
