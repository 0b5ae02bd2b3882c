use std::io::Write;

use arch::Inst;
use color_print::cprint;

use super::Hook;
use crate::model::State;

/// Flushes the output written by PRINTC/PRINTS after every instruction.
pub struct Console {
    style: bool,
}

impl Console {
    pub fn new(style: bool) -> Console {
        Console { style }
    }

    fn flush(&self, state: &mut State) {
        let text = state.take_output();
        if text.is_empty() {
            return;
        }
        match self.style {
            true => cprint!("<r,s>{}</>", text),
            false => print!("{}", text),
        }
        let _ = std::io::stdout().flush();
    }
}

impl Hook for Console {
    fn init(&mut self, state: State) -> State {
        if self.style {
            println!(" * Console: styled");
        }
        state
    }

    fn exec(&mut self, _time: u64, _addr: usize, _inst: &Inst, mut state: State) -> State {
        self.flush(&mut state);
        state
    }

    fn fini(&mut self, mut state: State) -> State {
        self.flush(&mut state);
        state
    }
}
