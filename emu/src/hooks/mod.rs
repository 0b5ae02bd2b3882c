pub mod console;
pub mod dump;

use arch::Inst;

use crate::model::State;

/// Side effect run around the VM main loop.
pub trait Hook {
    fn init(&mut self, state: State) -> State;
    fn exec(&mut self, time: u64, addr: usize, inst: &Inst, state: State) -> State;
    /// Runs once when the loop stops, whether by halt, fault, or budget.
    fn fini(&mut self, state: State) -> State {
        state
    }
}
