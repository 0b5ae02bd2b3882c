use arch::{Inst, Word};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;

use crate::{error::LoadError, model::State};

use super::Hook;

#[derive(Debug)]
pub struct Dump {
    file: Option<String>,
    all: bool,
    list: List,
}

/// Byte offset to what to print when the instruction there has executed.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct List(HashMap<usize, Config>);

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    stack: bool,
    #[serde(default)]
    heap: Vec<i64>,
}

impl Dump {
    pub fn arg(file: Option<String>, all: bool) -> Result<Self, LoadError> {
        let list = match &file {
            Some(fname) => {
                let f = File::open(fname).map_err(|e| LoadError::FileOpen(fname.clone(), e))?;
                serde_yaml::from_reader(BufReader::new(f))
                    .map_err(|e| LoadError::DumpConfig(fname.clone(), e))?
            }
            None => List::default(),
        };
        Ok(Self { file, all, list })
    }

    fn get(&self, addr: usize) -> Option<&Config> {
        self.list.0.get(&addr)
    }
}

impl Hook for Dump {
    fn init(&mut self, state: State) -> State {
        if self.all {
            println!(" * Dump all");
        }
        if let Some(fname) = &self.file {
            println!(" * Dump[{}] {:?}", self.list.0.len(), fname);
        }
        state
    }

    fn exec(&mut self, time: u64, addr: usize, inst: &Inst, state: State) -> State {
        if let Some(cfg) = self.get(addr) {
            self.print_reg(time, addr, inst, &state);
            if cfg.stack {
                self.print_stack(&state);
            }
            self.print_heap(&state, &cfg.heap);
        } else if self.all {
            self.print_reg(time, addr, inst, &state);
            self.print_stack(&state);
        }
        state
    }
}

impl Dump {
    fn print_reg(&self, time: u64, addr: usize, inst: &Inst, state: &State) {
        println!(" +----------------------------------------------+");
        println!(" | #{:<8} [{:04X}] {}", time, addr, inst.cformat());
        println!(
            " | ip: {:04X} | fp: {:04X} | sp: {:04X} | frames: {:<3}",
            state.ip(),
            state.fp(),
            state.stack().len(),
            state.frames().len()
        );
        println!(" +----------------------------------------------+");
    }

    fn print_stack(&self, state: &State) {
        for (i, w) in state.stack().iter().enumerate().rev() {
            let mark = if i == state.fp() { "<- fp" } else { "" };
            println!(" | {:04X} : {:X} {:>20} {}", i, w, w.as_int(), mark);
        }
        println!(" +----------------------------------------------+");
    }

    fn print_heap(&self, state: &State, handles: &[i64]) {
        for &h in handles {
            match state.heap().get(h) {
                Ok(block) => println!(" | #{:<4}: {}", h, words(block)),
                Err(e) => println!(" | #{:<4}: {}", h, e),
            }
        }
        println!(" +----------------------------------------------+");
    }
}

fn words(block: &[Word]) -> String {
    block
        .iter()
        .map(|w| w.as_int().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let list: List = serde_yaml::from_str("0:\n  stack: true\n9:\n  heap: [1, 2]\n").unwrap();
        assert!(list.0[&0].stack);
        assert_eq!(list.0[&9].heap, vec![1, 2]);
        assert!(!list.0[&9].stack);
    }
}
