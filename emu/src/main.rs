use clap::Parser;
use color_print::cprintln;

use vm::{
    hooks::{console::Console, dump::Dump},
    Hook, Limits, State, Status,
};

#[derive(Parser, Debug)]
#[clap(name = "edevm", version, about = "Stack virtual machine for Ede bytecode")]
struct Args {
    #[arg(short = 't', long)]
    tmax: Option<u64>,

    #[arg(short, long)]
    dump_cfg: Option<String>,

    #[arg(short = 'a', long)]
    dump_all: bool,

    /// Highlight program output
    #[arg(short, long)]
    style: bool,

    /// Operand stack limit in words
    #[arg(long)]
    stack: Option<usize>,

    #[arg(default_value = "main.ebc")]
    input_file: String,
}

fn main() {
    let args = Args::parse();
    println!("Ede VM");

    println!("+-----------------------------------------------+");
    println!("| {:<45} |", args.input_file);
    println!("+-----------------------------------------------+");

    // ------------------------------------------------------------------------
    // Initialize state machine model
    let limits = Limits {
        stack: args.stack.unwrap_or(Limits::default().stack),
        ..Limits::default()
    };
    let state = match State::load_file(&args.input_file, limits) {
        Ok(state) => state,
        Err(e) => {
            cprintln!("<red,bold>error</>: {}", e);
            std::process::exit(1);
        }
    };

    // ------------------------------------------------------------------------
    // Initialize hooks
    println!("[INIT]");
    let dump = match Dump::arg(args.dump_cfg, args.dump_all) {
        Ok(dump) => dump,
        Err(e) => {
            cprintln!("<red,bold>error</>: {}", e);
            std::process::exit(1);
        }
    };
    let mut hooks: Vec<Box<dyn Hook>> = vec![Box::new(dump), Box::new(Console::new(args.style))];

    // ------------------------------------------------------------------------
    // Main loop
    let (state, result) = vm::execute(state, args.tmax, &mut hooks);

    // Exit
    println!();
    println!("=================================================");
    match result {
        Ok(Status::Exited(code)) => {
            cprintln!("<g,s>Exited</> with status {}", code);
            std::process::exit(code as i32);
        }
        Ok(Status::Running) => cprintln!("<y,s>Stopped</> after {:?} steps", args.tmax),
        Err(e) if e.is_exception() => {
            cprintln!("<red,bold>exception</>: {} at ip {:04X}", e, state.ip());
            std::process::exit(1);
        }
        Err(e) => {
            cprintln!("<red,bold>error</>: {} at ip {:04X}", e, state.ip());
            std::process::exit(2);
        }
    }
}
