use color_print::cprintln;

use ede::{compile, eval, grammer::lexer::Lexer, typeck, Diagnostic};
use vm::{hooks::console::Console, Hook, Limits, State, Status};

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Input source file
    #[clap(default_value = "main.ede")]
    input: String,

    /// Output bytecode file
    #[clap(short, long, default_value = "main.ebc")]
    output: String,

    /// Print the syntax tree
    #[clap(long)]
    ast: bool,

    /// Print the control flow graph of every function (DOT)
    #[clap(long)]
    cfg: bool,

    /// Print the intermediate representation
    #[clap(long)]
    ir: bool,

    /// Stop after type checking
    #[clap(short, long)]
    check: bool,

    /// Run the bytecode on the VM
    #[clap(short, long)]
    run: bool,

    /// Interpret the syntax tree directly
    #[clap(short, long)]
    eval: bool,

    /// Step budget for --run
    #[clap(short, long)]
    tmax: Option<u64>,

    /// Print phase logs
    #[clap(short, long)]
    verbose: bool,
}

fn fail(diag: Diagnostic, input: &str, text: &str) -> ! {
    diag.print_diag(input, text);
    std::process::exit(1);
}

fn main() {
    use clap::Parser;

    let args: Args = Args::parse();
    let log = |msg: &str| {
        if args.verbose {
            println!("{}", msg);
        }
    };
    log("Ede Compiler");

    log("1. Read Source");
    log(&format!("  < {}", args.input));
    let text = match std::fs::read_to_string(&args.input) {
        Ok(text) => text,
        Err(e) => {
            cprintln!("<red,bold>error</>: cannot open `{}`: {}", args.input, e);
            std::process::exit(1);
        }
    };

    log("2. Tokenize");
    let tokens = Lexer::new(&text).tokenize().unwrap_or_else(|d| fail(d, &args.input, &text));

    log("3. Parse");
    let name = std::path::Path::new(&args.input)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let module = ede::grammer::parsercore::Parser::new(tokens)
        .parse_module(&name)
        .unwrap_or_else(|d| fail(d, &args.input, &text));
    if args.ast {
        print!("{}", module);
    }

    log("4. Type Check");
    typeck::typecheck(&module).unwrap_or_else(|d| fail(d, &args.input, &text));
    if args.cfg {
        print!("{}", ede::cfg_dot(&module));
    }
    if args.check {
        cprintln!("<g,s>Finished</> {} checks clean", args.input);
        return;
    }

    if args.eval {
        log("*. Evaluate");
        match eval::evaluate(&module) {
            Ok(value) => {
                cprintln!("<g,s>Evaluated</> {}", value);
                std::process::exit(value.exit_code() as i32);
            }
            Err(e) => {
                cprintln!("<red,bold>exception</>: {}:{}", args.input, e);
                std::process::exit(1);
            }
        }
    }

    log("5. Build IR");
    let code = compile::compile(&module);
    if args.ir {
        print!("{}", code);
    }

    log("6. Assemble");
    let binary = match asm::assemble(&code) {
        Ok(binary) => binary,
        Err(e) => panic!("compiler produced unencodable IR: {}", e),
    };
    log(&format!("  > {}", args.output));
    if let Err(e) = std::fs::write(&args.output, &binary.bytes) {
        cprintln!("<red,bold>error</>: cannot write `{}`: {}", args.output, e);
        std::process::exit(1);
    }

    if !args.run {
        cprintln!("<g,s>Finished</> {} bytes", binary.bytes.len());
        return;
    }

    log("7. Run");
    let state = State::new(binary.bytes, Limits::default());
    let mut hooks: Vec<Box<dyn Hook>> = vec![Box::new(Console::new(false))];
    let (state, result) = vm::execute(state, args.tmax, &mut hooks);

    match result {
        Ok(Status::Exited(code)) => {
            log(&format!("Exited with status {}", code));
            std::process::exit(code as i32);
        }
        Ok(Status::Running) => {
            cprintln!("<y,s>Stopped</> after {:?} steps", args.tmax);
            std::process::exit(2);
        }
        Err(e) => {
            cprintln!("<red,bold>exception</>: {} at ip {:04X}", e, state.ip());
            std::process::exit(1);
        }
    }
}
