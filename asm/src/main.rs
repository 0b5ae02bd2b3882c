use asm::{encode, util, Code, Error};
use color_print::cprintln;

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Input IR file (JSON)
    #[clap(default_value = "main.ir.json")]
    input: String,

    /// Output file
    #[clap(short, long, default_value = "main.ebc")]
    output: String,

    /// Dump assembly listing
    #[clap(short, long)]
    dump: bool,
}

fn main() {
    use clap::Parser;

    let args: Args = Args::parse();
    println!("Ede Assembler");

    println!("1. Read IR");
    println!("  < {}", args.input);
    let code = match std::fs::read_to_string(&args.input)
        .map_err(|e| Error::FileOpen(args.input.clone(), e))
        .and_then(|text| Code::from_json(&text))
    {
        Ok(code) => code,
        Err(e) => {
            e.print_diag(&args.input, None);
            std::process::exit(1);
        }
    };

    println!("2. Resolve Label & Generate Binary");
    let binary = match encode::assemble_located(&code) {
        Ok(binary) => binary,
        Err((idx, e)) => {
            e.print_diag(&args.input, idx);
            std::process::exit(1);
        }
    };

    println!("  > {}", &args.output);
    if let Err(e) = std::fs::write(&args.output, &binary.bytes) {
        Error::FileWrite(args.output.clone(), e).print_diag(&args.output, None);
        std::process::exit(1);
    }

    if args.dump {
        util::print_dump(&code, &binary);
    }
    cprintln!(
        "<g,s>Finished</> {} bytes, {} labels",
        binary.bytes.len(),
        binary.labels.len()
    );
}
