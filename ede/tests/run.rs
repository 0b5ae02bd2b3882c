use arch::SyscallCode;
use asm::{Code, Inst};
use ede::eval::{evaluate, Exception};
use ede::grammer::token::Pos;
use ede::{build, compile::compile, frontend};
use vm::{Limits, State, Status, VmError};

const TMAX: u64 = 100_000;

fn vm(bytes: Vec<u8>) -> (Result<Status, VmError>, String) {
    let mut state = State::new(bytes, Limits::default());
    let result = state.run(TMAX);
    (result, state.output().to_string())
}

/// Compile and run `code`, checking the exit status against the
/// tree-walking evaluator as well as `expect`.
fn case(code: &str, expect: i64) {
    println!("{code}");
    let module = frontend(code, "test").unwrap();
    print!("{}", compile(&module));

    let (result, _) = vm(build(code, "test").unwrap());
    let oracle = evaluate(&module).unwrap();
    println!("vm: {:?}, eval: {}", result, oracle);

    assert_eq!(result.unwrap(), Status::Exited(expect));
    assert_eq!(oracle.exit_code(), expect);
}

macro_rules! case {
    ($name:ident, $code:expr, $expect:expr) => {
        #[test]
        fn $name() {
            case($code, $expect);
        }
    };
}

// ---- Expressions ----
case!(sum_of_locals, "let a = 10; let b = 20; a + b;", 30);
case!(precedence, "3 + 7 * 2;", 17);
case!(left_assoc, "10 - 3 - 2;", 5);
case!(division, "17 / 5;", 3);
case!(negative, "0 - 5;", -5);
case!(bool_status, "true;", 1);
case!(char_status, "'A';", 65);
case!(string_result_exits_zero, "\"abc\";", 0);
case!(no_statements, "", 0);
case!(trailing_let, "1; let a = 5;", 0);
case!(assign_chain, "let a = 0; let b = 0; a = b = 4; a + b;", 8);
case!(string_concat, "let s = \"ab\" + \"cd\"; s = s + s; 1;", 1);
case!(aggregates, "def object P { x: int, s: string } let p = P { x = 3 }; let d: P; let t = (p, [d]); 42;", 42);
case!(defaults, "let a: int; let b: (bool, [char]); let c = default({x: int}); a + 9;", 9);

// ---- Control flow ----
case!(if_then, "let a = 0; if (true) { a = 5; } else { a = 7; } a;", 5);
case!(if_else, "let a = 0; if (false) { a = 5; } else { a = 7; } a;", 7);
case!(if_without_else, "let a = 1; if (false) a = 2; a;", 1);
case!(let_in_branch, "let a = 2; if (true) let b = 9; else let c = 1; a;", 2);
case!(while_once, "let go = true; let n = 0; while (go) { let k = 3; n = n + k; go = false; } n;", 3);
case!(while_never, "let n = 4; while (false) n = 0; n;", 4);
case!(nested_blocks, "let a = 1; { let b = 2; { let c = 3; a = a + b + c; } } a;", 6);
case!(shadowing, "let a = 1; { let a = 2; a = 5; } a;", 1);

// ---- Functions ----
case!(call, "def func add(a: int, b: int): int { return a + b; } add(2, 3) * add(1, 1);", 10);
case!(argument_order, "def func sub(a: int, b: int): int { return a - b; } sub(10, 4);", 6);
case!(recursion, "def func f(n: int, more: bool): int { if (more) { return f(n + 1, false); } return n * 10; } f(4, true);", 50);
case!(locals_in_function, "def func f(a: int): int { let b = a * 2; { let a = 1; b = b + a; } return b + a; } f(5);", 16);
case!(return_from_loop, "def func f(): int { while (true) { let x = 4; return x; } return 0; } f() + 1;", 5);
case!(unit_function, "def func nop() { } nop(); 7;", 7);
case!(early_unit_return, "def func f(a: int) { return; a; } f(1); 3;", 3);
case!(bool_function, "def func not(b: bool): bool { if (b) { return false; } return true; } not(false);", 1);
case!(string_function, "def func twice(s: string): string { return s + s; } let t = twice(\"ab\"); 2;", 2);
case!(object_param, "def object P { x: int, y: int } def func sum(p: P): int { return 1; } sum(P { y = 2 });", 1);

// ---- Exceptions ----
#[test]
fn division_by_zero() {
    let code = "let z = 0;\nlet x = 1 / z;\n5;";
    let (result, _) = vm(build(code, "test").unwrap());
    assert!(matches!(result, Err(VmError::DivisionByZero)), "{:?}", result);

    let module = frontend(code, "test").unwrap();
    assert_eq!(evaluate(&module), Err(Exception::DivisionByZero(Pos::new(2, 9))));
}

#[test]
fn stack_overflow() {
    let code = "def func f(n: int): int { return f(n + 1); } f(0);";
    let (result, _) = vm(build(code, "test").unwrap());
    assert!(matches!(result, Err(VmError::StackOverflow(_))), "{:?}", result);
}

// ---- Pipeline ----
#[test]
fn labels_land_on_instructions() {
    let code = "def func f(c: bool): int { if (c) { return 1; } return 2; } let n = 1; while (false) n = 2; f(true);";
    let module = frontend(code, "test").unwrap();
    let binary = asm::assemble(&compile(&module)).unwrap();
    let offsets: Vec<usize> = arch::Inst::decode_all(&binary.bytes)
        .unwrap()
        .into_iter()
        .map(|(at, _)| at)
        .collect();
    for (name, offset) in binary.labels.iter() {
        println!("{name}: {offset}");
        assert!(offsets.contains(&offset), "label {name} at {offset}");
    }
    assert_eq!(binary.labels.get("__start").unwrap(), 0);
}

#[test]
fn ir_survives_json() {
    let module = frontend("def func f(a: int): int { return a * 2; } f(21);", "test").unwrap();
    let code = compile(&module);
    let json = code.to_json().unwrap();
    let back = Code::from_json(&json).unwrap();
    assert_eq!(back, code);

    let (result, _) = vm(asm::assemble(&back).unwrap().bytes);
    assert_eq!(result.unwrap(), Status::Exited(42));
}

#[test]
fn prints_strings() {
    let mut code = Code::new();
    code.label("__start");
    for c in "hi!".chars() {
        code.inst(Inst::pushi(c as i64));
    }
    code.inst(Inst::pack(3));
    code.inst(Inst::syscall(SyscallCode::PRINTS));
    code.inst(Inst::pushi('\n' as i64));
    code.inst(Inst::syscall(SyscallCode::PRINTC));
    code.inst(Inst::pushi(0));
    code.inst(Inst::syscall(SyscallCode::EXIT));

    let (result, output) = vm(asm::assemble(&code).unwrap().bytes);
    assert_eq!(result.unwrap(), Status::Exited(0));
    assert_eq!(output, "hi!\n");
}
