use ede::grammer::lexer::Lexer;
use ede::grammer::parsercore::Parser;
use ede::grammer::token::Pos;
use ede::{parse_module, ParseError};

fn expr(code: &str, expect: &str) {
    let tokens = Lexer::new(code).tokenize().unwrap();
    let ast = Parser::new(tokens).parse_expr().unwrap();
    println!(" {code}\n {ast}");
    assert_eq!(ast.to_string(), expect);
}

fn module(code: &str) {
    println!("{code}");
    match parse_module(code, "test") {
        Ok(ast) => println!("{ast}"),
        Err(e) => panic!("{}", e.render("test")),
    }
}

fn error(code: &str, kind: &str, pos: Pos) {
    let diag = parse_module(code, "test").unwrap_err();
    println!(" {code}\n{}", diag.render("test"));
    assert_eq!(diag.error.kind(), kind);
    assert_eq!(diag.pos, pos);
}

macro_rules! case {
    ($name:ident, $code:expr) => {
        #[test]
        fn $name() {
            module($code);
        }
    };
    ($name:ident, $code:expr, $expect:expr) => {
        #[test]
        fn $name() {
            expr($code, $expect);
        }
    };
}

// ---- Expressions ----
case!(prec_mul_over_add, "3 + 7 * 2", "Binop(+, 3, Binop(*, 7, 2))");
case!(prec_left_assoc, "8 - 4 - 2", "Binop(-, Binop(-, 8, 4), 2)");
case!(prec_div, "8 / 4 * 2", "Binop(*, Binop(/, 8, 4), 2)");
case!(prec_paren, "(3 + 7) * 2", "Binop(*, Binop(+, 3, 7), 2)");
case!(assign_right_assoc, "a = b = 1", "Assign(a, Assign(b, 1))");
case!(assign_binop, "a = b + 1", "Assign(a, Binop(+, b, 1))");
case!(unit, "()", "()");
case!(tuple, "(1, 'c', \"s\")", "(1, 'c', \"s\")");
case!(array, "[1, 2, 3]", "[1, 2, 3]");
case!(empty_array, "[]", "[]");
case!(call, "f(1, g())", "f(1, g())");
case!(object_init, "P { x = 1, y = true }", "P{x = 1, y = true}");
case!(default, "default([(int, bool)])", "default([(int, bool)])");

// ---- Modules ----
case!(let_typed, "let a: int = 1;");
case!(let_uninit, "let a: {x: int, y: string};");
case!(if_else, "if (true) { 1; } else if (false) 2; else { 3; }");
case!(while_loop, "let go = true; while (go) { go = false; }");
case!(block, "{ let a = 1; { a; } }");
case!(object_def, "def object Point { x: int, y: int }");
case!(func_def, "def func add(a: int, b: int): int { return a + b; }");
case!(func_unit, "def func nop() { return; }");
case!(comments, "// head\nlet a = 1; /* tail */");

// ---- Errors ----
#[test]
fn let_without_type_or_value() {
    error("let a;", "PARSING_UNEXPECTED_TOKEN", Pos::new(1, 6));
}

#[test]
fn assign_to_non_identifier() {
    error("1 + a = 2;", "PARSING_INVALID_OPERATOR", Pos::new(1, 7));
}

#[test]
fn duplicate_field() {
    error(
        "def object P { x: int, x: bool }",
        "PARSING_DUP_RECORD_ITEM_NAME",
        Pos::new(1, 24),
    );
}

#[test]
fn missing_semicolon() {
    let diag = parse_module("let a = 1\nlet b = 2;", "test").unwrap_err();
    println!("{}", diag.render("test"));
    match diag.error {
        ede::Error::Parse(ParseError::UnexpectedToken { expected, .. }) => {
            let expected: Vec<_> = expected.iter().map(|t| t.to_string()).collect();
            assert!(expected.contains(&"';'".to_string()), "{:?}", expected);
        }
        e => panic!("unexpected error {e:?}"),
    }
    assert_eq!(diag.pos, Pos::new(2, 1));
}

#[test]
fn unterminated_block() {
    error("{ let a = 1;", "PARSING_UNEXPECTED_TOKEN", Pos::new(1, 13));
}
