use ede::grammer::lexer::Lexer;
use ede::grammer::token::{Pos, TokenKind, TokenKind::*};
use ede::LexError;

fn case(code: &str, expects: Vec<TokenKind>) {
    let tokens = Lexer::new(code).keep_comments(true).tokenize().unwrap();

    println!(" {code}");
    for (idx, token) in tokens.iter().enumerate() {
        println!("{:>2}: {} {:?}", idx, token.pos, token.kind);
    }

    // Trailing EOF
    assert_eq!(tokens.len(), expects.len() + 1);
    for (idx, expect) in expects.iter().enumerate() {
        assert_eq!(tokens[idx].kind, *expect);
    }
    assert_eq!(tokens[expects.len()].kind, Eof);
}

fn error(code: &str, expect: LexError, pos: Pos) {
    let diag = Lexer::new(code).tokenize().unwrap_err();
    println!(" {code}\n{}", diag);
    assert_eq!(diag.error, ede::Error::from(expect));
    assert_eq!(diag.pos, pos);
}

macro_rules! case {
    ($name:ident, $code:expr, $expect:expr) => {
        #[test]
        fn $name() {
            case($code, vec![$expect]);
        }
    };
}

// ---- Symbols ----
case!(plus, "+", Plus);
case!(minus, "-", Minus);
case!(star, "*", Star);
case!(slash, "/", Slash);
case!(semicolon, ";", Semicolon);
case!(equal, "=", Equal);
case!(colon, ":", Colon);
case!(comma, ",", Comma);
case!(lparen, "(", LParen);
case!(rparen, ")", RParen);
case!(lbracket, "[", LBracket);
case!(rbracket, "]", RBracket);
case!(lcurly, "{", LCurly);
case!(rcurly, "}", RCurly);

// ---- Keywords ----
case!(kw_let, "let", KwLet);
case!(kw_if, "if", KwIf);
case!(kw_else, "else", KwElse);
case!(kw_while, "while", KwWhile);
case!(kw_true, "true", KwTrue);
case!(kw_false, "false", KwFalse);
case!(kw_object, "object", KwObject);
case!(kw_enum, "enum", KwEnum);
case!(kw_func, "func", KwFunc);
case!(kw_def, "def", KwDef);
case!(kw_default, "default", KwDefault);
case!(kw_return, "return", KwReturn);

// ---- Literals ----
case!(integer, "123", Integer(123));
case!(integer_max, "9223372036854775807", Integer(i64::MAX));
case!(text, "\"a\\tb\"", Text(format!("a\tb")));
case!(text_unknown_escape, "\"a\\qb\"", Text(format!("a\\qb")));
case!(char_lit, "'x'", Char('x'));
case!(char_escape, "'\\n'", Char('\n'));
case!(ident, "_foo1", Ident(format!("_foo1")));
case!(keyword_prefix, "letter", Ident(format!("letter")));
case!(line_comment, "// sample comment", Comment(format!("sample comment")));
case!(block_comment, "/* multi\nline */", Comment(format!("multi\nline")));
case!(invalid, "$", Invalid('$'));

#[test]
fn statement() {
    case(
        "def func add(a: int): int { return a + 1; } // done",
        vec![
            KwDef,
            KwFunc,
            Ident(format!("add")),
            LParen,
            Ident(format!("a")),
            Colon,
            Ident(format!("int")),
            RParen,
            Colon,
            Ident(format!("int")),
            LCurly,
            KwReturn,
            Ident(format!("a")),
            Plus,
            Integer(1),
            Semicolon,
            RCurly,
            Comment(format!("done")),
        ],
    );
}

#[test]
fn positions() {
    let tokens = Lexer::new("let a\n  = 'b';").tokenize().unwrap();
    let pos: Vec<_> = tokens.iter().map(|t| t.pos.to_string()).collect();
    assert_eq!(pos, ["1:1", "1:5", "2:3", "2:5", "2:8", "2:9"]);
}

#[test]
fn comments_dropped_by_default() {
    let tokens = Lexer::new("1 // one\n/* two */ 2").tokenize().unwrap();
    let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
    assert_eq!(kinds, [Integer(1), Integer(2), Eof]);
}

#[test]
fn errors() {
    error("\"abc", LexError::UnexpectedEof("string literal"), Pos::new(1, 1));
    error("x = 99999999999999999999;", LexError::InvalidIntLit(format!("99999999999999999999")), Pos::new(1, 5));
    error("'ab'", LexError::InvalidCharLit, Pos::new(1, 1));
    error("''", LexError::InvalidCharLit, Pos::new(1, 1));
    error("1 /* open", LexError::InvalidComment, Pos::new(1, 3));
    error("1 */", LexError::InvalidComment, Pos::new(1, 3));
}

#[test]
fn error_kind_names() {
    let diag = ede::tokenize("let s = \"abc").unwrap_err();
    assert_eq!(diag.error.kind(), "LEXING_UNEXPECTED_EOF");
    assert!(diag.render("main.ede").starts_with("main.ede:1:9 LEXING_UNEXPECTED_EOF: "));
}
