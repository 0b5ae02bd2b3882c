use std::fmt;

use strum::EnumDiscriminants;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Pos) -> Self {
        Token { kind, pos }
    }

    pub fn tag(&self) -> TokenTag {
        TokenTag::from(&self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(TokenTag), derive(Hash, PartialOrd, Ord))]
pub enum TokenKind {
    // Single character tokens
    Plus,      // '+'
    Minus,     // '-'
    Star,      // '*'
    Slash,     // '/'
    Semicolon, // ';'
    Equal,     // '='
    Colon,     // ':'
    Comma,     // ','
    LParen,    // '('
    RParen,    // ')'
    LBracket,  // '['
    RBracket,  // ']'
    LCurly,    // '{'
    RCurly,    // '}'

    // Keywords
    KwLet,     // "let"
    KwIf,      // "if"
    KwElse,    // "else"
    KwWhile,   // "while"
    KwTrue,    // "true"
    KwFalse,   // "false"
    KwObject,  // "object"
    KwEnum,    // "enum"
    KwFunc,    // "func"
    KwDef,     // "def"
    KwDefault, // "default"
    KwReturn,  // "return"

    // Identifier
    Ident(String),

    // Literals
    Integer(i64),
    Text(String),
    Char(char),

    // Special
    Comment(String),
    Invalid(char),
    Eof,
}

impl fmt::Display for TokenTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenTag::*;
        let s = match self {
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Semicolon => "';'",
            Equal => "'='",
            Colon => "':'",
            Comma => "','",
            LParen => "'('",
            RParen => "')'",
            LBracket => "'['",
            RBracket => "']'",
            LCurly => "'{'",
            RCurly => "'}'",
            KwLet => "'let'",
            KwIf => "'if'",
            KwElse => "'else'",
            KwWhile => "'while'",
            KwTrue => "'true'",
            KwFalse => "'false'",
            KwObject => "'object'",
            KwEnum => "'enum'",
            KwFunc => "'func'",
            KwDef => "'def'",
            KwDefault => "'default'",
            KwReturn => "'return'",
            Ident => "IDENTIFIER",
            Integer => "INTEGER",
            Text => "STRING",
            Char => "CHAR",
            Comment => "COMMENT",
            Invalid => "INVALID",
            Eof => "EOF",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = TokenTag::from(self);
        match self {
            TokenKind::Ident(s) => write!(f, "{}({})", tag, s),
            TokenKind::Integer(v) => write!(f, "{}({})", tag, v),
            TokenKind::Text(s) => write!(f, "{}({:?})", tag, s),
            TokenKind::Char(c) => write!(f, "{}({:?})", tag, c),
            TokenKind::Invalid(c) => write!(f, "{}({:?})", tag, c),
            _ => write!(f, "{}", tag),
        }
    }
}

/// 1-indexed source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(line: usize, col: usize) -> Self {
        Pos { line, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
