use super::token::{Token, TokenKind, TokenTag};
use crate::error::{Diagnostic, ParseError};
use std::collections::BTreeSet;
use std::iter::Peekable;

pub struct Parser {
    tokens: Peekable<std::vec::IntoIter<Token>>,
    // Kinds checked for since the last consumed token
    expected: BTreeSet<TokenTag>,
}

impl Parser {
    /// The stream must end in exactly one EOF token.
    pub fn new(tokens: Vec<Token>) -> Self {
        assert!(
            matches!(tokens.last(), Some(Token { kind: TokenKind::Eof, .. })),
            "token stream must end with EOF"
        );
        assert_eq!(
            tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(),
            1,
            "token stream must hold exactly one EOF"
        );
        Parser {
            tokens: tokens.into_iter().peekable(),
            expected: BTreeSet::new(),
        }
    }
}

impl Parser {
    /// Skip comment tokens
    fn skip(&mut self) {
        while self
            .tokens
            .next_if(|token| matches!(token.kind, TokenKind::Comment(_)))
            .is_some()
        {}
    }

    /// Peek : Watch next token without consuming it
    pub fn peek(&mut self) -> &Token {
        self.skip();
        match self.tokens.peek() {
            Some(token) => token,
            None => panic!("read past EOF"),
        }
    }

    /// Next : Consume next token and return it
    pub fn next(&mut self) -> Token {
        self.skip();
        self.expected.clear();
        match self.tokens.next() {
            Some(token) => token,
            None => panic!("read past EOF"),
        }
    }

    /// Peek and check next token is of the kind, remembering it as expected
    pub fn check_if(&mut self, tag: TokenTag) -> bool {
        self.expected.insert(tag);
        self.peek().tag() == tag
    }

    /// Consume if next token is of the kind
    pub fn consume_if(&mut self, tag: TokenTag) -> Option<Token> {
        match self.check_if(tag) {
            true => Some(self.next()),
            false => None,
        }
    }

    /// Next token must be of the kind
    pub fn expect_tobe(&mut self, tag: TokenTag) -> Result<Token, Diagnostic> {
        match self.consume_if(tag) {
            Some(token) => Ok(token),
            None => Err(self.unexpected()),
        }
    }

    /// Error for the next token against everything checked for so far
    pub fn unexpected(&mut self) -> Diagnostic {
        let token = self.peek().clone();
        ParseError::UnexpectedToken {
            found: token.kind,
            expected: self.expected.iter().copied().collect(),
        }
        .at(token.pos)
    }
}

#[macro_export]
macro_rules! check {
    ($parser:expr, $tag:ident) => {
        $parser.check_if($crate::grammer::token::TokenTag::$tag)
    };
}

#[macro_export]
macro_rules! expect {
    ($parser:expr, $tag:ident) => {
        $parser.expect_tobe($crate::grammer::token::TokenTag::$tag)
    };
}

#[macro_export]
macro_rules! optional {
    ($parser:expr, $trigger:ident, $following:expr) => {
        if check!($parser, $trigger) {
            expect!($parser, $trigger)?;
            Some($following)
        } else {
            None
        }
    };
    ($parser:expr, $trigger:ident) => {
        $parser.consume_if($crate::grammer::token::TokenTag::$trigger)
    };
}

/// Parse repeated elements with optional delimiters
/// 3 args: { element } terminal (no delimiter)
/// 4 args: [ element { delimiter element } ] terminal (with delimiter)
#[macro_export]
macro_rules! repeat {
    // Without delimiter: { element } terminal
    ($parser:expr, $elem:expr, $terminal:ident) => {{
        let mut items = Vec::new();
        while !check!($parser, $terminal) {
            items.push($elem?);
        }
        items
    }};

    // With delimiter: [ element { delimiter element } ] terminal
    ($parser:expr, $elem:expr, $delimiter:ident, $terminal:ident) => {{
        let mut items = Vec::new();
        if !check!($parser, $terminal) {
            items.push($elem?);
            while check!($parser, $delimiter) {
                expect!($parser, $delimiter)?;
                items.push($elem?);
            }
        }
        items
    }};
}
