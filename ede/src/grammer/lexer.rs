use super::token::{Pos, Token, TokenKind};
use crate::error::{Diagnostic, LexError};
use std::iter::Peekable;
use std::str::Chars;

pub struct Lexer<'a> {
    iter: Peekable<Chars<'a>>,
    line: usize,
    col: usize,
    keep_comments: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(code: &'a str) -> Self {
        Self {
            iter: code.chars().peekable(),
            line: 1,
            col: 1,
            keep_comments: false,
        }
    }

    /// Retain COMMENT tokens in the output.
    pub fn keep_comments(mut self, keep: bool) -> Self {
        self.keep_comments = keep;
        self
    }
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

impl<'a> Lexer<'a> {
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.iter.clone().nth(n)
    }

    fn consume(&mut self) -> Option<char> {
        let ch = self.iter.next()?;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn consume_if(&mut self, cond: impl Fn(char) -> bool) -> Option<char> {
        match self.iter.peek() {
            Some(&ch) if cond(ch) => self.consume(),
            _ => None,
        }
    }

    fn pos(&self) -> Pos {
        Pos::new(self.line, self.col)
    }
}

// ----------------------------------------------------------------------------
// Lexer
// ----------------------------------------------------------------------------

impl<'a> Lexer<'a> {
    pub fn tokenize(mut self) -> Result<Vec<Token>, Diagnostic> {
        let mut tokens = Vec::new();
        loop {
            // 0. Skip whitespaces
            while self.consume_if(char::is_whitespace).is_some() {}

            let pos = self.pos();
            let Some(ch0) = self.peek_nth(0) else {
                tokens.push(Token::new(TokenKind::Eof, pos));
                break;
            };

            // 1. Comments
            if let Some(ch1) = self.peek_nth(1) {
                match (ch0, ch1) {
                    ('/', '/') => {
                        let comment = self.line_comment();
                        if self.keep_comments {
                            tokens.push(Token::new(comment, pos));
                        }
                        continue;
                    }
                    ('/', '*') => {
                        let comment = self.block_comment().map_err(|e| e.at(pos))?;
                        if self.keep_comments {
                            tokens.push(Token::new(comment, pos));
                        }
                        continue;
                    }
                    ('*', '/') => return Err(LexError::InvalidComment.at(pos)),
                    _ => {}
                }
            }

            // 2. Single character token
            if let Some(kind) = single_char_token(ch0) {
                self.consume();
                tokens.push(Token::new(kind, pos));
                continue;
            }

            // 3. Integer literal
            if ch0.is_ascii_digit() {
                let kind = self.integer().map_err(|e| e.at(pos))?;
                tokens.push(Token::new(kind, pos));
                continue;
            }

            // 4. Char literal
            if ch0 == '\'' {
                let kind = self.char_lit().map_err(|e| e.at(pos))?;
                tokens.push(Token::new(kind, pos));
                continue;
            }

            // 5. String literal
            if ch0 == '"' {
                let kind = self.text().map_err(|e| e.at(pos))?;
                tokens.push(Token::new(kind, pos));
                continue;
            }

            // 6. Identifier or keyword
            if ch0.is_alphabetic() || ch0 == '_' {
                tokens.push(Token::new(self.word(), pos));
                continue;
            }

            // Invalid
            self.consume();
            tokens.push(Token::new(TokenKind::Invalid(ch0), pos));
        }
        Ok(tokens)
    }

    // Line comment: "// hoge"
    fn line_comment(&mut self) -> TokenKind {
        self.consume(); // consume '/'
        self.consume(); // consume '/'
        let mut lexeme = String::new();
        while let Some(ch) = self.consume_if(|c| c != '\n') {
            lexeme.push(ch);
        }
        TokenKind::Comment(lexeme.trim().to_string())
    }

    // Block comment: "/* hoge */"
    fn block_comment(&mut self) -> Result<TokenKind, LexError> {
        self.consume(); // consume '/'
        self.consume(); // consume '*'
        let mut lexeme = String::new();
        loop {
            match (self.peek_nth(0), self.peek_nth(1)) {
                (Some('*'), Some('/')) => {
                    self.consume();
                    self.consume();
                    return Ok(TokenKind::Comment(lexeme.trim().to_string()));
                }
                (Some(_), _) => lexeme.extend(self.consume()),
                (None, _) => return Err(LexError::InvalidComment),
            }
        }
    }

    fn integer(&mut self) -> Result<TokenKind, LexError> {
        let mut lexeme = String::new();
        while let Some(ch) = self.consume_if(|c| c.is_ascii_digit()) {
            lexeme.push(ch);
        }
        match lexeme.parse::<i64>() {
            Ok(num) => Ok(TokenKind::Integer(num)),
            Err(_) => Err(LexError::InvalidIntLit(lexeme)),
        }
    }

    // Char: 'a', '\n'
    fn char_lit(&mut self) -> Result<TokenKind, LexError> {
        self.consume(); // consume opening '
        let ch = match self.consume() {
            None | Some('\'') => return Err(LexError::InvalidCharLit),
            Some('\\') => match self.consume().and_then(escape) {
                Some(ch) => ch,
                None => return Err(LexError::InvalidCharLit),
            },
            Some(ch) => ch,
        };
        match self.consume() {
            Some('\'') => Ok(TokenKind::Char(ch)),
            _ => Err(LexError::InvalidCharLit),
        }
    }

    // Text: "hoge\nfuga"
    fn text(&mut self) -> Result<TokenKind, LexError> {
        self.consume(); // consume opening "
        let mut lexeme = String::new();
        loop {
            match self.consume() {
                None => return Err(LexError::UnexpectedEof("string literal")),
                Some('"') => break,
                Some('\\') => match self.consume() {
                    None => return Err(LexError::UnexpectedEof("string literal")),
                    Some(ch) => match escape(ch) {
                        Some(esc) => lexeme.push(esc),
                        None => {
                            lexeme.push('\\');
                            lexeme.push(ch);
                        }
                    },
                },
                Some(ch) => lexeme.push(ch),
            }
        }
        Ok(TokenKind::Text(lexeme))
    }

    fn word(&mut self) -> TokenKind {
        let mut lexeme = String::new();
        while let Some(ch) = self.consume_if(|c| c.is_alphanumeric() || c == '_') {
            lexeme.push(ch);
        }
        match keyword(&lexeme) {
            Some(kind) => kind,
            None => TokenKind::Ident(lexeme),
        }
    }
}

fn escape(ch: char) -> Option<char> {
    match ch {
        't' => Some('\t'),
        'n' => Some('\n'),
        '\\' => Some('\\'),
        '0' => Some('\0'),
        '"' => Some('"'),
        '\'' => Some('\''),
        _ => None,
    }
}

fn single_char_token(ch: char) -> Option<TokenKind> {
    match ch {
        '+' => Some(TokenKind::Plus),
        '-' => Some(TokenKind::Minus),
        '*' => Some(TokenKind::Star),
        '/' => Some(TokenKind::Slash),
        ';' => Some(TokenKind::Semicolon),
        '=' => Some(TokenKind::Equal),
        ':' => Some(TokenKind::Colon),
        ',' => Some(TokenKind::Comma),
        '(' => Some(TokenKind::LParen),
        ')' => Some(TokenKind::RParen),
        '[' => Some(TokenKind::LBracket),
        ']' => Some(TokenKind::RBracket),
        '{' => Some(TokenKind::LCurly),
        '}' => Some(TokenKind::RCurly),
        _ => None,
    }
}

fn keyword(s: &str) -> Option<TokenKind> {
    match s {
        "let" => Some(TokenKind::KwLet),
        "if" => Some(TokenKind::KwIf),
        "else" => Some(TokenKind::KwElse),
        "while" => Some(TokenKind::KwWhile),
        "true" => Some(TokenKind::KwTrue),
        "false" => Some(TokenKind::KwFalse),
        "object" => Some(TokenKind::KwObject),
        "enum" => Some(TokenKind::KwEnum),
        "func" => Some(TokenKind::KwFunc),
        "def" => Some(TokenKind::KwDef),
        "default" => Some(TokenKind::KwDefault),
        "return" => Some(TokenKind::KwReturn),
        _ => None,
    }
}
