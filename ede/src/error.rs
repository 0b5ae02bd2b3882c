use color_print::cprintln;
use itertools::Itertools;
use strum::IntoStaticStr;
use thiserror::Error;

use crate::grammer::{
    ast::Binop,
    token::{Pos, TokenKind, TokenTag},
};
use crate::types::EdeType;

#[derive(Error, Debug, Clone, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LexError {
    #[error("invalid integer literal `{0}`")]
    InvalidIntLit(String),

    #[error("unexpected end of file in {0}")]
    UnexpectedEof(&'static str),

    #[error("character literal must hold exactly one character")]
    InvalidCharLit,

    #[error("unterminated or unmatched block comment")]
    InvalidComment,
}

#[derive(Error, Debug, Clone, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ParseError {
    #[error("found {found} but expected one of {{{}}}", .expected.iter().join(", "))]
    UnexpectedToken {
        found: TokenKind,
        expected: Vec<TokenTag>,
    },

    #[error("left side of `=` must be an identifier")]
    InvalidOperator,

    #[error("duplicate item name `{0}`")]
    DupRecordItemName(String),
}

#[derive(Error, Debug, Clone, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeError {
    #[error("no operator `{op}` for `{left}` and `{right}`")]
    InvalidBinop {
        op: Binop,
        left: EdeType,
        right: EdeType,
    },

    #[error("unknown identifier `{0}`")]
    UnknownId(String),

    #[error("`{0}` is not a variable")]
    UnknownVariable(String),

    #[error("cannot assign `{found}` to `{expected}`")]
    InvalidAssignment { expected: EdeType, found: EdeType },

    #[error("`{0}` is already defined at {1}")]
    IdConflict(String, Pos),

    #[error("`{0}` does not name a type")]
    UnresolvableTypeName(String),

    #[error("field `{0}` is initialized more than once")]
    Reinitialization(String),

    #[error("no field `{0}` on this object")]
    UnexpectedInitialization(String),

    #[error("expected `{expected}` but found `{found}`")]
    UnexpectedType { expected: EdeType, found: EdeType },

    #[error("undefined object `{0}`")]
    UndefinedObject(String),

    #[error("undefined function `{0}`")]
    UndefinedFunction(String),

    #[error("`{name}` takes {expected} arguments but {found} were given")]
    InvalidArity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("function `{0}` may exit without returning a value")]
    MissingReturn(String),

    #[error("if branch has type `{0}` but else branch has type `{1}`")]
    IncompatibleIfElseClauses(EdeType, EdeType),

    #[error("cannot deduce the type of this expression")]
    CannotDeduceExprType,

    #[error("`return` outside of a function")]
    ReturnOutsideFunction,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

impl Error {
    /// Kind name with the family prefix, e.g. `PARSING_UNEXPECTED_TOKEN`.
    pub fn kind(&self) -> String {
        match self {
            Error::Lex(e) => format!("LEXING_{}", <&str>::from(e)),
            Error::Parse(e) => format!("PARSING_{}", <&str>::from(e)),
            Error::Type(e) => format!("TYPECHECKING_{}", <&str>::from(e)),
        }
    }
}

/// An error with the position it was raised at.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{pos} {}: {error}", .error.kind())]
pub struct Diagnostic {
    pub pos: Pos,
    pub error: Error,
}

macro_rules! at {
    ($($family:ty),*) => {
        $(
            impl $family {
                pub fn at(self, pos: Pos) -> Diagnostic {
                    Diagnostic {
                        pos,
                        error: self.into(),
                    }
                }
            }
        )*
    };
}

at!(LexError, ParseError, TypeError);

impl Diagnostic {
    /// `<source>:<line>:<col> <KIND>: <message>`
    pub fn render(&self, source: &str) -> String {
        format!("{}:{}", source, self)
    }

    /// Print error with the offending line and a caret under the position.
    pub fn print_diag(&self, source: &str, text: &str) {
        cprintln!("<red,bold>error</>: {}: {}", self.error.kind(), self.error);
        cprintln!("     <blue>--></> <underline>{}:{}</>", source, self.pos);
        cprintln!("      <blue>|</>");

        let line = text
            .lines()
            .nth(self.pos.line.saturating_sub(1))
            .unwrap_or("");
        cprintln!(" <blue>{:>4} |</> {}", self.pos.line, line);
        cprintln!(
            "      <blue>|</> {}<red,bold>^</>",
            " ".repeat(self.pos.col.saturating_sub(1))
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names() {
        assert_eq!(Error::from(LexError::InvalidIntLit("9".into())).kind(), "LEXING_INVALID_INT_LIT");
        assert_eq!(Error::from(LexError::UnexpectedEof("string")).kind(), "LEXING_UNEXPECTED_EOF");
        assert_eq!(
            Error::from(ParseError::DupRecordItemName("a".into())).kind(),
            "PARSING_DUP_RECORD_ITEM_NAME"
        );
        assert_eq!(
            Error::from(TypeError::ReturnOutsideFunction).kind(),
            "TYPECHECKING_RETURN_OUTSIDE_FUNCTION"
        );
        assert_eq!(
            Error::from(TypeError::IncompatibleIfElseClauses(EdeType::INT, EdeType::UNIT)).kind(),
            "TYPECHECKING_INCOMPATIBLE_IF_ELSE_CLAUSES"
        );
    }

    #[test]
    fn render() {
        let diag = ParseError::UnexpectedToken {
            found: TokenKind::Plus,
            expected: vec![TokenTag::Ident, TokenTag::Semicolon],
        }
        .at(Pos::new(3, 7));
        assert_eq!(
            diag.render("main.ede"),
            "main.ede:3:7 PARSING_UNEXPECTED_TOKEN: found '+' but expected one of {IDENTIFIER, ';'}"
        );
    }
}
