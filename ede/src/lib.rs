pub mod cfg;
pub mod compile;
pub mod error;
pub mod eval;
pub mod grammer;
pub mod scope;
pub mod typeck;
pub mod types;

use grammer::ast::{DefKind, Module};
use grammer::lexer::Lexer;
use grammer::parsercore::Parser;
use grammer::token::Token;

pub use error::{Diagnostic, Error, LexError, ParseError, TypeError};
pub use types::EdeType;

pub fn tokenize(src: &str) -> Result<Vec<Token>, Diagnostic> {
    Lexer::new(src).tokenize()
}

pub fn parse_module(src: &str, name: &str) -> Result<Module, Diagnostic> {
    Parser::new(tokenize(src)?).parse_module(name)
}

/// Lex, parse and type check.
pub fn frontend(src: &str, name: &str) -> Result<Module, Diagnostic> {
    let module = parse_module(src, name)?;
    typeck::typecheck(&module)?;
    Ok(module)
}

/// Source to bytecode.
pub fn build(src: &str, name: &str) -> Result<Vec<u8>, Diagnostic> {
    let module = frontend(src, name)?;
    let code = compile::compile(&module);
    match asm::assemble(&code) {
        Ok(binary) => Ok(binary.bytes),
        Err(e) => panic!("compiler produced unencodable IR: {}", e),
    }
}

/// DOT graphs of every function body in a checked module.
pub fn cfg_dot(module: &Module) -> String {
    module
        .defs
        .iter()
        .filter_map(|def| match &def.kind {
            DefKind::Func(func) => Some(cfg::Cfg::build(&func.body).to_dot(&func.name)),
            DefKind::Object(..) => None,
        })
        .collect()
}
