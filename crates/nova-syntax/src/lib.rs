//! Lexing and lightweight parsing for Java sources.
//!
//! Nova's completion engine classifies the cursor position from a token
//! stream rather than a full syntax tree:
//! - [`lex`]: an error-tolerant Java lexer producing tokens with byte ranges.
//! - [`parse_module_info`] / [`parse_module_info_lossy`]: a small parser for
//!   `module-info.java`, whose directives drive the module graph.

mod lexer;
mod module_info;

pub use lexer::{lex, lex_with_errors, LexError, SyntaxKind, Token};
pub use module_info::{
    parse_module_info, parse_module_info_lossy, DirectiveName, ExportsDecl, ModuleDecl,
    ModuleDirective, ModuleInfoParseError, NameRef, ProvidesDecl, RequiresDecl, UsesDecl,
};
