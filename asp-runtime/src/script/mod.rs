//! # Script 模块
//!
//! 脚本前端：字符源、词法分析、AST 与解析器。
//!
//! ## 模块结构
//!
//! - [`source`]：带位置的字符源
//! - [`token`] / [`lexer`] / [`stream`]：词法单元、词法分析器与前瞻
//! - [`ast`]：抽象语法树
//! - [`operators`]：运算符与优先级表
//! - [`parser`]：递归下降解析器
//! - [`printer`]：源码与 S 表达式打印

pub mod ast;
pub mod lexer;
pub mod operators;
pub mod parser;
pub mod printer;
pub mod source;
pub mod stream;
pub mod token;

pub use ast::*;
pub use lexer::{LexMode, Lexer};
pub use operators::{BinaryOp, PRECEDENCE, UnaryOp};
pub use parser::{MAX_NESTING, Parser, parse_expression, parse_script, parse_template};
pub use source::{CharSource, Location, SourceChar, StrSource};
pub use stream::TokenStream;
pub use token::{Token, TokenKind};
