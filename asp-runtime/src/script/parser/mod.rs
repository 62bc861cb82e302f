//! # Parser 模块
//!
//! 递归下降 + 运算符优先级爬升的脚本解析器，只需一个词法单元的前瞻，不回溯。
//!
//! ## 架构
//!
//! ```text
//! CharSource → Lexer → TokenStream → Parser → Block
//! ```
//!
//! ## 模块结构
//!
//! - `helpers`: 词法单元匹配与错误构造
//! - `statement`: 语句块与声明
//! - `expr_parser`: 表达式、实参列表
//!
//! 任何意外的词法单元都立即产生带位置的 [`ParseError`]，不做错误恢复。
//! 嵌套超过 [`MAX_NESTING`] 层同样报错，而不是耗尽调用栈。

mod expr_parser;
mod helpers;
mod statement;

#[cfg(test)]
mod tests;

use tracing::debug;

use crate::error::ParseError;
use crate::script::ast::{Block, Expression};
use crate::script::lexer::{LexMode, Lexer};
use crate::script::source::{CharSource, StrSource};
use crate::script::stream::TokenStream;

/// 表达式与语句块的最大嵌套层数
pub const MAX_NESTING: usize = 64;

/// 脚本解析器
pub struct Parser<S> {
    tokens: TokenStream<S>,
    depth: usize,
}

impl<S: CharSource> Parser<S> {
    /// 从字符源创建解析器
    pub fn new(source: S, mode: LexMode) -> Self {
        Self {
            tokens: TokenStream::new(Lexer::new(source, mode)),
            depth: 0,
        }
    }

    /// 解析整个输入为顶层语句块
    ///
    /// 顶层出现 `end` / `else` / `elseif` 视为语法错误。
    pub fn parse(mut self) -> Result<Block, ParseError> {
        let block = self.block()?;
        let token = self.next()?;
        if !token.is_end() {
            return Err(helpers::unexpected(token, "语句"));
        }
        debug!(
            source = %block.location.source_name,
            statements = block.statements.len(),
            "解析完成"
        );
        Ok(block)
    }

    /// 解析单个表达式，要求其后即为输入结尾
    pub fn parse_expression(mut self) -> Result<Expression, ParseError> {
        let expression = self.expression()?;
        let token = self.next()?;
        if !token.is_end() {
            return Err(helpers::unexpected(token, "输入结尾"));
        }
        Ok(expression)
    }
}

/// 解析纯脚本文本（从代码模式开始）
pub fn parse_script(source_name: &str, text: &str) -> Result<Block, ParseError> {
    Parser::new(StrSource::new(source_name, text), LexMode::Code).parse()
}

/// 解析 ASP 模板文本（从模板模式开始）
pub fn parse_template(source_name: &str, text: &str) -> Result<Block, ParseError> {
    Parser::new(StrSource::new(source_name, text), LexMode::Template).parse()
}

/// 解析表达式文本
pub fn parse_expression(source_name: &str, text: &str) -> Result<Expression, ParseError> {
    Parser::new(StrSource::new(source_name, text), LexMode::Code).parse_expression()
}
