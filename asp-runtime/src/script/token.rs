//! # Token 模块
//!
//! 词法单元定义。

use std::fmt;

use super::source::Location;

/// 词法单元种类
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// 标识符（含关键字，原样保留大小写）
    Identifier(String),
    /// 单字符标点
    Punctuation(char),
    /// 整数字面量
    Integer(i64),
    /// 字符串字面量（已处理 `""` 转义）
    String(String),
    /// 模板文本块（`%>` 与 `<%` 之间的内容）
    InlineTemplate(String),
    /// 输入结束
    EndOfStream,
}

/// 词法单元
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: Location,
}

impl Token {
    pub fn new(kind: TokenKind, location: Location) -> Self {
        Self { kind, location }
    }

    /// 是否为指定关键字（不区分大小写）
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.kind, TokenKind::Identifier(word) if word.eq_ignore_ascii_case(keyword))
    }

    /// 是否为指定标点
    pub fn is_punct(&self, symbol: char) -> bool {
        self.kind == TokenKind::Punctuation(symbol)
    }

    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::EndOfStream
    }

    /// 是否结束当前语句：`:`（含换行）、模板块或输入结束
    pub fn ends_statement(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Punctuation(':') | TokenKind::InlineTemplate(_) | TokenKind::EndOfStream
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(name) => write!(f, "'{}'", name),
            Self::Punctuation(symbol) => write!(f, "'{}'", symbol),
            Self::Integer(value) => write!(f, "{}", value),
            Self::String(value) => write!(f, "\"{}\"", value.replace('"', "\"\"")),
            Self::InlineTemplate(_) => write!(f, "模板文本"),
            Self::EndOfStream => write!(f, "输入结尾"),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}
