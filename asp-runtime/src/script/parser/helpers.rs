//! # 辅助函数
//!
//! 词法单元的匹配、消费与错误构造。

use crate::error::ParseError;
use crate::script::source::{CharSource, Location};
use crate::script::token::{Token, TokenKind};

use super::{MAX_NESTING, Parser};

/// 保留字：不能作为变量名、函数名或类名
const RESERVED: &[&str] = &[
    "and", "byref", "byval", "call", "class", "dim", "else", "elseif", "end", "exit", "false",
    "function", "if", "is", "mod", "new", "not", "option", "or", "private", "public", "set",
    "sub", "then", "true", "xor",
];

pub(super) fn is_reserved(word: &str) -> bool {
    RESERVED.iter().any(|reserved| reserved.eq_ignore_ascii_case(word))
}

/// 构造"意外的符号"错误；输入结尾单独报告
pub(super) fn unexpected(token: Token, expected: impl Into<String>) -> ParseError {
    let expected = expected.into();
    if token.is_end() {
        ParseError::UnexpectedEnd {
            location: token.location,
            expected,
        }
    } else {
        ParseError::UnexpectedToken {
            found: token.kind.to_string(),
            location: token.location,
            expected,
        }
    }
}

impl<S: CharSource> Parser<S> {
    pub(super) fn next(&mut self) -> Result<Token, ParseError> {
        self.tokens.next()
    }

    pub(super) fn peek(&mut self) -> Result<&Token, ParseError> {
        self.tokens.peek()
    }

    /// 在加深一层嵌套的情况下运行 `parse`
    pub(super) fn nested<T>(
        &mut self,
        location: &Location,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::NestingTooDeep {
                location: location.clone(),
                limit: MAX_NESTING,
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    pub(super) fn peek_is_keyword(&mut self, keyword: &str) -> Result<bool, ParseError> {
        Ok(self.peek()?.is_keyword(keyword))
    }

    pub(super) fn peek_is_punct(&mut self, symbol: char) -> Result<bool, ParseError> {
        Ok(self.peek()?.is_punct(symbol))
    }

    /// 下一个是指定关键字时消费它
    pub(super) fn eat_keyword(&mut self, keyword: &str) -> Result<bool, ParseError> {
        if self.peek_is_keyword(keyword)? {
            self.next()?;
            return Ok(true);
        }
        Ok(false)
    }

    pub(super) fn expect_keyword(&mut self, keyword: &str) -> Result<Token, ParseError> {
        let token = self.next()?;
        if token.is_keyword(keyword) {
            Ok(token)
        } else {
            Err(unexpected(token, format!("'{}'", keyword)))
        }
    }

    pub(super) fn expect_punct(&mut self, symbol: char) -> Result<Token, ParseError> {
        let token = self.next()?;
        if token.is_punct(symbol) {
            Ok(token)
        } else {
            Err(unexpected(token, format!("'{}'", symbol)))
        }
    }

    /// 读取一个非保留字的名字
    pub(super) fn expect_name(&mut self, what: &str) -> Result<(String, Location), ParseError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Identifier(name) if !is_reserved(&name) => Ok((name, token.location)),
            kind => Err(unexpected(Token::new(kind, token.location), what)),
        }
    }

    /// 读取成员名（点号之后允许保留字，如 `response.end`）
    pub(super) fn expect_member(&mut self) -> Result<String, ParseError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Identifier(name) => Ok(name),
            kind => Err(unexpected(Token::new(kind, token.location), "成员名")),
        }
    }

    /// 语句结尾：消费 `:`；模板块与输入结尾留给 `block` 处理
    pub(super) fn end_of_statement(&mut self) -> Result<(), ParseError> {
        let token = self.peek()?;
        if token.is_punct(':') {
            self.next()?;
            return Ok(());
        }
        if token.ends_statement() {
            return Ok(());
        }
        let token = token.clone();
        Err(unexpected(token, "语句结尾"))
    }

    /// 读取 `end <kind>`，结束关键字不匹配时报告 [`ParseError::MismatchedEnd`]
    pub(super) fn expect_end(&mut self, kind: &str) -> Result<(), ParseError> {
        self.expect_keyword("end")?;
        let token = self.next()?;
        if token.is_keyword(kind) {
            return Ok(());
        }
        match token.kind {
            TokenKind::Identifier(found) => Err(ParseError::MismatchedEnd {
                location: token.location,
                expected: format!("end {}", kind),
                found,
            }),
            kind_found => Err(unexpected(
                Token::new(kind_found, token.location),
                format!("'{}'", kind),
            )),
        }
    }
}
