//! # Lexer 模块
//!
//! 把带位置的字符流切分成 [`Token`]。
//!
//! ## 规则
//!
//! - 空格、制表符、`\r` 被跳过；换行产生 `:` 标点（语句分隔）
//! - `'` 开始的注释持续到行尾
//! - 标识符为 `[A-Za-z_][A-Za-z0-9_]*`
//! - 其余字符一律产生单字符标点，多字符运算符由 Parser 组合
//! - `%>` 进入模板模式，直到下一个 `<%` 为止的文本作为一个模板块

use crate::error::ParseError;

use super::source::{CharSource, Location, SourceChar};
use super::token::{Token, TokenKind};

/// 词法起始模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexMode {
    /// 纯脚本（从代码开始）
    Code,
    /// ASP 模板（从模板文本开始，`<% %>` 内为代码）
    Template,
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// 词法分析器
pub struct Lexer<S> {
    source: S,
    mode: LexMode,
}

impl<S: CharSource> Lexer<S> {
    pub fn new(source: S, mode: LexMode) -> Self {
        Self { source, mode }
    }

    /// 读取下一个词法单元
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        if self.mode == LexMode::Template {
            let location = self.source.location();
            return Ok(self.template(location));
        }

        loop {
            let Some(c) = self.source.next_char() else {
                return Ok(Token::new(TokenKind::EndOfStream, self.source.location()));
            };
            match c.ch {
                ' ' | '\t' | '\r' => continue,
                '\n' => return Ok(Token::new(TokenKind::Punctuation(':'), c.location)),
                '\'' => {
                    if let Some(chunk) = self.comment() {
                        return Ok(chunk);
                    }
                }
                '"' => return self.string(c.location),
                '0'..='9' => return self.integer(c),
                '%' if self.source.peek_char() == Some('>') => {
                    self.source.next_char();
                    let location = self.source.location();
                    return Ok(self.template(location));
                }
                ch if is_identifier_start(ch) => return Ok(self.identifier(c)),
                ch => return Ok(Token::new(TokenKind::Punctuation(ch), c.location)),
            }
        }
    }

    /// 跳过注释；注释中的 `%>` 仍然结束代码段
    fn comment(&mut self) -> Option<Token> {
        loop {
            match self.source.peek_char() {
                None | Some('\n') => return None,
                Some('%') => {
                    self.source.next_char();
                    if self.source.peek_char() == Some('>') {
                        self.source.next_char();
                        let location = self.source.location();
                        return Some(self.template(location));
                    }
                }
                Some(_) => {
                    self.source.next_char();
                }
            }
        }
    }

    /// 读取模板文本直到 `<%` 或输入结束，之后回到代码模式
    fn template(&mut self, location: Location) -> Token {
        self.mode = LexMode::Code;
        let mut text = String::new();
        while let Some(c) = self.source.next_char() {
            if c.ch == '<' && self.source.peek_char() == Some('%') {
                self.source.next_char();
                break;
            }
            text.push(c.ch);
        }
        Token::new(TokenKind::InlineTemplate(text), location)
    }

    fn string(&mut self, location: Location) -> Result<Token, ParseError> {
        let mut value = String::new();
        loop {
            match self.source.next_char() {
                Some(c) if c.ch == '"' => {
                    if self.source.peek_char() == Some('"') {
                        self.source.next_char();
                        value.push('"');
                    } else {
                        return Ok(Token::new(TokenKind::String(value), location));
                    }
                }
                Some(c) if c.ch != '\n' => value.push(c.ch),
                _ => return Err(ParseError::UnterminatedString { location }),
            }
        }
    }

    fn integer(&mut self, first: SourceChar) -> Result<Token, ParseError> {
        let mut literal = String::from(first.ch);
        while let Some(ch) = self.source.peek_char().filter(char::is_ascii_digit) {
            self.source.next_char();
            literal.push(ch);
        }
        match literal.parse::<i64>() {
            Ok(value) => Ok(Token::new(TokenKind::Integer(value), first.location)),
            Err(_) => Err(ParseError::IntegerOverflow {
                location: first.location,
                literal,
            }),
        }
    }

    fn identifier(&mut self, first: SourceChar) -> Token {
        let mut name = String::from(first.ch);
        while let Some(ch) = self.source.peek_char().filter(|c| is_identifier_char(*c)) {
            self.source.next_char();
            name.push(ch);
        }
        Token::new(TokenKind::Identifier(name), first.location)
    }
}
