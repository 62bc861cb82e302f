//! # TokenStream 模块
//!
//! 在 [`Lexer`] 之上提供一个词法单元的前瞻。

use crate::error::ParseError;

use super::lexer::Lexer;
use super::source::CharSource;
use super::token::Token;

pub struct TokenStream<S> {
    lexer: Lexer<S>,
    peeked: Option<Token>,
}

impl<S: CharSource> TokenStream<S> {
    pub fn new(lexer: Lexer<S>) -> Self {
        Self {
            lexer,
            peeked: None,
        }
    }

    /// 取出下一个词法单元
    pub fn next(&mut self) -> Result<Token, ParseError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.lexer.next_token(),
        }
    }

    /// 查看下一个词法单元（幂等）
    pub fn peek(&mut self) -> Result<&Token, ParseError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        Ok(self.peeked.insert(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::lexer::LexMode;
    use crate::script::source::StrSource;
    use crate::script::token::TokenKind;

    #[test]
    fn test_peek_is_idempotent() {
        let lexer = Lexer::new(StrSource::new("test", "a b"), LexMode::Code);
        let mut stream = TokenStream::new(lexer);
        let first = stream.peek().unwrap().clone();
        assert_eq!(stream.peek().unwrap(), &first);
        assert_eq!(stream.next().unwrap(), first);
        assert!(stream.next().unwrap().is_keyword("b"));
        assert_eq!(stream.next().unwrap().kind, TokenKind::EndOfStream);
        assert_eq!(stream.peek().unwrap().kind, TokenKind::EndOfStream);
    }
}
