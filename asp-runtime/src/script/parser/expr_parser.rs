//! # 表达式解析器
//!
//! 在 [`PRECEDENCE`] 表上做优先级爬升：`binary(min)` 先读一个因子，
//! 然后只要下一个运算符所在的层不低于 `min` 就消费它，并以高一层为下限
//! 解析右操作数，于是同层运算符左结合地折叠。
//! 每层括号只占用常数个栈帧，与优先级表的层数无关。

use crate::error::ParseError;
use crate::script::ast::{Expression, LiteralValue, New};
use crate::script::operators::{BinaryOp, PRECEDENCE, UnaryOp};
use crate::script::source::{CharSource, Location};
use crate::script::token::{Token, TokenKind};

use super::Parser;
use super::helpers::{is_reserved, unexpected};

impl<S: CharSource> Parser<S> {
    /// 完整表达式
    pub(super) fn expression(&mut self) -> Result<Expression, ParseError> {
        let location = self.peek()?.location.clone();
        self.nested(&location, |parser| parser.binary(0, None))
    }

    /// 以已解析的 `seed` 作为最左侧因子继续解析表达式
    pub(super) fn expression_from(&mut self, seed: Expression) -> Result<Expression, ParseError> {
        let location = seed.location().clone();
        self.nested(&location, |parser| parser.binary(0, Some(seed)))
    }

    fn binary(
        &mut self,
        min_level: usize,
        seed: Option<Expression>,
    ) -> Result<Expression, ParseError> {
        let mut left = match seed {
            Some(expression) => expression,
            None => self.factor()?,
        };
        while let Some((level, op, location)) = self.operator(min_level)? {
            let right = self.binary(level + 1, None)?;
            left = Expression::binary(location, op, left, right);
        }
        Ok(left)
    }

    /// 下一个词法单元是层级不低于 `min_level` 的运算符时消费它
    ///
    /// 返回运算符所在的层。双字符运算符（`<>`、`<=`、`>=`）由两个相邻的标点组成；
    /// 每个首字符只属于一层，所以看首字符就能决定是否消费。
    fn operator(
        &mut self,
        min_level: usize,
    ) -> Result<Option<(usize, BinaryOp, Location)>, ParseError> {
        let token = self.peek()?.clone();
        let mut groups = PRECEDENCE.iter().enumerate().skip(min_level);
        match token.kind {
            TokenKind::Identifier(ref word) => {
                let found = groups.find_map(|(level, group)| group.keyword(word).map(|op| (level, op)));
                let Some((level, op)) = found else {
                    return Ok(None);
                };
                self.next()?;
                Ok(Some((level, op, token.location)))
            }
            TokenKind::Punctuation(first) => {
                let Some((level, group)) = groups.find(|(_, group)| group.starts_with(first)) else {
                    return Ok(None);
                };
                self.next()?;
                if let TokenKind::Punctuation(second) = self.peek()?.kind {
                    if let Some(op) = group.symbol(&format!("{first}{second}")) {
                        self.next()?;
                        return Ok(Some((level, op, token.location)));
                    }
                }
                match group.symbol(&first.to_string()) {
                    Some(op) => Ok(Some((level, op, token.location))),
                    None => {
                        let found = self.next()?;
                        Err(unexpected(found, "运算符"))
                    }
                }
            }
            _ => Ok(None),
        }
    }

    /// 因子：字面量、`new`、`not`、负号、变量、括号，及其后的调用
    fn factor(&mut self) -> Result<Expression, ParseError> {
        let token = self.next()?;
        let location = token.location;
        let primary = match token.kind {
            TokenKind::Integer(value) => Expression::literal(location, LiteralValue::Integer(value)),
            TokenKind::String(value) => Expression::literal(location, LiteralValue::String(value)),
            TokenKind::Identifier(word) if word.eq_ignore_ascii_case("true") => {
                Expression::literal(location, LiteralValue::Boolean(true))
            }
            TokenKind::Identifier(word) if word.eq_ignore_ascii_case("false") => {
                Expression::literal(location, LiteralValue::Boolean(false))
            }
            TokenKind::Identifier(word) if word.eq_ignore_ascii_case("new") => {
                let (class_name, _) = self.expect_name("类名")?;
                return Ok(Expression::New(New {
                    location,
                    class_name,
                }));
            }
            // not 的操作数是完整表达式
            TokenKind::Identifier(word) if word.eq_ignore_ascii_case("not") => {
                let operand = self.expression()?;
                return Ok(Expression::unary(location, UnaryOp::Not, operand));
            }
            TokenKind::Identifier(word) if !is_reserved(&word) => self.variable(word, location)?,
            TokenKind::Punctuation('-') => {
                let operand = self.nested(&location, |parser| parser.factor())?;
                return Ok(Expression::unary(location, UnaryOp::Neg, operand));
            }
            TokenKind::Punctuation('(') => {
                let inner = self.expression()?;
                self.expect_punct(')')?;
                Expression::parenthesis(location, inner)
            }
            kind => return Err(unexpected(Token::new(kind, location), "表达式")),
        };
        self.calls(primary)
    }

    /// 点号连接的变量路径，`first` 为已读取的第一段
    pub(super) fn variable(
        &mut self,
        first: String,
        location: Location,
    ) -> Result<Expression, ParseError> {
        let mut path = vec![first];
        while self.peek_is_punct('.')? {
            self.next()?;
            path.push(self.expect_member()?);
        }
        Ok(Expression::variable(location, path))
    }

    /// 后缀调用，可连续：`f(1)(2)`
    fn calls(&mut self, mut expression: Expression) -> Result<Expression, ParseError> {
        while self.peek_is_punct('(')? {
            self.next()?;
            let args = self.args()?;
            self.expect_punct(')')?;
            let location = expression.location().clone();
            expression = Expression::call(location, expression, args);
        }
        Ok(expression)
    }

    /// 逗号分隔的实参列表，在语句结尾或 `)` 处停止
    pub(super) fn args(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut args = Vec::new();
        loop {
            let token = self.peek()?;
            if token.ends_statement() || token.is_punct(')') {
                return Ok(args);
            }
            args.push(self.expression()?);

            let token = self.peek()?;
            if token.is_punct(',') {
                self.next()?;
            } else if token.ends_statement() || token.is_punct(')') {
                return Ok(args);
            } else {
                let token = token.clone();
                return Err(unexpected(token, "',' 或 ')'"));
            }
        }
    }
}
