//! # 语句解析
//!
//! 语句块、声明、条件与赋值/过程调用的消歧。

use std::rc::Rc;

use crate::error::ParseError;
use crate::script::ast::{
    Assignment, Block, ClassDecl, Dim, Expression, ExpressionStatement, FunctionDecl,
    FunctionKind, IfStatement, LiteralValue, Param, Statement,
};
use crate::script::source::{CharSource, Location};
use crate::script::token::TokenKind;

use super::Parser;
use super::helpers::unexpected;

/// `response.write <value>` 语句（模板块与 `<%= %>` 的脱糖结果）
fn write_statement(location: Location, value: Expression) -> Statement {
    let callee = Expression::variable(
        location.clone(),
        vec!["response".to_string(), "write".to_string()],
    );
    Statement::Expression(ExpressionStatement {
        expression: Expression::call(location.clone(), callee, vec![value]),
        location,
    })
}

impl<S: CharSource> Parser<S> {
    /// 解析语句直到输入结尾或 `end` / `else` / `elseif`
    pub(super) fn block(&mut self) -> Result<Block, ParseError> {
        let location = self.peek()?.location.clone();
        let statements = self.nested(&location, |parser| parser.statements())?;
        Ok(Block::new(location, statements))
    }

    fn statements(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();

        loop {
            let token = self.peek()?.clone();
            match &token.kind {
                TokenKind::EndOfStream => break,
                TokenKind::Punctuation(':') => {
                    self.next()?;
                }
                TokenKind::InlineTemplate(text) => {
                    self.next()?;
                    if !text.is_empty() {
                        let literal = Expression::literal(
                            token.location.clone(),
                            LiteralValue::String(text.clone()),
                        );
                        statements.push(write_statement(token.location.clone(), literal));
                    }
                    // `<%= expr %>`
                    if self.peek_is_punct('=')? {
                        let equals = self.next()?;
                        let value = self.expression()?;
                        statements.push(write_statement(equals.location, value));
                        self.end_of_statement()?;
                    }
                }
                TokenKind::Identifier(word) => {
                    let word = word.to_ascii_lowercase();
                    match word.as_str() {
                        "end" | "else" | "elseif" => break,
                        "function" => {
                            statements.push(Statement::Function(self.function(FunctionKind::Function)?))
                        }
                        "sub" => statements.push(Statement::Function(self.function(FunctionKind::Sub)?)),
                        "class" => statements.push(Statement::Class(self.class()?)),
                        "dim" => {
                            self.next()?;
                            statements.extend(self.names()?.into_iter().map(Statement::Dim));
                            self.end_of_statement()?;
                        }
                        "if" => {
                            self.next()?;
                            statements.push(Statement::If(self.if_statement(token.location)?));
                        }
                        "set" => {
                            self.next()?;
                        }
                        "call" => {
                            statements.push(self.call_statement()?);
                            self.end_of_statement()?;
                        }
                        "option" => {
                            self.next()?;
                            self.expect_keyword("explicit")?;
                            statements.push(Statement::OptionExplicit {
                                location: token.location,
                            });
                            self.end_of_statement()?;
                        }
                        "exit" => {
                            self.next()?;
                            let kind = if self.eat_keyword("function")? {
                                FunctionKind::Function
                            } else if self.eat_keyword("sub")? {
                                FunctionKind::Sub
                            } else {
                                let found = self.next()?;
                                return Err(unexpected(found, "'function' 或 'sub'"));
                            };
                            statements.push(Statement::Exit {
                                location: token.location,
                                kind,
                            });
                            self.end_of_statement()?;
                        }
                        _ => {
                            statements.push(self.assignment_or_sub_call()?);
                            self.end_of_statement()?;
                        }
                    }
                }
                _ => return Err(unexpected(token, "语句")),
            }
        }

        Ok(statements)
    }

    /// `function name(params) ... end function`，括号可省略
    fn function(&mut self, kind: FunctionKind) -> Result<Rc<FunctionDecl>, ParseError> {
        let keyword = self.next()?;
        let (name, _) = self.expect_name("函数名")?;

        let mut params = Vec::new();
        if self.peek_is_punct('(')? {
            self.next()?;
            while !self.peek_is_punct(')')? {
                params.push(self.param()?);
                if !self.peek_is_punct(')')? {
                    self.expect_punct(',')?;
                }
            }
            self.expect_punct(')')?;
        }
        self.end_of_statement()?;

        let body = self.block()?;
        self.expect_end(kind.keyword())?;
        self.end_of_statement()?;

        Ok(Rc::new(FunctionDecl {
            location: keyword.location,
            kind,
            name,
            params,
            body,
        }))
    }

    fn param(&mut self) -> Result<Param, ParseError> {
        let by_ref = if self.eat_keyword("byref")? {
            Some(true)
        } else if self.eat_keyword("byval")? {
            Some(false)
        } else {
            None
        };
        let (name, location) = self.expect_name("参数名")?;
        Ok(Param {
            location,
            name,
            by_ref,
        })
    }

    /// `class Name ... end class`
    fn class(&mut self) -> Result<Rc<ClassDecl>, ParseError> {
        let keyword = self.next()?;
        let (name, _) = self.expect_name("类名")?;
        self.end_of_statement()?;

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        loop {
            let token = self.peek()?.clone();
            if token.is_punct(':') {
                self.next()?;
            } else if token.is_keyword("end") {
                break;
            } else if token.is_keyword("dim") {
                self.next()?;
                fields.extend(self.names()?);
                self.end_of_statement()?;
            } else if token.is_keyword("function") {
                methods.push(self.function(FunctionKind::Function)?);
            } else if token.is_keyword("sub") {
                methods.push(self.function(FunctionKind::Sub)?);
            } else if token.is_keyword("public") || token.is_keyword("private") {
                self.next()?;
                // `public a, b` 等价于 `dim a, b`
                if !self.peek_is_keyword("function")? && !self.peek_is_keyword("sub")? {
                    fields.extend(self.names()?);
                    self.end_of_statement()?;
                }
            } else {
                return Err(unexpected(token, "类成员或 'end class'"));
            }
        }
        self.expect_end("class")?;
        self.end_of_statement()?;

        Ok(Rc::new(ClassDecl {
            location: keyword.location,
            name,
            fields,
            methods,
        }))
    }

    /// `dim` / `public` / `private` 之后的名字列表：`a, b, c`
    fn names(&mut self) -> Result<Vec<Dim>, ParseError> {
        let mut dims = Vec::new();
        loop {
            let (name, location) = self.expect_name("变量名")?;
            dims.push(Dim { location, name });
            if !self.peek_is_punct(',')? {
                return Ok(dims);
            }
            self.next()?;
        }
    }

    /// `if` 关键字之后的部分
    ///
    /// `elseif` 链循环读取，再从后往前折叠成 else 块中的嵌套条件。
    fn if_statement(&mut self, location: Location) -> Result<IfStatement, ParseError> {
        let (condition, then_block) = self.branch()?;

        let mut chain = Vec::new();
        let else_block = loop {
            let token = self.peek()?.clone();
            if token.is_keyword("elseif") {
                self.next()?;
                let (condition, then_block) = self.branch()?;
                chain.push((token.location, condition, then_block));
            } else if token.is_keyword("else") {
                self.next()?;
                let block = self.block()?;
                self.expect_end("if")?;
                self.end_of_statement()?;
                break block;
            } else if token.is_keyword("end") {
                self.expect_end("if")?;
                self.end_of_statement()?;
                break Block::new(token.location, Vec::new());
            } else {
                return Err(unexpected(token, "'end if'"));
            }
        };

        let else_block = chain.into_iter().rev().fold(
            else_block,
            |else_block, (location, condition, then_block)| {
                let nested = IfStatement {
                    location: location.clone(),
                    condition,
                    then_block,
                    else_block,
                };
                Block::new(location, vec![Statement::If(nested)])
            },
        );

        Ok(IfStatement {
            location,
            condition,
            then_block,
            else_block,
        })
    }

    /// `<condition> then <block>`
    fn branch(&mut self) -> Result<(Expression, Block), ParseError> {
        let condition = self.expression()?;
        self.expect_keyword("then")?;
        let then_block = self.block()?;
        Ok((condition, then_block))
    }

    /// `call f(args)`；没有实参列表时视为无参调用
    fn call_statement(&mut self) -> Result<Statement, ParseError> {
        self.next()?;
        let location = self.peek()?.location.clone();
        let expression = match self.expression()? {
            call @ Expression::Call(_) => call,
            callee => Expression::call(location.clone(), callee, Vec::new()),
        };
        Ok(Statement::Expression(ExpressionStatement {
            location,
            expression,
        }))
    }

    /// 以变量开头的语句：赋值、下标/属性赋值或不带括号的过程调用
    fn assignment_or_sub_call(&mut self) -> Result<Statement, ParseError> {
        let (first, location) = self.expect_name("语句")?;
        let target = self.variable(first, location.clone())?;

        if self.peek_is_punct('=')? {
            let equals = self.next()?;
            let value = self.expression()?;
            return Ok(Statement::Assignment(Assignment {
                location: equals.location,
                target,
                value,
            }));
        }

        if !self.peek_is_punct('(')? {
            let args = self.args()?;
            return Ok(sub_call(location, target, args));
        }

        let open = self.next()?;
        let mut args = self.args()?;
        self.expect_punct(')')?;

        // `f(1) = 2`
        if self.peek_is_punct('=')? {
            let equals = self.next()?;
            let value = self.expression()?;
            return Ok(Statement::Assignment(Assignment {
                location: equals.location,
                target: Expression::call(location, target, args),
                value,
            }));
        }

        let token = self.peek()?.clone();
        if token.ends_statement() {
            return match args.len() {
                0 => Ok(sub_call(location, target, args)),
                // `f (1)`：括号只是包围了唯一的实参
                1 => {
                    let arg = parenthesize(open.location, args.remove(0));
                    Ok(sub_call(location, target, vec![arg]))
                }
                _ => Err(ParseError::ParenthesizedSubCall {
                    location: open.location,
                }),
            };
        }

        if args.len() != 1 {
            return Err(if token.is_punct(',') {
                ParseError::ParenthesizedSubCall {
                    location: open.location,
                }
            } else {
                unexpected(token, "语句结尾")
            });
        }

        // `f (1), 2` 或 `f (1) + 2, 3`：括号属于第一个实参
        let seed = parenthesize(open.location, args.remove(0));
        let first = if token.is_punct(',') {
            seed
        } else {
            self.expression_from(seed)?
        };
        let mut args = vec![first];
        if self.peek_is_punct(',')? {
            self.next()?;
            args.extend(self.args()?);
        }
        Ok(sub_call(location, target, args))
    }
}

fn parenthesize(location: Location, inner: Expression) -> Expression {
    Expression::parenthesis(location, inner)
}

fn sub_call(location: Location, callee: Expression, args: Vec<Expression>) -> Statement {
    Statement::Expression(ExpressionStatement {
        expression: Expression::call(location.clone(), callee, args),
        location,
    })
}
