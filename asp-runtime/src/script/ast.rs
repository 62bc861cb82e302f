//! # AST 模块
//!
//! 语句与表达式的封闭和类型，每个节点都带引入它的词法单元的位置。
//!
//! 二元/一元运算节点在解析时就捕获了运算实现（`combine`），
//! 解释器直接调用它而不按符号重新分派。序列化时只写出运算符，
//! 反序列化时由运算符重建实现。

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::operators::{BinaryOp, UnaryOp};
use super::source::Location;
use crate::runtime::ops::{BinaryFn, UnaryFn};
use crate::runtime::value::Value;

/// 语句块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub location: Location,
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(location: Location, statements: Vec<Statement>) -> Self {
        Self {
            location,
            statements,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// 语句
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `function` / `sub` 声明
    Function(Rc<FunctionDecl>),
    /// `class` 声明
    Class(Rc<ClassDecl>),
    /// `dim` 声明
    Dim(Dim),
    /// 赋值（目标可以是变量或调用）
    Assignment(Assignment),
    /// 条件
    If(IfStatement),
    /// 不带括号的过程调用等表达式语句
    Expression(ExpressionStatement),
    /// `option explicit`
    OptionExplicit { location: Location },
    /// `exit function` / `exit sub`
    Exit { location: Location, kind: FunctionKind },
}

impl Statement {
    pub fn location(&self) -> &Location {
        match self {
            Self::Function(decl) => &decl.location,
            Self::Class(decl) => &decl.location,
            Self::Dim(dim) => &dim.location,
            Self::Assignment(assignment) => &assignment.location,
            Self::If(statement) => &statement.location,
            Self::Expression(statement) => &statement.location,
            Self::OptionExplicit { location } | Self::Exit { location, .. } => location,
        }
    }
}

/// 函数种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionKind {
    /// 有返回值
    Function,
    /// 无返回值
    Sub,
}

impl FunctionKind {
    /// 对应的关键字
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Sub => "sub",
        }
    }
}

/// 形参
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub location: Location,
    pub name: String,
    /// 显式的 `byref`（true）/ `byval`（false）；未写时由运行时决定
    pub by_ref: Option<bool>,
}

/// 函数声明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub location: Location,
    pub kind: FunctionKind,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
}

/// 类声明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub location: Location,
    pub name: String,
    pub fields: Vec<Dim>,
    pub methods: Vec<Rc<FunctionDecl>>,
}

/// 变量声明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dim {
    pub location: Location,
    pub name: String,
}

/// 赋值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub location: Location,
    pub target: Expression,
    pub value: Expression,
}

/// 条件语句；`elseif` 链表示为 else 块中嵌套的 `If`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStatement {
    pub location: Location,
    pub condition: Expression,
    pub then_block: Block,
    pub else_block: Block,
}

/// 表达式语句
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionStatement {
    pub location: Location,
    pub expression: Expression,
}

/// 表达式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Literal(Literal),
    Variable(Variable),
    Binary(BinaryOperator),
    Unary(UnaryOperator),
    Call(Call),
    New(New),
    Parenthesis(Parenthesis),
}

impl Expression {
    pub fn location(&self) -> &Location {
        match self {
            Self::Literal(node) => &node.location,
            Self::Variable(node) => &node.location,
            Self::Binary(node) => &node.location,
            Self::Unary(node) => &node.location,
            Self::Call(node) => &node.location,
            Self::New(node) => &node.location,
            Self::Parenthesis(node) => &node.location,
        }
    }

    /// 创建字面量
    pub fn literal(location: Location, value: LiteralValue) -> Self {
        Self::Literal(Literal { location, value })
    }

    /// 创建变量引用
    pub fn variable(location: Location, path: Vec<String>) -> Self {
        Self::Variable(Variable { location, path })
    }

    /// 创建二元运算，运算实现从运算符表捕获
    pub fn binary(location: Location, op: BinaryOp, left: Expression, right: Expression) -> Self {
        Self::Binary(BinaryOperator {
            location,
            op,
            combine: op.combinator(),
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// 创建一元运算
    pub fn unary(location: Location, op: UnaryOp, operand: Expression) -> Self {
        Self::Unary(UnaryOperator {
            location,
            op,
            combine: op.combinator(),
            operand: Box::new(operand),
        })
    }

    /// 创建调用
    pub fn call(location: Location, callee: Expression, args: Vec<Expression>) -> Self {
        Self::Call(Call {
            location,
            callee: Box::new(callee),
            args,
        })
    }

    /// 创建括号
    pub fn parenthesis(location: Location, inner: Expression) -> Self {
        Self::Parenthesis(Parenthesis {
            location,
            inner: Box::new(inner),
        })
    }
}

/// 字面量值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Integer(i64),
    String(String),
    Boolean(bool),
}

impl LiteralValue {
    pub fn to_value(&self) -> Value {
        match self {
            Self::Integer(n) => Value::Integer(*n),
            Self::String(s) => Value::String(s.clone()),
            Self::Boolean(b) => Value::Boolean(*b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub location: Location,
    pub value: LiteralValue,
}

/// 变量引用，`path` 为点号分隔的各段（至少一段）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub location: Location,
    pub path: Vec<String>,
}

impl Variable {
    /// 点号连接的完整名字
    pub fn dotted(&self) -> String {
        self.path.join(".")
    }
}

/// 二元运算
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "BinaryRepr", into = "BinaryRepr")]
pub struct BinaryOperator {
    pub location: Location,
    pub op: BinaryOp,
    pub combine: BinaryFn,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

// combine 由 op 决定，不参与比较
impl PartialEq for BinaryOperator {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location
            && self.op == other.op
            && self.left == other.left
            && self.right == other.right
    }
}

#[derive(Serialize, Deserialize)]
struct BinaryRepr {
    location: Location,
    op: BinaryOp,
    left: Box<Expression>,
    right: Box<Expression>,
}

impl From<BinaryRepr> for BinaryOperator {
    fn from(repr: BinaryRepr) -> Self {
        Self {
            location: repr.location,
            op: repr.op,
            combine: repr.op.combinator(),
            left: repr.left,
            right: repr.right,
        }
    }
}

impl From<BinaryOperator> for BinaryRepr {
    fn from(node: BinaryOperator) -> Self {
        Self {
            location: node.location,
            op: node.op,
            left: node.left,
            right: node.right,
        }
    }
}

/// 一元运算
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "UnaryRepr", into = "UnaryRepr")]
pub struct UnaryOperator {
    pub location: Location,
    pub op: UnaryOp,
    pub combine: UnaryFn,
    pub operand: Box<Expression>,
}

impl PartialEq for UnaryOperator {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location && self.op == other.op && self.operand == other.operand
    }
}

#[derive(Serialize, Deserialize)]
struct UnaryRepr {
    location: Location,
    op: UnaryOp,
    operand: Box<Expression>,
}

impl From<UnaryRepr> for UnaryOperator {
    fn from(repr: UnaryRepr) -> Self {
        Self {
            location: repr.location,
            op: repr.op,
            combine: repr.op.combinator(),
            operand: repr.operand,
        }
    }
}

impl From<UnaryOperator> for UnaryRepr {
    fn from(node: UnaryOperator) -> Self {
        Self {
            location: node.location,
            op: node.op,
            operand: node.operand,
        }
    }
}

/// 调用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub location: Location,
    pub callee: Box<Expression>,
    pub args: Vec<Expression>,
}

/// `new ClassName`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct New {
    pub location: Location,
    pub class_name: String,
}

/// 括号；作为实参时强制按值传递
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parenthesis {
    pub location: Location,
    pub inner: Box<Expression>,
}
