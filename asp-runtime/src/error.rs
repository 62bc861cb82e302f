//! # Error 模块
//!
//! 定义 asp-runtime 中使用的错误类型。
//!
//! 语法错误与运行时错误都带源码位置，对外统一表现为
//! `{source_name, line, column, message}`。

use thiserror::Error;

use crate::script::Location;

/// 解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// 意外的符号
    #[error("{location}: 意外的符号 {found}，期望 {expected}")]
    UnexpectedToken {
        location: Location,
        found: String,
        expected: String,
    },

    /// 意外的输入结尾
    #[error("{location}: 意外的输入结尾，期望 {expected}")]
    UnexpectedEnd { location: Location, expected: String },

    /// 块结束关键字不匹配
    #[error("{location}: 'end {found}' 与 '{expected}' 不匹配")]
    MismatchedEnd {
        location: Location,
        expected: String,
        found: String,
    },

    /// 调用 Sub 时对多个参数使用了括号
    #[error("{location}: 调用 Sub 时不能用括号包围多个参数")]
    ParenthesizedSubCall { location: Location },

    /// 字符串字面量未闭合
    #[error("{location}: 字符串字面量未闭合")]
    UnterminatedString { location: Location },

    /// 整数字面量溢出
    #[error("{location}: 整数字面量 {literal} 超出范围")]
    IntegerOverflow { location: Location, literal: String },

    /// 表达式或语句块嵌套过深
    #[error("{location}: 嵌套层数超过上限 {limit}")]
    NestingTooDeep { location: Location, limit: usize },
}

impl ParseError {
    /// 出错位置
    pub fn location(&self) -> &Location {
        match self {
            Self::UnexpectedToken { location, .. }
            | Self::UnexpectedEnd { location, .. }
            | Self::MismatchedEnd { location, .. }
            | Self::ParenthesizedSubCall { location }
            | Self::UnterminatedString { location }
            | Self::IntegerOverflow { location, .. }
            | Self::NestingTooDeep { location, .. } => location,
        }
    }

    /// 不含位置前缀的消息
    pub fn message(&self) -> String {
        let full = self.to_string();
        let prefix = format!("{}: ", self.location());
        full.strip_prefix(&prefix).unwrap_or(&full).to_string()
    }
}

/// 运行时错误种类
///
/// 作用域、运算符和宿主函数产生的错误不知道源码位置，
/// 由解释器在对应节点上附加位置后变成 [`RuntimeError`]。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    /// 显式模式下变量未声明
    #[error("变量 '{name}' 未声明")]
    Undeclared { name: String },

    /// 闭包或方法所在的作用域已经释放
    #[error("外层作用域已释放")]
    ScopeDropped,

    /// 值不可调用
    #[error("'{name}' 不是函数或过程")]
    NotCallable { name: String },

    /// 参数个数不匹配
    #[error("'{name}' 需要 {expected} 个参数，实际传入 {actual} 个")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// 二元运算类型不匹配
    #[error("类型不匹配: '{op}' 不能作用于 {left} 和 {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    /// 一元运算或条件类型不匹配
    #[error("类型不匹配: '{op}' 不能作用于 {operand}")]
    UnaryTypeMismatch {
        op: &'static str,
        operand: &'static str,
    },

    /// 除数为零
    #[error("除数为零")]
    DivisionByZero,

    /// 整数溢出
    #[error("整数溢出")]
    Overflow,

    /// 成员访问的目标不是对象
    #[error("'{name}' 不是对象")]
    NotAnObject { name: String },

    /// 对象没有该成员
    #[error("对象不支持属性或方法 '{member}'")]
    UnknownMember { member: String },

    /// 类未定义
    #[error("未定义的类 '{name}'")]
    UnknownClass { name: String },

    /// 赋值目标无效
    #[error("无效的赋值目标")]
    InvalidAssignmentTarget,

    /// 超出调用深度
    #[error("超出最大调用深度 {limit}")]
    CallDepthExceeded { limit: usize },

    /// 超出执行步数
    #[error("超出执行步数上限 {limit}")]
    StepLimitExceeded { limit: u64 },

    /// 宿主函数报告的错误
    #[error("{message}")]
    Host { message: String },
}

impl RuntimeErrorKind {
    /// 附加源码位置
    pub fn at(self, location: &Location) -> RuntimeError {
        RuntimeError {
            location: location.clone(),
            kind: self,
        }
    }
}

/// 带位置的运行时错误
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{location}: {kind}")]
pub struct RuntimeError {
    pub location: Location,
    pub kind: RuntimeErrorKind,
}

/// asp-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AspError {
    /// 解析错误
    #[error("语法错误: {0}")]
    Parse(#[from] ParseError),

    /// 运行时错误
    #[error("运行时错误: {0}")]
    Runtime(#[from] RuntimeError),
}

impl AspError {
    /// 出错位置
    pub fn location(&self) -> &Location {
        match self {
            Self::Parse(e) => e.location(),
            Self::Runtime(e) => &e.location,
        }
    }

    /// 不含位置前缀的消息
    pub fn message(&self) -> String {
        match self {
            Self::Parse(e) => e.message(),
            Self::Runtime(e) => e.kind.to_string(),
        }
    }
}

/// Result 类型别名
pub type AspResult<T> = Result<T, AspError>;
