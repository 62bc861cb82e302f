//! # 运算符表
//!
//! 运算符优先级以数据形式给出：[`PRECEDENCE`] 按优先级从低到高排列，
//! 每一组把符号或关键字映射到一个运算符。新增运算符或调整层级只需改表。

use serde::{Deserialize, Serialize};

use crate::runtime::ops::{self, BinaryFn, UnaryFn};

/// 二元运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Xor,
    Or,
    And,
    Eq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    Is,
    Concat,
    Add,
    Sub,
    Mod,
    IntDiv,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    /// 源码中的写法
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Xor => "xor",
            Self::Or => "or",
            Self::And => "and",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEq => "<=",
            Self::GreaterEq => ">=",
            Self::Is => "is",
            Self::Concat => "&",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mod => "mod",
            Self::IntDiv => "\\",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
        }
    }

    /// 运算实现
    pub fn combinator(self) -> BinaryFn {
        match self {
            Self::Xor => ops::xor,
            Self::Or => ops::or,
            Self::And => ops::and,
            Self::Eq => ops::equal,
            Self::NotEq => ops::not_equal,
            Self::Less => ops::less,
            Self::Greater => ops::greater,
            Self::LessEq => ops::less_equal,
            Self::GreaterEq => ops::greater_equal,
            Self::Is => ops::identical,
            Self::Concat => ops::concat,
            Self::Add => ops::add,
            Self::Sub => ops::subtract,
            Self::Mod => ops::modulo,
            Self::IntDiv => ops::integer_divide,
            Self::Mul => ops::multiply,
            Self::Div => ops::divide,
            Self::Pow => ops::power,
        }
    }
}

/// 一元运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `-`，只作用于紧随的因子
    Neg,
    /// `not`，作用于其后的整个表达式
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "not",
        }
    }

    pub fn combinator(self) -> UnaryFn {
        match self {
            Self::Neg => ops::negate,
            Self::Not => ops::not,
        }
    }
}

/// 同一优先级的一组运算符
#[derive(Debug)]
pub struct OperatorGroup {
    pub operators: &'static [(&'static str, BinaryOp)],
}

impl OperatorGroup {
    /// 按关键字查找（不区分大小写）
    pub fn keyword(&self, word: &str) -> Option<BinaryOp> {
        self.operators
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(word))
            .map(|(_, op)| *op)
    }

    /// 是否有以该字符开头的符号运算符
    pub fn starts_with(&self, symbol: char) -> bool {
        self.operators.iter().any(|(key, _)| key.starts_with(symbol))
    }

    /// 按符号精确查找
    pub fn symbol(&self, symbol: &str) -> Option<BinaryOp> {
        self.operators
            .iter()
            .find(|(key, _)| *key == symbol)
            .map(|(_, op)| *op)
    }
}

/// 优先级表（从低到高）
pub static PRECEDENCE: &[OperatorGroup] = &[
    OperatorGroup {
        operators: &[("xor", BinaryOp::Xor)],
    },
    OperatorGroup {
        operators: &[("or", BinaryOp::Or)],
    },
    OperatorGroup {
        operators: &[("and", BinaryOp::And)],
    },
    OperatorGroup {
        operators: &[
            ("=", BinaryOp::Eq),
            ("<>", BinaryOp::NotEq),
            ("<", BinaryOp::Less),
            (">", BinaryOp::Greater),
            ("<=", BinaryOp::LessEq),
            (">=", BinaryOp::GreaterEq),
            ("is", BinaryOp::Is),
        ],
    },
    OperatorGroup {
        operators: &[("&", BinaryOp::Concat)],
    },
    OperatorGroup {
        operators: &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)],
    },
    OperatorGroup {
        operators: &[("mod", BinaryOp::Mod)],
    },
    OperatorGroup {
        operators: &[("\\", BinaryOp::IntDiv)],
    },
    OperatorGroup {
        operators: &[("*", BinaryOp::Mul), ("/", BinaryOp::Div)],
    },
    OperatorGroup {
        operators: &[("^", BinaryOp::Pow)],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_operator_appears_once() {
        let mut seen = Vec::new();
        for group in PRECEDENCE {
            for (key, op) in group.operators {
                assert_eq!(op.symbol(), *key);
                assert!(!seen.contains(op), "{op:?} 重复出现");
                seen.push(*op);
            }
        }
        assert_eq!(seen.len(), 18);
    }

    #[test]
    fn test_group_lookup() {
        let comparison = &PRECEDENCE[3];
        assert_eq!(comparison.keyword("IS"), Some(BinaryOp::Is));
        assert!(comparison.starts_with('<'));
        assert_eq!(comparison.symbol("<>"), Some(BinaryOp::NotEq));
        assert_eq!(comparison.symbol("+"), None);
        assert!(!PRECEDENCE[0].starts_with('<'));
    }
}
