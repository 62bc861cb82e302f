//! # 运算模块
//!
//! 运算符的值到值实现与类型转换规则。
//!
//! ## 转换规则
//!
//! - 数值运算：`Empty` → 0，`Boolean` → -1 / 0，可解析为整数的 `String` → 整数
//! - `+` 两侧都是 `String` 时为字符串拼接
//! - `&` 把两侧转换为文本（`Empty` → `""`，布尔 → `True` / `False`）
//! - 比较：两侧都是字符串按字符串比较（`Empty` 视为 `""`）；
//!   两侧都是数值类按数值比较；数值与非空字符串比较时数值总是更小
//! - 对象与函数只能用 `is` 比较同一性
//! - `/` 与 `\` 都是向零截断的整数除法

use std::cmp::Ordering;

use crate::error::RuntimeErrorKind;

use super::value::Value;

/// 二元运算函数
pub type BinaryFn = fn(&Value, &Value) -> Result<Value, RuntimeErrorKind>;

/// 一元运算函数
pub type UnaryFn = fn(&Value) -> Result<Value, RuntimeErrorKind>;

fn to_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Empty => Some(0),
        Value::Integer(n) => Some(*n),
        Value::Boolean(true) => Some(-1),
        Value::Boolean(false) => Some(0),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(_) | Value::Func(_) => None,
    }
}

fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(_) | Value::Func(_) => None,
        other => Some(other.to_string()),
    }
}

fn mismatch(op: &'static str, left: &Value, right: &Value) -> RuntimeErrorKind {
    RuntimeErrorKind::TypeMismatch {
        op,
        left: left.type_name(),
        right: right.type_name(),
    }
}

fn integers(op: &'static str, left: &Value, right: &Value) -> Result<(i64, i64), RuntimeErrorKind> {
    match (to_integer(left), to_integer(right)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(mismatch(op, left, right)),
    }
}

fn checked(result: Option<i64>) -> Result<Value, RuntimeErrorKind> {
    result.map(Value::Integer).ok_or(RuntimeErrorKind::Overflow)
}

pub fn add(left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return Ok(Value::String(format!("{a}{b}")));
    }
    let (a, b) = integers("+", left, right)?;
    checked(a.checked_add(b))
}

pub fn subtract(left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    let (a, b) = integers("-", left, right)?;
    checked(a.checked_sub(b))
}

pub fn multiply(left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    let (a, b) = integers("*", left, right)?;
    checked(a.checked_mul(b))
}

fn quotient(op: &'static str, left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    let (a, b) = integers(op, left, right)?;
    if b == 0 {
        return Err(RuntimeErrorKind::DivisionByZero);
    }
    checked(a.checked_div(b))
}

pub fn divide(left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    quotient("/", left, right)
}

pub fn integer_divide(left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    quotient("\\", left, right)
}

pub fn modulo(left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    let (a, b) = integers("mod", left, right)?;
    if b == 0 {
        return Err(RuntimeErrorKind::DivisionByZero);
    }
    checked(a.checked_rem(b))
}

/// 整数幂；负指数按向零截断取整
pub fn power(left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    let (base, exponent) = integers("^", left, right)?;
    if exponent >= 0 {
        let exponent = u32::try_from(exponent).map_err(|_| RuntimeErrorKind::Overflow)?;
        return checked(base.checked_pow(exponent));
    }
    match base {
        0 => Err(RuntimeErrorKind::DivisionByZero),
        1 => Ok(Value::Integer(1)),
        -1 if exponent % 2 == 0 => Ok(Value::Integer(1)),
        -1 => Ok(Value::Integer(-1)),
        _ => Ok(Value::Integer(0)),
    }
}

pub fn concat(left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    match (to_text(left), to_text(right)) {
        (Some(a), Some(b)) => Ok(Value::String(a + &b)),
        _ => Err(mismatch("&", left, right)),
    }
}

fn compare(op: &'static str, left: &Value, right: &Value) -> Result<Ordering, RuntimeErrorKind> {
    match (left, right) {
        (Value::Object(_) | Value::Func(_), _) | (_, Value::Object(_) | Value::Func(_)) => {
            Err(mismatch(op, left, right))
        }
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        (Value::String(a), Value::Empty) => Ok(a.as_str().cmp("")),
        (Value::Empty, Value::String(b)) => Ok("".cmp(b.as_str())),
        (Value::String(_), _) => Ok(Ordering::Greater),
        (_, Value::String(_)) => Ok(Ordering::Less),
        _ => {
            let (a, b) = integers(op, left, right)?;
            Ok(a.cmp(&b))
        }
    }
}

pub fn equal(left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    Ok(Value::Boolean(compare("=", left, right)?.is_eq()))
}

pub fn not_equal(left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    Ok(Value::Boolean(compare("<>", left, right)?.is_ne()))
}

pub fn less(left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    Ok(Value::Boolean(compare("<", left, right)?.is_lt()))
}

pub fn greater(left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    Ok(Value::Boolean(compare(">", left, right)?.is_gt()))
}

pub fn less_equal(left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    Ok(Value::Boolean(compare("<=", left, right)?.is_le()))
}

pub fn greater_equal(left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    Ok(Value::Boolean(compare(">=", left, right)?.is_ge()))
}

/// 对象同一性
pub fn identical(left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    match (left, right) {
        (Value::Object(_), Value::Object(_))
        | (Value::Func(_), Value::Func(_))
        | (Value::Empty, Value::Empty) => Ok(Value::Boolean(left == right)),
        (Value::Object(_) | Value::Func(_), Value::Empty)
        | (Value::Empty, Value::Object(_) | Value::Func(_)) => Ok(Value::Boolean(false)),
        _ => Err(mismatch("is", left, right)),
    }
}

fn logical(
    op: &'static str,
    left: &Value,
    right: &Value,
    apply: fn(i64, i64) -> i64,
) -> Result<Value, RuntimeErrorKind> {
    if let (Value::Boolean(a), Value::Boolean(b)) = (left, right) {
        let a = if *a { -1 } else { 0 };
        let b = if *b { -1 } else { 0 };
        return Ok(Value::Boolean(apply(a, b) != 0));
    }
    let (a, b) = integers(op, left, right)?;
    Ok(Value::Integer(apply(a, b)))
}

pub fn and(left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    logical("and", left, right, |a, b| a & b)
}

pub fn or(left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    logical("or", left, right, |a, b| a | b)
}

pub fn xor(left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    logical("xor", left, right, |a, b| a ^ b)
}

pub fn negate(operand: &Value) -> Result<Value, RuntimeErrorKind> {
    let n = to_integer(operand).ok_or(RuntimeErrorKind::UnaryTypeMismatch {
        op: "-",
        operand: operand.type_name(),
    })?;
    checked(n.checked_neg())
}

pub fn not(operand: &Value) -> Result<Value, RuntimeErrorKind> {
    match operand {
        Value::Boolean(b) => Ok(Value::Boolean(!b)),
        other => to_integer(other)
            .map(|n| Value::Integer(!n))
            .ok_or(RuntimeErrorKind::UnaryTypeMismatch {
                op: "not",
                operand: other.type_name(),
            }),
    }
}

/// 条件判断的真值
pub fn truthy(value: &Value) -> Result<bool, RuntimeErrorKind> {
    let error = || RuntimeErrorKind::UnaryTypeMismatch {
        op: "if",
        operand: value.type_name(),
    };
    match value {
        Value::Boolean(b) => Ok(*b),
        Value::Integer(n) => Ok(*n != 0),
        Value::Empty => Ok(false),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
        Value::String(_) => to_integer(value).map(|n| n != 0).ok_or_else(error),
        Value::Object(_) | Value::Func(_) => Err(error()),
    }
}
