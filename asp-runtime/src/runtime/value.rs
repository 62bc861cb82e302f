//! # Value 模块
//!
//! 运行时值、共享存储格 [`Slot`]、对象记录 [`Object`] 与可调用能力 [`Func`]。
//!
//! ## 所有权
//!
//! - `Slot` 是 `Rc<RefCell<Value>>`：同一变量的所有引用共享一个格子，
//!   赋值原地修改，byref 参数直接传递格子
//! - 对象拥有自己的实例作用域；函数值只弱引用声明它的作用域，
//!   因此闭包被其定义作用域中的值捕获时不会形成强引用环

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::script::Location;

use super::context::Context;
use super::interpreter::Interpreter;

/// 标识符大小写折叠（VBScript 标识符不区分大小写）
pub(crate) fn fold_case(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// 运行时值
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// 未初始化
    #[default]
    Empty,
    /// 整数
    Integer(i64),
    /// 字符串
    String(String),
    /// 布尔值
    Boolean(bool),
    /// 对象引用
    Object(Rc<Object>),
    /// 函数引用
    Func(Rc<dyn Func>),
}

impl Value {
    /// 类型名（用于错误信息）
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Integer(_) => "Integer",
            Self::String(_) => "String",
            Self::Boolean(_) => "Boolean",
            Self::Object(_) => "Object",
            Self::Func(_) => "Function",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_object(&self) -> Option<&Rc<Object>> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<&Rc<dyn Func>> {
        match self {
            Self::Func(func) => Some(func),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::Func(a), Self::Func(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// 输出形式（`response.write` 写出的文本）
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Integer(n) => write!(f, "{}", n),
            Self::String(s) => f.write_str(s),
            Self::Boolean(true) => f.write_str("True"),
            Self::Boolean(false) => f.write_str("False"),
            Self::Object(object) => write!(f, "[object {}]", object.class_name()),
            Self::Func(func) => write!(f, "[function {}]", func.name()),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Rc<Object>> for Value {
    fn from(object: Rc<Object>) -> Self {
        Self::Object(object)
    }
}

/// 共享的可变存储格
#[derive(Debug, Clone, Default)]
pub struct Slot(Rc<RefCell<Value>>);

impl Slot {
    pub fn new(value: Value) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// 读取当前值（克隆）
    pub fn get(&self) -> Value {
        self.0.borrow().clone()
    }

    /// 原地写入
    pub fn set(&self, value: Value) {
        *self.0.borrow_mut() = value;
    }

    /// 两个格子是否是同一个
    pub fn ptr_eq(&self, other: &Slot) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// 对象记录
///
/// 宿主对象只有字段表；类实例还拥有自己的实例作用域，
/// 字段表与实例作用域共享同一批 [`Slot`]。
pub struct Object {
    class_name: String,
    fields: RefCell<HashMap<String, Slot>>,
    scope: Option<Rc<Context>>,
}

impl Object {
    /// 创建宿主对象
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            fields: RefCell::new(HashMap::new()),
            scope: None,
        }
    }

    /// 创建类实例
    pub(crate) fn instance(class_name: impl Into<String>, scope: Rc<Context>) -> Self {
        Self {
            class_name: class_name.into(),
            fields: RefCell::new(HashMap::new()),
            scope: Some(scope),
        }
    }

    /// 追加字段（构建宿主对象用）
    pub fn with_field(self, name: &str, value: impl Into<Value>) -> Self {
        self.define(name, value.into());
        self
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// 是否为脚本类的实例
    pub fn is_instance(&self) -> bool {
        self.scope.is_some()
    }

    /// 查找字段（不区分大小写）
    pub fn field(&self, name: &str) -> Option<Slot> {
        self.fields.borrow().get(&fold_case(name)).cloned()
    }

    /// 定义字段，返回新的存储格
    pub fn define(&self, name: &str, value: Value) -> Slot {
        let slot = Slot::new(value);
        self.insert(name, slot.clone());
        slot
    }

    pub(crate) fn insert(&self, name: &str, slot: Slot) {
        self.fields.borrow_mut().insert(fold_case(name), slot);
    }

    /// 字段名（已排序）
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.fields.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 只打印字段名，避免对象互相引用时无限递归
        f.debug_struct("Object")
            .field("class_name", &self.class_name)
            .field("fields", &self.field_names())
            .field("instance", &self.is_instance())
            .finish()
    }
}

/// 可调用能力：接收参数格子列表，返回结果格子
pub trait Func {
    /// 函数名（用于诊断）
    fn name(&self) -> &str;

    /// 调用
    ///
    /// `at` 为调用点位置，用于参数个数等错误。
    fn call(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Slot>,
        at: &Location,
    ) -> Result<Slot, RuntimeError>;
}

impl fmt::Debug for dyn Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Func({})", self.name())
    }
}
