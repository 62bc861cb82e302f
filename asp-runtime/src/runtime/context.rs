//! # Context 模块
//!
//! 词法作用域：父链接的、不区分大小写的名字 → [`Slot`] 映射，
//! 以及声明提升和返回值格子。
//!
//! ## 所有权
//!
//! Context 由创建它的一方持有（顶层由 [`AspRuntime`](crate::AspRuntime)，
//! 函数调用由调用帧，类实例由对象本身）；对父作用域只持有弱引用。
//! 父作用域已释放时，沿链查找报告 [`RuntimeErrorKind::ScopeDropped`]。

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::error::RuntimeErrorKind;
use crate::script::ast::{Block, ClassDecl, Statement};

use super::function::InterpretedFunc;
use super::value::{Func, Object, Slot, Value, fold_case};

/// 词法作用域
pub struct Context {
    parent: Option<Weak<Context>>,
    bindings: RefCell<HashMap<String, Slot>>,
    classes: RefCell<HashMap<String, Rc<ClassDecl>>>,
    explicit: Cell<bool>,
    return_slot: Slot,
    /// 以 `function` 声明的活动作用域里，函数名指向返回值格子
    function_name: Option<String>,
    /// 类实例作用域的所属对象，用于解析 `me`
    owner: RefCell<Weak<Object>>,
}

impl Context {
    fn with_parent(parent: Option<&Rc<Context>>, function_name: Option<&str>) -> Self {
        Self {
            parent: parent.map(Rc::downgrade),
            bindings: RefCell::new(HashMap::new()),
            classes: RefCell::new(HashMap::new()),
            explicit: Cell::new(parent.is_some_and(|p| p.is_explicit())),
            return_slot: Slot::default(),
            function_name: function_name.map(fold_case),
            owner: RefCell::new(Weak::new()),
        }
    }

    /// 创建顶层作用域
    pub fn global(explicit: bool) -> Rc<Self> {
        let context = Self::with_parent(None, None);
        context.explicit.set(explicit);
        Rc::new(context)
    }

    /// 创建子作用域，继承显式模式
    pub fn child(parent: &Rc<Context>) -> Rc<Self> {
        Rc::new(Self::with_parent(Some(parent), None))
    }

    /// 创建函数调用的活动作用域
    ///
    /// `function_name` 只对 `function` 传入；`sub` 没有返回值。
    pub(crate) fn activation(parent: &Rc<Context>, function_name: Option<&str>) -> Rc<Self> {
        Rc::new(Self::with_parent(Some(parent), function_name))
    }

    /// 父作用域
    pub fn parent(&self) -> Result<Option<Rc<Context>>, RuntimeErrorKind> {
        match &self.parent {
            None => Ok(None),
            Some(parent) => parent
                .upgrade()
                .map(Some)
                .ok_or(RuntimeErrorKind::ScopeDropped),
        }
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit.get()
    }

    pub fn set_explicit(&self, explicit: bool) {
        self.explicit.set(explicit);
    }

    /// 返回值格子
    pub fn return_slot(&self) -> Slot {
        self.return_slot.clone()
    }

    pub(crate) fn set_owner(&self, owner: &Rc<Object>) {
        *self.owner.borrow_mut() = Rc::downgrade(owner);
    }

    /// 在当前作用域声明变量（覆盖同名的本地绑定），返回新的格子
    pub fn declare(&self, name: &str, value: Value) -> Slot {
        let slot = Slot::new(value);
        self.bind(name, slot.clone());
        slot
    }

    /// 把已有格子绑定到当前作用域（byref 参数、宿主注入）
    pub fn bind(&self, name: &str, slot: Slot) {
        self.bindings.borrow_mut().insert(fold_case(name), slot);
    }

    /// 当前作用域的本地绑定
    pub fn local(&self, name: &str) -> Option<Slot> {
        self.bindings.borrow().get(&fold_case(name)).cloned()
    }

    /// 沿作用域链查找，不做隐式声明
    pub fn lookup(&self, name: &str) -> Result<Option<Slot>, RuntimeErrorKind> {
        self.find(&fold_case(name), true)
    }

    /// 查找作为被调用者的名字
    ///
    /// 与 [`lookup`](Self::lookup) 的区别是跳过函数名对应的返回值格子，
    /// 因此函数体内以自身名字调用时是递归调用。
    pub fn lookup_callee(&self, name: &str) -> Result<Option<Slot>, RuntimeErrorKind> {
        self.find(&fold_case(name), false)
    }

    fn find(&self, key: &str, return_slots: bool) -> Result<Option<Slot>, RuntimeErrorKind> {
        if let Some(slot) = self.bindings.borrow().get(key) {
            return Ok(Some(slot.clone()));
        }
        if return_slots && self.function_name.as_deref() == Some(key) {
            return Ok(Some(self.return_slot()));
        }
        if key == "me" {
            if let Some(owner) = self.owner.borrow().upgrade() {
                return Ok(Some(Slot::new(Value::Object(owner))));
            }
        }
        match self.parent()? {
            Some(parent) => parent.find(key, return_slots),
            None => Ok(None),
        }
    }

    /// 解析变量
    ///
    /// 找不到时：显式模式下报告未声明，否则在当前作用域隐式声明为 `Empty`。
    pub fn resolve(&self, name: &str) -> Result<Slot, RuntimeErrorKind> {
        if let Some(slot) = self.lookup(name)? {
            return Ok(slot);
        }
        if self.is_explicit() {
            return Err(RuntimeErrorKind::Undeclared {
                name: name.to_string(),
            });
        }
        trace!(name, "隐式声明变量");
        Ok(self.declare(name, Value::Empty))
    }

    /// 赋值（必要时隐式声明）
    pub fn set(&self, name: &str, value: Value) -> Result<(), RuntimeErrorKind> {
        self.resolve(name)?.set(value);
        Ok(())
    }

    /// 注册类声明
    pub fn declare_class(&self, decl: Rc<ClassDecl>) {
        self.classes.borrow_mut().insert(fold_case(&decl.name), decl);
    }

    /// 沿作用域链查找类，返回类声明与声明它的作用域
    pub fn resolve_class(
        self: &Rc<Self>,
        name: &str,
    ) -> Result<Option<(Rc<ClassDecl>, Rc<Context>)>, RuntimeErrorKind> {
        let key = fold_case(name);
        let mut current = Rc::clone(self);
        loop {
            if let Some(decl) = current.classes.borrow().get(&key) {
                return Ok(Some((Rc::clone(decl), Rc::clone(&current))));
            }
            match current.parent()? {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
    }

    /// 声明提升
    ///
    /// 按源码顺序处理块中的直接语句，并进入 `if` / `else` 分支（它们与当前块共享作用域），
    /// 但不进入函数体和类体：
    ///
    /// - `dim`：本地尚未绑定时声明为 `Empty`，已有绑定保持不变
    /// - `function` / `sub`：以新格子绑定闭包当前作用域的函数值，同名时后者覆盖前者
    /// - `class`：注册类声明，同名时后者覆盖前者
    /// - `option explicit`：打开显式模式
    pub fn hoist(self: &Rc<Self>, block: &Block) {
        for statement in &block.statements {
            match statement {
                Statement::Dim(dim) => {
                    if self.local(&dim.name).is_none() {
                        self.declare(&dim.name, Value::Empty);
                    }
                }
                Statement::Function(decl) => {
                    // 新建格子：同名的 byref 形参属于调用者，不能写穿
                    let func: Rc<dyn Func> = Rc::new(InterpretedFunc::new(Rc::clone(decl), self));
                    self.declare(&decl.name, Value::Func(func));
                    trace!(name = %decl.name, "提升函数");
                }
                Statement::Class(decl) => self.declare_class(Rc::clone(decl)),
                Statement::OptionExplicit { .. } => self.set_explicit(true),
                Statement::If(statement) => {
                    self.hoist(&statement.then_block);
                    self.hoist(&statement.else_block);
                }
                Statement::Assignment(_) | Statement::Expression(_) | Statement::Exit { .. } => {}
            }
        }
    }

    /// 本地绑定名（已排序）
    pub fn binding_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bindings.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("bindings", &self.binding_names())
            .field("explicit", &self.is_explicit())
            .field("function_name", &self.function_name)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}
