//! # Function 模块
//!
//! [`Func`] 的两种实现：脚本中声明的 [`InterpretedFunc`] 与宿主提供的 [`NativeFunc`]。
//!
//! 两者都只弱引用声明它们的作用域。

use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::script::Location;
use crate::script::ast::FunctionDecl;

use super::context::Context;
use super::interpreter::Interpreter;
use super::value::{Func, Slot, Value};

/// 脚本函数（闭包）
pub struct InterpretedFunc {
    decl: Rc<FunctionDecl>,
    scope: Weak<Context>,
}

impl InterpretedFunc {
    pub fn new(decl: Rc<FunctionDecl>, scope: &Rc<Context>) -> Self {
        Self {
            decl,
            scope: Rc::downgrade(scope),
        }
    }

    pub fn decl(&self) -> &FunctionDecl {
        &self.decl
    }
}

impl Func for InterpretedFunc {
    fn name(&self) -> &str {
        &self.decl.name
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Slot>,
        at: &Location,
    ) -> Result<Slot, RuntimeError> {
        let scope = self
            .scope
            .upgrade()
            .ok_or_else(|| RuntimeErrorKind::ScopeDropped.at(at))?;
        if args.len() != self.decl.params.len() {
            return Err(RuntimeErrorKind::ArityMismatch {
                name: self.decl.name.clone(),
                expected: self.decl.params.len(),
                actual: args.len(),
            }
            .at(at));
        }
        interpreter.invoke(&self.decl, &scope, args, at)
    }
}

impl fmt::Debug for InterpretedFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpretedFunc")
            .field("name", &self.decl.name)
            .field("params", &self.decl.params.len())
            .finish()
    }
}

/// 宿主回调：接收声明作用域与实参格子，返回结果或错误消息
pub type NativeCallback = dyn Fn(&Context, &[Slot]) -> Result<Value, String>;

/// 宿主函数
pub struct NativeFunc {
    name: String,
    callback: Rc<NativeCallback>,
    scope: Weak<Context>,
}

impl NativeFunc {
    pub fn new(
        name: impl Into<String>,
        scope: &Rc<Context>,
        callback: impl Fn(&Context, &[Slot]) -> Result<Value, String> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            callback: Rc::new(callback),
            scope: Rc::downgrade(scope),
        }
    }
}

impl Func for NativeFunc {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        args: Vec<Slot>,
        at: &Location,
    ) -> Result<Slot, RuntimeError> {
        let scope = self
            .scope
            .upgrade()
            .ok_or_else(|| RuntimeErrorKind::ScopeDropped.at(at))?;
        (self.callback)(&scope, &args)
            .map(Slot::new)
            .map_err(|message| RuntimeErrorKind::Host { message }.at(at))
    }
}

impl fmt::Debug for NativeFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunc").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;

    fn at() -> Location {
        Location::new("test", 1, 1)
    }

    #[test]
    fn test_native_func_receives_slots() {
        let global = Context::global(false);
        let double = NativeFunc::new("double", &global, |_, args| match args {
            [arg] => match arg.get() {
                Value::Integer(n) => Ok(Value::Integer(n * 2)),
                other => Err(format!("需要整数，得到 {}", other.type_name())),
            },
            _ => Err("需要 1 个参数".to_string()),
        });
        let mut interpreter = Interpreter::new(RuntimeConfig::default());

        let result = double
            .call(&mut interpreter, vec![Slot::new(Value::from(21))], &at())
            .unwrap();
        assert_eq!(result.get(), Value::from(42));

        let error = double
            .call(&mut interpreter, vec![Slot::new(Value::from("x"))], &at())
            .unwrap_err();
        assert_eq!(
            error.kind,
            RuntimeErrorKind::Host {
                message: "需要整数，得到 String".to_string()
            }
        );
    }

    #[test]
    fn test_native_func_after_scope_dropped() {
        let global = Context::global(false);
        let noop = NativeFunc::new("noop", &global, |_, _| Ok(Value::Empty));
        drop(global);
        let mut interpreter = Interpreter::new(RuntimeConfig::default());
        let error = noop.call(&mut interpreter, Vec::new(), &at()).unwrap_err();
        assert_eq!(error.kind, RuntimeErrorKind::ScopeDropped);
    }
}
