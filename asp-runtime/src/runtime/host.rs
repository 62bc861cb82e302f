//! # Host 模块
//!
//! 宿主注入对象的构建辅助。

use std::cell::RefCell;
use std::rc::Rc;

use super::context::Context;
use super::function::NativeFunc;
use super::value::{Func, Object, Value};

/// 构建 `response` 对象，其 `write` 方法把实参交给 `sink`
pub fn response_object(scope: &Rc<Context>, sink: impl Fn(&Value) + 'static) -> Rc<Object> {
    let write = NativeFunc::new("write", scope, move |_, args| match args {
        [value] => {
            sink(&value.get());
            Ok(Value::Empty)
        }
        _ => Err(format!("response.write 需要 1 个参数，实际传入 {} 个", args.len())),
    });
    let write: Rc<dyn Func> = Rc::new(write);
    Rc::new(Object::new("Response").with_field("write", Value::Func(write)))
}

/// 记录 `response.write` 的每一次输出
#[derive(Debug, Clone, Default)]
pub struct OutputRecorder {
    writes: Rc<RefCell<Vec<Value>>>,
}

impl OutputRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 作为 [`response_object`] 的 sink
    pub fn sink(&self) -> impl Fn(&Value) + 'static {
        let writes = Rc::clone(&self.writes);
        move |value| writes.borrow_mut().push(value.clone())
    }

    /// 按顺序记录的值
    pub fn writes(&self) -> Vec<Value> {
        self.writes.borrow().clone()
    }

    /// 所有输出拼接成的文本
    pub fn text(&self) -> String {
        self.writes.borrow().iter().map(ToString::to_string).collect()
    }

    pub fn clear(&self) {
        self.writes.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::runtime::interpreter::Interpreter;
    use crate::runtime::value::Slot;
    use crate::script::Location;

    #[test]
    fn test_response_write_records_values() {
        let global = Context::global(false);
        let output = OutputRecorder::new();
        let response = response_object(&global, output.sink());
        let Some(Value::Func(write)) = response.field("WRITE").map(|slot| slot.get()) else {
            panic!("response 缺少 write");
        };

        let mut interpreter = Interpreter::new(RuntimeConfig::default());
        let at = Location::new("test", 1, 1);
        write
            .call(&mut interpreter, vec![Slot::new(Value::from(5))], &at)
            .unwrap();
        write
            .call(&mut interpreter, vec![Slot::new(Value::from(" apples"))], &at)
            .unwrap();
        assert!(write.call(&mut interpreter, Vec::new(), &at).is_err());

        assert_eq!(output.writes(), vec![Value::from(5), Value::from(" apples")]);
        assert_eq!(output.text(), "5 apples");
        output.clear();
        assert!(output.writes().is_empty());
    }
}
