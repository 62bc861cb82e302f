//! # Engine 模块
//!
//! ASP Runtime 入口。
//!
//! ## 执行模型
//!
//! ```text
//! Script::parse(text) -> Script
//! AspRuntime::run(&script) -> Result<(), AspError>
//! ```
//!
//! 1. 宿主通过 `register` 向全局作用域注入对象与函数
//! 2. `run` 对脚本做声明提升，然后逐条执行
//! 3. 每次 `run` 使用新的执行预算；全局作用域在多次 `run` 之间保留

use std::rc::Rc;

use tracing::debug;

use crate::config::RuntimeConfig;
use crate::error::AspResult;
use crate::script::ast::Block;
use crate::script::{parse_expression, parse_script, parse_template};

use super::context::Context;
use super::function::NativeFunc;
use super::host::response_object;
use super::interpreter::Interpreter;
use super::value::{Func, Slot, Value};

/// 已解析的脚本
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    name: String,
    block: Block,
}

impl Script {
    /// 解析纯脚本（`.vbs` 风格，从代码模式开始）
    pub fn parse(name: &str, text: &str) -> AspResult<Self> {
        Ok(Self::from_block(name, parse_script(name, text)?))
    }

    /// 解析 ASP 模板（从模板模式开始，`<% %>` 之外的文本原样输出）
    pub fn parse_template(name: &str, text: &str) -> AspResult<Self> {
        Ok(Self::from_block(name, parse_template(name, text)?))
    }

    pub fn from_block(name: impl Into<String>, block: Block) -> Self {
        Self {
            name: name.into(),
            block,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn block(&self) -> &Block {
        &self.block
    }
}

/// ASP 执行引擎
///
/// # 使用示例
///
/// ```ignore
/// let mut runtime = AspRuntime::new(RuntimeConfig::default());
/// let output = OutputRecorder::new();
/// runtime.register_response(output.sink());
///
/// let script = Script::parse_template("index.asp", text)?;
/// runtime.run(&script)?;
/// println!("{}", output.text());
/// ```
pub struct AspRuntime {
    config: RuntimeConfig,
    globals: Rc<Context>,
}

impl AspRuntime {
    /// 创建引擎与空的全局作用域
    pub fn new(config: RuntimeConfig) -> Self {
        let globals = Context::global(config.explicit);
        Self { config, globals }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// 全局作用域
    pub fn globals(&self) -> &Rc<Context> {
        &self.globals
    }

    /// 向全局作用域注入一个值
    pub fn register(&mut self, name: &str, value: impl Into<Value>) -> Slot {
        self.globals.declare(name, value.into())
    }

    /// 注入宿主函数
    pub fn register_native(
        &mut self,
        name: &str,
        callback: impl Fn(&Context, &[Slot]) -> Result<Value, String> + 'static,
    ) -> Slot {
        let func: Rc<dyn Func> = Rc::new(NativeFunc::new(name, &self.globals, callback));
        self.register(name, Value::Func(func))
    }

    /// 注入 `response` 对象
    pub fn register_response(&mut self, sink: impl Fn(&Value) + 'static) -> Slot {
        let response = response_object(&self.globals, sink);
        self.register("response", response)
    }

    /// 提升并执行脚本
    pub fn run(&mut self, script: &Script) -> AspResult<()> {
        debug!(script = %script.name, "运行脚本");
        let mut interpreter = Interpreter::new(self.config.clone());
        interpreter.run(&script.block, &self.globals)?;
        Ok(())
    }

    /// 在全局作用域中求值一个表达式
    pub fn eval(&mut self, text: &str) -> AspResult<Value> {
        let expression = parse_expression("<eval>", text)?;
        let mut interpreter = Interpreter::new(self.config.clone());
        Ok(interpreter.eval(&expression, &self.globals)?)
    }
}

impl std::fmt::Debug for AspRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AspRuntime")
            .field("config", &self.config)
            .field("globals", &self.globals)
            .finish()
    }
}
