//! # Runtime 模块
//!
//! 执行模型：作用域链、值与函数、解释器。
//!
//! ## 模块结构
//!
//! - [`value`]：值、共享格子、对象与 [`Func`] 能力
//! - [`ops`]：运算实现与类型转换
//! - [`context`]：作用域与声明提升
//! - [`function`]：脚本函数与宿主函数
//! - [`interpreter`]：AST 遍历执行
//! - [`host`]：宿主对象辅助
//! - [`engine`]：[`AspRuntime`] 与 [`Script`]

pub mod context;
pub mod engine;
pub mod function;
pub mod host;
pub mod interpreter;
pub mod ops;
pub mod value;

#[cfg(test)]
mod tests;

pub use context::Context;
pub use engine::{AspRuntime, Script};
pub use function::{InterpretedFunc, NativeCallback, NativeFunc};
pub use host::{OutputRecorder, response_object};
pub use interpreter::{Flow, Interpreter};
pub use value::{Func, Object, Slot, Value};
