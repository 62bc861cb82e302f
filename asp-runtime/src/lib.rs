//! # ASP Runtime
//!
//! ASP / VBScript 风格脚本的前端与树遍历求值器。
//!
//! ## 架构概述
//!
//! `asp-runtime` 是纯逻辑核心，不做任何 IO。宿主向全局作用域注入对象
//! （例如 `response`），脚本的输出全部经由这些对象回到宿主：
//!
//! ```text
//! 源码 ──► Lexer ──► TokenStream ──► Parser ──► Block (AST)
//!                                                  │
//! Host                         Runtime             ▼
//!   │── register(name, value) ──►│  hoist(global Context)
//!   │                            │  execute
//!   │◄── response.write(value) ──│
//! ```
//!
//! ## 核心类型
//!
//! - [`Script`]：已解析的脚本
//! - [`AspRuntime`]：全局作用域与执行入口
//! - [`Context`]：词法作用域
//! - [`Value`] / [`Slot`]：运行时值与共享存储格
//! - [`Func`]：可调用能力（[`InterpretedFunc`] / [`NativeFunc`]）
//!
//! ## 使用示例
//!
//! ```ignore
//! use asp_runtime::{AspRuntime, OutputRecorder, RuntimeConfig, Script};
//!
//! let mut runtime = AspRuntime::new(RuntimeConfig::default());
//! let output = OutputRecorder::new();
//! runtime.register_response(output.sink());
//!
//! runtime.run(&Script::parse_template("index.asp", "<b><%= 1 + 2 %></b>")?)?;
//! assert_eq!(output.text(), "<b>3</b>");
//! ```
//!
//! ## 模块结构
//!
//! - [`script`]：词法分析、AST、解析器与打印
//! - [`runtime`]：作用域、值、解释器与引擎
//! - [`config`]：运行时配置
//! - [`diagnostic`]：静态检查
//! - [`error`]：错误类型定义

pub mod config;
pub mod diagnostic;
pub mod error;
pub mod runtime;
pub mod script;

// 重导出核心类型
pub use config::{ConfigError, RuntimeConfig};
pub use diagnostic::{Diagnostic, DiagnosticLevel, DiagnosticResult, analyze_script};
pub use error::{AspError, AspResult, ParseError, RuntimeError, RuntimeErrorKind};
pub use runtime::{
    AspRuntime, Context, Func, InterpretedFunc, Interpreter, NativeFunc, Object, OutputRecorder,
    Script, Slot, Value, response_object,
};
pub use script::{Block, Expression, LexMode, Location, Parser, Statement, StrSource};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let mut runtime = AspRuntime::new(RuntimeConfig::default());
        let output = OutputRecorder::new();
        runtime.register_response(output.sink());

        let script = Script::parse_template("index.asp", "<b><%= 1 + 2 %></b>").unwrap();
        runtime.run(&script).unwrap();
        assert_eq!(output.text(), "<b>3</b>");
        assert!(analyze_script(&script).is_empty());
    }
}
