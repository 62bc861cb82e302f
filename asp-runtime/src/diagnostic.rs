//! # 诊断模块
//!
//! 提供脚本静态检查和诊断 API，不依赖 IO 或执行引擎。
//!
//! ## 设计原则
//!
//! - 纯函数 API，可在无 IO 环境下运行
//! - 诊断分级：Error（必须修复）、Warn（建议修复）、Info（信息提示）
//! - 复用 parser/AST，不重复解析逻辑

use std::collections::HashMap;

use crate::error::AspError;
use crate::runtime::Script;
use crate::script::Location;
use crate::script::ast::{Block, FunctionKind, Statement};

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    /// 源名称（通常是文件路径）
    pub source_name: String,
    /// 行号，从 1 开始
    pub line: usize,
    /// 列号，从 1 开始
    pub column: usize,
    pub message: String,
}

impl Diagnostic {
    fn new(level: DiagnosticLevel, location: &Location, message: impl Into<String>) -> Self {
        Self {
            level,
            source_name: location.source_name.to_string(),
            line: location.line,
            column: location.column,
            message: message.into(),
        }
    }

    /// 创建错误诊断
    pub fn error(location: &Location, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, location, message)
    }

    /// 创建警告诊断
    pub fn warn(location: &Location, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warn, location, message)
    }

    /// 创建信息诊断
    pub fn info(location: &Location, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Info, location, message)
    }
}

impl From<&AspError> for Diagnostic {
    fn from(error: &AspError) -> Self {
        Self::error(error.location(), error.message())
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}:{}:{}: {}",
            self.level, self.source_name, self.line, self.column, self.message
        )
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    /// 诊断条目列表
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    /// 创建空结果
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加诊断
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// 获取错误数量
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .count()
    }

    /// 获取警告数量
    pub fn warn_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Warn)
            .count()
    }

    /// 是否有错误
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// 按级别过滤
    pub fn filter_by_level(&self, min_level: DiagnosticLevel) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level >= min_level)
            .collect()
    }
}

//=============================================================================
// 脚本分析 API
//=============================================================================

/// 分析脚本，返回诊断结果
///
/// 执行以下检查：
/// - 同一提升作用域内重复声明的名字（Warn）
/// - `exit function` 出现在 `sub` 中，或反之（Error）
/// - 顶层 `exit`，会直接结束整个脚本（Info）
/// - `option explicit` 不是脚本的第一条语句（Warn）
pub fn analyze_script(script: &Script) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();
    let block = script.block();

    for (index, statement) in block.statements.iter().enumerate() {
        if let Statement::OptionExplicit { location } = statement {
            if index > 0 {
                result.push(Diagnostic::warn(
                    location,
                    "option explicit 应为脚本的第一条语句",
                ));
            }
        }
    }

    check_scope(block, None, &mut result);
    result
}

/// 检查一个提升作用域：`enclosing` 为所在函数的种类，顶层为 `None`
fn check_scope(block: &Block, enclosing: Option<FunctionKind>, result: &mut DiagnosticResult) {
    let mut declared: HashMap<String, Location> = HashMap::new();
    let mut classes: HashMap<String, Location> = HashMap::new();
    check_block(block, enclosing, &mut declared, &mut classes, result);
}

fn check_block(
    block: &Block,
    enclosing: Option<FunctionKind>,
    declared: &mut HashMap<String, Location>,
    classes: &mut HashMap<String, Location>,
    result: &mut DiagnosticResult,
) {
    for statement in &block.statements {
        match statement {
            Statement::Dim(dim) => declare(declared, &dim.name, &dim.location, result),
            Statement::Function(decl) => {
                declare(declared, &decl.name, &decl.location, result);
                check_scope(&decl.body, Some(decl.kind), result);
            }
            Statement::Class(decl) => {
                declare(classes, &decl.name, &decl.location, result);
                let mut members = HashMap::new();
                for field in &decl.fields {
                    declare(&mut members, &field.name, &field.location, result);
                }
                for method in &decl.methods {
                    declare(&mut members, &method.name, &method.location, result);
                    check_scope(&method.body, Some(method.kind), result);
                }
            }
            Statement::If(statement) => {
                check_block(&statement.then_block, enclosing, declared, classes, result);
                check_block(&statement.else_block, enclosing, declared, classes, result);
            }
            Statement::Exit { location, kind } => match enclosing {
                Some(enclosing) if enclosing != *kind => {
                    result.push(Diagnostic::error(
                        location,
                        format!(
                            "'exit {}' 不能出现在 {} 中",
                            kind.keyword(),
                            enclosing.keyword()
                        ),
                    ));
                }
                Some(_) => {}
                None => {
                    result.push(Diagnostic::info(
                        location,
                        format!("顶层的 'exit {}' 会结束整个脚本", kind.keyword()),
                    ));
                }
            },
            Statement::Assignment(_)
            | Statement::Expression(_)
            | Statement::OptionExplicit { .. } => {}
        }
    }
}

fn declare(
    declared: &mut HashMap<String, Location>,
    name: &str,
    location: &Location,
    result: &mut DiagnosticResult,
) {
    let key = name.to_ascii_lowercase();
    match declared.get(&key) {
        Some(first) => result.push(Diagnostic::warn(
            location,
            format!("'{}' 重复声明（首次声明于 {}:{}）", name, first.line, first.column),
        )),
        None => {
            declared.insert(key, location.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(text: &str) -> DiagnosticResult {
        analyze_script(&Script::parse("test.vbs", text).unwrap())
    }

    #[test]
    fn test_clean_script() {
        let result = analyze(
            "option explicit\ndim x\nfunction f(a)\n    dim x\n    f = a\nend function\nx = f(1)\n",
        );
        assert!(result.is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn test_duplicate_declarations() {
        let result = analyze("dim a\nif a then\n    dim A\nend if\nsub a\nend sub\n");
        assert_eq!(result.warn_count(), 2);
        let first = &result.diagnostics[0];
        assert_eq!((first.line, first.column), (3, 9));
        assert_eq!(first.message, "'A' 重复声明（首次声明于 1:5）");
    }

    #[test]
    fn test_duplicate_class_members() {
        let result = analyze("class C\n    dim v\n    function v\n    end function\nend class\n");
        assert_eq!(result.warn_count(), 1);
        assert_eq!(result.diagnostics[0].line, 3);
    }

    #[test]
    fn test_exit_kind_mismatch() {
        let result = analyze("sub s\n    exit function\nend sub\nfunction f\n    exit function\nend function\n");
        assert_eq!(result.error_count(), 1);
        assert!(result.has_errors());
        assert_eq!(
            result.diagnostics[0].to_string(),
            "[ERROR] test.vbs:2:5: 'exit function' 不能出现在 sub 中"
        );
    }

    #[test]
    fn test_top_level_exit_and_late_option_explicit() {
        let result = analyze("dim x\noption explicit\nexit sub\n");
        assert_eq!(result.warn_count(), 1);
        assert_eq!(result.diagnostics.len(), 2);
        assert_eq!(result.filter_by_level(DiagnosticLevel::Warn).len(), 1);
        assert_eq!(result.filter_by_level(DiagnosticLevel::Info).len(), 2);
    }

    #[test]
    fn test_from_asp_error() {
        let error = Script::parse("bad.vbs", "x = (1").unwrap_err();
        let diagnostic = Diagnostic::from(&error);
        assert_eq!(diagnostic.level, DiagnosticLevel::Error);
        assert_eq!(diagnostic.source_name, "bad.vbs");
        assert_eq!(diagnostic.line, 1);

        let mut result = DiagnosticResult::new();
        result.push(diagnostic);
        let mut other = DiagnosticResult::new();
        other.merge(result);
        assert_eq!(other.error_count(), 1);
    }
}
