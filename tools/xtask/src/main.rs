//! # xtask - 开发辅助工具
//!
//! ## 命令
//!
//! - `check-all`: 格式、lint、测试，最后检查 `scripts/` 下的示例脚本
//! - `script-check [path]`: 只做脚本检查（语法、静态诊断）

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use asp_runtime::{Diagnostic, DiagnosticResult, Script, analyze_script};
use walkdir::WalkDir;

/// 参与门禁的 crate
const PACKAGES: &[&str] = &["asp-runtime", "host-cli", "xtask"];

fn main() -> ExitCode {
    match real_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("xtask error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("check-all") => check_all(),
        Some("script-check") => script_check(args.next().as_deref()),
        None | Some("help" | "-h" | "--help") => {
            print_help();
            Ok(())
        }
        Some(other) => anyhow::bail!("unknown xtask subcommand: {other}"),
    }
}

/// 对 [`PACKAGES`] 依次运行 `cargo <subcommand> -p ... <extra>`
fn cargo(subcommand: &str, extra: &[&str]) -> anyhow::Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg(subcommand);
    for package in PACKAGES {
        cmd.args(["-p", package]);
    }
    cmd.args(extra);

    eprintln!("\n==> cargo {subcommand}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("cargo {subcommand} failed with {status}");
    }
    Ok(())
}

fn check_all() -> anyhow::Result<()> {
    cargo("fmt", &["--", "--check"])?;
    cargo("clippy", &["--all-targets", "--", "-D", "warnings"])?;
    cargo("test", &[])?;
    script_check(None)
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       fmt、clippy、test，然后检查 scripts/
  script-check    检查脚本文件

SCRIPT-CHECK:
  cargo xtask script-check [path]

  不带参数：检查 scripts/ 下所有 .asp / .vbs 文件
  带路径参数：检查指定文件或目录
  .asp 按模板解析，.vbs 按纯脚本解析

  检查内容：
    - 脚本语法错误
    - 重复声明、exit 与所在函数不匹配等静态诊断

ALIASES (in .cargo/config.toml):
  cargo check-all     -> cargo xtask check-all
  cargo script-check  -> cargo xtask script-check
"#
    );
}

//=============================================================================
// script-check 命令实现
//=============================================================================

/// 默认脚本目录（相对于 workspace root）
const DEFAULT_SCRIPTS_DIR: &str = "scripts";

/// 脚本检查结果
#[derive(Default)]
struct ScriptCheckResult {
    /// 检查的脚本数量
    scripts_checked: usize,
    /// 解析错误数量
    parse_errors: usize,
    /// 诊断结果（含解析错误）
    diagnostics: DiagnosticResult,
}

/// 执行脚本检查
fn script_check(path: Option<&str>) -> anyhow::Result<()> {
    let root = PathBuf::from(path.unwrap_or(DEFAULT_SCRIPTS_DIR));
    let files = if root.is_file() {
        vec![root]
    } else if root.is_dir() {
        collect_script_files(&root)?
    } else if path.is_none() {
        anyhow::bail!(
            "默认脚本目录不存在: {}\n请在 workspace 根目录运行，或指定脚本路径",
            root.display()
        );
    } else {
        anyhow::bail!("路径不存在: {}", root.display());
    };

    if files.is_empty() {
        eprintln!("未找到脚本文件（.asp / .vbs）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个脚本文件...\n", files.len());

    let mut result = ScriptCheckResult::default();
    for file in &files {
        check_script_file(file, &mut result);
    }

    print_check_result(&result);

    if result.parse_errors > 0 || result.diagnostics.has_errors() {
        anyhow::bail!("脚本检查发现错误");
    }
    Ok(())
}

fn is_script(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("asp") || ext.eq_ignore_ascii_case("vbs"))
}

/// 收集目录下的所有脚本文件
fn collect_script_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if entry.file_type().is_file() && is_script(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// 检查单个脚本文件
fn check_script_file(file: &Path, result: &mut ScriptCheckResult) {
    let name = file.display().to_string();
    result.scripts_checked += 1;

    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[ERROR] {}: 无法读取文件 - {}", name, e);
            result.parse_errors += 1;
            return;
        }
    };

    let template = file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("asp"));
    let parsed = if template {
        Script::parse_template(&name, &content)
    } else {
        Script::parse(&name, &content)
    };

    match parsed {
        Ok(script) => result.diagnostics.merge(analyze_script(&script)),
        Err(e) => {
            result.parse_errors += 1;
            result.diagnostics.push(Diagnostic::from(&e));
        }
    }
}

/// 输出检查结果
fn print_check_result(result: &ScriptCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!(
        "检查完成: {} 个脚本（{} 个无法解析）",
        result.scripts_checked, result.parse_errors
    );
    eprintln!();

    for diag in &result.diagnostics.diagnostics {
        eprintln!("{}", diag);
    }

    let error_count = result.diagnostics.error_count();
    let warn_count = result.diagnostics.warn_count();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
