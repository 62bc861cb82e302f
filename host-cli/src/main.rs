//! # asp - 命令行宿主
//!
//! 读取脚本文件，注入写到标准输出的 `response` 对象并执行。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -- run page.asp
//! cargo run -- run tool.vbs --explicit --max-steps 100000
//! cargo run -- check page.asp
//! cargo run -- ast page.asp --format json
//!
//! # 配置文件（JSON，命令行参数优先）
//! cargo run -- --config asp.json run page.asp
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use asp_runtime::{AspError, AspRuntime, Diagnostic, LexMode, RuntimeConfig, Script, analyze_script};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{Level, debug, info};

#[derive(Parser)]
#[command(name = "asp")]
#[command(about = "ASP / VBScript 脚本解释器")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件（JSON）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 输出更多日志（-v: debug，-vv: trace）
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// 只输出错误日志
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 执行脚本
    Run {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        overrides: ConfigOverrides,
    },

    /// 只解析并做静态检查
    Check {
        #[command(flatten)]
        input: InputArgs,
    },

    /// 打印解析后的 AST
    Ast {
        #[command(flatten)]
        input: InputArgs,

        /// 输出格式
        #[arg(short, long, value_enum, default_value = "source")]
        format: AstFormat,
    },
}

#[derive(Args)]
struct InputArgs {
    /// 脚本文件
    file: PathBuf,

    /// 词法起始模式（默认：.asp 为 template，其余为 code）
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,
}

/// 覆盖配置文件中的项
#[derive(Args)]
struct ConfigOverrides {
    /// 以 option explicit 模式开始
    #[arg(long)]
    explicit: bool,

    /// 未标注的形参按值传递
    #[arg(long)]
    by_val: bool,

    /// 最大调用深度
    #[arg(long)]
    max_call_depth: Option<usize>,

    /// 执行语句数上限
    #[arg(long)]
    max_steps: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Code,
    Template,
}

#[derive(Clone, Copy, ValueEnum)]
enum AstFormat {
    /// 重新打印为源码
    Source,
    /// S 表达式
    Sexpr,
    /// JSON
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = real_main(cli) {
        eprintln!("❌ {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn real_main(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run { input, overrides } => {
            let mut config = load_config(cli.config.as_deref())?;
            overrides.apply(&mut config);
            config.validate()?;
            run_script(&input, config)
        }
        Commands::Check { input } => check_script(&input),
        Commands::Ast { input, format } => print_ast(&input, format),
    }
}

/// 加载配置：文件不存在时使用默认值
fn load_config(path: Option<&Path>) -> anyhow::Result<RuntimeConfig> {
    let Some(path) = path else {
        return Ok(RuntimeConfig::default());
    };
    if !path.exists() {
        info!(path = %path.display(), "配置文件不存在，使用默认配置");
        return Ok(RuntimeConfig::default());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取配置文件 {}", path.display()))?;
    let config = RuntimeConfig::from_json(&text)
        .with_context(|| format!("配置文件无效 {}", path.display()))?;
    debug!(?config, "配置文件加载成功");
    Ok(config)
}

impl ConfigOverrides {
    fn apply(&self, config: &mut RuntimeConfig) {
        if self.explicit {
            config.explicit = true;
        }
        if self.by_val {
            config.default_by_ref = false;
        }
        if let Some(depth) = self.max_call_depth {
            config.max_call_depth = depth;
        }
        if let Some(steps) = self.max_steps {
            config.max_steps = Some(steps);
        }
    }
}

impl InputArgs {
    fn lex_mode(&self) -> LexMode {
        match self.mode {
            Some(Mode::Code) => LexMode::Code,
            Some(Mode::Template) => LexMode::Template,
            None if self.file.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("asp")) => {
                LexMode::Template
            }
            None => LexMode::Code,
        }
    }

    fn load(&self) -> anyhow::Result<Script> {
        let name = self.file.display().to_string();
        let text = std::fs::read_to_string(&self.file)
            .with_context(|| format!("无法读取脚本 {name}"))?;
        let script = match self.lex_mode() {
            LexMode::Code => Script::parse(&name, &text)?,
            LexMode::Template => Script::parse_template(&name, &text)?,
        };
        Ok(script)
    }
}

fn run_script(input: &InputArgs, config: RuntimeConfig) -> anyhow::Result<()> {
    let script = input.load()?;
    let mut runtime = AspRuntime::new(config);
    runtime.register_response(|value| print!("{value}"));
    runtime.register("vbcrlf", "\r\n");

    let result = runtime.run(&script);
    std::io::stdout().flush()?;
    result?;
    Ok(())
}

fn check_script(input: &InputArgs) -> anyhow::Result<()> {
    let script = match input.load() {
        Ok(script) => script,
        Err(e) => {
            if let Some(error) = e.downcast_ref::<AspError>() {
                eprintln!("{}", Diagnostic::from(error));
            }
            return Err(e.context("解析失败"));
        }
    };

    let result = analyze_script(&script);
    for diagnostic in &result.diagnostics {
        eprintln!("{diagnostic}");
    }
    if result.has_errors() {
        anyhow::bail!(
            "{} 个错误, {} 个警告",
            result.error_count(),
            result.warn_count()
        );
    }
    eprintln!("✅ {}: {} 个警告", script.name(), result.warn_count());
    Ok(())
}

fn print_ast(input: &InputArgs, format: AstFormat) -> anyhow::Result<()> {
    let script = input.load()?;
    match format {
        AstFormat::Source => print!("{}", script.block()),
        AstFormat::Sexpr => println!("{}", script.block().to_sexpr()),
        AstFormat::Json => println!("{}", serde_json::to_string_pretty(script.block())?),
    }
    Ok(())
}
