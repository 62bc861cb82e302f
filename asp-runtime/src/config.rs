//! # Config 模块
//!
//! 运行时配置。
//!
//! ## 配置优先级
//!
//! 1. 宿主显式设置（最高，如命令行参数）
//! 2. 配置文件（JSON）
//! 3. 默认值（最低）

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 运行时配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// 是否从一开始就处于 `option explicit` 模式
    #[serde(default)]
    pub explicit: bool,

    /// 形参未写 `byref` / `byval` 时是否按引用传递
    #[serde(default = "default_by_ref")]
    pub default_by_ref: bool,

    /// 最大调用深度
    ///
    /// 默认值保证在 2 MiB 的线程栈（`std::thread::spawn` 的默认大小）上先于栈溢出触发；
    /// 调大时宿主需要相应地增大执行线程的栈。
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,

    /// 执行语句数上限；`None` 表示不限制
    #[serde(default)]
    pub max_steps: Option<u64>,
}

fn default_by_ref() -> bool {
    true
}

fn default_max_call_depth() -> usize {
    64
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            explicit: false,
            default_by_ref: default_by_ref(),
            max_call_depth: default_max_call_depth(),
            max_steps: None,
        }
    }
}

impl RuntimeConfig {
    /// 从 JSON 文本加载，缺省字段取默认值
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 序列化为格式化的 JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializationFailed(e.to_string()))
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_call_depth == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_call_depth 必须大于 0".to_string(),
            ));
        }
        if self.max_steps == Some(0) {
            return Err(ConfigError::ValidationFailed(
                "max_steps 必须大于 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 解析失败
    #[error("配置解析失败: {0}")]
    ParseFailed(String),
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),
    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}
