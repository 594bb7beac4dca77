//! # Error 模块
//!
//! 定义 fx-runtime 中使用的错误类型。
//!
//! 效果运行时不会产生错误（目标缺失、空文本、零面积等退化情况都是静默的空操作），
//! 错误只出现在配置边界上。

use thiserror::Error;

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 文件读写失败
    #[error("无法访问配置文件 '{path}': {message}")]
    Io { path: String, message: String },

    /// JSON 解析失败
    #[error("配置解析失败: {message}")]
    Parse { message: String },

    /// 效果参数无效
    #[error("效果 '{effect}' 的参数无效 - {message}")]
    Validation { effect: String, message: String },

    /// 视口尺寸无效
    #[error("视口尺寸无效: {width} x {height}")]
    InvalidViewport { width: f32, height: f32 },
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            message: err.to_string(),
        }
    }
}

/// fx-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FxError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// Result 类型别名
pub type FxResult<T> = Result<T, FxError>;
