//! # Config 模块
//!
//! 宿主运行配置。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (fx-host.json)
//! 3. 默认值（最低）

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// 每个渲染补丁一行 JSON
    #[default]
    Jsonl,
    /// 每个效果一行统计
    Summary,
}

/// 宿主配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// 场景文件路径
    #[serde(default = "default_scene_path")]
    pub scene_path: PathBuf,

    /// 模拟帧率
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// 模拟时长（秒）
    #[serde(default = "default_duration")]
    pub duration: f32,

    /// 滚动速度（像素 / 秒）
    #[serde(default = "default_scroll_speed")]
    pub scroll_speed: f32,

    /// 是否模拟指针扫过页面
    #[serde(default = "default_pointer_sweep")]
    pub pointer_sweep: bool,

    /// 输出格式
    #[serde(default)]
    pub output: OutputFormat,
}

// 默认值函数
fn default_scene_path() -> PathBuf {
    PathBuf::from("scenes/portfolio.json")
}

fn default_fps() -> u32 {
    60
}

fn default_duration() -> f32 {
    6.0
}

fn default_scroll_speed() -> f32 {
    600.0
}

fn default_pointer_sweep() -> bool {
    true
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            scene_path: default_scene_path(),
            fps: default_fps(),
            duration: default_duration(),
            scroll_speed: default_scroll_speed(),
            pointer_sweep: default_pointer_sweep(),
            output: OutputFormat::default(),
        }
    }
}

impl HostConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并打印警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(path = %path.display(), "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("配置序列化失败")?;
        fs::write(path, json).with_context(|| format!("无法写入配置文件 {}", path.display()))?;
        Ok(())
    }

    /// 单帧时长（秒）
    pub fn frame_time(&self) -> f32 {
        1.0 / self.fps as f32
    }

    /// 总帧数
    pub fn frame_count(&self) -> usize {
        (self.duration * self.fps as f32).ceil() as usize
    }

    /// 验证配置有效性
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.fps == 0 {
            bail!("fps 必须大于 0");
        }
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            bail!("duration 必须是非负有限数值，实际为 {}", self.duration);
        }
        if !(self.scroll_speed.is_finite() && self.scroll_speed >= 0.0) {
            bail!("scroll_speed 必须是非负有限数值，实际为 {}", self.scroll_speed);
        }
        Ok(())
    }
}
