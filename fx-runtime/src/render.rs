//! # Render 模块
//!
//! 效果向宿主输出的声明式渲染补丁。
//!
//! ## 设计原则
//!
//! - **快照式**：每个 `Patch` 都是该效果当前视觉状态的完整描述，
//!   宿主只需保留最新一份即可重绘
//! - **无副作用**：补丁本身不执行任何操作
//! - **引擎无关**：不包含任何 DOM / 画布类型

use serde::Serialize;

use crate::animation::Style;
use crate::geometry::Vec2;
use crate::stage::EffectId;

/// 渲染补丁
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Patch {
    /// 整个元素的变换
    Style(Style),
    /// 拆分文本中每个单元的文本与变换（阅读顺序）
    Units(Vec<UnitFrame>),
    /// 纯文本内容
    Text(String),
    /// 画布绘制列表
    Canvas(CanvasFrame),
    /// 渐变背景位置
    Gradient(GradientFrame),
    /// 进度条 / 进度环
    Meter(MeterFrame),
}

impl Patch {
    /// 补丁类型名（与序列化的 `kind` 字段一致）
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Style(_) => "style",
            Self::Units(_) => "units",
            Self::Text(_) => "text",
            Self::Canvas(_) => "canvas",
            Self::Gradient(_) => "gradient",
            Self::Meter(_) => "meter",
        }
    }

    /// 文本类补丁的内容
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_style(&self) -> Option<&Style> {
        match self {
            Self::Style(style) => Some(style),
            _ => None,
        }
    }

    pub fn as_units(&self) -> Option<&[UnitFrame]> {
        match self {
            Self::Units(units) => Some(units),
            _ => None,
        }
    }

    pub fn as_canvas(&self) -> Option<&CanvasFrame> {
        match self {
            Self::Canvas(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn as_meter(&self) -> Option<&MeterFrame> {
        match self {
            Self::Meter(frame) => Some(frame),
            _ => None,
        }
    }
}

/// 拆分文本单元的一帧
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitFrame {
    /// 显示文本（空格已替换为不换行空格）
    pub text: String,
    pub style: Style,
}

/// 圆点
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
    pub opacity: f32,
}

/// 连线
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Line {
    pub from: Vec2,
    pub to: Vec2,
    pub opacity: f32,
}

/// 画布的一帧
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CanvasFrame {
    pub width: f32,
    pub height: f32,
    pub circles: Vec<Circle>,
    pub lines: Vec<Line>,
}

/// 渐变背景的一帧
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientFrame {
    /// 背景位置（百分比）
    pub position: f32,
    pub colors: Vec<String>,
}

/// 进度的一帧
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeterFrame {
    /// 填充比例 (0.0 - 1.0)
    pub fill: f32,
    /// 环形进度的描边偏移；条形进度为 `None`
    pub stroke_offset: Option<f32>,
}

/// 带来源的补丁
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderUpdate {
    pub effect: EffectId,
    /// 产生补丁时的虚拟时间（秒）
    pub time: f64,
    pub patch: Patch,
}
