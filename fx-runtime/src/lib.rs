//! # FX Runtime
//!
//! 视口触发动画编排层的核心运行时库。
//!
//! ## 架构概述
//!
//! `fx-runtime` 是纯逻辑核心，不依赖任何 DOM 或渲染引擎。
//! 浏览器提供的调度原语（可见性观察、定时器、逐帧回调、指针/尺寸监听）
//! 由 [`Stage`] 以虚拟时钟统一模拟，效果组件只通过 [`EffectContext`]
//! 申请和释放这些资源，并输出声明式的 [`Patch`]：
//!
//! ```text
//! Host                            Stage                        Effect
//!   │── scroll / pointer / dt ──►│                              │
//!   │                            │──── Signal ────────────────►│
//!   │                            │◄─── Request / Patch ─────────│
//!   │◄─── Vec<RenderUpdate> ─────│                              │
//! ```
//!
//! ## 核心类型
//!
//! - [`Stage`]：单线程协作式宿主，持有全部效果与资源表
//! - [`Effect`]：效果组件接口
//! - [`VisibilityTrigger`]：只触发一次的可见性状态机
//! - [`Tween`] / [`EasingFunction`]：时间轴与缓动函数
//! - [`SceneConfig`]：以 JSON 描述的效果场景
//!
//! ## 使用示例
//!
//! ```ignore
//! use fx_runtime::{Rect, Stage, Viewport};
//! use fx_runtime::effects::{Reveal, RevealConfig};
//!
//! let mut stage = Stage::new(Viewport::new(1280.0, 720.0));
//! let id = stage.mount(Reveal::new(RevealConfig::default()), Some(Rect::new(0.0, 900.0, 400.0, 200.0)));
//!
//! stage.scroll_to(400.0);
//! loop {
//!     stage.advance(1.0 / 60.0);
//!     for update in stage.take_updates() {
//!         renderer.apply(update);
//!     }
//! }
//! ```

pub mod animation;
pub mod config;
pub mod effects;
pub mod error;
pub mod geometry;
pub mod render;
pub mod stage;
pub mod trigger;

// 重导出核心类型
pub use animation::{EasingFunction, Style, StyleTween, Tween, TweenState};
pub use config::{SceneConfig, SceneEntry, ViewportConfig};
pub use effects::{Effect, EffectSpec};
pub use error::{ConfigError, FxError, FxResult};
pub use geometry::{Rect, Vec2};
pub use render::{CanvasFrame, Circle, GradientFrame, Line, MeterFrame, Patch, RenderUpdate, UnitFrame};
pub use stage::{EffectContext, EffectId, ResourceCounts, Signal, Stage, Viewport};
pub use trigger::{IntersectionEntry, TriggerState, VisibilityOptions, VisibilityTrigger};
