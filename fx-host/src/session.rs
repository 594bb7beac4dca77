//! # Session 模块
//!
//! 模拟一次浏览会话：匀速向下滚动页面，同时让指针在视口内扫动，
//! 每帧推进舞台并把产生的渲染补丁交给调用方。

use std::collections::BTreeMap;

use fx_runtime::{EffectId, RenderUpdate, SceneConfig, Stage, Vec2};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::HostConfig;

/// 会话计划
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionPlan {
    pub frame_time: f32,
    pub frames: usize,
    pub scroll_speed: f32,
    /// 最大滚动偏移（页面高度 - 视口高度）
    pub max_scroll: f32,
    pub pointer_sweep: bool,
}

impl SessionPlan {
    pub fn new(config: &HostConfig, scene: &SceneConfig) -> Self {
        let page_height = scene
            .effects
            .iter()
            .filter_map(|entry| entry.rect)
            .map(|rect| rect.bottom())
            .fold(scene.viewport.height, f32::max);

        Self {
            frame_time: config.frame_time(),
            frames: config.frame_count(),
            scroll_speed: config.scroll_speed,
            max_scroll: (page_height - scene.viewport.height).max(0.0),
            pointer_sweep: config.pointer_sweep,
        }
    }

    /// 时刻 `t` 的滚动偏移
    pub fn scroll_at(&self, t: f32) -> f32 {
        (t * self.scroll_speed).min(self.max_scroll)
    }

    /// 时刻 `t` 的指针位置（页面坐标）
    pub fn pointer_at(&self, t: f32, width: f32, height: f32) -> Vec2 {
        let scroll = self.scroll_at(t);
        Vec2::new(
            width * (0.5 + 0.4 * (t * 1.3).sin()),
            scroll + height * (0.5 + 0.4 * (t * 0.7).sin()),
        )
    }
}

/// 单个效果的输出统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectSummary {
    pub effect: EffectId,
    pub updates: usize,
    pub last_kind: &'static str,
    pub last_time: f64,
}

/// 按效果汇总补丁
#[derive(Debug, Default)]
pub struct Summary {
    effects: BTreeMap<EffectId, EffectSummary>,
}

impl Summary {
    pub fn record(&mut self, update: &RenderUpdate) {
        let entry = self
            .effects
            .entry(update.effect)
            .or_insert_with(|| EffectSummary {
                effect: update.effect,
                updates: 0,
                last_kind: update.patch.kind(),
                last_time: update.time,
            });
        entry.updates += 1;
        entry.last_kind = update.patch.kind();
        entry.last_time = update.time;
    }

    pub fn effects(&self) -> impl Iterator<Item = &EffectSummary> {
        self.effects.values()
    }

    pub fn total(&self) -> usize {
        self.effects.values().map(|e| e.updates).sum()
    }
}

/// 运行会话
///
/// 挂载阶段产生的补丁也会交给 `sink`。会话结束后卸载全部效果，
/// 若仍有残留资源则返回错误。
pub fn run(
    stage: &mut Stage,
    plan: &SessionPlan,
    mut sink: impl FnMut(RenderUpdate) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    let viewport = stage.viewport();
    let mut drain = |stage: &mut Stage| -> anyhow::Result<()> {
        for update in stage.take_updates() {
            sink(update)?;
        }
        Ok(())
    };

    drain(stage)?;
    info!(frames = plan.frames, max_scroll = plan.max_scroll, "开始模拟会话");

    for frame in 0..plan.frames {
        let t = (frame + 1) as f32 * plan.frame_time;
        stage.scroll_to(plan.scroll_at(t));
        if plan.pointer_sweep {
            stage.pointer_move(plan.pointer_at(t, viewport.width, viewport.height));
        }
        stage.advance(plan.frame_time);
        drain(stage)?;
    }

    if plan.pointer_sweep {
        stage.pointer_exit();
        drain(stage)?;
    }

    debug!(resources = ?stage.resources(), "会话结束，卸载全部效果");
    stage.unmount_all();
    drain(stage)?;

    let leftover = stage.resources();
    if !leftover.is_idle() {
        anyhow::bail!("卸载后仍有残留资源: {:?}", leftover);
    }
    Ok(())
}
