//! # Scramble 效果
//!
//! 进入视口后文本先显示为随机字符，再从左到右逐个"解密"为真实文本。
//!
//! 进度以整数 tick 计数保存：第 `k` 次 tick 的进度为 `k / 3`，
//! 下标 `i` 满足 `3i < k` 的字符显示真实值。

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::Effect;
use crate::render::Patch;
use crate::stage::{EffectContext, Signal};
use crate::trigger::VisibilityOptions;

/// 默认字符表
pub const DEFAULT_GLYPHS: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

/// 每个字符需要的 tick 数
const TICKS_PER_CHAR: usize = 3;

fn default_interval() -> f32 {
    0.05
}

fn default_alphabet() -> String {
    DEFAULT_GLYPHS.to_string()
}

/// Scramble 参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrambleConfig {
    pub text: String,
    /// tick 间隔（秒）
    #[serde(default = "default_interval")]
    pub interval: f32,
    #[serde(default = "default_alphabet")]
    pub alphabet: String,
    #[serde(default)]
    pub trigger: VisibilityOptions,
}

impl ScrambleConfig {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            interval: default_interval(),
            alphabet: default_alphabet(),
            trigger: VisibilityOptions::default(),
        }
    }
}

/// 解密文本效果
#[derive(Debug, Clone)]
pub struct ScrambleText {
    config: ScrambleConfig,
    chars: Vec<char>,
    glyphs: Vec<char>,
    ticks: usize,
    running: bool,
}

impl ScrambleText {
    pub fn new(config: ScrambleConfig) -> Self {
        let chars = config.text.chars().collect();
        let glyphs = config.alphabet.chars().collect();
        Self {
            config,
            chars,
            glyphs,
            ticks: 0,
            running: false,
        }
    }

    /// 所有字符都已揭示时的 tick 数
    fn final_tick(&self) -> usize {
        self.chars.len() * TICKS_PER_CHAR
    }

    fn scrambled(&self, rng: &mut impl Rng) -> String {
        self.chars
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                if c == ' ' || TICKS_PER_CHAR * i < self.ticks {
                    c
                } else {
                    self.glyphs[rng.gen_range(0..self.glyphs.len())]
                }
            })
            .collect()
    }

    fn finish(&mut self, ctx: &mut EffectContext<'_>) {
        self.running = false;
        ctx.emit(Patch::Text(self.config.text.clone()));
        ctx.clear_interval();
    }
}

impl Effect for ScrambleText {
    fn kind(&self) -> &'static str {
        "scramble"
    }

    fn mount(&mut self, ctx: &mut EffectContext<'_>) {
        ctx.emit(Patch::Text(self.config.text.clone()));
        if self.chars.is_empty() || self.glyphs.is_empty() {
            return;
        }
        ctx.observe(self.config.trigger);
    }

    fn handle(&mut self, signal: Signal, ctx: &mut EffectContext<'_>) {
        match signal {
            Signal::Visible => {
                if self.running || self.ticks > 0 {
                    return;
                }
                self.running = true;
                ctx.set_interval(self.config.interval);
            }
            Signal::Tick => {
                if !self.running {
                    ctx.clear_interval();
                    return;
                }
                if self.ticks >= self.final_tick() {
                    trace!(id = %ctx.id(), ticks = self.ticks, "解密完成");
                    self.finish(ctx);
                    return;
                }
                let text = self.scrambled(ctx.rng());
                ctx.emit(Patch::Text(text));
                self.ticks += 1;
            }
            _ => {}
        }
    }
}
