//! # Stage 模块
//!
//! 单线程协作式宿主，模拟浏览器事件循环为效果提供的全部调度原语。
//!
//! ## 资源表
//!
//! | 浏览器原语               | Stage 资源         | 投递的信号                 |
//! |--------------------------|--------------------|----------------------------|
//! | IntersectionObserver     | `observers`        | `Signal::Visible`          |
//! | mousemove / mouseleave   | `pointer`          | `PointerMove/PointerLeave` |
//! | resize                   | `resize`           | `Signal::Resize`           |
//! | setInterval              | `intervals`        | `Signal::Tick`             |
//! | requestAnimationFrame    | `frames`           | `Signal::Frame`            |
//!
//! 效果只能通过 [`EffectContext`] 申请这些资源。`unmount` 会一次性释放
//! 效果持有的全部资源，此后不会再有任何信号投递给它，也不会再产生补丁。

use std::collections::{BTreeMap, BTreeSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::SceneConfig;
use crate::effects::Effect;
use crate::geometry::{Rect, Vec2};
use crate::render::{Patch, RenderUpdate};
use crate::trigger::{IntersectionEntry, VisibilityOptions, VisibilityTrigger};

/// 定时器最小周期（秒）
const MIN_INTERVAL: f64 = 0.001;

/// 效果实例标识符
///
/// 由 `Stage` 在挂载时分配，按挂载顺序递增，不会重复。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EffectId(u64);

impl EffectId {
    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EffectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Effect({})", self.0)
    }
}

/// 视口状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// 垂直滚动偏移
    pub scroll_y: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            scroll_y: 0.0,
        }
    }

    /// 视口在页面坐标系中的矩形
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, self.scroll_y, self.width, self.height)
    }
}

/// 投递给效果的信号
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    /// 可见性触发器已触发
    Visible,
    /// 指针在交互区域内移动（页面坐标）
    PointerMove(Vec2),
    /// 指针离开交互区域
    PointerLeave,
    /// 视口尺寸变化
    Resize { width: f32, height: f32 },
    /// 定时器触发
    Tick,
    /// 逐帧回调，携带帧间隔（秒）
    Frame(f32),
}

/// 资源申请
#[derive(Debug, Clone, Copy, PartialEq)]
enum Request {
    Observe(VisibilityOptions),
    ListenPointer { padding: f32 },
    ListenResize,
    SetInterval(f32),
    ClearInterval,
    RequestFrames,
    CancelFrames,
}

/// 效果处理信号时可用的上下文
///
/// 资源申请和补丁先记录在上下文中，处理函数返回后由 `Stage` 统一应用。
pub struct EffectContext<'a> {
    id: EffectId,
    rect: Option<Rect>,
    viewport: Viewport,
    now: f64,
    rng: &'a mut StdRng,
    requests: Vec<Request>,
    patches: Vec<Patch>,
}

impl<'a> EffectContext<'a> {
    fn new(
        id: EffectId,
        rect: Option<Rect>,
        viewport: Viewport,
        now: f64,
        rng: &'a mut StdRng,
    ) -> Self {
        Self {
            id,
            rect,
            viewport,
            now,
            rng,
            requests: Vec::new(),
            patches: Vec::new(),
        }
    }

    pub fn id(&self) -> EffectId {
        self.id
    }

    /// 目标区域；元素不存在时为 `None`
    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// 当前虚拟时间（秒）
    pub fn now(&self) -> f64 {
        self.now
    }

    /// 舞台的随机数源
    pub fn rng(&mut self) -> &mut StdRng {
        &mut *self.rng
    }

    /// 观察目标区域的可见性（触发一次后自动断开）
    pub fn observe(&mut self, options: VisibilityOptions) {
        self.requests.push(Request::Observe(options));
    }

    /// 监听目标区域（向外扩张 `padding`）上的指针事件
    pub fn listen_pointer(&mut self, padding: f32) {
        self.requests.push(Request::ListenPointer { padding });
    }

    /// 监听视口尺寸变化
    pub fn listen_resize(&mut self) {
        self.requests.push(Request::ListenResize);
    }

    /// 启动周期定时器（替换已有的定时器）
    pub fn set_interval(&mut self, seconds: f32) {
        self.requests.push(Request::SetInterval(seconds));
    }

    pub fn clear_interval(&mut self) {
        self.requests.push(Request::ClearInterval);
    }

    /// 订阅逐帧回调（重复订阅无副作用）
    pub fn request_frames(&mut self) {
        self.requests.push(Request::RequestFrames);
    }

    pub fn cancel_frames(&mut self) {
        self.requests.push(Request::CancelFrames);
    }

    /// 输出渲染补丁
    pub fn emit(&mut self, patch: Patch) {
        self.patches.push(patch);
    }
}

/// 活跃资源计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceCounts {
    pub observers: usize,
    pub pointer_listeners: usize,
    pub resize_listeners: usize,
    pub intervals: usize,
    pub frame_loops: usize,
}

impl ResourceCounts {
    pub fn total(&self) -> usize {
        self.observers
            + self.pointer_listeners
            + self.resize_listeners
            + self.intervals
            + self.frame_loops
    }

    /// 没有任何活跃资源
    pub fn is_idle(&self) -> bool {
        self.total() == 0
    }
}

struct MountedEffect {
    effect: Box<dyn Effect>,
    rect: Option<Rect>,
}

struct PointerRegion {
    padding: f32,
    hovered: bool,
}

struct Interval {
    period: f64,
    next_due: f64,
}

/// 舞台
///
/// 持有所有已挂载的效果与其资源，按确定的顺序（时间顺序、挂载顺序）投递信号。
pub struct Stage {
    clock: f64,
    viewport: Viewport,
    rng: StdRng,
    next_id: u64,
    effects: BTreeMap<EffectId, MountedEffect>,
    observers: BTreeMap<EffectId, VisibilityTrigger>,
    pointer: BTreeMap<EffectId, PointerRegion>,
    resize: BTreeSet<EffectId>,
    intervals: BTreeMap<EffectId, Interval>,
    frames: BTreeSet<EffectId>,
    rendered: BTreeMap<EffectId, Patch>,
    updates: Vec<RenderUpdate>,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("clock", &self.clock)
            .field("viewport", &self.viewport)
            .field("effects", &self.effects.len())
            .field("resources", &self.resources())
            .finish()
    }
}

impl Stage {
    /// 创建舞台（随机种子取自系统熵）
    pub fn new(viewport: Viewport) -> Self {
        Self::with_rng(viewport, StdRng::from_entropy())
    }

    /// 创建使用固定随机种子的舞台（结果可复现）
    pub fn with_seed(viewport: Viewport, seed: u64) -> Self {
        Self::with_rng(viewport, StdRng::seed_from_u64(seed))
    }

    fn with_rng(viewport: Viewport, rng: StdRng) -> Self {
        Self {
            clock: 0.0,
            viewport,
            rng,
            next_id: 1,
            effects: BTreeMap::new(),
            observers: BTreeMap::new(),
            pointer: BTreeMap::new(),
            resize: BTreeSet::new(),
            intervals: BTreeMap::new(),
            frames: BTreeSet::new(),
            rendered: BTreeMap::new(),
            updates: Vec::new(),
        }
    }

    // ========== 生命周期 ==========

    /// 挂载效果
    ///
    /// `rect` 为目标区域；传 `None` 表示元素不存在，依赖目标区域的资源申请
    /// （可见性观察、指针监听）会被静默忽略。
    pub fn mount<E: Effect + 'static>(&mut self, effect: E, rect: Option<Rect>) -> EffectId {
        self.mount_boxed(Box::new(effect), rect)
    }

    /// 挂载已装箱的效果
    pub fn mount_boxed(&mut self, effect: Box<dyn Effect>, rect: Option<Rect>) -> EffectId {
        let id = EffectId(self.next_id);
        self.next_id += 1;

        debug!(id = %id, kind = effect.kind(), rect = ?rect, "挂载效果");
        self.effects.insert(id, MountedEffect { effect, rect });
        self.with_context(id, |effect, ctx| effect.mount(ctx));
        id
    }

    /// 按场景配置挂载全部效果，返回声明顺序的 ID 列表
    pub fn mount_scene(&mut self, scene: &SceneConfig) -> Vec<EffectId> {
        scene
            .effects
            .iter()
            .map(|entry| self.mount_boxed(entry.effect.build(), entry.rect))
            .collect()
    }

    /// 卸载效果并释放其全部资源
    ///
    /// # 返回
    /// - `true`: 效果存在并已卸载
    /// - `false`: ID 未挂载
    pub fn unmount(&mut self, id: EffectId) -> bool {
        let Some(mounted) = self.effects.remove(&id) else {
            return false;
        };

        self.observers.remove(&id);
        self.pointer.remove(&id);
        self.resize.remove(&id);
        self.intervals.remove(&id);
        self.frames.remove(&id);
        self.rendered.remove(&id);

        debug!(id = %id, kind = mounted.effect.kind(), "卸载效果");
        true
    }

    /// 卸载全部效果
    pub fn unmount_all(&mut self) {
        let ids: Vec<EffectId> = self.effects.keys().copied().collect();
        for id in ids {
            self.unmount(id);
        }
    }

    pub fn is_mounted(&self, id: EffectId) -> bool {
        self.effects.contains_key(&id)
    }

    pub fn mounted_count(&self) -> usize {
        self.effects.len()
    }

    // ========== 宿主事件 ==========

    /// 推进虚拟时钟
    ///
    /// 先按时间顺序触发到期的定时器（一次推进可能触发多次），
    /// 再按挂载顺序向逐帧订阅者投递一帧。
    pub fn advance(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        let target = self.clock + f64::from(dt);

        while let Some((id, due)) = self.next_due_interval(target) {
            self.clock = due;
            if let Some(interval) = self.intervals.get_mut(&id) {
                interval.next_due += interval.period;
            }
            trace!(id = %id, time = due, "定时器触发");
            self.dispatch(id, Signal::Tick);
        }
        self.clock = target;

        let subscribers: Vec<EffectId> = self.frames.iter().copied().collect();
        for id in subscribers {
            // 前面的效果可能在本帧内取消了订阅
            if self.frames.contains(&id) {
                self.dispatch(id, Signal::Frame(dt));
            }
        }
    }

    /// 滚动视口并重新评估可见性
    pub fn scroll_to(&mut self, scroll_y: f32) {
        self.viewport.scroll_y = scroll_y;
        self.evaluate_observers();
    }

    /// 调整视口尺寸
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport.width = width;
        self.viewport.height = height;
        debug!(width, height, "视口尺寸变化");

        let listeners: Vec<EffectId> = self.resize.iter().copied().collect();
        for id in listeners {
            self.dispatch(id, Signal::Resize { width, height });
        }
        self.evaluate_observers();
    }

    /// 指针移动（页面坐标）
    pub fn pointer_move(&mut self, point: Vec2) {
        let ids: Vec<EffectId> = self.pointer.keys().copied().collect();
        for id in ids {
            let Some(rect) = self.effects.get(&id).and_then(|m| m.rect) else {
                continue;
            };
            let Some(region) = self.pointer.get_mut(&id) else {
                continue;
            };

            let inside = rect.inflate(region.padding).contains(point);
            let was_inside = region.hovered;
            region.hovered = inside;

            if inside {
                self.dispatch(id, Signal::PointerMove(point));
            } else if was_inside {
                self.dispatch(id, Signal::PointerLeave);
            }
        }
    }

    /// 指针离开窗口
    pub fn pointer_exit(&mut self) {
        let hovered: Vec<EffectId> = self
            .pointer
            .iter_mut()
            .filter(|(_, region)| region.hovered)
            .map(|(id, region)| {
                region.hovered = false;
                *id
            })
            .collect();

        for id in hovered {
            self.dispatch(id, Signal::PointerLeave);
        }
    }

    /// 直接投递一次相交观测（比例大于 0 视为相交）
    ///
    /// 用于自行计算可见性的宿主。效果未在观察时无任何作用。
    pub fn notify_intersection(&mut self, id: EffectId, ratio: f32) {
        self.deliver_entry(id, IntersectionEntry::from_ratio(ratio));
    }

    // ========== 查询方法 ==========

    /// 当前虚拟时间（秒）
    pub fn now(&self) -> f64 {
        self.clock
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// 效果最近一次输出的补丁
    pub fn rendered(&self, id: EffectId) -> Option<&Patch> {
        self.rendered.get(&id)
    }

    /// 取出自上次调用以来产生的全部补丁（按产生顺序）
    pub fn take_updates(&mut self) -> Vec<RenderUpdate> {
        std::mem::take(&mut self.updates)
    }

    /// 活跃资源计数
    pub fn resources(&self) -> ResourceCounts {
        ResourceCounts {
            observers: self.observers.len(),
            pointer_listeners: self.pointer.len(),
            resize_listeners: self.resize.len(),
            intervals: self.intervals.len(),
            frame_loops: self.frames.len(),
        }
    }

    // ========== 内部实现 ==========

    fn next_due_interval(&self, target: f64) -> Option<(EffectId, f64)> {
        self.intervals
            .iter()
            .filter(|(_, interval)| interval.next_due <= target)
            .min_by(|a, b| a.1.next_due.total_cmp(&b.1.next_due).then(a.0.cmp(b.0)))
            .map(|(id, interval)| (*id, interval.next_due))
    }

    fn dispatch(&mut self, id: EffectId, signal: Signal) {
        self.with_context(id, |effect, ctx| effect.handle(signal, ctx));
    }

    /// 在上下文中运行效果代码，然后应用其资源申请与补丁
    fn with_context(
        &mut self,
        id: EffectId,
        f: impl FnOnce(&mut dyn Effect, &mut EffectContext<'_>),
    ) {
        let Some(mounted) = self.effects.get_mut(&id) else {
            return;
        };

        let mut ctx = EffectContext::new(id, mounted.rect, self.viewport, self.clock, &mut self.rng);
        f(mounted.effect.as_mut(), &mut ctx);

        let EffectContext {
            requests, patches, ..
        } = ctx;

        for patch in patches {
            self.rendered.insert(id, patch.clone());
            self.updates.push(RenderUpdate {
                effect: id,
                time: self.clock,
                patch,
            });
        }

        let mut observe = false;
        for request in requests {
            observe |= self.apply_request(id, request);
        }

        // 与真实观察者一致：开始观察时立即投递一次初始观测
        if observe {
            self.evaluate_observer(id);
        }
    }

    /// 应用一条资源申请，返回是否新建了观察者
    fn apply_request(&mut self, id: EffectId, request: Request) -> bool {
        let rect = self.effects.get(&id).and_then(|m| m.rect);

        match request {
            Request::Observe(options) => {
                if rect.is_none() {
                    debug!(id = %id, "目标元素不存在，忽略可见性观察");
                    return false;
                }
                self.observers.insert(id, VisibilityTrigger::new(options));
                return true;
            }
            Request::ListenPointer { padding } => {
                if rect.is_none() {
                    debug!(id = %id, "目标元素不存在，忽略指针监听");
                    return false;
                }
                self.pointer.insert(
                    id,
                    PointerRegion {
                        padding,
                        hovered: false,
                    },
                );
            }
            Request::ListenResize => {
                self.resize.insert(id);
            }
            Request::SetInterval(seconds) => {
                let period = f64::from(seconds).max(MIN_INTERVAL);
                self.intervals.insert(
                    id,
                    Interval {
                        period,
                        next_due: self.clock + period,
                    },
                );
            }
            Request::ClearInterval => {
                self.intervals.remove(&id);
            }
            Request::RequestFrames => {
                self.frames.insert(id);
            }
            Request::CancelFrames => {
                self.frames.remove(&id);
            }
        }
        false
    }

    fn evaluate_observers(&mut self) {
        let ids: Vec<EffectId> = self.observers.keys().copied().collect();
        for id in ids {
            self.evaluate_observer(id);
        }
    }

    fn evaluate_observer(&mut self, id: EffectId) {
        let Some(rect) = self.effects.get(&id).and_then(|m| m.rect) else {
            return;
        };
        let Some(trigger) = self.observers.get(&id) else {
            return;
        };

        let entry = trigger.options().measure(&rect, &self.viewport.rect());
        self.deliver_entry(id, entry);
    }

    fn deliver_entry(&mut self, id: EffectId, entry: IntersectionEntry) {
        let Some(trigger) = self.observers.get_mut(&id) else {
            return;
        };

        if trigger.observe(entry) {
            // 只触发一次：先断开观察者，再投递信号
            self.observers.remove(&id);
            debug!(id = %id, ratio = entry.ratio, "可见性触发");
            self.dispatch(id, Signal::Visible);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<(u64, Signal)>>>;

    /// 按挂载参数申请资源，并记录收到的信号
    struct Recorder {
        tag: u64,
        log: Log,
        interval: Option<f32>,
        pointer: bool,
    }

    impl Recorder {
        fn new(tag: u64, log: &Log) -> Self {
            Self {
                tag,
                log: log.clone(),
                interval: None,
                pointer: false,
            }
        }
    }

    impl Effect for Recorder {
        fn kind(&self) -> &'static str {
            "recorder"
        }

        fn mount(&mut self, ctx: &mut EffectContext<'_>) {
            ctx.observe(VisibilityOptions::default());
            if let Some(seconds) = self.interval {
                ctx.set_interval(seconds);
            }
            if self.pointer {
                ctx.listen_pointer(10.0);
            }
        }

        fn handle(&mut self, signal: Signal, ctx: &mut EffectContext<'_>) {
            self.log.borrow_mut().push((self.tag, signal));
            if signal == Signal::Visible {
                ctx.emit(Patch::Text(format!("visible@{}", ctx.now())));
            }
        }
    }

    fn new_log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn test_ids_increase() {
        let log = new_log();
        let mut stage = Stage::with_seed(Viewport::new(100.0, 100.0), 0);
        let a = stage.mount(Recorder::new(1, &log), None);
        let b = stage.mount(Recorder::new(2, &log), None);
        assert!(a < b);
        assert_eq!(a.to_string(), "Effect(1)");
    }

    #[test]
    fn test_visible_on_mount_when_on_screen() {
        let log = new_log();
        let mut stage = Stage::with_seed(Viewport::new(100.0, 100.0), 0);
        let id = stage.mount(Recorder::new(1, &log), Some(Rect::new(10.0, 10.0, 20.0, 20.0)));

        assert_eq!(log.borrow().as_slice(), &[(1, Signal::Visible)]);
        assert_eq!(stage.rendered(id).and_then(Patch::as_text), Some("visible@0"));
        assert_eq!(stage.resources().observers, 0);
    }

    #[test]
    fn test_intervals_fire_in_time_order() {
        let log = new_log();
        let mut stage = Stage::with_seed(Viewport::new(100.0, 100.0), 0);
        stage.mount(
            Recorder {
                interval: Some(0.5),
                ..Recorder::new(1, &log)
            },
            None,
        );
        stage.mount(
            Recorder {
                interval: Some(0.25),
                ..Recorder::new(2, &log)
            },
            None,
        );

        stage.advance(1.0);
        let order: Vec<u64> = log
            .borrow()
            .iter()
            .filter(|(_, s)| *s == Signal::Tick)
            .map(|(tag, _)| *tag)
            .collect();
        // 同一时刻到期时按挂载顺序
        assert_eq!(order, vec![2, 1, 2, 2, 1, 2]);
        assert_eq!(stage.now(), 1.0);
    }

    #[test]
    fn test_pointer_enter_and_leave() {
        let log = new_log();
        let mut stage = Stage::with_seed(Viewport::new(500.0, 500.0), 0);
        stage.mount(
            Recorder {
                pointer: true,
                ..Recorder::new(1, &log)
            },
            Some(Rect::new(100.0, 100.0, 50.0, 50.0)),
        );
        log.borrow_mut().clear();

        // padding 10：边缘外 5px 仍算在区域内
        stage.pointer_move(Vec2::new(95.0, 120.0));
        stage.pointer_move(Vec2::new(300.0, 300.0));
        stage.pointer_move(Vec2::new(400.0, 400.0));
        stage.pointer_move(Vec2::new(120.0, 120.0));
        stage.pointer_exit();
        stage.pointer_exit();

        let signals: Vec<Signal> = log.borrow().iter().map(|(_, s)| *s).collect();
        assert_eq!(
            signals,
            vec![
                Signal::PointerMove(Vec2::new(95.0, 120.0)),
                Signal::PointerLeave,
                Signal::PointerMove(Vec2::new(120.0, 120.0)),
                Signal::PointerLeave,
            ]
        );
    }

    #[test]
    fn test_missing_rect_acquires_nothing_target_bound() {
        let log = new_log();
        let mut stage = Stage::with_seed(Viewport::new(500.0, 500.0), 0);
        stage.mount(
            Recorder {
                pointer: true,
                ..Recorder::new(1, &log)
            },
            None,
        );
        assert!(stage.resources().is_idle());
        stage.pointer_move(Vec2::new(0.0, 0.0));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_unmount_releases_everything() {
        let log = new_log();
        let mut stage = Stage::with_seed(Viewport::new(100.0, 100.0), 0);
        let id = stage.mount(
            Recorder {
                interval: Some(0.1),
                pointer: true,
                ..Recorder::new(1, &log)
            },
            Some(Rect::new(0.0, 500.0, 20.0, 20.0)),
        );
        assert_eq!(stage.resources().total(), 3);

        assert!(stage.unmount(id));
        assert!(stage.resources().is_idle());
        assert!(!stage.unmount(id));

        stage.advance(1.0);
        stage.scroll_to(500.0);
        stage.notify_intersection(id, 1.0);
        assert!(log.borrow().is_empty());
        assert!(stage.take_updates().is_empty());
    }

    #[test]
    fn test_notify_intersection_respects_threshold() {
        let log = new_log();
        let mut stage = Stage::with_seed(Viewport::new(100.0, 100.0), 0);
        let id = stage.mount(Recorder::new(1, &log), Some(Rect::new(0.0, 500.0, 20.0, 20.0)));

        stage.notify_intersection(id, 0.05);
        assert!(log.borrow().is_empty());
        stage.notify_intersection(id, 0.5);
        stage.notify_intersection(id, 0.5);
        assert_eq!(log.borrow().len(), 1);
    }
}
