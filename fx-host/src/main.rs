//! FX Host - 无头宿主
//!
//! 加载场景配置，模拟一次滚动 + 指针会话，输出效果产生的渲染补丁。
//!
//! ```text
//! fx-host scenes/portfolio.json --format summary
//! fx-host --config fx-host.json --duration 10 > updates.jsonl
//! ```

mod config;
mod session;

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use fx_runtime::SceneConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{HostConfig, OutputFormat};
use session::{SessionPlan, Summary};

#[derive(Parser, Debug)]
#[command(author, version, about = "视口触发动画的无头宿主", long_about = None)]
struct Cli {
    /// 场景文件（覆盖配置文件中的 scene_path）
    #[arg(value_name = "SCENE")]
    scene: Option<PathBuf>,

    /// 宿主配置文件
    #[arg(long, default_value = "fx-host.json")]
    config: PathBuf,

    /// 模拟帧率
    #[arg(long)]
    fps: Option<u32>,

    /// 模拟时长（秒）
    #[arg(long)]
    duration: Option<f32>,

    /// 滚动速度（像素 / 秒）
    #[arg(long)]
    scroll_speed: Option<f32>,

    /// 随机种子（覆盖场景中的 seed）
    #[arg(long)]
    seed: Option<u64>,

    /// 输出格式
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// 关闭指针模拟
    #[arg(long)]
    no_pointer: bool,

    /// 日志过滤指令（如 `debug`、`fx_runtime=trace`），缺省读取 RUST_LOG
    #[arg(long)]
    log: Option<String>,
}

impl Cli {
    /// 命令行参数覆盖配置文件
    fn apply(&self, config: &mut HostConfig) {
        if let Some(scene) = &self.scene {
            config.scene_path = scene.clone();
        }
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(duration) = self.duration {
            config.duration = duration;
        }
        if let Some(scroll_speed) = self.scroll_speed {
            config.scroll_speed = scroll_speed;
        }
        if let Some(format) = self.format {
            config.output = format;
        }
        if self.no_pointer {
            config.pointer_sweep = false;
        }
    }
}

fn init_logging(directive: Option<&str>) {
    let filter = match directive {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    // 日志写到 stderr，stdout 留给补丁输出
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref());

    let mut config = HostConfig::load(&cli.config);
    cli.apply(&mut config);
    config.validate().context("宿主配置无效")?;

    let mut scene = SceneConfig::load(&config.scene_path)
        .with_context(|| format!("无法加载场景 {}", config.scene_path.display()))?;
    if let Some(seed) = cli.seed {
        scene.seed = Some(seed);
    }

    let (mut stage, ids) = scene.instantiate()?;
    info!(effects = ids.len(), viewport = ?stage.viewport(), "场景已挂载");

    let plan = SessionPlan::new(&config, &scene);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match config.output {
        OutputFormat::Jsonl => {
            session::run(&mut stage, &plan, |update| {
                serde_json::to_writer(&mut out, &update)?;
                out.write_all(b"\n")?;
                Ok(())
            })?;
        }
        OutputFormat::Summary => {
            let mut summary = Summary::default();
            session::run(&mut stage, &plan, |update| {
                summary.record(&update);
                Ok(())
            })?;

            let labels: Vec<String> = scene
                .effects
                .iter()
                .enumerate()
                .map(|(index, entry)| entry.label(index))
                .collect();
            for effect in summary.effects() {
                let label = ids
                    .iter()
                    .position(|id| *id == effect.effect)
                    .and_then(|index| labels.get(index))
                    .map_or("?", String::as_str);
                writeln!(
                    out,
                    "{:<20} {:>6} 条补丁  最后: {:<8} @ {:.3}s",
                    label, effect.updates, effect.last_kind, effect.last_time
                )?;
            }
            writeln!(out, "共 {} 条补丁", summary.total())?;
        }
    }

    out.flush()?;
    info!("会话结束，全部资源已释放");
    Ok(())
}
