//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 fx-runtime 覆盖率
//! - `scene-check`: 检查场景文件（解析、参数验证、资源释放）

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fx_runtime::{ConfigError, SceneConfig};
use walkdir::WalkDir;
use xshell::{Shell, cmd};

#[derive(Parser)]
#[command(name = "xtask", about = "开发辅助工具")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// 运行 fmt、clippy、test 门禁检查
    CheckAll,
    /// 运行 fx-runtime 覆盖率报告
    CovRuntime,
    /// 检查场景文件
    ///
    /// 不带参数：检查 scenes/ 下所有 .json 文件；
    /// 带路径参数：检查指定文件或目录
    SceneCheck { path: Option<PathBuf> },
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;

    match cli.command {
        Task::CheckAll => {
            eprintln!("\n==> cargo fmt --all -- --check");
            cmd!(sh, "cargo fmt --all -- --check").run()?;

            eprintln!("\n==> cargo clippy --workspace --all-targets");
            cmd!(sh, "cargo clippy --workspace --all-targets").run()?;

            eprintln!("\n==> cargo test --workspace");
            cmd!(sh, "cargo test --workspace").run()?;
        }
        Task::CovRuntime => {
            if cmd!(sh, "cargo llvm-cov --version").quiet().run().is_err() {
                anyhow::bail!(
                    "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
                );
            }

            eprintln!("\n==> cargo llvm-cov -p fx-runtime --html");
            cmd!(sh, "cargo llvm-cov -p fx-runtime --html").run()?;
            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        Task::SceneCheck { path } => scene_check(path.as_deref())?,
    }

    Ok(())
}

//=============================================================================
// scene-check 命令实现
//=============================================================================

/// 默认场景目录（相对于 workspace root）
const SCENES_DIR: &str = "scenes";

/// 场景检查结果
#[derive(Default)]
struct SceneCheckResult {
    scenes_checked: usize,
    errors: usize,
    warnings: usize,
}

fn scene_check(path: Option<&Path>) -> anyhow::Result<()> {
    let root = path.unwrap_or(Path::new(SCENES_DIR));
    if !root.exists() {
        anyhow::bail!(
            "路径不存在: {}\n请在 workspace 根目录运行，或指定场景路径",
            root.display()
        );
    }

    let files = collect_scene_files(root);
    if files.is_empty() {
        eprintln!("未找到场景文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个场景文件...\n", files.len());

    let mut result = SceneCheckResult::default();
    for file in &files {
        check_scene_file(file, &mut result);
    }

    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个场景", result.scenes_checked);
    if result.errors > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", result.errors, result.warnings);
        anyhow::bail!("场景检查发现错误");
    } else if result.warnings > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", result.warnings);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
    Ok(())
}

/// 收集场景文件（单个文件或目录下全部 .json）
fn collect_scene_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

fn check_scene_file(file: &Path, result: &mut SceneCheckResult) {
    let scene_id = file.display().to_string();
    result.scenes_checked += 1;

    let scene = match SceneConfig::load(file) {
        Ok(scene) => scene,
        Err(ConfigError::Validation { effect, message }) => {
            eprintln!("[ERROR] {}: 效果 '{}' - {}", scene_id, effect, message);
            result.errors += 1;
            return;
        }
        Err(e) => {
            eprintln!("[ERROR] {}: {}", scene_id, e);
            result.errors += 1;
            return;
        }
    };

    for (index, entry) in scene.effects.iter().enumerate() {
        if entry.rect.is_none() && entry.effect.needs_target() {
            eprintln!(
                "[WARN] {}: 效果 '{}' 未指定 rect，不会被触发",
                scene_id,
                entry.label(index)
            );
            result.warnings += 1;
        }
    }

    // 挂载后立即卸载，确认没有残留资源
    match scene.instantiate() {
        Ok((mut stage, _)) => {
            stage.unmount_all();
            if !stage.resources().is_idle() {
                eprintln!(
                    "[ERROR] {}: 卸载后仍有残留资源 {:?}",
                    scene_id,
                    stage.resources()
                );
                result.errors += 1;
            }
        }
        Err(e) => {
            eprintln!("[ERROR] {}: {}", scene_id, e);
            result.errors += 1;
        }
    }
}
