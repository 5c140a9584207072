use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use track_cover_rs::app::{App, CoverOverrides};
use track_cover_rs::composer::ControlsTheme;
use track_cover_rs::config::Config;

/// 将 Spotify 曲目渲染为播放器样式的封面图片
#[derive(Parser, Debug)]
#[command(name = "track-cover-rs", version, about)]
struct Args {
    /// Spotify 曲目链接，不提供时在界面中输入
    url: Option<String>,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 不启动界面，直接保存封面（需要提供链接）
    #[arg(long)]
    headless: bool,

    /// 控件主题
    #[arg(long, value_enum)]
    theme: Option<ControlsTheme>,

    /// 初始播放位置 (MM:SS)
    #[arg(long, value_name = "MM:SS")]
    position: Option<String>,

    /// 隐藏专辑封面
    #[arg(long)]
    hide_cover: bool,

    /// 时间条配色名称
    #[arg(long, value_name = "NAME")]
    timebar: Option<String>,

    /// 背景色板名称或 #RRGGBB
    #[arg(long, value_name = "NAME|#RRGGBB")]
    background: Option<String>,

    /// 输出目录
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// 输出调试日志
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn overrides(&self) -> CoverOverrides {
        CoverOverrides {
            theme: self.theme,
            position: self.position.clone(),
            hide_cover: self.hide_cover,
            timebar: self.timebar.clone(),
            background: self.background.clone(),
        }
    }
}

/// 日志文件路径，界面模式下日志不能写到终端
fn log_file_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("track-cover-rs")
        .join("track-cover.log")
}

fn init_logging(debug: bool, headless: bool) -> Result<()> {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    } else {
        let path = log_file_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("无法创建日志目录 {:?}", parent))?;
        }
        let file = File::create(&path).with_context(|| format!("无法创建日志文件 {:?}", path))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.headless && args.url.is_none() {
        bail!("--headless 需要提供曲目链接");
    }

    init_logging(args.debug, args.headless)?;
    info!("track-cover-rs v{} 启动", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(args.config.clone())?;
    if let Some(dir) = &args.output_dir {
        config.export.output_dir = Some(dir.to_string_lossy().into_owned());
    }
    debug!("导出配置: {:?}", config.export);

    let app = App::new(Arc::new(config))?;
    let overrides = args.overrides();

    match args.url {
        Some(url) if args.headless => {
            let path = app.run_headless(&url, &overrides).await?;
            println!("{}", path.display());
        }
        url => app.run_tui(url, overrides).await?,
    }

    Ok(())
}
