use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{debug, info};

use crate::catalog::{self, TrackCatalog};
use crate::composer::{Composer, ControlsTheme, Palette};
use crate::config::Config;
use crate::export::SnapshotExporter;
use crate::tui::TuiApp;
use crate::utils::extract_track_id;

/// 命令行中指定的封面初始设置
#[derive(Debug, Clone, Default)]
pub struct CoverOverrides {
    pub theme: Option<ControlsTheme>,
    /// MM:SS，按手动输入规则处理
    pub position: Option<String>,
    pub hide_cover: bool,
    pub timebar: Option<String>,
    /// 色板名称或 #RRGGBB
    pub background: Option<String>,
}

impl CoverOverrides {
    /// 应用到编辑器
    ///
    /// 每一项独立生效，无效的项不影响其余设置，所有错误合并后返回。
    pub fn apply(&self, composer: &mut Composer) -> Result<()> {
        let mut errors = Vec::new();

        if let Some(theme) = self.theme {
            composer.set_theme(theme);
        }
        if self.hide_cover {
            composer.set_show_album_cover(false);
        }
        if let Some(name) = &self.timebar {
            match composer.palette().timebar_index(name) {
                Some(index) => {
                    composer.set_timebar(index);
                }
                None => errors.push(format!("未知的时间条配色: {}", name)),
            }
        }
        if let Some(value) = &self.background {
            match composer.palette().resolve_background(value) {
                Ok(background) => {
                    composer.set_background(background);
                }
                Err(e) => errors.push(e.to_string()),
            }
        }
        if let Some(position) = &self.position {
            if let Err(e) = composer.enter_time(position) {
                errors.push(format!("{}: '{}'", e, position));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(errors.join("; ")))
        }
    }
}

pub struct App {
    config: Arc<Config>,
    catalog: Arc<dyn TrackCatalog>,
    exporter: Arc<SnapshotExporter>,
}

impl App {
    /// 创建新应用实例
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let catalog = catalog::setup_catalog(&config);
        let exporter = Arc::new(SnapshotExporter::from_config(&config.export));
        Ok(Self {
            config,
            catalog,
            exporter,
        })
    }

    /// 不启动界面，直接生成并保存封面
    pub async fn run_headless(&self, url: &str, overrides: &CoverOverrides) -> Result<PathBuf> {
        let track_id = extract_track_id(url)?;
        debug!("解析到曲目 ID: {}", track_id);

        let loaded = catalog::load_track(
            self.catalog.as_ref(),
            &track_id,
            self.config.composer.artwork_size,
        )
        .await?;

        let mut composer = Composer::new(
            loaded.track,
            Palette::from_config(&self.config.palette),
            &self.config.composer,
        );
        overrides.apply(&mut composer)?;
        info!(
            "封面设置: 主题={}, 位置={}, 时间条={}, 背景={}",
            composer.state().theme.label(),
            composer.formatted_position(),
            composer.timebar_scheme().name,
            composer.background_label()
        );

        let snapshot = composer.snapshot(&loaded.artwork);
        let exporter = Arc::clone(&self.exporter);
        let path = tokio::task::spawn_blocking(move || exporter.export(&snapshot)).await??;
        Ok(path)
    }

    /// 运行交互界面
    pub async fn run_tui(&self, url: Option<String>, overrides: CoverOverrides) -> Result<()> {
        debug!("启动 TUI 界面");
        let mut tui = TuiApp::new(
            Arc::clone(&self.config),
            Arc::clone(&self.catalog),
            Arc::clone(&self.exporter),
            overrides,
        );
        tui.run(url).await
    }
}
