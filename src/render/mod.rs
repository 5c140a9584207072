// 封面渲染模块
// 将冻结的封面状态生成 SVG 场景并光栅化为 PNG

mod fonts;
mod raster;
mod scene;

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info};

use crate::catalog::{Artwork, Track};
use crate::composer::{ControlsTheme, TimebarScheme};
use crate::config::ExportConfig;
use crate::export::ExportError;
use crate::utils::Rgb;

pub use scene::{build_scene, SceneOptions, CANVAS_HEIGHT, CANVAS_WIDTH};

/// 导出时冻结的封面
#[derive(Debug, Clone)]
pub struct CoverSnapshot {
    pub track: Track,
    pub artwork: Artwork,
    pub theme: ControlsTheme,
    pub position_secs: u64,
    pub show_album_cover: bool,
    pub timebar: TimebarScheme,
    pub background: Rgb,
}

/// 渲染设置
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// 像素倍率
    pub scale: f32,
    pub font_family: String,
    pub font_dirs: Vec<PathBuf>,
}

impl From<&ExportConfig> for RenderConfig {
    fn from(config: &ExportConfig) -> Self {
        Self {
            scale: config.scale,
            font_family: config.font_family.clone(),
            font_dirs: config.font_dirs.iter().map(PathBuf::from).collect(),
        }
    }
}

/// 封面渲染器，字体库在首次渲染时加载
pub struct Renderer {
    config: RenderConfig,
    fontdb: OnceLock<Arc<usvg::fontdb::Database>>,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            fontdb: OnceLock::new(),
        }
    }

    fn fontdb(&self) -> Arc<usvg::fontdb::Database> {
        self.fontdb
            .get_or_init(|| fonts::build_fontdb(&self.config.font_dirs))
            .clone()
    }

    fn scale(&self) -> f32 {
        if self.config.scale.is_finite() && self.config.scale > 0.0 {
            self.config.scale
        } else {
            1.0
        }
    }

    /// 渲染封面为 PNG 字节
    pub fn render_png(&self, snapshot: &CoverSnapshot) -> Result<Vec<u8>, ExportError> {
        // 封面可见时必须能够解码，否则宁可失败也不输出缺图的结果
        let artwork_href = if snapshot.show_album_cover {
            Some(raster::artwork_data_uri(&snapshot.artwork)?)
        } else {
            None
        };

        let fontdb = self.fontdb();
        if fontdb.is_empty() {
            return Err(ExportError::RegionNotRenderable(
                "未找到可用字体，无法绘制文字".to_string(),
            ));
        }

        let svg = build_scene(
            snapshot,
            &SceneOptions {
                font_family: self.config.font_family.clone(),
                artwork_href,
            },
        );
        debug!("封面 SVG 场景生成完成，{} 字节", svg.len());

        let image = raster::rasterize(&svg, fontdb, self.scale())?;
        let png = raster::encode_png(&image)?;
        info!(
            "封面渲染完成: {}x{}, {} 字节",
            image.width(),
            image.height(),
            png.len()
        );
        Ok(png)
    }
}
