// 封面导出模块
// 渲染快照并保存为文件，同一时间只允许一个导出任务

mod saver;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use crate::config::ExportConfig;
use crate::render::{CoverSnapshot, RenderConfig, Renderer};

pub use saver::{DownloadDirSaver, FileSaver};

/// 导出错误
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("已有导出任务正在进行")]
    Busy,

    #[error("无法渲染封面区域: {0}")]
    RegionNotRenderable(String),

    #[error("图片编码失败: {0}")]
    Encode(String),

    #[error("保存文件失败: {0}")]
    Io(#[from] std::io::Error),
}

/// 快照导出器
pub struct SnapshotExporter {
    renderer: Renderer,
    saver: Arc<dyn FileSaver>,
    filename: String,
    in_flight: AtomicBool,
}

/// 导出进行中的标记，离开作用域时释放
pub struct ExportGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl SnapshotExporter {
    pub fn new(renderer: Renderer, saver: Arc<dyn FileSaver>, filename: impl Into<String>) -> Self {
        Self {
            renderer,
            saver,
            filename: filename.into(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// 根据导出配置创建，文件保存到输出目录
    pub fn from_config(config: &ExportConfig) -> Self {
        let saver = DownloadDirSaver::new(config.resolve_output_dir());
        Self::new(
            Renderer::new(RenderConfig::from(config)),
            Arc::new(saver),
            config.filename.clone(),
        )
    }

    /// 是否有导出正在进行
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// 占用导出槽位，已被占用时返回 Busy
    pub fn begin(&self) -> Result<ExportGuard<'_>, ExportError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ExportError::Busy)?;
        Ok(ExportGuard {
            flag: &self.in_flight,
        })
    }

    /// 渲染并保存快照，只尝试一次
    pub fn export(&self, snapshot: &CoverSnapshot) -> Result<PathBuf, ExportError> {
        let _guard = self.begin()?;

        let result = self
            .renderer
            .render_png(snapshot)
            .and_then(|bytes| self.saver.save(&bytes, &self.filename));

        match &result {
            Ok(path) => info!("封面已保存: {:?}", path),
            Err(e) => error!("封面导出失败: {}", e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Artwork, Track};
    use crate::composer::{ControlsTheme, TimebarScheme};
    use crate::utils::Rgb;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySaver {
        saved: Mutex<Vec<(String, usize)>>,
    }

    impl FileSaver for MemorySaver {
        fn save(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, ExportError> {
            self.saved
                .lock()
                .unwrap()
                .push((filename.to_string(), bytes.len()));
            Ok(PathBuf::from(filename))
        }
    }

    fn snapshot() -> CoverSnapshot {
        CoverSnapshot {
            track: Track {
                id: "abc123".to_string(),
                title: "Song".to_string(),
                artists: vec!["Artist".to_string()],
                album: String::new(),
                images: vec![],
                duration_ms: 200_000,
            },
            artwork: Artwork::Unavailable {
                reason: "cross-origin".to_string(),
            },
            theme: ControlsTheme::White,
            position_secs: 100,
            show_album_cover: true,
            timebar: TimebarScheme {
                name: "blue".to_string(),
                filled: Rgb::new(0x31, 0x82, 0xce),
                track: Rgb::new(0xe2, 0xe8, 0xf0),
            },
            background: Rgb::BLACK,
        }
    }

    fn exporter(saver: Arc<MemorySaver>) -> SnapshotExporter {
        SnapshotExporter::new(
            Renderer::new(RenderConfig::from(&ExportConfig::default())),
            saver,
            "cover.png",
        )
    }

    #[test]
    fn test_second_export_while_in_flight_is_busy() {
        let saver = Arc::new(MemorySaver::default());
        let exporter = exporter(saver.clone());

        let guard = exporter.begin().unwrap();
        assert!(exporter.is_busy());
        assert!(matches!(exporter.export(&snapshot()), Err(ExportError::Busy)));
        drop(guard);

        assert!(!exporter.is_busy());
        assert!(saver.saved.lock().unwrap().is_empty());
    }

    #[test]
    fn test_render_failure_is_reported_and_nothing_saved() {
        let saver = Arc::new(MemorySaver::default());
        let exporter = exporter(saver.clone());

        let err = exporter.export(&snapshot()).unwrap_err();
        assert!(matches!(err, ExportError::RegionNotRenderable(_)));
        assert!(saver.saved.lock().unwrap().is_empty());

        // 失败后槽位被释放
        assert!(!exporter.is_busy());
    }
}
