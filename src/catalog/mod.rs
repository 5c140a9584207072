mod spotify;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;

pub use spotify::SpotifyCatalog;

/// 专辑图片（不同尺寸）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumImage {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// 曲目元数据，获取后不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// 曲目 ID
    pub id: String,
    /// 歌曲标题
    pub title: String,
    /// 艺术家，保持接口返回的顺序
    pub artists: Vec<String>,
    /// 专辑
    pub album: String,
    /// 专辑图片
    pub images: Vec<AlbumImage>,
    /// 歌曲时长（毫秒）
    pub duration_ms: u64,
}

impl Track {
    /// 歌曲时长（整秒，向下取整）
    pub fn duration_secs(&self) -> u64 {
        self.duration_ms / 1000
    }

    /// 以逗号连接的艺术家名称
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }

    /// 选择宽度不小于 `target_px` 的最小图片，都不满足时选择最大的
    pub fn best_image(&self, target_px: u32) -> Option<&AlbumImage> {
        let width = |img: &AlbumImage| img.width.unwrap_or(0);

        self.images
            .iter()
            .filter(|img| width(img) >= target_px)
            .min_by_key(|img| width(img))
            .or_else(|| self.images.iter().max_by_key(|img| width(img)))
    }
}

/// 专辑封面图片数据
#[derive(Debug, Clone)]
pub enum Artwork {
    Loaded { bytes: Arc<Vec<u8>> },
    Unavailable { reason: String },
}

impl Artwork {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Artwork::Loaded { .. })
    }
}

/// 元数据获取错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("凭据验证失败: {0}")]
    AuthFailure(String),

    #[error("曲目不存在: {0}")]
    NotFound(String),

    #[error("网络暂时不可用: {0}")]
    TransientNetworkFailure(String),

    #[error("接口返回了无法识别的数据: {0}")]
    MalformedResponse(String),
}

/// 曲目元数据提供者接口
#[async_trait]
pub trait TrackCatalog: Send + Sync {
    /// 获取提供者名称
    fn name(&self) -> &str;

    /// 根据 ID 获取曲目
    async fn fetch_track(&self, track_id: &str) -> Result<Track, FetchError>;

    /// 下载专辑图片
    async fn fetch_artwork(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// 一次加载的结果：曲目和封面
#[derive(Debug, Clone)]
pub struct LoadedTrack {
    pub track: Track,
    pub artwork: Artwork,
}

/// 获取曲目及其封面
///
/// 封面下载失败不影响曲目本身，只在导出时体现。
pub async fn load_track(
    catalog: &dyn TrackCatalog,
    track_id: &str,
    artwork_size: u32,
) -> Result<LoadedTrack, FetchError> {
    debug!("从 {} 获取曲目 {}", catalog.name(), track_id);
    let track = catalog.fetch_track(track_id).await?;
    info!(
        "已获取曲目: {} - {} ({}ms)",
        track.artist_line(),
        track.title,
        track.duration_ms
    );

    let artwork = match track.best_image(artwork_size) {
        Some(image) => match catalog.fetch_artwork(&image.url).await {
            Ok(bytes) => {
                debug!("专辑封面下载完成，{} 字节", bytes.len());
                Artwork::Loaded {
                    bytes: Arc::new(bytes),
                }
            }
            Err(e) => {
                warn!("专辑封面下载失败: {}", e);
                Artwork::Unavailable {
                    reason: e.to_string(),
                }
            }
        },
        None => {
            warn!("曲目 {} 没有专辑图片", track.id);
            Artwork::Unavailable {
                reason: "曲目没有专辑图片".to_string(),
            }
        }
    };

    Ok(LoadedTrack { track, artwork })
}

/// 根据配置创建元数据提供者
pub fn setup_catalog(config: &Config) -> Arc<dyn TrackCatalog> {
    let credentials = config.credentials.resolve();
    if credentials.is_none() {
        warn!("未配置 Spotify 凭据，获取曲目将失败");
    }
    Arc::new(SpotifyCatalog::new(config.api.clone(), credentials))
}
