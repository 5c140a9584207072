use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::composer::{ControlsTheme, InvalidEntryPolicy};

/// 凭据环境变量，优先于配置文件
pub const CLIENT_ID_ENV: &str = "SPOTIFY_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "SPOTIFY_CLIENT_SECRET";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// Spotify 应用凭据
    pub credentials: CredentialsConfig,

    /// 元数据接口设置
    pub api: ApiConfig,

    /// 封面编辑器默认值
    pub composer: ComposerConfig,

    /// 时间条与背景色板
    pub palette: PaletteConfig,

    /// 导出设置
    pub export: ExportConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CredentialsConfig {
    pub client_id: String,
    pub client_secret: String,
}

impl CredentialsConfig {
    /// 合并环境变量后的凭据，缺少任意一项时返回 None
    pub fn resolve(&self) -> Option<(String, String)> {
        let pick = |env_key: &str, configured: &str| {
            env::var(env_key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .or_else(|| Some(configured.to_string()).filter(|v| !v.trim().is_empty()))
        };

        let client_id = pick(CLIENT_ID_ENV, &self.client_id)?;
        let client_secret = pick(CLIENT_SECRET_ENV, &self.client_secret)?;
        Some((client_id, client_secret))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    /// Web API 根地址
    pub api_base: String,

    /// 换取 access token 的地址
    pub token_url: String,

    /// 单次请求超时（秒）
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.spotify.com/v1".to_string(),
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ComposerConfig {
    /// 控件主题
    pub default_theme: ControlsTheme,

    /// 是否默认显示专辑封面
    pub show_album_cover: bool,

    /// 默认时间条配色名称
    pub default_timebar: String,

    /// 默认背景，色板名称或 #RRGGBB
    pub default_background: String,

    /// 手动输入时间无效时的处理方式
    pub invalid_time_entry: InvalidEntryPolicy,

    /// 选择专辑图片时的目标宽度（像素）
    pub artwork_size: u32,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            default_theme: ControlsTheme::White,
            show_album_cover: true,
            default_timebar: "blue".to_string(),
            default_background: "midnight".to_string(),
            invalid_time_entry: InvalidEntryPolicy::Reset,
            artwork_size: 300,
        }
    }
}

/// 时间条配色
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TimebarSchemeConfig {
    pub name: String,
    /// 已播放部分
    pub filled: String,
    /// 未播放部分
    pub track: String,
}

/// 背景色样本
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BackgroundSwatchConfig {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PaletteConfig {
    pub timebar: Vec<TimebarSchemeConfig>,
    pub backgrounds: Vec<BackgroundSwatchConfig>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        let scheme = |name: &str, filled: &str| TimebarSchemeConfig {
            name: name.to_string(),
            filled: filled.to_string(),
            track: "#e2e8f0".to_string(),
        };
        let swatch = |name: &str, color: &str| BackgroundSwatchConfig {
            name: name.to_string(),
            color: color.to_string(),
        };

        Self {
            timebar: vec![
                scheme("whiteAlpha", "#ffffff"),
                scheme("blackAlpha", "#000000"),
                scheme("gray", "#718096"),
                scheme("red", "#e53e3e"),
                scheme("orange", "#dd6b20"),
                scheme("yellow", "#d69e2e"),
                scheme("green", "#38a169"),
                scheme("teal", "#319795"),
                scheme("blue", "#3182ce"),
                scheme("cyan", "#00b5d8"),
                scheme("purple", "#805ad5"),
                scheme("pink", "#d53f8c"),
                scheme("linkedin", "#0077b5"),
                scheme("facebook", "#385898"),
                scheme("messenger", "#0084ff"),
                scheme("whatsapp", "#22c35e"),
                scheme("twitter", "#1da1f2"),
                scheme("telegram", "#0088cc"),
            ],
            backgrounds: vec![
                swatch("midnight", "#121212"),
                swatch("spotify", "#1db954"),
                swatch("ocean", "#1e3a5f"),
                swatch("sunset", "#e76f51"),
                swatch("sand", "#f4e9d8"),
                swatch("lavender", "#b8b5ff"),
                swatch("snow", "#ffffff"),
            ],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ExportConfig {
    /// 导出文件名
    pub filename: String,

    /// 输出目录，留空时使用系统下载目录
    pub output_dir: Option<String>,

    /// 像素倍率，1.0 对应 1500x500
    pub scale: f32,

    /// 文字字体
    pub font_family: String,

    /// 额外的字体目录
    pub font_dirs: Vec<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            filename: "cover.png".to_string(),
            output_dir: None,
            scale: 1.0,
            font_family: "sans-serif".to_string(),
            font_dirs: Vec::new(),
        }
    }
}

impl ExportConfig {
    /// 实际输出目录
    pub fn resolve_output_dir(&self) -> PathBuf {
        self.output_dir
            .as_ref()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

impl Config {
    /// 默认配置文件路径
    pub fn default_path() -> PathBuf {
        let pkg_name = env!("CARGO_PKG_NAME");
        dirs::config_dir()
            .map(|p| p.join(pkg_name).join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(format!("{}-config.toml", pkg_name)))
    }

    /// 加载配置，支持从指定路径或默认路径加载
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = path.unwrap_or_else(Self::default_path);

        debug!("尝试从 {:?} 加载配置文件", config_path);

        if !config_path.exists() {
            debug!("配置文件 {:?} 不存在，将创建默认配置", config_path);
            let default_config = Config::default();
            let toml = toml::to_string_pretty(&default_config)?;

            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
                debug!("已确保目录 {:?} 存在", parent);
            }

            fs::write(&config_path, toml)?;
            info!("已创建默认配置文件: {:?}", config_path);
            return Ok(default_config);
        }

        let content = fs::read_to_string(&config_path)?;
        let config: Config = match toml::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!("解析配置文件 {:?} 失败: {}", config_path, e);
                warn!("由于解析错误，将加载默认配置");
                Config::default()
            }
        };

        debug!("已成功加载配置文件");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load(Some(path.clone())).unwrap();
        assert!(path.exists());
        assert_eq!(config.export.filename, "cover.png");
        assert_eq!(config.api.timeout_secs, 10);

        // 再次加载应读取刚写入的文件
        let reloaded = Config::load(Some(path)).unwrap();
        assert_eq!(reloaded.palette.timebar.len(), config.palette.timebar.len());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[composer]
default_theme = "black"
invalid_time_entry = "keep_last"

[export]
scale = 2.0
"#,
        )
        .unwrap();

        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.composer.default_theme, ControlsTheme::Black);
        assert_eq!(
            config.composer.invalid_time_entry,
            InvalidEntryPolicy::KeepLast
        );
        assert_eq!(config.composer.default_timebar, "blue");
        assert_eq!(config.export.scale, 2.0);
        assert_eq!(config.export.filename, "cover.png");
    }

    #[test]
    fn test_broken_config_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is = = not toml").unwrap();

        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.api.api_base, "https://api.spotify.com/v1");
    }

    #[test]
    fn test_output_dir_override() {
        let export = ExportConfig {
            output_dir: Some("/tmp/covers".to_string()),
            ..ExportConfig::default()
        };
        assert_eq!(export.resolve_output_dir(), PathBuf::from("/tmp/covers"));
    }
}
