use tracing::warn;

use crate::composer::Background;
use crate::config::PaletteConfig;
use crate::utils::{parse_hex_color, ColorParseError, Rgb};

/// 时间条配色
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimebarScheme {
    pub name: String,
    pub filled: Rgb,
    pub track: Rgb,
}

/// 背景色样本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundSwatch {
    pub name: String,
    pub color: Rgb,
}

/// 解析后的色板，作为显式参数传入编辑器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub timebar: Vec<TimebarScheme>,
    pub backgrounds: Vec<BackgroundSwatch>,
}

impl Palette {
    /// 从配置构建色板，跳过无效颜色；某一类为空时使用内置默认值
    pub fn from_config(config: &PaletteConfig) -> Self {
        Self::resolve(config).or_defaults()
    }

    /// 为空的类别换成内置默认值
    pub fn or_defaults(mut self) -> Self {
        if self.timebar.is_empty() || self.backgrounds.is_empty() {
            let fallback = Self::resolve(&PaletteConfig::default());
            if self.timebar.is_empty() {
                warn!("时间条色板为空，使用默认色板");
                self.timebar = fallback.timebar;
            }
            if self.backgrounds.is_empty() {
                warn!("背景色板为空，使用默认色板");
                self.backgrounds = fallback.backgrounds;
            }
        }

        self
    }

    fn resolve(config: &PaletteConfig) -> Self {
        let timebar = config
            .timebar
            .iter()
            .filter_map(|scheme| {
                match (parse_hex_color(&scheme.filled), parse_hex_color(&scheme.track)) {
                    (Ok(filled), Ok(track)) => Some(TimebarScheme {
                        name: scheme.name.clone(),
                        filled,
                        track,
                    }),
                    (Err(e), _) | (_, Err(e)) => {
                        warn!("忽略时间条配色 {}: {}", scheme.name, e);
                        None
                    }
                }
            })
            .collect();

        let backgrounds = config
            .backgrounds
            .iter()
            .filter_map(|swatch| match parse_hex_color(&swatch.color) {
                Ok(color) => Some(BackgroundSwatch {
                    name: swatch.name.clone(),
                    color,
                }),
                Err(e) => {
                    warn!("忽略背景色 {}: {}", swatch.name, e);
                    None
                }
            })
            .collect();

        Self {
            timebar,
            backgrounds,
        }
    }

    /// 按名称查找时间条配色（不区分大小写）
    pub fn timebar_index(&self, name: &str) -> Option<usize> {
        self.timebar
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    /// 按名称查找背景色（不区分大小写）
    pub fn background_index(&self, name: &str) -> Option<usize> {
        self.backgrounds
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    /// 将色板名称或 #RRGGBB 解析为背景
    pub fn resolve_background(&self, value: &str) -> Result<Background, ColorParseError> {
        match self.background_index(value) {
            Some(index) => Ok(Background::Palette(index)),
            None => parse_hex_color(value).map(Background::Custom),
        }
    }

    /// 背景对应的实际颜色
    pub fn background_color(&self, background: &Background) -> Rgb {
        match background {
            Background::Palette(index) => self
                .backgrounds
                .get(*index)
                .map(|s| s.color)
                .unwrap_or(Rgb::BLACK),
            Background::Custom(color) => *color,
        }
    }

    /// 背景的显示名称
    pub fn background_label(&self, background: &Background) -> String {
        match background {
            Background::Palette(index) => self
                .backgrounds
                .get(*index)
                .map(|s| format!("{} ({})", s.name, s.color))
                .unwrap_or_else(|| "?".to_string()),
            Background::Custom(color) => format!("自定义 ({})", color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackgroundSwatchConfig, TimebarSchemeConfig};

    #[test]
    fn test_default_palette() {
        let palette = Palette::from_config(&PaletteConfig::default());
        assert_eq!(palette.timebar.len(), 18);
        assert_eq!(palette.timebar_index("BLUE"), palette.timebar_index("blue"));
        assert!(palette.timebar_index("blue").is_some());
        assert_eq!(palette.background_index("midnight"), Some(0));
    }

    #[test]
    fn test_invalid_entries_are_skipped() {
        let config = PaletteConfig {
            timebar: vec![
                TimebarSchemeConfig {
                    name: "bad".to_string(),
                    filled: "nope".to_string(),
                    track: "#ffffff".to_string(),
                },
                TimebarSchemeConfig {
                    name: "good".to_string(),
                    filled: "#ff0000".to_string(),
                    track: "#eeeeee".to_string(),
                },
            ],
            backgrounds: vec![BackgroundSwatchConfig {
                name: "broken".to_string(),
                color: "#zz".to_string(),
            }],
        };

        let palette = Palette::from_config(&config);
        assert_eq!(palette.timebar.len(), 1);
        assert_eq!(palette.timebar[0].name, "good");

        // 背景全部无效，回退到默认
        assert_eq!(
            palette.backgrounds.len(),
            PaletteConfig::default().backgrounds.len()
        );
    }

    #[test]
    fn test_resolve_background() {
        let palette = Palette::from_config(&PaletteConfig::default());
        assert_eq!(
            palette.resolve_background("spotify").unwrap(),
            Background::Palette(1)
        );
        assert_eq!(
            palette.resolve_background("#102030").unwrap(),
            Background::Custom(Rgb::new(0x10, 0x20, 0x30))
        );
        assert!(palette.resolve_background("not-a-color").is_err());
        assert_eq!(
            palette.background_color(&Background::Palette(1)),
            Rgb::new(0x1d, 0xb9, 0x54)
        );
    }
}
