// 封面编辑模块
// 保存可编辑的封面状态，并根据用户操作更新

mod editor;
mod palette;

use serde::{Deserialize, Serialize};

use crate::utils::Rgb;

pub use editor::Composer;
pub use palette::{BackgroundSwatch, Palette, TimebarScheme};

/// 控件主题（文字与播放按钮颜色）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ControlsTheme {
    #[default]
    White,
    Black,
}

impl ControlsTheme {
    /// 主题对应的前景色
    pub fn color(&self) -> Rgb {
        match self {
            ControlsTheme::White => Rgb::WHITE,
            ControlsTheme::Black => Rgb::BLACK,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            ControlsTheme::White => ControlsTheme::Black,
            ControlsTheme::Black => ControlsTheme::White,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ControlsTheme::White => "白色",
            ControlsTheme::Black => "黑色",
        }
    }
}

/// 手动输入时间无效时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidEntryPolicy {
    /// 播放位置归零
    #[default]
    Reset,
    /// 保留上一次的有效位置
    KeepLast,
}

/// 背景颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    /// 色板中的第 n 个颜色
    Palette(usize),
    /// 自选颜色
    Custom(Rgb),
}

/// 可编辑的封面状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverState {
    pub theme: ControlsTheme,
    /// 当前播放位置（秒），始终在 [0, 歌曲时长] 内
    pub position_secs: u64,
    pub show_album_cover: bool,
    /// 时间条配色在色板中的索引
    pub timebar: usize,
    pub background: Background,
    /// 最近一次手动输入是否有效
    pub time_entry_valid: bool,
}
