use tracing::debug;

use crate::catalog::{Artwork, Track};
use crate::composer::{
    Background, ControlsTheme, CoverState, InvalidEntryPolicy, Palette, TimebarScheme,
};
use crate::config::ComposerConfig;
use crate::render::CoverSnapshot;
use crate::utils::{format_time, parse_hex_color, parse_time, ColorParseError, TimeEntryInvalid};

/// 封面编辑器
///
/// 独占一份 `CoverState`，每次真实的状态变化都会让 `revision` 加一，
/// 界面据此决定是否重绘。
#[derive(Debug, Clone)]
pub struct Composer {
    track: Track,
    palette: Palette,
    policy: InvalidEntryPolicy,
    state: CoverState,
    revision: u64,
}

impl Composer {
    /// 根据曲目创建编辑器，初始播放位置为歌曲中点
    pub fn new(track: Track, palette: Palette, config: &ComposerConfig) -> Self {
        let palette = palette.or_defaults();
        let timebar = palette
            .timebar_index(&config.default_timebar)
            .unwrap_or_else(|| {
                debug!("未知的时间条配色 {}，使用第一个", config.default_timebar);
                0
            });
        let background = palette
            .resolve_background(&config.default_background)
            .unwrap_or_else(|e| {
                debug!("默认背景无效: {}，使用色板第一个", e);
                Background::Palette(0)
            });

        let state = CoverState {
            theme: config.default_theme,
            position_secs: track.duration_secs() / 2,
            show_album_cover: config.show_album_cover,
            timebar,
            background,
            time_entry_valid: true,
        };

        Self {
            track,
            palette,
            policy: config.invalid_time_entry,
            state,
            revision: 0,
        }
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn state(&self) -> &CoverState {
        &self.state
    }

    /// 状态版本号，仅在状态实际变化时递增
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn duration_secs(&self) -> u64 {
        self.track.duration_secs()
    }

    pub fn formatted_position(&self) -> String {
        format_time(self.state.position_secs)
    }

    pub fn formatted_duration(&self) -> String {
        format_time(self.duration_secs())
    }

    pub fn timebar_scheme(&self) -> &TimebarScheme {
        &self.palette.timebar[self.state.timebar]
    }

    pub fn background_label(&self) -> String {
        self.palette.background_label(&self.state.background)
    }

    fn touch(&mut self, changed: bool) -> bool {
        if changed {
            self.revision += 1;
        }
        changed
    }

    pub fn set_theme(&mut self, theme: ControlsTheme) -> bool {
        let changed = self.state.theme != theme;
        self.state.theme = theme;
        self.touch(changed)
    }

    pub fn toggle_theme(&mut self) -> bool {
        self.set_theme(self.state.theme.toggled())
    }

    pub fn set_show_album_cover(&mut self, show: bool) -> bool {
        let changed = self.state.show_album_cover != show;
        self.state.show_album_cover = show;
        self.touch(changed)
    }

    pub fn toggle_album_cover(&mut self) -> bool {
        self.set_show_album_cover(!self.state.show_album_cover)
    }

    /// 选择时间条配色，索引越界时忽略
    pub fn set_timebar(&mut self, index: usize) -> bool {
        if index >= self.palette.timebar.len() {
            return false;
        }
        let changed = self.state.timebar != index;
        self.state.timebar = index;
        self.touch(changed)
    }

    pub fn cycle_timebar(&mut self, forward: bool) -> bool {
        let len = self.palette.timebar.len();
        let next = step_index(self.state.timebar, len, forward);
        self.set_timebar(next)
    }

    /// 设置背景，色板索引越界时忽略
    pub fn set_background(&mut self, background: Background) -> bool {
        if let Background::Palette(index) = background {
            if index >= self.palette.backgrounds.len() {
                return false;
            }
        }
        let changed = self.state.background != background;
        self.state.background = background;
        self.touch(changed)
    }

    /// 在色板中切换背景，自选颜色时从第一个开始
    pub fn cycle_background(&mut self, forward: bool) -> bool {
        let next = match self.state.background {
            Background::Palette(index) => {
                step_index(index, self.palette.backgrounds.len(), forward)
            }
            Background::Custom(_) => 0,
        };
        self.set_background(Background::Palette(next))
    }

    /// 自选背景色，颜色无效时状态不变
    pub fn set_custom_background(&mut self, hex: &str) -> Result<bool, ColorParseError> {
        let color = parse_hex_color(hex)?;
        Ok(self.set_background(Background::Custom(color)))
    }

    /// 手动输入播放位置
    ///
    /// 输入有效时更新位置；无效时按策略归零或保留原位置，并标记为无效。
    pub fn enter_time(&mut self, text: &str) -> Result<u64, TimeEntryInvalid> {
        let before = self.state.clone();
        let result = parse_time(text, self.duration_secs());

        match result {
            Ok(seconds) => {
                self.state.position_secs = seconds;
                self.state.time_entry_valid = true;
            }
            Err(_) => {
                debug!("手动输入的时间无效: '{}'", text);
                if self.policy == InvalidEntryPolicy::Reset {
                    self.state.position_secs = 0;
                }
                self.state.time_entry_valid = false;
            }
        }

        let changed = self.state != before;
        self.touch(changed);
        result
    }

    /// 拖动时间条，结果限制在 [0, 歌曲时长]
    pub fn scrub(&mut self, delta_secs: i64) -> bool {
        let duration = self.duration_secs();
        let target = if delta_secs.is_negative() {
            self.state
                .position_secs
                .saturating_sub(delta_secs.unsigned_abs())
        } else {
            self.state
                .position_secs
                .saturating_add(delta_secs as u64)
                .min(duration)
        };

        let changed = self.state.position_secs != target;
        self.state.position_secs = target;
        self.touch(changed)
    }

    /// 冻结当前状态，用于导出
    pub fn snapshot(&self, artwork: &Artwork) -> CoverSnapshot {
        CoverSnapshot {
            track: self.track.clone(),
            artwork: artwork.clone(),
            theme: self.state.theme,
            position_secs: self.state.position_secs,
            show_album_cover: self.state.show_album_cover,
            timebar: self.timebar_scheme().clone(),
            background: self.palette.background_color(&self.state.background),
        }
    }
}

fn step_index(current: usize, len: usize, forward: bool) -> usize {
    if len == 0 {
        return 0;
    }
    if forward {
        (current + 1) % len
    } else {
        (current + len - 1) % len
    }
}
