use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::catalog::Artwork;
use crate::composer::Composer;
use crate::tui::theme::Theme;

/// 封面预览组件：曲目信息和当前的封面设置
pub struct CoverPreview<'a> {
    composer: &'a Composer,
    artwork: &'a Artwork,
    theme: &'a Theme,
}

impl<'a> CoverPreview<'a> {
    pub fn new(composer: &'a Composer, artwork: &'a Artwork, theme: &'a Theme) -> Self {
        Self {
            composer,
            artwork,
            theme,
        }
    }

    /// 渲染预览
    pub fn render(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title(Span::styled("封面", self.theme.title_style()));

        let mut lines = vec![self.create_track_line(), Line::from("")];
        lines.extend(self.create_settings_lines());

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    /// 歌名 • 艺术家 • 专辑
    fn create_track_line(&self) -> Line<'_> {
        let track = self.composer.track();
        let mut spans = vec![
            Span::styled(track.title.as_str(), self.theme.accent_style()),
            Span::styled(" • ", self.theme.status_style()),
            Span::styled(track.artist_line(), self.theme.text_style()),
        ];

        if !track.album.trim().is_empty() && track.album != track.title {
            spans.push(Span::styled(" • ", self.theme.status_style()));
            spans.push(Span::styled(track.album.as_str(), self.theme.status_style()));
        }

        Line::from(spans)
    }

    fn create_settings_lines(&self) -> Vec<Line<'_>> {
        let state = self.composer.state();
        let background = self
            .composer
            .palette()
            .background_color(&state.background);

        vec![
            Line::from(vec![
                Span::styled("控件主题  ", self.theme.status_style()),
                Span::styled("■ ", self.theme.swatch_style(state.theme.color())),
                Span::styled(state.theme.label(), self.theme.text_style()),
            ]),
            Line::from(vec![
                Span::styled("背景颜色  ", self.theme.status_style()),
                Span::styled("■ ", self.theme.swatch_style(background)),
                Span::styled(self.composer.background_label(), self.theme.text_style()),
            ]),
            self.create_artwork_line(state.show_album_cover),
        ]
    }

    /// 专辑封面状态，显示封面但图片不可用时给出提示
    fn create_artwork_line(&self, visible: bool) -> Line<'_> {
        let label = Span::styled("专辑封面  ", self.theme.status_style());
        if !visible {
            return Line::from(vec![label, Span::styled("隐藏", self.theme.dimmed_style())]);
        }

        match self.artwork {
            Artwork::Loaded { bytes } => Line::from(vec![
                label,
                Span::styled("显示", self.theme.text_style()),
                Span::styled(
                    format!(" ({} KB)", bytes.len().div_ceil(1024)),
                    self.theme.dimmed_style(),
                ),
            ]),
            Artwork::Unavailable { reason } => Line::from(vec![
                label,
                Span::styled("显示", self.theme.text_style()),
                Span::styled(
                    format!(" (图片不可用，无法导出: {})", reason),
                    self.theme.error_style(),
                ),
            ]),
        }
    }
}
