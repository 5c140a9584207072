use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::composer::Composer;
use crate::tui::theme::Theme;

/// 时间条组件，按当前配色显示播放位置
pub struct Scrubber<'a> {
    composer: &'a Composer,
    theme: &'a Theme,
}

impl<'a> Scrubber<'a> {
    pub fn new(composer: &'a Composer, theme: &'a Theme) -> Self {
        Self { composer, theme }
    }

    /// 渲染时间条
    pub fn render(&self, f: &mut Frame, area: Rect) {
        let scheme = self.composer.timebar_scheme();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title(Line::from(vec![
                Span::styled("时间条 ", self.theme.title_style()),
                Span::styled(scheme.name.as_str(), self.theme.swatch_style(scheme.filled)),
            ]));

        let inner = block.inner(area);
        f.render_widget(block, area);

        // 两侧时间各占 5 列，加上空格
        let bar_width = (inner.width as usize).saturating_sub(14).max(10);
        let paragraph = Paragraph::new(self.create_progress_line(bar_width));
        f.render_widget(paragraph, inner);
    }

    /// 创建进度条行
    fn create_progress_line(&self, bar_width: usize) -> Line<'_> {
        let state = self.composer.state();
        let scheme = self.composer.timebar_scheme();
        let filled_width = filled_cells(state.position_secs, self.composer.duration_secs(), bar_width);

        let time_style = if state.time_entry_valid {
            self.theme.text_style()
        } else {
            self.theme.error_style()
        };

        let mut spans = vec![
            Span::styled(self.composer.formatted_position(), time_style),
            Span::raw(" "),
        ];

        spans.push(Span::styled(
            "━".repeat(filled_width),
            self.theme.swatch_style(scheme.filled),
        ));
        spans.push(Span::styled("●", self.theme.swatch_style(scheme.filled)));
        spans.push(Span::styled(
            "─".repeat(bar_width.saturating_sub(filled_width + 1)),
            self.theme.swatch_style(scheme.track),
        ));

        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            self.composer.formatted_duration(),
            self.theme.text_style(),
        ));

        Line::from(spans)
    }
}

/// 已播放部分占用的格数，滑块本身占一格
fn filled_cells(position_secs: u64, duration_secs: u64, bar_width: usize) -> usize {
    if duration_secs == 0 || bar_width == 0 {
        return 0;
    }
    let progress = (position_secs as f64 / duration_secs as f64).min(1.0);
    ((progress * bar_width as f64) as usize).min(bar_width - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_cells() {
        assert_eq!(filled_cells(0, 200, 20), 0);
        assert_eq!(filled_cells(100, 200, 20), 10);
        assert_eq!(filled_cells(200, 200, 20), 19);
        assert_eq!(filled_cells(10, 0, 20), 0);
    }
}
