use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::tui::theme::Theme;

/// 状态栏信息
#[derive(Debug, Clone, Default)]
pub struct StatusInfo {
    pub message: Option<String>,
    pub level: StatusLevel,
    /// 导出进行中，保存按钮不可用
    pub exporting: bool,
}

/// 消息级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusLevel {
    #[default]
    Info,
    Success,
    Error,
}

impl StatusInfo {
    pub fn info(&mut self, message: impl Into<String>) {
        self.set(StatusLevel::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.set(StatusLevel::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.set(StatusLevel::Error, message);
    }

    pub fn clear(&mut self) {
        self.message = None;
        self.level = StatusLevel::Info;
    }

    fn set(&mut self, level: StatusLevel, message: impl Into<String>) {
        self.message = Some(message.into());
        self.level = level;
    }
}

/// 状态栏组件
pub struct StatusBar<'a> {
    status_info: &'a StatusInfo,
    /// 当前界面是否提供保存操作
    can_save: bool,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(status_info: &'a StatusInfo, can_save: bool, theme: &'a Theme) -> Self {
        Self {
            status_info,
            can_save,
            theme,
        }
    }

    /// 渲染状态栏
    pub fn render(&self, f: &mut Frame, area: Rect) {
        let status_line = self.create_status_line();
        let paragraph = Paragraph::new(status_line);
        f.render_widget(paragraph, area);
    }

    /// 创建状态栏内容
    fn create_status_line(&self) -> Line<'_> {
        let mut spans = Vec::new();

        if self.can_save {
            self.add_save_control(&mut spans);
            spans.push(Span::styled(" │ ", self.theme.status_style()));
        }

        match &self.status_info.message {
            Some(message) => {
                let (symbol, style) = match self.status_info.level {
                    StatusLevel::Info => ("•", self.theme.status_style()),
                    StatusLevel::Success => ("✓", self.theme.accent_style()),
                    StatusLevel::Error => ("✗", self.theme.error_style()),
                };
                spans.push(Span::styled(symbol, style));
                spans.push(Span::styled(" ", self.theme.text_style()));
                spans.push(Span::styled(message.as_str(), style));
            }
            None => spans.push(Span::styled("就绪", self.theme.dimmed_style())),
        }

        Line::from(spans)
    }

    /// 保存按钮，导出中显示为不可用
    fn add_save_control(&self, spans: &mut Vec<Span<'a>>) {
        if self.status_info.exporting {
            spans.push(Span::styled("[s] 保存中…", self.theme.dimmed_style()));
        } else {
            spans.push(Span::styled("[s]", self.theme.accent_style()));
            spans.push(Span::styled(" 保存封面", self.theme.text_style()));
        }
    }
}
