use ratatui::style::{Color, Modifier, Style};

use crate::utils::Rgb;

/// TUI 主题配置
#[derive(Debug, Clone)]
pub struct Theme {
    pub border: Color,
    pub text: Color,
    pub accent: Color,
    pub highlight: Color,
    pub status_text: Color,
    pub dimmed_text: Color,
    pub error: Color,
}

impl Theme {
    /// 使用终端原生配色的主题
    pub fn terminal() -> Self {
        Self {
            border: Color::DarkGray,      // 使用终端的深灰色边框
            text: Color::Reset,           // 使用终端的默认前景色
            accent: Color::Green,         // 使用终端的绿色作为强调色
            highlight: Color::Yellow,     // 输入框和当前选项
            status_text: Color::Gray,     // 使用终端的灰色作为状态文字
            dimmed_text: Color::DarkGray, // 使用终端的深灰色作为弱化文字
            error: Color::Red,
        }
    }

    /// 获取普通文字样式
    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    /// 获取强调文字样式
    pub fn accent_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    /// 获取输入框样式
    pub fn input_style(&self) -> Style {
        Style::default()
            .fg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    /// 获取边框样式
    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// 获取状态栏样式
    pub fn status_style(&self) -> Style {
        Style::default().fg(self.status_text)
    }

    /// 获取标题样式
    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    /// 获取弱化文字样式
    pub fn dimmed_style(&self) -> Style {
        Style::default().fg(self.dimmed_text)
    }

    /// 获取错误提示样式
    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error).add_modifier(Modifier::BOLD)
    }

    /// 用封面颜色绘制的色块
    pub fn swatch_style(&self, color: Rgb) -> Style {
        Style::default().fg(rgb_to_color(color))
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::terminal()
    }
}

/// 封面颜色转终端颜色
pub fn rgb_to_color(color: Rgb) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}
