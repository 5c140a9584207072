use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::tui::app::{InputMode, Screen};
use crate::tui::theme::Theme;
use crate::tui::widgets::{CoverPreview, Scrubber, StatusBar, StatusInfo};

const APP_TITLE: &str = "Track Cover";
const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// 渲染主界面
pub fn render_ui(
    f: &mut Frame,
    screen: &Screen,
    status: &StatusInfo,
    spinner: usize,
    theme: &Theme,
) {
    let size = f.area();

    // 创建主边框（标题在边框上）
    let main_title = match screen {
        Screen::Cover { composer, .. } => format!("{} - {}", APP_TITLE, composer.track().title),
        _ => APP_TITLE.to_string(),
    };

    let main_block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(main_title)
        .title_style(theme.title_style());

    let inner_area = main_block.inner(size);
    f.render_widget(main_block, size);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // 主体
            Constraint::Length(1), // 状态栏
            Constraint::Length(3), // 操作提示栏
        ])
        .split(inner_area);

    match screen {
        Screen::Entry { input, error } => {
            render_entry(f, chunks[0], input, error.as_deref(), theme)
        }
        Screen::Loading { track_id } => render_loading(f, chunks[0], track_id, spinner, theme),
        Screen::Cover {
            composer,
            artwork,
            input,
        } => {
            let mut constraints = vec![Constraint::Min(6), Constraint::Length(3)];
            if *input != InputMode::Normal {
                constraints.push(Constraint::Length(3));
            }
            let body = Layout::default()
                .direction(Direction::Vertical)
                .constraints(constraints)
                .split(chunks[0]);

            CoverPreview::new(composer, artwork, theme).render(f, body[0]);
            Scrubber::new(composer, theme).render(f, body[1]);
            if *input != InputMode::Normal {
                render_input(f, body[2], input, theme);
            }
        }
        Screen::Failed { track_id, error } => {
            render_failed(f, chunks[0], track_id, &error.to_string(), theme)
        }
    }

    let can_save = matches!(screen, Screen::Cover { .. });
    StatusBar::new(status, can_save, theme).render(f, chunks[1]);

    render_help_bar(f, chunks[2], screen, theme);
}

/// 垂直居中的若干行
fn centered_lines<'a>(area: Rect, content: Vec<Line<'a>>) -> Vec<Line<'a>> {
    let available_height = area.height.saturating_sub(2) as usize;
    let top_padding = available_height.saturating_sub(content.len()) / 2;

    let mut lines = vec![Line::from(""); top_padding];
    lines.extend(content);
    lines
}

fn bordered_paragraph<'a>(lines: Vec<Line<'a>>, theme: &Theme) -> Paragraph<'a> {
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style()),
        )
}

/// 渲染链接输入界面
fn render_entry(f: &mut Frame, area: Rect, input: &str, error: Option<&str>, theme: &Theme) {
    let mut content = vec![
        Line::from(Span::styled("输入 Spotify 曲目链接", theme.accent_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled(input, theme.input_style()),
            Span::styled("▏", theme.input_style()),
        ]),
        Line::from(""),
    ];

    match error {
        Some(error) => content.push(Line::from(Span::styled(error, theme.error_style()))),
        None => content.push(Line::from(Span::styled(
            "例如 https://open.spotify.com/track/<id>?si=...",
            theme.dimmed_style(),
        ))),
    }

    f.render_widget(bordered_paragraph(centered_lines(area, content), theme), area);
}

/// 渲染加载界面
fn render_loading(f: &mut Frame, area: Rect, track_id: &str, spinner: usize, theme: &Theme) {
    let content = vec![Line::from(vec![
        Span::styled(SPINNER[spinner % SPINNER.len()], theme.accent_style()),
        Span::styled(" 正在获取曲目 ", theme.text_style()),
        Span::styled(track_id, theme.input_style()),
    ])];

    f.render_widget(bordered_paragraph(centered_lines(area, content), theme), area);
}

/// 渲染加载失败界面，不显示时间条和保存按钮
fn render_failed(f: &mut Frame, area: Rect, track_id: &str, error: &str, theme: &Theme) {
    let content = vec![
        Line::from(vec![
            Span::styled("无法加载曲目 ", theme.error_style()),
            Span::styled(track_id, theme.input_style()),
        ]),
        Line::from(""),
        Line::from(Span::styled(error, theme.text_style())),
    ];

    f.render_widget(bordered_paragraph(centered_lines(area, content), theme), area);
}

/// 渲染封面界面的输入框
fn render_input(f: &mut Frame, area: Rect, input: &InputMode, theme: &Theme) {
    let (title, buffer) = match input {
        InputMode::Time(buffer) => ("播放位置 (MM:SS)", buffer.as_str()),
        InputMode::Color(buffer) => ("背景颜色 (#RRGGBB)", buffer.as_str()),
        InputMode::Normal => return,
    };

    let line = Line::from(vec![
        Span::styled(buffer, theme.input_style()),
        Span::styled("▏", theme.input_style()),
        Span::styled("  Enter 确认 / Esc 取消", theme.dimmed_style()),
    ]);

    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.input_style())
            .title(Span::styled(title, theme.title_style())),
    );
    f.render_widget(paragraph, area);
}

/// 渲染操作提示栏
fn render_help_bar(f: &mut Frame, area: Rect, screen: &Screen, theme: &Theme) {
    let shortcuts: &[(&str, &str)] = match screen {
        Screen::Entry { .. } => &[("Enter", "加载"), ("Esc", "退出")],
        Screen::Loading { .. } => &[("Q", "退出")],
        Screen::Failed { .. } => &[("N", "重新输入"), ("Q", "退出")],
        Screen::Cover { .. } => &[("?", "帮助"), ("S", "保存"), ("N", "换曲目"), ("Q", "退出")],
    };

    let mut spans = Vec::new();
    for (i, (key, desc)) in shortcuts.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", theme.status_style()));
        }
        spans.push(Span::styled(*key, theme.accent_style()));
        spans.push(Span::styled(format!(": {}", desc), theme.status_style()));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style()),
        );
    f.render_widget(paragraph, area);
}

/// 渲染帮助界面（覆盖显示）
pub fn render_help(f: &mut Frame, theme: &Theme) {
    let size = f.area();

    // 创建居中的帮助窗口
    let help_area = centered_rect(60, 80, size);

    let entries = [
        ("T", "切换控件主题（白/黑）"),
        ("C", "显示/隐藏专辑封面"),
        ("← / →", "播放位置 ±1 秒"),
        ("↓ / ↑", "播放位置 ±10 秒"),
        ("I", "手动输入播放位置"),
        ("M / Shift+M", "切换时间条配色"),
        ("B / Shift+B", "切换背景颜色"),
        ("P", "自选背景颜色"),
        ("S", "保存封面为 PNG"),
        ("N", "加载其他曲目"),
        ("Q / Esc", "退出程序"),
        ("H / ?", "显示/隐藏帮助"),
    ];

    let mut help_lines = vec![
        Line::from(Span::styled("Track Cover - 帮助", theme.title_style())),
        Line::from(""),
        Line::from(Span::styled("快捷键操作:", theme.accent_style())),
    ];
    for (key, desc) in entries {
        help_lines.push(Line::from(vec![
            Span::styled(format!("{:>12}", key), theme.accent_style()),
            Span::styled(format!("  {}", desc), theme.text_style()),
        ]));
    }
    help_lines.push(Line::from(""));
    help_lines.push(Line::from(Span::styled(
        "按任意键关闭帮助",
        theme.dimmed_style(),
    )));

    let help_paragraph = Paragraph::new(help_lines)
        .alignment(Alignment::Left)
        .block(
            Block::default()
                .title("帮助")
                .borders(Borders::ALL)
                .border_style(theme.accent_style()),
        );

    f.render_widget(Clear, help_area);
    f.render_widget(help_paragraph, help_area);
}

/// 创建居中矩形
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
