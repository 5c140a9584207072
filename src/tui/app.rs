use anyhow::Result;
use crossterm::{
    event::{KeyCode, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::app::CoverOverrides;
use crate::catalog::{self, Artwork, FetchError, LoadedTrack, TrackCatalog};
use crate::composer::{Composer, Palette};
use crate::config::Config;
use crate::export::{ExportError, SnapshotExporter};
use crate::tui::events::{EventHandler, TuiEvent};
use crate::tui::theme::Theme;
use crate::tui::ui::{render_help, render_ui};
use crate::tui::widgets::StatusInfo;
use crate::utils::extract_track_id;

// 方向键微调的步长（秒）
const FINE_STEP: i64 = 1;
const COARSE_STEP: i64 = 10;

/// 当前界面
#[derive(Debug)]
pub enum Screen {
    /// 输入曲目链接
    Entry { input: String, error: Option<String> },
    /// 正在获取曲目
    Loading { track_id: String },
    /// 编辑封面
    Cover {
        composer: Composer,
        artwork: Artwork,
        input: InputMode,
    },
    /// 获取曲目失败
    Failed { track_id: String, error: FetchError },
}

/// 封面界面的输入状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// 手动输入播放位置
    Time(String),
    /// 输入自选背景色
    Color(String),
}

/// 封面界面按键处理的结果
#[derive(Debug, PartialEq, Eq)]
enum CoverAction {
    None,
    Quit,
    NewTrack,
    Save,
    ToggleHelp,
    Info(String),
    Error(String),
}

/// TUI 应用主结构
pub struct TuiApp {
    config: Arc<Config>,
    catalog: Arc<dyn TrackCatalog>,
    exporter: Arc<SnapshotExporter>,
    /// 命令行设置只应用到第一首成功加载的曲目
    overrides: Option<CoverOverrides>,
    theme: Theme,
    screen: Screen,
    status: StatusInfo,
    tx: Option<mpsc::Sender<TuiEvent>>,
    spinner: usize,
    should_quit: bool,
    show_help: bool,
    needs_redraw: bool,
    drawn_revision: Option<u64>,
}

impl TuiApp {
    /// 创建新的 TUI 应用
    pub fn new(
        config: Arc<Config>,
        catalog: Arc<dyn TrackCatalog>,
        exporter: Arc<SnapshotExporter>,
        overrides: CoverOverrides,
    ) -> Self {
        Self {
            config,
            catalog,
            exporter,
            overrides: Some(overrides),
            theme: Theme::default(),
            screen: Screen::Entry {
                input: String::new(),
                error: None,
            },
            status: StatusInfo::default(),
            tx: None,
            spinner: 0,
            should_quit: false,
            show_help: false,
            needs_redraw: true, // 初始需要绘制
            drawn_revision: None,
        }
    }

    /// 运行 TUI 应用
    pub async fn run(&mut self, url: Option<String>) -> Result<()> {
        // 设置终端
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let (tx, mut rx) = mpsc::channel(100);
        let mut event_handler = EventHandler::new(Duration::from_millis(120));

        // 启动事件监听
        let event_tx = tx.clone();
        tokio::spawn(async move {
            if let Err(err) = event_handler.run(event_tx).await {
                error!("事件处理器错误: {}", err);
            }
        });
        self.tx = Some(tx);

        if let Some(url) = url {
            self.submit_url(url);
        }

        let result = self.event_loop(&mut terminal, &mut rx).await;

        // 恢复终端，即使主循环出错
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        rx: &mut mpsc::Receiver<TuiEvent>,
    ) -> Result<()> {
        while !self.should_quit {
            // 只在需要时重绘界面
            if self.needs_redraw || self.drawn_revision != self.revision() {
                self.draw(terminal)?;
            }

            match rx.recv().await {
                Some(event) => self.handle_event(event),
                None => break,
            }
        }
        Ok(())
    }

    /// 绘制当前界面
    pub fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        terminal.draw(|f| {
            render_ui(f, &self.screen, &self.status, self.spinner, &self.theme);

            // 如果显示帮助，覆盖显示帮助界面
            if self.show_help {
                render_help(f, &self.theme);
            }
        })?;
        self.needs_redraw = false;
        self.drawn_revision = self.revision();
        Ok(())
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// 当前编辑器的状态版本
    fn revision(&self) -> Option<u64> {
        match &self.screen {
            Screen::Cover { composer, .. } => Some(composer.revision()),
            _ => None,
        }
    }

    /// 处理事件
    pub fn handle_event(&mut self, event: TuiEvent) {
        match event {
            TuiEvent::Key(key) => {
                self.handle_key(key);
                self.needs_redraw = true; // 按键事件需要重绘
            }
            TuiEvent::Tick => {
                // 只有加载动画需要定时重绘
                if matches!(self.screen, Screen::Loading { .. }) {
                    self.spinner = self.spinner.wrapping_add(1);
                    self.needs_redraw = true;
                }
            }
            TuiEvent::TrackLoaded { track_id, result } => {
                self.handle_track_loaded(track_id, result);
                self.needs_redraw = true;
            }
            TuiEvent::ExportFinished(result) => {
                self.handle_export_finished(result);
                self.needs_redraw = true;
            }
            TuiEvent::Quit => {
                self.should_quit = true;
            }
        }
    }

    /// 处理按键输入
    fn handle_key(&mut self, key: KeyEvent) {
        if EventHandler::is_force_quit(&key) {
            self.should_quit = true;
            return;
        }

        // 帮助界面打开时，任意键关闭
        if self.show_help {
            self.show_help = false;
            return;
        }

        match &mut self.screen {
            Screen::Entry { input, error } => match key.code {
                KeyCode::Esc => self.should_quit = true,
                KeyCode::Enter => {
                    let url = input.trim().to_string();
                    if !url.is_empty() {
                        self.submit_url(url);
                    }
                }
                KeyCode::Backspace => {
                    input.pop();
                    *error = None;
                }
                KeyCode::Char(c) => {
                    input.push(c);
                    *error = None;
                }
                _ => {}
            },
            Screen::Loading { .. } => {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    self.should_quit = true;
                }
            }
            Screen::Failed { .. } => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                KeyCode::Char('n') | KeyCode::Enter => self.open_entry(),
                KeyCode::Char('?') | KeyCode::Char('h') => self.show_help = true,
                _ => {}
            },
            Screen::Cover {
                composer, input, ..
            } => {
                let action = handle_cover_key(composer, input, key);
                self.apply_cover_action(action);
            }
        }
    }

    fn apply_cover_action(&mut self, action: CoverAction) {
        match action {
            CoverAction::None => {}
            CoverAction::Quit => self.should_quit = true,
            CoverAction::NewTrack => self.open_entry(),
            CoverAction::Save => self.start_export(),
            CoverAction::ToggleHelp => self.show_help = !self.show_help,
            CoverAction::Info(message) => self.status.info(message),
            CoverAction::Error(message) => self.status.error(message),
        }
    }

    fn open_entry(&mut self) {
        self.screen = Screen::Entry {
            input: String::new(),
            error: None,
        };
        self.status.clear();
    }

    /// 解析链接并开始加载，解析失败时留在输入界面
    fn submit_url(&mut self, url: String) {
        match extract_track_id(&url) {
            Ok(track_id) => self.start_loading(track_id),
            Err(e) => {
                warn!("{}", e);
                self.screen = Screen::Entry {
                    input: url,
                    error: Some(e.to_string()),
                };
            }
        }
    }

    fn start_loading(&mut self, track_id: String) {
        info!("加载曲目: {}", track_id);
        self.screen = Screen::Loading {
            track_id: track_id.clone(),
        };
        self.status.clear();

        let Some(tx) = self.tx.clone() else {
            return;
        };
        let catalog = Arc::clone(&self.catalog);
        let artwork_size = self.config.composer.artwork_size;
        tokio::spawn(async move {
            let result = catalog::load_track(catalog.as_ref(), &track_id, artwork_size).await;
            if tx
                .send(TuiEvent::TrackLoaded { track_id, result })
                .await
                .is_err()
            {
                debug!("界面已关闭，丢弃加载结果");
            }
        });
    }

    fn handle_track_loaded(&mut self, track_id: String, result: Result<LoadedTrack, FetchError>) {
        // 只接受当前正在等待的曲目
        match &self.screen {
            Screen::Loading { track_id: pending } if *pending == track_id => {}
            _ => {
                debug!("忽略过期的加载结果: {}", track_id);
                return;
            }
        }

        match result {
            Ok(loaded) => {
                let mut composer = Composer::new(
                    loaded.track,
                    Palette::from_config(&self.config.palette),
                    &self.config.composer,
                );
                let overrides_result = match self.overrides.take() {
                    Some(overrides) => overrides.apply(&mut composer),
                    None => Ok(()),
                };
                if let Err(e) = overrides_result {
                    warn!("命令行封面设置无效: {}", e);
                    self.status.error(format!("命令行设置无效: {}", e));
                } else if !loaded.artwork.is_loaded() {
                    self.status.info("专辑封面不可用，可按 c 隐藏后导出");
                }
                self.screen = Screen::Cover {
                    composer,
                    artwork: loaded.artwork,
                    input: InputMode::Normal,
                };
            }
            Err(error) => {
                error!("加载曲目 {} 失败: {}", track_id, error);
                self.screen = Screen::Failed { track_id, error };
            }
        }
    }

    /// 冻结当前封面并在后台导出
    fn start_export(&mut self) {
        let Screen::Cover {
            composer, artwork, ..
        } = &self.screen
        else {
            return;
        };

        if self.status.exporting || self.exporter.is_busy() {
            self.status.info("正在导出，请稍候");
            return;
        }

        let snapshot = composer.snapshot(artwork);
        let Some(tx) = self.tx.clone() else {
            return;
        };

        self.status.exporting = true;
        self.status.info("正在导出封面…");

        let exporter = Arc::clone(&self.exporter);
        tokio::spawn(async move {
            let result = match tokio::task::spawn_blocking(move || exporter.export(&snapshot)).await
            {
                Ok(result) => result,
                Err(e) => Err(ExportError::Encode(format!("导出任务异常退出: {}", e))),
            };
            if tx.send(TuiEvent::ExportFinished(result)).await.is_err() {
                debug!("界面已关闭，丢弃导出结果");
            }
        });
    }

    fn handle_export_finished(&mut self, result: Result<std::path::PathBuf, ExportError>) {
        match result {
            Ok(path) => {
                self.status.exporting = false;
                self.status
                    .success(format!("已保存到 {}", path.display()));
            }
            // 另一个导出仍在进行，保持当前状态
            Err(ExportError::Busy) => {
                debug!("导出被拒绝: 已有任务进行中");
            }
            Err(e) => {
                self.status.exporting = false;
                self.status.error(format!("导出失败: {}", e));
            }
        }
    }
}

/// 处理封面界面的按键
fn handle_cover_key(composer: &mut Composer, input: &mut InputMode, key: KeyEvent) -> CoverAction {
    match input {
        InputMode::Normal => {}
        InputMode::Time(buffer) | InputMode::Color(buffer) => {
            match key.code {
                KeyCode::Esc => *input = InputMode::Normal,
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(c) => buffer.push(c),
                KeyCode::Enter => {
                    let submitted = std::mem::replace(input, InputMode::Normal);
                    return submit_input(composer, submitted);
                }
                _ => {}
            }
            return CoverAction::None;
        }
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => CoverAction::Quit,
        KeyCode::Char('?') | KeyCode::Char('h') => CoverAction::ToggleHelp,
        KeyCode::Char('n') => CoverAction::NewTrack,
        KeyCode::Char('s') => CoverAction::Save,
        KeyCode::Char('t') => {
            composer.toggle_theme();
            CoverAction::None
        }
        KeyCode::Char('c') => {
            composer.toggle_album_cover();
            CoverAction::None
        }
        KeyCode::Char('m') => {
            composer.cycle_timebar(true);
            CoverAction::None
        }
        KeyCode::Char('M') => {
            composer.cycle_timebar(false);
            CoverAction::None
        }
        KeyCode::Char('b') => {
            composer.cycle_background(true);
            CoverAction::None
        }
        KeyCode::Char('B') => {
            composer.cycle_background(false);
            CoverAction::None
        }
        KeyCode::Left => {
            composer.scrub(-FINE_STEP);
            CoverAction::None
        }
        KeyCode::Right => {
            composer.scrub(FINE_STEP);
            CoverAction::None
        }
        KeyCode::Down => {
            composer.scrub(-COARSE_STEP);
            CoverAction::None
        }
        KeyCode::Up => {
            composer.scrub(COARSE_STEP);
            CoverAction::None
        }
        KeyCode::Char('i') => {
            *input = InputMode::Time(composer.formatted_position());
            CoverAction::None
        }
        KeyCode::Char('p') => {
            *input = InputMode::Color(String::from("#"));
            CoverAction::None
        }
        _ => CoverAction::None,
    }
}

fn submit_input(composer: &mut Composer, submitted: InputMode) -> CoverAction {
    match submitted {
        InputMode::Normal => CoverAction::None,
        InputMode::Time(text) => match composer.enter_time(&text) {
            Ok(_) => CoverAction::Info(format!("播放位置: {}", composer.formatted_position())),
            Err(e) => CoverAction::Error(format!("{}: '{}'", e, text.trim())),
        },
        InputMode::Color(text) => match composer.set_custom_background(&text) {
            Ok(_) => CoverAction::Info(format!("背景颜色: {}", composer.background_label())),
            Err(e) => CoverAction::Error(e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Track;
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;

    /// 不发起网络请求的曲目源
    struct NoopCatalog;

    #[async_trait::async_trait]
    impl TrackCatalog for NoopCatalog {
        fn name(&self) -> &str {
            "noop"
        }

        async fn fetch_track(&self, track_id: &str) -> Result<Track, FetchError> {
            Err(FetchError::NotFound(track_id.to_string()))
        }

        async fn fetch_artwork(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::NotFound(url.to_string()))
        }
    }

    fn app() -> TuiApp {
        let config = Arc::new(Config::default());
        let exporter = Arc::new(SnapshotExporter::from_config(&config.export));
        TuiApp::new(
            config,
            Arc::new(NoopCatalog),
            exporter,
            CoverOverrides::default(),
        )
    }

    fn loaded() -> LoadedTrack {
        LoadedTrack {
            track: Track {
                id: "abc123".to_string(),
                title: "Song".to_string(),
                artists: vec!["Artist".to_string()],
                album: "Album".to_string(),
                images: vec![],
                duration_ms: 200_000,
            },
            artwork: Artwork::Unavailable {
                reason: "no image".to_string(),
            },
        }
    }

    fn key(code: KeyCode) -> TuiEvent {
        TuiEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut TuiApp, text: &str) {
        for c in text.chars() {
            app.handle_event(key(KeyCode::Char(c)));
        }
    }

    fn screen_text(app: &mut TuiApp) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        app.draw(&mut terminal).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn cover_app() -> TuiApp {
        let mut app = app();
        type_text(&mut app, "https://open.spotify.com/track/abc123?si=x");
        app.handle_event(key(KeyCode::Enter));
        app.handle_event(TuiEvent::TrackLoaded {
            track_id: "abc123".to_string(),
            result: Ok(loaded()),
        });
        app
    }

    fn composer(app: &TuiApp) -> &Composer {
        match app.screen() {
            Screen::Cover { composer, .. } => composer,
            other => panic!("不在封面界面: {:?}", other),
        }
    }

    #[test]
    fn test_bad_override_keeps_the_rest() {
        let config = Arc::new(Config::default());
        let exporter = Arc::new(SnapshotExporter::from_config(&config.export));
        let mut app = TuiApp::new(
            config,
            Arc::new(NoopCatalog),
            exporter,
            CoverOverrides {
                timebar: Some("rainbow".to_string()),
                background: Some("snow".to_string()),
                position: Some("00:30".to_string()),
                ..CoverOverrides::default()
            },
        );
        type_text(&mut app, "https://open.spotify.com/track/abc123?si=x");
        app.handle_event(key(KeyCode::Enter));
        app.handle_event(TuiEvent::TrackLoaded {
            track_id: "abc123".to_string(),
            result: Ok(loaded()),
        });

        let c = composer(&app);
        assert_eq!(c.state().position_secs, 30);
        assert_eq!(
            c.palette().background_color(&c.state().background),
            crate::utils::Rgb::WHITE
        );
        let message = app.status.message.clone().unwrap_or_default();
        assert!(message.contains("rainbow"));
    }

    #[test]
    fn test_invalid_url_stays_on_entry() {
        let mut app = app();
        type_text(&mut app, "https://example.com/album/1");
        app.handle_event(key(KeyCode::Enter));

        match app.screen() {
            Screen::Entry { input, error } => {
                assert_eq!(input, "https://example.com/album/1");
                assert!(error.is_some());
            }
            other => panic!("unexpected screen: {:?}", other),
        }
    }

    #[test]
    fn test_valid_url_starts_loading() {
        let mut app = app();
        type_text(&mut app, "https://open.spotify.com/track/abc123?si=x");
        app.handle_event(key(KeyCode::Enter));

        match app.screen() {
            Screen::Loading { track_id } => assert_eq!(track_id, "abc123"),
            other => panic!("unexpected screen: {:?}", other),
        }
    }

    #[test]
    fn test_cover_screen_shows_midpoint() {
        let mut app = cover_app();
        assert_eq!(composer(&app).state().position_secs, 100);

        let text = screen_text(&mut app);
        assert!(text.contains("01:40"));
        assert!(text.contains("03:20"));
        assert!(text.contains("Song"));
    }

    #[test]
    fn test_failed_screen_has_no_timebar() {
        let mut app = app();
        type_text(&mut app, "https://open.spotify.com/track/abc123?si=x");
        app.handle_event(key(KeyCode::Enter));
        app.handle_event(TuiEvent::TrackLoaded {
            track_id: "abc123".to_string(),
            result: Err(FetchError::NotFound("abc123".to_string())),
        });

        assert!(matches!(app.screen(), Screen::Failed { .. }));
        let text = screen_text(&mut app);
        assert!(text.contains("abc123"));
        assert!(!text.contains("01:40"));
        assert!(!text.contains("[s]"));

        // 失败界面不能保存
        app.handle_event(key(KeyCode::Char('s')));
        assert!(!app.status.exporting);

        app.handle_event(key(KeyCode::Char('n')));
        assert!(matches!(app.screen(), Screen::Entry { .. }));
    }

    #[test]
    fn test_stale_load_result_is_ignored() {
        let mut app = app();
        type_text(&mut app, "https://open.spotify.com/track/abc123?si=x");
        app.handle_event(key(KeyCode::Enter));
        app.handle_event(TuiEvent::TrackLoaded {
            track_id: "other".to_string(),
            result: Ok(loaded()),
        });
        assert!(matches!(app.screen(), Screen::Loading { .. }));
    }

    #[test]
    fn test_cover_keys_edit_state() {
        let mut app = cover_app();
        let start = composer(&app).revision();

        app.handle_event(key(KeyCode::Char('t')));
        app.handle_event(key(KeyCode::Char('c')));
        app.handle_event(key(KeyCode::Right));
        app.handle_event(key(KeyCode::Up));

        let c = composer(&app);
        assert_eq!(c.state().theme, crate::composer::ControlsTheme::Black);
        assert!(!c.state().show_album_cover);
        assert_eq!(c.state().position_secs, 111);
        assert_eq!(c.revision(), start + 4);
    }

    #[test]
    fn test_time_entry() {
        let mut app = cover_app();

        app.handle_event(key(KeyCode::Char('i')));
        for _ in 0..5 {
            app.handle_event(key(KeyCode::Backspace));
        }
        type_text(&mut app, "02:30");
        app.handle_event(key(KeyCode::Enter));
        assert_eq!(composer(&app).state().position_secs, 150);
        assert!(composer(&app).state().time_entry_valid);

        app.handle_event(key(KeyCode::Char('i')));
        type_text(&mut app, "x");
        app.handle_event(key(KeyCode::Enter));
        let c = composer(&app);
        assert!(!c.state().time_entry_valid);
        assert_eq!(c.state().position_secs, 0);
        assert_eq!(app.status.level, crate::tui::widgets::StatusLevel::Error);
    }

    #[test]
    fn test_custom_background_entry() {
        let mut app = cover_app();

        app.handle_event(key(KeyCode::Char('p')));
        type_text(&mut app, "zzz");
        app.handle_event(key(KeyCode::Enter));
        assert_eq!(app.status.level, crate::tui::widgets::StatusLevel::Error);

        app.handle_event(key(KeyCode::Char('p')));
        type_text(&mut app, "336699");
        app.handle_event(key(KeyCode::Enter));
        assert_eq!(composer(&app).background_label(), "自定义 (#336699)");
    }

    #[test]
    fn test_input_mode_swallows_shortcuts() {
        let mut app = cover_app();
        app.handle_event(key(KeyCode::Char('i')));
        app.handle_event(key(KeyCode::Char('q')));
        assert!(!app.should_quit());

        app.handle_event(key(KeyCode::Esc));
        app.handle_event(key(KeyCode::Char('q')));
        assert!(app.should_quit());
    }

    #[test]
    fn test_export_result_updates_status() {
        let mut app = cover_app();
        app.status.exporting = true;

        app.handle_event(TuiEvent::ExportFinished(Err(ExportError::Busy)));
        assert!(app.status.exporting);

        app.handle_event(TuiEvent::ExportFinished(Err(
            ExportError::RegionNotRenderable("no image".to_string()),
        )));
        assert!(!app.status.exporting);
        assert!(app.status.message.as_deref().unwrap_or("").contains("no image"));
    }
}
