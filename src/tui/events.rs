use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::catalog::{FetchError, LoadedTrack};
use crate::export::ExportError;

/// TUI 事件类型
#[derive(Debug)]
pub enum TuiEvent {
    /// 键盘输入事件
    Key(KeyEvent),
    /// 定时刷新事件
    Tick,
    /// 曲目加载完成
    TrackLoaded {
        track_id: String,
        result: Result<LoadedTrack, FetchError>,
    },
    /// 封面导出完成
    ExportFinished(Result<PathBuf, ExportError>),
    /// 退出事件
    Quit,
}

/// 事件处理器
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    /// 创建新的事件处理器
    pub fn new(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    /// 监听事件并发送到通道
    pub async fn run(&mut self, tx: mpsc::Sender<TuiEvent>) -> Result<()> {
        let mut last_tick = std::time::Instant::now();
        // 按键轮询比刷新频率更快
        let mut poll_interval = tokio::time::interval(Duration::from_millis(20));

        loop {
            poll_interval.tick().await;

            while event::poll(Duration::from_millis(0))? {
                if let Event::Key(key) = event::read()? {
                    // Windows 下松开按键也会产生事件
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if tx.send(TuiEvent::Key(key)).await.is_err() {
                        return Ok(()); // 接收端已关闭
                    }
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                if tx.send(TuiEvent::Tick).await.is_err() {
                    break;
                }
                last_tick = std::time::Instant::now();
            }
        }

        Ok(())
    }

    /// 是否为强制退出按键（Ctrl+C），在任何输入状态下都生效
    pub fn is_force_quit(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char('c')) && key.modifiers.contains(KeyModifiers::CONTROL)
    }
}
