// 应用核心库

// 模块导出
pub mod app;
pub mod catalog;
pub mod composer;
pub mod config;
pub mod export;
pub mod render;
pub mod tui;
pub mod utils;
