// 配置模块

mod loader;

pub use loader::*;
