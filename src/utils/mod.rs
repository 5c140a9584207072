// 通用工具模块
// 时间格式化、链接解析、颜色与字符串处理

pub mod color;
pub mod string;
pub mod time;
pub mod track_url;

pub use color::{parse_hex_color, ColorParseError, Rgb};
pub use string::{escape_xml, truncate_chars};
pub use time::{format_time, parse_time, TimeEntryInvalid};
pub use track_url::{extract_track_id, InputParseFailure};
