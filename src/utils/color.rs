use std::fmt;

use thiserror::Error;

/// 颜色字符串无法解析
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("无效的颜色值 '{0}'，应为 #RRGGBB 或 #RGB")]
pub struct ColorParseError(pub String);

/// RGB 颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// 解析 #RRGGBB / #RGB 格式的颜色，井号可省略
pub fn parse_hex_color(input: &str) -> Result<Rgb, ColorParseError> {
    let err = || ColorParseError(input.to_string());
    let hex = input.trim().trim_start_matches('#');

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(err());
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| err());

    match hex.len() {
        6 => Ok(Rgb::new(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        3 => {
            // #abc 等价于 #aabbcc
            let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
            Ok(Rgb::new(expand(0)?, expand(1)?, expand(2)?))
        }
        _ => Err(err()),
    }
}
