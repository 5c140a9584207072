use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

// 分享链接格式: https://open.spotify.com/track/<id>?si=...
static TRACK_WITH_QUERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)track/(.*?)\?").expect("静态正则表达式"));

// 不带查询参数的链接，id 一直延续到 '#' 或结尾
static TRACK_WITHOUT_QUERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)track/([^?#]*)").expect("静态正则表达式"));

/// 无法从输入中解析出曲目 ID
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("无法从链接中解析曲目 ID: {input}")]
pub struct InputParseFailure {
    pub input: String,
}

/// 从歌曲链接中提取曲目 ID
pub fn extract_track_id(input: &str) -> Result<String, InputParseFailure> {
    let trimmed = input.trim();

    let captured = TRACK_WITH_QUERY
        .captures(trimmed)
        .or_else(|| TRACK_WITHOUT_QUERY.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches('/'));

    // 曲目 ID 只由字母和数字组成
    match captured {
        Some(id) if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()) => {
            Ok(id.to_string())
        }
        _ => Err(InputParseFailure {
            input: input.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_share_link() {
        assert_eq!(
            extract_track_id("https://open.example.com/track/abc123?si=xyz").unwrap(),
            "abc123"
        );
        assert_eq!(
            extract_track_id("  https://open.spotify.com/intl-de/TRACK/4uLU6hMCjMI75M1A2tKUQC?si=1 ")
                .unwrap(),
            "4uLU6hMCjMI75M1A2tKUQC"
        );
    }

    #[test]
    fn test_extract_without_query() {
        assert_eq!(
            extract_track_id("https://open.spotify.com/track/abc123").unwrap(),
            "abc123"
        );
        assert_eq!(
            extract_track_id("https://open.spotify.com/track/abc123/").unwrap(),
            "abc123"
        );
        assert_eq!(
            extract_track_id("https://open.spotify.com/track/abc123#top").unwrap(),
            "abc123"
        );
    }

    #[test]
    fn test_extract_failures() {
        let err = extract_track_id("https://open.spotify.com/album/abc123?si=x").unwrap_err();
        assert_eq!(err.input, "https://open.spotify.com/album/abc123?si=x");

        assert!(extract_track_id("").is_err());
        assert!(extract_track_id("https://open.spotify.com/track/?si=x").is_err());
        assert!(extract_track_id("https://open.spotify.com/track/").is_err());
    }

    #[test]
    fn test_extract_rejects_path_segments() {
        assert!(extract_track_id("https://open.spotify.com/track/../../v1/me").is_err());
        assert!(extract_track_id("https://open.spotify.com/track/../../v1/me?si=x").is_err());
        assert!(extract_track_id("https://open.spotify.com/track/abc/def").is_err());
        assert!(extract_track_id("https://open.spotify.com/track/abc%2F..").is_err());
    }
}
