use thiserror::Error;

/// 手动输入的时间无效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("时间格式无效，应为 MM:SS 且不超过歌曲时长")]
pub struct TimeEntryInvalid;

/// 将秒数格式化为 MM:SS
///
/// 分钟字段不设上限，超过两位时直接加宽。
pub fn format_time(seconds: u64) -> String {
    let minutes = seconds / 60;
    let seconds = seconds - minutes * 60;
    format!("{:02}:{:02}", minutes, seconds)
}

/// 解析用户输入的 MM:SS 时间，返回总秒数
///
/// 秒字段大于 59 或总时长超过 `duration_secs` 时视为无效，边界值本身有效。
pub fn parse_time(text: &str, duration_secs: u64) -> Result<u64, TimeEntryInvalid> {
    let text = text.trim();
    let (minutes, seconds) = text.split_once(':').ok_or(TimeEntryInvalid)?;

    // 只允许一个分隔符
    if seconds.contains(':') {
        return Err(TimeEntryInvalid);
    }

    let minutes = minutes.parse::<u64>().map_err(|_| TimeEntryInvalid)?;
    let seconds = seconds.parse::<u64>().map_err(|_| TimeEntryInvalid)?;

    if seconds > 59 {
        return Err(TimeEntryInvalid);
    }

    let total = minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .ok_or(TimeEntryInvalid)?;

    if total > duration_secs {
        return Err(TimeEntryInvalid);
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(3599), "59:59");
        assert_eq!(format_time(3600), "60:00");

        // 三位数分钟不截断
        assert_eq!(format_time(6000), "100:00");
    }

    #[test]
    fn test_parse_time_boundaries() {
        assert_eq!(parse_time("1:30", 200), Ok(90));
        assert_eq!(parse_time("1:30", 89), Err(TimeEntryInvalid));
        assert_eq!(parse_time("1:30", 90), Ok(90));
        assert_eq!(parse_time("0:00", 0), Ok(0));
    }

    #[test]
    fn test_parse_time_invalid() {
        assert_eq!(parse_time("2:75", 300), Err(TimeEntryInvalid));
        assert_eq!(parse_time("notime", 300), Err(TimeEntryInvalid));
        assert_eq!(parse_time("1:2:3", 300), Err(TimeEntryInvalid));
        assert_eq!(parse_time(":30", 300), Err(TimeEntryInvalid));
        assert_eq!(parse_time("1:", 300), Err(TimeEntryInvalid));
        assert_eq!(parse_time("a:30", 300), Err(TimeEntryInvalid));
        assert_eq!(parse_time("-1:30", 300), Err(TimeEntryInvalid));
    }

    #[test]
    fn test_parse_time_trims_whitespace() {
        assert_eq!(parse_time("  02:05 ", 300), Ok(125));
    }

    #[test]
    fn test_round_trip() {
        let duration = 3725;
        for text in ["00:00", "00:59", "01:40", "10:05", "59:59", "62:05"] {
            let seconds = parse_time(text, duration).unwrap();
            assert_eq!(format_time(seconds), text);
        }
    }
}
