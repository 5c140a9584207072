/// 转义 XML 文本中的特殊字符，用于写入 SVG
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // XML 1.0 不允许的控制字符直接丢弃
            c if c.is_control() && c != '\t' && c != '\n' => {}
            c => out.push(c),
        }
    }
    out
}

/// 按字符数截断字符串，超出部分以省略号结尾
pub fn truncate_chars(input: &str, max_chars: usize) -> String {
    let count = input.chars().count();
    if count <= max_chars {
        return input.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let mut result: String = input.chars().take(max_chars - 1).collect();
    result = result.trim_end().to_string();
    result.push('…');
    result
}
