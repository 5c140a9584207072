use std::fmt::Write;

use crate::render::CoverSnapshot;
use crate::utils::{escape_xml, format_time, truncate_chars, Rgb};

/// 画布逻辑尺寸
pub const CANVAS_WIDTH: u32 = 1500;
pub const CANVAS_HEIGHT: u32 = 500;

const ART_SIZE: f32 = 250.0;
const ART_GAP: f32 = 30.0;
const TEXT_WIDTH: f32 = 620.0;

const TITLE_SIZE: f32 = 44.0;
const ARTIST_SIZE: f32 = 28.0;
const TIME_SIZE: f32 = 20.0;

const TITLE_MAX_CHARS: usize = 26;
const ARTIST_MAX_CHARS: usize = 40;

const BAR_Y: f32 = 262.0;
const BAR_HEIGHT: f32 = 6.0;
const THUMB_RADIUS: f32 = 10.0;
const CONTROLS_Y: f32 = 370.0;

/// 场景参数
#[derive(Debug, Clone)]
pub struct SceneOptions {
    pub font_family: String,
    /// 专辑封面的 data URI，None 表示不绘制
    pub artwork_href: Option<String>,
}

/// 生成封面的 SVG 场景
///
/// 布局：左侧 250px 专辑封面，右侧依次为标题、艺术家、时间条、时间和播放控件；
/// 隐藏封面时文字区域水平居中。
pub fn build_scene(snapshot: &CoverSnapshot, options: &SceneOptions) -> String {
    let width = CANVAS_WIDTH as f32;
    let height = CANVAS_HEIGHT as f32;
    let fg = snapshot.theme.color();
    let font = escape_xml(&options.font_family);

    let text_x = match options.artwork_href {
        Some(_) => (width - (ART_SIZE + ART_GAP + TEXT_WIDTH)) / 2.0 + ART_SIZE + ART_GAP,
        None => (width - TEXT_WIDTH) / 2.0,
    };

    let mut svg = String::with_capacity(4096);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = CANVAS_WIDTH,
        h = CANVAS_HEIGHT
    );
    let _ = write!(
        svg,
        r#"<rect x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
        width, height, snapshot.background
    );

    // 专辑封面
    if let Some(href) = &options.artwork_href {
        let art_x = text_x - ART_GAP - ART_SIZE;
        let art_y = (height - ART_SIZE) / 2.0;
        let _ = write!(
            svg,
            r#"<image x="{}" y="{}" width="{s}" height="{s}" preserveAspectRatio="xMidYMid slice" xlink:href="{}"/>"#,
            art_x,
            art_y,
            href,
            s = ART_SIZE
        );
    }

    // 标题与艺术家
    let title = escape_xml(&truncate_chars(&snapshot.track.title, TITLE_MAX_CHARS));
    let artists = escape_xml(&truncate_chars(
        &snapshot.track.artist_line(),
        ARTIST_MAX_CHARS,
    ));
    let _ = write!(
        svg,
        r#"<text x="{}" y="175" font-family="{}" font-size="{}" font-weight="bold" fill="{}">{}</text>"#,
        text_x + 5.0,
        font,
        TITLE_SIZE,
        fg,
        title
    );
    let _ = write!(
        svg,
        r#"<text x="{}" y="220" font-family="{}" font-size="{}" fill="{}">{}</text>"#,
        text_x + 5.0,
        font,
        ARTIST_SIZE,
        fg,
        artists
    );

    // 时间条
    let duration = snapshot.track.duration_secs();
    let progress = if duration > 0 {
        (snapshot.position_secs.min(duration) as f32) / (duration as f32)
    } else {
        0.0
    };
    let filled = TEXT_WIDTH * progress;
    write_timebar(&mut svg, text_x, filled, snapshot);

    // 已播放 / 总时长
    let _ = write!(
        svg,
        r#"<text x="{}" y="305" font-family="{}" font-size="{}" fill="{}">{}</text>"#,
        text_x + 5.0,
        font,
        TIME_SIZE,
        fg,
        format_time(snapshot.position_secs)
    );
    let _ = write!(
        svg,
        r#"<text x="{}" y="305" font-family="{}" font-size="{}" text-anchor="end" fill="{}">{}</text>"#,
        text_x + TEXT_WIDTH - 5.0,
        font,
        TIME_SIZE,
        fg,
        format_time(duration)
    );

    write_controls(&mut svg, text_x + TEXT_WIDTH / 2.0, fg, snapshot.background);

    svg.push_str("</svg>");
    svg
}

fn write_timebar(svg: &mut String, x: f32, filled: f32, snapshot: &CoverSnapshot) {
    let radius = BAR_HEIGHT / 2.0;
    let _ = write!(
        svg,
        r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{r}" ry="{r}" fill="{}"/>"#,
        x,
        BAR_Y - radius,
        TEXT_WIDTH,
        BAR_HEIGHT,
        snapshot.timebar.track,
        r = radius
    );
    if filled > 0.0 {
        let _ = write!(
            svg,
            r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{r}" ry="{r}" fill="{}"/>"#,
            x,
            BAR_Y - radius,
            filled,
            BAR_HEIGHT,
            snapshot.timebar.filled,
            r = radius
        );
    }
    let _ = write!(
        svg,
        r##"<circle cx="{}" cy="{}" r="{}" fill="#ffffff" stroke="#cbd5e0" stroke-width="1"/>"##,
        x + filled,
        BAR_Y,
        THUMB_RADIUS
    );
}

/// 上一首 / 暂停 / 下一首
fn write_controls(svg: &mut String, cx: f32, fg: Rgb, bg: Rgb) {
    let cy = CONTROLS_Y;
    let spacing = 90.0;

    // 上一首：竖条 + 向左三角
    let px = cx - spacing;
    let _ = write!(
        svg,
        r#"<rect x="{}" y="{}" width="4" height="28" fill="{fg}"/><polygon points="{},{} {},{} {},{}" fill="{fg}"/>"#,
        px - 14.0,
        cy - 14.0,
        px + 14.0,
        cy - 14.0,
        px + 14.0,
        cy + 14.0,
        px - 10.0,
        cy,
        fg = fg
    );

    // 暂停：实心圆 + 两条背景色竖条
    let _ = write!(
        svg,
        r#"<circle cx="{cx}" cy="{cy}" r="30" fill="{fg}"/><rect x="{}" y="{}" width="6" height="24" fill="{bg}"/><rect x="{}" y="{}" width="6" height="24" fill="{bg}"/>"#,
        cx - 9.0,
        cy - 12.0,
        cx + 3.0,
        cy - 12.0,
        cx = cx,
        cy = cy,
        fg = fg,
        bg = bg
    );

    // 下一首：向右三角 + 竖条
    let nx = cx + spacing;
    let _ = write!(
        svg,
        r#"<polygon points="{},{} {},{} {},{}" fill="{fg}"/><rect x="{}" y="{}" width="4" height="28" fill="{fg}"/>"#,
        nx - 14.0,
        cy - 14.0,
        nx - 14.0,
        cy + 14.0,
        nx + 10.0,
        cy,
        nx + 10.0,
        cy - 14.0,
        fg = fg
    );
}
