use std::io::Cursor;
use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use image::{ImageFormat, RgbaImage};

use crate::catalog::Artwork;
use crate::export::ExportError;

// 避免异常尺寸导致巨量内存分配
const MAX_DIM: u32 = 16_384;

/// 校验专辑封面并转为 PNG data URI
///
/// 无论原始格式如何都重新编码为 PNG，保证光栅化时能够解码。
pub(crate) fn artwork_data_uri(artwork: &Artwork) -> Result<String, ExportError> {
    let bytes = match artwork {
        Artwork::Loaded { bytes } => bytes,
        Artwork::Unavailable { reason } => {
            return Err(ExportError::RegionNotRenderable(format!(
                "专辑封面不可用: {}",
                reason
            )));
        }
    };

    let decoded = image::load_from_memory(bytes).map_err(|e| {
        ExportError::RegionNotRenderable(format!("专辑封面无法解码: {}", e))
    })?;

    let mut png = Vec::new();
    decoded
        .to_rgba8()
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| ExportError::Encode(e.to_string()))?;

    Ok(format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(png)
    ))
}

/// 将 SVG 光栅化为非预乘 RGBA 图像
pub(crate) fn rasterize(
    svg: &str,
    fontdb: Arc<usvg::fontdb::Database>,
    scale: f32,
) -> Result<RgbaImage, ExportError> {
    let opts = usvg::Options {
        fontdb,
        ..Default::default()
    };
    let tree = usvg::Tree::from_str(svg, &opts)
        .map_err(|e| ExportError::RegionNotRenderable(format!("SVG 场景解析失败: {}", e)))?;

    let size = tree.size();
    let width = (size.width() * scale).round() as u32;
    let height = (size.height() * scale).round() as u32;
    if width == 0 || height == 0 || width > MAX_DIM || height > MAX_DIM {
        return Err(ExportError::RegionNotRenderable(format!(
            "渲染尺寸无效: {}x{}",
            width, height
        )));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| ExportError::RegionNotRenderable("无法分配画布".to_string()))?;

    let transform = resvg::tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| ExportError::Encode("像素缓冲区尺寸不匹配".to_string()))
}

/// 编码为 PNG
pub(crate) fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(rgba: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(2, 2, image::Rgba(rgba));
        encode_png(&img).unwrap()
    }

    #[test]
    fn test_artwork_data_uri() {
        let artwork = Artwork::Loaded {
            bytes: Arc::new(png_bytes([200, 10, 10, 255])),
        };
        let uri = artwork_data_uri(&artwork).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));

        let payload = uri.trim_start_matches("data:image/png;base64,");
        let decoded = general_purpose::STANDARD.decode(payload).unwrap();
        let img = image::load_from_memory(&decoded).unwrap();
        assert_eq!(img.width(), 2);
    }

    #[test]
    fn test_artwork_unavailable() {
        let artwork = Artwork::Unavailable {
            reason: "blocked".to_string(),
        };
        let err = artwork_data_uri(&artwork).unwrap_err();
        assert!(err.to_string().contains("blocked"));
    }

    #[test]
    fn test_rasterize_shapes_without_fonts() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10" viewBox="0 0 20 10"><rect x="0" y="0" width="20" height="10" fill="#1db954"/></svg>"##;
        let fontdb = Arc::new(usvg::fontdb::Database::new());

        let img = rasterize(svg, fontdb.clone(), 2.0).unwrap();
        assert_eq!(img.dimensions(), (40, 20));
        assert_eq!(img.get_pixel(5, 5).0, [0x1d, 0xb9, 0x54, 0xff]);

        let png = encode_png(&img).unwrap();
        assert_eq!(&png[1..4], b"PNG");

        assert!(rasterize("<svg", fontdb, 1.0).is_err());
    }
}
