use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};
use usvg::fontdb::{Database, Family, Query};

/// 加载系统字体和配置中的字体目录
pub(crate) fn build_fontdb(font_dirs: &[PathBuf]) -> Arc<Database> {
    let mut db = Database::new();
    db.load_system_fonts();

    for dir in font_dirs {
        load_fonts_from_dir(&mut db, dir);
    }

    ensure_sans_serif(&mut db);
    debug!("字体库加载完成，共 {} 个字体", db.len());
    Arc::new(db)
}

fn load_fonts_from_dir(db: &mut Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        warn!("无法读取字体目录 {:?}", dir);
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            warn!("加载字体 {:?} 失败: {}", path, e);
        }
    }
}

// 默认的 sans-serif 族名在部分系统上不存在，退回到任意已加载的字体
fn ensure_sans_serif(db: &mut Database) {
    let query = Query {
        families: &[Family::SansSerif],
        ..Default::default()
    };
    if db.query(&query).is_some() {
        return;
    }

    let fallback = db
        .faces()
        .next()
        .and_then(|face| face.families.first())
        .map(|(name, _)| name.clone());

    if let Some(name) = fallback {
        debug!("sans-serif 不可用，使用 {} 代替", name);
        db.set_sans_serif_family(name);
    }
}
