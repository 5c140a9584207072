use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::export::ExportError;

// 同名文件过多时放弃
const MAX_ATTEMPTS: usize = 1000;

/// 文件保存接口
pub trait FileSaver: Send + Sync {
    /// 保存字节内容，返回实际写入的路径
    fn save(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, ExportError>;
}

/// 保存到下载目录，同名时按浏览器的方式追加序号
pub struct DownloadDirSaver {
    dir: PathBuf,
}

impl DownloadDirSaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// 写入新建的文件，失败时删除写了一半的文件
fn write_new_file(mut file: impl Write, path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let result = file.write_all(bytes).and_then(|_| file.flush());
    if let Err(e) = result {
        drop(file);
        if let Err(remove_err) = fs::remove_file(path) {
            warn!("无法删除未写完的文件 {:?}: {}", path, remove_err);
        }
        return Err(e.into());
    }
    Ok(())
}

/// 第 n 个候选文件名: cover.png, cover (1).png, cover (2).png ...
fn candidate_name(filename: &str, n: usize) -> String {
    if n == 0 {
        return filename.to_string();
    }
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, n, ext),
        _ => format!("{} ({})", filename, n),
    }
}

impl FileSaver for DownloadDirSaver {
    fn save(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir)?;

        for n in 0..MAX_ATTEMPTS {
            let path = self.dir.join(candidate_name(filename, n));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    write_new_file(SyncedFile(file), &path, bytes)?;
                    debug!("已写入 {} 字节到 {:?}", bytes.len(), path);
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(ExportError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("{} 的同名文件过多", filename),
        )))
    }
}

/// flush 时同步到磁盘
struct SyncedFile(fs::File);

impl Write for SyncedFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.flush()?;
        self.0.sync_all()
    }
}
