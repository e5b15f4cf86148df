// ==========================================
// 实验室试剂库 - 上传文件暂存
// ==========================================
// 流程: 保存上传 → 处理 → 删除
// 红线: 上传文件在任何退出路径上都会被删除（Drop 清理）
// ==========================================

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 上传文件守卫，离开作用域时删除文件
#[derive(Debug)]
pub struct UploadGuard {
    path: PathBuf,
}

impl UploadGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "已删除上传文件"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "删除上传文件失败"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_removes_file_on_drop() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("upload.csv");
        std::fs::write(&path, "orf_id\n").unwrap();

        {
            let guard = UploadGuard::new(&path);
            assert!(guard.path().exists());
        }

        assert!(!path.exists());
    }

    #[test]
    fn test_guard_tolerates_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let guard = UploadGuard::new(dir.path().join("never-written.csv"));
        drop(guard);
    }
}
