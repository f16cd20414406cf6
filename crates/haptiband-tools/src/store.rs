//! 图案库存储
//!
//! - `JsonFileStore`: JSON 文件（与 `haptic_patterns.json` 兼容）
//! - `MemoryStore`: 内存存储（测试和临时会话）

use crate::error::LibraryError;
use crate::library::PatternLibrary;
use parking_lot::Mutex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 默认图案文件名
pub const PATTERNS_FILE: &str = "haptic_patterns.json";

/// 图案库存储接口
pub trait PatternStore: Send + Sync {
    /// 读取整个图案库（不存在时返回空库）
    fn load(&self) -> Result<PatternLibrary, LibraryError>;

    /// 保存整个图案库
    fn save(&self, library: &PatternLibrary) -> Result<(), LibraryError>;
}

/// JSON 文件存储
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 目录下的默认文件
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(PATTERNS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PatternStore for JsonFileStore {
    fn load(&self) -> Result<PatternLibrary, LibraryError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Pattern file {:?} not found, starting empty", self.path);
                return Ok(PatternLibrary::new());
            },
            Err(e) => return Err(LibraryError::io(&self.path, e)),
        };

        let library = PatternLibrary::from_json(&json)?;
        info!("Loaded {} pattern(s) from {:?}", library.len(), self.path);
        Ok(library)
    }

    /// 先写临时文件再重命名，避免留下半写的文件
    fn save(&self, library: &PatternLibrary) -> Result<(), LibraryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| LibraryError::io(parent, e))?;
        }

        let json = library.to_json_pretty()?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| LibraryError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| LibraryError::io(&self.path, e))?;

        debug!("Saved {} pattern(s) to {:?}", library.len(), self.path);
        Ok(())
    }
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    library: Mutex<PatternLibrary>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library(library: PatternLibrary) -> Self {
        Self {
            library: Mutex::new(library),
        }
    }
}

impl PatternStore for MemoryStore {
    fn load(&self) -> Result<PatternLibrary, LibraryError> {
        Ok(self.library.lock().clone())
    }

    fn save(&self, library: &PatternLibrary) -> Result<(), LibraryError> {
        *self.library.lock() = library.clone();
        Ok(())
    }
}
