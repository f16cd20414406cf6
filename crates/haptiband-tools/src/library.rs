//! 图案库
//!
//! 名称 → 图案 的映射，按名称排序；序列化为 JSON 对象。

use crate::error::LibraryError;
use crate::record::PatternRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 图案库
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternLibrary {
    patterns: BTreeMap<String, PatternRecord>,
}

impl PatternLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PatternRecord> {
        self.patterns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.patterns.contains_key(name)
    }

    /// 插入或替换图案（以记录名称为键）
    ///
    /// 返回被替换的旧记录。
    pub fn insert(&mut self, record: PatternRecord) -> Result<Option<PatternRecord>, LibraryError> {
        record.validate()?;
        Ok(self.patterns.insert(record.name.clone(), record))
    }

    /// 删除图案
    pub fn remove(&mut self, name: &str) -> Result<PatternRecord, LibraryError> {
        self.patterns
            .remove(name)
            .ok_or_else(|| LibraryError::NotFound(name.to_string()))
    }

    /// 名称（已排序）
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(String::as_str)
    }

    /// 按名称排序遍历
    pub fn iter(&self) -> impl Iterator<Item = &PatternRecord> {
        self.patterns.values()
    }

    /// 从 JSON 解析并校验每个条目
    pub fn from_json(json: &str) -> Result<Self, LibraryError> {
        let library: Self = serde_json::from_str(json)?;
        for record in library.iter() {
            record.validate()?;
        }
        Ok(library)
    }

    /// 序列化为缩进 JSON（两个空格）
    pub fn to_json_pretty(&self) -> Result<String, LibraryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<'a> IntoIterator for &'a PatternLibrary {
    type Item = &'a PatternRecord;
    type IntoIter = std::collections::btree_map::Values<'a, String, PatternRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.patterns.values()
    }
}
