// 该文件是 Jianxiu （检修） 项目的一部分。
// src/reasoning/registry.rs - 缺陷标准登记表
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{collections::HashMap, path::Path};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::reasoning::SeverityLevel;

const BUILTIN_REGISTRY: &str = include_str!("../../labels/defects.toml");

#[derive(Error, Debug)]
pub enum RegistryError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("登记表格式错误: {0}")]
  FormatError(#[from] toml::de::Error),
  #[error("登记表中存在空标签")]
  EmptyLabel,
  #[error("登记表中标签重复: {0}")]
  DuplicateLabel(String),
}

/// 一条 ISO / SOP 对应关系
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StandardEntry {
  pub iso: String,
  pub sop: String,
  pub priority: u32,
  #[serde(default)]
  pub procedure: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DefectEntry {
  pub label: String,
  pub severity: SeverityLevel,
  #[serde(default)]
  pub standards: Vec<StandardEntry>,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
  #[serde(default)]
  defects: Vec<DefectEntry>,
}

/// 只读登记表：标签 -> 风险等级与标准对应关系
///
/// 启动时加载一次，之后以 `Arc` 共享，运行期间不再修改。
#[derive(Debug, Clone)]
pub struct StandardsRegistry {
  entries: Vec<DefectEntry>,
  index: HashMap<String, usize>,
}

impl StandardsRegistry {
  pub fn new(entries: Vec<DefectEntry>) -> Result<Self, RegistryError> {
    let mut index = HashMap::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
      if entry.label.trim().is_empty() {
        return Err(RegistryError::EmptyLabel);
      }
      if index.insert(entry.label.clone(), i).is_some() {
        return Err(RegistryError::DuplicateLabel(entry.label.clone()));
      }
    }
    Ok(Self { entries, index })
  }

  /// 随程序发布的默认登记表（`labels/defects.toml`）
  pub fn builtin() -> Result<Self, RegistryError> {
    Self::from_toml_str(BUILTIN_REGISTRY)
  }

  pub fn from_toml_str(text: &str) -> Result<Self, RegistryError> {
    let file: RegistryFile = toml::from_str(text)?;
    Self::new(file.defects)
  }

  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
    let path = path.as_ref();
    let registry = Self::from_toml_str(&std::fs::read_to_string(path)?)?;
    info!(
      "加载登记表: {} ({} 个标签)",
      path.display(),
      registry.entries.len()
    );
    Ok(registry)
  }

  pub fn get(&self, label: &str) -> Option<&DefectEntry> {
    self.index.get(label).map(|&i| &self.entries[i])
  }

  /// 标签的固有风险，未登记的标签视为最低风险
  pub fn risk_of(&self, label: &str) -> SeverityLevel {
    self
      .get(label)
      .map(|entry| entry.severity)
      .unwrap_or(SeverityLevel::LOWEST)
  }

  pub fn standards_for(&self, label: &str) -> &[StandardEntry] {
    self
      .get(label)
      .map(|entry| entry.standards.as_slice())
      .unwrap_or(&[])
  }

  pub fn labels(&self) -> impl Iterator<Item = &str> {
    self.entries.iter().map(|entry| entry.label.as_str())
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
