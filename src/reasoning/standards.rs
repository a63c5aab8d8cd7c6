// 该文件是 Jianxiu （检修） 项目的一部分。
// src/reasoning/standards.rs - 标准对应
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

use std::{collections::HashSet, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{model::Detection, reasoning::StandardsRegistry};

/// 标签对应的一条 ISO / SOP 记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SopMapping {
  pub label: String,
  pub iso: String,
  pub sop: String,
  pub priority: u32,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub procedure: String,
}

#[derive(Debug, Clone)]
pub struct StandardsMapper {
  registry: Arc<StandardsRegistry>,
}

impl StandardsMapper {
  pub fn new(registry: Arc<StandardsRegistry>) -> Self {
    Self { registry }
  }

  /// 按标签首次出现的顺序查表，未登记的标签直接跳过
  pub fn map_to_standards(&self, detections: &[Detection]) -> Vec<SopMapping> {
    let mut seen_labels = HashSet::new();
    let mut seen_triples = HashSet::new();
    let mut mappings = Vec::new();

    for det in detections {
      let label = det.label();
      if !seen_labels.insert(label) {
        continue;
      }

      let standards = self.registry.standards_for(label);
      if standards.is_empty() {
        debug!("标签 {} 没有对应标准", label);
      }

      for entry in standards {
        if !seen_triples.insert((label, entry.iso.as_str(), entry.sop.as_str())) {
          continue;
        }
        mappings.push(SopMapping {
          label: label.to_string(),
          iso: entry.iso.clone(),
          sop: entry.sop.clone(),
          priority: entry.priority,
          procedure: entry.procedure.clone(),
        });
      }
    }

    mappings
  }
}
