// 该文件是 Jianxiu （检修） 项目的一部分。
// src/reasoning.rs - 缺陷推理
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

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::model::Detection;

mod recommend;
mod registry;
mod severity;
mod standards;

pub use self::recommend::{GENERIC_RECOMMENDATION, priority_threshold, recommend};
pub use self::registry::{DefectEntry, RegistryError, StandardEntry, StandardsRegistry};
pub use self::severity::{DEFAULT_MIN_CONFIDENCE, SeverityClassifier, SeverityLevel};
pub use self::standards::{SopMapping, StandardsMapper};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
  pub total: usize,
  /// 各标签的检测数量
  #[serde(default)]
  pub by_label: BTreeMap<String, usize>,
}

impl Summary {
  pub fn of(detections: &[Detection]) -> Self {
    let mut by_label = BTreeMap::new();
    for det in detections {
      *by_label.entry(det.label().to_string()).or_insert(0) += 1;
    }
    Self {
      total: detections.len(),
      by_label,
    }
  }
}

/// 一次检测的推理结果，构造后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
  pub severity: SeverityLevel,
  pub summary: Summary,
  pub sop_mappings: Vec<SopMapping>,
  pub recommendations: Vec<String>,
}

/// 组合严重等级判定、标准对应与建议生成
#[derive(Debug, Clone)]
pub struct Reasoner {
  classifier: SeverityClassifier,
  mapper: StandardsMapper,
}

impl Reasoner {
  pub fn new(registry: Arc<StandardsRegistry>) -> Self {
    Self {
      classifier: SeverityClassifier::new(registry.clone()),
      mapper: StandardsMapper::new(registry),
    }
  }

  pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
    self.classifier = self.classifier.with_min_confidence(min_confidence);
    self
  }

  pub fn analyze(&self, detections: &[Detection]) -> AnalysisResult {
    let severity = self.classifier.classify(detections);
    let sop_mappings = self.mapper.map_to_standards(detections);
    let recommendations = recommend(severity, &sop_mappings);

    AnalysisResult {
      severity,
      summary: Summary::of(detections),
      sop_mappings,
      recommendations,
    }
  }
}
