// 该文件是 Jianxiu （检修） 项目的一部分。
// src/reasoning/severity.rs - 严重等级判定
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

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{model::Detection, reasoning::StandardsRegistry};

/// 参与严重等级计算的默认最低置信度
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.3;

/// 按风险排序的严重等级：low < medium < high < critical
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
  #[default]
  Low,
  Medium,
  High,
  Critical,
}

impl SeverityLevel {
  pub const LOWEST: SeverityLevel = SeverityLevel::Low;

  pub fn as_str(&self) -> &'static str {
    match self {
      SeverityLevel::Low => "low",
      SeverityLevel::Medium => "medium",
      SeverityLevel::High => "high",
      SeverityLevel::Critical => "critical",
    }
  }
}

impl fmt::Display for SeverityLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// 严重等级判定：取所有可信检测的标签风险最大值
#[derive(Debug, Clone)]
pub struct SeverityClassifier {
  registry: Arc<StandardsRegistry>,
  min_confidence: f32,
}

impl SeverityClassifier {
  pub fn new(registry: Arc<StandardsRegistry>) -> Self {
    Self {
      registry,
      min_confidence: DEFAULT_MIN_CONFIDENCE,
    }
  }

  pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
    self.min_confidence = min_confidence;
    self
  }

  pub fn classify(&self, detections: &[Detection]) -> SeverityLevel {
    let severity = detections
      .iter()
      .filter(|det| det.confidence() >= self.min_confidence)
      .map(|det| self.registry.risk_of(det.label()))
      .max()
      .unwrap_or(SeverityLevel::LOWEST);

    debug!(
      "严重等级: {} ({} 个检测, 最低置信度 {})",
      severity,
      detections.len(),
      self.min_confidence
    );
    severity
  }
}
