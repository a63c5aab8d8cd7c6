// 该文件是 Jianxiu （检修） 项目的一部分。
// src/reasoning/recommend.rs - 维护建议生成
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

use crate::reasoning::{SeverityLevel, SopMapping};

pub const GENERIC_RECOMMENDATION: &str =
  "Schedule inspection: no mapped SOP applies, have a specialist review the flagged areas.";

/// 各严重等级下参与生成建议的最大 priority 数值
pub fn priority_threshold(severity: SeverityLevel) -> u32 {
  match severity {
    SeverityLevel::Critical => u32::MAX,
    SeverityLevel::High => 3,
    SeverityLevel::Medium => 2,
    SeverityLevel::Low => 1,
  }
}

fn urgency(severity: SeverityLevel) -> &'static str {
  match severity {
    SeverityLevel::Critical => "Immediate action, isolate and shut down if needed",
    SeverityLevel::High => "Repair within 24 hours and schedule NDT / specialist inspection",
    SeverityLevel::Medium => "Repair or patch and re-inspect; monitor weekly",
    SeverityLevel::Low => "Document and schedule maintenance",
  }
}

fn expand(severity: SeverityLevel, mapping: &SopMapping) -> String {
  let mut text = format!(
    "{}: {} - follow {} ({})",
    mapping.label,
    urgency(severity),
    mapping.sop,
    mapping.iso
  );
  if !mapping.procedure.is_empty() {
    text.push_str(": ");
    text.push_str(&mapping.procedure);
  }
  text
}

/// 由严重等级与标准对应关系生成建议，结果只依赖这两个输入
pub fn recommend(severity: SeverityLevel, mappings: &[SopMapping]) -> Vec<String> {
  let threshold = priority_threshold(severity);
  let mut recommendations: Vec<String> = mappings
    .iter()
    .filter(|mapping| mapping.priority <= threshold)
    .map(|mapping| expand(severity, mapping))
    .collect();

  if recommendations.is_empty() && severity > SeverityLevel::LOWEST {
    recommendations.push(GENERIC_RECOMMENDATION.to_string());
  }

  recommendations
}

#[cfg(test)]
mod tests {
  use super::*;

  const LEVELS: [SeverityLevel; 4] = [
    SeverityLevel::Low,
    SeverityLevel::Medium,
    SeverityLevel::High,
    SeverityLevel::Critical,
  ];

  fn mapping(label: &str, priority: u32) -> SopMapping {
    SopMapping {
      label: label.to_string(),
      iso: "ISO 0000".to_string(),
      sop: format!("SOP-{label}"),
      priority,
      procedure: String::new(),
    }
  }

  #[test]
  fn one_line_per_qualifying_mapping() {
    let mappings = [mapping("leak", 1), mapping("crack", 2), mapping("paint", 5)];
    let recs = recommend(SeverityLevel::High, &mappings);
    assert_eq!(recs.len(), 2);
    assert!(recs[0].starts_with("leak: "));
    assert!(recs[1].contains("SOP-crack"));

    assert_eq!(recommend(SeverityLevel::Critical, &mappings).len(), 3);
  }

  #[test]
  fn generic_line_when_nothing_qualifies_above_low() {
    let mappings = [mapping("paint", 9)];
    for severity in [SeverityLevel::Medium, SeverityLevel::High] {
      assert_eq!(
        recommend(severity, &mappings),
        vec![GENERIC_RECOMMENDATION.to_string()]
      );
    }
    assert_eq!(
      recommend(SeverityLevel::Medium, &[]),
      vec![GENERIC_RECOMMENDATION.to_string()]
    );
  }

  #[test]
  fn empty_iff_lowest_and_nothing_qualifies() {
    let cases: [&[SopMapping]; 4] = [
      &[],
      &[mapping("paint", 9)],
      &[mapping("leak", 1)],
      &[mapping("crack", 2), mapping("leak", 1)],
    ];
    for severity in LEVELS {
      for mappings in cases {
        let qualifying = mappings
          .iter()
          .filter(|m| m.priority <= priority_threshold(severity))
          .count();
        let recs = recommend(severity, mappings);
        assert_eq!(
          recs.is_empty(),
          severity == SeverityLevel::Low && qualifying == 0,
          "{severity} with {mappings:?}"
        );
      }
    }
  }

  #[test]
  fn procedure_text_is_included() {
    let mut leak = mapping("leak", 1);
    leak.procedure = "Isolate line.".to_string();
    let recs = recommend(SeverityLevel::Critical, &[leak]);
    assert_eq!(
      recs,
      vec!["leak: Immediate action, isolate and shut down if needed - follow SOP-leak (ISO 0000): Isolate line.".to_string()]
    );
  }
}
