// 该文件是 Jianxiu （检修） 项目的一部分。
// src/model/canned.rs - 预置检测集
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

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::SourceImage,
  model::{BoundingBox, Detection, DetectionSet, Detector},
};

#[derive(Error, Debug)]
pub enum CannedDetectorError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("检测集文件格式错误: {0}")]
  FormatError(#[from] toml::de::Error),
}

#[derive(Debug, Deserialize)]
struct CannedFile {
  #[serde(default)]
  detections: DetectionSet,
}

/// 预置检测器：无论输入如何都返回同一组检测结果
///
/// 默认检测集：
///
/// | label | confidence | bbox |
/// |-------|------------|------|
/// | leak  | 0.90 | `[10, 10, 20, 20]` |
/// | crack | 0.40 | `[50, 50, 30, 10]` |
///
/// 可以通过 `canned:///path/to/set.toml` 替换为部署方自己的检测集。
#[derive(Debug, Clone, PartialEq)]
pub struct CannedDetector {
  detections: DetectionSet,
}

impl Default for CannedDetector {
  fn default() -> Self {
    Self {
      detections: vec![
        Detection::new("leak", 0.9, BoundingBox::new(10.0, 10.0, 20.0, 20.0)),
        Detection::new("crack", 0.4, BoundingBox::new(50.0, 50.0, 30.0, 10.0)),
      ],
    }
  }
}

impl CannedDetector {
  pub fn new(detections: DetectionSet) -> Self {
    Self { detections }
  }

  pub fn empty() -> Self {
    Self::new(Vec::new())
  }

  /// 从 TOML 文件加载检测集
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CannedDetectorError> {
    let path = path.as_ref();
    info!("加载预置检测集: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    let file: CannedFile = toml::from_str(&text)?;
    info!("预置检测集包含 {} 个检测", file.detections.len());
    Ok(Self::new(file.detections))
  }

  pub fn detections(&self) -> &[Detection] {
    &self.detections
  }
}

impl FromUrlWithScheme for CannedDetector {
  const SCHEME: &'static str = "canned";
}

impl FromUrl for CannedDetector {
  type Error = CannedDetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(CannedDetectorError::SchemeMismatch(url.scheme().to_string()));
    }

    match url.path() {
      "" | "/" => Ok(Self::default()),
      path => Self::from_file(path),
    }
  }
}

impl Detector for CannedDetector {
  type Error = CannedDetectorError;

  fn detect(&self, _image: &SourceImage) -> Result<DetectionSet, Self::Error> {
    Ok(self.detections.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn default_set_is_stable() {
    let image = SourceImage::sample_panel();
    let detector = CannedDetector::default();
    let first = detector.detect(&image).unwrap();
    let second = detector.detect(&image).unwrap();

    assert_eq!(first, second);
    assert_eq!(
      serde_json::to_string(&first).unwrap(),
      serde_json::to_string(&second).unwrap()
    );
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].label(), "leak");
    assert_eq!(first[1].label(), "crack");
  }

  #[test]
  fn loads_set_from_url_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
      file,
      r#"
[[detections]]
label = "corrosion"
confidence = 0.75
bbox = [1.0, 2.0, 3.0, 4.0]
"#
    )
    .unwrap();

    let url = Url::parse(&format!("canned://{}", file.path().display())).unwrap();
    let detector = CannedDetector::from_url(&url).unwrap();
    assert_eq!(
      detector.detections(),
      &[Detection::new(
        "corrosion",
        0.75,
        BoundingBox::new(1.0, 2.0, 3.0, 4.0)
      )]
    );
  }

  #[test]
  fn bare_scheme_yields_default_set() {
    let url = Url::parse("canned:").unwrap();
    assert_eq!(
      CannedDetector::from_url(&url).unwrap(),
      CannedDetector::default()
    );
  }
}
