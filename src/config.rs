// 该文件是 Jianxiu （检修） 项目的一部分。
// src/config.rs - 检测配置
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

use std::{path::PathBuf, sync::Arc, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl,
  model::{CannedDetector, CannedDetectorError, DetectorError, DetectorWrapper},
  output::{Draw, DrawError},
  pipeline::Pipeline,
  reasoning::{DEFAULT_MIN_CONFIDENCE, RegistryError, StandardsRegistry},
};

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("配置文件格式错误: {0}")]
  FormatError(#[from] toml::de::Error),
  #[error("URL 解析错误: {0}")]
  UrlError(#[from] url::ParseError),
  #[error("登记表错误: {0}")]
  RegistryError(#[from] RegistryError),
  #[error("检测器错误: {0}")]
  DetectorError(#[from] DetectorError),
  #[error("预置检测集错误: {0}")]
  CannedError(#[from] CannedDetectorError),
  #[error("字体错误: {0}")]
  FontError(#[from] DrawError),
  #[error("配置值无效: {0}")]
  InvalidValue(String),
}

/// 检测配置，可从 TOML 文件加载，缺省字段取默认值
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InspectionConfig {
  /// 检测器 URL：`mock:`、`canned:`、`canned:///set.toml`、`http(s)://...`
  pub detector: String,
  /// 替换内置登记表的 TOML 文件
  pub registry: Option<PathBuf>,
  /// 预置输入使用的检测集文件
  pub canned: Option<PathBuf>,
  /// 参与严重等级计算的最低置信度
  pub min_confidence: f32,
  /// 检测超时（毫秒），缺省不限时
  pub detect_timeout_ms: Option<u64>,
  /// 替换内置标签字体的字体文件
  pub font: Option<PathBuf>,
  /// 是否生成标注图像
  pub annotate: bool,
}

impl Default for InspectionConfig {
  fn default() -> Self {
    Self {
      detector: "mock:".to_string(),
      registry: None,
      canned: None,
      min_confidence: DEFAULT_MIN_CONFIDENCE,
      detect_timeout_ms: None,
      font: None,
      annotate: true,
    }
  }
}

impl InspectionConfig {
  pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
  }

  pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    info!("加载配置文件: {}", path.display());
    Self::from_toml_str(&std::fs::read_to_string(path)?)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&self.min_confidence) {
      return Err(ConfigError::InvalidValue(format!(
        "min_confidence = {} 不在 [0, 1] 内",
        self.min_confidence
      )));
    }
    if self.detect_timeout_ms == Some(0) {
      return Err(ConfigError::InvalidValue(
        "detect_timeout_ms 必须大于 0".to_string(),
      ));
    }
    Ok(())
  }

  pub fn detect_timeout(&self) -> Option<Duration> {
    self.detect_timeout_ms.map(Duration::from_millis)
  }

  pub fn detector_url(&self) -> Result<Url, ConfigError> {
    Ok(Url::parse(&self.detector)?)
  }

  /// 按配置加载登记表、检测器与字体，构建流水线
  pub fn build_pipeline(&self) -> Result<Pipeline<DetectorWrapper>, ConfigError> {
    self.validate()?;

    let registry = match &self.registry {
      Some(path) => StandardsRegistry::from_file(path)?,
      None => StandardsRegistry::builtin()?,
    };
    let detector = DetectorWrapper::from_url(&self.detector_url()?)?;
    let canned = match &self.canned {
      Some(path) => CannedDetector::from_file(path)?,
      None => CannedDetector::default(),
    };
    let draw = match &self.font {
      Some(path) => Draw::default().with_font_file(path)?,
      None => Draw::default(),
    };

    Ok(
      Pipeline::builder(detector)
        .registry(Arc::new(registry))
        .canned(canned)
        .min_confidence(self.min_confidence)
        .draw(draw)
        .detect_timeout(self.detect_timeout())
        .annotate(self.annotate)
        .build()?,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_file_gives_defaults() {
    assert_eq!(
      InspectionConfig::from_toml_str("").unwrap(),
      InspectionConfig::default()
    );
  }

  #[test]
  fn parses_all_fields() {
    let config = InspectionConfig::from_toml_str(
      r#"
detector = "canned:"
registry = "/etc/jianxiu/registry.toml"
min_confidence = 0.5
detect_timeout_ms = 1500
annotate = false
"#,
    )
    .unwrap();
    assert_eq!(config.detector, "canned:");
    assert_eq!(config.min_confidence, 0.5);
    assert_eq!(config.detect_timeout(), Some(Duration::from_millis(1500)));
    assert!(!config.annotate);
  }

  #[test]
  fn rejects_unknown_fields_and_bad_values() {
    assert!(matches!(
      InspectionConfig::from_toml_str("detectr = \"mock:\""),
      Err(ConfigError::FormatError(_))
    ));
    assert!(matches!(
      InspectionConfig::from_toml_str("min_confidence = 1.5"),
      Err(ConfigError::InvalidValue(_))
    ));
    assert!(matches!(
      InspectionConfig::from_toml_str("detect_timeout_ms = 0"),
      Err(ConfigError::InvalidValue(_))
    ));
  }

  #[test]
  fn default_config_builds_a_pipeline() {
    let pipeline = InspectionConfig::default().build_pipeline().unwrap();
    assert_eq!(pipeline.registry().len(), 3);
  }

  #[test]
  fn unknown_detector_scheme_fails_at_startup() {
    let config = InspectionConfig {
      detector: "onnx:///models/defects.onnx".to_string(),
      ..Default::default()
    };
    assert!(matches!(
      config.build_pipeline(),
      Err(ConfigError::DetectorError(DetectorError::SchemeMismatch(_)))
    ));
  }
}
