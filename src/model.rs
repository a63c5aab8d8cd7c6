// 该文件是 Jianxiu （检修） 项目的一部分。
// src/model.rs - 检测器与检测结果
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

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{FromUrl, frame::SourceImage};

/// 边界框，源图像像素坐标，序列化为 `[x, y, w, h]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

impl From<[f32; 4]> for BoundingBox {
  fn from([x, y, width, height]: [f32; 4]) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }
}

impl From<BoundingBox> for [f32; 4] {
  fn from(bbox: BoundingBox) -> Self {
    [bbox.x, bbox.y, bbox.width, bbox.height]
  }
}

impl BoundingBox {
  pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  pub fn is_finite(&self) -> bool {
    self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
  }

  /// 将边框裁剪到 `width x height` 的图像内
  pub fn clamp_to(&self, width: u32, height: u32) -> Self {
    let (w, h) = (width as f32, height as f32);
    let x_min = self.x.max(0.0).min(w);
    let y_min = self.y.max(0.0).min(h);
    let x_max = (self.x + self.width).max(x_min).min(w);
    let y_max = (self.y + self.height).max(y_min).min(h);

    Self {
      x: x_min,
      y: y_min,
      width: x_max - x_min,
      height: y_max - y_min,
    }
  }
}

/// 单个缺陷检测结果，构造后不可修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
  label: String,
  confidence: f32,
  bbox: BoundingBox,
}

impl Detection {
  pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
    Self {
      label: label.into(),
      confidence,
      bbox,
    }
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn confidence(&self) -> f32 {
    self.confidence
  }

  pub fn bbox(&self) -> &BoundingBox {
    &self.bbox
  }

  /// 检测器边界上的校验：有限几何裁剪进图像，非法几何直接拒绝
  pub fn validate(self, width: u32, height: u32) -> Result<Self, DetectorError> {
    if self.label.trim().is_empty() {
      return Err(DetectorError::MalformedDetection("标签为空".to_string()));
    }
    if !(0.0..=1.0).contains(&self.confidence) {
      return Err(DetectorError::MalformedDetection(format!(
        "{}: 置信度 {} 不在 [0, 1] 内",
        self.label, self.confidence
      )));
    }
    if !self.bbox.is_finite() || self.bbox.width < 0.0 || self.bbox.height < 0.0 {
      return Err(DetectorError::MalformedDetection(format!(
        "{}: 边框非法 {:?}",
        self.label, self.bbox
      )));
    }

    Ok(Self {
      bbox: self.bbox.clamp_to(width, height),
      ..self
    })
  }
}

/// 按检测器输出顺序排列的检测结果
pub type DetectionSet = Vec<Detection>;

#[derive(Error, Debug)]
pub enum DetectorError {
  #[error("输入无效: {0}")]
  InvalidInput(String),
  #[error("检测结果无效: {0}")]
  MalformedDetection(String),
  #[error("预置检测集错误: {0}")]
  CannedError(#[from] CannedDetectorError),
  #[cfg(feature = "remote_detector")]
  #[error("远程检测服务错误: {0}")]
  RemoteError(#[from] RemoteDetectorError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub trait Detector {
  type Error: Into<DetectorError>;

  fn detect(&self, image: &SourceImage) -> Result<DetectionSet, Self::Error>;
}

mod canned;
pub use self::canned::{CannedDetector, CannedDetectorError};

mod mock;
pub use self::mock::{MOCK_LABELS, MockDetector};

#[cfg(feature = "remote_detector")]
mod remote;
#[cfg(feature = "remote_detector")]
pub use self::remote::{RemoteDetector, RemoteDetectorError};

/// 按 URL 方案选择的检测器
pub enum DetectorWrapper {
  Canned(CannedDetector),
  Mock(MockDetector),
  #[cfg(feature = "remote_detector")]
  Remote(RemoteDetector),
}

impl FromUrl for DetectorWrapper {
  type Error = DetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    use crate::FromUrlWithScheme;

    match url.scheme() {
      CannedDetector::SCHEME => Ok(DetectorWrapper::Canned(CannedDetector::from_url(url)?)),
      MockDetector::SCHEME => Ok(DetectorWrapper::Mock(MockDetector::from_url(url)?)),
      #[cfg(feature = "remote_detector")]
      "http" | "https" => Ok(DetectorWrapper::Remote(RemoteDetector::from_url(url)?)),
      other => Err(DetectorError::SchemeMismatch(other.to_string())),
    }
  }
}

impl Detector for DetectorWrapper {
  type Error = DetectorError;

  fn detect(&self, image: &SourceImage) -> Result<DetectionSet, Self::Error> {
    match self {
      DetectorWrapper::Canned(detector) => detector.detect(image).map_err(Into::into),
      DetectorWrapper::Mock(detector) => detector.detect(image).map_err(Into::into),
      #[cfg(feature = "remote_detector")]
      DetectorWrapper::Remote(detector) => detector.detect(image).map_err(Into::into),
    }
  }
}
