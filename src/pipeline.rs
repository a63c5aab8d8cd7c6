// 该文件是 Jianxiu （检修） 项目的一部分。
// src/pipeline.rs - 检测到推理的处理流水线
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

use std::{
  sync::{Arc, mpsc},
  thread,
  time::{Duration, Instant},
};

use image::RgbImage;
use serde::{Deserialize, Serialize, ser::SerializeMap};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
  frame::{FrameError, SourceImage},
  input::PipelineInput,
  model::{CannedDetector, DetectionSet, Detector, DetectorError},
  output::{Draw, EncodedImage, GeometryError, OverlayBox, OverlayTransform},
  reasoning::{DEFAULT_MIN_CONFIDENCE, Reasoner, StandardsRegistry},
};

pub use crate::reasoning::AnalysisResult;

#[derive(Error, Debug)]
pub enum PipelineError {
  #[error("输入无效: {0}")]
  InvalidInput(String),
  #[error("检测超时: 超过 {0:?}")]
  DetectionTimeout(Duration),
  #[error("几何退化: {0}")]
  DegenerateGeometry(#[from] GeometryError),
  #[error("检测器失败: {0}")]
  DetectorFailure(String),
}

impl PipelineError {
  /// 稳定的错误类别代码
  pub fn kind(&self) -> &'static str {
    match self {
      PipelineError::InvalidInput(_) => "invalid_input",
      PipelineError::DetectionTimeout(_) => "detection_timeout",
      PipelineError::DegenerateGeometry(_) => "degenerate_geometry",
      PipelineError::DetectorFailure(_) => "detector_failure",
    }
  }
}

/// 序列化为 `{"error": {"kind": ..., "message": ...}}`
impl Serialize for PipelineError {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Body<'a> {
      kind: &'a str,
      message: String,
    }

    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(
      "error",
      &Body {
        kind: self.kind(),
        message: self.to_string(),
      },
    )?;
    map.end()
  }
}

impl From<FrameError> for PipelineError {
  fn from(err: FrameError) -> Self {
    PipelineError::InvalidInput(err.to_string())
  }
}

impl From<DetectorError> for PipelineError {
  fn from(err: DetectorError) -> Self {
    match err {
      DetectorError::InvalidInput(msg) => PipelineError::InvalidInput(msg),
      other => PipelineError::DetectorFailure(other.to_string()),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDimensions {
  pub width: u32,
  pub height: u32,
}

/// 一次检测的完整输出，归调用方所有
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
  pub detections: DetectionSet,
  pub analysis: AnalysisResult,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub annotated_image: Option<EncodedImage>,
  pub source: SourceDimensions,
}

impl PipelineResult {
  /// 把检测几何投影到 `dest_width x dest_height` 的显示画布
  pub fn overlay(
    &self,
    dest_width: f32,
    dest_height: f32,
    tag_height: f32,
  ) -> Result<Vec<OverlayBox>, GeometryError> {
    let transform = OverlayTransform::new(
      self.source.width as f32,
      self.source.height as f32,
      dest_width,
      dest_height,
    )?
    .with_tag_height(tag_height);
    Ok(transform.project(&self.detections))
  }
}

pub struct PipelineBuilder<D> {
  detector: D,
  canned: CannedDetector,
  registry: Option<Arc<StandardsRegistry>>,
  min_confidence: f32,
  draw: Draw,
  detect_timeout: Option<Duration>,
  annotate: bool,
}

impl<D> PipelineBuilder<D> {
  pub fn canned(mut self, canned: CannedDetector) -> Self {
    self.canned = canned;
    self
  }

  pub fn registry(mut self, registry: Arc<StandardsRegistry>) -> Self {
    self.registry = Some(registry);
    self
  }

  pub fn min_confidence(mut self, min_confidence: f32) -> Self {
    self.min_confidence = min_confidence;
    self
  }

  pub fn draw(mut self, draw: Draw) -> Self {
    self.draw = draw;
    self
  }

  pub fn detect_timeout(mut self, timeout: Option<Duration>) -> Self {
    self.detect_timeout = timeout;
    self
  }

  /// 关闭后结果中不含标注图像
  pub fn annotate(mut self, annotate: bool) -> Self {
    self.annotate = annotate;
    self
  }

  pub fn build(self) -> Result<Pipeline<D>, crate::reasoning::RegistryError> {
    let registry = match self.registry {
      Some(registry) => registry,
      None => Arc::new(StandardsRegistry::builtin()?),
    };
    info!(
      "流水线就绪: {} 个登记标签, 最低置信度 {}, 检测超时 {:?}",
      registry.len(),
      self.min_confidence,
      self.detect_timeout
    );

    Ok(Pipeline {
      detector: Arc::new(self.detector),
      canned: self.canned,
      reasoner: Reasoner::new(registry.clone()).with_min_confidence(self.min_confidence),
      registry,
      draw: self.draw,
      detect_timeout: self.detect_timeout,
      annotate: self.annotate,
    })
  }
}

/// 无状态的检测流水线：一张图像进，一个结果出
///
/// 登记表与检测器以 `Arc` 只读共享，可以跨线程并发调用 [`Pipeline::run`]。
pub struct Pipeline<D> {
  detector: Arc<D>,
  canned: CannedDetector,
  registry: Arc<StandardsRegistry>,
  reasoner: Reasoner,
  draw: Draw,
  detect_timeout: Option<Duration>,
  annotate: bool,
}

impl<D> Pipeline<D> {
  pub fn builder(detector: D) -> PipelineBuilder<D> {
    PipelineBuilder {
      detector,
      canned: CannedDetector::default(),
      registry: None,
      min_confidence: DEFAULT_MIN_CONFIDENCE,
      draw: Draw::default(),
      detect_timeout: None,
      annotate: true,
    }
  }

  pub fn registry(&self) -> &StandardsRegistry {
    &self.registry
  }
}

impl<D> Pipeline<D>
where
  D: Detector + Send + Sync + 'static,
{
  pub fn run(&self, input: PipelineInput) -> Result<PipelineResult, PipelineError> {
    let start = Instant::now();

    let (image, detections) = match input {
      PipelineInput::Canned => {
        info!("使用预置示例输入");
        let image = SourceImage::sample_panel();
        let detections = self
          .canned
          .detect(&image)
          .map_err(DetectorError::from)?;
        (image, detections)
      }
      PipelineInput::Image {
        bytes,
        width,
        height,
      } => {
        let image = Arc::new(SourceImage::decode_with_hint(&bytes, width, height)?);
        let detections = self.detect(&image)?;
        let image = Arc::try_unwrap(image).unwrap_or_else(|shared| (*shared).clone());
        (image, detections)
      }
    };

    self.assemble(image, detections, start)
  }

  /// 检测之后的共同步骤：校验检测、推理、绘制标注
  fn assemble(
    &self,
    image: SourceImage,
    detections: DetectionSet,
    start: Instant,
  ) -> Result<PipelineResult, PipelineError> {
    let (width, height) = image.dimensions();
    let detections = detections
      .into_iter()
      .map(|det| det.validate(width, height))
      .collect::<Result<DetectionSet, _>>()?;
    info!(
      "检测完成: {} 个缺陷, 耗时 {:.2?}",
      detections.len(),
      start.elapsed()
    );

    let analysis = self.reasoner.analyze(&detections);
    info!(
      "推理完成: 严重等级 {}, {} 条标准对应, {} 条建议",
      analysis.severity,
      analysis.sop_mappings.len(),
      analysis.recommendations.len()
    );

    let annotated_image = if self.annotate {
      let annotated = self
        .draw
        .annotate(&image, &detections, &self.registry, analysis.severity);
      encode_annotation(&annotated)
    } else {
      None
    };
    debug!("流水线总耗时 {:.2?}", start.elapsed());

    Ok(PipelineResult {
      detections,
      analysis,
      annotated_image,
      source: SourceDimensions { width, height },
    })
  }

  fn detect(&self, image: &Arc<SourceImage>) -> Result<DetectionSet, PipelineError> {
    let Some(timeout) = self.detect_timeout else {
      return self
        .detector
        .detect(image)
        .map_err(|e| PipelineError::from(Into::<DetectorError>::into(e)));
    };

    let (tx, rx) = mpsc::channel();
    let detector = Arc::clone(&self.detector);
    let frame = Arc::clone(image);
    thread::spawn(move || {
      let result = detector.detect(&frame).map_err(Into::<DetectorError>::into);
      // 超时后接收端已被丢弃，结果直接作废
      let _ = tx.send(result);
    });

    match rx.recv_timeout(timeout) {
      Ok(result) => Ok(result?),
      Err(mpsc::RecvTimeoutError::Timeout) => {
        error!("检测超时: {:?}", timeout);
        Err(PipelineError::DetectionTimeout(timeout))
      }
      Err(mpsc::RecvTimeoutError::Disconnected) => Err(PipelineError::DetectorFailure(
        "检测线程异常退出".to_string(),
      )),
    }
  }
}

/// 标注失败只记录日志，不影响检测与推理结果
fn encode_annotation(annotated: &RgbImage) -> Option<EncodedImage> {
  match EncodedImage::encode_png(annotated) {
    Ok(encoded) => Some(encoded),
    Err(e) => {
      warn!("标注图像编码失败，结果中省略标注图像: {}", e);
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    model::{BoundingBox, Detection, MockDetector},
    reasoning::SeverityLevel,
  };

  #[test]
  fn encoding_failure_yields_no_annotation() {
    assert!(encode_annotation(&RgbImage::new(0, 0)).is_none());
    assert!(encode_annotation(&RgbImage::new(2, 2)).is_some());
  }

  #[test]
  fn encoding_failure_keeps_detections_and_analysis() {
    let pipeline = Pipeline::builder(MockDetector).build().unwrap();
    let detections = vec![Detection::new(
      "leak",
      0.9,
      BoundingBox::new(10.0, 10.0, 20.0, 20.0),
    )];

    // 零尺寸图像无法编码为 PNG
    let result = pipeline
      .assemble(
        SourceImage::from(RgbImage::new(0, 0)),
        detections,
        Instant::now(),
      )
      .unwrap();

    assert!(result.annotated_image.is_none());
    assert_eq!(result.detections.len(), 1);
    assert_eq!(result.analysis.severity, SeverityLevel::Critical);
    assert_eq!(result.analysis.summary.total, 1);
    assert!(!result.analysis.recommendations.is_empty());
    assert_eq!(
      result.source,
      SourceDimensions {
        width: 0,
        height: 0
      }
    );
  }

  #[test]
  fn error_kinds_are_stable() {
    assert_eq!(
      PipelineError::InvalidInput(String::new()).kind(),
      "invalid_input"
    );
    assert_eq!(
      PipelineError::from(DetectorError::MalformedDetection(String::new())).kind(),
      "detector_failure"
    );
    assert_eq!(
      PipelineError::from(DetectorError::InvalidInput(String::new())).kind(),
      "invalid_input"
    );
  }
}
