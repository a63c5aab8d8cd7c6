// 该文件是 Jianxiu （检修） 项目的一部分。
// src/output/overlay.rs - 检测框到显示画布的坐标变换
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

use crate::model::{BoundingBox, Detection};

/// 默认标签高度（显示画布像素）
pub const DEFAULT_TAG_HEIGHT: f32 = 18.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
  #[error("源图像尺寸退化: {0}x{1}")]
  DegenerateSource(f32, f32),
  #[error("目标画布尺寸非法: {0}x{1}")]
  DegenerateDestination(f32, f32),
}

/// 标签左上角位置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelAnchor {
  pub x: f32,
  pub y: f32,
}

/// 变换到目标画布后的一个检测
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayBox {
  pub label: String,
  pub confidence: f32,
  pub rect: BoundingBox,
  pub anchor: LabelAnchor,
}

/// 源图像坐标到目标画布坐标的缩放
///
/// 纯函数，不持有状态；画布大小变化时直接重新计算即可，无需重新检测。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayTransform {
  sx: f32,
  sy: f32,
  tag_height: f32,
}

impl Default for OverlayTransform {
  fn default() -> Self {
    Self::identity()
  }
}

impl OverlayTransform {
  pub fn new(
    source_width: f32,
    source_height: f32,
    dest_width: f32,
    dest_height: f32,
  ) -> Result<Self, GeometryError> {
    if !(source_width.is_finite() && source_height.is_finite())
      || source_width <= 0.0
      || source_height <= 0.0
    {
      return Err(GeometryError::DegenerateSource(source_width, source_height));
    }
    if !(dest_width.is_finite() && dest_height.is_finite()) || dest_width < 0.0 || dest_height < 0.0
    {
      return Err(GeometryError::DegenerateDestination(dest_width, dest_height));
    }

    Ok(Self {
      sx: dest_width / source_width,
      sy: dest_height / source_height,
      tag_height: DEFAULT_TAG_HEIGHT,
    })
  }

  pub fn identity() -> Self {
    Self {
      sx: 1.0,
      sy: 1.0,
      tag_height: DEFAULT_TAG_HEIGHT,
    }
  }

  pub fn with_tag_height(mut self, tag_height: f32) -> Self {
    self.tag_height = tag_height.max(0.0);
    self
  }

  pub fn scale(&self) -> (f32, f32) {
    (self.sx, self.sy)
  }

  pub fn project_box(&self, bbox: &BoundingBox) -> BoundingBox {
    BoundingBox {
      x: bbox.x * self.sx,
      y: bbox.y * self.sy,
      width: bbox.width * self.sx,
      height: bbox.height * self.sy,
    }
  }

  /// 标签放在框的正上方；上方空间不足时放到框顶边以内
  pub fn anchor_for(&self, rect: &BoundingBox) -> LabelAnchor {
    let above = rect.y - self.tag_height;
    LabelAnchor {
      x: rect.x,
      y: if above < 0.0 { rect.y } else { above },
    }
  }

  pub fn project(&self, detections: &[Detection]) -> Vec<OverlayBox> {
    detections
      .iter()
      .map(|det| {
        let rect = self.project_box(det.bbox());
        OverlayBox {
          label: det.label().to_string(),
          confidence: det.confidence(),
          anchor: self.anchor_for(&rect),
          rect,
        }
      })
      .collect()
  }
}

/// 一次性计算检测在目标画布上的矩形与标签位置
pub fn project(
  detections: &[Detection],
  source_width: f32,
  source_height: f32,
  dest_width: f32,
  dest_height: f32,
  tag_height: f32,
) -> Result<Vec<OverlayBox>, GeometryError> {
  let transform = OverlayTransform::new(source_width, source_height, dest_width, dest_height)?
    .with_tag_height(tag_height);
  Ok(transform.project(detections))
}
