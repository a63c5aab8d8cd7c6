// 该文件是 Jianxiu （检修） 项目的一部分。
// src/output/draw.rs - 缺陷检测结果可视化
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

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut},
  rect::Rect,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  frame::SourceImage,
  model::{BoundingBox, Detection},
  output::overlay::OverlayTransform,
  reasoning::{SeverityLevel, StandardsRegistry},
};

// 内置标签字体（DejaVu Sans Mono，许可见 assets/FONT-LICENSE.txt）
const EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/font.ttf");

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_TEXT_HEIGHT: i32 = 20;
const LABEL_CHAR_WIDTH: f32 = 10.0; // 等宽字体每字符宽度，略大于实际字宽
const LABEL_TEXT_PADDING: i32 = 3;
const BOX_THICKNESS: i32 = 2;
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

// 左上角总览横幅
const BANNER_ORIGIN: i32 = 4;
const BANNER_COLOR: Rgb<u8> = Rgb([24, 24, 28]);

#[derive(Error, Debug)]
pub enum DrawError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体文件无效: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 按标签风险等级选择边框颜色，critical 独占深红色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
  pub critical: Rgb<u8>,
  pub high: Rgb<u8>,
  pub medium: Rgb<u8>,
  pub low: Rgb<u8>,
}

impl Default for Palette {
  fn default() -> Self {
    Self {
      critical: Rgb([220, 20, 60]),
      high: Rgb([255, 165, 0]),
      medium: Rgb([255, 215, 0]),
      low: Rgb([0, 200, 255]),
    }
  }
}

impl Palette {
  pub fn color_for(&self, level: SeverityLevel) -> Rgb<u8> {
    match level {
      SeverityLevel::Critical => self.critical,
      SeverityLevel::High => self.high,
      SeverityLevel::Medium => self.medium,
      SeverityLevel::Low => self.low,
    }
  }
}

pub struct Draw {
  font: Option<FontArc>,
  font_size: f32,
  label_text_height: i32,
  label_char_width: f32,
  label_text_padding: i32,
  palette: Palette,
}

impl Default for Draw {
  fn default() -> Self {
    let font = match FontArc::try_from_slice(EMBEDDED_FONT) {
      Ok(font) => Some(font),
      Err(e) => {
        warn!("内置字体无效，标签只绘制底色: {}", e);
        None
      }
    };

    Self {
      font,
      font_size: LABEL_FONT_SIZE,
      label_text_height: LABEL_TEXT_HEIGHT,
      label_char_width: LABEL_CHAR_WIDTH,
      label_text_padding: LABEL_TEXT_PADDING,
      palette: Palette::default(),
    }
  }
}

impl Draw {
  pub fn with_font(mut self, font: FontArc) -> Self {
    self.font = Some(font);
    self
  }

  /// 用 TTF/OTF 字体替换内置字体
  pub fn with_font_file(self, path: impl AsRef<Path>) -> Result<Self, DrawError> {
    let path = path.as_ref();
    let font = FontArc::try_from_vec(std::fs::read(path)?)?;
    info!("加载标签字体: {}", path.display());
    Ok(self.with_font(font))
  }

  pub fn palette(&self) -> &Palette {
    &self.palette
  }

  pub fn tag_height(&self) -> i32 {
    self.label_text_height
  }

  /// 在 (x, y) 处绘制带底色的文字标签，超出图像的部分被截掉
  fn draw_tag(&self, image: &mut RgbImage, x: i32, y: i32, text: &str, background: Rgb<u8>) {
    let (w, h) = (image.width() as i32, image.height() as i32);

    let text_width =
      (text.chars().count() as f32 * self.label_char_width) as i32 + 2 * self.label_text_padding;
    let width = text_width.min(w - x);
    let height = self.label_text_height.min(h - y);
    if width <= 0 || height <= 0 {
      return;
    }

    let rect = Rect::at(x, y).of_size(width as u32, height as u32);
    draw_filled_rect_mut(image, rect, background);

    if let Some(font) = &self.font {
      draw_text_mut(
        image,
        TEXT_COLOR,
        x + self.label_text_padding,
        y + (self.label_text_height - self.font_size as i32) / 2,
        PxScale::from(self.font_size),
        font,
        text,
      );
    }
  }

  fn draw_bbox_with_label(
    &self,
    image: &mut RgbImage,
    bbox: &BoundingBox,
    label: &str,
    color: Rgb<u8>,
  ) {
    let (w, h) = (image.width() as i32, image.height() as i32);

    let x_min = (bbox.x.floor() as i32).clamp(0, w - 1);
    let y_min = (bbox.y.floor() as i32).clamp(0, h - 1);
    let x_max = ((bbox.x + bbox.width).ceil() as i32).clamp(0, w - 1);
    let y_max = ((bbox.y + bbox.height).ceil() as i32).clamp(0, h - 1);

    if x_min >= x_max || y_min >= y_max {
      debug!("跳过退化边框: {} {:?}", label, bbox);
      return;
    }

    // 绘制边框（加粗为2像素）
    for t in 0..BOX_THICKNESS {
      let width = x_max - x_min + 1 - 2 * t;
      let height = y_max - y_min + 1 - 2 * t;
      if width <= 0 || height <= 0 {
        break;
      }
      let rect = Rect::at(x_min + t, y_min + t).of_size(width as u32, height as u32);
      draw_hollow_rect_mut(image, rect, color);
    }

    // 标签位置与显示端共用同一套几何规则
    let drawn = BoundingBox::new(
      x_min as f32,
      y_min as f32,
      (x_max - x_min) as f32,
      (y_max - y_min) as f32,
    );
    let anchor = OverlayTransform::identity()
      .with_tag_height(self.label_text_height as f32)
      .anchor_for(&drawn);
    self.draw_tag(image, anchor.x as i32, anchor.y as i32, label, color);
  }

  /// 在图像上就地绘制检测框和 `<label> <confidence>` 标签
  pub fn draw_detections_on_image(
    &self,
    image: &mut RgbImage,
    detections: &[Detection],
    registry: &StandardsRegistry,
  ) {
    if image.width() == 0 || image.height() == 0 {
      return;
    }

    for det in detections {
      let color = self.palette.color_for(registry.risk_of(det.label()));
      let text = format!("{} {:.2}", det.label(), det.confidence());
      self.draw_bbox_with_label(image, det.bbox(), &text, color);
    }
  }

  /// 左上角绘制 `Severity: <level> - N defect(s)` 横幅
  pub fn draw_banner(&self, image: &mut RgbImage, severity: SeverityLevel, total: usize) {
    let text = format!("Severity: {} - {} defect(s)", severity, total);
    self.draw_tag(image, BANNER_ORIGIN, BANNER_ORIGIN, &text, BANNER_COLOR);
  }

  /// 在源图像的副本上绘制，源图像保持不变；没有检测时原样返回副本
  pub fn annotate(
    &self,
    source: &SourceImage,
    detections: &[Detection],
    registry: &StandardsRegistry,
    severity: SeverityLevel,
  ) -> RgbImage {
    let mut image = source.as_rgb_image().clone();
    if detections.is_empty() || image.width() == 0 || image.height() == 0 {
      return image;
    }

    self.draw_detections_on_image(&mut image, detections, registry);
    self.draw_banner(&mut image, severity, detections.len());
    image
  }
}
