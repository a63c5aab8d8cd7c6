// 该文件是 Jianxiu （检修） 项目的一部分。
// src/frame.rs - 待检图像定义
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

use std::io::Cursor;

use image::{ImageBuffer, ImageReader, Rgb, RgbImage};
use thiserror::Error;
use tracing::debug;

/// 示例面板尺寸
pub const SAMPLE_PANEL_WIDTH: u32 = 640;
pub const SAMPLE_PANEL_HEIGHT: u32 = 480;

const SAMPLE_RIVET_SPACING: u32 = 80;
const SAMPLE_RIVET_RADIUS: i64 = 5;
const SAMPLE_SEAM_Y: u32 = 240;
const SAMPLE_SEAM_HALF_WIDTH: u32 = 6;

#[derive(Error, Debug)]
pub enum FrameError {
  #[error("图像数据为空")]
  Empty,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像解码错误: {0}")]
  DecodeError(#[from] image::ImageError),
  #[error("图像尺寸为零: {0}x{1}")]
  ZeroSized(u32, u32),
  #[error("图像尺寸不匹配: 声明 {declared_width}x{declared_height}, 实际 {width}x{height}")]
  DimensionMismatch {
    declared_width: u32,
    declared_height: u32,
    width: u32,
    height: u32,
  },
}

/// 已解码的待检图像（RGB8）
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
  image: RgbImage,
}

impl From<RgbImage> for SourceImage {
  fn from(image: RgbImage) -> Self {
    Self { image }
  }
}

impl SourceImage {
  /// 从编码后的字节解码图像，格式由内容猜测
  pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
    if bytes.is_empty() {
      return Err(FrameError::Empty);
    }

    let image = ImageReader::new(Cursor::new(bytes))
      .with_guessed_format()?
      .decode()?
      .to_rgb8();

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
      return Err(FrameError::ZeroSized(width, height));
    }
    debug!("图像解码完成: {}x{}, {} 字节", width, height, bytes.len());

    Ok(Self { image })
  }

  /// 解码并校验调用方声明的尺寸
  pub fn decode_with_hint(
    bytes: &[u8],
    width: Option<u32>,
    height: Option<u32>,
  ) -> Result<Self, FrameError> {
    let frame = Self::decode(bytes)?;
    let (actual_w, actual_h) = frame.dimensions();
    let declared_width = width.unwrap_or(actual_w);
    let declared_height = height.unwrap_or(actual_h);

    if declared_width != actual_w || declared_height != actual_h {
      return Err(FrameError::DimensionMismatch {
        declared_width,
        declared_height,
        width: actual_w,
        height: actual_h,
      });
    }

    Ok(frame)
  }

  /// 内置示例面板：带铆钉与焊缝的钢板，用于无真实图像的演示
  pub fn sample_panel() -> Self {
    let image = ImageBuffer::from_fn(SAMPLE_PANEL_WIDTH, SAMPLE_PANEL_HEIGHT, |x, y| {
      // 焊缝
      if y.abs_diff(SAMPLE_SEAM_Y) <= SAMPLE_SEAM_HALF_WIDTH {
        return Rgb([96u8, 98, 104]);
      }

      // 铆钉
      let cx = (x / SAMPLE_RIVET_SPACING) * SAMPLE_RIVET_SPACING + SAMPLE_RIVET_SPACING / 2;
      let cy = (y / SAMPLE_RIVET_SPACING) * SAMPLE_RIVET_SPACING + SAMPLE_RIVET_SPACING / 2;
      let dx = x as i64 - cx as i64;
      let dy = y as i64 - cy as i64;
      if dx * dx + dy * dy <= SAMPLE_RIVET_RADIUS * SAMPLE_RIVET_RADIUS {
        return Rgb([72u8, 74, 80]);
      }

      // 斜向渐变的钢板底色
      let shade = 150 + ((x + y) * 40 / (SAMPLE_PANEL_WIDTH + SAMPLE_PANEL_HEIGHT)) as u8;
      Rgb([shade, shade.saturating_add(4), shade.saturating_add(10)])
    });

    Self { image }
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  pub fn dimensions(&self) -> (u32, u32) {
    self.image.dimensions()
  }

  pub fn as_rgb_image(&self) -> &RgbImage {
    &self.image
  }

  /// 行优先的 RGB 像素数据
  pub fn as_raw(&self) -> &[u8] {
    self.image.as_raw()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::ImageFormat;

  fn encode_png(image: &RgbImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
  }

  #[test]
  fn decodes_png_bytes() {
    let image = RgbImage::from_pixel(8, 4, Rgb([1, 2, 3]));
    let frame = SourceImage::decode(&encode_png(&image)).unwrap();
    assert_eq!(frame.dimensions(), (8, 4));
    assert_eq!(frame.as_rgb_image(), &image);
  }

  #[test]
  fn rejects_empty_and_garbage_bytes() {
    assert!(matches!(SourceImage::decode(&[]), Err(FrameError::Empty)));
    assert!(SourceImage::decode(b"definitely not an image").is_err());
  }

  #[test]
  fn dimension_hint_must_match() {
    let bytes = encode_png(&RgbImage::new(8, 4));
    assert!(SourceImage::decode_with_hint(&bytes, Some(8), None).is_ok());
    assert!(matches!(
      SourceImage::decode_with_hint(&bytes, Some(8), Some(5)),
      Err(FrameError::DimensionMismatch { .. })
    ));
  }

  #[test]
  fn sample_panel_is_deterministic() {
    let a = SourceImage::sample_panel();
    let b = SourceImage::sample_panel();
    assert_eq!(a, b);
    assert_eq!(a.dimensions(), (SAMPLE_PANEL_WIDTH, SAMPLE_PANEL_HEIGHT));
  }
}
