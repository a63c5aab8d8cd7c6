// 该文件是 Jianxiu （检修） 项目的一部分。
// src/output/encode.rs - 标注图像编码
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

use base64::Engine;
use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Error, Debug)]
pub enum AnnotationEncodingError {
  #[error("图像编码错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("Base64 解码错误: {0}")]
  Base64Error(#[from] base64::DecodeError),
  #[error("不是 PNG data URL")]
  NotPngDataUrl,
}

/// 以 PNG data URL 形式传输的图像
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedImage(String);

impl EncodedImage {
  pub fn encode_png(image: &RgbImage) -> Result<Self, AnnotationEncodingError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(Self::from_png_bytes(&buf.into_inner()))
  }

  pub fn from_png_bytes(png: &[u8]) -> Self {
    let payload = base64::engine::general_purpose::STANDARD.encode(png);
    Self(format!("{PNG_DATA_URL_PREFIX}{payload}"))
  }

  pub fn as_data_url(&self) -> &str {
    &self.0
  }

  pub fn png_bytes(&self) -> Result<Vec<u8>, AnnotationEncodingError> {
    let payload = self
      .0
      .strip_prefix(PNG_DATA_URL_PREFIX)
      .ok_or(AnnotationEncodingError::NotPngDataUrl)?;
    Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
  }

  pub fn to_rgb_image(&self) -> Result<RgbImage, AnnotationEncodingError> {
    let bytes = self.png_bytes()?;
    Ok(image::load_from_memory_with_format(&bytes, ImageFormat::Png)?.to_rgb8())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  #[test]
  fn data_url_carries_png() {
    let image = RgbImage::from_pixel(3, 2, Rgb([200, 10, 10]));
    let encoded = EncodedImage::encode_png(&image).unwrap();
    assert!(encoded.as_data_url().starts_with("data:image/png;base64,"));
    assert_eq!(encoded.to_rgb_image().unwrap(), image);
  }

  #[test]
  fn rejects_foreign_data_urls() {
    let jpeg = EncodedImage("data:image/jpeg;base64,AAAA".to_string());
    assert!(matches!(
      jpeg.png_bytes(),
      Err(AnnotationEncodingError::NotPngDataUrl)
    ));
  }
}
