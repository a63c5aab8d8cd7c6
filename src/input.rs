// 该文件是 Jianxiu （检修） 项目的一部分。
// src/input.rs - 检测输入
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

use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::FromUrl;

const READ_IMAGE_FILE_SCHEME: &str = "image";
const CANNED_INPUT_SCHEMES: [&str; 2] = ["canned", "sample"];

#[derive(Error, Debug)]
pub enum InputError {
  #[error("URI scheme mismatch: {0}")]
  SchemeMismatch(String),
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
}

/// 一次检测的输入：编码后的图像字节，或使用预置示例
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineInput {
  Image {
    bytes: Vec<u8>,
    width: Option<u32>,
    height: Option<u32>,
  },
  Canned,
}

impl PipelineInput {
  pub fn image(bytes: impl Into<Vec<u8>>) -> Self {
    PipelineInput::Image {
      bytes: bytes.into(),
      width: None,
      height: None,
    }
  }

  /// 声明图像尺寸，解码后会校验；对预置输入无效
  pub fn with_dimensions(self, width: u32, height: u32) -> Self {
    match self {
      PipelineInput::Image { bytes, .. } => PipelineInput::Image {
        bytes,
        width: Some(width),
        height: Some(height),
      },
      PipelineInput::Canned => PipelineInput::Canned,
    }
  }

  pub fn is_canned(&self) -> bool {
    matches!(self, PipelineInput::Canned)
  }
}

impl FromUrl for PipelineInput {
  type Error = InputError;

  /// `image:///path/to/file.png` 读取图像文件，`canned:` / `sample:` 使用预置示例
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    let scheme = url.scheme();
    if CANNED_INPUT_SCHEMES.contains(&scheme) {
      return Ok(PipelineInput::Canned);
    }

    if scheme != READ_IMAGE_FILE_SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        READ_IMAGE_FILE_SCHEME, scheme
      );
      return Err(InputError::SchemeMismatch(scheme.to_string()));
    }

    let path = url.path();
    let bytes = std::fs::read(path)?;
    debug!("读取图像文件: {} ({} 字节)", path, bytes.len());
    Ok(PipelineInput::image(bytes))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn canned_schemes() {
    for raw in ["canned:", "sample:"] {
      let url = Url::parse(raw).unwrap();
      assert_eq!(PipelineInput::from_url(&url).unwrap(), PipelineInput::Canned);
    }
  }

  #[test]
  fn reads_image_file_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("panel.png");
    std::fs::write(&path, b"raw bytes").unwrap();

    let url = Url::parse(&format!("image://{}", path.display())).unwrap();
    assert_eq!(
      PipelineInput::from_url(&url).unwrap(),
      PipelineInput::image(b"raw bytes".to_vec())
    );
  }

  #[test]
  fn dimensions_apply_to_images_only() {
    assert_eq!(
      PipelineInput::image(vec![1]).with_dimensions(4, 3),
      PipelineInput::Image {
        bytes: vec![1],
        width: Some(4),
        height: Some(3),
      }
    );
    assert!(PipelineInput::Canned.with_dimensions(4, 3).is_canned());
  }

  #[test]
  fn other_schemes_are_rejected() {
    let url = Url::parse("rtsp://camera.local/stream").unwrap();
    assert!(matches!(
      PipelineInput::from_url(&url),
      Err(InputError::SchemeMismatch(_))
    ));
  }
}
