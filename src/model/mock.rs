// 该文件是 Jianxiu （检修） 项目的一部分。
// src/model/mock.rs - 演示用确定性检测器
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

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, error};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::SourceImage,
  model::{BoundingBox, Detection, DetectionSet, Detector, DetectorError},
};

/// 演示检测器可能输出的标签
pub const MOCK_LABELS: [&str; 3] = ["crack", "corrosion", "leak"];

// 参与种子计算的像素字节数
const MOCK_SEED_PREFIX: usize = 1024;
// 缺陷数量 0..=3 的累计权重（20/50/20/10）
const MOCK_COUNT_CUMULATIVE: [u32; 4] = [20, 70, 90, 100];

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// 以图像内容为种子生成伪检测结果，同一图像总是得到同一结果
#[derive(Debug, Clone, Default)]
pub struct MockDetector;

impl FromUrlWithScheme for MockDetector {
  const SCHEME: &'static str = "mock";
}

impl FromUrl for MockDetector {
  type Error = DetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(DetectorError::SchemeMismatch(url.scheme().to_string()));
    }
    Ok(MockDetector)
  }
}

fn seed_of(pixels: &[u8]) -> u64 {
  pixels
    .iter()
    .take(MOCK_SEED_PREFIX)
    .fold(FNV_OFFSET_BASIS, |hash, &byte| {
      (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
    })
}

impl Detector for MockDetector {
  type Error = DetectorError;

  fn detect(&self, image: &SourceImage) -> Result<DetectionSet, Self::Error> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
      return Err(DetectorError::InvalidInput(format!(
        "图像尺寸为零: {}x{}",
        w, h
      )));
    }
    let (w, h) = (w as f32, h as f32);

    let seed = seed_of(image.as_raw());
    let mut rng = StdRng::seed_from_u64(seed);
    debug!("演示检测器种子: {:#018x}", seed);

    let roll = rng.random_range(0..100u32);
    let count = MOCK_COUNT_CUMULATIVE
      .iter()
      .position(|&bound| roll < bound)
      .unwrap_or(0);

    let mut detections = Vec::with_capacity(count);
    for _ in 0..count {
      let label = MOCK_LABELS[rng.random_range(0..MOCK_LABELS.len())];
      let confidence = (rng.random_range(0.6f32..0.98) * 100.0).round() / 100.0;

      // 不同缺陷的典型尺寸：裂纹细长，腐蚀成片，泄漏较小
      let (bw, bh) = match label {
        "crack" => (
          (w * rng.random_range(0.08f32..0.4)).floor(),
          (h * rng.random_range(0.01f32..0.05)).floor(),
        ),
        "corrosion" => (
          (w * rng.random_range(0.05f32..0.25)).floor(),
          (h * rng.random_range(0.05f32..0.25)).floor(),
        ),
        _ => (
          (w * rng.random_range(0.05f32..0.18)).floor(),
          (h * rng.random_range(0.05f32..0.12)).floor(),
        ),
      };

      let x = rng.random_range(0.0f32..(w - bw).max(1.0)).floor();
      let y = rng.random_range(0.0f32..(h - bh).max(1.0)).floor();

      detections.push(Detection::new(
        label,
        confidence,
        BoundingBox::new(x, y, bw, bh),
      ));
    }

    debug!("演示检测器输出 {} 个检测", detections.len());
    Ok(detections)
  }
}
