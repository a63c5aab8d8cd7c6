// 该文件是 Jianxiu （检修） 项目的一部分。
// src/output/json_report.rs - JSON 检测报告
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
  fs::File,
  io::{BufWriter, Write},
  path::Path,
};

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, output::Render, pipeline::PipelineResult};

#[derive(Error, Debug)]
pub enum JsonReportError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 写出完整的检测结果；`json:` 不带路径时写到标准输出
pub struct JsonReportOutput {
  path: Option<String>,
  include_image: bool,
}

impl FromUrlWithScheme for JsonReportOutput {
  const SCHEME: &'static str = "json";
}

impl FromUrl for JsonReportOutput {
  type Error = JsonReportError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(JsonReportError::SchemeMismatch(url.scheme().to_string()));
    }

    let path = match url.path() {
      "" | "/" | "-" => None,
      path => Some(path.to_string()),
    };
    // json:///report.json?image=false 省略内嵌的标注图像
    let include_image = !url
      .query_pairs()
      .any(|(k, v)| k == "image" && (v == "false" || v == "0"));

    Ok(Self {
      path,
      include_image,
    })
  }
}

impl JsonReportOutput {
  fn write_to<W: Write>(&self, writer: W, result: &PipelineResult) -> Result<(), JsonReportError> {
    if self.include_image {
      serde_json::to_writer_pretty(writer, result)?;
    } else {
      let result = PipelineResult {
        annotated_image: None,
        ..result.clone()
      };
      serde_json::to_writer_pretty(writer, &result)?;
    }
    Ok(())
  }
}

impl Render<PipelineResult> for JsonReportOutput {
  type Error = JsonReportError;

  fn render_result(&self, result: &PipelineResult) -> Result<(), Self::Error> {
    match &self.path {
      Some(path) => {
        if let Some(parent) = Path::new(path).parent()
          && !parent.as_os_str().is_empty()
        {
          std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer, result)?;
        writer.flush()?;
        info!("保存检测报告到文件: {}", path);
      }
      None => {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        self.write_to(&mut lock, result)?;
        writeln!(lock)?;
      }
    }
    Ok(())
  }
}
