// 该文件是 Jianxiu （检修） 项目的一部分。
// src/bin/inspect.rs - 单张图像检测命令行
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

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;

use jianxiu::{
  FromUrl,
  config::InspectionConfig,
  input::PipelineInput,
  output::{OutputWrapper, Render},
};

/// Jianxiu 缺陷检测参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// TOML 配置文件，命令行参数优先
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,
  /// 检测器：mock:、canned:、canned:///set.toml、http(s)://...
  #[arg(long, value_name = "DETECTOR")]
  pub detector: Option<String>,
  /// 输入来源：image:///path/to/panel.png 或 canned:
  #[arg(long, value_name = "SOURCE", default_value = "canned:")]
  pub input: Url,
  /// 声明的图像宽度，解码后校验
  #[arg(long, value_name = "PIXELS", requires = "height")]
  pub width: Option<u32>,
  /// 声明的图像高度，解码后校验
  #[arg(long, value_name = "PIXELS", requires = "width")]
  pub height: Option<u32>,
  /// 缺陷与标准登记表
  #[arg(long, value_name = "FILE")]
  pub registry: Option<PathBuf>,
  /// 预置输入使用的检测集
  #[arg(long, value_name = "FILE")]
  pub canned_set: Option<PathBuf>,
  /// 检测超时（毫秒）
  #[arg(long, value_name = "MS")]
  pub timeout_ms: Option<u64>,
  /// 参与严重等级计算的最低置信度 (0.0 - 1.0)
  #[arg(long, value_name = "THRESHOLD")]
  pub min_confidence: Option<f32>,
  /// 替换内置标签字体的 TTF/OTF 文件
  #[arg(long, value_name = "FILE")]
  pub font: Option<PathBuf>,
  /// 不生成标注图像
  #[arg(long)]
  pub no_annotate: bool,
  /// 输出：json:（标准输出）、json:///report.json、image:///annotated.png，可重复
  #[arg(long, value_name = "OUTPUT", default_value = "json:")]
  pub output: Vec<Url>,
  /// 日志级别，RUST_LOG 优先
  #[arg(long, value_name = "LEVEL", default_value = "info")]
  pub log_level: String,
}

impl Args {
  fn into_config(self) -> Result<(InspectionConfig, PipelineInput, Vec<Url>)> {
    let mut config = match &self.config {
      Some(path) => InspectionConfig::from_file(path)?,
      None => InspectionConfig::default(),
    };

    if let Some(detector) = self.detector {
      config.detector = detector;
    }
    if self.registry.is_some() {
      config.registry = self.registry;
    }
    if self.canned_set.is_some() {
      config.canned = self.canned_set;
    }
    if self.timeout_ms.is_some() {
      config.detect_timeout_ms = self.timeout_ms;
    }
    if let Some(min_confidence) = self.min_confidence {
      config.min_confidence = min_confidence;
    }
    if self.font.is_some() {
      config.font = self.font;
    }
    if self.no_annotate {
      config.annotate = false;
    }
    config.validate()?;

    let mut input = PipelineInput::from_url(&self.input)?;
    if let (Some(width), Some(height)) = (self.width, self.height) {
      input = input.with_dimensions(width, height);
    }

    Ok((config, input, self.output))
  }
}

fn main() -> Result<()> {
  let args = Args::parse();

  // 日志写到标准错误，标准输出留给 JSON 报告
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
    )
    .with_writer(std::io::stderr)
    .init();

  info!("输入来源: {}", args.input);
  let (config, input, outputs) = args.into_config()?;
  info!("检测器: {}", config.detector);

  let outputs = outputs
    .iter()
    .map(OutputWrapper::from_url)
    .collect::<Result<Vec<_>, _>>()?;
  let pipeline = config.build_pipeline()?;

  let result = match pipeline.run(input) {
    Ok(result) => result,
    Err(e) => {
      error!("检测失败 [{}]: {}", e.kind(), e);
      println!("{}", serde_json::to_string_pretty(&e)?);
      std::process::exit(1);
    }
  };

  for output in &outputs {
    output.render_result(&result)?;
  }

  Ok(())
}
