// 该文件是 Jianxiu （检修） 项目的一部分。
// tests/outputs.rs - 输出插件测试
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

#![cfg(all(feature = "json_report", feature = "save_image_file"))]

use url::Url;

use jianxiu::{
  FromUrl, Pipeline, PipelineResult,
  config::InspectionConfig,
  input::PipelineInput,
  model::MockDetector,
  output::{OutputError, OutputWrapper, Render},
};

fn canned_result() -> PipelineResult {
  Pipeline::builder(MockDetector)
    .build()
    .unwrap()
    .run(PipelineInput::Canned)
    .unwrap()
}

#[test]
fn json_report_round_trips_analysis() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("reports").join("panel.json");
  let url = Url::parse(&format!("json://{}", path.display())).unwrap();

  let result = canned_result();
  OutputWrapper::from_url(&url)
    .unwrap()
    .render_result(&result)
    .unwrap();

  let text = std::fs::read_to_string(&path).unwrap();
  let parsed: PipelineResult = serde_json::from_str(&text).unwrap();
  assert_eq!(parsed.analysis, result.analysis);
  assert_eq!(parsed.detections.len(), 2);
  assert_eq!(parsed.annotated_image, result.annotated_image);

  let value: serde_json::Value = serde_json::from_str(&text).unwrap();
  assert_eq!(value["analysis"]["severity"], "critical");
  assert_eq!(value["analysis"]["summary"]["total"], 2);
  assert_eq!(value["analysis"]["summary"]["by_label"]["leak"], 1);
  assert_eq!(value["analysis"]["summary"]["by_label"]["crack"], 1);
  assert!(value["analysis"]["summary"].get("leak").is_none());
  assert_eq!(value["detections"][0]["label"], "leak");
  assert_eq!(
    value["detections"][0]["bbox"],
    serde_json::json!([10.0, 10.0, 20.0, 20.0])
  );
  assert!(
    value["annotated_image"]
      .as_str()
      .unwrap()
      .starts_with("data:image/png;base64,")
  );
}

#[test]
fn json_report_can_omit_the_image() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("panel.json");
  let url = Url::parse(&format!("json://{}?image=false", path.display())).unwrap();

  OutputWrapper::from_url(&url)
    .unwrap()
    .render_result(&canned_result())
    .unwrap();

  let value: serde_json::Value =
    serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
  assert!(value.get("annotated_image").is_none());
  assert_eq!(value["analysis"]["summary"]["total"], 2);
}

#[test]
fn saves_annotated_png() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("annotated.png");
  let url = Url::parse(&format!("image://{}", path.display())).unwrap();

  OutputWrapper::from_url(&url)
    .unwrap()
    .render_result(&canned_result())
    .unwrap();

  let saved = image::open(&path).unwrap();
  assert_eq!((saved.width(), saved.height()), (640, 480));
}

#[test]
fn saving_without_annotation_fails() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("annotated.png");
  let url = Url::parse(&format!("image://{}", path.display())).unwrap();

  let result = PipelineResult {
    annotated_image: None,
    ..canned_result()
  };
  let err = OutputWrapper::from_url(&url)
    .unwrap()
    .render_result(&result)
    .unwrap_err();
  assert!(matches!(err, OutputError::SaveImageFileError(_)));
  assert!(!path.exists());
}

#[test]
fn unknown_output_scheme_is_rejected() {
  let url = Url::parse("rtsp://localhost:8554/live").unwrap();
  assert!(matches!(
    OutputWrapper::from_url(&url),
    Err(OutputError::SchemeMismatch(_))
  ));
}

#[test]
fn config_file_drives_the_pipeline() {
  let dir = tempfile::tempdir().unwrap();
  let set = dir.path().join("set.toml");
  std::fs::write(
    &set,
    r#"
[[detections]]
label = "corrosion"
confidence = 0.8
bbox = [5.0, 5.0, 40.0, 40.0]
"#,
  )
  .unwrap();
  let config_path = dir.path().join("jianxiu.toml");
  std::fs::write(
    &config_path,
    format!(
      "detector = \"mock:\"\ncanned = \"{}\"\nannotate = false\n",
      set.display()
    ),
  )
  .unwrap();

  let pipeline = InspectionConfig::from_file(&config_path)
    .unwrap()
    .build_pipeline()
    .unwrap();
  let result = pipeline.run(PipelineInput::Canned).unwrap();

  assert_eq!(result.analysis.summary.total, 1);
  assert_eq!(result.analysis.sop_mappings[0].sop, "SOP-COR-001");
  assert!(result.annotated_image.is_none());
}
