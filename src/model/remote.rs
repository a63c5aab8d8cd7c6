// 该文件是 Jianxiu （检修） 项目的一部分。
// src/model/remote.rs - 远程检测服务
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

use image::ImageFormat;
use reqwest::{blocking::Client, header::CONTENT_TYPE};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl,
  frame::SourceImage,
  model::{DetectionSet, Detector},
};

#[derive(Error, Debug)]
pub enum RemoteDetectorError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("HTTP 错误: {0}")]
  HttpError(#[from] reqwest::Error),
  #[error("图像编码错误: {0}")]
  EncodeError(#[from] image::ImageError),
}

#[derive(Debug, Deserialize)]
struct RemoteResponse {
  detections: DetectionSet,
}

/// 远程检测服务：以 PNG 上传图像，接收 `{"detections": [...]}`
pub struct RemoteDetector {
  endpoint: Url,
  client: Client,
}

impl FromUrl for RemoteDetector {
  type Error = RemoteDetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if !matches!(url.scheme(), "http" | "https") {
      return Err(RemoteDetectorError::SchemeMismatch(
        url.scheme().to_string(),
      ));
    }

    info!("使用远程检测服务: {}", url);
    Ok(Self::new(url.clone(), Client::builder().build()?))
  }
}

impl RemoteDetector {
  /// 使用调用方配置好的 HTTP 客户端（代理、超时、证书等）
  pub fn new(endpoint: Url, client: Client) -> Self {
    Self { endpoint, client }
  }
}

impl Detector for RemoteDetector {
  type Error = RemoteDetectorError;

  fn detect(&self, image: &SourceImage) -> Result<DetectionSet, Self::Error> {
    let mut body = Cursor::new(Vec::new());
    image.as_rgb_image().write_to(&mut body, ImageFormat::Png)?;
    let body = body.into_inner();
    debug!("上传 {} 字节到 {}", body.len(), self.endpoint);

    let response: RemoteResponse = self
      .client
      .post(self.endpoint.clone())
      .header(CONTENT_TYPE, "image/png")
      .body(body)
      .send()?
      .error_for_status()?
      .json()?;

    debug!("远程检测服务返回 {} 个检测", response.detections.len());
    Ok(response.detections)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::BoundingBox;
  use image::{Rgb, RgbImage};
  use std::{
    io::{BufRead, BufReader, Read, Write},
    net::TcpListener,
    sync::mpsc,
    thread,
  };

  const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

  struct Captured {
    request_line: String,
    content_type: String,
    body: Vec<u8>,
  }

  /// 只应答一次的 HTTP 服务，返回捕获到的请求
  fn serve_once(status: &'static str, reply: &'static str) -> (Url, mpsc::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = Url::parse(&format!("http://{}/detect", listener.local_addr().unwrap())).unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
      let (stream, _) = listener.accept().unwrap();
      let mut reader = BufReader::new(stream.try_clone().unwrap());

      let mut request_line = String::new();
      reader.read_line(&mut request_line).unwrap();
      let mut content_type = String::new();
      let mut content_length = 0usize;
      loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
          break;
        }
        if let Some((name, value)) = line.split_once(':') {
          match name.to_ascii_lowercase().as_str() {
            "content-type" => content_type = value.trim().to_string(),
            "content-length" => content_length = value.trim().parse().unwrap(),
            _ => {}
          }
        }
      }
      let mut body = vec![0u8; content_length];
      reader.read_exact(&mut body).unwrap();

      let mut stream = stream;
      write!(
        stream,
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reply.len(),
        reply
      )
      .unwrap();
      stream.flush().unwrap();

      tx.send(Captured {
        request_line,
        content_type,
        body,
      })
      .unwrap();
    });

    (url, rx)
  }

  fn detector(url: Url) -> RemoteDetector {
    RemoteDetector::new(url, Client::builder().no_proxy().build().unwrap())
  }

  fn frame() -> SourceImage {
    SourceImage::from(RgbImage::from_pixel(16, 12, Rgb([120, 130, 140])))
  }

  #[test]
  fn uploads_png_and_parses_detections() {
    let (url, rx) = serve_once(
      "200 OK",
      r#"{"detections": [{"label": "crack", "confidence": 0.75, "bbox": [1.0, 2.0, 8.0, 3.0]}]}"#,
    );

    let detections = detector(url).detect(&frame()).unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].label(), "crack");
    assert_eq!(detections[0].confidence(), 0.75);
    assert_eq!(detections[0].bbox(), &BoundingBox::new(1.0, 2.0, 8.0, 3.0));

    let captured = rx.recv().unwrap();
    assert!(captured.request_line.starts_with("POST /detect "));
    assert_eq!(captured.content_type, "image/png");
    assert_eq!(&captured.body[..8], &PNG_MAGIC);
    let uploaded = image::load_from_memory(&captured.body).unwrap().to_rgb8();
    assert_eq!(uploaded.dimensions(), (16, 12));
  }

  #[test]
  fn server_error_is_reported() {
    let (url, _rx) = serve_once("500 Internal Server Error", r#"{"error": "busy"}"#);
    assert!(matches!(
      detector(url).detect(&frame()),
      Err(RemoteDetectorError::HttpError(_))
    ));
  }

  #[test]
  fn only_http_schemes_are_accepted() {
    let url = Url::parse("mock:").unwrap();
    assert!(matches!(
      RemoteDetector::from_url(&url),
      Err(RemoteDetectorError::SchemeMismatch(_))
    ));
  }
}
