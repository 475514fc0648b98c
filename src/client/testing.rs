//! Scripted transport for unit tests: replays queued POST responses, serves
//! fixed GET bodies by URL, and records every call.

use super::transport::{HttpResponse, HttpTransport};
use crate::error::{LiblibError, Result};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    pub body: Option<Value>,
}

#[derive(Default)]
pub(crate) struct FakeTransport {
    posts: Mutex<VecDeque<HttpResponse>>,
    gets: Mutex<HashMap<String, HttpResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_raw(&self, status: u16, body: &[u8]) {
        self.posts.lock().unwrap().push_back(HttpResponse {
            status,
            body: body.to_vec(),
        });
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push_raw(status, body.to_string().as_bytes());
    }

    /// Queue a successful `{code: 0, msg: "", data}` envelope.
    pub fn push_data(&self, data: Value) {
        self.push_json(200, json!({"code": 0, "msg": "", "data": data}));
    }

    pub fn serve(&self, url: &str, status: u16, body: Vec<u8>) {
        self.gets
            .lock()
            .unwrap()
            .insert(url.to_string(), HttpResponse { status, body });
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn post_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == "POST")
            .count()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: "POST",
            url: url.to_string(),
            body: Some(body.clone()),
        });
        self.posts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LiblibError::Request(format!("no scripted response for {}", url)))
    }

    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: "GET",
            url: url.to_string(),
            body: None,
        });
        self.gets
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| LiblibError::Request(format!("nothing served at {}", url)))
    }
}

pub(crate) fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}
