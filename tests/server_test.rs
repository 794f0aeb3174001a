use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use img2text::config::Config;
use img2text::engines::EngineRegistry;
use img2text::server::{router, AppState};
use img2text::{EncodedImage, OcrEngine, OcrError, OcrResult, RecognitionSession};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "img2text-test-boundary";

/// Reports what it was handed instead of reading it
struct EchoEngine;

struct EchoSession {
    language: String,
}

impl RecognitionSession for EchoSession {
    fn initialize(&mut self) -> Result<(), OcrError> {
        Ok(())
    }

    fn recognize(
        &mut self,
        image: &EncodedImage,
        progress: &mut dyn FnMut(f32),
    ) -> Result<OcrResult, OcrError> {
        let pixels = image.decode()?.to_rgba8();
        progress(0.5);
        let gray = pixels.pixels().all(|p| p.0[0] == p.0[1] && p.0[1] == p.0[2]);
        Ok(OcrResult {
            text: format!(
                "\n  {} {}x{} gray={}  \n",
                self.language, image.width, image.height, gray
            ),
            confidence: 0.75,
            warnings: vec!["echo engine".to_string()],
        })
    }

    fn terminate(&mut self) {}
}

impl OcrEngine for EchoEngine {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn description(&self) -> &'static str {
        "Echoes image metadata"
    }

    fn supported_languages(&self) -> Vec<String> {
        vec!["eng".to_string(), "spa".to_string()]
    }

    fn load_language(
        &self,
        language: &str,
    ) -> Result<Box<dyn RecognitionSession + '_>, OcrError> {
        Ok(Box::new(EchoSession {
            language: language.to_string(),
        }))
    }
}

fn app_with_limit(max_file_size: usize) -> axum::Router {
    let engines: Vec<Arc<dyn OcrEngine>> = vec![Arc::new(EchoEngine)];
    let registry = EngineRegistry::from_engines(engines).unwrap();
    let config = Config {
        max_file_size,
        ..Config::default()
    };
    router(AppState::new(registry, config))
}

fn app() -> axum::Router {
    app_with_limit(Config::default().max_file_size)
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 200, 255])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

enum Part<'a> {
    File(&'a [u8]),
    Text(&'a str, &'a str),
}

fn multipart(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File(data) => {
                body.extend_from_slice(
                    b"Content-Disposition: form-data; name=\"file\"; filename=\"scan.png\"\r\n\
                      Content-Type: image/png\r\n\r\n",
                );
                body.extend_from_slice(data);
            }
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}",
                        name, value
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn post(uri: &str, parts: &[Part]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart(parts)))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn send_json(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, body) = send_json(app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_info_endpoint() {
    let (status, body) = send_json(app(), get("/info")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["default_engine"], "echo");
    assert_eq!(body["default_language"], "eng");
    assert_eq!(body["default_max_width"], 1600);
    assert_eq!(body["available_engines"][0]["name"], "echo");
    assert_eq!(
        body["available_engines"][0]["supported_languages"],
        serde_json::json!(["eng", "spa"])
    );
}

#[tokio::test]
async fn test_ocr_preprocesses_and_trims() {
    let image = png(2000, 1000);
    let (status, body) = send_json(
        app(),
        post("/ocr", &[Part::File(&image), Part::Text("language", "spa")]),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["text"], "spa 1600x800 gray=true");
    assert_eq!(body["engine"], "echo");
    assert_eq!(body["language"], "spa");
    assert_eq!(body["warnings"], serde_json::json!(["echo engine"]));
    assert_eq!(body["preprocessing"]["preset"], "default");
    assert_eq!(body["preprocessing"]["width"], 1600);
    assert_eq!(body["preprocessing"]["height"], 800);

    let steps: Vec<&str> = body["preprocessing"]["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(steps, ["decode", "resize", "grayscale", "encode"]);

    let progress = body["progress"].as_array().unwrap();
    assert_eq!(progress.first().unwrap()["status"], "loading engine");
    assert_eq!(progress.last().unwrap()["status"], "done");
    assert_eq!(progress.last().unwrap()["progress"], 1.0);
}

#[tokio::test]
async fn test_ocr_with_max_width_and_no_preset() {
    let image = png(300, 100);

    let (status, body) = send_json(
        app(),
        post(
            "/ocr",
            &[Part::File(&image), Part::Text("max_width", "150")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "eng 150x50 gray=true");

    let (status, body) = send_json(
        app(),
        post(
            "/ocr/echo",
            &[
                Part::File(&image),
                Part::Text("max_width", "150"),
                Part::Text("preset", "none"),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "eng 300x100 gray=false");
    assert_eq!(body["preprocessing"]["preset"], "none");
}

#[tokio::test]
async fn test_ocr_error_responses() {
    let image = png(10, 10);

    let cases: Vec<(Request<Body>, StatusCode, &str)> = vec![
        (post("/ocr", &[]), StatusCode::BAD_REQUEST, "MISSING_FILE"),
        (
            post("/ocr", &[Part::File(b"not an image")]),
            StatusCode::UNPROCESSABLE_ENTITY,
            "DECODE_ERROR",
        ),
        (
            post("/ocr", &[Part::File(&image), Part::Text("max_width", "0")]),
            StatusCode::BAD_REQUEST,
            "INVALID_CONFIG",
        ),
        (
            post("/ocr", &[Part::File(&image), Part::Text("max_width", "wide")]),
            StatusCode::BAD_REQUEST,
            "INVALID_CONFIG",
        ),
        (
            post("/ocr", &[Part::File(&image), Part::Text("language", "deu")]),
            StatusCode::BAD_REQUEST,
            "UNSUPPORTED_LANGUAGE",
        ),
        (
            post("/ocr", &[Part::File(&image), Part::Text("preset", "shiny")]),
            StatusCode::BAD_REQUEST,
            "INVALID_REQUEST",
        ),
        (
            post("/ocr/missing", &[Part::File(&image)]),
            StatusCode::NOT_FOUND,
            "ENGINE_NOT_FOUND",
        ),
    ];

    for (request, expected_status, expected_code) in cases {
        let (status, body) = send_json(app(), request).await;
        assert_eq!(status, expected_status, "{}", body);
        assert_eq!(body["code"], expected_code);
        assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
    }
}

#[tokio::test]
async fn test_ocr_rejects_oversized_upload() {
    let image = png(64, 64);
    let limit = image.len() + 512;

    let (status, body) = send_json(
        app_with_limit(image.len() - 1),
        post("/ocr", &[Part::File(&image)]),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE, "{}", body);
    assert_eq!(body["code"], "IMAGE_TOO_LARGE");

    let (status, _) = send_json(app_with_limit(limit), post("/ocr", &[Part::File(&image)])).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_preprocess_rejects_oversized_upload() {
    let image = png(64, 64);

    let (status, body) = send_json(
        app_with_limit(image.len() / 2),
        post("/preprocess", &[Part::File(&image)]),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE, "{}", body);
    assert_eq!(body["code"], "IMAGE_TOO_LARGE");
}

#[tokio::test]
async fn test_preprocess_endpoint_returns_png() {
    let image = png(800, 300);
    let response = app()
        .oneshot(post(
            "/preprocess",
            &[Part::File(&image), Part::Text("max_width", "400")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(headers["x-image-width"], "400");
    assert_eq!(headers["x-image-height"], "150");

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let decoded = image::load_from_memory(&body).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (400, 150));
    assert!(decoded.pixels().all(|p| p.0[0] == p.0[1] && p.0[1] == p.0[2]));
}

#[tokio::test]
async fn test_preprocess_endpoint_errors() {
    let (status, body) = send_json(
        app(),
        post("/preprocess", &[Part::File(b"\x89PNG\r\n\x1a\nbroken")]),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "DECODE_ERROR");

    let image = png(4, 4);
    let (status, body) = send_json(
        app(),
        post(
            "/preprocess",
            &[Part::File(&image), Part::Text("max_width", "-5")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_CONFIG");
}
