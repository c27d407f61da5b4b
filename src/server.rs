use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info};

use crate::errors::OcrError;
use crate::extract::extract_id_info;
use crate::ocr;
use crate::preprocess::{preprocess_frame, PreprocessArgs};

#[derive(Debug, Default, Clone)]
pub struct ServerConf {
    pub host: String,
    pub port: u16,
    pub tesseract_data: String,
    pub tesseract_default_lang: String,
}

#[derive(Debug, Clone)]
struct ServerState {
    pub conf: ServerConf,
}

pub async fn run_server(conf: ServerConf) -> Result<(), OcrError> {
    let server_state = ServerState { conf: conf.clone() };
    let app = router(server_state);

    let listener = tokio::net::TcpListener::bind(&format!("{}:{}", &conf.host, &conf.port)).await?;
    info!("listening on {}:{}", conf.host, conf.port);
    axum::serve(listener, app).await.map_err(OcrError::IoError)
}

fn router(state: ServerState) -> Router {
    // the browser capture page posts from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    Router::new()
        .route("/", get(root))
        .route("/capture", post(capture))
        .layer(cors)
        .with_state(state)
}

async fn root() -> &'static str {
    "Hello, id-ocr!"
}

#[derive(Debug, Deserialize)]
struct CaptureRequest {
    #[serde(rename = "imageData")]
    image_data: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.into(),
        }),
    )
        .into_response()
}

// receive a base64-encoded card image in a JSON body and return the
// extracted name and student number
async fn capture(
    State(state): State<ServerState>,
    headers: HeaderMap,
    payload: Result<Json<CaptureRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let ocr_lang = match headers.get("ocr_lang") {
        Some(h) => match h.to_str() {
            Ok(lang) => lang.to_owned(),
            Err(_) => {
                debug!("ignoring unreadable ocr_lang header");
                state.conf.tesseract_default_lang.clone()
            }
        },
        None => state.conf.tesseract_default_lang.clone(),
    };

    let image_bytes = match decode_image_payload(&req.image_data) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("capture decode error: {}", e);
            return error_response(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    let conf = state.conf.clone();
    let ret = tokio::task::spawn_blocking(move || -> Result<String, OcrError> {
        let frame = image::load_from_memory(&image_bytes)?;
        let preprocessed = preprocess_frame(&frame, &PreprocessArgs::default());
        ocr::recognize(&conf.tesseract_data, &ocr_lang, &preprocessed)
    })
    .await;

    match ret {
        Ok(Ok(text)) => {
            info!("recognized {} bytes of text", text.len());
            match extract_id_info(&text) {
                Some(id_info) => (StatusCode::OK, Json(id_info)).into_response(),
                None => error_response(
                    StatusCode::BAD_REQUEST,
                    "No match found in the provided ID data",
                ),
            }
        }
        Ok(Err(e @ OcrError::ImageError(_))) => {
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Ok(Err(e)) => {
            error!("capture ocr error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(e) => {
            error!("capture task error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "capture error")
        }
    }
}

/// Strips an optional `data:image/...;base64,` prefix and decodes the
/// remaining base64 payload.
fn decode_image_payload(image_data: &str) -> Result<Vec<u8>, OcrError> {
    let payload = match image_data.split_once(',') {
        Some((_, data)) => data,
        None => image_data,
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(OcrError::EmptyImageData);
    }
    Ok(BASE64.decode(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router() -> Router {
        router(ServerState {
            conf: ServerConf {
                host: "127.0.0.1".to_string(),
                port: 0,
                tesseract_data: "tessdata".to_string(),
                tesseract_default_lang: "eng".to_string(),
            },
        })
    }

    #[test]
    fn decodes_plain_base64() {
        let bytes = decode_image_payload("aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn strips_data_url_prefix() {
        let bytes = decode_image_payload("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn rejects_empty_payload() {
        assert!(matches!(
            decode_image_payload("data:image/png;base64,"),
            Err(OcrError::EmptyImageData)
        ));
        assert!(matches!(
            decode_image_payload(""),
            Err(OcrError::EmptyImageData)
        ));
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(matches!(
            decode_image_payload("not base64!!!"),
            Err(OcrError::Base64Error(_))
        ));
    }

    #[tokio::test]
    async fn root_responds() {
        let response = test_router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn capture_rejects_missing_image_data() {
        let request = Request::builder()
            .method("POST")
            .uri("/capture")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn capture_rejects_bad_base64() {
        let body = serde_json::json!({ "imageData": "???" }).to_string();
        let request = Request::builder()
            .method("POST")
            .uri("/capture")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn capture_rejects_undecodable_image() {
        // valid base64 that does not decode as an image
        let body = serde_json::json!({ "imageData": "aGVsbG8=" }).to_string();
        let request = Request::builder()
            .method("POST")
            .uri("/capture")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
