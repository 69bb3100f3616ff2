//! Image upload and record routes.

use axum::{
    Router,
    extract::{
        Multipart, Path, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::info;

use mirrorcut_core::images::{ImageError, ImageRepository, MAX_UPLOAD_SIZE, UploadedFile};
use mirrorcut_shared::{AppError, ImageId};

use crate::AppState;
use crate::response::{self, ApiError};

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "image";

/// Media type assumed when the part declares none.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Creates image routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_image))
        .route("/images", get(list_images))
        .route("/images/{id}", get(get_image).delete(delete_image))
        .route("/images/{id}/download", get(download_image))
}

/// Unknown and malformed ids are indistinguishable to callers.
fn parse_id(raw: &str) -> Result<ImageId, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound("Image not found".to_string()))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        let size = MAX_UPLOAD_SIZE + 1;
        return ImageError::file_too_large(size, MAX_UPLOAD_SIZE).into();
    }
    AppError::Validation(err.body_text()).into()
}

/// The first `image` part, if any. Later parts are left unread.
async fn read_file(mut multipart: Multipart) -> Result<Option<UploadedFile>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();
        let file_name = field.file_name().map(ToString::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;

        return Ok(Some(UploadedFile {
            content_type,
            file_name,
            data,
        }));
    }
    Ok(None)
}

/// POST /upload
async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let service = state.images()?;
    let multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;

    let file = read_file(multipart).await?;
    let record = service.upload(file).await?;

    Ok(response::data(StatusCode::CREATED, record))
}

/// GET /images
async fn list_images(State(state): State<AppState>) -> Result<Response, ApiError> {
    let records = state.records.list().await?;
    Ok(response::data(StatusCode::OK, records))
}

/// GET /images/{id}
async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let record = state
        .records
        .find_by_id(id)
        .await?
        .ok_or_else(|| ImageError::not_found(id))?;

    Ok(response::data(StatusCode::OK, record))
}

/// DELETE /images/{id}
///
/// Failures are reported under `message` rather than `error`.
async fn delete_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let result = async {
        let service = state.images()?;
        let id = parse_id(&id)?;
        service.delete(id).await?;
        Ok::<_, ApiError>(id)
    }
    .await;

    match result {
        Ok(id) => {
            info!(image_id = %id, "Delete request served");
            Ok(response::message(
                StatusCode::OK,
                format!("Image {id} deleted successfully"),
            ))
        }
        Err(err) => Err(err.with_message_key()),
    }
}

/// GET /images/{id}/download
async fn download_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let service = state.images()?;
    let id = parse_id(&id)?;
    let image = service.download(id).await?;

    let disposition = format!("attachment; filename=\"{}\"", image.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        image.data,
    )
        .into_response())
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::{AppState, create_router};
    use axum::body::Body;
    use axum::http::Request;
    use bytes::Bytes;
    use chrono::Utc;
    use http_body_util::BodyExt;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use mirrorcut_core::images::{
        ImageRecord, ImageService, ImageStatus, STORAGE_FAILURE_MESSAGE,
    };
    use mirrorcut_core::imaging;
    use mirrorcut_core::removal::{RemoveBgClient, RemoveBgConfig};
    use mirrorcut_core::storage::{StorageConfig, StorageProvider, StorageService};
    use mirrorcut_db::InMemoryImageRepository;
    use serde_json::Value;
    use std::io::Cursor;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    const BOUNDARY: &str = "mirrorcut-test-boundary";

    #[derive(Clone)]
    struct Provider {
        calls: Arc<AtomicUsize>,
        reject: Option<StatusCode>,
    }

    /// Reads the whole form, then echoes `image_file` or answers with `reject`.
    async fn provider(State(provider): State<Provider>, mut multipart: Multipart) -> Response {
        provider.calls.fetch_add(1, Ordering::SeqCst);

        let mut image = Bytes::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let is_image = field.name() == Some("image_file");
            let data = field.bytes().await.unwrap();
            if is_image {
                image = data;
            }
        }

        match provider.reject {
            Some(status) => (status, "rejected").into_response(),
            None => image.into_response(),
        }
    }

    /// Public URL host backed by the same store the service writes to.
    async fn serve_blob(
        State(storage): State<Arc<StorageService>>,
        Path(key): Path<String>,
    ) -> Response {
        match storage.read(&key).await {
            Ok(data) => ([(header::CONTENT_TYPE, "image/png")], data).into_response(),
            Err(_) => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn spawn(listener: TcpListener, router: Router) {
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
    }

    struct TestApp {
        router: Router,
        storage: Arc<StorageService>,
        records: Arc<InMemoryImageRepository>,
        provider_calls: Arc<AtomicUsize>,
    }

    async fn test_app(reject: Option<StatusCode>) -> TestApp {
        let cdn_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let cdn_url = format!("http://{}", cdn_listener.local_addr().unwrap());
        let storage = Arc::new(
            StorageService::from_config(StorageConfig::new(StorageProvider::Memory, cdn_url))
                .unwrap(),
        );
        let cdn = Router::new()
            .route("/{*key}", get(serve_blob))
            .with_state(storage.clone());
        spawn(cdn_listener, cdn).await;

        let provider_calls = Arc::new(AtomicUsize::new(0));
        let provider_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let provider_url = format!(
            "http://{}/v1.0/removebg",
            provider_listener.local_addr().unwrap()
        );
        let provider_router = Router::new()
            .route("/v1.0/removebg", post(provider))
            .with_state(Provider {
                calls: provider_calls.clone(),
                reject,
            });
        spawn(provider_listener, provider_router).await;

        let remover = RemoveBgClient::new(RemoveBgConfig::new("test-key", provider_url)).unwrap();
        let records = Arc::new(InMemoryImageRepository::new());
        let images = Arc::new(ImageService::new(storage.clone(), remover, records.clone()));

        TestApp {
            router: create_router(AppState::configured(records.clone(), images)),
            storage,
            records,
            provider_calls,
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_fn(5, 4, |x, y| Rgba([x as u8 * 50, y as u8 * 60, 90, 255]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn multipart_parts(parts: &[(&str, &str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (field, content_type, data) in parts {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\n\
                     Content-Disposition: form-data; name=\"{field}\"; filename=\"upload.bin\"\r\n\
                     Content-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn multipart_body(field: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        multipart_parts(&[(field, content_type, data)])
    }

    fn upload_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    async fn send(app: &TestApp, req: Request<Body>) -> Response {
        app.router.clone().oneshot(req).await.unwrap()
    }

    async fn upload_png(app: &TestApp) -> Value {
        let body = multipart_body("image", "image/png", &png_bytes());
        let response = send(app, upload_request(body)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["data"].clone()
    }

    async fn blob_count(storage: &StorageService) -> (usize, usize) {
        (
            storage.list_keys("originals/").await.unwrap().len(),
            storage.list_keys("processed/").await.unwrap().len(),
        )
    }

    #[tokio::test]
    async fn test_upload_stores_original_and_flipped_cutout() {
        let app = test_app(None).await;
        let original = png_bytes();

        let response = send(
            &app,
            upload_request(multipart_body("image", "image/png", &original)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        let data = &json["data"];
        let id = data["id"].as_str().unwrap();
        assert_eq!(data["originalKey"], format!("originals/{id}.png"));
        assert_eq!(data["processedKey"], format!("processed/{id}.png"));
        assert_eq!(data["status"], "completed");
        assert!(data["createdAt"].is_string());

        let stored = app
            .storage
            .read(&format!("originals/{id}.png"))
            .await
            .unwrap();
        assert_eq!(&stored[..], &original[..]);
        let processed = app
            .storage
            .read(&format!("processed/{id}.png"))
            .await
            .unwrap();
        assert_eq!(
            &processed[..],
            &imaging::flip_horizontal(&original).unwrap()[..]
        );
        assert_eq!(app.provider_calls.load(Ordering::SeqCst), 1);
        assert_eq!(app.records.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_rejects_disallowed_type_before_any_work() {
        let app = test_app(None).await;

        let response = send(
            &app,
            upload_request(multipart_body("image", "image/gif", b"GIF89a")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(
            json["error"],
            "Invalid file type: image/gif. Allowed: image/png, image/jpeg, image/webp"
        );
        assert_eq!(blob_count(&app.storage).await, (0, 0));
        assert_eq!(app.provider_calls.load(Ordering::SeqCst), 0);
        assert!(app.records.is_empty());
    }

    #[tokio::test]
    async fn test_upload_rejects_oversized_file() {
        let app = test_app(None).await;
        let data = vec![0u8; MAX_UPLOAD_SIZE as usize + 1];

        let response = send(
            &app,
            upload_request(multipart_body("image", "image/png", &data)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let json = body_json(response).await;
        assert_eq!(json["error"], "File size exceeds 10MB limit");
        assert_eq!(blob_count(&app.storage).await, (0, 0));
        assert_eq!(app.provider_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upload_uses_first_image_part() {
        let app = test_app(None).await;
        let original = png_bytes();
        let body = multipart_parts(&[
            ("image", "image/png", &original[..]),
            ("image", "image/gif", &b"GIF89a"[..]),
        ]);

        let response = send(&app, upload_request(body)).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        let id = json["data"]["id"].as_str().unwrap();
        let stored = app
            .storage
            .read(&format!("originals/{id}.png"))
            .await
            .unwrap();
        assert_eq!(&stored[..], &original[..]);
        assert_eq!(app.provider_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_upload_without_image_field() {
        let app = test_app(None).await;

        let response = send(
            &app,
            upload_request(multipart_body("avatar", "image/png", &png_bytes())),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "No image file provided");
    }

    #[tokio::test]
    async fn test_upload_rejects_non_multipart_body() {
        let app = test_app(None).await;
        let req = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = send(&app, req).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_rate_limited_provider_leaves_original_only() {
        let app = test_app(Some(StatusCode::TOO_MANY_REQUESTS)).await;

        let response = send(
            &app,
            upload_request(multipart_body("image", "image/png", &png_bytes())),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["error"],
            "Background removal rate limit exceeded. Please try again later."
        );
        assert_eq!(blob_count(&app.storage).await, (1, 0));
        assert!(app.records.is_empty());
    }

    #[tokio::test]
    async fn test_get_image() {
        let app = test_app(None).await;
        let uploaded = upload_png(&app).await;
        let id = uploaded["id"].as_str().unwrap();

        let response = send(&app, request("GET", &format!("/images/{id}"))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], uploaded);
    }

    #[tokio::test]
    async fn test_get_unknown_and_malformed_ids() {
        let app = test_app(None).await;

        for uri in [
            format!("/images/{}", ImageId::new()),
            "/images/not-a-uuid".to_string(),
        ] {
            let response = send(&app, request("GET", &uri)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert_eq!(body_json(response).await["error"], "Image not found");
        }
    }

    #[tokio::test]
    async fn test_list_reflects_uploads_minus_deletes() {
        let app = test_app(None).await;
        let first = upload_png(&app).await;
        let second = upload_png(&app).await;
        let third = upload_png(&app).await;

        let id = second["id"].as_str().unwrap();
        let response = send(&app, request("DELETE", &format!("/images/{id}"))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, request("GET", "/images")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let ids: Vec<&str> = json["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert_eq!(
            ids,
            vec![first["id"].as_str().unwrap(), third["id"].as_str().unwrap()]
        );
    }

    #[tokio::test]
    async fn test_delete_removes_blobs_and_record() {
        let app = test_app(None).await;
        let uploaded = upload_png(&app).await;
        let id = uploaded["id"].as_str().unwrap();

        let response = send(&app, request("DELETE", &format!("/images/{id}"))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], format!("Image {id} deleted successfully"));
        assert_eq!(blob_count(&app.storage).await, (0, 0));

        let response = send(&app, request("GET", &format!("/images/{id}"))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_unknown_reports_under_message() {
        let app = test_app(None).await;

        let response = send(&app, request("DELETE", &format!("/images/{}", ImageId::new()))).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Image not found");
    }

    #[tokio::test]
    async fn test_delete_with_failing_store_keeps_record() {
        let provider =
            StorageProvider::s3("http://127.0.0.1:1", "images", "access", "secret", "auto");
        let storage = Arc::new(
            StorageService::from_config(StorageConfig::new(provider, "https://cdn.example.com"))
                .unwrap(),
        );
        let remover = RemoveBgClient::new(RemoveBgConfig::new(
            "test-key",
            "http://127.0.0.1:1/v1.0/removebg",
        ))
        .unwrap();
        let records = Arc::new(InMemoryImageRepository::new());
        let images = Arc::new(ImageService::new(storage, remover, records.clone()));
        let router = create_router(AppState::configured(records.clone(), images));

        let id = ImageId::new();
        let record = ImageRecord {
            id,
            original_key: format!("originals/{id}.png"),
            processed_key: format!("processed/{id}.png"),
            original_url: format!("https://cdn.example.com/originals/{id}.png"),
            processed_url: format!("https://cdn.example.com/processed/{id}.png"),
            created_at: Utc::now(),
            status: ImageStatus::Completed,
        };
        records.save(record.clone()).await.unwrap();

        let response = router
            .oneshot(request("DELETE", &format!("/images/{id}")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], STORAGE_FAILURE_MESSAGE);
        assert!(json.get("error").is_none());
        assert_eq!(records.find_by_id(id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_concurrent_deletes_succeed_once() {
        let app = test_app(None).await;
        let uploaded = upload_png(&app).await;
        let uri = format!("/images/{}", uploaded["id"].as_str().unwrap());

        let (a, b) = tokio::join!(
            send(&app, request("DELETE", &uri)),
            send(&app, request("DELETE", &uri)),
        );

        let mut statuses = [a.status(), b.status()];
        statuses.sort();
        assert_eq!(statuses, [StatusCode::OK, StatusCode::NOT_FOUND]);
        assert!(app.records.is_empty());
    }

    #[tokio::test]
    async fn test_download_serves_processed_image() {
        let app = test_app(None).await;
        let uploaded = upload_png(&app).await;
        let id = uploaded["id"].as_str().unwrap();

        let response = send(&app, request("GET", &format!("/images/{id}/download"))).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            format!("attachment; filename=\"processed-{id}.png\"")
        );
        let expected = app
            .storage
            .read(&format!("processed/{id}.png"))
            .await
            .unwrap();
        assert_eq!(body_bytes(response).await, expected);
    }

    #[tokio::test]
    async fn test_download_missing_blob_is_bad_gateway() {
        let app = test_app(None).await;
        let uploaded = upload_png(&app).await;
        let id = uploaded["id"].as_str().unwrap();
        app.storage
            .delete(&format!("processed/{id}.png"))
            .await
            .unwrap();

        let response = send(&app, request("GET", &format!("/images/{id}/download"))).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["error"], "Failed to fetch image");
    }

    #[tokio::test]
    async fn test_download_unknown_id() {
        let app = test_app(None).await;

        let response = send(
            &app,
            request("GET", &format!("/images/{}/download", ImageId::new())),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unconfigured_service_still_lists() {
        let records = Arc::new(InMemoryImageRepository::new());
        let router = create_router(AppState::unconfigured(
            records,
            vec!["remove_bg.api_key".to_string()],
        ));

        let response = router
            .clone()
            .oneshot(upload_request(multipart_body(
                "image",
                "image/png",
                &png_bytes(),
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["error"],
            "Service not configured: missing remove_bg.api_key"
        );

        let response = router.oneshot(request("GET", "/images")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "success": true, "data": [] })
        );
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app(None).await;

        let response = send(&app, request("GET", "/health")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["configured"], true);
    }
}
