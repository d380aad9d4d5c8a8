#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use photo_library_server::config::Config;
use photo_library_server::infrastructure::database;
use photo_library_server::{AppState, create_app};
use sea_orm::Database;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "---------------------------123456789012345678901234567";

/// Router plus everything it needs; the tempdir owns both the SQLite file
/// and the library storage roots and is destroyed with the test.
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub dir: TempDir,
}

impl TestApp {
    /// A fresh path under the tempdir suitable as a library storage_path.
    pub fn storage_path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().into_owned()
    }

    pub fn storage_dir(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("PUT", uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request("DELETE", uri, None).await
    }

    /// POST a multipart photo upload with the standard field names.
    pub async fn upload(
        &self,
        library_id: &str,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
        rating: Option<&str>,
        tags: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut fields: Vec<(&str, String)> = vec![("library_id", library_id.to_string())];
        if let Some(rating) = rating {
            fields.push(("rating", rating.to_string()));
        }
        if let Some(tags) = tags {
            fields.push(("tags", tags.to_string()));
        }

        let body = multipart_body(&fields, "photo", filename, content_type, bytes);

        let response = self
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/photos/upload")
                    .header(
                        "Content-Type",
                        format!("multipart/form-data; boundary={}", BOUNDARY),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    /// Shortcut: create a library and return its id.
    pub async fn create_library(&self, name: &str) -> String {
        let (status, body) = self
            .post(
                "/api/v1/libraries",
                serde_json::json!({
                    "name": name,
                    "storage_path": self.storage_path(name),
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create library: {:?}", body);
        body["id"].as_str().unwrap().to_string()
    }
}

pub async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();

    // File-backed SQLite: every pooled connection must see the same data.
    let db_url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("test.db").display()
    );
    let db = Database::connect(&db_url).await.unwrap();
    database::run_migrations(&db).await.unwrap();

    let config = Config {
        database_url: db_url,
        ..Config::default()
    };
    let state = AppState::new(db, config);
    let app = create_app(state.clone());

    TestApp { app, state, dir }
}

/// Hand-built multipart body: text fields first, then one file field.
pub fn multipart_body(
    fields: &[(&str, String)],
    file_field: &str,
    filename: &str,
    content_type: &str,
    bytes: &[u8],
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                name, value
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            file_field, filename, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// A real, decodable 1x1 PNG.
pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([12, 34, 56, 255]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, image::ImageOutputFormat::Png)
        .unwrap();
    buf.into_inner()
}
