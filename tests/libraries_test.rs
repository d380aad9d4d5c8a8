mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_create_library_creates_storage_directory() {
    let t = common::spawn_app().await;

    let (status, body) = t
        .post(
            "/api/v1/libraries",
            json!({
                "name": "Vacation",
                "description": "Summer trips",
                "storage_path": t.storage_path("vacation"),
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Vacation");
    assert!(body["id"].as_str().is_some());
    assert!(t.storage_dir("vacation").is_dir());
}

#[tokio::test]
async fn test_create_library_duplicate_name_conflicts() {
    let t = common::spawn_app().await;
    t.create_library("Family").await;

    let (status, body) = t
        .post(
            "/api/v1/libraries",
            json!({
                "name": "Family",
                "storage_path": t.storage_path("family2"),
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Library with this name already exists");
    // The losing request must not leave a directory behind.
    assert!(!t.storage_dir("family2").exists());
}

#[tokio::test]
async fn test_create_library_duplicate_storage_path_conflicts() {
    let t = common::spawn_app().await;
    let path = t.storage_path("shared");
    let (status, _) = t
        .post(
            "/api/v1/libraries",
            json!({ "name": "First", "storage_path": path }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = t
        .post(
            "/api/v1/libraries",
            json!({ "name": "Second", "storage_path": path }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Library with this storage path already exists");
}

#[tokio::test]
async fn test_create_library_validation() {
    let t = common::spawn_app().await;

    let (status, body) = t
        .post(
            "/api/v1/libraries",
            json!({ "name": "", "storage_path": t.storage_path("x") }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "name");

    let (status, body) = t
        .post(
            "/api/v1/libraries",
            json!({ "name": "Escaper", "storage_path": "photos/../../etc" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "storage_path");

    let (status, _) = t
        .post(
            "/api/v1/libraries",
            json!({ "name": "Rooted", "storage_path": "/etc/photos" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .post(
            "/api/v1/libraries",
            json!({ "name": "TooLong", "storage_path": t.storage_path("ok"), "description": "d".repeat(501) }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_library_not_found_and_bad_id() {
    let t = common::spawn_app().await;

    let (status, body) = t
        .get("/api/v1/libraries/00000000-0000-0000-0000-000000000000")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Library not found");

    let (status, body) = t.get("/api/v1/libraries/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid library ID");
}

#[tokio::test]
async fn test_update_library_partial_and_unique() {
    let t = common::spawn_app().await;
    let id = t.create_library("Original").await;
    t.create_library("Taken").await;

    let (status, body) = t
        .put(
            &format!("/api/v1/libraries/{}", id),
            json!({ "description": "renovated" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Original");
    assert_eq!(body["description"], "renovated");

    let (status, _) = t
        .put(
            &format!("/api/v1/libraries/{}", id),
            json!({ "name": "Taken" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_library_storage_path_creates_new_directory() {
    let t = common::spawn_app().await;
    let id = t.create_library("Mover").await;

    let (status, body) = t
        .put(
            &format!("/api/v1/libraries/{}", id),
            json!({ "storage_path": t.storage_path("moved") }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["storage_path"], t.storage_path("moved"));
    assert!(t.storage_dir("moved").is_dir());
    // Files are not migrated; the old directory is left alone.
    assert!(t.storage_dir("Mover").is_dir());
}

#[tokio::test]
async fn test_delete_library_cascades_and_removes_directory() {
    let t = common::spawn_app().await;
    let library_id = t.create_library("Doomed").await;

    let (status, album) = t
        .post(
            "/api/v1/albums",
            json!({ "name": "Inside", "library_id": library_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, photo) = t
        .upload(&library_id, "pic.png", "image/png", &common::png_bytes(), None, Some("keep"))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = t
        .delete(&format!("/api/v1/libraries/{}", library_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Library deleted successfully");
    assert!(body.get("warning").is_none());
    assert!(!t.storage_dir("Doomed").exists());

    let (status, _) = t
        .get(&format!("/api/v1/albums/{}", album["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = t
        .get(&format!("/api/v1/photos/{}", photo["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The tag itself is global and survives.
    let (status, tags) = t.get("/api/v1/tags").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_library_stats() {
    let t = common::spawn_app().await;
    let library_id = t.create_library("Counted").await;
    let other_id = t.create_library("Other").await;

    let png = common::png_bytes();
    t.upload(&library_id, "a.png", "image/png", &png, None, Some("sun, sea"))
        .await;
    t.upload(&library_id, "b.png", "image/png", &png, None, Some("sun"))
        .await;
    t.upload(&other_id, "c.png", "image/png", &png, None, Some("moon"))
        .await;
    t.post(
        "/api/v1/albums",
        json!({ "name": "One", "library_id": library_id }),
    )
    .await;

    let (status, stats) = t
        .get(&format!("/api/v1/libraries/{}/stats", library_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["library_name"], "Counted");
    assert_eq!(stats["photo_count"], 2);
    assert_eq!(stats["album_count"], 1);
    // "sun" counted once, "moon" belongs to the other library.
    assert_eq!(stats["tag_count"], 2);
    assert_eq!(stats["total_size_bytes"], (png.len() * 2) as i64);
}

#[tokio::test]
async fn test_list_libraries_with_counts() {
    let t = common::spawn_app().await;
    let library_id = t.create_library("Listed").await;
    t.upload(&library_id, "a.png", "image/png", &common::png_bytes(), None, None)
        .await;

    let (status, body) = t.get("/api/v1/libraries?include_counts=true").await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["photo_count"], 1);
    assert_eq!(list[0]["album_count"], 0);
}
