mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_create_album_requires_existing_library() {
    let t = common::spawn_app().await;
    let library_id = t.create_library("Albums").await;

    let (status, album) = t
        .post(
            "/api/v1/albums",
            json!({ "name": "Best of", "description": "picks", "library_id": library_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(album["name"], "Best of");
    assert_eq!(album["library_id"].as_str().unwrap(), library_id);

    let (status, body) = t
        .post(
            "/api/v1/albums",
            json!({ "name": "Orphan", "library_id": "00000000-0000-0000-0000-000000000000" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Library not found");

    let (status, _) = t
        .post(
            "/api/v1/albums",
            json!({ "name": "Bad", "library_id": "nope" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_albums_filtered_by_library() {
    let t = common::spawn_app().await;
    let first = t.create_library("First").await;
    let second = t.create_library("Second").await;

    for (name, lib) in [("A", &first), ("B", &first), ("C", &second)] {
        t.post("/api/v1/albums", json!({ "name": name, "library_id": lib }))
            .await;
    }

    let (status, body) = t.get("/api/v1/albums").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (_, body) = t.get(&format!("/api/v1/albums?library_id={}", first)).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_add_photo_to_album_same_library_only() {
    let t = common::spawn_app().await;
    let home = t.create_library("Home").await;
    let away = t.create_library("Away").await;

    let (_, album) = t
        .post("/api/v1/albums", json!({ "name": "Homebound", "library_id": home }))
        .await;
    let album_id = album["id"].as_str().unwrap();

    let png = common::png_bytes();
    let (_, local) = t.upload(&home, "local.png", "image/png", &png, None, None).await;
    let (_, foreign) = t.upload(&away, "far.png", "image/png", &png, None, None).await;

    let (status, body) = t
        .post(
            &format!("/api/v1/albums/{}/photos", album_id),
            json!({ "photo_id": local["id"], "order": 7 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Photo added to album successfully");

    // Same pair again: conflict, not a silent overwrite.
    let (status, body) = t
        .post(
            &format!("/api/v1/albums/{}/photos", album_id),
            json!({ "photo_id": local["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Photo is already in this album");

    // Cross-library placement is a client error.
    let (status, body) = t
        .post(
            &format!("/api/v1/albums/{}/photos", album_id),
            json!({ "photo_id": foreign["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Photo and album must belong to the same library"
    );
}

#[tokio::test]
async fn test_album_photo_order_and_membership() {
    let t = common::spawn_app().await;
    let library_id = t.create_library("Ordered").await;
    let (_, album) = t
        .post("/api/v1/albums", json!({ "name": "Sequence", "library_id": library_id }))
        .await;
    let album_id = album["id"].as_str().unwrap();

    let png = common::png_bytes();
    let (_, one) = t.upload(&library_id, "one.png", "image/png", &png, None, None).await;
    let (_, two) = t.upload(&library_id, "two.png", "image/png", &png, None, None).await;

    t.post(
        &format!("/api/v1/albums/{}/photos", album_id),
        json!({ "photo_id": one["id"], "order": 2 }),
    )
    .await;
    t.post(
        &format!("/api/v1/albums/{}/photos", album_id),
        json!({ "photo_id": two["id"], "order": 1 }),
    )
    .await;

    let (status, body) = t
        .get(&format!("/api/v1/albums/{}?include_photos=true", album_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    let members = body["photos"].as_array().unwrap();
    assert_eq!(members[0]["original_name"], "two.png");
    assert_eq!(members[1]["original_name"], "one.png");

    // Reorder and verify the listing flips.
    let (status, body) = t
        .put(
            &format!(
                "/api/v1/albums/{}/photos/{}/order",
                album_id,
                one["id"].as_str().unwrap()
            ),
            json!({ "order": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Photo order updated successfully");

    let (_, body) = t
        .get(&format!("/api/v1/albums/{}?include_photos=true", album_id))
        .await;
    assert_eq!(body["photos"][0]["original_name"], "one.png");

    // Reordering a non-member pair is a 404.
    let (status, _) = t
        .put(
            &format!(
                "/api/v1/albums/{}/photos/{}/order",
                album_id, "00000000-0000-0000-0000-000000000000"
            ),
            json!({ "order": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Removal detaches without deleting the photo.
    let (status, _) = t
        .delete(&format!(
            "/api/v1/albums/{}/photos/{}",
            album_id,
            two["id"].as_str().unwrap()
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = t
        .get(&format!("/api/v1/photos/{}", two["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t
        .delete(&format!(
            "/api/v1/albums/{}/photos/{}",
            album_id,
            two["id"].as_str().unwrap()
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_and_delete_album() {
    let t = common::spawn_app().await;
    let library_id = t.create_library("Editable").await;
    let (_, album) = t
        .post("/api/v1/albums", json!({ "name": "Draft", "library_id": library_id }))
        .await;
    let album_id = album["id"].as_str().unwrap();

    let (status, updated) = t
        .put(&format!("/api/v1/albums/{}", album_id), json!({ "name": "Final" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Final");

    let (_, photo) = t
        .upload(&library_id, "inside.png", "image/png", &common::png_bytes(), None, None)
        .await;
    t.post(
        &format!("/api/v1/albums/{}/photos", album_id),
        json!({ "photo_id": photo["id"] }),
    )
    .await;

    let (status, body) = t.delete(&format!("/api/v1/albums/{}", album_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Album deleted successfully");

    // Member photos survive album deletion.
    let (status, _) = t
        .get(&format!("/api/v1/photos/{}", photo["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::OK);
}
