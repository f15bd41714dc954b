//! DriveClient behaviour against a mock Drive API

use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use pdfsync_drive::DriveError;

use crate::common::{self, id, pdf_query, FILES_PATH};

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_files_sends_query_and_parses_files() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path(FILES_PATH))
        .and(header("authorization", "Bearer test-access-token"))
        .and(query_param("q", pdf_query("folderA")))
        .and(query_param("orderBy", "modifiedTime desc"))
        .and(query_param(
            "fields",
            "nextPageToken,files(id,name,modifiedTime,size)",
        ))
        .and(query_param("pageSize", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [
                {"id": "b", "name": "b.pdf", "modifiedTime": "2024-03-02T08:00:00Z", "size": "4096"},
                {"id": "a", "name": "a.pdf", "modifiedTime": "2024-03-01T08:00:00Z", "size": "2000"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let files = client
        .list_files(&id("folderA"), "application/pdf", "modifiedTime desc")
        .await
        .expect("listing failed");

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].id, id("b"));
    assert_eq!(files[0].size, Some(4096));
    assert_eq!(files[1].name, "a.pdf");
}

#[tokio::test]
async fn test_list_files_follows_pagination() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path(FILES_PATH))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [{"id": "c", "name": "c.pdf"}]
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(FILES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "nextPageToken": "page-2",
            "files": [{"id": "a", "name": "a.pdf"}, {"id": "b", "name": "b.pdf"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let files = client
        .list_files(&id("folderA"), "application/pdf", "modifiedTime desc")
        .await
        .unwrap();

    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a.pdf", "b.pdf", "c.pdf"]);
}

#[tokio::test]
async fn test_list_files_empty_folder() {
    let (server, client) = common::setup_drive_mock().await;
    common::mount_listing(&server, "empty", serde_json::json!([])).await;

    let files = client
        .list_files(&id("empty"), "application/pdf", "modifiedTime desc")
        .await
        .unwrap();

    assert!(files.is_empty());
}

#[tokio::test]
async fn test_list_files_not_found() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path(FILES_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string("File not found: folderX"))
        .mount(&server)
        .await;

    let err = client
        .list_files(&id("folderX"), "application/pdf", "modifiedTime desc")
        .await
        .unwrap_err();

    assert!(matches!(err, DriveError::NotFound(m) if m.contains("folderX")));
}

#[tokio::test]
async fn test_list_files_rejects_malformed_body() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path(FILES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client
        .list_files(&id("folderA"), "application/pdf", "modifiedTime desc")
        .await
        .unwrap_err();

    assert!(matches!(err, DriveError::InvalidResponse(_)));
}

// ============================================================================
// Download
// ============================================================================

#[tokio::test]
async fn test_download_returns_content() {
    let (server, client) = common::setup_drive_mock().await;

    let content = b"%PDF-1.7\nbody";
    common::mount_download(&server, "file-001", content).await;

    let data = client.download(&id("file-001")).await.expect("Download failed");

    assert_eq!(data, content);
}

#[tokio::test]
async fn test_download_status_errors_are_typed() {
    let (server, client) = common::setup_drive_mock().await;

    for (file_id, status) in [("unauth", 401), ("denied", 403), ("busy", 429), ("down", 503)] {
        Mock::given(method("GET"))
            .and(path(format!("{FILES_PATH}/{file_id}")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
    }

    assert!(matches!(
        client.download(&id("unauth")).await,
        Err(DriveError::Unauthorized(_))
    ));
    assert!(matches!(
        client.download(&id("denied")).await,
        Err(DriveError::Forbidden(_))
    ));
    assert!(matches!(
        client.download(&id("busy")).await,
        Err(DriveError::TooManyRequests(_))
    ));
    assert!(matches!(
        client.download(&id("down")).await,
        Err(DriveError::ServerError { status: 503, .. })
    ));
}

// ============================================================================
// Folders and moves
// ============================================================================

#[tokio::test]
async fn test_find_folder_escapes_name() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path(FILES_PATH))
        .and(query_param(
            "q",
            "name='Bob\\'s Archive' and 'folderA' in parents \
             and mimeType='application/vnd.google-apps.folder' and trashed=false",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [{"id": "arch-1"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let found = client
        .find_folder(&id("folderA"), "Bob's Archive")
        .await
        .unwrap();

    assert_eq!(found, Some(id("arch-1")));
}

#[tokio::test]
async fn test_find_folder_none() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path(FILES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": []
        })))
        .mount(&server)
        .await;

    let found = client.find_folder(&id("folderA"), "Archived").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_create_folder_posts_metadata() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("POST"))
        .and(path(FILES_PATH))
        .and(query_param("fields", "id"))
        .and(body_json(serde_json::json!({
            "name": "Archived",
            "mimeType": "application/vnd.google-apps.folder",
            "parents": ["folderA"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "new-folder"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = client.create_folder(&id("folderA"), "Archived").await.unwrap();
    assert_eq!(created, id("new-folder"));
}

#[tokio::test]
async fn test_move_file_patches_parents() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("PATCH"))
        .and(path(format!("{FILES_PATH}/a")))
        .and(query_param("addParents", "arch-1"))
        .and(query_param("removeParents", "folderA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "a",
            "parents": ["arch-1"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .move_file(&id("a"), &id("folderA"), &id("arch-1"))
        .await
        .expect("move failed");
}

#[tokio::test]
async fn test_move_file_forbidden() {
    let (server, client) = common::setup_drive_mock().await;

    Mock::given(method("PATCH"))
        .and(path(format!("{FILES_PATH}/a")))
        .respond_with(
            ResponseTemplate::new(403).set_body_string("insufficientFilePermissions"),
        )
        .mount(&server)
        .await;

    let err = client
        .move_file(&id("a"), &id("folderA"), &id("arch-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, DriveError::Forbidden(_)));
}
