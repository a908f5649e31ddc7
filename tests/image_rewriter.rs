use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use weclip::images::ImageStore;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const JPEG_BYTES: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 1, 2, 3, 4];

fn store_in(dir: &tempfile::TempDir) -> ImageStore {
    ImageStore::new(dir.path(), "/static/imgs", Duration::ZERO, 1)
}

async fn mount_image(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(JPEG_BYTES.to_vec())
                .insert_header("Content-Type", "image/jpeg"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn rewrites_both_occurrences_of_a_stored_image() {
    let server = MockServer::start().await;
    mount_image(&server, "/img/a").await;

    let remote = format!("{}/img/a?wx_fmt=jpeg", server.uri());
    let content = format!(
        r#"<p><img data-src="{remote}" src="{remote}"></p>"#
    );

    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let (rewritten, outcome) = store
        .rewrite_content(content, Arc::new(Semaphore::new(2)), CancellationToken::new())
        .await;

    assert_eq!(outcome.stored, 1);
    assert_eq!(outcome.skipped, 0);
    assert!(!rewritten.contains(&remote));
    assert_eq!(rewritten.matches("/static/imgs/").count(), 2);

    let files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap())
        .collect();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().into_string().unwrap();
    assert!(name.ends_with(".jpeg"));
    assert_eq!(name.len(), "xxxxxxxxxxxxxxx.jpeg".len());
    assert_eq!(std::fs::read(files[0].path()).unwrap(), JPEG_BYTES);
    assert!(rewritten.contains(&format!("/static/imgs/{name}")));
}

#[tokio::test]
async fn third_occurrence_keeps_the_remote_url() {
    let server = MockServer::start().await;
    mount_image(&server, "/img/b").await;

    let remote = format!("{}/img/b?wx_fmt=png", server.uri());
    let content = format!(
        r#"<img data-src="{remote}"><span>{remote}</span><span>{remote}</span>"#
    );

    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let (rewritten, outcome) = store
        .rewrite_content(content, Arc::new(Semaphore::new(2)), CancellationToken::new())
        .await;

    assert_eq!(outcome.stored, 1);
    assert_eq!(rewritten.matches(&remote).count(), 1);
    assert_eq!(rewritten.matches("/static/imgs/").count(), 2);
}

#[tokio::test]
async fn failed_download_leaves_the_reference_and_counts_a_skip() {
    let server = MockServer::start().await;
    mount_image(&server, "/img/good").await;

    Mock::given(method("GET"))
        .and(path("/img/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let good = format!("{}/img/good?wx_fmt=jpeg", server.uri());
    let gone = format!("{}/img/gone?wx_fmt=jpeg", server.uri());
    let content = format!(r#"<img data-src="{good}"><img data-src="{gone}">"#);

    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let (rewritten, outcome) = store
        .rewrite_content(content, Arc::new(Semaphore::new(2)), CancellationToken::new())
        .await;

    assert_eq!(outcome.stored, 1);
    assert_eq!(outcome.skipped, 1);
    assert!(rewritten.contains(&gone));
    assert!(!rewritten.contains(&good));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn cancelled_rewrite_writes_nothing() {
    let server = MockServer::start().await;
    mount_image(&server, "/img/c").await;

    let remote = format!("{}/img/c?wx_fmt=jpeg", server.uri());
    let content = format!(r#"<img data-src="{remote}">"#);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let (rewritten, outcome) = store
        .rewrite_content(content.clone(), Arc::new(Semaphore::new(2)), cancel)
        .await;

    assert_eq!(outcome.stored, 0);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(rewritten, content);
    assert!(
        !dir.path().exists() || std::fs::read_dir(dir.path()).unwrap().count() == 0
    );
}

#[tokio::test]
async fn content_without_lazy_images_passes_through() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let content = "<p>plain text, eager <img src=\"http://x/y.png\"> only</p>".to_string();
    let (rewritten, outcome) = store
        .rewrite_content(content.clone(), Arc::new(Semaphore::new(1)), CancellationToken::new())
        .await;
    assert_eq!(rewritten, content);
    assert_eq!(outcome, Default::default());
}

#[tokio::test]
async fn poster_download_returns_local_web_path() {
    let server = MockServer::start().await;
    mount_image(&server, "/img/poster").await;

    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let cancel = CancellationToken::new();

    let url = format!("{}/img/poster?wx_fmt=jpeg", server.uri());
    let local = store.store_poster(&url, &cancel).await.unwrap().unwrap();
    assert!(local.starts_with("/static/imgs/"));
    assert!(local.ends_with(".jpeg"));

    let empty = store.store_poster("", &cancel).await.unwrap();
    assert!(empty.is_none());
}
