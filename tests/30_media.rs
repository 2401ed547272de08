mod common;

use anyhow::Result;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};

fn file_form(name: &str, mime: &str, bytes: &[u8]) -> Result<Form> {
    let part = Part::bytes(bytes.to_vec()).file_name(name.to_string()).mime_str(mime)?;
    Ok(Form::new().part("file", part))
}

async fn upload(server: &common::TestServer, token: Option<&str>, form: Form) -> Result<reqwest::Response> {
    let mut req = server.client.post(server.url("/upload")).multipart(form);
    if let Some(token) = token {
        req = req.header("Authorization", token);
    }
    Ok(req.send().await?)
}

fn upload_count(server: &common::TestServer) -> usize {
    std::fs::read_dir(server.uploads_dir())
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn upload_stores_file_and_lists_it() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login().await?;

    let form = file_form("cat.png", "image/png", b"not really a png")?
        .text("description", "the office cat");
    let res = upload(&server, Some(&token), form).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    let media = &body["media"];
    assert_eq!(media["originalName"], "cat.png");
    assert_eq!(media["type"], "image");
    assert_eq!(media["description"], "the office cat");

    let filename = media["filename"].as_str().unwrap_or_default();
    assert!(filename.ends_with("_cat.png"), "{filename}");
    assert_eq!(
        media["url"],
        json!(format!("http://localhost:{}/uploads/{}", server.port, filename))
    );

    // Public listing, no token needed
    let list = server.client.get(server.url("/media")).send().await?.json::<Vec<Value>>().await?;
    assert_eq!(list.len(), 1);
    assert_eq!(&list[0], media);

    // Served back verbatim
    let res = server.client.get(server.url(&format!("/uploads/{filename}"))).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.bytes().await?.as_ref(), b"not really a png");
    Ok(())
}

#[tokio::test]
async fn non_image_uploads_are_video() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login().await?;

    for (name, mime) in [("clip.mp4", "video/mp4"), ("doc.pdf", "application/pdf")] {
        let res = upload(&server, Some(&token), file_form(name, mime, b"data")?).await?;
        let body = res.json::<Value>().await?;
        assert_eq!(body["media"]["type"], "video", "{mime}");
        assert_eq!(body["media"]["description"], "");
    }
    Ok(())
}

#[tokio::test]
async fn upload_without_token_writes_nothing() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let res = upload(&server, None, file_form("cat.png", "image/png", b"x")?).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "No token provided" }));

    let res = upload(&server, Some("forged"), file_form("cat.png", "image/png", b"x")?).await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    assert_eq!(upload_count(&server), 0);
    let list = server.client.get(server.url("/media")).send().await?.json::<Value>().await?;
    assert_eq!(list, json!([]));
    Ok(())
}

#[tokio::test]
async fn upload_without_file_is_bad_request() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login().await?;

    let form = Form::new().text("description", "no file here");
    let res = upload(&server, Some(&token), form).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?, json!({ "error": "File is required" }));

    // A `file` part without a filename is not an upload either
    let form = Form::new().text("file", "just text");
    let res = upload(&server, Some(&token), form).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert_eq!(upload_count(&server), 0);
    Ok(())
}

#[tokio::test]
async fn large_uploads_are_not_capped_by_default() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login().await?;

    // Above axum's 2 MiB default body limit
    let bytes = vec![7u8; 3 * 1024 * 1024];
    let res = upload(&server, Some(&token), file_form("big.mov", "video/quicktime", &bytes)?).await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn missing_static_file_is_404() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let res = server.client.get(server.url("/uploads/nope.png")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
