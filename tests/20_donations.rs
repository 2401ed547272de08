mod common;

use anyhow::Result;
use futures::future::join_all;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn donation_is_listed_last_with_date() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login().await?;

    server.donate(json!({ "name": "Grace", "amount": "10" })).await?;

    let res = server.donate(json!({ "name": "Ada", "amount": 25 })).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    let donation = &body["donation"];
    assert_eq!(donation["name"], "Ada");
    assert_eq!(donation["amount"], 25);
    assert!(!donation["date"].as_str().unwrap_or_default().is_empty());

    let res = server.donations(&token).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let list = res.json::<Vec<Value>>().await?;
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["amount"], "10");
    assert_eq!(list.last(), Some(donation));
    Ok(())
}

#[tokio::test]
async fn empty_collection_lists_as_empty_array() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login().await?;

    let res = server.donations(&token).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?, json!([]));
    Ok(())
}

#[tokio::test]
async fn missing_fields_are_rejected_without_writing() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login().await?;

    server.donate(json!({ "name": "Ada", "amount": 5 })).await?;

    for body in [
        json!({ "amount": 5 }),
        json!({ "name": "Ada" }),
        json!({ "name": "", "amount": 5 }),
        json!({}),
    ] {
        let res = server.donate(body.clone()).await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(
            res.json::<Value>().await?,
            json!({ "error": "Name and amount are required." })
        );
    }

    let list = server.donations(&token).await?.json::<Vec<Value>>().await?;
    assert_eq!(list.len(), 1);
    Ok(())
}

#[tokio::test]
async fn donations_are_written_to_the_collection_file() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.donate(json!({ "name": "Ada", "amount": 1 })).await?;

    let raw = std::fs::read_to_string(server.data_dir().join("donations.json"))?;
    let stored: Vec<Value> = serde_json::from_str(&raw)?;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["name"], "Ada");
    Ok(())
}

#[tokio::test]
async fn concurrent_donations_are_all_persisted() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login().await?;

    let requests = (0..25).map(|i| server.donate(json!({ "name": format!("donor-{i}"), "amount": i + 1 })));
    for res in join_all(requests).await {
        assert_eq!(res?.status(), StatusCode::OK);
    }

    let list = server.donations(&token).await?.json::<Vec<Value>>().await?;
    assert_eq!(list.len(), 25);
    Ok(())
}

#[tokio::test]
async fn corrupt_collection_is_a_server_error_not_a_crash() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.login().await?;
    std::fs::write(server.data_dir().join("donations.json"), "[{\"name\": ")?;

    let res = server.donations(&token).await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.json::<Value>().await?["error"].is_string());

    let res = server.donate(json!({ "name": "Ada", "amount": 1 })).await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // Other collections keep working
    let res = server.client.get(server.url("/media")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}
