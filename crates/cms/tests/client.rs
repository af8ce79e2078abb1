// Upstream client tests against a throwaway local CMS stand-in.

use std::{collections::HashMap, time::Duration};

use anyhow::Result;
use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use wfg_cms::{CmsClient, CmsError, CollectionQuery, CollectionSource, FilterCriteria};

async fn items(
    Path((site, collection)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let auth = headers.get("authorization").and_then(|h| h.to_str().ok()).unwrap_or_default();
    if auth != "Bearer good-token" {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "bad token" }))).into_response();
    }
    match collection.as_str() {
        "missing" => (StatusCode::NOT_FOUND, "collection not found").into_response(),
        "no-items" => Json(json!({ "pagination": { "total": 0 } })).into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({ "items": [] })).into_response()
        }
        _ => Json(json!({
            "items": [
                { "id": "1", "site": site, "fieldData": { "user-name": "alice@example.com", "application-status": "Draft" } },
                { "id": "2", "echo": params },
            ]
        }))
        .into_response(),
    }
}

async fn spawn_upstream() -> Result<String> {
    let app = Router::new().route("/v2/sites/:site/collections/:collection/items", get(items));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}/v2"))
}

fn query(collection: &str, token: &str) -> CollectionQuery {
    CollectionQuery::new(collection, token).site("site-1")
}

#[tokio::test]
async fn fetches_and_decodes_items() -> Result<()> {
    let base = spawn_upstream().await?;
    let client = CmsClient::new(base, Duration::from_secs(5));

    let page = client.fetch_items(&query("apps", "good-token")).await?;
    assert_eq!(page.len(), 2);
    assert_eq!(page.items[0].id(), Some("1"));
    assert_eq!(page.items[0].raw()["site"], "site-1");
    Ok(())
}

#[tokio::test]
async fn forwards_filter_parameters() -> Result<()> {
    let base = spawn_upstream().await?;
    let client = CmsClient::new(base, Duration::from_secs(5));

    let q = query("apps", "good-token").filters(FilterCriteria::new(Some("alice@example.com".into()), Some("draft".into())));
    let page = client.fetch_items(&q).await?;
    let echo = &page.items[1].raw()["echo"];
    assert_eq!(echo["filter[user-name]"], "alice@example.com");
    assert_eq!(echo["filter[application-status]"], "draft");
    Ok(())
}

#[tokio::test]
async fn non_success_status_is_an_error() -> Result<()> {
    let base = spawn_upstream().await?;
    let client = CmsClient::new(base, Duration::from_secs(5));

    match client.fetch_items(&query("apps", "bad-token")).await {
        Err(CmsError::Status { status, body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("bad token"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
    match client.fetch_items(&query("missing", "good-token")).await {
        Err(CmsError::Status { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected status error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn absent_items_key_is_empty() -> Result<()> {
    let base = spawn_upstream().await?;
    let client = CmsClient::new(base, Duration::from_secs(5));

    let page = client.fetch_items(&query("no-items", "good-token")).await?;
    assert!(page.is_empty());
    Ok(())
}

#[tokio::test]
async fn slow_upstream_times_out() -> Result<()> {
    let base = spawn_upstream().await?;
    let client = CmsClient::new(base, Duration::from_millis(200));

    let err = client.fetch_items(&query("slow", "good-token")).await.unwrap_err();
    assert!(matches!(err, CmsError::Timeout), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn unreachable_upstream_is_transport_error() -> Result<()> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    let client = CmsClient::new(format!("http://{addr}/v2"), Duration::from_secs(2));

    let err = client.fetch_items(&query("apps", "good-token")).await.unwrap_err();
    assert!(matches!(err, CmsError::Transport(_)), "got {err:?}");
    Ok(())
}
