mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn root_token(server: &common::TestServer) -> Result<Option<String>> {
    if !common::database_available(server).await {
        eprintln!("skipping: database not available");
        return Ok(None);
    }
    let token = common::login(server, "superadmin@system.com", "SuperAdmin123!", None).await?;
    if token.is_none() {
        eprintln!("skipping: seed fixture not loaded");
    }
    Ok(token)
}

async fn site_status(server: &common::TestServer, subdomain: &str) -> Result<StatusCode> {
    let res = common::client().get(server.url(&format!("/?subdomain={}", subdomain))).send().await?;
    Ok(res.status())
}

#[tokio::test]
async fn trashed_kindergarten_site_is_gone_until_restored() -> Result<()> {
    let server = common::ensure_server().await?;
    let Some(token) = root_token(server).await? else {
        return Ok(());
    };

    let subdomain = format!("trash-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]);
    let res = common::client()
        .post(server.url("/api/root/kindergartens"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Trash Kindergarten", "subdomain": subdomain }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    let id = body["data"]["id"].as_i64().unwrap_or_default();
    assert_eq!(body["data"]["is_active"], true);

    assert_eq!(site_status(server, &subdomain).await?, StatusCode::OK);

    let res = common::client()
        .delete(server.url(&format!("/api/root/kindergartens/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert!(body["data"]["trashed_at"].is_string());
    assert_eq!(site_status(server, &subdomain).await?, StatusCode::NOT_FOUND);

    // Trashed rows are hidden unless asked for
    let listed: Value = common::client()
        .get(server.url("/api/root/kindergartens"))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    let visible = listed["data"].as_array().cloned().unwrap_or_default();
    assert!(!visible.iter().any(|k| k["id"].as_i64() == Some(id)));

    let res = common::client()
        .post(server.url(&format!("/api/root/kindergartens/{}/restore", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert!(body["data"]["trashed_at"].is_null());
    assert_eq!(body["data"]["is_active"], true);
    assert_eq!(site_status(server, &subdomain).await?, StatusCode::OK);

    // Restoring a live kindergarten is a 404
    let res = common::client()
        .post(server.url(&format!("/api/root/kindergartens/{}/restore", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = common::client()
        .delete(server.url(&format!("/api/root/kindergartens/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn root_routes_answer_json_for_bad_input() -> Result<()> {
    let server = common::ensure_server().await?;
    let Some(token) = root_token(server).await? else {
        return Ok(());
    };

    let res = common::client()
        .get(server.url("/api/root/kindergartens/not-a-number"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["success"], false);

    let res = common::client()
        .post(server.url("/api/root/kindergartens"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{\"name\": ")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn kindergarten_admin_cannot_reach_root_routes() -> Result<()> {
    let server = common::ensure_server().await?;
    if !common::database_available(server).await {
        eprintln!("skipping: database not available");
        return Ok(());
    }
    let Some(token) = common::login(server, "admin@ornek.com", "admin123", Some("ornek")).await? else {
        eprintln!("skipping: seed fixture not loaded");
        return Ok(());
    };

    let res = common::client()
        .get(server.url("/api/root/kindergartens"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}
