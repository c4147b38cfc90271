mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn admin_api_requires_a_session() -> Result<()> {
    let server = common::ensure_server().await?;

    for path in ["/api/admin/dashboard", "/api/admin/events", "/api/root/kindergartens", "/api/auth/whoami"] {
        let res = common::client().get(server.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "GET {}", path);
    }
    Ok(())
}

#[tokio::test]
async fn garbage_tokens_are_rejected() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = common::client()
        .get(server.url("/api/admin/settings"))
        .bearer_auth("definitely.not.a-jwt")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = common::client()
        .get(server.url("/api/admin/settings"))
        .header("cookie", "kinder_session=garbage")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn wrong_password_never_signs_in() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = common::client()
        .post(server.url("/auth/login"))
        .json(&json!({ "email": "admin@ornek.com", "password": "wrong-password" }))
        .send()
        .await?;
    assert_ne!(res.status(), StatusCode::OK);
    if common::database_available(server).await {
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
    Ok(())
}

#[tokio::test]
async fn logout_clears_the_cookie() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = common::client()
        .post(server.url("/auth/logout"))
        .header("cookie", "kinder_session=stale-token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let cookie = res
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.contains("Max-Age=0"), "unexpected cookie: {}", cookie);
    Ok(())
}

#[tokio::test]
async fn seeded_login_round_trip() -> Result<()> {
    let server = common::ensure_server().await?;

    let Some(token) = common::login(server, "admin@ornek.com", "admin123", Some("ornek")).await? else {
        eprintln!("skipping: seeded database not available");
        return Ok(());
    };

    let res = common::client().get(server.url("/api/auth/whoami")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["data"]["role"], "KindergartenAdmin");
    assert_eq!(body["data"]["subdomain"], "ornek");
    Ok(())
}
