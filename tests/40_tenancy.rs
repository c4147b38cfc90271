mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn teacher_cannot_reach_admin_only_screens() -> Result<()> {
    let server = common::ensure_server().await?;
    let Some(token) = common::login(server, "teacher@ornek.com", "teacher123", Some("ornek")).await? else {
        eprintln!("skipping: seeded database not available");
        return Ok(());
    };

    let res = common::client().get(server.url("/api/admin/settings")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = common::client().get(server.url("/api/admin/events")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = common::client().get(server.url("/api/root/users")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn superadmin_must_pick_a_kindergarten() -> Result<()> {
    let server = common::ensure_server().await?;
    let Some(token) = common::login(server, "superadmin@system.com", "SuperAdmin123!", None).await? else {
        eprintln!("skipping: seeded database not available");
        return Ok(());
    };

    let res = common::client().get(server.url("/api/admin/programs")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = common::client()
        .get(server.url("/api/admin/programs"))
        .bearer_auth(&token)
        .header("x-kindergarten-id", "not-a-number")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = common::client().get(server.url("/api/root/kindergartens")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let ornek = body["data"]
        .as_array()
        .and_then(|list| list.iter().find(|k| k["subdomain"] == "ornek"))
        .and_then(|k| k["id"].as_i64());

    if let Some(id) = ornek {
        let res = common::client()
            .get(server.url("/api/admin/programs"))
            .bearer_auth(&token)
            .header("x-kindergarten-id", id.to_string())
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::OK);
    }
    Ok(())
}

#[tokio::test]
async fn admin_content_stays_inside_its_kindergarten() -> Result<()> {
    let server = common::ensure_server().await?;
    let Some(admin) = common::login(server, "admin@ornek.com", "admin123", Some("ornek")).await? else {
        eprintln!("skipping: seeded database not available");
        return Ok(());
    };
    let Some(root) = common::login(server, "superadmin@system.com", "SuperAdmin123!", None).await? else {
        eprintln!("skipping: seeded database not available");
        return Ok(());
    };

    let res = common::client()
        .post(server.url("/api/admin/announcements"))
        .bearer_auth(&admin)
        .json(&json!({ "title": "Isolation check", "description": "Visible to ornek only", "announcement_date": "2026-10-18" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await?;
    let id = created["data"]["id"].as_i64().unwrap_or_default();

    // A second kindergarten, created just for this check
    let subdomain = format!("iso{}", std::process::id());
    let res = common::client()
        .post(server.url("/api/root/kindergartens"))
        .bearer_auth(&root)
        .json(&json!({ "name": "Isolation Kreş", "subdomain": subdomain }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let other: Value = res.json().await?;
    let other_id = other["data"]["id"].as_i64().unwrap_or_default();

    let res = common::client()
        .get(server.url(&format!("/api/admin/announcements/{}", id)))
        .bearer_auth(&root)
        .header("x-kindergarten-id", other_id.to_string())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = common::client()
        .delete(server.url(&format!("/api/admin/announcements/{}", id)))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = common::client()
        .delete(server.url(&format!("/api/root/kindergartens/{}", other_id)))
        .bearer_auth(&root)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}
