mod common;

use anyhow::{Context, Result};
use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::{json, Value};
use tautan::store::{Link, LinkRepository};

const LANDING: &str = "https://survey.example.com/landing";
const FORM: &str = "https://forms.example.com/survey";

async fn create_respondent(app: &TestApp, token: &str, nama: &str, email: &str) -> Result<i64> {
    let (status, body) = app
        .call(
            Method::POST,
            "/responden",
            Some(token),
            Some(json!({ "nama": nama, "email": email })),
        )
        .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "create failed: {body}");
    body["data"]["id"].as_i64().context("missing respondent id")
}

async fn link_of(app: &TestApp, respondent_id: i64) -> Result<Link> {
    app.store
        .list_links()
        .await?
        .into_iter()
        .find(|link| link.respondent_id == respondent_id)
        .context("respondent has no link")
}

/// Respondents with landing and form URLs in place.
async fn prepared(app: &TestApp, admin: &str) -> Result<(i64, i64)> {
    let ani = create_respondent(app, admin, "Ani", "ani@example.com").await?;
    let budi = create_respondent(app, admin, "Budi Santoso", "budi@example.com").await?;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/link/set-landingPage-link",
            Some(admin),
            Some(json!({ "link": LANDING })),
        )
        .await?;
    anyhow::ensure!(status == StatusCode::OK, "landing failed: {body}");
    assert_eq!(body["data"]["count"], 2);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/link/set-formPage-link",
            Some(admin),
            Some(json!({ "link": FORM })),
        )
        .await?;
    anyhow::ensure!(status == StatusCode::OK, "form failed: {body}");
    assert_eq!(body["message"], "berhasil membuat tautan form");
    assert_eq!(body["data"]["count"], 2);

    Ok((ani, budi))
}

async fn get_form(app: &TestApp, raw: Option<&str>, session: Option<&str>) -> Result<(StatusCode, Value)> {
    let body = raw.map(|token| json!({ "token": token }));
    app.call(Method::POST, "/api/link/get-form", session, body)
        .await
}

#[tokio::test]
async fn landing_urls_embed_the_encrypted_token() -> Result<()> {
    let app = TestApp::new();
    let admin = app.login().await?;
    let (ani, _) = prepared(&app, &admin).await?;

    let link = link_of(&app, ani).await?;
    assert!(!link.used);
    assert_eq!(link.form_url.as_deref(), Some(FORM));
    assert_eq!(
        link.landing_url,
        Some(format!("{LANDING}?data={}", link.token))
    );

    let (status, body) = app
        .call(
            Method::POST,
            "/api/link/decrypt",
            Some(&admin),
            Some(json!({ "data": link.token })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Ani,ani@example.com");
    Ok(())
}

#[tokio::test]
async fn raw_token_is_single_use_and_session_reopens_the_form() -> Result<()> {
    let app = TestApp::new();
    let admin = app.login().await?;
    let (ani, _) = prepared(&app, &admin).await?;
    let raw = link_of(&app, ani).await?.token;

    let (status, body) = get_form(&app, Some(&raw), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["tautanForm"], FORM);
    let session = body["token"]
        .as_str()
        .context("first visit returns a session token")?
        .to_string();

    let link = link_of(&app, ani).await?;
    assert!(link.used);
    assert!(link.activated_at.is_some());

    let (status, body) = get_form(&app, Some(&raw), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, body) = get_form(&app, None, Some(&session)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tautanForm"], FORM);
    assert!(body.get("token").is_none());

    // A spent raw token next to a valid session still resolves through the session.
    let (status, _) = get_form(&app, Some(&raw), Some(&session)).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn get_form_rejects_missing_and_unknown_tokens() -> Result<()> {
    let app = TestApp::new();

    let (status, _) = get_form(&app, None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get_form(&app, Some("unknown-token"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get_form(&app, None, Some("not-a-session")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn regenerating_tokens_reopens_spent_links() -> Result<()> {
    let app = TestApp::new();
    let admin = app.login().await?;
    let (ani, _) = prepared(&app, &admin).await?;
    let first = link_of(&app, ani).await?.token;
    get_form(&app, Some(&first), None).await?;

    let (status, body) = app
        .call(Method::POST, "/api/link/generate-token", Some(&admin), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "token berhasil digenerate");
    assert_eq!(body["data"]["count"], 2);

    let link = link_of(&app, ani).await?;
    assert!(!link.used);
    assert!(link.activated_at.is_none());
    assert!(link.session_token.is_none());
    assert_ne!(link.token, first);

    let (status, _) = get_form(&app, Some(&link.token), None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn send_bulk_reports_each_recipient() -> Result<()> {
    let app = TestApp::new();
    let admin = app.login().await?;
    prepared(&app, &admin).await?;
    create_respondent(&app, &admin, "Pantul", "bounce@example.com").await?;
    app.call(
        Method::POST,
        "/api/link/set-landingPage-link",
        Some(&admin),
        Some(json!({ "link": LANDING })),
    )
    .await?;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/link/send-bulk",
            Some(&admin),
            Some(json!({
                "subject": "Undangan survei",
                "htmlTemplate": "<p>Halo {{nama}}</p><a href=\"{{link}}\">Mulai</a>",
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["sent"], 2);
    assert_eq!(
        body["message"],
        "Berhasil mengirim 2 email dari 3 total responden."
    );

    let results = body["results"].as_array().context("results array")?;
    assert_eq!(results.len(), 3);
    let bounced = results
        .iter()
        .find(|result| result["to"] == "bounce@example.com")
        .context("bounce result present")?;
    assert_eq!(bounced["success"], false);
    assert!(bounced["error"].is_string());

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 2);
    let budi = sent
        .iter()
        .find(|mail| mail.to == "budi@example.com")
        .context("mail to budi")?;
    let html = budi.html.as_deref().unwrap_or_default();
    assert!(html.starts_with("<p>Halo Budi Santoso</p>"));
    assert!(html.contains(&format!("{LANDING}?data=")));
    assert!(budi.text.is_none());
    Ok(())
}

#[tokio::test]
async fn send_bulk_validates_request() -> Result<()> {
    let app = TestApp::new();
    let admin = app.login().await?;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/link/send-bulk",
            Some(&admin),
            Some(json!({ "subject": "", "textTemplate": "{{link}}" })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Subjek tidak boleh kosong");

    let (status, _) = app
        .call(
            Method::POST,
            "/api/link/send-bulk",
            Some(&admin),
            Some(json!({ "subject": "Halo" })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing has a landing URL yet.
    let (status, _) = app
        .call(
            Method::POST,
            "/api/link/send-bulk",
            Some(&admin),
            Some(json!({ "subject": "Halo", "textTemplate": "{{link}}" })),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn explicit_link_creation() -> Result<()> {
    let app = TestApp::new();
    let admin = app.login().await?;
    let ani = create_respondent(&app, &admin, "Ani", "ani@example.com").await?;

    let request = json!({ "idResponden": ani, "tautanForm": FORM, "token": "manual-token" });
    let (status, body) = app
        .call(Method::POST, "/api/link/tautan", Some(&admin), Some(request.clone()))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Tautan berhasil dibuat");
    assert_eq!(body["data"]["token"], "manual-token");
    assert_eq!(body["data"]["used"], false);

    let (status, _) = app
        .call(Method::POST, "/api/link/tautan", Some(&admin), Some(request))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/link/tautan",
            Some(&admin),
            Some(json!({ "idResponden": 9999, "tautanForm": FORM, "token": "other" })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get_form(&app, Some("manual-token"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tautanForm"], FORM);
    Ok(())
}

#[tokio::test]
async fn cipher_endpoints() -> Result<()> {
    let app = TestApp::new();
    let admin = app.login().await?;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/link/encrypt",
            Some(&admin),
            Some(json!({ "data": "Citra,citra@example.com" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let sealed = body["result"].as_str().context("ciphertext")?.to_string();
    assert!(sealed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

    let (status, body) = app
        .call(
            Method::POST,
            "/api/link/decrypt",
            Some(&admin),
            Some(json!({ "data": sealed })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Citra,citra@example.com");

    let (status, body) = app
        .call(
            Method::POST,
            "/api/link/decrypt",
            Some(&admin),
            Some(json!({ "data": "AAAA" })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn base_urls_are_validated() -> Result<()> {
    let app = TestApp::new();
    let admin = app.login().await?;

    for uri in ["/api/link/set-landingPage-link", "/api/link/set-formPage-link"] {
        let (status, _) = app
            .call(Method::POST, uri, Some(&admin), Some(json!({ "link": "not a url" })))
            .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
    Ok(())
}

#[tokio::test]
async fn admin_routes_require_a_session() -> Result<()> {
    let app = TestApp::new();

    for uri in [
        "/api/link/tautan",
        "/api/link/generate-token",
        "/api/link/encrypt",
        "/api/link/decrypt",
        "/api/link/set-landingPage-link",
        "/api/link/set-formPage-link",
        "/api/link/send-bulk",
        "/api/email/send",
        "/api/email/send-bulk",
    ] {
        let (status, body) = app
            .call(Method::POST, uri, None, Some(json!({})))
            .await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["success"], false, "{uri}");
    }
    Ok(())
}

#[tokio::test]
async fn direct_email_endpoints() -> Result<()> {
    let app = TestApp::new();
    let admin = app.login().await?;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/email/send",
            Some(&admin),
            Some(json!({ "to": "dewi@example.com", "subject": "Halo", "text": "Apa kabar" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["messageId"].is_string());

    let (status, _) = app
        .call(
            Method::POST,
            "/api/email/send",
            Some(&admin),
            Some(json!({ "to": "dewi@example.com", "subject": "Halo" })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/email/send",
            Some(&admin),
            Some(json!({ "to": "bounce@example.com", "subject": "Halo", "text": "x" })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/email/send-bulk",
            Some(&admin),
            Some(json!({ "emails": [
                { "to": "eka@example.com", "subject": "Halo", "html": "<b>hi</b>" },
                { "to": "not-an-address", "subject": "Halo", "text": "hi" },
            ] })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().context("results array")?;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["to"], "eka@example.com");
    assert_eq!(results[0]["success"], true);
    assert_eq!(results[1]["success"], false);

    assert_eq!(app.mailer.sent().len(), 2);
    Ok(())
}
