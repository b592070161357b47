mod common;

use anyhow::Result;
use axum::http::Method;
use image::{Rgba, RgbaImage};
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{stack, Canned, TestGateway};
use requisition_gateway::signature::encode_png;

#[tokio::test]
async fn health_names_the_backend() -> Result<()> {
    let (backend, gateway) = stack(vec![]).await?;

    let res = reqwest::get(gateway.url("/health")).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["backend"], backend.base_url.as_str());
    // liveness never touches the backend
    assert!(backend.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn json_is_relayed_with_status_and_credentials() -> Result<()> {
    let requisition = json!({ "id": 42, "status": "SUBMITTED", "requisitionFrom": "IT" });
    let (backend, gateway) = stack(vec![(
        Method::GET,
        "/api/v1/requisitions/find/42",
        Canned::json(200, requisition.clone()),
    )])
    .await?;

    let res = reqwest::Client::new()
        .get(gateway.url("/api/requisitions/42"))
        .header("Authorization", "Bearer abc")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?, requisition);

    let seen = backend.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].line(), "GET /api/v1/requisitions/find/42");
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer abc"));
    Ok(())
}

#[tokio::test]
async fn missing_credentials_are_not_invented() -> Result<()> {
    let (backend, gateway) = stack(vec![(
        Method::GET,
        "/api/v1/approvals/find/5",
        Canned::json(200, json!({ "id": 5 })),
    )])
    .await?;

    reqwest::get(gateway.url("/api/approvals/5")).await?;
    assert_eq!(backend.requests()[0].authorization, None);
    Ok(())
}

#[tokio::test]
async fn backend_errors_pass_through() -> Result<()> {
    let (_backend, gateway) = stack(vec![(
        Method::GET,
        "/api/v1/requisitions/find/9",
        Canned::text(404, "Requisition not found"),
    )])
    .await?;

    let res = reqwest::get(gateway.url("/api/requisitions/9")).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await?, "Requisition not found");
    Ok(())
}

#[tokio::test]
async fn path_values_stay_encoded() -> Result<()> {
    let (backend, gateway) = stack(vec![(
        Method::GET,
        "/api/v1/requisitions/by-status/HOD%20REVIEW",
        Canned::json(200, json!([])),
    )])
    .await?;

    let res = reqwest::get(gateway.url("/api/requisitions/by-status?status=HOD%20REVIEW")).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(backend.lines(), vec!["GET /api/v1/requisitions/by-status/HOD%20REVIEW"]);
    Ok(())
}

#[tokio::test]
async fn json_writes_forward_the_body() -> Result<()> {
    let (backend, gateway) = stack(vec![(
        Method::POST,
        "/api/v1/requisitions/create",
        Canned::json(201, json!({ "id": 77 })),
    )])
    .await?;

    let res = reqwest::Client::new()
        .post(gateway.url("/api/requisitions/create"))
        .json(&json!({ "requisitionFrom": "IT", "contractPrice": 1200 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.json::<Value>().await?["id"], 77);

    let seen = &backend.requests()[0];
    assert_eq!(seen.content_type.as_deref(), Some("application/json"));
    assert_eq!(seen.json()["contractPrice"], 1200);
    Ok(())
}

#[tokio::test]
async fn signature_bytes_are_relayed_verbatim() -> Result<()> {
    let bytes = vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3];
    let (_backend, gateway) = stack(vec![(
        Method::GET,
        "/api/v1/signature/file/3",
        Canned::bytes("image/png", bytes.clone()),
    )])
    .await?;

    let res = reqwest::get(gateway.url("/api/signature/file/3")).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(res.bytes().await?.to_vec(), bytes);
    Ok(())
}

#[tokio::test]
async fn signature_path_is_plain_text() -> Result<()> {
    let (backend, gateway) = stack(vec![(
        Method::GET,
        "/api/v1/signature/user/email/jo%40example.com",
        Canned::json(200, json!("/api/v1/signature/file/3")),
    )])
    .await?;

    let res = reqwest::get(gateway.url("/api/signature/user/email?email=jo@example.com")).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()["content-type"].to_str()?.starts_with("text/plain"));
    assert_eq!(res.text().await?, "\"/api/v1/signature/file/3\"");
    assert_eq!(backend.requests().len(), 1);
    Ok(())
}

#[tokio::test]
async fn normalized_signature_whitens_the_background() -> Result<()> {
    let mut img = RgbaImage::from_pixel(2, 1, Rgba([240, 240, 240, 255]));
    img.put_pixel(1, 0, Rgba([10, 10, 10, 255]));
    let (_backend, gateway) = stack(vec![(
        Method::GET,
        "/api/v1/signature/file/3",
        Canned::bytes("image/png", encode_png(&img)?),
    )])
    .await?;

    let res = reqwest::get(gateway.url("/api/signature/file/3/normalized")).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let out = image::load_from_memory(&res.bytes().await?)?.to_rgba8();
    assert_eq!(out.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    assert_eq!(out.get_pixel(1, 0), &Rgba([10, 10, 10, 255]));
    Ok(())
}

#[tokio::test]
async fn unreachable_backend_is_a_proxy_error() -> Result<()> {
    // Nothing is listening on the picked port
    let port = portpicker::pick_unused_port().expect("free port");
    let gateway = TestGateway::start(&format!("http://127.0.0.1:{}", port)).await?;

    let res = reqwest::get(gateway.url("/api/approvals/by-status/LEGAL_APPROVED")).await?;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(res.json::<Value>().await?["message"], "Proxy error");
    Ok(())
}
