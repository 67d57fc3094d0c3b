//! Router-level tests driven through `tower::ServiceExt::oneshot`.

mod common;

use astrometrics::server::{routes, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

const BOUNDARY: &str = "astrometrics-test-boundary";

fn app() -> Router {
    routes::router(AppState::new())
}

fn multipart_body(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(files: &[(&str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/layers")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(files)))
        .expect("request should build")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should build")
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should collect");
    serde_json::from_slice(&bytes).expect("body should be json")
}

const STATION_GEOJSON: &[u8] = br#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":{"type":"Point","coordinates":[139.7,35.6]},"properties":{"name":"station"}}]}"#;

#[tokio::test]
async fn health_reports_service_and_version() {
    let response = app()
        .oneshot(get("/api/health"))
        .await
        .expect("request should route");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = body_json(response).await;
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["service"], "astrometrics-api");
}

#[tokio::test]
async fn upload_geojson_then_list_layers() {
    let app = app();
    let response = app
        .clone()
        .oneshot(upload_request(&[("station.geojson", STATION_GEOJSON)]))
        .await
        .expect("upload should route");
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["registered_keys"][0], "station.geojson");
    assert_eq!(report["registry_size"], 1);

    let response = app
        .clone()
        .oneshot(get("/api/layers"))
        .await
        .expect("list should route");
    let payload = body_json(response).await;
    let layer = &payload["layers"][0];
    assert_eq!(layer["key"], "station.geojson");
    assert_eq!(layer["is_converted"], false);
    assert_eq!(layer["visible"], true);
    assert_eq!(layer["feature_count"], 1);
}

#[tokio::test]
async fn upload_pair_registers_converted_layer() {
    let app = app();
    let shp = common::shp_points(&[(139.7, 35.6)]);
    let dbf = common::dbf_names(&["fire-1"]);
    let response = app
        .clone()
        .oneshot(upload_request(&[("fire.shp", &shp), ("fire.dbf", &dbf)]))
        .await
        .expect("upload should route");
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["completed_pairs"][0], "fire");
    assert_eq!(report["registered_keys"][0], "fire.shp,fire.dbf");

    let response = app
        .clone()
        .oneshot(get("/api/layers/fire.shp,fire.dbf"))
        .await
        .expect("get should route");
    assert_eq!(response.status(), StatusCode::OK);
    let document = body_json(response).await;
    assert_eq!(document["type"], "FeatureCollection");
    assert_eq!(document["features"][0]["properties"]["NAME"], "fire-1");
}

#[tokio::test]
async fn visibility_toggle_filters_the_map_feed() {
    let app = app();
    app.clone()
        .oneshot(upload_request(&[("station.geojson", STATION_GEOJSON)]))
        .await
        .expect("upload should route");

    let response = app
        .clone()
        .oneshot(get("/api/map"))
        .await
        .expect("map should route");
    let combined = body_json(response).await;
    assert_eq!(combined["features"].as_array().map(Vec::len), Some(1));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/layers/station.geojson/visibility")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"visible":false}"#))
                .expect("request should build"),
        )
        .await
        .expect("toggle should route");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/api/map"))
        .await
        .expect("map should route");
    let combined = body_json(response).await;
    assert_eq!(combined["features"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn export_names_the_attachment_after_the_geometry_file() {
    let app = app();
    let shp = common::shp_points(&[(1.0, 2.0)]);
    let dbf = common::dbf_names(&["a"]);
    app.clone()
        .oneshot(upload_request(&[("fire.shp", &shp), ("fire.dbf", &dbf)]))
        .await
        .expect("upload should route");

    let response = app
        .clone()
        .oneshot(get("/api/layers/fire.shp,fire.dbf/export"))
        .await
        .expect("export should route");
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert_eq!(disposition, "attachment; filename=\"fire.geojson\"");
    let document = body_json(response).await;
    assert_eq!(document["type"], "FeatureCollection");
}

#[tokio::test]
async fn attributes_csv_exports_the_table() {
    let app = app();
    let shp = common::shp_points(&[(1.0, 2.0), (3.0, 4.0)]);
    let dbf = common::dbf_names(&["first", "second"]);
    app.clone()
        .oneshot(upload_request(&[("fire.shp", &shp), ("fire.dbf", &dbf)]))
        .await
        .expect("upload should route");

    let response = app
        .clone()
        .oneshot(get("/api/layers/fire.shp,fire.dbf/attributes.csv"))
        .await
        .expect("csv should route");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should collect");
    let text = String::from_utf8(bytes.to_vec()).expect("csv should be utf-8");
    assert_eq!(text, "NAME\nfirst\nsecond\n");
}

#[tokio::test]
async fn lone_geometry_part_waits_then_force_decodes() {
    let app = app();
    let shp = common::shp_points(&[(9.0, 9.0)]);
    let response = app
        .clone()
        .oneshot(upload_request(&[("x.shp", &shp)]))
        .await
        .expect("upload should route");
    let report = body_json(response).await;
    assert_eq!(report["registry_size"], 0);
    assert_eq!(report["pending"][0]["base_name"], "x");
    assert_eq!(report["pending"][0]["role"], "geometry");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/pending/x/decode")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("decode should route");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = body_json(response).await;
    assert_eq!(payload["key"], "x.shp");

    let response = app
        .clone()
        .oneshot(get("/api/pending"))
        .await
        .expect("pending should route");
    let payload = body_json(response).await;
    assert_eq!(payload["pending"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn malformed_upload_fails_without_registering_anything() {
    let app = app();
    let shp = common::shp_points(&[(1.0, 1.0)]);
    let dbf = common::dbf_names(&["good"]);
    let response = app
        .clone()
        .oneshot(upload_request(&[
            ("broken.json", b"{oops" as &[u8]),
            ("good.shp", &shp),
            ("good.dbf", &dbf),
        ]))
        .await
        .expect("upload should route");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = body_json(response).await;
    assert_eq!(payload["status"], "error");
    assert!(payload["message"]
        .as_str()
        .unwrap_or_default()
        .contains("broken.json"));

    let response = app
        .clone()
        .oneshot(get("/api/layers"))
        .await
        .expect("list should route");
    let payload = body_json(response).await;
    assert_eq!(payload["layers"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn unknown_layer_and_pending_base_return_404() {
    let app = app();
    let response = app
        .clone()
        .oneshot(get("/api/layers/ghost.geojson"))
        .await
        .expect("get should route");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/pending/ghost/decode")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("decode should route");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
