//! HTTP-level tests: requests go through the axum router via `oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use kgscope_infer::{Predictor, Result as InferResult, ScoreOracle, Vocabulary};
use kgscope_serve::{router, AppState};
use tower::ServiceExt;

/// Scores entity `e` as `0.9 - 0.2 * e`, independent of the query.
struct LinearOracle {
    entities: usize,
}

impl ScoreOracle for LinearOracle {
    fn num_entities(&self) -> usize {
        self.entities
    }

    fn num_relations(&self) -> usize {
        1
    }

    fn score_all(&self, _subject: usize, _predicate: usize) -> InferResult<Vec<f32>> {
        Ok((0..self.entities).map(|e| 0.9 - 0.2 * e as f32).collect())
    }
}

fn state() -> AppState {
    let predictor = Predictor::new(
        Vocabulary::from_names(["alice", "bob", "carol"]).unwrap(),
        Vocabulary::from_names(["knows"]).unwrap(),
        Arc::new(LinearOracle { entities: 3 }),
        2,
    )
    .unwrap();
    AppState::new(Arc::new(predictor), "DistMult Deployment")
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn form_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn index_serves_form() {
    let response = router(state())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("<title>DistMult Deployment</title>"));
    assert!(html.contains("name=\"subject\""));
    assert!(html.contains("name=\"predicate\""));
    assert!(html.contains("name=\"object\""));
    assert!(html.contains("name=\"random\""));
}

#[tokio::test]
async fn form_ranks_top_k() {
    let response = router(state())
        .oneshot(form_request("subject=alice&predicate=knows&object="))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("<p id=\"triple\">( alice, knows, ? )</p>"));
    assert!(html.contains("<td>alice</td><td class=\"score\">0.900</td>"));
    assert!(html.contains("<td>bob</td><td class=\"score\">0.700</td>"));
    // top_k = 2
    assert!(!html.contains("<td>carol</td>"));
}

#[tokio::test]
async fn form_scores_single_triple() {
    let response = router(state())
        .oneshot(form_request("subject=alice&predicate=knows&object=carol"))
        .await
        .unwrap();
    let html = body_text(response).await;
    assert!(html.contains("( alice, knows, carol )"));
    assert!(html.contains("<td>carol</td><td class=\"score\">0.500</td>"));
}

#[tokio::test]
async fn unknown_name_is_reported_not_fatal() {
    let response = router(state())
        .oneshot(form_request("subject=alice&predicate=likes&object="))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Failed at mapping the predicate"));
    assert!(html.contains("id=\"results\""));
    assert!(!html.contains("<td>"));
}

#[tokio::test]
async fn random_checkbox_ignores_text() {
    let response = router(state())
        .oneshot(form_request("subject=nobody&predicate=nothing&object=&random=on"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(!html.contains("Failed at mapping"));
    assert!(html.contains(", knows, ? )</p>"));
    assert!(html.contains("value=\"on\" checked"));
}

#[tokio::test]
async fn json_api_round_trip() {
    let response = router(state())
        .oneshot(json_request(serde_json::json!({
            "subject": "bob",
            "predicate": "knows",
            "top_k": 3
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["triple"], "( bob, knows, ? )");
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["entity"], "alice");
    assert_eq!(results[0]["rank"], 1);
    assert_eq!(results[2]["entity"], "carol");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn json_api_unknown_object() {
    let response = router(state())
        .oneshot(json_request(serde_json::json!({
            "subject": "alice",
            "predicate": "knows",
            "object": "zed"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["triple"], "Failed at mapping the object");
    assert_eq!(body["results"], serde_json::json!([]));
    assert!(body["error"].as_str().unwrap().contains("zed"));
}
