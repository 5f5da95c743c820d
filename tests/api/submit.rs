use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{spawn_collecting_app, spawn_composing_app};

#[tokio::test]
async fn submit_posts_the_assembled_payload_to_the_delivery_backend() {
    // Arrange
    let app = spawn_composing_app().await;

    Mock::given(path("/api/send-email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.dispatch_server)
        .await;

    // Act
    let response = app.post_submit().await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let request = &app.dispatch_server.received_requests().await.unwrap()[0];
    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body["recipients"], serde_json::json!([{ "email": "a@b.com" }]));
    assert_eq!(body["content"], "hello there");
}

#[tokio::test]
async fn a_successful_submit_resets_the_session() {
    // Arrange
    let app = spawn_composing_app().await;

    Mock::given(path("/api/send-email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.dispatch_server)
        .await;

    // Act
    app.post_submit().await;

    // Assert
    let snapshot = app.get_campaign().await;
    assert_eq!(snapshot["step"], 1);
    assert!(snapshot["method"].is_null());
    assert_eq!(snapshot["recipients"].as_array().unwrap().len(), 0);
    assert_eq!(snapshot["content"], "");
}

#[tokio::test]
async fn a_failed_submit_returns_a_502_and_preserves_the_session() {
    // Arrange
    let app = spawn_composing_app().await;

    Mock::given(path("/api/send-email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.dispatch_server)
        .await;

    // Act
    let response = app.post_submit().await;

    // Assert
    assert_eq!(502, response.status().as_u16());
    let snapshot = app.get_campaign().await;
    assert_eq!(snapshot["step"], 3);
    assert_eq!(snapshot["recipients"].as_array().unwrap().len(), 1);
    assert_eq!(snapshot["content"], "hello there");
}

#[tokio::test]
async fn the_operator_can_retry_after_a_failed_submit() {
    // Arrange
    let app = spawn_composing_app().await;

    // The backend fails once, then recovers.
    Mock::given(path("/api/send-email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&app.dispatch_server)
        .await;
    Mock::given(path("/api/send-email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.dispatch_server)
        .await;

    // Act
    let first = app.post_submit().await;
    let second = app.post_submit().await;

    // Assert
    assert_eq!(502, first.status().as_u16());
    assert_eq!(200, second.status().as_u16());
    assert_eq!(app.get_campaign().await["step"], 1);
}

#[tokio::test]
async fn submit_outside_the_composition_step_returns_a_409() {
    // Arrange
    let app = spawn_collecting_app("manual").await;

    // Act
    let response = app.post_submit().await;

    // Assert
    assert_eq!(409, response.status().as_u16());
    assert_eq!(
        app.dispatch_server.received_requests().await.unwrap().len(),
        0
    );
}

#[tokio::test]
async fn an_abandoned_submission_does_not_jam_the_gate() {
    // Arrange
    let app = spawn_composing_app().await;

    // The backend is slow once, then recovers.
    Mock::given(path("/api/send-email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .up_to_n_times(1)
        .mount(&app.dispatch_server)
        .await;
    Mock::given(path("/api/send-email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.dispatch_server)
        .await;

    // Act
    // The operator's client gives up while the dispatch is still pending,
    // dropping the request mid-flight on the server.
    let impatient = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let abandoned = impatient
        .post(format!("{}/api/campaign/submit", app.address))
        .send()
        .await;
    assert!(abandoned.is_err());

    // Give the server a moment to tear the aborted request down.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let response = app.post_submit().await;

    // Assert
    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn a_second_trigger_while_a_submission_is_in_flight_is_rejected() {
    // Arrange
    let app = spawn_composing_app().await;

    // Slow backend so the second trigger lands while the first request is
    // still outstanding. The mock verifies only one payload was dispatched.
    Mock::given(path("/api/send-email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .expect(1)
        .mount(&app.dispatch_server)
        .await;

    // Act
    let first = app.post_submit();
    let second = async {
        // Give the first request a head start to the server.
        tokio::time::sleep(Duration::from_millis(100)).await;
        app.post_submit().await
    };
    let (first, second) = tokio::join!(first, second);

    // Assert
    assert_eq!(200, first.status().as_u16());
    assert_eq!(409, second.status().as_u16());
}
