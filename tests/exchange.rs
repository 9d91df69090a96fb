use casecards::api::{GeneratorClient, HealthState};
use casecards::conversation::{ConversationController, ConversationState, ExchangeOutcome, SendError};
use casecards::format::format;
use casecards::render::render;
use casecards::surface::{RecordingSurface, Role, SurfaceUpdate};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn event_stream(payloads: &[&str]) -> String {
    payloads.iter().map(|p| format!("data: {p}\n\n")).collect()
}

async fn server_streaming(body: String) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;
    server
}

fn client_for(server: &MockServer) -> GeneratorClient {
    tokio_test::assert_ok!(GeneratorClient::new(&server.uri(), 5))
}

#[tokio::test]
async fn test_exchange_renders_summary_and_card() {
    let server = server_streaming(event_stream(&[
        "Summary line",
        "---",
        "**Test Case ID:** TC-1 ",
        "Steps: do X",
        "[DONE]",
    ]))
    .await;
    let client = client_for(&server);
    let mut controller = ConversationController::new(5000);
    let mut surface = RecordingSurface::new();

    let outcome = controller.run(&client, "Login page", &mut surface).await;
    assert_eq!(outcome, Ok(ExchangeOutcome::Completed));
    assert_eq!(controller.state(), ConversationState::Idle);

    assert_eq!(
        &surface.updates[..4],
        &[
            SurfaceUpdate::Message(Role::User, "Login page".to_string()),
            SurfaceUpdate::ShowPlaceholder,
            SurfaceUpdate::RemovePlaceholder,
            SurfaceUpdate::Message(Role::Assistant, String::new()),
        ]
    );

    let document = surface.last_document().unwrap();
    assert_eq!(document.summary, "Summary line");
    assert_eq!(document.records.len(), 1);
    assert!(document.records[0].body.contains("TC-1"));
    assert!(document.records[0].body.contains("do X"));
    assert!(surface.messages(Role::Error).is_empty());
}

#[tokio::test]
async fn test_plain_text_never_shows_cards() {
    let server = server_streaming(event_stream(&["Hello ", "world", "[DONE]"])).await;
    let client = client_for(&server);
    let mut controller = ConversationController::new(5000);
    let mut surface = RecordingSurface::new();

    controller.run(&client, "hi", &mut surface).await.unwrap();

    for update in &surface.updates {
        if let SurfaceUpdate::Document(document) = update {
            assert!(!document.is_carded());
        }
    }
    let document = surface.last_document().unwrap();
    assert_eq!(document.markup(), render("Hello world"));
    assert_eq!(document.markup(), format("Hello world"));
}

#[tokio::test]
async fn test_in_band_failure_is_reported() {
    let server = server_streaming(event_stream(&["[ERROR] backend down"])).await;
    let client = client_for(&server);
    let mut controller = ConversationController::new(5000);
    let mut surface = RecordingSurface::new();

    let outcome = controller.run(&client, "anything", &mut surface).await;
    assert_eq!(outcome, Ok(ExchangeOutcome::Failed("backend down".to_string())));
    assert!(surface.last_document().is_none());
    assert_eq!(surface.messages(Role::Error), vec!["Error: backend down"]);
    assert_eq!(controller.state(), ConversationState::Idle);
}

#[tokio::test]
async fn test_failure_after_fragments_keeps_partial_document() {
    let server = server_streaming(event_stream(&["Partial answer", "[ERROR] model crashed"])).await;
    let client = client_for(&server);
    let mut controller = ConversationController::new(5000);
    let mut surface = RecordingSurface::new();

    let outcome = controller.run(&client, "anything", &mut surface).await;
    assert_eq!(outcome, Ok(ExchangeOutcome::Failed("model crashed".to_string())));
    assert_eq!(surface.last_document().unwrap().summary, "Partial answer");
}

#[tokio::test]
async fn test_error_status_uses_error_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate/stream"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"success": false, "error": "Input cannot be empty"})),
        )
        .mount(&server)
        .await;
    let client = client_for(&server);
    let mut controller = ConversationController::new(5000);
    let mut surface = RecordingSurface::new();

    let outcome = controller.run(&client, "x", &mut surface).await;
    assert_eq!(
        outcome,
        Ok(ExchangeOutcome::Failed("Input cannot be empty".to_string()))
    );
    assert_eq!(
        surface.updates,
        vec![
            SurfaceUpdate::Message(Role::User, "x".to_string()),
            SurfaceUpdate::ShowPlaceholder,
            SurfaceUpdate::RemovePlaceholder,
            SurfaceUpdate::Message(Role::Error, "Error: Input cannot be empty".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_error_status_without_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate/stream"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;
    let client = client_for(&server);
    let mut controller = ConversationController::new(5000);
    let mut surface = RecordingSurface::new();

    let outcome = controller.run(&client, "x", &mut surface).await;
    assert_eq!(outcome, Ok(ExchangeOutcome::Failed("Server error".to_string())));
}

#[tokio::test]
async fn test_request_carries_trimmed_input() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate/stream"))
        .and(body_json(json!({"user_input": "Checkout flow"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(event_stream(&["ok", "[DONE]"]), "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);
    let mut controller = ConversationController::new(5000);
    let mut surface = RecordingSurface::new();

    let outcome = controller.run(&client, "  Checkout flow \n", &mut surface).await;
    assert_eq!(outcome, Ok(ExchangeOutcome::Completed));
}

#[tokio::test]
async fn test_busy_controller_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let client = client_for(&server);
    let mut controller = ConversationController::new(5000);
    let mut surface = RecordingSurface::new();
    controller.submit("first", &mut surface).unwrap();
    let before = surface.updates.clone();

    let outcome = controller.run(&client, "second", &mut surface).await;
    assert_eq!(outcome, Err(SendError::Busy));
    assert_eq!(surface.updates, before);
    assert_eq!(controller.state(), ConversationState::Generating);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_failure() {
    let client = tokio_test::assert_ok!(GeneratorClient::new("http://127.0.0.1:9", 1));
    let mut controller = ConversationController::new(5000);
    let mut surface = RecordingSurface::new();

    let outcome = controller.run(&client, "x", &mut surface).await;
    match outcome {
        Ok(ExchangeOutcome::Failed(message)) => assert!(message.starts_with("Cannot reach server")),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(surface.last_document().is_none());
}

#[tokio::test]
async fn test_health_states() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "healthy": false,
            "message": "Model 'llama3.2' not found",
            "models": []
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "healthy": true,
            "message": "Model 'llama3.2' is ready",
            "models": ["llama3.2:latest"]
        })))
        .mount(&server)
        .await;
    let client = client_for(&server);

    let first = client.health_check().await;
    assert_eq!(first.state, HealthState::ModelUnavailable);
    assert_eq!(first.detail, "Model 'llama3.2' not found");

    let second = client.health_check().await;
    assert_eq!(second.state, HealthState::Connected);
    assert_eq!(second.label(), "Connected");
}

#[tokio::test]
async fn test_health_garbage_body_is_disconnected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    let client = client_for(&server);

    assert_eq!(client.health_check().await.state, HealthState::Disconnected);
}
