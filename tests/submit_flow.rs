use groq_agent::controller::{self, Outcome};
use groq_agent::{ChatRole, ChatState, ChatTurn, GroqClient, GroqError, RequestStatus, SubmitError};
use serde_json::{json, Value};
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn server_replying(body: ResponseTemplate, expected_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(body)
        .expect(expected_calls)
        .mount(&server)
        .await;
    server
}

async fn server_with_json(payload: Value) -> MockServer {
    server_replying(ResponseTemplate::new(200).set_body_json(payload), 1).await
}

fn state(key: &str, prompt: &str) -> ChatState {
    let mut state = ChatState::new(key);
    state.set_prompt(prompt);
    state
}

#[tokio::test]
async fn reply_appends_user_then_assistant() {
    let server = server_with_json(json!({"choices": [{"message": {"content": "X"}}]})).await;
    let client = GroqClient::with_endpoint(&server.uri());
    let mut state = state("gsk", "  what is X?\n");

    let outcome = controller::submit(&mut state, &client).await;

    assert_eq!(outcome, Outcome::Replied);
    assert_eq!(
        state.turns(),
        &[ChatTurn::user("what is X?"), ChatTurn::assistant("X")]
    );
    assert_eq!(state.status(), RequestStatus::Idle);
    assert_eq!(state.last_error(), None);
    assert_eq!(state.prompt(), "");
}

#[tokio::test]
async fn blank_prompt_makes_no_call() {
    let server = server_replying(ResponseTemplate::new(200), 0).await;
    let client = GroqClient::with_endpoint(&server.uri());
    let mut state = state("gsk", " \t ");
    state.set_error("previous");

    assert_eq!(controller::submit(&mut state, &client).await, Outcome::Ignored);
    assert!(state.turns().is_empty());
    assert_eq!(state.last_error(), Some("previous"));
}

#[tokio::test]
async fn missing_key_makes_no_call() {
    let server = server_replying(ResponseTemplate::new(200), 0).await;
    let client = GroqClient::with_endpoint(&server.uri());
    let mut state = state("", "hello");

    let outcome = controller::submit(&mut state, &client).await;

    assert_eq!(outcome, Outcome::Failed(SubmitError::MissingKey));
    assert!(state.turns().is_empty());
    assert_eq!(
        state.last_error(),
        Some("Missing Groq API key. Paste it in the box or use a backend proxy.")
    );
}

#[tokio::test]
async fn rejected_request_keeps_only_user_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer wrong"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .expect(1)
        .mount(&server)
        .await;
    let client = GroqClient::with_endpoint(&server.uri());
    let mut state = state("wrong", "hi");

    let outcome = controller::submit(&mut state, &client).await;

    assert!(matches!(outcome, Outcome::Failed(SubmitError::Request(_))));
    assert_eq!(state.turns().len(), 1);
    assert_eq!(state.turns()[0].role, ChatRole::User);
    let error = state.last_error().unwrap();
    assert!(error.contains("401"));
    assert!(error.contains("invalid key"));
    assert_eq!(state.status(), RequestStatus::Idle);
}

#[tokio::test]
async fn transport_failure_keeps_only_user_turn() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = GroqClient::with_endpoint(&format!("http://{}/openai/v1/chat/completions", addr));
    let mut state = state("gsk", "anyone there?");

    let outcome = controller::submit(&mut state, &client).await;

    assert!(matches!(
        outcome,
        Outcome::Failed(SubmitError::Request(GroqError::Network(_)))
    ));
    assert_eq!(state.turns(), &[ChatTurn::user("anyone there?")]);
    assert!(!state.last_error().unwrap().is_empty());
    assert_eq!(state.status(), RequestStatus::Idle);
}

#[tokio::test]
async fn content_fragments_are_joined() {
    let server = server_with_json(json!({"choices": [{"message": {"content": [
        {"type": "text", "text": "a"},
        {"type": "text", "text": "b"}
    ]}}]}))
    .await;
    let client = GroqClient::with_endpoint(&server.uri());
    let mut state = state("gsk", "split");

    controller::submit(&mut state, &client).await;

    assert_eq!(state.turns()[1], ChatTurn::assistant("a\nb"));
}

#[tokio::test]
async fn unknown_shape_shows_whole_payload() {
    let payload = json!({"object": "error", "detail": {"code": 7}});
    let server = server_with_json(payload.clone()).await;
    let client = GroqClient::with_endpoint(&server.uri());
    let mut state = state("gsk", "odd");

    let outcome = controller::submit(&mut state, &client).await;

    assert_eq!(outcome, Outcome::Replied);
    assert_eq!(state.last_error(), None);
    assert_eq!(state.turns()[1].content, payload.to_string());
}

#[tokio::test]
async fn history_is_not_resent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "ok"}}]
        })))
        .expect(2)
        .mount(&server)
        .await;
    let client = GroqClient::with_endpoint(&server.uri());
    let mut state = state("gsk", "first");

    controller::submit(&mut state, &client).await;
    state.set_prompt("second");
    controller::submit(&mut state, &client).await;

    let requests = server.received_requests().await.unwrap();
    let last: Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(last["messages"].as_array().unwrap().len(), 1);
    assert_eq!(last["messages"][0]["content"][0]["text"], "second");
    assert_eq!(state.turns().len(), 4);
}

#[tokio::test]
async fn demo_injection_makes_no_call() {
    let server = server_replying(ResponseTemplate::new(200), 0).await;
    let mut state = ChatState::new("gsk");
    state.append_turn(ChatTurn::user("earlier"));

    state.inject_demo_turns();

    assert_eq!(state.turns().len(), 5);
    assert_eq!(state.turns()[1].content, "Explain gradient descent in simple terms.");
    assert_eq!(state.turns()[4].role, ChatRole::Assistant);
    drop(server);
}
