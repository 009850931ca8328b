//! Integration tests for the classroom WebSocket protocol.
//!
//! These tests run the real server over TCP and drive it with raw JSON
//! frames: registration, the poll lifecycle, summary fan-out, and the
//! replay that late-joining students receive.

use std::net::TcpListener;
use std::time::Duration;

use classroom_coordinator::{create_router, AppState, Config};
use futures::SinkExt;
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::{timeout, Instant};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tungstenite::Message;

/// Helper to find an available port for testing.
fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Helper type for WebSocket client
type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Spawns the test server and returns the WebSocket URL.
async fn spawn_test_server(state: AppState) -> (String, tokio::task::JoinHandle<()>) {
    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");
    let ws_url = format!("ws://{addr}/ws");

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    (ws_url, handle)
}

/// Connects a WebSocket client to the given URL.
async fn connect_client(url: &str) -> WsClient {
    let (ws_stream, _) = connect_async(url)
        .await
        .expect("Failed to connect to WebSocket");
    ws_stream
}

/// Sends one JSON frame over the socket.
async fn send_frame(client: &mut WsClient, frame: &Value) {
    client
        .send(Message::Text(frame.to_string()))
        .await
        .expect("Failed to send frame");
}

/// Receives the next JSON frame from the WebSocket.
/// Automatically handles ping frames by responding with pong.
async fn receive_frame(client: &mut WsClient) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timeout waiting for frame")
            .expect("Stream ended")
            .expect("WebSocket error");

        match msg {
            Message::Text(text) => {
                return serde_json::from_str(&text).expect("Failed to parse frame");
            }
            Message::Ping(data) => {
                // Respond to ping and continue waiting for a text frame
                client
                    .send(Message::Pong(data))
                    .await
                    .expect("Failed to send pong");
            }
            Message::Pong(_) => {
                // Ignore pong messages, continue waiting
            }
            other => panic!("Expected text frame, got: {other:?}"),
        }
    }
}

/// Asserts that no text frame arrives within a short window.
/// Heartbeat pings are answered and skipped.
async fn assert_no_text_frame(client: &mut WsClient) {
    let deadline = Instant::now() + Duration::from_millis(200);
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let Ok(msg) = timeout(remaining, client.next()).await else {
            return;
        };

        match msg {
            Some(Ok(Message::Text(text))) => panic!("Expected silence, got frame: {text}"),
            Some(Ok(Message::Ping(data))) => {
                client
                    .send(Message::Pong(data))
                    .await
                    .expect("Failed to send pong");
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => panic!("WebSocket error: {e}"),
            None => panic!("Stream ended while expecting silence"),
        }
    }
}

/// Registers a client under the given name and role.
async fn register(client: &mut WsClient, name: &str, role: &str) {
    send_frame(
        client,
        &json!({"type": "register", "name": name, "role": role}),
    )
    .await;
}

/// Registers a teacher and returns the init snapshot it receives.
async fn register_teacher(client: &mut WsClient, name: &str) -> Value {
    register(client, name, "teacher").await;
    let init = receive_frame(client).await;
    assert_eq!(init["type"], "teacher_init", "got: {init}");
    init
}

// ============================================================================
// Registration Tests
// ============================================================================

/// Tests that a teacher receives the classroom snapshot on registration.
#[tokio::test]
async fn test_teacher_receives_init_on_register() {
    let state = AppState::new(Config::default());
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut teacher = connect_client(&ws_url).await;
    let init = register_teacher(&mut teacher, "Ms. Frizzle").await;

    // Empty classroom: no summary key at all, empty collections.
    assert!(init.get("summary").is_none());
    assert!(init.get("activePoll").is_none());
    assert_eq!(init["difficultyMap"], json!([]));
    assert_eq!(init["studentAnswers"], json!([]));
    assert_eq!(init["connectedStudents"], json!([]));
}

/// Tests that the teacher init snapshot lists connected students.
#[tokio::test]
async fn test_teacher_init_lists_connected_students() {
    let state = AppState::new(Config::default());
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut student = connect_client(&ws_url).await;
    register(&mut student, "alice", "student").await;

    // Give the registration a moment to land before the teacher joins.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut teacher = connect_client(&ws_url).await;
    let init = register_teacher(&mut teacher, "Ms. Frizzle").await;

    assert_eq!(init["connectedStudents"], json!(["alice"]));
}

/// Tests that registering with an unknown role gets a rejection frame.
#[tokio::test]
async fn test_register_with_unknown_role_is_rejected() {
    let state = AppState::new(Config::default());
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut client = connect_client(&ws_url).await;
    register(&mut client, "mallory", "admin").await;

    let frame = receive_frame(&mut client).await;
    assert_eq!(frame["type"], "rejected");
    assert_eq!(
        frame["reason"],
        "Invalid role 'admin': expected 'teacher' or 'student'"
    );
}

/// Tests that frames from unregistered connections are dropped, and that
/// the connection can still register afterwards.
#[tokio::test]
async fn test_unregistered_frames_are_dropped() {
    let state = AppState::new(Config::default());
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut client = connect_client(&ws_url).await;
    send_frame(&mut client, &json!({"type": "heartbeat"})).await;
    send_frame(
        &mut client,
        &json!({
            "type": "create_poll",
            "question": "Sneaky?",
            "options": ["yes", "no"],
            "correctAnswer": 0
        }),
    )
    .await;
    assert_no_text_frame(&mut client).await;

    // Registration still works on the same connection.
    let init = register_teacher(&mut client, "Ms. Frizzle").await;
    assert!(init.get("activePoll").is_none());
}

// ============================================================================
// Poll Lifecycle Tests
// ============================================================================

/// Tests that a created poll is fanned out to students.
#[tokio::test]
async fn test_create_poll_fans_out_to_students() {
    let state = AppState::new(Config::default());
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut teacher = connect_client(&ws_url).await;
    register_teacher(&mut teacher, "Ms. Frizzle").await;

    let mut student = connect_client(&ws_url).await;
    register(&mut student, "alice", "student").await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    send_frame(
        &mut teacher,
        &json!({
            "type": "create_poll",
            "question": "What is a slice?",
            "options": ["a view", "a copy"],
            "correctAnswer": 0
        }),
    )
    .await;

    let frame = receive_frame(&mut student).await;
    assert_eq!(frame["type"], "new_poll");
    assert_eq!(frame["poll"]["question"], "What is a slice?");
    assert_eq!(frame["poll"]["options"], json!(["a view", "a copy"]));
    assert_eq!(frame["poll"]["correctAnswer"], 0);
    assert_eq!(frame["poll"]["active"], true);
    assert!(frame["poll"]["id"].as_str().is_some_and(|id| !id.is_empty()));
}

/// Tests that an answer returns a verdict to the student and a live
/// update to the teacher.
#[tokio::test]
async fn test_submit_answer_returns_result_and_updates_teacher() {
    let state = AppState::new(Config::default());
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut teacher = connect_client(&ws_url).await;
    register_teacher(&mut teacher, "Ms. Frizzle").await;

    let mut student = connect_client(&ws_url).await;
    register(&mut student, "alice", "student").await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    send_frame(
        &mut teacher,
        &json!({
            "type": "create_poll",
            "question": "What is a slice?",
            "options": ["a view", "a copy"],
            "correctAnswer": 0
        }),
    )
    .await;
    receive_frame(&mut student).await; // Consume new_poll

    send_frame(&mut student, &json!({"type": "submit_answer", "answer": 0})).await;

    let verdict = receive_frame(&mut student).await;
    assert_eq!(verdict["type"], "answer_result");
    assert_eq!(verdict["correct"], true);
    assert_eq!(verdict["correctAnswer"], 0);

    let update = receive_frame(&mut teacher).await;
    assert_eq!(update["type"], "poll_update");
    assert_eq!(update["studentAnswers"][0]["studentName"], "alice");
    assert_eq!(update["studentAnswers"][0]["correct"], true);
    assert_eq!(update["studentAnswers"][0]["answer"], "a view");
    // A correct answer contributes nothing to the difficulty map.
    assert_eq!(update["difficultyMap"], json!([]));
}

/// Tests that wrong answers feed the difficulty map sent to teachers.
#[tokio::test]
async fn test_wrong_answer_feeds_difficulty_map() {
    let state = AppState::new(Config::default());
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut teacher = connect_client(&ws_url).await;
    register_teacher(&mut teacher, "Ms. Frizzle").await;

    let mut student = connect_client(&ws_url).await;
    register(&mut student, "alice", "student").await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    send_frame(
        &mut teacher,
        &json!({
            "type": "create_poll",
            "question": "Which planet is closest to the sun?",
            "options": ["Mercury", "Venus"],
            "correctAnswer": 0
        }),
    )
    .await;
    receive_frame(&mut student).await; // Consume new_poll

    send_frame(&mut student, &json!({"type": "submit_answer", "answer": 1})).await;

    let verdict = receive_frame(&mut student).await;
    assert_eq!(verdict["correct"], false);
    assert_eq!(verdict["correctAnswer"], 0);

    let update = receive_frame(&mut teacher).await;
    assert_eq!(update["type"], "poll_update");
    // Topic is the first 30 characters of the question.
    assert_eq!(update["difficultyMap"][0][0], "Which planet is closest to the");
    assert_eq!(update["difficultyMap"][0][1]["count"], 1);
    assert_eq!(update["difficultyMap"][0][1]["students"], json!(["alice"]));
}

/// Tests that ending a poll notifies students.
#[tokio::test]
async fn test_end_poll_notifies_students() {
    let state = AppState::new(Config::default());
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut teacher = connect_client(&ws_url).await;
    register_teacher(&mut teacher, "Ms. Frizzle").await;

    let mut student = connect_client(&ws_url).await;
    register(&mut student, "alice", "student").await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    send_frame(
        &mut teacher,
        &json!({
            "type": "create_poll",
            "question": "What is a slice?",
            "options": ["a view", "a copy"],
            "correctAnswer": 0
        }),
    )
    .await;
    receive_frame(&mut student).await; // Consume new_poll

    send_frame(&mut teacher, &json!({"type": "end_poll"})).await;

    let frame = receive_frame(&mut student).await;
    assert_eq!(frame, json!({"type": "poll_ended"}));
}

/// Tests that a teacher gets rejection feedback for an invalid poll.
#[tokio::test]
async fn test_invalid_poll_is_rejected_with_reason() {
    let state = AppState::new(Config::default());
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut teacher = connect_client(&ws_url).await;
    register_teacher(&mut teacher, "Ms. Frizzle").await;

    send_frame(
        &mut teacher,
        &json!({
            "type": "create_poll",
            "question": "   ",
            "options": ["a", "b"],
            "correctAnswer": 0
        }),
    )
    .await;

    let frame = receive_frame(&mut teacher).await;
    assert_eq!(frame["type"], "rejected");
    assert_eq!(frame["reason"], "Invalid poll: question must not be empty");
}

/// Tests that poll commands from students are dropped without feedback
/// and the connection keeps working.
#[tokio::test]
async fn test_student_commands_are_refused_silently() {
    let state = AppState::new(Config::default());
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut teacher = connect_client(&ws_url).await;
    register_teacher(&mut teacher, "Ms. Frizzle").await;

    let mut student = connect_client(&ws_url).await;
    register(&mut student, "alice", "student").await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    send_frame(
        &mut student,
        &json!({
            "type": "create_poll",
            "question": "Am I the teacher now?",
            "options": ["yes", "no"],
            "correctAnswer": 0
        }),
    )
    .await;
    assert_no_text_frame(&mut student).await;

    // The connection is still alive and still receives broadcasts.
    send_frame(
        &mut teacher,
        &json!({"type": "publish_summary", "summary": "Still the teacher's classroom."}),
    )
    .await;

    let frame = receive_frame(&mut student).await;
    assert_eq!(frame["type"], "new_summary");
}

// ============================================================================
// Summary Fan-out Tests
// ============================================================================

/// Tests that a published summary reaches every connected student.
#[tokio::test]
async fn test_publish_summary_reaches_all_students() {
    let state = AppState::new(Config::default());
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut teacher = connect_client(&ws_url).await;
    register_teacher(&mut teacher, "Ms. Frizzle").await;

    let mut student1 = connect_client(&ws_url).await;
    register(&mut student1, "alice", "student").await;
    let mut student2 = connect_client(&ws_url).await;
    register(&mut student2, "bob", "student").await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    send_frame(
        &mut teacher,
        &json!({
            "type": "publish_summary",
            "summary": "Today we covered ownership.",
            "fromTeacher": "Ms. Frizzle"
        }),
    )
    .await;

    for student in [&mut student1, &mut student2] {
        let frame = receive_frame(student).await;
        assert_eq!(frame["type"], "new_summary");
        assert_eq!(frame["summary"], "Today we covered ownership.");
        assert_eq!(frame["fromTeacher"], "Ms. Frizzle");
        assert!(frame["timestamp"].is_string());
    }
}

/// Tests that a student joining late receives the published summary and
/// the active poll, in that order.
#[tokio::test]
async fn test_late_joining_student_receives_replay() {
    let state = AppState::new(Config::default());
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut teacher = connect_client(&ws_url).await;
    register_teacher(&mut teacher, "Ms. Frizzle").await;

    send_frame(
        &mut teacher,
        &json!({"type": "publish_summary", "summary": "Catch up on closures."}),
    )
    .await;
    send_frame(
        &mut teacher,
        &json!({
            "type": "create_poll",
            "question": "What does a closure capture?",
            "options": ["its environment", "nothing"],
            "correctAnswer": 0
        }),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut latecomer = connect_client(&ws_url).await;
    register(&mut latecomer, "carol", "student").await;

    let summary = receive_frame(&mut latecomer).await;
    assert_eq!(summary["type"], "new_summary");
    assert_eq!(summary["summary"], "Catch up on closures.");
    // No explicit name on the frame, so it is credited to the registered
    // teacher.
    assert_eq!(summary["fromTeacher"], "Ms. Frizzle");

    let poll = receive_frame(&mut latecomer).await;
    assert_eq!(poll["type"], "new_poll");
    assert_eq!(poll["poll"]["question"], "What does a closure capture?");
    assert_eq!(poll["poll"]["active"], true);
}

// ============================================================================
// API Integration Tests
// ============================================================================

/// Tests that publishing over HTTP broadcasts to WebSocket students.
#[tokio::test]
async fn test_http_publish_broadcasts_to_websocket_students() {
    let state = AppState::new(Config::default());
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut student = connect_client(&ws_url).await;
    register(&mut student, "alice", "student").await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let http_url = ws_url.replace("ws://", "http://").replace("/ws", "");
    let client_http = reqwest::Client::new();

    let response = client_http
        .post(format!("{http_url}/api/summary/generate"))
        .json(&json!({
            "transcript": "Today we covered components, state, and props.",
            "teacherName": "Ms. Frizzle"
        }))
        .send()
        .await
        .expect("Failed to send generate request");
    assert!(response.status().is_success());

    // Generating alone must not push anything to students.
    assert_no_text_frame(&mut student).await;

    let response = client_http
        .post(format!("{http_url}/api/summary/publish"))
        .json(&json!({"teacherName": "Ms. Frizzle"}))
        .send()
        .await
        .expect("Failed to send publish request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["studentCount"], 1);

    let frame = receive_frame(&mut student).await;
    assert_eq!(frame["type"], "new_summary");
    assert_eq!(frame["fromTeacher"], "Ms. Frizzle");
}

// ============================================================================
// Disconnection Tests
// ============================================================================

/// Tests that the server keeps serving after a client disconnects.
#[tokio::test]
async fn test_server_continues_after_client_disconnect() {
    let state = AppState::new(Config::default());
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut teacher = connect_client(&ws_url).await;
    register_teacher(&mut teacher, "Ms. Frizzle").await;

    // Connect and disconnect a student
    let mut student1 = connect_client(&ws_url).await;
    register(&mut student1, "alice", "student").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    student1.close(None).await.ok();
    drop(student1);

    // Give the server time to process the disconnect
    tokio::time::sleep(Duration::from_millis(50)).await;

    // A second student connects and receives broadcasts as usual
    let mut student2 = connect_client(&ws_url).await;
    register(&mut student2, "bob", "student").await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    send_frame(
        &mut teacher,
        &json!({"type": "publish_summary", "summary": "Welcome back."}),
    )
    .await;

    let frame = receive_frame(&mut student2).await;
    assert_eq!(frame["type"], "new_summary");
    assert_eq!(frame["summary"], "Welcome back.");
}

/// Tests that a departed student no longer appears in teacher snapshots.
#[tokio::test]
async fn test_disconnected_student_leaves_the_roster() {
    let state = AppState::new(Config::default());
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut student = connect_client(&ws_url).await;
    register(&mut student, "alice", "student").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    student.close(None).await.ok();
    drop(student);

    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut teacher = connect_client(&ws_url).await;
    let init = register_teacher(&mut teacher, "Ms. Frizzle").await;
    assert_eq!(init["connectedStudents"], json!([]));
}
