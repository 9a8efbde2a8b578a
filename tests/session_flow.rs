#![cfg(feature = "gemini")]

use garden_designer::{
    data_url, FileSource, GeminiEditor, MemorySource, SessionController, SessionPhase,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_BYTES: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
// Base64 of the PNG signature followed by four zero bytes
const EDITED_PNG: &str = "iVBORw0KGgoAAAAA";

async fn mock_service(body: serde_json::Value, status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1beta/models/.+:generateContent$"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&server)
        .await;
    server
}

fn session(server: &MockServer) -> SessionController<GeminiEditor> {
    let editor = GeminiEditor::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .build()
        .unwrap();
    SessionController::new(editor)
}

#[tokio::test]
async fn test_upload_edit_and_download() {
    let server = mock_service(
        json!({
            "candidates": [{
                "content": { "parts": [{ "inlineData": { "mimeType": "image/png", "data": EDITED_PNG } }] }
            }]
        }),
        200,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("backyard.png");
    std::fs::write(&input, PNG_BYTES).unwrap();

    let mut session = session(&server);
    assert_eq!(session.upload(&FileSource::new(&input)).await, SessionPhase::ImageLoaded);

    let state = session.state();
    let (mime, preview) = data_url::decode(state.preview_url().unwrap()).unwrap();
    assert_eq!(mime, "image/png");
    assert_eq!(preview, PNG_BYTES.to_vec());

    session.set_prompt("Add a stone pathway!");
    assert!(session.state().can_submit());
    assert_eq!(session.submit().await, SessionPhase::Succeeded);

    let state = session.state();
    assert_eq!(state.error, None);
    assert_eq!(
        state.result_data_url().unwrap(),
        format!("data:image/png;base64,{EDITED_PNG}")
    );

    let saved = session.save_result(dir.path()).await.unwrap();
    assert_eq!(
        saved.file_name().unwrap().to_str().unwrap(),
        "garden_design_add_a_stone_pathway_.png"
    );
    assert_eq!(&std::fs::read(saved).unwrap()[..8], &PNG_BYTES[..8]);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        sent["contents"][0]["parts"][1]["text"],
        json!("Add a stone pathway!")
    );
}

#[tokio::test]
async fn test_refusal_then_new_upload_resets() {
    let server = mock_service(
        json!({
            "candidates": [{ "content": { "parts": [{ "text": "No." }] }, "finishReason": "STOP" }]
        }),
        200,
    )
    .await;

    let mut session = session(&server);
    session
        .upload(&MemorySource::new("yard.png", PNG_BYTES.to_vec()))
        .await;
    session.set_prompt("Remove the lawn chair.");

    assert_eq!(session.submit().await, SessionPhase::Failed);
    let state = session.state();
    assert!(state.result.is_none());
    assert!(!state.is_loading);
    assert!(state.error.unwrap().contains("did not return an image"));

    session
        .upload(&MemorySource::new("yard2.png", PNG_BYTES.to_vec()))
        .await;
    let state = session.state();
    assert_eq!(state.phase, SessionPhase::ImageLoaded);
    assert_eq!(state.error, None);
    assert_eq!(state.result, None);
}

#[tokio::test]
async fn test_validation_makes_no_request() {
    let server = mock_service(json!({}), 200).await;
    let mut session = session(&server);

    session.set_prompt("Add a bench");
    session.submit().await;
    assert!(session.state().error.is_some());

    session
        .upload(&MemorySource::new("yard.png", PNG_BYTES.to_vec()))
        .await;
    session.set_prompt("  ");
    session.submit().await;
    assert!(session.state().error.is_some());

    assert!(server.received_requests().await.unwrap().is_empty());
}
