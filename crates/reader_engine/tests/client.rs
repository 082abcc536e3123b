use std::time::Duration;

use pretty_assertions::assert_eq;
use reader_engine::{
    AskRequest, Backend, ClientSettings, DocumentOut, DocumentSource, FailureKind,
    LlmSettingsUpdate, ReqwestBackend,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> ReqwestBackend {
    reader_logging::initialize_for_tests();
    ReqwestBackend::new(ClientSettings {
        base_url: server.uri(),
        ..ClientSettings::default()
    })
    .expect("backend")
}

#[tokio::test]
async fn lists_documents() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 3, "title": "Treaty of Karlowitz", "filename": "karlowitz.pdf", "has_text_layer": true},
            {"id": 4, "title": "Scan", "filename": "scan.pdf"}
        ])))
        .mount(&server)
        .await;

    let docs = backend_for(&server).list_documents().await.expect("documents");
    assert_eq!(
        docs,
        vec![
            DocumentOut {
                id: 3,
                title: "Treaty of Karlowitz".into(),
                filename: "karlowitz.pdf".into(),
                has_text_layer: true,
            },
            DocumentOut {
                id: 4,
                title: "Scan".into(),
                filename: "scan.pdf".into(),
                has_text_layer: false,
            },
        ]
    );
}

#[tokio::test]
async fn ask_sends_scope_and_decodes_citations() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_json(json!({"question": "Who signed?", "top_k": 8, "source_ids": [3]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "The Holy League [1].",
            "citations": [{
                "ref": 1,
                "document_id": 3,
                "document": "Treaty of Karlowitz",
                "section": "Signatories",
                "pages": "12-13",
                "excerpt": "Signed by the Holy League"
            }],
            "evidence": []
        })))
        .mount(&server)
        .await;

    let response = backend_for(&server)
        .ask(&AskRequest {
            question: "Who signed?".into(),
            top_k: 8,
            source_ids: Some(vec![3]),
        })
        .await
        .expect("answer");
    assert_eq!(response.answer_text(), "The Holy League [1].");
    let citation = &response.citations()[0];
    assert_eq!(citation.reference, Some(1));
    assert_eq!(citation.document_title, "Treaty of Karlowitz");
    assert_eq!(citation.section.as_deref(), Some("Signatories"));
    assert_eq!(citation.pages, "12-13");
}

#[tokio::test]
async fn ask_without_scope_omits_source_ids_and_tolerates_null_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_json(json!({"question": "Anything?", "top_k": 4})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"answer": null, "citations": null})),
        )
        .mount(&server)
        .await;

    let response = backend_for(&server)
        .ask(&AskRequest {
            question: "Anything?".into(),
            top_k: 4,
            source_ids: None,
        })
        .await
        .expect("answer");
    assert_eq!(response.answer_text(), "");
    assert!(response.citations().is_empty());
}

#[tokio::test]
async fn error_status_carries_detail() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/documents/9"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Document not found"})),
        )
        .mount(&server)
        .await;

    let err = backend_for(&server).delete_document(9).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
    assert_eq!(err.message, "Document not found");
}

#[tokio::test]
async fn delete_succeeds_on_2xx() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/documents/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    backend_for(&server).delete_document(2).await.expect("deleted");
}

#[tokio::test]
async fn upload_posts_multipart_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains("filename=\"notes.pdf\""))
        .and(body_string_contains("name=\"file\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "document": {"id": 11, "title": "notes", "filename": "notes.pdf", "has_text_layer": false},
            "ingest_started": true
        })))
        .mount(&server)
        .await;

    let response = backend_for(&server)
        .upload("notes.pdf", b"%PDF-1.4 stub".to_vec())
        .await
        .expect("upload");
    assert_eq!(response.document.id, 11);
    assert!(response.ingest_started);
}

#[tokio::test]
async fn settings_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chat_base_url": "http://localhost:11434/v1",
            "chat_model": "llama3"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/settings"))
        .and(body_json(json!({"chat_model": "mistral"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chat_base_url": "http://localhost:11434/v1",
            "chat_model": "mistral"
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    assert_eq!(backend.settings().await.expect("settings").chat_model, "llama3");
    let updated = backend
        .update_settings(&LlmSettingsUpdate {
            chat_model: Some("mistral".into()),
            ..LlmSettingsUpdate::default()
        })
        .await
        .expect("updated");
    assert_eq!(updated.chat_model, "mistral");
}

#[tokio::test]
async fn document_bytes_are_fetched_from_files_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/5"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"page one".to_vec()))
        .mount(&server)
        .await;

    let bytes = backend_for(&server).fetch_document(5).await.expect("bytes");
    assert_eq!(bytes, b"page one");
}

#[tokio::test]
async fn oversized_documents_are_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/5"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 64]))
        .mount(&server)
        .await;

    reader_logging::initialize_for_tests();
    let backend = ReqwestBackend::new(ClientSettings {
        base_url: server.uri(),
        max_file_bytes: 16,
        ..ClientSettings::default()
    })
    .expect("backend");
    let err = backend.fetch_document(5).await.unwrap_err();
    assert!(matches!(
        err.kind,
        FailureKind::TooLarge { max_bytes: 16, .. }
    ));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    reader_logging::initialize_for_tests();
    let backend = ReqwestBackend::new(ClientSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..ClientSettings::default()
    })
    .expect("backend");
    let err = backend.list_documents().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}
