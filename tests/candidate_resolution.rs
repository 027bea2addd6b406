mod common;

use chatgw::errors::{ApiError, ApiErrorKind};
use chatgw::services::endpoints::{EndpointCandidates, PROGRAMMING_QUERY, WIKIPEDIA_QUERY};
use common::{app_with, ScriptedTransport};
use reqwest::Method;
use serde_json::{json, Value};

const ABC: EndpointCandidates = EndpointCandidates {
    operation: "Test bot",
    paths: &["/a", "/b", "/c"],
};

#[tokio::test]
async fn stops_on_first_non_404_failure() {
    let transport = ScriptedTransport::new();
    transport.status("POST", "/a", 500, r#"{"detail":"boom"}"#);
    transport.ok("POST", "/b", json!({"answer": "never"}));
    let app = app_with(transport.clone());

    let err = app
        .api
        .resolve_candidates(Method::POST, &ABC, Some(json!({"q": 1})))
        .await
        .expect_err("500 must propagate");

    assert_eq!(transport.called_paths(), vec!["/a"]);
    assert_eq!(err.kind, ApiErrorKind::Remote);
    assert_eq!(err.status, Some(500));
    assert_eq!(err.detail, Some(json!({"detail": "boom"})));
}

#[tokio::test]
async fn skips_only_404s() {
    let transport = ScriptedTransport::new();
    transport.status("POST", "/a", 404, r#"{"detail":"Not Found"}"#);
    transport.ok("POST", "/b", json!({"answer": "from b"}));
    transport.ok("POST", "/c", json!({"answer": "from c"}));
    let app = app_with(transport.clone());

    let value = app
        .api
        .resolve_candidates(Method::POST, &ABC, Some(json!({"q": 1})))
        .await
        .expect("b answers");

    assert_eq!(transport.called_paths(), vec!["/a", "/b"]);
    assert_eq!(value, Some(json!({"answer": "from b"})));
    for call in transport.calls() {
        assert_eq!(call.body.as_deref(), Some(r#"{"q":1}"#));
    }
}

#[tokio::test]
async fn exhaustion_is_its_own_kind() {
    let transport = ScriptedTransport::new();
    transport.status("POST", "/a", 404, "");
    transport.status("POST", "/b", 404, r#"{"detail":"Not Found"}"#);
    let app = app_with(transport.clone());
    let two = EndpointCandidates {
        operation: "Two paths",
        paths: &["/a", "/b"],
    };

    let err = app
        .api
        .resolve_candidates(Method::POST, &two, None)
        .await
        .expect_err("all 404");

    assert_eq!(transport.called_paths(), vec!["/a", "/b"]);
    assert_eq!(err.kind, ApiErrorKind::EndpointNotFound);
    assert!(!err.is_not_found());
    assert_eq!(err.status, None);
    let detail = err.detail.expect("detail");
    assert_eq!(detail["tried"], json!(["/a", "/b"]));
    assert_eq!(detail["last_detail"], json!({"detail": "Not Found"}));

    let single = app.api.get("/a", None).await.expect_err("plain 404");
    assert!(single.is_not_found());
    assert_ne!(single.kind, ApiErrorKind::EndpointNotFound);
}

#[tokio::test]
async fn transport_failure_is_terminal() {
    let transport = ScriptedTransport::new();
    transport.on("POST", "/a", Err(ApiError::transport("connection refused")));
    let app = app_with(transport.clone());

    let err = app
        .api
        .resolve_candidates(Method::POST, &ABC, None)
        .await
        .expect_err("transport error");

    assert_eq!(err.kind, ApiErrorKind::Transport);
    assert_eq!(transport.called_paths(), vec!["/a"]);
}

#[tokio::test]
async fn empty_candidate_list_is_exhausted_without_calls() {
    let transport = ScriptedTransport::new();
    let app = app_with(transport.clone());
    let none = EndpointCandidates {
        operation: "Nothing",
        paths: &[],
    };

    let err = app
        .api
        .resolve_candidates(Method::POST, &none, None)
        .await
        .expect_err("exhausted");
    assert_eq!(err.kind, ApiErrorKind::EndpointNotFound);
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn wikipedia_falls_through_to_fourth_route() {
    let transport = ScriptedTransport::new();
    transport.ok("POST", "/chatbot/wikipedia", json!({"answer": "Rust is a language"}));
    let app = app_with(transport.clone());

    let reply = app
        .chatbots
        .ask_wikipedia("What is Rust?", None)
        .await
        .expect("reply");

    assert_eq!(reply.answer, "Rust is a language");
    assert_eq!(transport.called_paths(), WIKIPEDIA_QUERY.paths[..4].to_vec());
    let body: Value =
        serde_json::from_str(transport.calls()[0].body.as_deref().expect("body")).expect("json");
    assert_eq!(body, json!({"question": "What is Rust?", "language": "es"}));
}

#[tokio::test]
async fn programming_bot_sends_message_payload() {
    let transport = ScriptedTransport::new();
    transport.ok("POST", "/chatbots/programming/chat", json!({"response": "Use Option"}));
    let app = app_with(transport.clone());

    let reply = app
        .chatbots
        .ask_programming("How to avoid null?", Some("rust"))
        .await
        .expect("reply");

    assert_eq!(reply.answer, "Use Option");
    assert_eq!(transport.called_paths(), vec![PROGRAMMING_QUERY.paths[0]]);
    let body: Value =
        serde_json::from_str(transport.calls()[0].body.as_deref().expect("body")).expect("json");
    assert_eq!(body, json!({"message": "How to avoid null?", "context": "rust"}));
}

#[tokio::test]
async fn programming_bot_exhaustion_names_operation() {
    let transport = ScriptedTransport::new();
    let app = app_with(transport.clone());

    let err = app
        .chatbots
        .ask_programming("anything", None)
        .await
        .expect_err("nothing routed");

    assert_eq!(err.kind, ApiErrorKind::EndpointNotFound);
    assert_eq!(err.message, "Programming chatbot endpoint not found");
    assert_eq!(transport.calls().len(), PROGRAMMING_QUERY.paths.len());
}
