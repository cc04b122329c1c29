//! 私信台账服务单元测试
//!
//! 覆盖发送、台账查询、可见性与已读标记。

use std::sync::Arc;

use chrono::Utc;
use domain::DomainError;

use crate::error::ApplicationError;
use crate::services::test_support::*;
use crate::services::{RegisterUserRequest, SendMessageRequest};

async fn register(backend: &TestBackend, username: &str, first_name: &str) {
    backend
        .user_service
        .register(RegisterUserRequest {
            username: username.to_string(),
            password: "secret1".to_string(),
            first_name: first_name.to_string(),
            last_name: "User".to_string(),
            phone: format!("+1415555{:04}", username.len()),
        })
        .await
        .unwrap();
}

fn send_request(from: &str, to: &str, body: &str) -> SendMessageRequest {
    SendMessageRequest {
        from_username: from.to_string(),
        to_username: to.to_string(),
        body: body.to_string(),
    }
}

#[tokio::test]
async fn sent_ledger_contains_every_message_in_order() {
    let backend = test_backend();
    register(&backend, "alice", "Alice").await;
    register(&backend, "bob", "Bob").await;

    backend
        .message_service
        .send(send_request("alice", "bob", "first"))
        .await
        .unwrap();
    backend
        .message_service
        .send(send_request("alice", "bob", "second"))
        .await
        .unwrap();

    let sent = backend.message_service.sent_by("alice").await.unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].body, "first");
    assert_eq!(sent[1].body, "second");
    assert!(sent[0].sent_at <= sent[1].sent_at);

    // 每条都带收件人资料
    for item in &sent {
        assert_eq!(item.counterparty.username, "bob");
        assert_eq!(item.counterparty.first_name, "Bob");
    }
}

#[tokio::test]
async fn ledger_is_empty_for_a_user_with_no_messages() {
    let backend = test_backend();
    register(&backend, "alice", "Alice").await;

    // 已注册但零消息：空列表而不是错误
    let sent = backend.message_service.sent_by("alice").await.unwrap();
    assert!(sent.is_empty());
    let received = backend.message_service.received_by("alice").await.unwrap();
    assert!(received.is_empty());
}

#[tokio::test]
async fn ledger_of_unknown_user_is_not_found() {
    let backend = test_backend();

    let result = backend.message_service.sent_by("ghost").await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::UserNotFound))
    ));
}

#[tokio::test]
async fn received_ledger_is_enriched_with_the_sender() {
    let backend = test_backend();
    register(&backend, "alice", "Alice").await;
    register(&backend, "bob", "Bob").await;
    register(&backend, "carol", "Carol").await;

    backend
        .message_service
        .send(send_request("alice", "bob", "from alice"))
        .await
        .unwrap();
    backend
        .message_service
        .send(send_request("carol", "bob", "from carol"))
        .await
        .unwrap();

    let received = backend.message_service.received_by("bob").await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].counterparty.username, "alice");
    assert_eq!(received[1].counterparty.username, "carol");
}

#[tokio::test]
async fn equal_timestamps_fall_back_to_id_order() {
    // 固定时钟强制 sent_at 相同，排序退回 id 升序
    let backend = test_backend_with_clock(Arc::new(FixedClock(Utc::now())));
    register(&backend, "alice", "Alice").await;
    register(&backend, "bob", "Bob").await;

    for body in ["one", "two", "three"] {
        backend
            .message_service
            .send(send_request("alice", "bob", body))
            .await
            .unwrap();
    }

    let sent = backend.message_service.sent_by("alice").await.unwrap();
    let bodies: Vec<&str> = sent.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["one", "two", "three"]);
    assert!(sent.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
async fn sending_to_an_unknown_recipient_fails() {
    let backend = test_backend();
    register(&backend, "alice", "Alice").await;

    let result = backend
        .message_service
        .send(send_request("alice", "ghost", "hello"))
        .await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::UserNotFound))
    ));
}

#[tokio::test]
async fn sending_a_blank_body_fails() {
    let backend = test_backend();
    register(&backend, "alice", "Alice").await;
    register(&backend, "bob", "Bob").await;

    let result = backend
        .message_service
        .send(send_request("alice", "bob", "   "))
        .await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidArgument { .. }))
    ));
}

#[tokio::test]
async fn mark_read_is_idempotent() {
    let backend = test_backend();
    register(&backend, "alice", "Alice").await;
    register(&backend, "bob", "Bob").await;

    let message = backend
        .message_service
        .send(send_request("alice", "bob", "hello"))
        .await
        .unwrap();
    assert!(message.read_at.is_none());

    let first = backend
        .message_service
        .mark_read(message.id, "bob")
        .await
        .unwrap();
    let read_at = first.read_at.expect("read_at set");
    assert!(read_at >= first.sent_at);

    // 第二次调用不改变首次已读时间
    let second = backend
        .message_service
        .mark_read(message.id, "bob")
        .await
        .unwrap();
    assert_eq!(second.read_at, Some(read_at));
}

#[tokio::test]
async fn only_the_recipient_may_mark_read() {
    let backend = test_backend();
    register(&backend, "alice", "Alice").await;
    register(&backend, "bob", "Bob").await;

    let message = backend
        .message_service
        .send(send_request("alice", "bob", "hello"))
        .await
        .unwrap();

    let result = backend.message_service.mark_read(message.id, "alice").await;
    assert!(matches!(result, Err(ApplicationError::Authorization)));
}

#[tokio::test]
async fn mark_read_of_unknown_message_is_not_found() {
    let backend = test_backend();
    register(&backend, "bob", "Bob").await;

    let result = backend.message_service.mark_read(4242, "bob").await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::MessageNotFound))
    ));
}

#[tokio::test]
async fn message_detail_is_visible_to_endpoints_only() {
    let backend = test_backend();
    register(&backend, "alice", "Alice").await;
    register(&backend, "bob", "Bob").await;
    register(&backend, "carol", "Carol").await;

    let message = backend
        .message_service
        .send(send_request("alice", "bob", "hello"))
        .await
        .unwrap();

    assert!(backend
        .message_service
        .message(message.id, "alice")
        .await
        .is_ok());
    assert!(backend
        .message_service
        .message(message.id, "bob")
        .await
        .is_ok());

    let result = backend.message_service.message(message.id, "carol").await;
    assert!(matches!(result, Err(ApplicationError::Authorization)));
}
