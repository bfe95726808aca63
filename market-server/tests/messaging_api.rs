//! 买家/卖家会话消息集成测试 (HTTP oneshot)

mod common;

use common::*;
use http::{Method, StatusCode};
use market_server::services::HttpService;
use serde_json::json;
use shared::models::UserRole;

async fn new_message_notifications(env: &TestEnv, recipient_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notification WHERE recipient_id = ? AND kind = 'new_message'",
    )
    .bind(recipient_id)
    .fetch_one(env.state.get_pool())
    .await
    .unwrap()
}

#[tokio::test]
async fn test_conversation_round_trip() {
    let env = setup().await;
    let state = &env.state;
    let service = HttpService::new(state.clone());
    let buyer = create_user(state, UserRole::Buyer).await;
    let seller = create_user(state, UserRole::Seller).await;
    let product = create_product(state, seller.id, 20.0, 5).await;
    let buyer_token = token_for(state, &buyer);
    let seller_token = token_for(state, &seller);

    // 买家就某个商品发起会话
    let (status, body) = send(
        &service,
        Method::POST,
        "/api/messages/conversations",
        Some(&buyer_token),
        Some(json!({ "participant_id": seller.id, "product_id": product.id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let conversation_id = body["id"].as_i64().unwrap();
    assert_eq!(body["other_user_id"], seller.id);
    assert_eq!(body["product_title"], product.title.as_str());
    assert_eq!(body["my_unread_count"], 0);

    // 卖家反向打开同一商品的会话，落在同一行
    let (_, body) = send(
        &service,
        Method::POST,
        "/api/messages/conversations",
        Some(&seller_token),
        Some(json!({ "participant_id": buyer.id, "product_id": product.id })),
    )
    .await;
    assert_eq!(body["id"], conversation_id);
    assert_eq!(body["other_user_id"], buyer.id);

    // 不关联商品是另一段会话
    let (_, body) = send(
        &service,
        Method::POST,
        "/api/messages/conversations",
        Some(&buyer_token),
        Some(json!({ "participant_id": seller.id })),
    )
    .await;
    assert_ne!(body["id"], conversation_id);

    let uri = format!("/api/messages/{conversation_id}");
    for content in ["Is this still available?", "Can you ship today?"] {
        let (status, body) = send(
            &service,
            Method::POST,
            &uri,
            Some(&buyer_token),
            Some(json!({ "content": content })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["sender_id"], buyer.id);
        assert_eq!(body["message_type"], "text");
    }
    assert_eq!(new_message_notifications(&env, seller.id).await, 2);

    // 卖家的会话列表带未读数和最后一条消息
    let (status, body) = send(
        &service,
        Method::GET,
        "/api/messages/conversations",
        Some(&seller_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 2);
    let entry = list.iter().find(|c| c["id"] == conversation_id).unwrap();
    assert_eq!(entry["my_unread_count"], 2);
    assert_eq!(entry["last_message"], "Can you ship today?");
    assert_eq!(entry["last_sender_id"], buyer.id);

    // 消息从旧到新
    let (status, body) = send(&service, Method::GET, &uri, Some(&seller_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"][0]["content"], "Is this still available?");
    assert_eq!(body["items"][1]["content"], "Can you ship today?");
    assert!(body["items"][0]["read_at"].is_null());

    // 卖家标记已读：只影响对方发来的消息
    let (status, body) = send(
        &service,
        Method::PUT,
        &format!("{uri}/read"),
        Some(&seller_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 2);

    let (_, body) = send(
        &service,
        Method::GET,
        "/api/messages/conversations",
        Some(&seller_token),
        None,
    )
    .await;
    let entry = body
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"] == conversation_id)
        .unwrap();
    assert_eq!(entry["my_unread_count"], 0);

    // 买家自己发的消息不计入自己的未读
    let (_, body) = send(
        &service,
        Method::POST,
        "/api/messages/conversations",
        Some(&buyer_token),
        Some(json!({ "participant_id": seller.id, "product_id": product.id })),
    )
    .await;
    assert_eq!(body["my_unread_count"], 0);
}

#[tokio::test]
async fn test_only_participants_see_a_conversation() {
    let env = setup().await;
    let state = &env.state;
    let service = HttpService::new(state.clone());
    let buyer = create_user(state, UserRole::Buyer).await;
    let seller = create_user(state, UserRole::Seller).await;
    let outsider = create_user(state, UserRole::Buyer).await;
    let buyer_token = token_for(state, &buyer);
    let outsider_token = token_for(state, &outsider);

    let (_, body) = send(
        &service,
        Method::POST,
        "/api/messages/conversations",
        Some(&buyer_token),
        Some(json!({ "participant_id": seller.id })),
    )
    .await;
    let uri = format!("/api/messages/{}", body["id"].as_i64().unwrap());

    let (status, body) = send(&service, Method::GET, &uri, Some(&outsider_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2001);

    let (status, _) = send(
        &service,
        Method::POST,
        &uri,
        Some(&outsider_token),
        Some(json!({ "content": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &service,
        Method::GET,
        "/api/messages/987654321",
        Some(&buyer_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 8006);

    let (status, _) = send(&service, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_conversations_and_messages() {
    let env = setup().await;
    let state = &env.state;
    let service = HttpService::new(state.clone());
    let buyer = create_user(state, UserRole::Buyer).await;
    let seller = create_user(state, UserRole::Seller).await;
    let buyer_token = token_for(state, &buyer);

    let (status, body) = send(
        &service,
        Method::POST,
        "/api/messages/conversations",
        Some(&buyer_token),
        Some(json!({ "participant_id": buyer.id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 8008);

    let (status, body) = send(
        &service,
        Method::POST,
        "/api/messages/conversations",
        Some(&buyer_token),
        Some(json!({ "participant_id": 123 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 8001);

    let (status, body) = send(
        &service,
        Method::POST,
        "/api/messages/conversations",
        Some(&buyer_token),
        Some(json!({ "participant_id": seller.id, "product_id": 456 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 6001);

    let (_, body) = send(
        &service,
        Method::POST,
        "/api/messages/conversations",
        Some(&buyer_token),
        Some(json!({ "participant_id": seller.id })),
    )
    .await;
    let uri = format!("/api/messages/{}", body["id"].as_i64().unwrap());

    let (status, body) = send(
        &service,
        Method::POST,
        &uri,
        Some(&buyer_token),
        Some(json!({ "content": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);
}

#[tokio::test]
async fn test_sender_deletes_own_message() {
    let env = setup().await;
    let state = &env.state;
    let service = HttpService::new(state.clone());
    let buyer = create_user(state, UserRole::Buyer).await;
    let seller = create_user(state, UserRole::Seller).await;
    let buyer_token = token_for(state, &buyer);
    let seller_token = token_for(state, &seller);

    let (_, body) = send(
        &service,
        Method::POST,
        "/api/messages/conversations",
        Some(&buyer_token),
        Some(json!({ "participant_id": seller.id })),
    )
    .await;
    let uri = format!("/api/messages/{}", body["id"].as_i64().unwrap());

    let (_, first) = send(
        &service,
        Method::POST,
        &uri,
        Some(&buyer_token),
        Some(json!({
            "content": "see attached",
            "message_type": "image",
            "attachments": [{ "url": "/uploads/a.png", "type": "image/png", "name": "a.png" }]
        })),
    )
    .await;
    assert_eq!(first["attachments"][0]["url"], "/uploads/a.png");
    send(
        &service,
        Method::POST,
        &uri,
        Some(&buyer_token),
        Some(json!({ "content": "second" })),
    )
    .await;
    let delete_uri = format!("/api/messages/{}", first["id"].as_i64().unwrap());

    // 只有发送者能删除
    let (status, _) = send(&service, Method::DELETE, &delete_uri, Some(&seller_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&service, Method::DELETE, &delete_uri, Some(&buyer_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(true));

    let (_, body) = send(&service, Method::GET, &uri, Some(&seller_token), None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["content"], "second");

    let (status, body) = send(&service, Method::DELETE, &delete_uri, Some(&buyer_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 8007);
}
