use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{TestApp, ADMIN_EMAIL};

#[tokio::test]
async fn subscribe_returns_201_when_body_is_valid() {
    let test_app = TestApp::spawn_app().await;
    test_app.mock_email_api(200).await;

    let response = test_app
        .post_subscription(serde_json::json!({ "email": "frank@test.com" }))
        .await;

    assert_eq!(201, response.status().as_u16());

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["id"].is_string());
}

#[tokio::test]
async fn subscribe_persists_the_new_subscriber_normalized() {
    let test_app = TestApp::spawn_app().await;
    test_app.mock_email_api(200).await;

    test_app
        .post_subscription(serde_json::json!({ "email": "  Test@Test.COM " }))
        .await;

    let subscribers = test_app.read_subscribers().await;

    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0].email.as_ref(), "test@test.com");
    assert_eq!(subscribers[0].verified, Some(false));
    assert_eq!(subscribers[0].token.as_ref().len(), 64);
}

#[tokio::test]
async fn subscribing_twice_is_a_no_op() {
    let test_app = TestApp::spawn_app().await;
    test_app.mock_email_api(200).await;

    let first = test_app
        .post_subscription(serde_json::json!({ "email": "twice@test.com" }))
        .await;
    let second = test_app
        .post_subscription(serde_json::json!({ "email": "TWICE@test.com" }))
        .await;

    assert_eq!(first.status().as_u16(), 201);
    assert_eq!(second.status().as_u16(), 200);

    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(
        body["message"],
        "You're already subscribed! Thank you for your interest."
    );

    assert_eq!(test_app.read_subscribers().await.len(), 1);
    // Only the first request sends a welcome email
    assert_eq!(test_app.emails_sent_to("twice@test.com").await.len(), 1);
}

#[tokio::test]
async fn subscribe_returns_400_when_body_is_present_but_not_valid() {
    let test_app = TestApp::spawn_app().await;

    // This is a common practice and it is called table-driven tests. In this case, it simulates different kind of possible request bodies
    // where API should return 400.
    let test_cases = vec![
        (serde_json::json!({}), "missing email parameter"),
        (serde_json::json!({ "email": "" }), "empty email"),
        (serde_json::json!({ "email": "test.com" }), "email without @"),
        (serde_json::json!({ "email": "@test.com" }), "email without local part"),
    ];

    for (invalid_body, error_message) in test_cases {
        let response = test_app.post_subscription(invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 status when payload was {}",
            error_message
        );
    }

    assert!(test_app.read_subscribers().await.is_empty());
}

#[tokio::test]
async fn subscribe_returns_400_with_an_error_body_for_malformed_json() {
    let test_app = TestApp::spawn_app().await;

    let response = reqwest::Client::new()
        .post(&format!("{}/subscribe", test_app.address))
        .header("Content-Type", "application/json")
        .body("{\"email\": ")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 400);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn subscribe_sends_a_welcome_email_with_a_confirmation_link() {
    let test_app = TestApp::spawn_app().await;
    test_app.mock_email_api(200).await;

    test_app
        .post_subscription(serde_json::json!({ "email": "test@test.com" }))
        .await;

    let welcome = test_app.emails_sent_to("test@test.com").await;
    assert_eq!(welcome.len(), 1);
    assert_eq!(welcome[0]["subject"], "Welcome to What the Ellie!");

    let token = test_app.read_subscribers().await[0].token.clone();
    assert!(welcome[0]["html"]
        .as_str()
        .unwrap()
        .contains(&format!("/subscribe?token={}", token.as_ref())));
}

#[tokio::test]
async fn subscribe_notifies_the_admin() {
    let test_app = TestApp::spawn_app().await;
    test_app.mock_email_api(200).await;

    test_app
        .post_subscription(serde_json::json!({ "email": "reader@test.com" }))
        .await;

    let notifications = test_app.emails_sent_to(ADMIN_EMAIL).await;

    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["subject"], "New Newsletter Subscriber");
    assert!(notifications[0]["html"]
        .as_str()
        .unwrap()
        .contains("reader@test.com"));
}

#[tokio::test]
async fn subscribe_succeeds_even_when_emails_fail() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&test_app.email_server)
        .await;

    let response = test_app
        .post_subscription(serde_json::json!({ "email": "unlucky@test.com" }))
        .await;

    assert_eq!(response.status().as_u16(), 201);
    assert_eq!(test_app.read_subscribers().await.len(), 1);
}

#[tokio::test]
async fn subscribe_returns_500_when_the_store_is_corrupt() {
    let test_app = TestApp::spawn_app().await;
    test_app.mock_email_api(200).await;

    std::fs::write(&test_app.store_path, "[[[").unwrap();

    let response = test_app
        .post_subscription(serde_json::json!({ "email": "test@test.com" }))
        .await;

    assert_eq!(response.status().as_u16(), 500);
    // Nothing is overwritten when the document cannot be read
    assert_eq!(std::fs::read_to_string(&test_app.store_path).unwrap(), "[[[");
}

#[tokio::test]
async fn concurrent_subscriptions_are_all_kept() {
    let test_app = TestApp::spawn_app().await;
    test_app.mock_email_api(200).await;

    let requests = (0..10).map(|i| {
        let email = format!("reader{}@test.com", i);
        let test_app = &test_app;
        async move {
            test_app
                .post_subscription(serde_json::json!({ "email": email }))
                .await
        }
    });

    for response in futures::future::join_all(requests).await {
        assert_eq!(response.status().as_u16(), 201);
    }

    assert_eq!(test_app.read_subscribers().await.len(), 10);
}
