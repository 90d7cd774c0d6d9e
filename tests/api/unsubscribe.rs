use crate::helpers::TestApp;

#[tokio::test]
async fn unsubscribe_without_identifier_is_rejected_with_400() {
    let app = TestApp::spawn_app().await;

    let response = app.delete_subscription(&[]).await;
    let blank = app.delete_subscription(&[("token", " "), ("email", "")]).await;

    assert_eq!(response.status(), 400);
    assert_eq!(blank.status(), 400);
}

#[tokio::test]
async fn unsubscribe_by_token_removes_the_subscriber() {
    let app = TestApp::spawn_app().await;
    app.mock_email_api(200).await;

    app.create_subscriber().await;
    let token = app.read_subscribers().await[0].token.clone();

    let response = app.delete_subscription(&[("token", token.as_ref())]).await;

    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Successfully unsubscribed");
    assert!(app.read_subscribers().await.is_empty());
}

#[tokio::test]
async fn unsubscribe_by_email_is_case_insensitive() {
    let app = TestApp::spawn_app().await;
    app.mock_email_api(200).await;

    let email = app.create_subscriber().await;

    let response = app
        .delete_subscription(&[("email", email.to_uppercase().as_str())])
        .await;

    assert_eq!(response.status(), 200);
    assert!(app.read_subscribers().await.is_empty());
}

#[tokio::test]
async fn unsubscribe_prefers_the_token_over_the_email() {
    let app = TestApp::spawn_app().await;
    app.mock_email_api(200).await;

    let first = app.create_subscriber().await;
    let second = app.create_subscriber().await;
    let subscribers = app.read_subscribers().await;
    let first_token = subscribers
        .iter()
        .find(|subscriber| subscriber.email.as_ref() == first)
        .unwrap()
        .token
        .clone();

    let response = app
        .delete_subscription(&[("token", first_token.as_ref()), ("email", second.as_str())])
        .await;

    assert_eq!(response.status(), 200);

    let remaining = app.read_subscribers().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].email.as_ref(), second);
}

#[tokio::test]
async fn unsubscribing_an_unknown_subscriber_returns_404() {
    let app = TestApp::spawn_app().await;

    let by_token = app.delete_subscription(&[("token", "unknown")]).await;
    let by_email = app
        .delete_subscription(&[("email", "nobody@test.com")])
        .await;
    let malformed_email = app.delete_subscription(&[("email", "nobody")]).await;

    assert_eq!(by_token.status(), 404);
    assert_eq!(by_email.status(), 404);
    assert_eq!(malformed_email.status(), 404);
}

#[tokio::test]
async fn unsubscribe_link_works_from_a_mail_client() {
    let app = TestApp::spawn_app().await;
    app.mock_email_api(200).await;

    app.create_subscriber().await;
    let token = app.read_subscribers().await[0].token.clone();

    let response = reqwest::Client::new()
        .get(&format!("{}/unsubscribe", app.address))
        .query(&[("token", token.as_ref())])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(app.read_subscribers().await.is_empty());
}

#[tokio::test]
async fn token_stops_working_once_the_subscriber_is_gone() {
    let app = TestApp::spawn_app().await;
    app.mock_email_api(200).await;

    app.create_subscriber().await;
    let token = app.read_subscribers().await[0].token.clone();

    let confirmed = app.get_confirm(&[("token", token.as_ref())]).await;
    let removed = app.delete_subscription(&[("token", token.as_ref())]).await;
    let confirmed_again = app.get_confirm(&[("token", token.as_ref())]).await;

    assert_eq!(confirmed.status(), 200);
    assert_eq!(removed.status(), 200);
    assert_eq!(confirmed_again.status(), 404);
    assert!(app.read_subscribers().await.is_empty());
}
