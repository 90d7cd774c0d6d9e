use crate::helpers::TestApp;

#[tokio::test]
async fn test_email_reports_the_configured_provider() {
    let app = TestApp::spawn_app().await;

    let response = reqwest::get(format!("{}/test-email", app.address))
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["configured"], true);
    assert_eq!(body["provider"], "Resend (transactional email API)");
    assert!(body["instructions"].is_string());
}

#[tokio::test]
async fn test_email_sends_a_sample_through_the_provider() {
    let app = TestApp::spawn_app().await;
    app.mock_email_api(200).await;

    let test_cases = vec![
        (serde_json::json!({ "email": "me@test.com" }), "Welcome to What the Ellie!"),
        (
            serde_json::json!({ "email": "me@test.com", "testType": "newpost" }),
            "New Adventure: Testing the Mountains",
        ),
    ];

    for (body, subject) in test_cases {
        let response = app.post_test_email(body).await;

        assert_eq!(response.status().as_u16(), 200);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Test email sent successfully!");
        assert_eq!(body["to"], "me@test.com");

        let sent = app.emails_sent_to("me@test.com").await;
        assert_eq!(sent.last().unwrap()["subject"], subject);
    }
}

#[tokio::test]
async fn test_email_returns_400_for_invalid_requests() {
    let app = TestApp::spawn_app().await;

    let test_cases = vec![
        (serde_json::json!({}), "missing email"),
        (serde_json::json!({ "email": "not-an-email" }), "invalid email"),
        (
            serde_json::json!({ "email": "me@test.com", "testType": "digest" }),
            "unknown test type",
        ),
    ];

    for (invalid_body, error_message) in test_cases {
        let response = app.post_test_email(invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 status when payload was {}",
            error_message
        );
    }
}

#[tokio::test]
async fn test_email_returns_500_when_delivery_fails() {
    let app = TestApp::spawn_app().await;
    app.mock_email_api(500).await;

    let response = app
        .post_test_email(serde_json::json!({ "email": "me@test.com" }))
        .await;

    assert_eq!(response.status().as_u16(), 500);
}
