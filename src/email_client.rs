use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use regex::Regex;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::sync::OnceLock;
use std::time;

use crate::config::EmailClientSettings;
use crate::domain::subscriber_email::SubscriberEmail;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: SubscriberEmail,
    pub subject: String,
    pub html: String,
    // Derived from `html` when missing
    pub text: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum EmailError {
    #[error("The email API request failed.")]
    Api(#[from] reqwest::Error),
    #[error("Failed to build the email message.")]
    Message(#[from] lettre::error::Error),
    #[error("Invalid mailbox address.")]
    Address(#[from] lettre::address::AddressError),
    #[error("The SMTP relay did not accept the email.")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Delivers emails through whichever provider was configured at startup.
///
/// Callers never see provider errors: [`EmailClient::send_email`] logs them
/// and reports `false`, so emails stay best-effort everywhere.
pub struct EmailClient {
    provider: Provider,
}

enum Provider {
    Api(ApiProvider),
    Smtp(SmtpProvider),
    LogOnly,
}

struct ApiProvider {
    http_client: Client,
    base_url: String,
    sender: SubscriberEmail,
    api_key: Secret<String>,
}

struct SmtpProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

#[derive(serde::Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

impl EmailClient {
    /// Picks the transactional API when an API key is set, then SMTP when
    /// credentials are set, and falls back to only logging emails.
    pub fn from_settings(settings: &EmailClientSettings) -> Result<EmailClient, anyhow::Error> {
        let timeout = settings.get_timeout();

        if let Some(api_key) = settings.api_key.as_ref().filter(|k| !k.expose_secret().is_empty()) {
            let sender = settings
                .get_sender_email()
                .map_err(|err| anyhow::anyhow!(err))?;

            return Ok(Self::api(
                settings.get_base_url(),
                sender,
                api_key.clone(),
                Some(timeout),
            )?);
        }

        if let Some((username, password)) = settings.smtp.get_credentials() {
            return Ok(Self::smtp(
                &settings.smtp.host,
                settings.smtp.port,
                username,
                password,
                &settings.smtp.from_name,
                Some(timeout),
            )?);
        }

        tracing::warn!("No email provider configured. Emails will be logged only.");

        Ok(Self::log_only())
    }

    pub fn api(
        base_url: String,
        sender: SubscriberEmail,
        api_key: Secret<String>,
        timeout: Option<time::Duration>,
    ) -> Result<EmailClient, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()?;

        Ok(EmailClient {
            provider: Provider::Api(ApiProvider {
                http_client,
                base_url,
                sender,
                api_key,
            }),
        })
    }

    pub fn smtp(
        host: &str,
        port: u16,
        username: String,
        password: Secret<String>,
        from_name: &str,
        timeout: Option<time::Duration>,
    ) -> Result<EmailClient, EmailError> {
        let from = Mailbox::new(Some(from_name.to_string()), username.parse::<Address>()?);
        let credentials = Credentials::new(username, password.expose_secret().to_string());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
            .port(port)
            .credentials(credentials)
            .timeout(Some(timeout.unwrap_or(REQUEST_TIMEOUT)))
            .build();

        Ok(EmailClient {
            provider: Provider::Smtp(SmtpProvider { transport, from }),
        })
    }

    pub fn log_only() -> EmailClient {
        EmailClient {
            provider: Provider::LogOnly,
        }
    }

    /// Human readable name of the active provider, for diagnostics.
    pub fn provider_info(&self) -> &'static str {
        match self.provider {
            Provider::Api(_) => "Resend (transactional email API)",
            Provider::Smtp(_) => "SMTP (authenticated relay)",
            Provider::LogOnly => "No email provider configured",
        }
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self.provider, Provider::LogOnly)
    }

    #[tracing::instrument(
        name = "Send an email",
        skip(self, email),
        fields(
            recipient = %email.to,
            subject = %email.subject,
            provider = %self.provider_info()
        )
    )]
    pub async fn send_email(&self, email: &OutgoingEmail) -> bool {
        match self.deliver(email).await {
            Ok(()) => {
                tracing::info!("Email sent");
                true
            }
            Err(err) => {
                tracing::error!(error.cause_chain = ?err, "Failed to send email");
                false
            }
        }
    }

    async fn deliver(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let text = match &email.text {
            Some(text) => text.clone(),
            None => html_to_text(&email.html),
        };

        match &self.provider {
            Provider::Api(api) => {
                let url = format!("{}/emails", api.base_url);
                let body = SendEmailBody {
                    from: api.sender.as_ref(),
                    to: vec![email.to.as_ref()],
                    subject: &email.subject,
                    html: &email.html,
                    text: &text,
                };

                api.http_client
                    .post(&url)
                    .header(
                        "Authorization",
                        format!("Bearer {}", api.api_key.expose_secret()),
                    )
                    .json(&body)
                    .send()
                    .await?
                    .error_for_status()?; // return an error when server response status code is 4xx or 5xx
            }
            Provider::Smtp(smtp) => {
                let message = Message::builder()
                    .from(smtp.from.clone())
                    .to(Mailbox::new(None, email.to.as_ref().parse::<Address>()?))
                    .subject(email.subject.as_str())
                    .multipart(MultiPart::alternative_plain_html(
                        text,
                        email.html.clone(),
                    ))?;

                smtp.transport.send(message).await?;
            }
            Provider::LogOnly => {
                tracing::info!(
                    recipient = %email.to,
                    subject = %email.subject,
                    "Email not sent, no provider configured"
                );
            }
        }

        Ok(())
    }
}

/// Plain text rendition of an HTML body: style and script blocks dropped,
/// tags replaced by spaces, whitespace collapsed.
pub fn html_to_text(html: &str) -> String {
    static PATTERNS: OnceLock<[Regex; 4]> = OnceLock::new();

    let [style, script, tag, whitespace] = PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid style pattern"),
            Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid script pattern"),
            Regex::new(r"<[^>]+>").expect("valid tag pattern"),
            Regex::new(r"\s+").expect("valid whitespace pattern"),
        ]
    });

    let text = style.replace_all(html, "");
    let text = script.replace_all(&text, "");
    let text = tag.replace_all(&text, " ");
    let text = whitespace.replace_all(&text, " ");

    text.trim().to_string()
}
