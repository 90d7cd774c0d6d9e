use config::{Config, ConfigError, File};
use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;
use std::path::PathBuf;
use std::time;

use crate::domain::subscriber_email::SubscriberEmail;

#[derive(Debug)]
pub enum Environment {
    Development,
    Production,
}

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub store: StoreSettings,
    pub email_client: EmailClientSettings,
    #[serde(default)]
    pub admin: AdminSettings,
    #[serde(default)]
    pub webhook: WebhookSettings,
    pub cms: CmsSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub base_url: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct StoreSettings {
    pub path: PathBuf,
}

#[derive(serde::Deserialize, Clone)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender_email: String,
    // When present, the transactional API provider wins over SMTP
    pub api_key: Option<Secret<String>>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
    pub smtp: SmtpSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct SmtpSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub username: Option<String>,
    // secrecy protects secret information and prevents them to be exposed (eg: via logs)
    pub password: Option<Secret<String>>,
    pub from_name: String,
}

#[derive(serde::Deserialize, Clone, Default)]
pub struct AdminSettings {
    pub email: Option<String>,
    pub stats_token: Option<Secret<String>>,
}

#[derive(serde::Deserialize, Clone, Default)]
pub struct WebhookSettings {
    pub secret: Option<Secret<String>>,
}

#[derive(serde::Deserialize, Clone)]
pub struct CmsSettings {
    pub base_url: String,
    pub blog_id: String,
}

impl Settings {
    pub fn get_address(&self) -> String {
        format!(
            "{}:{}",
            self.application.get_host(),
            self.application.get_port()
        )
    }

    pub fn get_app_base_url(&self) -> String {
        self.application.get_base_url()
    }

    pub fn get_email_client_timeout(&self) -> time::Duration {
        self.email_client.get_timeout()
    }

    pub fn get_store_path(&self) -> PathBuf {
        self.store.path.clone()
    }

    pub fn get_cms_base_url(&self) -> String {
        self.cms.base_url.clone()
    }

    /// Address that receives a notification for every new subscriber.
    ///
    /// Falls back to the SMTP account and then to the transactional sender, so a
    /// single-person blog gets notified without extra configuration.
    pub fn get_admin_notification_address(&self) -> Option<String> {
        self.admin
            .email
            .clone()
            .or_else(|| self.email_client.smtp.username.clone())
            .or_else(|| {
                self.email_client
                    .api_key
                    .as_ref()
                    .map(|_| self.email_client.sender_email.clone())
            })
            .filter(|address| !address.trim().is_empty())
    }

    /// Bearer token guarding the stats endpoint. Blank counts as unset.
    pub fn get_admin_stats_token(&self) -> Option<Secret<String>> {
        non_blank(self.admin.stats_token.as_ref())
    }

    /// Shared secret of the new post webhook. Blank counts as unset.
    pub fn get_webhook_secret(&self) -> Option<Secret<String>> {
        non_blank(self.webhook.secret.as_ref())
    }

    pub fn set_app_port(&mut self, port: u16) {
        self.application.port = port;
    }

    pub fn set_email_client_base_url(&mut self, new_base_url: String) {
        self.email_client.set_base_url(new_base_url)
    }

    pub fn set_email_client_api_key(&mut self, api_key: Option<Secret<String>>) {
        self.email_client.api_key = api_key;
    }

    pub fn set_store_path(&mut self, path: PathBuf) {
        self.store.path = path;
    }

    pub fn set_cms_base_url(&mut self, base_url: String) {
        self.cms.base_url = base_url;
    }

    pub fn set_admin_email(&mut self, email: Option<String>) {
        self.admin.email = email;
    }

    pub fn set_admin_stats_token(&mut self, token: Option<Secret<String>>) {
        self.admin.stats_token = token;
    }

    pub fn set_webhook_secret(&mut self, secret: Option<Secret<String>>) {
        self.webhook.secret = secret;
    }
}

impl ApplicationSettings {
    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_host(&self) -> String {
        self.host.clone()
    }

    pub fn get_base_url(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }
}

impl EmailClientSettings {
    pub fn get_sender_email(&self) -> Result<SubscriberEmail, String> {
        SubscriberEmail::parse(self.sender_email.clone())
    }

    pub fn get_base_url(&self) -> String {
        self.base_url.clone()
    }

    pub fn get_timeout(&self) -> time::Duration {
        time::Duration::from_millis(self.timeout_milliseconds)
    }

    pub fn set_base_url(&mut self, new_base_url: String) {
        self.base_url = new_base_url
    }
}

impl SmtpSettings {
    /// Username and password, only when both are present and non empty.
    pub fn get_credentials(&self) -> Option<(String, Secret<String>)> {
        let username = self.username.as_ref().filter(|u| !u.trim().is_empty())?;
        let password = self
            .password
            .as_ref()
            .filter(|p| !p.expose_secret().is_empty())?;

        Some((username.clone(), password.clone()))
    }
}

fn non_blank(secret: Option<&Secret<String>>) -> Option<Secret<String>> {
    secret
        .filter(|secret| !secret.expose_secret().trim().is_empty())
        .cloned()
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            unknown_env => Err(format!(
                "{} is not supported environment. Use either 'development' or 'production'.",
                unknown_env
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let root_path = std::env::current_dir()
        .map_err(|err| ConfigError::Message(format!("Failed to determine the current directory: {}", err)))?;
    let config_directory = root_path.join("config");
    // Uses development environment by default
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "development".into())
        .try_into()
        .map_err(ConfigError::Message)?;
    let config_base_filepath = config_directory.join("base");
    let config_env_filepath = config_directory.join(environment.as_str());

    // It merges the base configuration file with the one from the specific environment (development or production)
    let settings = Config::builder()
        .add_source(File::from(config_base_filepath).required(true))
        .add_source(File::from(config_env_filepath).required(true))
        // Merge settings from environment variables with a prefix of APP and "__" separator
        // E.g APP_WEBHOOK__SECRET would set Settings.webhook.secret
        .add_source(config::Environment::with_prefix("app").separator("__"))
        .build()?;

    tracing::info!("Application environment = {:?}", environment);

    // Try to convert the value from the configuration file into a Settings type
    settings.try_deserialize()
}
