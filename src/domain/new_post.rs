use actix_web::web;
use serde::Deserialize;

/// A "new post published" trigger coming from the CMS webhook.
#[derive(Debug, Clone)]
pub struct NewPostEvent {
    pub post_id: String,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub author_name: Option<String>,
}

/// CMS post ids arrive either as strings or as numbers.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum PostId {
    Text(String),
    Number(serde_json::Number),
}

impl From<PostId> for String {
    fn from(id: PostId) -> Self {
        match id {
            PostId::Text(text) => text,
            PostId::Number(number) => number.to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewPostBody {
    pub post_id: Option<PostId>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub author_name: Option<String>,
}

fn required(value: Option<String>, field: &str) -> Result<String, String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(format!("{} is required", field)),
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl TryFrom<NewPostBody> for NewPostEvent {
    type Error = String;

    fn try_from(body: NewPostBody) -> Result<Self, Self::Error> {
        Ok(NewPostEvent {
            post_id: required(body.post_id.map(String::from), "postId")?,
            title: required(body.title, "title")?,
            slug: required(body.slug, "slug")?,
            description: optional(body.description),
            author_name: optional(body.author_name),
        })
    }
}

impl TryFrom<web::Json<NewPostBody>> for NewPostEvent {
    type Error = String;

    fn try_from(body: web::Json<NewPostBody>) -> Result<Self, Self::Error> {
        body.into_inner().try_into()
    }
}
