use reqwest::Client;
use std::time;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

/// Read-only access to the headless CMS that hosts the blog posts.
pub struct CmsClient {
    http_client: Client,
    base_url: String,
    blog_id: String,
}

#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq)]
pub struct PostSummary {
    pub title: String,
    pub slug: String,
}

#[derive(serde::Deserialize)]
struct PostsPage {
    #[serde(default)]
    posts: Vec<PostSummary>,
}

impl CmsClient {
    pub fn new(
        base_url: String,
        blog_id: String,
        timeout: Option<time::Duration>,
    ) -> Result<CmsClient, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()?;

        Ok(CmsClient {
            http_client,
            base_url,
            blog_id,
        })
    }

    /// The most recently published post, if the blog has any.
    #[tracing::instrument(name = "Fetch the latest post from the CMS", skip(self))]
    pub async fn latest_post(&self) -> Result<Option<PostSummary>, reqwest::Error> {
        let url = format!("{}/api/v1/{}/posts", self.base_url, self.blog_id);

        let page: PostsPage = self
            .http_client
            .get(&url)
            .query(&[("limit", "1"), ("page", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(page.posts.into_iter().next())
    }
}
