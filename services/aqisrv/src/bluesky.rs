//! Bluesky (AT Protocol XRPC) client
//!
//! The account's own feed doubles as the job's only state: the latest post
//! tells us which band we last announced and when. One session is created
//! lazily per client and shared by the read and the write.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{AqiSrvError, Result};

const SERVICE: &str = "Bluesky";
const POST_COLLECTION: &str = "app.bsky.feed.post";

/// The most recent post by our own account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorPost {
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub uri: String,
}

/// A post we just created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedPost {
    pub uri: String,
    pub cid: String,
}

/// Where status posts are read from and written to
#[async_trait]
pub trait StatusFeed: Send + Sync {
    /// Latest post authored by the account, if it has any
    async fn latest_post(&self) -> Result<Option<PriorPost>>;

    /// Publish a plain-text post
    async fn publish(&self, text: &str) -> Result<PublishedPost>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    access_jwt: String,
    did: String,
    handle: String,
}

#[derive(Debug, Deserialize)]
struct AuthorFeed {
    feed: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    post: FeedPost,
    /// Present on reposts
    #[serde(default)]
    reason: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FeedPost {
    uri: String,
    author: FeedAuthor,
    record: PostRecord,
}

#[derive(Debug, Deserialize)]
struct FeedAuthor {
    did: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostRecord {
    text: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
struct XrpcError {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct BlueskyClient {
    http: Client,
    service_url: String,
    identifier: String,
    password: String,
    feed_limit: u8,
    session: OnceCell<Session>,
}

impl BlueskyClient {
    pub fn new(
        http: Client,
        service_url: impl Into<String>,
        identifier: impl Into<String>,
        password: impl Into<String>,
        feed_limit: u8,
    ) -> Self {
        Self {
            http,
            service_url: service_url.into().trim_end_matches('/').to_string(),
            identifier: identifier.into(),
            password: password.into(),
            feed_limit,
            session: OnceCell::new(),
        }
    }

    fn xrpc_url(&self, method: &str) -> String {
        format!("{}/xrpc/{}", self.service_url, method)
    }

    async fn session(&self) -> Result<&Session> {
        self.session.get_or_try_init(|| self.create_session()).await
    }

    async fn create_session(&self) -> Result<Session> {
        debug!("Creating Bluesky session for {}", self.identifier);
        let response = self
            .http
            .post(self.xrpc_url("com.atproto.server.createSession"))
            .json(&json!({
                "identifier": self.identifier,
                "password": self.password,
            }))
            .send()
            .await?;

        let session: Session = read_json(response, "createSession").await?;
        info!("Logged in to Bluesky as {}", session.handle);
        Ok(session)
    }
}

#[async_trait]
impl StatusFeed for BlueskyClient {
    async fn latest_post(&self) -> Result<Option<PriorPost>> {
        let session = self.session().await?;
        let limit = self.feed_limit.to_string();

        let response = self
            .http
            .get(self.xrpc_url("app.bsky.feed.getAuthorFeed"))
            .bearer_auth(&session.access_jwt)
            .query(&[
                ("actor", session.did.as_str()),
                ("limit", limit.as_str()),
                ("filter", "posts_no_replies"),
            ])
            .send()
            .await?;

        let feed: AuthorFeed = read_json(response, "getAuthorFeed").await?;
        debug!("Author feed returned {} items", feed.feed.len());

        Ok(feed
            .feed
            .into_iter()
            .find(|item| item.reason.is_none() && item.post.author.did == session.did)
            .map(|item| PriorPost {
                text: item.post.record.text,
                created_at: item.post.record.created_at,
                uri: item.post.uri,
            }))
    }

    async fn publish(&self, text: &str) -> Result<PublishedPost> {
        let session = self.session().await?;
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        let response = self
            .http
            .post(self.xrpc_url("com.atproto.repo.createRecord"))
            .bearer_auth(&session.access_jwt)
            .json(&json!({
                "repo": session.did,
                "collection": POST_COLLECTION,
                "record": {
                    "$type": POST_COLLECTION,
                    "text": text,
                    "createdAt": created_at,
                },
            }))
            .send()
            .await?;

        let post: PublishedPost = read_json(response, "createRecord").await?;
        info!("Published post {}", post.uri);
        Ok(post)
    }
}

/// Turn an XRPC response into `T`, or an error carrying the XRPC error body
async fn read_json<T: DeserializeOwned>(response: Response, method: &str) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let detail: XrpcError = serde_json::from_str(&body).unwrap_or_default();
        return Err(AqiSrvError::Bluesky(format!(
            "{} failed with status {}: {} {}",
            method,
            status,
            detail.error.unwrap_or_default(),
            detail.message.unwrap_or(body),
        )));
    }

    serde_json::from_str(&body)
        .map_err(|e| AqiSrvError::malformed(SERVICE, format!("{}: {}", method, e)))
}
