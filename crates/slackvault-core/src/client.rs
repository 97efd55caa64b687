//! HTTP implementation of [`SlackApi`].
//!
//! Every method is a form-encoded POST against `<base>/<method>` with bearer
//! auth. Session tokens additionally carry the `d` cookie. Rate limits come
//! back as [`SlackError::RateLimited`]; retrying is left to the caller.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use slackvault_traits::api::method;
use slackvault_traits::{
    Channel, FileInfo, HistoryParams, ListChannelsParams, Message, Page, RepliesParams,
    SearchMatch, SearchParams, SearchResults, SlackApi, SlackError, User,
};
use tracing::debug;

use crate::config::SlackConfig;
use crate::error::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);
const MAX_ERROR_BODY: usize = 512;
const RATE_LIMITED_CODE: &str = "ratelimited";

/// Wait requested by a 429 response. Missing or unparseable values fall back
/// to one second.
fn parse_retry_after(response: &Response) -> Duration {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

fn truncate_body(body: String) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body;
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &body[..end])
}

fn transport(err: reqwest::Error) -> SlackError {
    SlackError::Transport(err.to_string())
}

#[derive(Debug, Default, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Debug, Deserialize)]
struct ChannelsResponse {
    #[serde(default)]
    channels: Vec<Channel>,
    #[serde(default)]
    response_metadata: ResponseMetadata,
}

#[derive(Debug, Deserialize)]
struct ChannelResponse {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    response_metadata: ResponseMetadata,
}

impl MessagesResponse {
    fn into_page(self) -> Page<Message> {
        Page {
            items: self.messages,
            has_more: self.has_more,
            next_cursor: self.response_metadata.next_cursor,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    user: User,
}

#[derive(Debug, Default, Deserialize)]
struct SearchBody {
    #[serde(default)]
    total: u32,
    #[serde(default)]
    matches: Vec<SearchMatch>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    messages: SearchBody,
}

#[derive(Debug, Deserialize)]
struct PermalinkResponse {
    permalink: String,
}

#[derive(Debug, Deserialize)]
struct FileResponse {
    file: FileInfo,
}

/// Remote client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct SlackHttpClient {
    client: Client,
    config: SlackConfig,
}

impl SlackHttpClient {
    pub fn new(config: SlackConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        if let Some(cookie) = &config.cookie {
            let mut value = HeaderValue::from_str(&format!("d={cookie}"))
                .map_err(|e| Error::Config(format!("invalid cookie: {e}")))?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &SlackConfig {
        &self.config
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.config.token)
    }

    /// Check the HTTP status, mapping 429 and other failures.
    async fn check_status(response: Response) -> slackvault_traits::Result<Response> {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SlackError::rate_limited(parse_retry_after(&response)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Status {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }
        Ok(response)
    }

    /// Call a remote method and decode its payload after checking `ok`.
    async fn call<T: DeserializeOwned>(
        &self,
        api_method: &'static str,
        form: &[(&str, String)],
    ) -> slackvault_traits::Result<T> {
        debug!(api_method, "Slack API request");
        let request = self
            .authorized(self.client.post(self.config.method_url(api_method)))
            .form(form);
        let response = Self::check_status(request.send().await.map_err(transport)?).await?;
        let payload: Value = response.json().await.map_err(transport)?;
        decode_payload(payload)
    }
}

/// Interpret a JSON payload: `ok: false` becomes an error, anything else is
/// decoded into `T`.
fn decode_payload<T: DeserializeOwned>(payload: Value) -> slackvault_traits::Result<T> {
    if !payload.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        let code = payload
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error");
        if code == RATE_LIMITED_CODE {
            return Err(SlackError::rate_limited(DEFAULT_RETRY_AFTER));
        }
        return Err(SlackError::api(code));
    }
    serde_json::from_value(payload).map_err(|e| SlackError::Decode(e.to_string()))
}

fn push_opt(form: &mut Vec<(&'static str, String)>, key: &'static str, value: &Option<String>) {
    if let Some(value) = value.as_ref().filter(|v| !v.is_empty()) {
        form.push((key, value.clone()));
    }
}

fn push_cursor(form: &mut Vec<(&'static str, String)>, cursor: &str) {
    if !cursor.is_empty() {
        form.push(("cursor", cursor.to_string()));
    }
}

#[async_trait]
impl SlackApi for SlackHttpClient {
    async fn list_channels(
        &self,
        params: &ListChannelsParams,
    ) -> slackvault_traits::Result<Page<Channel>> {
        let mut form = vec![
            ("types", params.types.join(",")),
            ("limit", params.limit.to_string()),
            ("exclude_archived", params.exclude_archived.to_string()),
        ];
        push_cursor(&mut form, &params.cursor);

        let response: ChannelsResponse = self.call(method::LIST_CHANNELS, &form).await?;
        let next_cursor = response.response_metadata.next_cursor;
        Ok(Page {
            items: response.channels,
            has_more: !next_cursor.is_empty(),
            next_cursor,
        })
    }

    async fn channel_info(&self, channel_id: &str) -> slackvault_traits::Result<Channel> {
        let form = [("channel", channel_id.to_string())];
        let response: ChannelResponse = self.call(method::CHANNEL_INFO, &form).await?;
        Ok(response.channel)
    }

    async fn history(&self, params: &HistoryParams) -> slackvault_traits::Result<Page<Message>> {
        let mut form = vec![
            ("channel", params.channel.clone()),
            ("limit", params.limit.to_string()),
        ];
        push_opt(&mut form, "oldest", &params.oldest);
        push_opt(&mut form, "latest", &params.latest);
        push_cursor(&mut form, &params.cursor);

        let response: MessagesResponse = self.call(method::HISTORY, &form).await?;
        Ok(response.into_page())
    }

    async fn replies(&self, params: &RepliesParams) -> slackvault_traits::Result<Page<Message>> {
        let mut form = vec![
            ("channel", params.channel.clone()),
            ("ts", params.ts.clone()),
            ("limit", params.limit.to_string()),
        ];
        push_cursor(&mut form, &params.cursor);

        let response: MessagesResponse = self.call(method::REPLIES, &form).await?;
        Ok(response.into_page())
    }

    async fn user_info(&self, user_id: &str) -> slackvault_traits::Result<User> {
        let form = [("user", user_id.to_string())];
        let response: UserResponse = self.call(method::USER_INFO, &form).await?;
        Ok(response.user)
    }

    async fn user_by_email(&self, email: &str) -> slackvault_traits::Result<User> {
        let form = [("email", email.to_string())];
        let response: UserResponse = self.call(method::USER_BY_EMAIL, &form).await?;
        Ok(response.user)
    }

    async fn search_messages(
        &self,
        params: &SearchParams,
    ) -> slackvault_traits::Result<SearchResults> {
        let form = [
            ("query", params.query.clone()),
            ("sort", params.sort.as_str().to_string()),
            ("sort_dir", "desc".to_string()),
            ("count", params.count.to_string()),
        ];
        let response: SearchResponse = self.call(method::SEARCH_MESSAGES, &form).await?;
        Ok(SearchResults {
            total: response.messages.total,
            matches: response.messages.matches,
        })
    }

    async fn permalink(&self, channel_id: &str, ts: &str) -> slackvault_traits::Result<String> {
        let form = [
            ("channel", channel_id.to_string()),
            ("message_ts", ts.to_string()),
        ];
        let response: PermalinkResponse = self.call(method::PERMALINK, &form).await?;
        Ok(response.permalink)
    }

    async fn file_info(&self, file_id: &str) -> slackvault_traits::Result<FileInfo> {
        let form = [("file", file_id.to_string())];
        let response: FileResponse = self.call(method::FILE_INFO, &form).await?;
        Ok(response.file)
    }

    async fn download_file(&self, url: &str) -> slackvault_traits::Result<Bytes> {
        debug!(api_method = method::DOWNLOAD_FILE, "Slack file download");
        let request = self.authorized(self.client.get(url));
        let response = Self::check_status(request.send().await.map_err(transport)?).await?;
        response.bytes().await.map_err(transport)
    }
}
