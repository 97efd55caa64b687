//! Best-effort author name resolution, cached per call.

use std::collections::HashMap;

use slackvault_traits::SlackApi;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Result;
use crate::retry::with_retry;

/// Per-call cache from user ID to display handle.
///
/// Lookups that fail degrade to an empty name and are cached as such, so a
/// missing user costs one remote call per invocation. Only cancellation is
/// propagated.
#[derive(Debug, Default)]
pub struct AuthorNames {
    names: HashMap<String, String>,
}

impl AuthorNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn name_of(
        &mut self,
        api: &dyn SlackApi,
        cancel: &CancellationToken,
        user_id: &str,
    ) -> Result<String> {
        if user_id.is_empty() {
            return Ok(String::new());
        }
        if let Some(name) = self.names.get(user_id) {
            return Ok(name.clone());
        }

        let name = match with_retry(cancel, "failed to get user", || api.user_info(user_id)).await {
            Ok(user) => user.name,
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                debug!(user_id, error = %e, "Author name lookup failed");
                String::new()
            }
        };
        self.names.insert(user_id.to_string(), name.clone());
        Ok(name)
    }

    /// Resolve every distinct author in `user_ids`, in first-seen order.
    pub async fn prefetch(
        &mut self,
        api: &dyn SlackApi,
        cancel: &CancellationToken,
        user_ids: &[String],
    ) -> Result<()> {
        for user_id in user_ids {
            self.name_of(api, cancel, user_id).await?;
        }
        Ok(())
    }

    /// Cached name, empty when unknown.
    pub fn get(&self, user_id: &str) -> String {
        self.names.get(user_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use slackvault_traits::api::method;
    use slackvault_traits::testing::ScriptedSlack;
    use slackvault_traits::{SlackError, User};

    use super::*;

    #[tokio::test]
    async fn each_author_is_looked_up_once() {
        let slack = ScriptedSlack::new().with_user(User::new("U1", "alice"));
        let cancel = CancellationToken::new();
        let mut names = AuthorNames::new();

        assert_eq!(names.name_of(&slack, &cancel, "U1").await.unwrap(), "alice");
        assert_eq!(names.name_of(&slack, &cancel, "U1").await.unwrap(), "alice");
        assert_eq!(names.name_of(&slack, &cancel, "").await.unwrap(), "");
        assert_eq!(slack.calls(method::USER_INFO), 1);
    }

    #[tokio::test]
    async fn failed_lookups_degrade_to_empty() {
        let slack = ScriptedSlack::new();
        let cancel = CancellationToken::new();
        let mut names = AuthorNames::new();

        assert_eq!(names.name_of(&slack, &cancel, "U404").await.unwrap(), "");
        assert_eq!(names.name_of(&slack, &cancel, "U404").await.unwrap(), "");
        assert_eq!(slack.calls(method::USER_INFO), 1);
    }

    #[tokio::test]
    async fn auth_failures_are_swallowed_too() {
        let slack = ScriptedSlack::new().with_user(User::new("U1", "alice"));
        slack.fail_next(method::USER_INFO, SlackError::api("invalid_auth"));
        let mut names = AuthorNames::new();

        let name = names
            .name_of(&slack, &CancellationToken::new(), "U1")
            .await
            .unwrap();
        assert_eq!(name, "");
    }

    #[tokio::test]
    async fn prefetch_resolves_distinct_authors() {
        let slack = ScriptedSlack::new()
            .with_user(User::new("U1", "alice"))
            .with_user(User::new("U2", "bob"));
        let mut names = AuthorNames::new();
        let user_ids = vec!["U1".to_string(), "U2".to_string(), "U1".to_string()];

        names
            .prefetch(&slack, &CancellationToken::new(), &user_ids)
            .await
            .unwrap();

        assert_eq!(names.get("U1"), "alice");
        assert_eq!(names.get("U2"), "bob");
        assert_eq!(names.get("U3"), "");
        assert_eq!(slack.calls(method::USER_INFO), 2);
    }

    #[tokio::test]
    async fn cancellation_propagates() {
        let slack = ScriptedSlack::new().with_user(User::new("U1", "alice"));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut names = AuthorNames::new();

        let err = names.name_of(&slack, &cancel, "U1").await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(slack.calls(method::USER_INFO), 0);
    }
}
