//! Chat scenarios that verify what the assistant actually did.
//!
//! Each scenario sends one command, handles a permission prompt if one
//! appears, waits for the response and then checks the filesystem or the
//! response text. The run succeeds only when the response reads as a success
//! and the check holds.

use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::chat::{self, PermissionMode};
use crate::config;
use crate::harness::executor::Scenario;
use crate::harness::types::{HarnessResult, Outcome};
use crate::instance::Instance;

/// Verification applied after the response completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    /// Only the response classification counts
    None,
    /// The file must exist
    FileExists(PathBuf),
    /// The file must exist and contain `needle`
    FileContains { path: PathBuf, needle: String },
    /// The response text must contain the given text
    ResponseContains(String),
}

/// What to do when a permission prompt appears
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptAction {
    #[default]
    Approve,
    Deny,
}

#[derive(Debug, Clone)]
pub struct ChatScenario {
    pub id: String,
    pub command: String,
    pub check: Check,
    pub on_prompt: PromptAction,
    pub response_timeout: Duration,
    /// Permission mode to switch to before sending, if any
    pub mode: Option<PermissionMode>,
    pub mode_switch_attempts: u32,
    pub mode_switch_pause: Duration,
}

impl ChatScenario {
    pub fn new(id: impl Into<String>, command: impl Into<String>, check: Check) -> Self {
        let harness = &config::get().harness;
        Self {
            id: id.into(),
            command: command.into(),
            check,
            on_prompt: PromptAction::default(),
            response_timeout: harness.response_timeout,
            mode: None,
            mode_switch_attempts: harness.mode_switch_attempts,
            mode_switch_pause: harness.mode_switch_pause,
        }
    }

    /// Ask the assistant to create a file with the given content
    pub fn write_file(id: impl Into<String>, path: impl Into<PathBuf>, content: &str) -> Self {
        let path = path.into();
        let command = format!(
            "Create a test file at {} with content \"{}\"",
            path.display(),
            content
        );
        Self::new(id, command, Check::FileExists(path))
    }

    /// Ask the assistant to create a file by echoing through bash
    pub fn bash_echo(id: impl Into<String>, path: impl Into<PathBuf>, text: &str) -> Self {
        let path = path.into();
        let command = format!("Use bash to echo \"{}\" > {}", text, path.display());
        Self::new(
            id,
            command,
            Check::FileContains {
                path,
                needle: text.to_string(),
            },
        )
    }

    /// Ask the assistant to create an empty file with `touch`
    pub fn bash_touch(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let command = format!("Use bash touch command to create {}", path.display());
        Self::new(id, command, Check::FileExists(path))
    }

    /// Ask the assistant to read a file; its reply must quote `expected`
    pub fn read_file(id: impl Into<String>, path: impl Into<PathBuf>, expected: &str) -> Self {
        let path = path.into();
        let command = format!("Read the file at {} and tell me its content", path.display());
        Self::new(id, command, Check::ResponseContains(expected.to_string()))
    }

    /// Ask the assistant to rewrite a file's content
    pub fn edit_file(id: impl Into<String>, path: impl Into<PathBuf>, replacement: &str) -> Self {
        let path = path.into();
        let command = format!(
            "Edit {} and change the content to \"{}\"",
            path.display(),
            replacement
        );
        Self::new(
            id,
            command,
            Check::FileContains {
                path,
                needle: replacement.to_string(),
            },
        )
    }

    pub fn deny_prompts(mut self) -> Self {
        self.on_prompt = PromptAction::Deny;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Run in `mode`, e.g. bypass permissions
    pub fn in_mode(mut self, mode: PermissionMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_mode_switch(mut self, attempts: u32, pause: Duration) -> Self {
        self.mode_switch_attempts = attempts;
        self.mode_switch_pause = pause;
        self
    }

    /// Remove the file this scenario verifies, if any
    pub async fn cleanup(&self) {
        match &self.check {
            Check::FileExists(path) | Check::FileContains { path, .. } => {
                chat::delete_test_file(path).await
            }
            Check::None | Check::ResponseContains(_) => {}
        }
    }

    async fn verify(&self, response_text: &str) -> bool {
        match &self.check {
            Check::None => true,
            Check::FileExists(path) => chat::file_exists(path).await,
            Check::FileContains { path, needle } => tokio::fs::read_to_string(path)
                .await
                .map(|content| content.contains(needle.as_str()))
                .unwrap_or(false),
            Check::ResponseContains(text) => response_text.contains(text.as_str()),
        }
    }
}

#[async_trait]
impl Scenario for ChatScenario {
    async fn run(&self, instance: &dyn Instance) -> HarnessResult<Outcome> {
        if let Some(mode) = self.mode {
            chat::switch_permission_mode(instance, mode, self.mode_switch_attempts, self.mode_switch_pause)
                .await?;
        }
        chat::send_message(instance, &self.command).await?;

        let prompted = chat::verify_permission_prompt(instance).await;
        if prompted {
            match self.on_prompt {
                PromptAction::Approve => chat::approve_permission(instance).await?,
                PromptAction::Deny => chat::deny_permission(instance).await?,
            }
        }

        let response = chat::wait_for_response(instance, self.response_timeout).await?;
        let verified = self.verify(&response.text).await;
        debug!(
            scenario = %self.id,
            instance = instance.name(),
            prompted,
            verified,
            "chat scenario complete"
        );

        Ok(Outcome {
            succeeded: response.success && verified,
            response_text: response.text,
            error_message: response.error,
            permission_was_prompted: prompted,
            observed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::types::HarnessError;
    use crate::instance::{MockBehavior, MockInstance};

    async fn ready(behavior: MockBehavior) -> MockInstance {
        let app = MockInstance::new("old-app", behavior);
        chat::select_project(&app, "/work/project").await.unwrap();
        app
    }

    #[tokio::test]
    async fn test_write_file_succeeds_when_file_appears() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("w1.txt");
        let app = ready(MockBehavior {
            prompts_for_permission: true,
            writes_file: Some((target.clone(), "test from automated test".to_string())),
            ..MockBehavior::default()
        })
        .await;

        let scenario = ChatScenario::write_file("W1", &target, "test from automated test");
        assert_eq!(
            scenario.command,
            format!(
                "Create a test file at {} with content \"test from automated test\"",
                target.display()
            )
        );

        let outcome = scenario.run(&app).await.unwrap();
        assert!(outcome.succeeded);
        assert!(outcome.permission_was_prompted);
        assert_eq!(outcome.error_message, None);

        scenario.cleanup().await;
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_missing_file_fails_without_error_message() {
        let tmp = tempfile::tempdir().unwrap();
        let app = ready(MockBehavior::default()).await;

        let outcome = ChatScenario::bash_touch("B2", tmp.path().join("never.txt"))
            .run(&app)
            .await
            .unwrap();

        // The reply reads as a success, but the filesystem disagrees
        assert!(!outcome.succeeded);
        assert_eq!(outcome.error_message, None);
    }

    #[tokio::test]
    async fn test_denied_prompt_reports_error() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("denied.txt");
        let app = ready(MockBehavior {
            prompts_for_permission: true,
            writes_file: Some((target.clone(), "denied".to_string())),
            ..MockBehavior::default()
        })
        .await;

        let outcome = ChatScenario::write_file("P3", &target, "denied")
            .deny_prompts()
            .run(&app)
            .await
            .unwrap();

        assert!(!outcome.succeeded);
        assert!(outcome.permission_was_prompted);
        assert!(outcome.error_message.is_some());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_edit_and_read_checks() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("edit.txt");
        std::fs::write(&target, "Original content").unwrap();

        let app = ready(MockBehavior {
            writes_file: Some((target.clone(), "Modified content".to_string())),
            response_text: "The file now says Modified content".to_string(),
            ..MockBehavior::default()
        })
        .await;
        let edited = ChatScenario::edit_file("E1", &target, "Modified content")
            .run(&app)
            .await
            .unwrap();
        assert!(edited.succeeded);

        let read = ChatScenario::read_file("R1", &target, "Modified content")
            .run(&app)
            .await
            .unwrap();
        assert!(read.succeeded);
        assert_eq!(read.response_text, "The file now says Modified content");
    }

    #[tokio::test]
    async fn test_mode_switch_budget_comes_from_config() {
        let scenario = ChatScenario::new("X", "hello", Check::None);
        assert_eq!(scenario.mode, None);
        assert_eq!(scenario.mode_switch_attempts, config::get().harness.mode_switch_attempts);
        assert_eq!(scenario.mode_switch_pause, config::get().harness.mode_switch_pause);
    }

    #[tokio::test]
    async fn test_bypass_mode_skips_prompt() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("bypass-test.txt");
        let app = ready(MockBehavior {
            prompts_for_permission: true,
            writes_file: Some((target.clone(), "bypass mode test".to_string())),
            ..MockBehavior::default()
        })
        .await;

        let bypass = ChatScenario::write_file("BP-W1", &target, "bypass mode test")
            .in_mode(PermissionMode::BypassPermissions)
            .with_mode_switch(4, Duration::from_millis(1));
        let outcome = bypass.run(&app).await.unwrap();
        assert!(outcome.succeeded);
        assert!(!outcome.permission_was_prompted);
        assert!(target.exists());
        assert_eq!(app.mode(), PermissionMode::BypassPermissions);
        bypass.cleanup().await;

        // Back in normal mode the prompt returns
        let normal = ChatScenario::write_file("BP-SWITCH", &target, "bypass mode test")
            .in_mode(PermissionMode::Normal)
            .with_mode_switch(4, Duration::from_millis(1));
        let outcome = normal.run(&app).await.unwrap();
        assert_eq!(app.mode(), PermissionMode::Normal);
        assert!(outcome.permission_was_prompted);
        assert!(outcome.succeeded);
        normal.cleanup().await;
    }

    #[tokio::test]
    async fn test_unreachable_mode_fails_before_sending() {
        let app = ready(MockBehavior::default()).await;
        let result = ChatScenario::new("BP-X", "hello", Check::None)
            .in_mode(PermissionMode::BypassPermissions)
            .with_mode_switch(1, Duration::from_millis(1))
            .run(&app)
            .await;

        assert!(matches!(result, Err(HarnessError::ModeSwitch { .. })));
        assert!(!app.actions().iter().any(|a| a.starts_with("fill:")));
    }

    #[tokio::test]
    async fn test_instance_failure_propagates() {
        let app = MockInstance::new("old-app", MockBehavior::default());
        // No project selected, so the message field is not on the page
        let result = ChatScenario::new("X", "hello", Check::None).run(&app).await;
        assert!(result.is_err());
    }
}
