//! Reusable chat-page interactions shared by every scenario.
//!
//! These helpers only speak to the [`Instance`] primitives, so they behave the
//! same against both applications under test.

use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config;
use crate::harness::types::{HarnessError, HarnessResult};
use crate::instance::{Instance, InstanceError};

/// Chat message textarea
pub const MESSAGE_INPUT: &str = r#"textarea[placeholder*="Type message"]"#;

/// Submit button (labelled "Plan" while in plan mode)
pub const SEND_BUTTON: &str =
    r#"button[type="submit"]:has-text("Send"), button[type="submit"]:has-text("Plan")"#;

/// Indicator shown while the assistant is responding
pub const LOADING_INDICATOR: &str = "text=Processing..., text=...";

/// Most recent assistant message
pub const LAST_MESSAGE: &str = r#"[role="article"] >> nth=-1"#;

/// Permission prompt approve button
pub const ALLOW_BUTTON: &str = r#"button:has-text("Allow")"#;

/// Permission prompt deny button
pub const DENY_BUTTON: &str = r#"button:has-text("Deny")"#;

/// Button cycling through the permission modes
pub const MODE_BUTTON: &str = r#"button:has-text("normal mode"), button:has-text("plan mode"), button:has-text("accept edits"), button:has-text("bypass permissions")"#;

/// Words that mark an assistant response as a failure
const FAILURE_MARKERS: [&str; 3] = ["error", "failed", "cannot"];

/// Permission modes, in the order the mode button cycles through them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionMode {
    #[default]
    Normal,
    Plan,
    AcceptEdits,
    BypassPermissions,
}

impl PermissionMode {
    /// Text the mode button shows for this mode
    pub fn label(self) -> &'static str {
        match self {
            PermissionMode::Normal => "normal mode",
            PermissionMode::Plan => "plan mode",
            PermissionMode::AcceptEdits => "accept edits",
            PermissionMode::BypassPermissions => "bypass permissions",
        }
    }

    /// Mode reached by one click on the mode button
    pub fn next(self) -> Self {
        match self {
            PermissionMode::Normal => PermissionMode::Plan,
            PermissionMode::Plan => PermissionMode::AcceptEdits,
            PermissionMode::AcceptEdits => PermissionMode::BypassPermissions,
            PermissionMode::BypassPermissions => PermissionMode::Normal,
        }
    }
}

/// Assistant response as read from the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    pub success: bool,
    pub text: String,
    /// The full response text when it reads as a failure
    pub error: Option<String>,
}

impl ChatResponse {
    /// Classify a response text by its failure markers
    pub fn from_text(text: String) -> Self {
        let lowered = text.to_lowercase();
        let has_error = FAILURE_MARKERS.iter().any(|marker| lowered.contains(marker));
        Self {
            success: !has_error,
            error: has_error.then(|| text.clone()),
            text,
        }
    }
}

/// Open a project's chat page
pub async fn select_project(instance: &dyn Instance, project_path: &str) -> HarnessResult<()> {
    debug!(instance = instance.name(), project_path, "selecting project");
    instance.navigate(&format!("/projects{}", project_path)).await?;
    Ok(())
}

/// Type a message and submit it
pub async fn send_message(instance: &dyn Instance, message: &str) -> HarnessResult<()> {
    instance.fill_field(MESSAGE_INPUT, message).await?;
    instance.click(SEND_BUTTON).await?;
    Ok(())
}

/// Wait for the assistant to finish and read its last message.
///
/// A loading indicator that never hides is tolerated: the last message is read
/// regardless, as the response may already be complete.
pub async fn wait_for_response(instance: &dyn Instance, timeout: Duration) -> HarnessResult<ChatResponse> {
    match instance.wait_for_element_hidden(LOADING_INDICATOR, timeout).await {
        Ok(()) => {}
        Err(InstanceError::Timeout { .. }) => {
            debug!(instance = instance.name(), "loading indicator still visible after {:?}", timeout);
        }
        Err(err) => return Err(err.into()),
    }

    let text = match instance.read_element_text(LAST_MESSAGE).await {
        Ok(text) => text,
        Err(InstanceError::ElementNotFound(_)) => String::new(),
        Err(err) => return Err(err.into()),
    };
    Ok(ChatResponse::from_text(text))
}

/// Whether a permission prompt is showing. Lookup failures count as no prompt.
pub async fn verify_permission_prompt(instance: &dyn Instance) -> bool {
    instance.is_element_visible(ALLOW_BUTTON).await.unwrap_or(false)
}

pub async fn approve_permission(instance: &dyn Instance) -> HarnessResult<()> {
    instance.click(ALLOW_BUTTON).await?;
    Ok(())
}

pub async fn deny_permission(instance: &dyn Instance) -> HarnessResult<()> {
    instance.click(DENY_BUTTON).await?;
    Ok(())
}

/// Click the mode button until it shows `target`, at most `attempts` times.
pub async fn switch_permission_mode(
    instance: &dyn Instance,
    target: PermissionMode,
    attempts: u32,
    pause: Duration,
) -> HarnessResult<()> {
    for _ in 0..attempts {
        let current = instance.read_element_text(MODE_BUTTON).await?;
        if current.contains(target.label()) {
            break;
        }
        instance.click(MODE_BUTTON).await?;
        tokio::time::sleep(pause).await;
    }

    let current = instance.read_element_text(MODE_BUTTON).await?;
    if current.contains(target.label()) {
        debug!(instance = instance.name(), mode = target.label(), "permission mode switched");
        Ok(())
    } else {
        Err(HarnessError::ModeSwitch {
            target: target.label().to_string(),
            current,
        })
    }
}

/// Switch the permission mode within the configured click budget
/// (`PARITY_MODE_SWITCH_ATTEMPTS`, `PARITY_MODE_SWITCH_PAUSE`).
pub async fn set_permission_mode(instance: &dyn Instance, target: PermissionMode) -> HarnessResult<()> {
    let (attempts, pause) = config::mode_switch();
    switch_permission_mode(instance, target, attempts, pause).await
}

/// Whether a file exists on the local filesystem
pub async fn file_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Delete a file left behind by a scenario. Failures are logged, not raised.
pub async fn delete_test_file(path: &Path) {
    if !file_exists(path).await {
        return;
    }
    if let Err(err) = tokio::fs::remove_file(path).await {
        warn!("Failed to delete {}: {}", path.display(), err);
    }
}
