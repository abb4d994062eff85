//! Scripted in-memory chat application.
//!
//! `MockInstance` answers the chat selectors in [`crate::chat`] the way the real
//! applications do: a submitted message either raises a permission prompt or
//! starts responding, the loading indicator hides once the scripted delay has
//! elapsed, and screenshots render the current page into a PNG.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::framebuffer::{Framebuffer, GLYPH_SIZE};
use super::{Instance, InstanceError, InstanceResult};
use crate::chat::{
    ALLOW_BUTTON, DENY_BUTTON, LAST_MESSAGE, LOADING_INDICATOR, MESSAGE_INPUT, MODE_BUTTON,
    PermissionMode, SEND_BUTTON,
};

const SCREEN_WIDTH: u32 = 640;
const SCREEN_HEIGHT: u32 = 360;
const BACKGROUND: [u8; 3] = [30, 30, 36];
const HEADER: [u8; 3] = [60, 60, 90];
const TEXT: [u8; 3] = [230, 230, 230];

/// How the scripted application reacts to a submitted message
#[derive(Debug, Clone)]
pub struct MockBehavior {
    /// Ask for permission before acting (skipped in bypass mode)
    pub prompts_for_permission: bool,

    /// Assistant reply once the turn completes with permission
    pub response_text: String,

    /// Assistant reply when permission is denied
    pub denied_text: String,

    /// Time the loading indicator stays visible
    pub response_delay: Duration,

    /// File written when the turn completes with permission
    pub writes_file: Option<(PathBuf, String)>,

    /// Selector whose every interaction fails with the given error
    pub fail_on: Option<(String, InstanceError)>,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            prompts_for_permission: false,
            response_text: "Done.".to_string(),
            denied_text: "Permission denied, cannot complete the request.".to_string(),
            response_delay: Duration::ZERO,
            writes_file: None,
            fail_on: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Turn {
    Idle,
    AwaitingPermission,
    Responding { approved: bool },
}

#[derive(Debug)]
struct PageState {
    url: Option<String>,
    fields: HashMap<String, String>,
    mode: PermissionMode,
    turn: Turn,
    last_message: Option<String>,
    actions: Vec<String>,
}

/// A scripted application instance for tests and demos
#[derive(Debug)]
pub struct MockInstance {
    name: String,
    behavior: MockBehavior,
    state: Mutex<PageState>,
}

impl MockInstance {
    pub fn new(name: impl Into<String>, behavior: MockBehavior) -> Self {
        Self {
            name: name.into(),
            behavior,
            state: Mutex::new(PageState {
                url: None,
                fields: HashMap::new(),
                mode: PermissionMode::default(),
                turn: Turn::Idle,
                last_message: None,
                actions: Vec::new(),
            }),
        }
    }

    /// Every primitive invoked so far, in order (e.g., "click:<selector>")
    pub fn actions(&self) -> Vec<String> {
        self.state().actions.clone()
    }

    pub fn mode(&self) -> PermissionMode {
        self.state().mode
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        // A panicking test thread must not hide the page state from later assertions
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Log the action and apply the scripted failure, if any
    fn enter(&self, action: &str, selector: &str) -> InstanceResult<MutexGuard<'_, PageState>> {
        let mut state = self.state();
        state.actions.push(format!("{}:{}", action, selector));
        if let Some((failing, err)) = &self.behavior.fail_on {
            if failing == selector {
                return Err(err.clone());
            }
        }
        Ok(state)
    }

    fn complete_turn(&self, approved: bool) -> InstanceResult<()> {
        if approved {
            if let Some((path, content)) = &self.behavior.writes_file {
                std::fs::write(path, content)
                    .map_err(|e| InstanceError::Other(format!("mock write failed: {}", e)))?;
            }
        }
        let mut state = self.state();
        state.last_message = Some(if approved {
            self.behavior.response_text.clone()
        } else {
            self.behavior.denied_text.clone()
        });
        state.turn = Turn::Idle;
        Ok(())
    }
}

#[async_trait]
impl Instance for MockInstance {
    fn name(&self) -> &str {
        &self.name
    }

    async fn navigate(&self, url: &str) -> InstanceResult<()> {
        let mut state = self.enter("navigate", url)?;
        state.url = Some(url.to_string());
        state.turn = Turn::Idle;
        Ok(())
    }

    async fn fill_field(&self, selector: &str, text: &str) -> InstanceResult<()> {
        let mut state = self.enter("fill", selector)?;
        if state.url.is_none() || selector != MESSAGE_INPUT {
            return Err(InstanceError::ElementNotFound(selector.to_string()));
        }
        state.fields.insert(selector.to_string(), text.to_string());
        Ok(())
    }

    async fn click(&self, selector: &str) -> InstanceResult<()> {
        let mut state = self.enter("click", selector)?;
        match selector {
            SEND_BUTTON => {
                let message = state.fields.remove(MESSAGE_INPUT).unwrap_or_default();
                if message.is_empty() || state.turn != Turn::Idle {
                    return Err(InstanceError::Other("send button is disabled".to_string()));
                }
                let needs_prompt = self.behavior.prompts_for_permission
                    && state.mode != PermissionMode::BypassPermissions;
                state.turn = if needs_prompt {
                    Turn::AwaitingPermission
                } else {
                    Turn::Responding { approved: true }
                };
                Ok(())
            }
            ALLOW_BUTTON | DENY_BUTTON if state.turn == Turn::AwaitingPermission => {
                state.turn = Turn::Responding {
                    approved: selector == ALLOW_BUTTON,
                };
                Ok(())
            }
            MODE_BUTTON => {
                state.mode = state.mode.next();
                Ok(())
            }
            _ => Err(InstanceError::ElementNotFound(selector.to_string())),
        }
    }

    async fn is_element_visible(&self, selector: &str) -> InstanceResult<bool> {
        let state = self.enter("visible", selector)?;
        Ok(match selector {
            ALLOW_BUTTON | DENY_BUTTON => state.turn == Turn::AwaitingPermission,
            LOADING_INDICATOR => matches!(state.turn, Turn::Responding { .. }),
            MESSAGE_INPUT | SEND_BUTTON | MODE_BUTTON => state.url.is_some(),
            LAST_MESSAGE => state.last_message.is_some(),
            _ => false,
        })
    }

    async fn read_element_text(&self, selector: &str) -> InstanceResult<String> {
        let state = self.enter("text", selector)?;
        match selector {
            LAST_MESSAGE => state
                .last_message
                .clone()
                .ok_or_else(|| InstanceError::ElementNotFound(selector.to_string())),
            MODE_BUTTON => Ok(state.mode.label().to_string()),
            _ => Err(InstanceError::ElementNotFound(selector.to_string())),
        }
    }

    async fn wait_for_element_hidden(&self, selector: &str, timeout: Duration) -> InstanceResult<()> {
        let turn = self.enter("wait_hidden", selector)?.turn;
        let visible = match selector {
            LOADING_INDICATOR => !matches!(turn, Turn::Idle),
            ALLOW_BUTTON | DENY_BUTTON => turn == Turn::AwaitingPermission,
            _ => false,
        };
        if !visible {
            return Ok(());
        }

        let timed_out = || InstanceError::Timeout {
            action: format!("{} to be hidden", selector),
            timeout,
        };
        match turn {
            Turn::Responding { approved } if self.behavior.response_delay <= timeout => {
                tokio::time::sleep(self.behavior.response_delay).await;
                self.complete_turn(approved)
            }
            _ => {
                tokio::time::sleep(timeout).await;
                Err(timed_out())
            }
        }
    }

    async fn screenshot_page(&self) -> InstanceResult<Vec<u8>> {
        let (url, mode, message, prompting) = {
            let state = self.enter("screenshot", "page")?;
            (
                state.url.clone().unwrap_or_else(|| "about:blank".to_string()),
                state.mode,
                state.last_message.clone().unwrap_or_default(),
                state.turn == Turn::AwaitingPermission,
            )
        };

        let mut fb = Framebuffer::with_color(SCREEN_WIDTH, SCREEN_HEIGHT, BACKGROUND);
        fb.draw_rect(0, 0, SCREEN_WIDTH, GLYPH_SIZE * 3, HEADER);
        fb.draw_text(GLYPH_SIZE, GLYPH_SIZE, &format!("{}  {}", self.name, url), TEXT, HEADER);
        let mut y = fb.draw_text(GLYPH_SIZE, GLYPH_SIZE * 4, mode.label(), TEXT, BACKGROUND);
        if prompting {
            y = fb.draw_text(GLYPH_SIZE, y, "[Allow] [Deny]", TEXT, BACKGROUND);
        }
        fb.draw_text(GLYPH_SIZE, y + GLYPH_SIZE, &message, TEXT, BACKGROUND);
        fb.to_png()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat;

    #[tokio::test]
    async fn test_prompted_turn_completes_after_allow() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("out.txt");
        let app = MockInstance::new(
            "old-app",
            MockBehavior {
                prompts_for_permission: true,
                writes_file: Some((target.clone(), "hello".to_string())),
                ..MockBehavior::default()
            },
        );

        chat::select_project(&app, "/p").await.unwrap();
        chat::send_message(&app, "Create a file").await.unwrap();
        assert!(chat::verify_permission_prompt(&app).await);
        chat::approve_permission(&app).await.unwrap();

        let response = chat::wait_for_response(&app, Duration::from_secs(1)).await.unwrap();
        assert_eq!(response.text, "Done.");
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "hello");
        assert!(!chat::verify_permission_prompt(&app).await);
    }

    #[tokio::test]
    async fn test_denied_turn_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("out.txt");
        let app = MockInstance::new(
            "old-app",
            MockBehavior {
                prompts_for_permission: true,
                writes_file: Some((target.clone(), "hello".to_string())),
                ..MockBehavior::default()
            },
        );

        chat::select_project(&app, "/p").await.unwrap();
        chat::send_message(&app, "Create a file").await.unwrap();
        chat::deny_permission(&app).await.unwrap();
        let response = chat::wait_for_response(&app, Duration::from_secs(1)).await.unwrap();

        assert!(!response.success);
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_bypass_mode_skips_prompt() {
        let app = MockInstance::new(
            "spicy-claude",
            MockBehavior {
                prompts_for_permission: true,
                ..MockBehavior::default()
            },
        );
        chat::select_project(&app, "/p").await.unwrap();
        for _ in 0..3 {
            app.click(MODE_BUTTON).await.unwrap();
        }
        chat::send_message(&app, "Create a file").await.unwrap();
        assert!(!chat::verify_permission_prompt(&app).await);
    }

    #[tokio::test]
    async fn test_fill_before_navigation_fails() {
        let app = MockInstance::new("old-app", MockBehavior::default());
        let err = app.fill_field(MESSAGE_INPUT, "hi").await.unwrap_err();
        assert_eq!(err, InstanceError::ElementNotFound(MESSAGE_INPUT.to_string()));
    }

    #[tokio::test]
    async fn test_scripted_failure_and_action_log() {
        let app = MockInstance::new(
            "old-app",
            MockBehavior {
                fail_on: Some((SEND_BUTTON.to_string(), InstanceError::Other("boom".to_string()))),
                ..MockBehavior::default()
            },
        );
        chat::select_project(&app, "/p").await.unwrap();
        let err = chat::send_message(&app, "hi").await.unwrap_err();
        assert_eq!(err.to_string(), "Instance error: boom");
        assert_eq!(
            app.actions(),
            vec![
                "navigate:/projects/p".to_string(),
                format!("fill:{}", MESSAGE_INPUT),
                format!("click:{}", SEND_BUTTON),
            ]
        );
    }

    #[tokio::test]
    async fn test_screenshot_is_png() {
        let app = MockInstance::new("old-app", MockBehavior::default());
        let png = app.screenshot_page().await.unwrap();
        let fb = Framebuffer::from_png_bytes(&png).unwrap();
        assert_eq!((fb.width(), fb.height()), (SCREEN_WIDTH, SCREEN_HEIGHT));
        assert_eq!(fb.get_pixel(SCREEN_WIDTH - 1, 0), HEADER);
    }
}
