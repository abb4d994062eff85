//! Browser-automation collaborator.
//!
//! The harness never drives a browser itself. Each application under test is
//! reached through an [`Instance`], which exposes only the primitives the chat
//! scenarios need. Every primitive may suspend and may time out.

pub mod framebuffer;
pub mod mock;

use async_trait::async_trait;
use std::time::Duration;

pub use framebuffer::Framebuffer;
pub use mock::{MockBehavior, MockInstance};

/// Error types for automation primitives
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstanceError {
    /// No element matched the selector
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// An action did not complete in time
    #[error("Timeout after {timeout:?} waiting for: {action}")]
    Timeout { action: String, timeout: Duration },

    /// Page navigation failed
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// Screenshot capture failed
    #[error("Screenshot failed: {0}")]
    Screenshot(String),

    #[error("{0}")]
    Other(String),
}

/// Result type for automation primitives
pub type InstanceResult<T> = Result<T, InstanceError>;

/// One running application under test, reached through a browser page
#[async_trait]
pub trait Instance: Send + Sync {
    /// Short identifier used in logs (e.g., "old-app", "spicy-claude")
    fn name(&self) -> &str;

    /// Navigate to a path or URL
    async fn navigate(&self, url: &str) -> InstanceResult<()>;

    /// Replace the value of an input field
    async fn fill_field(&self, selector: &str, text: &str) -> InstanceResult<()>;

    /// Click an element
    async fn click(&self, selector: &str) -> InstanceResult<()>;

    /// Whether an element is currently visible
    async fn is_element_visible(&self, selector: &str) -> InstanceResult<bool>;

    /// Text content of an element
    async fn read_element_text(&self, selector: &str) -> InstanceResult<String>;

    /// Wait until an element is hidden or detached
    async fn wait_for_element_hidden(&self, selector: &str, timeout: Duration) -> InstanceResult<()>;

    /// PNG bytes of the full page
    async fn screenshot_page(&self) -> InstanceResult<Vec<u8>>;
}
