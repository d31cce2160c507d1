//! Canonical NATS subject names for VoxLink transcript events.
//!
//! ```text
//! voxlink.v1.{channel}.events   ← producers PUBLISH, viewers SUBSCRIBE
//! ```

/// Current subject version prefix.
const VERSION: &str = "v1";

/// Central authority for hub subject names.
///
/// # Examples
///
/// ```
/// use voxlink_sdk::HubSubjects;
///
/// assert_eq!(HubSubjects::events("line-7"), "voxlink.v1.line-7.events");
/// ```
pub struct HubSubjects;

impl HubSubjects {
    /// Subject carrying the events of one call channel.
    pub fn events(channel: &str) -> String {
        format!("voxlink.{VERSION}.{channel}.events")
    }
}
