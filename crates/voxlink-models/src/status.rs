//! Subscription lifecycle status.

use serde::{Deserialize, Serialize};

/// Lifecycle of the hub subscription as seen by the UI.
///
/// Transitions are driven by transport callbacks. The only state set
/// ahead of a callback is `Connecting`, right before a subscription is
/// opened.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum ConnectionStatus {
    /// No subscription, or the subscription has closed.
    #[default]
    Disconnected,
    /// A subscription is being opened or is reconnecting.
    Connecting,
    /// The subscription is live.
    Connected,
}
