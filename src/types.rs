//! Core types for the product catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one publish. Assigned by the catalog, starting at 1.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct EventId(pub u64);

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A product accepted by the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub description: String,
    pub price: f64,
}

impl Product {
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            price,
        }
    }
}

/// What a subscriber receives when a product is published.
///
/// Only the product name travels with the event; description and price stay
/// in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Publish this notification belongs to.
    pub event: EventId,
    /// Name of the receiving subscriber.
    pub subscriber: String,
    /// Payload passed to `publish`.
    pub product: String,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "User {} received a notification - product: {}",
            self.subscriber, self.product
        )
    }
}

/// Outcome of a single publish.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// Event id, or None when the payload was empty and nothing was sent.
    pub event: Option<EventId>,
    /// Subscribers that received the notification, in delivery order.
    pub delivered: Vec<String>,
    /// Subscribers skipped because their flag was off.
    pub skipped: Vec<String>,
    /// Subscribers whose inbox refused the notification.
    pub undeliverable: Vec<String>,
}

impl Delivery {
    /// Number of notifications actually handed over.
    pub fn count(&self) -> usize {
        self.delivered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty()
    }
}
