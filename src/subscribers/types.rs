//! Subscriber capability and the inbox notifications are delivered to.

use crate::types::Notification;
use std::fmt;

/// What happened to a notification handed to a subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Receipt {
    /// Accepted for delivery.
    Accepted,
    /// The subscriber was unsubscribed by the time it was asked.
    Muted,
    /// Subscribed, but the notification could not be taken (inbox full or gone).
    Refused,
}

/// Capability every catalog subscriber provides.
///
/// The catalog reads name and flag through this trait; it never needs to
/// know the concrete type behind it.
pub trait Subscriber: Send + Sync + fmt::Debug {
    /// Unique name used as the registration key.
    fn name(&self) -> &str;

    /// Whether publishes currently reach this subscriber.
    fn is_subscribed(&self) -> bool;

    /// Flip the subscription flag. The only way the flag changes.
    fn set_subscribed(&self, subscribed: bool);

    /// Hand over a notification.
    fn notify(&self, notification: &Notification) -> Receipt;
}

/// Receiving end of a subscriber's notification channel.
pub struct Inbox {
    pub(crate) receiver: crossbeam_channel::Receiver<Notification>,
}

impl Inbox {
    /// Receive the next notification (blocking).
    pub fn recv(&self) -> Result<Notification, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a notification (non-blocking).
    pub fn try_recv(&self) -> Result<Notification, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<Notification, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Take every pending notification without blocking.
    pub fn drain(&self) -> Vec<Notification> {
        self.receiver.try_iter().collect()
    }

    /// Number of notifications waiting.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
