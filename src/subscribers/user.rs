//! The concrete user subscriber.

use crate::types::Notification;
use crossbeam_channel::{bounded, unbounded, Sender, TrySendError};
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::types::{Inbox, Receipt, Subscriber};

/// A catalog user.
///
/// Shared as `Arc<User>` so the caller can keep toggling the flag after
/// handing the user to a catalog.
pub struct User {
    name: String,
    subscribed: AtomicBool,
    sender: Sender<Notification>,
}

impl User {
    /// Create a user with an unbounded inbox.
    pub fn new(name: impl Into<String>, subscribed: bool) -> (Arc<Self>, Inbox) {
        let (sender, receiver) = unbounded();
        Self::build(name.into(), subscribed, sender, receiver)
    }

    /// Create a user whose inbox holds at most `capacity` notifications.
    ///
    /// Once full, further notifications are refused until the inbox is read.
    pub fn with_capacity(
        name: impl Into<String>,
        subscribed: bool,
        capacity: NonZeroUsize,
    ) -> (Arc<Self>, Inbox) {
        let (sender, receiver) = bounded(capacity.get());
        Self::build(name.into(), subscribed, sender, receiver)
    }

    fn build(
        name: String,
        subscribed: bool,
        sender: Sender<Notification>,
        receiver: crossbeam_channel::Receiver<Notification>,
    ) -> (Arc<Self>, Inbox) {
        let user = Arc::new(Self {
            name,
            subscribed: AtomicBool::new(subscribed),
            sender,
        });
        (user, Inbox { receiver })
    }
}

impl Subscriber for User {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::Acquire)
    }

    fn set_subscribed(&self, subscribed: bool) {
        self.subscribed.store(subscribed, Ordering::Release);
    }

    fn notify(&self, notification: &Notification) -> Receipt {
        if !self.is_subscribed() {
            return Receipt::Muted;
        }

        match self.sender.try_send(notification.clone()) {
            Ok(()) => Receipt::Accepted,
            Err(TrySendError::Full(_)) => Receipt::Refused,
            Err(TrySendError::Disconnected(_)) => Receipt::Refused,
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("name", &self.name)
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}
