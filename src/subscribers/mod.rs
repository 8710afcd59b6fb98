//! Subscribers that receive product notifications.
//!
//! A subscriber is anything implementing [`Subscriber`]: it has a unique
//! name, a subscription flag, and accepts notifications. [`User`] is the
//! concrete subscriber; its notifications land in an [`Inbox`] held by the
//! caller.
//!
//! # Example
//!
//! ```ignore
//! let (alice, inbox) = User::new("Alice", true);
//! catalog.register(alice.clone())?;
//!
//! catalog.add_product("Widget", "desc", 9.99);
//! for notification in inbox.drain() {
//!     println!("{notification}");
//! }
//! ```

mod types;
mod user;

pub use types::{Inbox, Receipt, Subscriber};
pub use user::User;
