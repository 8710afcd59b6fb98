//! # Product Catalog
//!
//! A product catalog that notifies its subscribers whenever a product is
//! added: the observer pattern with a catalog as subject.
//!
//! ## Core Concepts
//!
//! - **Catalog**: Registers subscribers by unique name, in delivery order
//! - **Subscribers**: Anything implementing [`Subscriber`]; gated by a flag
//! - **Users**: The concrete subscriber, delivering into an [`Inbox`]
//! - **Console**: A line-oriented session driving the catalog
//!
//! ## Example
//!
//! ```ignore
//! use product_catalog::{Catalog, User};
//!
//! let catalog = Catalog::new();
//! let (alice, inbox) = User::new("Alice", true);
//! catalog.register(alice.clone())?;
//!
//! // Alice is notified
//! catalog.add_product("Widget", "desc", 9.99);
//! assert_eq!(inbox.recv()?.product, "Widget");
//!
//! // Muted subscribers are skipped
//! alice.set_subscribed(false);
//! catalog.add_product("Gadget", "desc2", 4.99);
//! assert!(inbox.is_empty());
//! ```

pub mod catalog;
pub mod console;
pub mod error;
pub mod subscribers;
pub mod types;

// Re-exports
pub use catalog::{Catalog, CatalogConfig, DuplicatePolicy};
pub use console::{parse_price, OutputFormat, Session, SessionConfig};
pub use error::{CatalogError, Result};
pub use subscribers::{Inbox, Receipt, Subscriber, User};
pub use types::*;
