//! Catalog: registers subscribers and publishes product events to them.

use crate::error::{CatalogError, Result};
use crate::subscribers::{Receipt, Subscriber};
use crate::types::{Delivery, EventId, Notification, Product};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// What `register` does when the name is already taken.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail with `AlreadyRegistered`.
    #[default]
    Reject,
    /// Swap in the new subscriber, keeping the old delivery position.
    Replace,
}

/// Catalog configuration.
#[derive(Clone, Debug, Default)]
pub struct CatalogConfig {
    /// Handling of duplicate names on register.
    pub duplicate_policy: DuplicatePolicy,

    /// Unregister subscribers that refuse a notification while subscribed.
    /// Default: false
    pub drop_unreachable: bool,
}

/// Registered subscribers, by name and in delivery order.
///
/// `by_name` and `order` always hold the same set of names.
#[derive(Default)]
struct Registry {
    by_name: HashMap<String, Arc<dyn Subscriber>>,
    order: Vec<String>,
}

impl Registry {
    fn insert(&mut self, subscriber: Arc<dyn Subscriber>, policy: DuplicatePolicy) -> Result<()> {
        let name = subscriber.name().to_string();

        if let Some(existing) = self.by_name.get_mut(&name) {
            return match policy {
                DuplicatePolicy::Reject => Err(CatalogError::AlreadyRegistered(name)),
                DuplicatePolicy::Replace => {
                    *existing = subscriber;
                    Ok(())
                }
            };
        }

        self.by_name.insert(name.clone(), subscriber);
        self.order.push(name);
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Option<Arc<dyn Subscriber>> {
        let removed = self.by_name.remove(name)?;
        self.order.retain(|n| n != name);
        Some(removed)
    }

    /// Subscribers in delivery order.
    fn snapshot(&self) -> Vec<Arc<dyn Subscriber>> {
        self.order
            .iter()
            .filter_map(|name| self.by_name.get(name).cloned())
            .collect()
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        let mut ordered: Vec<&String> = self.order.iter().collect();
        ordered.sort();
        let before = ordered.len();
        ordered.dedup();

        before == ordered.len()
            && ordered.len() == self.by_name.len()
            && ordered.iter().all(|name| self.by_name.contains_key(*name))
    }
}

/// The subject of the observer pattern.
///
/// Delivery iterates a snapshot of the registry, so subscribers may call
/// back into the catalog from `notify`.
pub struct Catalog {
    config: CatalogConfig,
    registry: RwLock<Registry>,
    products: RwLock<Vec<Product>>,
    /// Counter for generating event ids.
    next_event: AtomicU64,
}

impl Catalog {
    /// Create an empty catalog with default configuration.
    pub fn new() -> Self {
        Self::with_config(CatalogConfig::default())
    }

    pub fn with_config(config: CatalogConfig) -> Self {
        Self {
            config,
            registry: RwLock::new(Registry::default()),
            products: RwLock::new(Vec::new()),
            next_event: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    // --- Registration ---

    /// Register a subscriber at the end of the delivery order.
    pub fn register(&self, subscriber: Arc<dyn Subscriber>) -> Result<()> {
        if subscriber.name().is_empty() {
            return Err(CatalogError::InvalidInput(
                "subscriber name must not be empty".to_string(),
            ));
        }

        let name = subscriber.name().to_string();
        let result = self
            .registry
            .write()
            .insert(subscriber, self.config.duplicate_policy);

        match &result {
            Ok(()) => debug!(subscriber = %name, "registered subscriber"),
            Err(_) => warn!(subscriber = %name, "rejected duplicate subscriber"),
        }
        result
    }

    /// Remove a subscriber and return it.
    pub fn unregister(&self, name: &str) -> Result<Arc<dyn Subscriber>> {
        let removed = self.registry.write().remove(name);
        match removed {
            Some(subscriber) => {
                debug!(subscriber = %name, "unregistered subscriber");
                Ok(subscriber)
            }
            None => Err(CatalogError::NotFound(name.to_string())),
        }
    }

    /// Set the subscription flag of a registered subscriber.
    pub fn set_subscribed(&self, name: &str, subscribed: bool) -> Result<()> {
        let subscriber = self
            .get(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;
        subscriber.set_subscribed(subscribed);
        debug!(subscriber = %name, subscribed, "subscription flag changed");
        Ok(())
    }

    // --- Queries ---

    pub fn get(&self, name: &str) -> Option<Arc<dyn Subscriber>> {
        self.registry.read().by_name.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.read().by_name.contains_key(name)
    }

    /// Registered names in delivery order.
    pub fn names(&self) -> Vec<String> {
        self.registry.read().order.clone()
    }

    pub fn len(&self) -> usize {
        self.registry.read().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Products added so far, oldest first.
    pub fn products(&self) -> Vec<Product> {
        self.products.read().clone()
    }

    // --- Publishing ---

    /// Deliver `payload` to every subscribed subscriber in registration order.
    ///
    /// An empty payload sends nothing and consumes no event id.
    pub fn publish(&self, payload: &str) -> Delivery {
        if payload.is_empty() {
            debug!("empty payload, nothing published");
            return Delivery::default();
        }

        let snapshot = self.registry.read().snapshot();
        let event = EventId(self.next_event.fetch_add(1, Ordering::SeqCst));

        let mut delivery = Delivery {
            event: Some(event),
            ..Default::default()
        };
        let mut refused = Vec::new();

        for subscriber in snapshot {
            let name = subscriber.name().to_string();

            if !subscriber.is_subscribed() {
                debug!(subscriber = %name, %event, "skipped unsubscribed");
                delivery.skipped.push(name);
                continue;
            }

            let notification = Notification {
                event,
                subscriber: name.clone(),
                product: payload.to_string(),
            };

            match subscriber.notify(&notification) {
                Receipt::Accepted => delivery.delivered.push(name),
                Receipt::Muted => {
                    debug!(subscriber = %name, %event, "unsubscribed before delivery");
                    delivery.skipped.push(name);
                }
                Receipt::Refused => {
                    warn!(subscriber = %name, %event, "notification not accepted");
                    delivery.undeliverable.push(name);
                    refused.push(subscriber);
                }
            }
        }

        if self.config.drop_unreachable && !refused.is_empty() {
            self.drop_refused(refused);
        }

        debug!(
            %event,
            product = payload,
            delivered = delivery.delivered.len(),
            skipped = delivery.skipped.len(),
            "published"
        );
        delivery
    }

    /// Record a product and publish its name.
    ///
    /// Description and price are kept on the catalog but are not part of
    /// the notification.
    pub fn add_product(&self, name: &str, description: &str, price: f64) -> Delivery {
        if name.is_empty() {
            return Delivery::default();
        }

        self.products
            .write()
            .push(Product::new(name, description, price));
        self.publish(name)
    }

    /// Remove subscribers that refused, unless they were replaced meanwhile.
    fn drop_refused(&self, refused: Vec<Arc<dyn Subscriber>>) {
        let mut registry = self.registry.write();
        for subscriber in refused {
            let name = subscriber.name();
            let same = registry
                .by_name
                .get(name)
                .is_some_and(|current| Arc::ptr_eq(current, &subscriber));
            if same {
                registry.remove(name);
                debug!(subscriber = %name, "dropped unreachable subscriber");
            }
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscribers::User;
    use proptest::prelude::*;

    #[test]
    fn test_register_unregister() {
        let catalog = Catalog::new();
        let (alice, _inbox) = User::new("Alice", true);

        catalog.register(alice).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("Alice"));

        catalog.unregister("Alice").unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.names().is_empty());
    }

    #[test]
    fn test_reject_duplicate() {
        let catalog = Catalog::new();
        let (first, first_inbox) = User::new("Alice", true);
        let (second, second_inbox) = User::new("Alice", true);

        catalog.register(first).unwrap();
        let result = catalog.register(second);
        assert!(matches!(result, Err(CatalogError::AlreadyRegistered(_))));

        catalog.publish("Widget");
        assert_eq!(first_inbox.len(), 1);
        assert!(second_inbox.is_empty());
    }

    #[test]
    fn test_replace_duplicate_keeps_position() {
        let catalog = Catalog::with_config(CatalogConfig {
            duplicate_policy: DuplicatePolicy::Replace,
            ..Default::default()
        });
        let (alice, alice_inbox) = User::new("Alice", true);
        let (bob, _bob_inbox) = User::new("Bob", true);
        let (alice2, alice2_inbox) = User::new("Alice", true);

        catalog.register(alice).unwrap();
        catalog.register(bob).unwrap();
        catalog.register(alice2).unwrap();

        assert_eq!(catalog.names(), vec!["Alice", "Bob"]);

        let delivery = catalog.publish("Widget");
        assert_eq!(delivery.delivered, vec!["Alice", "Bob"]);
        assert!(alice_inbox.is_empty());
        assert_eq!(alice2_inbox.len(), 1);
    }

    #[test]
    fn test_empty_name_rejected() {
        let catalog = Catalog::new();
        let (nameless, _inbox) = User::new("", true);

        let result = catalog.register(nameless);
        assert!(matches!(result, Err(CatalogError::InvalidInput(_))));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_event_ids_increase() {
        let catalog = Catalog::new();

        assert_eq!(catalog.publish("a").event, Some(EventId(1)));
        assert_eq!(catalog.publish("").event, None);
        assert_eq!(catalog.publish("b").event, Some(EventId(2)));
    }

    #[test]
    fn test_drop_unreachable() {
        let catalog = Catalog::with_config(CatalogConfig {
            drop_unreachable: true,
            ..Default::default()
        });
        let (alice, inbox) = User::new("Alice", true);
        let (bob, _bob_inbox) = User::new("Bob", true);
        catalog.register(alice).unwrap();
        catalog.register(bob).unwrap();
        drop(inbox);

        let delivery = catalog.publish("Widget");
        assert_eq!(delivery.undeliverable, vec!["Alice"]);
        assert_eq!(catalog.names(), vec!["Bob"]);
    }

    #[test]
    fn test_unreachable_kept_by_default() {
        let catalog = Catalog::new();
        let (alice, inbox) = User::new("Alice", true);
        catalog.register(alice).unwrap();
        drop(inbox);

        let delivery = catalog.publish("Widget");
        assert_eq!(delivery.undeliverable, vec!["Alice"]);
        assert!(catalog.contains("Alice"));
    }

    /// Subscriber that unregisters itself on its first notification.
    struct OneShot {
        name: String,
        catalog: Arc<Catalog>,
    }

    impl std::fmt::Debug for OneShot {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("OneShot").field("name", &self.name).finish()
        }
    }

    impl Subscriber for OneShot {
        fn name(&self) -> &str {
            &self.name
        }

        fn is_subscribed(&self) -> bool {
            true
        }

        fn set_subscribed(&self, _subscribed: bool) {}

        fn notify(&self, _notification: &Notification) -> Receipt {
            match self.catalog.unregister(&self.name) {
                Ok(_) => Receipt::Accepted,
                Err(_) => Receipt::Refused,
            }
        }
    }

    /// Reports subscribed, then mutes itself when asked to take a notification,
    /// as a concurrent `set_subscribed(false)` landing mid-publish would.
    #[derive(Debug)]
    struct MutesOnNotify {
        user: Arc<User>,
    }

    impl Subscriber for MutesOnNotify {
        fn name(&self) -> &str {
            self.user.name()
        }

        fn is_subscribed(&self) -> bool {
            self.user.is_subscribed()
        }

        fn set_subscribed(&self, subscribed: bool) {
            self.user.set_subscribed(subscribed);
        }

        fn notify(&self, notification: &Notification) -> Receipt {
            self.user.set_subscribed(false);
            self.user.notify(notification)
        }
    }

    #[test]
    fn test_muted_mid_publish_is_skipped_not_dropped() {
        let catalog = Catalog::with_config(CatalogConfig {
            drop_unreachable: true,
            ..Default::default()
        });
        let (alice, inbox) = User::new("Alice", true);
        catalog
            .register(Arc::new(MutesOnNotify { user: alice }))
            .unwrap();

        let delivery = catalog.publish("Widget");
        assert_eq!(delivery.skipped, vec!["Alice"]);
        assert!(delivery.undeliverable.is_empty());
        assert!(catalog.contains("Alice"));
        assert!(inbox.is_empty());
    }

    #[test]
    fn test_smallest_inbox_is_reachable() {
        let catalog = Catalog::with_config(CatalogConfig {
            drop_unreachable: true,
            ..Default::default()
        });
        let (bob, inbox) = User::with_capacity("Bob", true, std::num::NonZeroUsize::MIN);
        catalog.register(bob).unwrap();

        let delivery = catalog.publish("Widget");
        assert_eq!(delivery.delivered, vec!["Bob"]);
        assert!(catalog.contains("Bob"));
        assert_eq!(inbox.len(), 1);
    }

    #[test]
    fn test_reentrant_unregister_during_publish() {
        let catalog = Arc::new(Catalog::new());
        catalog
            .register(Arc::new(OneShot {
                name: "once".to_string(),
                catalog: Arc::clone(&catalog),
            }))
            .unwrap();
        let (alice, inbox) = User::new("Alice", true);
        catalog.register(alice).unwrap();

        let delivery = catalog.publish("Widget");
        assert_eq!(delivery.delivered, vec!["once", "Alice"]);
        assert_eq!(catalog.names(), vec!["Alice"]);
        assert_eq!(inbox.len(), 1);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Register(u8),
        Unregister(u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..8).prop_map(Op::Register),
            (0u8..8).prop_map(Op::Unregister),
        ]
    }

    proptest! {
        #[test]
        fn prop_registry_stays_consistent(
            ops in proptest::collection::vec(op_strategy(), 0..64),
            replace in any::<bool>(),
        ) {
            let policy = if replace { DuplicatePolicy::Replace } else { DuplicatePolicy::Reject };
            let catalog = Catalog::with_config(CatalogConfig {
                duplicate_policy: policy,
                ..Default::default()
            });
            let mut inboxes = Vec::new();

            for op in ops {
                match op {
                    Op::Register(n) => {
                        let (user, inbox) = User::new(format!("user-{n}"), true);
                        let _ = catalog.register(user);
                        inboxes.push(inbox);
                    }
                    Op::Unregister(n) => {
                        let _ = catalog.unregister(&format!("user-{n}"));
                    }
                }
                prop_assert!(catalog.registry.read().is_consistent());
            }

            let delivery = catalog.publish("probe");
            prop_assert_eq!(delivery.delivered, catalog.names());
        }
    }
}
