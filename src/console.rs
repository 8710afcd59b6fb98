//! Line-oriented console session over a [`Catalog`].
//!
//! Each round asks for a user name and an action. The cancel keyword
//! unregisters the user; anything else registers the user (if new) and
//! walks through adding a product, printing the notifications it produced.
//! The session ends cleanly at end of input.

use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};
use crate::subscribers::{Inbox, User};
use crate::types::Notification;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::num::NonZeroUsize;
use tracing::debug;

pub const PROMPT_USER: &str = "Type the user name: ";
pub const PROMPT_ACTION: &str =
    "Type 'cancel' to cancel the subscription or any other key to add a new product: ";
pub const PROMPT_PRODUCT_NAME: &str = "Type the product name: ";
pub const PROMPT_DESCRIPTION: &str = "Type the product description: ";
pub const PROMPT_PRICE: &str = "Type the product price: ";

pub const MSG_CANCELED: &str = "Subscription canceled successfully.";
pub const MSG_NOT_FOUND: &str = "User not found.";
pub const MSG_PRODUCT_ADDED: &str = "Product added successfully.";
pub const MSG_PRODUCT_UNNAMED: &str = "Product not added: the product name is empty.";
pub const MSG_INVALID_PRICE: &str = "Invalid input. Please enter a valid price.";

/// How notification lines are written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// `User <name> received a notification - product: <product>`
    #[default]
    Text,
    /// One JSON object per notification.
    Json,
}

/// Session configuration.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Action word that cancels a subscription (case-insensitive).
    /// Default: "cancel"
    pub cancel_keyword: String,

    /// Inbox capacity for users the session registers (None = unbounded).
    pub inbox_capacity: Option<NonZeroUsize>,

    /// Notification line format.
    pub format: OutputFormat,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cancel_keyword: "cancel".to_string(),
            inbox_capacity: None,
            format: OutputFormat::default(),
        }
    }
}

/// Parse a price typed at the console.
pub fn parse_price(input: &str) -> Result<f64> {
    match input.trim().parse::<f64>() {
        Ok(price) if price.is_finite() => Ok(price),
        _ => Err(CatalogError::InvalidInput(format!(
            "not a valid price: {:?}",
            input.trim()
        ))),
    }
}

/// Interactive session bound to a catalog and an input/output pair.
pub struct Session<'a, R, W> {
    catalog: &'a Catalog,
    config: SessionConfig,
    input: R,
    output: W,
    /// Inboxes of users this session registered.
    inboxes: HashMap<String, Inbox>,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(catalog: &'a Catalog, config: SessionConfig, input: R, output: W) -> Self {
        Self {
            catalog,
            config,
            input,
            output,
            inboxes: HashMap::new(),
        }
    }

    /// Run rounds until input is exhausted.
    pub fn run(&mut self) -> Result<()> {
        while self.round()? {}
        self.output.flush()?;
        Ok(())
    }

    /// Consume the session, returning the output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    /// One user interaction. Returns false once input ends.
    fn round(&mut self) -> Result<bool> {
        let Some(name) = self.ask(PROMPT_USER)? else {
            return Ok(false);
        };
        let Some(action) = self.ask(PROMPT_ACTION)? else {
            return Ok(false);
        };

        if self.is_cancel(&action) {
            self.cancel(&name)?;
            return Ok(true);
        }

        self.add_product(&name)
    }

    /// Unicode-aware, case-insensitive match against the cancel keyword.
    fn is_cancel(&self, action: &str) -> bool {
        action.trim().to_lowercase() == self.config.cancel_keyword.trim().to_lowercase()
    }

    fn cancel(&mut self, name: &str) -> Result<()> {
        match self.catalog.unregister(name) {
            Ok(_) => {
                self.inboxes.remove(name);
                writeln!(self.output, "{MSG_CANCELED}")?;
            }
            Err(e) if e.is_not_found() => writeln!(self.output, "{MSG_NOT_FOUND}")?,
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn add_product(&mut self, user: &str) -> Result<bool> {
        if !self.catalog.contains(user) {
            self.enroll(user)?;
        }

        let Some(product) = self.ask(PROMPT_PRODUCT_NAME)? else {
            return Ok(false);
        };
        let Some(description) = self.ask(PROMPT_DESCRIPTION)? else {
            return Ok(false);
        };
        let Some(price) = self.ask_price()? else {
            return Ok(false);
        };

        let delivery = self.catalog.add_product(&product, &description, price);
        if delivery.event.is_none() {
            writeln!(self.output, "{MSG_PRODUCT_UNNAMED}")?;
            return Ok(true);
        }

        for name in &delivery.delivered {
            let pending = match self.inboxes.get(name) {
                Some(inbox) => inbox.drain(),
                None => continue,
            };
            for notification in pending {
                self.emit(&notification)?;
            }
        }

        writeln!(self.output, "{MSG_PRODUCT_ADDED}")?;
        Ok(true)
    }

    /// Register a new, subscribed user and keep its inbox.
    fn enroll(&mut self, name: &str) -> Result<()> {
        let (user, inbox) = match self.config.inbox_capacity {
            Some(capacity) => User::with_capacity(name, true, capacity),
            None => User::new(name, true),
        };

        match self.catalog.register(user) {
            Ok(()) => {
                self.inboxes.insert(name.to_string(), inbox);
            }
            Err(CatalogError::InvalidInput(reason)) => {
                debug!(%reason, "user not enrolled");
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn ask_price(&mut self) -> Result<Option<f64>> {
        writeln!(self.output, "{PROMPT_PRICE}")?;
        loop {
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            match parse_price(&line) {
                Ok(price) => return Ok(Some(price)),
                Err(_) => writeln!(self.output, "{MSG_INVALID_PRICE}")?,
            }
        }
    }

    fn emit(&mut self, notification: &Notification) -> Result<()> {
        match self.config.format {
            OutputFormat::Text => writeln!(self.output, "{notification}")?,
            OutputFormat::Json => {
                let line = serde_json::to_string(notification)?;
                writeln!(self.output, "{line}")?;
            }
        }
        Ok(())
    }

    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        writeln!(self.output, "{prompt}")?;
        self.read_line()
    }

    /// Next input line without its line ending, or None at end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(&['\r', '\n'][..]).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}
