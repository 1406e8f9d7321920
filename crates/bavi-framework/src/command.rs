//! Command registry: trigger words mapped to handlers.
//!
//! Triggers are case-sensitive and write-once for the lifetime of the
//! process. Registering a trigger together with its aliases is atomic: either
//! every name is added, or none is.

use std::collections::HashMap;
use std::iter;
use std::sync::Arc;

use tracing::debug;

use crate::error::RegistrationError;
use crate::handler::{BoxedCommandHandler, CommandHandler};

/// Maps trigger words (and aliases) to command handlers.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, BoxedCommandHandler>,
    /// Registration order, used to roll back a failed plugin.
    order: Vec<String>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `trigger` and every alias.
    ///
    /// Fails with [`RegistrationError::DuplicateTrigger`] if any of the names
    /// already exists, leaving the registry untouched. A name repeated within
    /// the same call is not a collision.
    pub fn register<H: CommandHandler>(
        &mut self,
        trigger: &str,
        handler: H,
        aliases: &[&str],
    ) -> Result<(), RegistrationError> {
        self.register_boxed(trigger, Arc::new(handler), aliases)
    }

    /// Like [`register`](Self::register), for an already shared handler.
    pub fn register_boxed(
        &mut self,
        trigger: &str,
        handler: BoxedCommandHandler,
        aliases: &[&str],
    ) -> Result<(), RegistrationError> {
        let names: Vec<&str> = iter::once(trigger).chain(aliases.iter().copied()).collect();

        for name in &names {
            if name.is_empty() || name.chars().any(char::is_whitespace) {
                return Err(RegistrationError::InvalidTrigger((*name).to_string()));
            }
            if self.commands.contains_key(*name) {
                return Err(RegistrationError::DuplicateTrigger((*name).to_string()));
            }
        }

        for name in names {
            if self
                .commands
                .insert(name.to_string(), Arc::clone(&handler))
                .is_none()
            {
                self.order.push(name.to_string());
            }
        }

        debug!(trigger, aliases = ?aliases, "Registered command");
        Ok(())
    }

    /// Looks up the handler for `trigger`.
    pub fn lookup(&self, trigger: &str) -> Option<&BoxedCommandHandler> {
        self.commands.get(trigger)
    }

    /// Returns `true` if `trigger` is registered.
    pub fn contains(&self, trigger: &str) -> bool {
        self.commands.contains_key(trigger)
    }

    /// Number of registered names, aliases included.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub(crate) fn checkpoint(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn rollback(&mut self, checkpoint: usize) {
        if checkpoint >= self.order.len() {
            return;
        }
        for name in self.order.drain(checkpoint..) {
            self.commands.remove(&name);
        }
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("triggers", &self.order)
            .finish()
    }
}
