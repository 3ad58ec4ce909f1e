//! # Action dispatch
//!
//! An explicit routing table from action names to tagged variants, resolved
//! once at startup. Callers match on the resolved variant, so the compiler
//! checks handler exhaustiveness; an unknown name is a typed error, never a
//! runtime reflection miss.

use agora_core::{EngineError, Result};

pub struct ActionTable<A: Copy> {
    routes: Vec<(&'static str, A)>,
}

impl<A: Copy> ActionTable<A> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registers a route. Last registration wins for duplicate names.
    pub fn register(mut self, name: &'static str, action: A) -> Self {
        if let Some(slot) = self.routes.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = action;
        } else {
            self.routes.push((name, action));
        }
        self
    }

    /// Total routing: every name either resolves or comes back as
    /// `UnknownAction`.
    pub fn resolve(&self, name: &str) -> Result<A> {
        self.routes
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, action)| *action)
            .ok_or_else(|| EngineError::UnknownAction(name.to_string()))
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.routes.iter().map(|(n, _)| *n)
    }
}

impl<A: Copy> Default for ActionTable<A> {
    fn default() -> Self {
        Self::new()
    }
}
