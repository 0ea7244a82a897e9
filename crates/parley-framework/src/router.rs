//! The endpoint registry.
//!
//! A [`Router`] holds the endpoint definitions registered at setup time and
//! selects at most one of them per inbound envelope. Matching is
//! deterministic and side-effect free - the router never invokes a handler.
//!
//! Three endpoint kinds exist:
//!
//! - **Commands**: exact-name lookup, O(1) via a name-keyed map. Two
//!   commands can never share a name. Trailing text after the command token
//!   is handed to the handler as the single raw `args` binding, never
//!   parsed further here.
//! - **Messages**: regex patterns applied in registration order; first
//!   match wins. Patterns are implicitly anchored to the full message text,
//!   so `cat` does not match "concatenate". Named capture groups become
//!   bindings.
//! - **Reactions**: set-membership over reaction types, in registration
//!   order.
//!
//! The router is built once and treated as read-only during dispatch;
//! registration takes `&mut self`, matching takes `&self`.

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use parley_core::{Envelope, Payload, Reaction};

use crate::context::Bindings;
use crate::handler::BoxedHandler;
use crate::error::{RegistryError, RegistryResult};

struct CommandEndpoint {
    name: String,
    description: String,
    handler: BoxedHandler,
}

struct MessageEndpoint {
    /// The pattern as registered, for logs and error messages.
    source: String,
    /// The compiled, fully anchored pattern.
    pattern: Regex,
    handler: BoxedHandler,
}

struct ReactionEndpoint {
    reactions: Vec<Reaction>,
    handler: BoxedHandler,
}

/// A successful match: the selected handler plus the bindings the matcher
/// extracted for it.
pub struct RouteMatch<'r> {
    /// The endpoint's handler.
    pub handler: &'r BoxedHandler,
    /// Matcher-extracted bindings (capture groups, command args).
    pub bindings: Bindings,
    /// Human-readable endpoint label for logging.
    pub endpoint: String,
}

/// Ordered collection of endpoint definitions.
#[derive(Default)]
pub struct Router {
    commands: Vec<CommandEndpoint>,
    command_index: HashMap<String, usize>,
    messages: Vec<MessageEndpoint>,
    reactions: Vec<ReactionEndpoint>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command endpoint.
    ///
    /// Fails with [`RegistryError::DuplicateCommand`] if the name is taken;
    /// the registry is left unchanged in that case.
    pub fn command(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: BoxedHandler,
    ) -> RegistryResult<&mut Self> {
        let name = name.into();
        if self.command_index.contains_key(&name) {
            return Err(RegistryError::DuplicateCommand { name });
        }

        debug!(command = %name, "registering command endpoint");
        self.command_index.insert(name.clone(), self.commands.len());
        self.commands.push(CommandEndpoint {
            name,
            description: description.into(),
            handler,
        });
        Ok(self)
    }

    /// Registers a message endpoint with a regex pattern.
    ///
    /// The pattern is anchored to the whole message text; registration
    /// order decides between overlapping patterns. Named capture groups
    /// become handler bindings.
    pub fn message(&mut self, pattern: &str, handler: BoxedHandler) -> RegistryResult<&mut Self> {
        let anchored = format!(r"\A(?:{pattern})\z");
        let compiled = Regex::new(&anchored).map_err(|source| RegistryError::InvalidPattern {
            pattern: pattern.to_string(),
            source: Box::new(source),
        })?;

        debug!(pattern, "registering message endpoint");
        self.messages.push(MessageEndpoint {
            source: pattern.to_string(),
            pattern: compiled,
            handler,
        });
        Ok(self)
    }

    /// Registers a reaction endpoint for a set of reaction types.
    pub fn reaction(
        &mut self,
        reactions: impl IntoIterator<Item = Reaction>,
        handler: BoxedHandler,
    ) -> &mut Self {
        let reactions: Vec<Reaction> = reactions.into_iter().collect();
        debug!(?reactions, "registering reaction endpoint");
        self.reactions.push(ReactionEndpoint { reactions, handler });
        self
    }

    /// Selects the endpoint for an envelope, if any.
    ///
    /// Commands never fall back to message matchers; an unknown command is
    /// simply unmatched. Button presses are not routed here at all - the
    /// dispatcher publishes their decoded signal on the bus directly.
    pub fn matches(&self, envelope: &Envelope) -> Option<RouteMatch<'_>> {
        match envelope.payload() {
            Payload::Command { name, args } => self.match_command(name, args),
            Payload::Text { text } => self.match_text(text),
            Payload::Reaction { reaction } => self.match_reaction(reaction),
            Payload::ButtonPress { .. } => None,
        }
    }

    fn match_command(&self, name: &str, args: &str) -> Option<RouteMatch<'_>> {
        let endpoint = &self.commands[*self.command_index.get(name)?];
        let mut bindings = Bindings::new();
        if !args.is_empty() {
            bindings.insert("args", args);
        }
        Some(RouteMatch {
            handler: &endpoint.handler,
            bindings,
            endpoint: format!("/{}", endpoint.name),
        })
    }

    fn match_text(&self, text: &str) -> Option<RouteMatch<'_>> {
        for endpoint in &self.messages {
            let Some(captures) = endpoint.pattern.captures(text) else {
                continue;
            };
            let mut bindings = Bindings::new();
            for name in endpoint.pattern.capture_names().flatten() {
                if let Some(value) = captures.name(name) {
                    bindings.insert(name, value.as_str());
                }
            }
            return Some(RouteMatch {
                handler: &endpoint.handler,
                bindings,
                endpoint: format!("pattern '{}'", endpoint.source),
            });
        }
        None
    }

    fn match_reaction(&self, reaction: &Reaction) -> Option<RouteMatch<'_>> {
        for endpoint in &self.reactions {
            if endpoint.reactions.contains(reaction) {
                return Some(RouteMatch {
                    handler: &endpoint.handler,
                    bindings: Bindings::new(),
                    endpoint: format!("reaction {}", reaction.symbol()),
                });
            }
        }
        None
    }

    /// Registered commands with their descriptions, in registration order.
    ///
    /// This is the discovery surface a `/help` handler renders from.
    pub fn command_descriptions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.commands
            .iter()
            .map(|endpoint| (endpoint.name.as_str(), endpoint.description.as_str()))
    }

    /// Renders a plain-text command list.
    pub fn help_text(&self) -> String {
        let mut text = String::new();
        for (name, description) in self.command_descriptions() {
            text.push('/');
            text.push_str(name);
            if !description.is_empty() {
                text.push_str(" - ");
                text.push_str(description);
            }
            text.push('\n');
        }
        text
    }

    pub fn endpoint_count(&self) -> usize {
        self.commands.len() + self.messages.len() + self.reactions.len()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("commands", &self.commands.len())
            .field("messages", &self.messages.len())
            .field("reactions", &self.reactions.len())
            .finish()
    }
}
