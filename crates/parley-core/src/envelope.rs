//! Normalized inbound events.
//!
//! A transport adapter translates each messenger-native update into exactly
//! one [`Envelope`]. The envelope is immutable, owned by the dispatcher for
//! the duration of one dispatch, and discarded afterwards - there is no
//! envelope persistence.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::reaction::Reaction;

/// Identifier of the conversation an update belongs to.
///
/// Opaque to the core: adapters put whatever their platform uses to address
/// a chat (a Telegram chat id, a Matrix room id, ...) in here. Dispatch is
/// serialized per conversation id, so this is also the ordering key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of the account that produced an update.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SenderId(String);

impl SenderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SenderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// High-level classification of an envelope.
///
/// Used by the router to pick the endpoint table to search without looking
/// into the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    /// A slash-command invocation (`/start deck=es`).
    Command,
    /// A free-text message.
    Text,
    /// A press on an inline keyboard button.
    ButtonPress,
    /// A reaction attached to a message.
    Reaction,
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnvelopeKind::Command => "command",
            EnvelopeKind::Text => "text",
            EnvelopeKind::ButtonPress => "button-press",
            EnvelopeKind::Reaction => "reaction",
        };
        f.write_str(name)
    }
}

/// Kind-specific payload of an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Command name plus the raw trailing text after it.
    ///
    /// The adapter splits off the command token; the trailing text is kept
    /// verbatim and never parsed further by the core.
    Command { name: String, args: String },
    /// Free message text.
    Text { text: String },
    /// The opaque callback token the transport attached to the pressed
    /// button. Decoded back into a signal via
    /// [`Transport::decode_signal`](crate::transport::Transport::decode_signal).
    ButtonPress { token: String },
    /// A reaction type.
    Reaction { reaction: Reaction },
}

/// One normalized inbound occurrence.
#[derive(Debug, Clone)]
pub struct Envelope {
    conversation: ConversationId,
    sender: SenderId,
    payload: Payload,
    timestamp: SystemTime,
}

impl Envelope {
    /// Creates an envelope with the current time as its timestamp.
    pub fn new(
        conversation: impl Into<ConversationId>,
        sender: impl Into<SenderId>,
        payload: Payload,
    ) -> Self {
        Self {
            conversation: conversation.into(),
            sender: sender.into(),
            payload,
            timestamp: SystemTime::now(),
        }
    }

    /// Shorthand for a command envelope.
    pub fn command(
        conversation: impl Into<ConversationId>,
        sender: impl Into<SenderId>,
        name: impl Into<String>,
        args: impl Into<String>,
    ) -> Self {
        Self::new(
            conversation,
            sender,
            Payload::Command {
                name: name.into(),
                args: args.into(),
            },
        )
    }

    /// Shorthand for a free-text envelope.
    pub fn text(
        conversation: impl Into<ConversationId>,
        sender: impl Into<SenderId>,
        text: impl Into<String>,
    ) -> Self {
        Self::new(conversation, sender, Payload::Text { text: text.into() })
    }

    /// Shorthand for a button-press envelope.
    pub fn button_press(
        conversation: impl Into<ConversationId>,
        sender: impl Into<SenderId>,
        token: impl Into<String>,
    ) -> Self {
        Self::new(
            conversation,
            sender,
            Payload::ButtonPress {
                token: token.into(),
            },
        )
    }

    /// Shorthand for a reaction envelope.
    pub fn reaction(
        conversation: impl Into<ConversationId>,
        sender: impl Into<SenderId>,
        reaction: Reaction,
    ) -> Self {
        Self::new(conversation, sender, Payload::Reaction { reaction })
    }

    /// Overrides the timestamp (adapters that know the platform-side time
    /// should prefer it over the local arrival time).
    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn kind(&self) -> EnvelopeKind {
        match &self.payload {
            Payload::Command { .. } => EnvelopeKind::Command,
            Payload::Text { .. } => EnvelopeKind::Text,
            Payload::ButtonPress { .. } => EnvelopeKind::ButtonPress,
            Payload::Reaction { .. } => EnvelopeKind::Reaction,
        }
    }

    pub fn conversation(&self) -> &ConversationId {
        &self.conversation
    }

    pub fn sender(&self) -> &SenderId {
        &self.sender
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }
}
