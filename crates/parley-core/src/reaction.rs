//! Transport-agnostic reaction types.
//!
//! Messengers disagree on which reactions exist and how they are addressed;
//! the core names the common ones and keeps an escape hatch for the rest.

use serde::{Deserialize, Serialize};

/// A reaction attached to a message.
///
/// The curated variants cover the reactions most platforms support.
/// Anything else round-trips through [`Reaction::Other`] with the raw
/// symbol, so adapters never have to drop a reaction on the floor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reaction {
    ThumbsUp,
    ThumbsDown,
    Heart,
    Fire,
    Clap,
    Eyes,
    Thinking,
    Joy,
    Sob,
    Party,
    Hundred,
    Pray,
    Wave,
    Other(String),
}

impl Reaction {
    /// The emoji symbol for this reaction.
    pub fn symbol(&self) -> &str {
        match self {
            Reaction::ThumbsUp => "\u{1F44D}",
            Reaction::ThumbsDown => "\u{1F44E}",
            Reaction::Heart => "\u{2764}\u{FE0F}",
            Reaction::Fire => "\u{1F525}",
            Reaction::Clap => "\u{1F44F}",
            Reaction::Eyes => "\u{1F440}",
            Reaction::Thinking => "\u{1F914}",
            Reaction::Joy => "\u{1F602}",
            Reaction::Sob => "\u{1F62D}",
            Reaction::Party => "\u{1F389}",
            Reaction::Hundred => "\u{1F4AF}",
            Reaction::Pray => "\u{1F64F}",
            Reaction::Wave => "\u{1F44B}",
            Reaction::Other(symbol) => symbol,
        }
    }

    /// Maps an emoji symbol back to a reaction.
    ///
    /// Unknown symbols become [`Reaction::Other`], preserving the input.
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol {
            "\u{1F44D}" => Reaction::ThumbsUp,
            "\u{1F44E}" => Reaction::ThumbsDown,
            "\u{2764}\u{FE0F}" => Reaction::Heart,
            "\u{1F525}" => Reaction::Fire,
            "\u{1F44F}" => Reaction::Clap,
            "\u{1F440}" => Reaction::Eyes,
            "\u{1F914}" => Reaction::Thinking,
            "\u{1F602}" => Reaction::Joy,
            "\u{1F62D}" => Reaction::Sob,
            "\u{1F389}" => Reaction::Party,
            "\u{1F4AF}" => Reaction::Hundred,
            "\u{1F64F}" => Reaction::Pray,
            "\u{1F44B}" => Reaction::Wave,
            other => Reaction::Other(other.to_string()),
        }
    }

    /// Returns `true` for the curated variants.
    pub fn is_known(&self) -> bool {
        !matches!(self, Reaction::Other(_))
    }
}
