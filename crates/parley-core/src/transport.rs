//! The transport capability interface.
//!
//! Each messenger adapter implements [`Transport`]: the small set of
//! outbound actions the core needs (text, image, reaction) plus the
//! callback-token codec that lets keyboard buttons round-trip signals
//! through the platform's native callback mechanism.
//!
//! The adapter's one upstream duty sits outside this trait: translate every
//! platform-native update into an [`Envelope`](crate::envelope::Envelope)
//! and feed it to the runtime. What counts as a conversation, how commands
//! are tokenized, and how callback payloads are stored are all adapter
//! concerns - the core only sees the normalized shape.

use std::sync::Arc;

use async_trait::async_trait;

use crate::envelope::ConversationId;
use crate::error::DeliveryResult;
use crate::keyboard::Keyboard;
use crate::reaction::Reaction;
use crate::signal::BoxedSignal;

/// Outbound capabilities of one messenger transport.
///
/// Every method targets a conversation the transport already knows about;
/// failures surface as [`DeliveryError`](crate::error::DeliveryError).
/// Implementations must be safe to call concurrently from dispatches of
/// distinct conversations.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Delivers a text message, optionally with an inline keyboard.
    ///
    /// When a keyboard is present the transport encodes each button's
    /// signal via [`encode_signal`](Self::encode_signal) into its platform
    /// callback payload.
    async fn deliver_text(
        &self,
        conversation: &ConversationId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> DeliveryResult<()>;

    /// Delivers an image with an optional caption.
    async fn deliver_image(
        &self,
        conversation: &ConversationId,
        image: &[u8],
        caption: Option<&str>,
    ) -> DeliveryResult<()>;

    /// Attaches a reaction in the conversation.
    async fn deliver_reaction(
        &self,
        conversation: &ConversationId,
        reaction: &Reaction,
    ) -> DeliveryResult<()>;

    /// Encodes a signal into an opaque callback token.
    ///
    /// Transports with textual callback payloads can delegate to
    /// [`codec::encode`](crate::codec::encode); others may use any scheme
    /// as long as [`decode_signal`](Self::decode_signal) inverts it.
    fn encode_signal(&self, signal: &BoxedSignal) -> DeliveryResult<String>;

    /// Decodes a callback token back into the signal it was built from.
    fn decode_signal(&self, token: &str) -> DeliveryResult<BoxedSignal>;
}

/// A shared, type-erased transport handle.
pub type BoxedTransport = Arc<dyn Transport>;
