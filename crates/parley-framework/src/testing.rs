//! Shared test doubles for the framework's unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use parley_core::{
    BoxedSignal, ConversationId, DeliveryError, DeliveryResult, Keyboard, Reaction, Transport,
};

type DecoderFn = Box<dyn Fn(&str) -> DeliveryResult<BoxedSignal> + Send + Sync>;

/// A transport that records every delivery as a readable line.
pub(crate) struct RecordingTransport {
    log: Mutex<Vec<String>>,
    decoder: Option<DecoderFn>,
}

impl RecordingTransport {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self {
            log: Mutex::new(Vec::new()),
            decoder: None,
        })
    }

    /// A recording transport that can also decode callback tokens.
    pub fn with_decoder(
        decoder: impl Fn(&str) -> DeliveryResult<BoxedSignal> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            log: Mutex::new(Vec::new()),
            decoder: Some(Box::new(decoder)),
        })
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    fn record(&self, line: String) {
        self.log.lock().push(line);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn deliver_text(
        &self,
        conversation: &ConversationId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> DeliveryResult<()> {
        match keyboard {
            Some(kb) => self.record(format!(
                "{conversation} <- text: {text} [keyboard: {} buttons]",
                kb.button_count()
            )),
            None => self.record(format!("{conversation} <- text: {text}")),
        }
        Ok(())
    }

    async fn deliver_image(
        &self,
        conversation: &ConversationId,
        image: &[u8],
        caption: Option<&str>,
    ) -> DeliveryResult<()> {
        self.record(format!(
            "{conversation} <- image: {} bytes, caption: {}",
            image.len(),
            caption.unwrap_or("-")
        ));
        Ok(())
    }

    async fn deliver_reaction(
        &self,
        conversation: &ConversationId,
        reaction: &Reaction,
    ) -> DeliveryResult<()> {
        self.record(format!("{conversation} <- reaction: {}", reaction.symbol()));
        Ok(())
    }

    fn encode_signal(&self, _signal: &BoxedSignal) -> DeliveryResult<String> {
        Err(DeliveryError::Unsupported {
            action: "encode_signal",
        })
    }

    fn decode_signal(&self, token: &str) -> DeliveryResult<BoxedSignal> {
        match &self.decoder {
            Some(decode) => decode(token),
            None => Err(DeliveryError::Unsupported {
                action: "decode_signal",
            }),
        }
    }
}

/// A transport that refuses every delivery.
pub(crate) struct FailingTransport;

impl FailingTransport {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self)
    }
}

#[async_trait]
impl Transport for FailingTransport {
    async fn deliver_text(
        &self,
        _conversation: &ConversationId,
        _text: &str,
        _keyboard: Option<&Keyboard>,
    ) -> DeliveryResult<()> {
        Err(DeliveryError::refused("wire down"))
    }

    async fn deliver_image(
        &self,
        _conversation: &ConversationId,
        _image: &[u8],
        _caption: Option<&str>,
    ) -> DeliveryResult<()> {
        Err(DeliveryError::refused("wire down"))
    }

    async fn deliver_reaction(
        &self,
        _conversation: &ConversationId,
        _reaction: &Reaction,
    ) -> DeliveryResult<()> {
        Err(DeliveryError::refused("wire down"))
    }

    fn encode_signal(&self, _signal: &BoxedSignal) -> DeliveryResult<String> {
        Err(DeliveryError::refused("wire down"))
    }

    fn decode_signal(&self, _token: &str) -> DeliveryResult<BoxedSignal> {
        Err(DeliveryError::refused("wire down"))
    }
}
