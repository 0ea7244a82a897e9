//! A two-button choice flow on a console transport.
//!
//! The bot answers `/start` with a welcome message and a red/blue pill
//! keyboard. Pressing a button publishes a `PillSelected` signal; its
//! subscriber confirms the choice. No real messenger is attached: the
//! console transport prints deliveries and the `main` function plays the
//! inbound side of the conversation.

use std::sync::Arc;

use async_trait::async_trait;
use parley::core::codec;
use parley::core::{CodecResult, DeliveryError, DeliveryResult};
use parley::prelude::*;

/// The user's choice, carried from the keyboard to the subscriber.
#[derive(Debug, Clone)]
struct PillSelected {
    pill: String,
}

impl_signal!(PillSelected);

impl WireSignal for PillSelected {
    fn wire_name() -> &'static str {
        "PillSelected"
    }

    fn to_fields(&self) -> Vec<String> {
        vec![self.pill.clone()]
    }

    fn from_fields(fields: &[String]) -> CodecResult<Self> {
        Ok(Self {
            pill: codec::parse_field("PillSelected", fields, 0)?,
        })
    }
}

/// Prints deliveries to stdout instead of talking to a messenger.
struct ConsoleTransport;

#[async_trait]
impl Transport for ConsoleTransport {
    async fn deliver_text(
        &self,
        conversation: &ConversationId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> DeliveryResult<()> {
        println!("[{conversation}] bot: {text}");
        if let Some(keyboard) = keyboard {
            for row in keyboard.rows() {
                for button in row {
                    let token = self.encode_signal(button.on_press())?;
                    println!("[{conversation}]      ({}) -> {token}", button.text());
                }
            }
        }
        Ok(())
    }

    async fn deliver_image(
        &self,
        conversation: &ConversationId,
        image: &[u8],
        caption: Option<&str>,
    ) -> DeliveryResult<()> {
        println!(
            "[{conversation}] bot: <image, {} bytes> {}",
            image.len(),
            caption.unwrap_or("")
        );
        Ok(())
    }

    async fn deliver_reaction(
        &self,
        conversation: &ConversationId,
        reaction: &parley::core::Reaction,
    ) -> DeliveryResult<()> {
        println!("[{conversation}] bot reacted: {}", reaction.symbol());
        Ok(())
    }

    fn encode_signal(&self, signal: &BoxedSignal) -> DeliveryResult<String> {
        match signal.downcast_ref::<PillSelected>() {
            Some(pill) => Ok(codec::encode(pill)),
            None => Err(DeliveryError::Unsupported {
                action: "encode_signal",
            }),
        }
    }

    fn decode_signal(&self, token: &str) -> DeliveryResult<BoxedSignal> {
        match codec::peek_name(token) {
            "PillSelected" => {
                let signal: PillSelected = codec::decode(token)?;
                Ok(BoxedSignal::new(signal))
            }
            other => Err(DeliveryError::refused(format!("unknown signal: {other}"))),
        }
    }
}

fn build_router() -> Result<Router, Box<dyn std::error::Error>> {
    let mut router = Router::new();

    router.command(
        "start",
        "begin the session",
        into_handler(|ctx: Arc<Context>| async move {
            let keyboard = Keyboard::new().row([
                Button::new("Red pill", PillSelected { pill: "red".into() }),
                Button::new("Blue pill", PillSelected { pill: "blue".into() }),
            ]);
            ctx.send_message_with_keyboard("Welcome", &keyboard).await?;
            Ok(Outcome::Done)
        }),
    )?;

    router.message(
        "(?P<text>.*)",
        into_handler(|ctx: Arc<Context>| async move {
            let text = ctx.binding("text").unwrap_or("");
            ctx.send_message(&format!("You said: {text}")).await?;
            Ok(Outcome::Done)
        }),
    )?;

    Ok(router)
}

fn build_bus() -> SignalBus {
    let mut bus = SignalBus::new();
    bus.subscribe::<PillSelected, _, _>(|ctx, signal| async move {
        ctx.send_message(&format!("So be it: {}", signal.pill)).await?;
        Ok(Outcome::Done)
    });
    bus
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    LoggingBuilder::new()
        .with_level(parley::runtime::tracing::Level::INFO)
        .init();

    let transport: BoxedTransport = Arc::new(ConsoleTransport);
    let dispatcher = Dispatcher::new(
        Arc::new(build_router()?),
        Arc::new(build_bus()),
        transport,
    );
    let runtime = ParleyRuntime::new(dispatcher);

    // Play the inbound side of a short conversation.
    runtime
        .submit(Envelope::command("console", "neo", "start", ""))
        .await?;
    runtime
        .submit(Envelope::button_press("console", "neo", "PillSelected:red"))
        .await?;
    runtime
        .submit(Envelope::text("console", "neo", "there is no spoon"))
        .await?;

    runtime.shutdown().await;
    Ok(())
}
