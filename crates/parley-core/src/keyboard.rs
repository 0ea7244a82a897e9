//! Declarative inline keyboards.
//!
//! A [`Keyboard`] is a grid of [`Button`]s, each pairing display text with
//! the signal to publish when it is pressed. Application code builds the
//! grid and hands it to a `send_message` call; the transport adapter is
//! responsible for encoding each button's signal into its platform's
//! callback payload (see
//! [`Transport::encode_signal`](crate::transport::Transport::encode_signal)).

use crate::signal::{BoxedSignal, Signal};

/// One pressable button: display text plus the signal it publishes.
#[derive(Debug, Clone)]
pub struct Button {
    text: String,
    on_press: BoxedSignal,
}

impl Button {
    pub fn new(text: impl Into<String>, on_press: impl Signal) -> Self {
        Self {
            text: text.into(),
            on_press: BoxedSignal::new(on_press),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn on_press(&self) -> &BoxedSignal {
        &self.on_press
    }
}

/// An ordered grid of buttons.
///
/// Rows are displayed top to bottom, buttons within a row left to right.
///
/// # Example
///
/// ```rust,ignore
/// let keyboard = Keyboard::new()
///     .row([
///         Button::new("Red pill", PillSelected { pill: "red".into() }),
///         Button::new("Blue pill", PillSelected { pill: "blue".into() }),
///     ])
///     .row([Button::new("Neither", PillRefused)]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Keyboard {
    rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row of buttons.
    pub fn row(mut self, buttons: impl IntoIterator<Item = Button>) -> Self {
        self.rows.push(buttons.into_iter().collect());
        self
    }

    pub fn rows(&self) -> &[Vec<Button>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.is_empty())
    }

    /// Total number of buttons across all rows.
    pub fn button_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_signal;

    #[derive(Debug, Clone)]
    struct PillSelected {
        pill: String,
    }

    impl_signal!(PillSelected);

    #[test]
    fn grid_preserves_order() {
        let keyboard = Keyboard::new()
            .row([
                Button::new("Red pill", PillSelected { pill: "red".into() }),
                Button::new("Blue pill", PillSelected { pill: "blue".into() }),
            ])
            .row([Button::new("Help", PillSelected { pill: "help".into() })]);

        assert_eq!(keyboard.button_count(), 3);
        assert_eq!(keyboard.rows()[0][0].text(), "Red pill");
        assert_eq!(keyboard.rows()[0][1].text(), "Blue pill");
        assert_eq!(keyboard.rows()[1][0].text(), "Help");

        let pill = keyboard.rows()[0][1]
            .on_press()
            .downcast_ref::<PillSelected>()
            .map(|p| p.pill.clone());
        assert_eq!(pill.as_deref(), Some("blue"));
    }

    #[test]
    fn empty_keyboard() {
        assert!(Keyboard::new().is_empty());
        assert!(Keyboard::new().row([]).is_empty());
    }
}
