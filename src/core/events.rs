//! Unified event handling system

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;
use tokio::sync::mpsc;

/// Which alert mutation settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertAction {
    Acknowledge,
    Resolve,
}

impl AlertAction {
    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Acknowledge => "acknowledged",
            Self::Resolve => "resolved",
        }
    }
}

/// All possible events in the system
#[derive(Debug, Clone)]
pub enum Event {
    // Input events
    Key(KeyEvent),
    Resize(u16, u16),

    // System events
    Tick,     // Render tick
    SlowTick, // Housekeeping (1Hz)

    // Async completion events
    AlertActionSettled {
        action: AlertAction,
        alert_id: i64,
        error: Option<String>,
    },
}

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new() -> (Self, mpsc::UnboundedSender<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, tx)
    }

    /// Start all event source tasks
    pub fn spawn_sources(event_tx: mpsc::UnboundedSender<Event>) {
        tokio::spawn(Self::terminal_events(event_tx.clone()));

        // Query snapshots are synced on this tick, so it also bounds data latency
        tokio::spawn(Self::tick_events(
            event_tx.clone(),
            Duration::from_millis(250),
            Event::Tick,
        ));

        tokio::spawn(Self::tick_events(
            event_tx,
            Duration::from_secs(1),
            Event::SlowTick,
        ));
    }

    async fn terminal_events(tx: mpsc::UnboundedSender<Event>) {
        use crossterm::event::{self, Event as CrosstermEvent};
        use futures::StreamExt;

        let mut reader = event::EventStream::new();
        while let Some(event_result) = reader.next().await {
            let event = match event_result {
                Ok(CrosstermEvent::Key(key)) => Event::Key(key),
                Ok(CrosstermEvent::Resize(w, h)) => Event::Resize(w, h),
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "terminal event stream failed");
                    break;
                }
            };
            if tx.send(event).is_err() {
                break;
            }
        }
    }

    async fn tick_events(tx: mpsc::UnboundedSender<Event>, interval: Duration, event: Event) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if tx.send(event.clone()).is_err() {
                break;
            }
        }
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// Key binding helper
pub struct KeyBinding {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(key: KeyCode) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(key: KeyCode) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    /// Shift is already reflected in the character, so it is ignored for char keys
    pub fn matches(&self, event: &KeyEvent) -> bool {
        let modifiers = match event.code {
            KeyCode::Char(_) => event.modifiers.difference(KeyModifiers::SHIFT),
            _ => event.modifiers,
        };
        event.code == self.key && modifiers == self.modifiers
    }
}

/// Standard key bindings
pub struct KeyBindings;

impl KeyBindings {
    pub fn quit() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('q'))
    }

    pub fn quit_alt() -> KeyBinding {
        KeyBinding::ctrl(KeyCode::Char('c'))
    }

    pub fn help() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('?'))
    }

    pub fn escape() -> KeyBinding {
        KeyBinding::new(KeyCode::Esc)
    }

    pub fn enter() -> KeyBinding {
        KeyBinding::new(KeyCode::Enter)
    }

    pub fn switch_screen() -> KeyBinding {
        KeyBinding::new(KeyCode::Tab)
    }

    pub fn up() -> KeyBinding {
        KeyBinding::new(KeyCode::Up)
    }

    pub fn down() -> KeyBinding {
        KeyBinding::new(KeyCode::Down)
    }

    pub fn vim_up() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('k'))
    }

    pub fn vim_down() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('j'))
    }

    pub fn left() -> KeyBinding {
        KeyBinding::new(KeyCode::Left)
    }

    pub fn right() -> KeyBinding {
        KeyBinding::new(KeyCode::Right)
    }

    pub fn cycle_filter() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('s'))
    }

    pub fn acknowledge() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('a'))
    }

    pub fn resolve() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('x'))
    }

    pub fn refresh() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('r'))
    }

    pub fn shrink_range() -> KeyBinding {
        KeyBinding::new(KeyCode::Char('['))
    }

    pub fn grow_range() -> KeyBinding {
        KeyBinding::new(KeyCode::Char(']'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_c_is_distinct_from_c() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let plain_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        assert!(KeyBindings::quit_alt().matches(&ctrl_c));
        assert!(!KeyBindings::quit_alt().matches(&plain_c));
    }

    #[test]
    fn plain_bindings_ignore_modified_keys() {
        let alt = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::ALT);
        assert!(!KeyBindings::acknowledge().matches(&alt));
        let question = KeyEvent::new(KeyCode::Char('?'), KeyModifiers::SHIFT);
        assert!(KeyBindings::help().matches(&question));
        assert!(KeyBindings::acknowledge().matches(&KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE)));
    }

    #[tokio::test]
    async fn handler_delivers_sent_events() {
        let (mut handler, tx) = EventHandler::new();
        tx.send(Event::AlertActionSettled {
            action: AlertAction::Resolve,
            alert_id: 4,
            error: None,
        })
        .unwrap();
        drop(tx);

        assert!(matches!(
            handler.next().await,
            Some(Event::AlertActionSettled { alert_id: 4, .. })
        ));
        assert!(handler.next().await.is_none());
    }
}
