//! Input handling for the Bulwark TUI.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;
use tracing::debug;

use crate::session::Session;

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 256;
const MAX_EVENTS_PER_FRAME: usize = 32; // never starve rendering

enum InputMsg {
    Event(Event),
    Error(String),
}

/// Reads terminal events on a blocking task and hands them to the frame loop.
pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
    stop: Arc<AtomicBool>,
    join: Option<tokio::task::JoinHandle<()>>,
}

impl InputPump {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = stop.clone();

        let join = tokio::task::spawn_blocking(move || input_loop(stop2, tx));
        Self {
            rx,
            stop,
            join: Some(join),
        }
    }

    pub async fn shutdown(&mut self) {
        // Close first so a thread blocked on a full channel wakes up.
        self.rx.close();

        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), join).await;
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        // Best-effort stop if caller exits early; do not block in Drop.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn input_loop(stop: Arc<AtomicBool>, tx: mpsc::Sender<InputMsg>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if tx.blocking_send(InputMsg::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                break;
            }
        }
    }
}

/// Drain pending terminal events into the session.
///
/// Returns `Ok(true)` once the user asked to quit.
pub fn handle_events(session: &mut Session, input: &mut InputPump) -> Result<bool> {
    let mut processed = 0;
    while processed < MAX_EVENTS_PER_FRAME {
        let ev = match input.rx.try_recv() {
            Ok(InputMsg::Event(ev)) => ev,
            Ok(InputMsg::Error(msg)) => return Err(anyhow!("input error: {msg}")),
            Err(mpsc::error::TryRecvError::Empty) => break,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(anyhow!("input pump disconnected"));
            }
        };

        if apply_event(session, &ev) {
            return Ok(true);
        }
        processed += 1;
    }
    Ok(session.should_quit())
}

/// Apply one event. Returns true when the session should quit.
pub fn apply_event(session: &mut Session, ev: &Event) -> bool {
    let Event::Key(key) = ev else {
        return false;
    };
    if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
        return false;
    }
    apply_key(session, *key);
    session.should_quit()
}

fn apply_key(session: &mut Session, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => session.request_quit(),
        KeyCode::Char('r') if ctrl => session.hard_reload(),
        KeyCode::Char('q') | KeyCode::Esc => session.request_quit(),
        KeyCode::Char(digit @ '1'..='9') => {
            let n = digit as usize - '0' as usize;
            if session.activate_nth(n).is_none() {
                debug!(n, "No action bound to key");
            }
        }
        KeyCode::Char(hotkey) if !ctrl => {
            if !session.follow_nav(hotkey) {
                debug!(%hotkey, "Unbound key");
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use bulwark_engine::{BuildMode, FaultInput, SlotBody};
    use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

    use super::apply_event;
    use crate::test_support::session;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    #[test]
    fn digit_activates_numbered_action() {
        let (mut session, source) = session(BuildMode::Production);
        source.fail("reports", FaultInput::new("db timeout"));
        session.renderer_mut().navigate("/reports");
        source.heal("reports");

        assert!(!apply_event(&mut session, &key(KeyCode::Char('1'))));
        assert_eq!(session.notice(), Some("Retrying..."));
        session.tick();

        assert_eq!(session.renderer().recovery_attempts(), 1);
        let screen = session.screen();
        assert!(screen.actions().is_empty());
    }

    #[test]
    fn contact_support_sets_notice_without_navigating() {
        let (mut session, source) = session(BuildMode::Production);
        source.fail("reports", FaultInput::new("db timeout"));
        session.renderer_mut().navigate("/reports");

        apply_event(&mut session, &key(KeyCode::Char('3')));
        assert_eq!(
            session.notice(),
            Some("Open mailto:help@demo.test to reach support")
        );
        assert_eq!(session.renderer().route().as_str(), "/reports");
    }

    #[test]
    fn unbound_digit_is_ignored() {
        let (mut session, _source) = session(BuildMode::Production);
        assert!(!apply_event(&mut session, &key(KeyCode::Char('9'))));
        assert_eq!(session.notice(), None);
    }

    #[test]
    fn nav_hotkey_navigates_through_shell() {
        let (mut session, _source) = session(BuildMode::Production);
        apply_event(&mut session, &key(KeyCode::Char('r')));
        assert_eq!(session.renderer().route().as_str(), "/reports");
    }

    #[test]
    fn nav_hotkeys_disabled_under_root_fallback() {
        let (mut session, source) = session(BuildMode::Production);
        source.fail_shell(true);
        session.renderer_mut().navigate("/reports");
        assert!(session.renderer().is_shell_faulted());

        apply_event(&mut session, &key(KeyCode::Char('h')));
        assert_eq!(session.renderer().route().as_str(), "/reports");
    }

    #[test]
    fn ctrl_r_hard_reloads_current_route() {
        let (mut session, source) = session(BuildMode::Production);
        source.set_pending("reports", true);
        session.renderer_mut().navigate("/reports");
        source.set_pending("reports", false);

        apply_event(&mut session, &ctrl('r'));
        let screen = session.screen();
        assert!(screen.text().contains("Reports"));
        assert!(matches!(
            screen_slot_body(&screen, "/reports"),
            Some(SlotBody::Content(_))
        ));
    }

    #[test]
    fn quit_keys() {
        let (mut by_q, _source) = session(BuildMode::Production);
        assert!(apply_event(&mut by_q, &key(KeyCode::Char('q'))));

        let (mut by_ctrl_c, _source) = session(BuildMode::Production);
        assert!(apply_event(&mut by_ctrl_c, &ctrl('c')));

        let (mut by_esc, _source) = session(BuildMode::Production);
        let release = Event::Key(KeyEvent::new_with_kind(
            KeyCode::Esc,
            KeyModifiers::NONE,
            KeyEventKind::Release,
        ));
        assert!(!apply_event(&mut by_esc, &release));
        assert!(apply_event(&mut by_esc, &key(KeyCode::Esc)));
    }

    fn screen_slot_body<'a>(
        screen: &'a bulwark_engine::Screen,
        route: &str,
    ) -> Option<&'a SlotBody> {
        match screen {
            bulwark_engine::Screen::Document(document) => document
                .slots
                .iter()
                .find(|slot| slot.route.as_str() == route)
                .map(|slot| &slot.body),
            bulwark_engine::Screen::RootFallback(_) => None,
        }
    }
}
