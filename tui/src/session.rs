//! Front-end state wrapped around the renderer.

use bulwark_engine::{Activation, FallbackAction, Renderer, Screen};
use bulwark_types::UiOptions;

/// Everything the draw and input code needs between frames.
#[derive(Debug)]
pub struct Session {
    renderer: Renderer,
    options: UiOptions,
    notice: Option<String>,
    should_quit: bool,
}

impl Session {
    #[must_use]
    pub fn new(renderer: Renderer, options: UiOptions) -> Self {
        Self {
            renderer,
            options,
            notice: None,
            should_quit: false,
        }
    }

    #[must_use]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    #[must_use]
    pub fn ui_options(&self) -> UiOptions {
        self.options
    }

    /// One-line message for the status bar, e.g. an external link to open.
    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }

    /// Advance one frame.
    pub fn tick(&mut self) {
        self.renderer.tick();
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.renderer.compose()
    }

    /// Activate the `n`th (1-based) action on the current screen.
    pub fn activate_nth(&mut self, n: usize) -> Option<Activation> {
        let action: FallbackAction = {
            let screen = self.screen();
            let actions = screen.actions();
            actions.get(n.checked_sub(1)?)?.action.clone()
        };
        Some(self.activate(&action))
    }

    pub fn activate(&mut self, action: &FallbackAction) -> Activation {
        let activation = self.renderer.activate(action);
        self.notice = match &activation {
            Activation::External(link) => Some(format!("Open {link} to reach support")),
            Activation::RecoveryQueued => Some("Retrying...".to_string()),
            Activation::Navigated(_) | Activation::Reloaded(_) => None,
        };
        activation
    }

    /// Follow the shell navigation link bound to `hotkey`.
    ///
    /// Returns false when no link matches or the shell is not available.
    pub fn follow_nav(&mut self, hotkey: char) -> bool {
        let Some(route) = self.renderer.shell_context().and_then(|shell| {
            shell
                .nav
                .iter()
                .find(|link| link.hotkey.eq_ignore_ascii_case(&hotkey))
                .map(|link| link.route.clone())
        }) else {
            return false;
        };
        if self.renderer.is_shell_faulted() {
            return false;
        }
        self.notice = None;
        self.renderer.navigate(route);
        true
    }

    /// Reload the current route from scratch.
    pub fn hard_reload(&mut self) {
        let route = self.renderer.route().clone();
        self.notice = None;
        self.renderer.hard_reload(route);
    }
}
