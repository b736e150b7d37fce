//! Bulwark CLI - Binary entry point and terminal session management.
//!
//! # Architecture
//!
//! The CLI bridges [`bulwark_engine`] (renderer state) and [`bulwark_tui`]
//! (drawing and input), providing RAII-based terminal management with
//! guaranteed cleanup.
//!
//! ```text
//! main() -> Settings -> Renderer(DemoSource) -> TerminalSession -> run_app()
//! ```
//!
//! # Event Loop
//!
//! A fixed 16ms render cadence:
//!
//! 1. Wait for frame tick
//! 2. Drain input queue (non-blocking via [`bulwark_tui::InputPump`])
//! 3. Advance the renderer (`session.tick()`): recovery requests, pending segments
//! 4. Render frame

mod demo;

use std::{
    env,
    fs::{self, OpenOptions},
    io::{Stdout, stdout},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use bulwark_config::{BulwarkConfig, ReportingTarget, Settings, config_dir};
use bulwark_engine::{
    FaultSink, JsonLinesSink, NoopSink, NotFoundLinks, Renderer, RendererOptions, RoutePath,
    SupportContact,
};
use bulwark_tui::{InputPump, Session, draw, handle_events};

use crate::demo::DemoSource;

const FRAME_DURATION: Duration = Duration::from_millis(16);

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // If we can't open a log file, prefer "no logs" over corrupting the TUI
    // by writing to stdout/stderr.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.bulwark/logs/bulwark.log
    if let Some(dir) = config_dir() {
        candidates.push(dir.join("logs").join("bulwark.log"));
    }

    // Fallback: ./.bulwark/logs/bulwark.log (useful in constrained environments)
    candidates.push(PathBuf::from(".bulwark").join("logs").join("bulwark.log"));

    candidates
}

fn load_settings() -> Settings {
    let config = match BulwarkConfig::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            tracing::warn!("Ignoring config: {err}");
            BulwarkConfig::default()
        }
    };
    resolve_settings(&config)
}

/// Resolve `config`, falling back to defaults when a value is invalid.
fn resolve_settings(config: &BulwarkConfig) -> Settings {
    config.resolve().unwrap_or_else(|err| {
        tracing::warn!("Ignoring invalid config: {err}");
        Settings::default()
    })
}

fn fault_sink(target: &ReportingTarget) -> Box<dyn FaultSink> {
    match target {
        ReportingTarget::None => Box::new(NoopSink),
        ReportingTarget::JsonLines(path) => {
            tracing::info!(path = %path.display(), "Fault reports go to JSON lines file");
            Box::new(JsonLinesSink::new(path.clone()))
        }
    }
}

fn renderer_options(settings: &Settings) -> RendererOptions {
    let support = &settings.support;
    RendererOptions {
        build_mode: settings.build_mode,
        support: SupportContact {
            email: support.email.clone(),
        },
        not_found: NotFoundLinks {
            home: support.home_route.clone(),
            signup: support.signup_route.clone(),
            support_email: support.email.clone(),
        },
        ..RendererOptions::default()
    }
}

/// RAII wrapper for terminal state with guaranteed cleanup on drop.
///
/// Raw mode and the alternate screen are restored on drop, so the terminal
/// stays usable after panics or early returns.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;

        let mut out = stdout();
        if let Err(err) = execute!(out, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err.into());
        }

        match Terminal::new(CrosstermBackend::new(out)) {
            Ok(terminal) => Ok(Self { terminal }),
            Err(err) => {
                let _ = disable_raw_mode();
                let _ = execute!(stdout(), LeaveAlternateScreen);
                Err(err.into())
            }
        }
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let settings = load_settings();
    tracing::info!(build_mode = %settings.build_mode, "Starting");

    let initial = env::args()
        .nth(1)
        .map_or_else(RoutePath::root, |raw| RoutePath::parse(&raw));

    let mut renderer = Renderer::new(Box::new(DemoSource::new()), renderer_options(&settings))
        .with_sink(fault_sink(&settings.reporting));
    renderer.navigate(initial);
    let mut session = Session::new(renderer, settings.ui);

    let result = {
        let mut terminal = TerminalSession::new()?;
        run_app(&mut terminal.terminal, &mut session).await
    };

    if let Err(err) = &result {
        eprintln!("Error: {err:?}");
    }
    tracing::info!(
        recovery_attempts = session.renderer().recovery_attempts(),
        faults_reported = session.renderer().diagnostics().emitted(),
        "Exiting"
    );
    result
}

async fn run_app<B>(terminal: &mut Terminal<B>, session: &mut Session) -> Result<()>
where
    B: Backend,
    B::Error: Send + Sync + 'static,
{
    let mut input = InputPump::new();
    let mut frames = tokio::time::interval(FRAME_DURATION);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result: Result<()> = loop {
        frames.tick().await;

        // Non-blocking input (drain queue only)
        match handle_events(session, &mut input) {
            Ok(true) => break Ok(()),
            Ok(false) => {}
            Err(e) => break Err(e),
        }

        session.tick();

        if let Err(e) = terminal.draw(|frame| draw(frame, session)) {
            break Err(e.into());
        }
    };

    input.shutdown().await;
    result
}

#[cfg(test)]
mod tests {
    use bulwark_config::{ReportingConfig, SupportSettings};
    use bulwark_types::BuildMode;

    use super::*;

    #[test]
    fn renderer_options_follow_settings() {
        let settings = Settings {
            build_mode: BuildMode::Development,
            support: SupportSettings {
                email: None,
                home_route: RoutePath::parse("/start"),
                signup_route: None,
            },
            ..Settings::default()
        };
        let options = renderer_options(&settings);

        assert_eq!(options.build_mode, BuildMode::Development);
        assert_eq!(options.support.email, None);
        assert_eq!(options.not_found.home.as_str(), "/start");
        assert_eq!(options.not_found.signup, None);
    }

    #[test]
    fn invalid_config_falls_back_to_defaults() {
        let config = BulwarkConfig {
            reporting: Some(ReportingConfig {
                sink: Some("carrier-pigeon".to_string()),
                path: None,
            }),
            ..BulwarkConfig::default()
        };
        let settings = resolve_settings(&config);

        assert_eq!(settings.build_mode, BuildMode::Production);
        assert_eq!(settings.reporting, ReportingTarget::None);
    }

    #[test]
    fn log_candidates_end_with_local_fallback() {
        let candidates = log_file_candidates();
        assert_eq!(
            candidates.last(),
            Some(&PathBuf::from(".bulwark").join("logs").join("bulwark.log"))
        );
    }
}
