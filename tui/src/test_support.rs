//! Small scripted segment source shared by the TUI tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use bulwark_engine::{
    BuildMode, FaultInput, NavLink, PageContent, Renderer, RendererOptions, Resolution, RoutePath,
    SegmentSource, SegmentSpec, ShellContext, SupportContact,
};
use bulwark_types::UiOptions;

use crate::Session;

#[derive(Default)]
struct Script {
    pending: HashSet<String>,
    failures: HashMap<String, FaultInput>,
    shell_broken: bool,
}

#[derive(Clone, Default)]
pub(crate) struct ScriptSource(Rc<RefCell<Script>>);

impl ScriptSource {
    pub(crate) fn fail(&self, segment: &str, input: FaultInput) {
        self.0
            .borrow_mut()
            .failures
            .insert(segment.to_string(), input);
    }

    pub(crate) fn heal(&self, segment: &str) {
        self.0.borrow_mut().failures.remove(segment);
    }

    pub(crate) fn set_pending(&self, segment: &str, pending: bool) {
        let mut script = self.0.borrow_mut();
        if pending {
            script.pending.insert(segment.to_string());
        } else {
            script.pending.remove(segment);
        }
    }

    pub(crate) fn fail_shell(&self, broken: bool) {
        self.0.borrow_mut().shell_broken = broken;
    }
}

impl SegmentSource for ScriptSource {
    fn segments_for(&mut self, route: &RoutePath) -> Option<Vec<SegmentSpec>> {
        let home = SegmentSpec::new("home", "/");
        match route.as_str() {
            "/" => Some(vec![home]),
            "/reports" => Some(vec![
                home,
                SegmentSpec::new("reports", "/reports").child_of(0).bounded(),
            ]),
            _ => None,
        }
    }

    fn resolve(&mut self, segment: &SegmentSpec) -> Resolution {
        if self.0.borrow().pending.contains(&segment.name) {
            Resolution::Pending
        } else {
            Resolution::Ready
        }
    }

    fn render(&mut self, segment: &SegmentSpec) -> Result<PageContent, FaultInput> {
        if let Some(input) = self.0.borrow().failures.get(&segment.name) {
            return Err(input.clone());
        }
        let title = match segment.name.as_str() {
            "home" => "Home page",
            _ => "Reports",
        };
        Ok(PageContent::new(title).line("All systems nominal."))
    }

    fn shell(&mut self, _route: &RoutePath) -> Result<ShellContext, FaultInput> {
        if self.0.borrow().shell_broken {
            return Err(FaultInput::new("layout failed"));
        }
        Ok(ShellContext {
            title: "Demo Shell".to_string(),
            nav: vec![
                NavLink {
                    hotkey: 'h',
                    label: "Home".to_string(),
                    route: RoutePath::root(),
                },
                NavLink {
                    hotkey: 'r',
                    label: "Reports".to_string(),
                    route: RoutePath::parse("/reports"),
                },
            ],
        })
    }
}

pub(crate) fn session(mode: BuildMode) -> (Session, ScriptSource) {
    session_with(mode, UiOptions::default())
}

pub(crate) fn session_with(mode: BuildMode, options: UiOptions) -> (Session, ScriptSource) {
    let source = ScriptSource::default();
    let mut renderer = Renderer::new(
        Box::new(source.clone()),
        RendererOptions {
            build_mode: mode,
            support: SupportContact::email("help@demo.test"),
            ..RendererOptions::default()
        },
    );
    renderer.navigate("/");
    (Session::new(renderer, options), source)
}
