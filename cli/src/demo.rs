//! Built-in demo application exercising every fallback path.
//!
//! | Route      | Behavior                                                 |
//! |------------|----------------------------------------------------------|
//! | `/`        | Plain content                                            |
//! | `/reports` | Pending for a moment, then ready                         |
//! | `/flaky`   | Fails twice, then renders (press Try Again)              |
//! | `/broken`  | Fails outside any subtree boundary, takes the root down  |
//! | `/outage`  | The shell itself fails                                   |
//! | anything   | Not found                                                |

use std::time::{Duration, Instant};

use bulwark_engine::{
    FaultInput, NavLink, PageContent, Resolution, RoutePath, SegmentSource, SegmentSpec,
    ShellContext,
};

const REPORTS_DELAY: Duration = Duration::from_millis(1500);
const FLAKY_FAILURES: usize = 2;

#[derive(Debug, Default)]
pub struct DemoSource {
    reports_ready_at: Option<Instant>,
    flaky_renders: usize,
}

impl DemoSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SegmentSource for DemoSource {
    fn segments_for(&mut self, route: &RoutePath) -> Option<Vec<SegmentSpec>> {
        let layout = SegmentSpec::new("layout", "/");
        let child = |name: &str| SegmentSpec::new(name, route.clone()).child_of(0).bounded();

        match route.as_str() {
            "/" => Some(vec![layout, child("home")]),
            "/reports" => {
                self.reports_ready_at = None;
                Some(vec![layout, child("reports")])
            }
            "/flaky" => {
                self.flaky_renders = 0;
                Some(vec![layout, child("flaky")])
            }
            "/broken" => Some(vec![
                layout,
                SegmentSpec::new("broken", "/broken").child_of(0),
            ]),
            "/outage" => Some(vec![layout, child("outage")]),
            _ => None,
        }
    }

    fn resolve(&mut self, segment: &SegmentSpec) -> Resolution {
        if segment.name != "reports" {
            return Resolution::Ready;
        }
        let ready_at = *self
            .reports_ready_at
            .get_or_insert_with(|| Instant::now() + REPORTS_DELAY);
        if Instant::now() >= ready_at {
            Resolution::Ready
        } else {
            Resolution::Pending
        }
    }

    fn render(&mut self, segment: &SegmentSpec) -> Result<PageContent, FaultInput> {
        match segment.name.as_str() {
            "layout" => Ok(PageContent::new("Workspace")),
            "home" => Ok(PageContent::new("Welcome")
                .line("Every route in the navigation bar demonstrates a different failure mode.")
                .line("Press the highlighted key to visit it.")),
            "reports" => Ok(PageContent::new("Quarterly reports")
                .line("Q1  revenue 1.2M  churn 2.1%")
                .line("Q2  revenue 1.4M  churn 1.8%")),
            "flaky" => {
                self.flaky_renders += 1;
                if self.flaky_renders <= FLAKY_FAILURES {
                    Err(FaultInput::new("upstream returned 503")
                        .with_identifier(format!("7f3a9c{:02}", self.flaky_renders))
                        .with_trace("at fetch_inventory (inventory.rs:42)\nat render_flaky (pages.rs:17)"))
                } else {
                    Ok(PageContent::new("Inventory")
                        .line(format!("Loaded after {} attempts.", self.flaky_renders)))
                }
            }
            "broken" => Err(FaultInput::new("cannot read property 'items' of undefined")
                .with_trace("at BrokenList (pages.rs:88)")),
            other => Ok(PageContent::new(other.to_string())),
        }
    }

    fn shell(&mut self, route: &RoutePath) -> Result<ShellContext, FaultInput> {
        if route.as_str() == "/outage" {
            return Err(FaultInput::new("session store unreachable").with_identifier("e5d1b0"));
        }
        Ok(ShellContext {
            title: "Bulwark Demo".to_string(),
            nav: [
                ('h', "Home", "/"),
                ('r', "Reports", "/reports"),
                ('f', "Flaky", "/flaky"),
                ('b', "Broken", "/broken"),
                ('o', "Outage", "/outage"),
                ('m', "Missing", "/missing"),
            ]
            .into_iter()
            .map(|(hotkey, label, route)| NavLink {
                hotkey,
                label: label.to_string(),
                route: RoutePath::parse(route),
            })
            .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flaky_fails_twice_then_renders() {
        let mut source = DemoSource::new();
        let route = RoutePath::parse("/flaky");
        let specs = source.segments_for(&route).expect("route exists");
        let flaky = &specs[1];

        assert!(source.render(flaky).is_err());
        assert!(source.render(flaky).is_err());
        assert!(source.render(flaky).is_ok());

        // Navigating back resets the counter.
        let _ = source.segments_for(&route);
        assert!(source.render(flaky).is_err());
    }

    #[test]
    fn broken_segment_has_no_boundary() {
        let mut source = DemoSource::new();
        let specs = source
            .segments_for(&RoutePath::parse("/broken"))
            .expect("route exists");
        assert!(specs.iter().all(|spec| !spec.bounded));
    }

    #[test]
    fn outage_breaks_the_shell() {
        let mut source = DemoSource::new();
        assert!(source.shell(&RoutePath::parse("/outage")).is_err());
        assert!(source.shell(&RoutePath::root()).is_ok());
    }

    #[test]
    fn unknown_route_is_not_found() {
        let mut source = DemoSource::new();
        assert!(source.segments_for(&RoutePath::parse("/missing")).is_none());
    }
}
