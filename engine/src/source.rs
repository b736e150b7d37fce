//! The host side of rendering: which segments a route mounts and how they render.

use bulwark_types::{FaultInput, PageContent, Resolution, RoutePath};

use crate::view::ShellContext;

/// One segment of a matched route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentSpec {
    pub name: String,
    pub route: RoutePath,
    /// Index of the parent within the same spec list; must precede this entry.
    pub parent: Option<usize>,
    /// Whether this segment is wrapped by a subtree error boundary.
    pub bounded: bool,
}

impl SegmentSpec {
    pub fn new(name: impl Into<String>, route: impl Into<RoutePath>) -> Self {
        Self {
            name: name.into(),
            route: route.into(),
            parent: None,
            bounded: false,
        }
    }

    #[must_use]
    pub fn child_of(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn bounded(mut self) -> Self {
        self.bounded = true;
        self
    }
}

/// Router and page host consumed by the renderer.
///
/// Implementations may fail in `render` and `shell`; the renderer turns those
/// failures into fault records and routes them to a boundary.
pub trait SegmentSource {
    /// Segments mounted for `route` in pre-order, or `None` when nothing matches.
    fn segments_for(&mut self, route: &RoutePath) -> Option<Vec<SegmentSpec>>;

    fn resolve(&mut self, segment: &SegmentSpec) -> Resolution;

    fn render(&mut self, segment: &SegmentSpec) -> Result<PageContent, FaultInput>;

    /// Shell chrome and navigation state for `route`.
    fn shell(&mut self, route: &RoutePath) -> Result<ShellContext, FaultInput>;
}
