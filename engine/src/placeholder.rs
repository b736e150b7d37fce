//! Stateless leaf views: the loading placeholder and the not-found page.

use bulwark_types::RoutePath;

use crate::boundary::{CONTACT_SUPPORT, GO_HOME};
use crate::view::{ActionView, FallbackAction, NotFoundPage, PlaceholderView};

pub const REGISTER: &str = "Register";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingCopy {
    pub title: String,
    pub subtitle: String,
}

impl Default for LoadingCopy {
    fn default() -> Self {
        Self {
            title: "Loading...".to_string(),
            subtitle: "Please wait while we prepare your content".to_string(),
        }
    }
}

/// Shown while a segment is pending.
#[derive(Debug, Clone, Default)]
pub struct LoadingPlaceholder {
    copy: LoadingCopy,
}

impl LoadingPlaceholder {
    #[must_use]
    pub fn new(copy: LoadingCopy) -> Self {
        Self { copy }
    }

    #[must_use]
    pub fn view(&self, tick: usize) -> PlaceholderView {
        PlaceholderView {
            title: self.copy.title.clone(),
            subtitle: self.copy.subtitle.clone(),
            phase: tick,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFoundLinks {
    pub home: RoutePath,
    pub signup: Option<RoutePath>,
    pub support_email: Option<String>,
}

impl Default for NotFoundLinks {
    fn default() -> Self {
        Self {
            home: RoutePath::root(),
            signup: None,
            support_email: None,
        }
    }
}

/// Terminal view for routes with no match.
#[derive(Debug, Clone, Default)]
pub struct NotFoundView {
    links: NotFoundLinks,
}

impl NotFoundView {
    #[must_use]
    pub fn new(links: NotFoundLinks) -> Self {
        Self { links }
    }

    #[must_use]
    pub fn view(&self) -> NotFoundPage {
        let mut secondary = Vec::new();
        if let Some(signup) = &self.links.signup {
            secondary.push(ActionView::new(
                REGISTER,
                FallbackAction::Navigate(signup.clone()),
            ));
        }
        if let Some(email) = &self.links.support_email {
            secondary.push(ActionView::new(
                CONTACT_SUPPORT,
                FallbackAction::Contact(format!("mailto:{email}")),
            ));
        }

        NotFoundPage {
            code: "404",
            title: "Page Not Found",
            description: "The page you're looking for doesn't exist or has been moved.",
            primary: ActionView::new(GO_HOME, FallbackAction::Navigate(self.links.home.clone())),
            secondary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_view_is_a_pure_function_of_tick() {
        let placeholder = LoadingPlaceholder::default();
        assert_eq!(placeholder.view(3), placeholder.view(3));
        assert_eq!(placeholder.view(5).phase, 5);
        assert_eq!(placeholder.view(0).title, "Loading...");
    }

    #[test]
    fn not_found_primary_action_goes_home() {
        let page = NotFoundView::default().view();
        assert_eq!(page.code, "404");
        assert_eq!(page.primary.label, GO_HOME);
        assert!(matches!(
            &page.primary.action,
            FallbackAction::Navigate(route) if route.is_root()
        ));
        assert!(page.secondary.is_empty());
    }

    #[test]
    fn not_found_secondary_links_follow_configuration() {
        let page = NotFoundView::new(NotFoundLinks {
            home: RoutePath::root(),
            signup: Some(RoutePath::parse("/register")),
            support_email: Some("support@example.com".to_string()),
        })
        .view();

        let labels: Vec<_> = page.actions().map(|a| a.label).collect();
        assert_eq!(labels, [GO_HOME, REGISTER, CONTACT_SUPPORT]);
        assert!(page.actions().all(|a| !a.action.is_retry()));
    }
}
