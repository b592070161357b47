//! Advisory page access check.
//!
//! The backend authorizes every request on its own; this only decides
//! whether a page is worth showing to the signed-in user.

use crate::session::Session;
use crate::types::Role;
use crate::workflow::Reviewer;

pub const SIGN_IN_PATH: &str = "/signin";
pub const NOT_FOUND_PATH: &str = "/error-404";

/// Pages open to every known role
const GENERAL_PAGES: [&str; 15] = [
    "/",
    "/calendar",
    "/profile",
    "/form-elements",
    "/basic-tables",
    "/blank",
    "/error-404",
    "/line-chart",
    "/bar-chart",
    "/alerts",
    "/avatars",
    "/badge",
    "/buttons",
    "/images",
    "/videos",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    RedirectSignIn,
    RedirectNotFound,
}

#[derive(Debug, Clone)]
struct Rule {
    path: String,
    roles: Vec<Role>,
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    rules: Vec<Rule>,
}

impl Default for RouteGuard {
    fn default() -> Self {
        let mut rules: Vec<Rule> = GENERAL_PAGES
            .iter()
            .map(|path| Rule {
                path: path.to_string(),
                roles: Role::KNOWN.to_vec(),
            })
            .collect();
        rules.push(Rule {
            path: "/requisition".into(),
            roles: vec![Role::Admin, Role::Hod],
        });
        for reviewer in Reviewer::ALL {
            rules.push(Rule {
                path: reviewer.queue_path().into(),
                roles: vec![Role::Admin, reviewer.role()],
            });
        }
        Self { rules }
    }
}

impl RouteGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roles allowed on `path`, or `None` when the path is unrestricted
    pub fn allowed_roles(&self, path: &str) -> Option<&[Role]> {
        let path = trim_path(path);
        self.rules
            .iter()
            .filter(|rule| matches_path(&rule.path, path))
            .max_by_key(|rule| rule.path.len())
            .map(|rule| rule.roles.as_slice())
    }

    pub fn check(&self, session: Option<&Session>, path: &str) -> Access {
        let session = match session {
            Some(s) if s.is_authenticated() => s,
            _ => return Access::RedirectSignIn,
        };
        let allowed = match self.allowed_roles(path) {
            Some(roles) => roles,
            None => return Access::Allow,
        };
        // roles not known yet
        if session.roles.is_empty() {
            return Access::Allow;
        }
        if session.roles.iter().any(|role| allowed.contains(role)) {
            Access::Allow
        } else {
            tracing::debug!(path, "No matching role for page");
            Access::RedirectNotFound
        }
    }
}

fn trim_path(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// Exact match, or `rule` is a whole-segment prefix of `path`. Root only matches itself.
fn matches_path(rule: &str, path: &str) -> bool {
    if rule == path {
        return true;
    }
    if rule == "/" {
        return false;
    }
    path.strip_prefix(rule).is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(roles: Vec<Role>) -> Session {
        Session {
            access_token: "t".into(),
            auth: true,
            roles,
            ..Session::default()
        }
    }

    #[test]
    fn unauthenticated_goes_to_sign_in() {
        let guard = RouteGuard::new();
        assert_eq!(guard.check(None, "/profile"), Access::RedirectSignIn);
        let mut signed_out = session(vec![Role::Hod]);
        signed_out.auth = false;
        assert_eq!(guard.check(Some(&signed_out), "/profile"), Access::RedirectSignIn);
    }

    #[test]
    fn new_requisition_is_for_hod_and_admin() {
        let guard = RouteGuard::new();
        assert_eq!(guard.check(Some(&session(vec![Role::Hod])), "/requisition"), Access::Allow);
        assert_eq!(guard.check(Some(&session(vec![Role::Admin])), "/requisition/"), Access::Allow);
        assert_eq!(
            guard.check(Some(&session(vec![Role::PaLegal])), "/requisition"),
            Access::RedirectNotFound
        );
    }

    #[test]
    fn queues_follow_reviewer_roles() {
        let guard = RouteGuard::new();
        let technical = session(vec![Role::TechnicalDirector]);
        assert_eq!(guard.check(Some(&technical), "/requisitions/technical"), Access::Allow);
        assert_eq!(guard.check(Some(&technical), "/requisitions/technical/42"), Access::Allow);
        assert_eq!(
            guard.check(Some(&technical), "/requisitions/commercial"),
            Access::RedirectNotFound
        );
    }

    #[test]
    fn prefix_matching_respects_segments() {
        let guard = RouteGuard::new();
        // `/requisitions/...` is not under `/requisition`
        assert_eq!(guard.allowed_roles("/requisitions/unknown"), None);
        // root never matches by prefix
        assert_eq!(guard.allowed_roles("/somewhere/else"), None);
        assert!(guard.allowed_roles("/").is_some());
    }

    #[test]
    fn unknown_roles_and_empty_roles() {
        let guard = RouteGuard::new();
        assert_eq!(guard.check(Some(&session(vec![])), "/requisition"), Access::Allow);
        let other = session(vec![Role::Other("AUDITOR".into())]);
        assert_eq!(guard.check(Some(&other), "/profile"), Access::RedirectNotFound);
        assert_eq!(guard.check(Some(&other), "/not-mapped"), Access::Allow);
    }
}
