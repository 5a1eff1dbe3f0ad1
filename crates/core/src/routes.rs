//! Navigation guards evaluated against a synchronous session snapshot.
//!
//! Mirrors the shape of a role-gate extractor: each route belongs to an
//! [`Access`] class and [`evaluate`] decides whether the caller may enter it
//! or must be redirected. Guards never touch the network.

use std::collections::BTreeMap;

use crate::models::user::PlatformRole;

pub const LANDING: &str = "/";
pub const LOGIN: &str = "/login";
pub const DASHBOARD: &str = "/dashboard";
pub const ONBOARDING_WELCOME: &str = "/onboarding/welcome";
const ONBOARDING_PREFIX: &str = "/onboarding";

/// Who may visit a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone, signed in or not.
    Public,
    /// Signed-out visitors only (login, register...).
    GuestOnly,
    /// Signed-in users.
    Authenticated,
    /// Signed-in users with the `superadmin` platform role.
    SuperAdmin,
}

/// Route table: pattern (`:name` marks a parameter segment) and access class.
pub const ROUTES: &[(&str, Access)] = &[
    ("/", Access::Public),
    ("/pricing", Access::Public),
    ("/login", Access::GuestOnly),
    ("/register", Access::GuestOnly),
    ("/forgot-password", Access::GuestOnly),
    ("/onboarding/welcome", Access::Authenticated),
    ("/onboarding/create-show", Access::Authenticated),
    ("/onboarding/create-character", Access::Authenticated),
    ("/onboarding/setup-complete", Access::Authenticated),
    ("/dashboard", Access::Authenticated),
    ("/shows", Access::Authenticated),
    ("/shows/new", Access::Authenticated),
    ("/shows/:showId", Access::Authenticated),
    ("/shows/:showId/settings", Access::Authenticated),
    ("/shows/:showId/characters", Access::Authenticated),
    ("/shows/:showId/characters/new", Access::Authenticated),
    ("/shows/:showId/characters/:characterId", Access::Authenticated),
    ("/shows/:showId/episodes", Access::Authenticated),
    ("/shows/:showId/episodes/new", Access::Authenticated),
    ("/shows/:showId/episodes/:episodeId", Access::Authenticated),
    ("/episodes", Access::Authenticated),
    ("/pipeline", Access::Authenticated),
    ("/review", Access::Authenticated),
    ("/review/:episodeId", Access::Authenticated),
    ("/watch", Access::Authenticated),
    ("/watch/:showId", Access::Authenticated),
    ("/watch/:showId/:episodeId", Access::Authenticated),
    ("/billing/plans", Access::Authenticated),
    ("/billing/portal", Access::Authenticated),
    ("/settings/workspace", Access::Authenticated),
    ("/settings/profile", Access::Authenticated),
    ("/settings/team", Access::Authenticated),
    ("/kid", Access::Authenticated),
    ("/kid/watch", Access::Authenticated),
    ("/kid/characters", Access::Authenticated),
    ("/superadmin", Access::SuperAdmin),
    ("/superadmin/workspaces", Access::SuperAdmin),
    ("/superadmin/render", Access::SuperAdmin),
    ("/superadmin/settings", Access::SuperAdmin),
];

/// The slice of session state guards read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuardContext {
    pub is_authenticated: bool,
    pub onboarding_completed: bool,
    pub platform_role: Option<PlatformRole>,
}

impl GuardContext {
    fn is_super_admin(&self) -> bool {
        self.platform_role == Some(PlatformRole::Superadmin)
    }
}

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Allow,
    Redirect(&'static str),
}

/// A path resolved against [`ROUTES`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub pattern: &'static str,
    pub access: Access,
    pub params: BTreeMap<&'static str, String>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Resolve a path (query string and trailing slash ignored). Literal
/// patterns win over parameterised ones, so `/shows/new` is never read as a
/// show id.
pub fn match_route(path: &str) -> Option<RouteMatch> {
    let path = normalize(path);
    let segments: Vec<&str> = split(path);

    let mut best: Option<(usize, RouteMatch)> = None;
    for &(pattern, access) in ROUTES {
        let pattern_segments: Vec<&'static str> = split(pattern);
        if pattern_segments.len() != segments.len() {
            continue;
        }
        let mut params = BTreeMap::new();
        let mut literal_hits = 0;
        let mut matched = true;
        for (p, s) in pattern_segments.into_iter().zip(segments.iter().copied()) {
            if let Some(name) = p.strip_prefix(':') {
                params.insert(name, s.to_string());
            } else if p == s {
                literal_hits += 1;
            } else {
                matched = false;
                break;
            }
        }
        if matched && best.as_ref().map_or(true, |(hits, _)| literal_hits > *hits) {
            best = Some((
                literal_hits,
                RouteMatch {
                    pattern,
                    access,
                    params,
                },
            ));
        }
    }
    best.map(|(_, m)| m)
}

/// Decide whether `ctx` may enter `path`.
pub fn evaluate(ctx: &GuardContext, path: &str) -> Navigation {
    let Some(route) = match_route(path) else {
        return Navigation::Redirect(LANDING);
    };

    match route.access {
        Access::Public => Navigation::Allow,
        Access::GuestOnly if ctx.is_authenticated => Navigation::Redirect(DASHBOARD),
        Access::GuestOnly => Navigation::Allow,
        Access::Authenticated | Access::SuperAdmin => {
            if !ctx.is_authenticated {
                return Navigation::Redirect(LOGIN);
            }
            if !ctx.onboarding_completed && !normalize(path).starts_with(ONBOARDING_PREFIX) {
                return Navigation::Redirect(ONBOARDING_WELCOME);
            }
            if route.access == Access::SuperAdmin && !ctx.is_super_admin() {
                return Navigation::Redirect(DASHBOARD);
            }
            Navigation::Allow
        }
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

fn split(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in(onboarded: bool) -> GuardContext {
        GuardContext {
            is_authenticated: true,
            onboarding_completed: onboarded,
            platform_role: Some(PlatformRole::User),
        }
    }

    // ---- Test: public and guest-only paths ----

    #[test]
    fn guest_may_visit_login() {
        assert_eq!(evaluate(&GuardContext::default(), "/login"), Navigation::Allow);
    }

    #[test]
    fn signed_in_user_leaves_login_for_dashboard() {
        assert_eq!(evaluate(&signed_in(true), "/login"), Navigation::Redirect(DASHBOARD));
        assert_eq!(evaluate(&signed_in(true), "/register"), Navigation::Redirect(DASHBOARD));
    }

    #[test]
    fn landing_and_pricing_always_allowed() {
        for ctx in [GuardContext::default(), signed_in(true), signed_in(false)] {
            assert_eq!(evaluate(&ctx, "/"), Navigation::Allow);
            assert_eq!(evaluate(&ctx, "/pricing"), Navigation::Allow);
        }
    }

    // ---- Test: authenticated paths ----

    #[test]
    fn guest_is_sent_to_login() {
        assert_eq!(evaluate(&GuardContext::default(), "/dashboard"), Navigation::Redirect(LOGIN));
        assert_eq!(
            evaluate(&GuardContext::default(), "/shows/s1/episodes/e1"),
            Navigation::Redirect(LOGIN)
        );
    }

    #[test]
    fn incomplete_onboarding_redirects_to_welcome() {
        assert_eq!(
            evaluate(&signed_in(false), "/dashboard"),
            Navigation::Redirect(ONBOARDING_WELCOME)
        );
    }

    #[test]
    fn incomplete_onboarding_may_stay_inside_onboarding() {
        assert_eq!(evaluate(&signed_in(false), "/onboarding/create-show"), Navigation::Allow);
    }

    #[test]
    fn onboarded_user_reaches_app() {
        assert_eq!(evaluate(&signed_in(true), "/review/e9"), Navigation::Allow);
        assert_eq!(evaluate(&signed_in(true), "/kid/watch"), Navigation::Allow);
    }

    // ---- Test: superadmin ----

    #[test]
    fn non_superadmin_is_sent_to_dashboard() {
        assert_eq!(
            evaluate(&signed_in(true), "/superadmin/render"),
            Navigation::Redirect(DASHBOARD)
        );
    }

    #[test]
    fn guest_asking_for_superadmin_is_sent_to_login() {
        assert_eq!(evaluate(&GuardContext::default(), "/superadmin"), Navigation::Redirect(LOGIN));
        assert_eq!(
            evaluate(&GuardContext::default(), "/superadmin/workspaces"),
            Navigation::Redirect(LOGIN)
        );
        // A stale superadmin role without a session still counts as a guest.
        let ctx = GuardContext {
            platform_role: Some(PlatformRole::Superadmin),
            ..GuardContext::default()
        };
        assert_eq!(evaluate(&ctx, "/superadmin"), Navigation::Redirect(LOGIN));
    }

    #[test]
    fn superadmin_may_enter() {
        let ctx = GuardContext {
            platform_role: Some(PlatformRole::Superadmin),
            ..signed_in(true)
        };
        assert_eq!(evaluate(&ctx, "/superadmin"), Navigation::Allow);
    }

    // ---- Test: matching ----

    #[test]
    fn unknown_path_goes_to_landing() {
        assert_eq!(evaluate(&signed_in(true), "/nope/here"), Navigation::Redirect(LANDING));
    }

    #[test]
    fn literal_segment_beats_parameter() {
        let m = match_route("/shows/new").unwrap();
        assert_eq!(m.pattern, "/shows/new");
        assert!(m.params.is_empty());
    }

    #[test]
    fn extracts_params_and_ignores_query() {
        let m = match_route("/shows/s1/episodes/e2/?tab=script").unwrap();
        assert_eq!(m.pattern, "/shows/:showId/episodes/:episodeId");
        assert_eq!(m.param("showId"), Some("s1"));
        assert_eq!(m.param("episodeId"), Some("e2"));
    }
}
