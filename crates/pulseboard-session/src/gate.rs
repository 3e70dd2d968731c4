//! Route gating: what a protected view should render right now.
//!
//! A pure function of three facts about the session. No side effects, so
//! the presentation layer can call it on every render.
//!
//! ```text
//!   is_loading ──yes──→ ShowLoadingIndicator
//!       │no
//!   authenticated ──no──→ RedirectToLogin
//!       │yes
//!   role == admin ──no──→ ShowAccessDenied
//!       │yes
//!   RenderChildren
//! ```

use crate::{SessionSnapshot, SessionState};

/// The role that unlocks protected content (compared case-insensitively).
pub const ADMIN_ROLE: &str = "admin";

/// What a protected view should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    ShowLoadingIndicator,
    RedirectToLogin,
    ShowAccessDenied,
    RenderChildren,
}

impl GateDecision {
    /// `true` only for [`GateDecision::RenderChildren`].
    pub fn allows_render(self) -> bool {
        matches!(self, Self::RenderChildren)
    }
}

/// The facts the gate decides on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateInput<'a> {
    pub is_loading: bool,
    pub is_authenticated: bool,
    pub role: Option<&'a str>,
}

impl<'a> GateInput<'a> {
    /// Reads the gate's inputs off a session snapshot.
    ///
    /// A manager that has not run `initialize()` yet may still hold a
    /// restorable session, so `Uninitialized` counts as loading.
    pub fn from_snapshot(snapshot: &'a SessionSnapshot) -> Self {
        Self {
            is_loading: snapshot.is_loading || snapshot.state == SessionState::Uninitialized,
            is_authenticated: snapshot.is_authenticated(),
            role: snapshot.user.as_ref().map(|u| u.role.as_str()),
        }
    }
}

/// Decides what to render.
pub fn evaluate(input: GateInput<'_>) -> GateDecision {
    if input.is_loading {
        GateDecision::ShowLoadingIndicator
    } else if !input.is_authenticated {
        GateDecision::RedirectToLogin
    } else if !input.role.is_some_and(is_admin_role) {
        GateDecision::ShowAccessDenied
    } else {
        GateDecision::RenderChildren
    }
}

pub(crate) fn is_admin_role(role: &str) -> bool {
    role.trim().eq_ignore_ascii_case(ADMIN_ROLE)
}
