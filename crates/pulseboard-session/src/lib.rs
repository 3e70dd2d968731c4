//! Session management for Pulseboard.
//!
//! This crate owns everything about "who is logged in":
//!
//! 1. **Credential exchange** — trading email/password for a token
//!    ([`CredentialService`] trait, [`HttpCredentialService`])
//! 2. **Session state** — the single authoritative record of the current
//!    user ([`SessionManager`])
//! 3. **Persistence** — surviving restarts through a durable key-value
//!    store ([`SessionStore`], [`KeyValueStore`])
//! 4. **Gating** — deciding what a protected view should render
//!    ([`evaluate`], [`GateDecision`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Validator / Dashboard (above)  ← read snapshots, request logout
//!     ↕
//! Session Layer (this crate)     ← login, restore, logout, gate
//!     ↕
//! Token + Transport (below)      ← decode expiry, talk HTTP
//! ```

mod auth;
mod error;
mod gate;
mod manager;
mod session;
mod store;

pub use auth::{
    CredentialService, HttpCredentialService, LoginData, LoginRequest,
    LoginResponse, ServiceEnvelope,
};
pub use error::{SessionError, StoreError};
pub use gate::{ADMIN_ROLE, GateDecision, GateInput, evaluate};
pub use manager::SessionManager;
pub use session::{
    RemoteUser, Session, SessionConfig, SessionSnapshot, SessionState, User,
};
pub use store::{
    FileStore, KeyValueStore, MemoryStore, PersistedSession, SessionStore,
};
