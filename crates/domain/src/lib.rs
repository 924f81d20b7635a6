//! Artdesk Domain - Core business types
//!
//! This crate defines the domain model for the Artdesk client engine:
//! sessions and credentials, normalized resource records, and the values
//! exchanged with the backend. All types here are pure Rust with no I/O.

pub mod analytics;
pub mod auth;
pub mod error;
pub mod id;
pub mod request;
pub mod resource;
pub mod response;
pub mod state;

pub use analytics::{Activity, DashboardSnapshot, DashboardStats};
pub use auth::{LoginCredentials, RegistrationCredentials, Role, Token, TokenIssuer, UserProfile};
pub use error::{DomainError, DomainResult};
pub use id::generate_token;
pub use request::{ApiBody, ApiRequest, HttpMethod};
pub use resource::{
    Attachment, CreatePolicy, RecordOrigin, ResourceCollection, ResourceKind, ResourceRecord,
};
pub use response::{ApiResponse, StatusCode};
pub use state::{AuthPhase, Session, SessionStatus};
