//! Delegated-credential lifecycle management.
//!
//! The stateful half of the gate. For routes requiring access to the upstream
//! resource provider it guarantees a usable delegated access token:
//!
//! - cached and unexpired → served as-is, no write
//! - expired, or of unknown age → refreshed against the provider's token
//!   endpoint and persisted, with concurrent requests for the same identity
//!   collapsing onto a single upstream call
//!
//! Refresh failures are transient (`400`), distinct from authentication
//! violations (`401`), and never clobber the stored record.

pub mod flight;
mod provider;
mod refresh;

pub use flight::FlightGuards;
pub use provider::DelegatedCredentialProvider;
pub use refresh::{HttpTokenRefresher, RefreshError, RefreshedTokens, TokenRefresher};
