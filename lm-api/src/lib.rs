//! LawMatics API - HTTP client for the LawMatics REST API.
//!
//! [`ApiClient`] owns the request pipeline: it attaches credentials,
//! refreshes OAuth tokens before they expire (one refresh at a time, shared
//! by every caller waiting on it), retries transient failures and maps error
//! responses to [`lm_core::LmError`]. Entity clients such as
//! [`ApiClient::contacts`] and [`ApiClient::matters`] are thin wrappers over
//! the generic [`ResourceClient`].
//!
//! ```no_run
//! # async fn demo() -> lm_core::LmResult<()> {
//! use lm_api::{ApiClient, Credentials, ListParams};
//! use lm_core::SdkConfig;
//!
//! let credentials = Credentials::new("access-token")?.with_refresh_token("refresh-token");
//! let client = ApiClient::new(&SdkConfig::default(), credentials)?;
//! let page = client.contacts().list(&ListParams::new().page_size(50)).await?;
//! for contact in page {
//!     println!("{}", contact.display_name());
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod credentials;
pub mod endpoints;
pub mod request;
pub mod resource;
pub mod response;

// Re-export key types
pub use auth::{OAuthClient, TokenResponse};
pub use client::{ApiClient, RawResponse, RetryConfig};
pub use credentials::{CredentialStore, Credentials};
pub use request::{RequestDescriptor, ResourceRef};
pub use resource::{ListParams, ResourceClient};
pub use response::{ApiResponse, ErrorPayload, Page, PaginationInfo};
pub use tokio_util::sync::CancellationToken;
