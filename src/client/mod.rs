//! MAAS API Client Module
//!
//! HTTP adapter for the [`ProvisioningApi`](crate::domain::ports::ProvisioningApi)
//! port, request signing and API key retrieval.

pub mod auth;
pub mod maas;
pub mod token;

pub use auth::ApiKey;
pub use maas::MaasClient;
pub use token::fetch_api_key;
