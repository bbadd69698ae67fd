//! # tfapi
//!
//! A blocking client kit for JSON:API style infrastructure-management APIs
//! (Terraform Enterprise and compatible services).
//!
//! The crate deliberately stays generic over resource types: callers build
//! request paths and payloads, the client handles authentication headers,
//! pagination, error mapping, and bounded retries.
//!
//! ## Pieces
//!
//! - [`Connection`]: per-invocation settings (URL, bearer token, TLS
//!   verification, proxy use). Never global.
//! - [`Api`]: the uniform verb contract (list/show/create/update/destroy/
//!   action) every component drives.
//! - [`HttpApi`]: the ureq-backed implementation.
//! - [`Client`]: an [`Api`] bundled with a [`RetryPolicy`] so every call is
//!   a retrying call.
//! - [`Collection`], [`Single`], [`Resource`]: the JSON:API envelope.
//!
//! ## Example
//!
//! ```no_run
//! use tfapi::{Client, Connection, RetryPolicy};
//!
//! let conn = Connection::new("https://terraform.example.com", "my-token");
//! let client = Client::new(&conn, RetryPolicy::default());
//! let orgs = client.list("organizations", &[]).unwrap();
//! for org in &orgs.data {
//!     println!("{}", org.id);
//! }
//! ```

pub mod client;
pub mod document;
pub mod error;
pub mod retry;

pub use client::{Api, Client, Connection, HttpApi};
pub use document::{Collection, Meta, Pagination, Resource, Single};
pub use error::{Error, Result};
pub use retry::{RetryPolicy, with_retry};
