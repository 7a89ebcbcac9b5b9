//! # rpctl-api
//!
//! Clients for the RunPod APIs used by rpctl.
//!
//! - [`RestClient`] manages pods, serverless endpoints, templates,
//!   network volumes and registry credentials, and talks to the
//!   serverless runtime for jobs.
//! - [`GraphQLClient`] answers capacity, availability and account
//!   queries.
//!
//! Both take the API key explicitly and route every request through
//! [`rpctl_retries::with_retry`], so transient failures are retried and
//! everything else surfaces as an [`RpctlError`] with a stable exit code.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod graphql;
pub mod models;
pub mod queries;
pub mod rest;

pub use graphql::{GraphQLClient, DEFAULT_API_TIMEOUT, GRAPHQL_URL};
pub use rest::{RestClient, REST_BASE_URL, RUN_SYNC_TIMEOUT, SERVERLESS_BASE_URL};
pub use rpctl_retries::{RetryPolicy, RpctlError, RpctlResult};
