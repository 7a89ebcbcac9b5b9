//! # rpctl-services
//!
//! Resource services for rpctl and the two helpers that shape how they
//! run: [`parallel_map`] for bounded-concurrency bulk operations and
//! [`poll_until`] for waiting on a resource to change state.
//!
//! Services are thin: each owns an `Arc` of the client it needs, adds
//! input validation and filtering, and leaves retries to the client.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod capacity;
pub mod endpoint;
pub mod parallel;
pub mod pod;
pub mod poll;
pub mod registry;
pub mod template;
pub mod user;
pub mod volume;

pub use capacity::{CapacityService, CloudFilter, GpuQuery, GpuSort};
pub use endpoint::EndpointService;
pub use parallel::{
    effective_workers, parallel_map, sequential_map, BatchOptions, BatchResult, DEFAULT_WORKERS,
    MAX_WORKERS_CAP,
};
pub use pod::{BulkAction, PodService};
pub use poll::{poll_until, PollOptions, PollState, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT};
pub use registry::RegistryService;
pub use template::TemplateService;
pub use user::UserService;
pub use volume::VolumeService;
