//! Wire models for the RunPod REST and GraphQL APIs.

pub mod endpoint;
pub mod gpu;
pub mod pod;
pub mod registry;
pub mod template;
pub mod user;
pub mod volume;

pub use endpoint::{
    Endpoint, EndpointCreateParams, EndpointHealth, EndpointUpdateParams, Job, JobCounts,
    PurgeResult, WorkerCounts,
};
pub use gpu::{CpuType, Datacenter, DatacenterGpu, GpuStock, GpuType};
pub use pod::{parse_env, parse_ports, CloudType, ComputeType, Pod, PodCreateParams, PodGpu, PodRuntime};
pub use registry::{RegistryAuth, RegistryAuthParams};
pub use template::{Template, TemplateParams};
pub use user::User;
pub use volume::{Volume, VolumeCreateParams, VolumeUpdateParams};
