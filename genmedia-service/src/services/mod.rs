pub mod artifact_store;
pub mod blob;
pub mod generation;
pub mod limiter;
pub mod metrics;
pub mod providers;
pub mod secrets;

pub use artifact_store::{ArtifactStore, KeySeed, StoreError};
pub use generation::GenerationService;
pub use limiter::GenerationLimiter;
pub use metrics::{get_metrics, init_metrics};
pub use secrets::{EnvSecretProvider, SecretProvider, StaticSecretProvider};
