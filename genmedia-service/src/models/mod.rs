pub mod artifact;

pub use artifact::{Artifact, FinishReason, MediaKind};
