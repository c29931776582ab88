//! Repository discovery, head-reference resolution, and diff extraction.

pub mod diff;
pub mod head;
pub mod locator;

pub use diff::{DiffExtractor, DiffOutcome, DiffPayload, ExtractError};
pub use head::HeadTarget;
pub use locator::{RepositoryHandle, RepositoryLocator, ResolveError};
