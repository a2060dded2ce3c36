//! Hand-rolled error type for the builder's fallible entry points, in the
//! style of `state::ShaderCreationError` — the teacher crate never took a
//! dependency on `thiserror`, so this one doesn't either.

use std::error::Error;
use std::fmt;

/// Error taxonomy for a `build()` call (§7). A build either runs to
/// completion or surfaces one of these; there is no retry.
#[derive(Debug)]
pub enum BuildError {
    /// The memory resource failed to satisfy an allocation request.
    Allocation { requested_bytes: u64 },
    /// The underlying device reported an error (lost device, validation
    /// failure surfaced through `wgpu`, …).
    Device(String),
    /// Mapping a readback (staging) buffer for host access failed.
    BufferMap(String),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocation { requested_bytes } => {
                write!(f, "allocator failed to satisfy request for {requested_bytes} bytes")
            }
            Self::Device(msg) => write!(f, "device error: {msg}"),
            Self::BufferMap(msg) => write!(f, "failed to map readback buffer: {msg}"),
        }
    }
}

impl Error for BuildError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

pub type BuildResult<T> = Result<T, BuildError>;
