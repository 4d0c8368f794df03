//! A random-access binary container: typed POD arrays stored under named
//! hierarchical paths in a single file, in the spirit of a one-file
//! virtual filesystem.
//!
//! The format is versioned and compressed, deduplicates identical
//! payloads by content hash, reclaims superseded byte ranges through a
//! free-space allocator, and supports many lock-minimal reader sessions
//! concurrently with one writer session. Finalized subtrees can be
//! committed to separately compressed subindex blocks to keep the
//! resident index small.
//!
//! ```rust
//! let dir = tempfile::tempdir()?;
//! let path = dir.path().join("scene.pod");
//!
//! let container = podarc::Container::create(&path)?;
//! let geometry = container.root().create_subdirectory("geometry")?;
//! geometry.write("points", &[[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0]])?;
//! container.flush()?;
//!
//! let readback = podarc::Container::open(&path)?;
//! let points: Vec<[f32; 3]> = readback
//!     .root()
//!     .subdirectory("geometry", podarc::MissingBehavior::Error)?
//!     .expect("created above")
//!     .read("points")?;
//! assert_eq!(points, [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod alloc;
mod container;
mod digests;
mod errors;
mod index;
mod nodes;
mod stream;
mod string_cache;
mod types;
mod wire;

pub use container::{Container, EntryDescriptor, EntryKind, Location};
// Half-precision floats are part of the element type surface.
pub use half::f16;
pub use digests::{ContentDigest, DIGEST_LEN};
pub use errors::{Error, FormatError};
pub use index::{MissingBehavior, FORMAT_VERSION};
pub use stream::DISABLE_PREAD_ENV;
pub use string_cache::{StringCache, StringId};
pub use types::{DataType, Element, Interned, Scalar};
