//! Host adapters for workset classification
//!
//! The classification engine never talks to a host application directly.
//! It goes through [`HostContext`], which covers element enumeration, name
//! and attribute reads, and attribute writes inside units of work.
//!
//! Two hosts are provided:
//! - [`MockHost`] - in-memory elements with fault injection, for tests
//! - [`SnapshotHost`] - a JSON model export on disk, for the CLI
//!
//! ## Example
//!
//! ```rust,ignore
//! use wsmap_host::{HostContext, SnapshotHost};
//!
//! let mut host = SnapshotHost::load(Path::new("model.json"))?;
//! let walls = host.enumerate(&[Category::new("Walls")])?;
//! ```

pub mod adapter;
pub mod point_cloud;
pub mod mock;
pub mod snapshot;

pub use adapter::{Attribute, AttributeValue, HostContext, HostError};
pub use point_cloud::{PointCloud, PointCloudMetadata, PointCloudSource, Transform};
pub use mock::{MockEntity, MockHost};
pub use snapshot::{Snapshot, SnapshotElement, SnapshotError, SnapshotHost};
