pub mod algorithms;
pub mod envelope;
pub mod geometry;
pub mod node;
#[allow(clippy::module_inception)]
pub mod strtree;

// 重新导出主要类型
pub use algorithms::distance::{CenterDistance, EnvelopeDistance, ItemBoundable, ItemDistance};
pub use algorithms::utils::geometry_to_envelope;
pub use envelope::{Envelope, Envelope2D, Envelope3D, ParseEnvelopeError};
pub use geometry::{geometry_distance, GeoItem, GeometryDistance};
pub use node::{ItemId, Node, NodeId};
pub use strtree::{IndexError, STRtree, STRtree2D, STRtree3D, DEFAULT_NODE_CAPACITY};
