mod collision_detection;
pub mod error;
pub mod quadtree;
pub mod sequence;
pub mod set;

pub use common::shapes;
pub use common::Vec2;
pub use error::{QuadtreeError, QuadtreeResult};
pub use quadtree::{AddOutcome, Config, NodeInfo, PositionKey, QuadTree, QueryIter, UnitKey};
pub use set::QuadTreeSet;
