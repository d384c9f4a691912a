pub mod shapes;

pub use glam::Vec2;
