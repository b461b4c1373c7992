pub mod bridge;
pub mod scene;
