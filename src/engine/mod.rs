pub mod camera;
pub mod controls;
pub mod label;
pub mod mesh;
pub mod renderer;
pub mod scene;
