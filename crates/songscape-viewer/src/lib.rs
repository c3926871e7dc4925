//! Desktop viewer for songscape.
//!
//! Renders the tier's point cloud with wgpu, drives a
//! [`songscape::MapSession`] from winit input and overlays an egui HUD.
//! Proximity queries and cover images are served by background workers.

pub mod app;
pub mod assets;
pub mod config;
pub mod data;
pub mod error;
pub mod net;
pub mod renderer;
pub mod ui;
