//! Platform-facing types. Nothing here talks to a real OS; bindings implement
//! [`window::WindowHost`] and feed monitor information in.

pub mod geometry;
pub mod screen;
pub mod virtual_host;
pub mod window;
