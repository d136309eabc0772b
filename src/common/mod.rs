pub mod config;
pub mod distro;
pub mod paths;
