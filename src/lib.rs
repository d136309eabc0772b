pub mod common;
pub mod osdeps;
pub mod ui;
