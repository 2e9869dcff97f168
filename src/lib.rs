// Main library entry point for Mr. Magpie.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;
pub mod common;
