//! Test modules for switchboard-http crate

pub mod handler_tests;
