pub mod config_tests;
pub mod error_tests;
pub mod resolver_tests;
pub mod sandbox_tests;
