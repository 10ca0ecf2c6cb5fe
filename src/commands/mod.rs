pub mod registry;

pub use registry::{dispatch, Cli, Command};
