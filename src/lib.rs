// Library exports for the job-tracker crate
// This allows tests and the binary to use the modules

pub mod artifacts;
pub mod classifier;
pub mod company;
pub mod config;
pub mod email;
pub mod error;
pub mod gmail_client;
pub mod pipeline;
pub mod slack_notifier;

pub use pipeline::Pipeline;
