//! # CLI Module
//!
//! Command-line entry points for the `crudhook` binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Load `config.yml` and every schema under the resources directory of a service
//! root, then serve the generated endpoints until SIGINT or SIGTERM:
//!
//! ```bash
//! crudhook serve --root ./demos
//! crudhook serve --root ./demos --addr 127.0.0.1:3000
//! ```
//!
//! ### `routes`
//!
//! Print the wired route table without starting a server:
//!
//! ```bash
//! crudhook routes --root ./demos
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run_cli, serve, Cli, Commands};
