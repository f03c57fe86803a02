//! Command-line interface.

mod check_server;
mod commands;
mod evaluate;
mod validate;

pub use check_server::handle_check_server_command;
pub use commands::{Cli, Commands};
pub use evaluate::handle_evaluate_command;
pub use validate::handle_validate_command;
