//! One module per `keyseal` subcommand.

pub mod add;
pub mod completions;
pub mod delete;
pub mod generate;
pub mod get;
pub mod keygen;
pub mod list;
pub mod login;
pub mod passwd;
pub mod receive;
pub mod register;
pub mod send;
pub mod update;
