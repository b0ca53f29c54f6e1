//! Project configuration (`.keyseal.toml` plus `KEYSEAL_*` overrides).

pub mod settings;

pub use settings::Settings;
