//! Configuration module for tabula.
//!
//! Handles engine selection and backend settings loaded from TOML.

mod settings;

pub use settings::{
    expand_env_vars, EmbeddedSettings, EngineKind, EngineSettings, Settings, SettingsError,
    WarehouseSettings,
};
