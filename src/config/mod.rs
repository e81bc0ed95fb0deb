//! Configuration for pipeline runs, read from `jarloom.toml`.
//!
//! The file is located by an explicit path or by searching the current
//! directory and its ancestors. Relative paths inside it resolve against
//! the directory that holds it.

mod core;
mod loader;

pub use self::core::{
    AccessTransformerSetting, InputsConfig, JarloomConfig, PipelineSettings, RemapConfig,
    ToolConfig, ToolsConfig,
};
pub use loader::{
    directory_ancestors, find_config, load_config, load_config_from_path,
    parse_and_validate_config, CONFIG_FILE_NAME,
};
