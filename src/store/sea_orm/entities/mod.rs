//! SeaORM entity definitions for the three logical tables (SPEC_FULL.md §3).

pub mod api_key;
pub mod instance;
pub mod model_config;
