pub mod handlers;

// Re-export commonly used handler helpers for convenience
pub use handlers::{
    analysis_options, expand_config_path, init_settings, load_settings, parse_language_list,
    visit_policy, write_output,
};
