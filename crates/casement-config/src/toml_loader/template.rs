//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> &'static str {
    r#"# Casement Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[store]
# backend = "file"         # file | memory
# path = ""                # empty: platform data dir + casement/store
# channel_capacity = 256   # 1-65536

[sync]
# frame_rate = 60          # 1-240 shape polls per second

[logging]
# level = "info"           # trace | debug | info | warn | error
"#
}
