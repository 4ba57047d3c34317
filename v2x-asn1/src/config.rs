//! Text encoder options
//!
//! Option structs deserialize from any serde format; every field has a
//! default, so a partial document is enough:
//!
//! ```json
//! { "xer": { "empty_tags": false } }
//! ```

use serde::{Deserialize, Serialize};

/// GSER output options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GserOptions {
    /// Newline and two spaces per nesting level inside `{ }`
    pub indent: bool,
    /// Render bit strings whose length is a multiple of 4 as `'...'H`
    pub hex_bit_strings: bool,
}

impl Default for GserOptions {
    fn default() -> Self {
        Self {
            indent: true,
            hex_bit_strings: false,
        }
    }
}

/// XER output options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XerOptions {
    /// Newline and indentation before nested elements
    pub indent: bool,
    /// `<name/>` for elements without content instead of `<name></name>`
    pub empty_tags: bool,
    /// Booleans and enumerated values as text content instead of empty elements
    pub content_values: bool,
}

impl Default for XerOptions {
    fn default() -> Self {
        Self {
            indent: true,
            empty_tags: true,
            content_values: false,
        }
    }
}

/// Codec configuration section of the embedding application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub gser: GserOptions,
    pub xer: XerOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::default();
        assert!(config.gser.indent);
        assert!(!config.gser.hex_bit_strings);
        assert!(config.xer.indent);
        assert!(config.xer.empty_tags);
        assert!(!config.xer.content_values);
    }

    #[test]
    fn test_partial_json() {
        let config: CodecConfig =
            serde_json::from_str(r#"{ "xer": { "empty_tags": false } }"#).unwrap();
        assert!(!config.xer.empty_tags);
        assert!(config.xer.indent);
        assert_eq!(config.gser, GserOptions::default());

        let config: CodecConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CodecConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = CodecConfig {
            gser: GserOptions {
                indent: false,
                hex_bit_strings: true,
            },
            xer: XerOptions::default(),
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: CodecConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
