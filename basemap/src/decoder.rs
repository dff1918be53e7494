//! Vector tile decoder configuration.

use std::collections::BTreeMap;

use crate::style::StyleSet;

/// Configuration handle for a vector tile decoder.
///
/// The style rule set and the selected substyle are fixed at construction;
/// any change of style requires building a new decoder. String parameters
/// (`lang`, `buildings3d`, ...) can be set until the decoder is installed
/// into a layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorTileDecoder {
    style: StyleSet,
    substyle: Option<String>,
    parameters: BTreeMap<String, String>,
}

impl VectorTileDecoder {
    /// Creates a decoder for the given style set, using the named substyle or
    /// the package default if `substyle` is `None`.
    pub fn new(style: StyleSet, substyle: Option<String>) -> Self {
        Self {
            style,
            substyle,
            parameters: BTreeMap::new(),
        }
    }

    /// Sets a string style parameter.
    pub fn set_parameter(&mut self, key: &str, value: &str) {
        self.parameters.insert(key.to_string(), value.to_string());
    }

    /// Returns the value of a style parameter, if set.
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// The style rule set this decoder was built with.
    pub fn style(&self) -> &StyleSet {
        &self.style
    }

    /// The selected substyle, or `None` for the package default.
    pub fn substyle(&self) -> Option<&str> {
        self.substyle.as_deref()
    }
}
