//! Argument vector construction for subcommand adapters.

/// Builds a Mercurial argument vector with stable ordering: subcommand
/// first, then flags (boolean switches as one token, key/value flags as
/// two), then positional arguments last.
#[derive(Debug, Clone)]
pub(crate) struct ArgBuilder {
    args: Vec<String>,
}

impl ArgBuilder {
    /// Start a vector for the given subcommand.
    pub fn new(subcommand: &str) -> Self {
        Self {
            args: vec![subcommand.to_string()],
        }
    }

    /// Append a boolean switch when `enabled`.
    pub fn flag(mut self, enabled: bool, name: &str) -> Self {
        if enabled {
            self.args.push(name.to_string());
        }
        self
    }

    /// Append a key/value flag pair when the value is present and
    /// non-empty.
    pub fn opt(mut self, name: &str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            if !value.is_empty() {
                self.args.push(name.to_string());
                self.args.push(value.to_string());
            }
        }
        self
    }

    /// Append a repeated key/value flag, once per value.
    pub fn many<S: AsRef<str>>(mut self, name: &str, values: &[S]) -> Self {
        for value in values {
            self.args.push(name.to_string());
            self.args.push(value.as_ref().to_string());
        }
        self
    }

    /// Append positional arguments. Call last.
    pub fn positional<S: AsRef<str>>(mut self, values: &[S]) -> Self {
        self.args
            .extend(values.iter().map(|v| v.as_ref().to_string()));
        self
    }

    /// Finish and return the argument vector.
    pub fn finish(self) -> Vec<String> {
        self.args
    }
}
