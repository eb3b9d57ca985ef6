//! Checker configuration

/// Options for one semantic-analysis run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConfig {
    /// Run the ownership analyzer's end-of-module report
    pub check_mem: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self { check_mem: true }
    }
}
