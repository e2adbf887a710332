/// Options accepted by the compile entry point.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Label used in diagnostics and the source map.
    pub source_name: Option<String>,
    /// Emit the wrapper open/close pair around component invocations.
    pub component_wrapper: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            source_name: None,
            component_wrapper: true,
        }
    }
}

impl CompileOptions {
    pub fn source_name(&self) -> &str {
        self.source_name.as_deref().unwrap_or("unknown.hbs")
    }
}
