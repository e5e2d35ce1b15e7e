//! Evaluators for computed snippet content.
//!
//! - shell code (`` `date` ``) runs once, when the snippet is expanded
//! - host expressions (`` `!v expr` ``) go through [`crate::host::Host::eval`]
//! - script code (`` `!p ...` ``) goes to an installed [`ScriptEngine`]

mod script;
mod shell;

pub use script::{ScriptEngine, ScriptRequest, SnippetUtil};
pub use shell::{DEFAULT_SHELL_TIMEOUT, ShellRunner, SystemShell};

/// The evaluators an instance uses for its computed children.
pub struct Evaluators {
    pub shell: Box<dyn ShellRunner>,
    pub script: Option<Box<dyn ScriptEngine>>,
}

impl Evaluators {
    pub fn new(shell: impl ShellRunner + 'static) -> Self {
        Self {
            shell: Box::new(shell),
            script: None,
        }
    }

    #[must_use]
    pub fn with_script(mut self, engine: impl ScriptEngine + 'static) -> Self {
        self.script = Some(Box::new(engine));
        self
    }
}

impl Default for Evaluators {
    fn default() -> Self {
        Self::new(SystemShell::default())
    }
}

impl std::fmt::Debug for Evaluators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluators")
            .field("script", &self.script.is_some())
            .finish_non_exhaustive()
    }
}
