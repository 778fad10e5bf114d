use thiserror::Error;

/// Failures while building the menu tree. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("node name must not be empty (under '{parent}')")]
    EmptyName { parent: String },

    #[error("'{parent}' already has a child named '{name}'")]
    DuplicateChild { parent: String, name: String },

    #[error("'{parent}' has a child '{name}' that cannot be typed at the prompt")]
    UntypeableName { parent: String, name: String },

    #[error("command '{command}' is bound to unknown leaf '{leaf}'")]
    UnknownLeaf { command: String, leaf: String },

    #[error("the root node must be a menu, got command '{name}'")]
    RootNotMenu { name: String },

    #[error("malformed tree specification: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("{menu} has no child '{token}'")]
    NoSuchChild { menu: String, token: String },

    #[error("input contains non-alphabet inputs")]
    InvalidInput { input: String },

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("internal consistency violation: {0}")]
    ContractViolation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

impl ShellError {
    /// User input errors are shown once and the session carries on.
    /// Everything else ends the session.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ShellError::NoSuchChild { .. } | ShellError::InvalidInput { .. }
        )
    }

    pub fn violation(message: impl Into<String>) -> Self {
        ShellError::ContractViolation(message.into())
    }
}
