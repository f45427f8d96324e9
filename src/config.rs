use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::error::Error;
use crate::policy::{ConflictPolicy, ResolveErrorPolicy, ScriptExceptionHandler};

pub const CONFLICT_POLICY_ENV: &str = "PROMISE_DI_CONFLICT_POLICY";
pub const RESOLVE_ERROR_POLICY_ENV: &str = "PROMISE_DI_RESOLVE_ERROR_POLICY";

/// Defaults a container applies when a bind or lookup names no policy.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub conflict_policy: ConflictPolicy,
    pub resolve_error_policy: ResolveErrorPolicy,
    #[serde(skip)]
    script_exception_handler: Option<Arc<dyn ScriptExceptionHandler>>,
}

impl Settings {
    /// Reads the policies from the process environment. Unset variables keep
    /// their defaults.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut settings = Self::default();
        if let Some(value) = lookup(CONFLICT_POLICY_ENV) {
            settings.conflict_policy = value.trim().parse()?;
        }
        if let Some(value) = lookup(RESOLVE_ERROR_POLICY_ENV) {
            settings.resolve_error_policy = value.trim().parse()?;
        }
        Ok(settings)
    }

    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    pub fn with_resolve_error_policy(mut self, policy: ResolveErrorPolicy) -> Self {
        self.resolve_error_policy = policy;
        self
    }

    pub fn with_script_exception_handler(mut self, handler: impl ScriptExceptionHandler + 'static) -> Self {
        self.script_exception_handler = Some(Arc::new(handler));
        self
    }

    pub fn script_exception_handler(&self) -> Option<&Arc<dyn ScriptExceptionHandler>> {
        self.script_exception_handler.as_ref()
    }
}

impl Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("conflict_policy", &self.conflict_policy)
            .field("resolve_error_policy", &self.resolve_error_policy)
            .field("script_exception_handler", &self.script_exception_handler.is_some())
            .finish()
    }
}
