use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::binding_id::BindingId;
use crate::config::Settings;
use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindResult {
    Bound,
    Conflict,
}

/// What a bind does when the id already holds a valid binding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Keep the existing binding without reporting anything.
    Keep,
    /// Replace the existing binding.
    Overwrite,
    /// Keep the existing binding and log an error.
    #[default]
    LogError,
    /// Panic.
    AssertCheck,
    /// Hand the conflict to the installed [`ScriptExceptionHandler`].
    ScriptException,
}

/// What a lookup does when nothing is bound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveErrorPolicy {
    ReturnEmpty,
    LogWarning,
    #[default]
    LogError,
    AssertCheck,
    ScriptException,
}

/// Receives errors raised under the `ScriptException` policies, for hosts
/// that surface them as exceptions in a scripting layer.
pub trait ScriptExceptionHandler: Send + Sync {
    fn raise(&self, error: &Error);
}

impl<F: Fn(&Error) + Send + Sync> ScriptExceptionHandler for F {
    fn raise(&self, error: &Error) {
        self(error)
    }
}

fn raise_script_exception(error: Error, settings: &Settings) {
    match settings.script_exception_handler() {
        Some(handler) => handler.raise(&error),
        None => tracing::error!(%error, "no script exception handler installed"),
    }
}

pub(crate) fn handle_bind_conflict(id: &BindingId, policy: ConflictPolicy, settings: &Settings) {
    match policy {
        ConflictPolicy::Keep | ConflictPolicy::Overwrite => {}
        ConflictPolicy::LogError => tracing::error!(%id, "binding conflict, keeping the existing binding"),
        ConflictPolicy::AssertCheck => panic!("{}", Error::BindConflict(id.clone())),
        ConflictPolicy::ScriptException => raise_script_exception(Error::BindConflict(id.clone()), settings),
    }
}

/// Reports a wait that was canceled before its binding appeared. This runs
/// from drop paths, so `AssertCheck` logs instead of panicking.
pub(crate) fn handle_canceled_wait(id: &BindingId, policy: ResolveErrorPolicy, settings: &Settings) {
    match policy {
        ResolveErrorPolicy::AssertCheck => tracing::error!(%id, "wait canceled before the binding appeared"),
        policy => handle_resolve_error(id, policy, settings),
    }
}

pub(crate) fn handle_resolve_error(id: &BindingId, policy: ResolveErrorPolicy, settings: &Settings) {
    match policy {
        ResolveErrorPolicy::ReturnEmpty => {}
        ResolveErrorPolicy::LogWarning => tracing::warn!(%id, "failed to resolve binding"),
        ResolveErrorPolicy::LogError => tracing::error!(%id, "failed to resolve binding"),
        ResolveErrorPolicy::AssertCheck => panic!("{}", Error::Unresolved(id.clone())),
        ResolveErrorPolicy::ScriptException => raise_script_exception(Error::Unresolved(id.clone()), settings),
    }
}

impl ConflictPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keep => "keep",
            Self::Overwrite => "overwrite",
            Self::LogError => "log_error",
            Self::AssertCheck => "assert_check",
            Self::ScriptException => "script_exception",
        }
    }
}

impl ResolveErrorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReturnEmpty => "return_empty",
            Self::LogWarning => "log_warning",
            Self::LogError => "log_error",
            Self::AssertCheck => "assert_check",
            Self::ScriptException => "script_exception",
        }
    }
}

impl Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for ResolveErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictPolicy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        [Self::Keep, Self::Overwrite, Self::LogError, Self::AssertCheck, Self::ScriptException]
            .into_iter()
            .find(|policy| policy.as_str() == value)
            .ok_or_else(|| Error::InvalidSetting {
                key: "conflict_policy".into(),
                value: value.into(),
            })
    }
}

impl FromStr for ResolveErrorPolicy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        [
            Self::ReturnEmpty,
            Self::LogWarning,
            Self::LogError,
            Self::AssertCheck,
            Self::ScriptException,
        ]
        .into_iter()
        .find(|policy| policy.as_str() == value)
        .ok_or_else(|| Error::InvalidSetting {
            key: "resolve_error_policy".into(),
            value: value.into(),
        })
    }
}
