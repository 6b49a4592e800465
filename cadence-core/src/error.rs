use std::{any::Any, fmt::Display};

use crate::phase::{HostRole, Phase};

/// 构造停顿器时的前置条件错误。
#[derive(Clone, Debug, PartialEq)]
pub enum StallerError {
    UnsupportedPhase { phase: Phase, role: HostRole },
}

impl Display for StallerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StallerError::UnsupportedPhase { phase, role } => {
                write!(f, "Phase '{}' is not available in the {} role", phase, role)
            }
        }
    }
}

impl std::error::Error for StallerError {}

/// 推进协程时产生的错误。
#[derive(Clone, Debug)]
pub enum CoroutineError {
    Staller(StallerError),
    Failed(String),
    Panicked(String),
}

impl CoroutineError {
    pub fn failed(message: impl Into<String>) -> Self {
        CoroutineError::Failed(message.into())
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "<non-string panic payload>".to_string()
        };
        CoroutineError::Panicked(message)
    }
}

impl Display for CoroutineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoroutineError::Staller(err) => write!(f, "Staller Error: {}", err),
            CoroutineError::Failed(msg) => write!(f, "Coroutine Failed: {}", msg),
            CoroutineError::Panicked(msg) => write!(f, "Coroutine Panicked: {}", msg),
        }
    }
}

impl std::error::Error for CoroutineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CoroutineError::Staller(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StallerError> for CoroutineError {
    fn from(err: StallerError) -> Self {
        CoroutineError::Staller(err)
    }
}
