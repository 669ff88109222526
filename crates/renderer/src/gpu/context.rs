use std::fmt;

use thiserror::Error;

/// Capability tier of an acquired context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextTier {
    /// OpenGL ES 3.0 class: GLSL `300 es`, `in`/`out` qualifiers.
    Modern,
    /// OpenGL ES 2.0 or desktop 2.1 class.
    Legacy,
}

/// GLSL dialect the fixed vertex stage is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderDialect {
    Es300,
    Es100,
    Gl120,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFamily {
    Gles,
    Desktop,
}

/// One entry of the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextRequest {
    pub tier: ContextTier,
    /// Name logged when this request succeeds.
    pub name: &'static str,
    pub family: ApiFamily,
    pub major: u8,
    pub minor: u8,
    pub dialect: ShaderDialect,
}

/// Requests tried in order: the modern tier, then the legacy tier under its
/// primary name, then its alias.
pub const CONTEXT_FALLBACK_CHAIN: [ContextRequest; 3] = [
    ContextRequest {
        tier: ContextTier::Modern,
        name: "gles3",
        family: ApiFamily::Gles,
        major: 3,
        minor: 0,
        dialect: ShaderDialect::Es300,
    },
    ContextRequest {
        tier: ContextTier::Legacy,
        name: "gles2",
        family: ApiFamily::Gles,
        major: 2,
        minor: 0,
        dialect: ShaderDialect::Es100,
    },
    ContextRequest {
        tier: ContextTier::Legacy,
        name: "gl2.1-compat",
        family: ApiFamily::Desktop,
        major: 2,
        minor: 1,
        dialect: ShaderDialect::Gl120,
    },
];

/// Something a drawing context can be created on.
pub trait ContextSurface {
    type Context;
    type Error: fmt::Display;

    fn try_create(&mut self, request: &ContextRequest) -> Result<Self::Context, Self::Error>;
}

/// A created context and the request that produced it.
#[derive(Debug)]
pub struct AcquiredContext<C> {
    pub context: C,
    pub request: ContextRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAttempt {
    pub name: &'static str,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum ContextAcquisitionError {
    #[error("no graphics context available (tried {})", describe_attempts(.attempts))]
    Unavailable { attempts: Vec<FailedAttempt> },
}

fn describe_attempts(attempts: &[FailedAttempt]) -> String {
    attempts
        .iter()
        .map(|attempt| format!("{}: {}", attempt.name, attempt.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Walks [`CONTEXT_FALLBACK_CHAIN`] until `surface` yields a context.
pub fn acquire_context<S: ContextSurface>(
    surface: &mut S,
) -> Result<AcquiredContext<S::Context>, ContextAcquisitionError> {
    let mut attempts = Vec::new();
    for request in CONTEXT_FALLBACK_CHAIN {
        match surface.try_create(&request) {
            Ok(context) => {
                tracing::info!(
                    tier = ?request.tier,
                    api = request.name,
                    "acquired graphics context"
                );
                return Ok(AcquiredContext { context, request });
            }
            Err(err) => {
                tracing::warn!(api = request.name, error = %err, "graphics context unavailable");
                attempts.push(FailedAttempt {
                    name: request.name,
                    reason: err.to_string(),
                });
            }
        }
    }
    Err(ContextAcquisitionError::Unavailable { attempts })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedSurface {
        supported: Vec<&'static str>,
        tried: Vec<&'static str>,
    }

    impl ContextSurface for ScriptedSurface {
        type Context = &'static str;
        type Error = String;

        fn try_create(&mut self, request: &ContextRequest) -> Result<Self::Context, String> {
            self.tried.push(request.name);
            if self.supported.contains(&request.name) {
                Ok(request.name)
            } else {
                Err(format!("{} unsupported", request.name))
            }
        }
    }

    fn surface(supported: &[&'static str]) -> ScriptedSurface {
        ScriptedSurface {
            supported: supported.to_vec(),
            tried: Vec::new(),
        }
    }

    #[test]
    fn prefers_modern_tier() {
        let mut surface = surface(&["gles3", "gles2"]);
        let acquired = acquire_context(&mut surface).expect("context");
        assert_eq!(acquired.request.tier, ContextTier::Modern);
        assert_eq!(acquired.request.dialect, ShaderDialect::Es300);
        assert_eq!(surface.tried, vec!["gles3"]);
    }

    #[test]
    fn falls_back_to_legacy_alias() {
        let mut surface = surface(&["gl2.1-compat"]);
        let acquired = acquire_context(&mut surface).expect("context");
        assert_eq!(acquired.context, "gl2.1-compat");
        assert_eq!(acquired.request.tier, ContextTier::Legacy);
        assert_eq!(surface.tried, vec!["gles3", "gles2", "gl2.1-compat"]);
    }

    #[test]
    fn reports_every_failed_attempt() {
        let mut surface = surface(&[]);
        let err = acquire_context(&mut surface).expect_err("no context");
        let ContextAcquisitionError::Unavailable { attempts } = &err;
        assert_eq!(attempts.len(), 3);
        let message = err.to_string();
        assert!(message.contains("gles3: gles3 unsupported"));
        assert!(message.contains("gl2.1-compat"));
    }
}
