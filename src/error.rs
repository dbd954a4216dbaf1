//! Skein Error Types with Error Codes
//!
//! Error code ranges:
//! - SKEIN-020-029: Graph errors (cycles, missing bindings)
//! - SKEIN-030-039: Execution errors (provider failures, panics, aggregates)
//! - SKEIN-040-049: Typed-boundary errors
//!
//! Errors are `Clone`: a failed key evaluation is cached as a shared future,
//! so every branch awaiting that key receives the same error value. Causes
//! live behind `Arc` to keep cloning cheap.

use std::sync::Arc;

use thiserror::Error;

use crate::key::BindingKey;

pub type Result<T> = std::result::Result<T, SkeinError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

fn format_keys(keys: &[BindingKey]) -> String {
    keys.iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn format_requested_via(keys: &[BindingKey]) -> String {
    if keys.is_empty() {
        String::new()
    } else {
        format!(" (requested via {})", format_keys(keys))
    }
}

/// All error variants are part of the public API.
#[derive(Error, Debug, Clone)]
pub enum SkeinError {
    // ═══════════════════════════════════════════
    // GRAPH ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[SKEIN-020] Cyclic dependency: {}", format_keys(.cycle))]
    CycleDetected { cycle: Vec<BindingKey> },

    #[error("[SKEIN-021] No binding for key '{key}'{}", format_requested_via(.requested_by))]
    MissingBinding {
        key: BindingKey,
        /// Chain of keys that led to requesting `key`, innermost first
        requested_by: Vec<BindingKey>,
    },

    // ═══════════════════════════════════════════
    // EXECUTION ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[SKEIN-030] Provider for '{key}' failed: {cause}{}", format_requested_via(.context))]
    ProviderFailed {
        key: BindingKey,
        /// Keys whose evaluation was awaiting this one, innermost first
        context: Vec<BindingKey>,
        cause: Arc<anyhow::Error>,
    },

    #[error("[SKEIN-031] Provider task for '{key}' panicked: {message}")]
    ProviderPanicked { key: BindingKey, message: String },

    #[error("[SKEIN-032] {} concurrent branches failed; primary: {primary}", .secondary.len() + 1)]
    AggregateFailure {
        primary: Box<SkeinError>,
        secondary: Vec<SkeinError>,
    },

    // ═══════════════════════════════════════════
    // TYPED-BOUNDARY ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[SKEIN-040] Type mismatch at {context}: expected {expected}")]
    TypeMismatch {
        expected: &'static str,
        context: String,
    },
}

impl SkeinError {
    /// Get the error code (e.g., "SKEIN-020")
    pub fn code(&self) -> &'static str {
        match self {
            Self::CycleDetected { .. } => "SKEIN-020",
            Self::MissingBinding { .. } => "SKEIN-021",
            Self::ProviderFailed { .. } => "SKEIN-030",
            Self::ProviderPanicked { .. } => "SKEIN-031",
            Self::AggregateFailure { .. } => "SKEIN-032",
            Self::TypeMismatch { .. } => "SKEIN-040",
        }
    }

    /// Downcast failure at a typed boundary
    pub(crate) fn type_mismatch<T>(context: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: std::any::type_name::<T>(),
            context: context.into(),
        }
    }

    /// Extend the evaluation-context chain as the failure propagates upward
    ///
    /// Called once per dependent key while unwinding, so the chain reads
    /// innermost first. Variants without a chain pass through unchanged.
    pub(crate) fn push_context(self, key: BindingKey) -> Self {
        match self {
            Self::MissingBinding {
                key: missing,
                mut requested_by,
            } => {
                requested_by.push(key);
                Self::MissingBinding {
                    key: missing,
                    requested_by,
                }
            }
            Self::ProviderFailed {
                key: failed,
                mut context,
                cause,
            } => {
                context.push(key);
                Self::ProviderFailed {
                    key: failed,
                    context,
                    cause,
                }
            }
            Self::AggregateFailure { primary, secondary } => Self::AggregateFailure {
                primary: Box::new(primary.push_context(key)),
                secondary,
            },
            other => other,
        }
    }

    /// Evaluation-context chain for this failure, innermost first
    ///
    /// Empty for variants that carry no chain.
    pub fn context(&self) -> &[BindingKey] {
        match self {
            Self::MissingBinding { requested_by, .. } => requested_by,
            Self::ProviderFailed { context, .. } => context,
            Self::AggregateFailure { primary, .. } => primary.context(),
            _ => &[],
        }
    }

    /// The single primary failure, unwrapping aggregates
    pub fn primary(&self) -> &SkeinError {
        match self {
            Self::AggregateFailure { primary, .. } => primary.primary(),
            other => other,
        }
    }
}

impl FixSuggestion for SkeinError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            SkeinError::CycleDetected { .. } => {
                Some("Break the cycle: one of these providers must not depend on the others")
            }
            SkeinError::MissingBinding { .. } => {
                Some("Bind the key with bind_instance/bind_provider, or compose in a design that does")
            }
            SkeinError::ProviderFailed { .. } => {
                Some("Inspect the cause; the provider function returned an error")
            }
            SkeinError::ProviderPanicked { .. } => {
                Some("Provider functions should return Err instead of panicking")
            }
            SkeinError::AggregateFailure { .. } => {
                Some("Fix the primary failure first; secondary failures may be consequences")
            }
            SkeinError::TypeMismatch { .. } => {
                Some("Check the bound value's type matches the type requested at resolution")
            }
        }
    }
}
