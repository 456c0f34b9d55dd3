//! Caching strategies and annotation values.

use std::fmt;

use crate::Name;

/// The caching behavior requested for a generated method.
///
/// Attached to a method via direct annotation, or inherited from the
/// innermost annotated enclosing scope when the method itself is abstract
/// and unannotated. Defaults to `Disabled`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum CachingStrategy {
    /// No state; every call re-evaluates the underlying expression.
    #[default]
    Disabled,
    /// A single field, lazily assigned without synchronization.
    NotThreadSafe,
    /// A volatile field with double-checked locking on the instance monitor.
    ThreadSafe,
    /// One thread-local cell per method, no cross-thread sharing.
    ThreadLocal,
}

impl CachingStrategy {
    /// The annotation constant name, as written in the source model.
    pub fn as_str(self) -> &'static str {
        match self {
            CachingStrategy::Disabled => "DISABLED",
            CachingStrategy::NotThreadSafe => "NOT_THREAD_SAFE",
            CachingStrategy::ThreadSafe => "THREAD_SAFE",
            CachingStrategy::ThreadLocal => "THREAD_LOCAL",
        }
    }

    /// Parse an annotation constant name.
    pub fn parse(s: &str) -> Option<CachingStrategy> {
        match s {
            "DISABLED" => Some(CachingStrategy::Disabled),
            "NOT_THREAD_SAFE" => Some(CachingStrategy::NotThreadSafe),
            "THREAD_SAFE" => Some(CachingStrategy::ThreadSafe),
            "THREAD_LOCAL" => Some(CachingStrategy::ThreadLocal),
            _ => None,
        }
    }
}

impl fmt::Display for CachingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A caching-strategy annotation value as found in the model.
///
/// Unrecognized constant names are preserved so the resolver can report
/// them and fall back to `Disabled` instead of silently miscompiling.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum StrategyValue {
    Known(CachingStrategy),
    Unknown(Name),
}

impl StrategyValue {
    /// The strategy if the value is recognized.
    pub fn known(self) -> Option<CachingStrategy> {
        match self {
            StrategyValue::Known(s) => Some(s),
            StrategyValue::Unknown(_) => None,
        }
    }
}

/// A caching annotation: strategy value plus nullable-value handling.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct CacheAnnotation {
    pub value: StrategyValue,
    /// Whether the cached value may legitimately be null. Nullable caches
    /// wrap the value in a supplier so "computed null" is distinguishable
    /// from "not yet computed".
    pub nullable: bool,
}

impl CacheAnnotation {
    pub fn known(strategy: CachingStrategy) -> Self {
        CacheAnnotation {
            value: StrategyValue::Known(strategy),
            nullable: false,
        }
    }

    pub fn known_nullable(strategy: CachingStrategy) -> Self {
        CacheAnnotation {
            value: StrategyValue::Known(strategy),
            nullable: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for s in [
            CachingStrategy::Disabled,
            CachingStrategy::NotThreadSafe,
            CachingStrategy::ThreadSafe,
            CachingStrategy::ThreadLocal,
        ] {
            assert_eq!(CachingStrategy::parse(s.as_str()), Some(s));
        }
        assert_eq!(CachingStrategy::parse("EVENTUALLY_CONSISTENT"), None);
    }
}
