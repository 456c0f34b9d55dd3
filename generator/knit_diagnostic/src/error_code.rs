use std::fmt;

/// Error codes for all generator diagnostics.
///
/// Format: E#### where the first digit indicates the phase:
/// - E1xxx: structural/classification errors
/// - E2xxx: resolution and typing errors
/// - E9xxx: driver errors
/// - W2xxx: resolution warnings
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Structural / classification (E1xxx)
    /// A module must be an interface
    E1001,
    /// A nested module must be package-local
    E1002,
    /// Two members clash: neither overrides the other
    E1003,
    /// Cannot cache a void return value
    E1004,

    // Resolution / typing (E2xxx)
    /// Unknown caching strategy
    E2001,
    /// Make type is not a subtype of the declared return type
    E2002,
    /// Incompatible type parameters
    E2003,

    // Driver (E9xxx)
    /// Failed to generate code for a module type
    E9001,

    // Warnings (W2xxx)
    /// Module is missing a dependency (reported on the module type)
    W2101,
    /// Module is missing a dependency (reported on the accessor method)
    W2102,
}

impl ErrorCode {
    /// Get the code as a string (e.g., "E1003").
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E9001 => "E9001",
            ErrorCode::W2101 => "W2101",
            ErrorCode::W2102 => "W2102",
        }
    }

    /// Check if this is a warning code (Wxxxx range).
    pub fn is_warning(self) -> bool {
        self.as_str().starts_with('W')
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E1003.to_string(), "E1003");
        assert!(ErrorCode::W2101.is_warning());
        assert!(!ErrorCode::E9001.is_warning());
    }
}
