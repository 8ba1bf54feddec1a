//! Macro for implementing Display and FromStr for SQL keyword enums
//!
//! Keywords render in upper case and parse case-insensitively.
//!
//! # Example
//!
//! ```rust
//! use datacache_domain::impl_sql_keyword_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Affinity {
//!     Numeric,
//!     Text,
//! }
//!
//! impl_sql_keyword_conversions!(Affinity {
//!     Numeric => "NUMERIC",
//!     Text => "TEXT",
//! });
//!
//! assert_eq!(Affinity::Numeric.to_string(), "NUMERIC");
//! assert_eq!("text".parse::<Affinity>().unwrap(), Affinity::Text);
//! ```

/// Implements Display and FromStr for enums that map to SQL keywords
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Variant to upper-case keyword mapping
#[macro_export]
macro_rules! impl_sql_keyword_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestKeyword {
        Integer,
        Text,
    }

    impl_sql_keyword_conversions!(TestKeyword {
        Integer => "INTEGER",
        Text => "TEXT",
    });

    #[test]
    fn test_display_is_upper_case() {
        assert_eq!(TestKeyword::Integer.to_string(), "INTEGER");
        assert_eq!(TestKeyword::Text.to_string(), "TEXT");
    }

    #[test]
    fn test_fromstr_ignores_case_and_whitespace() {
        assert_eq!(TestKeyword::from_str("integer").unwrap(), TestKeyword::Integer);
        assert_eq!(TestKeyword::from_str(" Text ").unwrap(), TestKeyword::Text);
    }

    #[test]
    fn test_fromstr_invalid() {
        let result = TestKeyword::from_str("VARCHAR(10)");
        assert!(result.unwrap_err().contains("Invalid TestKeyword: VARCHAR(10)"));
        assert!(TestKeyword::from_str("").is_err());
    }
}
