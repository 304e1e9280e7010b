//! Library-boundary error types. Internal diagnostics (lex/parse/semantic/
//! runtime) stay plain `Diagnostic` structs; `thiserror` is reserved for
//! the few fallible calls a driver makes directly against the public
//! interpreter API.

use thiserror::Error;

/// Failure modes of [`crate::Interpreter::inject`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InjectError {
    #[error("no fruiting body named '{0}' exists in this topology")]
    UnknownFruitingBody(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fruiting_body_message() {
        let err = InjectError::UnknownFruitingBody("ghost".into());
        assert_eq!(err.to_string(), "no fruiting body named 'ghost' exists in this topology");
    }
}
