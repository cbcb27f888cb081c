use thiserror::Error;

/// Errors produced by decimal parsing and division.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecError {
    /// The input was not a decimal number (`"12"`, `"-0.5"`, `"3.25"`).
    #[error("Invalid decimal string {input:?}")]
    InvalidFormat { input: String },

    /// The input carries more fractional digits than the fixed precision.
    #[error("Decimal {input:?} has {digits} fractional digits, at most {max} are supported")]
    TooManyFractionalDigits {
        input: String,
        digits: usize,
        max: u32,
    },

    /// Division by a zero decimal.
    #[error("Decimal division by zero")]
    DivisionByZero,
}
