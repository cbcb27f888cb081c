//! # Stakeline Decimal
//!
//! Exact, deterministic fixed-point decimal arithmetic for stake accounting.
//!
//! Every replica must reach bit-identical balances from identical inputs, so
//! token amounts, shares and slash fractions are never held in floating
//! point. [`Dec`] stores a signed big integer scaled by `10^PRECISION` and
//! rounds half away from zero whenever a result has more fractional digits
//! than it can hold.
//!
//! ```rust
//! use stakeline_decimal::Dec;
//!
//! let power = Dec::from_int(1_000);
//! let fraction: Dec = "0.1".parse().unwrap();
//! assert_eq!(&power * &fraction, Dec::from_int(100));
//!
//! let penalty: Dec = "20.5".parse().unwrap();
//! assert_eq!(penalty.round(), Dec::from_int(21));
//! ```

pub mod dec;
pub mod error;

pub use dec::{Dec, BPS_DENOMINATOR, PRECISION};
pub use error::DecError;
