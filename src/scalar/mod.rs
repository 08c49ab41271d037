//! This module contains algorithms that search for local minima of functions along a single dimension.

mod brent;

pub use self::brent::Bounds;
pub use self::brent::Brent;
pub use self::brent::BrentBuilder;
