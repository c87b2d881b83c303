//! Unwrap helpers with good error messages.
//!
//! These replace `unwrap()` and `expect()` in test code. `#[track_caller]`
//! makes the panic point at the test line rather than at this module.

use std::fmt::Debug;

/// Unwrap a `Result`, panicking with the error value on `Err`.
///
/// # Example
///
/// ```rust
/// use anapad_test_helpers::must;
///
/// let value = must(Ok::<u8, String>(7));
/// assert_eq!(value, 7);
/// ```
///
/// # Panics
///
/// Panics if the result is `Err`.
#[track_caller]
pub fn must<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must: unexpected Err: {e:?}"),
    }
}

/// Unwrap an `Option`, panicking with `msg` on `None`.
///
/// # Panics
///
/// Panics if the option is `None`.
#[track_caller]
pub fn must_some<T>(option: Option<T>, msg: &str) -> T {
    match option {
        Some(v) => v,
        None => panic!("must_some: {msg}"),
    }
}
