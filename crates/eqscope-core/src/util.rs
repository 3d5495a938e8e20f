//! Utilities for all of `eqscope`.

/// Shift `incoming` into the end of `buffer`, discarding the oldest values from its start.
///
/// When `incoming` is at least as long as `buffer`, the buffer ends up holding the last
/// `buffer.len()` values of `incoming`.
///
/// # Examples
///
/// ```
/// use eqscope_core::util::shift_in;
/// let mut buffer = [0, 1, 2, 3, 4];
/// shift_in(&mut buffer, &[5, 6]);
/// assert_eq!([2, 3, 4, 5, 6], buffer);
/// shift_in(&mut buffer, &[7, 8, 9, 10, 11, 12]);
/// assert_eq!([8, 9, 10, 11, 12], buffer);
/// ```
pub fn shift_in<T: Copy>(buffer: &mut [T], incoming: &[T]) {
    let len = buffer.len();
    if incoming.len() >= len {
        buffer.copy_from_slice(&incoming[incoming.len() - len..]);
        return;
    }
    let keep = len - incoming.len();
    buffer.copy_within(incoming.len().., 0);
    buffer[keep..].copy_from_slice(incoming);
}
