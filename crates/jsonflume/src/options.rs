/// Configuration for the parser and its driver loop.
///
/// # Examples
///
/// ```rust
/// use jsonflume::ParserOptions;
///
/// let options = ParserOptions {
///     max_depth: Some(64),
///     ..Default::default()
/// };
/// assert_eq!(options.buffer_capacity, 16 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParserOptions {
    /// Size of the driver's pull buffer in code units.
    ///
    /// Larger buffers give the array lookahead more to work with, so
    /// capacity hints get closer to true counts.
    ///
    /// # Default
    ///
    /// `16384`
    pub buffer_capacity: usize,

    /// Hard cap on container nesting depth. Exceeding it raises the
    /// structural (fatal) `depth_limit_exceeded` condition.
    ///
    /// # Default
    ///
    /// `None` — the mode stack grows without bound.
    pub max_depth: Option<usize>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: 16 * 1024,
            max_depth: None,
        }
    }
}
