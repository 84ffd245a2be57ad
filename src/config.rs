//! Build configuration.

/// Default primitive count up to which the surface area heuristic is used.
pub const DEFAULT_SAH_THRESHOLD: u32 = 1_000_000;

/// Tunables of a BVH build.
///
/// # Examples
/// ```
/// use stackless_bvh::config::{BuildConfig, DEFAULT_SAH_THRESHOLD};
///
/// let config = BuildConfig::default();
/// assert_eq!(config.sah_threshold, DEFAULT_SAH_THRESHOLD);
///
/// let config = BuildConfig::default().with_sah_threshold(1000);
/// assert_eq!(config.sah_threshold, 1000);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BuildConfig {
    /// Ranges with at most this many primitives are split with the surface area heuristic.
    /// Larger ranges use the median split, which is linear in the range size and keeps
    /// huge scenes buildable in bounded time. `0` disables the heuristic entirely.
    pub sah_threshold: u32,
}

impl BuildConfig {
    /// Creates a configuration with the given SAH threshold.
    pub fn new(sah_threshold: u32) -> BuildConfig {
        BuildConfig { sah_threshold }
    }

    /// Returns a copy of this configuration with a different SAH threshold.
    pub fn with_sah_threshold(mut self, sah_threshold: u32) -> BuildConfig {
        self.sah_threshold = sah_threshold;
        self
    }
}

impl Default for BuildConfig {
    fn default() -> BuildConfig {
        BuildConfig {
            sah_threshold: DEFAULT_SAH_THRESHOLD,
        }
    }
}
