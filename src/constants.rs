/// Vendor identifiers for the built-in profiles
pub const TTT_BULLION: &str = "ttt_bullion";
pub const MS_GOLD: &str = "ms_gold";

/// Bounded wait for a page to come back before the fetch is abandoned.
pub const DEFAULT_READY_TIMEOUT_SECS: u64 = 15;

/// Extra wait after the page is ready, for tables filled in by late scripts.
pub const DEFAULT_SETTLE_MS: u64 = 3000;

/// Reason reported when a run produced no records.
pub const NO_DATA_REASON: &str = "no data extracted";

/// Placeholder substituted with the detected purity in label rule outputs.
pub const PURITY_PLACEHOLDER: &str = "{purity}";

