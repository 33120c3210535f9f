//! Workspace-wide constants for the diagnostic bench.
//!
//! Single source of truth for dashboard key names and default timing.

/// Default dashboard key root (`Diag/<device>/<field>`).
pub const DEFAULT_KEY_ROOT: &str = "Diag";

/// Default scheduler period in milliseconds (50 Hz).
pub const DEFAULT_TICK_PERIOD_MS: u64 = 20;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/diag.toml";

/// Per-device dashboard fields.
pub mod keys {
    pub const ENABLE: &str = "Enable";
    pub const RETRY: &str = "Retry";
    pub const LAST_STATUS_HEX: &str = "LastStatusHex";
    pub const HEALTH: &str = "Health";
    pub const STATUS_SUMMARY: &str = "StatusSummary";
    pub const STATE: &str = "State";
    pub const DEBUG_STATE: &str = "DebugState";
    /// Prefix of the per-binding use flag, followed by the terminator name.
    pub const USE_TERM_PREFIX: &str = "UseTerm_";

    pub const START_TEST: &str = "StartTest";
    pub const STOP_TEST: &str = "StopTest";
    pub const RUN_ID: &str = "RunId";
    pub const RUN_ACTIVE: &str = "RunActive";
    pub const RUN_START_TIME_SEC: &str = "RunStartTimeSec";
}
