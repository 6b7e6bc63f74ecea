/// Fallback zone when `PAYROLL_TIMEZONE` is unset.
pub const DEFAULT_TIMEZONE: &str = "America/Bogota";

/// Scheduled generation fires at midnight unless `PAYROLL_TRIGGER` says otherwise.
pub const DEFAULT_TRIGGER: (u32, u32) = (0, 0);

pub const DEFAULT_TICK_SECS: u64 = 30;

/// Incidences are aggregated from the 20th of one month to the 20th of the next.
pub const DEFAULT_PAY_CYCLE_START_DAY: u32 = 20;
pub const DEFAULT_PAY_CYCLE_LENGTH_MONTHS: u32 = 1;

/// Highest start day that exists in every month.
pub const MAX_PAY_CYCLE_START_DAY: u32 = 28;

pub const DEFAULT_WORKER_POOL: usize = 4;
pub const DEFAULT_STORAGE_TIMEOUT_SECS: u64 = 10;

/// Row key of the persisted "last fired" marker in `scheduler_state`.
pub const GENERATION_MARKER_KEY: &str = "payroll_generation";
