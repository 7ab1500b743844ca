// Shared constants for the external CLI surface
// Command lines, exit codes and output markers must stay bit-exact with the
// tools they drive.

/// Direct subscription manager binary
pub const SUSECONNECT_BIN: &str = "suseconnect";

/// Snapshot tool binary wrapping the subscription manager
pub const TRANSACTIONAL_UPDATE_BIN: &str = "transactional-update";

/// Probe path for the snapshot tool
pub const TRANSACTIONAL_UPDATE_PATH: &str = "/sbin/transactional-update";

/// Probe path for the direct subscription manager
pub const SUSECONNECT_PATH: &str = "/usr/bin/suseconnect";

/// Exit status meaning the package database is locked by another process
pub const ZYPP_BUSY_EXIT: i32 = 7;

/// Exit status of the extensions listing on an unregistered system
pub const NOT_REGISTERED_EXIT: i32 = 64;

/// Exit status of a base-product deregister while other products are active
/// (snapshot variant; the direct variant signals via output substring)
pub const BASE_PRODUCT_CONFLICT_EXIT: i32 = 70;

/// Attempt ceiling for busy-retried queries (initial attempt + 20 retries)
pub const MAX_QUERY_ATTEMPTS: u32 = 21;

/// Marker proving a registration succeeded, independent of exit code
pub const SUCCESS_MARKER: &str = "Successfully registered system";

/// Marker advising the caller that a reboot is needed to finish the change
pub const REBOOT_MARKER: &str = "Please reboot your machine";

/// Base-product conflict marker emitted by the direct manager
pub const BASE_CONFLICT_MARKER: &str = "Can not deregister base product";

/// Base-product conflict as reported in the snapshot tool's merged output
pub const WRAPPED_CONFLICT_MARKER: &str = "exit status 70";
