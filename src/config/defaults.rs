//! Default configuration values

/// Project config file name
pub const CONFIG_FILE_NAME: &str = "cforge.toml";

/// Environment toggle for dry-run mode
pub const ENV_DRY_RUN: &str = "CFORGE_DRY_RUN";

/// Environment overrides for the root directories
pub const ENV_SOURCES_DIR: &str = "CFORGE_SOURCES_DIR";
pub const ENV_PATCHES_DIR: &str = "CFORGE_PATCHES_DIR";
pub const ENV_BUILD_DIR: &str = "CFORGE_BUILD_DIR";
pub const ENV_INSTALL_DIR: &str = "CFORGE_INSTALL_DIR";

/// Root directory names used when neither env nor config sets them
pub const DEFAULT_SOURCES_DIR: &str = "sources";
pub const DEFAULT_PATCHES_DIR: &str = "patches";
pub const DEFAULT_BUILD_DIR: &str = "build";
pub const DEFAULT_INSTALL_DIR: &str = "install";

/// Suffix of the backup the patch tool leaves next to a patched file
pub const BACKUP_EXTENSION: &str = ".orig";

/// Suffix of the file the patch tool writes rejected hunks to
pub const REJECT_EXTENSION: &str = ".rej";

/// Suffix of diff files under a component's patches directory
pub const PATCH_EXTENSION: &str = ".diff";

/// Line printed before a phase starts
pub const START_SPACER: &str =
    ">>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>>";

/// Line printed after a phase completes
pub const END_SPACER: &str =
    "<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<<";

/// CPUs left free for the rest of the system when picking a job count
pub const RESERVED_CPUS: usize = 2;

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
