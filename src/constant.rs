// Window size constants
pub const DEFAULT_WINDOW_WIDTH: f32 = 750.0;
pub const DEFAULT_WINDOW_HEIGHT: f32 = 468.0;
pub const DEFAULT_WINDOW_TITLE: &str = "Aspect Shell";
pub const DEFAULT_VIEW_NAME: &str = "MainView";

/// Application name and metadata constants
pub const APP_QUALIFIER: &str = "com";
pub const APP_ORGANIZATION: &str = "AspectShell";
pub const APP_NAME: &str = "Aspect Shell";
pub const DEFAULT_SETTINGS_NODE: &str = "prefs";

/// Resize synchronizer timings
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;
pub const DEFAULT_UNLOCK_DELAY_MS: u64 = 500;

/// Label grid
pub const LABEL_COUNT: usize = 9;
pub const DEFAULT_LABEL_FAMILY: &str = "Arial";
pub const DEFAULT_LABEL_SIZE: f32 = 20.0;

/// Settings keys shared with other tooling
pub const KEY_BG_IMAGE_PATH: &str = "BG_IMAGE_PATH";
pub const KEY_BG_IMAGE_IDX: &str = "BG_IMAGE_IDX";
pub const BACKGROUND_DIR: &str = "backgrounds";
