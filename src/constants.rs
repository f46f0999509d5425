pub const DEFAULT_QUALITY: u8 = 70;
pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

pub const DEFAULT_ROOT: &str = "/images";
pub const DEFAULT_EXTENSIONS: &str = ".jpg,.jpeg";

// Environment keys. Per-format overrides use the format name itself (e.g. `JPEG`).
pub const ENV_ROOT: &str = "SRC_PATH";
pub const ENV_EXTENSIONS: &str = "SUPPORT_EXTENSIONS";
pub const ENV_DEFAULT_QUALITY: &str = "DEFAULT_IMAGE_QUALITY";
pub const ENV_PARALLELISM: &str = "CPU_COUNT";

/// Bytes read from the head of a file when sniffing its format.
pub const SNIFF_HEADER_LEN: usize = 32;

pub const OXIPNG_PRESET: u8 = 4;
pub const ZOPFLI_QUALITY_THRESHOLD: u8 = 90;
pub const HIGH_QUALITY_THRESHOLD: u8 = 70;
pub const ZOPFLI_ITERATIONS: u8 = 15;
pub const LIBDEFLATER_HIGH_LEVEL: u8 = 12;
pub const LIBDEFLATER_LOW_LEVEL: u8 = 8;

pub const WORKER_THREAD_PREFIX: &str = "recompress-worker";
