use crate::constants::{
    DEFAULT_EXTENSIONS, DEFAULT_ROOT, ENV_DEFAULT_QUALITY, ENV_EXTENSIONS, ENV_PARALLELISM,
    ENV_ROOT,
};
use crate::validation::parse_format_quality;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "img-recompress",
    about = "Recompress images in place across a directory tree",
    long_about = "img-recompress walks a directory tree, picks every file whose extension is allowed \
                  and whose content is a real image, and re-encodes it in its own format at a \
                  configurable quality, overwriting the original. Work is spread over every CPU core.",
    version,
    after_help = "ENVIRONMENT:\n  \
    SRC_PATH               root directory (default: /images)\n  \
    SUPPORT_EXTENSIONS     comma-separated extensions (default: .jpg,.jpeg)\n  \
    DEFAULT_IMAGE_QUALITY  quality used when no per-format value is set (default: 70)\n  \
    JPEG, PNG, WEBP, ...   per-format quality, keyed by detected format name\n  \
    CPU_COUNT              number of workers (default: number of CPUs)\n\n\
    EXAMPLES:\n  \
    img-recompress /srv/photos -q 80\n  \
    img-recompress /srv/photos -e .jpg,.jpeg,.png -Q JPEG=75 -Q PNG=95 -j 4\n  \
    JPEG=60 img-recompress --dry-run"
)]
pub struct Args {
    #[arg(
        env = ENV_ROOT,
        default_value = DEFAULT_ROOT,
        help = "Root directory to scan recursively"
    )]
    pub root: PathBuf,

    #[arg(
        short = 'e',
        long,
        env = ENV_EXTENSIONS,
        default_value = DEFAULT_EXTENSIONS,
        help = "Comma-separated list of extensions to consider",
        long_help = "Comma-separated list of file extensions, including the leading dot. \
                     Matching is exact and case-sensitive."
    )]
    pub extensions: String,

    #[arg(
        short = 'q',
        long,
        env = ENV_DEFAULT_QUALITY,
        value_parser = clap::value_parser!(u8).range(1..=100),
        help = "Default quality (1-100, default: 70)",
        long_help = "Quality used for every format without its own override. \
                     Falls back to 70 when unset."
    )]
    pub quality: Option<u8>,

    #[arg(
        short = 'Q',
        long = "format-quality",
        value_name = "FORMAT=QUALITY",
        value_parser = parse_format_quality,
        help = "Per-format quality override, e.g. JPEG=85 (repeatable)",
        long_help = "Quality for one detected format. Takes precedence over the environment \
                     variable of the same name and over --quality."
    )]
    pub format_quality: Vec<(String, u8)>,

    #[arg(
        short = 'j',
        long,
        env = ENV_PARALLELISM,
        help = "Number of parallel workers (default: auto)",
        long_help = "Number of workers the file list is split across. \
                     If not specified, uses number of CPU cores."
    )]
    pub jobs: Option<usize>,

    #[arg(long, help = "Exit with status 1 if any file failed to recompress")]
    pub strict: bool,

    #[arg(long, help = "List the files that would be recompressed without touching them")]
    pub dry_run: bool,

    #[arg(short = 'v', long, conflicts_with = "quiet", help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(long, help = "Only log warnings and errors")]
    pub quiet: bool,
}
