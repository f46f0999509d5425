mod common;

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use common::{create_mixed_tree, write_image, write_truncated_png};
use image::ImageFormat;
use img_recompress::{detect, discover, ImageKind};
use predicates::prelude::*;
use std::fs;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("img-recompress").unwrap();
    cmd.env_clear();
    cmd
}

#[test]
fn test_cli_help() {
    cmd().arg("--help").assert().success();
}

#[test]
fn test_cli_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_discover_mixed_tree() {
    let temp = TempDir::new().unwrap();
    create_mixed_tree(temp.path());

    let mut files = discover(temp.path(), &[".jpg".to_string(), ".jpeg".to_string()]);
    files.sort();

    assert_eq!(
        files,
        vec![temp.child("a.jpg").path().to_path_buf(), temp.child("c.jpg").path().to_path_buf()]
    );
}

#[test]
fn test_recompress_mixed_tree() {
    let temp = TempDir::new().unwrap();
    create_mixed_tree(temp.path());
    let png_before = fs::read(temp.child("b.png").path()).unwrap();

    cmd()
        .arg(temp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("SYSTEM INFO"))
        .stderr(predicate::str::contains("elapsed_time"));

    assert_eq!(detect(temp.child("a.jpg").path()).unwrap(), Some(ImageKind::Jpeg));
    assert_eq!(detect(temp.child("c.jpg").path()).unwrap(), Some(ImageKind::Png));
    assert_eq!(fs::read(temp.child("b.png").path()).unwrap(), png_before);
    temp.child("d.txt").assert("not an image");

    let entries = fs::read_dir(temp.path()).unwrap().count();
    assert_eq!(entries, 4);
}

#[test]
fn test_root_from_environment() {
    let temp = TempDir::new().unwrap();
    write_image(temp.child("photo.jpg").path(), ImageFormat::Jpeg);

    cmd()
        .env("SRC_PATH", temp.path())
        .env("JPEG", "40")
        .assert()
        .success()
        .stderr(predicate::str::contains("format=JPEG quality=40"));
}

#[test]
fn test_extensions_from_environment() {
    let temp = TempDir::new().unwrap();
    write_image(temp.child("b.png").path(), ImageFormat::Png);

    cmd()
        .arg(temp.path())
        .env("SUPPORT_EXTENSIONS", ".png")
        .assert()
        .success()
        .stderr(predicate::str::contains("format=PNG"));
}

#[test]
fn test_failed_file_does_not_fail_run() {
    let temp = TempDir::new().unwrap();
    write_truncated_png(temp.child("broken.jpg").path());
    write_image(temp.child("good.jpg").path(), ImageFormat::Jpeg);

    cmd()
        .arg(temp.path())
        .args(["-j", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("recompression failed").count(1))
        .stderr(predicate::str::contains("good.jpg"));
}

#[test]
fn test_strict_mode_fails_on_bad_file() {
    let temp = TempDir::new().unwrap();
    write_truncated_png(temp.child("broken.jpg").path());

    cmd()
        .arg(temp.path())
        .arg("--strict")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_strict_mode_succeeds_when_clean() {
    let temp = TempDir::new().unwrap();
    write_image(temp.child("good.jpg").path(), ImageFormat::Jpeg);

    cmd().arg(temp.path()).arg("--strict").assert().success();
}

#[test]
fn test_dry_run_does_not_modify() {
    let temp = TempDir::new().unwrap();
    let path = write_image(temp.child("a.jpg").path(), ImageFormat::Jpeg);
    let before = fs::read(&path).unwrap();

    cmd()
        .arg(temp.path())
        .arg("--dry-run")
        .assert()
        .success()
        .stderr(predicate::str::contains("would recompress"))
        .stderr(predicate::str::contains("format=JPEG quality=70"));

    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_unknown_format_quality_key_fails() {
    let temp = TempDir::new().unwrap();

    cmd()
        .arg(temp.path())
        .args(["-Q", "jpeg=85"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported format"));
}

#[test]
fn test_missing_root_fails() {
    cmd().arg("/nonexistent/root/dir").assert().failure();
}

#[test]
fn test_invalid_format_quality_env_fails() {
    let temp = TempDir::new().unwrap();

    cmd()
        .arg(temp.path())
        .env("JPEG", "best")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn test_invalid_default_quality_fails() {
    let temp = TempDir::new().unwrap();

    cmd()
        .arg(temp.path())
        .env("DEFAULT_IMAGE_QUALITY", "0")
        .assert()
        .failure();
}

#[test]
fn test_zero_jobs_fails() {
    let temp = TempDir::new().unwrap();

    cmd().arg(temp.path()).args(["-j", "0"]).assert().failure();
}
