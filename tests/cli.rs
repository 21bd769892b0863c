use assert_cmd::Command;
use image::{ImageBuffer, Rgb};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn write_image(path: &Path, width: u32, height: u32) {
    ImageBuffer::from_pixel(width, height, Rgb([200u8, 40, 40]))
        .save(path)
        .unwrap();
}

fn borderbatch() -> Command {
    let mut cmd = Command::cargo_bin("borderbatch").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_missing_input_fails() {
    borderbatch()
        .assert()
        .failure()
        .stderr(predicate::str::contains("input folder is required"));
}

#[test]
fn test_malformed_flag_fails() {
    let dir = TempDir::new().unwrap();
    borderbatch()
        .arg(dir.path())
        .args(["--batch-size", "many"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_configuration_fails() {
    let dir = TempDir::new().unwrap();
    borderbatch()
        .arg(dir.path())
        .args(["--landscape-vert", "0.7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_nonexistent_folder_fails() {
    let dir = TempDir::new().unwrap();
    borderbatch()
        .arg(dir.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error reading directory"));
}

#[test]
fn test_mixed_folder_end_to_end() {
    let dir = TempDir::new().unwrap();
    write_image(&dir.path().join("a.jpg"), 60, 30);
    write_image(&dir.path().join("b.jpg"), 30, 60);
    write_image(&dir.path().join("c.jpg"), 40, 40);
    write_image(&dir.path().join("d.png"), 80, 20);
    write_image(&dir.path().join("e.png"), 20, 80);
    std::fs::write(dir.path().join("notes.txt"), b"not an image").unwrap();

    borderbatch()
        .arg(dir.path())
        .args(["--width", "100", "--height", "100", "--batch-size", "2", "--workers", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully processed a.jpg"))
        .stdout(predicate::str::contains("Total images processed: 5"))
        .stdout(predicate::str::contains("Batch 3 (worker"))
        .stdout(predicate::str::contains("Batch 4").not())
        .stdout(predicate::str::contains("Total execution time"));

    let output = dir.path().join("bordered_images");
    let mut names: Vec<String> = std::fs::read_dir(&output)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        ["bordered_a.jpg", "bordered_b.jpg", "bordered_c.jpg", "bordered_d.png", "bordered_e.png"]
    );

    for name in &names {
        let img = image::open(output.join(name)).unwrap();
        assert_eq!((img.width(), img.height()), (100, 100));
    }
}

#[test]
fn test_corrupt_image_does_not_fail_run() {
    let dir = TempDir::new().unwrap();
    write_image(&dir.path().join("1.jpg"), 50, 50);
    write_image(&dir.path().join("2.jpg"), 50, 50);
    std::fs::write(dir.path().join("3.jpg"), b"definitely not a jpeg").unwrap();
    write_image(&dir.path().join("4.jpg"), 50, 50);

    borderbatch()
        .arg(dir.path())
        .args(["--width", "64", "--height", "64", "--batch-size", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Error processing 3.jpg"))
        .stdout(predicate::str::contains("Total images processed: 3"))
        .stdout(predicate::str::contains("Failed images:          1"))
        .stdout(predicate::str::contains("3/4 successful"));

    assert!(!dir.path().join("bordered_images").join("bordered_3.jpg").exists());
}

#[test]
fn test_in_place_output_with_prefix() {
    let dir = TempDir::new().unwrap();
    write_image(&dir.path().join("shot.png"), 20, 10);

    borderbatch()
        .arg("--input")
        .arg(dir.path())
        .args(["--width", "32", "--height", "32", "--separate-folder", "false", "--prefix", "framed_", "-Q"])
        .assert()
        .success();

    assert!(dir.path().join("framed_shot.png").exists());
    assert!(!dir.path().join("bordered_images").exists());
}

#[test]
fn test_json_summary() {
    let dir = TempDir::new().unwrap();
    write_image(&dir.path().join("x.jpg"), 30, 20);
    write_image(&dir.path().join("y.png"), 20, 30);
    std::fs::write(dir.path().join("broken.jpg"), b"not a jpeg at all").unwrap();

    let output = borderbatch()
        .arg(dir.path())
        .args(["--width", "48", "--height", "48", "--batch-size", "1", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["total_images"], 2);
    assert_eq!(report["summary"]["failed_images"], 1);
    assert_eq!(report["summary"]["batches"].as_array().unwrap().len(), 3);
    assert!(report["wall_time"].as_f64().unwrap() >= 0.0);

    let failures = report["summary"]["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["filename"], "broken.jpg");
    assert_eq!(failures[0]["kind"], "DecodeError");
    assert!(failures[0]["message"].as_str().unwrap().contains("decoding"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("broken.jpg"), "failure not logged: {stderr}");
}

#[test]
fn test_closed_stdout_still_processes_folder() {
    let dir = TempDir::new().unwrap();
    for i in 0..4 {
        write_image(&dir.path().join(format!("{i}.jpg")), 30, 20);
    }

    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("borderbatch"))
        .arg(dir.path())
        .args(["--width", "32", "--height", "32", "--batch-size", "1"])
        .env_remove("RUST_LOG")
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .spawn()
        .unwrap();
    drop(child.stdout.take());

    let status = child.wait().unwrap();
    assert!(status.success(), "exit status {status:?}");
    for i in 0..4 {
        assert!(dir.path().join("bordered_images").join(format!("bordered_{i}.jpg")).exists());
    }
}

#[test]
fn test_dump_config_round_trips_flags() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("borderbatch.toml");

    borderbatch()
        .arg("--dump-config")
        .arg(&path)
        .args(["--width", "640", "--workers", "8"])
        .assert()
        .success();

    let written = borderbatch::Config::from_file(&path).unwrap();
    assert_eq!(written.target_width, 640);
    assert_eq!(written.workers, 8);
    assert_eq!(written.target_height, 1080);
}

#[test]
fn test_config_file_with_flag_override() {
    let dir = TempDir::new().unwrap();
    write_image(&dir.path().join("p.jpg"), 10, 10);
    let config_path = dir.path().join("settings.yaml");
    std::fs::write(
        &config_path,
        "target_width: 40\ntarget_height: 40\noutput_prefix: \"cfg_\"\n",
    )
    .unwrap();

    borderbatch()
        .arg(dir.path())
        .arg("--config")
        .arg(&config_path)
        .args(["--height", "24", "-Q"])
        .assert()
        .success();

    let img = image::open(dir.path().join("bordered_images").join("cfg_p.jpg")).unwrap();
    assert_eq!((img.width(), img.height()), (40, 24));
}
