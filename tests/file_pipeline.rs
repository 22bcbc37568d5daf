use std::fs;

use image::{DynamicImage, Rgb, RgbImage};
use scramblery::detector::{FixedLandmarks, LANDMARK_COUNT, Landmarks};
use scramblery::image_handler::save_image;
use scramblery::{Emitted, ScrambleConfig, ScrambleError, ScrambleKind, Scrambler};
use tempfile::TempDir;

fn write_portrait(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let image = RgbImage::from_fn(48, 48, |x, y| Rgb([(x * 5) as u8, (y * 5) as u8, 90]));
    save_image(&path, &DynamicImage::ImageRgb8(image)).unwrap();
    path
}

fn circle_face() -> FixedLandmarks {
    let points = (0..LANDMARK_COUNT)
        .map(|i| {
            let t = i as f64 / LANDMARK_COUNT as f64 * std::f64::consts::TAU;
            ((24.0 + 12.0 * t.cos()).round() as i32, (24.0 + 14.0 * t.sin()).round() as i32)
        })
        .collect();
    FixedLandmarks::new(vec![Landmarks::new(points).unwrap()])
}

fn config(kind: ScrambleKind) -> ScrambleConfig {
    ScrambleConfig {
        seed: Some(9),
        ..ScrambleConfig::new(kind, 4, 4)
    }
}

#[test]
fn whole_image_is_written_next_to_input() {
    let dir = TempDir::new().unwrap();
    let input = write_portrait(&dir, "portrait.png");

    let mut scrambler = Scrambler::new(config(ScrambleKind::Rotate)).unwrap();
    let emitted = scrambler.scramble_file(&input).unwrap();

    let expected = dir.path().join("portrait_SCRAMBLED_4_4.png");
    assert_eq!(emitted, Emitted::Written(expected.clone()));
    let written = image::open(&expected).unwrap();
    assert_eq!((written.width(), written.height()), (48, 48));
}

#[test]
fn fourier_output_name_carries_ratio() {
    let dir = TempDir::new().unwrap();
    let input = write_portrait(&dir, "portrait.png");

    let mut cfg = config(ScrambleKind::Fourier);
    cfg.ratio = 0.5;
    let mut scrambler = Scrambler::new(cfg).unwrap();
    scrambler.scramble_file(&input).unwrap();
    assert!(dir.path().join("portrait_SCRAMBLED_fourier_0.5.png").exists());
}

#[test]
fn return_mode_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = write_portrait(&dir, "portrait.png");

    let mut cfg = config(ScrambleKind::Classic);
    cfg.write = false;
    let mut scrambler = Scrambler::new(cfg).unwrap();
    match scrambler.scramble_file(&input).unwrap() {
        Emitted::Returned(image) => assert_eq!((image.width(), image.height()), (48, 48)),
        other => panic!("expected a returned buffer, got {:?}", other),
    }
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn face_output_goes_to_output_dir() {
    let dir = TempDir::new().unwrap();
    let input = write_portrait(&dir, "portrait.png");
    let out_dir = dir.path().join("faces");

    let mut cfg = config(ScrambleKind::Stack);
    cfg.background = false;
    cfg.output_dir = Some(out_dir.clone());
    let mut scrambler = Scrambler::new(cfg).unwrap();
    let emitted = scrambler.scramble_face_file(&input, &mut circle_face()).unwrap();

    let expected = out_dir.join("portrait_SCRAMBLED_nobg_4.png");
    assert_eq!(emitted, Emitted::Written(expected.clone()));
    let written = image::open(&expected).unwrap().to_rgb8();
    assert_eq!(*written.get_pixel(0, 0), Rgb([128, 128, 128]));
}

#[test]
fn face_without_detection_is_an_error() {
    let dir = TempDir::new().unwrap();
    let input = write_portrait(&dir, "portrait.png");

    let mut scrambler = Scrambler::new(config(ScrambleKind::Pixel)).unwrap();
    let result = scrambler.scramble_face_file(&input, &mut FixedLandmarks::default());
    assert_eq!(result.unwrap_err(), ScrambleError::NoFaceDetected);
}

#[test]
fn batch_records_failures_and_continues() {
    let dir = TempDir::new().unwrap();
    let inputs = dir.path().join("in");
    let outputs = dir.path().join("out");
    fs::create_dir(&inputs).unwrap();

    write_portrait_at(&inputs.join("a.png"));
    write_portrait_at(&inputs.join("b.jpg"));
    fs::write(inputs.join("broken.png"), b"not a png").unwrap();
    fs::write(inputs.join("notes.txt"), b"ignored").unwrap();

    let mut scrambler = Scrambler::new(config(ScrambleKind::WithinBlocks)).unwrap();
    let results = scrambler.scramble_directory(&inputs, &outputs, None).unwrap();

    assert_eq!(results.len(), 3);
    let failed: Vec<_> = results.iter().filter(|r| !r.is_success()).collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].input.ends_with("broken.png"));
    assert!(outputs.join("a.png").exists());
    assert!(outputs.join("b.jpg").exists());
}

fn write_portrait_at(path: &std::path::Path) {
    let image = RgbImage::from_fn(32, 32, |x, y| Rgb([(x * 7) as u8, (y * 7) as u8, 10]));
    save_image(path, &DynamicImage::ImageRgb8(image)).unwrap();
}
