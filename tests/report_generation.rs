//! Offline end-to-end report generation: dead network, bundled fallback.

use std::fs;
use std::path::Path;

use pokedash::{ReportBuilder, SpriteResolver};

fn write_inputs(data_dir: &Path) {
    fs::create_dir_all(data_dir).unwrap();
    fs::write(
        data_dir.join("responses.csv"),
        "name,votes,types,generation,family\n\
         Bulbasaur,710,grass/poison,1,Bulbasaur\n\
         Ivysaur,89,grass/poison,1,Bulbasaur\n\
         Venusaur,297,grass/poison,1,Bulbasaur\n\
         Charmander,650,fire,1,Charmander\n\
         Chikorita,320,grass,2,Chikorita\n",
    )
    .unwrap();
    fs::write(
        data_dir.join("votes.csv"),
        "timestamp,vote\n\
         2019-07-01 09:05:00,Charmander\n\
         2019-07-01 09:40:00,Charmander\n\
         2019-07-01 11:12:00,Charmander\n\
         2019-07-01 09:30:00,Bulbasaur\n",
    )
    .unwrap();
}

fn write_fallback(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("pokeball.png");
    let image = image::RgbaImage::from_pixel(8, 8, image::Rgba([230, 30, 30, 255]));
    image.save(&path).unwrap();
    path
}

fn offline_resolver(fallback: &Path) -> SpriteResolver {
    SpriteResolver::new()
        .with_api_base("http://127.0.0.1:1")
        .with_fallback_path(fallback)
}

#[test]
fn generates_all_artifacts_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let out_dir = dir.path().join("output");
    write_inputs(&data_dir);
    let fallback = write_fallback(dir.path());

    let report = ReportBuilder::new(&data_dir, &out_dir)
        .subject_name("charmander")
        .sprite_resolver(offline_resolver(&fallback))
        .generate()
        .unwrap();

    assert_eq!(report, out_dir.join("report.html"));
    assert!(out_dir.join("overall_ranking.png").exists());
    assert!(out_dir.join("generation_1_ranking.png").exists());
    assert!(out_dir.join("vote_timeline.png").exists());
    assert!(data_dir.join("ranked.csv").exists(), "ranking cache persisted");

    let html = fs::read_to_string(&report).unwrap();
    assert!(html.contains("4. Charmander"));
    assert!(html.contains("alt=\"pokeball\""), "offline run uses the fallback sprite");
    assert!(html.contains("Ranking overall"));
    assert!(html.contains("3 live votes for Charmander"));
    // Fallback fixture is solid red, so the timeline color follows it.
    assert!(html.contains("#e61e1e"));
}

#[test]
fn report_without_vote_log_skips_the_timeline() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let out_dir = dir.path().join("output");
    write_inputs(&data_dir);
    fs::remove_file(data_dir.join("votes.csv")).unwrap();
    let fallback = write_fallback(dir.path());

    let report = ReportBuilder::new(&data_dir, &out_dir)
        .subject_id(1)
        .sprite_resolver(offline_resolver(&fallback))
        .generate()
        .unwrap();

    let html = fs::read_to_string(&report).unwrap();
    assert!(html.contains("1. Bulbasaur"));
    assert!(html.contains("No votes recorded for Bulbasaur"));
    assert!(!out_dir.join("vote_timeline.png").exists());
}

#[test]
fn unknown_subject_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    write_inputs(&data_dir);
    let fallback = write_fallback(dir.path());

    let err = ReportBuilder::new(&data_dir, dir.path().join("output"))
        .subject_name("Missingno")
        .sprite_resolver(offline_resolver(&fallback))
        .generate()
        .unwrap_err();

    assert!(err.to_string().contains("Missingno"));
}

#[test]
fn missing_fallback_asset_aborts_the_report() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    write_inputs(&data_dir);

    let err = ReportBuilder::new(&data_dir, dir.path().join("output"))
        .sprite_resolver(offline_resolver(&dir.path().join("absent.png")))
        .generate()
        .unwrap_err();

    assert!(err.to_string().contains("absent.png"));
}
