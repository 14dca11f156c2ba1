//! Converts a fixture asset and feeds the story through every backend.

use std::path::PathBuf;

use zeile_backend_bestdori::wire::{AssetRef, LayoutType, RecordBody};
use zeile_backend_bestdori::BestdoriBackend;
use zeile_backend_plaintext::PlainTextBackend;
use zeile_backend_sirius::SiriusBackend;
use zeile_core::diagnostic::{has_errors, DiagnosticKind, SourceLocation};
use zeile_core::ir::{Locale, Position, PositionBase, StepAction, Story};
use zeile_core::pipeline::{Backend, Frontend, FrontendInput};
use zeile_frontend_bandori::{convert, parse_asset, BandoriFrontend};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/band1_01.json")
}

fn fixture_story() -> Story {
    let json = std::fs::read_to_string(fixture_path()).unwrap();
    let asset = parse_asset(&json).unwrap();
    convert(&asset, Locale::Jp, "voice/band1").story
}

#[test]
fn converts_fixture() {
    let json = std::fs::read_to_string(fixture_path()).unwrap();
    let asset = parse_asset(&json).unwrap();
    let conversion = convert(&asset, Locale::Jp, "voice/band1");

    let expected = vec![
        StepAction::ChangeBgm {
            path: "jp/sound/scenario/bgm/bgm001/BGM001.mp3".into(),
        },
        StepAction::ChangeBackground {
            path: "jp/bg/scenario1_rip/bg00001.png".into(),
        },
        StepAction::ShowModel {
            character_id: 1,
            model_path: "jp/live2d/chara/001_casual".into(),
            position: Position::new(PositionBase::Center, 0.0),
        },
        StepAction::WaitForAll,
        StepAction::Talk {
            text: "Good morning!".into(),
            character_ids: vec![1],
            character_names: vec!["Kasumi".into()],
            voice_path: Some("voice/band1/scenario1_01.mp3".into()),
        },
        StepAction::Act {
            character_id: 1,
            motion_name: "smile01".into(),
        },
        StepAction::Delay { seconds: 2.5 },
        StepAction::ChangeSe {
            path: "jp/sound/se/scenario_se_rip/se_303.mp3".into(),
        },
        StepAction::Delay { seconds: 1.5 },
        StepAction::Telop {
            text: "Morning".into(),
        },
        StepAction::WaitForAll,
        StepAction::HideModel { character_id: 1 },
    ];
    assert_eq!(conversion.story.actions(), expected.as_slice());

    // The input snippet is skipped with a warning only.
    assert!(!has_errors(&conversion.diagnostics));
    assert_eq!(conversion.diagnostics.len(), 1);
    let diagnostic = &conversion.diagnostics[0];
    assert_eq!(diagnostic.message.kind, DiagnosticKind::UnsupportedSnippet);
    assert_eq!(diagnostic.location, SourceLocation::Snippet { index: 4 });
}

#[test]
fn frontend_reads_manifest_options() {
    let output = BandoriFrontend
        .extract(FrontendInput {
            source: fixture_path(),
            locale: Locale::En,
            options: serde_json::json!({ "voiceBundlePath": "en/voice" }),
        })
        .unwrap();
    assert_eq!(output.story.locale(), Locale::En);
    let voice = output.story.actions().iter().find_map(|a| match a {
        StepAction::Talk { voice_path, .. } => voice_path.clone(),
        _ => None,
    });
    assert_eq!(voice.as_deref(), Some("en/voice/scenario1_01.mp3"));
}

#[test]
fn missing_source_is_an_error() {
    let result = BandoriFrontend.extract(FrontendInput {
        source: fixture_path().with_file_name("missing.json"),
        locale: Locale::Jp,
        options: serde_json::Value::Null,
    });
    assert!(result.is_err());
}

#[test]
fn plain_text_reads_back() {
    let story = fixture_story();
    let text = PlainTextBackend.emit(&story).unwrap();
    assert!(text.starts_with(".text\n"));
    let read = zeile_backend_plaintext::read(&text, story.locale()).unwrap();
    assert_eq!(read, story);
}

#[test]
fn sirius_lists_every_action() {
    let story = fixture_story();
    let text = SiriusBackend::default().emit(&story).unwrap();
    assert!(text.starts_with("# LOCALE: JP\n\n"));
    assert!(text.ends_with("\nEOF."));
    assert!(text.contains(
        "4 Talk(Good morning!, charID: [1], charName: [\"Kasumi\"], voicePath: voice/band1/scenario1_01.mp3)\n"
    ));
    assert!(text.contains("11 HideModel(charID: 1)\n"));
}

#[test]
fn bestdori_scenario() {
    let story = fixture_story();
    let scenario = zeile_backend_bestdori::lower(&story, 0);

    assert_eq!(
        scenario.background,
        Some(AssetRef::Bandori {
            file: "bg00001".into(),
            bundle: Some("bg/scenario1".into()),
        })
    );
    assert_eq!(
        scenario.bgm,
        Some(AssetRef::Bandori {
            file: "BGM001".into(),
            bundle: None,
        })
    );

    // Delays and waits produce no records.
    assert_eq!(scenario.actions.len(), 6);
    let delays: Vec<i64> = scenario.actions.iter().map(|r| r.delay).collect();
    assert_eq!(delays, [0, 0, 0, 2, 1, 0]);
    let waits: Vec<bool> = scenario.actions.iter().map(|r| r.wait).collect();
    assert_eq!(waits, [false, true, false, false, false, false]);

    match &scenario.actions[5].body {
        RecordBody::Layout {
            layout_type,
            costume,
            ..
        } => {
            assert_eq!(*layout_type, LayoutType::Hide);
            assert_eq!(costume, "001_casual");
        }
        other => panic!("expected a hide layout, got {other:?}"),
    }

    let json = BestdoriBackend::default().emit(&story).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["actions"][1]["type"], "talk");
    assert_eq!(value["actions"][4]["effectType"], "telop");
}
