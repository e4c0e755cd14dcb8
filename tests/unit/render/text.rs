use super::*;

fn system_engine() -> Option<TextLayoutEngine> {
    let font = CaptionFont::discover_system().ok()?;
    TextLayoutEngine::new(&font).ok()
}

#[test]
fn empty_font_bytes_are_rejected() {
    let err = CaptionFont::from_bytes(Vec::new(), 0).unwrap_err();
    assert!(matches!(err, MemeError::Font(_)));
}

#[test]
fn missing_font_file_is_a_font_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = CaptionFont::resolve(&FontSource::File(dir.path().join("nope.ttf"))).unwrap_err();
    assert!(matches!(err, MemeError::Font(_)));
    assert!(err.to_string().contains("nope.ttf"));
}

#[test]
fn shaped_line_has_glyphs_and_metrics() {
    let Some(mut engine) = system_engine() else {
        eprintln!("skipping: no system font available");
        return;
    };
    assert!(!engine.family_name().trim().is_empty());

    let line = engine.shape_line("HELLO", 50.0).unwrap();
    assert_eq!(line.glyphs.len(), 5);
    assert!(line.width > 0.0);
    assert!(line.ascent > 0.0);
    assert!(line.baseline > 0.0);
    assert!(line.glyphs.windows(2).all(|w| w[0].x < w[1].x));
}

#[test]
fn line_breaks_flatten_to_spaces() {
    let Some(mut engine) = system_engine() else {
        eprintln!("skipping: no system font available");
        return;
    };
    let flat = engine.shape_line("AB CD", 50.0).unwrap();
    for sep in ['\n', '\r', '\u{000B}', '\u{0085}', '\u{2028}', '\u{2029}'] {
        let broken = engine.shape_line(&format!("AB{sep}CD"), 50.0).unwrap();
        assert_eq!(broken.width, flat.width, "separator {:?}", sep);
        assert_eq!(broken.glyphs.len(), flat.glyphs.len());
        assert_eq!(broken.baseline, flat.baseline);
    }
}

#[test]
fn every_mandatory_break_becomes_a_space() {
    assert_eq!(
        flatten_line_breaks("a\nb\r\nc\u{000B}d\u{000C}e\u{0085}f\u{2028}g\u{2029}h"),
        "a b  c d e f g h"
    );
    assert_eq!(flatten_line_breaks("ONE DOES NOT"), "ONE DOES NOT");
}

#[test]
fn non_positive_size_is_rejected() {
    let Some(mut engine) = system_engine() else {
        eprintln!("skipping: no system font available");
        return;
    };
    assert!(engine.shape_line("X", 0.0).is_err());
    assert!(engine.shape_line("X", f32::NAN).is_err());
}
