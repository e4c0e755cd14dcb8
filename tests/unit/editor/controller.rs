use super::*;
use crate::{
    catalog::model::Template,
    foundation::core::Rgba8Premul,
    gallery::view::AlwaysConfirm,
    render::{
        compositor::CaptionStyle,
        text::{CaptionFont, FontSource},
    },
    session::editing::{CaptionPair, SourceOrigin},
    store::backend::MemoryStorage,
};

const RED: Rgba8Premul = Rgba8Premul {
    r: 220,
    g: 20,
    b: 20,
    a: 255,
};
const BLUE: Rgba8Premul = Rgba8Premul {
    r: 20,
    g: 20,
    b: 220,
    a: 255,
};

fn png(w: u32, h: u32, color: Rgba8Premul) -> Vec<u8> {
    decode::encode_png(&RasterImage::solid(w, h, color).unwrap()).unwrap()
}

fn upload(name: &str, w: u32, h: u32, color: Rgba8Premul) -> UploadedFile {
    UploadedFile {
        file_name: name.to_string(),
        bytes: png(w, h, color),
    }
}

fn blank_template(id: &str, color: Rgba8Premul) -> Template {
    Template {
        id: id.to_string(),
        name: id.to_string(),
        image_source: decode::encode_png_data_uri(&RasterImage::solid(5, 5, color).unwrap())
            .unwrap(),
        default_top_text: String::new(),
        default_bottom_text: String::new(),
    }
}

fn editor_with(font: FontSource) -> Editor<MemoryStorage> {
    let catalog = TemplateCatalog::new(
        vec![blank_template("t1", RED), blank_template("t2", BLUE)],
        ".",
    )
    .unwrap();
    let compositor = Compositor::new(CaptionStyle::default(), font).unwrap();
    Editor::new(catalog, compositor, ArtifactStore::new(MemoryStorage::new()))
}

fn editor() -> Editor<MemoryStorage> {
    editor_with(FontSource::System)
}

fn editor_with_font() -> Option<Editor<MemoryStorage>> {
    let font = CaptionFont::discover_system().ok()?;
    Some(editor_with(FontSource::Bytes(
        std::sync::Arc::new(font.bytes().to_vec()),
        font.index(),
    )))
}

fn center(editor: &Editor<MemoryStorage>) -> Rgba8Premul {
    let img = editor.session().output().unwrap().image.clone();
    img.pixel(img.width() / 2, img.height() / 2).unwrap()
}

#[test]
fn nothing_to_save_or_download_before_a_source() {
    let mut e = editor();
    assert!(e.generate().unwrap().is_none());
    assert!(e.save().unwrap().is_none());
    assert!(e.download().unwrap().is_none());
    assert!(e.store().list().is_empty());
}

#[test]
fn upload_renders_at_image_size() {
    let mut e = editor();
    assert!(e.upload(upload("photo.jpg", 80, 60, RED)).unwrap());

    let out = e.session().output().unwrap();
    assert_eq!(out.image.dimensions(), (80, 60));
    assert!(e.session().is_uploaded());
    assert_eq!(e.session().template_id(), None);
}

#[test]
fn template_and_upload_clear_each_others_markers() {
    let mut e = editor();
    e.upload(upload("photo.jpg", 8, 8, RED)).unwrap();
    assert!(e.session().is_uploaded());

    e.pick_template("t2").unwrap();
    assert!(!e.session().is_uploaded());
    assert_eq!(e.session().template_id(), Some("t2"));
    let CatalogView::Entries(entries) = e.templates() else {
        panic!("expected template entries");
    };
    assert!(entries.iter().any(|t| t.id == "t2" && t.selected));

    e.upload(upload("again.png", 8, 8, BLUE)).unwrap();
    assert!(e.session().is_uploaded());
    assert_eq!(e.session().template_id(), None);
    let CatalogView::Entries(entries) = e.templates() else {
        panic!("expected template entries");
    };
    assert!(entries.iter().all(|t| !t.selected));
}

#[test]
fn stale_decode_cannot_overwrite_newer_selection() {
    let mut e = editor();
    let slow = e.begin_selection(SourceRequest::Upload(upload("slow.png", 6, 6, RED)));
    let fast = e.begin_selection(SourceRequest::Template {
        id: "t2".to_string(),
    });

    let fast = e.decode_selection(fast).unwrap();
    assert!(e.commit_selection(fast).unwrap());

    let slow = e.decode_selection(slow).unwrap();
    assert!(!e.commit_selection(slow).unwrap());

    assert_eq!(e.session().template_id(), Some("t2"));
    let c = center(&e);
    assert!(c.b > c.r);

    let event = e
        .dispatch(EditorCommand::Generate, &mut AlwaysConfirm)
        .unwrap();
    assert!(matches!(event, EditorEvent::Rendered(Some(_))));
}

#[test]
fn decode_failure_leaves_session_untouched() {
    let mut e = editor();
    e.upload(upload("ok.png", 4, 4, RED)).unwrap();
    let before = e.session().output().unwrap().clone();

    let err = e
        .upload(UploadedFile {
            file_name: "broken.jpg".to_string(),
            bytes: b"not an image".to_vec(),
        })
        .unwrap_err();
    assert!(err.is_recoverable());
    assert_eq!(e.session().output(), Some(&before));
    assert!(e.session().is_uploaded());

    assert!(e.pick_template("unknown").is_err());
    assert_eq!(e.session().output(), Some(&before));
}

#[test]
fn save_and_reload_roundtrips_the_composited_image() {
    let mut e = editor();
    e.pick_template("t1").unwrap();
    let original = e.session().output().unwrap().image.clone();

    let saved = e.save().unwrap().unwrap();
    assert_eq!(saved.template_id.as_deref(), Some("t1"));
    assert_eq!(e.gallery().len(), 1);

    e.upload(upload("other.png", 3, 3, BLUE)).unwrap();
    assert!(e.pick_saved(saved.id).unwrap());
    assert_eq!(
        e.session().origin(),
        Some(&SourceOrigin::Saved {
            artifact_id: saved.id
        })
    );
    assert_eq!(e.session().template_id(), None);

    let reloaded = &e.session().output().unwrap().image;
    assert_eq!(reloaded.dimensions(), original.dimensions());
    let max_diff = reloaded
        .as_premul_bytes()
        .iter()
        .zip(original.as_premul_bytes())
        .map(|(a, b)| a.abs_diff(*b))
        .max()
        .unwrap();
    assert!(max_diff <= 2);
}

#[test]
fn picking_an_unknown_saved_meme_is_an_error() {
    let mut e = editor();
    assert!(e.pick_saved(404).is_err());
    assert!(e.session().image().is_none());
}

#[test]
fn remove_respects_confirmation_and_leaves_session_alone() {
    let mut e = editor();
    e.upload(upload("photo.png", 4, 4, RED)).unwrap();
    let saved = e.save().unwrap().unwrap();
    let origin = e.session().origin().cloned();

    let mut decline = |_: &str| false;
    assert_eq!(
        e.remove_saved(saved.id, &mut decline).unwrap(),
        RemoveOutcome::Declined
    );
    assert_eq!(e.gallery().len(), 1);

    let event = e
        .dispatch(EditorCommand::RemoveSaved(saved.id), &mut AlwaysConfirm)
        .unwrap();
    assert!(matches!(event, EditorEvent::Removed(RemoveOutcome::Deleted)));
    assert!(e.gallery().is_empty());
    assert_eq!(e.session().origin().cloned(), origin);

    let mut never_asked = |_: &str| -> bool { panic!("no prompt for a missing meme") };
    assert_eq!(
        e.remove_saved(saved.id, &mut never_asked).unwrap(),
        RemoveOutcome::NotFound
    );
}

#[test]
fn download_is_a_png_named_for_the_app() {
    let mut e = editor();
    e.upload(upload("photo.png", 7, 5, RED)).unwrap();
    let event = e
        .dispatch(EditorCommand::Download, &mut AlwaysConfirm)
        .unwrap();
    let EditorEvent::Download(download) = event else {
        panic!("expected a download");
    };
    assert_eq!(download.file_name, DOWNLOAD_FILE_NAME);
    let img = decode::decode_image(&download.png).unwrap();
    assert_eq!(img.dimensions(), (7, 5));
}

#[test]
fn saved_captions_match_the_moment_of_saving() {
    let Some(mut e) = editor_with_font() else {
        eprintln!("skipping: no system font available");
        return;
    };
    e.upload(upload("photo.png", 400, 300, RED)).unwrap();
    e.set_top_text("first").unwrap();
    let saved = e.save().unwrap().unwrap();
    let snapshot = e.session().output().unwrap().image.clone();

    e.set_top_text("second").unwrap();
    let stored = e.store().get(saved.id).unwrap();
    assert_eq!(stored.top_text, "first");
    assert_eq!(decode::decode_data_uri(&stored.encoded_image).unwrap(), snapshot);
}

#[test]
fn save_redraws_stale_output_first() {
    let Some(mut e) = editor_with_font() else {
        eprintln!("skipping: no system font available");
        return;
    };
    e.upload(upload("photo.png", 300, 200, BLUE)).unwrap();
    e.dispatch(
        EditorCommand::SetBottomText("caption".to_string()),
        &mut AlwaysConfirm,
    )
    .unwrap();
    assert!(e.session().output_is_current());

    let saved = e.save().unwrap().unwrap();
    assert_eq!(
        CaptionPair::new(saved.top_text, saved.bottom_text),
        CaptionPair::new("", "caption")
    );
}

#[test]
fn dispatch_routes_commands_to_events() {
    let mut e = editor();
    let mut confirm = AlwaysConfirm;

    assert!(matches!(
        e.dispatch(EditorCommand::Save, &mut confirm).unwrap(),
        EditorEvent::NothingToSave
    ));
    assert!(matches!(
        e.dispatch(EditorCommand::Download, &mut confirm).unwrap(),
        EditorEvent::NothingToDownload
    ));
    assert!(matches!(
        e.dispatch(EditorCommand::PickTemplate("t1".to_string()), &mut confirm)
            .unwrap(),
        EditorEvent::SelectionCommitted
    ));
    assert!(matches!(
        e.dispatch(EditorCommand::Generate, &mut confirm).unwrap(),
        EditorEvent::Rendered(Some(_))
    ));

    let EditorEvent::Saved(artifact) = e.dispatch(EditorCommand::Save, &mut confirm).unwrap()
    else {
        panic!("expected a saved meme");
    };
    assert_eq!(artifact.template_id.as_deref(), Some("t1"));

    assert!(matches!(
        e.dispatch(EditorCommand::RemoveSaved(artifact.id), &mut confirm)
            .unwrap(),
        EditorEvent::Removed(RemoveOutcome::Deleted)
    ));
    assert!(matches!(
        e.dispatch(EditorCommand::RemoveSaved(artifact.id), &mut confirm)
            .unwrap(),
        EditorEvent::Removed(RemoveOutcome::NotFound)
    ));
}
