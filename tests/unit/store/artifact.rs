use std::{cell::Cell, rc::Rc};

use super::*;
use crate::{
    foundation::core::{RasterImage, Rgba8Premul},
    session::editing::{CaptionPair, RenderedOutput, SourceOrigin},
    store::backend::MemoryStorage,
};

fn rendered_session(top: &str, bottom: &str, template: Option<&str>) -> EditingSession {
    let img = RasterImage::solid(4, 3, Rgba8Premul::opaque(40, 80, 120)).unwrap();
    let origin = match template {
        Some(id) => SourceOrigin::Template { id: id.to_string() },
        None => SourceOrigin::Upload {
            file_name: "photo.jpg".to_string(),
        },
    };
    let mut s = EditingSession::new();
    s.replace_source(
        img.clone(),
        CaptionPair::new(top, bottom),
        template.map(str::to_string),
        origin,
    );
    s.set_output(RenderedOutput {
        image: img,
        captions: CaptionPair::new(top, bottom),
    });
    s
}

fn fixed_clock(ms: u64) -> impl Clock {
    move || ms
}

#[test]
fn empty_store_lists_nothing() {
    let store = ArtifactStore::new(MemoryStorage::new());
    assert!(store.list().is_empty());
    assert!(store.get(1).is_none());
}

#[test]
fn create_without_output_is_a_noop() {
    let mut store = ArtifactStore::new(MemoryStorage::new());
    let s = EditingSession::new();
    assert!(store.create(&s).unwrap().is_none());
    assert_eq!(store.storage().get_item(SAVED_MEMES_KEY).unwrap(), None);
}

#[test]
fn create_appends_with_captions_template_and_png() {
    let mut store = ArtifactStore::with_clock(MemoryStorage::new(), fixed_clock(1_000));
    let a = store
        .create(&rendered_session("top", "bottom", Some("t1")))
        .unwrap()
        .unwrap();

    assert_eq!(a.id, 1_000);
    assert_eq!((a.top_text.as_str(), a.bottom_text.as_str()), ("top", "bottom"));
    assert_eq!(a.template_id.as_deref(), Some("t1"));
    assert!(a.encoded_image.starts_with("data:image/png;base64,"));

    let decoded = decode::decode_data_uri(&a.encoded_image).unwrap();
    assert_eq!(decoded.dimensions(), (4, 3));
    assert_eq!(store.list(), vec![a]);
}

#[test]
fn ids_strictly_increase_even_when_the_clock_stalls() {
    let mut store = ArtifactStore::with_clock(MemoryStorage::new(), fixed_clock(500));
    let s = rendered_session("a", "b", None);
    let ids: Vec<u64> = (0..3)
        .map(|_| store.create(&s).unwrap().unwrap().id)
        .collect();
    assert_eq!(ids, [500, 501, 502]);
}

#[test]
fn ids_exceed_persisted_ids_from_a_previous_run() {
    let mut storage = MemoryStorage::new();
    storage
        .set_item(
            SAVED_MEMES_KEY,
            r#"[{"id":9000,"topText":"x","bottomText":"y","imageUrl":"data:image/png;base64,AA==","templateId":null}]"#,
        )
        .unwrap();
    let mut store = ArtifactStore::with_clock(storage, fixed_clock(10));
    let a = store.create(&rendered_session("", "", None)).unwrap().unwrap();
    assert_eq!(a.id, 9001);
    assert_eq!(store.list().len(), 2);
}

#[test]
fn persisted_format_uses_camel_case_field_names() {
    let mut store = ArtifactStore::with_clock(MemoryStorage::new(), fixed_clock(42));
    store.create(&rendered_session("t", "b", None)).unwrap();
    let raw = store.storage().get_item(SAVED_MEMES_KEY).unwrap().unwrap();
    let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let first = &v[0];
    assert_eq!(first["id"], 42);
    assert_eq!(first["topText"], "t");
    assert_eq!(first["bottomText"], "b");
    assert!(first["imageUrl"].as_str().unwrap().starts_with("data:image/png"));
    assert!(first["templateId"].is_null());
}

#[test]
fn delete_removes_only_the_target_and_is_idempotent() {
    let now = Rc::new(Cell::new(100u64));
    let clock_now = Rc::clone(&now);
    let mut store = ArtifactStore::with_clock(MemoryStorage::new(), move || clock_now.get());

    let a = store.create(&rendered_session("a", "", None)).unwrap().unwrap();
    now.set(200);
    let b = store.create(&rendered_session("b", "", None)).unwrap().unwrap();
    now.set(300);
    let c = store.create(&rendered_session("c", "", None)).unwrap().unwrap();

    assert!(store.delete(b.id).unwrap());
    assert_eq!(store.list(), vec![a.clone(), c.clone()]);

    assert!(!store.delete(b.id).unwrap());
    assert!(!store.delete(12345).unwrap());
    assert_eq!(store.list(), vec![a, c]);
}

#[test]
fn malformed_record_reads_as_empty() {
    let mut storage = MemoryStorage::new();
    storage.set_item(SAVED_MEMES_KEY, "{not json").unwrap();
    let store = ArtifactStore::new(storage);
    assert!(store.list().is_empty());

    let mut storage = MemoryStorage::new();
    storage.set_item(SAVED_MEMES_KEY, "null").unwrap();
    assert!(ArtifactStore::new(storage).list().is_empty());
}

#[test]
fn delete_on_malformed_record_does_not_overwrite_it() {
    let mut storage = MemoryStorage::new();
    storage.set_item(SAVED_MEMES_KEY, "{not json").unwrap();
    let mut store = ArtifactStore::new(storage);
    assert!(!store.delete(1).unwrap());
    assert_eq!(
        store.storage().get_item(SAVED_MEMES_KEY).unwrap().as_deref(),
        Some("{not json")
    );
}

#[test]
fn quota_failure_leaves_durable_state_unchanged() {
    let mut store = ArtifactStore::with_clock(MemoryStorage::with_quota(64), fixed_clock(7));
    let err = store
        .create(&rendered_session("top", "bottom", None))
        .unwrap_err();
    assert!(matches!(err, MemeError::Persistence(_)));
    assert!(store.list().is_empty());
    assert_eq!(store.storage().get_item(SAVED_MEMES_KEY).unwrap(), None);
}

#[test]
fn saved_artifact_is_a_snapshot_not_a_live_view() {
    let mut store = ArtifactStore::with_clock(MemoryStorage::new(), fixed_clock(1));
    let mut s = rendered_session("before", "x", None);
    let saved = store.create(&s).unwrap().unwrap();

    s.set_top_text("after");
    assert_eq!(store.get(saved.id).unwrap().top_text, "before");
}

/// Holds a real record but fails every read.
struct UnreadableStorage {
    inner: MemoryStorage,
}

impl StorageBackend for UnreadableStorage {
    fn get_item(&self, _key: &str) -> MemeResult<Option<String>> {
        Err(MemeError::persistence("device not ready"))
    }

    fn set_item(&mut self, key: &str, value: &str) -> MemeResult<()> {
        self.inner.set_item(key, value)
    }
}

#[test]
fn read_failure_never_rewrites_the_record() {
    let mut seeded = ArtifactStore::with_clock(MemoryStorage::new(), fixed_clock(10));
    seeded.create(&rendered_session("a", "", None)).unwrap();
    seeded.create(&rendered_session("b", "", None)).unwrap();
    let before = seeded.storage().get_item(SAVED_MEMES_KEY).unwrap();

    let storage = UnreadableStorage {
        inner: seeded.storage().clone(),
    };
    let mut store = ArtifactStore::with_clock(storage, fixed_clock(20));

    let err = store.create(&rendered_session("c", "", None)).unwrap_err();
    assert!(matches!(err, MemeError::Persistence(_)));
    let err = store.delete(10).unwrap_err();
    assert!(matches!(err, MemeError::Persistence(_)));

    assert!(store.list().is_empty());
    assert_eq!(store.storage().inner.get_item(SAVED_MEMES_KEY).unwrap(), before);
}

#[test]
fn exhausted_id_space_is_an_error_not_a_wrap() {
    let mut storage = MemoryStorage::new();
    storage
        .set_item(
            SAVED_MEMES_KEY,
            &format!(r#"[{{"id":{},"imageUrl":"data:,"}}]"#, u64::MAX),
        )
        .unwrap();
    let mut store = ArtifactStore::with_clock(storage, fixed_clock(5));

    let err = store.create(&rendered_session("x", "", None)).unwrap_err();
    assert!(matches!(err, MemeError::Persistence(_)));
    assert_eq!(store.list().len(), 1);
    assert_eq!(store.list()[0].id, u64::MAX);
}

#[test]
fn create_over_malformed_record_starts_a_fresh_collection() {
    let mut storage = MemoryStorage::new();
    storage.set_item(SAVED_MEMES_KEY, "{not json").unwrap();
    let mut store = ArtifactStore::with_clock(storage, fixed_clock(3));
    let a = store.create(&rendered_session("t", "b", None)).unwrap().unwrap();
    assert_eq!(store.list(), vec![a]);
}
