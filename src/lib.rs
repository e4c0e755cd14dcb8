//! mass-meme composites template or uploaded images with outlined captions and keeps a local
//! gallery of the results.
//!
//! The flow mirrors the editor UI:
//!
//! 1. **Select** a background through the [`SourceSelector`] (upload, catalog template, or a
//!    previously saved [`Artifact`]). Selections are sequence-stamped; stale decodes are dropped.
//! 2. **Compose** with the [`Compositor`]: background stretched to its own size, captions
//!    upper-cased, stroked then filled, anchored to the top and bottom edges.
//! 3. **Save** into the [`ArtifactStore`] (a JSON record behind a [`StorageBackend`]) or
//!    **download** the PNG.
//!
//! [`Editor`] owns the single [`EditingSession`] and is the entry point UI adapters dispatch to.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod catalog;
mod editor;
mod foundation;
mod gallery;
mod render;
mod session;
mod store;

/// Editor configuration from the environment.
pub mod config;

pub use assets::decode::{
    PNG_DATA_URI_PREFIX, data_uri_bytes, decode_data_uri, decode_image, encode_png,
    encode_png_data_uri,
};
pub use assets::source::{ImageSource, SourceResolver};
pub use catalog::model::{
    CatalogEntry, CatalogView, EMPTY_CATALOG_MESSAGE, Template, TemplateCatalog,
    TemplateSelection,
};
pub use config::EditorConfig;
pub use editor::controller::{DOWNLOAD_FILE_NAME, Download, Editor, EditorCommand, EditorEvent};
pub use foundation::core::{RasterImage, Rgba8Premul};
pub use foundation::error::{MemeError, MemeResult};
pub use gallery::view::{
    AlwaysConfirm, Confirm, DELETE_PROMPT, EMPTY_GALLERY_MESSAGE, Gallery, GalleryEntry,
    GalleryView, RemoveOutcome,
};
pub use render::compositor::{CaptionStyle, Compositor};
pub use render::text::{CaptionFont, FontSource, ShapedLine, TextLayoutEngine};
pub use session::editing::{CaptionPair, EditingSession, RenderedOutput, SourceOrigin};
pub use session::selector::{
    DecodedSelection, SelectionTicket, SourceRequest, SourceSelector, UploadedFile,
};
pub use store::artifact::{Artifact, ArtifactStore, Clock, SAVED_MEMES_KEY, SystemClock};
pub use store::backend::{FileStorage, MemoryStorage, StorageBackend};
