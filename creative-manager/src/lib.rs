#![deny(rust_2018_idioms)]
#![deny(clippy::all)]
//! Editing, persisting and exporting a creative draft.
//!
//! The [`DraftStore`] holds the draft, the [`Manager`] drives it through the remote
//! [`gateway::Gateway`] and the [`autosave`] keeps a snapshot of it in the [`LocalStorage`].

pub use self::{
    codec::{CodecError, RawFile},
    export::{Bundle, BundleAssembler, ExportError, PreviewSurface, SectionWarning},
    manager::{Manager, SharedStore},
    storage::{FileStorage, LocalStorage, MemoryStorage, StorageError},
    store::{DraftStore, Revision},
};

pub mod autosave;
pub mod codec;
pub mod export;
pub mod identity;
pub mod ingest;
pub mod manager;
pub mod storage;
pub mod store;

#[cfg(test)]
mod test_util;
