//! Moodboard core.
//!
//! Platform-agnostic scene model, geometry kernel, interaction state
//! machine and board controller for a free-form visual board. Rendering
//! and asset decoding live behind narrow seams ([`controller::RenderHost`]
//! and the staged-insert API) so the core stays free of raster
//! dependencies.

pub mod board;
pub mod controller;
pub mod geometry;
pub mod input;
pub mod interaction;
pub mod item;
pub mod storage;

pub use board::Board;
pub use controller::{
    BoardController, BoardEvent, InsertOutcome, LoadTicket, RenderHost, SceneView, DELETE_KEY,
};
pub use geometry::{Frame, HANDLE_SIZE, LINK_GLYPH_SIZE, MIN_ITEM_SIZE};
pub use input::{InputState, PointerEvent};
pub use interaction::{DownOutcome, Interaction, TextAttributes};
pub use item::{FontWeight, Item, ItemId, ItemKind, Rgba};
pub use storage::{
    FileStore, KvStore, MemoryStore, StorageError, StorageResult, ITEMS_KEY, SELECTION_KEY,
};
