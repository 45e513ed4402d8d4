//! Board controller: owns the canonical scene, feeds events through the
//! interaction machine, triggers redraws, and schedules persistence after
//! every committed mutation.
//!
//! Outward side effects (opening a source URL, warning the user) are
//! surfaced as [`BoardEvent`]s for the embedding shell to act on; storage
//! failures are logged and never fatal — the in-memory scene stays
//! authoritative.

use crate::board::Board;
use crate::geometry::Frame;
use crate::input::{InputState, PointerEvent};
use crate::interaction::{DownOutcome, Interaction, TextAttributes};
use crate::item::{reference_text_size, text_label, Item, ItemId, ItemKind};
use crate::storage::{
    decode_items, encode_items, KvStore, StorageResult, ITEMS_KEY, SELECTION_KEY,
};
use kurbo::{Point, Size};
use std::sync::Arc;

/// Key that deletes the selected item.
pub const DELETE_KEY: &str = "Backspace";

/// Read-only view state handed to the renderer alongside the board.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneView {
    /// The selected item, if any; drives the selection decoration.
    pub selection: Option<ItemId>,
    /// Whether a transform gesture is active; drives the handle color.
    pub transforming: bool,
}

/// Seam to the render pipeline. The renderer gets a read-only view of the
/// scene; it never mutates item geometry.
pub trait RenderHost {
    /// Resize the backing surface. Content keeps absolute coordinates.
    fn resize(&mut self, width: u32, height: u32);

    /// Repaint the whole scene.
    fn redraw(&mut self, board: &Board, view: &SceneView);
}

/// Outward-facing side effects for the embedding shell.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    /// Open the item's source URL in a new context.
    OpenSource(String),
    /// The active selection changed.
    SelectionChanged(Option<ItemId>),
    /// A text item became the active selection; its editing attributes.
    TextSelected(TextAttributes),
    /// A storage operation failed; durability is degraded but the session
    /// continues from memory.
    PersistenceDegraded(String),
}

/// Ties an in-flight asset load to the board generation it started in, so a
/// decode that completes after a reset cannot resurrect a stale item.
#[derive(Debug, Clone, Copy)]
pub struct LoadTicket {
    epoch: u64,
}

/// Result of completing a staged image insertion.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(ItemId),
    /// The board generation changed while the asset was loading; the
    /// completion was discarded.
    Stale,
}

/// Orchestrates board, interaction, rendering and persistence.
pub struct BoardController<S, R> {
    board: Board,
    interaction: Interaction,
    input: InputState,
    store: Arc<S>,
    renderer: R,
    viewport: Size,
    fullscreen: bool,
    events: Vec<BoardEvent>,
}

impl<S: KvStore, R: RenderHost> BoardController<S, R> {
    pub fn new(store: Arc<S>, renderer: R, viewport: Size) -> Self {
        let mut controller = Self {
            board: Board::new(),
            interaction: Interaction::new(),
            input: InputState::new(),
            store,
            renderer,
            viewport,
            fullscreen: false,
            events: Vec::new(),
        };
        controller
            .renderer
            .resize(viewport.width.max(1.0) as u32, viewport.height.max(1.0) as u32);
        controller
    }

    /// Load the persisted scene and selection, then paint. Malformed or
    /// unreadable state is logged and skipped; the session starts empty.
    pub async fn bootstrap(&mut self) {
        match self.store.get(ITEMS_KEY).await {
            Ok(Some(json)) => match decode_items(&json) {
                Ok(items) => {
                    log::info!("restoring {} items from storage", items.len());
                    self.board.replace_all(items);
                }
                Err(e) => log::warn!("ignoring malformed saved board: {e}"),
            },
            Ok(None) => {}
            Err(e) => log::warn!("failed to load saved board: {e}"),
        }
        match self.store.get(SELECTION_KEY).await {
            Ok(Some(raw)) => {
                let id = ItemId::from(raw);
                if self.board.find(&id).is_some() {
                    self.interaction.set_selection(Some(id));
                }
            }
            Ok(None) => {}
            Err(e) => log::warn!("failed to load saved selection: {e}"),
        }
        self.redraw();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn selection(&self) -> Option<ItemId> {
        self.interaction.selection()
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Take the side effects accumulated since the last drain.
    pub fn drain_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    /// Pointer/touch down. Double-activation on an item with a source URL
    /// opens it without disturbing selection or gesture state.
    pub async fn on_pointer_down(&mut self, position: Point) {
        self.input
            .handle_pointer_event(&PointerEvent::Down { position });

        if self.input.is_double_click() {
            let url = self.board.topmost_at(position).and_then(|id| {
                self.board
                    .find(&id)
                    .and_then(|item| item.source_url().map(str::to_string))
            });
            if let Some(url) = url {
                self.events.push(BoardEvent::OpenSource(url));
                return;
            }
        }

        match self.interaction.pointer_down(&mut self.board, position) {
            DownOutcome::OpenSource(url) => {
                self.events.push(BoardEvent::OpenSource(url));
            }
            DownOutcome::TransformStarted { id } => {
                self.persist_selection(Some(&id)).await;
                self.redraw();
            }
            DownOutcome::DragStarted { id, text } => {
                self.persist_selection(Some(&id)).await;
                // Bringing the item to the front already changed the scene.
                self.persist_scene().await;
                self.events.push(BoardEvent::SelectionChanged(Some(id)));
                if let Some(attrs) = text {
                    self.events.push(BoardEvent::TextSelected(attrs));
                }
                self.redraw();
            }
            DownOutcome::SelectionCleared => {
                self.persist_selection(None).await;
                self.events.push(BoardEvent::SelectionChanged(None));
                self.redraw();
            }
        }
    }

    /// Pointer/touch move. Only repaints; nothing is persisted mid-gesture.
    pub fn on_pointer_move(&mut self, position: Point) {
        self.input
            .handle_pointer_event(&PointerEvent::Move { position });
        if self.interaction.pointer_move(&mut self.board, position) {
            self.redraw();
        }
    }

    /// Pointer/touch up. Commits and persists an active gesture.
    pub async fn on_pointer_up(&mut self, position: Point) {
        self.input.handle_pointer_event(&PointerEvent::Up { position });
        if self.interaction.pointer_up() {
            self.persist_scene().await;
        }
        self.redraw();
    }

    /// Keyboard input; only the delete gesture is recognized here.
    pub async fn on_key_down(&mut self, key: &str) {
        if key != DELETE_KEY {
            return;
        }
        if let Some(id) = self.interaction.delete_selected(&mut self.board) {
            log::debug!("deleted item {id}");
            self.persist_scene().await;
            self.persist_selection(None).await;
            self.events.push(BoardEvent::SelectionChanged(None));
            self.redraw();
        }
    }

    /// Explicit viewport input: resize the surface and repaint. Items keep
    /// their absolute coordinates.
    pub fn on_viewport_change(&mut self, width: f64, height: f64) {
        self.viewport = Size::new(width, height);
        self.renderer
            .resize(width.max(1.0) as u32, height.max(1.0) as u32);
        self.redraw();
    }

    /// Explicit fullscreen input; repaints.
    pub fn on_fullscreen_change(&mut self, fullscreen: bool) {
        self.fullscreen = fullscreen;
        self.redraw();
    }

    /// Start an asset load, capturing the current board generation. The
    /// actual decode happens outside the core; completion goes through
    /// [`finish_image_insert`](Self::finish_image_insert).
    pub fn begin_asset_load(&self) -> LoadTicket {
        LoadTicket {
            epoch: self.board.epoch(),
        }
    }

    /// Complete a staged image insertion. Discards the completion when the
    /// board generation moved on (e.g. a reset happened while decoding).
    pub async fn finish_image_insert(
        &mut self,
        ticket: LoadTicket,
        data: String,
        intrinsic_width: u32,
        intrinsic_height: u32,
        name: impl Into<String>,
        url: Option<String>,
    ) -> InsertOutcome {
        if ticket.epoch != self.board.epoch() {
            log::info!("discarding stale image load");
            return InsertOutcome::Stale;
        }
        let frame = place_within(
            self.viewport,
            f64::from(intrinsic_width.max(1)),
            f64::from(intrinsic_height.max(1)),
        );
        let item = Item::image(name, frame, data, url);
        let id = self.board.insert(item);
        self.interaction.set_selection(Some(id.clone()));
        self.persist_scene().await;
        self.persist_selection(Some(&id)).await;
        self.redraw();
        InsertOutcome::Inserted(id)
    }

    /// Add a text item, placed like any other insertion using its reference
    /// layout size as the intrinsic extent.
    pub async fn insert_text(&mut self, attrs: TextAttributes) -> ItemId {
        let intrinsic = reference_text_size(&attrs.text, attrs.weight, attrs.background.is_some());
        let frame = place_within(self.viewport, intrinsic.width, intrinsic.height);
        let item = Item::text(frame, attrs.text, attrs.color, attrs.background, attrs.weight);
        let id = self.board.insert(item);
        self.interaction.set_selection(Some(id.clone()));
        self.persist_scene().await;
        self.persist_selection(Some(&id)).await;
        self.redraw();
        id
    }

    /// Apply content edits to the selected text item. Returns false when the
    /// selection is not a text item.
    pub async fn apply_text_edit(&mut self, attrs: TextAttributes) -> bool {
        let Some(id) = self.interaction.selection() else {
            return false;
        };
        let edited = match self.board.find_mut(&id) {
            Some(item) if matches!(item.kind, ItemKind::Text { .. }) => {
                item.name = text_label(&attrs.text);
                item.kind = ItemKind::Text {
                    text: attrs.text,
                    color: attrs.color,
                    background: attrs.background,
                    weight: attrs.weight,
                };
                true
            }
            _ => false,
        };
        if edited {
            self.persist_scene().await;
            self.redraw();
        }
        edited
    }

    /// Serialize the scene for a backup file.
    pub fn export_backup(&self) -> StorageResult<String> {
        encode_items(self.board.items())
    }

    /// Replace the scene from a backup. The input is validated before
    /// anything is touched; a zero-item array explicitly clears the board.
    pub async fn restore_backup(&mut self, json: &str) -> StorageResult<usize> {
        let items = decode_items(json)?;
        let count = items.len();
        self.board.replace_all(items);
        self.interaction.set_selection(None);
        self.persist_scene().await;
        self.persist_selection(None).await;
        self.redraw();
        Ok(count)
    }

    /// Clear the board and both persisted keys.
    pub async fn reset(&mut self) {
        self.board.clear();
        self.interaction.set_selection(None);
        if let Err(e) = self.store.remove(ITEMS_KEY).await {
            log::warn!("failed to clear saved board: {e}");
            self.events.push(BoardEvent::PersistenceDegraded(e.to_string()));
        }
        if let Err(e) = self.store.remove(SELECTION_KEY).await {
            log::warn!("failed to clear saved selection: {e}");
            self.events.push(BoardEvent::PersistenceDegraded(e.to_string()));
        }
        self.redraw();
    }

    fn redraw(&mut self) {
        let view = SceneView {
            selection: self.interaction.selection(),
            transforming: self.interaction.is_transforming(),
        };
        self.renderer.redraw(&self.board, &view);
    }

    async fn persist_scene(&mut self) {
        match encode_items(self.board.items()) {
            Ok(json) => {
                if let Err(e) = self.store.set(ITEMS_KEY, &json).await {
                    log::warn!("failed to persist board items: {e}");
                    self.events.push(BoardEvent::PersistenceDegraded(e.to_string()));
                }
            }
            Err(e) => {
                log::warn!("failed to serialize board items: {e}");
                self.events.push(BoardEvent::PersistenceDegraded(e.to_string()));
            }
        }
    }

    async fn persist_selection(&mut self, selection: Option<&ItemId>) {
        let result = match selection {
            Some(id) => self.store.set(SELECTION_KEY, id.as_str()).await,
            None => self.store.remove(SELECTION_KEY).await,
        };
        if let Err(e) = result {
            log::warn!("failed to persist selection: {e}");
            self.events.push(BoardEvent::PersistenceDegraded(e.to_string()));
        }
    }
}

/// Initial placement: centered, scaled to fit within half the canvas extent
/// on each axis, never upscaled past 1:1.
fn place_within(viewport: Size, intrinsic_width: f64, intrinsic_height: f64) -> Frame {
    let scale = (viewport.width / intrinsic_width / 2.0)
        .min(viewport.height / intrinsic_height / 2.0)
        .min(1.0);
    let width = intrinsic_width * scale;
    let height = intrinsic_height * scale;
    Frame::new(
        (viewport.width - width) / 2.0,
        (viewport.height - height) / 2.0,
        width,
        height,
    )
}
