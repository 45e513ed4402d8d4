//! Moodboard application shell.
//!
//! Assembles the board controller with the software renderer and a
//! file-backed store. There is no windowing layer here; hosts (and the
//! export binary) drive the controller directly.

use kurbo::Size;
use moodboard_core::{Board, BoardController, FileStore, StorageError};
use moodboard_render::{export_png, Painter, RenderError};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Shell errors.
#[derive(Debug, Error)]
pub enum WorkbenchError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// A board wired to durable storage and a raster surface.
pub struct Workbench {
    controller: BoardController<FileStore, Painter>,
}

impl Workbench {
    /// Open the board persisted in the platform data directory.
    pub async fn open(viewport: Size) -> Result<Self, WorkbenchError> {
        let store = Arc::new(FileStore::default_location()?);
        Self::with_store(store, viewport).await
    }

    /// Open a board persisted under a specific directory.
    pub async fn open_at(state_dir: PathBuf, viewport: Size) -> Result<Self, WorkbenchError> {
        let store = Arc::new(FileStore::new(state_dir)?);
        Self::with_store(store, viewport).await
    }

    async fn with_store(store: Arc<FileStore>, viewport: Size) -> Result<Self, WorkbenchError> {
        let painter = Painter::new(
            viewport.width.max(1.0) as u32,
            viewport.height.max(1.0) as u32,
        )?;
        let mut controller = BoardController::new(store, painter, viewport);
        controller.bootstrap().await;
        Ok(Self { controller })
    }

    pub fn controller(&mut self) -> &mut BoardController<FileStore, Painter> {
        &mut self.controller
    }

    pub fn board(&self) -> &Board {
        self.controller.board()
    }

    /// Flatten the board at the current canvas size and encode it as PNG.
    pub fn export_png(&self) -> Result<Vec<u8>, WorkbenchError> {
        let viewport = self.controller.viewport();
        Ok(export_png(
            self.controller.board(),
            viewport.width.max(1.0) as u32,
            viewport.height.max(1.0) as u32,
            self.controller.renderer().font(),
        )?)
    }
}
