//! End-to-end pipeline tests: deterministic rasterization, export parity,
//! and the full controller-to-pixels path.

use image::{DynamicImage, Rgba as ImageRgba, RgbaImage};
use kurbo::{Point, Size};
use moodboard_core::{
    Board, BoardController, FontWeight, Frame, InsertOutcome, Item, MemoryStore, Rgba, SceneView,
    RenderHost,
};
use moodboard_render::{decode_image, encode_asset, export_png, flatten, Painter};
use std::future::Future;
use std::sync::Arc;
use tiny_skia::Color;

fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => return result,
            Poll::Pending => {}
        }
    }
}

fn png_bytes(image: RgbaImage) -> Vec<u8> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut buffer, image::ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

fn solid_asset(width: u32, height: u32, rgba: [u8; 4]) -> String {
    encode_asset(&png_bytes(RgbaImage::from_pixel(width, height, ImageRgba(rgba))))
}

fn image_item(frame: Frame, asset: String) -> Item {
    Item::image("img", frame, asset, None)
}

fn no_selection() -> SceneView {
    SceneView {
        selection: None,
        transforming: false,
    }
}

fn sample(pixmap: &tiny_skia::Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
    let c = pixmap.pixel(x, y).unwrap().demultiply();
    (c.red(), c.green(), c.blue(), c.alpha())
}

#[test]
fn draw_is_idempotent() {
    let mut board = Board::new();
    board.insert(image_item(
        Frame::new(10.0, 10.0, 60.0, 40.0),
        solid_asset(30, 20, [200, 40, 40, 255]),
    ));
    let mut rotated = Frame::new(50.0, 30.0, 50.0, 50.0);
    rotated.rotation = 0.7;
    board.insert(image_item(rotated, solid_asset(10, 10, [40, 200, 40, 255])));
    board.insert(Item::text(
        Frame::new(20.0, 70.0, 90.0, 30.0),
        "pin this",
        Rgba::BLACK,
        Some(Rgba::new(255, 250, 200, 255)),
        FontWeight::Normal,
    ));

    let mut painter = Painter::new(160, 120).unwrap();
    painter.draw(&board, &no_selection());
    let first = painter.pixmap().data().to_vec();
    painter.draw(&board, &no_selection());
    assert_eq!(first, painter.pixmap().data());
}

#[test]
fn export_matches_preview_pixel_for_pixel() {
    let mut board = Board::new();
    board.insert(image_item(
        Frame::new(5.0, 5.0, 50.0, 50.0),
        solid_asset(25, 25, [10, 90, 220, 255]),
    ));
    let mut tilted = Frame::new(40.0, 20.0, 40.0, 30.0);
    tilted.rotation = -0.4;
    board.insert(Item::text(
        tilted,
        "hello",
        Rgba::new(20, 20, 20, 255),
        None,
        FontWeight::Bold,
    ));

    let mut painter = Painter::new(120, 90).unwrap();
    painter.set_background(Color::WHITE);
    painter.draw(&board, &no_selection());

    let exported = flatten(&board, 120, 90, painter.font()).unwrap();
    assert_eq!(painter.pixmap().data(), exported.data());
}

#[test]
fn export_background_is_opaque_white() {
    let board = Board::new();
    let pixmap = flatten(&board, 16, 16, None).unwrap();
    for y in 0..16 {
        for x in 0..16 {
            assert_eq!(sample(&pixmap, x, y), (255, 255, 255, 255));
        }
    }
}

#[test]
fn later_items_paint_on_top() {
    let frame = Frame::new(10.0, 10.0, 40.0, 40.0);
    let red = solid_asset(8, 8, [220, 30, 30, 255]);
    let blue = solid_asset(8, 8, [30, 30, 220, 255]);

    let mut board = Board::new();
    board.insert(image_item(frame, red.clone()));
    board.insert(image_item(frame, blue.clone()));
    let pixmap = flatten(&board, 64, 64, None).unwrap();
    let (r, _, b, _) = sample(&pixmap, 30, 30);
    assert!(b > r, "expected the later (blue) item on top");

    // Bring the red item forward and the overlap flips.
    let mut board = Board::new();
    let red_id = board.insert(image_item(frame, red));
    board.insert(image_item(frame, blue));
    board.bring_to_front(&red_id);
    let pixmap = flatten(&board, 64, 64, None).unwrap();
    let (r, _, b, _) = sample(&pixmap, 30, 30);
    assert!(r > b, "expected red on top after bring_to_front");
}

#[test]
fn rotation_by_half_turn_flips_content() {
    // Left half red, right half green.
    let source = RgbaImage::from_fn(40, 40, |x, _| {
        if x < 20 {
            ImageRgba([220, 30, 30, 255])
        } else {
            ImageRgba([30, 220, 30, 255])
        }
    });
    let asset = encode_asset(&png_bytes(source));

    let mut board = Board::new();
    let id = board.insert(image_item(Frame::new(10.0, 20.0, 40.0, 40.0), asset));

    let pixmap = flatten(&board, 80, 80, None).unwrap();
    let (r, g, _, _) = sample(&pixmap, 25, 40);
    assert!(r > g, "left side should be red before rotation");

    board.find_mut(&id).unwrap().frame.rotation = std::f64::consts::PI;
    let pixmap = flatten(&board, 80, 80, None).unwrap();
    let (r, g, _, _) = sample(&pixmap, 25, 40);
    assert!(g > r, "left side should be green after a half turn");
}

#[test]
fn selection_decoration_appears_only_in_preview() {
    let mut board = Board::new();
    let id = board.insert(image_item(
        Frame::new(20.0, 20.0, 40.0, 40.0),
        solid_asset(8, 8, [128, 128, 128, 255]),
    ));

    let mut painter = Painter::new(100, 100).unwrap();
    painter.set_background(Color::WHITE);
    painter.draw(&board, &no_selection());
    let undecorated = painter.pixmap().data().to_vec();

    painter.draw(
        &board,
        &SceneView {
            selection: Some(id),
            transforming: false,
        },
    );
    let decorated = painter.pixmap().data().to_vec();
    assert_ne!(undecorated, decorated);

    // The export ignores selection entirely.
    let exported = flatten(&board, 100, 100, painter.font()).unwrap();
    assert_eq!(undecorated, exported.data());
}

#[test]
fn transforming_handle_changes_color() {
    let mut board = Board::new();
    let id = board.insert(image_item(
        Frame::new(20.0, 20.0, 40.0, 40.0),
        solid_asset(8, 8, [128, 128, 128, 255]),
    ));
    let mut painter = Painter::new(100, 100).unwrap();

    painter.draw(
        &board,
        &SceneView {
            selection: Some(id.clone()),
            transforming: false,
        },
    );
    let idle = painter.pixmap().data().to_vec();
    painter.draw(
        &board,
        &SceneView {
            selection: Some(id),
            transforming: true,
        },
    );
    assert_ne!(idle, painter.pixmap().data());
}

#[test]
fn broken_assets_are_skipped_not_fatal() {
    let mut board = Board::new();
    board.insert(Item::image(
        "broken",
        Frame::new(10.0, 10.0, 30.0, 30.0),
        "bm90IGFuIGltYWdl".to_string(),
        None,
    ));
    let pixmap = flatten(&board, 50, 50, None).unwrap();
    // Nothing was painted over the white background.
    assert_eq!(sample(&pixmap, 25, 25), (255, 255, 255, 255));
}

#[test]
fn resize_reallocates_the_surface() {
    let mut painter = Painter::new(30, 30).unwrap();
    painter.resize(50, 70);
    assert_eq!(painter.width(), 50);
    assert_eq!(painter.height(), 70);
    // Degenerate sizes clamp to one pixel instead of failing.
    painter.resize(0, 0);
    assert_eq!(painter.width(), 1);
    assert_eq!(painter.height(), 1);
}

#[test]
fn controller_drives_pixels_end_to_end() {
    let bytes = png_bytes(RgbaImage::from_pixel(200, 100, ImageRgba([200, 30, 30, 255])));
    let decoded = decode_image(&bytes).unwrap();

    let store = Arc::new(MemoryStore::new());
    let painter = Painter::new(400, 300).unwrap();
    let mut controller = BoardController::new(store, painter, Size::new(400.0, 300.0));

    let ticket = controller.begin_asset_load();
    let outcome = block_on(controller.finish_image_insert(
        ticket,
        encode_asset(&bytes),
        decoded.width,
        decoded.height,
        "red.png",
        None,
    ));
    let id = match outcome {
        InsertOutcome::Inserted(id) => id,
        InsertOutcome::Stale => panic!("insert went stale"),
    };

    // 200x100 in a 400x300 viewport: fit-to-half keeps it at 200x100,
    // centered at (100, 100).
    let frame = controller.board().find(&id).unwrap().frame;
    assert_eq!(frame.x, 100.0);
    assert_eq!(frame.y, 100.0);

    // The surface now shows the item where the scene model says it is.
    let (r, g, _, _) = {
        let c = controller
            .renderer()
            .pixmap()
            .pixel(200, 150)
            .unwrap()
            .demultiply();
        (c.red(), c.green(), c.blue(), c.alpha())
    };
    assert!(r > 150 && g < 100);

    // Drag and verify the export shows the item at the new position.
    block_on(controller.on_pointer_down(Point::new(200.0, 150.0)));
    controller.on_pointer_move(Point::new(260.0, 150.0));
    block_on(controller.on_pointer_up(Point::new(260.0, 150.0)));

    let png = export_png(controller.board(), 400, 300, None).unwrap();
    assert_eq!(&png[0..4], &[137, 80, 78, 71]);

    let exported = flatten(controller.board(), 400, 300, None).unwrap();
    let (r, _, _, _) = sample(&exported, 260, 150);
    assert!(r > 150, "moved item should cover the new center");
    let left_edge = sample(&exported, 110, 150);
    assert_eq!(left_edge, (255, 255, 255, 255), "old left edge is now bare");
}
