use sketchnote_core::{
    CanvasState, CompositeMode, CoreConfig, PixelBuffer, PointerAction, PointerEvent, PointerId,
    Rgba, StrokeCanvas,
};

fn ready_canvas(width: u32, height: u32) -> StrokeCanvas {
    let mut canvas = StrokeCanvas::new(&CoreConfig::default());
    assert!(canvas.resize(width, height));
    canvas
}

fn draw_line(canvas: &mut StrokeCanvas, from: (f32, f32), to: (f32, f32)) {
    assert!(canvas.on_pointer_down(from.0, from.1));
    assert!(canvas.on_pointer_move((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0));
    assert!(canvas.on_pointer_up(to.0, to.1));
}

fn pixel(canvas: &StrokeCanvas, x: u32, y: u32) -> Rgba {
    canvas.snapshot().unwrap().pixel(x, y).unwrap()
}

#[test]
fn first_resize_allocates_transparent_surface() {
    let mut canvas = StrokeCanvas::new(&CoreConfig::default());
    assert_eq!(canvas.state(), CanvasState::Uninitialized);

    assert!(canvas.resize(40, 30));

    assert_eq!(canvas.state(), CanvasState::Ready);
    assert_eq!(canvas.size(), Some((40, 30)));
    assert!(canvas.snapshot().unwrap().is_fully_transparent());
}

#[test]
fn committed_stroke_uses_paint_color() {
    let mut canvas = ready_canvas(40, 40);
    canvas.set_paint_color(Rgba::RED);

    draw_line(&mut canvas, (5.0, 20.0), (35.0, 20.0));

    assert_eq!(pixel(&canvas, 20, 20), Rgba::RED);
    assert_eq!(pixel(&canvas, 20, 2), Rgba::TRANSPARENT);
}

#[test]
fn stroke_is_not_committed_before_pointer_up() {
    let mut canvas = ready_canvas(40, 40);

    assert!(canvas.on_pointer_down(5.0, 20.0));
    assert!(canvas.on_pointer_move(35.0, 20.0));

    assert!(canvas.has_pending_stroke());
    assert!(canvas.snapshot().unwrap().is_fully_transparent());
    let preview = canvas.render_preview().unwrap();
    assert_eq!(preview.pixel(20, 20), Some(Rgba::BLACK));

    assert!(canvas.on_pointer_up(35.0, 20.0));
    assert!(!canvas.has_pending_stroke());
    assert_eq!(pixel(&canvas, 20, 20), Rgba::BLACK);
}

#[test]
fn tap_commits_a_dot() {
    let mut canvas = ready_canvas(20, 20);
    assert!(canvas.on_pointer_down(10.0, 10.0));
    assert!(canvas.on_pointer_up(10.0, 10.0));
    assert_eq!(pixel(&canvas, 10, 10), Rgba::BLACK);
    assert_eq!(pixel(&canvas, 0, 0), Rgba::TRANSPARENT);
}

#[test]
fn resize_keeps_committed_pixels_at_top_left() {
    let mut canvas = ready_canvas(40, 40);
    draw_line(&mut canvas, (5.0, 10.0), (35.0, 10.0));
    let before = canvas.snapshot().unwrap();

    assert!(canvas.resize(80, 60));
    let grown = canvas.snapshot().unwrap();
    for y in 0..40 {
        for x in 0..40 {
            assert_eq!(grown.pixel(x, y), before.pixel(x, y), "pixel {x},{y}");
        }
    }
    assert_eq!(grown.pixel(70, 50), Some(Rgba::TRANSPARENT));

    assert!(canvas.resize(20, 20));
    let shrunk = canvas.snapshot().unwrap();
    assert_eq!(shrunk.pixel(10, 10), before.pixel(10, 10));
    assert_eq!(shrunk.pixel(10, 10), Some(Rgba::BLACK));
}

#[test]
fn erase_clears_only_pixels_under_the_stroke() {
    let mut canvas = ready_canvas(40, 40);
    draw_line(&mut canvas, (5.0, 10.0), (35.0, 10.0));
    draw_line(&mut canvas, (5.0, 30.0), (35.0, 30.0));

    canvas.set_erase_mode(true);
    assert_eq!(canvas.paint().mode(), CompositeMode::Erase);
    assert!(canvas.on_pointer_down(20.0, 0.0));
    assert!(canvas.on_pointer_move(20.0, 20.0));
    // no live preview for erasing
    assert_eq!(
        canvas.render_preview().unwrap().pixel(20, 10),
        Some(Rgba::BLACK)
    );
    assert!(canvas.on_pointer_up(20.0, 20.0));

    assert_eq!(pixel(&canvas, 20, 10).a, 0);
    assert_eq!(pixel(&canvas, 8, 10), Rgba::BLACK);
    assert_eq!(pixel(&canvas, 20, 30), Rgba::BLACK);
}

#[test]
fn erase_mode_is_not_retroactive() {
    let mut canvas = ready_canvas(40, 40);
    draw_line(&mut canvas, (5.0, 20.0), (35.0, 20.0));
    canvas.set_erase_mode(true);
    canvas.set_erase_mode(false);
    assert_eq!(pixel(&canvas, 20, 20), Rgba::BLACK);
    assert_eq!(canvas.paint().mode(), CompositeMode::Draw);
}

#[test]
fn out_of_order_input_is_ignored() {
    let mut canvas = ready_canvas(20, 20);

    assert!(!canvas.on_pointer_move(5.0, 5.0));
    assert!(!canvas.on_pointer_up(5.0, 5.0));
    assert!(!canvas.handle_event(PointerEvent::primary(PointerAction::Other, 5.0, 5.0)));
    assert!(!canvas.on_pointer_down(f32::NAN, 3.0));

    assert!(!canvas.has_pending_stroke());
    assert!(canvas.snapshot().unwrap().is_fully_transparent());
}

#[test]
fn second_pointer_cannot_hijack_active_stroke() {
    let mut canvas = ready_canvas(40, 40);
    let finger = PointerId(1);
    let intruder = PointerId(2);
    let event = |pointer: PointerId, action: PointerAction, x: f32, y: f32| PointerEvent {
        pointer,
        action,
        x,
        y,
    };

    assert!(canvas.handle_event(event(finger, PointerAction::Down, 5.0, 20.0)));
    assert!(!canvas.handle_event(event(intruder, PointerAction::Down, 30.0, 5.0)));
    assert!(!canvas.handle_event(event(intruder, PointerAction::Move, 30.0, 35.0)));
    assert!(!canvas.handle_event(event(intruder, PointerAction::Up, 30.0, 35.0)));
    assert!(canvas.has_pending_stroke());
    assert!(canvas.snapshot().unwrap().is_fully_transparent());

    assert!(canvas.handle_event(event(finger, PointerAction::Up, 35.0, 20.0)));
    assert_eq!(pixel(&canvas, 20, 20), Rgba::BLACK);
    assert_eq!(pixel(&canvas, 30, 30), Rgba::TRANSPARENT);
}

#[test]
fn repeated_down_restarts_the_pending_stroke() {
    let mut canvas = ready_canvas(40, 40);
    assert!(canvas.on_pointer_down(5.0, 5.0));
    assert!(canvas.on_pointer_move(35.0, 5.0));
    assert!(canvas.on_pointer_down(5.0, 30.0));
    assert!(canvas.on_pointer_up(35.0, 30.0));

    assert_eq!(pixel(&canvas, 20, 5), Rgba::TRANSPARENT);
    assert_eq!(pixel(&canvas, 20, 30), Rgba::BLACK);
}

#[test]
fn brush_size_follows_display_density() {
    let mut canvas = ready_canvas(60, 60);
    assert!(canvas.set_brush_size(5.0, 2.0));
    assert_eq!(canvas.paint().width(), 10.0);
    assert!(!canvas.set_brush_size(0.0, 2.0));
    assert!(!canvas.set_brush_size(5.0, f32::INFINITY));
    assert_eq!(canvas.paint().width(), 10.0);
}

#[test]
fn restore_replaces_pixels_and_drops_pending_stroke() {
    let mut canvas = ready_canvas(20, 20);
    assert!(canvas.on_pointer_down(1.0, 1.0));

    let mut stored = PixelBuffer::new(30, 10).unwrap();
    stored.set_pixel(3, 4, Rgba::GREEN);
    stored.set_pixel(29, 9, Rgba::BLUE);
    assert!(canvas.restore(&stored));

    assert!(!canvas.has_pending_stroke());
    assert_eq!(canvas.size(), Some((30, 10)));
    assert_eq!(canvas.snapshot().unwrap(), stored);
    assert!(!canvas.on_pointer_up(1.0, 1.0));
}

#[test]
fn restore_keeps_translucent_pixels_exact() {
    let mut canvas = ready_canvas(20, 20);
    let mut stored = PixelBuffer::new(20, 20).unwrap();
    stored.set_pixel(0, 0, Rgba::new(200, 10, 30, 1));
    stored.set_pixel(1, 0, Rgba::new(7, 8, 9, 128));
    stored.set_pixel(2, 0, Rgba::new(255, 255, 255, 254));
    assert!(canvas.restore(&stored));
    assert_eq!(canvas.snapshot(), Some(stored.clone()));

    draw_line(&mut canvas, (4.0, 15.0), (16.0, 15.0));

    assert_eq!(pixel(&canvas, 0, 0), Rgba::new(200, 10, 30, 1));
    assert_eq!(pixel(&canvas, 1, 0), Rgba::new(7, 8, 9, 128));
    assert_eq!(pixel(&canvas, 2, 0), Rgba::new(255, 255, 255, 254));
    assert_ne!(pixel(&canvas, 10, 15), Rgba::TRANSPARENT);
}

#[test]
fn clear_makes_every_pixel_transparent() {
    let mut canvas = ready_canvas(20, 20);
    draw_line(&mut canvas, (2.0, 2.0), (18.0, 18.0));
    canvas.clear();
    assert!(canvas.snapshot().unwrap().is_fully_transparent());
}
