use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{
    ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, Touch, TouchPhase, WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::geometry::Viewport;
use crate::input::{InputAction, InputRouter, MoveIntent};

use super::dpad::DpadLayout;
use super::metrics::{LoopMetricsSnapshot, MetricsAccumulator};
use super::page::{PageCommand, PageMachine, Site};
use super::rendering::{OverlayData, Renderer, RoomLayout};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Startup Quest".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(5),
            max_render_fps: Some(60),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the window and runs pages until the window closes or the player
/// backs out of the world page.
pub fn run_app(config: LoopConfig, site: Site) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let (initial_width, initial_height) = renderer.size();
    let mut input_collector = InputCollector::new(initial_width, initial_height);

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    let mut pages = PageMachine::new(site);
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut last_metrics = LoopMetricsSnapshot::default();
    let mut last_applied_title = config.window_title.clone();
    let mut overlay_visible = false;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    input_collector.set_window_size(new_size.width, new_size.height);
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    input_collector.set_window_size(size.width, size.height);
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::Focused(false) => input_collector.release_all(),
                WindowEvent::CursorMoved { position, .. } => {
                    input_collector.set_cursor_position_px(position.x as f32, position.y as f32);
                }
                WindowEvent::CursorLeft { .. } => input_collector.clear_cursor_position(),
                WindowEvent::MouseInput { state, button, .. } => {
                    input_collector.handle_mouse_input(button, state);
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    input_collector.handle_mouse_wheel(delta);
                }
                WindowEvent::Touch(touch) => input_collector.handle_touch(touch),
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                }
                WindowEvent::RedrawRequested => {
                    if input_collector.take_overlay_toggle_pressed() {
                        overlay_visible = !overlay_visible;
                        info!(overlay_visible, "overlay_toggled");
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                    accumulator = accumulator.saturating_add(clamped_frame_dt);

                    let (width, height) = renderer.size();
                    let viewport = Viewport::new(width, height);
                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..step_plan.ticks_to_run {
                        let tick_input = input_collector.snapshot_for_tick();
                        if tick_input.scroll_lines != 0 {
                            pages.scroll_by(tick_input.scroll_lines);
                        }
                        let command = pages.step(
                            fixed_dt,
                            tick_input.intent,
                            tick_input.back_pressed,
                            viewport,
                        );
                        metrics_accumulator.record_tick();
                        if command == PageCommand::Quit {
                            info!(reason = "back_from_world", "shutdown_requested");
                            window_target.exit();
                            return;
                        }
                    }
                    accumulator = step_plan.remaining_accumulator;

                    if step_plan.dropped_backlog > Duration::ZERO {
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }

                    let max_scroll = pages
                        .active_room()
                        .map(|room| RoomLayout::for_window(room, width, height).max_scroll());
                    if let Some(max_scroll) = max_scroll {
                        pages.clamp_scroll(max_scroll);
                    }

                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    let overlay = overlay_visible.then(|| OverlayData {
                        metrics: last_metrics,
                        render_fps_cap: effective_render_cap,
                        page: pages.active_label().to_string(),
                        page_loads: pages.page_loads(),
                    });
                    if let Err(error) = renderer.render_page(
                        &pages,
                        input_collector.router.touch(),
                        overlay.as_ref(),
                    ) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();

                    let next_title = pages.window_title(&config.window_title);
                    if next_title != last_applied_title {
                        window.set_title(&next_title);
                        last_applied_title = next_title;
                    }
                    metrics_accumulator.record_frame(raw_frame_dt);

                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        last_metrics = snapshot;
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            slowest_frame_ms = snapshot.slowest_frame_ms,
                            page = pages.active_label(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                pages.shutdown();
                info!(page_loads = pages.page_loads(), "shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Input consumed by one simulation tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TickInput {
    intent: MoveIntent,
    back_pressed: bool,
    scroll_lines: i32,
}

#[derive(Debug, Default)]
struct InputCollector {
    router: InputRouter,
    back_pressed_edge: bool,
    overlay_toggle_is_down: bool,
    overlay_toggle_pressed_edge: bool,
    cursor_position_px: Option<(f32, f32)>,
    left_mouse_is_down: bool,
    active_touch: Option<(u64, f32, f32)>,
    pending_scroll_lines: i32,
    window_width: u32,
    window_height: u32,
}

impl InputCollector {
    fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            window_width,
            window_height,
            ..Self::default()
        }
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        let is_pressed = key_event.state == ElementState::Pressed;
        self.update_action_state_from_physical_key(key_event.physical_key, is_pressed);
        self.handle_overlay_toggle_key_state(is_overlay_toggle_key(key_event), key_event.state);
    }

    fn update_action_state_from_physical_key(&mut self, key: PhysicalKey, is_pressed: bool) {
        let action = match key {
            PhysicalKey::Code(KeyCode::KeyW) | PhysicalKey::Code(KeyCode::ArrowUp) => {
                InputAction::MoveUp
            }
            PhysicalKey::Code(KeyCode::KeyS) | PhysicalKey::Code(KeyCode::ArrowDown) => {
                InputAction::MoveDown
            }
            PhysicalKey::Code(KeyCode::KeyA) | PhysicalKey::Code(KeyCode::ArrowLeft) => {
                InputAction::MoveLeft
            }
            PhysicalKey::Code(KeyCode::KeyD) | PhysicalKey::Code(KeyCode::ArrowRight) => {
                InputAction::MoveRight
            }
            PhysicalKey::Code(KeyCode::Escape) | PhysicalKey::Code(KeyCode::Backspace) => {
                InputAction::Back
            }
            _ => return,
        };
        if action == InputAction::Back && is_pressed && !self.router.is_down(InputAction::Back) {
            self.back_pressed_edge = true;
        }
        self.router.set_action(action, is_pressed);
    }

    fn handle_overlay_toggle_key_state(&mut self, is_toggle_key: bool, state: ElementState) {
        if !is_toggle_key {
            return;
        }

        match state {
            ElementState::Pressed => {
                if !self.overlay_toggle_is_down {
                    self.overlay_toggle_pressed_edge = true;
                }
                self.overlay_toggle_is_down = true;
            }
            ElementState::Released => self.overlay_toggle_is_down = false,
        }
    }

    fn take_overlay_toggle_pressed(&mut self) -> bool {
        let was_pressed = self.overlay_toggle_pressed_edge;
        self.overlay_toggle_pressed_edge = false;
        was_pressed
    }

    fn snapshot_for_tick(&mut self) -> TickInput {
        let input = TickInput {
            intent: self.router.intent(),
            back_pressed: self.back_pressed_edge,
            scroll_lines: self.pending_scroll_lines,
        };
        self.back_pressed_edge = false;
        self.pending_scroll_lines = 0;
        input
    }

    fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_width = width;
        self.window_height = height;
        self.refresh_pointer_direction();
    }

    fn set_cursor_position_px(&mut self, x: f32, y: f32) {
        self.cursor_position_px = Some((x, y));
        self.refresh_pointer_direction();
    }

    fn clear_cursor_position(&mut self) {
        self.cursor_position_px = None;
        self.refresh_pointer_direction();
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.left_mouse_is_down = state == ElementState::Pressed;
            self.refresh_pointer_direction();
        }
    }

    fn handle_mouse_wheel(&mut self, delta: MouseScrollDelta) {
        let lines = scroll_lines_from_delta(delta);
        self.pending_scroll_lines = self.pending_scroll_lines.saturating_add(lines);
    }

    /// Follows a single finger; other touches are ignored until it lifts.
    fn handle_touch(&mut self, touch: Touch) {
        let (x, y) = (touch.location.x as f32, touch.location.y as f32);
        match touch.phase {
            TouchPhase::Started => {
                if self.active_touch.is_none() {
                    self.active_touch = Some((touch.id, x, y));
                }
            }
            TouchPhase::Moved => {
                if let Some((id, _, _)) = self.active_touch {
                    if id == touch.id {
                        self.active_touch = Some((id, x, y));
                    }
                }
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                if self.active_touch.is_some_and(|(id, _, _)| id == touch.id) {
                    self.active_touch = None;
                }
            }
        }
        self.refresh_pointer_direction();
    }

    /// Drops held keys and pointers, e.g. when focus moves elsewhere.
    fn release_all(&mut self) {
        self.router.clear();
        self.left_mouse_is_down = false;
        self.active_touch = None;
    }

    fn refresh_pointer_direction(&mut self) {
        let pointer = match self.active_touch {
            Some((_, x, y)) => Some((x, y)),
            None if self.left_mouse_is_down => self.cursor_position_px,
            None => None,
        };
        let layout = DpadLayout::for_window(self.window_width, self.window_height);
        let direction = pointer.and_then(|(x, y)| layout.hit_test(x, y));
        self.router.set_touch(direction);
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

fn is_overlay_toggle_key(key_event: &KeyEvent) -> bool {
    matches!(key_event.physical_key, PhysicalKey::Code(KeyCode::F3))
}

/// Wheel up scrolls toward the top, so it yields negative lines.
fn scroll_lines_from_delta(delta: MouseScrollDelta) -> i32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -(y.round() as i32),
        MouseScrollDelta::PixelDelta(position) => {
            if position.y > 0.0 {
                -1
            } else if position.y < 0.0 {
                1
            } else {
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use winit::dpi::PhysicalPosition;

    use super::*;
    use crate::player::Direction;

    fn press_left_mouse_at(input: &mut InputCollector, x: f32, y: f32) {
        input.set_cursor_position_px(x, y);
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
    }

    fn dpad_button(input: &InputCollector, direction: Direction) -> (f32, f32) {
        let layout = DpadLayout::for_window(input.window_width, input.window_height);
        let (_, rect) = layout
            .buttons()
            .iter()
            .find(|(candidate, _)| *candidate == direction)
            .copied()
            .expect("button");
        (rect.left as f32 + 4.0, rect.top as f32 + 4.0)
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        let raw_frame_dt = Duration::from_millis(600);

        assert_eq!(
            clamp_frame_delta(raw_frame_dt, max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(50), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::from_millis(2));
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn back_press_is_edge_triggered_for_single_tick() {
        let mut input = InputCollector::new(1280, 720);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::Escape), true);

        assert!(input.snapshot_for_tick().back_pressed);
        assert!(!input.snapshot_for_tick().back_pressed);
    }

    #[test]
    fn held_back_key_does_not_repeat() {
        let mut input = InputCollector::new(1280, 720);
        let escape = PhysicalKey::Code(KeyCode::Escape);

        input.update_action_state_from_physical_key(escape, true);
        let first = input.snapshot_for_tick();
        input.update_action_state_from_physical_key(escape, true);
        let second = input.snapshot_for_tick();
        input.update_action_state_from_physical_key(escape, false);
        input.update_action_state_from_physical_key(escape, true);
        let third = input.snapshot_for_tick();

        assert!(first.back_pressed);
        assert!(!second.back_pressed);
        assert!(third.back_pressed);
    }

    #[test]
    fn wasd_and_arrow_keys_map_to_movement() {
        let mut input = InputCollector::new(1280, 720);

        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyW), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::ArrowLeft), true);

        let intent = input.snapshot_for_tick().intent;
        assert_eq!((intent.dx, intent.dy), (-1, -1));
        assert_eq!(intent.facing, Some(Direction::Left));
    }

    #[test]
    fn key_release_clears_movement() {
        let mut input = InputCollector::new(1280, 720);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyD), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyD), false);

        assert!(!input.snapshot_for_tick().intent.has_motion());
    }

    #[test]
    fn f3_toggle_is_edge_triggered() {
        let mut input = InputCollector::default();

        input.handle_overlay_toggle_key_state(true, ElementState::Pressed);
        assert!(input.take_overlay_toggle_pressed());

        input.handle_overlay_toggle_key_state(true, ElementState::Pressed);
        assert!(!input.take_overlay_toggle_pressed());

        input.handle_overlay_toggle_key_state(true, ElementState::Released);
        input.handle_overlay_toggle_key_state(true, ElementState::Pressed);
        assert!(input.take_overlay_toggle_pressed());
    }

    #[test]
    fn held_mouse_on_dpad_steers_until_release() {
        let mut input = InputCollector::new(1280, 720);
        let (x, y) = dpad_button(&input, Direction::Right);
        press_left_mouse_at(&mut input, x, y);
        assert_eq!(input.snapshot_for_tick().intent.dx, 1);

        let (x, y) = dpad_button(&input, Direction::Up);
        input.set_cursor_position_px(x, y);
        assert_eq!(input.snapshot_for_tick().intent.dy, -1);

        input.handle_mouse_input(MouseButton::Left, ElementState::Released);
        assert!(!input.snapshot_for_tick().intent.has_motion());
    }

    #[test]
    fn hovering_without_click_does_not_steer() {
        let mut input = InputCollector::new(1280, 720);
        let (x, y) = dpad_button(&input, Direction::Down);
        input.set_cursor_position_px(x, y);
        assert!(!input.snapshot_for_tick().intent.has_motion());
    }

    #[test]
    fn first_touch_owns_the_dpad() {
        let mut input = InputCollector::new(1280, 720);
        let (x, y) = dpad_button(&input, Direction::Left);
        let touch = |id: u64, phase: TouchPhase, x: f32, y: f32| Touch {
            device_id: unsafe { winit::event::DeviceId::dummy() },
            phase,
            location: PhysicalPosition::new(x as f64, y as f64),
            force: None,
            id,
        };

        input.handle_touch(touch(1, TouchPhase::Started, x, y));
        input.handle_touch(touch(2, TouchPhase::Started, 5.0, 5.0));
        assert_eq!(input.snapshot_for_tick().intent.dx, -1);

        input.handle_touch(touch(2, TouchPhase::Ended, 5.0, 5.0));
        assert_eq!(input.snapshot_for_tick().intent.dx, -1);

        input.handle_touch(touch(1, TouchPhase::Ended, x, y));
        assert!(!input.snapshot_for_tick().intent.has_motion());
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut input = InputCollector::new(1280, 720);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyS), true);
        let (x, y) = dpad_button(&input, Direction::Left);
        press_left_mouse_at(&mut input, x, y);

        input.release_all();
        assert_eq!(input.snapshot_for_tick().intent, MoveIntent::NONE);
    }

    #[test]
    fn mouse_wheel_accumulates_scroll_until_snapshot() {
        let mut input = InputCollector::new(1280, 720);
        input.handle_mouse_wheel(MouseScrollDelta::LineDelta(0.0, -3.0));
        input.handle_mouse_wheel(MouseScrollDelta::LineDelta(0.0, 1.0));

        assert_eq!(input.snapshot_for_tick().scroll_lines, 2);
        assert_eq!(input.snapshot_for_tick().scroll_lines, 0);
    }

    #[test]
    fn pixel_wheel_delta_maps_to_single_line() {
        let up = scroll_lines_from_delta(MouseScrollDelta::PixelDelta(PhysicalPosition::new(
            0.0, 3.0,
        )));
        let down = scroll_lines_from_delta(MouseScrollDelta::PixelDelta(PhysicalPosition::new(
            0.0, -5.0,
        )));
        let none = scroll_lines_from_delta(MouseScrollDelta::PixelDelta(PhysicalPosition::new(
            0.0, 0.0,
        )));

        assert_eq!(up, -1);
        assert_eq!(down, 1);
        assert_eq!(none, 0);
    }

    #[test]
    fn target_frame_duration_none_when_cap_off() {
        assert_eq!(target_frame_duration(None), None);
    }

    #[test]
    fn target_frame_duration_for_60hz_is_expected() {
        let duration = target_frame_duration(Some(60)).expect("duration");
        assert!((duration.as_secs_f64() - (1.0 / 60.0)).abs() < 0.000_001);
    }

    #[test]
    fn compute_cap_sleep_zero_when_over_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(20), target_frame_duration(Some(60)));
        assert_eq!(sleep, Duration::ZERO);
    }

    #[test]
    fn compute_cap_sleep_positive_when_under_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(5), target_frame_duration(Some(60)));
        assert!(sleep > Duration::ZERO);
    }

    #[test]
    fn normalize_render_fps_cap_disables_zero() {
        assert_eq!(normalize_render_fps_cap(Some(0)), None);
        assert_eq!(normalize_render_fps_cap(Some(60)), Some(60));
    }
}
