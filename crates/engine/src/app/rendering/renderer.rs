use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::dpad::DpadLayout;
use crate::app::page::{Page, PageMachine};
use crate::engine::GameEngine;
use crate::player::Direction;
use crate::rooms::{wrap_text, Room};

use super::draw::{
    draw_filled_rect, draw_image_rotated, draw_image_scaled, draw_rect_outline, fill_frame,
};
use super::font::{columns_for_width, draw_text_clipped, line_advance, text_width, TEXT_SCALE};
use super::overlay::{draw_overlay, OverlayData};

const CLEAR_COLOR_WORLD: [u8; 4] = [12, 20, 48, 255];
const CLEAR_COLOR_PAGE: [u8; 4] = [16, 16, 30, 255];
const PLACEHOLDER_COLOR: [u8; 4] = [250, 204, 21, 255];
const PLAYER_SPRITE_SIZE_PX: f32 = 100.0;
const MAP_TITLE: &str = "STARTUP QUEST";
const MAP_SUBTITLE: &str = "Walk into a portal to explore";
const TITLE_SCALE: i32 = 8;
const TITLE_COLOR: [u8; 4] = [255, 215, 0, 255];
const TEXT_COLOR: [u8; 4] = [236, 240, 248, 255];
const HINT_COLOR: [u8; 4] = [150, 160, 190, 255];
const PANEL_BG_COLOR: [u8; 4] = [26, 26, 46, 240];
const PANEL_BORDER_COLOR: [u8; 4] = [255, 215, 0, 255];
const PANEL_MARGIN_PX: i32 = 40;
const PANEL_INSET_PX: i32 = 24;
const PANEL_BORDER_PX: i32 = 3;
const ROOM_TITLE_SCALE: i32 = 5;
const DPAD_COLOR: [u8; 4] = [255, 255, 255, 90];
const DPAD_PRESSED_COLOR: [u8; 4] = [255, 215, 0, 170];
const DPAD_BORDER_COLOR: [u8; 4] = [255, 255, 255, 160];
const BACK_HINT: &str = "ESC: back to map";

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    width: u32,
    height: u32,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            width: size.width,
            height: size.height,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub(crate) fn render_page(
        &mut self,
        pages: &PageMachine,
        touch: Option<Direction>,
        overlay: Option<&OverlayData>,
    ) -> Result<(), Error> {
        if self.width == 0 || self.height == 0 {
            return Ok(());
        }
        let (width, height) = (self.width, self.height);
        let frame = self.pixels.frame_mut();
        draw_page(frame, width, height, pages, touch);
        if let Some(data) = overlay {
            let world = match pages.active() {
                Page::World(engine) => Some(&**engine),
                _ => None,
            };
            draw_overlay(frame, width, height, data, world);
        }
        self.pixels.render()
    }
}

pub(crate) fn draw_page(
    frame: &mut [u8],
    width: u32,
    height: u32,
    pages: &PageMachine,
    touch: Option<Direction>,
) {
    match pages.active() {
        Page::World(engine) => {
            draw_world(frame, width, height, engine);
            draw_dpad(frame, width, height, touch);
        }
        Page::Room { scroll, .. } => {
            fill_frame(frame, CLEAR_COLOR_PAGE);
            if let Some(room) = pages.active_room() {
                draw_room(frame, width, height, room, *scroll);
            }
        }
        Page::External { target } => {
            fill_frame(frame, CLEAR_COLOR_PAGE);
            draw_external(frame, width, height, target);
        }
    }
}

/// Background, portals and player, faded together by the dwell opacity.
pub(crate) fn draw_world(frame: &mut [u8], width: u32, height: u32, engine: &GameEngine) {
    fill_frame(frame, CLEAR_COLOR_WORLD);
    let camera = *engine.camera();
    let opacity = engine.world_opacity();
    let (map_width, map_height) = engine.map_size();

    if let Some(background) = engine.assets().background() {
        draw_image_scaled(
            frame,
            width,
            height,
            background,
            -camera.x,
            -camera.y,
            map_width as f32 * camera.zoom,
            map_height as f32 * camera.zoom,
            opacity,
        );
    }

    if let Some(icon) = engine.assets().portal_icon() {
        let size = engine.config().portals.render_size * camera.zoom;
        for portal in engine.portals().portals() {
            let (x, y) = camera.world_to_screen(portal.position);
            if x < -size || y < -size || x > width as f32 + size || y > height as f32 + size {
                continue;
            }
            draw_image_rotated(
                frame,
                width,
                height,
                icon,
                x,
                y,
                size,
                portal.rotation,
                opacity,
            );
        }
    }

    draw_player(frame, width, height, engine, opacity);

    if engine.title_visible() {
        draw_map_title(frame, width, height);
    }
}

fn draw_player(frame: &mut [u8], width: u32, height: u32, engine: &GameEngine, opacity: f32) {
    let player = engine.player();
    let camera = engine.camera();
    let (center_x, center_y) = camera.world_to_screen(player.center());
    let frames = engine.assets().sprite_frames();
    let sprite = if player.is_moving && !frames.is_empty() {
        frames.get(player.anim_frame as usize % frames.len())
    } else {
        engine.assets().sprite_static_frame()
    };

    match sprite {
        Some(sprite) => {
            let half = PLAYER_SPRITE_SIZE_PX / 2.0;
            draw_image_scaled(
                frame,
                width,
                height,
                sprite,
                center_x - half,
                center_y - half,
                PLAYER_SPRITE_SIZE_PX,
                PLAYER_SPRITE_SIZE_PX,
                opacity,
            );
        }
        None => {
            let size_x = (player.width * camera.zoom).round() as i32;
            let size_y = (player.height * camera.zoom).round() as i32;
            let mut color = PLACEHOLDER_COLOR;
            color[3] = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
            draw_filled_rect(
                frame,
                width,
                height,
                center_x.round() as i32 - size_x / 2,
                center_y.round() as i32 - size_y / 2,
                size_x,
                size_y,
                color,
            );
        }
    }
}

fn draw_map_title(frame: &mut [u8], width: u32, height: u32) {
    let title_x = (width as i32 - text_width(MAP_TITLE, TITLE_SCALE)) / 2;
    let title_y = height as i32 / 6;
    draw_text_clipped(
        frame,
        width,
        height,
        title_x + TITLE_SCALE / 2,
        title_y + TITLE_SCALE / 2,
        MAP_TITLE,
        [0, 0, 0, 255],
        TITLE_SCALE,
    );
    draw_text_clipped(
        frame,
        width,
        height,
        title_x,
        title_y,
        MAP_TITLE,
        TITLE_COLOR,
        TITLE_SCALE,
    );
    let subtitle_x = (width as i32 - text_width(MAP_SUBTITLE, TEXT_SCALE)) / 2;
    draw_text_clipped(
        frame,
        width,
        height,
        subtitle_x,
        title_y + line_advance(TITLE_SCALE),
        MAP_SUBTITLE,
        TEXT_COLOR,
        TEXT_SCALE,
    );
}

fn draw_dpad(frame: &mut [u8], width: u32, height: u32, pressed: Option<Direction>) {
    let layout = DpadLayout::for_window(width, height);
    for (direction, rect) in layout.buttons() {
        let fill = if pressed == Some(*direction) {
            DPAD_PRESSED_COLOR
        } else {
            DPAD_COLOR
        };
        draw_filled_rect(
            frame, width, height, rect.left, rect.top, rect.width, rect.height, fill,
        );
        draw_rect_outline(
            frame,
            width,
            height,
            rect.left,
            rect.top,
            rect.width,
            rect.height,
            2,
            DPAD_BORDER_COLOR,
        );
        let arrow = match direction {
            Direction::Up => "^",
            Direction::Down => "v",
            Direction::Left => "<",
            Direction::Right => ">",
        };
        let scale = TEXT_SCALE + 1;
        draw_text_clipped(
            frame,
            width,
            height,
            rect.left + (rect.width - text_width(arrow, scale)) / 2,
            rect.top + (rect.height - 5 * scale) / 2,
            arrow,
            [20, 20, 30, 255],
            scale,
        );
    }
}

/// Text layout of a room page for the current window size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RoomLayout {
    pub lines: Vec<String>,
    pub visible_rows: usize,
}

impl RoomLayout {
    pub(crate) fn for_window(room: &Room, width: u32, height: u32) -> Self {
        let text_width_px = width as i32 - 2 * (PANEL_MARGIN_PX + PANEL_INSET_PX);
        let columns = columns_for_width(text_width_px, TEXT_SCALE).max(1);
        let lines = room
            .body_lines()
            .unwrap_or_else(|error| vec![error.to_string()])
            .iter()
            .flat_map(|line| wrap_text(line, columns))
            .collect();
        let body_height = height as i32 - 2 * (PANEL_MARGIN_PX + PANEL_INSET_PX)
            - 2 * line_advance(ROOM_TITLE_SCALE)
            - line_advance(TEXT_SCALE);
        let visible_rows = (body_height / line_advance(TEXT_SCALE)).max(1) as usize;
        Self {
            lines,
            visible_rows,
        }
    }

    pub(crate) fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(self.visible_rows)
    }
}

fn draw_panel(frame: &mut [u8], width: u32, height: u32) -> (i32, i32) {
    let panel_width = width as i32 - 2 * PANEL_MARGIN_PX;
    let panel_height = height as i32 - 2 * PANEL_MARGIN_PX;
    draw_filled_rect(
        frame,
        width,
        height,
        PANEL_MARGIN_PX,
        PANEL_MARGIN_PX,
        panel_width,
        panel_height,
        PANEL_BG_COLOR,
    );
    draw_rect_outline(
        frame,
        width,
        height,
        PANEL_MARGIN_PX,
        PANEL_MARGIN_PX,
        panel_width,
        panel_height,
        PANEL_BORDER_PX,
        PANEL_BORDER_COLOR,
    );
    (
        PANEL_MARGIN_PX + PANEL_INSET_PX,
        PANEL_MARGIN_PX + PANEL_INSET_PX,
    )
}

fn draw_back_hint(frame: &mut [u8], width: u32, height: u32, extra: &str) {
    let hint = if extra.is_empty() {
        BACK_HINT.to_string()
    } else {
        format!("{BACK_HINT}   {extra}")
    };
    draw_text_clipped(
        frame,
        width,
        height,
        PANEL_MARGIN_PX + PANEL_INSET_PX,
        height as i32 - PANEL_MARGIN_PX - PANEL_INSET_PX - line_advance(TEXT_SCALE),
        &hint,
        HINT_COLOR,
        TEXT_SCALE,
    );
}

pub(crate) fn draw_room(frame: &mut [u8], width: u32, height: u32, room: &Room, scroll: usize) {
    let (left, top) = draw_panel(frame, width, height);
    draw_text_clipped(
        frame,
        width,
        height,
        left,
        top,
        &room.plain_title(),
        TITLE_COLOR,
        ROOM_TITLE_SCALE,
    );

    let layout = RoomLayout::for_window(room, width, height);
    let mut y = top + 2 * line_advance(ROOM_TITLE_SCALE);
    for line in layout.lines.iter().skip(scroll).take(layout.visible_rows) {
        draw_text_clipped(frame, width, height, left, y, line, TEXT_COLOR, TEXT_SCALE);
        y += line_advance(TEXT_SCALE);
    }

    let scroll_hint = if layout.max_scroll() > 0 {
        "W/S: scroll"
    } else {
        ""
    };
    draw_back_hint(frame, width, height, scroll_hint);
}

fn draw_external(frame: &mut [u8], width: u32, height: u32, target: &str) {
    let (left, top) = draw_panel(frame, width, height);
    draw_text_clipped(
        frame,
        width,
        height,
        left,
        top,
        "Leaving the map",
        TITLE_COLOR,
        ROOM_TITLE_SCALE,
    );
    let columns = columns_for_width(
        width as i32 - 2 * (PANEL_MARGIN_PX + PANEL_INSET_PX),
        TEXT_SCALE,
    );
    let mut y = top + 2 * line_advance(ROOM_TITLE_SCALE);
    for line in wrap_text(&format!("This portal leads to {target}"), columns) {
        draw_text_clipped(frame, width, height, left, y, &line, TEXT_COLOR, TEXT_SCALE);
        y += line_advance(TEXT_SCALE);
    }
    draw_back_hint(frame, width, height, "");
}
