use crate::app::metrics::LoopMetricsSnapshot;
use crate::assets::AssetKind;
use crate::engine::GameEngine;
use crate::teleport::DwellState;

use super::draw::{draw_filled_rect, draw_rect_outline};
use super::font::{draw_text_clipped, glyph_advance, line_advance};

const OVERLAY_SCALE: i32 = 2;
const OVERLAY_PADDING: i32 = 6 * OVERLAY_SCALE;
const OVERLAY_PANEL_INSET_X: i32 = 4 * OVERLAY_SCALE;
const OVERLAY_PANEL_INSET_Y: i32 = 3 * OVERLAY_SCALE;
const OVERLAY_TEXT_PRIMARY_COLOR: [u8; 4] = [244, 248, 252, 255];
const OVERLAY_TEXT_DIM_COLOR: [u8; 4] = [176, 198, 220, 255];
const OVERLAY_PANEL_BG_COLOR: [u8; 4] = [10, 12, 16, 210];
const OVERLAY_PANEL_BORDER_COLOR: [u8; 4] = [92, 106, 126, 255];
const PERF_SECTION_LABEL: &str = "Perf";
const WORLD_SECTION_LABEL: &str = "World";

/// Inputs of the F3 stats panel.
#[derive(Debug, Clone, Default)]
pub(crate) struct OverlayData {
    pub metrics: LoopMetricsSnapshot,
    pub render_fps_cap: Option<u32>,
    pub page: String,
    pub page_loads: u64,
}

pub(crate) fn draw_overlay(
    frame: &mut [u8],
    width: u32,
    height: u32,
    data: &OverlayData,
    world: Option<&GameEngine>,
) {
    if width == 0 || height == 0 {
        return;
    }

    let lines = build_overlay_lines(data, world);
    let longest_line_chars = lines
        .iter()
        .map(|line| line.chars().count() as i32)
        .max()
        .unwrap_or(0);
    let panel_width = longest_line_chars * glyph_advance(OVERLAY_SCALE) + OVERLAY_PANEL_INSET_X * 2;
    let panel_height = lines.len() as i32 * line_advance(OVERLAY_SCALE) + OVERLAY_PANEL_INSET_Y * 2;
    let panel_left = OVERLAY_PADDING - OVERLAY_PANEL_INSET_X;
    let panel_top = OVERLAY_PADDING - OVERLAY_PANEL_INSET_Y;
    draw_filled_rect(
        frame,
        width,
        height,
        panel_left,
        panel_top,
        panel_width,
        panel_height,
        OVERLAY_PANEL_BG_COLOR,
    );
    draw_rect_outline(
        frame,
        width,
        height,
        panel_left,
        panel_top,
        panel_width,
        panel_height,
        1,
        OVERLAY_PANEL_BORDER_COLOR,
    );

    let mut y = OVERLAY_PADDING;
    for line in lines {
        let color = overlay_line_color(&line);
        draw_text_clipped(
            frame,
            width,
            height,
            OVERLAY_PADDING,
            y,
            &line,
            color,
            OVERLAY_SCALE,
        );
        y += line_advance(OVERLAY_SCALE);
    }
}

fn build_overlay_lines(data: &OverlayData, world: Option<&GameEngine>) -> Vec<String> {
    let mut lines = vec![
        PERF_SECTION_LABEL.to_string(),
        format_fps_line(data.metrics.fps, data.render_fps_cap),
        format!("TPS: {:.1}", data.metrics.tps),
        format!(
            "Frame: {:.2} ms (max {:.1})",
            data.metrics.frame_time_ms, data.metrics.slowest_frame_ms
        ),
        format!("Page: {} (load {})", data.page, data.page_loads),
    ];

    let Some(world) = world else {
        return lines;
    };
    let player = world.player();
    let (map_width, map_height) = world.map_size();
    let camera = world.camera();
    lines.push(String::new());
    lines.push(WORLD_SECTION_LABEL.to_string());
    lines.push(format!("Map: {map_width}x{map_height}"));
    lines.push(format!(
        "Player: {:.0},{:.0} {:?}",
        player.position.x, player.position.y, player.direction
    ));
    lines.push(format!(
        "Camera: {:.0},{:.0} x{:.2}",
        camera.x, camera.y, camera.zoom
    ));
    lines.push(format!("Portals: {}", world.portals().len()));
    lines.push(format!("Dwell: {}", dwell_text(world.interaction().state())));
    let pending = AssetKind::ALL
        .iter()
        .filter(|kind| !world.assets().state(**kind).is_settled())
        .count();
    lines.push(format!("Assets pending: {pending}"));
    lines
}

fn dwell_text(state: DwellState) -> String {
    match state {
        DwellState::Idle => "idle".to_string(),
        DwellState::Dwelling {
            portal_index,
            ticks,
        } => format!("portal {portal_index} t{ticks}"),
        DwellState::Teleporting { portal_index } => format!("teleport {portal_index}"),
    }
}

fn overlay_line_color(line: &str) -> [u8; 4] {
    if matches!(line, PERF_SECTION_LABEL | WORLD_SECTION_LABEL) {
        OVERLAY_TEXT_DIM_COLOR
    } else {
        OVERLAY_TEXT_PRIMARY_COLOR
    }
}

fn format_fps_line(current_fps: f32, cap: Option<u32>) -> String {
    let cap_text = match cap {
        Some(value) => value.to_string(),
        None => "inf".to_string(),
    };
    format!("FPS: {current_fps:.0} / {cap_text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_line_shows_cap() {
        assert_eq!(format_fps_line(59.6, Some(60)), "FPS: 60 / 60");
        assert_eq!(format_fps_line(12.0, None), "FPS: 12 / inf");
    }

    #[test]
    fn section_labels_are_dimmed() {
        assert_eq!(overlay_line_color("Perf"), OVERLAY_TEXT_DIM_COLOR);
        assert_eq!(overlay_line_color("TPS: 60.0"), OVERLAY_TEXT_PRIMARY_COLOR);
    }

    #[test]
    fn pages_without_a_world_show_only_perf_lines() {
        let data = OverlayData {
            page: "about".to_string(),
            page_loads: 2,
            ..OverlayData::default()
        };
        let lines = build_overlay_lines(&data, None);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[4], "Page: about (load 2)");
    }

    #[test]
    fn dwell_text_names_the_portal() {
        assert_eq!(
            dwell_text(DwellState::Dwelling {
                portal_index: 2,
                ticks: 14
            }),
            "portal 2 t14"
        );
        assert_eq!(dwell_text(DwellState::Idle), "idle");
    }
}
