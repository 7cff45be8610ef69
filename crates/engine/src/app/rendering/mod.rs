mod draw;
mod font;
mod overlay;
mod renderer;

pub(crate) use overlay::OverlayData;
pub(crate) use renderer::RoomLayout;
pub(crate) use renderer::Renderer;
