use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use tracing::{info, warn};

use crate::assets::AssetStore;
use crate::breadcrumb::mark_return_from_page;
use crate::config::{AssetManifest, EngineConfig};
use crate::engine::{GameEngine, StepOutcome};
use crate::geometry::Viewport;
use crate::input::MoveIntent;
use crate::navigation::Destination;
use crate::portal::DestinationTable;
use crate::rooms::{Room, RoomCatalog};
use crate::storage::PageStorage;

/// Ticks between scroll steps while a scroll key is held on a room page.
const SCROLL_REPEAT_TICKS: u32 = 6;

/// Everything a page load needs: engine tuning, where the images live, the
/// portal destinations, room content and the durable page storage.
pub struct Site {
    pub engine: EngineConfig,
    pub assets: AssetManifest,
    pub asset_dir: PathBuf,
    pub destinations: DestinationTable,
    pub rooms: RoomCatalog,
    pub storage: Rc<dyn PageStorage>,
}

pub(crate) enum Page {
    World(Box<GameEngine>),
    Room {
        key: String,
        page: String,
        scroll: usize,
    },
    /// A destination this build cannot show: an external link, or a site
    /// page with no room content.
    External { target: String },
}

impl Page {
    fn label(&self) -> &str {
        match self {
            Page::World(_) => "world",
            Page::Room { key, .. } => key,
            Page::External { target } => target,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PageCommand {
    None,
    Quit,
}

/// Owns the active page. Navigation disposes the current page and loads the
/// next one, the way a full page load would.
pub(crate) struct PageMachine {
    site: Site,
    active: Page,
    page_loads: u64,
    scroll_timer: u32,
}

impl PageMachine {
    pub(crate) fn new(site: Site) -> Self {
        let world = load_world(&site);
        Self {
            site,
            active: Page::World(Box::new(world)),
            page_loads: 1,
            scroll_timer: 0,
        }
    }

    pub(crate) fn active(&self) -> &Page {
        &self.active
    }

    pub(crate) fn active_label(&self) -> &str {
        self.active.label()
    }

    pub(crate) fn page_loads(&self) -> u64 {
        self.page_loads
    }

    pub(crate) fn active_room(&self) -> Option<&Room> {
        match &self.active {
            Page::Room { key, .. } => self.site.rooms.by_key(key),
            _ => None,
        }
    }

    pub(crate) fn window_title(&self, base: &str) -> String {
        match &self.active {
            Page::World(_) => base.to_string(),
            Page::Room { .. } => match self.active_room() {
                Some(room) => format!("{} - {base}", room.plain_title()),
                None => base.to_string(),
            },
            Page::External { target } => format!("{target} - {base}"),
        }
    }

    /// Runs one tick of the active page. `back_pressed` is the edge of the
    /// back key for this tick.
    pub(crate) fn step(
        &mut self,
        dt: Duration,
        intent: MoveIntent,
        back_pressed: bool,
        viewport: Viewport,
    ) -> PageCommand {
        if back_pressed {
            return self.go_back();
        }

        match &mut self.active {
            Page::World(engine) => {
                if let StepOutcome::Navigate(destination) = engine.step(dt, intent, viewport) {
                    self.navigate(destination);
                }
            }
            Page::Room { scroll, .. } => {
                if intent.dy == 0 {
                    self.scroll_timer = 0;
                } else {
                    if self.scroll_timer == 0 {
                        *scroll = if intent.dy < 0 {
                            scroll.saturating_sub(1)
                        } else {
                            scroll.saturating_add(1)
                        };
                    }
                    self.scroll_timer = (self.scroll_timer + 1) % SCROLL_REPEAT_TICKS;
                }
            }
            Page::External { .. } => {}
        }
        PageCommand::None
    }

    /// Scrolls the room page by whole lines; positive is down.
    pub(crate) fn scroll_by(&mut self, lines: i32) {
        if let Page::Room { scroll, .. } = &mut self.active {
            *scroll = if lines < 0 {
                scroll.saturating_sub(lines.unsigned_abs() as usize)
            } else {
                scroll.saturating_add(lines as usize)
            };
        }
    }

    /// Keeps the room scroll within the number of lines that can scroll.
    pub(crate) fn clamp_scroll(&mut self, max_scroll: usize) {
        if let Page::Room { scroll, .. } = &mut self.active {
            *scroll = (*scroll).min(max_scroll);
        }
    }

    pub(crate) fn navigate(&mut self, destination: Destination) {
        let next = match &destination {
            Destination::Page(page) => match self.site.rooms.by_page(page) {
                Some(room) => Page::Room {
                    key: room.key.clone(),
                    page: page.clone(),
                    scroll: 0,
                },
                None => {
                    warn!(page = %page, "page_has_no_room_content");
                    Page::External {
                        target: page.clone(),
                    }
                }
            },
            Destination::External(url) => Page::External {
                target: url.clone(),
            },
        };
        self.replace_active(next);
    }

    /// Back from a destination page flags the return trip and reloads the
    /// world; back from the world quits.
    fn go_back(&mut self) -> PageCommand {
        let from_page = match &self.active {
            Page::World(_) => return PageCommand::Quit,
            Page::Room { page, .. } => page.clone(),
            Page::External { target } => target.clone(),
        };
        if let Err(error) = mark_return_from_page(self.site.storage.as_ref(), &from_page) {
            warn!(error = %error, "return_flag_write_failed");
        }
        let world = load_world(&self.site);
        self.replace_active(Page::World(Box::new(world)));
        PageCommand::None
    }

    fn replace_active(&mut self, next: Page) {
        let previous = std::mem::replace(&mut self.active, next);
        let from = previous.label().to_string();
        if let Page::World(engine) = previous {
            engine.dispose();
        }
        self.page_loads += 1;
        self.scroll_timer = 0;
        info!(from = %from, to = self.active.label(), page_loads = self.page_loads, "page_loaded");
    }

    pub(crate) fn shutdown(&mut self) {
        let active = std::mem::replace(
            &mut self.active,
            Page::External {
                target: String::new(),
            },
        );
        if let Page::World(engine) = active {
            engine.dispose();
        }
    }
}

fn load_world(site: &Site) -> GameEngine {
    let fallback_size = (site.engine.default_map_width, site.engine.default_map_height);
    let assets = AssetStore::spawn_loads(&site.assets, &site.asset_dir, fallback_size);
    GameEngine::new(
        site.engine.clone(),
        site.destinations.clone(),
        assets,
        Rc::clone(&site.storage),
    )
}
