use std::sync::Arc;
use std::time::{Duration, Instant};

use iced::keyboard::{self, Key};
use iced::widget::image::Handle;
use iced::widget::{canvas, column, container, row, stack, Space};
use iced::{Alignment, Element, Length, Size, Subscription, Task, Theme};

mod book;
mod color;
mod error;
mod gpu;
mod page;
mod state;
mod ui;

use book::{Book, Direction, InputAdapter, Intent};
use gpu::MeshRenderer;
use page::assets::{self, PhotoSet};
use state::config::BookConfig;
use state::navigation::Panel;
use state::quality::Quality;
use state::store::ContentStore;
use ui::canvas::{BookProfile, PROFILE_HEIGHT};

/// Width of the floating panels
const PANEL_WIDTH: f32 = 620.0;

/// Main application state
struct BookViewer {
    book: Book,
    /// Turns raw keys, wheel and pointer events into intents
    input: InputAdapter,
    viewport: Size,
    /// Time of the previous animation frame; None while at rest
    last_tick: Option<Instant>,
    frame_interval: Duration,
    /// None until the adapter is found, or after a failed render
    renderer: Option<Arc<MeshRenderer>>,
    /// Last rendered spread; the image layers stand in without it
    scene: Option<Handle>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// Animation clock
    Tick(Instant),
    Key(Key),
    /// Scroll deltas, positive = down / right
    Wheel { dx: f32, dy: f32 },
    PointerDown { x: f32, width: f32 },
    PointerMoved(f32),
    PointerUp,
    Resized(Size),
    /// Arrow buttons
    Turn(Direction),
    /// Contents entry clicked
    JumpTo(usize),
    ToggleContents,
    ToggleSettings,
    SetQuality(Quality),
    /// Background photo preload finished
    PhotosLoaded(Arc<PhotoSet>),
    RendererReady(Result<Arc<MeshRenderer>, String>),
}

impl BookViewer {
    fn new() -> (Self, Task<Message>) {
        let config = BookConfig::load_or_default();

        // The dataset is compiled in; failing to parse it is a build defect
        let store = ContentStore::builtin().expect("Bundled animal records are invalid");
        let preload = Task::perform(
            assets::preload(config.photo_dir(), store.image_files()),
            Message::PhotosLoaded,
        );

        let book = Book::new(store, &config);
        let viewer = BookViewer {
            book,
            input: InputAdapter::new(Duration::from_millis(config.wheel_throttle_ms)),
            viewport: Size::new(1280.0, 860.0),
            last_tick: None,
            frame_interval: Duration::from_millis(config.frame_interval_ms.max(1)),
            renderer: None,
            scene: None,
        };

        let renderer = Task::perform(MeshRenderer::new(), |result| {
            Message::RendererReady(result.map(Arc::new).map_err(|e| e.to_string()))
        });

        (viewer, Task::batch([preload, renderer]))
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick(now) => {
                let dt = self
                    .last_tick
                    .map(|last| now.saturating_duration_since(last).as_secs_f32())
                    .unwrap_or(0.0);
                self.book.step(dt);
                self.last_tick = (!self.book.is_at_rest()).then_some(now);
            }
            Message::Key(key) => {
                if let Some(intent) = self.input.key(&key) {
                    self.apply(intent);
                }
            }
            Message::Wheel { dx, dy } => {
                if let Some(intent) = self.input.wheel(dx, dy, Instant::now()) {
                    self.apply(intent);
                }
            }
            Message::PointerDown { x, width } => {
                let intent = self.input.pointer_down(x, width);
                if self.book.handle(intent) {
                    self.input.drag_accepted();
                }
            }
            Message::PointerMoved(x) => {
                if let Some(intent) = self.input.pointer_moved(x) {
                    self.apply(intent);
                }
            }
            Message::PointerUp => {
                if let Some(intent) = self.input.pointer_up() {
                    self.apply(intent);
                }
            }
            Message::Resized(size) => {
                self.viewport = size;
            }
            Message::Turn(direction) => self.apply(Intent::Turn(direction)),
            Message::JumpTo(spread) => self.apply(Intent::JumpTo(spread)),
            Message::ToggleContents => self.book.toggle_contents(),
            Message::ToggleSettings => self.book.toggle_settings(),
            Message::SetQuality(quality) => self.book.set_quality(quality),
            Message::PhotosLoaded(photos) => {
                log::info!(
                    "📸 {} photos decoded, {} missing",
                    photos.len(),
                    photos.failed().len()
                );
                self.book.photos_loaded(photos);
            }
            Message::RendererReady(Ok(renderer)) => {
                self.renderer = Some(renderer);
            }
            Message::RendererReady(Err(e)) => {
                log::warn!("⚠️  No mesh renderer, using flat pages: {}", e);
            }
        }

        self.redraw();
        Task::none()
    }

    /// Render the current frame through the mesh renderer, if there is one
    fn redraw(&mut self) {
        let Some(renderer) = &self.renderer else {
            return;
        };
        let page = ui::spread::page_size(self.viewport);
        let draws = gpu::scene::build(self.book.frame(), self.book.surface());

        match renderer.render(&draws, (page.width * 2.0) as u32, page.height as u32) {
            Ok(image) => {
                let (width, height) = image.dimensions();
                self.scene = Some(Handle::from_rgba(width, height, image.into_raw()));
            }
            Err(e) => {
                log::warn!("⚠️  Mesh render failed, falling back to flat pages: {}", e);
                self.renderer = None;
                self.scene = None;
            }
        }
    }

    fn apply(&mut self, intent: Intent) {
        if !self.book.handle(intent) {
            log::trace!("Ignored {:?}", intent);
        }
    }

    fn view(&self) -> Element<'_, Message> {
        let frame = self.book.frame();
        let nav = self.book.nav();
        let page = ui::spread::page_size(self.viewport);

        let reader = column![
            ui::panels::toolbar(nav),
            container(
                row![
                    ui::panels::arrow(Direction::Backward, nav),
                    ui::spread::view(frame, self.scene.as_ref(), page),
                    ui::panels::arrow(Direction::Forward, nav),
                ]
                .spacing(16)
                .align_y(Alignment::Center),
            )
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill),
            Space::with_height(Length::Fixed(PROFILE_HEIGHT)),
        ];

        // Front row of the sheet mesh, spine to free edge
        let surface = self.book.surface();
        let sheet = if surface.is_visible() {
            surface.positions()[..=surface.segments()]
                .iter()
                .map(|p| (p.x, p.y))
                .collect()
        } else {
            Vec::new()
        };
        let profile = canvas(BookProfile {
            frame,
            sheet,
            clearance: frame.sheet.as_ref().map_or(0.0, |s| s.clearance),
            accepts_drags: nav.panel().is_none(),
        })
        .width(Length::Fill)
        .height(Length::Fill);

        // The profile canvas sits underneath so buttons win the clicks
        let mut layers: Vec<Element<Message>> = vec![profile.into(), reader.into()];

        let panel = match nav.panel() {
            Some(Panel::Contents) => Some(ui::panels::contents_panel(&self.book)),
            Some(Panel::Settings) => Some(ui::panels::settings_panel(&self.book)),
            None => None,
        };
        if let Some(panel) = panel {
            layers.push(
                column![
                    Space::with_height(Length::Fixed(56.0)),
                    container(panel).max_width(PANEL_WIDTH).padding([0, 16]),
                ]
                .into(),
            );
        }

        stack(layers).into()
    }

    fn subscription(&self) -> Subscription<Message> {
        let clock = if self.book.is_at_rest() {
            Subscription::none()
        } else {
            iced::time::every(self.frame_interval).map(Message::Tick)
        };

        Subscription::batch([
            clock,
            keyboard::on_key_press(|key, _modifiers| Some(Message::Key(key))),
            iced::window::resize_events().map(|(_id, size)| Message::Resized(size)),
        ])
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    iced::application("Book of Animals", BookViewer::update, BookViewer::view)
        .subscription(BookViewer::subscription)
        .theme(BookViewer::theme)
        .window_size(Size::new(1280.0, 860.0))
        .centered()
        .run_with(BookViewer::new)
}
