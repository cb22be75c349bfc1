use std::{path::PathBuf, process::exit};

use clap::Parser;
use frosttip_core::delay_from_millis;
use iced::{
    Alignment, Event, Length, Settings, Size, Subscription, Task, Theme,
    event,
    widget::{
        Column, Container, Row, container, scrollable,
        scrollable::AbsoluteOffset, stack, text,
    },
    window,
};
use tracing::{error, info};
use tracing_subscriber::{
    Layer,
    fmt::{self},
    layer::SubscriberExt,
    reload,
    util::SubscriberInitExt,
};

use crate::{
    cli::{Cli, SubCommand},
    config::Config,
    file_watcher::{FileWatcherEvent, watch_file},
    hover::{HoverMsg, HoverTips, trigger},
    utils::{
        log::{LogManager, get_default_filter},
        notification,
    },
    viewport::ViewportMetrics,
};

mod cli;
mod config;
mod file_watcher;
mod hover;
mod style;
mod utils;
mod viewport;

type Element<'a> = iced::Element<'a, Message>;

pub const APP_NAMESPACE: &str = "FrostTip";

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

pub fn main() -> iced::Result {
    let cli = Cli::parse();

    if let Some(sub) = cli.subcommand {
        match sub {
            SubCommand::Validate => {
                let ok = Config::validate(cli.config);
                exit(i32::from(!ok));
            }
        }
    }

    let stderr_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_line_number(true)
        .with_filter(get_default_filter());

    let (file_layer, handle) = reload::Layer::new(None);
    let file_layer = file_layer.with_filter(get_default_filter());

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    let logs = LogManager::init();
    let logfile_path = logs.setup_logging(&handle);

    info!("starting version {}", env!("CARGO_PKG_VERSION"));
    info!("saving logs to {}", logfile_path.display());

    let (config, config_path) = Config::init(cli.config);

    iced::application(Playground::title, Playground::update, Playground::view)
        .subscription(Playground::subscription)
        .theme(Playground::theme)
        .settings(Settings {
            id: Some(APP_NAMESPACE.to_string()),
            antialiasing: true,
            ..Default::default()
        })
        .window_size(Size::new(900.0, 620.0))
        .run_with(move || Playground::new(config, config_path))
}

#[derive(Debug, Clone)]
pub enum Message {
    IcedEvent(Event),
    PageScrolled(AbsoluteOffset),
    Hover(HoverMsg),
    ConfigWatcher(FileWatcherEvent),
}

struct DemoLabel {
    id: container::Id,
    text: String,
    tip: String,
}

struct DemoColumn {
    align: Alignment,
    labels: Vec<DemoLabel>,
}

pub struct Playground {
    config: Config,
    config_path: PathBuf,
    viewport: ViewportMetrics,
    tips: HoverTips,
    sections: Vec<DemoColumn>,
}

#[profiling::all_functions]
impl Playground {
    pub fn new(config: Config, config_path: PathBuf) -> (Self, Task<Message>) {
        let mut tips = HoverTips::default();
        let sections = build_demo(&config, &mut tips);

        (
            Self {
                config,
                config_path,
                viewport: ViewportMetrics::default(),
                tips,
                sections,
            },
            Task::none(),
        )
    }

    fn title(&self) -> String {
        String::from(APP_NAMESPACE)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            event::listen_with(window_events),
            watch_file(self.config_path.clone()),
        ])
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::IcedEvent(event) => {
                // The size is tracked regardless; visible tooltips react.
                if self.viewport.on_window_event(&event)
                    && self.tips.any_visible()
                {
                    return self.tips.reposition();
                }
                Task::none()
            }
            Message::PageScrolled(offset) => {
                if self.viewport.on_scroll(offset) && self.tips.any_visible() {
                    return self.tips.reposition();
                }
                Task::none()
            }
            Message::Hover(hover_msg) => {
                self.tips.update(hover_msg, &self.viewport)
            }
            Message::ConfigWatcher(event) => {
                match event {
                    FileWatcherEvent::Changed => return self.reload_config(),
                    FileWatcherEvent::Missing => {
                        notification(&format!(
                            "Config file not found at {}",
                            self.config_path.display()
                        ));
                    }
                }
                Task::none()
            }
        }
    }

    pub fn view(&self) -> Element<'_> {
        let overlay = self.tips.overlay_layer(
            &self.config.style,
            &self.viewport,
            |id| self.tip_content(id),
        );

        stack![self.view_page(), overlay].into()
    }

    #[inline(always)]
    fn view_page(&self) -> Element<'_> {
        let header = Column::new()
            .push(text("FrostTip playground").size(24))
            .push(
                text(
                    "Hover a chip to raise its tooltip; \
                     scroll and resize to watch it follow.",
                )
                .size(14),
            )
            .spacing(8);

        let columns = self
            .sections
            .iter()
            .map(|column| {
                let chips = column
                    .labels
                    .iter()
                    .fold(Column::new().spacing(56), |col, label| {
                        col.push(trigger(&label.id, chip(&label.text)))
                    })
                    .align_x(column.align);

                Container::new(chips)
                    .width(Length::Fill)
                    .align_x(column.align)
                    .into()
            })
            .collect::<Vec<Element<'_>>>();

        let page = Column::new()
            .push(header)
            .push(Row::with_children(columns).spacing(24))
            .padding(24)
            .spacing(48)
            .width(Length::Fill);

        scrollable(page)
            .on_scroll(|viewport| {
                Message::PageScrolled(viewport.absolute_offset())
            })
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn tip_content(&self, id: &container::Id) -> Option<Element<'_>> {
        self.sections
            .iter()
            .flat_map(|column| &column.labels)
            .find(|label| &label.id == id)
            .map(|label| text(label.tip.as_str()).size(14).into())
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }

    fn reload_config(&mut self) -> Task<Message> {
        match Config::load(&self.config_path) {
            Ok(new_config) => {
                info!("config changed, rebuilding the page");
                self.config = new_config;
                // Rebuilding unmounts every live tooltip first: timers
                // abort, overlays leave the tree.
                self.sections = build_demo(&self.config, &mut self.tips);
            }
            Err(e) => {
                error!("{:?}", miette::Report::new(e));
                notification(
                    "Failed to parse config file\nrun `frosttip validate` to see the errors",
                );
            }
        }
        Task::none()
    }
}

fn window_events(
    event: Event,
    _status: event::Status,
    _window: window::Id,
) -> Option<Message> {
    match &event {
        Event::Window(
            window::Event::Opened { .. } | window::Event::Resized(_),
        ) => Some(Message::IcedEvent(event)),
        _ => None,
    }
}

fn build_demo(config: &Config, tips: &mut HoverTips) -> Vec<DemoColumn> {
    tips.clear();
    let default_delay = config.tooltip.delay();

    [
        (&config.left, Alignment::Start),
        (&config.center, Alignment::Center),
        (&config.right, Alignment::End),
    ]
    .into_iter()
    .map(|(section, align)| {
        let labels = section
            .labels
            .iter()
            .map(|label| {
                let id = container::Id::unique();
                let delay =
                    label.delay.map_or(default_delay, delay_from_millis);
                tips.register(id.clone(), delay);

                DemoLabel {
                    id,
                    text: label.text.clone(),
                    tip: label.tip.clone(),
                }
            })
            .collect();

        DemoColumn { align, labels }
    })
    .collect()
}

fn chip(label: &str) -> Element<'_> {
    Container::new(text(label)).padding(8).style(style::chip).into()
}
