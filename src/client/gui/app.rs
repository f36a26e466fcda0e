use iced::{Application, Command, Element, Theme};
use std::sync::Arc;

use crate::client::models::app_state::{AppState, DeskAppState};
use crate::client::models::messages::Message;
use crate::client::services::support_api::SupportApi;
use crate::config::Config;

pub struct DeskApp {
    pub state: DeskAppState,
    pub api: Arc<SupportApi>,
}

impl Application for DeskApp {
    type Message = Message;
    type Theme = Theme;
    type Executor = iced::executor::Default;
    type Flags = ();

    fn new(_flags: ()) -> (Self, Command<Message>) {
        let config = Config::from_env();
        log::info!("support backend at {}", config.base_url());
        let app = DeskApp {
            state: DeskAppState::default(),
            api: Arc::new(SupportApi::new(&config)),
        };
        // Load the ticket catalog straight away.
        let cmd = Command::perform(async { Message::ReloadTickets }, |msg| msg);
        (app, cmd)
    }

    fn title(&self) -> String {
        "Astrodesk Support".to_string()
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        self.state.update(message, &self.api)
    }

    fn view(&self) -> Element<Message> {
        match &self.state.app_state {
            AppState::TicketsList => crate::client::gui::views::tickets_list::view(&self.state),
            AppState::TicketView(_) => crate::client::gui::views::ticket_view::view(&self.state),
        }
    }
}
