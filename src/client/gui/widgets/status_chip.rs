use iced::widget::{Container, Text};
use iced::{Color, Element};

use crate::client::models::messages::Message;

const OPEN_BG: Color = Color::from_rgb(0.13, 0.45, 0.25);
const CLOSED_BG: Color = Color::from_rgb(0.55, 0.15, 0.15);

/// Rounded status pill used by the ticket catalog and the detail pane.
/// Open tickets show green, everything else red, mirroring how the rest of
/// the app treats any non-open status as final.
pub fn status_chip<'a>(status: &str) -> Element<'a, Message> {
    let label = if status.trim().is_empty() {
        "-".to_string()
    } else {
        status.trim().to_lowercase()
    };
    let bg = if status.trim().eq_ignore_ascii_case("open") {
        OPEN_BG
    } else {
        CLOSED_BG
    };
    Container::new(Text::new(label).size(12).style(Color::WHITE))
        .padding([4, 10])
        .style(iced::theme::Container::Custom(Box::new(move |_: &iced::Theme| {
            iced::widget::container::Appearance {
                background: Some(iced::Background::Color(bg)),
                border: iced::Border {
                    radius: 10.0.into(),
                    ..Default::default()
                },
                ..Default::default()
            }
        })))
        .into()
}
