use iced::widget::container::Appearance;
use iced::widget::{Container, Row, Text};
use iced::{Element, Font, Length};

use crate::client::models::messages::Message;

#[derive(Debug, Clone)]
pub enum LogLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct LogMessage {
    pub level: LogLevel,
    pub message: String,
}

impl LogMessage {
    pub fn emoji(&self) -> &'static str {
        match self.level {
            LogLevel::Success => "✅",
            LogLevel::Error => "❌",
            LogLevel::Info => "ℹ️",
        }
    }

    pub fn color(&self) -> iced::Color {
        match self.level {
            LogLevel::Success => iced::Color::from_rgb(0.2, 0.8, 0.4),
            LogLevel::Error => iced::Color::from_rgb(1.0, 0.2, 0.2),
            LogLevel::Info => iced::Color::from_rgb(0.2, 0.6, 1.0),
        }
    }
}

/// Alert bar showing the latest notification (one at a time). The state
/// layer schedules a ClearLog shortly after each push.
pub fn logger_view(messages: &[LogMessage]) -> Element<'_, Message> {
    if let Some(log) = messages.iter().next_back() {
        let bg_color = log.color();
        Container::new(
            Row::new()
                .spacing(12)
                .push(
                    Text::new(log.emoji())
                        .font(Font::with_name("Segoe UI Emoji"))
                        .size(18)
                        .style(iced::Color::WHITE),
                )
                .push(Text::new(&log.message).size(16).style(iced::Color::WHITE)),
        )
        .padding([12, 16])
        .width(Length::Fill)
        .style(iced::theme::Container::Custom(Box::new(move |_: &iced::Theme| {
            Appearance {
                background: Some(iced::Background::Color(bg_color)),
                text_color: Some(iced::Color::WHITE),
                border: iced::Border {
                    radius: 8.0.into(),
                    ..Default::default()
                },
                shadow: iced::Shadow {
                    offset: iced::Vector::new(0.0, 4.0),
                    blur_radius: 12.0,
                    color: iced::Color::from_rgba(0.0, 0.0, 0.0, 0.3),
                },
            }
        })))
        .into()
    } else {
        // Empty placeholder
        iced::widget::Space::new(iced::Length::Fill, iced::Length::Fixed(0.0)).into()
    }
}
