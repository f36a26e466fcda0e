use iced::widget::{Button, Column, Container, Row, Scrollable, Space, Text, TextInput};
use iced::{Alignment, Color, Element, Font, Length};

use crate::client::gui::views::logger;
use crate::client::gui::widgets::status_chip::status_chip;
use crate::client::models::app_state::DeskAppState;
use crate::client::models::messages::Message;
use crate::client::models::ticket::{format_datetime, Ticket};

// Palette consistent with ticket_view.rs
const BG_MAIN: Color = Color::from_rgb(0.06, 0.07, 0.18);
const CARD_BG: Color = Color::from_rgb(0.18, 0.19, 0.36);
const INPUT_BG: Color = Color::from_rgb(0.12, 0.13, 0.26);
const TEXT_PRIMARY: Color = Color::WHITE;
const TEXT_SECONDARY: Color = Color::from_rgb(0.7, 0.7, 0.7);

const EMOJI_FONT: Font = Font::with_name("Segoe UI Emoji");
const BOLD_FONT: Font = Font {
    family: iced::font::Family::SansSerif,
    weight: iced::font::Weight::Bold,
    ..Font::DEFAULT
};

fn bg_main_appearance(_: &iced::Theme) -> iced::widget::container::Appearance {
    iced::widget::container::Appearance {
        background: Some(iced::Background::Color(BG_MAIN)),
        text_color: Some(TEXT_PRIMARY),
        ..Default::default()
    }
}

fn header_appearance(_: &iced::Theme) -> iced::widget::container::Appearance {
    iced::widget::container::Appearance {
        background: Some(iced::Background::Color(INPUT_BG)),
        text_color: Some(TEXT_PRIMARY),
        shadow: iced::Shadow {
            offset: iced::Vector::new(0.0, 2.0),
            blur_radius: 8.0,
            color: Color::from_rgba(0.0, 0.0, 0.0, 0.2),
        },
        ..Default::default()
    }
}

fn input_appearance(_: &iced::Theme) -> iced::widget::container::Appearance {
    iced::widget::container::Appearance {
        background: Some(iced::Background::Color(INPUT_BG)),
        text_color: Some(TEXT_PRIMARY),
        border: iced::Border {
            width: 1.0,
            color: Color::from_rgb(0.3, 0.3, 0.4),
            radius: 12.0.into(),
        },
        ..Default::default()
    }
}

fn ticket_item_appearance(_: &iced::Theme) -> iced::widget::container::Appearance {
    iced::widget::container::Appearance {
        background: Some(iced::Background::Color(CARD_BG)),
        text_color: Some(TEXT_PRIMARY),
        border: iced::Border {
            width: 1.0,
            color: Color::from_rgb(0.2, 0.2, 0.3),
            radius: 12.0.into(),
        },
        shadow: iced::Shadow {
            offset: iced::Vector::new(0.0, 2.0),
            blur_radius: 6.0,
            color: Color::from_rgba(0.0, 0.0, 0.0, 0.2),
        },
        ..Default::default()
    }
}

fn count_badge(label: String) -> Element<'static, Message> {
    Container::new(Text::new(label).size(12).style(TEXT_SECONDARY))
        .padding([4, 10])
        .style(iced::theme::Container::Custom(Box::new(|_: &iced::Theme| {
            iced::widget::container::Appearance {
                background: Some(iced::Background::Color(INPUT_BG)),
                border: iced::Border {
                    radius: 12.0.into(),
                    ..Default::default()
                },
                ..Default::default()
            }
        })))
        .into()
}

pub fn view(state: &DeskAppState) -> Element<'_, Message> {
    let title_section = Column::new()
        .spacing(4)
        .push(
            Row::new()
                .spacing(8)
                .align_items(Alignment::Center)
                .push(Text::new("🎫").font(EMOJI_FONT).size(24))
                .push(Text::new("Support Tickets").font(BOLD_FONT).size(24).style(TEXT_PRIMARY)),
        )
        .push(Text::new("Conversations with customers and astrologers").size(14).style(TEXT_SECONDARY));

    let reload_label = if state.loading_tickets { "Loading..." } else { "Reload" };
    let mut reload_button = Button::new(Text::new(reload_label).size(14))
        .style(iced::theme::Button::Secondary)
        .padding(12);
    if !state.loading_tickets {
        reload_button = reload_button.on_press(Message::ReloadTickets);
    }

    let header = Container::new(
        Row::new()
            .spacing(16)
            .align_items(Alignment::Center)
            .push(title_section)
            .push(Space::new(Length::Fill, Length::Fixed(0.0)))
            .push(reload_button),
    )
    .padding([20, 24])
    .width(Length::Fill)
    .style(iced::theme::Container::Custom(Box::new(header_appearance)));

    let search_input = Container::new(
        TextInput::new("Search by user name...", &state.search_query)
            .on_input(Message::SearchQueryChanged)
            .padding(12)
            .size(14)
            .width(Length::Fill),
    )
    .style(iced::theme::Container::Custom(Box::new(input_appearance)));

    let filtered = state.filtered_tickets();
    let counts_row = Row::new()
        .spacing(8)
        .align_items(Alignment::Center)
        .push(count_badge(format!("Total: {}", filtered.len())))
        .push(count_badge(format!("Open: {}", state.open_count())))
        .push(count_badge(format!("Closed: {}", state.closed_count())));

    let mut list_col = Column::new().spacing(8);
    if filtered.is_empty() {
        let hint = if state.loading_tickets {
            "Loading tickets..."
        } else {
            "No tickets found."
        };
        list_col = list_col.push(
            Container::new(Text::new(hint).size(14).style(TEXT_SECONDARY))
                .width(Length::Fill)
                .center_x()
                .padding(40),
        );
    } else {
        for ticket in filtered {
            list_col = list_col.push(ticket_item(ticket));
        }
    }

    let content = Column::new()
        .push(header)
        .push(logger::logger_view(&state.logger))
        .push(Space::new(Length::Fill, Length::Fixed(16.0)))
        .push(Container::new(search_input).padding([0, 24]))
        .push(Space::new(Length::Fill, Length::Fixed(12.0)))
        .push(Container::new(counts_row).padding([0, 24]))
        .push(Space::new(Length::Fill, Length::Fixed(12.0)))
        .push(
            Container::new(
                Scrollable::new(list_col.padding([0, 24])).width(Length::Fill).height(Length::Fill),
            )
            .width(Length::Fill)
            .height(Length::Fill),
        )
        .push(Space::new(Length::Fill, Length::Fixed(24.0)))
        .width(Length::Fill)
        .height(Length::Fill);

    Container::new(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .style(iced::theme::Container::Custom(Box::new(bg_main_appearance)))
        .into()
}

fn ticket_item(ticket: &Ticket) -> Element<'_, Message> {
    let description = ticket.description.as_deref().unwrap_or("-");
    let summary = Column::new()
        .spacing(2)
        .push(
            Row::new()
                .spacing(8)
                .align_items(Alignment::Center)
                .push(Text::new(ticket.requester_name()).font(BOLD_FONT).size(16).style(TEXT_PRIMARY))
                .push(
                    Text::new(ticket.user_type.as_deref().unwrap_or("-").to_string())
                        .size(12)
                        .style(TEXT_SECONDARY),
                ),
        )
        .push(Text::new(truncate(description, 80)).size(12).style(TEXT_SECONDARY))
        .push(
            Text::new(format_datetime(&ticket.created_at))
                .size(11)
                .style(TEXT_SECONDARY),
        );

    let view_button = Button::new(Text::new("View").size(13))
        .style(iced::theme::Button::Primary)
        .on_press(Message::OpenTicket(ticket.id.clone()))
        .padding([8, 14]);

    Container::new(
        Row::new()
            .spacing(16)
            .align_items(Alignment::Center)
            .push(summary)
            .push(Space::new(Length::Fill, Length::Fixed(0.0)))
            .push(status_chip(&ticket.status))
            .push(view_button),
    )
    .padding(16)
    .width(Length::Fill)
    .style(iced::theme::Container::Custom(Box::new(ticket_item_appearance)))
    .into()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}…", cut.trim_end())
    }
}
