use iced::widget::{Button, Column, Container, Row, Space, Text, TextInput};
use iced::{Alignment, Color, Element, Font, Length};

use crate::client::gui::widgets::status_chip::status_chip;
use crate::client::models::app_state::DeskAppState;
use crate::client::models::messages::Message;
use crate::client::models::ticket::{format_datetime, Ticket};

const CARD_BG: Color = Color::from_rgb(0.18, 0.19, 0.36);
const INPUT_BG: Color = Color::from_rgb(0.12, 0.13, 0.26);
const TEXT_PRIMARY: Color = Color::WHITE;
const TEXT_SECONDARY: Color = Color::from_rgb(0.7, 0.7, 0.7);

const BOLD_FONT: Font = Font {
    family: iced::font::Family::SansSerif,
    weight: iced::font::Weight::Bold,
    ..Font::DEFAULT
};

fn card_appearance(_: &iced::Theme) -> iced::widget::container::Appearance {
    iced::widget::container::Appearance {
        background: Some(iced::Background::Color(CARD_BG)),
        text_color: Some(TEXT_PRIMARY),
        border: iced::Border {
            radius: 12.0.into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn confirm_appearance(_: &iced::Theme) -> iced::widget::container::Appearance {
    iced::widget::container::Appearance {
        background: Some(iced::Background::Color(INPUT_BG)),
        text_color: Some(TEXT_PRIMARY),
        border: iced::Border {
            width: 1.0,
            color: Color::from_rgb(0.3, 0.3, 0.4),
            radius: 8.0.into(),
        },
        ..Default::default()
    }
}

/// Requester and ticket metadata, plus the close-ticket action.
pub fn pane(state: &DeskAppState) -> Element<'_, Message> {
    let Some(ticket) = &state.open_ticket else {
        return Space::new(Length::Fixed(0.0), Length::Fixed(0.0)).into();
    };

    let details = ticket.user_details.as_ref();
    let requester = Column::new()
        .spacing(2)
        .push(Text::new(ticket.requester_name()).font(BOLD_FONT).size(18).style(TEXT_PRIMARY))
        .push(
            Text::new(details.and_then(|d| d.email.clone()).unwrap_or_else(|| "-".into()))
                .size(12)
                .style(TEXT_SECONDARY),
        )
        .push(
            Text::new(details.and_then(|d| d.phone.clone()).unwrap_or_else(|| "-".into()))
                .size(12)
                .style(TEXT_SECONDARY),
        );

    let mut close_button = Button::new(Text::new("Close Ticket").size(13))
        .style(iced::theme::Button::Destructive)
        .padding([8, 12]);
    if ticket.is_open() && !state.confirm_close_open && !state.closing_ticket {
        close_button = close_button.on_press(Message::OpenCloseConfirm);
    }

    let header = Row::new()
        .spacing(12)
        .align_items(Alignment::Center)
        .push(requester)
        .push(Space::new(Length::Fill, Length::Fixed(0.0)))
        .push(close_button);

    let mut card = Column::new()
        .spacing(10)
        .padding(16)
        .push(header)
        .push(status_chip(&ticket.status))
        .push(detail_row("Ticket ID", ticket.id.clone()))
        .push(detail_row(
            "User Type",
            ticket.user_type.clone().unwrap_or_else(|| "-".into()),
        ))
        .push(detail_row(
            "Description",
            ticket.description.clone().unwrap_or_else(|| "-".into()),
        ))
        .push(detail_row("Created At", format_datetime(&ticket.created_at)))
        .push(detail_row("Updated At", format_datetime(&ticket.updated_at)))
        .push(detail_row("Messages", message_count(state, ticket).to_string()))
        .push(detail_row("Last Message", last_message_label(state, ticket)));

    if state.confirm_close_open {
        card = card.push(close_confirm(state));
    }

    Container::new(card)
        .width(Length::Fill)
        .style(iced::theme::Container::Custom(Box::new(card_appearance)))
        .into()
}

fn detail_row(label: &str, value: String) -> Element<'static, Message> {
    Row::new()
        .spacing(8)
        .push(
            Container::new(Text::new(label.to_string()).size(12).style(TEXT_SECONDARY))
                .width(Length::Fixed(90.0)),
        )
        .push(Text::new(value).size(12).style(TEXT_PRIMARY))
        .into()
}

/// The live conversation length, so optimistic appends count too.
fn message_count(state: &DeskAppState, ticket: &Ticket) -> usize {
    state
        .conversation
        .as_ref()
        .map(|c| c.messages.len())
        .unwrap_or(ticket.messages.len())
}

fn last_message_label(state: &DeskAppState, ticket: &Ticket) -> String {
    let last = state
        .conversation
        .as_ref()
        .and_then(|c| c.messages.last().and_then(|m| m.timestamp))
        .or_else(|| ticket.last_message_at());
    format_datetime(&last)
}

fn close_confirm(state: &DeskAppState) -> Element<'_, Message> {
    let remark_input = TextInput::new("Resolution remark", &state.close_remark)
        .on_input(Message::CloseRemarkChanged)
        .padding(10)
        .size(13)
        .width(Length::Fill);

    let cancel_button = Button::new(Text::new("Cancel").size(13))
        .style(iced::theme::Button::Secondary)
        .on_press(Message::CancelCloseConfirm)
        .padding([8, 12]);

    let confirm_label = if state.closing_ticket { "Closing..." } else { "Confirm" };
    let mut confirm_button = Button::new(Text::new(confirm_label).size(13))
        .style(iced::theme::Button::Destructive)
        .padding([8, 12]);
    if !state.close_remark.trim().is_empty() && !state.closing_ticket {
        confirm_button = confirm_button.on_press(Message::ConfirmCloseTicket);
    }

    Container::new(
        Column::new()
            .spacing(10)
            .push(
                Text::new("This will close the support ticket. Please add a resolution remark.")
                    .size(12)
                    .style(TEXT_SECONDARY),
            )
            .push(remark_input)
            .push(
                Row::new()
                    .spacing(8)
                    .push(Space::new(Length::Fill, Length::Fixed(0.0)))
                    .push(cancel_button)
                    .push(confirm_button),
            ),
    )
    .padding(12)
    .width(Length::Fill)
    .style(iced::theme::Container::Custom(Box::new(confirm_appearance)))
    .into()
}
