use chrono::Local;
use iced::widget::{scrollable, Button, Column, Container, Row, Scrollable, Space, Text, TextInput};
use iced::{Alignment, Color, Element, Font, Length};

use crate::client::gui::views::logger;
use crate::client::gui::views::ticket_details;
use crate::client::gui::widgets::status_chip::status_chip;
use crate::client::models::app_state::DeskAppState;
use crate::client::models::conversation::format_message_time;
use crate::client::models::messages::Message;
use crate::client::models::ticket::{ChatMessage, MessageKind};

const BG_MAIN: Color = Color::from_rgb(0.06, 0.07, 0.18);
const CHAT_BG: Color = Color::from_rgb(0.08, 0.09, 0.20);
const SUPPORT_MESSAGE_BG: Color = Color::from_rgb(0.0, 0.7, 0.3);
const REQUESTER_MESSAGE_BG: Color = Color::from_rgb(0.2, 0.4, 0.8);
const INPUT_BG: Color = Color::from_rgb(0.12, 0.13, 0.26);
const TEXT_PRIMARY: Color = Color::WHITE;
const TEXT_SECONDARY: Color = Color::from_rgb(0.7, 0.7, 0.7);

const BOLD_FONT: Font = Font {
    family: iced::font::Family::SansSerif,
    weight: iced::font::Weight::Bold,
    ..Font::DEFAULT
};

const EMOJI_FONT: Font = Font::with_name("Segoe UI Emoji");

pub fn view(state: &DeskAppState) -> Element<'_, Message> {
    let back_btn = Button::new(Text::new("← Back").size(16))
        .on_press(Message::BackToTickets)
        .style(iced::theme::Button::Secondary)
        .padding(8);

    let (title, status) = match &state.open_ticket {
        Some(t) => (t.requester_name().to_string(), t.status.clone()),
        None => ("Support ticket".to_string(), String::new()),
    };
    let ticket_info = Column::new()
        .push(Text::new(title).font(BOLD_FONT).size(20).style(TEXT_PRIMARY))
        .push(
            Text::new(
                state
                    .open_ticket
                    .as_ref()
                    .map(|t| t.id.clone())
                    .unwrap_or_default(),
            )
            .size(12)
            .style(TEXT_SECONDARY),
        )
        .spacing(2);

    let header = Container::new(
        Row::new()
            .spacing(12)
            .align_items(Alignment::Center)
            .push(back_btn)
            .push(ticket_info)
            .push(Space::new(Length::Fill, Length::Fixed(0.0)))
            .push(status_chip(&status)),
    )
    .padding([12, 16])
    .width(Length::Fill)
    .style(iced::theme::Container::Custom(Box::new(|_: &iced::Theme| {
        iced::widget::container::Appearance {
            background: Some(iced::Background::Color(INPUT_BG)),
            ..Default::default()
        }
    })));

    let body: Element<'_, Message> = if state.open_ticket.is_none() {
        let placeholder = if state.loading_ticket {
            "Loading ticket..."
        } else {
            "Ticket unavailable."
        };
        Container::new(Text::new(placeholder).size(16).style(TEXT_SECONDARY))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x()
            .center_y()
            .into()
    } else {
        Row::new()
            .spacing(16)
            .padding([12, 16])
            .push(
                Container::new(ticket_details::pane(state))
                    .width(Length::Fixed(340.0))
                    .height(Length::Fill),
            )
            .push(build_chat_pane(state))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    };

    let content = Column::new()
        .push(header)
        .push(logger::logger_view(&state.logger))
        .push(body)
        .width(Length::Fill)
        .height(Length::Fill);

    Container::new(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .style(iced::theme::Container::Custom(Box::new(|_: &iced::Theme| {
            iced::widget::container::Appearance {
                background: Some(iced::Background::Color(BG_MAIN)),
                ..Default::default()
            }
        })))
        .into()
}

fn build_chat_pane(state: &DeskAppState) -> Element<'_, Message> {
    Column::new()
        .push(build_messages_area(state))
        .push(build_input_area(state))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn build_messages_area(state: &DeskAppState) -> Element<'_, Message> {
    let mut messages_column = Column::new().spacing(8).padding([12, 16]);

    match &state.conversation {
        Some(convo) if !convo.messages.is_empty() => {
            let today = Local::now().date_naive();
            for group in convo.grouped_by_day(today) {
                messages_column = messages_column.push(
                    Container::new(
                        Text::new(group.label).font(BOLD_FONT).size(12).style(TEXT_SECONDARY),
                    )
                    .width(Length::Fill)
                    .center_x()
                    .padding([6, 0]),
                );
                for msg in group.messages {
                    messages_column = messages_column.push(create_message_bubble(msg));
                }
            }
        }
        _ => {
            messages_column = messages_column.push(
                Container::new(Text::new("No messages yet.").size(14).style(TEXT_SECONDARY))
                    .width(Length::Fill)
                    .center_x()
                    .padding(20),
            );
        }
    }

    // Bottom gap so the last bubble is not glued to the input row
    messages_column = messages_column.push(Space::new(Length::Fixed(0.0), Length::Fixed(20.0)));

    let scrollable_messages = Scrollable::new(messages_column)
        .width(Length::Fill)
        .height(Length::Fill)
        .id(scrollable::Id::new("chat_messages_scroll"));

    Container::new(scrollable_messages)
        .width(Length::Fill)
        .height(Length::Fill)
        .style(iced::theme::Container::Custom(Box::new(|_: &iced::Theme| {
            iced::widget::container::Appearance {
                background: Some(iced::Background::Color(CHAT_BG)),
                ..Default::default()
            }
        })))
        .into()
}

fn create_message_bubble(msg: &ChatMessage) -> Element<'_, Message> {
    let from_requester = msg.sender.is_requester_side();
    let bubble_color = if from_requester { REQUESTER_MESSAGE_BG } else { SUPPORT_MESSAGE_BG };

    let body: Element<'_, Message> = match msg.kind {
        MessageKind::Image => Row::new()
            .spacing(6)
            .align_items(Alignment::Center)
            .push(Text::new("📷").font(EMOJI_FONT).size(16))
            .push(Text::new(&msg.body).size(12).style(TEXT_PRIMARY))
            .into(),
        MessageKind::Text => Text::new(&msg.body).size(14).style(TEXT_PRIMARY).into(),
    };

    let message_content = Column::new()
        .push(body)
        .push(Space::new(Length::Fixed(0.0), Length::Fixed(4.0)))
        .push(
            Text::new(format_message_time(msg.timestamp))
                .size(10)
                .style(TEXT_SECONDARY),
        )
        .spacing(2);

    let bubble = Container::new(message_content)
        .padding([8, 12])
        .style(iced::theme::Container::Custom(Box::new(move |_: &iced::Theme| {
            iced::widget::container::Appearance {
                background: Some(iced::Background::Color(bubble_color)),
                border: iced::Border {
                    radius: 12.0.into(),
                    ..Default::default()
                },
                ..Default::default()
            }
        })))
        .width(Length::Fixed(280.0));

    let alignment = if from_requester {
        iced::alignment::Horizontal::Left
    } else {
        iced::alignment::Horizontal::Right
    };

    Container::new(bubble)
        .width(Length::Fill)
        .align_x(alignment)
        .into()
}

fn build_input_area(state: &DeskAppState) -> Element<'_, Message> {
    let closed = state
        .conversation
        .as_ref()
        .map(|c| !c.can_send())
        .unwrap_or(true);
    let busy = state.sending_message || state.uploading_attachment;

    let mut attachment_input = TextInput::new("Image path...", &state.attachment_path)
        .padding(12)
        .size(14)
        .width(Length::Fixed(200.0));
    if !closed {
        attachment_input = attachment_input.on_input(Message::AttachmentPathChanged);
    }

    let mut attach_button = Button::new(Text::new("📎").font(EMOJI_FONT).size(16))
        .style(iced::theme::Button::Secondary)
        .padding([12, 14]);
    if !closed && !busy && !state.attachment_path.trim().is_empty() {
        attach_button = attach_button.on_press(Message::SendAttachment);
    }

    let mut message_input = TextInput::new("Type a message", &state.chat_input)
        .padding(12)
        .size(14)
        .width(Length::Fill);
    if !closed {
        message_input = message_input.on_input(Message::ChatInputChanged);
        if !busy {
            message_input = message_input.on_submit(Message::SendChatMessage);
        }
    }

    let send_label = if busy { "Sending..." } else { "Send" };
    let mut send_button = Button::new(Text::new(send_label).size(14))
        .style(iced::theme::Button::Primary)
        .padding([12, 16]);
    if !closed && !busy && !state.chat_input.trim().is_empty() {
        send_button = send_button.on_press(Message::SendChatMessage);
    }

    let input_row = Row::new()
        .spacing(8)
        .align_items(Alignment::Center)
        .push(attachment_input)
        .push(attach_button)
        .push(message_input)
        .push(send_button);

    Container::new(input_row)
        .padding([12, 16])
        .width(Length::Fill)
        .style(iced::theme::Container::Custom(Box::new(|_: &iced::Theme| {
            iced::widget::container::Appearance {
                background: Some(iced::Background::Color(INPUT_BG)),
                border: iced::Border {
                    width: 1.0,
                    color: Color::from_rgb(0.2, 0.2, 0.2),
                    ..Default::default()
                },
                ..Default::default()
            }
        })))
        .into()
}
