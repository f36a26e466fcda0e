use std::sync::Arc;

use anyhow::Context;
use iced::widget::scrollable;
use iced::Command;

use crate::client::gui::views::logger::{LogLevel, LogMessage};
use crate::client::models::conversation::{image_mime_for_path, Conversation};
use crate::client::models::messages::Message;
use crate::client::models::ticket::{MessageKind, Ticket};
use crate::client::services::support_api::SupportApi;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AppState {
    #[default]
    TicketsList,
    TicketView(String),
}

#[derive(Debug, Clone, Default)]
pub struct DeskAppState {
    pub app_state: AppState,
    // Catalog
    pub tickets: Vec<Ticket>,
    pub loading_tickets: bool,
    pub search_query: String,
    // Open ticket
    pub open_ticket: Option<Ticket>,
    pub conversation: Option<Conversation>,
    pub loading_ticket: bool,
    // Chat inputs; only one send or upload may be in flight at a time
    pub chat_input: String,
    pub attachment_path: String,
    pub sending_message: bool,
    pub uploading_attachment: bool,
    // Close-ticket confirmation
    pub confirm_close_open: bool,
    pub close_remark: String,
    pub closing_ticket: bool,
    // Alert bar
    pub logger: Vec<LogMessage>,
}

impl DeskAppState {
    /// Catalog rows: newest first, filtered by requester name.
    pub fn filtered_tickets(&self) -> Vec<&Ticket> {
        let query = self.search_query.trim().to_lowercase();
        let mut tickets: Vec<&Ticket> = self
            .tickets
            .iter()
            .filter(|t| {
                query.is_empty() || t.requester_name().to_lowercase().contains(&query)
            })
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tickets
    }

    pub fn open_count(&self) -> usize {
        self.filtered_tickets().iter().filter(|t| t.is_open()).count()
    }

    pub fn closed_count(&self) -> usize {
        self.filtered_tickets().iter().filter(|t| t.is_closed()).count()
    }

    fn send_in_flight(&self) -> bool {
        self.sending_message || self.uploading_attachment
    }

    fn log(&mut self, level: LogLevel, message: impl Into<String>) -> Command<Message> {
        self.logger.push(LogMessage { level, message: message.into() });
        auto_clear_log()
    }

    pub fn update(&mut self, message: Message, api: &Arc<SupportApi>) -> Command<Message> {
        match message {
            Message::ReloadTickets => {
                self.loading_tickets = true;
                let api = api.clone();
                return Command::perform(
                    async move {
                        match api.fetch_tickets().await {
                            Ok(tickets) => Message::TicketsLoaded { result: Ok(tickets) },
                            Err(e) => Message::TicketsLoaded { result: Err(e.to_string()) },
                        }
                    },
                    |msg| msg,
                );
            }
            Message::TicketsLoaded { result } => {
                self.loading_tickets = false;
                match result {
                    Ok(tickets) => {
                        log::info!("loaded {} support tickets", tickets.len());
                        self.tickets = tickets;
                    }
                    Err(e) => return self.log(LogLevel::Error, format!("Failed to load tickets: {}", e)),
                }
            }
            Message::SearchQueryChanged(query) => {
                self.search_query = query;
            }
            Message::OpenTicket(ticket_id) => {
                self.app_state = AppState::TicketView(ticket_id.clone());
                self.open_ticket = None;
                self.conversation = None;
                self.loading_ticket = true;
                self.chat_input.clear();
                self.attachment_path.clear();
                self.confirm_close_open = false;
                self.close_remark.clear();
                let api = api.clone();
                return Command::perform(
                    async move {
                        let result = match api.fetch_ticket(&ticket_id).await {
                            Ok(ticket) => Ok(Box::new(ticket)),
                            Err(e) => Err(e.to_string()),
                        };
                        Message::TicketLoaded { ticket_id, result }
                    },
                    |msg| msg,
                );
            }
            Message::BackToTickets => {
                self.app_state = AppState::TicketsList;
                self.open_ticket = None;
                self.conversation = None;
                self.loading_ticket = false;
                self.chat_input.clear();
                self.attachment_path.clear();
                self.confirm_close_open = false;
                self.close_remark.clear();
                // The ticket may have been closed meanwhile; refresh the list.
                return Command::perform(async { Message::ReloadTickets }, |msg| msg);
            }
            Message::TicketLoaded { ticket_id, result } => {
                // Ignore a response for a ticket the operator already left.
                if self.app_state != AppState::TicketView(ticket_id.clone()) {
                    log::debug!("dropping stale ticket load for {}", ticket_id);
                    return Command::none();
                }
                self.loading_ticket = false;
                match result {
                    Ok(ticket) => {
                        // A fresh snapshot replaces the conversation outright;
                        // optimistic appends the server has not echoed are gone.
                        self.conversation = Some(Conversation::from_ticket(&ticket));
                        self.open_ticket = Some(*ticket);
                        return snap_chat_to_bottom();
                    }
                    Err(e) => {
                        return self.log(LogLevel::Error, format!("Failed to load ticket: {}", e))
                    }
                }
            }
            Message::ChatInputChanged(input) => {
                self.chat_input = input;
            }
            Message::SendChatMessage => {
                let text = self.chat_input.trim().to_string();
                if text.is_empty() || self.send_in_flight() {
                    return Command::none();
                }
                let Some(convo) = &self.conversation else {
                    return Command::none();
                };
                if !convo.can_send() {
                    log::debug!("send blocked for ticket {:?} ({})", convo.ticket_id, convo.status);
                    return Command::none();
                }
                self.sending_message = true;
                let api = api.clone();
                let ticket_id = convo.ticket_id.clone();
                return Command::perform(
                    async move {
                        let result = match api
                            .send_support_message(&ticket_id, &text, MessageKind::Text)
                            .await
                        {
                            Ok(()) => Ok(text),
                            Err(e) => Err(e.to_string()),
                        };
                        Message::ChatMessageSent { result }
                    },
                    |msg| msg,
                );
            }
            Message::ChatMessageSent { result } => {
                self.sending_message = false;
                match result {
                    Ok(body) => {
                        if let Some(convo) = &mut self.conversation {
                            convo.push_local_text(body);
                        }
                        // Input clears only once the backend accepted the send.
                        self.chat_input.clear();
                        return snap_chat_to_bottom();
                    }
                    Err(e) => {
                        return self.log(LogLevel::Error, format!("Failed to send message: {}", e))
                    }
                }
            }
            Message::AttachmentPathChanged(path) => {
                self.attachment_path = path;
            }
            Message::SendAttachment => {
                let path = self.attachment_path.trim().to_string();
                if path.is_empty() || self.send_in_flight() {
                    return Command::none();
                }
                let Some(convo) = &self.conversation else {
                    return Command::none();
                };
                if !convo.can_send() {
                    log::debug!("attachment blocked for ticket {:?} ({})", convo.ticket_id, convo.status);
                    return Command::none();
                }
                // Extension gate runs before any file or network I/O.
                let Some(mime) = image_mime_for_path(&path) else {
                    return self.log(
                        LogLevel::Error,
                        "Please attach a valid image file (JPEG, PNG, GIF, or WEBP).",
                    );
                };
                self.uploading_attachment = true;
                let api = api.clone();
                let ticket_id = convo.ticket_id.clone();
                let max_bytes = api.max_upload_bytes;
                return Command::perform(
                    async move {
                        let result = upload_and_send(api, ticket_id, path, mime, max_bytes)
                            .await
                            .map_err(|e| format!("{:#}", e));
                        Message::AttachmentSent { result }
                    },
                    |msg| msg,
                );
            }
            Message::AttachmentSent { result } => {
                self.uploading_attachment = false;
                match result {
                    Ok(url) => {
                        if let Some(convo) = &mut self.conversation {
                            convo.push_local_image(url);
                        }
                        // Path clears only on success; a failed upload keeps it
                        // around for the operator to retry.
                        self.attachment_path.clear();
                        return snap_chat_to_bottom();
                    }
                    Err(e) => {
                        return self.log(LogLevel::Error, format!("Failed to send image: {}", e))
                    }
                }
            }
            Message::OpenCloseConfirm => {
                if self.open_ticket.as_ref().is_some_and(|t| t.is_open()) {
                    self.confirm_close_open = true;
                }
            }
            Message::CancelCloseConfirm => {
                self.confirm_close_open = false;
                self.close_remark.clear();
            }
            Message::CloseRemarkChanged(remark) => {
                self.close_remark = remark;
            }
            Message::ConfirmCloseTicket => {
                let remark = self.close_remark.trim().to_string();
                if remark.is_empty() || self.closing_ticket {
                    return Command::none();
                }
                let Some(ticket) = &self.open_ticket else {
                    return Command::none();
                };
                self.closing_ticket = true;
                let api = api.clone();
                let ticket_id = ticket.id.clone();
                return Command::perform(
                    async move {
                        let result = api
                            .close_ticket(&ticket_id, &remark)
                            .await
                            .map_err(|e| e.to_string());
                        Message::TicketClosed { result }
                    },
                    |msg| msg,
                );
            }
            Message::TicketClosed { result } => {
                self.closing_ticket = false;
                match result {
                    Ok(()) => {
                        self.confirm_close_open = false;
                        self.close_remark.clear();
                        let notice = self.log(LogLevel::Success, "Ticket closed");
                        // Refetch so the status chip and disabled chat reflect
                        // the new state (the snapshot replace path).
                        let AppState::TicketView(ticket_id) = &self.app_state else {
                            return notice;
                        };
                        self.loading_ticket = true;
                        let api = api.clone();
                        let ticket_id = ticket_id.clone();
                        let refetch = Command::perform(
                            async move {
                                let result = match api.fetch_ticket(&ticket_id).await {
                                    Ok(ticket) => Ok(Box::new(ticket)),
                                    Err(e) => Err(e.to_string()),
                                };
                                Message::TicketLoaded { ticket_id, result }
                            },
                            |msg| msg,
                        );
                        return Command::batch([notice, refetch]);
                    }
                    Err(e) => {
                        return self.log(LogLevel::Error, format!("Failed to close ticket: {}", e))
                    }
                }
            }
            Message::ClearLog => {
                self.logger.clear();
            }
        }
        Command::none()
    }
}

/// Read, upload and send one attachment; any step failing aborts the rest.
async fn upload_and_send(
    api: Arc<SupportApi>,
    ticket_id: String,
    path: String,
    mime: &str,
    max_bytes: u64,
) -> anyhow::Result<String> {
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("could not read {}", path))?;
    if bytes.len() as u64 > max_bytes {
        anyhow::bail!("attachment exceeds the {} MB upload limit", max_bytes / 1_048_576);
    }
    let filename = std::path::Path::new(&path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("attachment")
        .to_string();
    let url = api.upload_attachment(filename, bytes, mime).await?;
    api.send_support_message(&ticket_id, &url, MessageKind::Image).await?;
    Ok(url)
}

/// Keep the latest message visible whenever the list grows or is replaced.
fn snap_chat_to_bottom() -> Command<Message> {
    scrollable::snap_to(
        scrollable::Id::new("chat_messages_scroll"),
        scrollable::RelativeOffset::END,
    )
}

/// The alert bar clears itself shortly after, same cadence everywhere.
fn auto_clear_log() -> Command<Message> {
    Command::perform(
        async {
            tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;
            Message::ClearLog
        },
        |msg| msg,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::ticket::{ChatMessage, Sender};
    use crate::config::Config;

    fn api() -> Arc<SupportApi> {
        Arc::new(SupportApi::new(&Config {
            api_base_url: "http://backend.test/".into(),
            api_token: None,
            request_timeout_secs: 5,
            max_upload_bytes: 1024,
        }))
    }

    fn message(id: &str, sender: Sender, body: &str, timestamp: &str) -> ChatMessage {
        serde_json::from_str(&format!(
            r#"{{"_id":"{id}","sender":"{}","type":"text","message":"{body}","timestamp":"{timestamp}"}}"#,
            sender.as_str(),
        ))
        .expect("valid message json")
    }

    fn ticket(id: &str, status: &str, messages: Vec<ChatMessage>) -> Ticket {
        Ticket {
            id: id.to_string(),
            status: status.to_string(),
            messages,
            ..Ticket::default()
        }
    }

    fn state_with_ticket(t: Ticket) -> DeskAppState {
        DeskAppState {
            app_state: AppState::TicketView(t.id.clone()),
            conversation: Some(Conversation::from_ticket(&t)),
            open_ticket: Some(t),
            ..DeskAppState::default()
        }
    }

    #[test]
    fn sending_on_a_closed_ticket_is_a_no_op() {
        for status in ["closed", "Closed", "CLOSED"] {
            let mut state = state_with_ticket(ticket("t1", status, vec![]));
            state.chat_input = "hello".into();
            let _ = state.update(Message::SendChatMessage, &api());
            assert!(!state.sending_message, "{status}: no send may start");
            assert_eq!(state.chat_input, "hello");
            assert!(state.conversation.as_ref().is_some_and(|c| c.messages.is_empty()));

            state.attachment_path = "/tmp/pic.png".into();
            let _ = state.update(Message::SendAttachment, &api());
            assert!(!state.uploading_attachment, "{status}: no upload may start");
            assert!(state.conversation.as_ref().is_some_and(|c| c.messages.is_empty()));
        }
    }

    #[test]
    fn empty_input_does_not_start_a_send() {
        let mut state = state_with_ticket(ticket("t1", "open", vec![]));
        state.chat_input = "   ".into();
        let _ = state.update(Message::SendChatMessage, &api());
        assert!(!state.sending_message);
    }

    #[test]
    fn successful_send_appends_and_clears_the_input() {
        let initial = message("m1", Sender::Customer, "Hi", "2024-01-01T10:00:00Z");
        let mut state = state_with_ticket(ticket("t1", "open", vec![initial]));
        state.chat_input = "Hello, how can I help?".into();
        state.sending_message = true;

        let _ = state.update(
            Message::ChatMessageSent { result: Ok("Hello, how can I help?".into()) },
            &api(),
        );

        assert!(!state.sending_message);
        assert_eq!(state.chat_input, "");
        let convo = state.conversation.as_ref().expect("conversation");
        assert_eq!(convo.messages.len(), 2);
        let appended = &convo.messages[1];
        assert_eq!(appended.sender, Sender::Support);
        assert_eq!(appended.kind, MessageKind::Text);
        assert_eq!(appended.body, "Hello, how can I help?");

        // The old message and the fresh one land in different day buckets.
        let today = chrono::Local::now().date_naive();
        let groups = convo.grouped_by_day(today);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.last().map(|g| g.label.as_str()), Some("Today"));
    }

    #[test]
    fn failed_send_leaves_list_and_input_alone() {
        let initial = message("m1", Sender::Customer, "Hi", "2024-01-01T10:00:00Z");
        let mut state = state_with_ticket(ticket("t1", "open", vec![initial]));
        state.chat_input = "Hello".into();
        state.sending_message = true;

        let _ = state.update(
            Message::ChatMessageSent { result: Err("backend says no".into()) },
            &api(),
        );

        assert!(!state.sending_message);
        assert_eq!(state.chat_input, "Hello");
        assert_eq!(state.conversation.as_ref().map(|c| c.messages.len()), Some(1));
        assert!(matches!(
            state.logger.last(),
            Some(LogMessage { level: LogLevel::Error, .. })
        ));
    }

    #[test]
    fn fresh_snapshot_replaces_locally_appended_messages() {
        let a = message("a", Sender::Customer, "A", "2024-01-01T10:00:00Z");
        let b = message("b", Sender::Support, "B", "2024-01-01T11:00:00Z");
        let mut state = state_with_ticket(ticket("t1", "open", vec![a.clone(), b.clone()]));
        state
            .conversation
            .as_mut()
            .expect("conversation")
            .push_local_text("local C");
        assert_eq!(state.conversation.as_ref().map(|c| c.messages.len()), Some(3));

        let _ = state.update(
            Message::TicketLoaded {
                ticket_id: "t1".into(),
                result: Ok(Box::new(ticket("t1", "open", vec![a, b]))),
            },
            &api(),
        );

        let convo = state.conversation.as_ref().expect("conversation");
        let ids: Vec<&str> = convo.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn disallowed_attachment_extension_never_starts_an_upload() {
        let mut state = state_with_ticket(ticket("t1", "open", vec![]));
        state.attachment_path = "/tmp/notes.txt".into();

        let _ = state.update(Message::SendAttachment, &api());

        assert!(!state.uploading_attachment);
        assert_eq!(state.attachment_path, "/tmp/notes.txt");
        assert!(state.conversation.as_ref().is_some_and(|c| c.messages.is_empty()));
        assert!(matches!(
            state.logger.last(),
            Some(LogMessage { level: LogLevel::Error, .. })
        ));
    }

    #[test]
    fn failed_attachment_keeps_the_path_for_retry() {
        let mut state = state_with_ticket(ticket("t1", "open", vec![]));
        state.attachment_path = "/tmp/pic.png".into();
        state.uploading_attachment = true;

        let _ = state.update(
            Message::AttachmentSent { result: Err("upload failed".into()) },
            &api(),
        );

        assert!(!state.uploading_attachment);
        assert_eq!(state.attachment_path, "/tmp/pic.png");
        assert!(state.conversation.as_ref().is_some_and(|c| c.messages.is_empty()));
    }

    #[test]
    fn successful_attachment_appends_an_image_message() {
        let mut state = state_with_ticket(ticket("t1", "open", vec![]));
        state.attachment_path = "/tmp/pic.png".into();
        state.uploading_attachment = true;

        let _ = state.update(
            Message::AttachmentSent { result: Ok("https://cdn.test/pic.png".into()) },
            &api(),
        );

        assert_eq!(state.attachment_path, "");
        let convo = state.conversation.as_ref().expect("conversation");
        assert_eq!(convo.messages.len(), 1);
        assert_eq!(convo.messages[0].kind, MessageKind::Image);
        assert_eq!(convo.messages[0].body, "https://cdn.test/pic.png");
    }

    #[test]
    fn stale_ticket_load_is_ignored() {
        let mut state = state_with_ticket(ticket("t1", "open", vec![]));
        let _ = state.update(
            Message::TicketLoaded {
                ticket_id: "t2".into(),
                result: Ok(Box::new(ticket("t2", "open", vec![]))),
            },
            &api(),
        );
        assert_eq!(state.open_ticket.as_ref().map(|t| t.id.as_str()), Some("t1"));
    }

    #[test]
    fn close_confirm_requires_an_open_ticket_and_a_remark() {
        let mut state = state_with_ticket(ticket("t1", "closed", vec![]));
        let _ = state.update(Message::OpenCloseConfirm, &api());
        assert!(!state.confirm_close_open);

        let mut state = state_with_ticket(ticket("t1", "open", vec![]));
        let _ = state.update(Message::OpenCloseConfirm, &api());
        assert!(state.confirm_close_open);

        state.close_remark = "   ".into();
        let _ = state.update(Message::ConfirmCloseTicket, &api());
        assert!(!state.closing_ticket);
    }

    #[test]
    fn catalog_filter_matches_requester_name_and_sorts_newest_first() {
        let older: Ticket = serde_json::from_str(
            r#"{"_id":"t1","status":"open","createdAt":"2024-01-01T00:00:00Z",
                "user_details":{"name":"Asha Rao"}}"#,
        )
        .expect("valid ticket json");
        let newer: Ticket = serde_json::from_str(
            r#"{"_id":"t2","status":"closed","createdAt":"2024-02-01T00:00:00Z",
                "user_details":{"name":"Ravi Kumar"}}"#,
        )
        .expect("valid ticket json");

        let state = DeskAppState {
            tickets: vec![older, newer],
            ..DeskAppState::default()
        };
        let ids: Vec<&str> = state.filtered_tickets().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["t2", "t1"]);
        assert_eq!(state.open_count(), 1);
        assert_eq!(state.closed_count(), 1);

        let state = DeskAppState { search_query: "asha".into(), ..state };
        let ids: Vec<&str> = state.filtered_tickets().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["t1"]);
    }
}
