use crate::client::models::ticket::Ticket;

/// All actions flowing through the app. Async results come back as
/// `*Loaded` / `*Sent` / `*Closed` variants carrying `Result`s whose error
/// side is already a display string.
#[derive(Debug, Clone)]
pub enum Message {
    // Ticket catalog
    ReloadTickets,
    TicketsLoaded { result: Result<Vec<Ticket>, String> },
    SearchQueryChanged(String),
    // Navigation
    OpenTicket(String),
    BackToTickets,
    TicketLoaded { ticket_id: String, result: Result<Box<Ticket>, String> },
    // Chat: text sends
    ChatInputChanged(String),
    SendChatMessage,
    /// `Ok` carries the body that was accepted by the backend.
    ChatMessageSent { result: Result<String, String> },
    // Chat: image attachments
    AttachmentPathChanged(String),
    SendAttachment,
    /// `Ok` carries the uploaded attachment URL.
    AttachmentSent { result: Result<String, String> },
    // Close-ticket flow
    OpenCloseConfirm,
    CancelCloseConfirm,
    CloseRemarkChanged(String),
    ConfirmCloseTicket,
    TicketClosed { result: Result<(), String> },
    // Alert bar
    ClearLog,
}
