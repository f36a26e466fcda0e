use iced::Application;
fn main() -> iced::Result {
    // load environment from .env (optional)
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    astrodesk::client::gui::app::DeskApp::run(iced::Settings::default())
}
