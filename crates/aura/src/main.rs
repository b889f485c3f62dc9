use aura::config;
use aura::gui::app::AppModel;
use aura::link::LaunchLink;
use aura::sys::runtime;
use relm4::prelude::*;

fn main() {
    env_logger::init();

    if let Err(e) = config::write_default_config() {
        log::warn!("Could not write default config: {}", e);
    }
    let config = config::load_or_default();
    let link = LaunchLink::from_args(std::env::args().skip(1));

    let (tx, rx) = async_channel::bounded(32);

    // Start Background Services
    runtime::start_background_services(tx);

    // launch arguments are ours, not GTK's
    let app = RelmApp::new("org.aura.aura").with_args(Vec::new());

    app.run::<AppModel>((config, link, rx));
}
