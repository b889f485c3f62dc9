use aurakit::control::ControlCommand;

#[derive(Debug, Clone)]
pub enum AppEvent {
    Show,
    Hide,
    OpenWheel,
    Lock,
    ConfigReload,
}

impl From<ControlCommand> for AppEvent {
    fn from(cmd: ControlCommand) -> Self {
        match cmd {
            ControlCommand::Show => AppEvent::Show,
            ControlCommand::Hide => AppEvent::Hide,
            ControlCommand::Wheel => AppEvent::OpenWheel,
            ControlCommand::Lock => AppEvent::Lock,
        }
    }
}
