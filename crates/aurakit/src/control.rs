use strum::{Display as StrumDisplay, EnumIter, EnumString};

pub const SOCKET_PATH: &str = "/tmp/aura.sock";

/// One line on the control socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, StrumDisplay)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ControlCommand {
    Show,
    Hide,
    Wheel,
    Lock,
}

impl ControlCommand {
    pub fn parse_line(line: &str) -> Option<Self> {
        line.trim().parse().ok()
    }
}
