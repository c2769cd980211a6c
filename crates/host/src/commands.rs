use pdlc_panel::chat::HostEvent;

/// Zero-argument host commands, one per host event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostCommand {
    NewSession,
    ChatList,
    OpenSettings,
}

impl HostCommand {
    pub const ALL: [HostCommand; 3] = [Self::NewSession, Self::ChatList, Self::OpenSettings];

    /// Identifier the editor registers the command under.
    pub fn command_id(self) -> &'static str {
        match self {
            Self::NewSession => "aiPdlc.newSession",
            Self::ChatList => "aiPdlc.chatList",
            Self::OpenSettings => "aiPdlc.openSettings",
        }
    }

    pub fn from_command_id(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|command| command.command_id() == raw)
    }

    pub fn event(self) -> HostEvent {
        match self {
            Self::NewSession => HostEvent::NewSession,
            Self::ChatList => HostEvent::ShowList,
            Self::OpenSettings => HostEvent::OpenSettings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_ids_round_trip_to_events() {
        assert_eq!(
            HostCommand::from_command_id("aiPdlc.newSession").map(HostCommand::event),
            Some(HostEvent::NewSession)
        );
        assert_eq!(
            HostCommand::from_command_id("aiPdlc.chatList").map(HostCommand::event),
            Some(HostEvent::ShowList)
        );
        assert_eq!(
            HostCommand::from_command_id("aiPdlc.openSettings").map(HostCommand::event),
            Some(HostEvent::OpenSettings)
        );
        assert_eq!(HostCommand::from_command_id("aiPdlc.deleteEverything"), None);
    }
}
