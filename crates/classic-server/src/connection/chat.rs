use super::*;

use classic_command::{parse_command, CommandAction, CommandContext};
use tracing::info;

impl ServerState {
    pub(super) async fn handle_message(&self, session: &Arc<Session>, packet: Message) {
        if session.state() != LoginState::Active {
            return;
        }
        let addr = session.address();
        let (id, name) = match self.players().await.get_by_addr(&addr) {
            Some(p) => (p.id, p.name.clone()),
            None => return,
        };

        if let Some((command, args)) = parse_command(&packet.text) {
            self.run_command(addr, &name, &command, args).await;
            return;
        }

        info!("<{name}> {}", packet.text);
        let chat = Message {
            player_id: id,
            text: format!("<{name}> {}", packet.text),
        };
        self.broadcast(&encode_packet(&chat), &[]).await;
    }

    async fn run_command(&self, addr: SocketAddr, name: &str, command: &str, args: Vec<String>) {
        info!("{name} issued command: /{command} {}", args.join(" "));
        let ctx = CommandContext {
            sender_name: name.to_string(),
            sender_is_op: self.is_op(name),
            args,
            online: self.online_players().await,
        };
        let result = self.commands.execute(command, &ctx);

        for line in &result.messages {
            self.send_message(addr, line).await;
        }
        if let Some(text) = &result.broadcast {
            self.broadcast_message(text).await;
        }
        match result.action {
            Some(CommandAction::Teleport { position }) => self.teleport(addr, position).await,
            Some(CommandAction::Kick { target, reason }) => {
                let id = self.players().await.find_by_name(&target).map(|p| p.id);
                match id {
                    Some(id) => {
                        self.kick(id, &reason).await;
                    }
                    None => self.send_message(addr, "Target player not found.").await,
                }
            }
            Some(CommandAction::SetOp { target, op }) => {
                if self.set_op(&target, op) {
                    self.send_user_type(&target, op).await;
                }
            }
            None => {}
        }
    }
}
