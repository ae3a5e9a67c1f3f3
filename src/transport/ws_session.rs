use crate::game::registry::Registry;
use crate::game::room::RoomSnapshot;
use crate::game::types::PlayerId;
use crate::protocol::{
    decode_client_message, encode_server_message, ClientMessage, CommandAction, ServerMessage,
    GLYPH_FALLBACK, NAME_FALLBACK,
};
use crate::shared::names::{sanitize_glyph, sanitize_player_name};
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const SEND_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn handle_socket(socket: WebSocket, registry: Arc<Registry>) {
    let (mut sender, mut receiver) = socket.split();
    let (snapshot_tx, mut snapshot_rx) = mpsc::channel::<Arc<RoomSnapshot>>(1);
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<String>();
    let player_id = registry.register_player(snapshot_tx);
    tracing::debug!(player_id, "session opened");

    send_reply(&reply_tx, &ServerMessage::Welcome { player_id });

    let mut send_task = tokio::spawn(async move {
        loop {
            let payload = tokio::select! {
                Some(payload) = reply_rx.recv() => payload,
                Some(snapshot) = snapshot_rx.recv() => {
                    match encode_server_message(&ServerMessage::Snapshot(&snapshot)) {
                        Ok(payload) => payload,
                        Err(error) => {
                            tracing::warn!(?error, "snapshot encode failed");
                            continue;
                        }
                    }
                }
                else => break,
            };
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = receiver.next().await {
        let Ok(message) = result else { break };
        match message {
            Message::Text(text) => {
                if !handle_text_message(&registry, player_id, &reply_tx, &text).await {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    registry.unregister_player(player_id).await;
    drop(reply_tx);
    if tokio::time::timeout(SEND_DRAIN_TIMEOUT, &mut send_task)
        .await
        .is_err()
    {
        send_task.abort();
    }
    tracing::debug!(player_id, "session closed");
}

/// Applies one client message. Returns false once the session should end.
async fn handle_text_message(
    registry: &Registry,
    player_id: PlayerId,
    reply_tx: &mpsc::UnboundedSender<String>,
    text: &str,
) -> bool {
    let Some(message) = decode_client_message(text) else {
        tracing::debug!(player_id, "ignoring malformed message");
        return true;
    };

    match message {
        ClientMessage::Join { room, name, glyph } => {
            let name = sanitize_player_name(name.as_deref().unwrap_or_default(), NAME_FALLBACK);
            let glyph = sanitize_glyph(glyph.as_deref().unwrap_or_default(), GLYPH_FALLBACK);
            let ok = match room {
                Some(room_id) => registry.join_or_create(room_id, player_id, name, glyph).await,
                None => false,
            };
            send_command(reply_tx, ok, CommandAction::Join);
        }
        ClientMessage::Move { direction } => {
            registry.route_move(player_id, direction);
        }
        ClientMessage::Exit => {
            let ok = registry.exit_room(player_id).await;
            send_command(reply_tx, ok, CommandAction::Exit);
        }
        ClientMessage::Quit => {
            registry.exit_room(player_id).await;
            send_command(reply_tx, true, CommandAction::Quit);
            return false;
        }
    }
    true
}

fn send_command(reply_tx: &mpsc::UnboundedSender<String>, ok: bool, action: CommandAction) {
    send_reply(reply_tx, &ServerMessage::Command { ok, action });
}

fn send_reply(reply_tx: &mpsc::UnboundedSender<String>, message: &ServerMessage<'_>) {
    match encode_server_message(message) {
        Ok(payload) => {
            let _ = reply_tx.send(payload);
        }
        Err(error) => tracing::warn!(?error, "reply encode failed"),
    }
}
