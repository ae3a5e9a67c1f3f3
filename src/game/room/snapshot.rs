use super::*;
use futures_util::future::join_all;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
  #[serde(rename = "playerId")]
  pub player_id: PlayerId,
  pub heading: Direction,
  pub cells: Vec<Cell>,
  pub score: u32,
  pub name: String,
  pub glyph: char,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot {
  #[serde(rename = "roomId")]
  pub room_id: RoomId,
  pub tick: u64,
  #[serde(rename = "gridSize")]
  pub grid_size: u8,
  pub players: Vec<PlayerView>,
  pub food: Vec<Cell>,
}

impl RoomSnapshot {
  #[cfg(test)]
  pub fn player(&self, player_id: PlayerId) -> Option<&PlayerView> {
    self.players.iter().find(|player| player.player_id == player_id)
  }
}

impl RoomState {
  pub(super) fn snapshot(&self) -> RoomSnapshot {
    RoomSnapshot {
      room_id: self.room_id,
      tick: self.tick,
      grid_size: self.grid.size(),
      players: self
        .snakes
        .values()
        .map(|snake| PlayerView {
          player_id: snake.player_id,
          heading: snake.heading,
          cells: snake.cells(),
          score: snake.score,
          name: snake.name.clone(),
          glyph: snake.glyph,
        })
        .collect(),
      food: self.food.iter().copied().collect(),
    }
  }
}

/// Sends the same snapshot to every recipient, one task per send, and returns
/// once all of them have been delivered or dropped.
pub(super) async fn broadcast(
  room_id: RoomId,
  snapshot: Arc<RoomSnapshot>,
  recipients: Vec<(PlayerId, SnapshotSender)>,
) {
  let sends = recipients.into_iter().map(|(player_id, endpoint)| {
    let snapshot = Arc::clone(&snapshot);
    tokio::spawn(async move {
      if endpoint.send(snapshot).await.is_err() {
        tracing::debug!(room_id, player_id, "snapshot endpoint closed");
      }
    })
  });

  for result in join_all(sends).await {
    if let Err(error) = result {
      tracing::warn!(?error, room_id, "snapshot send task failed");
    }
  }
}
