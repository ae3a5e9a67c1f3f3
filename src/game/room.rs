mod snapshot;

#[cfg(test)]
pub use snapshot::PlayerView;
pub use snapshot::RoomSnapshot;

use super::grid::Grid;
use super::input::MoveMailbox;
use super::registry::RoomTable;
use super::snake::Snake;
use super::types::{Cell, CellState, Direction, PlayerId, RoomId};
use crate::config::EngineConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{watch, Mutex, Notify};
use tokio::time::Instant;

/// Per-participant snapshot endpoint. Capacity one: a recipient that has not
/// taken the previous snapshot holds up the room's next tick.
pub type SnapshotSender = mpsc::Sender<Arc<RoomSnapshot>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
  Empty,
  Active,
  Draining,
  Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
  Joined,
  RoomFull,
  RoomClosing,
  NoFreeCell,
}

#[derive(Debug)]
pub enum IngressSignal {
  Move {
    player_id: PlayerId,
    direction: Direction,
  },
  Closing,
}

#[derive(Debug, Clone)]
pub struct PlayerSeat {
  pub player_id: PlayerId,
  pub name: String,
  pub glyph: char,
  pub endpoint: SnapshotSender,
}

#[derive(Debug)]
pub struct Room {
  id: RoomId,
  tick_period: Duration,
  state: Mutex<RoomState>,
  ingress: UnboundedSender<IngressSignal>,
  activated: Notify,
  terminated: watch::Sender<bool>,
}

#[derive(Debug)]
struct RoomState {
  room_id: RoomId,
  phase: RoomPhase,
  capacity: usize,
  grid: Grid,
  snakes: BTreeMap<PlayerId, Snake>,
  mailboxes: HashMap<PlayerId, MoveMailbox>,
  endpoints: HashMap<PlayerId, SnapshotSender>,
  food: BTreeSet<Cell>,
  player_count: usize,
  tick: u64,
  rng: StdRng,
}

impl Room {
  /// Builds the room and launches its driver task. The driver runs the
  /// ingress and tick loops until the room drains, then erases its own entry
  /// from `rooms`.
  pub fn start(id: RoomId, config: &EngineConfig, rooms: RoomTable) -> Arc<Self> {
    let (ingress, ingress_rx) = mpsc::unbounded_channel();
    let (terminated, _) = watch::channel(false);
    let room = Arc::new(Self {
      id,
      tick_period: config.tick_period,
      state: Mutex::new(RoomState::new(id, config, StdRng::from_entropy())),
      ingress,
      activated: Notify::new(),
      terminated,
    });

    let driver = Arc::clone(&room);
    tokio::spawn(async move {
      driver.drive(ingress_rx, rooms).await;
    });
    tracing::info!(room_id = id, "room started");
    room
  }

  pub fn id(&self) -> RoomId {
    self.id
  }

  async fn drive(self: Arc<Self>, ingress_rx: UnboundedReceiver<IngressSignal>, rooms: RoomTable) {
    tokio::join!(self.run_ingress(ingress_rx), self.run_ticks());

    self.state.lock().await.phase = RoomPhase::Terminated;
    rooms.remove_if(&self.id, |_, entry| Arc::ptr_eq(entry, &self));
    self.terminated.send_replace(true);
    tracing::info!(room_id = self.id, "room terminated");
  }

  async fn run_ingress(&self, mut ingress_rx: UnboundedReceiver<IngressSignal>) {
    while let Some(signal) = ingress_rx.recv().await {
      let mut state = self.state.lock().await;
      if state.phase == RoomPhase::Draining {
        break;
      }
      if let IngressSignal::Move {
        player_id,
        direction,
      } = signal
      {
        state.submit_move(player_id, direction);
      }
    }
  }

  async fn run_ticks(&self) {
    loop {
      let started = Instant::now();

      let outgoing = {
        let mut state = self.state.lock().await;
        if state.player_count == 0 {
          if state.phase != RoomPhase::Empty {
            state.phase = RoomPhase::Draining;
            break;
          }
          None
        } else {
          state.step();
          Some((Arc::new(state.snapshot()), state.recipients()))
        }
      };

      // an empty room idles until its first player arrives
      let Some((snapshot, recipients)) = outgoing else {
        self.activated.notified().await;
        continue;
      };
      snapshot::broadcast(self.id, snapshot, recipients).await;

      let elapsed = started.elapsed();
      match self.tick_period.checked_sub(elapsed) {
        Some(remaining) => tokio::time::sleep(remaining).await,
        None => {
          tracing::trace!(room_id = self.id, elapsed_ms = elapsed.as_millis() as u64, "tick overran period");
        }
      }
    }
  }

  /// Hands a move to the ingress loop. `false` once the driver has stopped
  /// listening.
  pub fn submit(&self, player_id: PlayerId, direction: Direction) -> bool {
    self
      .ingress
      .send(IngressSignal::Move {
        player_id,
        direction,
      })
      .is_ok()
  }

  pub async fn add_player(&self, seat: PlayerSeat) -> JoinOutcome {
    let mut state = self.state.lock().await;
    let was_empty = state.phase == RoomPhase::Empty;
    let outcome = state.add_player(seat);
    if was_empty && outcome == JoinOutcome::Joined {
      self.activated.notify_one();
    }
    outcome
  }

  pub async fn exit_room(&self, player_id: PlayerId) -> bool {
    let mut state = self.state.lock().await;
    if !state.remove_player(player_id) {
      return false;
    }
    if state.phase == RoomPhase::Draining {
      // wake the ingress loop so it observes the empty room and exits
      let _ = self.ingress.send(IngressSignal::Closing);
    }
    true
  }

  pub async fn player_count(&self) -> usize {
    self.state.lock().await.player_count
  }

  #[cfg(test)]
  pub async fn phase(&self) -> RoomPhase {
    self.state.lock().await.phase
  }

  pub async fn wait_terminated(&self) {
    let mut terminated = self.terminated.subscribe();
    let _ = terminated.wait_for(|done| *done).await;
  }
}

impl RoomState {
  fn new(room_id: RoomId, config: &EngineConfig, rng: StdRng) -> Self {
    Self {
      room_id,
      phase: RoomPhase::Empty,
      capacity: config.room_capacity,
      grid: Grid::new(config.grid_size),
      snakes: BTreeMap::new(),
      mailboxes: HashMap::new(),
      endpoints: HashMap::new(),
      food: BTreeSet::new(),
      player_count: 0,
      tick: 0,
      rng,
    }
  }

  fn add_player(&mut self, seat: PlayerSeat) -> JoinOutcome {
    if matches!(self.phase, RoomPhase::Draining | RoomPhase::Terminated) {
      return JoinOutcome::RoomClosing;
    }
    if self.player_count >= self.capacity {
      return JoinOutcome::RoomFull;
    }
    if self.snakes.contains_key(&seat.player_id) {
      self.endpoints.insert(seat.player_id, seat.endpoint);
      return JoinOutcome::Joined;
    }
    let Some(start) = self.grid.random_free(&mut self.rng) else {
      tracing::warn!(room_id = self.room_id, "no free cell to place joining player");
      return JoinOutcome::NoFreeCell;
    };

    self.player_count += 1;
    self.mailboxes.insert(seat.player_id, MoveMailbox::new());
    self.endpoints.insert(seat.player_id, seat.endpoint);
    self.grid.mark(start, CellState::Snake);
    self
      .snakes
      .insert(seat.player_id, Snake::new(seat.player_id, seat.name, seat.glyph, start));
    self.phase = RoomPhase::Active;
    tracing::debug!(
      room_id = self.room_id,
      player_id = seat.player_id,
      players = self.player_count,
      "player joined"
    );
    JoinOutcome::Joined
  }

  fn remove_player(&mut self, player_id: PlayerId) -> bool {
    let Some(snake) = self.snakes.remove(&player_id) else { return false };
    for cell in snake.body() {
      self.grid.mark(*cell, CellState::Empty);
    }
    self.mailboxes.remove(&player_id);
    self.endpoints.remove(&player_id);
    self.player_count = self.player_count.saturating_sub(1);
    if self.player_count == 0 {
      self.phase = RoomPhase::Draining;
    }
    tracing::debug!(
      room_id = self.room_id,
      player_id,
      players = self.player_count,
      "player exited"
    );
    true
  }

  fn submit_move(&mut self, player_id: PlayerId, direction: Direction) -> bool {
    let Some(mailbox) = self.mailboxes.get_mut(&player_id) else { return false };
    mailbox.submit(direction);
    true
  }

  /// One simulation step: at most one move per player in ascending id order,
  /// then food top-up.
  fn step(&mut self) {
    let player_ids: Vec<PlayerId> = self.snakes.keys().copied().collect();
    for player_id in player_ids {
      let candidate = self.mailboxes.get_mut(&player_id).and_then(MoveMailbox::take);
      self.move_snake(player_id, candidate);
    }
    self.top_up_food();
    self.tick += 1;
  }

  fn move_snake(&mut self, player_id: PlayerId, candidate: Option<Direction>) {
    let grid_size = self.grid.size();
    let Some(snake) = self.snakes.get_mut(&player_id) else { return };
    if let Some(direction) = candidate {
      snake.steer(direction);
    }

    let target = snake
      .head()
      .step(snake.heading, grid_size)
      .map(|cell| (cell, self.grid.state(cell)));

    match target {
      Some((cell, Some(CellState::Empty))) => {
        self.grid.mark(cell, CellState::Snake);
        if let Some(tail) = snake.advance(cell, false) {
          self.grid.mark(tail, CellState::Empty);
        }
      }
      Some((cell, Some(CellState::Food))) => {
        snake.advance(cell, true);
        self.grid.mark(cell, CellState::Snake);
        self.food.remove(&cell);
        tracing::debug!(room_id = self.room_id, player_id, score = snake.score, "food eaten");
      }
      _ => {
        for cell in snake.body() {
          self.grid.mark(*cell, CellState::Empty);
        }
        let lost = snake.len();
        // at least the vacated body is free again, so a cell is always found
        let start = self.grid.random_free(&mut self.rng).unwrap_or(snake.head());
        snake.restart(start);
        self.grid.mark(start, CellState::Snake);
        tracing::debug!(room_id = self.room_id, player_id, lost, "snake restarted");
      }
    }
  }

  fn top_up_food(&mut self) {
    while self.food.len() < self.player_count {
      let Some(cell) = self.grid.random_free(&mut self.rng) else {
        tracing::warn!(room_id = self.room_id, food = self.food.len(), "grid full, food top-up stopped");
        break;
      };
      self.grid.mark(cell, CellState::Food);
      self.food.insert(cell);
    }
  }

  fn recipients(&self) -> Vec<(PlayerId, SnapshotSender)> {
    self
      .endpoints
      .iter()
      .map(|(player_id, endpoint)| (*player_id, endpoint.clone()))
      .collect()
  }
}
