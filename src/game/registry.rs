use super::room::{JoinOutcome, PlayerSeat, Room, SnapshotSender};
use super::types::{Direction, PlayerId, RoomId};
use crate::config::EngineConfig;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub type RoomTable = Arc<DashMap<RoomId, Arc<Room>>>;

const JOIN_ATTEMPTS: usize = 3;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Membership {
    room_id: Option<RoomId>,
    endpoint: SnapshotSender,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    #[serde(rename = "roomId")]
    pub room_id: RoomId,
    #[serde(rename = "playerCount")]
    pub player_count: usize,
}

/// Routes session traffic to rooms. Built once at process start and shared by
/// reference; rooms remove themselves from it when they drain.
#[derive(Debug)]
pub struct Registry {
    config: EngineConfig,
    rooms: RoomTable,
    members: DashMap<PlayerId, Membership>,
}

impl Registry {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            rooms: Arc::new(DashMap::new()),
            members: DashMap::new(),
        }
    }

    /// Allocates a fresh non-zero identity for a connected session.
    pub fn register_player(&self, endpoint: SnapshotSender) -> PlayerId {
        loop {
            let player_id = rand::random::<PlayerId>();
            if player_id == 0 {
                continue;
            }
            if let Entry::Vacant(entry) = self.members.entry(player_id) {
                entry.insert(Membership {
                    room_id: None,
                    endpoint,
                });
                return player_id;
            }
        }
    }

    pub async fn unregister_player(&self, player_id: PlayerId) {
        self.exit_room(player_id).await;
        self.members.remove(&player_id);
    }

    pub fn room(&self, room_id: RoomId) -> Option<Arc<Room>> {
        self.rooms.get(&room_id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn current_room(&self, player_id: PlayerId) -> Option<RoomId> {
        self.members.get(&player_id).and_then(|member| member.room_id)
    }

    fn room_or_create(&self, room_id: RoomId) -> Arc<Room> {
        match self.rooms.entry(room_id) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                let room = Room::start(room_id, &self.config, Arc::clone(&self.rooms));
                entry.insert(Arc::clone(&room));
                room
            }
        }
    }

    /// Seats the player in `room_id`, creating the room when it does not
    /// exist. A room that is draining is waited out and replaced.
    pub async fn join_or_create(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        name: String,
        glyph: char,
    ) -> bool {
        if room_id == 0 {
            return false;
        }
        let Some(endpoint) = self
            .members
            .get(&player_id)
            .map(|member| member.endpoint.clone())
        else {
            return false;
        };
        if self.current_room(player_id).is_some() {
            self.exit_room(player_id).await;
        }

        for _ in 0..JOIN_ATTEMPTS {
            let room = self.room_or_create(room_id);
            let seat = PlayerSeat {
                player_id,
                name: name.clone(),
                glyph,
                endpoint: endpoint.clone(),
            };
            match room.add_player(seat).await {
                JoinOutcome::Joined => {
                    if let Some(mut member) = self.members.get_mut(&player_id) {
                        member.room_id = Some(room_id);
                    }
                    return true;
                }
                JoinOutcome::RoomClosing => {
                    room.wait_terminated().await;
                }
                outcome => {
                    tracing::debug!(room_id, player_id, ?outcome, "join rejected");
                    return false;
                }
            }
        }
        false
    }

    pub async fn exit_room(&self, player_id: PlayerId) -> bool {
        let room_id = match self.members.get_mut(&player_id) {
            Some(mut member) => member.room_id.take(),
            None => None,
        };
        let Some(room_id) = room_id else { return false };
        let Some(room) = self.room(room_id) else { return false };
        room.exit_room(player_id).await
    }

    /// Forwards a move to the player's room. Moves from players outside any
    /// room are dropped.
    pub fn route_move(&self, player_id: PlayerId, direction: Direction) -> bool {
        let Some(room_id) = self.current_room(player_id) else { return false };
        let Some(room) = self.room(room_id) else { return false };
        room.submit(player_id, direction)
    }

    pub async fn room_summaries(&self) -> Vec<RoomSummary> {
        let rooms: Vec<Arc<Room>> = self
            .rooms
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut summaries = Vec::with_capacity(rooms.len());
        for room in rooms {
            summaries.push(RoomSummary {
                room_id: room.id(),
                player_count: room.player_count().await,
            });
        }
        summaries.sort_by_key(|summary| summary.room_id);
        summaries
    }

    /// Takes every member out of its room and waits, up to a grace period,
    /// for the rooms to terminate.
    pub async fn shutdown(&self) {
        let rooms: Vec<Arc<Room>> = self
            .rooms
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let player_ids: Vec<PlayerId> = self.members.iter().map(|entry| *entry.key()).collect();
        for player_id in player_ids {
            self.exit_room(player_id).await;
        }

        let grace = self.config.tick_period * 2 + SHUTDOWN_GRACE;
        let drained = join_all(rooms.iter().map(|room| room.wait_terminated()));
        if tokio::time::timeout(grace, drained).await.is_err() {
            tracing::warn!(rooms = rooms.len(), "rooms still running after shutdown grace");
        }
    }
}
