//! Room registry: creates rooms, tracks membership, routes commands.
//!
//! # Concurrency note
//!
//! Both indexes are `DashMap`s so any number of connection tasks can look
//! up, create and leave rooms concurrently. Handles are cloned out of the
//! map before any `.await`, so no map guard is ever held while talking to
//! a room actor.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scribble_protocol::{ConnectionId, RoomCode, RoomListEntry, RoomSettings};
use scribble_words::WordBank;
use tracing::{debug, info, warn};

use crate::game::{Action, Room};
use crate::room::{Exit, spawn_room};
use crate::{GameError, NewPlayer, PlayerSender, RoomConfig, RoomHandle, RoomInfo};

/// How many fresh codes to try before giving up on creating a room.
const MAX_CODE_ATTEMPTS: usize = 16;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Owns every live room and the connection → room index.
///
/// A connection is in at most one room at a time.
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomCode, RoomHandle>>,
    members: Arc<DashMap<ConnectionId, RoomCode>>,
    config: Arc<RoomConfig>,
    words: Arc<dyn WordBank>,
    /// Base seed for per-room generators (word offers, hint positions).
    seed: u64,
    next_instance: AtomicU64,
}

impl RoomRegistry {
    /// Creates an empty registry with a random seed.
    pub fn new(config: RoomConfig, words: Arc<dyn WordBank>) -> Self {
        Self::with_seed(config, words, rand::random())
    }

    /// Creates an empty registry whose rooms draw from reproducible
    /// generators derived from `seed`.
    pub fn with_seed(config: RoomConfig, words: Arc<dyn WordBank>, seed: u64) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            members: Arc::new(DashMap::new()),
            config: Arc::new(config.validated()),
            words,
            seed,
            next_instance: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Creates a room in `Lobby` with `creator` as host.
    ///
    /// The creator receives `roomCreated`.
    pub fn create_room(
        &self,
        creator: NewPlayer,
        sender: PlayerSender,
        settings: RoomSettings,
    ) -> Result<RoomCode, GameError> {
        let creator_id = creator.id;
        if self.members.contains_key(&creator_id) {
            return Err(GameError::AlreadyInRoom);
        }

        for _ in 0..MAX_CODE_ATTEMPTS {
            let Ok(code) = RoomCode::parse(&random_code()) else {
                continue;
            };
            match self.rooms.entry(code.clone()) {
                Entry::Occupied(_) => {
                    debug!(room = %code, "room code collision, retrying");
                }
                Entry::Vacant(slot) => {
                    let Entry::Vacant(member) = self.members.entry(creator_id) else {
                        return Err(GameError::AlreadyInRoom);
                    };
                    let instance = self.next_instance.fetch_add(1, Ordering::Relaxed);
                    let rng = StdRng::seed_from_u64(
                        self.seed ^ instance.wrapping_mul(0x9E37_79B9_7F4A_7C15),
                    );
                    let room = Room::new(
                        code.clone(),
                        creator,
                        settings,
                        Arc::clone(&self.config),
                        Arc::clone(&self.words),
                        rng,
                    )?;
                    let handle = spawn_room(
                        room,
                        instance,
                        sender,
                        self.config.channel_size,
                        self.exit_hook(code.clone(), instance),
                    );
                    // Index first: a concurrent leave blocks on the room slot
                    // until the handle is in place.
                    member.insert(code.clone());
                    slot.insert(handle);
                    info!(room = %code, host = %creator_id, "room created");
                    return Ok(code);
                }
            }
        }

        warn!(attempts = MAX_CODE_ATTEMPTS, "no free room code found");
        Err(GameError::Unavailable)
    }

    /// Adds a player to an existing room (lobby only).
    pub async fn join_room(
        &self,
        code: &RoomCode,
        player: NewPlayer,
        sender: PlayerSender,
    ) -> Result<(), GameError> {
        let id = player.id;
        if self.members.contains_key(&id) {
            return Err(GameError::AlreadyInRoom);
        }
        let handle = self.lookup(code)?;
        self.reserve(id, code)?;
        let result = handle.join(player, sender).await;
        if result.is_ok() {
            self.confirm(&handle, id).await;
        } else {
            self.release(id, code);
        }
        self.settle(&handle, result)
    }

    /// Joins the oldest open public room, or creates a public room with
    /// default settings when none has a free seat.
    pub async fn quick_join(
        &self,
        player: NewPlayer,
        sender: PlayerSender,
    ) -> Result<RoomCode, GameError> {
        if self.members.contains_key(&player.id) {
            return Err(GameError::AlreadyInRoom);
        }

        for handle in self.handles() {
            let Ok(info) = handle.info().await else {
                continue;
            };
            if !info.is_open() {
                continue;
            }
            self.reserve(player.id, &info.code)?;
            // The room may fill up between `info` and `join`: keep looking.
            if handle.join(player.clone(), sender.clone()).await.is_ok() {
                self.confirm(&handle, player.id).await;
                debug!(room = %info.code, player = %player.id, "quick join matched");
                return Ok(info.code);
            }
            self.release(player.id, &info.code);
        }

        self.create_room(player, sender, RoomSettings::default())
    }

    /// Public rooms still in the lobby with a free seat, oldest first.
    pub async fn list_public_rooms(&self) -> Vec<RoomListEntry> {
        let mut entries = Vec::new();
        for handle in self.handles() {
            if let Ok(info) = handle.info().await {
                if info.is_open() {
                    entries.push(info.list_entry());
                }
            }
        }
        entries
    }

    /// Removes a connection from whatever room it is in.
    ///
    /// The room is dropped from the registry as soon as it is empty.
    pub async fn leave_room(&self, conn: ConnectionId) -> Result<RoomCode, GameError> {
        let Some((_, code)) = self.members.remove(&conn) else {
            return Err(GameError::NotInRoom);
        };
        if let Ok(handle) = self.lookup(&code) {
            self.depart(&handle, conn).await;
        }
        Ok(code)
    }

    /// Host-only: removes `target` from room `code`.
    pub async fn kick(
        &self,
        code: &RoomCode,
        by: ConnectionId,
        target: ConnectionId,
    ) -> Result<(), GameError> {
        let handle = self.lookup(code)?;
        self.settle(&handle, handle.kick(by, target).await)?;
        self.members.remove_if(&target, |_, c| c == code);
        Ok(())
    }

    /// Forwards a game command to room `code`.
    pub async fn route(
        &self,
        code: &RoomCode,
        from: ConnectionId,
        action: Action,
    ) -> Result<(), GameError> {
        let handle = self.lookup(code)?;
        let result = handle.act(from, action).await;
        self.settle(&handle, result)
    }

    /// The room a connection is currently in.
    pub fn find_room_of(&self, conn: ConnectionId) -> Option<RoomCode> {
        self.members.get(&conn).map(|code| code.value().clone())
    }

    pub async fn room_info(&self, code: &RoomCode) -> Result<RoomInfo, GameError> {
        let handle = self.lookup(code)?;
        let result = handle.info().await;
        self.settle(&handle, result)
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Closes every room (members get `roomClosed`) and clears the indexes.
    pub async fn shutdown(&self) {
        for handle in self.handles() {
            let _ = handle.shutdown().await;
        }
        self.rooms.clear();
        self.members.clear();
    }

    // -- internals -----------------------------------------------------------

    fn lookup(&self, code: &RoomCode) -> Result<RoomHandle, GameError> {
        self.rooms
            .get(code)
            .map(|handle| handle.value().clone())
            .ok_or(GameError::RoomNotFound)
    }

    /// Snapshot of all handles, oldest room first.
    fn handles(&self) -> Vec<RoomHandle> {
        let mut handles: Vec<RoomHandle> =
            self.rooms.iter().map(|entry| entry.value().clone()).collect();
        handles.sort_by_key(RoomHandle::instance);
        handles
    }

    /// Claims the index entry for `conn` before its join reaches the actor.
    fn reserve(&self, conn: ConnectionId, code: &RoomCode) -> Result<(), GameError> {
        match self.members.entry(conn) {
            Entry::Occupied(_) => Err(GameError::AlreadyInRoom),
            Entry::Vacant(slot) => {
                slot.insert(code.clone());
                Ok(())
            }
        }
    }

    fn release(&self, conn: ConnectionId, code: &RoomCode) {
        self.members.remove_if(&conn, |_, c| c == code);
    }

    /// Undoes a join whose reservation was taken by a concurrent leave.
    async fn confirm(&self, handle: &RoomHandle, conn: ConnectionId) {
        let reserved = self
            .members
            .get(&conn)
            .is_some_and(|code| code.value() == handle.code());
        if !reserved {
            debug!(room = %handle.code(), player = %conn, "left while joining");
            self.depart(handle, conn).await;
        }
    }

    /// Takes `conn` out of the room, dropping the room once it is empty.
    async fn depart(&self, handle: &RoomHandle, conn: ConnectionId) {
        let code = handle.code();
        match handle.leave(conn).await {
            Ok(0) => {
                self.rooms
                    .remove_if(code, |_, h| h.instance() == handle.instance());
                info!(room = %code, "room destroyed");
            }
            Ok(_) => {}
            Err(GameError::Unavailable) => self.forget(handle),
            Err(e) => debug!(room = %code, player = %conn, error = %e, "leave ignored"),
        }
    }

    /// A dead actor means the room is effectively gone.
    fn settle<T>(
        &self,
        handle: &RoomHandle,
        result: Result<T, GameError>,
    ) -> Result<T, GameError> {
        match result {
            Err(GameError::Unavailable) => {
                self.forget(handle);
                Err(GameError::RoomNotFound)
            }
            other => other,
        }
    }

    fn forget(&self, handle: &RoomHandle) {
        let code = handle.code();
        self.rooms
            .remove_if(code, |_, h| h.instance() == handle.instance());
        self.members.retain(|_, c| c != code);
    }

    /// Cleanup run by the actor when it stops.
    fn exit_hook(&self, code: RoomCode, instance: u64) -> impl FnOnce(Exit) + Send + 'static {
        let rooms = Arc::clone(&self.rooms);
        let members = Arc::clone(&self.members);
        move |exit| {
            rooms.remove_if(&code, |_, h| h.instance() == instance);
            if exit == Exit::Faulted {
                members.retain(|_, c| *c != code);
            }
        }
    }
}

fn random_code() -> String {
    let mut rng = rand::rng();
    (0..RoomCode::LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_code_is_valid() {
        for _ in 0..100 {
            let raw = random_code();
            assert_eq!(raw.len(), RoomCode::LEN);
            assert_eq!(RoomCode::parse(&raw).unwrap().as_str(), raw);
        }
    }
}
