//! The game loop: the single consumer of the inbound queue.
//!
//! Every client message and every internal [`Signal`] goes through
//! [`GameLoop::handle`] on one thread, so the room and the arena are never
//! shared. Slow or delayed work re-enters the loop as a signal:
//!
//! ```text
//! Login completes room ─→ NewArena ─→ worker thread ─→ ArenaCreated
//!                                                          │
//!          ┌───────────── ComputeFrame ←───────────────────┘
//!          ↓                   ↑ (timer, paced)
//!     arena.update ─→ Frame ───┘
//!          │ round over
//!          ├── no series winner ─→ NewArena
//!          └── series winner ─→ ResetRoom (after reset_delay)
//! ```

use std::ops::ControlFlow;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use asciiarena_protocol::{
    ClientMessage, Direction, EntityId, LoginStatus, ServerMessage, SkillId, VERSION, Vec2,
    is_compatible,
};
use asciiarena_room::Room;
use asciiarena_tick::{FramePacer, SignalTimers};
use asciiarena_transport::{Endpoint, InputPack, OutputPack};
use asciiarena_world::{Arena, WorldError, random_seed};
use tracing::{debug, error, info, trace, warn};

use crate::config::ServerConfig;
use crate::signal::{ServerInput, ServerQueue, Signal};
use crate::state::LoopState;
use crate::ArenaError;

/// Owns the room, the current arena and everything that schedules them.
pub struct GameLoop {
    config: ServerConfig,
    queue: ServerQueue,
    room: Room,
    arena: Option<Arena>,
    state: LoopState,
    pacer: FramePacer,
    timers: SignalTimers,
    /// Bumped on every `NewArena` and reset. Tags generation results.
    generation: u64,
    worker: Option<JoinHandle<()>>,
}

impl GameLoop {
    /// # Errors
    /// Fails if the configuration is invalid or the timer runtime cannot
    /// start.
    pub fn new(config: ServerConfig, queue: ServerQueue) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self {
            room: Room::new(config.room_config()),
            pacer: FramePacer::new(config.pacer_config()),
            timers: SignalTimers::new()?,
            config,
            queue,
            arena: None,
            state: LoopState::WaitingForPlayers,
            generation: 0,
            worker: None,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn arena(&self) -> Option<&Arena> {
        self.arena.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    /// Processes inbound packs until a `Shutdown` signal arrives.
    pub fn run(mut self) {
        info!(players = self.config.players, points = self.config.points, "game loop started");
        loop {
            let Some(pack) = self.queue.dequeue_input(None) else {
                warn!("inbound queue closed");
                break;
            };
            if self.handle(pack).is_break() {
                break;
            }
        }
        info!("game loop stopped");
    }

    /// Processes one inbound pack.
    pub fn handle(&mut self, pack: InputPack<ServerInput>) -> ControlFlow<()> {
        match (pack.message, pack.endpoint) {
            (None, Some(endpoint)) => self.on_disconnection(endpoint),
            (Some(ServerInput::Message(message)), Some(endpoint)) => {
                self.on_message(message, endpoint)
            }
            (Some(ServerInput::Signal(signal)), _) => return self.on_signal(signal),
            (Some(ServerInput::Message(message)), None) => {
                warn!(kind = message.kind(), "client message without endpoint");
            }
            (None, None) => warn!("empty inbound pack"),
        }
        ControlFlow::Continue(())
    }

    // -----------------------------------------------------------------------
    // Client messages
    // -----------------------------------------------------------------------

    fn on_message(&mut self, message: ClientMessage, endpoint: Endpoint) {
        trace!(%endpoint, kind = message.kind(), "inbound");
        match message {
            ClientMessage::Version { value } => self.on_version(&value, endpoint),
            ClientMessage::Login { character } => self.on_login(&character, endpoint),
            ClientMessage::PlayerMovement { direction } => self.on_movement(direction, endpoint),
            ClientMessage::PlayerCast { skill } => self.on_cast(skill, endpoint),
            ClientMessage::Unknown => {
                error!(%endpoint, "unknown message, closing connection");
                self.queue.enqueue_output(OutputPack::close([endpoint]));
            }
        }
    }

    fn on_version(&mut self, client_version: &str, endpoint: Endpoint) {
        let validation = is_compatible(client_version);
        if !validation {
            warn!(%endpoint, client_version, server_version = VERSION, "incompatible client");
        }
        self.send_to(
            ServerMessage::CheckedVersion {
                value: VERSION.to_string(),
                validation,
            },
            endpoint,
        );
        self.send_to(
            ServerMessage::GameInfo {
                characters: self.room.characters(),
                players: self.config.players,
                points: self.config.points,
                arena_size: self.config.arena_size,
                seed: self.config.seed.clone(),
            },
            endpoint,
        );
    }

    fn on_login(&mut self, raw: &str, endpoint: Endpoint) {
        let status = self.room.login(raw, endpoint);
        self.send_to(ServerMessage::LoginStatus { status }, endpoint);

        match status {
            LoginStatus::Logged => {
                self.send(self.players_info(), self.room.endpoints());
                if self.room.is_complete() && self.state == LoopState::WaitingForPlayers {
                    info!("room complete");
                    self.signal_after(Signal::NewArena, Duration::ZERO);
                }
            }
            LoginStatus::Reconnected => {
                self.send_to(self.players_info(), endpoint);
                if let Some(arena) = &self.arena {
                    let info = arena_info(arena);
                    self.send_to(info, endpoint);
                }
            }
            LoginStatus::RoomCompleted
            | LoginStatus::AlreadyExists
            | LoginStatus::InvalidCharacter => return,
        }
        self.log_players();
    }

    fn on_movement(&mut self, vector: Vec2, endpoint: Endpoint) {
        let Some(direction) = Direction::from_vector(vector) else {
            warn!(%endpoint, %vector, "movement is not a unit direction");
            return;
        };
        let Some((arena, id)) = self.player_entity(endpoint, "movement") else {
            return;
        };
        if let Err(e) = arena.move_entity(id, direction) {
            debug!(%endpoint, error = %e, "movement dropped");
        }
    }

    fn on_cast(&mut self, skill: SkillId, endpoint: Endpoint) {
        let Some((arena, id)) = self.player_entity(endpoint, "cast") else {
            return;
        };
        match arena.cast(id, skill) {
            Ok(true) => {}
            Ok(false) => debug!(%endpoint, skill = skill.0, "cast rejected"),
            Err(e) => debug!(%endpoint, error = %e, "cast dropped"),
        }
    }

    /// The running arena and the entity of the player behind `endpoint`.
    fn player_entity(
        &mut self,
        endpoint: Endpoint,
        action: &'static str,
    ) -> Option<(&mut Arena, EntityId)> {
        let Some(player) = self.room.player_with_endpoint(endpoint) else {
            warn!(%endpoint, action, "request from unknown player");
            return None;
        };
        let character = player.character();
        let entity = player.entity();
        if !self.state.is_running() {
            debug!(%character, action, state = %self.state, "no running arena");
            return None;
        }
        match (self.arena.as_mut(), entity) {
            (Some(arena), Some(id)) => Some((arena, id)),
            _ => {
                debug!(%character, action, "player has no entity");
                None
            }
        }
    }

    fn on_disconnection(&mut self, endpoint: Endpoint) {
        match self.room.detach(endpoint) {
            Some(_) => self.log_players(),
            None => debug!(%endpoint, "anonymous connection closed"),
        }
    }

    // -----------------------------------------------------------------------
    // Signals
    // -----------------------------------------------------------------------

    fn on_signal(&mut self, signal: Signal) -> ControlFlow<()> {
        trace!(%signal, state = %self.state, "signal");
        match signal {
            Signal::NewArena => self.new_arena(),
            Signal::ArenaCreated { generation, arena } => self.arena_created(generation, arena),
            Signal::ComputeFrame => self.compute_frame(),
            Signal::ResetRoom => self.reset_room(),
            Signal::Shutdown => {
                self.shutdown();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn new_arena(&mut self) {
        if !self.state.can_transition_to(LoopState::ArenaLoading) {
            debug!(state = %self.state, "ignoring new arena request");
            return;
        }
        self.generation += 1;
        let generation = self.generation;
        let size = self.config.arena_size;
        let characters = self.room.characters();
        let seed = self
            .config
            .seed
            .clone()
            .unwrap_or_else(|| random_seed(&mut rand::rng()));

        self.transition(LoopState::ArenaLoading);
        info!(generation, size, %seed, "loading arena");

        let queue = self.queue.clone();
        let spawned = thread::Builder::new()
            .name("arena-generator".into())
            .spawn(move || {
                let started = Instant::now();
                let arena = Arena::generate(size, &seed, &characters).map(Box::new);
                debug!(
                    generation,
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "arena generated"
                );
                queue.enqueue_input(InputPack::signal(
                    Signal::ArenaCreated { generation, arena }.into(),
                ));
            });

        match spawned {
            Ok(handle) => self.worker = Some(handle),
            Err(e) => {
                error!(error = %e, "cannot spawn arena generator");
                self.signal_after(Signal::ResetRoom, Duration::ZERO);
            }
        }
    }

    fn arena_created(&mut self, generation: u64, arena: Result<Box<Arena>, WorldError>) {
        if generation != self.generation || self.state != LoopState::ArenaLoading {
            debug!(
                generation,
                current = self.generation,
                state = %self.state,
                "discarding stale arena"
            );
            return;
        }
        let arena = match arena {
            Ok(arena) => *arena,
            Err(e) => {
                error!(generation, error = %e, "arena generation failed");
                self.signal_after(Signal::ResetRoom, Duration::ZERO);
                return;
            }
        };

        self.room.release_entities();
        for entity in arena.entities() {
            if let Err(e) = self.room.attach_entity(entity.character(), entity.id()) {
                warn!(entity = %entity.id(), error = %e, "entity without player");
            }
        }

        self.send(arena_info(&arena), self.room.endpoints());
        info!(generation, seed = arena.seed(), entities = arena.entities().len(), "arena ready");

        self.arena = Some(arena);
        self.pacer.reset();
        self.transition(LoopState::Running);
        self.signal_after(Signal::ComputeFrame, Duration::ZERO);
    }

    fn compute_frame(&mut self) {
        if !self.state.is_running() {
            debug!(state = %self.state, "discarding frame signal");
            return;
        }
        let Some(arena) = self.arena.as_mut() else {
            warn!("running without an arena");
            return;
        };

        let step = arena.update(Instant::now());
        let frame = ServerMessage::Frame {
            step,
            entities: arena.frame_entities(),
            spells: arena.frame_spells(),
        };
        let finished = arena.has_finished();
        let survivor = arena.survivor();
        self.send(frame, self.room.endpoints());

        if finished {
            self.finish_round(step, survivor);
        } else {
            let delay = self.pacer.next_delay();
            self.signal_after(Signal::ComputeFrame, delay);
        }
    }

    fn finish_round(&mut self, step: u64, survivor: Option<char>) {
        match survivor {
            Some(character) => match self.room.add_point(character) {
                Ok(points) => info!(step, %character, points, "round won"),
                Err(e) => warn!(step, error = %e, "survivor is not in the room"),
            },
            None => info!(step, "round finished without survivor"),
        }

        let winner = self.room.winners().first().copied();
        self.transition(LoopState::Finished { winner });
        match winner {
            None => self.signal_after(Signal::NewArena, Duration::ZERO),
            Some(character) => {
                info!(%character, reset_delay_ms = self.config.reset_delay.as_millis() as u64, "series won");
                self.signal_after(Signal::ResetRoom, self.config.reset_delay);
            }
        }
    }

    fn reset_room(&mut self) {
        let cancelled = self.timers.cancel_all();
        let endpoints = self.room.endpoints();
        if !endpoints.is_empty() {
            self.queue.enqueue_output(OutputPack::close(endpoints));
        }
        self.room.clear();
        self.arena = None;
        self.generation += 1;
        self.transition(LoopState::WaitingForPlayers);
        info!(cancelled, "room reset");
    }

    fn shutdown(&mut self) {
        self.timers.shutdown();
        self.generation += 1;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("arena generator panicked");
            }
        }
        info!(state = %self.state, "game loop shutting down");
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: LoopState) {
        if !self.state.can_transition_to(next) {
            warn!(from = %self.state, to = %next, "unexpected state transition");
        }
        debug!(from = %self.state, to = %next, "state transition");
        self.state = next;
    }

    /// Re-enters `signal` into the loop after `delay`.
    fn signal_after(&mut self, signal: Signal, delay: Duration) {
        if delay.is_zero() {
            self.queue.enqueue_input(InputPack::signal(signal.into()));
            return;
        }
        let name = signal.name();
        let queue = self.queue.clone();
        let scheduled = self.timers.schedule(delay, move || {
            queue.enqueue_input(InputPack::signal(signal.into()));
        });
        if let Err(e) = scheduled {
            warn!(signal = name, error = %e, "signal not scheduled");
        }
    }

    fn send(&self, message: ServerMessage, endpoints: Vec<Endpoint>) {
        if endpoints.is_empty() {
            return;
        }
        trace!(kind = message.kind(), recipients = endpoints.len(), "outbound");
        self.queue.enqueue_output(OutputPack::new(message, endpoints));
    }

    fn send_to(&self, message: ServerMessage, endpoint: Endpoint) {
        trace!(kind = message.kind(), %endpoint, "outbound");
        self.queue.enqueue_output(OutputPack::to(message, endpoint));
    }

    fn players_info(&self) -> ServerMessage {
        ServerMessage::PlayersInfo {
            characters: self.room.characters(),
        }
    }

    fn log_players(&self) {
        info!(
            logged = ?self.room.characters(),
            connected = ?self.room.connected_characters(),
            "players"
        );
    }
}

fn arena_info(arena: &Arena) -> ServerMessage {
    ServerMessage::ArenaInfo {
        seed: arena.seed().to_string(),
        grid: arena.ground().grid().clone(),
    }
}

#[cfg(test)]
mod tests {
    use asciiarena_protocol::SpellKind;

    use super::*;

    const WAIT: Duration = Duration::from_secs(2);

    fn config() -> ServerConfig {
        ServerConfig {
            port: 0,
            players: 2,
            points: 3,
            arena_size: 8,
            seed: Some("LOOP01".into()),
            frame_rate: 10,
            reset_delay: Duration::from_millis(100),
        }
    }

    fn game_with(config: ServerConfig) -> (GameLoop, ServerQueue) {
        let queue = ServerQueue::new();
        let game = GameLoop::new(config, queue.clone()).expect("game loop should build");
        (game, queue)
    }

    fn message(game: &mut GameLoop, message: ClientMessage, endpoint: u64) {
        let flow = game.handle(InputPack::new(message.into(), Endpoint::new(endpoint)));
        assert!(flow.is_continue());
    }

    fn login(game: &mut GameLoop, character: &str, endpoint: u64) {
        message(
            game,
            ClientMessage::Login {
                character: character.into(),
            },
            endpoint,
        );
    }

    fn next_signal(queue: &ServerQueue) -> Signal {
        match queue.dequeue_input(Some(WAIT)).map(|p| p.message) {
            Some(Some(ServerInput::Signal(signal))) => signal,
            other => panic!("expected a signal, got {other:?}"),
        }
    }

    /// Handles signals from the queue until `name` has been handled.
    fn pump_until(game: &mut GameLoop, queue: &ServerQueue, name: &str) {
        loop {
            let signal = next_signal(queue);
            let handled = signal.name();
            let _ = game.handle(InputPack::signal(signal.into()));
            if handled == name {
                return;
            }
        }
    }

    fn outputs(queue: &ServerQueue) -> Vec<OutputPack<ServerMessage>> {
        std::iter::from_fn(|| queue.dequeue_output(Some(Duration::ZERO))).collect()
    }

    /// Two players logged in, arena installed, loop running.
    fn running_game() -> (GameLoop, ServerQueue) {
        let (mut game, queue) = game_with(config());
        login(&mut game, "A", 1);
        login(&mut game, "B", 2);
        pump_until(&mut game, &queue, "ArenaCreated");
        assert_eq!(game.state(), LoopState::Running);
        (game, queue)
    }

    // =====================================================================
    // Version and login
    // =====================================================================

    #[test]
    fn test_version_replies_checked_version_then_game_info() {
        let (mut game, queue) = game_with(config());
        message(
            &mut game,
            ClientMessage::Version {
                value: VERSION.into(),
            },
            1,
        );

        let out = outputs(&queue);
        assert_eq!(out.len(), 2);
        assert_eq!(
            out[0].message,
            Some(ServerMessage::CheckedVersion {
                value: VERSION.into(),
                validation: true,
            })
        );
        assert!(matches!(
            &out[1].message,
            Some(ServerMessage::GameInfo { players: 2, points: 3, arena_size: 8, .. })
        ));
        assert_eq!(out[1].endpoints, vec![Endpoint::new(1)]);
    }

    #[test]
    fn test_incompatible_version_is_reported() {
        let (mut game, queue) = game_with(config());
        message(
            &mut game,
            ClientMessage::Version {
                value: "99.0.0".into(),
            },
            1,
        );
        assert!(matches!(
            outputs(&queue)[0].message,
            Some(ServerMessage::CheckedVersion { validation: false, .. })
        ));
    }

    #[test]
    fn test_logged_broadcasts_players_info() {
        let (mut game, queue) = game_with(config());
        login(&mut game, "A", 1);

        let out = outputs(&queue);
        assert_eq!(
            out[0].message,
            Some(ServerMessage::LoginStatus {
                status: LoginStatus::Logged
            })
        );
        assert_eq!(
            out[1].message,
            Some(ServerMessage::PlayersInfo {
                characters: vec!['A']
            })
        );
        assert_eq!(game.state(), LoopState::WaitingForPlayers);
        assert_eq!(queue.input_len(), 0);
    }

    #[test]
    fn test_invalid_character_leaves_roster_untouched() {
        let (mut game, queue) = game_with(config());
        login(&mut game, "ab", 1);
        assert_eq!(
            outputs(&queue)[0].message,
            Some(ServerMessage::LoginStatus {
                status: LoginStatus::InvalidCharacter
            })
        );
        assert!(game.room().is_empty());
    }

    #[test]
    fn test_completing_the_room_requests_an_arena() {
        let (mut game, queue) = game_with(config());
        login(&mut game, "A", 1);
        login(&mut game, "B", 2);
        assert!(matches!(next_signal(&queue), Signal::NewArena));
    }

    #[test]
    fn test_unknown_message_closes_the_connection() {
        let (mut game, queue) = game_with(config());
        message(&mut game, ClientMessage::Unknown, 5);

        let out = outputs(&queue);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_close());
        assert_eq!(out[0].endpoints, vec![Endpoint::new(5)]);
    }

    #[test]
    fn test_disconnection_detaches_the_player() {
        let (mut game, _queue) = game_with(config());
        login(&mut game, "A", 1);
        let _ = game.handle(InputPack::disconnected(Endpoint::new(1)));

        let player = game.room().player('A').unwrap();
        assert!(!player.is_connected());
        assert_eq!(game.room().len(), 1);
    }

    // =====================================================================
    // Arena lifecycle
    // =====================================================================

    #[test]
    fn test_arena_created_broadcasts_arena_info_and_starts_frames() {
        let (mut game, queue) = game_with(config());
        login(&mut game, "A", 1);
        login(&mut game, "B", 2);
        outputs(&queue);

        pump_until(&mut game, &queue, "ArenaCreated");
        assert_eq!(game.state(), LoopState::Running);
        assert!(game.room().players().all(|p| p.entity().is_some()));

        let out = outputs(&queue);
        match &out[0].message {
            Some(ServerMessage::ArenaInfo { seed, grid }) => {
                assert_eq!(seed, "LOOP01");
                assert_eq!(grid.size(), 8);
            }
            other => panic!("expected arena info, got {other:?}"),
        }
        assert_eq!(out[0].endpoints.len(), 2);

        pump_until(&mut game, &queue, "ComputeFrame");
        match &outputs(&queue)[0].message {
            Some(ServerMessage::Frame { step, entities, .. }) => {
                assert_eq!(*step, 0);
                assert_eq!(entities.len(), 2);
            }
            other => panic!("expected a frame, got {other:?}"),
        }
        assert_eq!(game.arena().unwrap().step(), 1);
        assert_eq!(game.pending_timers(), 1);
    }

    #[test]
    fn test_stale_arena_is_discarded_after_reset() {
        let (mut game, queue) = game_with(config());
        login(&mut game, "A", 1);
        login(&mut game, "B", 2);
        pump_until(&mut game, &queue, "NewArena");

        let _ = game.handle(InputPack::signal(Signal::ResetRoom.into()));
        assert_eq!(game.state(), LoopState::WaitingForPlayers);

        pump_until(&mut game, &queue, "ArenaCreated");
        assert_eq!(game.state(), LoopState::WaitingForPlayers);
        assert!(game.arena().is_none());
    }

    #[test]
    fn test_failed_generation_resets_the_room() {
        let (mut game, queue) = game_with(config());
        login(&mut game, "A", 1);
        login(&mut game, "B", 2);
        pump_until(&mut game, &queue, "NewArena");
        let _ = next_signal(&queue);

        let failed = Signal::ArenaCreated {
            generation: game.generation(),
            arena: Err(WorldError::NotEnoughSpace { players: 2, free: 1 }),
        };
        let _ = game.handle(InputPack::signal(failed.into()));
        assert!(matches!(next_signal(&queue), Signal::ResetRoom));
    }

    #[test]
    fn test_reconnect_during_round_gets_arena_info() {
        let (mut game, queue) = running_game();
        let _ = game.handle(InputPack::disconnected(Endpoint::new(1)));
        outputs(&queue);

        login(&mut game, "A", 7);
        let kinds: Vec<&str> = outputs(&queue)
            .iter()
            .filter_map(|p| p.message.as_ref().map(ServerMessage::kind))
            .collect();
        assert_eq!(kinds, vec!["LoginStatus", "PlayersInfo", "ArenaInfo"]);
        assert_eq!(game.room().player('A').unwrap().endpoint(), Some(Endpoint::new(7)));
    }

    // =====================================================================
    // Player requests
    // =====================================================================

    #[test]
    fn test_movement_reaches_the_entity() {
        let (mut game, _queue) = running_game();
        let id = game.room().player('A').unwrap().entity().unwrap();
        message(
            &mut game,
            ClientMessage::PlayerMovement {
                direction: Direction::Right.as_vector(),
            },
            1,
        );

        let entity = game.arena().unwrap().entity(id).unwrap();
        assert!(entity.is_moving());
        assert_eq!(entity.direction(), Direction::Right);
    }

    #[test]
    fn test_diagonal_movement_is_dropped() {
        let (mut game, queue) = running_game();
        outputs(&queue);
        message(
            &mut game,
            ClientMessage::PlayerMovement {
                direction: Vec2::new(1, 1),
            },
            1,
        );
        assert!(game.arena().unwrap().entities().iter().all(|e| !e.is_moving()));
        assert!(outputs(&queue).is_empty());
    }

    #[test]
    fn test_requests_from_unknown_endpoint_are_dropped() {
        let (mut game, queue) = running_game();
        outputs(&queue);
        message(&mut game, ClientMessage::PlayerCast { skill: SkillId(0) }, 99);
        assert!(outputs(&queue).is_empty());
        assert!(game.arena().unwrap().entities().iter().all(|e| e.control().pending_cast().is_none()));
    }

    #[test]
    fn test_movement_before_arena_is_dropped() {
        let (mut game, _queue) = game_with(config());
        login(&mut game, "A", 1);
        message(
            &mut game,
            ClientMessage::PlayerMovement {
                direction: Direction::Up.as_vector(),
            },
            1,
        );
        assert!(game.arena().is_none());
    }

    #[test]
    fn test_cast_is_queued_and_resolved_by_the_next_frame() {
        let (mut game, _queue) = running_game();
        let id = game.room().player('A').unwrap().entity().unwrap();
        message(&mut game, ClientMessage::PlayerCast { skill: SkillId(0) }, 1);
        let pending = game.arena().unwrap().entity(id).unwrap().control().pending_cast();
        assert_eq!(pending, Some(SkillId(0)));

        let _ = game.handle(InputPack::signal(Signal::ComputeFrame.into()));
        let arena = game.arena().unwrap();
        assert!(arena.entity(id).is_none_or(|e| e.control().pending_cast().is_none()));
        assert!(arena.spells().iter().all(|s| s.kind() == SpellKind::FireBall));
    }

    // =====================================================================
    // Round end
    // =====================================================================

    #[test]
    fn test_round_without_series_winner_loads_a_new_arena() {
        let (mut game, queue) = running_game();
        let b = game.room().player('B').unwrap().entity().unwrap();
        game.arena.as_mut().unwrap().remove_entity(b);

        // Drain the pending ComputeFrame and handle one of our own.
        let _ = next_signal(&queue);
        let _ = game.handle(InputPack::signal(Signal::ComputeFrame.into()));

        assert_eq!(game.room().player('A').unwrap().points(), 1);
        assert_eq!(game.state(), LoopState::Finished { winner: None });
        pump_until(&mut game, &queue, "NewArena");
        assert_eq!(game.state(), LoopState::ArenaLoading);

        pump_until(&mut game, &queue, "ArenaCreated");
        assert_eq!(game.state(), LoopState::Running);
        assert_eq!(game.arena().unwrap().alive_players(), 2);
    }

    #[test]
    fn test_series_winner_resets_the_room_after_delay() {
        let (mut game, queue) = game_with(ServerConfig {
            points: 1,
            ..config()
        });
        login(&mut game, "A", 1);
        login(&mut game, "B", 2);
        pump_until(&mut game, &queue, "ArenaCreated");
        let b = game.room().player('B').unwrap().entity().unwrap();
        game.arena.as_mut().unwrap().remove_entity(b);
        let _ = next_signal(&queue);
        let _ = game.handle(InputPack::signal(Signal::ComputeFrame.into()));

        assert_eq!(game.state(), LoopState::Finished { winner: Some('A') });
        assert_eq!(game.pending_timers(), 1);
        outputs(&queue);

        pump_until(&mut game, &queue, "ResetRoom");
        assert_eq!(game.state(), LoopState::WaitingForPlayers);
        assert!(game.room().is_empty());
        assert!(game.arena().is_none());

        let out = outputs(&queue);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_close());
        assert_eq!(out[0].endpoints, vec![Endpoint::new(1), Endpoint::new(2)]);
    }

    #[test]
    fn test_shutdown_cancels_timers_and_breaks() {
        let (mut game, queue) = running_game();
        pump_until(&mut game, &queue, "ComputeFrame");
        assert_eq!(game.pending_timers(), 1);

        let flow = game.handle(InputPack::signal(Signal::Shutdown.into()));
        assert!(flow.is_break());
        assert_eq!(game.pending_timers(), 0);
    }

    #[test]
    fn test_run_returns_on_shutdown() {
        let (game, queue) = game_with(config());
        queue.enqueue_input(InputPack::signal(Signal::Shutdown.into()));
        let handle = thread::spawn(move || game.run());
        handle.join().unwrap();
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = GameLoop::new(
            ServerConfig {
                arena_size: 1,
                ..config()
            },
            ServerQueue::new(),
        );
        assert!(matches!(result, Err(ArenaError::Config(_))));
    }
}
