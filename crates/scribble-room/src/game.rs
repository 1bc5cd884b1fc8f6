//! The room aggregate: roster, turn rotation, guessing, scoring, hints.
//!
//! `Room` is plain synchronous state. It never spawns, sleeps or sends;
//! every operation takes the current time and returns [`Effects`], the
//! events to deliver plus the timers to (re)arm. The room actor
//! ([`crate::room`]) owns one `Room`, feeds it commands one at a time and
//! carries out the effects. That keeps every rule testable without a
//! runtime.
//!
//! # Phases
//!
//! ```text
//! Lobby → WordSelection → Drawing → TurnEnd ─┬→ WordSelection (next drawer)
//!              │                             └→ GameEnd
//!              └────────(drawer left)──→ TurnEnd
//! ```
//!
//! # Timer staleness
//!
//! Every phase entry bumps `epoch`. Timers carry the epoch they were
//! armed in and [`Room::on_timer`] ignores any timer whose epoch or
//! expected phase no longer matches, so a timer that fires after its
//! phase ended is a no-op even if cancellation lost the race.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use scribble_protocol::{
    ConnectionId, Phase, PlayerView, Recipient, RoomCode, RoomSettings,
    RoomSnapshot, ServerEvent, StrokePayload, TurnEndReason, Visibility,
};
use scribble_words::WordBank;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::validate_settings;
use crate::player::{NewPlayer, Player};
use crate::{GameError, RoomConfig, hint, text};

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// Which phase timer a [`TimerRequest`] is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Drawer didn't pick a word in time.
    SelectionTimeout,
    /// The n-th scheduled hint of the turn.
    HintReveal(usize),
    /// Drawing time is up.
    DrawDeadline,
    /// End of the pause between turns.
    NextTurn,
}

/// A timer the actor should arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerRequest {
    pub kind: TimerKind,
    pub epoch: u64,
    pub at: Instant,
}

/// Output of one room operation.
#[derive(Debug, Default)]
pub struct Effects {
    /// Events in delivery order.
    pub messages: Vec<(Recipient, ServerEvent)>,
    /// Timers to arm after any cancellation.
    pub timers: Vec<TimerRequest>,
    /// Cancel every pending timer first (the phase changed).
    pub cancel_timers: bool,
}

impl Effects {
    fn send(&mut self, to: Recipient, event: ServerEvent) {
        self.messages.push((to, event));
    }

    /// All events addressed to `to` exactly (not resolved against a roster).
    pub fn to(&self, to: Recipient) -> impl Iterator<Item = &ServerEvent> {
        self.messages
            .iter()
            .filter(move |(r, _)| *r == to)
            .map(|(_, e)| e)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.timers.is_empty() && !self.cancel_timers
    }
}

/// A game command from a room member.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    StartGame,
    SelectWord(String),
    Draw(StrokePayload),
    Undo,
    ClearCanvas,
    Guess(String),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartGame => "startGame",
            Self::SelectWord(_) => "selectWord",
            Self::Draw(_) => "draw",
            Self::Undo => "undo",
            Self::ClearCanvas => "clearCanvas",
            Self::Guess(_) => "guess",
        }
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// One game session.
pub struct Room {
    code: RoomCode,
    settings: RoomSettings,
    config: Arc<RoomConfig>,
    words: Arc<dyn WordBank>,
    rng: StdRng,

    host: ConnectionId,
    /// Join order.
    players: Vec<Player>,
    next_seq: u64,

    phase: Phase,
    epoch: u64,
    /// Turns started so far minus one (0 during the first turn).
    turn_index: u32,
    drawer: Option<ConnectionId>,
    /// Join position of the latest drawer, kept after they leave so
    /// rotation can continue from where they sat.
    drawer_seq: u64,
    word: Option<String>,
    word_choices: Vec<String>,
    revealed: BTreeSet<usize>,
    deadline: Option<Instant>,
    guess_order: Vec<ConnectionId>,
}

impl Room {
    /// Creates a room in `Lobby` with `creator` as its only member and host.
    pub fn new(
        code: RoomCode,
        creator: NewPlayer,
        settings: RoomSettings,
        config: Arc<RoomConfig>,
        words: Arc<dyn WordBank>,
        rng: StdRng,
    ) -> Result<Self, GameError> {
        validate_settings(&settings)?;
        let host = creator.id;
        Ok(Self {
            code,
            settings,
            config,
            words,
            rng,
            host,
            players: vec![Player::new(creator, 0)],
            next_seq: 1,
            phase: Phase::Lobby,
            epoch: 0,
            turn_index: 0,
            drawer: None,
            drawer_seq: 0,
            word: None,
            word_choices: Vec::new(),
            revealed: BTreeSet::new(),
            deadline: None,
            guess_order: Vec::new(),
        })
    }

    // -- accessors -----------------------------------------------------------

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn host(&self) -> ConnectionId {
        self.host
    }

    pub fn host_name(&self) -> &str {
        self.player(self.host).map_or("", |p| p.name.as_str())
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: ConnectionId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.player(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_public(&self) -> bool {
        self.settings.visibility == Visibility::Public
    }

    pub fn drawer(&self) -> Option<ConnectionId> {
        self.drawer
    }

    /// The secret word, once chosen.
    pub fn word(&self) -> Option<&str> {
        self.word.as_deref()
    }

    pub fn word_choices(&self) -> &[String] {
        &self.word_choices
    }

    pub fn guess_order(&self) -> &[ConnectionId] {
        &self.guess_order
    }

    pub fn turn_index(&self) -> u32 {
        self.turn_index
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The masked word as guessers currently see it.
    pub fn hint(&self) -> Option<String> {
        self.word.as_deref().map(|w| hint::mask(w, &self.revealed))
    }

    /// 1-based round; 0 in the lobby.
    pub fn round(&self) -> u32 {
        if self.phase == Phase::Lobby {
            return 0;
        }
        let count = self.players.len().max(1) as u32;
        (1 + self.turn_index / count).min(self.settings.rounds)
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            host: self.host,
            phase: self.phase,
            settings: self.settings.clone(),
            players: self.views(),
            round: self.round(),
            total_rounds: self.settings.rounds,
            drawer: self.drawer,
            hint: self.hint(),
        }
    }

    /// Player views in join order.
    pub fn views(&self) -> Vec<PlayerView> {
        self.players
            .iter()
            .map(|p| p.view(self.host, self.drawer))
            .collect()
    }

    /// Player views best first.
    pub fn standings(&self) -> Vec<PlayerView> {
        let mut views = self.views();
        views.sort_by_key(|v| v.rank);
        views
    }

    // -- membership ------------------------------------------------------------

    /// Adds a player. Only possible in the lobby.
    pub fn join(&mut self, new: NewPlayer) -> Result<Effects, GameError> {
        if self.contains(new.id) {
            return Err(GameError::AlreadyInRoom);
        }
        if !self.phase.is_joinable() {
            return Err(GameError::GameAlreadyInProgress);
        }
        if self.players.len() >= self.settings.max_players {
            return Err(GameError::RoomFull);
        }

        let id = new.id;
        self.players.push(Player::new(new, self.next_seq));
        self.next_seq += 1;
        self.recompute_ranks();
        info!(room = %self.code, player = %id, players = self.players.len(), "player joined");

        let mut fx = Effects::default();
        fx.send(Recipient::Player(id), ServerEvent::RoomJoined {
            room: self.snapshot(),
        });
        if let Some(joined) = self.player(id) {
            fx.send(Recipient::AllExcept(id), ServerEvent::PlayerJoined {
                player: joined.view(self.host, self.drawer),
                players: self.views(),
            });
        }
        Ok(fx)
    }

    /// Removes a player (leave or disconnect).
    pub fn leave(
        &mut self,
        id: ConnectionId,
        now: Instant,
    ) -> Result<Effects, GameError> {
        let mut fx = Effects::default();
        self.remove(id, now, &mut fx)?;
        Ok(fx)
    }

    /// Host-only forced removal. The target is told before it goes.
    pub fn kick(
        &mut self,
        by: ConnectionId,
        target: ConnectionId,
        now: Instant,
    ) -> Result<Effects, GameError> {
        if !self.contains(by) {
            return Err(GameError::NotInRoom);
        }
        if by != self.host {
            return Err(GameError::NotHost);
        }
        if target == by {
            return Err(GameError::InvalidTarget("cannot kick yourself".into()));
        }
        if !self.contains(target) {
            return Err(GameError::PlayerNotFound);
        }

        let mut fx = Effects::default();
        fx.send(Recipient::Player(target), ServerEvent::Kicked {
            code: self.code.clone(),
        });
        info!(room = %self.code, player = %target, "player kicked");
        self.remove(target, now, &mut fx)?;
        Ok(fx)
    }

    fn remove(
        &mut self,
        id: ConnectionId,
        now: Instant,
        fx: &mut Effects,
    ) -> Result<(), GameError> {
        let Some(idx) = self.players.iter().position(|p| p.id == id) else {
            return Err(GameError::PlayerNotFound);
        };
        self.players.remove(idx);
        self.guess_order.retain(|g| *g != id);
        info!(room = %self.code, player = %id, players = self.players.len(), "player left");

        let Some(first) = self.players.first() else {
            // Last one out: the actor shuts the room down.
            fx.cancel_timers = true;
            fx.timers.clear();
            return Ok(());
        };
        if self.host == id {
            self.host = first.id;
            info!(room = %self.code, host = %self.host, "host reassigned");
        }
        self.recompute_ranks();
        fx.send(Recipient::All, ServerEvent::PlayerLeft {
            player_id: id,
            host: self.host,
            players: self.views(),
        });

        let was_drawer = self.drawer == Some(id);
        if self.phase.is_in_game() && self.players.len() < self.config.min_players {
            if self.phase.has_active_drawer() {
                let reason = if was_drawer {
                    TurnEndReason::DrawerLeft
                } else {
                    TurnEndReason::NotEnoughPlayers
                };
                self.end_turn(reason, now, fx);
            } else {
                self.end_game(fx);
            }
        } else if was_drawer && self.phase.has_active_drawer() {
            self.end_turn(TurnEndReason::DrawerLeft, now, fx);
        } else if self.phase == Phase::Drawing && self.all_guessed() {
            self.end_turn(TurnEndReason::AllGuessed, now, fx);
        }
        Ok(())
    }

    // -- commands --------------------------------------------------------------

    /// Applies a game command from a member.
    ///
    /// On `Err` nothing changed.
    pub fn handle(
        &mut self,
        from: ConnectionId,
        action: Action,
        now: Instant,
    ) -> Result<Effects, GameError> {
        if !self.contains(from) {
            return Err(GameError::NotInRoom);
        }
        let mut fx = Effects::default();
        match action {
            Action::StartGame => self.start_game(from, now, &mut fx)?,
            Action::SelectWord(word) => self.select_word(from, &word, now, &mut fx)?,
            Action::Draw(stroke) => {
                self.check_drawing(from)?;
                if stroke.encoded_len() > self.config.max_stroke_bytes {
                    debug!(room = %self.code, player = %from, "oversized stroke dropped");
                } else {
                    fx.send(Recipient::AllExcept(from), ServerEvent::Drawing {
                        from,
                        stroke,
                    });
                }
            }
            Action::Undo => {
                self.check_drawing(from)?;
                fx.send(Recipient::AllExcept(from), ServerEvent::UndoStroke { from });
            }
            Action::ClearCanvas => {
                self.check_drawing(from)?;
                fx.send(Recipient::AllExcept(from), ServerEvent::CanvasCleared { from });
            }
            Action::Guess(raw) => self.guess(from, &raw, now, &mut fx)?,
        }
        Ok(fx)
    }

    fn start_game(
        &mut self,
        from: ConnectionId,
        now: Instant,
        fx: &mut Effects,
    ) -> Result<(), GameError> {
        if from != self.host {
            return Err(GameError::NotHost);
        }
        match self.phase {
            Phase::Lobby => {}
            Phase::GameEnd => return Err(GameError::WrongPhase(self.phase)),
            _ => return Err(GameError::GameAlreadyInProgress),
        }
        if self.players.len() < self.config.min_players {
            return Err(GameError::NotEnoughPlayers(self.config.min_players));
        }
        let Some(first) = self.players.first().map(|p| p.id) else {
            return Err(GameError::NotEnoughPlayers(self.config.min_players));
        };

        for player in &mut self.players {
            player.score = 0;
            player.has_guessed = false;
        }
        self.recompute_ranks();
        self.turn_index = 0;
        info!(room = %self.code, players = self.players.len(), rounds = self.settings.rounds, "game started");

        let start = fx.messages.len();
        self.begin_turn(first, now, fx);
        fx.messages.insert(start, (Recipient::All, ServerEvent::GameStarted {
            room: self.snapshot(),
        }));
        Ok(())
    }

    fn select_word(
        &mut self,
        from: ConnectionId,
        word: &str,
        now: Instant,
        fx: &mut Effects,
    ) -> Result<(), GameError> {
        if self.phase != Phase::WordSelection {
            return Err(GameError::WrongPhase(self.phase));
        }
        if self.drawer != Some(from) {
            return Err(GameError::NotYourTurn);
        }
        let wanted = word.trim().to_lowercase();
        let Some(chosen) = self
            .word_choices
            .iter()
            .find(|w| w.to_lowercase() == wanted)
            .cloned()
        else {
            return Err(GameError::InvalidWordChoice);
        };
        self.begin_drawing(chosen, now, fx);
        Ok(())
    }

    /// Drawer-only canvas commands are valid only while drawing.
    fn check_drawing(&self, from: ConnectionId) -> Result<(), GameError> {
        if self.phase != Phase::Drawing {
            return Err(GameError::WrongPhase(self.phase));
        }
        if self.drawer != Some(from) {
            return Err(GameError::NotYourTurn);
        }
        Ok(())
    }

    fn guess(
        &mut self,
        from: ConnectionId,
        raw: &str,
        now: Instant,
        fx: &mut Effects,
    ) -> Result<(), GameError> {
        if self.phase.has_active_drawer() && self.drawer == Some(from) {
            return Err(GameError::DrawerCannotGuess);
        }
        let Some(player) = self.player(from) else {
            return Err(GameError::NotInRoom);
        };
        if self.phase == Phase::Drawing && player.has_guessed {
            return Err(GameError::AlreadyGuessed);
        }
        let name = player.name.clone();

        let guess = text::sanitize(raw, self.config.max_chat_chars);
        if guess.is_empty() {
            return Ok(());
        }

        let correct = self.phase == Phase::Drawing
            && self
                .word
                .as_deref()
                .is_some_and(|word| text::is_correct_guess(&guess, word));
        if !correct {
            fx.send(Recipient::All, ServerEvent::ChatMessage {
                player_id: from,
                player_name: name,
                text: guess,
                is_system: false,
            });
            return Ok(());
        }

        let remaining = self
            .deadline
            .map_or(0, |deadline| deadline.saturating_duration_since(now).as_secs());
        let points = self
            .config
            .base_points
            .saturating_add(u32::try_from(remaining).unwrap_or(u32::MAX));
        if let Some(player) = self.players.iter_mut().find(|p| p.id == from) {
            player.has_guessed = true;
            player.score = player.score.saturating_add(points);
        }
        self.guess_order.push(from);
        self.recompute_ranks();
        info!(room = %self.code, player = %from, points, "correct guess");

        fx.send(Recipient::All, ServerEvent::CorrectGuess {
            player_id: from,
            player_name: name.clone(),
            points,
            players: self.views(),
        });
        fx.send(Recipient::All, ServerEvent::ChatMessage {
            player_id: from,
            player_name: name.clone(),
            text: format!("{name} guessed the word!"),
            is_system: true,
        });

        if self.all_guessed() {
            self.end_turn(TurnEndReason::AllGuessed, now, fx);
        }
        Ok(())
    }

    // -- timers ----------------------------------------------------------------

    /// Handles a fired timer. Stale timers are ignored.
    pub fn on_timer(&mut self, kind: TimerKind, epoch: u64, now: Instant) -> Effects {
        let mut fx = Effects::default();
        if epoch != self.epoch {
            debug!(room = %self.code, ?kind, epoch, current = self.epoch, "stale timer ignored");
            return fx;
        }
        match (kind, self.phase) {
            (TimerKind::SelectionTimeout, Phase::WordSelection) => {
                if let Some(word) = self.word_choices.first().cloned() {
                    debug!(room = %self.code, "selection timed out, picking first word");
                    self.begin_drawing(word, now, &mut fx);
                }
            }
            (TimerKind::HintReveal(_), Phase::Drawing) => self.reveal_hint(&mut fx),
            (TimerKind::DrawDeadline, Phase::Drawing) => {
                self.end_turn(TurnEndReason::TimeUp, now, &mut fx);
            }
            (TimerKind::NextTurn, Phase::TurnEnd) => self.next_turn(now, &mut fx),
            (kind, phase) => {
                debug!(room = %self.code, ?kind, %phase, "timer does not apply to phase");
            }
        }
        fx
    }

    // -- transitions -------------------------------------------------------------

    fn enter(&mut self, phase: Phase, fx: &mut Effects) {
        self.phase = phase;
        self.epoch += 1;
        fx.cancel_timers = true;
        fx.timers.clear();
    }

    fn arm(&self, kind: TimerKind, at: Instant, fx: &mut Effects) {
        fx.timers.push(TimerRequest {
            kind,
            epoch: self.epoch,
            at,
        });
    }

    /// Enters `WordSelection` with `drawer` choosing.
    fn begin_turn(&mut self, drawer: ConnectionId, now: Instant, fx: &mut Effects) {
        let Some((drawer_name, seq)) =
            self.player(drawer).map(|p| (p.name.clone(), p.join_seq))
        else {
            return;
        };

        for player in &mut self.players {
            player.has_guessed = false;
        }
        self.guess_order.clear();
        self.revealed.clear();
        self.word = None;
        self.deadline = None;

        let choices = self.words.pick_words(
            &self.settings.theme,
            self.settings.difficulty,
            self.settings.words_per_turn,
            &mut self.rng,
        );
        if choices.is_empty() {
            warn!(room = %self.code, theme = %self.settings.theme, "word bank returned no words, ending game");
            self.end_game(fx);
            return;
        }

        self.enter(Phase::WordSelection, fx);
        self.drawer = Some(drawer);
        self.drawer_seq = seq;
        self.word_choices = choices;
        info!(room = %self.code, drawer = %drawer, turn = self.turn_index, round = self.round(), "turn started");

        fx.send(Recipient::All, ServerEvent::TurnStarted {
            drawer,
            drawer_name,
            round: self.round(),
            total_rounds: self.settings.rounds,
        });
        fx.send(Recipient::Player(drawer), ServerEvent::SelectWord {
            words: self.word_choices.clone(),
            timeout_secs: self.config.selection_timeout.as_secs(),
        });
        self.arm(
            TimerKind::SelectionTimeout,
            now + self.config.selection_timeout,
            fx,
        );
    }

    /// Enters `Drawing` with `word` as the secret.
    fn begin_drawing(&mut self, word: String, now: Instant, fx: &mut Effects) {
        let Some(drawer) = self.drawer else {
            return;
        };
        self.enter(Phase::Drawing, fx);

        let draw_time = Duration::from_secs(self.settings.draw_time_secs.into());
        let deadline = now + draw_time;
        self.deadline = Some(deadline);
        self.word_choices.clear();
        self.revealed.clear();
        let hint = hint::mask(&word, &self.revealed);
        self.word = Some(word.clone());
        debug!(room = %self.code, drawer = %drawer, "word chosen");

        fx.send(Recipient::Player(drawer), ServerEvent::WordChosen { word });
        fx.send(Recipient::All, ServerEvent::RoundStarted {
            drawer,
            hint,
            draw_time_secs: self.settings.draw_time_secs,
            round: self.round(),
            total_rounds: self.settings.rounds,
        });

        for (i, fraction) in self.config.hint_fractions.iter().enumerate() {
            self.arm(TimerKind::HintReveal(i), now + draw_time.mul_f64(*fraction), fx);
        }
        self.arm(TimerKind::DrawDeadline, deadline, fx);
    }

    /// Discloses one more letter; a no-op once every letter is shown.
    fn reveal_hint(&mut self, fx: &mut Effects) {
        let Some(word) = self.word.as_deref() else {
            return;
        };
        if hint::reveal_one(word, &mut self.revealed, &mut self.rng).is_some() {
            let hint = hint::mask(word, &self.revealed);
            debug!(room = %self.code, %hint, "hint revealed");
            fx.send(Recipient::All, ServerEvent::HintRevealed { hint });
        }
    }

    fn end_turn(&mut self, reason: TurnEndReason, now: Instant, fx: &mut Effects) {
        self.enter(Phase::TurnEnd, fx);
        self.deadline = None;
        self.word_choices.clear();
        let word = self.word.take();
        info!(room = %self.code, ?reason, turn = self.turn_index, "turn ended");

        fx.send(Recipient::All, ServerEvent::TurnEnded {
            word,
            reason,
            guess_order: self.guess_order.clone(),
            players: self.views(),
        });
        self.drawer = None;

        let total_turns = self
            .settings
            .rounds
            .saturating_mul(self.players.len() as u32);
        if self.players.len() < self.config.min_players
            || self.turn_index + 1 >= total_turns
        {
            self.end_game(fx);
        } else {
            self.arm(TimerKind::NextTurn, now + self.config.inter_turn_delay, fx);
        }
    }

    /// Rotates to the member who joined after the previous drawer,
    /// wrapping to the earliest joiner.
    fn next_turn(&mut self, now: Instant, fx: &mut Effects) {
        let next = self
            .players
            .iter()
            .find(|p| p.join_seq > self.drawer_seq)
            .or_else(|| self.players.first())
            .map(|p| p.id);
        let Some(next) = next else {
            return;
        };
        self.turn_index += 1;
        self.begin_turn(next, now, fx);
    }

    fn end_game(&mut self, fx: &mut Effects) {
        self.enter(Phase::GameEnd, fx);
        self.drawer = None;
        self.word = None;
        self.word_choices.clear();
        self.revealed.clear();
        self.deadline = None;
        info!(room = %self.code, "game ended");
        fx.send(Recipient::All, ServerEvent::GameEnded {
            standings: self.standings(),
        });
    }

    // -- scoring ------------------------------------------------------------------

    fn all_guessed(&self) -> bool {
        !self.guess_order.is_empty()
            && self.guess_order.len() >= self.players.len().saturating_sub(1)
    }

    /// Score descending; the stable sort keeps join order among ties.
    fn recompute_ranks(&mut self) {
        let mut order: Vec<usize> = (0..self.players.len()).collect();
        order.sort_by(|a, b| self.players[*b].score.cmp(&self.players[*a].score));
        for (pos, idx) in order.into_iter().enumerate() {
            self.players[idx].rank = pos as u32 + 1;
        }
    }
}
