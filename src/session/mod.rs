//! The match session.
//!
//! A `Session` owns everything one match needs: the room, the stage
//! scheduler, the rule registry, the ability catalog and the response
//! coordinator. It is driven by one thread; every component receives it by
//! `&mut` reference, so independent sessions can run side by side in one
//! process.
//!
//! ## Submodules
//!
//! - `interpreter`: the generic stage loop (`dispatch`, `trigger`)
//! - `handlers`: per-kind stage logic
//! - `protocols`: card use, rescue, countering, pin-dian and action helpers
//! - `turn`: phases, rotation and the match loop
//!
//! ## Example
//!
//! ```
//! use rust_sgs::core::{MatchConfig, PlayerId, PlayerRole};
//! use rust_sgs::response::{Reply, ScriptedTransport};
//!
//! let transport = ScriptedTransport::new().with_fallback(|_, _| Some(Reply::Decline));
//! let mut session = rust_sgs::Session::builder()
//!     .with_config(MatchConfig::new().with_seed(7))
//!     .with_transport(Box::new(transport))
//!     .with_player("liu", PlayerRole::Lord, 4)
//!     .with_player("cao", PlayerRole::Rebel, 4)
//!     .build()
//!     .unwrap();
//!
//! session.start().unwrap();
//! assert_eq!(session.current_player().unwrap(), PlayerId::new(0));
//! assert_eq!(session.room().hand(PlayerId::new(1)).len(), 4);
//! ```

mod handlers;
mod interpreter;
mod protocols;
mod turn;

use std::rc::Rc;

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::cards::{standard, CardCatalog, CardId};
use crate::core::{EngineError, GameRng, MatchConfig, PlayerId, PlayerRole, Result};
use crate::events::{EventId, GameEventKind, Stage};
use crate::response::{
    GroupOutcome, JoinMode, MessageKind, PendingRequest, RequestKind, Response,
    ResponseCoordinator, Transport,
};
use crate::room::{Player, Room};
use crate::rules::{GameResult, Rule, RuleId, RuleRegistry};
use crate::skills::{Character, Skill, SkillCatalog};
use crate::stack::StageScheduler;

pub use turn::TurnState;

/// One match.
#[derive(Debug)]
pub struct Session {
    room: Room,
    stages: StageScheduler,
    rules: RuleRegistry,
    skills: SkillCatalog,
    responses: ResponseCoordinator,
    config: MatchConfig,
    turn: Option<TurnState>,

    /// Roster drafted from in `start`; empty skips the draft.
    characters: Vec<Character>,
    character_rng: GameRng,

    /// Last event id handed out.
    next_event: u64,

    /// Events being dispatched, innermost last.
    in_flight: Vec<EventId>,
    /// Cross-event cancellations not yet merged into their event.
    pending_terminations: FxHashSet<EventId>,

    game_over: Option<GameResult>,
    next_tag: u64,
}

impl Session {
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    #[must_use]
    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn room_mut(&mut self) -> &mut Room {
        &mut self.room
    }

    #[must_use]
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// The scheduler, read-only. Stages are added through
    /// [`insert_stages`](Self::insert_stages).
    #[must_use]
    pub fn stages(&self) -> &StageScheduler {
        &self.stages
    }

    /// Splice extra stages after the current stage of the innermost `kind`
    /// event.
    pub fn insert_stages(&mut self, kind: GameEventKind, stages: &[Stage]) -> Result<()> {
        self.stages.insert_stages(kind, stages)
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.game_over.is_some()
    }

    #[must_use]
    pub fn game_result(&self) -> Option<&GameResult> {
        self.game_over.as_ref()
    }

    // === Rules and abilities ===

    #[must_use]
    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    pub fn register_rule(&mut self, rule: Rule) -> RuleId {
        self.rules.register(rule)
    }

    pub fn unregister_rule(&mut self, id: RuleId) -> Option<Rule> {
        self.rules.unregister(id)
    }

    #[must_use]
    pub fn skills(&self) -> &SkillCatalog {
        &self.skills
    }

    pub fn register_skill(&mut self, skill: Rc<dyn Skill>) {
        self.skills.register(skill);
    }

    /// Give `player` an ability and install its rules.
    pub fn grant_skill(&mut self, player: PlayerId, name: &str) -> Result<()> {
        let skill = self.skills.get(name)?;
        let seat = self.room.player_mut(player)?;
        if seat.has_skill(name) {
            return Ok(());
        }
        seat.skills.push(name.to_string());
        for rule in skill.rules(player) {
            self.rules.register(rule.with_owner(player));
        }
        log::debug!("{} gains {}", player, name);
        Ok(())
    }

    /// Whether `player` may activate `name` right now.
    #[must_use]
    pub fn can_use_skill(&self, player: PlayerId, name: &str) -> bool {
        let (Ok(seat), Ok(skill)) = (self.room.player(player), self.skills.get(name)) else {
            return false;
        };
        seat.is_alive()
            && seat.has_skill(name)
            && skill
                .uses_per_phase()
                .is_none_or(|limit| seat.ability_uses(name) < limit)
            && skill.can_use(self, player)
    }

    /// Fresh processing tag for a multi-step action.
    pub fn processing_tag(&mut self, prefix: &str) -> String {
        self.next_tag += 1;
        format!("{}-{}", prefix, self.next_tag)
    }

    // === Messaging ===

    /// Push a message to every participant.
    pub fn broadcast(&mut self, identifier: MessageKind, payload: &impl Serialize) -> Result<()> {
        let payload = serde_json::to_value(payload)?;
        self.responses.broadcast(identifier, payload)
    }

    /// Push a message to one participant.
    pub fn notify(
        &mut self,
        to: PlayerId,
        identifier: MessageKind,
        payload: &impl Serialize,
    ) -> Result<()> {
        let payload = serde_json::to_value(payload)?;
        self.responses.notify(to, identifier, payload)
    }

    /// Send a request without waiting for it.
    pub fn ask(
        &mut self,
        kind: RequestKind,
        to: PlayerId,
        payload: &impl Serialize,
    ) -> Result<PendingRequest> {
        let payload = serde_json::to_value(payload)?;
        self.responses.ask(kind, to, payload)
    }

    /// Join the replies of requests sent with [`ask`](Self::ask).
    pub fn gather(
        &mut self,
        requests: &[PendingRequest],
        mode: JoinMode,
        accept: impl FnMut(&Response) -> bool,
    ) -> Result<GroupOutcome> {
        self.responses.gather(requests, mode, accept)
    }

    /// Ask one participant and wait for the reply.
    pub fn await_response(
        &mut self,
        kind: RequestKind,
        to: PlayerId,
        payload: &impl Serialize,
    ) -> Result<Response> {
        let payload = serde_json::to_value(payload)?;
        self.responses.await_one(kind, to, payload)
    }

    /// End the match. Clears the scheduler so every running event stops at
    /// its next checkpoint.
    pub fn finish(&mut self, result: GameResult) -> Result<()> {
        if self.game_over.is_some() {
            return Ok(());
        }
        log::info!("game over: {:?}", result);
        self.stages.clear();
        self.game_over = Some(result.clone());
        self.broadcast(MessageKind::GameOver, &result)
    }
}

/// Builder for [`Session`].
///
/// Seats are taken in the order players are added. Without an explicit deck
/// the reference deck is registered and used.
#[derive(Default)]
pub struct SessionBuilder {
    config: MatchConfig,
    transport: Option<Box<dyn Transport>>,
    players: Vec<(String, PlayerRole, i32)>,
    catalog: CardCatalog,
    deck: Option<Vec<CardId>>,
    skills: SkillCatalog,
    characters: Vec<Character>,
}

impl std::fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("config", &self.config)
            .field("transport", &self.transport.is_some())
            .field("players", &self.players)
            .field("deck", &self.deck.as_ref().map(Vec::len))
            .field("characters", &self.characters.len())
            .finish_non_exhaustive()
    }
}

impl SessionBuilder {
    #[must_use]
    pub fn with_config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Add a seat at full health.
    #[must_use]
    pub fn with_player(mut self, name: impl Into<String>, role: PlayerRole, max_hp: i32) -> Self {
        self.players.push((name.into(), role, max_hp));
        self
    }

    /// Use these cards as the draw pile, first card on top.
    #[must_use]
    pub fn with_deck(mut self, deck: Vec<CardId>) -> Self {
        self.deck = Some(deck);
        self
    }

    #[must_use]
    pub fn with_skill(mut self, skill: Rc<dyn Skill>) -> Self {
        self.skills.register(skill);
        self
    }

    /// Characters to draft from when the match starts.
    #[must_use]
    pub fn with_characters(mut self, characters: Vec<Character>) -> Self {
        self.characters = characters;
        self
    }

    /// Catalog to register cards in before building.
    pub fn catalog_mut(&mut self) -> &mut CardCatalog {
        &mut self.catalog
    }

    pub fn build(self) -> Result<Session> {
        let Self {
            config,
            transport,
            players,
            mut catalog,
            deck,
            skills,
            characters,
        } = self;

        config.validate_players(players.len())?;
        let transport =
            transport.ok_or_else(|| EngineError::Config("no transport configured".to_string()))?;

        standard::install(&mut catalog);
        let deck = match deck {
            Some(deck) => deck,
            None => standard::standard_deck(&mut catalog),
        };
        for &card in &deck {
            catalog.get(card)?;
        }
        for character in &characters {
            for skill in &character.skills {
                skills.get(skill)?;
            }
        }

        let seats = players
            .into_iter()
            .enumerate()
            .map(|(seat, (name, role, hp))| Player::new(PlayerId::new(seat as u8), name, role, hp))
            .collect();
        let rng = GameRng::new(config.seed);
        let character_rng = rng.for_context("characters");
        let mut room = Room::new(seats, catalog, rng);
        room.fill_draw_pile(&deck);

        Ok(Session {
            room,
            stages: StageScheduler::new(),
            rules: RuleRegistry::new(),
            skills,
            responses: ResponseCoordinator::new(transport),
            config,
            turn: None,
            characters,
            character_rng,
            next_event: 0,
            in_flight: Vec::new(),
            pending_terminations: FxHashSet::default(),
            game_over: None,
            next_tag: 0,
        })
    }
}
