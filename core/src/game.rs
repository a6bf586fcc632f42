use core::time::Duration;
use rand::prelude::*;

use crate::*;

/// Abstract input action, already translated from whatever device produced
/// it. `ActivatePowerUp` carries the current selection because RevealArea
/// fires at it; the other kinds ignore the target.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Reveal(Coord2),
    ToggleFlag(Coord2),
    Chord(Coord2),
    ActivatePowerUp { kind: PowerUpKind, target: Coord2 },
    Restart(Difficulty),
    ChangeTheme(ThemeId),
}

/// Host-facing shell: the live session plus everything that outlives it
/// (progress snapshot, achievement engine, store handle, current theme).
///
/// The host loop calls `tick` once per frame with the frame delta, then
/// `apply` for each action, then drains the events for its renderer.
pub struct Game<S: ProgressStore> {
    store: S,
    snapshot: ProgressSnapshot,
    achievements: AchievementEngine,
    session: GameSession,
    theme: ThemeId,
    rng: SmallRng,
    events: Vec<GameEvent>,
    save_pending: bool,
}

impl<S: ProgressStore> Game<S> {
    /// Loads progress from the store and opens a first session. `seed` feeds
    /// the board-generation stream, so a fixed seed replays the same boards.
    pub fn new(difficulty: Difficulty, seed: u64, mut store: S) -> Self {
        let snapshot = store.load();
        let mut rng = SmallRng::seed_from_u64(seed);
        let session = GameSession::new(difficulty, rng.random());
        Self {
            store,
            snapshot,
            achievements: AchievementEngine::new(),
            session,
            theme: 0,
            rng,
            events: Vec::new(),
            save_pending: false,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn snapshot(&self) -> &ProgressSnapshot {
        &self.snapshot
    }

    pub const fn theme(&self) -> ThemeId {
        self.theme
    }

    /// Advances the session timers by one frame delta.
    pub fn tick(&mut self, delta: Duration) {
        self.session.tick(delta);
        self.pump();
    }

    /// Applies one action. In-session rejections (no charge, game over,
    /// out-of-bounds) are absorbed: logged, reported as "nothing changed",
    /// never an interruption of play.
    pub fn apply(&mut self, action: Action) -> bool {
        let updated = match action {
            Action::Reveal(coords) => match self.session.reveal(coords) {
                Ok(outcome) => outcome.has_update(),
                Err(err) => {
                    log::debug!("reveal {:?} rejected: {}", coords, err);
                    false
                }
            },
            Action::ToggleFlag(coords) => match self.session.toggle_flag(coords) {
                Ok(outcome) => outcome.has_update(),
                Err(err) => {
                    log::debug!("flag {:?} rejected: {}", coords, err);
                    false
                }
            },
            Action::Chord(coords) => match self.session.chord(coords) {
                Ok(outcome) => outcome.has_update(),
                Err(err) => {
                    log::debug!("chord {:?} rejected: {}", coords, err);
                    false
                }
            },
            Action::ActivatePowerUp { kind, target } => {
                match self.session.activate_power_up(kind, target) {
                    Ok(_) => true,
                    Err(err) => {
                        log::debug!("{:?} rejected: {}", kind, err);
                        false
                    }
                }
            }
            Action::Restart(difficulty) => {
                self.restart(difficulty);
                true
            }
            Action::ChangeTheme(theme) => self.change_theme(theme),
        };
        self.pump();
        updated
    }

    /// Explicit save trigger. Also fired internally when a session ends.
    pub fn save(&mut self) {
        self.flush();
    }

    /// Hands the buffered events to the host, oldest first.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        core::mem::take(&mut self.events)
    }

    /// Discards the current session and opens a fresh board. Pending
    /// progress is flushed on the way out.
    fn restart(&mut self, difficulty: Difficulty) {
        self.flush();
        self.session = GameSession::new(difficulty, self.rng.random());
        log::debug!("new {:?} session", difficulty);
        self.route(GameEvent::DifficultySelected(difficulty));
    }

    fn change_theme(&mut self, theme: ThemeId) -> bool {
        let changed = self.theme != theme;
        self.theme = theme;
        if self.snapshot.themes_tried.insert(theme) {
            self.save_pending = true;
        }
        self.route(GameEvent::ThemeChanged(theme));
        changed
    }

    /// Moves session events through the achievement evaluators and into the
    /// host buffer, then flushes when a session just ended.
    fn pump(&mut self) {
        for event in self.session.drain_events() {
            self.route(event);
        }
    }

    fn route(&mut self, event: GameEvent) {
        if let GameEvent::GameWon {
            difficulty,
            elapsed,
            ..
        } = event
        {
            if self.snapshot.record_win(difficulty, elapsed) {
                self.save_pending = true;
                log::debug!("new best time on {:?}: {:?}", difficulty, elapsed);
            }
        }

        let unlocked = self.achievements.observe(&event, &mut self.snapshot);
        let finished = matches!(
            event,
            GameEvent::GameWon { .. } | GameEvent::GameLost { .. }
        );
        self.events.push(event);
        self.events
            .extend(unlocked.into_iter().map(GameEvent::AchievementUnlocked));
        if finished {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if !(self.save_pending || self.achievements.needs_flush()) {
            return;
        }
        match self.store.save(&self.snapshot) {
            Ok(()) => {
                self.save_pending = false;
                self.achievements.mark_flushed();
            }
            Err(err) => log::warn!("progress save failed, will retry: {}", err),
        }
    }
}
