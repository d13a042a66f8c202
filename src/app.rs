use chrono::{Local, NaiveDate};
use tracing::warn;

use crate::error::StoreError;
use crate::history_store::HistoryStore;
use crate::models::{HistoryEntry, Level, Plan};
use crate::plan_service::PlanService;
use crate::plan_store::PlanStore;

/// Session-level state. `Ready` and `Failed` are stable until a level
/// change or manual regeneration triggers a new `Loading`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Loading,
    Ready,
    Failed(String),
}

/// Yes/no decision gate for destructive actions. The CLI asks on stdin;
/// tests and `--yes` inject canned answers.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Confirmer for `--yes` runs.
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Ties the stores and the plan service together. Owns the session state
/// and no persistence logic of its own.
pub struct AppController {
    plan_store: PlanStore,
    history_store: HistoryStore,
    service: PlanService,
    state: SessionState,
    plan: Option<Plan>,
    level: Level,
    history: Vec<HistoryEntry>,
}

impl AppController {
    pub fn new(plan_store: PlanStore, history_store: HistoryStore, service: PlanService) -> Self {
        AppController {
            plan_store,
            history_store,
            service,
            state: SessionState::Initializing,
            plan: None,
            level: Level::default(),
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Restores the cached plan if one exists (no network call), else
    /// fetches a fresh plan for the default level. A failing cache read
    /// is treated the same as an empty cache.
    pub async fn startup(&mut self) {
        self.history = self.history_store.get_history();

        let cached = match self.plan_store.load() {
            Ok(cached) => cached,
            Err(e) => {
                warn!("could not read the cached plan: {e}");
                None
            }
        };

        match cached {
            Some((plan, level)) => {
                self.plan = Some(plan);
                self.level = level;
                self.state = SessionState::Ready;
            }
            None => self.fetch(Level::default()).await,
        }
    }

    /// Switching level always requests a fresh plan; cached plans for
    /// other levels are not kept around.
    pub async fn change_level(&mut self, level: Level) {
        self.fetch(level).await;
    }

    /// Replaces the current plan after the user confirms. Returns false
    /// when the user declined.
    pub async fn regenerate(&mut self, confirm: &dyn Confirm) -> bool {
        if !confirm.confirm(
            "¿Seguro que quieres generar un nuevo plan? Se reemplazará el plan actual.",
        ) {
            return false;
        }
        let level = self.level;
        self.fetch(level).await;
        true
    }

    /// Erases the cached plan and the whole history, then restarts the
    /// session at the default level with a fresh fetch.
    pub async fn clear_all(&mut self, confirm: &dyn Confirm) -> Result<bool, StoreError> {
        if !confirm.confirm(
            "¿Estás segura de que quieres borrar el plan guardado? Se generará uno nuevo de iniciación.",
        ) {
            return Ok(false);
        }
        self.plan_store.clear()?;
        self.history_store.clear()?;
        self.plan = None;
        self.history.clear();
        self.level = Level::default();
        self.fetch(Level::default()).await;
        Ok(true)
    }

    /// Records the given date as completed at the current level. A date
    /// already in the history is a no-op.
    pub fn complete_day(&mut self, date: NaiveDate) {
        let date_str = date.format("%Y-%m-%d").to_string();
        if self.history.iter().any(|entry| entry.date == date_str) {
            return;
        }
        self.history = self.history_store.add_entry(HistoryEntry {
            date: date_str,
            level: self.level,
        });
    }

    pub fn complete_today(&mut self) {
        self.complete_day(Local::now().date_naive());
    }

    pub fn is_completed_on(&self, date: NaiveDate) -> bool {
        let date_str = date.format("%Y-%m-%d").to_string();
        self.history.iter().any(|entry| entry.date == date_str)
    }

    pub fn is_today_completed(&self) -> bool {
        self.is_completed_on(Local::now().date_naive())
    }

    /// One generation request. On success both the session and the store
    /// reflect the new plan/level; a store write failure only costs
    /// persistence across restarts, so it is logged rather than raised.
    /// On failure the previously displayed plan stays visible.
    async fn fetch(&mut self, level: Level) {
        self.state = SessionState::Loading;
        match self.service.request_plan(level).await {
            Ok(plan) => {
                if let Err(e) = self.plan_store.save(&plan, level) {
                    warn!("the new plan could not be persisted: {e}");
                }
                self.plan = Some(plan);
                self.level = level;
                self.state = SessionState::Ready;
            }
            Err(e) => {
                self.state = SessionState::Failed(e.to_string());
            }
        }
    }
}
