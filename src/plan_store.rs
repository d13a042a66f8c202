use tracing::warn;

use crate::db::Database;
use crate::error::StoreError;
use crate::models::{Level, Plan};

const PLAN_KEY: &str = "workout_plan";
const LEVEL_KEY: &str = "workout_level";

/// Durable cache of the last generated plan and the level it was
/// generated for. Holds at most one plan at a time.
pub struct PlanStore {
    db: Database,
}

impl PlanStore {
    pub fn new(db: Database) -> Self {
        PlanStore { db }
    }

    /// Reads the cached plan/level pair. Malformed stored data is treated
    /// as absent: the corrupt entries are deleted so the next load starts
    /// clean, and the caller never sees a partially valid value.
    pub fn load(&self) -> Result<Option<(Plan, Level)>, StoreError> {
        let Some(plan_json) = self.db.kv_get(PLAN_KEY)? else {
            return Ok(None);
        };

        let plan: Plan = match serde_json::from_str(&plan_json) {
            Ok(plan) => plan,
            Err(e) => {
                warn!("stored plan is unreadable, discarding it: {e}");
                self.erase_corrupt();
                return Ok(None);
            }
        };

        let level = match self.db.kv_get(LEVEL_KEY)? {
            Some(level_json) => match serde_json::from_str(&level_json) {
                Ok(level) => level,
                Err(e) => {
                    warn!("stored level is unreadable, discarding plan cache: {e}");
                    self.erase_corrupt();
                    return Ok(None);
                }
            },
            None => Level::default(),
        };

        Ok(Some((plan, level)))
    }

    /// Persists both keys in one transaction.
    pub fn save(&mut self, plan: &Plan, level: Level) -> Result<(), StoreError> {
        let plan_json = serde_json::to_string(plan)?;
        let level_json = serde_json::to_string(&level)?;
        self.db
            .kv_set_many(&[(PLAN_KEY, &plan_json), (LEVEL_KEY, &level_json)])
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.db.kv_delete(PLAN_KEY)?;
        self.db.kv_delete(LEVEL_KEY)?;
        Ok(())
    }

    fn erase_corrupt(&self) {
        if let Err(e) = self.db.kv_delete(PLAN_KEY) {
            warn!("failed to delete corrupt plan entry: {e}");
        }
        if let Err(e) = self.db.kv_delete(LEVEL_KEY) {
            warn!("failed to delete corrupt level entry: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_plan;

    fn store() -> PlanStore {
        PlanStore::new(Database::open_in_memory().expect("open in-memory db"))
    }

    #[test]
    fn empty_store_loads_absent() {
        assert!(store().load().expect("load").is_none());
    }

    #[test]
    fn save_then_load_returns_the_same_pair() {
        let mut store = store();
        store
            .save(&sample_plan(), Level::Level2)
            .expect("save plan");

        let (plan, level) = store.load().expect("load").expect("cached pair");
        assert_eq!(plan, sample_plan());
        assert_eq!(level, Level::Level2);
    }

    #[test]
    fn corrupt_plan_is_deleted_and_reported_absent() {
        let db = Database::open_in_memory().expect("open in-memory db");
        db.kv_set(PLAN_KEY, "{not json").expect("seed corrupt plan");
        db.kv_set(LEVEL_KEY, "\"Nivel 2: Medio\"").expect("seed level");

        let store = PlanStore::new(db);
        assert!(store.load().expect("load").is_none());
        // self-healed: both keys are gone
        assert!(store.db.kv_get(PLAN_KEY).expect("get").is_none());
        assert!(store.db.kv_get(LEVEL_KEY).expect("get").is_none());
    }

    #[test]
    fn missing_level_falls_back_to_default() {
        let db = Database::open_in_memory().expect("open in-memory db");
        let plan_json = serde_json::to_string(&sample_plan()).expect("encode plan");
        db.kv_set(PLAN_KEY, &plan_json).expect("seed plan");

        let store = PlanStore::new(db);
        let (_, level) = store.load().expect("load").expect("cached pair");
        assert_eq!(level, Level::Level1);
    }

    #[test]
    fn clear_removes_both_keys() {
        let mut store = store();
        store
            .save(&sample_plan(), Level::Level3)
            .expect("save plan");
        store.clear().expect("clear");
        assert!(store.load().expect("load").is_none());
    }
}
