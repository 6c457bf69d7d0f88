//! Remote-first collections with local fallback.
//!
//! Each operation tries the REST backend first. Any failure (transport
//! error, non-success status, undecodable body) is logged and the same
//! operation runs against the local store instead. Successful remote
//! mutations are mirrored into the local store on a best-effort basis so a
//! later outage still sees the last known state.
//!
//! Local reads are lenient: entries that do not decode are skipped and an
//! unreadable file reads as empty. Local rewrites are not. Undecodable
//! entries are written back verbatim, and a file that is not a JSON array
//! at all is never written over.

use crate::store::{self, KeyValueStore, GOALS_KEY, WORKOUTS_KEY};
use crate::{
    Error, Goal, GoalPatch, Method, NewGoal, NewWorkout, RemoteApi, Result, Workout, WorkoutPatch,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::marker::PhantomData;
use uuid::Uuid;

/// A record kind that can be stored in a [`Repository`]
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Fields supplied by the user on create
    type Draft: Serialize;
    /// Partial update
    type Patch: Serialize;

    /// Human-readable kind, used in errors and logs
    const KIND: &'static str;
    /// REST collection path
    const ENDPOINT: &'static str;
    /// Local storage key
    const STORE_KEY: &'static str;

    fn id(&self) -> &str;
    fn validate_draft(draft: &Self::Draft) -> Result<()>;
    fn validate_patch(patch: &Self::Patch) -> Result<()>;
    fn from_draft(draft: Self::Draft, id: String, user_id: String, now: DateTime<Utc>) -> Self;
    fn apply_patch(&mut self, patch: &Self::Patch, now: DateTime<Utc>);
}

impl Record for Goal {
    type Draft = NewGoal;
    type Patch = GoalPatch;

    const KIND: &'static str = "Goal";
    const ENDPOINT: &'static str = "/metas";
    const STORE_KEY: &'static str = GOALS_KEY;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate_draft(draft: &NewGoal) -> Result<()> {
        draft.validate()
    }

    fn validate_patch(patch: &GoalPatch) -> Result<()> {
        patch.validate()
    }

    fn from_draft(draft: NewGoal, id: String, user_id: String, now: DateTime<Utc>) -> Self {
        Goal {
            id,
            title: draft.title,
            description: draft.description,
            target: draft.target,
            current: draft.current,
            unit: draft.unit,
            deadline: draft.deadline,
            user_id: Some(user_id),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    fn apply_patch(&mut self, patch: &GoalPatch, now: DateTime<Utc>) {
        patch.apply(self);
        self.updated_at = Some(now);
    }
}

impl Record for Workout {
    type Draft = NewWorkout;
    type Patch = WorkoutPatch;

    const KIND: &'static str = "Workout";
    const ENDPOINT: &'static str = "/treinos";
    const STORE_KEY: &'static str = WORKOUTS_KEY;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate_draft(draft: &NewWorkout) -> Result<()> {
        draft.validate()
    }

    fn validate_patch(patch: &WorkoutPatch) -> Result<()> {
        patch.validate()
    }

    fn from_draft(draft: NewWorkout, id: String, user_id: String, now: DateTime<Utc>) -> Self {
        Workout {
            id,
            name: draft.name,
            description: draft.description,
            duration_minutes: draft.duration_minutes,
            exercises: draft.exercises,
            completed: draft.completed,
            date: draft.date,
            user_id: Some(user_id),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    fn apply_patch(&mut self, patch: &WorkoutPatch, now: DateTime<Utc>) {
        patch.apply(self);
        self.updated_at = Some(now);
    }
}

/// Goal collection
pub type GoalRepository<'a> = Repository<'a, Goal>;
/// Workout collection
pub type WorkoutRepository<'a> = Repository<'a, Workout>;

/// CRUD access to one collection, remote first with local fallback
pub struct Repository<'a, R: Record> {
    remote: &'a dyn RemoteApi,
    store: &'a dyn KeyValueStore,
    user_id: String,
    _record: PhantomData<R>,
}

impl<'a, R: Record> Repository<'a, R> {
    pub fn new(remote: &'a dyn RemoteApi, store: &'a dyn KeyValueStore, user_id: impl Into<String>) -> Self {
        Self {
            remote,
            store,
            user_id: user_id.into(),
            _record: PhantomData,
        }
    }

    /// All records. Never fails: an unreachable remote yields the local array,
    /// and an unreadable local array yields an empty list.
    pub fn list(&self) -> Vec<R> {
        match self.fetch::<Vec<R>>(Method::Get, R::ENDPOINT, None) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("Listing {} from remote failed: {}. Using local copy.", R::KIND, e);
                self.local_items()
            }
        }
    }

    /// A single record by id
    pub fn get(&self, id: &str) -> Result<R> {
        match self.fetch::<R>(Method::Get, &self.item_path(id), None) {
            Ok(item) => Ok(item),
            Err(e) => {
                tracing::warn!("Fetching {} {} from remote failed: {}. Using local copy.", R::KIND, id, e);
                self.local_items()
                    .into_iter()
                    .find(|item| item.id() == id)
                    .ok_or_else(|| Error::not_found(R::KIND, id))
            }
        }
    }

    /// Create a record from a validated draft
    pub fn create(&self, draft: R::Draft) -> Result<R> {
        R::validate_draft(&draft)?;

        let mut body = serde_json::to_value(&draft)?;
        if let Value::Object(map) = &mut body {
            map.insert("userId".into(), json!(self.user_id));
        }

        match self.fetch::<R>(Method::Post, R::ENDPOINT, Some(&body)) {
            Ok(created) => {
                self.mirror(|local| local.upsert(created.clone()));
                Ok(created)
            }
            Err(e) => {
                tracing::warn!("Creating {} on remote failed: {}. Saving locally.", R::KIND, e);
                let created = R::from_draft(
                    draft,
                    Uuid::new_v4().to_string(),
                    self.user_id.clone(),
                    Utc::now(),
                );
                let mut local = self.load_local()?;
                local.push(created.clone());
                self.save_local(&local)?;
                tracing::info!("Created {} {} locally", R::KIND, created.id());
                Ok(created)
            }
        }
    }

    /// Merge `patch` into the record with the given id
    pub fn update(&self, id: &str, patch: &R::Patch) -> Result<R> {
        R::validate_patch(patch)?;

        let now = Utc::now();
        let mut body = serde_json::to_value(patch)?;
        if let Value::Object(map) = &mut body {
            map.insert("updatedAt".into(), json!(now));
        }

        match self.fetch::<R>(Method::Put, &self.item_path(id), Some(&body)) {
            Ok(updated) => {
                self.mirror(|local| local.upsert(updated.clone()));
                Ok(updated)
            }
            Err(e) => {
                tracing::warn!("Updating {} {} on remote failed: {}. Updating locally.", R::KIND, id, e);
                self.modify_local(id, |item| item.apply_patch(patch, now))
            }
        }
    }

    /// Remove the record with the given id
    pub fn delete(&self, id: &str) -> Result<()> {
        match self.remote.request(Method::Delete, &self.item_path(id), None) {
            Ok(_) => {
                self.mirror(|local| {
                    local.remove(id);
                });
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Deleting {} {} on remote failed: {}. Deleting locally.", R::KIND, id, e);
                let mut local = self.load_local()?;
                if !local.remove(id) {
                    return Err(Error::not_found(R::KIND, id));
                }
                self.save_local(&local)
            }
        }
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{}", R::ENDPOINT, id)
    }

    /// Issue a request and decode its body as `T`; an empty body is a failure
    fn fetch<T: DeserializeOwned>(&self, method: Method, path: &str, body: Option<&Value>) -> Result<T> {
        let value = self
            .remote
            .request(method, path, body)?
            .ok_or_else(|| Error::Other(format!("empty response for {} {}", method, path)))?;
        Ok(serde_json::from_value(value)?)
    }

    /// Local array for reading; an unreadable collection reads as empty
    fn local_items(&self) -> Vec<R> {
        match self.load_local() {
            Ok(local) => local.into_records(),
            Err(e) => {
                tracing::warn!("Unable to read local {}: {}. Using empty list.", R::STORE_KEY, e);
                Vec::new()
            }
        }
    }

    /// Local array for rewriting; an unreadable collection is an error
    fn load_local(&self) -> Result<LocalCollection<R>> {
        let values = store::read_raw_array(self.store, R::STORE_KEY)?;
        Ok(LocalCollection::decode(values))
    }

    fn save_local(&self, local: &LocalCollection<R>) -> Result<()> {
        store::write_json(self.store, R::STORE_KEY, &local.to_values()?)
    }

    /// Apply `f` to the local record with `id` and persist the result
    fn modify_local<F>(&self, id: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut R),
    {
        let mut local = self.load_local()?;
        let item = local
            .find_mut(id)
            .ok_or_else(|| Error::not_found(R::KIND, id))?;
        f(item);
        let updated = item.clone();
        self.save_local(&local)?;
        Ok(updated)
    }

    /// Best-effort local mirror of a successful remote mutation
    fn mirror<F>(&self, f: F)
    where
        F: FnOnce(&mut LocalCollection<R>),
    {
        let mut local = match self.load_local() {
            Ok(local) => local,
            Err(e) => {
                tracing::warn!("Not mirroring into local {}: {}", R::STORE_KEY, e);
                return;
            }
        };
        f(&mut local);
        if let Err(e) = self.save_local(&local) {
            tracing::warn!("Failed to mirror {} into local store: {}", R::STORE_KEY, e);
        }
    }
}

/// A stored element: a decoded record, or one kept verbatim
enum Entry<R> {
    Record(R),
    Unreadable(Value),
}

/// Local array loaded for a read-modify-write
///
/// Elements that fail to decode as `R` stay in place as raw JSON and are
/// written back untouched, so a rewrite never drops data it could not read.
struct LocalCollection<R> {
    entries: Vec<Entry<R>>,
}

impl<R: Record> LocalCollection<R> {
    fn decode(values: Vec<Value>) -> Self {
        let entries = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| match serde_json::from_value::<R>(value.clone()) {
                Ok(record) => Entry::Record(record),
                Err(e) => {
                    tracing::warn!(
                        "Skipping unreadable {} entry at index {}: {}",
                        R::STORE_KEY,
                        index,
                        e
                    );
                    Entry::Unreadable(value)
                }
            })
            .collect();
        Self { entries }
    }

    fn into_records(self) -> Vec<R> {
        self.entries
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Record(record) => Some(record),
                Entry::Unreadable(_) => None,
            })
            .collect()
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut R> {
        self.entries.iter_mut().find_map(|entry| match entry {
            Entry::Record(record) if record.id() == id => Some(record),
            _ => None,
        })
    }

    fn push(&mut self, record: R) {
        self.entries.push(Entry::Record(record));
    }

    /// Replace the record with the same id, or append it
    fn upsert(&mut self, record: R) {
        match self.find_mut(record.id()) {
            Some(existing) => *existing = record,
            None => self.push(record),
        }
    }

    /// Drop every record with `id`; false when none matched
    fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !matches!(entry, Entry::Record(record) if record.id() == id));
        self.entries.len() != before
    }

    fn to_values(&self) -> Result<Vec<Value>> {
        self.entries
            .iter()
            .map(|entry| match entry {
                Entry::Record(record) => serde_json::to_value(record).map_err(Error::from),
                Entry::Unreadable(value) => Ok(value.clone()),
            })
            .collect()
    }
}

/// Completion filter for workout listings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WorkoutFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl WorkoutFilter {
    pub fn matches(&self, workout: &Workout) -> bool {
        match self {
            WorkoutFilter::All => true,
            WorkoutFilter::Completed => workout.completed,
            WorkoutFilter::Pending => !workout.completed,
        }
    }
}

impl std::str::FromStr for WorkoutFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "all" | "todos" => Ok(WorkoutFilter::All),
            "completed" | "concluidos" => Ok(WorkoutFilter::Completed),
            "pending" | "pendentes" => Ok(WorkoutFilter::Pending),
            other => Err(Error::Validation(format!("unknown workout filter: {}", other))),
        }
    }
}

impl Repository<'_, Workout> {
    /// Flip the completion flag of a workout
    pub fn toggle_complete(&self, id: &str) -> Result<Workout> {
        let path = format!("{}/toggle", self.item_path(id));
        match self.fetch::<Workout>(Method::Patch, &path, None) {
            Ok(updated) => {
                self.mirror(|local| local.upsert(updated.clone()));
                Ok(updated)
            }
            Err(e) => {
                tracing::warn!("Toggling workout {} on remote failed: {}. Toggling locally.", id, e);
                let now = Utc::now();
                self.modify_local(id, |workout| {
                    workout.completed = !workout.completed;
                    workout.updated_at = Some(now);
                })
            }
        }
    }

    /// Workouts matching `filter`
    pub fn filtered(&self, filter: WorkoutFilter) -> Vec<Workout> {
        self.list()
            .into_iter()
            .filter(|w| filter.matches(w))
            .collect()
    }
}
