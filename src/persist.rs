// used for persistence
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Mutex, MutexGuard};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ShlokaError};
use crate::study::StudyResponse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceMode {
    InMemory,
    File(String),
}

impl PersistenceMode {
    pub fn from_path(path: Option<&str>) -> Self {
        match path {
            Some(p) if !p.trim().is_empty() => Self::File(p.to_string()),
            _ => Self::InMemory,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub language: String,
    pub scripture: Option<String>,
    pub created: DateTime<Utc>,
}

/// Partial profile update; absent fields are left as they are. A blank
/// `scripture` clears the preferred scripture.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub language: Option<String>,
    pub scripture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub id: i64,
    pub user_id: i64,
    pub scripture: String,
    pub prompt: String,
    /// The serialized study response, exactly as stored.
    pub snapshot: String,
    /// blake3 hex digest of `snapshot`.
    pub digest: String,
    pub recorded: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_intact(&self) -> bool {
        blake3::hash(self.snapshot.as_bytes()).to_hex().as_str() == self.digest
    }
    pub fn response(&self) -> Result<StudyResponse> {
        Ok(serde_json::from_str(&self.snapshot)?)
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        name: row.get(1)?,
        language: row.get(2)?,
        scripture: row.get(3)?,
        created: row.get(4)?,
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        scripture: row.get(2)?,
        prompt: row.get(3)?,
        snapshot: row.get(4)?,
        digest: row.get(5)?,
        recorded: row.get(6)?,
    })
}

fn preferred_scripture(scripture: Option<&str>) -> Option<&str> {
    scripture.map(str::trim).filter(|s| !s.is_empty())
}

fn fetch_user(connection: &Connection, id: i64) -> Result<UserProfile> {
    connection
        .prepare_cached(
            "
            select Profile_Identity, Name, Language, Scripture, Created
                from Profile
                where Profile_Identity = ?
        ",
        )?
        .query_row(params![id], user_from_row)
        .optional()?
        .ok_or(ShlokaError::UnknownUser(id))
}

// ------------- Persistence -------------
pub struct Persistor {
    connection: Mutex<Connection>,
}

impl Persistor {
    pub fn new(mode: &PersistenceMode) -> Result<Self> {
        let connection = match mode {
            PersistenceMode::InMemory => Connection::open_in_memory()?,
            PersistenceMode::File(path) => Connection::open(path)?,
        };
        connection.execute_batch(
            "
            pragma foreign_keys = on;
            create table if not exists Profile (
                Profile_Identity integer primary key autoincrement,
                Name text not null,
                Language text not null,
                Scripture text null,
                Created text not null
            );
            create table if not exists Session (
                Session_Identity integer primary key autoincrement,
                Profile_Identity integer not null,
                Scripture text not null,
                Prompt text not null,
                Snapshot text not null,
                Digest text not null,
                Recorded text not null,
                constraint Session_of_Profile foreign key (
                    Profile_Identity
                ) references Profile(Profile_Identity) on delete cascade
            );
            create index if not exists Session_by_Profile on Session (
                Profile_Identity
            );
            ",
        )?;
        match mode {
            PersistenceMode::InMemory => info!("persistence is in memory"),
            PersistenceMode::File(path) => info!(%path, "persistence opened"),
        }
        Ok(Self { connection: Mutex::new(connection) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|e| ShlokaError::Lock(e.to_string()))
    }

    pub fn create_user(&self, name: &str, language: &str, scripture: Option<&str>) -> Result<UserProfile> {
        let connection = self.lock()?;
        connection
            .prepare_cached(
                "
                insert into Profile (
                    Name,
                    Language,
                    Scripture,
                    Created
                ) values (?, ?, ?, ?)
            ",
            )?
            .execute(params![name, language, preferred_scripture(scripture), Utc::now()])?;
        let id = connection.last_insert_rowid();
        debug!(id, "user created");
        fetch_user(&connection, id)
    }

    pub fn user(&self, id: i64) -> Result<UserProfile> {
        fetch_user(&*self.lock()?, id)
    }

    pub fn users(&self) -> Result<Vec<UserProfile>> {
        let connection = self.lock()?;
        let mut statement = connection.prepare_cached(
            "
            select Profile_Identity, Name, Language, Scripture, Created
                from Profile
                order by Profile_Identity
        ",
        )?;
        let users = statement
            .query_map([], user_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    pub fn update_user(&self, id: i64, update: &UserUpdate) -> Result<UserProfile> {
        let connection = self.lock()?;
        let current = fetch_user(&connection, id)?;
        let name = update.name.as_deref().unwrap_or(&current.name);
        let language = update.language.as_deref().unwrap_or(&current.language);
        let scripture = match update.scripture.as_deref() {
            Some(requested) => preferred_scripture(Some(requested)),
            None => current.scripture.as_deref(),
        };
        connection
            .prepare_cached(
                "
                update Profile
                    set Name = ?, Language = ?, Scripture = ?
                    where Profile_Identity = ?
            ",
            )?
            .execute(params![name, language, scripture, id])?;
        fetch_user(&connection, id)
    }

    /// Removes the user together with all of their sessions.
    pub fn delete_user(&self, id: i64) -> Result<()> {
        let connection = self.lock()?;
        let removed = connection
            .prepare_cached("delete from Profile where Profile_Identity = ?")?
            .execute(params![id])?;
        if removed == 0 {
            return Err(ShlokaError::UnknownUser(id));
        }
        debug!(id, "user deleted");
        Ok(())
    }

    /// Stores a snapshot of the response for an existing user and returns the
    /// new session identifier.
    pub fn record_session(&self, user_id: i64, response: &StudyResponse) -> Result<i64> {
        let snapshot = serde_json::to_string(response)?;
        let digest = blake3::hash(snapshot.as_bytes()).to_hex().to_string();
        let connection = self.lock()?;
        fetch_user(&connection, user_id)?;
        connection
            .prepare_cached(
                "
                insert into Session (
                    Profile_Identity,
                    Scripture,
                    Prompt,
                    Snapshot,
                    Digest,
                    Recorded
                ) values (?, ?, ?, ?, ?, ?)
            ",
            )?
            .execute(params![
                user_id,
                &response.scripture,
                &response.prompt,
                &snapshot,
                &digest,
                Utc::now()
            ])?;
        let id = connection.last_insert_rowid();
        debug!(session = id, user = user_id, "session recorded");
        Ok(id)
    }

    /// Sessions of a user, newest first.
    pub fn sessions(&self, user_id: i64) -> Result<Vec<SessionRecord>> {
        let connection = self.lock()?;
        fetch_user(&connection, user_id)?;
        let mut statement = connection.prepare_cached(
            "
            select Session_Identity,
                    Profile_Identity,
                    Scripture,
                    Prompt,
                    Snapshot,
                    Digest,
                    Recorded
                from Session
                where Profile_Identity = ?
                order by Session_Identity desc
        ",
        )?;
        let sessions = statement
            .query_map(params![user_id], session_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(prompt: &str) -> StudyResponse {
        StudyResponse {
            scripture: "gita".into(),
            prompt: prompt.into(),
            found_local: Vec::new(),
            heuristic_matches: Vec::new(),
            explanation: String::new(),
            session_id: None,
        }
    }

    #[test]
    fn mode_from_path() {
        assert_eq!(PersistenceMode::from_path(None), PersistenceMode::InMemory);
        assert_eq!(PersistenceMode::from_path(Some(" ")), PersistenceMode::InMemory);
        assert_eq!(
            PersistenceMode::from_path(Some("study.db")),
            PersistenceMode::File("study.db".into())
        );
    }

    #[test]
    fn user_crud() {
        let persistor = Persistor::new(&PersistenceMode::InMemory).unwrap();
        let user = persistor.create_user("Asha", "hi", None).unwrap();
        assert_eq!(persistor.user(user.id).unwrap(), user);

        let update = UserUpdate { scripture: Some("gita".into()), ..Default::default() };
        let updated = persistor.update_user(user.id, &update).unwrap();
        assert_eq!(updated.name, "Asha");
        assert_eq!(updated.language, "hi");
        assert_eq!(updated.scripture.as_deref(), Some("gita"));
        assert_eq!(persistor.users().unwrap().len(), 1);

        persistor.delete_user(user.id).unwrap();
        assert!(matches!(persistor.user(user.id), Err(ShlokaError::UnknownUser(_))));
        assert!(matches!(persistor.delete_user(user.id), Err(ShlokaError::UnknownUser(_))));
    }

    #[test]
    fn blank_scripture_clears_preference() {
        let persistor = Persistor::new(&PersistenceMode::InMemory).unwrap();
        let user = persistor.create_user("Lakshmi", "ta", Some("upanishad")).unwrap();

        let untouched = persistor.update_user(user.id, &UserUpdate::default()).unwrap();
        assert_eq!(untouched.scripture.as_deref(), Some("upanishad"));

        let clear = UserUpdate { scripture: Some("  ".into()), ..Default::default() };
        let cleared = persistor.update_user(user.id, &clear).unwrap();
        assert_eq!(cleared.scripture, None);
        assert_eq!(persistor.user(user.id).unwrap().scripture, None);

        let blank = persistor.create_user("Dev", "en", Some("")).unwrap();
        assert_eq!(blank.scripture, None);
    }

    #[test]
    fn sessions_are_listed_newest_first() {
        let persistor = Persistor::new(&PersistenceMode::InMemory).unwrap();
        let user = persistor.create_user("Ravi", "en", Some("veda")).unwrap();
        let first = persistor.record_session(user.id, &response("one")).unwrap();
        let second = persistor.record_session(user.id, &response("two")).unwrap();
        let sessions = persistor.sessions(user.id).unwrap();
        let ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second, first]);
        assert_eq!(sessions[0].response().unwrap().prompt, "two");
    }
}
