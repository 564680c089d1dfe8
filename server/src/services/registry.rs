//! League Registry: durable storage of [`League`] documents.
//!
//! Each league is one JSON document keyed by id. Mutations run in a single
//! transaction touching only that league's row.

use chrono::Utc;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::Db;
use crate::error::AppError;
use crate::models::context::CallerContext;
use crate::models::league::{League, NewLeague};

const LEAGUE_ID_LEN: usize = 20;
const MAX_ID_ATTEMPTS: usize = 64;

fn generate_league_id() -> String {
    let mut rng = rand::thread_rng();
    (0..LEAGUE_ID_LEN)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("League {} not found", id))
}

fn load(conn: &Connection, id: &str) -> Result<Option<League>, AppError> {
    let doc: Option<String> = conn
        .query_row("SELECT doc FROM leagues WHERE id = ?1", params![id], |row| row.get(0))
        .optional()?;
    match doc {
        Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
        None => Ok(None),
    }
}

/// Returns `false` when the id is already taken.
fn insert(conn: &Connection, league: &League) -> Result<bool, AppError> {
    let doc = serde_json::to_string(league)?;
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO leagues (id, thread_ref, doc) VALUES (?1, ?2, ?3)",
        params![league.id, league.thread_ref, doc],
    )?;
    Ok(inserted == 1)
}

fn save(conn: &Connection, league: &League) -> Result<(), AppError> {
    let doc = serde_json::to_string(league)?;
    conn.execute(
        "UPDATE leagues SET thread_ref = ?2, doc = ?3, updated_at = datetime('now') WHERE id = ?1",
        params![league.id, league.thread_ref, doc],
    )?;
    Ok(())
}

pub fn create(db: &Db, new: NewLeague) -> Result<League, AppError> {
    create_with_ids(db, new, generate_league_id)
}

fn create_with_ids<F>(db: &Db, new: NewLeague, mut next_id: F) -> Result<League, AppError>
where
    F: FnMut() -> String,
{
    db.with_tx(|tx| {
        let mut league = League {
            id: String::new(),
            host: new.host,
            region: new.region,
            game_mode: new.game_mode,
            match_type: new.match_type,
            perks: new.perks,
            players: Vec::new(),
            rank_required: new.rank_required,
            thread_ref: None,
            announcement_channel_ref: None,
            announcement_msg_ref: None,
            thread_msg_ref: None,
            private_link: new.private_link,
            created_at: Utc::now(),
        };
        for _ in 0..MAX_ID_ATTEMPTS {
            league.id = next_id();
            if insert(tx, &league)? {
                return Ok(league);
            }
            tracing::debug!(league_id = %league.id, "league id collision, regenerating");
        }
        Err(AppError::Internal("could not allocate a free league id".into()))
    })
}

pub fn get(db: &Db, id: &str) -> Result<League, AppError> {
    db.with_conn(|conn| load(conn, id))?.ok_or_else(|| not_found(id))
}

pub fn find_by_thread(db: &Db, thread_ref: &str) -> Result<League, AppError> {
    db.with_conn(|conn| {
        let doc: Option<String> = conn
            .query_row(
                "SELECT doc FROM leagues WHERE thread_ref = ?1 LIMIT 1",
                params![thread_ref],
                |row| row.get(0),
            )
            .optional()?;
        match doc {
            Some(doc) => Ok(serde_json::from_str(&doc)?),
            None => Err(AppError::NotFound(format!(
                "No league is bound to thread {}",
                thread_ref
            ))),
        }
    })
}

/// Finds the league a command targets: the explicit id if given, otherwise
/// the league whose coordination thread the command was issued from.
pub fn resolve(db: &Db, league_id: Option<&str>, ctx: &CallerContext) -> Result<League, AppError> {
    match (league_id.map(str::trim).filter(|id| !id.is_empty()), ctx.channel_id.as_deref()) {
        (Some(id), _) => get(db, id),
        (None, Some(channel)) => find_by_thread(db, channel).map_err(|_| {
            AppError::NotFound(
                "League not found. Specify the league_id or run the command inside the league's thread"
                    .into(),
            )
        }),
        (None, None) => Err(AppError::NotFound(
            "League not found. Specify the league_id".into(),
        )),
    }
}

/// Atomic read-modify-write of one league.
///
/// If `mutate` fails nothing is written.
pub fn update<F, T>(db: &Db, id: &str, mutate: F) -> Result<(League, T), AppError>
where
    F: FnOnce(&mut League) -> Result<T, AppError>,
{
    db.with_tx(|tx| {
        let mut league = load(tx, id)?.ok_or_else(|| not_found(id))?;
        let value = mutate(&mut league)?;
        save(tx, &league)?;
        Ok((league, value))
    })
}

/// Removes a league and returns its last state.
pub fn delete(db: &Db, id: &str) -> Result<League, AppError> {
    db.with_tx(|tx| {
        let league = load(tx, id)?.ok_or_else(|| not_found(id))?;
        tx.execute("DELETE FROM leagues WHERE id = ?1", params![id])?;
        Ok(league)
    })
}

pub fn list(db: &Db) -> Result<Vec<League>, AppError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT doc FROM leagues ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut leagues = Vec::new();
        for row in rows {
            leagues.push(serde_json::from_str(&row?)?);
        }
        Ok(leagues)
    })
}
