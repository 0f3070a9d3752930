//! Session entity (spec §3/§4.2): a named grouping of tabs for ownership
//! and bulk cleanup.

use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub name: Option<String>,
    /// The connection that implicitly owns this session (an auto-session,
    /// destroyed when that connection disconnects), or `None` for a
    /// client-named session with no connection affinity.
    pub owner: Option<u64>,
    pub tab_ids: HashSet<String>,
}

impl Session {
    pub fn new(id: String, name: Option<String>, owner: Option<u64>) -> Self {
        Self { id, name, owner, tab_ids: HashSet::new() }
    }
}
