//! Command palette index and state.
//!
//! With no query the palette offers a static browse list taken from the
//! patient navigation tree. Typed queries match that list locally and are
//! also sent to the dynamic search endpoint; only the response to the
//! latest query is kept.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MoodTraceResult;
use crate::models::space::substitute_slug;
use crate::navigation::PATIENT_NAVIGATION;

/// Default global chord toggling the palette.
pub const DEFAULT_SHORTCUT: &str = "mod+k";

/// Default delay between the last keystroke and dispatching a search.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// A static palette entry derived from the navigation tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub group: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    /// Href template containing `:spaceSlug`.
    pub href: &'static str,
}

/// A dynamic result returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    /// Kind of entity (e.g. `medication`, `journal`).
    pub kind: String,
    pub label: String,
    /// Href template containing `:spaceSlug`.
    pub href: String,
}

/// Dynamic search over a space's entities.
pub trait SearchBackend: Send + Sync {
    fn search(
        &self,
        space_id: Uuid,
        query: &str,
    ) -> impl Future<Output = MoodTraceResult<Vec<SearchHit>>> + Send;
}

/// Every link of the patient tree, in tree order.
///
/// The list is the same for every viewer.
pub fn browse_entries() -> Vec<PaletteEntry> {
    PATIENT_NAVIGATION
        .iter()
        .flat_map(|group| {
            group.links.iter().map(move |link| PaletteEntry {
                group: group.title,
                label: link.label,
                icon: link.icon,
                href: link.href,
            })
        })
        .collect()
}

/// Static entries whose label or group title contains `query`,
/// case-insensitively. An empty query matches everything.
pub fn match_entries(query: &str) -> Vec<PaletteEntry> {
    let needle = query.trim().to_lowercase();
    browse_entries()
        .into_iter()
        .filter(|e| {
            needle.is_empty()
                || e.label.to_lowercase().contains(&needle)
                || e.group.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Identifies one dispatched search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    pub id: u64,
    pub query: String,
}

/// Client-side palette state for one viewer of one space.
#[derive(Debug)]
pub struct CommandPalette {
    shortcut: String,
    debounce_ms: u64,
    open: bool,
    query: String,
    next_ticket: u64,
    latest: Option<QueryTicket>,
    hits: Vec<SearchHit>,
}

impl Default for CommandPalette {
    fn default() -> Self {
        Self::new(DEFAULT_SHORTCUT, DEFAULT_DEBOUNCE_MS)
    }
}

impl CommandPalette {
    pub fn new(shortcut: impl Into<String>, debounce_ms: u64) -> Self {
        Self {
            shortcut: shortcut.into(),
            debounce_ms,
            open: false,
            query: String::new(),
            next_ticket: 0,
            latest: None,
            hits: Vec::new(),
        }
    }

    /// How long the client waits after a keystroke before dispatching
    /// the ticket returned by [`set_query`](Self::set_query).
    pub fn debounce_ms(&self) -> u64 {
        self.debounce_ms
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Dynamic hits for the latest query.
    pub fn hits(&self) -> &[SearchHit] {
        &self.hits
    }

    /// Handle a key chord; returns whether it toggled the palette.
    pub fn handle_shortcut(&mut self, chord: &str) -> bool {
        if chord.eq_ignore_ascii_case(&self.shortcut) {
            self.toggle();
            true
        } else {
            false
        }
    }

    pub fn toggle(&mut self) {
        if self.open {
            self.close();
        } else {
            self.open = true;
        }
    }

    /// Close and reset the query and any pending search.
    pub fn close(&mut self) {
        self.open = false;
        self.query.clear();
        self.latest = None;
        self.hits.clear();
    }

    /// Update the query text.
    ///
    /// Returns a ticket to dispatch to the search endpoint, or `None`
    /// when the query is blank (the browse list is shown instead).
    pub fn set_query(&mut self, query: &str) -> Option<QueryTicket> {
        self.query = query.to_string();
        self.hits.clear();

        let trimmed = query.trim();
        if trimmed.is_empty() {
            self.latest = None;
            return None;
        }

        self.next_ticket += 1;
        let ticket = QueryTicket {
            id: self.next_ticket,
            query: trimmed.to_string(),
        };
        self.latest = Some(ticket.clone());
        Some(ticket)
    }

    /// Store search results if `ticket` is still the latest query.
    ///
    /// Returns `false` when the response is stale and was dropped.
    pub fn accept_results(&mut self, ticket: &QueryTicket, hits: Vec<SearchHit>) -> bool {
        match &self.latest {
            Some(latest) if latest == ticket => {
                self.hits = hits;
                true
            }
            _ => false,
        }
    }

    /// Static entries to display for the current query.
    pub fn visible_entries(&self) -> Vec<PaletteEntry> {
        match_entries(&self.query)
    }

    /// Resolve a static entry to a concrete href and close the palette.
    pub fn select(&mut self, entry: &PaletteEntry, space_slug: &str) -> String {
        self.close();
        substitute_slug(entry.href, space_slug)
    }

    /// Resolve a dynamic hit to a concrete href and close the palette.
    pub fn select_hit(&mut self, hit: &SearchHit, space_slug: &str) -> String {
        self.close();
        substitute_slug(&hit.href, space_slug)
    }
}
