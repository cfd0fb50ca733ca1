//! Catalog view state.
//!
//! The view is an explicit state object changed only through [`Message`]s.
//! `update` returns the [`Effect`]s (fetches) the caller must run; their
//! results come back as further messages.

use tracing::{debug, error};

use crate::api::{INDEX_LIMIT, ITEMS_PER_PAGE};
use crate::models::PokemonSummary;

/// How many page numbers to show on each side of the current page.
const PAGE_SPREAD: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTarget {
    Page,
    Index,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A listing page arrived for `offset`.
    PageLoaded {
        offset: u64,
        count: u64,
        results: Vec<PokemonSummary>,
    },
    /// The full name index arrived.
    IndexLoaded(Vec<PokemonSummary>),
    LoadFailed {
        what: LoadTarget,
        error: String,
    },
    SearchChanged(String),
    GoToPage(u64),
    NextPage,
    PrevPage,
    Reload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    FetchPage { limit: u64, offset: u64 },
    FetchIndex,
}

impl Effect {
    fn page(page: u64) -> Self {
        Effect::FetchPage {
            limit: ITEMS_PER_PAGE,
            offset: (page - 1) * ITEMS_PER_PAGE,
        }
    }

    /// The (limit, offset) pair to request.
    pub fn request(&self) -> (u64, u64) {
        match *self {
            Effect::FetchPage { limit, offset } => (limit, offset),
            Effect::FetchIndex => (INDEX_LIMIT, 0),
        }
    }
}

/// What the grid shows right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub entries: Vec<PokemonSummary>,
    pub total_pages: u64,
    /// Number of search matches; `None` when not searching.
    pub match_count: Option<usize>,
}

/// Pages are 1-based; `new` is the only constructor.
#[derive(Debug, Clone)]
pub struct CatalogState {
    page: u64,
    search: String,
    /// Server page for `page`, when not searching.
    results: Vec<PokemonSummary>,
    count: u64,
    index: Vec<PokemonSummary>,
    page_loading: bool,
    index_loading: bool,
}

impl CatalogState {
    /// Initial state, plus the fetches to run at startup: the first page and
    /// the full index.
    pub fn new() -> (Self, Vec<Effect>) {
        let state = Self {
            page: 1,
            search: String::new(),
            results: Vec::new(),
            count: 0,
            index: Vec::new(),
            page_loading: true,
            index_loading: true,
        };
        (state, vec![Effect::page(1), Effect::FetchIndex])
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// The full name index, in listing order.
    pub fn index(&self) -> &[PokemonSummary] {
        &self.index
    }

    pub fn is_searching(&self) -> bool {
        !self.search.trim().is_empty()
    }

    pub fn is_loading(&self) -> bool {
        if self.is_searching() {
            self.index_loading
        } else {
            self.page_loading
        }
    }

    fn offset(&self) -> u64 {
        (self.page - 1) * ITEMS_PER_PAGE
    }

    fn matches(&self) -> Vec<&PokemonSummary> {
        let term = self.search.to_lowercase();
        self.index.iter().filter(|p| p.matches(&term)).collect()
    }

    pub fn total_pages(&self) -> u64 {
        let items = if self.is_searching() {
            self.matches().len() as u64
        } else {
            self.count
        };
        items.div_ceil(ITEMS_PER_PAGE).max(1)
    }

    pub fn visible(&self) -> View {
        if !self.is_searching() {
            return View {
                entries: self.results.clone(),
                total_pages: self.total_pages(),
                match_count: None,
            };
        }

        let matches = self.matches();
        let total_pages = (matches.len() as u64).div_ceil(ITEMS_PER_PAGE).max(1);
        let entries = matches
            .iter()
            .skip(self.offset() as usize)
            .take(ITEMS_PER_PAGE as usize)
            .map(|p| (*p).clone())
            .collect();
        View {
            entries,
            total_pages,
            match_count: Some(matches.len()),
        }
    }

    pub fn visible_page_numbers(&self) -> Vec<u64> {
        let start = self.page.saturating_sub(PAGE_SPREAD).max(1);
        let end = (self.page + PAGE_SPREAD).min(self.total_pages());
        (start..=end).collect()
    }

    pub fn prev_enabled(&self) -> bool {
        self.page != 1
    }

    pub fn next_enabled(&self) -> bool {
        self.page != self.total_pages()
    }

    pub fn update(&mut self, msg: Message) -> Vec<Effect> {
        match msg {
            Message::PageLoaded {
                offset,
                count,
                results,
            } => {
                if offset != self.offset() {
                    debug!(offset, current = self.offset(), "Dropping stale page");
                    return Vec::new();
                }
                self.results = results;
                self.count = count;
                self.page_loading = false;
                Vec::new()
            }
            Message::IndexLoaded(index) => {
                self.index = index;
                self.index_loading = false;
                Vec::new()
            }
            Message::LoadFailed { what, error } => {
                error!(?what, error = %error, "Catalog load failed");
                match what {
                    LoadTarget::Page => self.page_loading = false,
                    LoadTarget::Index => self.index_loading = false,
                }
                Vec::new()
            }
            Message::SearchChanged(term) => {
                let was_searching = self.is_searching();
                let old_page = self.page;
                self.search = term;
                self.page = 1;
                if !self.is_searching() && (was_searching || old_page != 1) {
                    self.fetch_current()
                } else {
                    Vec::new()
                }
            }
            Message::GoToPage(page) => self.go_to(page),
            Message::NextPage => self.go_to(self.page + 1),
            Message::PrevPage => self.go_to(self.page.saturating_sub(1)),
            Message::Reload => {
                let mut effects = Vec::new();
                if !self.is_searching() {
                    effects.extend(self.fetch_current());
                }
                if self.index.is_empty() && !self.index_loading {
                    self.index_loading = true;
                    effects.push(Effect::FetchIndex);
                }
                effects
            }
        }
    }

    fn go_to(&mut self, page: u64) -> Vec<Effect> {
        if page < 1 || page > self.total_pages() || page == self.page {
            return Vec::new();
        }
        self.page = page;
        if self.is_searching() {
            Vec::new()
        } else {
            self.fetch_current()
        }
    }

    fn fetch_current(&mut self) -> Vec<Effect> {
        self.page_loading = true;
        vec![Effect::page(self.page)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, name: &str) -> PokemonSummary {
        PokemonSummary::new(name, format!("https://pokeapi.co/api/v2/pokemon/{}/", id))
    }

    fn page_of(offset: u64, count: u64) -> Message {
        Message::PageLoaded {
            offset,
            count,
            results: (offset + 1..=offset + ITEMS_PER_PAGE)
                .map(|id| entry(id, &format!("mon-{}", id)))
                .collect(),
        }
    }

    fn loaded(count: u64) -> CatalogState {
        let (mut state, _) = CatalogState::new();
        state.update(page_of(0, count));
        state
    }

    /// 1000 names; every 10th contains "char".
    fn index() -> Vec<PokemonSummary> {
        (1..=1000)
            .map(|id| {
                if id % 10 == 0 {
                    entry(id, &format!("charmon-{}", id))
                } else {
                    entry(id, &format!("mon-{}", id))
                }
            })
            .collect()
    }

    #[test]
    fn test_startup_effects() {
        let (state, effects) = CatalogState::new();
        assert_eq!(state.page(), 1);
        assert!(state.is_loading());
        assert_eq!(
            effects,
            vec![Effect::FetchPage { limit: 20, offset: 0 }, Effect::FetchIndex]
        );
        assert_eq!(Effect::FetchIndex.request(), (2000, 0));
    }

    #[test]
    fn test_go_to_page_two_fetches_offset_20() {
        let mut state = loaded(1302);
        assert_eq!(state.total_pages(), 66);
        let effects = state.update(Message::GoToPage(2));
        assert_eq!(effects, vec![Effect::FetchPage { limit: 20, offset: 20 }]);
        assert_eq!(state.page(), 2);
    }

    #[test]
    fn test_fresh_state_accepts_first_page() {
        let (mut state, _) = CatalogState::new();
        assert!(state.update(page_of(0, 1302)).is_empty());
        assert!(!state.is_loading());
        assert_eq!(state.visible().entries.len(), 20);
        assert_eq!(state.visible_page_numbers(), vec![1, 2, 3]);
    }

    #[test]
    fn test_returning_to_a_page_restores_its_view() {
        let mut state = loaded(1302);
        let first = state.visible();

        state.update(Message::GoToPage(2));
        state.update(page_of(20, 1302));
        assert_ne!(state.visible(), first);

        let effects = state.update(Message::GoToPage(1));
        assert_eq!(effects, vec![Effect::FetchPage { limit: 20, offset: 0 }]);
        assert!(state.is_loading());

        state.update(page_of(0, 1302));
        assert_eq!(state.visible(), first);
        assert_eq!(state.page(), 1);

        // Asking for the current page again fetches nothing
        assert!(state.update(Message::GoToPage(1)).is_empty());
        assert_eq!(state.visible(), first);
    }

    #[test]
    fn test_out_of_range_is_noop() {
        let mut state = loaded(45);
        assert_eq!(state.total_pages(), 3);
        assert!(state.update(Message::GoToPage(0)).is_empty());
        assert!(state.update(Message::GoToPage(4)).is_empty());
        assert!(state.update(Message::PrevPage).is_empty());
        assert_eq!(state.page(), 1);
        assert!(!state.prev_enabled());

        state.update(Message::GoToPage(3));
        assert!(!state.next_enabled());
        assert!(state.update(Message::NextPage).is_empty());
        assert_eq!(state.page(), 3);
    }

    #[test]
    fn test_empty_count_has_one_page() {
        let (state, _) = CatalogState::new();
        assert_eq!(state.total_pages(), 1);
        assert_eq!(state.visible_page_numbers(), vec![1]);
        assert!(!state.prev_enabled());
        assert!(!state.next_enabled());
    }

    #[test]
    fn test_visible_page_numbers_spread() {
        let mut state = loaded(1302);
        assert_eq!(state.visible_page_numbers(), vec![1, 2, 3]);
        state.update(Message::GoToPage(10));
        assert_eq!(state.visible_page_numbers(), vec![8, 9, 10, 11, 12]);
        state.update(Message::GoToPage(66));
        assert_eq!(state.visible_page_numbers(), vec![64, 65, 66]);
    }

    #[test]
    fn test_stale_page_is_dropped() {
        let mut state = loaded(1302);
        state.update(Message::GoToPage(2));
        state.update(Message::GoToPage(3));
        state.update(page_of(20, 1302));
        assert_eq!(state.visible().entries[0].name, "mon-1");

        state.update(page_of(40, 1302));
        assert_eq!(state.visible().entries[0].name, "mon-41");
    }

    #[test]
    fn test_search_narrows_and_paginates() {
        let mut state = loaded(1302);
        state.update(Message::IndexLoaded(index()));

        let effects = state.update(Message::SearchChanged("CHAR".into()));
        assert!(effects.is_empty());
        assert!(state.is_searching());

        let view = state.visible();
        assert_eq!(view.match_count, Some(100));
        assert_eq!(view.total_pages, 5);
        assert_eq!(view.entries.len(), 20);
        assert_eq!(view.entries[0].name, "charmon-10");
        assert_eq!(view.entries[19].name, "charmon-200");
        assert!(view.entries.iter().all(|p| p.name.contains("char")));

        // Paging through matches never hits the network.
        assert!(state.update(Message::GoToPage(5)).is_empty());
        assert_eq!(state.visible().entries[19].name, "charmon-1000");
    }

    #[test]
    fn test_search_resets_page() {
        let mut state = loaded(1302);
        state.update(Message::IndexLoaded(index()));
        state.update(Message::GoToPage(7));

        state.update(Message::SearchChanged("mon".into()));
        assert_eq!(state.page(), 1);
        state.update(Message::GoToPage(3));
        state.update(Message::SearchChanged("mon-1".into()));
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_search_without_matches() {
        let mut state = loaded(1302);
        state.update(Message::IndexLoaded(index()));
        state.update(Message::SearchChanged("zzz".into()));
        let view = state.visible();
        assert!(view.entries.is_empty());
        assert_eq!(view.total_pages, 1);
        assert_eq!(view.match_count, Some(0));
    }

    #[test]
    fn test_clearing_search_refetches_first_page() {
        let mut state = loaded(1302);
        state.update(Message::IndexLoaded(index()));
        state.update(Message::SearchChanged("char".into()));
        state.update(Message::GoToPage(2));

        let effects = state.update(Message::SearchChanged(String::new()));
        assert_eq!(effects, vec![Effect::FetchPage { limit: 20, offset: 0 }]);
        assert_eq!(state.page(), 1);
        assert!(!state.is_searching());
    }

    #[test]
    fn test_whitespace_term_is_not_searching() {
        let mut state = loaded(1302);
        assert!(state.update(Message::SearchChanged("   ".into())).is_empty());
        assert!(!state.is_searching());
        assert_eq!(state.visible().match_count, None);
    }

    #[test]
    fn test_load_failure_keeps_state() {
        let mut state = loaded(1302);
        state.update(Message::GoToPage(2));
        let effects = state.update(Message::LoadFailed {
            what: LoadTarget::Page,
            error: "offline".into(),
        });
        assert!(effects.is_empty());
        assert!(!state.is_loading());
        assert_eq!(state.page(), 2);
        assert_eq!(state.count(), 1302);
    }

    #[test]
    fn test_reload_refetches_page_and_missing_index() {
        let mut state = loaded(1302);
        state.update(Message::LoadFailed {
            what: LoadTarget::Index,
            error: "offline".into(),
        });
        let effects = state.update(Message::Reload);
        assert_eq!(
            effects,
            vec![Effect::FetchPage { limit: 20, offset: 0 }, Effect::FetchIndex]
        );

        state.update(Message::IndexLoaded(index()));
        assert_eq!(state.update(Message::Reload).len(), 1);
    }
}
