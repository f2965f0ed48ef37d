//! View engine
//!
//! Owns the canonical record set fetched from the collection and derives
//! the working view: the filtered, sorted subset currently presented.
//! The working view stores positions into the canonical set, so a local
//! change to a record is seen through both.
//!
//! Every state change republishes an immutable [`ViewSnapshot`] on a
//! watch channel.

use crate::database::{EditPhase, Manga, RawCollection, Status};
use crate::error::{AppError, Result};
use crate::remote::CollectionClient;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// The single definition of the `hot` flag.
///
/// An absent `releasedChapters` is never hot; an absent `lastChapterRead`
/// counts as nothing read.
pub fn compute_hot(status: &Status, last_chapter_read: Option<u32>, released_chapters: Option<u32>) -> bool {
    *status == Status::InProgress
        && released_chapters.is_some_and(|released| released > last_chapter_read.unwrap_or(0))
}

/// `hot` for `record` if its chapter counts were the given ones
pub fn recompute_hot(record: &Manga, last_chapter_read: Option<u32>, released_chapters: Option<u32>) -> bool {
    compute_hot(&record.status, last_chapter_read, released_chapters)
}

/// Status predicate of the working view
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    pub fn matches(&self, status: &Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "all" => Ok(StatusFilter::All),
            other => Ok(StatusFilter::Only(other.parse()?)),
        }
    }
}

/// Column the working view is ordered by
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum SortColumn {
    #[default]
    Title,
    Priority,
    ReleasedChapters,
    /// Unrecognized column; orders like `Title`
    Other(String),
}

impl From<&str> for SortColumn {
    fn from(s: &str) -> Self {
        match s {
            "title" => SortColumn::Title,
            "priority" => SortColumn::Priority,
            "releasedChapters" => SortColumn::ReleasedChapters,
            other => SortColumn::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortColumn::Title => f.write_str("title"),
            SortColumn::Priority => f.write_str("priority"),
            SortColumn::ReleasedChapters => f.write_str("releasedChapters"),
            SortColumn::Other(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Sorting {
    pub column: SortColumn,
    pub order: SortOrder,
}

/// Primary collation key: accents stripped (NFD minus combining marks),
/// then lowercased, so "Éclair" files under "e".
fn title_collation_key(title: &str) -> String {
    title
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Letters first, then accents, then case, then bytes, so titles that
/// only differ in accents or case still get a stable position.
fn compare_titles(a: &str, b: &str) -> Ordering {
    title_collation_key(a)
        .cmp(&title_collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Absent values sort last whatever the direction
fn compare_numeric(a: Option<i64>, b: Option<i64>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => order.apply(a.cmp(&b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_records(a: &Manga, b: &Manga, sorting: &Sorting) -> Ordering {
    let primary = match sorting.column {
        SortColumn::Priority => compare_numeric(a.priority, b.priority, sorting.order),
        SortColumn::ReleasedChapters => compare_numeric(
            a.released_chapters.map(i64::from),
            b.released_chapters.map(i64::from),
            sorting.order,
        ),
        SortColumn::Title | SortColumn::Other(_) => {
            sorting.order.apply(compare_titles(&a.title, &b.title))
        }
    };

    // Fixed tie-breaks keep the order a pure function of the sort state
    primary
        .then_with(|| compare_titles(&a.title, &b.title))
        .then_with(|| a.id.cmp(&b.id))
}

/// Proof that a reload was requested; responses are applied by generation
#[derive(Debug)]
pub struct ReloadTicket {
    generation: u64,
    focus: Option<Status>,
}

impl ReloadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    Applied { records: usize },
    /// A newer reload was already applied; this response was dropped
    Stale,
}

/// What presenters render
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewSnapshot {
    pub rows: Vec<Manga>,
    pub total: usize,
    pub hot_count: usize,
    pub status_filter: StatusFilter,
    pub hot_only: bool,
    pub sorting: Sorting,
    /// Status of the record whose edit triggered the last reload
    pub focus: Option<Status>,
    pub generation: u64,
    pub loaded_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

pub struct ViewEngine {
    records: Vec<Manga>,
    view: Vec<usize>,
    status_filter: StatusFilter,
    hot_only: bool,
    sorting: Sorting,
    focus: Option<Status>,
    issued_generation: u64,
    applied_generation: u64,
    loaded_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    publisher: watch::Sender<Arc<ViewSnapshot>>,
}

impl Default for ViewEngine {
    fn default() -> Self {
        Self::new(Sorting::default(), StatusFilter::All, false)
    }
}

impl ViewEngine {
    pub fn new(sorting: Sorting, status_filter: StatusFilter, hot_only: bool) -> Self {
        let (publisher, _) = watch::channel(Arc::new(ViewSnapshot::default()));
        let engine = Self {
            records: Vec::new(),
            view: Vec::new(),
            status_filter,
            hot_only,
            sorting,
            focus: None,
            issued_generation: 0,
            applied_generation: 0,
            loaded_at: None,
            last_error: None,
            publisher,
        };
        engine.publish();
        engine
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ViewSnapshot>> {
        self.publisher.subscribe()
    }

    // ===== Reload =====

    /// Fetch the collection and rebuild everything derived from it.
    ///
    /// `focus` is the status of the record whose edit triggered the reload.
    /// It is only recorded in the snapshot; the active filter is reapplied
    /// as is and never narrowed to it.
    pub async fn reload(&mut self, client: &dyn CollectionClient, focus: Option<Status>) -> Result<ReloadOutcome> {
        let ticket = self.begin_reload(focus);
        let fetched = client.fetch_all().await;
        self.complete_reload(ticket, fetched)
    }

    /// Reserve the next reload generation
    pub fn begin_reload(&mut self, focus: Option<Status>) -> ReloadTicket {
        self.issued_generation += 1;
        tracing::debug!("Reload {} requested", self.issued_generation);
        ReloadTicket {
            generation: self.issued_generation,
            focus,
        }
    }

    /// Apply a fetch result.
    ///
    /// A failure leaves both sets untouched. A response older than the last
    /// applied one is dropped, so overlapping reloads settle on the newest.
    pub fn complete_reload(&mut self, ticket: ReloadTicket, fetched: Result<RawCollection>) -> Result<ReloadOutcome> {
        let collection = match fetched {
            Ok(collection) => collection,
            Err(e) => {
                tracing::error!(
                    "Reload {} failed, keeping last-known-good view: {}",
                    ticket.generation,
                    e
                );
                if ticket.generation > self.applied_generation {
                    self.last_error = Some(e.to_string());
                    self.publish();
                }
                return Err(e);
            }
        };

        if ticket.generation <= self.applied_generation {
            tracing::warn!(
                "Dropping reload {}: reload {} already applied",
                ticket.generation,
                self.applied_generation
            );
            return Ok(ReloadOutcome::Stale);
        }

        self.records = collection
            .into_iter()
            .map(|(id, doc)| {
                let mut manga = Manga::from_document(id, doc);
                manga.hot = compute_hot(&manga.status, manga.last_chapter_read, manga.released_chapters);
                if manga.hot != manga.stored_hot {
                    tracing::debug!("Stored hot flag of {} is stale", manga.id);
                }
                manga
            })
            .collect();
        self.applied_generation = ticket.generation;
        self.focus = ticket.focus;
        self.loaded_at = Some(Utc::now());
        self.last_error = None;
        self.refresh();

        tracing::info!(
            "Reload {} applied: {} records, {} visible",
            ticket.generation,
            self.records.len(),
            self.view.len()
        );
        Ok(ReloadOutcome::Applied {
            records: self.records.len(),
        })
    }

    // ===== Filtering =====

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.status_filter = filter;
        self.apply_filter();
    }

    pub fn set_hot_only_filter(&mut self, hot_only: bool) {
        self.hot_only = hot_only;
        self.apply_filter();
    }

    pub fn status_filter(&self) -> &StatusFilter {
        &self.status_filter
    }

    pub fn hot_only(&self) -> bool {
        self.hot_only
    }

    /// Recompute the working view from the canonical set: status predicate,
    /// then hot-only predicate. The view stays in the active sort order.
    pub fn apply_filter(&mut self) {
        self.refresh();
    }

    fn refresh(&mut self) {
        let status_filter = &self.status_filter;
        let hot_only = self.hot_only;
        self.view = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, m)| status_filter.matches(&m.status))
            .filter(|(_, m)| !hot_only || m.hot)
            .map(|(i, _)| i)
            .collect();
        self.apply_sort();
    }

    // ===== Sorting =====

    /// Same column reverses the order; a new column keeps the direction.
    pub fn set_sort_column(&mut self, column: SortColumn) {
        if column == self.sorting.column {
            self.sorting.order = self.sorting.order.reversed();
        } else {
            self.sorting.column = column;
        }
        self.apply_sort();
    }

    pub fn sorting(&self) -> &Sorting {
        &self.sorting
    }

    pub fn apply_sort(&mut self) {
        let records = &self.records;
        let sorting = &self.sorting;
        self.view
            .sort_by(|&a, &b| compare_records(&records[a], &records[b], sorting));
        self.publish();
    }

    // ===== Queries =====

    /// The canonical set
    pub fn records(&self) -> &[Manga] {
        &self.records
    }

    /// The working view, in order
    pub fn view(&self) -> impl Iterator<Item = &Manga> + '_ {
        self.view.iter().map(move |&i| &self.records[i])
    }

    pub fn get(&self, id: &str) -> Option<&Manga> {
        self.records.iter().find(|m| m.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Manga> {
        self.records.iter_mut().find(|m| m.id == id)
    }

    fn require_mut(&mut self, id: &str) -> Result<&mut Manga> {
        self.get_mut(id)
            .ok_or_else(|| AppError::MangaNotFound(id.to_string()))
    }

    pub fn count_by_status(&self, status: &Status) -> usize {
        self.records.iter().filter(|m| m.status == *status).count()
    }

    pub fn count_hot(&self) -> usize {
        self.records.iter().filter(|m| m.hot).count()
    }

    /// Records whose stored `hot` disagrees with the derived value
    pub fn stale_hot_records(&self) -> Vec<(String, bool)> {
        self.records
            .iter()
            .filter(|m| m.hot != m.stored_hot)
            .map(|m| (m.id.clone(), m.hot))
            .collect()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // ===== Edit state =====

    /// Click into an inline cell
    pub fn begin_edit(&mut self, id: &str) -> Result<()> {
        self.require_mut(id)?.edit.field = EditPhase::Editing;
        self.publish();
        Ok(())
    }

    /// Escape out of an inline cell
    pub fn cancel_edit(&mut self, id: &str) -> Result<()> {
        self.require_mut(id)?.edit.field = EditPhase::Idle;
        self.publish();
        Ok(())
    }

    /// "Change status" action: opens or closes the status picker
    pub fn toggle_status_edit(&mut self, id: &str) -> Result<()> {
        let record = self.require_mut(id)?;
        record.edit.status = if record.edit.status.is_editing() {
            EditPhase::Idle
        } else {
            EditPhase::Editing
        };
        self.publish();
        Ok(())
    }

    pub fn set_field_phase(&mut self, id: &str, phase: EditPhase) -> Result<()> {
        self.require_mut(id)?.edit.field = phase;
        self.publish();
        Ok(())
    }

    pub fn set_status_phase(&mut self, id: &str, phase: EditPhase) -> Result<()> {
        self.require_mut(id)?.edit.status = phase;
        self.publish();
        Ok(())
    }

    /// Surface a failed remote call without touching the record sets
    pub fn record_failure(&mut self, error: &AppError) {
        self.last_error = Some(error.to_string());
        self.publish();
    }

    // ===== Publishing =====

    fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            rows: self.view().cloned().collect(),
            total: self.records.len(),
            hot_count: self.count_hot(),
            status_filter: self.status_filter.clone(),
            hot_only: self.hot_only,
            sorting: self.sorting.clone(),
            focus: self.focus.clone(),
            generation: self.applied_generation,
            loaded_at: self.loaded_at,
            last_error: self.last_error.clone(),
        }
    }

    pub fn publish(&self) {
        self.publisher.send_replace(Arc::new(self.snapshot()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MangaDocument;
    use crate::remote::MemoryCollection;

    fn doc(title: &str, status: Status, last: Option<u32>, released: Option<u32>) -> MangaDocument {
        MangaDocument {
            title: Some(title.to_string()),
            status: Some(status),
            last_chapter_read: last,
            released_chapters: released,
            ..MangaDocument::default()
        }
    }

    fn collection(entries: Vec<(&str, MangaDocument)>) -> RawCollection {
        entries
            .into_iter()
            .map(|(id, doc)| (id.to_string(), doc))
            .collect()
    }

    fn scenario() -> RawCollection {
        collection(vec![
            ("a", doc("A", Status::InProgress, Some(5), Some(10))),
            ("b", doc("B", Status::Finished, Some(3), Some(3))),
        ])
    }

    fn loaded(raw: RawCollection) -> ViewEngine {
        let mut engine = ViewEngine::default();
        let ticket = engine.begin_reload(None);
        engine.complete_reload(ticket, Ok(raw)).unwrap();
        engine
    }

    fn titles(engine: &ViewEngine) -> Vec<String> {
        engine.view().map(|m| m.title.clone()).collect()
    }

    #[test]
    fn test_compute_hot() {
        assert!(compute_hot(&Status::InProgress, Some(5), Some(10)));
        assert!(!compute_hot(&Status::InProgress, Some(12), Some(12)));
        assert!(!compute_hot(&Status::Finished, Some(1), Some(10)));
        assert!(!compute_hot(&Status::ToRead, None, Some(10)));
        assert!(compute_hot(&Status::InProgress, None, Some(1)));
        assert!(!compute_hot(&Status::InProgress, Some(3), None));
    }

    #[test]
    fn test_scenario_counts_filter_and_sort() {
        let mut engine = loaded(scenario());

        assert_eq!(engine.count_hot(), 1);
        assert_eq!(engine.count_by_status(&Status::Finished), 1);
        assert_eq!(titles(&engine), vec!["A", "B"]);

        engine.set_status_filter(StatusFilter::Only(Status::Finished));
        assert_eq!(titles(&engine), vec!["B"]);

        engine.set_status_filter(StatusFilter::All);
        engine.set_sort_column(SortColumn::Title);
        assert_eq!(titles(&engine), vec!["B", "A"]);
    }

    #[test]
    fn test_reload_rebuilds_hot() {
        let mut raw = scenario();
        raw.get_mut("a").unwrap().hot = false;
        raw.get_mut("b").unwrap().hot = true;

        let engine = loaded(raw);

        assert!(engine.get("a").unwrap().hot);
        assert!(!engine.get("b").unwrap().hot);
        let mut stale = engine.stale_hot_records();
        stale.sort();
        assert_eq!(stale, vec![("a".to_string(), true), ("b".to_string(), false)]);
    }

    #[test]
    fn test_filter_predicates_compose_and_are_idempotent() {
        let mut engine = loaded(collection(vec![
            ("1", doc("Berserk", Status::InProgress, Some(1), Some(9))),
            ("2", doc("Claymore", Status::InProgress, Some(9), Some(9))),
            ("3", doc("Dorohedoro", Status::Finished, Some(1), Some(9))),
            ("4", doc("Eden", Status::ToRead, None, Some(4))),
        ]));
        let canonical_before = engine.records().to_vec();

        engine.set_status_filter(StatusFilter::Only(Status::InProgress));
        engine.set_hot_only_filter(true);
        let first = titles(&engine);
        engine.apply_filter();
        let second = titles(&engine);

        assert_eq!(first, vec!["Berserk"]);
        assert_eq!(first, second);
        assert!(engine
            .view()
            .all(|m| m.hot && m.status == Status::InProgress));
        assert_eq!(engine.records(), canonical_before.as_slice());
    }

    #[test]
    fn test_new_column_keeps_direction() {
        let mut engine = loaded(scenario());
        engine.set_sort_column(SortColumn::Title);
        assert_eq!(engine.sorting().order, SortOrder::Descending);

        engine.set_sort_column(SortColumn::Priority);
        assert_eq!(engine.sorting().column, SortColumn::Priority);
        assert_eq!(engine.sorting().order, SortOrder::Descending);
    }

    #[test]
    fn test_toggle_twice_restores_order() {
        let mut engine = loaded(collection(vec![
            ("1", MangaDocument { priority: Some(2), ..doc("Zetman", Status::ToRead, None, Some(40)) }),
            ("2", MangaDocument { priority: Some(2), ..doc("Ajin", Status::ToRead, None, None) }),
            ("3", MangaDocument { priority: None, ..doc("Gantz", Status::ToRead, None, Some(383)) }),
            ("4", MangaDocument { priority: Some(1), ..doc("Homunculus", Status::ToRead, None, Some(166)) }),
        ]));

        for column in [SortColumn::Priority, SortColumn::ReleasedChapters, SortColumn::Title] {
            engine.set_sort_column(column.clone());
            if engine.sorting().column != column {
                continue;
            }
            let before = titles(&engine);
            engine.set_sort_column(column.clone());
            engine.set_sort_column(column);
            assert_eq!(titles(&engine), before);
        }
    }

    #[test]
    fn test_absent_numbers_sort_last_both_ways() {
        let mut engine = loaded(collection(vec![
            ("1", MangaDocument { priority: Some(3), ..doc("Ajin", Status::ToRead, None, None) }),
            ("2", MangaDocument { priority: None, ..doc("Blame", Status::ToRead, None, None) }),
            ("3", MangaDocument { priority: Some(1), ..doc("Claymore", Status::ToRead, None, None) }),
        ]));

        engine.set_sort_column(SortColumn::Priority);
        assert_eq!(titles(&engine), vec!["Claymore", "Ajin", "Blame"]);

        engine.set_sort_column(SortColumn::Priority);
        assert_eq!(titles(&engine), vec!["Ajin", "Claymore", "Blame"]);
    }

    #[test]
    fn test_unknown_column_sorts_by_title() {
        let mut engine = loaded(collection(vec![
            ("1", doc("beta", Status::ToRead, None, None)),
            ("2", doc("Alpha", Status::ToRead, None, None)),
            ("3", doc("gamma", Status::ToRead, None, None)),
        ]));

        engine.set_sort_column(SortColumn::from("lastChapterRead"));
        assert_eq!(titles(&engine), vec!["Alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_accented_titles_sort_with_their_base_letter() {
        let mut engine = loaded(collection(vec![
            ("1", doc("Zetman", Status::ToRead, None, None)),
            ("2", doc("Éclair", Status::ToRead, None, None)),
            ("3", doc("Akira", Status::ToRead, None, None)),
            ("4", doc("eden", Status::ToRead, None, None)),
        ]));

        assert_eq!(titles(&engine), vec!["Akira", "Éclair", "eden", "Zetman"]);

        engine.set_sort_column(SortColumn::Title);
        assert_eq!(titles(&engine), vec!["Zetman", "eden", "Éclair", "Akira"]);
    }

    #[test]
    fn test_titles_differing_only_in_accents_are_ordered_stably() {
        assert_eq!(compare_titles("Pokemon", "Pokémon"), Ordering::Less);
        assert_eq!(compare_titles("Pokémon", "pokemon"), Ordering::Greater);
        assert_eq!(compare_titles("Monster", "monster"), Ordering::Less);
    }

    #[test]
    fn test_failed_reload_keeps_last_known_good_view() {
        let mut engine = loaded(scenario());
        let mut updates = engine.subscribe();

        let ticket = engine.begin_reload(None);
        let result = engine.complete_reload(
            ticket,
            Err(AppError::Remote { status: 500, body: "boom".into() }),
        );

        assert!(result.is_err());
        assert_eq!(titles(&engine), vec!["A", "B"]);
        assert_eq!(engine.records().len(), 2);
        assert!(updates.has_changed().unwrap());
        let snapshot = updates.borrow_and_update().clone();
        assert_eq!(snapshot.rows.len(), 2);
        assert!(snapshot.last_error.as_deref().unwrap().contains("500"));
    }

    #[test]
    fn test_stale_reload_is_dropped() {
        let mut engine = ViewEngine::default();

        let older = engine.begin_reload(None);
        let newer = engine.begin_reload(Some(Status::Finished));

        let applied = engine.complete_reload(newer, Ok(scenario())).unwrap();
        assert_eq!(applied, ReloadOutcome::Applied { records: 2 });

        let stale = engine
            .complete_reload(older, Ok(RawCollection::new()))
            .unwrap();
        assert_eq!(stale, ReloadOutcome::Stale);
        assert_eq!(engine.records().len(), 2);
        assert_eq!(engine.subscribe().borrow().focus, Some(Status::Finished));
    }

    #[test]
    fn test_edit_state_is_shared_with_view() {
        let mut engine = loaded(scenario());

        engine.begin_edit("a").unwrap();
        assert!(engine.view().find(|m| m.id == "a").unwrap().edit.field.is_editing());

        engine.cancel_edit("a").unwrap();
        assert_eq!(engine.get("a").unwrap().edit.field, EditPhase::Idle);

        engine.toggle_status_edit("b").unwrap();
        assert!(engine.get("b").unwrap().edit.status.is_editing());
        engine.toggle_status_edit("b").unwrap();
        assert!(!engine.get("b").unwrap().edit.status.is_editing());

        assert!(matches!(engine.begin_edit("zzz"), Err(AppError::MangaNotFound(_))));
    }

    #[tokio::test]
    async fn test_reload_empty_collection() {
        let client = MemoryCollection::new();
        let mut engine = ViewEngine::default();

        let outcome = engine.reload(&client, None).await.unwrap();

        assert_eq!(outcome, ReloadOutcome::Applied { records: 0 });
        assert_eq!(engine.view().count(), 0);
        assert!(engine.subscribe().borrow().loaded_at.is_some());
    }

    #[tokio::test]
    async fn test_reload_focus_is_recorded_not_filtered() {
        let client = MemoryCollection::new();
        client.seed(scenario()).await;
        let mut engine = ViewEngine::default();
        engine.set_status_filter(StatusFilter::Only(Status::InProgress));

        engine.reload(&client, Some(Status::Finished)).await.unwrap();

        assert_eq!(engine.status_filter(), &StatusFilter::Only(Status::InProgress));
        assert_eq!(titles(&engine), vec!["A"]);
        assert_eq!(engine.subscribe().borrow().focus, Some(Status::Finished));
    }
}
