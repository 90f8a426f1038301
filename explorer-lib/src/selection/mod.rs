//! Interval-based multi-selection across views.
//!
//! A [`Selection`] stores, per view, a compacted list of [`Interval`]s rather
//! than individual rows, so selecting a million rows costs one interval. It
//! is an immutable value: every operation returns a new selection and leaves
//! the receiver untouched.
//!
//! Gestures (plain, ctrl and shift clicks) are mapped onto [`Selection::select`]
//! and [`Selection::deselect`] by the [`controller`](SelectionController).
//!
//! # Example
//!
//! ```ignore
//! use explorer_lib::interval::Interval;
//! use explorer_lib::selection::{SelectOptions, Selection};
//!
//! let selection = Selection::new()
//!     .select(&view, 5, SelectOptions::replace())
//!     .select(&view, Interval::new(10, 19)?, SelectOptions::extend());
//!
//! assert_eq!(selection.count(), 11);
//! assert!(selection.is_selected(&view, 12));
//! ```

mod controller;

pub use controller::*;

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use futures::future;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::error::SourceError;
use crate::interval::Interval;
use crate::model::FileRecord;
use crate::query::FileFilter;
use crate::query::FileSort;
use crate::query::ViewIdentity;
use crate::query::ViewKey;
use crate::source::AggregateInfo;
use crate::source::RecordSource;
use crate::view::View;

/// A row of one view: the selection focus or the shift-click anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Focus {
    view: View,
    index: usize,
}

impl Focus {
    pub fn new(view: View, index: usize) -> Self {
        Self { view, index }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// What to select: one row or a whole range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectTarget {
    Index(usize),
    Range(Interval),
}

impl SelectTarget {
    /// Returns the rows covered as an interval.
    pub fn interval(self) -> Interval {
        match self {
            SelectTarget::Index(index) => Interval::point(index),
            SelectTarget::Range(range) => range,
        }
    }
}

impl From<usize> for SelectTarget {
    fn from(index: usize) -> Self {
        SelectTarget::Index(index)
    }
}

impl From<Interval> for SelectTarget {
    fn from(range: Interval) -> Self {
        SelectTarget::Range(range)
    }
}

/// How [`Selection::select`] combines the target with what is selected.
///
/// # Example
///
/// ```
/// use explorer_lib::selection::SelectOptions;
///
/// // Add rows 3..=10 to the current selection, focused on 3, anchored at 10
/// let options = SelectOptions::extend().focus_at(3).anchor_at(10);
/// assert!(options.update_existing);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectOptions {
    /// Merge into the view's existing ranges instead of replacing the whole
    /// selection.
    pub update_existing: bool,

    /// Row to focus. Default: the first row of the target.
    pub focus: Option<usize>,

    /// Row to anchor further shift clicks at. Default: the focused row.
    pub anchor: Option<usize>,
}

impl SelectOptions {
    /// Replace the whole selection, in every view.
    pub fn replace() -> Self {
        Self::default()
    }

    /// Merge into the view's existing ranges; other views are untouched.
    pub fn extend() -> Self {
        Self {
            update_existing: true,
            ..Self::default()
        }
    }

    pub fn focus_at(mut self, index: usize) -> Self {
        self.focus = Some(index);
        self
    }

    pub fn anchor_at(mut self, index: usize) -> Self {
        self.anchor = Some(index);
        self
    }
}

/// Minimal serializable description of one view's part of a selection.
///
/// Serializes as `{"filters": [...], "sort": ..., "ranges": [{"start", "end"}]}`,
/// which lets a server act on a selection without the client enumerating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactSelection {
    pub filters: Vec<FileFilter>,
    pub sort: Option<FileSort>,
    pub ranges: Vec<Interval>,
}

impl CompactSelection {
    pub fn new(identity: &ViewIdentity, ranges: Vec<Interval>) -> Self {
        Self {
            filters: identity.filters().to_vec(),
            sort: identity.sort().cloned(),
            ranges: Interval::compact(ranges),
        }
    }

    /// Rebuilds the identity of the view these ranges belong to.
    pub fn identity(&self) -> ViewIdentity {
        ViewIdentity::new(self.filters.iter().cloned(), self.sort.clone())
    }

    /// Returns the number of rows covered.
    pub fn count(&self) -> usize {
        self.ranges
            .iter()
            .map(Interval::count)
            .fold(0, usize::saturating_add)
    }
}

#[derive(Debug, Clone)]
struct ViewSelection {
    view: View,
    ranges: Vec<Interval>,
    order: u64,
}

/// Selected rows across any number of views.
///
/// Per-view range lists are always compact (sorted, disjoint and
/// non-abutting) and never empty: a view whose last row is deselected is
/// dropped. Views enumerate in the order they were first selected in.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    views: BTreeMap<ViewKey, ViewSelection>,
    focus: Option<Focus>,
    anchor: Option<Focus>,
    next_order: u64,
}

impl Selection {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects `target` in `view`.
    ///
    /// Without [`update_existing`](SelectOptions::update_existing) the result
    /// holds `target` and nothing else. With it, `target` is merged into the
    /// view's ranges and other views keep their selection. Focus and anchor
    /// move to `view` in both cases.
    pub fn select(
        &self,
        view: &View,
        target: impl Into<SelectTarget>,
        options: SelectOptions,
    ) -> Selection {
        let target = target.into().interval();

        let mut next = if options.update_existing {
            self.clone()
        } else {
            Selection {
                next_order: self.next_order,
                ..Selection::default()
            }
        };

        let existing = next.ranges(view).to_vec();
        next.store(view, existing.into_iter().chain([target]));

        let focus = options.focus.unwrap_or(target.start());
        next.focus = Some(Focus::new(view.clone(), focus));
        next.anchor = Some(Focus::new(view.clone(), options.anchor.unwrap_or(focus)));
        next
    }

    /// Removes `range` from the view's selection.
    ///
    /// Focus and anchor stay where they were.
    pub fn deselect(&self, view: &View, range: Interval) -> Selection {
        if !self.views.contains_key(view.key()) {
            return self.clone();
        }

        let mut next = self.clone();
        let remaining: Vec<Interval> = self
            .ranges(view)
            .iter()
            .flat_map(|selected| selected.difference(&range))
            .collect();
        next.store(view, remaining);
        next
    }

    /// Removes the single row `index` from the view's selection, splitting
    /// the range that holds it.
    ///
    /// Focus and anchor stay where they were.
    pub fn toggle_off(&self, view: &View, index: usize) -> Selection {
        if !self.is_selected(view, index) {
            return self.clone();
        }

        let mut next = self.clone();
        let remaining: Vec<Interval> = self
            .ranges(view)
            .iter()
            .flat_map(|selected| selected.partition_at(index))
            .collect();
        next.store(view, remaining);
        next
    }

    /// Selects every row of `view`, keeping the rest of the selection.
    ///
    /// Fetches the view's total count if it is not known yet. An empty view
    /// leaves the selection unchanged.
    pub async fn select_all(&self, view: &View) -> Result<Selection, Error> {
        let count = view.total_count().await?;
        Ok(self.select_leading(view, count))
    }

    /// Selects rows `0..count` of `view` into the existing selection.
    pub(crate) fn select_leading(&self, view: &View, count: usize) -> Selection {
        if count == 0 {
            return self.clone();
        }
        self.select(view, Interval::spanning(0, count - 1), SelectOptions::extend())
    }

    /// Drops every selected row of `view` at or past `count`.
    ///
    /// Used when a view shrinks under the selection. A focus or anchor past
    /// the new end is cleared.
    pub fn retain_within(&self, view: &View, count: usize) -> Selection {
        let mut next = self.clone();
        let kept: Vec<Interval> = match count.checked_sub(1) {
            Some(last) => {
                let bounds = Interval::spanning(0, last);
                self.ranges(view)
                    .iter()
                    .filter_map(|range| range.intersection(&bounds))
                    .collect()
            }
            None => Vec::new(),
        };
        next.store(view, kept);

        let past_end = |row: &Option<Focus>| {
            row.as_ref()
                .is_some_and(|row| row.view == *view && row.index >= count)
        };
        if past_end(&next.focus) {
            next.focus = None;
        }
        if past_end(&next.anchor) {
            next.anchor = None;
        }
        next
    }

    /// Removes `view` from the selection entirely.
    pub fn without_view(&self, view: &View) -> Selection {
        let mut next = self.clone();
        next.views.remove(view.key());

        let in_view = |row: &Option<Focus>| row.as_ref().is_some_and(|row| row.view == *view);
        if in_view(&next.focus) {
            next.focus = None;
        }
        if in_view(&next.anchor) {
            next.anchor = None;
        }
        next
    }

    /// Returns an empty selection.
    pub fn clear(&self) -> Selection {
        Selection::default()
    }

    /// Returns `true` if `index` is selected in `view`.
    pub fn is_selected(&self, view: &View, index: usize) -> bool {
        let ranges = self.ranges(view);
        let candidate = ranges.partition_point(|range| range.end() < index);
        ranges
            .get(candidate)
            .is_some_and(|range| range.contains(index))
    }

    /// Returns `true` if the focus is exactly `(view, index)`.
    pub fn is_focused(&self, view: &View, index: usize) -> bool {
        self.focus
            .as_ref()
            .is_some_and(|focus| focus.view == *view && focus.index == index)
    }

    /// Returns the number of selected rows across all views.
    pub fn count(&self) -> usize {
        self.views
            .values()
            .flat_map(|selected| &selected.ranges)
            .map(Interval::count)
            .fold(0, usize::saturating_add)
    }

    /// Returns `true` if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Returns the compact ranges selected in `view`.
    pub fn ranges(&self, view: &View) -> &[Interval] {
        self.views
            .get(view.key())
            .map(|selected| selected.ranges.as_slice())
            .unwrap_or_default()
    }

    /// Returns the views holding a selection, in the order they were first
    /// selected in.
    pub fn views(&self) -> Vec<&View> {
        self.ordered().into_iter().map(|selected| &selected.view).collect()
    }

    pub fn focus(&self) -> Option<&Focus> {
        self.focus.as_ref()
    }

    pub fn anchor(&self) -> Option<&Focus> {
        self.anchor.as_ref()
    }

    /// Describes the selection as per-view filters, sort and ranges.
    pub fn to_compact_ranges(&self) -> Vec<CompactSelection> {
        self.ordered()
            .into_iter()
            .map(|selected| CompactSelection::new(selected.view.identity(), selected.ranges.clone()))
            .collect()
    }

    /// Resolves every selected record, view by view in selection order and
    /// by index within a view.
    pub async fn fetch_all_records(&self) -> Result<Vec<Arc<FileRecord>>, Error> {
        let per_view = future::try_join_all(
            self.ordered()
                .into_iter()
                .map(|selected| selected.view.records_for(&selected.ranges)),
        )
        .await?;

        Ok(per_view.into_iter().flatten().collect())
    }

    /// Resolves the record under the focus, if any.
    pub async fn fetch_focused_record(&self) -> Result<Option<Arc<FileRecord>>, Error> {
        let Some(focus) = &self.focus else {
            return Ok(None);
        };
        let records = focus
            .view
            .records_for(&[Interval::point(focus.index)])
            .await?;
        Ok(records.into_iter().next())
    }

    /// Summarizes the selection.
    ///
    /// Asks `source` to aggregate the compact ranges first. When the source
    /// cannot, falls back to fetching every selected record.
    pub async fn aggregate(&self, source: &dyn RecordSource) -> Result<AggregateInfo, Error> {
        if self.is_empty() {
            return Ok(AggregateInfo::default());
        }

        match source.aggregate(&self.to_compact_ranges()).await {
            Ok(Some(info)) => return Ok(info),
            Ok(None) | Err(SourceError::Unsupported(_)) => {}
            Err(err) => return Err(err.into()),
        }

        let records = self.fetch_all_records().await?;
        Ok(AggregateInfo::from_records(records.iter().map(|record| &**record)))
    }

    fn ordered(&self) -> Vec<&ViewSelection> {
        let mut ordered: Vec<&ViewSelection> = self.views.values().collect();
        ordered.sort_by_key(|selected| selected.order);
        ordered
    }

    /// Compacts and stores the view's ranges, dropping the view when empty.
    fn store(&mut self, view: &View, ranges: impl IntoIterator<Item = Interval>) {
        let ranges = Interval::compact(ranges);
        if ranges.is_empty() {
            self.views.remove(view.key());
            return;
        }

        match self.views.entry(view.key().clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().ranges = ranges,
            Entry::Vacant(entry) => {
                entry.insert(ViewSelection {
                    view: view.clone(),
                    ranges,
                    order: self.next_order,
                });
                self.next_order += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use async_trait::async_trait;

    use super::*;
    use crate::query::FileFilter;
    use crate::source::InMemorySource;
    use crate::view::ViewConfig;
    use crate::view::ViewRegistry;

    fn iv(start: usize, end: usize) -> Interval {
        Interval::new(start, end).unwrap()
    }

    fn corpus() -> InMemorySource {
        InMemorySource::new(
            (0..40)
                .map(|i| {
                    let kind = if i % 2 == 0 { "even" } else { "odd" };
                    FileRecord::new(i.to_string(), format!("/data/{i}.tiff"))
                        .with_size(10)
                        .with_annotation("Parity", [kind])
                })
                .collect(),
        )
    }

    fn registry(source: impl RecordSource + 'static) -> ViewRegistry {
        ViewRegistry::builder(source)
            .config(ViewConfig::default().with_page_size(8))
            .build()
            .unwrap()
    }

    fn even() -> ViewIdentity {
        ViewIdentity::new([FileFilter::new("Parity", "even")], None)
    }

    #[tokio::test]
    async fn test_replace_drops_other_views() {
        let registry = registry(corpus());
        let all = registry.view(ViewIdentity::all());
        let evens = registry.view(even());

        let selection = Selection::new()
            .select(&all, 3, SelectOptions::replace())
            .select(&evens, 1, SelectOptions::replace());

        assert!(!selection.is_selected(&all, 3));
        assert!(selection.is_selected(&evens, 1));
        assert_eq!(selection.views(), vec![&evens]);
        assert!(selection.is_focused(&evens, 1));
    }

    #[tokio::test]
    async fn test_extend_keeps_other_views_and_compacts() {
        let registry = registry(corpus());
        let all = registry.view(ViewIdentity::all());
        let evens = registry.view(even());

        let selection = Selection::new()
            .select(&all, iv(0, 3), SelectOptions::extend())
            .select(&evens, 2, SelectOptions::extend())
            .select(&all, 4, SelectOptions::extend())
            .select(&all, iv(9, 12), SelectOptions::extend());

        assert_eq!(selection.ranges(&all), &[iv(0, 4), iv(9, 12)]);
        assert_eq!(selection.ranges(&evens), &[iv(2, 2)]);
        assert_eq!(selection.count(), 5 + 4 + 1);
        assert_eq!(selection.views(), vec![&all, &evens]);
        assert!(selection.is_focused(&all, 9));
        assert_eq!(selection.anchor().unwrap().index(), 9);
    }

    #[tokio::test]
    async fn test_select_leaves_receiver_untouched() {
        let registry = registry(corpus());
        let view = registry.view(ViewIdentity::all());

        let before = Selection::new().select(&view, 1, SelectOptions::replace());
        let after = before.select(&view, 7, SelectOptions::extend());

        assert_eq!(before.count(), 1);
        assert_eq!(after.count(), 2);
    }

    #[tokio::test]
    async fn test_is_selected_across_many_ranges() {
        let registry = registry(corpus());
        let view = registry.view(ViewIdentity::all());

        let mut selection = Selection::new();
        for start in (0..100).step_by(10) {
            selection = selection.select(&view, iv(start, start + 4), SelectOptions::extend());
        }

        for index in 0..110 {
            assert_eq!(selection.is_selected(&view, index), index % 10 < 5 && index < 100);
        }
        assert_eq!(selection.count(), 50);
    }

    #[tokio::test]
    async fn test_deselect_splits_and_drops_empty_view() {
        let registry = registry(corpus());
        let view = registry.view(ViewIdentity::all());

        let selection = Selection::new().select(&view, iv(0, 9), SelectOptions::replace());
        let split = selection.deselect(&view, iv(3, 5));
        assert_eq!(split.ranges(&view), &[iv(0, 2), iv(6, 9)]);
        assert!(split.is_focused(&view, 0));

        let emptied = split.deselect(&view, iv(0, 20));
        assert!(emptied.is_empty());
        assert!(emptied.views().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_off_splits_only_the_containing_range() {
        let registry = registry(corpus());
        let view = registry.view(ViewIdentity::all());

        let selection = Selection::new()
            .select(&view, iv(0, 4), SelectOptions::extend())
            .select(&view, iv(10, 10), SelectOptions::extend())
            .select(&view, iv(20, 29), SelectOptions::extend());

        let interior = selection.toggle_off(&view, 25);
        assert_eq!(interior.ranges(&view), &[iv(0, 4), iv(10, 10), iv(20, 24), iv(26, 29)]);
        assert!(interior.is_focused(&view, 20));
        assert_eq!(interior.anchor(), selection.anchor());

        let endpoint = selection.toggle_off(&view, 4);
        assert_eq!(endpoint.ranges(&view), &[iv(0, 3), iv(10, 10), iv(20, 29)]);

        let point = selection.toggle_off(&view, 10);
        assert_eq!(point.ranges(&view), &[iv(0, 4), iv(20, 29)]);

        let untouched = selection.toggle_off(&view, 15);
        assert_eq!(untouched.ranges(&view), selection.ranges(&view));

        let emptied = Selection::new()
            .select(&view, 7, SelectOptions::replace())
            .toggle_off(&view, 7);
        assert!(emptied.is_empty());
    }

    #[tokio::test]
    async fn test_count_saturates_across_views() {
        let registry = registry(corpus());
        let all = registry.view(ViewIdentity::all());
        let even = registry.view(even());

        let selection = Selection::new()
            .select(&all, iv(0, usize::MAX), SelectOptions::extend())
            .select(&even, iv(0, usize::MAX - 1), SelectOptions::extend());
        assert_eq!(selection.count(), usize::MAX);

        let compact = selection.to_compact_ranges();
        assert!(compact.iter().all(|entry| entry.count() >= usize::MAX - 1));
    }

    #[tokio::test]
    async fn test_retain_within() {
        let registry = registry(corpus());
        let view = registry.view(ViewIdentity::all());

        let selection = Selection::new()
            .select(&view, iv(2, 4), SelectOptions::replace())
            .select(&view, iv(10, 20), SelectOptions::extend());

        let shrunk = selection.retain_within(&view, 12);
        assert_eq!(shrunk.ranges(&view), &[iv(2, 4), iv(10, 11)]);
        assert!(shrunk.focus().is_some());

        let shrunk = selection.retain_within(&view, 5);
        assert_eq!(shrunk.ranges(&view), &[iv(2, 4)]);
        assert!(shrunk.focus().is_none());

        assert!(selection.retain_within(&view, 0).is_empty());
    }

    #[tokio::test]
    async fn test_without_view_and_clear() {
        let registry = registry(corpus());
        let all = registry.view(ViewIdentity::all());
        let evens = registry.view(even());

        let selection = Selection::new()
            .select(&all, 1, SelectOptions::extend())
            .select(&evens, 2, SelectOptions::extend());

        let remaining = selection.without_view(&evens);
        assert_eq!(remaining.views(), vec![&all]);
        assert!(remaining.focus().is_none());

        assert!(selection.clear().is_empty());
        assert_eq!(selection.clear().count(), 0);
    }

    #[tokio::test]
    async fn test_compact_ranges_shape() {
        let registry = registry(corpus());
        let evens = registry.view(even());

        let selection = Selection::new()
            .select(&evens, iv(4, 6), SelectOptions::extend())
            .select(&evens, 1, SelectOptions::extend());

        let json = serde_json::to_value(selection.to_compact_ranges()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "filters": [{"name": "Parity", "value": "even"}],
                "sort": null,
                "ranges": [{"start": 1, "end": 1}, {"start": 4, "end": 6}],
            }])
        );
    }

    #[tokio::test]
    async fn test_fetch_all_records_in_selection_order() {
        let registry = registry(corpus());
        let all = registry.view(ViewIdentity::all());
        let evens = registry.view(even());

        let selection = Selection::new()
            .select(&evens, iv(1, 2), SelectOptions::extend())
            .select(&all, iv(30, 31), SelectOptions::extend())
            .select(&all, 5, SelectOptions::extend());

        let ids: Vec<String> = selection
            .fetch_all_records()
            .await
            .unwrap()
            .iter()
            .map(|record| record.file_id.clone())
            .collect();
        assert_eq!(ids, vec!["2", "4", "5", "30", "31"]);
    }

    #[tokio::test]
    async fn test_compact_ranges_resolve_to_selected_rows() {
        let registry = registry(corpus());
        let view = registry.view(ViewIdentity::all());

        let selection = Selection::new()
            .select(&view, iv(3, 9), SelectOptions::extend())
            .select(&view, iv(20, 22), SelectOptions::extend())
            .deselect(&view, iv(5, 5));

        let selected: BTreeSet<usize> = (0..40).filter(|&i| selection.is_selected(&view, i)).collect();
        let compact = selection.to_compact_ranges();
        let resolved: BTreeSet<usize> = view
            .records_for(&compact[0].ranges)
            .await
            .unwrap()
            .iter()
            .map(|record| record.file_id.parse().unwrap())
            .collect();

        assert_eq!(resolved, selected);
        assert_eq!(compact[0].count(), selection.count());
    }

    #[tokio::test]
    async fn test_fetch_focused_record() {
        let registry = registry(corpus());
        let evens = registry.view(even());

        assert!(Selection::new().fetch_focused_record().await.unwrap().is_none());

        let selection = Selection::new().select(&evens, 3, SelectOptions::replace());
        let record = selection.fetch_focused_record().await.unwrap().unwrap();
        assert_eq!(record.file_id, "6");
    }

    #[tokio::test]
    async fn test_select_all() {
        let registry = registry(corpus());
        let all = registry.view(ViewIdentity::all());
        let evens = registry.view(even());

        let selection = Selection::new().select(&all, 0, SelectOptions::replace());
        let selection = selection.select_all(&evens).await.unwrap();

        assert_eq!(selection.ranges(&evens), &[iv(0, 19)]);
        assert_eq!(selection.count(), 21);
    }

    /// Delegates paging to an in-memory corpus but cannot aggregate.
    struct PagingOnly(InMemorySource);

    #[async_trait]
    impl RecordSource for PagingOnly {
        async fn count(&self, identity: &ViewIdentity) -> Result<usize, SourceError> {
            self.0.count(identity).await
        }

        async fn fetch(
            &self,
            identity: &ViewIdentity,
            offset: usize,
            limit: usize,
        ) -> Result<Vec<FileRecord>, SourceError> {
            self.0.fetch(identity, offset, limit).await
        }
    }

    #[tokio::test]
    async fn test_aggregate_uses_source_then_falls_back() {
        let registry = registry(corpus());
        let all = registry.view(ViewIdentity::all());
        let evens = registry.view(even());

        let selection = Selection::new()
            .select(&all, iv(0, 3), SelectOptions::extend())
            .select(&evens, iv(0, 1), SelectOptions::extend());

        let expected = AggregateInfo {
            count: 6,
            unique_count: 4,
            size: Some(60),
        };
        assert_eq!(selection.aggregate(&corpus()).await.unwrap(), expected);
        assert_eq!(selection.aggregate(&PagingOnly(corpus())).await.unwrap(), expected);
        assert_eq!(
            Selection::new().aggregate(&corpus()).await.unwrap(),
            AggregateInfo::default()
        );
    }
}
