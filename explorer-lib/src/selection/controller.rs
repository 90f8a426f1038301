//! Click gestures and selection commands.
//!
//! Every change to a selection is expressed as a [`SelectionCommand`] and
//! applied by the pure [`reduce`] function. [`SelectionController`] owns the
//! current selection for a UI and dispatches commands against it.
//!
//! Click semantics:
//!
//! | Gesture      | Effect                                                      |
//! |--------------|-------------------------------------------------------------|
//! | click        | Select only `index`; focus and anchor move to it            |
//! | ctrl         | Toggle `index` in its view; focus and anchor move on select |
//! | shift        | Select anchor..=index, replacing everything; focus moves    |
//! | ctrl + shift | Add anchor..=index to the view's ranges; focus moves        |
//!
//! A shift click with no anchor, or an anchor in another view, selects just
//! the clicked row and re-anchors there.

use log::debug;

use super::SelectOptions;
use super::Selection;
use crate::error::Error;
use crate::interval::Interval;
use crate::view::View;

/// A click on one row, with its modifier keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gesture {
    pub view: View,
    pub index: usize,
    pub ctrl: bool,
    pub shift: bool,
}

impl Gesture {
    /// Creates a click without modifiers.
    pub fn click(view: &View, index: usize) -> Self {
        Self {
            view: view.clone(),
            index,
            ctrl: false,
            shift: false,
        }
    }

    /// Sets whether ctrl (or cmd) was held.
    pub fn with_ctrl(mut self, ctrl: bool) -> Self {
        self.ctrl = ctrl;
        self
    }

    /// Sets whether shift was held.
    pub fn with_shift(mut self, shift: bool) -> Self {
        self.shift = shift;
        self
    }
}

/// A change to a selection.
#[derive(Debug, Clone)]
pub enum SelectionCommand {
    /// A click on a row.
    Click(Gesture),
    /// Select rows `0..count` of a view, keeping the rest of the selection.
    SelectAll { view: View, count: usize },
    /// Remove a range from a view.
    Deselect { view: View, range: Interval },
    /// Drop rows at or past `count` in a view that shrank.
    RetainWithin { view: View, count: usize },
    /// Drop everything selected in a view.
    RemoveView(View),
    /// Empty the selection.
    Clear,
}

impl SelectionCommand {
    fn name(&self) -> &'static str {
        match self {
            SelectionCommand::Click(_) => "click",
            SelectionCommand::SelectAll { .. } => "select all",
            SelectionCommand::Deselect { .. } => "deselect",
            SelectionCommand::RetainWithin { .. } => "retain within",
            SelectionCommand::RemoveView(_) => "remove view",
            SelectionCommand::Clear => "clear",
        }
    }
}

/// Applies `command` to `selection`, returning the new selection.
pub fn reduce(selection: &Selection, command: SelectionCommand) -> Selection {
    match command {
        SelectionCommand::Click(gesture) => click(selection, &gesture),
        SelectionCommand::SelectAll { view, count } => selection.select_leading(&view, count),
        SelectionCommand::Deselect { view, range } => selection.deselect(&view, range),
        SelectionCommand::RetainWithin { view, count } => selection.retain_within(&view, count),
        SelectionCommand::RemoveView(view) => selection.without_view(&view),
        SelectionCommand::Clear => selection.clear(),
    }
}

fn click(selection: &Selection, gesture: &Gesture) -> Selection {
    let Gesture {
        view,
        index,
        ctrl,
        shift,
    } = gesture;
    let index = *index;

    let options = if *ctrl {
        SelectOptions::extend()
    } else {
        SelectOptions::replace()
    };

    if *shift {
        let anchor = selection
            .anchor()
            .filter(|anchor| anchor.view() == view)
            .map(|anchor| anchor.index());

        return match anchor {
            Some(anchor) => selection.select(
                view,
                Interval::spanning(anchor, index),
                options.focus_at(index).anchor_at(anchor),
            ),
            None => selection.select(view, index, options),
        };
    }

    if *ctrl && selection.is_selected(view, index) {
        return selection.toggle_off(view, index);
    }

    selection.select(view, index, options)
}

/// Holds the current selection of one UI and applies commands to it.
///
/// # Example
///
/// ```ignore
/// use explorer_lib::selection::{Gesture, SelectionCommand, SelectionController};
///
/// let mut controller = SelectionController::new();
/// controller.dispatch(SelectionCommand::Click(Gesture::click(&view, 10)));
/// controller.dispatch(SelectionCommand::Click(Gesture::click(&view, 3).with_shift(true)));
///
/// assert_eq!(controller.selection().count(), 8);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    selection: Selection,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a controller starting from an existing selection.
    pub fn with_selection(selection: Selection) -> Self {
        Self { selection }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Applies `command` and returns the new selection.
    pub fn dispatch(&mut self, command: SelectionCommand) -> &Selection {
        let name = command.name();
        self.selection = reduce(&self.selection, command);
        debug!(
            "Selection after {}: {} row(s) in {} view(s)",
            name,
            self.selection.count(),
            self.selection.views().len()
        );
        &self.selection
    }

    /// Selects every row of `view`, fetching its count first if needed.
    pub async fn select_all(&mut self, view: &View) -> Result<&Selection, Error> {
        let count = view.total_count().await?;
        Ok(self.dispatch(SelectionCommand::SelectAll {
            view: view.clone(),
            count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileRecord;
    use crate::query::FileFilter;
    use crate::query::ViewIdentity;
    use crate::source::InMemorySource;
    use crate::view::ViewRegistry;

    fn registry() -> ViewRegistry {
        let records = (0..50)
            .map(|i| {
                FileRecord::new(i.to_string(), format!("/data/{i}.czi"))
                    .with_annotation("Plate", [if i < 25 { "A" } else { "B" }])
            })
            .collect();
        ViewRegistry::new(InMemorySource::new(records)).unwrap()
    }

    fn click(view: &View, index: usize) -> SelectionCommand {
        SelectionCommand::Click(Gesture::click(view, index))
    }

    fn ctrl(view: &View, index: usize) -> SelectionCommand {
        SelectionCommand::Click(Gesture::click(view, index).with_ctrl(true))
    }

    fn shift(view: &View, index: usize) -> SelectionCommand {
        SelectionCommand::Click(Gesture::click(view, index).with_shift(true))
    }

    fn ctrl_shift(view: &View, index: usize) -> SelectionCommand {
        SelectionCommand::Click(Gesture::click(view, index).with_ctrl(true).with_shift(true))
    }

    #[tokio::test]
    async fn test_plain_click_replaces() {
        let registry = registry();
        let view = registry.view(ViewIdentity::all());
        let mut controller = SelectionController::new();

        controller.dispatch(click(&view, 5));
        assert!(controller.selection().is_selected(&view, 5));
        assert_eq!(controller.selection().count(), 1);

        controller.dispatch(click(&view, 9));
        assert!(!controller.selection().is_selected(&view, 5));
        assert!(controller.selection().is_selected(&view, 9));
        assert!(controller.selection().is_focused(&view, 9));
        assert_eq!(controller.selection().count(), 1);
    }

    #[tokio::test]
    async fn test_ctrl_click_toggles() {
        let registry = registry();
        let view = registry.view(ViewIdentity::all());
        let mut controller = SelectionController::new();

        controller.dispatch(ctrl(&view, 5));
        controller.dispatch(ctrl(&view, 9));
        assert_eq!(controller.selection().count(), 2);
        assert!(controller.selection().is_focused(&view, 9));

        controller.dispatch(ctrl(&view, 5));
        assert!(!controller.selection().is_selected(&view, 5));
        assert!(controller.selection().is_selected(&view, 9));
        assert_eq!(controller.selection().count(), 1);
        // Toggling off does not move the focus
        assert!(controller.selection().is_focused(&view, 9));
    }

    #[tokio::test]
    async fn test_ctrl_click_splits_range() {
        let registry = registry();
        let view = registry.view(ViewIdentity::all());
        let mut controller = SelectionController::new();

        controller.dispatch(click(&view, 2));
        controller.dispatch(shift(&view, 8));
        controller.dispatch(ctrl(&view, 5));

        let expected = [Interval::new(2, 4).unwrap(), Interval::new(6, 8).unwrap()];
        assert_eq!(controller.selection().ranges(&view), &expected);
    }

    #[tokio::test]
    async fn test_ctrl_click_trims_range_end_and_drops_single_row() {
        let registry = registry();
        let view = registry.view(ViewIdentity::all());
        let mut controller = SelectionController::new();

        controller.dispatch(click(&view, 2));
        controller.dispatch(shift(&view, 8));
        controller.dispatch(ctrl(&view, 8));
        assert_eq!(controller.selection().ranges(&view), &[Interval::new(2, 7).unwrap()]);

        controller.dispatch(click(&view, 20));
        controller.dispatch(ctrl(&view, 20));
        assert!(controller.selection().is_empty());
    }

    #[tokio::test]
    async fn test_ctrl_click_merges_adjacent() {
        let registry = registry();
        let view = registry.view(ViewIdentity::all());
        let mut controller = SelectionController::new();

        controller.dispatch(ctrl(&view, 4));
        controller.dispatch(ctrl(&view, 6));
        controller.dispatch(ctrl(&view, 5));
        assert_eq!(controller.selection().ranges(&view), &[Interval::new(4, 6).unwrap()]);
    }

    #[tokio::test]
    async fn test_shift_click_builds_range_from_anchor() {
        let registry = registry();
        let view = registry.view(ViewIdentity::all());
        let mut controller = SelectionController::new();

        controller.dispatch(click(&view, 10));
        controller.dispatch(shift(&view, 3));
        assert_eq!(controller.selection().ranges(&view), &[Interval::new(3, 10).unwrap()]);
        assert_eq!(controller.selection().count(), 8);
        assert!(controller.selection().is_focused(&view, 3));

        // The anchor stays at 10, so the next shift click extends from there
        controller.dispatch(shift(&view, 14));
        assert_eq!(controller.selection().ranges(&view), &[Interval::new(10, 14).unwrap()]);
    }

    #[tokio::test]
    async fn test_shift_click_replaces_other_views() {
        let registry = registry();
        let plate_a = registry.view(ViewIdentity::new([FileFilter::new("Plate", "A")], None));
        let plate_b = registry.view(ViewIdentity::new([FileFilter::new("Plate", "B")], None));
        let mut controller = SelectionController::new();

        controller.dispatch(ctrl(&plate_a, 1));
        controller.dispatch(ctrl(&plate_b, 2));
        controller.dispatch(shift(&plate_b, 6));

        assert!(!controller.selection().is_selected(&plate_a, 1));
        assert_eq!(controller.selection().ranges(&plate_b), &[Interval::new(2, 6).unwrap()]);
    }

    #[tokio::test]
    async fn test_ctrl_shift_click_unions() {
        let registry = registry();
        let plate_a = registry.view(ViewIdentity::new([FileFilter::new("Plate", "A")], None));
        let plate_b = registry.view(ViewIdentity::new([FileFilter::new("Plate", "B")], None));
        let mut controller = SelectionController::new();

        controller.dispatch(ctrl(&plate_a, 1));
        controller.dispatch(ctrl(&plate_b, 20));
        controller.dispatch(ctrl(&plate_b, 2));
        controller.dispatch(ctrl_shift(&plate_b, 5));

        let selection = controller.selection();
        assert!(selection.is_selected(&plate_a, 1));
        assert_eq!(
            selection.ranges(&plate_b),
            &[Interval::new(2, 5).unwrap(), Interval::new(20, 20).unwrap()]
        );
        assert!(selection.is_focused(&plate_b, 5));
        assert_eq!(selection.anchor().unwrap().index(), 2);
    }

    #[tokio::test]
    async fn test_shift_anchor_in_other_view_collapses() {
        let registry = registry();
        let plate_a = registry.view(ViewIdentity::new([FileFilter::new("Plate", "A")], None));
        let plate_b = registry.view(ViewIdentity::new([FileFilter::new("Plate", "B")], None));
        let mut controller = SelectionController::new();

        controller.dispatch(click(&plate_a, 4));
        controller.dispatch(shift(&plate_b, 9));

        let selection = controller.selection();
        assert_eq!(selection.count(), 1);
        assert_eq!(selection.ranges(&plate_b), &[Interval::point(9)]);
        assert_eq!(selection.anchor().unwrap().view(), &plate_b);
        assert_eq!(selection.anchor().unwrap().index(), 9);
    }

    #[tokio::test]
    async fn test_shift_click_without_anchor() {
        let registry = registry();
        let view = registry.view(ViewIdentity::all());
        let mut controller = SelectionController::new();

        controller.dispatch(shift(&view, 7));
        assert_eq!(controller.selection().ranges(&view), &[Interval::point(7)]);
    }

    #[tokio::test]
    async fn test_reduce_is_pure() {
        let registry = registry();
        let view = registry.view(ViewIdentity::all());

        let before = reduce(&Selection::new(), click(&view, 3));
        let after = reduce(&before, ctrl(&view, 4));
        assert_eq!(before.count(), 1);
        assert_eq!(after.count(), 2);
    }

    #[tokio::test]
    async fn test_select_all_and_commands() {
        let registry = registry();
        let plate_b = registry.view(ViewIdentity::new([FileFilter::new("Plate", "B")], None));
        let mut controller = SelectionController::new();

        controller.select_all(&plate_b).await.unwrap();
        assert_eq!(controller.selection().count(), 25);

        controller.dispatch(SelectionCommand::Deselect {
            view: plate_b.clone(),
            range: Interval::new(0, 9).unwrap(),
        });
        assert_eq!(controller.selection().count(), 15);

        controller.dispatch(SelectionCommand::RetainWithin {
            view: plate_b.clone(),
            count: 20,
        });
        assert_eq!(controller.selection().ranges(&plate_b), &[Interval::new(10, 19).unwrap()]);

        controller.dispatch(SelectionCommand::RemoveView(plate_b.clone()));
        assert!(controller.selection().is_empty());

        controller.dispatch(click(&plate_b, 0));
        controller.dispatch(SelectionCommand::Clear);
        assert!(controller.selection().is_empty());
        assert!(controller.selection().focus().is_none());
    }
}
