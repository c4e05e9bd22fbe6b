use super::Snapshot;

/// Default number of snapshots kept
pub const DEFAULT_MAX_SNAPSHOTS: usize = 100;

/// Linear undo history with a cursor.
///
/// Snapshots after the cursor form the redo tail, which is dropped as soon as
/// a new snapshot is added. The oldest snapshots are evicted once either the
/// entry budget or the optional HTML length budget is exceeded, but the
/// snapshot under the cursor is never evicted.
#[derive(Debug, Clone)]
pub struct SnapshotsManager {
    snapshots: Vec<Snapshot>,
    current_index: Option<usize>,
    /// Index of the last snapshot that may be replaced by a following
    /// auto-completeable snapshot
    auto_complete_index: Option<usize>,
    max_size: usize,
    max_total_html_len: Option<usize>,
    total_html_len: usize,
    has_new_content: bool,
}

impl Default for SnapshotsManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SNAPSHOTS, None)
    }
}

impl SnapshotsManager {
    /// `max_size` is clamped to at least one entry; `max_total_html_len`
    /// bounds the summed byte length of all stored HTML.
    pub fn new(max_size: usize, max_total_html_len: Option<usize>) -> Self {
        Self {
            snapshots: Vec::new(),
            current_index: None,
            auto_complete_index: None,
            max_size: max_size.max(1),
            max_total_html_len,
            total_html_len: 0,
            has_new_content: false,
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshots.get(self.current_index?)
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn total_html_len(&self) -> usize {
        self.total_html_len
    }

    /// Whether the live content changed since the last snapshot was taken or restored
    pub fn has_new_content(&self) -> bool {
        self.has_new_content
    }

    pub fn set_has_new_content(&mut self, has_new_content: bool) {
        self.has_new_content = has_new_content;
    }

    /// Records `snapshot` as the new current entry.
    ///
    /// The redo tail is dropped first. A snapshot whose HTML equals the
    /// current one (neither carrying entity states) replaces it in place, as
    /// does an auto-completeable snapshot following another one with no
    /// other snapshot in between.
    pub fn add_snapshot(&mut self, snapshot: Snapshot, is_auto_completeable: bool) {
        self.clear_redo();

        match self.current_index {
            Some(index) if is_same_content(&self.snapshots[index], &snapshot) => {
                log::trace!("replacing snapshot {index} with identical content");
                self.replace(index, snapshot);
                if !is_auto_completeable {
                    self.auto_complete_index = None;
                }
            }
            Some(index) if is_auto_completeable && self.auto_complete_index == Some(index) => {
                log::trace!("coalescing snapshot into {index}");
                self.replace(index, snapshot);
            }
            _ => {
                self.total_html_len += snapshot.html.len();
                self.snapshots.push(snapshot);
                let index = self.snapshots.len() - 1;
                self.current_index = Some(index);
                self.auto_complete_index = is_auto_completeable.then_some(index);
                self.evict();
            }
        }
    }

    fn replace(&mut self, index: usize, snapshot: Snapshot) {
        self.total_html_len = self.total_html_len - self.snapshots[index].html.len() + snapshot.html.len();
        self.snapshots[index] = snapshot;
    }

    fn is_over_budget(&self, count: usize, total_html_len: usize) -> bool {
        count > self.max_size || self.max_total_html_len.is_some_and(|max| total_html_len > max)
    }

    fn evict(&mut self) {
        let Some(current) = self.current_index else {
            return;
        };
        let mut remove = 0;
        let mut total = self.total_html_len;
        while remove < current && self.is_over_budget(self.snapshots.len() - remove, total) {
            total -= self.snapshots[remove].html.len();
            remove += 1;
        }
        if remove == 0 {
            return;
        }

        self.snapshots.drain(..remove);
        self.total_html_len = total;
        self.current_index = Some(current - remove);
        self.auto_complete_index = self.auto_complete_index.and_then(|i| i.checked_sub(remove));
        log::debug!("evicted {remove} snapshots, {} left", self.snapshots.len());
    }

    /// Whether the cursor can move by `step` and stay inside the history
    pub fn can_move(&self, step: isize) -> bool {
        self.target_index(step).is_some()
    }

    fn target_index(&self, step: isize) -> Option<usize> {
        let target = self.current_index?.checked_add_signed(step)?;
        (target < self.snapshots.len()).then_some(target)
    }

    /// Moves the cursor by `step` and returns the snapshot now under it.
    /// Nothing moves when the target is out of range.
    pub fn move_by(&mut self, step: isize) -> Option<Snapshot> {
        let target = self.target_index(step)?;
        self.current_index = Some(target);
        self.auto_complete_index = None;
        Some(self.snapshots[target].clone())
    }

    /// Drops every snapshot after the cursor
    pub fn clear_redo(&mut self) {
        let keep = self.current_index.map_or(0, |i| i + 1);
        if keep >= self.snapshots.len() {
            return;
        }
        let dropped: usize = self.snapshots[keep..].iter().map(|s| s.html.len()).sum();
        self.snapshots.truncate(keep);
        self.total_html_len -= dropped;
        if self.auto_complete_index.is_some_and(|i| i >= keep) {
            self.auto_complete_index = None;
        }
        log::trace!("cleared redo tail, {} snapshots left", self.snapshots.len());
    }
}

fn is_same_content(current: &Snapshot, new: &Snapshot) -> bool {
    current.html == new.html && current.entity_states.is_none() && new.entity_states.is_none()
}
