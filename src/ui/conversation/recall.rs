//! Submitted-query history with shell-style recall

/// Past queries plus the recall cursor into them
#[derive(Debug, Clone)]
pub struct QueryHistory {
    entries: Vec<String>,
    cursor: Option<usize>,
    draft_before_recall: String,
    limit: usize,
}

impl QueryHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            draft_before_recall: String::new(),
            limit: limit.max(1),
        }
    }

    /// Remember a query unless it repeats the most recent one
    pub fn push(&mut self, query: &str) -> bool {
        if query.is_empty() || self.entries.last().is_some_and(|last| last == query) {
            return false;
        }

        self.entries.push(query.to_string());
        if self.entries.len() > self.limit {
            self.entries.remove(0);
        }
        true
    }

    /// Forget the recall position and saved draft
    pub fn reset_navigation(&mut self) {
        self.cursor = None;
        self.draft_before_recall.clear();
    }

    /// Step towards older entries; starting a recall saves `draft`.
    /// Returns the entry to show, or None when there is no history.
    pub fn older(&mut self, draft: &str) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }

        let index = match self.cursor {
            None => {
                self.draft_before_recall = draft.to_string();
                self.entries.len() - 1
            }
            Some(index) => index.saturating_sub(1),
        };
        self.cursor = Some(index);
        Some(self.entries[index].as_str())
    }

    /// Step towards newer entries; past the newest the saved draft comes back
    /// and recall ends. Returns None when no recall is in progress.
    pub fn newer(&mut self) -> Option<String> {
        let index = self.cursor?;

        if index + 1 < self.entries.len() {
            self.cursor = Some(index + 1);
            Some(self.entries[index + 1].clone())
        } else {
            let draft = std::mem::take(&mut self.draft_before_recall);
            self.reset_navigation();
            Some(draft)
        }
    }

    /// Jump straight to an entry; out-of-range indices are ignored
    pub fn select(&mut self, index: usize) -> Option<&str> {
        if index >= self.entries.len() {
            return None;
        }
        self.cursor = Some(index);
        self.draft_before_recall.clear();
        Some(self.entries[index].as_str())
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn is_recalling(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn saved_draft(&self) -> &str {
        &self.draft_before_recall
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
