use chrono::NaiveDate;

/// A task of the Notion board, in a more readable format than the raw page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub name: String,
    pub due_date: NaiveDate,
    /// Value of the "Type" select, if any.
    pub type_of_assignment: Option<String>,
    /// Value of the "Class" select, if any.
    pub class_name: Option<String>,
    pub is_completed: bool,
}

impl Task {
    /// Number of days since the due date. Negative when the task is due later.
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        (today - self.due_date).num_days()
    }

    /// A completed task is never overdue.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.days_overdue(today) > 0 && !self.is_completed
    }
}

/// A graded item fetched from Canvas. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub due_date: Option<NaiveDate>,
    pub points_possible: f64,
}

/// The fields submitted when a page is created on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFields {
    pub name: String,
    pub due_date: NaiveDate,
    pub class_name: String,
    pub type_of_task: String,
}
