use std::collections::HashMap;

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::Error,
    task::{PageFields, Task},
};

pub const NAME: &str = "Name";
pub const DUE_DATE: &str = "Due Date";
pub const CLASS: &str = "Class";
pub const TYPE: &str = "Type";
pub const STATUS: &str = "Status";

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Options {
    #[serde(default)]
    pub options: Vec<SelectOption>,
}

/// Description of a database property, as returned by `GET /databases/{id}`.
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertySchema {
    Select { select: Options },
    MultiSelect { multi_select: Options },
    Status { status: Options },
    #[serde(other)]
    Other,
}

impl PropertySchema {
    /// Labels of the choices, for the categorical properties.
    pub fn option_names(&self) -> Option<Vec<String>> {
        let options = match self {
            Self::Select { select } => select,
            Self::MultiSelect { multi_select } => multi_select,
            Self::Status { status } => status,
            Self::Other => return None,
        };

        Some(options.options.iter().map(|o| o.name.clone()).collect())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Database {
    pub properties: HashMap<String, PropertySchema>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RichText {
    pub plain_text: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DateValue {
    pub start: String,
}

/// Value of a page property. Only the kinds the board uses are decoded.
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title { title: Vec<RichText> },
    Date { date: Option<DateValue> },
    Select { select: Option<SelectOption> },
    Status { status: Option<SelectOption> },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Page {
    pub id: String,
    pub properties: HashMap<String, PropertyValue>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct QueryRequest {
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

fn select_name(page: &Page, field: &str) -> Result<Option<String>, Error> {
    match page.properties.get(field) {
        Some(PropertyValue::Select { select }) => Ok(select.as_ref().map(|s| s.name.clone())),
        Some(_) => Err(Error::schema(format!("page {}", page.id), field)),
        // a select left empty on every page may be omitted by the api
        None => Ok(None),
    }
}

impl Page {
    /// Maps the raw page into a [`Task`].
    /// A page without a due date is considered due `today`.
    pub fn to_task(&self, today: NaiveDate) -> Result<Task, Error> {
        let record = || format!("page {}", self.id);

        let name = match self.properties.get(NAME) {
            Some(PropertyValue::Title { title }) if !title.is_empty() => {
                title.iter().map(|t| t.plain_text.as_str()).collect::<String>()
            }
            _ => return Err(Error::schema(record(), NAME)),
        };

        let due_date = match self.properties.get(DUE_DATE) {
            Some(PropertyValue::Date { date: Some(date) }) => {
                // datetimes look like 2025-03-04T10:00:00.000-04:00
                let day = date.start.split('T').next().unwrap_or_default();
                NaiveDate::parse_from_str(day, "%Y-%m-%d")
                    .map_err(|_| Error::schema(record(), DUE_DATE))?
            }
            Some(PropertyValue::Date { date: None }) => {
                debug!("{} has no due date, using {}", name, today);
                today
            }
            _ => return Err(Error::schema(record(), DUE_DATE)),
        };

        let is_completed = match self.properties.get(STATUS) {
            Some(PropertyValue::Status { status }) => status
                .as_ref()
                .is_some_and(|s| s.name.to_lowercase() == "completed"),
            _ => return Err(Error::schema(record(), STATUS)),
        };

        Ok(Task {
            name,
            due_date,
            type_of_assignment: select_name(self, TYPE)?,
            class_name: select_name(self, CLASS)?,
            is_completed,
        })
    }
}

/// Builds the `properties` object of a page creation request.
pub fn page_properties(fields: &PageFields) -> Value {
    json!({
        NAME: {
            "title": [{ "text": { "content": fields.name } }]
        },
        DUE_DATE: {
            "date": { "start": fields.due_date.format("%Y-%m-%d").to_string() }
        },
        CLASS: {
            "select": { "name": fields.class_name }
        },
        TYPE: {
            "select": { "name": fields.type_of_task }
        }
    })
}
