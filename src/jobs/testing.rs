use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use poise::serenity_prelude::ChannelId;

use crate::{
    canvas::{AssignmentSource, CourseAssignments},
    error::Error,
    notion::TaskStore,
    task::{PageFields, Task},
};

use super::channels::{ChannelDirectory, ExistingChannel};

/// In-memory board.
#[derive(Default)]
pub struct MemoryStore {
    pub tasks: Mutex<Vec<Task>>,
    pub options: HashMap<String, Vec<String>>,
}

impl MemoryStore {
    pub fn with_tasks(names: &[&str], due: NaiveDate) -> Self {
        let tasks = names
            .iter()
            .map(|name| Task {
                name: name.to_string(),
                due_date: due,
                type_of_assignment: Some("Assignment".to_string()),
                class_name: None,
                is_completed: false,
            })
            .collect();

        Self {
            tasks: Mutex::new(tasks),
            options: HashMap::new(),
        }
    }

    pub fn with_options(property: &str, options: &[&str]) -> Self {
        Self {
            tasks: Mutex::new(vec![]),
            options: HashMap::from([(
                property.to_string(),
                options.iter().map(|o| o.to_string()).collect(),
            )]),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.tasks.lock().unwrap().iter().map(|t| t.name.clone()).collect()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn retrieve_all_tasks(&self, _today: NaiveDate) -> Result<Vec<Task>, Error> {
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn create_page(&self, fields: &PageFields) -> Result<(), Error> {
        self.tasks.lock().unwrap().push(Task {
            name: fields.name.clone(),
            due_date: fields.due_date,
            type_of_assignment: Some(fields.type_of_task.clone()),
            class_name: Some(fields.class_name.clone()),
            is_completed: false,
        });
        Ok(())
    }

    fn list_category_options(&self, property: &str) -> Result<Vec<String>, Error> {
        self.options
            .get(property)
            .cloned()
            .ok_or_else(|| Error::schema("database schema", property))
    }
}

pub struct StaticSource(pub Vec<CourseAssignments>);

#[async_trait]
impl AssignmentSource for StaticSource {
    async fn assignments_by_course(&self) -> Result<Vec<CourseAssignments>, Error> {
        Ok(self.0.clone())
    }
}

/// In-memory channel category. Creating `fail_on` fails.
#[derive(Default)]
pub struct MemoryCategory {
    pub channels: Mutex<Vec<ExistingChannel>>,
    pub fail_on: Option<String>,
    next_id: Mutex<u64>,
}

impl MemoryCategory {
    pub fn with_channels(names: &[&str]) -> Self {
        let channels = names
            .iter()
            .enumerate()
            .map(|(i, name)| ExistingChannel {
                id: ChannelId::new(i as u64 + 1),
                name: name.to_string(),
            })
            .collect();

        Self {
            channels: Mutex::new(channels),
            fail_on: None,
            next_id: Mutex::new(names.len() as u64 + 1),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.channels.lock().unwrap().iter().map(|c| c.name.clone()).collect()
    }
}

#[async_trait]
impl ChannelDirectory for MemoryCategory {
    async fn list(&self) -> Result<Vec<ExistingChannel>, anyhow::Error> {
        Ok(self.channels.lock().unwrap().clone())
    }

    async fn delete(&self, channel: &ExistingChannel) -> Result<(), anyhow::Error> {
        self.channels.lock().unwrap().retain(|c| c.id != channel.id);
        Ok(())
    }

    async fn create(&self, name: &str) -> Result<(), anyhow::Error> {
        if self.fail_on.as_deref() == Some(name) {
            anyhow::bail!("missing permissions");
        }

        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        self.channels.lock().unwrap().push(ExistingChannel {
            id: ChannelId::new(*next_id),
            name: name.to_string(),
        });
        Ok(())
    }
}
