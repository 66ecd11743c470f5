use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use serde_json::json;

use crate::{
    cfg::NotionConfig,
    error::{check_status, Error},
    task::{PageFields, Task},
};

use self::schema::{page_properties, Database, PropertySchema, QueryRequest, QueryResponse};

pub mod schema;

const SERVICE: &str = "notion";

/// The board holding the tasks.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Every task of the board. `today` is used for pages without a due date.
    async fn retrieve_all_tasks(&self, today: NaiveDate) -> Result<Vec<Task>, Error>;

    /// Adds a page to the board.
    async fn create_page(&self, fields: &PageFields) -> Result<(), Error>;

    /// The choices configured for a select property, such as "Class" or "Type".
    fn list_category_options(&self, property: &str) -> Result<Vec<String>, Error>;
}

/// [`TaskStore`] backed by a Notion database.
/// The database schema is fetched once, when connecting.
pub struct NotionStore {
    client: reqwest::Client,
    config: NotionConfig,
    properties: HashMap<String, PropertySchema>,
}

impl NotionStore {
    pub async fn connect(config: &NotionConfig) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout()?)
            .build()?;

        let mut store = Self {
            client,
            config: config.clone(),
            properties: HashMap::new(),
        };

        let response = store
            .request(reqwest::Method::GET, &format!("databases/{}", config.database_id))
            .send()
            .await
            .map_err(Error::transport(SERVICE))?;
        let database: Database = check_status(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(Error::transport(SERVICE))?;

        debug!("notion database has {} properties", database.properties.len());
        store.properties = database.properties;

        Ok(store)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(
                method,
                format!("{}/v1/{}", self.config.base_url.trim_end_matches('/'), path),
            )
            .bearer_auth(&self.config.token)
            .header("Notion-Version", &self.config.version)
    }

    async fn query(&self, cursor: Option<String>) -> Result<QueryResponse, Error> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("databases/{}/query", self.config.database_id),
            )
            .json(&QueryRequest {
                page_size: 100,
                start_cursor: cursor,
            })
            .send()
            .await
            .map_err(Error::transport(SERVICE))?;

        check_status(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(Error::transport(SERVICE))
    }
}

#[async_trait]
impl TaskStore for NotionStore {
    async fn retrieve_all_tasks(&self, today: NaiveDate) -> Result<Vec<Task>, Error> {
        let mut pages = vec![];
        let mut cursor = None;

        // follow the cursors until everything is fetched
        loop {
            let response = self.query(cursor).await?;
            pages.extend(response.results);

            match response.next_cursor {
                Some(next) if response.has_more => cursor = Some(next),
                _ => break,
            }
        }

        debug!("retrieved {} pages", pages.len());
        pages.iter().map(|page| page.to_task(today)).collect()
    }

    async fn create_page(&self, fields: &PageFields) -> Result<(), Error> {
        let write_error = |source| Error::RemoteWrite {
            name: fields.name.clone(),
            source: Box::new(source),
        };

        let response = self
            .request(reqwest::Method::POST, "pages")
            .json(&json!({
                "parent": {
                    "type": "database_id",
                    "database_id": self.config.database_id
                },
                "properties": page_properties(fields)
            }))
            .send()
            .await
            .map_err(|e| write_error(Error::Transport {
                service: SERVICE,
                source: e,
            }))?;
        check_status(SERVICE, response).await.map_err(write_error)?;

        info!("created task `{}` for {}", fields.name, fields.class_name);
        Ok(())
    }

    fn list_category_options(&self, property: &str) -> Result<Vec<String>, Error> {
        self.properties
            .get(property)
            .and_then(PropertySchema::option_names)
            .ok_or_else(|| Error::schema("database schema", property))
    }
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::{cfg::NotionConfig, error::Error, task::PageFields};

    use super::{NotionStore, TaskStore};

    fn config(server: &MockServer) -> NotionConfig {
        NotionConfig {
            token: "secret".to_string(),
            database_id: "db".to_string(),
            base_url: server.uri(),
            version: "2022-06-28".to_string(),
            timeout: "5s".to_string(),
        }
    }

    fn page(id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "properties": {
                "Name": { "type": "title", "title": [{ "plain_text": name }] },
                "Due Date": { "type": "date", "date": { "start": "2025-03-10" } },
                "Class": { "type": "select", "select": { "name": "Math 📐" } },
                "Type": { "type": "select", "select": { "name": "Assignment" } },
                "Status": { "type": "status", "status": { "name": "Not started" } }
            }
        })
    }

    async fn mount_schema(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v1/databases/db"))
            .and(header("Authorization", "Bearer secret"))
            .and(header("Notion-Version", "2022-06-28"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "database",
                "properties": {
                    "Name": { "type": "title", "title": {} },
                    "Class": { "type": "select", "select": { "options": [
                        { "name": "Math 📐" }, { "name": "CS 💻" }
                    ] } },
                    "Type": { "type": "select", "select": { "options": [
                        { "name": "Assignment" }, { "name": "Test" }, { "name": "Quiz" }
                    ] } },
                    "Due Date": { "type": "date", "date": {} }
                }
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn category_options() {
        let server = MockServer::start().await;
        mount_schema(&server).await;

        let store = NotionStore::connect(&config(&server)).await.unwrap();

        assert_eq!(
            store.list_category_options("Class").unwrap(),
            vec!["Math 📐".to_string(), "CS 💻".to_string()]
        );
        assert_eq!(store.list_category_options("Type").unwrap().len(), 3);
        assert!(matches!(
            store.list_category_options("Due Date"),
            Err(Error::SchemaMismatch { .. })
        ));
        assert!(store.list_category_options("Priority").is_err());
    }

    #[tokio::test]
    async fn follows_cursors() {
        let server = MockServer::start().await;
        mount_schema(&server).await;

        Mock::given(method("POST"))
            .and(path("/v1/databases/db/query"))
            .and(body_partial_json(json!({ "start_cursor": "next" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [page("2", "Quiz 3")],
                "has_more": false,
                "next_cursor": null
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/databases/db/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [page("1", "Essay 1")],
                "has_more": true,
                "next_cursor": "next"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = NotionStore::connect(&config(&server)).await.unwrap();
        let tasks = store
            .retrieve_all_tasks(NaiveDate::from_ymd_opt(2025, 3, 4).unwrap())
            .await
            .unwrap();

        let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Essay 1", "Quiz 3"]);
    }

    #[tokio::test]
    async fn create_page() {
        let server = MockServer::start().await;
        mount_schema(&server).await;

        Mock::given(method("POST"))
            .and(path("/v1/pages"))
            .and(body_partial_json(json!({
                "parent": { "database_id": "db" },
                "properties": {
                    "Name": { "title": [{ "text": { "content": "Essay 2" } }] },
                    "Due Date": { "date": { "start": "2025-03-07" } },
                    "Class": { "select": { "name": "English 📖" } },
                    "Type": { "select": { "name": "Assignment" } }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "new" })))
            .expect(1)
            .mount(&server)
            .await;

        let store = NotionStore::connect(&config(&server)).await.unwrap();
        store
            .create_page(&PageFields {
                name: "Essay 2".to_string(),
                due_date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
                class_name: "English 📖".to_string(),
                type_of_task: "Assignment".to_string(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_page_rejected() {
        let server = MockServer::start().await;
        mount_schema(&server).await;

        Mock::given(method("POST"))
            .and(path("/v1/pages"))
            .respond_with(ResponseTemplate::new(400).set_body_string("validation_error"))
            .mount(&server)
            .await;

        let store = NotionStore::connect(&config(&server)).await.unwrap();
        let result = store
            .create_page(&PageFields {
                name: "Essay 2".to_string(),
                due_date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
                class_name: "Nope".to_string(),
                type_of_task: "Assignment".to_string(),
            })
            .await;

        match result {
            Err(Error::RemoteWrite { name, source }) => {
                assert_eq!(name, "Essay 2");
                assert!(matches!(*source, Error::Api { .. }));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
