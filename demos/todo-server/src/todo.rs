use serde_json::Map;
use simple_restful::prelude::*;

/// Echoes todos back to the caller; nothing is stored.
#[derive(Debug, Default)]
pub struct TodoResource;

#[resource(path = "/todos")]
impl TodoResource {
    /// `GET /todos` and `GET /todos/<todo_id:int>`
    async fn get(&self, todo_id: Option<i64>) -> Value {
        match todo_id {
            Some(id) => json!({ "id": id }),
            None => json!({ "todos": [] }),
        }
    }

    /// `POST /todos/<todo_id:int>` and `POST /todos/<todo_id:int>/<title:str>`
    ///
    /// Fields of a JSON object body are merged into the created todo.
    async fn post(
        &self,
        req: Request,
        todo_id: i64,
        title: Option<String>,
    ) -> Result<(Value, u16)> {
        let mut todo = Map::new();
        todo.insert("id".to_string(), json!(todo_id));
        if let Some(title) = title {
            todo.insert("title".to_string(), Value::String(title));
        }
        if !req.body().is_empty() {
            let fields: Map<String, Value> = req.json()?;
            todo.extend(fields);
        }

        tracing::debug!(todo_id, "Created todo");
        Ok((Value::Object(todo), 201))
    }
}
