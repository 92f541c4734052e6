use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogsResponse {
    food_logs: Vec<Value>,
    bathroom_logs: Vec<Value>,
}

struct TestServer {
    base_url: String,
    child: Child,
    _data_dir: tempfile::TempDir,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/logs")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_dir = tempfile::tempdir().expect("temp dir");
    let data_path = data_dir.path().join("molly.json");
    let child = Command::new(env!("CARGO_BIN_EXE_molly_tracker"))
        .env("PORT", port.to_string())
        .env("STORE_BACKEND", "local")
        .env("APP_DATA_PATH", &data_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer {
        base_url,
        child,
        _data_dir: data_dir,
    }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn get_logs(client: &Client, base_url: &str) -> LogsResponse {
    client
        .get(format!("{base_url}/api/logs"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

fn without_id(mut record: Value) -> Value {
    if let Some(object) = record.as_object_mut() {
        object.remove("id");
    }
    record
}

#[tokio::test]
async fn http_food_log_shows_up_first_in_timeline() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = get_logs(&client, &server.base_url).await;

    let response = client
        .post(format!("{}/api/food", server.base_url))
        .json(&json!({ "type": "kibble", "quantity": "1 cup", "stolen": true, "location": "kitchen" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let after: LogsResponse = response.json().await.unwrap();
    assert_eq!(after.food_logs.len(), before.food_logs.len() + 1);

    let timeline: Vec<Value> = client
        .get(format!("{}/api/timeline", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(timeline.len(), after.food_logs.len() + after.bathroom_logs.len());
    assert_eq!(timeline[0]["logType"], "food");
    assert_eq!(timeline[0]["type"], "kibble");
    assert_eq!(timeline[0]["stolen"], true);

    let stamps: Vec<i64> = timeline
        .iter()
        .map(|item| item["timestamp"].as_i64().unwrap_or(0))
        .collect();
    assert!(stamps.windows(2).all(|pair| pair[0] >= pair[1]));

    let page = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Food: Kibble - 1 cup"));
}

#[tokio::test]
async fn http_bathroom_entry_can_be_edited_and_deleted() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let created: LogsResponse = client
        .post(format!("{}/api/bathroom", server.base_url))
        .json(&json!({ "type": "pee", "location": "outside", "size": "small", "consistency": "normal" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let entry = created.bathroom_logs[0].clone();
    let id = entry["id"].as_str().unwrap().to_string();

    let updated: LogsResponse = client
        .put(format!("{}/api/bathroom/{id}", server.base_url))
        .json(&json!({ "type": "poop", "location": "park", "size": "big", "consistency": "soft" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let edited = updated
        .bathroom_logs
        .iter()
        .find(|log| log["id"] == id.as_str())
        .unwrap();
    assert_eq!(edited["type"], "poop");
    assert_eq!(edited["location"], "park");
    assert_eq!(edited["timestamp"], entry["timestamp"]);

    let response = client
        .delete(format!("{}/api/bathroom/{id}", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let response = client
        .delete(format!("{}/api/bathroom/{id}", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_invalid_food_is_rejected() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/food", server.base_url))
        .json(&json!({ "type": "  ", "quantity": "1 cup" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap(), "type is required");

    let response = client
        .post(format!("{}/api/bathroom", server.base_url))
        .json(&json!({ "type": "pee", "location": "outside", "consistency": "normal" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap(), "size is required");
}

#[tokio::test]
async fn http_favorites_are_replaced_and_autofill() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    client
        .put(format!("{}/api/favorites", server.base_url))
        .json(&json!([{ "name": "Old" }]))
        .send()
        .await
        .unwrap();

    let saved: Vec<Value> = client
        .put(format!("{}/api/favorites", server.base_url))
        .json(&json!([
            { "name": "Morning", "type": "pee", "location": "outside", "size": "small", "consistency": "normal" },
            { "name": "Evening", "label": "Evening walk", "type": "poop", "location": "inside", "size": "big", "consistency": "sick" }
        ]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let listed: Vec<Value> = client
        .get(format!("{}/api/favorites", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed, saved);
    let names: Vec<&str> = listed.iter().map(|fav| fav["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Morning", "Evening"]);

    let id = listed[0]["id"].as_str().unwrap();
    let selections: Vec<Value> = client
        .get(format!("{}/api/favorites/{id}/autofill", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        selections,
        vec![
            json!({ "field": "type", "value": "pee" }),
            json!({ "field": "location", "value": "outside" }),
            json!({ "field": "size", "value": "small" }),
            json!({ "field": "consistency", "value": "normal" }),
        ]
    );
}

#[tokio::test]
async fn http_json_export_imports_into_a_new_server() {
    let source = spawn_server().await;
    let client = Client::new();

    client
        .post(format!("{}/api/food", source.base_url))
        .json(&json!({ "type": "treat", "quantity": "2", "stolen": false, "location": "" }))
        .send()
        .await
        .unwrap();
    client
        .post(format!("{}/api/bathroom", source.base_url))
        .json(&json!({ "type": "poop", "location": "outside", "size": "big", "consistency": "normal" }))
        .send()
        .await
        .unwrap();

    let export = client
        .get(format!("{}/api/export?format=json", source.base_url))
        .send()
        .await
        .unwrap();
    let disposition = export.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains("molly-logs-"));
    assert!(disposition.contains(".json"));
    let body = export.text().await.unwrap();

    let target = spawn_server().await;
    let response = client
        .post(format!("{}/api/import?file_name=molly-logs.json", target.base_url))
        .body(body)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let before = get_logs(&client, &source.base_url).await;
    let after = get_logs(&client, &target.base_url).await;
    let strip = |logs: Vec<Value>| logs.into_iter().map(without_id).collect::<Vec<_>>();
    assert_eq!(strip(after.food_logs), strip(before.food_logs));
    assert_eq!(strip(after.bathroom_logs), strip(before.bathroom_logs));
}

#[tokio::test]
async fn http_csv_export_and_bad_imports() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let csv = client
        .get(format!("{}/api/export?format=csv", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(csv.starts_with("Type,Details,Timestamp"));

    let response = client
        .post(format!("{}/api/import?file_name=logs.csv", server.base_url))
        .body("Date,Amount\n1,2")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/api/import?file_name=logs.json", server.base_url))
        .body(r#"{"foodLogs": []}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap(), "Invalid JSON format.");

    let response = client
        .get(format!("{}/api/export?format=xlsx", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
