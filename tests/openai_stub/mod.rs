use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde_json::Value;

pub const STUB_DRAFT_TEXT: &str = "这是由测试桩生成的章节正文。";

pub struct OpenAiStub {
    pub base_url: String,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl OpenAiStub {
    pub fn spawn() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start openai stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}/v1");

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let path = request.url().to_string();
                if request.method() != &tiny_http::Method::Post {
                    let _ = request.respond(
                        tiny_http::Response::from_string("not found").with_status_code(404),
                    );
                    continue;
                }

                let mut body = String::new();
                if request.as_reader().read_to_string(&mut body).is_err() {
                    let _ = request.respond(
                        tiny_http::Response::from_string("invalid request body")
                            .with_status_code(400),
                    );
                    continue;
                }

                let parsed: Value = match serde_json::from_str(&body) {
                    Ok(value) => value,
                    Err(_) => {
                        let _ = request.respond(
                            tiny_http::Response::from_string("invalid json").with_status_code(400),
                        );
                        continue;
                    }
                };

                let response_body = match path.as_str() {
                    "/v1/responses" => {
                        let Some(prompt) = parsed.get("input").and_then(|v| v.as_str()) else {
                            let _ = request.respond(
                                tiny_http::Response::from_string("missing input")
                                    .with_status_code(400),
                            );
                            continue;
                        };
                        responses_body(&parsed, &generated_text(prompt))
                    }
                    "/v1/embeddings" => {
                        let count = parsed
                            .get("input")
                            .and_then(|v| v.as_array())
                            .map(|items| items.len())
                            .unwrap_or(0);
                        embeddings_body(count)
                    }
                    _ => {
                        let _ = request.respond(
                            tiny_http::Response::from_string("not found").with_status_code(404),
                        );
                        continue;
                    }
                };

                let mut response = tiny_http::Response::from_string(response_body.to_string())
                    .with_status_code(200);
                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("build header");
                response = response.with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }
}

impl Drop for OpenAiStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Routes by distinctive template phrases so one stub serves every
/// pipeline step.
fn generated_text(prompt: &str) -> String {
    if prompt.contains("必须严格使用以下两行前缀") {
        return "短期摘要: 剧情推进到电台。\n下一章关键字: 电台, 密码".to_owned();
    }
    if prompt.contains("请审校下面的章节文本") {
        return "无明显冲突".to_owned();
    }
    if prompt.contains("更新后的完整全局摘要") {
        return "桩：更新后的全局摘要。".to_owned();
    }
    if prompt.contains("更新后的完整角色状态文档") {
        return "桩：更新后的角色状态。".to_owned();
    }
    if prompt.contains("扩写后的完整正文") {
        return "桩：扩写后的章节正文。".to_owned();
    }
    STUB_DRAFT_TEXT.to_owned()
}

fn responses_body(request: &Value, output_text: &str) -> Value {
    serde_json::json!({
        "id": "resp_stub",
        "object": "response",
        "model": request.get("model").cloned().unwrap_or(Value::String("stub-model".to_owned())),
        "output": [
            {
                "type": "message",
                "role": "assistant",
                "content": [
                    { "type": "output_text", "text": output_text }
                ]
            }
        ],
        "output_text": output_text
    })
}

fn embeddings_body(count: usize) -> Value {
    let data: Vec<Value> = (0..count)
        .map(|idx| {
            serde_json::json!({
                "object": "embedding",
                "index": idx,
                "embedding": [0.1, 0.2, 0.3]
            })
        })
        .collect();
    serde_json::json!({ "object": "list", "data": data })
}
