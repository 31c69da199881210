use llmfilter::host;
use llmfilter::prelude::*;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => panic!("test record must be an object"),
    }
}

fn topic_config() -> FilterConfig {
    FilterConfig::from_settings([
        ("prompt", "Tell me the main topic."),
        ("input_field", "message"),
        ("output_field", "llm_output"),
        ("timeout", "1"),
    ])
    .unwrap()
}

fn canned(reply: &'static str) -> FunctionGenerator {
    FunctionGenerator::new("canned", move |_req: GenerationRequest| async move {
        Ok(reply.to_string())
    })
}

#[tokio::test]
async fn enriches_record_with_generated_text() {
    let filter = LlmFilter::builder(topic_config(), canned("LLM response: Processed 53 characters"))
        .layer(LoggingLayer::new())
        .finish();

    let (status, out) = host::filter_record(
        &filter,
        record(json!({"message": "AI and machine learning are transforming industries."})),
    )
    .await;

    assert_eq!(status, FilterStatus::Modified(OutcomeKind::Success));
    assert_eq!(
        Value::Object(out),
        json!({
            "message": "AI and machine learning are transforming industries.",
            "llm_output": "LLM response: Processed 53 characters",
        })
    );
}

#[tokio::test]
async fn record_without_input_field_is_untouched() {
    let filter = LlmFilter::builder(topic_config(), canned("unused")).finish();
    let input = record(json!({"other_field": "No message here"}));

    let (status, out) = host::filter_record(&filter, input.clone()).await;

    assert_eq!(status, FilterStatus::Unmodified);
    assert_eq!(out, input);
}

#[tokio::test]
async fn hanging_backend_yields_timeout_marker() {
    let generator = FunctionGenerator::new("hang", |_req: GenerationRequest| async move {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok("too late".to_string())
    });
    let filter = LlmFilter::builder(topic_config(), generator).finish();

    let start = Instant::now();
    let (status, out) =
        host::filter_record(&filter, record(json!({"message": "Test timeout"}))).await;

    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(status, FilterStatus::Modified(OutcomeKind::Timeout));
    assert_eq!(out["llm_output"], "Error: LLM processing timed out");
    assert_eq!(out["message"], "Test timeout");
}

#[tokio::test]
async fn failing_backend_yields_error_marker() {
    let generator = FunctionGenerator::new("down", |_req: GenerationRequest| async move {
        Err(GenerationError::other("connection reset by peer"))
    });
    let filter = LlmFilter::builder(topic_config(), generator).finish();

    let (status, out) = host::filter_record(&filter, record(json!({"message": "hello"}))).await;

    assert_eq!(status, FilterStatus::Modified(OutcomeKind::DomainError));
    assert_eq!(out["llm_output"], "Error: connection reset by peer");
}

#[tokio::test]
async fn stream_survives_mixed_outcomes() {
    let generator = FunctionGenerator::new("mixed", |req: GenerationRequest| async move {
        match req.context.as_str() {
            "hang" => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
            "fail" => Err(GenerationError::other("bad gateway")),
            ctx => Ok(format!("{} chars", ctx.len())),
        }
    });
    let filter = LlmFilter::builder(topic_config(), generator).finish();

    let input = concat!(
        "{\"message\":\"hang\"}\n",
        "{\"message\":\"fail\"}\n",
        "[\"app.log\",1700000000,{\"message\":\"hello\"}]\n",
        "{\"message\":{\"code\":7}}\n",
    );
    let mut output = Vec::new();
    let stats = host::run(&filter, input.as_bytes(), &mut output, 2)
        .await
        .unwrap();

    let lines: Vec<Value> = std::str::from_utf8(&output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0]["llm_output"], "Error: LLM processing timed out");
    assert_eq!(lines[1]["llm_output"], "Error: bad gateway");
    assert_eq!(lines[2][2]["llm_output"], "5 chars");
    assert_eq!(lines[3]["llm_output"], "10 chars");
    assert_eq!(stats.timed_out, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.succeeded, 2);
}

#[tokio::test]
async fn invalid_options_abort_startup() {
    let err = llmfilter::connect([("prompt", "x"), ("options_json", "{not json")])
        .await
        .unwrap_err();

    assert!(matches!(err, ConfigError::InvalidOptions(_)));
}

#[tokio::test]
async fn missing_prompt_aborts_startup() {
    let err = llmfilter::connect([("model_name", "llama3.2")])
        .await
        .unwrap_err();

    assert!(matches!(err, ConfigError::MissingPrompt));
}

#[tokio::test]
async fn unreachable_backend_aborts_startup() {
    let err = llmfilter::connect([("prompt", "x"), ("api_url", "http://127.0.0.1:9")])
        .await
        .unwrap_err();

    assert!(matches!(err, ConfigError::Client { ref backend, .. } if backend == "ollama"));
}
