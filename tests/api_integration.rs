//! Integration tests for the voice API
//!
//! Drives the full router on the offline backend.

mod common;

use std::io::Cursor;
use std::sync::Arc;

use axum::http::{header, StatusCode};
use serde_json::json;

use common::*;

async fn create_design_voice(app: &axum::Router, name: &str) -> TestResponse {
    let request = MultipartBody::new()
        .text("name", name)
        .text("source", "design")
        .text("description", "Narration voice")
        .text("voice_description", "warm storyteller, calm pace")
        .text("language", "en")
        .into_request("/voices/custom");
    send(app, request).await
}

async fn create_prompt(app: &axum::Router, model: &str) -> String {
    let request = MultipartBody::new()
        .file("reference_audio", "ref.wav", &wav_clip(5.0))
        .text("reference_text", "hello world")
        .text("model", model)
        .text("name", "demo")
        .into_request("/clone/prompt");
    let response = send(app, request).await;
    assert_eq!(response.status, StatusCode::OK);
    response.json()["prompt_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_and_languages() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = offline_app(dir.path());

    let health = send(&app, get("/")).await;
    assert_eq!(health.status, StatusCode::OK);
    let body = health.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "offline");
    assert_eq!(body["models"]["voice_design"], "1.7B-VoiceDesign");
    assert_eq!(body["models"]["preset_instruct"], "1.7B-CustomVoice");

    assert_eq!(send(&app, get("/health")).await.status, StatusCode::OK);

    let languages = send(&app, get("/languages")).await.json();
    assert_eq!(languages["count"], 10);
    assert_eq!(languages["languages"][0]["code"], "fr");
    assert_eq!(languages["languages"][0]["name"], "French");
}

#[tokio::test]
async fn test_preset_returns_wav() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = offline_app(dir.path());

    let request = MultipartBody::new()
        .text("text", "Bonjour tout le monde")
        .text("voice", "Serena")
        .text("language", "fr")
        .into_request("/preset");
    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), "audio/wav");
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        "attachment; filename=\"preset_serena.wav\""
    );
    let reader = hound::WavReader::new(Cursor::new(response.body)).unwrap();
    assert_eq!(reader.spec().sample_rate, 24_000);
    assert!(reader.duration() > 0);
}

#[tokio::test]
async fn test_design_and_validation_errors() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = offline_app(dir.path());

    let response = send(
        &app,
        post_json("/design", json!({"text": "Hello there", "language": "auto"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        "attachment; filename=\"voice_design.wav\""
    );

    let empty = send(&app, post_json("/design", json!({"text": "   "}))).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.json()["code"], "validation_error");

    let bad_language = send(
        &app,
        post_json("/design", json!({"text": "Hola", "language": "xx"})),
    )
    .await;
    assert_eq!(bad_language.status, StatusCode::BAD_REQUEST);
    assert!(bad_language.json()["message"]
        .as_str()
        .unwrap()
        .contains("unsupported language"));
}

/// Clone "demo-clone" from a 5 s clip on 0.6B, then use it from a fresh store
#[tokio::test]
async fn test_clone_voice_persists_and_loads_lazily() {
    let dir = tempfile::tempdir().unwrap();
    {
        let (app, _) = offline_app(dir.path());
        let request = MultipartBody::new()
            .text("name", "demo-clone")
            .text("source", "clone")
            .file("reference_audio", "ref.wav", &wav_clip(5.0))
            .text("reference_text", "hello world")
            .text("model", "0.6B")
            .text("language", "en")
            .into_request("/voices/custom");
        let response = send(&app, request).await;

        assert_eq!(response.status, StatusCode::CREATED);
        let body = response.json();
        assert_eq!(body["status"], "created");
        assert_eq!(body["voice"]["name"], "demo-clone");
        assert_eq!(body["voice"]["source"], "clone");
        assert_eq!(body["voice"]["model"], "0.6B");
    }

    assert!(dir.path().join("demo-clone").join("meta.json").is_file());
    assert!(dir.path().join("demo-clone").join("prompt.pt").is_file());

    // Restart: metadata is scanned, embedding stays on disk until first use
    let (app, state) = offline_app(dir.path());
    let details = send(&app, get("/voices/custom/demo-clone")).await.json();
    assert_eq!(details["model"], "0.6B");
    assert_eq!(details["loaded_in_memory"], false);
    assert!(details["file_size_bytes"].as_u64().unwrap() > 0);

    let request = MultipartBody::new()
        .text("text", "Testing the cloned voice")
        .text("voice", "demo-clone")
        .text("language", "en")
        .into_request("/preset");
    let response = send(&app, request).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        "attachment; filename=\"preset_demo-clone.wav\""
    );

    let details = send(&app, get("/voices/custom/demo-clone")).await.json();
    assert_eq!(details["loaded_in_memory"], true);
    assert_eq!(state.voices.loaded_count(), 1);

    let voices = send(&app, get("/voices")).await.json();
    assert_eq!(voices["native_count"], 9);
    assert_eq!(voices["custom_count"], 1);
    assert_eq!(voices["count"], 10);
    assert_eq!(voices["voices"][9]["type"], "custom");
}

/// A 45 s clip is rejected and nothing is cached
#[tokio::test]
async fn test_long_reference_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = offline_app(dir.path());

    let request = MultipartBody::new()
        .file("reference_audio", "long.wav", &wav_clip(45.0))
        .text("reference_text", "a very long reading")
        .text("model", "1.7B")
        .into_request("/clone/prompt");
    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["details"], "reference_audio");
    assert!(body["message"].as_str().unwrap().contains("too long"));
    assert!(state.prompts.is_empty());

    let listing = send(&app, get("/clone/prompts")).await.json();
    assert_eq!(listing["count"], 0);
}

#[tokio::test]
async fn test_unknown_voice_lists_alternatives() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = offline_app(dir.path());
    assert_eq!(create_design_voice(&app, "narrator").await.status, StatusCode::CREATED);

    let request = MultipartBody::new()
        .text("text", "Hello")
        .text("voice", "Unknown123")
        .into_request("/preset");
    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    let body = response.json();
    assert_eq!(body["code"], "not_found");
    let available: Vec<&str> = body["available"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(available.len(), 10);
    assert!(available.contains(&"Serena"));
    assert!(available.contains(&"narrator"));
    let mut sorted = available.clone();
    sorted.sort();
    assert_eq!(available, sorted);
}

#[tokio::test]
async fn test_custom_voice_refused_on_instruct_path() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = offline_app(dir.path());
    assert_eq!(create_design_voice(&app, "narrator").await.status, StatusCode::CREATED);

    let request = MultipartBody::new()
        .text("text", "Hello")
        .text("voice", "narrator")
        .text("instruct", "whispering")
        .into_request("/preset/instruct");
    let response = send(&app, request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["code"], "capability_mismatch");

    // Natives still work on the same route
    let request = MultipartBody::new()
        .text("text", "Hello")
        .text("voice", "Ryan")
        .text("instruct", "whispering")
        .into_request("/preset/instruct");
    assert_eq!(send(&app, request).await.status, StatusCode::OK);

    // Designed voices replay on the plain route
    let request = MultipartBody::new()
        .text("text", "Hello")
        .text("voice", "narrator")
        .into_request("/preset");
    assert_eq!(send(&app, request).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_leftover_voice_directory_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("narrator")).unwrap();
    let (app, _) = offline_app(dir.path());

    assert_eq!(send(&app, get("/voices/custom/narrator")).await.status, StatusCode::NOT_FOUND);
    assert_eq!(create_design_voice(&app, "narrator").await.status, StatusCode::CREATED);

    let details = send(&app, get("/voices/custom/narrator")).await;
    assert_eq!(details.status, StatusCode::OK);
    assert_eq!(details.json()["source"], "design");
    assert_eq!(send(&app, delete("/voices/custom/narrator")).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_preset_instruct_without_instruction() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = offline_app(dir.path());

    let request = MultipartBody::new()
        .text("text", "Bonjour")
        .text("voice", "Serena")
        .text("instruct", "")
        .into_request("/preset/instruct");
    let response = send(&app, request).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), "audio/wav");

    let request = MultipartBody::new()
        .text("text", "Bonjour")
        .text("voice", "Serena")
        .into_request("/preset/instruct");
    assert_eq!(send(&app, request).await.status, StatusCode::OK);

    assert!(state
        .backend
        .loaded_models()
        .contains(&qwen3_voice_api::engine::ModelKind::InstructVoice));
}

#[tokio::test]
async fn test_voice_deletion_rules() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = offline_app(dir.path());

    let native = send(&app, delete("/voices/custom/Serena")).await;
    assert_eq!(native.status, StatusCode::FORBIDDEN);
    assert_eq!(native.json()["code"], "forbidden");

    assert_eq!(send(&app, delete("/voices/custom/ghost")).await.status, StatusCode::NOT_FOUND);

    assert_eq!(create_design_voice(&app, "narrator").await.status, StatusCode::CREATED);
    let deleted = send(&app, delete("/voices/custom/narrator")).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.json()["status"], "deleted");
    assert!(!dir.path().join("narrator").exists());
    assert_eq!(send(&app, delete("/voices/custom/narrator")).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_and_duplicate_names() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = offline_app(dir.path());

    let too_long = "x".repeat(51);
    for name in ["ab", "Serena", "has space", too_long.as_str()] {
        let response = create_design_voice(&app, name).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "name {name:?}");
        assert_eq!(response.json()["details"], "name");
    }

    assert_eq!(create_design_voice(&app, "voix_yves-1").await.status, StatusCode::CREATED);
    let duplicate = create_design_voice(&app, "voix_yves-1").await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert!(duplicate.json()["message"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn test_failed_creation_leaves_no_trace() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = app_with_backend(dir.path(), Arc::new(FailingBackend));

    let response = create_design_voice(&app, "narrator").await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json();
    assert_eq!(body["code"], "backend_error");
    assert!(body["message"].as_str().unwrap().contains("CUDA out of memory"));

    assert!(state.voices.is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    assert_eq!(send(&app, get("/voices")).await.json()["custom_count"], 0);
}

#[tokio::test]
async fn test_prompt_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = offline_app(dir.path());
    let prompt_id = create_prompt(&app, "1.7B").await;

    let listing = send(&app, get("/clone/prompts")).await.json();
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["prompts"][0]["prompt_id"], prompt_id.as_str());
    assert_eq!(listing["prompts"][0]["name"], "demo");
    assert_eq!(listing["prompts"][0]["model"], "1.7B");
    assert!(listing["prompts"][0].get("payload").is_none());

    // Variant must match the prompt
    let request = MultipartBody::new()
        .text("text", "Hello again")
        .text("prompt_id", &prompt_id)
        .text("model", "0.6B")
        .into_request("/clone");
    let mismatch = send(&app, request).await;
    assert_eq!(mismatch.status, StatusCode::BAD_REQUEST);
    assert_eq!(mismatch.json()["code"], "capability_mismatch");

    let request = MultipartBody::new()
        .text("text", "Hello again")
        .text("prompt_id", &prompt_id)
        .text("model", "1.7B")
        .text("language", "en")
        .into_request("/clone");
    let response = send(&app, request).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), "audio/wav");

    let path = format!("/clone/prompts/{}", prompt_id);
    let deleted = send(&app, delete(&path)).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.json()["prompt_id"], prompt_id.as_str());
    assert_eq!(send(&app, delete(&path)).await.status, StatusCode::NOT_FOUND);

    let request = MultipartBody::new()
        .text("text", "Hello again")
        .text("prompt_id", &prompt_id)
        .into_request("/clone");
    assert_eq!(send(&app, request).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clone_from_reference_and_missing_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = offline_app(dir.path());

    let request = MultipartBody::new()
        .text("text", "Cloned sentence")
        .file("reference_audio", "ref.wav", &wav_clip(3.0))
        .text("reference_text", "hello world")
        .text("language", "en")
        .into_request("/clone");
    assert_eq!(send(&app, request).await.status, StatusCode::OK);

    let request = MultipartBody::new()
        .text("text", "Cloned sentence")
        .text("reference_text", "hello world")
        .into_request("/clone");
    let missing_audio = send(&app, request).await;
    assert_eq!(missing_audio.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing_audio.json()["details"], "reference_audio");

    let request = MultipartBody::new()
        .text("text", "Cloned sentence")
        .file("reference_audio", "short.wav", &wav_clip(0.5))
        .text("reference_text", "hi")
        .into_request("/clone");
    let short = send(&app, request).await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
    assert!(short.json()["message"].as_str().unwrap().contains("too short"));
}

#[tokio::test]
async fn test_x_vector_only_prompt_not_stored() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = offline_app(dir.path());

    let request = MultipartBody::new()
        .file("reference_audio", "ref.wav", &wav_clip(5.0))
        .text("reference_text", "hello world")
        .text("model", "0.6B")
        .text("x_vector_only", "true")
        .into_request("/clone/prompt");
    let response = send(&app, request).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["mode"], "x_vector_only");
    assert_eq!(body["model"], "0.6B");
    assert!((body["duration_seconds"].as_f64().unwrap() - 5.0).abs() < 0.01);
    assert!(!body["x_vector"].as_str().unwrap().is_empty());
    assert!(state.prompts.is_empty());
}

#[tokio::test]
async fn test_batch_preset_zip() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = offline_app(dir.path());

    let response = send(
        &app,
        post_json(
            "/batch/preset",
            json!({"texts": ["Bonjour", "Hello there", "Guten Tag"], "voice": "Serena", "language": "auto"}),
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), "application/zip");
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        "attachment; filename=\"batch_preset_serena.zip\""
    );

    let mut archive = zip::ZipArchive::new(Cursor::new(response.body)).unwrap();
    assert_eq!(archive.len(), 3);
    for (i, expected) in ["001.wav", "002.wav", "003.wav"].iter().enumerate() {
        assert_eq!(archive.by_index(i).unwrap().name(), *expected);
    }
}

#[tokio::test]
async fn test_batch_validation() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = offline_app(dir.path());

    let empty_text = send(
        &app,
        post_json("/batch/design", json!({"texts": ["One", "  ", "Three"]})),
    )
    .await;
    assert_eq!(empty_text.status, StatusCode::BAD_REQUEST);
    assert!(empty_text.json()["message"].as_str().unwrap().contains("text 2 is empty"));

    let texts: Vec<String> = (0..101).map(|i| format!("Text {}", i)).collect();
    let too_many = send(&app, post_json("/batch/preset", json!({ "texts": texts }))).await;
    assert_eq!(too_many.status, StatusCode::BAD_REQUEST);
    assert!(too_many.json()["message"].as_str().unwrap().contains("max: 100"));

    let design = send(
        &app,
        post_json("/batch/design", json!({"texts": ["One", "Two"], "voice_instruct": "deep voice"})),
    )
    .await;
    assert_eq!(design.status, StatusCode::OK);
    assert_eq!(
        design.header(header::CONTENT_DISPOSITION),
        "attachment; filename=\"batch_design.zip\""
    );
}

#[tokio::test]
async fn test_batch_clone() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = offline_app(dir.path());

    let request = MultipartBody::new()
        .text("texts", "First line\n\n  Second line  \n")
        .text("prompt_id", "missing")
        .into_request("/batch/clone");
    assert_eq!(send(&app, request).await.status, StatusCode::NOT_FOUND);

    let prompt_id = create_prompt(&app, "0.6B").await;

    let request = MultipartBody::new()
        .text("texts", "\n \n")
        .text("prompt_id", &prompt_id)
        .into_request("/batch/clone");
    assert_eq!(send(&app, request).await.status, StatusCode::BAD_REQUEST);

    let request = MultipartBody::new()
        .text("texts", "First line\n\n  Second line  \n")
        .text("prompt_id", &prompt_id)
        .text("language", "en")
        .into_request("/batch/clone");
    let response = send(&app, request).await;
    assert_eq!(response.status, StatusCode::OK);
    let archive = zip::ZipArchive::new(Cursor::new(response.body)).unwrap();
    assert_eq!(archive.len(), 2);
}

#[tokio::test]
async fn test_models_preload_and_status() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = offline_app(dir.path());

    let before = send(&app, get("/models/status")).await.json();
    assert_eq!(before["preset_voice_loaded"], false);
    assert_eq!(before["device"], "cpu");

    let preload = send(&app, post_empty("/models/preload?design=true&clone_0_6b=true")).await;
    assert_eq!(preload.status, StatusCode::OK);
    let body = preload.json();
    assert_eq!(body["status"], "success");
    assert_eq!(body["loaded"], json!(["1.7B-VoiceDesign", "0.6B-Base", "0.6B-CustomVoice"]));

    let after = send(&app, get("/models/status")).await.json();
    assert_eq!(after["voice_design_loaded"], true);
    assert_eq!(after["preset_voice_loaded"], true);
    assert_eq!(after["clone_0_6b_loaded"], true);
    assert_eq!(after["clone_1_7b_loaded"], false);
    assert_eq!(after["voice_clone_loaded"], true);
    assert_eq!(after["prompts_cached"], 0);
}

#[tokio::test]
async fn test_tokenizer_unconfigured_is_backend_error() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = offline_app(dir.path());

    let response = send(&app, post_json("/tokenizer/encode", json!({"text": "hello"}))).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["code"], "backend_error");
}

#[tokio::test]
async fn test_stats_and_request_id() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = offline_app(dir.path());

    let health = send(&app, get("/health")).await;
    assert!(health.headers.contains_key("x-request-id"));
    send(&app, get("/voices/custom/ghost")).await;

    let stats = send(&app, get("/api/v1/stats")).await.json();
    assert!(stats["total_requests"].as_u64().unwrap() >= 2);
    assert!(stats["failed_requests"].as_u64().unwrap() >= 1);

    // Keyed by route template, not by concrete path
    let endpoints = &stats["endpoints"];
    assert_eq!(endpoints["/health"]["requests"], 1);
    assert_eq!(endpoints["/voices/custom/:name"]["requests"], 1);
    assert!(endpoints["/voices/custom/:name"]["avg_time_ms"].as_f64().unwrap() >= 0.0);
    assert!(endpoints.get("/voices/custom/ghost").is_none());
}

#[tokio::test]
async fn test_mcp_docs_catalogue() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = offline_app(dir.path());
    assert_eq!(create_design_voice(&app, "narrator").await.status, StatusCode::CREATED);

    let response = send(&app, get("/mcp/docs")).await;
    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();

    let tools = body["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 8);
    let preset = tools.iter().find(|t| t["name"] == "tts_preset_voice").unwrap();
    assert_eq!(preset["parameters"][0]["name"], "text");
    assert_eq!(preset["parameters"][0]["required"], true);
    assert_eq!(preset["call_example"]["params"]["arguments"]["voice"], "Serena");

    assert_eq!(body["voices"]["native_count"], 9);
    assert_eq!(body["voices"]["custom_count"], 1);
    assert_eq!(body["voices"]["custom"][0]["name"], "narrator");
    assert_eq!(body["models"]["backend"], "offline");
    assert_eq!(body["models"]["custom_voices_count"], 1);
    assert_eq!(body["device"], "cpu");
}
