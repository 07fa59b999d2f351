mod common;

use std::fs;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tempfile::tempdir;
use tower::ServiceExt;

use worldscribe::daemon::{build_router, AppState};
use worldscribe::Worldscribe;

use common::{config_rooted_at, write_tables, write_world, ScriptedProvider};

fn make_app(root: &std::path::Path, provider: Arc<ScriptedProvider>, token: &str) -> axum::Router {
    let scribe = Worldscribe::with_provider(config_rooted_at(root), provider);
    build_router(AppState {
        scribe: Arc::new(scribe),
        token: token.to_string(),
    })
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn unknown_chapter_returns_error_payload() {
    let dir = tempdir().unwrap();
    write_world(&dir.path().join("data"));
    let provider = Arc::new(ScriptedProvider::new(&["never"], &[]));
    let app = make_app(dir.path(), provider.clone(), "");

    let (status, body) = get(&app, "/chapter_flow?chapter_number=42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        value.get("error").and_then(|v| v.as_str()),
        Some("chapter 42 does not exist")
    );
    assert!(provider.prompts().is_empty());
    assert!(!dir.path().join("chapters").exists());
}

#[tokio::test]
async fn negative_chapter_number_is_a_missing_chapter() {
    let dir = tempdir().unwrap();
    write_world(&dir.path().join("data"));
    let provider = Arc::new(ScriptedProvider::new(&["never"], &[]));
    let app = make_app(dir.path(), provider.clone(), "");

    let (status, body) = get(&app, "/chapter_flow?chapter_number=-1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        value.get("error").and_then(|v| v.as_str()),
        Some("chapter -1 does not exist")
    );
    assert!(provider.prompts().is_empty());
}

#[tokio::test]
async fn non_numeric_chapter_number_gets_json_error() {
    let dir = tempdir().unwrap();
    write_world(&dir.path().join("data"));
    let provider = Arc::new(ScriptedProvider::new(&[], &[]));
    let app = make_app(dir.path(), provider, "");

    let (status, body) = get(&app, "/chapter_prompt?chapter_number=first").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(value.get("error").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn streamed_chapter_is_saved_with_heading_and_summarized() {
    let dir = tempdir().unwrap();
    write_world(&dir.path().join("data"));
    let provider = Arc::new(ScriptedProvider::new(
        &["港口的风", "很冷。"],
        &["林远在港口对峙。"],
    ));
    let app = make_app(dir.path(), provider.clone(), "");

    let (status, body) = get(&app, "/chapter_flow?chapter_number=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "港口的风很冷。");

    let chapter = fs::read_to_string(dir.path().join("chapters/chapter_1.md")).unwrap();
    assert!(chapter.starts_with("# 第1章 裂隙"));
    assert_eq!(chapter, "# 第1章 裂隙\n\n港口的风很冷。");

    let log = fs::read_to_string(dir.path().join("data/storyline.md")).unwrap();
    assert_eq!(log, "## 第1章 裂隙\n林远在港口对峙。\n\n");

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].starts_with("# 第1章 裂隙"));
    assert!(prompts[1].ends_with("港口的风很冷。"));
}

#[tokio::test]
async fn sequential_requests_append_one_summary_each_in_order() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    let chapters = "chapter_id,chapter_title,chapter_goal,chapter_tone,notes\n\
1,裂隙,目标一,压抑,\n\
2,余波,目标二,平静,\n";
    write_tables(
        &data,
        common::FACTIONS,
        common::COUNTRIES,
        common::CHARACTERS,
        chapters,
        common::EVENTS,
        common::TIMELINE,
    );
    let provider = Arc::new(ScriptedProvider::new(&["正文"], &["摘要甲", "摘要乙"]));
    let app = make_app(dir.path(), provider, "");

    let (status, _) = get(&app, "/chapter_flow?chapter_number=2").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&app, "/chapter_flow?chapter_number=1").await;
    assert_eq!(status, StatusCode::OK);

    let log = fs::read_to_string(data.join("storyline.md")).unwrap();
    assert_eq!(log, "## 第2章 余波\n摘要甲\n\n## 第1章 裂隙\n摘要乙\n\n");
    assert!(dir.path().join("chapters/chapter_1.md").exists());
    assert!(dir.path().join("chapters/chapter_2.md").exists());
}

#[tokio::test]
async fn stage_description_follows_requested_chapter() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    write_world(&data);
    fs::write(data.join("story_overview.md"), "总纲").unwrap();
    fs::write(
        data.join("storyline.csv"),
        "start_chapter,end_chapter,description\n2,5,第二阶段\n1,1,开端\n",
    )
    .unwrap();
    let provider = Arc::new(ScriptedProvider::new(&["正文"], &["摘要"]));
    let app = make_app(dir.path(), provider.clone(), "");

    let (status, _) = get(&app, "/chapter_flow").await;
    assert_eq!(status, StatusCode::OK);

    let prompts = provider.prompts();
    assert!(prompts[0].starts_with("【总纲约束】\n总纲\n\n【阶段约束】\n开端\n\n# 第1章 裂隙"));
    assert!(prompts[1].contains("【阶段约束】\n开端"));
}

#[tokio::test]
async fn prompt_endpoint_and_auth() {
    let dir = tempdir().unwrap();
    write_world(&dir.path().join("data"));
    let provider = Arc::new(ScriptedProvider::new(&[], &[]));
    let app = make_app(dir.path(), provider, "token");

    let (status, _) = get(&app, "/chapter_prompt?chapter_number=1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/chapter_prompt?chapter_number=1")
                .header("authorization", "Bearer token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("# 第1章 裂隙"));
    assert!(text.contains("【本章事件】"));
}

#[tokio::test]
async fn missing_tables_are_a_server_error() {
    let dir = tempdir().unwrap();
    let provider = Arc::new(ScriptedProvider::new(&[], &[]));
    let app = make_app(dir.path(), provider, "");

    let (status, body) = get(&app, "/chapter_flow?chapter_number=1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("storage error"));
}

#[tokio::test]
async fn server_stops_on_shutdown_signal() {
    let dir = tempdir().unwrap();
    let provider = Arc::new(ScriptedProvider::new(&[], &[]));
    let scribe = Worldscribe::with_provider(config_rooted_at(dir.path()), provider);
    worldscribe::daemon::run_with_shutdown("127.0.0.1", 0, scribe, "", async {})
        .await
        .unwrap();
}
