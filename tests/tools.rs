mod common;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::{FakeModel, FakeSounds, FakeSpeech, fixture, touch};
use narrator::tools::ToolRouter;
use serde_json::{Value, json};

fn b64(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

#[tokio::test]
async fn test_get_screenshot_reports_newest_two() {
    let fx = fixture(FakeModel::replying(vec![]), Default::default(), FakeSounds::empty());
    let router = ToolRouter::new(fx.narrator.clone());

    let empty = router.call("get_screenshot", &json!({})).await;
    assert!(!empty.is_error);
    assert_eq!(empty.first_text(), "No screenshots found");

    for (i, age) in [70, 60, 50, 40, 30, 20, 10].iter().enumerate() {
        touch(fx.dir.path(), &format!("shot_{}.png", i), *age);
    }

    let output = router.call("get_screenshot", &json!({})).await;
    assert_eq!(
        output.content,
        vec![
            "Found 2 screenshot(s)".to_string(),
            "Screenshot: shot_6.png".to_string(),
            "Screenshot: shot_5.png".to_string(),
        ]
    );

    // Retention keeps the newest five
    let remaining = std::fs::read_dir(fx.dir.path()).unwrap().count();
    assert_eq!(remaining, 5);
    assert!(!fx.dir.path().join("shot_0.png").exists());
    assert!(!fx.dir.path().join("shot_1.png").exists());
}

#[tokio::test]
async fn test_get_minecraft_input_tracks_previous_batch() {
    let fx = fixture(FakeModel::replying(vec![]), Default::default(), FakeSounds::empty());
    let router = ToolRouter::new(fx.narrator.clone());

    let first = router
        .call("get_minecraft_input", &json!({"minecraft_data": r#"{"hp":20}"#}))
        .await;
    assert_eq!(first.first_text(), "Minecraft data received\nFirst data: {\"hp\":20}");

    let second = router
        .call("get_minecraft_input", &json!({"minecraft_data": r#"{"hp":3}"#}))
        .await;
    assert_eq!(
        second.first_text(),
        "Minecraft data received\nPrevious: {\"hp\":20}\nCurrent: {\"hp\":3}"
    );

    let stored: Value =
        serde_json::from_str(&std::fs::read_to_string(fx.narrator.events_file()).unwrap()).unwrap();
    assert_eq!(stored, json!({"hp": 3}));

    let invalid = router
        .call("get_minecraft_input", &json!({"minecraft_data": "not json"}))
        .await;
    assert!(invalid.is_error);
    assert_eq!(invalid.first_text(), "Invalid JSON data");
}

#[tokio::test]
async fn test_describe_without_inputs_reports_no_data() {
    let fx = fixture(FakeModel::replying(vec![]), Default::default(), FakeSounds::empty());
    let router = ToolRouter::new(fx.narrator.clone());

    for tool in ["describe", "describe_for_narration"] {
        let output = router.call(tool, &json!({})).await;
        assert!(output.is_error);
        assert_eq!(
            output.first_text(),
            "No data available. Need screenshots or Minecraft data."
        );
    }
    assert_eq!(fx.model.call_count(), 0);
}

#[tokio::test]
async fn test_describe_sends_screenshots_oldest_first() {
    let fx = fixture(
        FakeModel::replying(vec!["A player digs straight down."]),
        Default::default(),
        FakeSounds::empty(),
    );
    touch(fx.dir.path(), "older.png", 20);
    touch(fx.dir.path(), "newer.png", 10);
    let router = ToolRouter::new(fx.narrator.clone());

    let output = router.call("describe", &json!({"image_count": 2})).await;
    assert!(!output.is_error);
    assert_eq!(output.first_text(), "A player digs straight down.");

    assert_eq!(fx.model.images(0), vec![b64("older.png"), b64("newer.png")]);
    assert!(fx.model.prompt(0).contains("first is"));
}

#[tokio::test]
async fn test_describe_uses_events_only() {
    let fx = fixture(
        FakeModel::replying(vec!["Steve fell in lava."]),
        Default::default(),
        FakeSounds::empty(),
    );
    touch(fx.dir.path(), "ignored.png", 5);
    let router = ToolRouter::new(fx.narrator.clone());

    router
        .call("get_minecraft_input", &json!({"minecraft_data": r#"[{"event_type":"death"}]"#}))
        .await;
    let output = router
        .call("describe", &json!({"image_count": 0, "include_minecraft": true}))
        .await;

    assert_eq!(output.first_text(), "Steve fell in lava.");
    assert!(fx.model.images(0).is_empty());
    assert!(fx.model.prompt(0).contains("death"));
}

#[tokio::test]
async fn test_describe_for_narration_attaches_sfx() {
    let fx = fixture(
        FakeModel::replying(vec![
            "```json\n{\"narration\": \"And he blows up his own house!\", \"sfx_keyword\": \"explosion\"}\n```",
        ]),
        Default::default(),
        FakeSounds::with_hit("Vine Boom"),
    );
    touch(fx.dir.path(), "only.png", 5);
    let router = ToolRouter::new(fx.narrator.clone());

    let output = router.call("describe_for_narration", &json!({"image_count": 1})).await;
    let result: Value = serde_json::from_str(output.first_text()).unwrap();

    assert_eq!(result["narration"], "And he blows up his own house!");
    assert_eq!(result["sfx"]["title"], "Vine Boom");
    assert_eq!(result["sfx"]["query"], "explosion");
    assert_eq!(
        fx.sounds.queries.lock().unwrap().as_slice(),
        &[("explosion".to_string(), 1)]
    );
}

#[tokio::test]
async fn test_describe_for_narration_survives_search_failure() {
    let fx = fixture(
        FakeModel::replying(vec!["What an incredible fail"]),
        Default::default(),
        FakeSounds::failing(),
    );
    touch(fx.dir.path(), "only.png", 5);
    let router = ToolRouter::new(fx.narrator.clone());

    let output = router.call("describe_for_narration", &json!({})).await;
    assert!(!output.is_error);

    let result: Value = serde_json::from_str(output.first_text()).unwrap();
    assert_eq!(result["narration"], "What an incredible fail");
    assert!(result["sfx"].is_null());
    // Plain text reply falls back to keyword rules
    assert_eq!(fx.sounds.queries.lock().unwrap()[0].0, "bruh");
}

#[tokio::test]
async fn test_narrate_and_summarize() {
    let fx = fixture(
        FakeModel::replying(vec!["Ladies and gentlemen, a dirt hut.", "One sentence to rule them all."]),
        Default::default(),
        FakeSounds::empty(),
    );
    let router = ToolRouter::new(fx.narrator.clone());

    let narration = router
        .call("narrate", &json!({"description": "A player builds a dirt hut"}))
        .await;
    assert_eq!(narration.first_text(), "Ladies and gentlemen, a dirt hut.");
    assert!(fx.model.prompt(0).contains("A player builds a dirt hut"));

    // A single narration comes back untouched without a model call
    let single = router
        .call("summarize_narrations", &json!({"narrations": ["Only this."]}))
        .await;
    assert_eq!(single.first_text(), "Only this.");
    assert_eq!(fx.model.call_count(), 1);

    let summary = router
        .call("summarize_narrations", &json!({"narrations": ["First.", "Second."]}))
        .await;
    assert_eq!(summary.first_text(), "One sentence to rule them all.");
    assert!(fx.model.prompt(1).contains("First."));
    assert!(fx.model.prompt(1).contains("Second."));

    let missing = router.call("narrate", &json!({})).await;
    assert!(missing.is_error);
    assert!(missing.first_text().contains("Missing required argument: description"));
}

#[tokio::test]
async fn test_tts_writes_into_storage_dir() {
    let fx = fixture(FakeModel::replying(vec![]), Default::default(), FakeSounds::empty());
    touch(fx.dir.path(), "a.mp3", 30);
    touch(fx.dir.path(), "b.mp3", 20);
    touch(fx.dir.path(), "c.mp3", 10);
    let router = ToolRouter::new(fx.narrator.clone());

    let output = router
        .call("tts", &json!({"text": "What a play!", "output_file": "clip.mp3"}))
        .await;
    assert!(!output.is_error);
    assert_eq!(output.first_text(), "Audio saved to clip.mp3");
    assert!(fx.dir.path().join("clip.mp3").exists());
    assert_eq!(fx.speech.spoken.lock().unwrap().as_slice(), &["What a play!".to_string()]);

    // Pruned to two before the new clip was written
    assert!(!fx.dir.path().join("a.mp3").exists());
    assert!(fx.dir.path().join("c.mp3").exists());

    let default_name = router.call("tts", &json!({"text": "Again"})).await;
    assert_eq!(default_name.first_text(), "Audio saved to narration.mp3");

    let escape = router
        .call("tts", &json!({"text": "x", "output_file": "../elsewhere.mp3"}))
        .await;
    assert!(escape.is_error);
}

#[tokio::test]
async fn test_tts_failure_is_error_output() {
    let fx = fixture(FakeModel::replying(vec![]), FakeSpeech::failing(), FakeSounds::empty());
    let router = ToolRouter::new(fx.narrator.clone());

    let output = router.call("tts", &json!({"text": "hello"})).await;
    assert!(output.is_error);
    assert!(output.first_text().starts_with("Error:"));
}

#[tokio::test]
async fn test_get_sfx() {
    let fx = fixture(FakeModel::replying(vec![]), Default::default(), FakeSounds::with_hit("Bruh"));
    let router = ToolRouter::new(fx.narrator.clone()).with_default_sfx_limit(4);

    let output = router.call("get_sfx", &json!({"query": "bruh"})).await;
    let hits: Value = serde_json::from_str(output.first_text()).unwrap();
    assert_eq!(hits[0]["title"], "Bruh");
    assert_eq!(fx.sounds.queries.lock().unwrap()[0], ("bruh".to_string(), 4));

    let fx = fixture(FakeModel::replying(vec![]), Default::default(), FakeSounds::empty());
    let router = ToolRouter::new(fx.narrator.clone());
    let none = router.call("get_sfx", &json!({"query": "nothing", "limit": 1})).await;
    assert!(!none.is_error);
    assert_eq!(none.first_text(), "No sound effects found for 'nothing'");

    let fx = fixture(FakeModel::replying(vec![]), Default::default(), FakeSounds::failing());
    let router = ToolRouter::new(fx.narrator.clone());
    let failed = router.call("get_sfx", &json!({"query": "boom"})).await;
    assert!(failed.is_error);
    assert!(failed.first_text().starts_with("Error searching sound effects:"));
}

#[tokio::test]
async fn test_unknown_tool() {
    let fx = fixture(FakeModel::replying(vec![]), Default::default(), FakeSounds::empty());
    let router = ToolRouter::new(fx.narrator.clone());

    let output = router.call("make_coffee", &json!({})).await;
    assert!(output.is_error);
    assert_eq!(output.first_text(), "Unknown tool: make_coffee");
}
