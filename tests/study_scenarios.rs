mod common;

use common::{study, FakeProvider};
use shloka::backend::SourceLanguage;
use shloka::policy::{templated_explanation, Mode};

#[test]
fn verse_prompt_in_free_mode_finds_gita_2_47() {
    let free = FakeProvider::translating("en");
    let paid = FakeProvider::translating("paid");
    let response = study(&free, &paid).study("कर्मण्येवाधिकारस्ते", "gita", "en", Some(Mode::Free));

    assert_eq!(response.found_local.len(), 1);
    let hit = &response.found_local[0];
    assert_eq!(hit.id, "gita_2_47");
    assert!(!hit.translation.is_empty());
    assert!(hit.translation_error.is_none());
    assert!(response.heuristic_matches.is_empty());
    assert_eq!(response.explanation, templated_explanation("en:कर्मण्येवाधिकारस्ते", "en"));
    assert_eq!(paid.total_calls(), 0);
}

#[test]
fn unknown_prompt_falls_back_to_category() {
    let free = FakeProvider::translating("hi");
    let paid = FakeProvider::translating("paid");
    let response = study(&free, &paid).study("nonexistent text", "veda", "hi", Some(Mode::Auto));

    assert!(response.found_local.is_empty());
    assert!(!response.heuristic_matches.is_empty());
    assert!(response.heuristic_matches.iter().all(|r| r.book.contains("veda")));
    assert_eq!(response.heuristic_matches.len(), 3);
    // heuristic matches are not translated; the only call is for the explanation
    assert_eq!(free.translate_calls(), 1);
}

#[test]
fn failed_translations_keep_the_record() {
    let free = FakeProvider::failing();
    let paid = FakeProvider::unconfigured();
    let response = study(&free, &paid).study("Bhagavad Gita", "gita", "en", None);

    let ids: Vec<&str> = response.found_local.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["gita_2_47", "gita_4_7"]);
    for hit in &response.found_local {
        assert_eq!(hit.translation, hit.sanskrit);
        assert_eq!(hit.translation_error.as_deref(), Some("provider_unconfigured"));
    }
}

#[test]
fn empty_prompt_has_no_direct_matches_and_empty_explanation() {
    let free = FakeProvider::translating("en");
    let paid = FakeProvider::translating("paid");
    let response = study(&free, &paid).study("", "upanishad", "en", None);
    assert!(response.found_local.is_empty());
    assert_eq!(response.heuristic_matches.len(), 1);
    assert_eq!(response.heuristic_matches[0].id, "isha_upanishad_1");
    assert_eq!(response.explanation, "");
    assert_eq!(free.total_calls() + paid.total_calls(), 0);
}

#[test]
fn repeated_study_is_stable() {
    let free = FakeProvider::translating("en");
    let paid = FakeProvider::translating("paid");
    let service = study(&free, &paid);
    let first = service.study("rigveda", "veda", "en", None);
    let second = service.study("rigveda", "veda", "en", None);
    assert_eq!(first.found_local, second.found_local);
    assert_eq!(first.heuristic_matches, second.heuristic_matches);
    assert_eq!(first.found_local.len(), 2);
}

#[test]
fn response_serializes_with_contract_field_names() {
    let free = FakeProvider::translating("en");
    let paid = FakeProvider::translating("paid");
    let response = study(&free, &paid).study("Gita 4.7", "gita", "en", None);
    let json = serde_json::to_value(&response).unwrap();
    for field in ["scripture", "prompt", "found_local", "heuristic_matches", "explanation"] {
        assert!(json.get(field).is_some(), "missing {field}");
    }
    assert!(json.get("session_id").is_none());
    let hit = &json["found_local"][0];
    for field in ["id", "sanskrit", "source", "translation"] {
        assert!(hit.get(field).is_some(), "missing found_local.{field}");
    }
}

#[test]
fn verses_are_sent_as_sanskrit_and_prompts_are_detected() {
    let free = FakeProvider::translating("en");
    let paid = FakeProvider::unconfigured();
    // the prompt is user text even when it quotes a verse
    let response = study(&free, &paid).study("कर्मण्येवाधिकारस्ते", "gita", "en", Some(Mode::Free));

    assert_eq!(response.found_local[0].id, "gita_2_47");
    assert_eq!(free.sources(), vec![SourceLanguage::Sanskrit, SourceLanguage::Detect]);
}
