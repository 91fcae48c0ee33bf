use chrono::Utc;
use serde_json::{json, Value};

use super::*;

fn lockup(id: &str, accessibility: Option<&str>, thumb: Option<&str>) -> Value {
    let mut node = json!({
        "shortsLockupViewModel": {
            "onTap": {
                "innertubeCommand": {
                    "reelWatchEndpoint": { "videoId": id }
                }
            }
        }
    });
    let inner = &mut node["shortsLockupViewModel"];
    if let Some(text) = accessibility {
        inner["accessibilityText"] = json!(text);
    }
    if let Some(url) = thumb {
        inner["thumbnail"] = json!({ "sources": [{ "url": url }, { "url": "second" }] });
    }
    node
}

fn page(items: Vec<Value>) -> Value {
    json!({
        "contents": {
            "twoColumnBrowseResultsRenderer": {
                "tabs": [{
                    "tabRenderer": {
                        "content": {
                            "richGridRenderer": {
                                "contents": [{
                                    "richSectionRenderer": {
                                        "content": {
                                            "richShelfRenderer": {
                                                "contents": items
                                                    .into_iter()
                                                    .map(|item| json!({ "richItemRenderer": { "content": item } }))
                                                    .collect::<Vec<_>>()
                                            }
                                        }
                                    }
                                }]
                            }
                        }
                    }
                }]
            }
        }
    })
}

fn extractor() -> CandidateExtractor {
    CandidateExtractor::new(DEFAULT_MAX_DEPTH, Utc::now())
}

fn ids(candidates: &[Candidate]) -> Vec<&str> {
    candidates.iter().map(Candidate::external_id).collect()
}

#[test]
fn extracts_lockups_in_page_order() {
    let root = page(vec![
        lockup("CCCCCCCC", Some("Third, 1.2M views"), Some("https://i.ytimg.com/c.jpg")),
        lockup("AAAAAAAA", Some("First"), None),
        lockup("BBBBBBBB", None, None),
    ]);

    let candidates = extractor().extract(&root).unwrap();
    assert_eq!(ids(&candidates), ["CCCCCCCC", "AAAAAAAA", "BBBBBBBB"]);
    assert_eq!(candidates[0].title, "Third");
    assert_eq!(candidates[0].thumbnail_url, "https://i.ytimg.com/c.jpg");
    assert_eq!(candidates[1].title, "First");
    assert_eq!(candidates[1].thumbnail_url, "");
    assert_eq!(candidates[2].title, "short BBBBBBBB");
    assert!(candidates.iter().all(|c| c.rank.is_none()));
    assert!(candidates.iter().all(|c| c.duration_iso == "PT60S"));
}

#[test]
fn duplicate_ids_keep_first_occurrence() {
    let root = page(vec![
        lockup("AAAAAAAA", Some("Original"), None),
        lockup("BBBBBBBB", Some("Other"), None),
        lockup("AAAAAAAA", Some("Repeat"), None),
    ]);

    let candidates = extractor().extract(&root).unwrap();
    assert_eq!(ids(&candidates), ["AAAAAAAA", "BBBBBBBB"]);
    assert_eq!(candidates[0].title, "Original");
}

#[test]
fn malformed_ids_are_dropped() {
    let root = page(vec![
        lockup("abc", None, None),
        lockup("abcdefghijklmnopqrst", None, None),
        lockup("bad id!!", None, None),
        lockup("dQw4w9WgXcQ", None, None),
    ]);

    let candidates = extractor().extract(&root).unwrap();
    assert_eq!(ids(&candidates), ["dQw4w9WgXcQ"]);
}

#[test]
fn lockup_without_id_is_skipped() {
    let root = json!({
        "a": { "shortsLockupViewModel": { "accessibilityText": "no id here" } },
        "b": lockup("AAAAAAAA", None, None),
    });
    let candidates = extractor().extract(&root).unwrap();
    assert_eq!(ids(&candidates), ["AAAAAAAA"]);
}

#[test]
fn blank_accessibility_segment_falls_back_to_placeholder() {
    let root = page(vec![lockup("AAAAAAAA", Some(" , 10 views"), None)]);
    let candidates = extractor().extract(&root).unwrap();
    assert_eq!(candidates[0].title, "short AAAAAAAA");
    assert!(candidates[0].has_placeholder_title());
}

#[test]
fn nodes_beyond_depth_cap_are_not_visited() {
    let mut deep = lockup("AAAAAAAA", None, None);
    for _ in 0..5 {
        deep = json!({ "wrap": deep });
    }
    let root = json!({ "shallow": lockup("BBBBBBBB", None, None), "deep": deep });

    let capped = CandidateExtractor::new(3, Utc::now()).extract(&root).unwrap();
    assert_eq!(ids(&capped), ["BBBBBBBB"]);

    let uncapped = CandidateExtractor::new(10, Utc::now())
        .extract(&root)
        .unwrap();
    assert_eq!(ids(&uncapped), ["BBBBBBBB", "AAAAAAAA"]);
}

#[test]
fn arrays_do_not_count_toward_depth() {
    let root = json!({ "items": [[[[[[lockup("AAAAAAAA", None, None)]]]]]] });
    let candidates = CandidateExtractor::new(1, Utc::now()).extract(&root).unwrap();
    assert_eq!(ids(&candidates), ["AAAAAAAA"]);
}

#[test]
fn object_without_lockups_yields_nothing() {
    let candidates = extractor()
        .extract(&json!({ "contents": { "items": [] } }))
        .unwrap();
    assert!(candidates.is_empty());
}

#[test]
fn non_object_root_is_fatal() {
    for root in [json!([1, 2]), json!("html"), Value::Null] {
        let err = extractor().extract(&root).unwrap_err();
        assert!(matches!(err, ScraperError::NotAnObject { .. }));
    }
}

#[test]
fn same_shape_twice_yields_one_candidate() {
    let node = lockup("AAAAAAAA", Some("Title"), None);
    let root = json!({ "left": node.clone(), "right": [node] });
    let candidates = extractor().extract(&root).unwrap();
    assert_eq!(candidates.len(), 1);
}
