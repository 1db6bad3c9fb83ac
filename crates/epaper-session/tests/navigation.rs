mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use epaper_config::EpaperConfig;
use epaper_ir::protocol::LinkTarget;
use epaper_ir::{Chapter, DocumentDescriptor};
use epaper_scene::NodeKind;
use epaper_session::{SessionError, SessionState};

use common::{Call, descriptor, harness, harness_with, page_message};

#[tokio::test]
async fn drill_down_then_pop_back() {
    let mut h = harness();
    let d1 = h.viewer.open(descriptor("d1")).await.unwrap();
    let d2 = h.viewer.push(descriptor("d2")).await.unwrap();
    let d3 = h.viewer.push(descriptor("d3")).await.unwrap();
    assert_eq!(h.viewer.stack().len(), 3);
    assert_eq!(h.viewer.stack().get(d1).unwrap().state(), SessionState::Background);

    let closed = h.viewer.pop(2).await;

    assert_eq!(closed, vec![d3]);
    let keys: Vec<_> = h.viewer.stack().iter().map(|s| s.key()).collect();
    assert_eq!(keys, vec![d1, d2]);
    assert_eq!(h.viewer.top().unwrap().state(), SessionState::Active);
    assert!(!h.viewer.router().is_registered(&"3".to_string()));
    assert!(h.viewer.router().is_registered(&"2".to_string()));
    assert_eq!(h.channel.closed(), vec!["3".to_string()]);
}

#[tokio::test]
async fn pop_closes_top_down() {
    let mut h = harness();
    let d1 = h.viewer.open(descriptor("d1")).await.unwrap();
    let d2 = h.viewer.push(descriptor("d2")).await.unwrap();
    let d3 = h.viewer.push(descriptor("d3")).await.unwrap();

    assert_eq!(h.viewer.pop(1).await, vec![d3, d2]);
    assert_eq!(h.viewer.top().unwrap().key(), d1);
    assert_eq!(h.channel.closed(), vec!["3".to_string(), "2".to_string()]);

    assert_eq!(h.viewer.close_all().await, vec![d1]);
    assert!(h.viewer.stack().is_empty());
    assert!(h.viewer.router().is_empty());
}

#[tokio::test]
async fn sixth_document_is_refused_without_requests() {
    let mut h = harness();
    h.viewer.open(descriptor("root")).await.unwrap();
    for depth in 1..5 {
        h.viewer.push(descriptor(&format!("child{depth}"))).await.unwrap();
    }
    assert_eq!(h.viewer.stack().len(), 5);
    let top = h.viewer.top().unwrap().key();
    h.channel.clear_calls();

    let err = h.viewer.push(descriptor("one-too-many")).await.unwrap_err();

    assert!(matches!(err, SessionError::DepthLimit { max: 5 }));
    assert!(h.channel.calls().is_empty());
    assert_eq!(h.viewer.stack().len(), 5);
    assert_eq!(h.viewer.top().unwrap().key(), top);
    assert_eq!(h.viewer.top().unwrap().state(), SessionState::Active);
    assert!(h.overlay.errors().is_empty());
}

#[tokio::test]
async fn failed_open_keeps_previous_top() {
    let mut h = harness();
    let root = h.viewer.open(descriptor("root")).await.unwrap();
    h.channel.script().fail_open = true;

    let err = h.viewer.push(descriptor("child")).await.unwrap_err();

    assert!(matches!(err, SessionError::Server(_)));
    assert_eq!(h.viewer.stack().len(), 1);
    assert_eq!(h.viewer.top().unwrap().key(), root);
    assert_eq!(h.viewer.top().unwrap().state(), SessionState::Active);
    assert_eq!(h.overlay.errors().len(), 1);
    assert!(h.overlay.errors()[0].contains("template not found"));
}

#[tokio::test]
async fn failed_first_load_closes_the_new_document() {
    let mut h = harness();
    let root = h.viewer.open(descriptor("root")).await.unwrap();
    h.channel.script().fail_load = true;

    assert!(h.viewer.push(descriptor("child")).await.is_err());

    assert_eq!(h.viewer.stack().len(), 1);
    assert_eq!(h.viewer.top().unwrap().key(), root);
    assert!(!h.viewer.router().is_registered(&"2".to_string()));
    assert_eq!(h.channel.closed(), vec!["2".to_string()]);
}

#[tokio::test]
async fn open_replaces_the_whole_stack() {
    let mut h = harness();
    h.viewer.open(descriptor("a")).await.unwrap();
    h.viewer.push(descriptor("b")).await.unwrap();

    h.viewer.open(descriptor("c")).await.unwrap();

    assert_eq!(h.viewer.stack().len(), 1);
    assert_eq!(h.viewer.top().unwrap().title(), "c");
    assert_eq!(h.channel.closed(), vec!["2".to_string(), "1".to_string()]);
    assert_eq!(h.viewer.router().len(), 1);
}

#[tokio::test]
async fn following_a_link_pushes_the_target() {
    let mut h = harness();
    let mut root = descriptor("statement");
    root.chapters[0].params = Some(serde_json::json!({ "year": 2016 }));
    h.viewer.open(root).await.unwrap();
    h.viewer.handle_push(&"1".to_string(), &page_message(&["7110001"])).unwrap();
    h.channel.script().link = Some(LinkTarget {
        handler: None,
        template: Some("default/ledger".into()),
        path: "ledger/${link}?year=${year}".into(),
        title: "Account ${link}".into(),
    });

    let rendered = h.viewer.top().unwrap().rendered.as_ref().unwrap();
    let text_node = rendered
        .tree
        .descendants(rendered.layers.content)
        .into_iter()
        .find(|&id| matches!(rendered.tree.node(id).map(|n| &n.kind), Some(NodeKind::Text { .. })))
        .unwrap();

    let pushed = h.viewer.follow_link(text_node, 10.0, 14.0).await.unwrap();

    assert!(pushed.is_some());
    assert_eq!(h.viewer.stack().len(), 2);
    assert_eq!(h.viewer.top().unwrap().title(), "Account 7110001");
    assert!(h.channel.calls().contains(&Call::Open {
        template: "default/ledger".into(),
        path: "ledger/7110001?year=2016".into(),
    }));
}

#[tokio::test]
async fn clicking_outside_links_does_nothing() {
    let mut h = harness();
    h.viewer.open(descriptor("statement")).await.unwrap();
    h.viewer.handle_push(&"1".to_string(), &page_message(&["x"])).unwrap();
    let band_layer = h.viewer.top().unwrap().rendered.as_ref().unwrap().layers.bands;
    h.channel.clear_calls();

    assert_eq!(h.viewer.follow_link(band_layer, 0.0, 0.0).await.unwrap(), None);
    assert!(h.channel.calls().is_empty());
}

fn chaptered() -> DocumentDescriptor {
    let mut shared = Chapter::new("default/ledger", "ledger/2016");
    shared.locale = "en_GB".into();
    let mut same = Chapter::new("default/ledger", "ledger/2017");
    same.locale = "en_GB".into();
    let other = Chapter::new("default/summary", "summary/2017");
    DocumentDescriptor {
        title: "Ledgers".into(),
        chapters: vec![shared, same, other],
        page_count: Some(2),
        epaper2: false,
    }
}

#[tokio::test]
async fn same_template_chapter_is_only_reloaded() {
    let mut h = harness();
    let key = h.viewer.open(chaptered()).await.unwrap();
    h.channel.clear_calls();

    h.viewer.goto_chapter(1, 1).await.unwrap();

    assert_eq!(
        h.channel.calls(),
        vec![Call::Load {
            id: "1".into(),
            page: 1
        }]
    );
    let session = h.viewer.stack().get(key).unwrap();
    assert_eq!(session.chapter_index, 1);
    assert_eq!(session.server_id.as_deref(), Some("1"));
}

#[tokio::test]
async fn other_template_chapter_reopens() {
    let mut h = harness();
    let key = h.viewer.open(chaptered()).await.unwrap();
    h.channel.clear_calls();

    h.viewer.goto_chapter(2, 2).await.unwrap();

    assert_eq!(
        h.channel.calls(),
        vec![
            Call::Open {
                template: "default/summary".into(),
                path: "summary/2017".into()
            },
            Call::Close("1".into()),
            Call::Load {
                id: "2".into(),
                page: 2
            },
        ]
    );
    let session = h.viewer.stack().get(key).unwrap();
    assert_eq!(session.chapter_index, 2);
    assert_eq!(session.chapter_page, 2);
    assert_eq!(session.state(), SessionState::Active);
    assert!(h.viewer.router().is_registered(&"2".to_string()));
    assert!(!h.viewer.router().is_registered(&"1".to_string()));
}

#[tokio::test]
async fn close_previous_flag_forces_reopen() {
    let mut h = harness();
    let mut descriptor = chaptered();
    descriptor.chapters[1].close_previous = true;
    h.viewer.open(descriptor).await.unwrap();
    h.channel.clear_calls();

    h.viewer.goto_chapter(1, 1).await.unwrap();

    assert_eq!(h.channel.opens(), 1);
    assert_eq!(h.channel.closed(), vec!["1".to_string()]);
}

#[tokio::test]
async fn failed_reopen_keeps_the_current_chapter() {
    let mut h = harness();
    let key = h.viewer.open(chaptered()).await.unwrap();
    h.channel.script().fail_open = true;

    assert!(h.viewer.goto_chapter(2, 1).await.is_err());

    let session = h.viewer.stack().get(key).unwrap();
    assert_eq!(session.chapter_index, 0);
    assert_eq!(session.server_id.as_deref(), Some("1"));
    assert!(h.viewer.router().is_registered(&"1".to_string()));
    assert!(h.channel.closed().is_empty());
}

#[tokio::test]
async fn paging_crosses_chapters_and_clamps() {
    let mut h = harness();
    h.viewer.open(chaptered()).await.unwrap();
    assert_eq!(h.viewer.top().unwrap().total_page_count(), 6);
    assert!(!h.viewer.previous_page().await.unwrap());
    h.channel.clear_calls();

    assert!(h.viewer.next_page().await.unwrap());
    assert_eq!(
        h.channel.calls(),
        vec![Call::GotoPage {
            id: "1".into(),
            page: 2
        }]
    );

    assert!(h.viewer.next_page().await.unwrap());
    let top = h.viewer.top().unwrap();
    assert_eq!(top.chapter_index, 1);
    assert_eq!(top.page_number(), 3);

    h.viewer.goto_page(6).await.unwrap();
    assert_eq!(h.viewer.top().unwrap().page_number(), 6);
    assert!(!h.viewer.next_page().await.unwrap());

    let err = h.viewer.goto_page(7).await.unwrap_err();
    assert!(matches!(err, SessionError::PageOutOfRange(7)));
}

#[tokio::test]
async fn zoom_is_bounded() {
    let mut h = harness();
    assert_eq!(h.viewer.page_size(), None);
    h.viewer.open(descriptor("doc")).await.unwrap();
    assert_eq!(h.viewer.page_size(), Some((595.0, 842.0)));

    for _ in 0..20 {
        h.viewer.zoom_in();
    }
    let max = h.viewer.zoom();
    assert!(max >= 3.0 && max < 3.0 * 1.2);
    assert_eq!(h.viewer.zoom_in(), max);

    for _ in 0..20 {
        h.viewer.zoom_out();
    }
    let min = h.viewer.zoom();
    assert!(min <= 0.5 && min > 0.5 * 0.8);

    let (width, height) = h.viewer.page_size().unwrap();
    assert!((width - 595.0 * min).abs() < 1e-9);
    assert!((height - 842.0 * min).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn keep_alive_timers_do_not_stack() {
    let mut config = EpaperConfig::default();
    config.session.keep_alive_secs = 30;
    let mut h = harness_with(config);

    h.viewer.open(descriptor("root")).await.unwrap();
    h.viewer.push(descriptor("child")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(95)).await;
    assert_eq!(h.channel.pings.load(Ordering::SeqCst), 3);

    h.viewer.close_all().await;
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.channel.pings.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn missing_channel_is_reported() {
    let mut h = harness();
    let mut descriptor = descriptor("new-generation");
    descriptor.epaper2 = true;

    let err = h.viewer.open(descriptor).await.unwrap_err();

    assert!(matches!(err, SessionError::NoChannel(_)));
    assert!(h.viewer.stack().is_empty());
}

#[tokio::test]
async fn open_without_chapters_keeps_the_stack() {
    let mut h = harness();
    h.viewer.open(descriptor("d1")).await.unwrap();
    h.viewer.push(descriptor("d2")).await.unwrap();
    h.channel.clear_calls();
    let empty = DocumentDescriptor {
        title: "empty".into(),
        chapters: Vec::new(),
        page_count: None,
        epaper2: false,
    };

    let err = h.viewer.open(empty).await.unwrap_err();

    assert!(matches!(err, SessionError::NoChapter(0)));
    assert_eq!(h.viewer.stack().len(), 2);
    assert_eq!(h.viewer.router().len(), 2);
    assert_eq!(h.viewer.top().unwrap().state(), SessionState::Active);
    assert!(h.channel.calls().is_empty());
    assert_eq!(h.overlay.errors().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn popping_everything_stops_keep_alive() {
    let mut config = EpaperConfig::default();
    config.session.keep_alive_secs = 30;
    let mut h = harness_with(config);

    h.viewer.open(descriptor("root")).await.unwrap();
    h.viewer.push(descriptor("child")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(35)).await;
    assert_eq!(h.channel.pings.load(Ordering::SeqCst), 1);

    h.viewer.pop(1).await;
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(h.channel.pings.load(Ordering::SeqCst), 2);

    h.viewer.pop(0).await;
    tokio::time::sleep(Duration::from_secs(90)).await;
    assert_eq!(h.channel.pings.load(Ordering::SeqCst), 2);
}
