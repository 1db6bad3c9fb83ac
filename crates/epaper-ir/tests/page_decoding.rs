use anyhow::Result;
use epaper_ir::page::{BandKind, ElementKind, HAlign, ScaleMode, VAlign};
use epaper_ir::{Page, PushMessage};

const STATEMENT: &str = include_str!("fixtures/statement.json");

#[test]
fn decodes_statement_fixture() -> Result<()> {
    let page = Page::from_json_str(STATEMENT)?;

    assert_eq!(page.width(), 595.0);
    assert_eq!(page.properties.margin_left, 20.0);
    assert_eq!(page.bands.len(), 4);

    let kinds: Vec<BandKind> = page.bands.iter().map(|band| band.kind).collect();
    assert_eq!(
        kinds,
        vec![
            BandKind::Header,
            BandKind::Detail,
            BandKind::Detail,
            BandKind::Footer
        ]
    );

    let detail_offsets: Vec<f64> = page
        .detail_bands()
        .map(|(_, band)| band.properties.offset_y)
        .collect();
    assert_eq!(detail_offsets, vec![80.0, 100.0]);

    match &page.bands[0].elements[2].kind {
        ElementKind::Image(image) => {
            assert_eq!(image.h_align, HAlign::Right);
            assert_eq!(image.v_align, VAlign::Middle);
            assert_eq!(image.scale, ScaleMode::ResizeKeepShape);
            assert_eq!(image.natural_size(), Some((140.0, 70.0)));
        }
        other => panic!("expected image, got {other:?}"),
    }

    // Text without `p` decodes to an all-inherit delta.
    match &page.bands[1].elements[1].kind {
        ElementKind::Text { props, runs } => {
            assert_eq!(props.font_size, None);
            assert!(!props.is_link());
            assert_eq!(runs[0].text, "Cash");
        }
        other => panic!("expected text, got {other:?}"),
    }
    Ok(())
}

#[test]
fn page_message_wraps_fixture() -> Result<()> {
    let message = format!("J:{STATEMENT}\n");
    match PushMessage::parse(&message)? {
        PushMessage::Page(page) => assert_eq!(page.bands.len(), 4),
        other => panic!("expected page, got {other:?}"),
    }
    Ok(())
}
