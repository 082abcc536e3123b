use pretty_assertions::assert_eq;
use reader_core::{first_page, resolve_citations, Citation, Segment};

fn citation(document_id: u64, reference: Option<u64>, pages: &str) -> Citation {
    Citation {
        document_id,
        document_title: format!("Doc {document_id}"),
        section: None,
        pages: pages.to_string(),
        excerpt: "excerpt".to_string(),
        reference,
    }
}

fn joined(segments: &[Segment]) -> String {
    segments.iter().map(Segment::text).collect()
}

fn cited_document(segment: &Segment) -> Option<u64> {
    segment.as_cited().map(|cited| cited.citation.document_id)
}

#[test]
fn empty_text_yields_no_segments() {
    assert!(resolve_citations("", &[citation(1, None, "s.1")]).is_empty());
}

#[test]
fn text_without_markers_is_one_plain_segment() {
    let text = "Peace is made by treaty (see chapter two).";
    let segments = resolve_citations(text, &[]);
    assert_eq!(segments, vec![Segment::Text(text.to_string())]);
}

#[test]
fn segments_reproduce_the_answer_exactly() {
    let citations = vec![citation(3, None, "s.4"), citation(8, Some(2), "s.9-10")];
    let samples = [
        "[1]",
        "[1][2]",
        "Start [1] middle [2] end",
        "[99] unknown then [1].",
        "Unicode ünïcödé [2] → [1]\nnext line",
        "brackets [ 1 ] and [a] stay text [1]",
    ];
    for text in samples {
        let segments = resolve_citations(text, &citations);
        assert_eq!(joined(&segments), text, "round trip for {text:?}");
        assert!(segments.iter().all(|s| !s.text().is_empty()));
    }
}

#[test]
fn markers_are_split_out_in_order() {
    let citations = vec![citation(3, None, "s.4")];
    let segments = resolve_citations("A [1] B [5] C", &citations);
    let texts: Vec<_> = segments.iter().map(Segment::text).collect();
    assert_eq!(texts, vec!["A ", "[1]", " B ", "[5]", " C"]);
    assert_eq!(cited_document(&segments[1]), Some(3));
    assert_eq!(
        segments[3],
        Segment::Unresolved {
            marker: "[5]".to_string()
        }
    );
}

#[test]
fn fallback_chain_prefers_ref_then_position_then_document_id() {
    let citations = vec![citation(7, None, "s.1"), citation(9, Some(42), "s.2")];

    let by_position = resolve_citations("[1]", &citations);
    assert_eq!(cited_document(&by_position[0]), Some(7));

    let by_ref = resolve_citations("[42]", &citations);
    assert_eq!(cited_document(&by_ref[0]), Some(9));
    assert_eq!(by_ref[0].as_cited().map(|c| c.citation_index), Some(1));

    let by_document = resolve_citations("[7]", &citations);
    assert_eq!(cited_document(&by_document[0]), Some(7));
}

#[test]
fn explicit_ref_beats_position() {
    // Position 2 would be the second citation, but the first claims ref 2.
    let citations = vec![citation(1, Some(2), "s.1"), citation(5, None, "s.2")];
    let segments = resolve_citations("[2]", &citations);
    assert_eq!(cited_document(&segments[0]), Some(1));
}

#[test]
fn position_beats_document_id() {
    let citations = vec![citation(2, None, "s.1"), citation(1, None, "s.2")];
    let segments = resolve_citations("[1]", &citations);
    assert_eq!(cited_document(&segments[0]), Some(2));
}

#[test]
fn zero_and_overflowing_markers_are_unresolved() {
    let citations = vec![citation(0, None, "s.1")];
    let overflow = "[123456789012345678901234567890]";
    let segments = resolve_citations(overflow, &citations);
    assert_eq!(
        segments,
        vec![Segment::Unresolved {
            marker: overflow.to_string()
        }]
    );

    // [0] never matches by position, only by document id.
    let zero = resolve_citations("[0]", &citations);
    assert_eq!(cited_document(&zero[0]), Some(0));
    let zero = resolve_citations("[0]", &[citation(4, None, "s.1")]);
    assert!(zero[0].as_cited().is_none());
}

#[test]
fn resolved_marker_carries_first_page_and_label() {
    let citations = vec![citation(4, None, "s.12-13")];
    let segments = resolve_citations("see [1]", &citations);
    let cited = segments[1].as_cited().expect("resolved");
    assert_eq!(cited.first_page, 12);
    assert_eq!(cited.marker, "[1]");
    assert_eq!(cited.label(), "Doc 4 - s.12-13");
}

#[test]
fn first_page_examples() {
    assert_eq!(first_page("s.12-13"), 12);
    assert_eq!(first_page("5"), 5);
    assert_eq!(first_page(""), 1);
    assert_eq!(first_page("unknown"), 1);
}

#[test]
fn resolution_is_idempotent() {
    let citations = vec![citation(7, None, "s.1"), citation(9, Some(42), "s.2-3")];
    let text = "War [1] and peace [42], also [7] and [3].";
    assert_eq!(
        resolve_citations(text, &citations),
        resolve_citations(text, &citations)
    );
}
