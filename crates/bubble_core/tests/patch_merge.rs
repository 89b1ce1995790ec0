mod common;

use bubble_core::image::HEADER_LEN;
use bubble_core::layout::{address_range, validate_known_segment_table, validate_segment_table};
use bubble_core::segments::{KNOWN_LOAD_ADDRESS, LEVEL_SEGMENTS, SEGMENT_TABLE, SegmentLocation};
use bubble_core::{Document, ErrorCode, ProgramImage, Segment, patch_levels};

use common::{filler_image, sample_image, sample_levels};

fn image_offset(address: usize) -> usize {
    address - KNOWN_LOAD_ADDRESS as usize + HEADER_LEN
}

fn changed_offsets(before: &ProgramImage, after: &ProgramImage) -> Vec<usize> {
    before
        .as_bytes()
        .iter()
        .zip(after.as_bytes())
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(i, _)| i)
        .collect()
}

#[test]
fn known_segment_table_is_consistent() {
    validate_known_segment_table().expect("segment table should validate");
}

#[test]
fn overlapping_segments_are_rejected() {
    let mut table: Vec<SegmentLocation> = SEGMENT_TABLE.to_vec();
    table[2].address += 1;
    let err = validate_segment_table(&table).unwrap_err();
    assert_eq!(err.code, ErrorCode::Malformed);

    let mut table: Vec<SegmentLocation> = SEGMENT_TABLE.to_vec();
    table[1].mask = Some(0xFF);
    let err = validate_segment_table(&table).unwrap_err();
    assert!(err.message.contains("overlapping masks"), "{}", err.message);
}

#[test]
fn empty_selection_leaves_the_image_untouched() {
    let original = filler_image();
    let patched = patch_levels(&original, &sample_levels(), Some(&[])).expect("empty patch");
    assert_eq!(patched, original);
}

#[test]
fn selective_patch_only_touches_selected_segments() {
    let original = filler_image();
    let selection = [Segment::Monsters, Segment::BgColors];
    let patched = patch_levels(&original, &sample_levels(), Some(&selection)).expect("patch");

    let ranges: Vec<_> = selection
        .iter()
        .map(|segment| {
            let range = address_range(segment.location());
            image_offset(range.start)..image_offset(range.end)
        })
        .collect();
    let changed = changed_offsets(&original, &patched);
    assert!(!changed.is_empty());
    for offset in changed {
        assert!(
            ranges.iter().any(|range| range.contains(&offset)),
            "byte {offset} changed outside the selection"
        );
    }
}

#[test]
fn aliased_segment_patch_keeps_the_other_field() {
    let original = sample_image();
    let symmetry_before = original.segment(Segment::Symmetry).unwrap().raw().to_vec();

    let mut levels = sample_levels();
    for i in 0..10 {
        let mut level = levels[i].clone();
        level.sidebar = None;
        levels.replace(i, level).unwrap();
    }
    let patched =
        patch_levels(&original, &levels, Some(&[Segment::SidebarIndex])).expect("patch");

    let symmetry = patched.segment(Segment::Symmetry).unwrap();
    let sidebar = patched.segment(Segment::SidebarIndex).unwrap();
    for i in 0..100 {
        assert_eq!(symmetry.get(i).unwrap(), symmetry_before[i] & 0x80, "level {i}");
    }
    assert_eq!(sidebar.get(0).unwrap(), 0x7F);
    assert_eq!(sidebar.get(3).unwrap(), 0x7F);
}

#[test]
fn patching_is_idempotent() {
    let original = filler_image();
    let once = patch_levels(&original, &sample_levels(), None).expect("first patch");
    let twice = patch_levels(&once, &sample_levels(), None).expect("second patch");
    assert_eq!(once, twice);
}

#[test]
fn full_patch_writes_only_level_segments() {
    let original = filler_image();
    let patched = patch_levels(&original, &sample_levels(), None).expect("patch");
    let ranges: Vec<_> = LEVEL_SEGMENTS
        .iter()
        .map(|segment| {
            let range = address_range(segment.location());
            image_offset(range.start)..image_offset(range.end)
        })
        .collect();
    for offset in changed_offsets(&original, &patched) {
        assert!(ranges.iter().any(|range| range.contains(&offset)));
    }
}

#[test]
fn document_round_trips_unmodified_and_modified() {
    let bytes = sample_image().into_bytes();
    let mut doc = Document::parse(bytes.clone()).expect("document should parse");
    assert_eq!(doc.to_bytes_unmodified(), bytes);
    assert_eq!(doc.to_bytes_modified(None).expect("re-encode"), bytes);

    let mut level = doc.data.levels[4].clone();
    level.light_color = 9;
    doc.set_level(4, level).expect("replace level");
    let modified = doc.to_bytes_modified(None).expect("encode edit");
    let reparsed = Document::parse(modified).expect("reparse");
    assert_eq!(reparsed.data.levels[4].light_color, 9);
    assert_eq!(reparsed.original().len(), bytes.len());
}

#[test]
fn reads_past_a_segment_are_out_of_bounds() {
    let image = ProgramImage::zeroed();
    let view = image.segment(Segment::BonusColors).unwrap();
    assert_eq!(view.read(1, 2).unwrap_err().code, ErrorCode::OutOfBounds);
    assert_eq!(view.get(2).unwrap_err().code, ErrorCode::OutOfBounds);

    let mut reader = image.segment(Segment::PlayerColors).unwrap().reader();
    reader.read_u8().unwrap();
    reader.read_u8().unwrap();
    assert_eq!(reader.read_u8().unwrap_err().code, ErrorCode::OutOfBounds);
}

#[test]
fn truncated_image_cannot_reach_late_segments() {
    let mut bytes = ProgramImage::zeroed().into_bytes();
    bytes.truncate(image_offset(0x9000));
    let image = ProgramImage::from_bytes(bytes).unwrap();
    assert!(image.segment(Segment::Tiles).is_ok());
    assert_eq!(
        image.segment(Segment::SpritesBonus).unwrap_err().code,
        ErrorCode::OutOfBounds
    );
    assert!(Document::parse(image.into_bytes()).is_err());
}

#[test]
fn aliased_views_merge_through_their_masks() {
    let mut image = ProgramImage::zeroed();
    image.segment_mut(Segment::Symmetry).unwrap().set(7, 0xFF).unwrap();
    image
        .segment_mut(Segment::SidebarIndex)
        .unwrap()
        .write(7, &[0x25])
        .unwrap();

    assert_eq!(image.segment(Segment::Symmetry).unwrap().get(7).unwrap(), 0x80);
    assert_eq!(image.segment(Segment::SidebarIndex).unwrap().get(7).unwrap(), 0x25);
    assert_eq!(image.segment(Segment::Symmetry).unwrap().raw()[7], 0xA5);
}

#[test]
fn load_address_comes_from_the_header() {
    let image = ProgramImage::zeroed();
    assert_eq!(image.load_address(), KNOWN_LOAD_ADDRESS);
    assert_eq!(
        ProgramImage::from_bytes(vec![0x01]).unwrap_err().code,
        ErrorCode::Malformed
    );
}
