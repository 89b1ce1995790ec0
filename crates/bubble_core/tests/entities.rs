mod common;

use bubble_core::glyph::{
    BLOCK_BYTES, Glyph, GlyphBlock, ITEM_CATEGORIES, ItemRecord, decode_glyph_group,
    decode_items, glyph_group_def,
};
use bubble_core::sprite::{
    SPRITE_BYTES, SPRITE_GROUPS, SPRITE_STRIDE, Sprite, decode_sprite_group, sprite_group_def,
};
use bubble_core::{Document, ErrorCode, Segment};

use common::sample_image;

fn patterned_sprite(seed: u8) -> Sprite {
    let bytes: Vec<u8> = (0..SPRITE_BYTES as u8)
        .map(|i| i.wrapping_mul(seed) ^ seed)
        .collect();
    Sprite::from_bytes(&bytes).expect("63 bytes")
}

fn sample_document() -> Document {
    Document::parse(sample_image().into_bytes()).expect("sample image should parse")
}

#[test]
fn sprite_pixels_are_two_bits_wide() {
    let mut sprite = Sprite::default();
    sprite.set_pixel(0, 0, 0b11);
    sprite.set_pixel(5, 20, 0b10);
    assert_eq!(sprite.rows[0][0], 0b1100_0000);
    assert_eq!(sprite.rows[20][1], 0b0010_0000);
    assert_eq!(sprite.pixel(5, 20), 0b10);
    assert_eq!(sprite.pixel(4, 20), 0);
}

#[test]
fn sprite_group_round_trips_and_keeps_padding() {
    let doc = sample_document();
    let mut original = doc.original().clone();
    let def = sprite_group_def("zen_chan").expect("zen_chan group");

    // Mark the padding byte after the first sprite.
    let pad = def.byte_offset() + SPRITE_BYTES;
    original
        .segment_mut(def.segment)
        .unwrap()
        .set(pad, 0xAB)
        .unwrap();
    let mut padded = Document::parse(original.into_bytes()).expect("parse");

    let mut group = doc.data.sprites[2].clone();
    assert_eq!(group.name, "zen_chan");
    group.sprites = (0..def.count as u8).map(|i| patterned_sprite(i + 3)).collect();
    group.color = 0x0D;
    padded.set_sprite_group(group.clone()).expect("set group");

    let bytes = padded.to_bytes_modified(None).expect("encode");
    let reparsed = Document::parse(bytes).expect("reparse");
    let decoded = decode_sprite_group(reparsed.original(), def).expect("decode");
    assert_eq!(decoded, group);
    assert_eq!(
        reparsed.original().segment(def.segment).unwrap().get(pad).unwrap(),
        0xAB
    );

    let neighbour = sprite_group_def("mighta").unwrap();
    assert_eq!(neighbour.byte_offset(), def.byte_offset() + def.count * SPRITE_STRIDE);
    assert_eq!(
        decode_sprite_group(reparsed.original(), neighbour).unwrap().sprites,
        vec![Sprite::default(); neighbour.count]
    );
}

#[test]
fn sprite_group_with_wrong_count_is_rejected() {
    let mut doc = sample_document();
    let mut group = doc.data.sprites[0].clone();
    group.sprites.pop();
    let err = doc.set_sprite_group(group).unwrap_err();
    assert_eq!(err.code, ErrorCode::LengthMismatch);
}

#[test]
fn sprite_groups_fit_their_segments() {
    for def in SPRITE_GROUPS {
        let end = def.byte_offset() + def.count * SPRITE_STRIDE;
        assert!(
            end <= def.segment.location().length,
            "{} ends at {end}, past {}",
            def.name,
            def.segment
        );
    }
}

#[test]
fn glyph_bytes_hold_four_pixels_each() {
    let glyph = Glyph::from_bytes([0b00_01_10_11, 0, 0, 0, 0, 0, 0, 0xFF]);
    assert_eq!(glyph.pixels[0], [0, 1, 2, 3]);
    assert_eq!(glyph.pixels[7], [3, 3, 3, 3]);
    assert_eq!(glyph.to_bytes()[0], 0b00_01_10_11);
}

#[test]
fn transposed_glyph_group_is_stored_column_by_column() {
    let mut image = sample_image();
    let def = glyph_group_def("lightning").expect("lightning group");
    let stored: Vec<u8> = (0..4u8)
        .flat_map(|k| GlyphBlock::uniform(Glyph::filled(k)).to_bytes())
        .collect();
    image
        .segment_mut(def.segment)
        .unwrap()
        .write(0, &stored)
        .unwrap();

    let group = decode_glyph_group(&image, def).expect("decode");
    let first = &group.elements[0];
    assert_eq!((first.width, first.height), (2, 2));
    // Stored order: (0,0) (0,1) (1,0) (1,1).
    assert_eq!(first.at(0, 0).unwrap().glyphs[0], Glyph::filled(0));
    assert_eq!(first.at(0, 1).unwrap().glyphs[0], Glyph::filled(1));
    assert_eq!(first.at(1, 0).unwrap().glyphs[0], Glyph::filled(2));
    assert_eq!(first.at(1, 1).unwrap().glyphs[0], Glyph::filled(3));

    let mut doc = Document::parse(image.clone().into_bytes()).expect("parse");
    doc.set_glyph_group(group).expect("set group");
    let bytes = doc.to_bytes_modified(Some(&[def.segment])).expect("encode");
    assert_eq!(bytes, image.into_bytes());
}

#[test]
fn glyph_block_quadrants_are_column_major() {
    let block = GlyphBlock {
        glyphs: [
            Glyph::filled(0),
            Glyph::filled(1),
            Glyph::filled(2),
            Glyph::filled(3),
        ],
    };
    assert_eq!(*block.at(0, 1), Glyph::filled(1));
    assert_eq!(*block.at(1, 0), Glyph::filled(2));
    assert_eq!(block.to_bytes().len(), BLOCK_BYTES);
}

#[test]
fn items_round_trip_through_their_categories() {
    let mut doc = sample_document();
    let mut items = doc.data.items.clone();
    assert_eq!(
        items.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        ITEM_CATEGORIES.iter().map(|c| c.name).collect::<Vec<_>>()
    );
    items[1].records[3] = ItemRecord {
        block_index: 61,
        palette: 7,
    };
    doc.set_items(items.clone()).expect("set items");

    let bytes = doc.to_bytes_modified(Some(&[Segment::ItemBlockIndices, Segment::ItemPalettes]));
    let reparsed = Document::parse(bytes.expect("encode")).expect("reparse");
    assert_eq!(decode_items(reparsed.original()).expect("decode"), items);
    assert_eq!(
        reparsed.original().segment(Segment::ItemBlockIndices).unwrap().get(43).unwrap(),
        61
    );
}

#[test]
fn items_with_bad_references_are_rejected() {
    let mut doc = sample_document();
    let mut items = doc.data.items.clone();
    items[0].records[0].block_index = 62;
    assert_eq!(doc.set_items(items).unwrap_err().code, ErrorCode::Malformed);

    let mut items = doc.data.items.clone();
    items[2].records.push(ItemRecord {
        block_index: 0,
        palette: 0,
    });
    assert_eq!(doc.set_items(items).unwrap_err().code, ErrorCode::LengthMismatch);
}
