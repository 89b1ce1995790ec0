mod common;

use std::collections::HashMap;

use bubble_core::interchange::editor::{
    CHAR_DIGITS, CHAR_EMPTY, CHAR_LETTER_C, CHAR_LETTER_S, CHAR_PLATFORM, EditorDocument, EditorProject,
    PANEL_COLUMN, export_project, import_levels, import_sprites,
};
use bubble_core::interchange::flat_sprites::{
    FLAT_SPRITE_BYTES, TRAILER_MULTICOLOR, export_flat, flat_len, group_offset, import_flat,
};
use bubble_core::interchange::lzw;
use bubble_core::level::{CurrentRectangles, LevelSet, MonsterKind};
use bubble_core::sprite::{SPRITE_BYTES, SPRITE_GROUPS, Sprite, SpriteGroup};
use bubble_core::{Document, ErrorCode};

use common::{sample_image, sample_levels};

/// Classic dictionary compressor matching the editor's save format.
fn compress(input: &str) -> Vec<u16> {
    let units: Vec<u16> = input.encode_utf16().collect();
    let mut dict: HashMap<Vec<u16>, u16> = HashMap::new();
    let mut next = 256u16;
    let mut out = Vec::new();
    let mut phrase: Vec<u16> = Vec::new();
    let code_of = |phrase: &[u16], dict: &HashMap<Vec<u16>, u16>| {
        if phrase.len() == 1 { phrase[0] } else { dict[phrase] }
    };

    for &unit in &units {
        let mut extended = phrase.clone();
        extended.push(unit);
        if phrase.is_empty() || dict.contains_key(&extended) {
            phrase = extended;
            continue;
        }
        out.push(code_of(&phrase, &dict));
        dict.insert(extended, next);
        next += 1;
        phrase = vec![unit];
    }
    if !phrase.is_empty() {
        out.push(code_of(&phrase, &dict));
    }
    out
}

fn units(text: &str) -> Vec<u16> {
    text.encode_utf16().collect()
}

/// JSON string literal for arbitrary code units, escaping everything past ASCII.
fn json_literal(units: &[u16]) -> String {
    let mut out = String::from("\"");
    for &unit in units {
        match char::from_u32(u32::from(unit)) {
            Some(ch) if ch.is_ascii_graphic() && ch != '"' && ch != '\\' => out.push(ch),
            Some(' ') => out.push(' '),
            _ => out.push_str(&format!("\\u{unit:04x}")),
        }
    }
    out.push('"');
    out
}

fn compressed_envelope(app: &str, payload: &[u16]) -> String {
    format!(
        r#"{{"app":"{app}","author":"someone","saved":1700000000,"data":{}}}"#,
        json_literal(payload)
    )
}

fn patterned_groups() -> Vec<SpriteGroup> {
    SPRITE_GROUPS
        .iter()
        .enumerate()
        .map(|(g, def)| SpriteGroup {
            name: def.name.to_string(),
            sprites: (0..def.count)
                .map(|s| {
                    let bytes: Vec<u8> = (0..SPRITE_BYTES)
                        .map(|i| (i * 7 + s * 3 + g) as u8)
                        .collect();
                    Sprite::from_bytes(&bytes).unwrap()
                })
                .collect(),
            color: (g % 16) as u8,
        })
        .collect()
}

#[test]
fn lzw_expands_the_classic_sample() {
    let compressed = units("TOBEORNOT\u{100}\u{102}\u{104}\u{109}\u{103}\u{105}\u{107}");
    assert_eq!(
        lzw::decompress(&compressed).unwrap(),
        "TOBEORNOTTOBEORTOBEORNOT"
    );
    assert_eq!(compress("TOBEORNOTTOBEORTOBEORNOT"), compressed);
}

#[test]
fn lzw_handles_codes_defined_by_their_own_step() {
    assert_eq!(lzw::decompress(&units("AB\u{100}\u{102}")).unwrap(), "ABABABA");
    let text = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaab";
    assert_eq!(lzw::decompress(&compress(text)).unwrap(), text);
}

#[test]
fn editor_export_round_trips_through_json() {
    let levels = sample_levels();
    let sprites = patterned_groups();
    let project = export_project(&levels, &sprites).expect("export");
    assert_eq!(project.charsets.len(), 100);
    assert_eq!(project.screens.len(), 100);
    assert_eq!(project.sprite_sets.len(), SPRITE_GROUPS.len());

    let text = EditorDocument::new(project.clone())
        .to_json_string()
        .expect("serialize");
    let parsed = EditorDocument::parse(&text).expect("parse");
    assert_eq!(parsed.project, project);

    let imported = import_levels(&parsed.project, &levels).expect("import levels");
    assert_eq!(imported, levels);
    assert_eq!(import_sprites(&parsed.project).expect("import sprites"), sprites);
}

#[test]
fn editor_import_takes_unmapped_fields_from_the_base() {
    let levels = sample_levels();
    let project = export_project(&levels, &patterned_groups()).expect("export");
    let base = LevelSet::blank();

    let imported = import_levels(&project, &base).expect("import");
    for (i, (level, expected)) in imported.iter().zip(levels.iter()).enumerate() {
        assert_eq!(level.tiles, expected.tiles, "tiles of level {i}");
        assert_eq!(level.platform_glyph, expected.platform_glyph);
        assert_eq!(level.sidebar, expected.sidebar);
        assert_eq!(level.light_color, expected.light_color);
        assert_eq!(level.currents, base[i].currents);
        assert_eq!(level.row_currents, base[i].row_currents);
        assert_eq!(level.monsters.len(), expected.monsters.len());
        for (monster, original) in level.monsters.iter().zip(&expected.monsters) {
            assert_eq!((monster.kind, monster.x, monster.y), (original.kind, original.x, original.y));
            assert_eq!(monster.facing_left, original.facing_left);
            assert_eq!(monster.delay, 0);
            assert_eq!(monster.confirmation_bits, None);
        }
    }
}

#[test]
fn editor_screens_draw_platforms_and_print_currents() {
    let levels = sample_levels();
    let project = export_project(&levels, &patterned_groups()).expect("export");

    // Level 1 has a platform on row 6 from column 4.
    let screen = &project.screens[1];
    assert_eq!(screen.cells[6][4], CHAR_PLATFORM);
    assert_eq!(screen.cells[6][3], CHAR_EMPTY);
    // "01022021": left 1, top 2, width 2, height 2, rightward.
    assert_eq!(
        &screen.cells[0][PANEL_COLUMN..PANEL_COLUMN + 3],
        &[CHAR_DIGITS, CHAR_DIGITS + 1, CHAR_DIGITS]
    );
    assert_eq!(screen.cells[1][PANEL_COLUMN], CHAR_LETTER_S);
    assert_eq!(screen.cells[2][PANEL_COLUMN], CHAR_EMPTY);

    // Level 6 copies level 5.
    assert!(matches!(levels[6].currents, CurrentRectangles::Copy { level: 5 }));
    let row = &project.screens[6].cells[0];
    assert_eq!(
        &row[PANEL_COLUMN..PANEL_COLUMN + 4],
        &[CHAR_LETTER_C, CHAR_EMPTY, CHAR_DIGITS, CHAR_DIGITS + 5]
    );
}

#[test]
fn compressed_payload_and_metadata_survive() {
    let sprites = patterned_groups();
    let project = EditorProject {
        sprite_sets: export_project(&sample_levels(), &sprites)
            .expect("export")
            .sprite_sets,
        ..EditorProject::default()
    };
    let payload = serde_json::to_string(&project).unwrap();
    let envelope = compressed_envelope("sprite-studio", &compress(&payload));

    let parsed = EditorDocument::parse(&envelope).expect("parse compressed");
    assert_eq!(parsed.project, project);
    assert_eq!(parsed.envelope.app, "sprite-studio");
    assert_eq!(parsed.envelope.extra["author"], "someone");

    let written: serde_json::Value =
        serde_json::from_str(&parsed.to_json_string().expect("serialize")).unwrap();
    assert_eq!(written["author"], "someone");
    assert_eq!(written["saved"], 1_700_000_000);
    let data = written["data"].as_str().expect("data is a string");
    assert!(data.starts_with('{'), "payload is written uncompressed");
}

#[test]
fn editor_import_rejects_missing_screens() {
    let mut project = export_project(&sample_levels(), &patterned_groups()).expect("export");
    project.screens.pop();
    let err = import_levels(&project, &sample_levels()).unwrap_err();
    assert_eq!(err.code, ErrorCode::LengthMismatch);

    let mut project = export_project(&sample_levels(), &patterned_groups()).expect("export");
    project.screens[2].sprites.push(bubble_core::interchange::editor::SpritePlacement {
        sprite_set: 0,
        frame: 0,
        x: 16,
        y: 16,
        flipped: false,
    });
    let err = import_levels(&project, &sample_levels()).unwrap_err();
    assert_eq!(err.code, ErrorCode::Malformed);
    assert!(err.message.starts_with("level 2"), "{}", err.message);
}

#[test]
fn flat_sprites_round_trip() {
    let groups = patterned_groups();
    let bytes = export_flat(&groups).expect("export");
    assert_eq!(bytes.len(), flat_len());
    assert_eq!(
        group_offset(2),
        (SPRITE_GROUPS[0].count + SPRITE_GROUPS[1].count) * FLAT_SPRITE_BYTES
    );
    assert_eq!(bytes[FLAT_SPRITE_BYTES - 1], TRAILER_MULTICOLOR);
    assert_eq!(bytes[group_offset(3) - 1], TRAILER_MULTICOLOR | 2);

    assert_eq!(import_flat(&bytes).expect("import"), groups);
}

#[test]
fn flat_sprites_with_mixed_trailers_are_malformed() {
    let mut bytes = export_flat(&patterned_groups()).expect("export");
    let second_of_bob = group_offset(1) + 2 * FLAT_SPRITE_BYTES - 1;
    bytes[second_of_bob] = TRAILER_MULTICOLOR | 9;
    let err = import_flat(&bytes).unwrap_err();
    assert_eq!(err.code, ErrorCode::Malformed);
    assert!(err.message.contains("bob"), "{}", err.message);

    assert_eq!(
        import_flat(&bytes[1..]).unwrap_err().code,
        ErrorCode::LengthMismatch
    );
}

#[test]
fn flat_sprites_feed_a_document() {
    let groups = patterned_groups();
    let mut doc = Document::parse(sample_image().into_bytes()).expect("parse");
    doc.set_sprite_groups(import_flat(&export_flat(&groups).unwrap()).unwrap())
        .expect("set groups");
    let reparsed = Document::parse(doc.to_bytes_modified(None).expect("encode")).expect("reparse");
    assert_eq!(reparsed.data.sprites, groups);
}

#[test]
fn editor_placements_follow_the_document_sprite_sets() {
    let levels = sample_levels();
    let mut reversed = patterned_groups();
    reversed.reverse();
    let project = export_project(&levels, &reversed).expect("export");

    for (screen, level) in project.screens.iter().zip(levels.iter()) {
        for (placement, monster) in screen.sprites.iter().zip(&level.monsters) {
            let set = &project.sprite_sets[placement.sprite_set];
            assert_eq!(set.name, monster.kind.sprite_group(), "{}", screen.name);
        }
    }

    let imported = import_levels(&project, &levels).expect("import");
    for (level, expected) in imported.iter().zip(levels.iter()) {
        let kinds: Vec<_> = level.monsters.iter().map(|m| m.kind).collect();
        let expected_kinds: Vec<_> = expected.monsters.iter().map(|m| m.kind).collect();
        assert_eq!(kinds, expected_kinds);
    }
    assert_eq!(imported, levels);
}

#[test]
fn editor_export_needs_the_groups_its_monsters_use() {
    // Level 1 places a Mighta.
    let levels = sample_levels();
    assert_eq!(levels[1].monsters[0].kind, MonsterKind::Mighta);
    let groups: Vec<_> = patterned_groups()
        .into_iter()
        .filter(|group| group.name != "mighta")
        .collect();
    let err = export_project(&levels, &groups).unwrap_err();
    assert_eq!(err.code, ErrorCode::Malformed);
    assert!(err.message.contains("mighta"), "{}", err.message);

    let mut project = export_project(&levels, &patterned_groups()).expect("export");
    project.sprite_sets.truncate(2);
    let err = import_levels(&project, &levels).unwrap_err();
    assert_eq!(err.code, ErrorCode::Malformed);
    assert!(err.message.contains("does not exist"), "{}", err.message);
}

#[test]
fn compressed_payload_may_use_surrogate_range_codes() {
    let project = EditorProject::default();
    let mut payload = units(&serde_json::to_string(&project).unwrap());
    // Pad with literal spaces until the dictionary is about to define 0xD800,
    // then use that code: it expands to two more spaces.
    let literals_before_code = 0xD800 - 256;
    payload.resize(1 + literals_before_code, u16::from(b' '));
    payload.push(0xD800);

    let text = compressed_envelope("sprite-studio", &payload);
    assert!(text.contains("\\ud800"));
    let parsed = EditorDocument::parse(&text).expect("lone surrogate codes are accepted");
    assert_eq!(parsed.project, project);
    assert_eq!(parsed.envelope.app, "sprite-studio");
}
