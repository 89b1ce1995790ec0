use std::fmt::Write as _;

use bubble_core::GameData;
use bubble_core::glyph::Glyph;
use bubble_core::level::{
    BudgetUsage, CurrentEntry, CurrentRectangle, CurrentRectangles, Level, MAX_ASYMMETRIC_LEVELS,
    MAX_SIDEBAR_LEVELS, MAX_TOTAL_MONSTERS, Monster, MonsterKind, Point,
};
use serde_json::{Map as JsonMap, Value as JsonValue};

const SOLID: char = '#';
const EMPTY: char = '.';

fn monster_marker(kind: MonsterKind) -> char {
    match kind {
        MonsterKind::ZenChan => 'Z',
        MonsterKind::Mighta => 'M',
        MonsterKind::Monsta => 'O',
        MonsterKind::Pulpul => 'P',
        MonsterKind::Banebou => 'B',
        MonsterKind::Hidegons => 'H',
        MonsterKind::Invader => 'I',
        MonsterKind::Drunk => 'D',
    }
}

fn describe_entry(entry: &CurrentEntry) -> String {
    match entry {
        CurrentEntry::Mirror => "mirror".to_string(),
        CurrentEntry::Rectangle(rect) => format!(
            "{}x{} at ({}, {}) {}",
            rect.width, rect.height, rect.left, rect.top, rect.direction
        ),
    }
}

pub fn render_level_sheet(level: &Level) -> String {
    let mut grid: Vec<Vec<char>> = level
        .tiles
        .rows
        .iter()
        .map(|row| row.iter().map(|&solid| if solid { SOLID } else { EMPTY }).collect())
        .collect();
    for monster in &level.monsters {
        if let Some(cell) = grid
            .get_mut(monster.y as usize)
            .and_then(|row| row.get_mut(monster.x as usize))
        {
            *cell = monster_marker(monster.kind);
        }
    }

    let mut out = String::new();
    let symmetry = if level.is_symmetric() {
        "symmetric"
    } else {
        "asymmetric"
    };
    writeln!(
        &mut out,
        "Colours: light {:<3}dark {:<3}{}",
        level.light_color, level.dark_color, symmetry
    )
    .expect("writing to String cannot fail");
    writeln!(&mut out).expect("writing to String cannot fail");

    for (y, row) in grid.iter().enumerate() {
        let line: String = row.iter().collect();
        writeln!(&mut out, "{y:>2} {line} {}", level.row_currents[y].arrow())
            .expect("writing to String cannot fail");
    }
    writeln!(&mut out).expect("writing to String cannot fail");

    let spawns: Vec<&str> = level
        .bubble_spawns
        .iter()
        .zip(["1", "2", "3", "4"])
        .filter(|(on, _)| **on)
        .map(|(_, name)| name)
        .collect();
    writeln!(
        &mut out,
        "Sidebar: {:<10}Bubble spawns: {}",
        if level.sidebar.is_some() { "custom" } else { "default" },
        if spawns.is_empty() {
            "none".to_string()
        } else {
            spawns.join(",")
        }
    )
    .expect("writing to String cannot fail");
    writeln!(
        &mut out,
        "Items:   points at ({}, {}), power-ups at ({}, {})",
        level.points_spawn.x, level.points_spawn.y, level.powerup_spawn.x, level.powerup_spawn.y
    )
    .expect("writing to String cannot fail");

    writeln!(&mut out).expect("writing to String cannot fail");
    writeln!(&mut out, "Monsters ({}):", level.monsters.len())
        .expect("writing to String cannot fail");
    for monster in &level.monsters {
        let confirmation = monster
            .confirmation_bits
            .map(|bits| format!("{bits:04b}"))
            .unwrap_or_else(|| "auto".to_string());
        writeln!(
            &mut out,
            "  {} {:<9} ({:>2}, {:>2}) facing {:<6} delay {:>2}  bits {}",
            monster_marker(monster.kind),
            monster.kind.as_str(),
            monster.x,
            monster.y,
            if monster.facing_left { "left" } else { "right" },
            monster.delay,
            confirmation
        )
        .expect("writing to String cannot fail");
    }

    writeln!(&mut out).expect("writing to String cannot fail");
    match &level.currents {
        CurrentRectangles::Copy { level } => {
            writeln!(&mut out, "Currents: same as level {}", *level as usize + 1)
                .expect("writing to String cannot fail");
        }
        CurrentRectangles::Entries(entries) => {
            writeln!(&mut out, "Currents ({}):", entries.len())
                .expect("writing to String cannot fail");
            for entry in entries {
                writeln!(&mut out, "  {}", describe_entry(entry))
                    .expect("writing to String cannot fail");
            }
        }
    }

    out
}

pub fn render_budget(usage: &BudgetUsage) -> String {
    let mut out = String::new();
    for (label, used, max) in [
        ("Monsters", usage.monsters, MAX_TOTAL_MONSTERS),
        ("Asymmetric levels", usage.asymmetric_levels, MAX_ASYMMETRIC_LEVELS),
        ("Custom sidebars", usage.sidebar_levels, MAX_SIDEBAR_LEVELS),
    ] {
        let flag = if used > max { "  OVER" } else { "" };
        writeln!(&mut out, "{label:<19}{used:>4} / {max}{flag}")
            .expect("writing to String cannot fail");
    }
    out
}

pub fn render_summary(data: &GameData) -> String {
    let mut out = String::new();
    writeln!(&mut out, "Level  Layout      Light Dark  Monsters  Sidebar")
        .expect("writing to String cannot fail");
    for (i, level) in data.levels.iter().enumerate() {
        writeln!(
            &mut out,
            "{:>5}  {:<12}{:>5}{:>5}{:>10}  {}",
            i + 1,
            if level.is_symmetric() {
                "symmetric"
            } else {
                "asymmetric"
            },
            level.light_color,
            level.dark_color,
            level.monsters.len(),
            if level.sidebar.is_some() { "custom" } else { "-" }
        )
        .expect("writing to String cannot fail");
    }
    writeln!(&mut out).expect("writing to String cannot fail");
    out.push_str(&render_budget(&data.levels.usage()));
    writeln!(
        &mut out,
        "Sprite groups: {}  Glyph groups: {}  Item categories: {}",
        data.sprites.len(),
        data.glyph_groups.len(),
        data.items.len()
    )
    .expect("writing to String cannot fail");
    out
}

// --- JSON ---

fn point_to_json(p: &Point) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("x".to_string(), JsonValue::from(p.x));
    m.insert("y".to_string(), JsonValue::from(p.y));
    JsonValue::Object(m)
}

fn glyph_to_json(glyph: &Glyph) -> JsonValue {
    JsonValue::Array(glyph.to_bytes().iter().map(|&b| JsonValue::from(b)).collect())
}

fn monster_to_json(monster: &Monster) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("kind".to_string(), JsonValue::String(monster.kind.to_string()));
    m.insert("x".to_string(), JsonValue::from(monster.x));
    m.insert("y".to_string(), JsonValue::from(monster.y));
    m.insert("facing_left".to_string(), JsonValue::Bool(monster.facing_left));
    m.insert("delay".to_string(), JsonValue::from(monster.delay));
    m.insert(
        "confirmation_bits".to_string(),
        monster
            .confirmation_bits
            .map(JsonValue::from)
            .unwrap_or(JsonValue::Null),
    );
    JsonValue::Object(m)
}

fn rectangle_to_json(rect: &CurrentRectangle) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("left".to_string(), JsonValue::from(rect.left));
    m.insert("top".to_string(), JsonValue::from(rect.top));
    m.insert("width".to_string(), JsonValue::from(rect.width));
    m.insert("height".to_string(), JsonValue::from(rect.height));
    m.insert(
        "direction".to_string(),
        JsonValue::String(rect.direction.to_string()),
    );
    JsonValue::Object(m)
}

fn currents_to_json(currents: &CurrentRectangles) -> JsonValue {
    let mut m = JsonMap::new();
    match currents {
        CurrentRectangles::Copy { level } => {
            m.insert("copy_of".to_string(), JsonValue::from(*level));
        }
        CurrentRectangles::Entries(entries) => {
            let entries = entries
                .iter()
                .map(|entry| match entry {
                    CurrentEntry::Mirror => JsonValue::String("mirror".to_string()),
                    CurrentEntry::Rectangle(rect) => rectangle_to_json(rect),
                })
                .collect();
            m.insert("entries".to_string(), JsonValue::Array(entries));
        }
    }
    JsonValue::Object(m)
}

pub fn render_json_level(level: &Level) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert("symmetric".to_string(), JsonValue::Bool(level.is_symmetric()));
    out.insert("light_color".to_string(), JsonValue::from(level.light_color));
    out.insert("dark_color".to_string(), JsonValue::from(level.dark_color));
    out.insert(
        "tiles".to_string(),
        JsonValue::Array(
            level
                .tiles
                .rows
                .iter()
                .map(|row| {
                    JsonValue::String(
                        row.iter()
                            .map(|&solid| if solid { SOLID } else { EMPTY })
                            .collect(),
                    )
                })
                .collect(),
        ),
    );
    out.insert(
        "row_currents".to_string(),
        JsonValue::Array(
            level
                .row_currents
                .iter()
                .map(|d| JsonValue::String(d.to_string()))
                .collect(),
        ),
    );
    out.insert("platform_glyph".to_string(), glyph_to_json(&level.platform_glyph));
    out.insert(
        "sidebar".to_string(),
        match &level.sidebar {
            Some(block) => JsonValue::Array(block.glyphs.iter().map(glyph_to_json).collect()),
            None => JsonValue::Null,
        },
    );
    out.insert(
        "monsters".to_string(),
        JsonValue::Array(level.monsters.iter().map(monster_to_json).collect()),
    );
    out.insert("currents".to_string(), currents_to_json(&level.currents));
    out.insert(
        "bubble_spawns".to_string(),
        JsonValue::Array(level.bubble_spawns.iter().map(|&b| JsonValue::Bool(b)).collect()),
    );
    out.insert("points_spawn".to_string(), point_to_json(&level.points_spawn));
    out.insert("powerup_spawn".to_string(), point_to_json(&level.powerup_spawn));
    JsonValue::Object(out)
}

pub fn render_json_budget(usage: &BudgetUsage) -> JsonValue {
    let mut m = JsonMap::new();
    for (key, used, max) in [
        ("monsters", usage.monsters, MAX_TOTAL_MONSTERS),
        ("asymmetric_levels", usage.asymmetric_levels, MAX_ASYMMETRIC_LEVELS),
        ("sidebar_levels", usage.sidebar_levels, MAX_SIDEBAR_LEVELS),
    ] {
        let mut entry = JsonMap::new();
        entry.insert("used".to_string(), JsonValue::from(used));
        entry.insert("max".to_string(), JsonValue::from(max));
        m.insert(key.to_string(), JsonValue::Object(entry));
    }
    JsonValue::Object(m)
}

pub fn render_json_summary(data: &GameData) -> JsonValue {
    let mut out = JsonMap::new();
    let levels = data
        .levels
        .iter()
        .enumerate()
        .map(|(i, level)| {
            let mut m = JsonMap::new();
            m.insert("level".to_string(), JsonValue::from(i + 1));
            m.insert("symmetric".to_string(), JsonValue::Bool(level.is_symmetric()));
            m.insert("light_color".to_string(), JsonValue::from(level.light_color));
            m.insert("dark_color".to_string(), JsonValue::from(level.dark_color));
            m.insert("monsters".to_string(), JsonValue::from(level.monsters.len()));
            m.insert("custom_sidebar".to_string(), JsonValue::Bool(level.sidebar.is_some()));
            JsonValue::Object(m)
        })
        .collect();
    out.insert("levels".to_string(), JsonValue::Array(levels));
    out.insert("budget".to_string(), render_json_budget(&data.levels.usage()));
    out.insert(
        "sprite_groups".to_string(),
        JsonValue::Array(
            data.sprites
                .iter()
                .map(|group| {
                    let mut m = JsonMap::new();
                    m.insert("name".to_string(), JsonValue::String(group.name.clone()));
                    m.insert("sprites".to_string(), JsonValue::from(group.sprites.len()));
                    m.insert("color".to_string(), JsonValue::from(group.color));
                    JsonValue::Object(m)
                })
                .collect(),
        ),
    );
    out.insert(
        "glyph_groups".to_string(),
        JsonValue::Array(
            data.glyph_groups
                .iter()
                .map(|group| {
                    let mut m = JsonMap::new();
                    m.insert("name".to_string(), JsonValue::String(group.name.clone()));
                    m.insert("elements".to_string(), JsonValue::from(group.elements.len()));
                    JsonValue::Object(m)
                })
                .collect(),
        ),
    );
    out.insert(
        "item_categories".to_string(),
        JsonValue::Array(
            data.items
                .iter()
                .map(|category| {
                    let mut m = JsonMap::new();
                    m.insert("name".to_string(), JsonValue::String(category.name.clone()));
                    m.insert("items".to_string(), JsonValue::from(category.records.len()));
                    JsonValue::Object(m)
                })
                .collect(),
        ),
    );
    JsonValue::Object(out)
}
