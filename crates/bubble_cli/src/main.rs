use std::fmt::Display;
use std::fs;
use std::path::PathBuf;
use std::process;

use bubble_core::interchange::editor::{EditorDocument, export_project, import_levels, import_sprites};
use bubble_core::interchange::flat_sprites::{export_flat, import_flat};
use bubble_core::{Document, Segment};
use bubble_render::{
    render_budget, render_json_budget, render_json_level, render_json_summary, render_level_sheet,
    render_summary,
};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(value_name = "IMAGE.PRG")]
    path: PathBuf,
    /// Show one level (1-100) instead of the summary.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    level: Option<u8>,
    #[arg(long)]
    json: bool,
    /// Show how much of the shared monster, asymmetry and sidebar storage is used.
    #[arg(long)]
    budget: bool,
    #[arg(long = "export-editor", value_name = "PATH")]
    export_editor: Option<PathBuf>,
    #[arg(long = "export-sprites", value_name = "PATH")]
    export_sprites: Option<PathBuf>,
    #[arg(long = "import-editor", value_name = "PATH")]
    import_editor: Option<PathBuf>,
    #[arg(long = "import-sprites", value_name = "PATH")]
    import_sprites: Option<PathBuf>,
    /// Restrict the written patch to these segments. Repeatable.
    #[arg(long = "only", value_name = "SEGMENT", value_parser = parse_segment)]
    only: Vec<Segment>,
    #[arg(long)]
    output: Option<PathBuf>,
}

fn parse_segment(value: &str) -> Result<Segment, String> {
    Segment::from_name(value).ok_or_else(|| {
        let names: Vec<&str> = Segment::all().map(|s| s.name()).collect();
        format!("unknown segment '{value}', expected one of: {}", names.join(", "))
    })
}

fn fail(context: impl Display, e: impl Display) -> ! {
    eprintln!("Error {context}: {e}");
    process::exit(1);
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => fail("serializing JSON", e),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let has_imports = cli.import_editor.is_some() || cli.import_sprites.is_some();
    let has_exports = cli.export_editor.is_some() || cli.export_sprites.is_some();
    if has_imports && cli.output.is_none() {
        eprintln!("--import-* flags require --output <PATH>");
        process::exit(2);
    }
    if !has_imports && cli.output.is_some() {
        eprintln!("--output requires at least one --import-* flag");
        process::exit(2);
    }
    if !cli.only.is_empty() && cli.output.is_none() {
        eprintln!("--only requires --output <PATH>");
        process::exit(2);
    }

    let bytes = fs::read(&cli.path)
        .unwrap_or_else(|e| fail(format_args!("reading {}", cli.path.display()), e));
    let mut doc = Document::parse(bytes)
        .unwrap_or_else(|e| fail(format_args!("parsing image {}", cli.path.display()), e));

    if let Some(path) = &cli.import_editor {
        let text = fs::read_to_string(path)
            .unwrap_or_else(|e| fail(format_args!("reading {}", path.display()), e));
        let editor = EditorDocument::parse(&text)
            .unwrap_or_else(|e| fail(format_args!("parsing editor file {}", path.display()), e));
        let levels = import_levels(&editor.project, &doc.data.levels)
            .unwrap_or_else(|e| fail("importing levels", e));
        doc.set_levels(levels);
        if !editor.project.sprite_sets.is_empty() {
            let groups = import_sprites(&editor.project)
                .unwrap_or_else(|e| fail("importing sprite sets", e));
            doc.set_sprite_groups(groups)
                .unwrap_or_else(|e| fail("applying sprite sets", e));
        }
        info!(path = %path.display(), "imported editor file");
    }
    if let Some(path) = &cli.import_sprites {
        let bytes =
            fs::read(path).unwrap_or_else(|e| fail(format_args!("reading {}", path.display()), e));
        let groups = import_flat(&bytes).unwrap_or_else(|e| fail("importing sprites", e));
        doc.set_sprite_groups(groups)
            .unwrap_or_else(|e| fail("applying sprites", e));
        info!(path = %path.display(), "imported flat sprites");
    }

    if let Some(path) = &cli.export_editor {
        let project = export_project(&doc.data.levels, &doc.data.sprites)
            .unwrap_or_else(|e| fail("exporting levels", e));
        let text = EditorDocument::new(project)
            .to_json_string()
            .unwrap_or_else(|e| fail("serializing editor file", e));
        fs::write(path, text)
            .unwrap_or_else(|e| fail(format_args!("writing {}", path.display()), e));
        info!(path = %path.display(), "exported editor file");
    }
    if let Some(path) = &cli.export_sprites {
        let bytes = export_flat(&doc.data.sprites).unwrap_or_else(|e| fail("exporting sprites", e));
        fs::write(path, bytes)
            .unwrap_or_else(|e| fail(format_args!("writing {}", path.display()), e));
        info!(path = %path.display(), "exported flat sprites");
    }

    if let Some(path) = &cli.output {
        let selection = (!cli.only.is_empty()).then_some(cli.only.as_slice());
        let patched = doc
            .to_bytes_modified(selection)
            .unwrap_or_else(|e| fail("patching image", e));
        fs::write(path, patched)
            .unwrap_or_else(|e| fail(format_args!("writing {}", path.display()), e));
        info!(path = %path.display(), "wrote patched image");
    }

    let wrote_files = cli.output.is_some() || has_exports;
    if wrote_files && cli.level.is_none() && !cli.budget && !cli.json {
        return;
    }

    if let Some(number) = cli.level {
        let level = &doc.data.levels[number as usize - 1];
        if cli.json {
            print_json(&render_json_level(level));
        } else {
            println!("Level {number}");
            print!("{}", render_level_sheet(level));
        }
    } else if cli.budget {
        let usage = doc.data.levels.usage();
        if cli.json {
            print_json(&render_json_budget(&usage));
        } else {
            print!("{}", render_budget(&usage));
        }
    } else if cli.json {
        print_json(&render_json_summary(&doc.data));
    } else {
        print!("{}", render_summary(&doc.data));
    }
}
