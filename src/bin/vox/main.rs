//! vox CLI - Tool for inspecting and rewriting MagicaVoxel files.

use std::env;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use voxfile::io;
use voxfile::model::{Material, VoxelDocument};
use voxfile::scene::{SceneGraph, SceneNode, ShapeInstance};
use voxfile::vox::{MaterialPolicy, PackPolicy, ReadOptions, WriteOptions};

/// Verbosity level
const LOG_QUIET: u8 = 0;
const LOG_INFO: u8 = 1;
const LOG_DEBUG: u8 = 2;
const LOG_TRACE: u8 = 3;

fn init_logging(level: u8) {
    let default = match level {
        LOG_QUIET => "error",
        LOG_INFO => "warn",
        LOG_DEBUG => "debug",
        _ => "trace",
    };
    // RUST_LOG wins unless a verbosity flag was given.
    let filter = if level == LOG_INFO {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    } else {
        EnvFilter::new(default)
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = LOG_INFO;
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = LOG_DEBUG,
            "-vv" | "--trace" => level = LOG_TRACE,
            "-q" | "--quiet" => level = LOG_QUIET,
            _ => filtered_args.push(arg),
        }
    }

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let json_mode = filtered_args.iter().any(|&s| s == "--json" || s == "-j");
    if json_mode {
        level = LOG_QUIET;
    }
    init_logging(level);

    let result = match filtered_args[0] {
        "info" | "i" => with_file(&filtered_args, "info <file.vox>", cmd_info),
        "tree" | "t" => with_file(&filtered_args, "tree <file.vox>", cmd_tree),
        "dump" | "d" => with_file(&filtered_args, "dump <file.vox> [--json]", |p| {
            cmd_dump(p, json_mode)
        }),
        "palette" | "p" => with_file(&filtered_args, "palette <file.vox>", cmd_palette),
        "check" | "k" => with_file(&filtered_args, "check <file.vox>", cmd_check),
        "copy" | "c" => {
            let rest: Vec<&str> = filtered_args[1..]
                .iter()
                .copied()
                .filter(|s| !s.starts_with("--"))
                .collect();
            if rest.len() < 2 {
                eprintln!("Error: missing arguments");
                eprintln!("Usage: vox copy <input.vox> <output.vox> [--modern] [--no-pack]");
                std::process::exit(1);
            }
            let mut opts = WriteOptions::new();
            if filtered_args.contains(&"--modern") {
                opts = opts.materials(MaterialPolicy::Modern);
            }
            if filtered_args.contains(&"--no-pack") {
                opts = opts.pack(PackPolicy::WhenMultiple);
            }
            cmd_copy(rest[0], rest[1], &opts)
        }
        "version" | "-V" | "--version" => {
            print_version();
            Ok(())
        }
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        // Default: if file exists, show info; otherwise error
        other => {
            if Path::new(other).exists() {
                cmd_info(other)
            } else {
                eprintln!("Unknown command: {}", other);
                eprintln!();
                print_help();
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn with_file(args: &[&str], usage: &str, f: impl FnOnce(&str) -> Result<()>) -> Result<()> {
    match args.get(1).filter(|s| !s.starts_with('-')) {
        Some(path) => f(*path),
        None => {
            eprintln!("Error: missing file argument");
            eprintln!("Usage: vox {}", usage);
            std::process::exit(1);
        }
    }
}

fn print_version() {
    println!("vox {} (built {})", env!("CARGO_PKG_VERSION"), env!("VOX_BUILD_DATE"));
}

fn print_help() {
    println!("vox - MagicaVoxel file toolkit");
    println!();
    println!("USAGE:");
    println!("    vox [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info    <file>              Show version, model and scene counts");
    println!("    t, tree    <file>              Show the scene graph from its root");
    println!("    d, dump    <file> [--json]     Dump shape instances with world transforms");
    println!("    p, palette <file>              Show palette entries that differ from the default");
    println!("    k, check   <file>              Strict decode, report every warning");
    println!("    c, copy    <in> <out>          Decode and re-encode");
    println!("               [--modern]          Write legacy materials as MATL");
    println!("               [--no-pack]         Omit PACK for single-model files");
    println!("    version                        Show version");
    println!("    h, help                        Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (every chunk)");
    println!("    -q, --quiet      Only show errors");
    println!();
    println!("EXAMPLES:");
    println!("    vox info castle.vox               # Quick overview");
    println!("    vox tree castle.vox               # See hierarchy");
    println!("    vox dump castle.vox --json        # Export instances as JSON");
    println!("    vox copy in.vox out.vox           # Test round-trip");
    println!("    vox -vv check broken.vox          # Trace every chunk");
    println!();
    println!("NOTES:");
    println!("    - Passing a .vox file directly is equivalent to 'info'");
    println!("    - RUST_LOG is honoured when no verbosity flag is given");
}

fn open(path: &str, options: &ReadOptions) -> Result<(VoxelDocument, Vec<String>)> {
    let report = io::open_with(path, options).with_context(|| format!("failed to open {}", path))?;
    let warnings = report.warnings.iter().map(ToString::to_string).collect();
    Ok((report.document, warnings))
}

fn cmd_info(path: &str) -> Result<()> {
    let (doc, warnings) = open(path, &ReadOptions::default())?;

    println!("File: {}", path);
    println!("Version: {}", doc.version);
    println!();
    println!("Models:    {} ({} voxels)", doc.model_count(), doc.voxel_count());
    for (i, model) in doc.models.iter().enumerate() {
        println!(
            "  [{}] {}x{}x{}, {} voxels",
            i,
            model.size.x,
            model.size.y,
            model.size.z,
            model.voxel_count()
        );
    }

    let legacy = doc.materials.values().filter(|m| m.is_legacy()).count();
    println!(
        "Materials: {} ({} MATT, {} MATL)",
        doc.materials.len(),
        legacy,
        doc.materials.len() - legacy
    );
    println!(
        "Palette:   {}",
        if doc.palette.is_legacy_default() { "default" } else { "custom" }
    );

    match &doc.scene {
        Some(scene) => {
            let (mut t, mut g, mut s) = (0, 0, 0);
            for node in scene.nodes() {
                match node {
                    SceneNode::Transform(_) => t += 1,
                    SceneNode::Group(_) => g += 1,
                    SceneNode::Shape(_) => s += 1,
                }
            }
            println!(
                "Nodes:     {} ({} transforms, {} groups, {} shapes), root {}",
                scene.len(),
                t,
                g,
                s,
                scene.root()
            );
            println!(
                "Instances: {} ({} visible)",
                doc.instances()?.len(),
                doc.visible_instances()?.len()
            );
        }
        None => println!("Nodes:     none"),
    }
    println!("Layers:    {}", doc.layers.len());
    println!("Cameras:   {}", doc.cameras.len());
    if !doc.render_objects.is_empty() {
        println!("Render:    {}", doc.render_objects.len());
    }
    if !doc.notes.is_empty() {
        println!("Notes:     {}", doc.notes.len());
    }

    if !warnings.is_empty() {
        println!();
        println!("Warnings ({}):", warnings.len());
        for w in &warnings {
            println!("  {}", w);
        }
    }
    Ok(())
}

fn cmd_tree(path: &str) -> Result<()> {
    let (doc, _) = open(path, &ReadOptions::default())?;
    let Some(scene) = &doc.scene else {
        println!("{}: no scene graph", path);
        return Ok(());
    };

    println!("File: {}", path);
    println!();
    for (depth, node) in scene.walk() {
        println!("{}{}", "  ".repeat(depth), describe(&doc, node));
    }

    let reached = reachable(scene);
    let detached = scene.nodes().iter().filter(|n| !reached.contains(&n.id())).count();
    if detached > 0 {
        println!();
        println!("({} nodes not reachable from the root)", detached);
    }
    Ok(())
}

fn reachable(scene: &SceneGraph) -> std::collections::HashSet<u32> {
    scene.walk().into_iter().map(|(_, n)| n.id()).collect()
}

fn describe(doc: &VoxelDocument, node: &SceneNode) -> String {
    let name = node.name().map(|n| format!(" \"{}\"", n)).unwrap_or_default();
    let hidden = if node.attributes().is_hidden() { " [hidden]" } else { "" };
    match node {
        SceneNode::Transform(t) => {
            let frame = t.first_frame();
            let tr = frame.map(|f| f.translation_or_zero()).unwrap_or_default();
            let rot = frame.map(|f| f.rotation_or_identity().to_byte()).unwrap_or(4);
            let layer = doc
                .layer(t.layer_id)
                .map(|l| format!(" layer {}{}", t.layer_id, l.name().map(|n| format!(" \"{}\"", n)).unwrap_or_default()))
                .unwrap_or_default();
            format!(
                "[TRN {}]{}{} t=({}, {}, {}) r={}{}",
                t.id, name, hidden, tr.x, tr.y, tr.z, rot, layer
            )
        }
        SceneNode::Group(g) => format!("[GRP {}]{}{} {} children", g.id, name, hidden, g.children.len()),
        SceneNode::Shape(s) => {
            let voxels = doc
                .models
                .get(s.model_id as usize)
                .map(|m| m.voxel_count())
                .unwrap_or(0);
            format!("[SHP {}]{}{} model {} ({} voxels)", s.id, name, hidden, s.model_id, voxels)
        }
    }
}

fn cmd_dump(path: &str, json_mode: bool) -> Result<()> {
    let (doc, _) = open(path, &ReadOptions::default())?;
    let instances = doc.instances()?;

    if json_mode {
        let objects: Vec<serde_json::Value> = instances.iter().map(|i| instance_json(&doc, i)).collect();
        let out = serde_json::json!({
            "file": path,
            "version": doc.version,
            "instances": objects,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("File: {}", path);
    println!("Instances: {}", instances.len());
    println!();
    for inst in &instances {
        let t = inst.transform.translation;
        println!(
            "[SHP {}] model {}{}{}",
            inst.node_id,
            inst.model_id,
            inst.layer_id.map(|l| format!(" layer {}", l)).unwrap_or_default(),
            if inst.hidden { " [hidden]" } else { "" }
        );
        println!("  translation: ({}, {}, {})", t.x, t.y, t.z);
        println!("  rotation:    {} {:?}", inst.transform.rotation.to_byte(), inst.transform.rotation.matrix());
    }
    Ok(())
}

fn instance_json(doc: &VoxelDocument, inst: &ShapeInstance) -> serde_json::Value {
    let t = inst.transform.translation;
    let size = doc.models.get(inst.model_id as usize).map(|m| [m.size.x, m.size.y, m.size.z]);
    serde_json::json!({
        "node": inst.node_id,
        "model": inst.model_id,
        "size": size,
        "layer": inst.layer_id,
        "hidden": inst.hidden,
        "translation": [t.x, t.y, t.z],
        "rotation": inst.transform.rotation.matrix(),
    })
}

fn cmd_palette(path: &str) -> Result<()> {
    let (doc, _) = open(path, &ReadOptions::default())?;
    let default = voxfile::model::Palette::legacy_default();

    println!("File: {}", path);
    let mut changed = 0;
    for index in 1..=255u8 {
        let c = doc.palette.get(index);
        if c == default.get(index) {
            continue;
        }
        changed += 1;
        let material = doc
            .material(index)
            .and_then(Material::type_name)
            .map(|t| format!("  {}", t))
            .unwrap_or_default();
        println!(
            "  {:3}: #{:02x}{:02x}{:02x} a={:3}{}",
            index, c.r, c.g, c.b, c.a, material
        );
    }
    println!("{} of 255 entries differ from the default palette", changed);
    Ok(())
}

fn cmd_check(path: &str) -> Result<()> {
    let (doc, warnings) = open(path, &ReadOptions::strict())?;
    doc.validate().context("document failed validation")?;

    for w in &warnings {
        println!("warning: {}", w);
    }
    if warnings.is_empty() {
        println!("{}: OK", path);
        Ok(())
    } else {
        bail!("{}: {} warnings", path, warnings.len())
    }
}

fn cmd_copy(input: &str, output: &str, options: &WriteOptions) -> Result<()> {
    let (doc, warnings) = open(input, &ReadOptions::default())?;
    for w in &warnings {
        eprintln!("warning: {}", w);
    }
    io::save_with(output, &doc, options).with_context(|| format!("failed to write {}", output))?;

    let reread = io::open(output).with_context(|| format!("failed to re-read {}", output))?;
    let same = reread.models == doc.models && reread.scene == doc.scene;
    println!(
        "Copied {} -> {} ({} models){}",
        input,
        output,
        doc.model_count(),
        if same { "" } else { " [re-read differs]" }
    );
    Ok(())
}
