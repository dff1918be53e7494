//! Menu-driven base layer switcher.
//!
//! Stands in for a UI: reads commands from stdin and drives the coordinator.
//! Run with: cargo run --example style_switcher -- <assets-dir> <data-dir>

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use basemap::assets::DirAssetReader;
use basemap::layer::LayerStack;
use basemap::{BaseLayerCoordinator, CoordinatorConfig, MAIN_STYLE, STYLE_3D_TOKEN};
use parking_lot::Mutex;

const LANGUAGES: [(&str, &str); 7] = [
    ("English", "en"),
    ("German", "de"),
    ("Spanish", "es"),
    ("Italian", "it"),
    ("French", "fr"),
    ("Russian", "ru"),
    ("Chinese", "zh"),
];

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let assets_dir = args.next().context("missing assets dir argument")?;
    let data_dir = args.next().context("missing data dir argument")?;

    let layers = Arc::new(Mutex::new(LayerStack::new()));
    let config = CoordinatorConfig {
        data_dir: data_dir.into(),
        persistent_cache: true,
        ..CoordinatorConfig::default()
    };
    let mut coordinator = BaseLayerCoordinator::new(
        config,
        Arc::new(DirAssetReader::new(assets_dir)),
        Arc::clone(&layers),
    );
    coordinator.initialize()?;

    println!("commands: style <token> | lang <code> | offline <package> | list | quit");
    println!(
        "styles: basic, {MAIN_STYLE}:default, {MAIN_STYLE}:dark, {MAIN_STYLE}:grey, \
         {STYLE_3D_TOKEN}, looseleaf"
    );
    println!(
        "languages: {}",
        LANGUAGES
            .map(|(name, code)| format!("{name} ({code})"))
            .join(", ")
    );

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let result = match line.trim().split_once(' ') {
            Some(("style", token)) => coordinator.set_style(token.trim()),
            Some(("lang", code)) => coordinator.set_language(code.trim()),
            Some(("offline", package)) => coordinator.use_offline_package(package.trim()),
            None if line.trim() == "list" => {
                let stack = layers.lock();
                for (position, layer) in stack.iter().enumerate() {
                    let tag = if layer.is_base() { "base" } else { "overlay" };
                    println!(
                        "  [{position}] {tag} layer {} (substyle: {:?})",
                        layer.id(),
                        layer.decoder().substyle()
                    );
                }
                continue;
            }
            None if line.trim() == "quit" => break,
            _ => {
                println!("unknown command");
                continue;
            }
        };

        match result {
            Ok(()) => println!(
                "base layer now: style={} lang={}",
                coordinator.style_selection().style_file,
                coordinator.language()
            ),
            Err(error) => println!("selection failed, base layer unchanged: {error}"),
        }
    }

    Ok(())
}
