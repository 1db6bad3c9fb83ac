use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use epaper_config::EpaperConfig;
use epaper_ir::Page;
use epaper_scene::{RenderOptions, RuleList, SceneRenderer};

const USAGE: &str = "usage: epaper <page.json> [--out <file.svg>] [--css]";

struct Args {
    input: PathBuf,
    output: Option<PathBuf>,
    embed_css: bool,
}

fn parse_args() -> Result<Args> {
    let mut input = None;
    let mut output = None;
    let mut embed_css = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--css" => embed_css = true,
            "--out" | "-o" => {
                let path = args.next().context("--out needs a file name")?;
                output = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other if other.starts_with('-') => bail!("unknown option {other}\n{USAGE}"),
            other => {
                if input.replace(PathBuf::from(other)).is_some() {
                    bail!("only one page file can be rendered\n{USAGE}");
                }
            }
        }
    }

    Ok(Args {
        input: input.context(USAGE)?,
        output,
        embed_css,
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let args = parse_args()?;
    let config = EpaperConfig::load();

    let json = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let page = Page::from_json_str(&json)
        .with_context(|| format!("decoding {}", args.input.display()))?;

    let mut renderer = SceneRenderer::new(RuleList::new(), RenderOptions::from(&config.render));
    let rendered = renderer.render_page(&page)?;
    log::info!(
        "rendered {} ({} nodes, {} style classes)",
        args.input.display(),
        rendered.tree.len(),
        renderer.styles().len()
    );

    let svg = if args.embed_css {
        rendered.to_svg_with_style(&renderer.styles().sheet().to_css())
    } else {
        rendered.to_svg()
    };

    match args.output {
        Some(path) => {
            fs::write(&path, svg).with_context(|| format!("writing {}", path.display()))?;
            log::info!("wrote {}", path.display());
        }
        None => println!("{svg}"),
    }
    Ok(())
}
