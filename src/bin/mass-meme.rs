use std::{
    io::{BufRead as _, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use mass_meme::{
    CatalogView, Editor, EditorConfig, FileStorage, Gallery, RemoveOutcome, UploadedFile,
};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Parser, Debug)]
#[command(name = "mass-meme", version)]
struct Cli {
    /// Directory holding saved memes (overrides MASS_MEME_STORE_DIR).
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Template catalog JSON (overrides MASS_MEME_CATALOG).
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Caption font file (overrides MASS_MEME_FONT).
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the template catalog.
    Templates,
    /// Caption an image and write the PNG.
    Make(MakeArgs),
    /// List saved memes.
    Gallery,
    /// Write a saved meme's PNG.
    Export(ExportArgs),
    /// Delete a saved meme.
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false, id = "source")]
struct SourceArgs {
    /// Image file to caption.
    #[arg(long)]
    upload: Option<PathBuf>,

    /// Template id from the catalog.
    #[arg(long)]
    template: Option<String>,

    /// Id of a saved meme to re-edit.
    #[arg(long)]
    saved: Option<u64>,
}

#[derive(Args, Debug)]
struct MakeArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Top caption. Keeps the source's caption when omitted.
    #[arg(long)]
    top: Option<String>,

    /// Bottom caption. Keeps the source's caption when omitted.
    #[arg(long)]
    bottom: Option<String>,

    /// Output PNG path.
    #[arg(long, default_value = mass_meme::DOWNLOAD_FILE_NAME)]
    out: PathBuf,

    /// Also add the result to the gallery.
    #[arg(long)]
    save: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    id: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct DeleteArgs {
    id: u64,

    /// Skip the confirmation prompt.
    #[arg(long)]
    yes: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = EditorConfig::from_env();
    if let Some(dir) = cli.store_dir {
        config.store_dir = dir;
    }
    if let Some(path) = cli.catalog {
        config.catalog_path = Some(path);
    }
    if let Some(path) = cli.font {
        config.font_path = Some(path);
    }

    let mut editor = config.build_editor().context("set up editor")?;
    match cli.cmd {
        Command::Templates => cmd_templates(&editor),
        Command::Make(args) => cmd_make(&mut editor, args),
        Command::Gallery => cmd_gallery(&editor),
        Command::Export(args) => cmd_export(&editor, args),
        Command::Delete(args) => cmd_delete(&mut editor, args),
    }
}

fn cmd_templates(editor: &Editor<FileStorage>) -> anyhow::Result<()> {
    match editor.templates() {
        CatalogView::Empty { message } => println!("{message}"),
        CatalogView::Entries(entries) => {
            for entry in entries {
                println!("{}\t{}", entry.id, entry.name);
            }
        }
    }
    Ok(())
}

fn cmd_make(editor: &mut Editor<FileStorage>, args: MakeArgs) -> anyhow::Result<()> {
    let SourceArgs {
        upload,
        template,
        saved,
    } = args.source;

    if let Some(path) = upload {
        let bytes =
            std::fs::read(&path).with_context(|| format!("read image '{}'", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        editor
            .upload(UploadedFile { file_name, bytes })
            .with_context(|| format!("load image '{}'", path.display()))?;
    } else if let Some(id) = template {
        editor
            .pick_template(&id)
            .with_context(|| format!("load template '{id}'"))?;
    } else if let Some(id) = saved {
        editor
            .pick_saved(id)
            .with_context(|| format!("load saved meme {id}"))?;
    }

    if let Some(top) = args.top {
        editor.set_top_text(top).context("draw top caption")?;
    }
    if let Some(bottom) = args.bottom {
        editor.set_bottom_text(bottom).context("draw bottom caption")?;
    }

    let download = editor
        .download()?
        .context("no image selected (bug)")?;
    write_png(&args.out, &download.png)?;

    if args.save {
        let artifact = editor.save()?.context("no image selected (bug)")?;
        println!("{}", artifact.id);
    }
    Ok(())
}

fn cmd_gallery(editor: &Editor<FileStorage>) -> anyhow::Result<()> {
    match editor.gallery() {
        Gallery::Empty { message } => println!("{message}"),
        Gallery::Entries(entries) => {
            for entry in entries {
                println!(
                    "{}\t{}\t{}\t{}",
                    entry.id,
                    entry.top_text,
                    entry.bottom_text,
                    entry.template_id.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}

fn cmd_export(editor: &Editor<FileStorage>, args: ExportArgs) -> anyhow::Result<()> {
    let artifact = editor
        .store()
        .get(args.id)
        .with_context(|| format!("no saved meme with id {}", args.id))?;
    let png = mass_meme::data_uri_bytes(&artifact.encoded_image)
        .with_context(|| format!("decode saved meme {}", args.id))?;
    write_png(&args.out, &png)
}

fn cmd_delete(editor: &mut Editor<FileStorage>, args: DeleteArgs) -> anyhow::Result<()> {
    let assume_yes = args.yes;
    let mut confirm = |prompt: &str| assume_yes || ask(prompt);
    match editor.remove_saved(args.id, &mut confirm)? {
        RemoveOutcome::Deleted => eprintln!("deleted {}", args.id),
        RemoveOutcome::Declined => eprintln!("kept {}", args.id),
        RemoveOutcome::NotFound => anyhow::bail!("no saved meme with id {}", args.id),
    }
    Ok(())
}

fn ask(prompt: &str) -> bool {
    eprint!("{prompt} [y/N] ");
    let _ = std::io::stderr().flush();
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim(), "y" | "Y" | "yes" | "Yes")
}

fn write_png(out: &Path, png: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(out, png).with_context(|| format!("write png '{}'", out.display()))?;
    eprintln!("wrote {}", out.display());
    Ok(())
}
