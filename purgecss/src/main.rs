use clap::Parser;
use log::info;
use purgecss_lib::{
    load_content_sources, purge, purge_inline_style, purge_site, ContentSource, PurgeError,
    PurgeOptions, PurgedStylesheet,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const PURGECSS_INTRO: &str = r#"
       ___  __  ___________  _______________
      / _ \/ / / / _ \/ __/ / ___/ __/ __/
     / ___/ /_/ / , _/ _/  / /___\ \_\ \
    /_/   \____/_/|_/___/  \___/___/___/

    Drop the CSS your pages never use.
"#;

#[derive(Parser)]
#[command(name = "purgecss")]
#[command(about = "Remove unused CSS rules based on the content that uses them")]
#[command(before_help = PURGECSS_INTRO)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Purge a stylesheet against markup content and print the result.
    Purge(PurgeArgs),
    /// Purge one stylesheet separately for every page of a site.
    Site(SiteArgs),
    /// Purge the <style> element of an HTML document and print the document.
    Inline(InlineArgs),
}

#[derive(clap::Args)]
struct PurgeArgs {
    /// Markup file to scan (the markup itself with --raw).
    content: String,

    /// Stylesheet file to purge (the CSS itself with --raw).
    css: String,

    /// Additional content files to scan.
    #[arg(long = "content", value_name = "FILE")]
    extra_content: Vec<PathBuf>,

    /// Treat CONTENT and CSS as inline text rather than file paths.
    #[arg(long)]
    raw: bool,

    /// List removed selectors on stderr.
    #[arg(long)]
    rejected: bool,

    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(clap::Args)]
struct SiteArgs {
    /// Stylesheet shared by every page.
    css: PathBuf,

    /// Directory the per-page stylesheets are written to.
    out_dir: PathBuf,

    /// Pages to purge against; each one produces `<OUT_DIR>/<page>.css`.
    #[arg(required = true)]
    pages: Vec<PathBuf>,

    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(clap::Args)]
struct InlineArgs {
    /// HTML document containing a <style> element.
    html: PathBuf,

    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Print minified CSS.
    #[arg(long)]
    minify: bool,

    /// Identifier that always counts as used (repeatable).
    #[arg(long, value_name = "NAME")]
    safelist: Vec<String>,

    /// Regex; selectors matching it are always kept (repeatable).
    #[arg(long = "safelist-pattern", value_name = "REGEX")]
    safelist_patterns: Vec<String>,

    /// Keep every @keyframes block.
    #[arg(long)]
    keep_keyframes: bool,

    /// Keep every @font-face block.
    #[arg(long)]
    keep_font_face: bool,
}

impl FilterArgs {
    fn to_options(&self) -> Result<PurgeOptions, PurgeError> {
        PurgeOptions {
            minify: self.minify,
            keyframes: !self.keep_keyframes,
            font_face: !self.keep_font_face,
            safelist: self.safelist.clone(),
            safelist_patterns: Vec::new(),
        }
        .with_safelist_patterns(&self.safelist_patterns)
    }
}

fn main() {
    env_logger::init();

    // parse the args given in terminal
    let args: Args = Args::parse();

    if let Err(e) = run(args.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), PurgeError> {
    match command {
        Command::Purge(args) => run_purge(args),
        Command::Site(args) => run_site(args),
        Command::Inline(args) => run_inline(args),
    }
}

fn run_purge(args: PurgeArgs) -> Result<(), PurgeError> {
    let options = args.filter.to_options()?;
    let (mut sources, css) = if args.raw {
        (vec![ContentSource::html(args.content.as_str())], args.css.clone())
    } else {
        let content_path = PathBuf::from(&args.content);
        (
            load_content_sources(std::slice::from_ref(&content_path))?,
            read_file(Path::new(&args.css))?,
        )
    };
    sources.extend(load_content_sources(&args.extra_content)?);

    let results = purge(&sources, &[css.as_str()], &options)?;
    if args.rejected {
        for selector in results.iter().flat_map(|r| &r.rejected) {
            eprintln!("rejected: {}", selector);
        }
    }
    write_output(&mut io::stdout().lock(), &results).map_err(|source| PurgeError::Io {
        path: PathBuf::from("<stdout>"),
        source,
    })
}

fn run_site(args: SiteArgs) -> Result<(), PurgeError> {
    let options = args.filter.to_options()?;
    let css = read_file(&args.css)?;
    let sources = load_content_sources(&args.pages)?;
    let pages: Vec<(String, ContentSource)> = args
        .pages
        .iter()
        .map(|path| page_name(path))
        .zip(sources)
        .collect();

    for (page, purged) in purge_site(&css, &pages, &options)? {
        let out_path = args.out_dir.join(format!("{}.css", page));
        fs::write(&out_path, purged.css).map_err(|source| PurgeError::Io {
            path: out_path.clone(),
            source,
        })?;
        info!("wrote {}", out_path.display());
    }
    Ok(())
}

fn run_inline(args: InlineArgs) -> Result<(), PurgeError> {
    let options = args.filter.to_options()?;
    let html = read_file(&args.html)?;
    let purged = purge_inline_style(&html, &options)?;
    print!("{}", purged);
    Ok(())
}

/// Print every non-empty stylesheet; an empty result prints nothing at all.
fn write_output<W: Write>(out: &mut W, results: &[PurgedStylesheet]) -> io::Result<()> {
    for result in results.iter().filter(|r| !r.is_empty()) {
        writeln!(out, "{}", result.css.trim_end())?;
    }
    out.flush()
}

fn read_file(path: &Path) -> Result<String, PurgeError> {
    fs::read_to_string(path).map_err(|source| PurgeError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn page_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sheet(css: &str) -> PurgedStylesheet {
        PurgedStylesheet {
            css: css.to_string(),
            rejected: Vec::new(),
        }
    }

    #[test]
    fn test_empty_result_prints_nothing() {
        let mut out = Vec::new();
        write_output(&mut out, &[sheet(""), sheet("\n")]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_non_empty_result_ends_with_newline() {
        let mut out = Vec::new();
        write_output(&mut out, &[sheet(".box{color:red}"), sheet(""), sheet("a{b:c}\n")]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), ".box{color:red}\na{b:c}\n");
    }

    #[test]
    fn test_purge_args() {
        let args = Args::try_parse_from([
            "purgecss",
            "purge",
            "--raw",
            "--minify",
            "--safelist",
            "open",
            "--safelist-pattern",
            "^\\.js-",
            "<div class=\"box\"></div>",
            ".box{color:red}",
        ])
        .unwrap();
        let Command::Purge(purge_args) = args.command else {
            panic!("expected purge subcommand");
        };
        assert!(purge_args.raw);
        assert_eq!(purge_args.css, ".box{color:red}");
        let options = purge_args.filter.to_options().unwrap();
        assert!(options.minify && options.keyframes && options.font_face);
        assert_eq!(options.safelist, vec!["open".to_string()]);
        assert_eq!(options.safelist_patterns.len(), 1);
    }

    #[test]
    fn test_site_requires_pages() {
        assert!(Args::try_parse_from(["purgecss", "site", "a.css", "out"]).is_err());
    }

    #[test]
    fn test_page_name_is_file_stem() {
        assert_eq!(page_name(Path::new("site/about.html")), "about");
    }
}
