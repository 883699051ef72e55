//! safesax CLI: extract text and count elements along schema paths.

use clap::Parser;
use safesax::listener::{element_fns, end_text};
use safesax::{Element, ParseOptions, QName, RootElement};
use std::cell::Cell;
use std::io::{IsTerminal, Read};
use std::process;
use std::rc::Rc;

#[derive(Parser)]
#[command(name = "safesax", about = "Schema-directed XML extraction")]
struct Cli {
    /// Input XML file (- for stdin)
    #[arg(default_value = "-")]
    input: String,

    /// Document element, `local` or `{uri}local`
    #[arg(long)]
    root: String,

    /// Print the text body of every element at PATH as `PATH<TAB>body`
    #[arg(long = "text", value_name = "PATH")]
    text: Vec<String>,

    /// Count elements at PATH; totals are printed after the parse
    #[arg(long = "count", value_name = "PATH")]
    count: Vec<String>,

    /// Require every element along PATH
    #[arg(long = "require", value_name = "PATH")]
    require: Vec<String>,

    /// Trim whitespace around each text body
    #[arg(long)]
    trim_text: bool,

    /// Maximum element nesting depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Accept end tags that do not match their start tag
    #[arg(long)]
    no_check_end_names: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let mut options = ParseOptions::default()
        .with_trim_text(cli.trim_text)
        .with_check_end_names(!cli.no_check_end_names);
    if let Some(depth) = cli.max_depth {
        options = options.with_max_depth(depth);
    }

    let (root, counters) = build_schema(&cli)?;

    if cli.input == "-" {
        let stdin = std::io::stdin();
        if stdin.is_terminal() {
            eprintln!("reading from stdin (Ctrl+D to finish)...");
        }
        parse(&root, stdin.lock(), &options)?;
    } else {
        let file = std::fs::File::open(&cli.input)
            .map_err(|e| format!("cannot read '{}': {e}", cli.input))?;
        parse(&root, file, &options)?;
    }

    for (path, count) in &counters {
        println!("{path}\t{}", count.get());
    }
    Ok(())
}

fn parse(root: &RootElement, reader: impl Read, options: &ParseOptions) -> Result<(), String> {
    root.parse_with_options(reader, options).map_err(|e| e.to_string())
}

type Counters = Vec<(String, Rc<Cell<usize>>)>;

/// Builds the schema from the command-line paths. Order matters: required
/// paths first, then text leaves, then counters.
fn build_schema(cli: &Cli) -> Result<(RootElement, Counters), String> {
    let root_name =
        QName::from_clark(&cli.root).ok_or_else(|| format!("invalid root name '{}'", cli.root))?;
    let mut root = RootElement::from_qname(root_name);

    for path in &cli.require {
        walk(&mut root, path, true)?;
    }

    for path in &cli.text {
        let label = path.clone();
        walk(&mut root, path, false)?
            .set_text_element_listener(end_text(move |body: &str| {
                println!("{label}\t{body}");
                Ok(())
            }))
            .map_err(|e| e.to_string())?;
    }

    let mut counters = Counters::new();
    for path in &cli.count {
        let count = Rc::new(Cell::new(0usize));
        let hits = Rc::clone(&count);
        walk(&mut root, path, false)?
            .set_element_listener(element_fns(
                move |_| {
                    hits.set(hits.get() + 1);
                    Ok(())
                },
                || Ok(()),
            ))
            .map_err(|e| e.to_string())?;
        counters.push((path.clone(), count));
    }

    Ok((root, counters))
}

/// Follows `path` below the root, creating nodes as needed. `.` is the root itself.
fn walk<'a>(root: &'a mut RootElement, path: &str, required: bool) -> Result<&'a mut Element, String> {
    let mut node: &mut Element = root;
    for segment in split_path(path)? {
        let next = if segment.starts_with('{') {
            let name = QName::from_clark(segment)
                .ok_or_else(|| format!("invalid path segment '{segment}' in '{path}'"))?;
            if required {
                node.require_child_ns(name.uri(), name.local_name())
            } else {
                node.get_child_ns(name.uri(), name.local_name())
            }
        } else if required {
            node.require_child(segment)
        } else {
            node.get_child(segment)
        };
        node = next.map_err(|e| e.to_string())?;
    }
    Ok(node)
}

/// Splits on `/` outside of `{...}`, so namespace URIs may contain slashes.
fn split_path(path: &str) -> Result<Vec<&str>, String> {
    if path == "." {
        return Ok(Vec::new());
    }
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_uri = false;
    for (i, ch) in path.char_indices() {
        match ch {
            '{' => in_uri = true,
            '}' => in_uri = false,
            '/' if !in_uri => {
                segments.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&path[start..]);
    if in_uri || segments.iter().any(|s| s.is_empty()) {
        return Err(format!("invalid path '{path}'"));
    }
    Ok(segments)
}
