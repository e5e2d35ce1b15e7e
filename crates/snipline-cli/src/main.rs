use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use snipline_config::Config;
use snipline_engine::{
    Evaluators, ExpansionContext, MemoryHost, Position, SnippetInstance, SystemShell,
};
use std::{env, io::Read, io::stdout, process};

mod logging;
mod play;

const USAGE: &str = "Usage: snipline-cli <expand|play> <template-file|-> [--visual TEXT] [--dump]";

struct Args {
    command: String,
    template_path: String,
    visual: String,
    dump: bool,
}

fn parse_args(args: &[String]) -> Option<Args> {
    let mut rest = args.iter().skip(1);
    let command = rest.next()?.clone();
    let template_path = rest.next()?.clone();
    let mut parsed = Args {
        command,
        template_path,
        visual: String::new(),
        dump: false,
    };
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--visual" => parsed.visual = rest.next()?.clone(),
            "--dump" => parsed.dump = true,
            _ => return None,
        }
    }
    Some(parsed)
}

/// Reads a template file, or stdin for `-`. The newline ending the file
/// is not part of the snippet.
fn read_template(path: &str) -> Result<String> {
    let mut template = String::new();
    if path == "-" {
        std::io::stdin().read_to_string(&mut template)?;
    } else {
        template = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read template '{path}'"))?;
    }
    if template.ends_with('\n') {
        template.pop();
    }
    Ok(template)
}

/// A scratch buffer carrying the configured indent settings.
fn host_for(config: &Config) -> MemoryHost {
    let mut host = MemoryHost::new("");
    for (name, value) in config.indent.as_options() {
        host.set_option(name, value);
    }
    host
}

fn expansion_context(config: &Config, visual: String) -> Result<ExpansionContext> {
    let tracer = match &config.log_file {
        Some(path) => Some(logging::file_tracer(path)?),
        None => None,
    };
    Ok(ExpansionContext {
        visual,
        evaluators: Evaluators::new(SystemShell::new(config.shell_timeout())),
        tracer,
        ..Default::default()
    })
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let Some(args) = parse_args(&args) else {
        eprintln!("{USAGE}");
        process::exit(1);
    };

    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", Config::config_path().display());
            process::exit(1);
        }
    };

    let template = read_template(&args.template_path)?;
    let host = host_for(&config);
    let ctx = expansion_context(&config, args.visual)?;

    match args.command.as_str() {
        "expand" => expand(&template, host, ctx, args.dump),
        "play" => play(&template, host, ctx),
        _ => {
            eprintln!("{USAGE}");
            process::exit(1);
        }
    }
}

fn expand(template: &str, mut host: MemoryHost, ctx: ExpansionContext, dump: bool) -> Result<()> {
    let snippet = SnippetInstance::instantiate(&mut host, template, Position::default(), ctx)?;
    println!("{}", host.text());
    if dump {
        print!("{}", snippet.dump());
    }
    Ok(())
}

fn play(template: &str, host: MemoryHost, ctx: ExpansionContext) -> Result<()> {
    let mut app = play::App::new(template, host, ctx)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = play::run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }
    println!("{}", app.text());

    Ok(())
}
