use larch::{EngineError, Verdict};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_verdict(verdict: &Verdict, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Proving: \"{}\"", verdict.formula.trim()), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Tree ━━━", ansi::GRAY));
    for line in verdict.tree.lines() {
        println!("  {}", paint_tree_line(line, &palette));
    }

    println!("\n{}", palette.paint("━━━ Rules ━━━", ansi::GRAY));
    if verdict.log.rules.is_empty() {
        println!("{}", palette.dim("  No rule was needed"));
    }
    for used in &verdict.log.rules {
        let context = used.context.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(" ");
        println!(
            "  {} {} {} {}",
            palette.paint(format!("[{}]", used.layer), ansi::GRAY),
            palette.paint(&used.rule, ansi::BLUE),
            palette.dim(format!("│ branch {}", used.branch)),
            palette.dim(context),
        );
    }

    println!("\n{}", palette.paint("━━━ Verdict ━━━", ansi::GRAY));
    let summary = if verdict.tautology {
        palette.bold(palette.paint("✓ tautology", ansi::GREEN))
    } else if verdict.closed {
        palette.bold(palette.paint("✗ not a tautology (some branch is saturated without a contradiction)", ansi::YELLOW))
    } else {
        palette.bold(palette.paint("? the solver could not close the tree", ansi::RED))
    };
    println!("  {summary}");

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!(
        "  Total: {}  │  Applications: {}  │  Closures: {}  │  Backtracks: {}",
        palette.paint(format!("{:?}", verdict.metrics.total), ansi::GREEN),
        palette.paint(verdict.metrics.applications.to_string(), ansi::CYAN),
        palette.paint(verdict.metrics.closures.to_string(), ansi::CYAN),
        palette.dim(verdict.metrics.backtracks.to_string()),
    );
    for pass in verdict.metrics.passes.iter().filter(|p| p.applied > 0) {
        println!(
            "    {} {} {}",
            palette.paint(pass.rule, ansi::BLUE),
            palette.dim(format!("{:?}", pass.duration)),
            palette.paint(format!("applied {} closed {}", pass.applied, pass.closed), ansi::YELLOW),
        );
    }
    println!();
}

pub fn print_error(input: &str, err: &EngineError, color: bool) {
    let palette = ansi::Palette::new(color);
    eprintln!("{} {}", palette.bold(palette.paint("error:", ansi::RED)), err);

    let Some(position) = err.mistake().and_then(|m| m.extra.get("pos")).and_then(|v| v.as_u64()) else {
        return;
    };
    eprintln!("  {}", palette.dim(input.trim()));
    eprintln!("  {}", palette.dim(format!("(token {position} of the formula)")));
    eprintln!("\n{}", palette.dim("  Tip: Set LARCH_DEBUG_RULES=1 to see every rule application"));
}

fn paint_tree_line(line: &str, palette: &ansi::Palette) -> String {
    match line.rsplit_once("  [") {
        Some((formula, status)) if status.contains("contradiction") => {
            format!("{}  {}", formula, palette.paint(format!("[{status}"), ansi::GREEN))
        }
        Some((formula, status)) if status.contains("emptiness") => {
            format!("{}  {}", formula, palette.paint(format!("[{status}"), ansi::YELLOW))
        }
        Some((formula, status)) => format!("{}  {}", formula, palette.paint(format!("[{status}"), ansi::RED)),
        None => line.to_string(),
    }
}
