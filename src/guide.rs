pub mod error;
pub mod import;
pub mod navigator;
pub mod node;
pub mod scenarios;
pub mod tree;

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::catalog::{self, Device, Field, Filter};
use crate::store::Store;
use navigator::{Navigator, Selection};
use node::{DecisionNode, DecisionOption};
use tree::DecisionTree;

/// Env var overriding [`GuideConfig::progress_steps`].
pub const PROGRESS_STEPS_ENV: &str = "TROUBLE_GUIDE_PROGRESS_STEPS";

const BAR_WIDTH: usize = 20;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideConfig {
    /// Step count treated as a full progress bar. Deeper walks just show 100%.
    pub progress_steps: usize,
    /// Open this device's guide straight away instead of showing the list.
    pub start_device: Option<String>,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            progress_steps: 5,
            start_device: None,
        }
    }
}

impl GuideConfig {
    /// Defaults, with `progress_steps` taken from the environment when set.
    pub fn from_env(start_device: Option<String>) -> Self {
        let raw = std::env::var(PROGRESS_STEPS_ENV).ok();
        Self::with_progress_steps(start_device, raw.as_deref())
    }

    /// Defaults, with `progress_steps` parsed from `raw` if it is a number.
    fn with_progress_steps(start_device: Option<String>, raw: Option<&str>) -> Self {
        let mut config = Self {
            start_device,
            ..Self::default()
        };
        if let Some(raw) = raw {
            match raw.trim().parse() {
                Ok(steps) => config.progress_steps = steps,
                Err(_) => warn!("Ignoring {PROGRESS_STEPS_ENV}={raw:?}: not a number"),
            }
        }
        config
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    )
}

/// The question screen: progress line, question, description and options.
fn render_node(nav: &Navigator, node: &DecisionNode, config: &GuideConfig) -> String {
    let mut s = String::new();

    s.push_str("\n----------------------------------------\n");
    if !nav.history().is_empty() {
        s.push_str(&format!(
            "Step {} of troubleshooting {}\n\n",
            nav.progress(),
            progress_bar(nav.progress_percent(config.progress_steps))
        ));
    }

    s.push_str(&node.question);
    s.push('\n');
    if let Some(description) = &node.description {
        s.push_str(&format!("  {description}\n"));
    }
    s.push('\n');

    for (i, option) in node.options.iter().enumerate() {
        let marker = if option.has_solution() { "✓" } else { "→" };
        s.push_str(&format!("  [{}] {} {}\n", i + 1, marker, option.text));
    }

    if nav.is_terminal(node) {
        if let Some(panel) = render_solution_panel(node) {
            s.push_str(&panel);
        }
    }

    s.push_str("\n  [b] Back    [r] Restart    [d] Devices    [q] Quit\n");
    s
}

/// The "Recommended Solution" panel, for nodes that carry a solution.
fn render_solution_panel(node: &DecisionNode) -> Option<String> {
    let solution = node.solution.as_deref()?;

    let mut s = format!("\n  Recommended Solution\n  {solution}\n");
    if let Some(info) = &node.additional_info {
        s.push_str(&format!("\n  Additional Information: {info}\n"));
    }
    Some(s)
}

fn render_inline_solution(option: &DecisionOption) -> String {
    let mut s = format!("\n  {}\n", option.text);
    match &option.solution {
        Some(solution) if option.has_solution() => {
            s.push_str(&format!("  Solution: {solution}\n"));
        }
        _ => s.push_str("  (No further steps for this option.)\n"),
    }
    if let Some(info) = &option.additional_info {
        s.push_str(&format!("  Additional Information: {info}\n"));
    }
    s
}

fn render_device_list(devices: &[&Device]) -> String {
    let mut s = String::new();
    if devices.is_empty() {
        s.push_str("  No devices found matching your criteria.\n");
    }
    for (i, device) in devices.iter().enumerate() {
        s.push_str(&format!(
            "  [{}] {} ({}, {} / {})\n",
            i + 1,
            device.name,
            device.model,
            device.core_device,
            device.brand_name
        ));
    }
    s
}

fn read_command<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Option<String>> {
    write!(out, "> ")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

// ---------------------------------------------------------------------------
// Troubleshooting session
// ---------------------------------------------------------------------------

/// How a session for one device ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    BackToDevices,
    Quit,
}

/// Walk one device's tree with the agent until they leave or quit.
pub fn run_session<R: BufRead, W: Write>(
    tree: &DecisionTree,
    config: &GuideConfig,
    input: &mut R,
    out: &mut W,
) -> Result<SessionEnd> {
    let mut nav = Navigator::new(tree)
        .with_context(|| format!("cannot open decision tree for {}", tree.device_id))?;
    let mut redraw = true;

    info!("Session started for {}", tree.device_id);

    loop {
        let node = nav.current()?;
        if redraw {
            write!(out, "{}", render_node(&nav, node, config))?;
        }
        redraw = true;

        let Some(command) = read_command(input, out)? else {
            return Ok(SessionEnd::Quit);
        };

        match command.to_lowercase().as_str() {
            "q" | "quit" | "exit" => return Ok(SessionEnd::Quit),
            "d" | "devices" => return Ok(SessionEnd::BackToDevices),
            "b" | "back" => {
                if nav.history().is_empty() {
                    writeln!(out, "(Already at the first question.)")?;
                    redraw = false;
                } else {
                    nav.back()?;
                }
            }
            "r" | "restart" => {
                nav.restart();
            }
            other => {
                let picked = other
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| node.options.get(i));

                let Some(option) = picked else {
                    writeln!(
                        out,
                        "  Pick an option number (1-{}), or b / r / d / q.",
                        node.options.len()
                    )?;
                    redraw = false;
                    continue;
                };

                match nav.select(&option.id) {
                    Ok(Selection::Resolved { option, .. }) => {
                        write!(out, "{}", render_inline_solution(option))?;
                        redraw = false;
                    }
                    Ok(step) => debug!("Now at {}", step.node().id),
                    Err(e) => {
                        warn!(
                            "Navigation failed in {} at {}: {e}",
                            tree.device_id,
                            nav.current_node_id()
                        );
                        writeln!(out, "  Error: {e}")?;
                        writeln!(out, "  This procedure needs fixing; please notify a supervisor.")?;
                        redraw = false;
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Device selection
// ---------------------------------------------------------------------------

fn parse_filter(command: &str) -> Option<Filter> {
    let (kind, value) = command.split_once(':')?;
    let value = value.trim().to_string();
    match kind.trim().to_lowercase().as_str() {
        "brand" => Some(Filter::Brand(value)),
        "type" => Some(Filter::CoreDevice(value)),
        _ => None,
    }
}

/// Open the guide for `device`. Returns `true` when the agent quit.
fn open_device<S: Store, R: BufRead, W: Write>(
    store: &S,
    device: &Device,
    config: &GuideConfig,
    input: &mut R,
    out: &mut W,
) -> Result<bool> {
    writeln!(out, "\n========================================")?;
    writeln!(out, "  {}  (Model: {})", device.name, device.model)?;
    writeln!(out, "========================================")?;

    let Some(tree) = store.tree(&device.id)? else {
        writeln!(out, "\n  Decision Tree Not Available")?;
        writeln!(
            out,
            "  The troubleshooting guide for {} is not yet available.\n  \
             Please contact a supervisor or check for updated procedures.",
            device.name
        )?;
        return Ok(false);
    };

    match run_session(&tree, config, input, out) {
        Ok(end) => Ok(end == SessionEnd::Quit),
        Err(e) => {
            // A broken tree for one device must not lock the agent out of the rest.
            warn!("{e:#}");
            writeln!(out, "\n  Error: {e:#}")?;
            Ok(false)
        }
    }
}

/// Device picker loop: search, filter, then troubleshoot the chosen device.
pub fn run<S: Store, R: BufRead, W: Write>(
    store: &S,
    config: &GuideConfig,
    mut input: R,
    mut out: W,
) -> Result<()> {
    if let Some(id) = &config.start_device {
        let devices = store.devices()?;
        match devices.iter().find(|d| &d.id == id) {
            Some(device) => {
                if open_device(store, device, config, &mut input, &mut out)? {
                    writeln!(out, "Goodbye.")?;
                    return Ok(());
                }
            }
            None => writeln!(out, "Unknown device '{id}'.")?,
        }
    }

    let mut term = String::new();
    let mut filter = Filter::All;

    loop {
        let devices = store.devices()?;
        let matches = catalog::search(&devices, &term, &filter);

        writeln!(out, "\n========================================")?;
        writeln!(out, "   TECH SUPPORT: SELECT A DEVICE")?;
        writeln!(out, "========================================")?;
        writeln!(
            out,
            "  Types:  {}",
            catalog::unique_values(&devices, Field::CoreDevice).join(", ")
        )?;
        writeln!(
            out,
            "  Brands: {}\n",
            catalog::unique_values(&devices, Field::BrandName).join(", ")
        )?;
        write!(out, "{}", render_device_list(&matches))?;
        writeln!(
            out,
            "\n  Number to open, text (or /text) to search, type:<x> or brand:<x> to filter, \
             Enter to reset, q to quit"
        )?;

        let Some(command) = read_command(&mut input, &mut out)? else {
            break;
        };

        if command.eq_ignore_ascii_case("q") || command.eq_ignore_ascii_case("quit") {
            break;
        }
        if command.is_empty() {
            term.clear();
            filter = Filter::All;
            continue;
        }
        if let Some(f) = parse_filter(&command) {
            filter = f;
            continue;
        }
        if let Some(text) = command.strip_prefix('/') {
            term = text.to_string();
            continue;
        }
        // Only a number naming a listed device picks it; "2024" is a search.
        let picked = command
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| matches.get(i));
        if let Some(device) = picked {
            info!("Agent opened {}", device.id);
            if open_device(store, device, config, &mut input, &mut out)? {
                break;
            }
            continue;
        }
        term = command;
    }

    writeln!(out, "Goodbye.")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::store::JsonStore;

    fn session(tree: &DecisionTree, script: &str) -> (SessionEnd, String) {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut out = Vec::new();
        let end = run_session(tree, &GuideConfig::default(), &mut input, &mut out).unwrap();
        (end, String::from_utf8(out).unwrap())
    }

    fn guide(script: &str, config: GuideConfig) -> String {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        let mut out = Vec::new();
        run(&store, &config, Cursor::new(script.as_bytes().to_vec()), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(40), "[########------------] 40%");
        assert_eq!(progress_bar(100), "[####################] 100%");
    }

    #[test]
    fn test_session_outlet_walkthrough() {
        let tree = scenarios::hair_dryer_pro_scenario();
        let (end, output) = session(&tree, "1\n2\n2\nb\nb\nq\n");

        assert_eq!(end, SessionEnd::Quit);
        assert!(output.contains("Is the device plugged into a working outlet?"));
        assert!(output.contains("Step 2 of troubleshooting [########"));
        assert!(output.contains("Step 3 of troubleshooting"));
        assert!(output.contains(
            "Solution: The issue is with the electrical outlet, not the device."
        ));
        // Two backs land on the first question again, without a step line.
        let last_screen = output.rsplit("------").next().unwrap();
        assert!(last_screen.contains("What type of issue is the customer experiencing?"));
        assert!(!last_screen.contains("Step "));
    }

    #[test]
    fn test_session_back_at_root_and_bad_input() {
        let tree = scenarios::hair_dryer_pro_scenario();
        let (end, output) = session(&tree, "b\n9\nwhat\nd\n");

        assert_eq!(end, SessionEnd::BackToDevices);
        assert!(output.contains("(Already at the first question.)"));
        assert_eq!(output.matches("Pick an option number (1-5)").count(), 2);
    }

    #[test]
    fn test_session_restart_and_eof() {
        let tree = scenarios::hair_dryer_pro_scenario();
        let (end, output) = session(&tree, "2\n1\nr\n");

        assert_eq!(end, SessionEnd::Quit);
        assert!(output.contains("Is the heat setting turned to maximum?"));
        assert_eq!(
            output
                .matches("What type of issue is the customer experiencing?")
                .count(),
            2
        );
    }

    #[test]
    fn test_session_reports_dangling_reference() {
        let mut tree = scenarios::straightener_elite_scenario();
        tree.nodes.get_mut("straightener-initial").unwrap().options[0].next_node_id =
            Some("gone".into());
        let (_, output) = session(&tree, "1\nq\n");

        assert!(output.contains("Error: option 'not-heating' of node 'straightener-initial' points to missing node 'gone'"));
    }

    #[test]
    fn test_solution_panel_for_terminal_node() {
        let node = DecisionNode {
            id: "done".into(),
            question: "Resolution".into(),
            description: None,
            options: vec![],
            is_terminal: Some(true),
            solution: Some("Process an RMA.".into()),
            additional_info: Some("Expedite.".into()),
        };
        let panel = render_solution_panel(&node).unwrap();
        assert!(panel.contains("Recommended Solution\n  Process an RMA."));
        assert!(panel.contains("Additional Information: Expedite."));

        let tree = DecisionTree::from_nodes("dev", "done", vec![node]);
        let (_, output) = session(&tree, "q\n");
        assert!(output.contains("Recommended Solution"));
    }

    #[test]
    fn test_no_panel_for_non_terminal_node() {
        let mut tree = scenarios::hair_dryer_pro_scenario();
        tree.nodes.get_mut("initial-problem").unwrap().solution = Some("Not shown".into());
        let nav = Navigator::new(&tree).unwrap();

        let screen = render_node(&nav, nav.current().unwrap(), &GuideConfig::default());
        assert!(!screen.contains("Recommended Solution"));
        assert!(!screen.contains("Not shown"));
    }

    #[test]
    fn test_guide_missing_tree_message() {
        let output = guide("brand:Armani\n1\nq\n", GuideConfig::default());

        assert!(output.contains("[1] KSCAN by Armani"));
        assert!(output.contains("Decision Tree Not Available"));
        assert!(output.contains("The troubleshooting guide for KSCAN by Armani is not yet available."));
        assert!(output.ends_with("Goodbye.\n"));
    }

    #[test]
    fn test_guide_search_then_open_and_quit() {
        let output = guide("straightener\n1\n2\nq\n", GuideConfig::default());

        assert!(output.contains("[1] Straightener Elite X1"));
        assert!(output.contains("Solution: Uneven plate heating"));
        assert_eq!(output.matches("Goodbye.").count(), 1);
    }

    #[test]
    fn test_guide_start_device() {
        let config = GuideConfig {
            start_device: Some("hair-dryer-pro-2024".into()),
            ..GuideConfig::default()
        };
        let output = guide("d\nnothing-matches\nq\n", config);

        assert!(output.contains("Hair Dryer Pro 2024  (Model: HD-2024-PRO)"));
        assert!(output.contains("No devices found matching your criteria."));
    }

    #[test]
    fn test_guide_numeric_search() {
        let output = guide("2024\nq\n", GuideConfig::default());

        // Unfiltered, slot 5 is the LED mask; after the search it is KSCAN.
        assert!(output.contains("[5] LED Therapy Mask"));
        assert!(output.contains("[5] KSCAN by Armani"));
        assert!(output.ends_with("Goodbye.\n"));
    }

    #[test]
    fn test_guide_number_picks_from_search_results() {
        let output = guide("2024\n2\nq\n", GuideConfig::default());
        assert!(output.contains("The troubleshooting guide for Curling Iron Deluxe is not yet available."));

        // Out of range numbers and the / prefix both search.
        let output = guide("99\n/3\nq\n", GuideConfig::default());
        assert_eq!(output.matches("No devices found matching your criteria.").count(), 2);
        assert!(!output.contains("(Model:"));
    }

    #[test]
    fn test_guide_filter_value_ignores_case() {
        let output = guide("brand:armani\nq\n", GuideConfig::default());
        let last_screen = output.rsplit("SELECT A DEVICE").next().unwrap();

        assert!(last_screen.contains("[1] KSCAN by Armani"));
        assert!(last_screen.contains("[2] Armani Hair Dryer Elite"));
        assert!(!last_screen.contains("[3]"));
    }

    #[test]
    fn test_progress_steps_override() {
        let config = GuideConfig::with_progress_steps(None, Some(" 8 "));
        assert_eq!(config.progress_steps, 8);

        let config = GuideConfig::with_progress_steps(Some("kscan-armani".into()), Some("lots"));
        assert_eq!(
            config,
            GuideConfig {
                start_device: Some("kscan-armani".into()),
                ..GuideConfig::default()
            }
        );

        assert_eq!(
            GuideConfig::with_progress_steps(None, None),
            GuideConfig::default()
        );
    }

    #[test]
    fn test_progress_steps_from_env() {
        std::env::set_var(PROGRESS_STEPS_ENV, "3");
        let config = GuideConfig::from_env(None);
        std::env::remove_var(PROGRESS_STEPS_ENV);

        assert_eq!(config.progress_steps, 3);
        let tree = scenarios::hair_dryer_pro_scenario();
        let mut nav = Navigator::new(&tree).unwrap();
        nav.select("power-issue").unwrap();
        let screen = render_node(&nav, nav.current().unwrap(), &config);
        assert!(screen.contains("Step 2 of troubleshooting [#############-------] 66%"));
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter("brand: Armani"),
            Some(Filter::Brand("Armani".into()))
        );
        assert_eq!(
            parse_filter("Type:Hair Dryer"),
            Some(Filter::CoreDevice("Hair Dryer".into()))
        );
        assert_eq!(parse_filter("model:x"), None);
        assert_eq!(parse_filter("dryer"), None);
    }
}
