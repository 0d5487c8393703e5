//! Terminal prompts behind the [`Selector`] and [`Confirmation`] ports.
//!
//! Every prompt accepts a number from the printed list or the item's name. An empty answer
//! takes the default shown in brackets.

use anyhow::{bail, Context};
use pbifix_core::ports::{Confirmation, ConfirmationRequest, FixerChoice, Selector};
use pbifix_pbir::PageRef;
use pbifix_types::RunMode;
use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::rc::Rc;

/// One input and one output shared by the selector and the confirmation gate.
///
/// Stdin is locked once for the whole run; both ports read through the same lock.
pub struct Terminal<R, W> {
    input: R,
    output: W,
}

pub type SharedTerminal<R, W> = Rc<RefCell<Terminal<R, W>>>;

impl Terminal<std::io::StdinLock<'static>, std::io::Stderr> {
    /// Prompts go to stderr so stdout only carries the change log.
    pub fn stdio() -> SharedTerminal<std::io::StdinLock<'static>, std::io::Stderr> {
        Terminal::shared(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn shared(input: R, output: W) -> SharedTerminal<R, W> {
        Rc::new(RefCell::new(Self { input, output }))
    }

    fn ask(&mut self, prompt: &str) -> anyhow::Result<String> {
        write!(self.output, "{prompt} ")?;
        self.output.flush()?;
        read_answer(&mut self.input)
    }

    fn choose_one(&mut self, heading: &str, options: &[String]) -> anyhow::Result<Option<String>> {
        if options.is_empty() {
            writeln!(self.output, "No {heading} found.")?;
            return Ok(None);
        }
        writeln!(self.output, "Select a {heading}:")?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "  {}) {}", i + 1, option)?;
        }
        let prompt = if options.len() == 1 {
            format!("{heading} [1]:")
        } else {
            format!("{heading}:")
        };
        let answer = self.ask(&prompt)?;
        if answer.is_empty() {
            return Ok((options.len() == 1).then(|| options[0].clone()));
        }
        pick(&answer, options)
            .map(|i| Some(options[i].clone()))
            .with_context(|| format!("invalid {heading} '{answer}'"))
    }
}

pub struct TerminalSelector<R, W> {
    terminal: SharedTerminal<R, W>,
}

impl<R: BufRead, W: Write> TerminalSelector<R, W> {
    pub fn new(terminal: SharedTerminal<R, W>) -> Self {
        Self { terminal }
    }
}

/// Index of `answer` in `options`, by 1-based number or case-insensitive name.
fn pick(answer: &str, options: &[String]) -> Option<usize> {
    if let Ok(n) = answer.parse::<usize>() {
        return (1..=options.len()).contains(&n).then(|| n - 1);
    }
    options.iter().position(|o| o.eq_ignore_ascii_case(answer))
}

fn read_answer(input: &mut impl BufRead) -> anyhow::Result<String> {
    let mut line = String::new();
    let read = input.read_line(&mut line).context("read answer")?;
    if read == 0 {
        bail!("input closed before an answer was given");
    }
    Ok(line.trim().to_string())
}

impl<R: BufRead, W: Write> Selector for TerminalSelector<R, W> {
    fn choose_workspace(&mut self, workspaces: &[String]) -> anyhow::Result<Option<String>> {
        self.terminal.borrow_mut().choose_one("workspace", workspaces)
    }

    fn choose_report(
        &mut self,
        _workspace: &str,
        reports: &[String],
    ) -> anyhow::Result<Option<String>> {
        self.terminal.borrow_mut().choose_one("report", reports)
    }

    fn choose_page(&mut self, pages: &[PageRef]) -> anyhow::Result<Option<String>> {
        if pages.is_empty() {
            return Ok(None);
        }
        let mut term = self.terminal.borrow_mut();
        writeln!(term.output, "Select a page:")?;
        writeln!(term.output, "  0) all pages")?;
        for (i, page) in pages.iter().enumerate() {
            writeln!(term.output, "  {}) {}", i + 1, page.display_name)?;
        }
        let answer = term.ask("page [0]:")?;
        if answer.is_empty() || answer == "0" {
            return Ok(None);
        }
        let names: Vec<String> = pages.iter().map(|p| p.display_name.clone()).collect();
        let index = pick(&answer, &names)
            .or_else(|| pages.iter().position(|p| p.id == answer))
            .with_context(|| format!("invalid page '{answer}'"))?;
        Ok(Some(pages[index].id.clone()))
    }

    fn choose_fixers(&mut self, fixers: &[FixerChoice]) -> anyhow::Result<Vec<String>> {
        let mut term = self.terminal.borrow_mut();
        writeln!(term.output, "Select fixers (numbers or keys, comma separated; 'all'):")?;
        for (i, fixer) in fixers.iter().enumerate() {
            writeln!(
                term.output,
                "  {:>2}) {:<32} [{}] {}",
                i + 1,
                fixer.title,
                fixer.layer.label(),
                fixer.key
            )?;
        }
        let answer = term.ask("fixers:")?;
        if answer.eq_ignore_ascii_case("all") {
            return Ok(fixers.iter().map(|f| f.key.to_string()).collect());
        }
        let keys: Vec<String> = fixers.iter().map(|f| f.key.to_string()).collect();
        let mut chosen = Vec::new();
        for token in answer
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let index = pick(token, &keys).with_context(|| format!("invalid fixer '{token}'"))?;
            if !chosen.contains(&keys[index]) {
                chosen.push(keys[index].clone());
            }
        }
        Ok(chosen)
    }

    fn choose_mode(&mut self) -> anyhow::Result<RunMode> {
        let mut term = self.terminal.borrow_mut();
        writeln!(term.output, "Select a mode:")?;
        for (i, mode) in RunMode::ALL.iter().enumerate() {
            writeln!(term.output, "  {}) {}", i + 1, mode.label())?;
        }
        let answer = term.ask("mode [scan]:")?;
        if answer.is_empty() {
            return Ok(RunMode::Scan);
        }
        if let Ok(n) = answer.parse::<usize>() {
            return RunMode::ALL
                .get(n.wrapping_sub(1))
                .copied()
                .with_context(|| format!("invalid mode '{answer}'"));
        }
        answer.parse::<RunMode>().map_err(anyhow::Error::msg)
    }
}

/// Asks `[y/N]` before the semantic model is touched.
pub struct TerminalConfirmation<R, W> {
    terminal: SharedTerminal<R, W>,
}

impl<R: BufRead, W: Write> TerminalConfirmation<R, W> {
    pub fn new(terminal: SharedTerminal<R, W>) -> Self {
        Self { terminal }
    }
}

impl<R: BufRead, W: Write> Confirmation for TerminalConfirmation<R, W> {
    fn confirm(&mut self, request: &ConfirmationRequest) -> anyhow::Result<bool> {
        let mut term = self.terminal.borrow_mut();
        writeln!(
            term.output,
            "{} will modify semantic model '{}':",
            request.mode.label(),
            request.dataset
        )?;
        for title in &request.fixers {
            writeln!(term.output, "  - {title}")?;
        }
        writeln!(
            term.output,
            "A modified model can no longer be downloaded with the report's data."
        )?;
        let answer = match term.ask("Continue? [y/N]") {
            Ok(answer) => answer,
            Err(_) => return Ok(false),
        };
        Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbifix_types::Layer;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn selector(input: &str) -> TerminalSelector<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalSelector::new(terminal(input))
    }

    fn terminal(input: &str) -> SharedTerminal<Cursor<Vec<u8>>, Vec<u8>> {
        Terminal::shared(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn shown(terminal: &SharedTerminal<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(terminal.borrow().output.clone()).unwrap()
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn choices() -> Vec<FixerChoice> {
        vec![
            FixerChoice {
                key: "page-size",
                title: "Set Page Size",
                layer: Layer::Report,
            },
            FixerChoice {
                key: "pie-charts",
                title: "Fix Pie Charts",
                layer: Layer::Report,
            },
            FixerChoice {
                key: "calendar-table",
                title: "Add Calendar Table",
                layer: Layer::Model,
            },
        ]
    }

    #[test]
    fn test_choose_by_number_or_name() {
        let options = names(&["Finance", "Sales"]);
        assert_eq!(
            selector("2\n").choose_workspace(&options).unwrap(),
            Some("Sales".to_string())
        );
        assert_eq!(
            selector("finance\n").choose_workspace(&options).unwrap(),
            Some("Finance".to_string())
        );
        assert!(selector("7\n").choose_workspace(&options).is_err());
    }

    #[test]
    fn test_empty_answer_takes_single_option() {
        let one = names(&["Finance"]);
        assert_eq!(
            selector("\n").choose_workspace(&one).unwrap(),
            Some("Finance".to_string())
        );
        let two = names(&["Finance", "Sales"]);
        assert_eq!(selector("\n").choose_report("Finance", &two).unwrap(), None);
    }

    #[test]
    fn test_closed_input_is_an_error() {
        assert!(selector("").choose_workspace(&names(&["a", "b"])).is_err());
    }

    #[test]
    fn test_choose_page_defaults_to_all() {
        let pages = vec![
            PageRef {
                id: "p1".to_string(),
                display_name: "Overview".to_string(),
            },
            PageRef {
                id: "p2".to_string(),
                display_name: "Details".to_string(),
            },
        ];
        assert_eq!(selector("\n").choose_page(&pages).unwrap(), None);
        assert_eq!(
            selector("details\n").choose_page(&pages).unwrap(),
            Some("p2".to_string())
        );
        assert_eq!(
            selector("1\n").choose_page(&pages).unwrap(),
            Some("p1".to_string())
        );
    }

    #[test]
    fn test_choose_fixers_mixes_numbers_and_keys() {
        let chosen = selector("3, page-size 3\n")
            .choose_fixers(&choices())
            .unwrap();
        assert_eq!(chosen, vec!["calendar-table", "page-size"]);

        let all = selector("ALL\n").choose_fixers(&choices()).unwrap();
        assert_eq!(all.len(), 3);

        assert!(selector("gauges\n").choose_fixers(&choices()).is_err());
    }

    #[test]
    fn test_choose_mode() {
        assert_eq!(selector("\n").choose_mode().unwrap(), RunMode::Scan);
        assert_eq!(selector("1\n").choose_mode().unwrap(), RunMode::Fix);
        assert_eq!(selector("scan-fix\n").choose_mode().unwrap(), RunMode::ScanFix);
        assert!(selector("0\n").choose_mode().is_err());
    }

    fn request() -> ConfirmationRequest {
        ConfirmationRequest {
            dataset: "Sales Model".to_string(),
            mode: RunMode::Fix,
            fixers: vec!["Add Calendar Table".to_string()],
        }
    }

    #[test]
    fn test_confirmation_defaults_to_no() {
        let term = terminal("\n");
        let mut confirm = TerminalConfirmation::new(Rc::clone(&term));
        assert!(!confirm.confirm(&request()).unwrap());
        let shown = shown(&term);
        assert!(shown.contains("semantic model 'Sales Model'"));
        assert!(shown.contains("  - Add Calendar Table"));

        let mut yes = TerminalConfirmation::new(terminal("Yes\n"));
        assert!(yes.confirm(&request()).unwrap());

        let mut closed = TerminalConfirmation::new(terminal(""));
        assert!(!closed.confirm(&request()).unwrap());
    }

    #[test]
    fn test_selector_and_confirmation_read_one_input() {
        let term = terminal("2\n3\n1\ny\n");
        let mut selector = TerminalSelector::new(Rc::clone(&term));
        let mut confirm = TerminalConfirmation::new(Rc::clone(&term));

        assert_eq!(
            selector.choose_workspace(&names(&["Finance", "Sales"])).unwrap(),
            Some("Sales".to_string())
        );
        assert_eq!(selector.choose_fixers(&choices()).unwrap(), vec!["calendar-table"]);
        assert_eq!(selector.choose_mode().unwrap(), RunMode::Fix);
        assert!(confirm.confirm(&request()).unwrap());

        let shown = shown(&term);
        let fixers = shown.find("fixers:").unwrap();
        let mode = shown.find("mode [scan]:").unwrap();
        let gate = shown.find("Continue? [y/N]").unwrap();
        assert!(fixers < mode && mode < gate);
    }
}
