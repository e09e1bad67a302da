//! Line commands accepted by the interactive browser.

use client_core::controller::Action;
use shared::domain::{SocCode, SortKey};

pub const PAGE_SIZE_CHOICES: [u32; 3] = [10, 20, 50];

pub const HELP: &str = "\
commands:
  search <text>        type into the search box (debounced)
  find <text>          search immediately
  sort <ai|employment> change listing order
  next | prev          move between pages
  page <n>             jump to a page
  size <10|20|50>      change page size
  version <label>      switch data version
  open <soc code>      load occupation detail
  show                 print the current view
  help                 print this help
  quit                 leave";

#[derive(Debug)]
pub enum ReplCommand {
    Dispatch(Action),
    Show,
    Help,
    Quit,
}

pub fn parse_page_size(raw: &str) -> Result<u32, String> {
    let size: u32 = raw
        .trim()
        .parse()
        .map_err(|_| format!("page size must be a number, got '{raw}'"))?;
    if PAGE_SIZE_CHOICES.contains(&size) {
        Ok(size)
    } else {
        Err(format!("page size must be one of {PAGE_SIZE_CHOICES:?}"))
    }
}

pub fn parse_command(line: &str) -> Result<ReplCommand, String> {
    let line = line.trim();
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let action = match verb.to_ascii_lowercase().as_str() {
        "" | "show" => return Ok(ReplCommand::Show),
        "help" | "?" => return Ok(ReplCommand::Help),
        "quit" | "exit" | "q" => return Ok(ReplCommand::Quit),
        // The raw text is kept as typed; trimming happens on commit.
        "search" => Action::SearchInput(rest.to_string()),
        "find" => Action::SubmitSearch(rest.to_string()),
        "sort" => Action::SetSort(rest.parse::<SortKey>().map_err(|err| err.to_string())?),
        "next" => Action::NextPage,
        "prev" | "previous" => Action::PreviousPage,
        "page" => Action::SetPage(
            rest.parse()
                .map_err(|_| format!("page must be a number, got '{rest}'"))?,
        ),
        "size" => Action::SetPageSize(parse_page_size(rest)?),
        "version" => Action::SetDataVersion(rest.to_string()),
        "open" => {
            if rest.is_empty() {
                return Err("open needs an occupation code".to_string());
            }
            Action::SelectOccupation(SocCode::from(rest))
        }
        other => return Err(format!("unknown command '{other}', try 'help'")),
    };
    Ok(ReplCommand::Dispatch(action))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_navigation_commands() {
        assert!(matches!(
            parse_command("next"),
            Ok(ReplCommand::Dispatch(Action::NextPage))
        ));
        assert!(matches!(
            parse_command("page 3"),
            Ok(ReplCommand::Dispatch(Action::SetPage(3)))
        ));
        assert!(matches!(
            parse_command("sort employment"),
            Ok(ReplCommand::Dispatch(Action::SetSort(SortKey::Employment)))
        ));
        assert!(matches!(parse_command("  "), Ok(ReplCommand::Show)));
        assert!(matches!(parse_command("QUIT"), Ok(ReplCommand::Quit)));
    }

    #[test]
    fn search_keeps_the_rest_of_the_line() {
        match parse_command("search registered nurse") {
            Ok(ReplCommand::Dispatch(Action::SearchInput(text))) => {
                assert_eq!(text, "registered nurse");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn open_requires_a_code() {
        assert!(parse_command("open").is_err());
        match parse_command("open 29-1141") {
            Ok(ReplCommand::Dispatch(Action::SelectOccupation(code))) => {
                assert_eq!(code.as_str(), "29-1141");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn page_size_is_limited_to_offered_choices() {
        assert_eq!(parse_page_size("50"), Ok(50));
        assert!(parse_page_size("25").is_err());
        assert!(parse_page_size("lots").is_err());
        assert!(parse_command("size 15").is_err());
    }

    #[test]
    fn unknown_command_is_reported() {
        let err = parse_command("delete everything").expect_err("unknown");
        assert!(err.contains("delete"));
    }
}
