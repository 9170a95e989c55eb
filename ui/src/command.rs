use anyhow::Result;

pub const USAGE: &str = "Commands:
  search <place>          center the map on a place
  route <from> | <to>     draw every route between two places and drive the first one
  stop                    stop driving
  quit";

/// One line typed by the user
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Search(String),
    Route { from: String, to: String },
    Stop,
    Help,
    Quit,
}

impl Command {
    /// Blank lines give `None`
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let cmd = match verb.to_lowercase().as_str() {
            "search" => {
                if rest.is_empty() {
                    bail!("search needs a place");
                }
                Command::Search(rest.to_string())
            }
            "route" => {
                let (from, to) = match rest.split_once('|') {
                    Some((from, to)) => (from.trim(), to.trim()),
                    None => {
                        bail!("route needs two places separated by |, like \"route Mainz | Wiesbaden\"")
                    }
                };
                if from.is_empty() || to.is_empty() {
                    bail!("route needs a place on both sides of the |");
                }
                Command::Route {
                    from: from.to_string(),
                    to: to.to_string(),
                }
            }
            "stop" => Command::Stop,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            x => bail!("Unknown command {x:?}\n{USAGE}"),
        };
        Ok(Some(cmd))
    }
}
