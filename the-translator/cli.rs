use std::path::PathBuf;

use anyhow::{
  Result,
  bail,
};
use clap::{
  ArgAction,
  Parser,
  Subcommand,
};

#[derive(Clone, Debug)]
pub struct CliOptions {
  pub verbosity:   u8,
  pub log_file:    Option<PathBuf>,
  pub config_file: Option<PathBuf>,
  pub command:     Command,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
  pub path:   PathBuf,
  /// Upload to the document service instead of reading a JSON document.
  pub remote: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
  Show {
    source: Source,
    all:    bool,
    tags:   bool,
  },
  Translate {
    source:     Source,
    unit:       String,
    text:       String,
    file_index: usize,
    output:     Option<PathBuf>,
  },
  Check {
    source: Source,
  },
}

impl CliOptions {
  pub fn parse() -> Result<Self> {
    let raw = RawCli::parse();
    raw.try_into()
  }
}

#[derive(Parser, Debug)]
#[command(name = "the-translator", about, version, long_about = None)]
struct RawCli {
  /// Increase logging verbosity (repeat for more detail)
  #[arg(short = 'v', action = ArgAction::Count, global = true)]
  verbosity: u8,

  /// Save logs to a specific file
  #[arg(long = "log", value_name = "FILE", global = true)]
  log_file: Option<PathBuf>,

  /// Load configuration from a specific file
  #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
  config_file: Option<PathBuf>,

  #[command(subcommand)]
  command: RawCommand,
}

#[derive(Subcommand, Debug)]
enum RawCommand {
  /// Print every file and unit with tags shown as labels
  Show {
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Include units whose source is empty
    #[arg(long)]
    all: bool,

    /// List the attributes of every source tag
    #[arg(long)]
    tags: bool,

    /// Load through the document service
    #[arg(long)]
    remote: bool,
  },

  /// Replace one unit's target, save it and export the result
  Translate {
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Id of the translation unit to edit
    #[arg(long, value_name = "ID")]
    unit: String,

    /// New target text, with tag markers such as ⟨bpt⟩
    #[arg(long, value_name = "TEXT")]
    text: String,

    /// File of the document the unit belongs to
    #[arg(long, value_name = "N", default_value_t = 0)]
    file_index: usize,

    /// Where to write the exported document
    #[arg(short = 'o', long = "output", value_name = "OUT")]
    output: Option<PathBuf>,

    /// Load, save and export through the document service
    #[arg(long)]
    remote: bool,
  },

  /// Report targets whose markers do not match their tags
  Check {
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Load through the document service
    #[arg(long)]
    remote: bool,
  },
}

impl TryFrom<RawCli> for CliOptions {
  type Error = anyhow::Error;

  fn try_from(raw: RawCli) -> Result<Self> {
    let command = match raw.command {
      RawCommand::Show {
        file,
        all,
        tags,
        remote,
      } => {
        Command::Show {
          source: Source { path: file, remote },
          all,
          tags,
        }
      },
      RawCommand::Translate {
        file,
        unit,
        text,
        file_index,
        output,
        remote,
      } => {
        if unit.trim().is_empty() {
          bail!("--unit must name a translation unit");
        }
        Command::Translate {
          source: Source { path: file, remote },
          unit,
          text,
          file_index,
          output,
        }
      },
      RawCommand::Check { file, remote } => {
        Command::Check {
          source: Source { path: file, remote },
        }
      },
    };

    Ok(Self {
      verbosity: raw.verbosity,
      log_file: raw.log_file,
      config_file: raw.config_file,
      command,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(args: &[&str]) -> Result<CliOptions> {
    RawCli::try_parse_from(args)?.try_into()
  }

  #[test]
  fn parses_translate() {
    let options = parse(&[
      "the-translator",
      "-vv",
      "translate",
      "guide.json",
      "--unit",
      "u1",
      "--text",
      "Hallo ⟨bpt⟩Welt⟨ept⟩",
      "-o",
      "out.json",
    ])
    .unwrap();
    assert_eq!(options.verbosity, 2);
    assert_eq!(options.command, Command::Translate {
      source:     Source {
        path:   "guide.json".into(),
        remote: false,
      },
      unit:       "u1".to_string(),
      text:       "Hallo ⟨bpt⟩Welt⟨ept⟩".to_string(),
      file_index: 0,
      output:     Some("out.json".into()),
    });
  }

  #[test]
  fn global_flags_after_subcommand() {
    let options = parse(&["the-translator", "show", "a.xlf", "--remote", "--all", "-c", "x.toml"])
      .unwrap();
    assert_eq!(options.config_file, Some("x.toml".into()));
    assert!(matches!(
      options.command,
      Command::Show { all: true, tags: false, source: Source { remote: true, .. } }
    ));
  }

  #[test]
  fn rejects_blank_unit() {
    assert!(parse(&["the-translator", "translate", "a.json", "--unit", " ", "--text", "x"]).is_err());
  }
}
