use crate::config::{FileConfig, Settings};
use crate::replacer::OutputPolicy;
use crate::report::ReportFormat;
use crate::resolver::Target;
use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};

/// Apply pattern:replacement substitutions to files, directories and strings.
///
/// Rules come from `-c` pairs and JSON dictionaries. They are applied in
/// order to every line, each rule seeing the output of the ones before it.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Apply pattern:replacement substitutions to files, directories and strings",
    long_about = "rewriter - apply ordered regex substitutions line by line.

Without --replace or --new-file, results are printed to standard output.

QUICK EXAMPLES:
  rewriter -c 'colour:color' -f notes.txt          # Print the changed file
  rewriter -d fixes.json -f a.txt -n               # Write 'a -Changed.txt'
  rewriter -c 'v1:v2' -D docs -R -t md -r          # Rewrite docs/**/*.{txt,md} in place
  rewriter -d fixes.json -b -f a.txt -r            # Undo fixes.json on a.txt
  rewriter -e                                      # Write exampleDict.json"
)]
pub struct Args {
    /// A "pattern:replacement" change, split on the first ':'.
    #[arg(short = 'c', long = "change", value_name = "PATTERN:REPLACEMENT")]
    pub changes: Vec<String>,

    /// A JSON dictionary of pattern/replacement pairs.
    #[arg(short = 'd', long = "dictionary", value_name = "PATH")]
    pub dictionaries: Vec<PathBuf>,

    /// A file to process.
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// A literal string to process; the result is printed.
    #[arg(short = 's', long = "string", value_name = "TEXT")]
    pub strings: Vec<String>,

    /// A directory whose matching files are processed.
    #[arg(short = 'D', long = "dir", value_name = "PATH")]
    pub dirs: Vec<PathBuf>,

    /// Descend into subdirectories of every --dir.
    #[arg(short = 'R', long)]
    pub recursive: bool,

    /// Process every matching file under the current directory, recursively.
    #[arg(short = 'a', long)]
    pub all: bool,

    /// An extra file suffix to process in directories (`.txt` is always included).
    #[arg(short = 't', long = "type", value_name = "SUFFIX", value_delimiter = ',')]
    pub types: Vec<String>,

    /// Swap pattern and replacement of every rule.
    #[arg(short = 'b', long)]
    pub backwards: bool,

    /// Lower-case the input before applying any rule.
    #[arg(short = 'l', long)]
    pub lowercase: bool,

    /// Replace the original files instead of creating changed copies.
    #[arg(short = 'r', long)]
    pub replace: bool,

    /// Write changed copies named '<name> -Changed.<ext>'.
    #[arg(short = 'n', long = "new-file")]
    pub new_file: bool,

    /// Create an example dictionary (exampleDict.json) in the current directory.
    #[arg(short = 'e', long)]
    pub example: bool,

    /// Path to a YAML configuration file.
    #[arg(long, value_name = "PATH", env = "REWRITER_CONFIG")]
    pub config: Option<PathBuf>,

    /// The format of the end-of-run report written to standard error.
    #[arg(long, value_enum)]
    pub report: Option<ReportFormat>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Merges the command line over `file`. Config dictionaries load first;
    /// config types and command-line types are both accepted.
    pub fn settings(&self, file: FileConfig) -> Settings {
        let mut dictionaries = file.dictionaries;
        dictionaries.extend(self.dictionaries.iter().cloned());

        let mut types = file.types;
        types.extend(self.types.iter().cloned());

        Settings {
            changes: self.changes.clone(),
            dictionaries,
            reverse: self.backwards,
            lowercase: self.lowercase || file.lowercase,
            policy: OutputPolicy::from_flags(self.replace, self.new_file),
            types,
            report: self.report.or(file.report).unwrap_or_default(),
        }
    }

    /// The targets in processing order: `--all`, directories, files, strings.
    pub fn targets(&self, working_dir: &Path) -> Vec<Target> {
        let mut targets = Vec::new();
        if self.all {
            targets.push(Target::Directory {
                path: working_dir.to_path_buf(),
                recursive: true,
            });
        }
        targets.extend(self.dirs.iter().map(|d| Target::Directory {
            path: d.clone(),
            recursive: self.recursive,
        }));
        targets.extend(self.files.iter().cloned().map(Target::File));
        targets.extend(self.strings.iter().cloned().map(Target::Text));
        targets
    }
}

/// Parses command-line arguments and returns the populated `Args` struct.
pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_and_delimited_flags() {
        let args = Args::try_parse_from([
            "rewriter", "-c", "a:b", "-c", "c:d", "-t", "md,rst", "-t", ".org", "-f", "x.txt",
        ])
        .unwrap();
        assert_eq!(args.changes, vec!["a:b", "c:d"]);
        assert_eq!(args.types, vec!["md", "rst", ".org"]);
        assert_eq!(args.files, vec![PathBuf::from("x.txt")]);
    }

    #[test]
    fn test_settings_merge_config() {
        let args = Args::try_parse_from(["rewriter", "-d", "cli.json", "-t", "md", "-n"]).unwrap();
        let file = FileConfig {
            types: vec!["rst".into()],
            dictionaries: vec![PathBuf::from("cfg.json")],
            lowercase: true,
            report: Some(ReportFormat::Json),
        };

        let settings = args.settings(file);
        assert_eq!(
            settings.dictionaries,
            vec![PathBuf::from("cfg.json"), PathBuf::from("cli.json")]
        );
        assert_eq!(settings.types, vec!["rst", "md"]);
        assert!(settings.lowercase);
        assert_eq!(settings.policy, OutputPolicy::WriteNew);
        assert_eq!(settings.report, ReportFormat::Json);
    }

    #[test]
    fn test_cli_report_overrides_config() {
        let args = Args::try_parse_from(["rewriter", "--report", "none"]).unwrap();
        let file = FileConfig {
            report: Some(ReportFormat::Json),
            ..FileConfig::default()
        };
        assert_eq!(args.settings(file).report, ReportFormat::None);
    }

    #[test]
    fn test_targets_order() {
        let args = Args::try_parse_from([
            "rewriter", "-s", "text", "-f", "a.txt", "-D", "docs", "-R", "-a",
        ])
        .unwrap();
        let targets = args.targets(Path::new("/work"));
        assert_eq!(
            targets,
            vec![
                Target::Directory {
                    path: PathBuf::from("/work"),
                    recursive: true,
                },
                Target::Directory {
                    path: PathBuf::from("docs"),
                    recursive: true,
                },
                Target::File(PathBuf::from("a.txt")),
                Target::Text("text".into()),
            ]
        );
    }
}
