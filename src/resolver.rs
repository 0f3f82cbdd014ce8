use crate::cli::Args;
use crate::config::{ConfigLoader, FileConfig};
use crate::dictionary::{self, JsonDictionary, MappingSource};
use crate::errors::{Error, Result};
use crate::replacer::{FileOutcome, OutputPolicy, Replacer};
use crate::report::{self, RunSummary};
use crate::rules;
use crate::transformer::LineTransformer;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// The suffix every directory walk accepts unless configured otherwise.
pub const DEFAULT_SUFFIX: &str = ".txt";

/// A unit of work for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A single file, processed regardless of its suffix.
    File(PathBuf),
    /// A literal string; always printed.
    Text(String),
    /// A directory whose allowed files are processed.
    Directory { path: PathBuf, recursive: bool },
}

/// The set of file suffixes accepted in directory mode.
///
/// Suffixes are stored lower-cased with a leading dot, so `md`, `.md` and
/// `.MD` are the same entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixFilter {
    suffixes: Vec<String>,
}

impl Default for SuffixFilter {
    fn default() -> Self {
        Self {
            suffixes: vec![DEFAULT_SUFFIX.to_string()],
        }
    }
}

impl SuffixFilter {
    /// The default `.txt` filter extended with `extra`.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::default();
        for suffix in extra {
            filter.add(suffix.as_ref());
        }
        filter
    }

    pub fn add(&mut self, suffix: &str) {
        let suffix = normalize_suffix(suffix);
        if suffix.len() > 1 && !self.suffixes.contains(&suffix) {
            self.suffixes.push(suffix);
        }
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|os| os.to_str())
            .map(|s| self.suffixes.contains(&format!(".{}", s.to_lowercase())))
            .unwrap_or(false)
    }
}

fn normalize_suffix(suffix: &str) -> String {
    format!(".{}", suffix.trim().trim_start_matches('.').to_lowercase())
}

/// Decides which units of text a run touches and hands each one to the
/// [`Replacer`].
pub struct Resolver {
    replacer: Replacer,
    policy: OutputPolicy,
    suffixes: SuffixFilter,
}

impl Resolver {
    pub fn new(replacer: Replacer, policy: OutputPolicy, suffixes: SuffixFilter) -> Self {
        Self {
            replacer,
            policy,
            suffixes,
        }
    }

    pub fn policy(&self) -> OutputPolicy {
        self.policy
    }

    /// Processes every target in order. Failures are logged and collected in
    /// the returned summary; they never stop the remaining targets.
    pub fn run<W: Write>(&self, targets: &[Target], out: &mut W) -> RunSummary {
        let mut summary = RunSummary::new();
        for target in targets {
            self.process_target(target, out, &mut summary);
        }
        summary
    }

    pub fn process_target<W: Write>(
        &self,
        target: &Target,
        out: &mut W,
        summary: &mut RunSummary,
    ) {
        match target {
            Target::File(path) => match self.process_file(path, out) {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    warn!("{e}");
                    summary.fail(path, e);
                }
            },
            Target::Text(text) => {
                let result = self.process_string(text);
                match writeln!(out, "{result}") {
                    Ok(()) => summary.strings_processed += 1,
                    Err(e) => summary.fail(Path::new(text), e),
                }
            }
            Target::Directory { path, recursive } => {
                if let Err(e) = self.process_directory(path, *recursive, out, summary) {
                    warn!("{e}");
                    summary.fail(path, e);
                }
            }
        }
    }

    /// File mode with this resolver's output policy.
    pub fn process_file<W: Write>(&self, path: &Path, out: &mut W) -> Result<FileOutcome> {
        self.replacer.process_file(path, self.policy, out)
    }

    /// String mode.
    pub fn process_string(&self, text: &str) -> String {
        self.replacer.transformer().process_string(text)
    }

    /// Directory mode.
    ///
    /// Entries are visited in file-name order. Files whose suffix passes the
    /// filter go through file mode; subdirectories are entered only when
    /// `recursive` is set. Symbolic links are followed, and each directory is
    /// entered at most once by canonical path, so link cycles terminate.
    ///
    /// Only an unreadable `root` is returned as an error. Failures below it
    /// are recorded in `summary`.
    pub fn process_directory<W: Write>(
        &self,
        root: &Path,
        recursive: bool,
        out: &mut W,
        summary: &mut RunSummary,
    ) -> Result<()> {
        debug!("Working through directory {}", root.display());

        let metadata = fs::metadata(root).map_err(|e| Error::file_access(root, e))?;
        if !metadata.is_dir() {
            return Err(Error::file_access(
                root,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
            ));
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .max_depth(max_depth)
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    if e.loop_ancestor().is_some() {
                        debug!("Skipping symlink cycle at {}", path.display());
                        continue;
                    }
                    if e.depth() == 0 {
                        let io = e
                            .into_io_error()
                            .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                        return Err(Error::file_access(path, io));
                    }
                    if !self.suffixes.matches(&path) {
                        debug!("Skipping unresolvable {}", path.display());
                        continue;
                    }
                    warn!("Could not read {}: {e}", path.display());
                    summary.fail(&path, e);
                    continue;
                }
            };

            let path = entry.path();
            if entry.file_type().is_dir() {
                let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
                if !visited.insert(canonical) {
                    debug!("Already visited {}, skipping", path.display());
                    walker.skip_current_dir();
                }
                continue;
            }

            if !entry.file_type().is_file() || !self.suffixes.matches(path) {
                debug!("Skipping {}", path.display());
                continue;
            }

            match self.process_file(path, out) {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    warn!("{e}");
                    summary.fail(path, e);
                }
            }
        }

        Ok(())
    }
}

/// The main entry point for a rewrite run.
///
/// This function handles:
/// 1. Writing the example dictionary when asked.
/// 2. Merging the configuration file with the command line.
/// 3. Building the rule set; an invalid rule aborts here, before any target.
/// 4. Processing every target, printing results to `out`.
/// 5. Writing the run report to `report_out`.
pub fn run_rewrite<W: Write, R: Write>(
    args: &Args,
    working_dir: &Path,
    out: &mut W,
    report_out: &mut R,
) -> Result<RunSummary> {
    if args.example {
        match dictionary::write_example(working_dir) {
            Ok(path) => info!("Example dictionary made at {}", path.display()),
            Err(e) => warn!("Error in creating example dictionary: {e}"),
        }
    }

    let file_config = match ConfigLoader::find_config(args.config.as_deref(), working_dir)? {
        Some(path) => {
            info!("Using config file {}", path.display());
            ConfigLoader::load(&path)?
        }
        None => FileConfig::default(),
    };
    let settings = args.settings(file_config);

    let dictionaries: Vec<JsonDictionary> = settings
        .dictionaries
        .iter()
        .map(JsonDictionary::new)
        .collect();
    let sources: Vec<&dyn MappingSource> = dictionaries
        .iter()
        .map(|d| d as &dyn MappingSource)
        .collect();
    let built = rules::build(&settings.changes, &sources, settings.reverse)?;
    info!("{}", report::format_plan(&built.rules, settings.policy));

    let resolver = Resolver::new(
        Replacer::new(LineTransformer::new(built.rules, settings.lowercase)),
        settings.policy,
        SuffixFilter::with_extra(&settings.types),
    );
    let mut summary = resolver.run(&args.targets(working_dir), out);
    for warning in built.warnings {
        summary.warn(warning);
    }
    if summary.has_failures() {
        warn!("{} target(s) could not be processed", summary.failures.len());
    }
    out.flush()?;

    report::write_report(report_out, &summary, settings.report)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;
    use crate::transformer::LineTransformer;
    use tempfile::TempDir;

    fn resolver(policy: OutputPolicy, suffixes: SuffixFilter) -> Resolver {
        let rules = RuleSet::compile([("Hello", "Hi")]).unwrap();
        Resolver::new(
            Replacer::new(LineTransformer::new(rules, false)),
            policy,
            suffixes,
        )
    }

    fn tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "Hello\n").unwrap();
        fs::write(temp_dir.path().join("b.md"), "Hello\n").unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        fs::write(temp_dir.path().join("sub").join("c.txt"), "Hello\n").unwrap();
        temp_dir
    }

    #[test]
    fn test_suffix_filter_normalizes() {
        let filter = SuffixFilter::with_extra(["md", ".RST", " .txt "]);
        assert_eq!(filter.suffixes(), &[".txt", ".md", ".rst"]);
        assert!(filter.matches(Path::new("x/readme.MD")));
        assert!(!filter.matches(Path::new("Makefile")));
    }

    #[test]
    fn test_non_recursive_only_top_level() {
        let dir = tree();
        let mut summary = RunSummary::new();
        resolver(OutputPolicy::ReplaceOriginal, SuffixFilter::default())
            .process_directory(dir.path(), false, &mut Vec::new(), &mut summary)
            .unwrap();

        assert_eq!(summary.files_processed, 1);
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "Hi\n");
        assert_eq!(fs::read_to_string(dir.path().join("b.md")).unwrap(), "Hello\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("sub").join("c.txt")).unwrap(),
            "Hello\n"
        );
    }

    #[test]
    fn test_recursive_descends() {
        let dir = tree();
        let mut summary = RunSummary::new();
        resolver(OutputPolicy::ReplaceOriginal, SuffixFilter::default())
            .process_directory(dir.path(), true, &mut Vec::new(), &mut summary)
            .unwrap();

        assert_eq!(summary.files_processed, 2);
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "Hi\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("sub").join("c.txt")).unwrap(),
            "Hi\n"
        );
        assert_eq!(fs::read_to_string(dir.path().join("b.md")).unwrap(), "Hello\n");
    }

    #[test]
    fn test_extra_suffix_is_processed() {
        let dir = tree();
        let mut summary = RunSummary::new();
        resolver(OutputPolicy::WriteNew, SuffixFilter::with_extra(["md"]))
            .process_directory(dir.path(), false, &mut Vec::new(), &mut summary)
            .unwrap();

        assert_eq!(summary.files_written, 2);
        assert!(dir.path().join("a -Changed.txt").exists());
        assert!(dir.path().join("b -Changed.md").exists());
    }

    #[test]
    fn test_write_new_outputs_are_not_reprocessed() {
        let dir = tree();
        let mut summary = RunSummary::new();
        resolver(OutputPolicy::WriteNew, SuffixFilter::default())
            .process_directory(dir.path(), true, &mut Vec::new(), &mut summary)
            .unwrap();

        assert_eq!(summary.files_written, 2);
        assert!(!dir.path().join("a -Changed -Changed.txt").exists());
    }

    #[test]
    fn test_print_order_is_lexicographic() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.txt"), "second\n").unwrap();
        fs::write(temp_dir.path().join("a.txt"), "first\n").unwrap();

        let mut out = Vec::new();
        let mut summary = RunSummary::new();
        resolver(OutputPolicy::Print, SuffixFilter::default())
            .process_directory(temp_dir.path(), false, &mut out, &mut summary)
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut summary = RunSummary::new();
        let missing = temp_dir.path().join("nope");
        let err = resolver(OutputPolicy::Print, SuffixFilter::default())
            .process_directory(&missing, true, &mut Vec::new(), &mut summary)
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_run_continues_after_failure() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.txt");
        fs::write(&good, "Hello\n").unwrap();

        let targets = vec![
            Target::File(temp_dir.path().join("missing.txt")),
            Target::File(good.clone()),
            Target::Text("Hello there".to_string()),
        ];
        let mut out = Vec::new();
        let summary = resolver(OutputPolicy::ReplaceOriginal, SuffixFilter::default())
            .run(&targets, &mut out);

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.files_processed, 1);
        assert_eq!(summary.strings_processed, 1);
        assert_eq!(fs::read_to_string(&good).unwrap(), "Hi\n");
        assert_eq!(String::from_utf8(out).unwrap(), "Hi there\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        let dir = tree();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("sub").join("loop")).unwrap();

        let mut summary = RunSummary::new();
        resolver(OutputPolicy::Print, SuffixFilter::default())
            .process_directory(dir.path(), true, &mut Vec::new(), &mut summary)
            .unwrap();

        assert_eq!(summary.files_processed, 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_link_without_allowed_suffix_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "Hello\n").unwrap();
        let missing = temp_dir.path().join("missing");
        std::os::unix::fs::symlink(&missing, temp_dir.path().join("dangling.bin")).unwrap();

        let mut summary = RunSummary::new();
        resolver(OutputPolicy::Print, SuffixFilter::default())
            .process_directory(temp_dir.path(), false, &mut Vec::new(), &mut summary)
            .unwrap();

        assert!(summary.failures.is_empty());
        assert_eq!(summary.files_processed, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_link_with_allowed_suffix_is_a_failure() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        std::os::unix::fs::symlink(&missing, temp_dir.path().join("gone.txt")).unwrap();

        let mut summary = RunSummary::new();
        resolver(OutputPolicy::Print, SuffixFilter::default())
            .process_directory(temp_dir.path(), false, &mut Vec::new(), &mut summary)
            .unwrap();

        assert_eq!(summary.failures.len(), 1);
        assert!(summary.failures[0].target.ends_with("gone.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_reached_twice_is_visited_once() {
        let dir = tree();
        std::os::unix::fs::symlink(dir.path().join("sub"), dir.path().join("alias")).unwrap();

        let mut summary = RunSummary::new();
        resolver(OutputPolicy::Print, SuffixFilter::default())
            .process_directory(dir.path(), true, &mut Vec::new(), &mut summary)
            .unwrap();

        assert_eq!(summary.files_processed, 2);
    }
}
