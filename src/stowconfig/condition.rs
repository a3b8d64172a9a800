//! Conditional blocks and the evaluation context they are checked against.
use std::fmt;

/// Answers whether a named package is installed.
///
/// The default implementation, [`PathLookup`], only looks the name up on
/// `PATH`; nothing is ever executed or installed.
pub trait PackageLookup {
    /// Whether `name` resolves to an executable.
    fn is_available(&self, name: &str) -> bool;
}

/// Package lookup on `PATH` through the [`which`] crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathLookup;

impl PackageLookup for PathLookup {
    fn is_available(&self, name: &str) -> bool {
        which::which(name).is_ok()
    }
}

/// How parse-time failures in a rule file are escalated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorStrategy {
    /// Log the failure and keep whatever was parsed before it.
    #[default]
    Ignore,
    /// Turn the failure into an error that aborts the whole run.
    EnforceIntegrity,
}

/// Everything a rule file needs from the outside world while parsing.
///
/// Replaces process-wide state: the active profile, the package lookup used
/// by `if-pkg` blocks and the error escalation strategy are passed in
/// explicitly by whoever owns the run.
pub struct RuleContext {
    profile: String,
    strategy: ErrorStrategy,
    lookup: Box<dyn PackageLookup>,
}

impl RuleContext {
    /// Context for `profile` with the default strategy and a `PATH` lookup.
    #[must_use]
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            strategy: ErrorStrategy::default(),
            lookup: Box::new(PathLookup),
        }
    }

    /// Replace the error strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: ErrorStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Replace the package lookup.
    #[must_use]
    pub fn with_lookup(mut self, lookup: impl PackageLookup + 'static) -> Self {
        self.lookup = Box::new(lookup);
        self
    }

    /// The active profile name.
    #[must_use]
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// The active error strategy.
    #[must_use]
    pub const fn strategy(&self) -> ErrorStrategy {
        self.strategy
    }

    /// Whether `package` is available according to the lookup.
    #[must_use]
    pub fn is_available(&self, package: &str) -> bool {
        self.lookup.is_available(package)
    }
}

impl Default for RuleContext {
    fn default() -> Self {
        Self::new("default")
    }
}

impl fmt::Debug for RuleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleContext")
            .field("profile", &self.profile)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

/// The condition guarding a `[if-…::: …]` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Every token names an available package.
    IfPkg,
    /// At least one token names a missing package.
    IfNotPkg,
    /// One of the tokens is the active profile.
    IfProfile,
    /// None of the tokens is the active profile.
    IfNotProfile,
}

impl Condition {
    const ALL: [Self; 4] = [Self::IfPkg, Self::IfNotPkg, Self::IfProfile, Self::IfNotProfile];

    /// Keyword prefix written inside the brackets, delimiter included.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::IfPkg => "if-pkg:::",
            Self::IfNotPkg => "if-not-pkg:::",
            Self::IfProfile => "if-profile:::",
            Self::IfNotProfile => "if-not-profile:::",
        }
    }

    /// Recognize a block header, returning the condition and the raw token
    /// text that follows the prefix.
    ///
    /// ```
    /// use pstow::stowconfig::condition::Condition;
    ///
    /// let (condition, tokens) = Condition::parse_header("[if-pkg::: git nvim]").unwrap();
    /// assert_eq!(condition, Condition::IfPkg);
    /// assert_eq!(tokens.trim(), "git nvim");
    /// assert!(Condition::parse_header("[ignore]").is_none());
    /// ```
    #[must_use]
    pub fn parse_header(line: &str) -> Option<(Self, &str)> {
        let inner = line.strip_prefix('[')?.strip_suffix(']')?;
        Self::ALL
            .into_iter()
            .find_map(|condition| Some((condition, inner.strip_prefix(condition.prefix())?)))
    }

    /// Evaluate the condition for the given shell-split tokens.
    #[must_use]
    pub fn holds(self, tokens: &[String], ctx: &RuleContext) -> bool {
        let all_installed = || tokens.iter().all(|t| ctx.is_available(t));
        let profile_listed = || tokens.iter().any(|t| t == ctx.profile());
        match self {
            Self::IfPkg => all_installed(),
            Self::IfNotPkg => !all_installed(),
            Self::IfProfile => profile_listed(),
            Self::IfNotProfile => !profile_listed(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    struct Installed(&'static [&'static str]);

    impl PackageLookup for Installed {
        fn is_available(&self, name: &str) -> bool {
            self.0.contains(&name)
        }
    }

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn parse_header_recognizes_every_condition() {
        for condition in Condition::ALL {
            let header = format!("[{} x]", condition.prefix());
            let (parsed, raw) = Condition::parse_header(&header).unwrap();
            assert_eq!(parsed, condition);
            assert_eq!(raw, " x");
        }
    }

    #[test]
    fn parse_header_rejects_unbracketed_lines() {
        assert!(Condition::parse_header("if-pkg::: git").is_none());
        assert!(Condition::parse_header("[if-pkg::: git").is_none());
        assert!(Condition::parse_header("[unknown::: git]").is_none());
    }

    #[test]
    fn parse_header_allows_empty_token_text() {
        let (condition, raw) = Condition::parse_header("[if-profile:::]").unwrap();
        assert_eq!(condition, Condition::IfProfile);
        assert!(raw.is_empty());
    }

    #[test]
    fn pkg_conditions_require_every_package() {
        let ctx = RuleContext::default().with_lookup(Installed(&["git", "zsh"]));
        assert!(Condition::IfPkg.holds(&tokens(&["git", "zsh"]), &ctx));
        assert!(!Condition::IfPkg.holds(&tokens(&["git", "fish"]), &ctx));
        assert!(Condition::IfNotPkg.holds(&tokens(&["git", "fish"]), &ctx));
        assert!(!Condition::IfNotPkg.holds(&tokens(&["zsh"]), &ctx));
    }

    #[test]
    fn profile_conditions_match_any_token() {
        let ctx = RuleContext::new("work");
        assert!(Condition::IfProfile.holds(&tokens(&["home", "work"]), &ctx));
        assert!(!Condition::IfProfile.holds(&tokens(&["home"]), &ctx));
        assert!(Condition::IfNotProfile.holds(&tokens(&["home"]), &ctx));
        assert!(!Condition::IfNotProfile.holds(&tokens(&["work"]), &ctx));
    }

    #[test]
    fn path_lookup_misses_nonexistent_binary() {
        assert!(!PathLookup.is_available("nonexistent-binary-xyz"));
    }

    #[test]
    fn context_defaults() {
        let ctx = RuleContext::default();
        assert_eq!(ctx.profile(), "default");
        assert_eq!(ctx.strategy(), ErrorStrategy::Ignore);
        let ctx = ctx.with_strategy(ErrorStrategy::EnforceIntegrity);
        assert_eq!(ctx.strategy(), ErrorStrategy::EnforceIntegrity);
    }
}
