use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// How much scan output is rendered for the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum Verbosity {
    /// Nothing is rendered; callers rely on the response code alone.
    Silent,
    /// One line per executed step plus the final verdict.
    #[default]
    Brief,
    /// Brief output plus every valid and invalid file.
    Verbose,
}
impl Verbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Silent => "silent",
            Verbosity::Brief => "brief",
            Verbosity::Verbose => "verbose",
        }
    }

    /// Whether step summaries and the final verdict are rendered.
    pub fn shows_summary(&self) -> bool {
        !matches!(self, Verbosity::Silent)
    }

    /// Whether per-file verdicts are rendered.
    pub fn shows_files(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}
impl FromStr for Verbosity {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "silent" | "quiet" => Self::Silent,
            "brief" => Self::Brief,
            "verbose" => Self::Verbose,
            _ => exn::bail!(ErrorKind::ParseError {
                field: "output",
                value: s.to_string()
            }),
        })
    }
}
impl TryFrom<String> for Verbosity {
    type Error = ErrorKind;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse().map_err(|err: Error| (*err).clone())
    }
}
impl From<Verbosity> for String {
    fn from(verbosity: Verbosity) -> Self {
        verbosity.as_str().to_string()
    }
}
impl Display for Verbosity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("silent", Verbosity::Silent)]
    #[case("quiet", Verbosity::Silent)]
    #[case("Brief", Verbosity::Brief)]
    #[case(" VERBOSE ", Verbosity::Verbose)]
    fn test_from_str(#[case] input: &str, #[case] expected: Verbosity) {
        assert_eq!(input.parse::<Verbosity>().unwrap(), expected);
    }

    #[test]
    fn test_from_str_invalid() {
        let err = "loud".parse::<Verbosity>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::ParseError { field: "output", .. }));
    }

    #[rstest]
    #[case("output = \"Verbose\"", Verbosity::Verbose)]
    #[case("output = \"QUIET\"", Verbosity::Silent)]
    #[case("output = \"brief\"", Verbosity::Brief)]
    fn test_deserialize_any_case(#[case] toml: &str, #[case] expected: Verbosity) {
        use figment::Figment;
        use figment::providers::{Format, Toml};

        #[derive(Deserialize)]
        struct Output {
            output: Verbosity,
        }
        let parsed: Output = Figment::from(Toml::string(toml)).extract().unwrap();
        assert_eq!(parsed.output, expected);
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(String::from(Verbosity::Verbose), "verbose");
    }

    #[rstest]
    #[case(Verbosity::Silent, false, false)]
    #[case(Verbosity::Brief, true, false)]
    #[case(Verbosity::Verbose, true, true)]
    fn test_output_levels(#[case] verbosity: Verbosity, #[case] summary: bool, #[case] files: bool) {
        assert_eq!(verbosity.shows_summary(), summary);
        assert_eq!(verbosity.shows_files(), files);
    }
}
